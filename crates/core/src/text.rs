//! Small text helpers shared by the Markdown exporters

/// Lowercase ASCII slug: alphanumerics kept, everything else collapsed to `-`.
///
/// Returns `"untitled"` when nothing usable is left. The result is capped at
/// `max_len` characters without leaving a trailing dash.
pub fn slugify(input: &str, max_len: usize) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(max_len);
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Prefix every line with `> ` for a Markdown block quote.
pub fn blockquote(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
