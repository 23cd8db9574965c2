//! Readwise export (books and highlights) to Markdown

use crate::pagination::Page;
use crate::text::{blockquote, slugify};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Response from `GET /api/v2/export/`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    #[serde(default)]
    pub count: Option<u64>,
    /// Number or string depending on the account; `null` on the last page.
    #[serde(default)]
    pub next_page_cursor: Option<Value>,
    pub results: Vec<ReadwiseBook>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReadwiseBook {
    pub user_book_id: u64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub readwise_url: Option<String>,
    #[serde(default)]
    pub highlights: Vec<ReadwiseHighlight>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReadwiseHighlight {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub location: Option<i64>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub highlighted_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<ReadwiseTag>,
    #[serde(default)]
    pub is_discard: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReadwiseTag {
    pub name: String,
}

/// Normalize the polymorphic cursor into a string.
fn cursor_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn into_page(response: ExportResponse) -> Page<ReadwiseBook> {
    let mut page = Page::with_cursor(response.results, cursor_string(response.next_page_cursor));
    page.total_count = response.count;
    page
}

// =============================================================================
// Rendering
// =============================================================================

pub fn book_file_name(book: &ReadwiseBook) -> String {
    format!("{}-{}.md", slugify(&book.title, 80), book.user_book_id)
}

fn highlight_heading(index: usize, highlight: &ReadwiseHighlight) -> String {
    match (&highlight.location_type, highlight.location) {
        (Some(kind), Some(location)) if kind != "order" => format!("## {} {location}", capitalize(kind)),
        _ => format!("## Highlight {}", index + 1),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render a book as Markdown with one heading per (non-discarded) highlight.
pub fn render_book_markdown(book: &ReadwiseBook) -> String {
    let mut out = format!("# {}\n\n", book.title.trim());

    if let Some(author) = book.author.as_deref().filter(|a| !a.is_empty()) {
        out.push_str(&format!("- **Author:** {author}\n"));
    }
    if let Some(category) = &book.category {
        out.push_str(&format!("- **Category:** {category}\n"));
    }
    if let Some(url) = book.source_url.as_deref().filter(|u| !u.is_empty()) {
        out.push_str(&format!("- **Source:** {url}\n"));
    }
    if let Some(url) = &book.readwise_url {
        out.push_str(&format!("- **Readwise:** {url}\n"));
    }

    let highlights: Vec<&ReadwiseHighlight> =
        book.highlights.iter().filter(|h| !h.is_discard).collect();

    for (index, highlight) in highlights.iter().enumerate() {
        out.push_str(&format!("\n{}\n\n", highlight_heading(index, highlight)));
        out.push_str(&blockquote(&highlight.text));
        out.push('\n');

        if let Some(note) = highlight.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            out.push_str(&format!("\n**Note:** {note}\n"));
        }
        if !highlight.tags.is_empty() {
            let tags: Vec<String> = highlight.tags.iter().map(|t| format!("#{}", t.name)).collect();
            out.push_str(&format!("\n**Tags:** {}\n", tags.join(" ")));
        }
        if let Some(at) = &highlight.highlighted_at {
            out.push_str(&format!("\n_Highlighted {at}_\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_book() -> ReadwiseBook {
        serde_json::from_value(json!({
            "user_book_id": 991,
            "title": "Deep Work",
            "author": "Cal Newport",
            "category": "books",
            "source_url": null,
            "readwise_url": "https://readwise.io/bookreview/991",
            "highlights": [
                {
                    "id": 1,
                    "text": "Clarity about what matters.\nProvides clarity.",
                    "note": " key idea ",
                    "location": 120,
                    "location_type": "location",
                    "highlighted_at": "2024-01-01T00:00:00Z",
                    "tags": [{"name": "focus"}],
                    "is_discard": false
                },
                {
                    "id": 2,
                    "text": "Discarded",
                    "is_discard": true
                },
                {
                    "id": 3,
                    "text": "Short one",
                    "location": 3,
                    "location_type": "order"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_render_book_markdown() {
        let md = render_book_markdown(&sample_book());

        assert_eq!(
            md,
            "# Deep Work\n\n\
             - **Author:** Cal Newport\n\
             - **Category:** books\n\
             - **Readwise:** https://readwise.io/bookreview/991\n\
             \n## Location 120\n\n\
             > Clarity about what matters.\n\
             > Provides clarity.\n\
             \n**Note:** key idea\n\
             \n**Tags:** #focus\n\
             \n_Highlighted 2024-01-01T00:00:00Z_\n\
             \n## Highlight 2\n\n\
             > Short one\n"
        );
    }

    #[test]
    fn test_book_file_name() {
        assert_eq!(book_file_name(&sample_book()), "deep-work-991.md");
    }

    #[test]
    fn test_into_page_numeric_cursor() {
        let response: ExportResponse = serde_json::from_value(json!({
            "count": 10,
            "nextPageCursor": 123456,
            "results": []
        }))
        .unwrap();

        let page = into_page(response);
        assert_eq!(page.next_cursor.as_deref(), Some("123456"));
        assert_eq!(page.total_count, Some(10));
    }

    #[test]
    fn test_into_page_last_page() {
        let response: ExportResponse = serde_json::from_value(json!({
            "count": 1,
            "nextPageCursor": null,
            "results": [{"user_book_id": 1, "title": "T"}]
        }))
        .unwrap();

        let page = into_page(response);
        assert_eq!(page.next_cursor, None);
        assert_eq!(page.items.len(), 1);
    }
}
