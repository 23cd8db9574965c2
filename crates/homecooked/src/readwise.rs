//! `readwise2md`: Readwise books and highlights to Markdown files

use crate::artifact::write_file_artifact;
use crate::error::require_env;
use crate::http::{create_client, send_json, Auth};
use crate::options::RetryArgs;
use crate::pipeline::{fetch_all, map_bounded, new_spinner, print_summary, set_spinner_msg, FetchOptions};
use crate::prelude::{eprintln, *};
use homecooked_core::dates::DateRange;
use homecooked_core::pagination::PageStyle;
use homecooked_core::readwise::{book_file_name, into_page, render_book_markdown, ExportResponse, ReadwiseBook};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://readwise.io/api/v2";

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Directory to write one Markdown file per book into
    #[arg(short, long, default_value = "highlights")]
    pub output: PathBuf,

    /// Only books with highlights updated on or after this day (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<String>,

    /// Maximum number of books to export
    #[arg(long)]
    pub limit: Option<usize>,

    /// Include books whose highlights are all discarded
    #[arg(long)]
    pub include_empty: bool,

    /// Files written at the same time
    #[arg(short = 'j', long, default_value_t = 8)]
    pub concurrency: usize,

    /// Copy files to <name>.bak before overwriting them
    #[arg(long)]
    pub backup: bool,

    /// Readwise API base URL
    #[arg(long, env = "READWISE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Readwise configuration from environment variables
#[derive(Debug, Clone)]
pub struct ReadwiseConfig {
    pub token: String,
}

impl ReadwiseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            token: require_env("READWISE_TOKEN")?,
        })
    }

    pub fn auth(&self) -> Auth {
        Auth::Scheme {
            scheme: "Token".to_string(),
            token: self.token.clone(),
        }
    }
}

/// Books that still have at least one highlight to show.
pub fn exportable_books(books: Vec<ReadwiseBook>, include_empty: bool) -> Vec<ReadwiseBook> {
    books
        .into_iter()
        .filter(|book| include_empty || book.highlights.iter().any(|h| !h.is_discard))
        .collect()
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let range = DateRange::parse(app.since.as_deref(), None)?;
    let config = ReadwiseConfig::from_env()?;
    let client = create_client(&config.auth())?;
    let export_url = f!("{}/export/", app.api_url.trim_end_matches('/'));

    if global.verbose {
        eprintln!("Readwise API: {}", export_url);
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), "Fetching highlights from Readwise...");

    // The export endpoint picks its own page size.
    let options = FetchOptions::new(1000, PageStyle::Cursor)
        .with_max_items(app.limit)
        .with_policy(app.retry.policy());
    let fetched = fetch_all(&options, Some(&spinner), |request| {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(cursor) = request.cursor {
            params.push(("pageCursor", cursor));
        }
        if let Some(since) = range.start_timestamp() {
            params.push(("updatedAfter", since));
        }
        let request = client.get(&export_url).query(&params);
        async move {
            let response: ExportResponse = send_json(request).await?;
            Ok(into_page(response))
        }
    })
    .await;
    spinner.finish_and_clear();
    let fetched = fetched.wrap_err("Failed to fetch Readwise export")?;

    let books = exportable_books(fetched.items, app.include_empty);
    eprintln!("Exporting {} books", books.len());

    let outcomes = map_bounded(
        books,
        app.concurrency,
        |book| book.title.clone(),
        |book| {
            let output = &app.output;
            let backup = app.backup;
            async move {
                let markdown = render_book_markdown(&book);
                write_file_artifact(output, &book_file_name(&book), &markdown, backup).await
            }
        },
    )
    .await;

    print_summary("readwise2md", &outcomes, global.verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book(id: u64, discarded: &[bool]) -> ReadwiseBook {
        let highlights: Vec<_> = discarded
            .iter()
            .enumerate()
            .map(|(i, d)| json!({"id": i, "text": "quote", "is_discard": d}))
            .collect();
        serde_json::from_value(json!({
            "user_book_id": id,
            "title": format!("Book {id}"),
            "highlights": highlights,
        }))
        .unwrap()
    }

    #[test]
    fn test_exportable_books() {
        let books = vec![book(1, &[false, true]), book(2, &[true]), book(3, &[])];

        let ids: Vec<u64> = exportable_books(books.clone(), false)
            .iter()
            .map(|b| b.user_book_id)
            .collect();
        assert_eq!(ids, vec![1]);

        assert_eq!(exportable_books(books, true).len(), 3);
    }
}
