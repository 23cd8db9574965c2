//! `trustpilot`: Trustpilot reviews for a business as JSON records

use crate::http::{check_status, create_html_client};
use crate::options::RetryArgs;
use crate::pipeline::{fetch_all, new_spinner, set_spinner_msg, FetchOptions};
use crate::prelude::{eprintln, println, *};
use homecooked_core::pagination::{PageRequest, PageStyle};
use homecooked_core::trustpilot::{build_export, parse_review_page, review_page_url};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.trustpilot.com";
/// Reviews per page on the public site.
const REVIEWS_PER_PAGE: usize = 20;

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Business domain as it appears in the review URL (e.g., "example.com")
    pub domain: String,

    /// Maximum number of reviews to collect
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pause between page requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Site base URL
    #[arg(long, env = "TRUSTPILOT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// 1-indexed page to request. Follows the page number carried over from the
/// previous response, so short pages do not shift the numbering.
pub fn page_to_fetch(request: &PageRequest) -> usize {
    request
        .cursor
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or_else(|| request.page_number())
}

/// Delay before requesting `request`; the first page goes out immediately.
pub fn page_delay(request: &PageRequest, delay: Duration) -> Duration {
    if request.offset == 0 {
        Duration::ZERO
    } else {
        delay
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let client = create_html_client()?;
    let delay = Duration::from_millis(app.delay_ms);

    if global.verbose {
        eprintln!("Reviews: {}", review_page_url(&app.base_url, &app.domain, 1));
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), f!("Fetching reviews for {}...", app.domain));

    let options = FetchOptions::new(REVIEWS_PER_PAGE, PageStyle::Offset)
        .with_max_items(app.limit)
        .with_policy(app.retry.policy());
    let fetched = fetch_all(&options, Some(&spinner), |request| {
        let number = page_to_fetch(&request);
        let url = review_page_url(&app.base_url, &app.domain, number);
        let wait = page_delay(&request, delay);
        let client = &client;
        async move {
            tokio::time::sleep(wait).await;
            log::debug!("GET {url}");

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| eyre!("Failed to send request to {}: {}", url, e))?;
            let html = check_status(response)
                .await?
                .text()
                .await
                .map_err(|e| eyre!("Failed to read {}: {}", url, e))?;

            let mut page = parse_review_page(&html).wrap_err_with(|| f!("Failed to parse {}", url))?;
            page.next_cursor = Some((number + 1).to_string());
            Ok(page)
        }
    })
    .await;
    spinner.finish_and_clear();
    let fetched = fetched.wrap_err_with(|| f!("Failed to fetch reviews for {}", app.domain))?;

    let count = fetched.items.len();
    let export = build_export(&app.domain, fetched.total_count, fetched.items);
    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
    println!("{}", json);

    eprintln!("Collected {} of {} reviews", count, export.total_count);
    Ok(())
}
