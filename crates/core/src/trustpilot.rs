//! Trustpilot review pages to JSON records
//!
//! Review pages embed their data as JSON in a `<script id="__NEXT_DATA__">`
//! tag. We read that instead of scraping the rendered markup.

use crate::pagination::Page;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScrapeError {
    #[error("Page does not contain a __NEXT_DATA__ script")]
    MissingNextData,

    #[error("Embedded page data is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Embedded page data has no reviews list")]
    MissingReviews,
}

// =============================================================================
// Embedded data types (Deserialization)
// =============================================================================

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrustpilotReview {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub consumer: Option<Consumer>,
    #[serde(default)]
    pub dates: Option<ReviewDates>,
    #[serde(default)]
    pub labels: Option<Value>,
    #[serde(default)]
    pub reply: Option<Reply>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDates {
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub experienced_date: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationData {
    #[serde(default)]
    pub current_page: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub total_count: u64,
}

// =============================================================================
// Output Types
// =============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReviewRecord {
    pub id: String,
    pub rating: u8,
    pub title: String,
    pub text: String,
    pub author: Option<String>,
    pub country: Option<String>,
    pub published_at: Option<String>,
    pub experienced_at: Option<String>,
    pub verified: bool,
    pub reply: Option<String>,
}

/// Top-level JSON document written to stdout.
#[derive(Debug, Serialize, Clone)]
pub struct ReviewExport {
    pub domain: String,
    pub total_count: u64,
    pub records: Vec<ReviewRecord>,
}

// =============================================================================
// Extraction
// =============================================================================

/// Review page URL for a business domain and 1-indexed page number.
pub fn review_page_url(base_url: &str, domain: &str, page: usize) -> String {
    let base = base_url.trim_end_matches('/');
    let domain = urlencoding::encode(domain);
    if page <= 1 {
        format!("{base}/review/{domain}")
    } else {
        format!("{base}/review/{domain}?page={page}")
    }
}

/// Pull the `__NEXT_DATA__` JSON out of a review page.
pub fn extract_next_data(html: &str) -> Result<Value, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__").expect("static selector is valid");

    let script = document
        .select(&selector)
        .next()
        .ok_or(ScrapeError::MissingNextData)?;
    let raw: String = script.text().collect();

    serde_json::from_str(&raw).map_err(|e| ScrapeError::InvalidJson(e.to_string()))
}

fn is_verified(labels: &Option<Value>) -> bool {
    labels
        .as_ref()
        .and_then(|l| l.pointer("/verification/isVerified"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn transform_review(review: TrustpilotReview) -> ReviewRecord {
    let verified = is_verified(&review.labels);
    let (author, country) = review
        .consumer
        .map(|c| (c.display_name, c.country_code))
        .unwrap_or((None, None));
    let (published_at, experienced_at) = review
        .dates
        .map(|d| (d.published_date, d.experienced_date))
        .unwrap_or((None, None));

    ReviewRecord {
        id: review.id,
        rating: review.rating,
        title: review.title.unwrap_or_default().trim().to_string(),
        text: review.text.unwrap_or_default().trim().to_string(),
        author,
        country,
        published_at,
        experienced_at,
        verified,
        reply: review
            .reply
            .and_then(|r| r.message)
            .map(|m| m.trim().to_string()),
    }
}

/// Parse one review page into a generic page of records.
///
/// `has_more` comes from the embedded pagination block; `total_count` is the
/// business's total review count. Both stay unset when the block is missing.
pub fn parse_review_page(html: &str) -> Result<Page<ReviewRecord>, ScrapeError> {
    let data = extract_next_data(html)?;
    let props = data
        .pointer("/props/pageProps")
        .ok_or(ScrapeError::MissingReviews)?;

    let reviews: Vec<TrustpilotReview> = props
        .get("reviews")
        .cloned()
        .map(serde_json::from_value::<Vec<TrustpilotReview>>)
        .ok_or(ScrapeError::MissingReviews)?
        .map_err(|e| ScrapeError::InvalidJson(e.to_string()))?;

    let pagination: Option<PaginationData> = props
        .pointer("/filters/pagination")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());

    let records = reviews.into_iter().map(transform_review).collect();
    let page = Page::offset(records);

    // Without a pagination block the fetcher falls back to the page-size rule.
    Ok(match pagination {
        Some(pagination) => page
            .has_more(pagination.current_page < pagination.total_pages)
            .total_count(pagination.total_count),
        None => page,
    })
}

pub fn build_export(domain: &str, total_count: Option<u64>, records: Vec<ReviewRecord>) -> ReviewExport {
    ReviewExport {
        domain: domain.to_string(),
        total_count: total_count.unwrap_or(records.len() as u64),
        records,
    }
}
