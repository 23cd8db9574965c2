use super::retry::with_retry;
use super::set_spinner_msg;
use crate::prelude::*;
use color_eyre::eyre::Report;
use homecooked_core::pagination::{accumulate, next_request, Page, PageRequest, PageStyle};
use homecooked_core::retry::RetryPolicy;
use indicatif::ProgressBar;
use std::future::Future;

/// How to walk a paginated endpoint.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub page_size: usize,
    pub style: PageStyle,
    /// Stop once this many items have been collected, trimming the last page.
    pub max_items: Option<usize>,
    /// Applied to every page request.
    pub policy: RetryPolicy,
    pub is_transient: fn(&Report) -> bool,
}

impl FetchOptions {
    pub fn new(page_size: usize, style: PageStyle) -> Self {
        Self {
            page_size: page_size.max(1),
            style,
            max_items: None,
            policy: RetryPolicy::default(),
            is_transient: crate::error::is_transient,
        }
    }

    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_classifier(mut self, is_transient: fn(&Report) -> bool) -> Self {
        self.is_transient = is_transient;
        self
    }
}

/// Everything a paginated fetch returned, in server order.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    /// Last total-count hint reported by the server, if any.
    pub total_count: Option<u64>,
    /// Page requests that eventually succeeded.
    pub pages: usize,
}

/// Request pages until the endpoint is exhausted or `max_items` is reached.
///
/// Every page request goes through [`with_retry`]. An unrecoverable page
/// failure aborts the whole fetch.
pub async fn fetch_all<T, F, Fut>(
    options: &FetchOptions,
    spinner: Option<&ProgressBar>,
    mut fetch_page: F,
) -> Result<Fetched<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut fetched = Fetched {
        items: Vec::new(),
        total_count: None,
        pages: 0,
    };

    if options.max_items == Some(0) {
        return Ok(fetched);
    }

    let mut request = Some(PageRequest::first(options.page_size));

    while let Some(current) = request.take() {
        let page = with_retry(&options.policy, options.is_transient, || {
            fetch_page(current.clone())
        })
        .await?;

        fetched.pages += 1;
        if page.total_count.is_some() {
            fetched.total_count = page.total_count;
        }

        let next = next_request(options.style, &current, &page);
        let received = page.items.len();
        let capped = accumulate(&mut fetched.items, page.items, options.max_items);

        log::debug!(
            "Page {} returned {} items ({} total)",
            fetched.pages,
            received,
            fetched.items.len()
        );
        set_spinner_msg(spinner, f!("Fetched {} items...", fetched.items.len()));

        if capped {
            break;
        }
        request = next;
    }

    Ok(fetched)
}
