//! Fetch, retry, fan-out and report: the skeleton every tool runs on.

use indicatif::{ProgressBar, ProgressStyle};

pub mod fetch;
pub mod mapper;
pub mod report;
pub mod retry;

pub use fetch::{fetch_all, FetchOptions, Fetched};
pub use mapper::{map_bounded, map_ordered};
pub use report::print_summary;
pub use retry::with_retry;

/// Spinner on stderr for long-running fetches.
pub fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Helper to set spinner message if spinner is present
pub fn set_spinner_msg(spinner: Option<&ProgressBar>, msg: impl Into<String>) {
    if let Some(s) = spinner {
        s.set_message(msg.into());
    }
}
