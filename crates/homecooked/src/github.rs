//! `gh2md`: GitHub issues and their comments to Markdown files

use crate::artifact::write_file_artifact;
use crate::http::{check_status, create_client, Auth};
use crate::options::{DateRangeArgs, RetryArgs};
use crate::pipeline::{fetch_all, map_bounded, new_spinner, print_summary, set_spinner_msg, FetchOptions};
use crate::prelude::{eprintln, *};
use homecooked_core::dates::DateRange;
use homecooked_core::github::{
    issue_file_name, parse_next_link, render_issue_markdown, GitHubComment, GitHubIssue,
};
use homecooked_core::outcome::Artifact;
use homecooked_core::pagination::{Page, PageRequest, PageStyle};
use homecooked_core::retry::RetryPolicy;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://api.github.com";
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Repository in owner/name format (e.g., "rust-lang/rust")
    pub repo: String,

    /// Directory to write one Markdown file per issue into
    #[arg(short, long, default_value = "issues")]
    pub output: PathBuf,

    /// Issue state to export
    #[arg(long, default_value = "all", value_parser = ["open", "closed", "all"])]
    pub state: String,

    /// Also export pull requests
    #[arg(long)]
    pub include_prs: bool,

    /// Skip fetching comments
    #[arg(long)]
    pub no_comments: bool,

    /// Maximum number of issues to fetch
    #[arg(long)]
    pub limit: Option<usize>,

    /// Issues per page (max 100)
    #[arg(long, default_value_t = MAX_PER_PAGE)]
    pub page_size: usize,

    /// Issues processed at the same time
    #[arg(short = 'j', long, default_value_t = 4)]
    pub concurrency: usize,

    /// Copy files to <name>.bak before overwriting them
    #[arg(long)]
    pub backup: bool,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[command(flatten)]
    pub dates: DateRangeArgs,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// GitHub configuration from environment variables
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Optional: public repositories work without it, at a lower rate limit.
    pub token: Option<String>,
}

impl GitHubConfig {
    pub fn from_env() -> Self {
        Self {
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn auth(&self) -> Auth {
        match &self.token {
            Some(token) => Auth::Bearer(token.clone()),
            None => Auth::None,
        }
    }
}

/// First page of the issue listing, oldest first.
pub fn issues_url(
    api_url: &str,
    repo: &str,
    state: &str,
    per_page: usize,
    range: &DateRange,
) -> Result<String> {
    let base = f!("{}/repos/{}/issues", api_url.trim_end_matches('/'), repo);
    let mut params = vec![
        ("state", state.to_string()),
        ("per_page", per_page.clamp(1, MAX_PER_PAGE).to_string()),
        ("sort", "created".to_string()),
        ("direction", "asc".to_string()),
    ];
    // `since` filters on update time, a superset of what was created since.
    if let Some(since) = range.start_timestamp() {
        params.push(("since", since));
    }

    let url = reqwest::Url::parse_with_params(&base, &params)
        .map_err(|e| eyre!("Invalid GitHub API URL '{}': {}", base, e))?;
    Ok(url.to_string())
}

pub fn comments_url(api_url: &str, repo: &str, number: u64) -> String {
    f!(
        "{}/repos/{}/issues/{}/comments?per_page={}",
        api_url.trim_end_matches('/'),
        repo,
        number,
        MAX_PER_PAGE
    )
}

/// Drop pull requests (unless wanted) and issues created outside `range`.
pub fn select_issues(issues: Vec<GitHubIssue>, include_prs: bool, range: &DateRange) -> Vec<GitHubIssue> {
    issues
        .into_iter()
        .filter(|issue| include_prs || !issue.is_pull_request())
        .filter(|issue| range.contains_timestamp(&issue.created_at))
        .collect()
}

/// Fetch one page of a listing that paginates through `Link: <...>; rel="next"`.
async fn fetch_linked_page<T: DeserializeOwned>(
    client: &reqwest::Client,
    first_url: &str,
    request: PageRequest,
) -> Result<Page<T>> {
    let url = request.cursor.unwrap_or_else(|| first_url.to_string());

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| eyre!("Failed to send request to GitHub: {}", e))?;
    let response = check_status(response).await?;

    let next = response
        .headers()
        .get(reqwest::header::LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_next_link);

    let items: Vec<T> = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse GitHub response: {}", e))?;

    Ok(Page::with_cursor(items, next))
}

async fn export_issue(
    client: &reqwest::Client,
    app: &App,
    policy: &RetryPolicy,
    issue: GitHubIssue,
) -> Result<Artifact> {
    let comments: Vec<GitHubComment> = if app.no_comments || issue.comments == 0 {
        Vec::new()
    } else {
        let url = comments_url(&app.api_url, &app.repo, issue.number);
        let options = FetchOptions::new(MAX_PER_PAGE, PageStyle::Cursor).with_policy(policy.clone());
        fetch_all(&options, None, |request| fetch_linked_page(client, &url, request))
            .await
            .wrap_err("Failed to fetch comments")?
            .items
    };

    let markdown = render_issue_markdown(&issue, &comments);
    write_file_artifact(&app.output, &issue_file_name(&issue), &markdown, app.backup).await
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let range = app.dates.parse()?;
    let config = GitHubConfig::from_env();
    if config.token.is_none() {
        log::warn!("GITHUB_TOKEN is not set; using unauthenticated requests");
    }

    let client = create_client(&config.auth())?;
    let policy = app.retry.policy();
    let first_url = issues_url(&app.api_url, &app.repo, &app.state, app.page_size, &range)?;

    if global.verbose {
        eprintln!("GitHub API: {}", app.api_url);
        eprintln!("Output directory: {}", app.output.display());
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), f!("Fetching issues from {}...", app.repo));

    let options = FetchOptions::new(app.page_size.min(MAX_PER_PAGE), PageStyle::Cursor)
        .with_max_items(app.limit)
        .with_policy(policy.clone());
    let fetched = fetch_all(&options, Some(&spinner), |request| {
        fetch_linked_page::<GitHubIssue>(&client, &first_url, request)
    })
    .await
    .wrap_err_with(|| f!("Failed to fetch issues for {}", app.repo));

    spinner.finish_and_clear();
    let issues = select_issues(fetched?.items, app.include_prs, &range);
    eprintln!("Exporting {} issues from {}", issues.len(), app.repo);

    let outcomes = map_bounded(
        issues,
        app.concurrency,
        |issue| f!("#{}", issue.number),
        |issue| export_issue(&client, &app, &policy, issue),
    )
    .await;

    print_summary("gh2md", &outcomes, global.verbose);
    Ok(())
}
