//! `linear2llm`: Linear issues as tagged plain text for LLM context windows

use crate::error::require_env;
use crate::http::{create_client, post_graphql, Auth};
use crate::options::{DateRangeArgs, RetryArgs};
use crate::pipeline::{fetch_all, new_spinner, set_spinner_msg, FetchOptions};
use crate::prelude::{eprintln, println, *};
use homecooked_core::linear::{build_filter, build_variables, into_page, render_issues, IssuesData, ISSUES_QUERY};
use homecooked_core::pagination::{PageRequest, PageStyle};

const DEFAULT_API_URL: &str = "https://api.linear.app/graphql";

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Team key to export (e.g., "ENG"). All teams when omitted.
    #[arg(long)]
    pub team: Option<String>,

    /// Maximum number of issues to export
    #[arg(long)]
    pub limit: Option<usize>,

    /// Issues per request
    #[arg(long, default_value_t = 50)]
    pub page_size: usize,

    /// Linear GraphQL endpoint
    #[arg(long, env = "LINEAR_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Filters on last update date
    #[command(flatten)]
    pub dates: DateRangeArgs,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Linear configuration from environment variables
#[derive(Debug, Clone)]
pub struct LinearConfig {
    pub api_key: String,
}

impl LinearConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: require_env("LINEAR_API_KEY")?,
        })
    }
}

/// Variables for one cursor page of the issues query.
pub fn page_variables(filter: &serde_json::Value, request: &PageRequest) -> serde_json::Value {
    build_variables(filter, request.page_size, request.cursor.as_deref())
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let range = app.dates.parse()?;
    let config = LinearConfig::from_env()?;
    let client = create_client(&Auth::Raw(config.api_key))?;

    let filter = build_filter(app.team.as_deref(), &range);
    if global.verbose {
        eprintln!("Linear API: {}", app.api_url);
        eprintln!("Filter: {}", filter);
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), "Fetching issues from Linear...");

    let options = FetchOptions::new(app.page_size, PageStyle::Cursor)
        .with_max_items(app.limit)
        .with_policy(app.retry.policy());
    let fetched = fetch_all(&options, Some(&spinner), |request| {
        let variables = page_variables(&filter, &request);
        let client = &client;
        let url = app.api_url.as_str();
        async move {
            let data: IssuesData = post_graphql(client, url, ISSUES_QUERY, variables).await?;
            Ok(into_page(data.issues))
        }
    })
    .await;
    spinner.finish_and_clear();
    let fetched = fetched.wrap_err("Failed to fetch Linear issues")?;

    println!("{}", render_issues(&fetched.items));
    eprintln!("Exported {} issues", fetched.items.len());

    Ok(())
}
