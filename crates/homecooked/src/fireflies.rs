//! `fireflies2md`: Fireflies meeting transcripts to Markdown files

use crate::artifact::write_file_artifact;
use crate::error::require_env;
use crate::http::{create_client, post_graphql, Auth};
use crate::options::{DateRangeArgs, RetryArgs};
use crate::pipeline::{fetch_all, map_bounded, new_spinner, print_summary, set_spinner_msg, with_retry, FetchOptions};
use crate::prelude::{eprintln, *};
use homecooked_core::fireflies::{
    detail_variables, list_variables, render_transcript_markdown, transcript_file_name,
    TranscriptData, TranscriptSummary, TranscriptsData, MAX_PAGE_SIZE, TRANSCRIPTS_QUERY,
    TRANSCRIPT_QUERY,
};
use homecooked_core::outcome::Artifact;
use homecooked_core::dates::DateRange;
use homecooked_core::pagination::{Page, PageRequest, PageStyle};
use homecooked_core::retry::RetryPolicy;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://api.fireflies.ai/graphql";

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Directory to write one Markdown file per transcript into
    #[arg(short, long, default_value = "transcripts")]
    pub output: PathBuf,

    /// Maximum number of transcripts to export
    #[arg(long)]
    pub limit: Option<usize>,

    /// Transcripts per listing request (max 50)
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: usize,

    /// Transcripts downloaded at the same time
    #[arg(short = 'j', long, default_value_t = 3)]
    pub concurrency: usize,

    /// Copy files to <name>.bak before overwriting them
    #[arg(long)]
    pub backup: bool,

    /// Fireflies GraphQL endpoint
    #[arg(long, env = "FIREFLIES_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[command(flatten)]
    pub dates: DateRangeArgs,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Fireflies configuration from environment variables
#[derive(Debug, Clone)]
pub struct FirefliesConfig {
    pub api_key: String,
}

impl FirefliesConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: require_env("FIREFLIES_API_KEY")?,
        })
    }
}

async fn export_transcript(
    client: &reqwest::Client,
    app: &App,
    policy: &RetryPolicy,
    summary: TranscriptSummary,
) -> Result<Artifact> {
    let data: TranscriptData = with_retry(policy, crate::error::is_transient, || {
        post_graphql(client, &app.api_url, TRANSCRIPT_QUERY, detail_variables(&summary.id))
    })
    .await?;

    let transcript = data
        .transcript
        .ok_or_else(|| eyre!("Transcript {} not found", summary.id))?;

    let markdown = render_transcript_markdown(&transcript);
    write_file_artifact(&app.output, &transcript_file_name(&summary), &markdown, app.backup).await
}

/// Listing variables for one offset page.
pub fn listing_variables(request: &PageRequest, range: &DateRange) -> serde_json::Value {
    list_variables(request.page_size, request.offset, range)
}

/// The listing has no "has more" flag, so a short page ends it.
pub fn listing_page(data: TranscriptsData) -> Page<TranscriptSummary> {
    Page::offset(data.transcripts)
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let range = app.dates.parse()?;
    let config = FirefliesConfig::from_env()?;
    let client = create_client(&Auth::Bearer(config.api_key))?;
    let policy = app.retry.policy();

    if global.verbose {
        eprintln!("Fireflies API: {}", app.api_url);
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), "Listing transcripts...");

    let options = FetchOptions::new(app.page_size.min(MAX_PAGE_SIZE), PageStyle::Offset)
        .with_max_items(app.limit)
        .with_policy(policy.clone());
    let fetched = fetch_all(&options, Some(&spinner), |request| {
        let variables = listing_variables(&request, &range);
        let client = &client;
        let url = app.api_url.as_str();
        async move {
            let data: TranscriptsData = post_graphql(client, url, TRANSCRIPTS_QUERY, variables).await?;
            Ok(listing_page(data))
        }
    })
    .await;
    spinner.finish_and_clear();
    let transcripts = fetched.wrap_err("Failed to list Fireflies transcripts")?.items;

    eprintln!("Exporting {} transcripts", transcripts.len());

    let outcomes = map_bounded(
        transcripts,
        app.concurrency,
        |summary| {
            summary
                .title
                .clone()
                .unwrap_or_else(|| summary.id.clone())
        },
        |summary| export_transcript(&client, &app, &policy, summary),
    )
    .await;

    print_summary("fireflies2md", &outcomes, global.verbose);
    Ok(())
}
