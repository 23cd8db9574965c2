use crate::prelude::*;
use clap::Parser;

mod artifact;
mod bank;
mod cache;
mod error;
mod fireflies;
mod github;
mod http;
mod linear;
mod llm;
mod options;
mod pipeline;
mod prelude;
mod readwise;
mod rewrite;
mod trustpilot;
mod zendesk;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Small personal export and rewrite tools built on one fetch/transform/report pipeline"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "HOMECOOKED_VERBOSE", global = true, default_value = "false")]
    pub verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Convert a bank statement export into budgeting CSV
    #[command(name = "bank2csv")]
    Bank(crate::bank::App),

    /// Export GitHub issues as Markdown files
    #[command(name = "gh2md")]
    GitHub(crate::github::App),

    /// Dump Linear issues as tagged plain text for LLM context
    #[command(name = "linear2llm")]
    Linear(crate::linear::App),

    /// Export Readwise highlights as one Markdown file per book
    #[command(name = "readwise2md")]
    Readwise(crate::readwise::App),

    /// Export Fireflies meeting transcripts as Markdown files
    #[command(name = "fireflies2md")]
    Fireflies(crate::fireflies::App),

    /// Export Zendesk tickets with their comments as JSON
    #[command(name = "zendesk")]
    Zendesk(crate::zendesk::App),

    /// Scrape Trustpilot reviews for a business as JSON
    #[command(name = "trustpilot")]
    Trustpilot(crate::trustpilot::App),

    /// Rewrite local files through an LLM
    #[command(name = "rewrite")]
    Rewrite(crate::rewrite::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Bank(sub_app) => crate::bank::run(sub_app, app.global).await,
        SubCommands::GitHub(sub_app) => crate::github::run(sub_app, app.global).await,
        SubCommands::Linear(sub_app) => crate::linear::run(sub_app, app.global).await,
        SubCommands::Readwise(sub_app) => crate::readwise::run(sub_app, app.global).await,
        SubCommands::Fireflies(sub_app) => crate::fireflies::run(sub_app, app.global).await,
        SubCommands::Zendesk(sub_app) => crate::zendesk::run(sub_app, app.global).await,
        SubCommands::Trustpilot(sub_app) => crate::trustpilot::run(sub_app, app.global).await,
        SubCommands::Rewrite(sub_app) => crate::rewrite::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
