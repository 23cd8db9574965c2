//! `zendesk`: Zendesk tickets and their comments as JSON records
//!
//! Comments are fetched once per ticket and cached on disk, keyed by ticket
//! id and last update time, so re-runs only hit the API for tickets that
//! changed.

use crate::cache::JsonCache;
use crate::error::require_env;
use crate::http::{create_client, send_json, Auth};
use crate::options::{CacheArgs, DateRangeArgs, RetryArgs};
use crate::pipeline::{fetch_all, map_ordered, new_spinner, print_summary, set_spinner_msg, FetchOptions};
use crate::prelude::{eprintln, println, *};
use homecooked_core::cache::cache_key;
use homecooked_core::outcome::{Artifact, ArtifactStatus, TransformOutcome};
use homecooked_core::pagination::{Page, PageStyle};
use homecooked_core::retry::RetryPolicy;
use homecooked_core::zendesk::{
    build_export, filter_by_created, into_page, transform_ticket, CommentsResponse,
    TicketRecord, TicketsResponse, ZendeskComment, ZendeskTicket,
};

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Only keep public comments
    #[arg(long)]
    pub public_only: bool,

    /// Maximum number of tickets to fetch
    #[arg(long)]
    pub limit: Option<usize>,

    /// Tickets per page (max 100)
    #[arg(long, default_value_t = 100)]
    pub page_size: usize,

    /// Tickets whose comments are fetched at the same time
    #[arg(short = 'j', long, default_value_t = 4)]
    pub concurrency: usize,

    /// Override the API base URL (defaults to https://<subdomain>.zendesk.com/api/v2)
    #[arg(long, env = "ZENDESK_API_URL")]
    pub api_url: Option<String>,

    /// Filters on ticket creation date
    #[command(flatten)]
    pub dates: DateRangeArgs,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Zendesk configuration from environment variables
#[derive(Debug, Clone)]
pub struct ZendeskConfig {
    pub subdomain: String,
    pub email: String,
    pub api_token: String,
}

impl ZendeskConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            subdomain: require_env("ZENDESK_SUBDOMAIN")?,
            email: require_env("ZENDESK_EMAIL")?,
            api_token: require_env("ZENDESK_API_TOKEN")?,
        })
    }

    /// API token auth: `{email}/token:{api_token}`.
    pub fn auth(&self) -> Auth {
        Auth::Basic {
            user: f!("{}/token", self.email),
            password: self.api_token.clone(),
        }
    }

    pub fn base_url(&self) -> String {
        f!("https://{}.zendesk.com/api/v2", self.subdomain)
    }
}

/// Shared state for per-ticket work.
struct CommentFetcher<'a> {
    client: &'a reqwest::Client,
    base_url: &'a str,
    subdomain: &'a str,
    cache: Option<&'a JsonCache>,
    policy: &'a RetryPolicy,
}

impl CommentFetcher<'_> {
    fn cache_key(&self, ticket: &ZendeskTicket) -> String {
        let id = ticket.id.to_string();
        cache_key(&["comments", self.subdomain, id.as_str(), ticket.updated_at.as_str()])
    }

    /// All comments of a ticket, and whether they came from the cache.
    async fn comments(&self, ticket: &ZendeskTicket) -> Result<(Vec<ZendeskComment>, bool)> {
        let key = self.cache_key(ticket);

        if let Some(cache) = self.cache {
            if let Some(comments) = cache.get::<Vec<ZendeskComment>>(&key).await? {
                return Ok((comments, true));
            }
        }

        let first_url = f!("{}/tickets/{}/comments.json", self.base_url, ticket.id);
        let options = FetchOptions::new(100, PageStyle::Cursor).with_policy(self.policy.clone());
        let comments = fetch_all(&options, None, |request| {
            let url = request.cursor.unwrap_or_else(|| first_url.clone());
            let request = self.client.get(url);
            async move {
                let response: CommentsResponse = send_json(request).await?;
                Ok(Page::with_cursor(response.comments, response.next_page))
            }
        })
        .await?
        .items;

        if let Some(cache) = self.cache {
            cache.put(&key, &comments).await?;
        }

        Ok((comments, false))
    }
}

fn ticket_label(ticket: &ZendeskTicket) -> String {
    f!("ticket {}", ticket.id)
}

/// Keep successful records in order and describe every ticket as an outcome.
pub fn collect_records(
    tickets: &[ZendeskTicket],
    results: Vec<Result<(TicketRecord, bool)>>,
) -> (Vec<TicketRecord>, Vec<TransformOutcome>) {
    let mut records = Vec::new();
    let mut outcomes = Vec::new();

    for (ticket, result) in tickets.iter().zip(results) {
        let label = ticket_label(ticket);
        match result {
            Ok((record, cached)) => {
                let status = if cached {
                    ArtifactStatus::Cached
                } else {
                    ArtifactStatus::Written
                };
                outcomes.push(TransformOutcome::success(
                    label,
                    Artifact::new(f!("record {}", record.id), status),
                ));
                records.push(record);
            }
            Err(err) => outcomes.push(TransformOutcome::failure(label, f!("{err:#}"))),
        }
    }

    (records, outcomes)
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let range = app.dates.parse()?;
    let config = ZendeskConfig::from_env()?;
    let client = create_client(&config.auth())?;
    let base_url = app
        .api_url
        .clone()
        .unwrap_or_else(|| config.base_url())
        .trim_end_matches('/')
        .to_string();
    let cache = app.cache.open("zendesk")?;
    let policy = app.retry.policy();

    if global.verbose {
        eprintln!("Zendesk API: {}", base_url);
        if let Some(cache) = &cache {
            eprintln!("Cache: {}", cache.dir().display());
        }
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), f!("Fetching tickets from {}...", config.subdomain));

    let tickets_url = f!("{}/tickets.json", base_url);
    let page_size = app.page_size.clamp(1, 100);
    let options = FetchOptions::new(page_size, PageStyle::Cursor)
        .with_max_items(app.limit)
        .with_policy(policy.clone());
    let fetched = fetch_all(&options, Some(&spinner), |request| {
        let mut params = vec![("page[size]", request.page_size.to_string())];
        if let Some(cursor) = request.cursor {
            params.push(("page[after]", cursor));
        }
        let request = client.get(&tickets_url).query(&params);
        async move {
            let response: TicketsResponse = send_json(request).await?;
            Ok(into_page(response))
        }
    })
    .await;
    if fetched.is_err() {
        spinner.finish_and_clear();
    }
    let tickets = filter_by_created(fetched.wrap_err("Failed to fetch Zendesk tickets")?.items, &range);

    set_spinner_msg(Some(&spinner), f!("Fetching comments for {} tickets...", tickets.len()));

    let fetcher = CommentFetcher {
        client: &client,
        base_url: &base_url,
        subdomain: &config.subdomain,
        cache: cache.as_ref(),
        policy: &policy,
    };
    let results = map_ordered(tickets.clone(), app.concurrency, |ticket| {
        let fetcher = &fetcher;
        let public_only = app.public_only;
        async move {
            let (comments, cached) = fetcher.comments(&ticket).await?;
            Ok((transform_ticket(ticket, comments, public_only), cached))
        }
    })
    .await;
    spinner.finish_and_clear();

    let (records, outcomes) = collect_records(&tickets, results);
    let export = build_export(&config.subdomain, records);
    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
    println!("{}", json);

    print_summary("zendesk", &outcomes, global.verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(id: u64) -> ZendeskTicket {
        serde_json::from_value(json!({
            "id": id,
            "subject": "Printer",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_collect_records_keeps_order_and_failures() {
        let tickets = vec![ticket(1), ticket(2), ticket(3)];
        let results = vec![
            Ok((transform_ticket(ticket(1), vec![], false), false)),
            Err(eyre!("HTTP 404: Not Found")),
            Ok((transform_ticket(ticket(3), vec![], false), true)),
        ];

        let (records, outcomes) = collect_records(&tickets, results);

        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1], TransformOutcome::failure("ticket 2", "HTTP 404: Not Found"));
        assert_eq!(outcomes[2].artifact().unwrap().status, ArtifactStatus::Cached);
    }

    #[tokio::test]
    async fn test_cached_comments_skip_the_network() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = JsonCache::new(dir.path());
        let client = create_client(&Auth::None).unwrap();
        let policy = RetryPolicy::immediate(0);
        let fetcher = CommentFetcher {
            client: &client,
            // Nothing listens here; a network call would fail the test.
            base_url: "http://127.0.0.1:9/api/v2",
            subdomain: "acme",
            cache: Some(&cache),
            policy: &policy,
        };

        let ticket = ticket(7);
        let comments = vec![ZendeskComment {
            id: 1,
            author_id: Some(2),
            body: "Have you tried turning it off and on again?".to_string(),
            public: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }];
        cache.put(&fetcher.cache_key(&ticket), &comments).await.unwrap();

        let (fetched, cached) = fetcher.comments(&ticket).await.unwrap();

        assert!(cached);
        assert_eq!(fetched, comments);
    }

    #[test]
    fn test_cache_key_changes_with_updates() {
        let client = create_client(&Auth::None).unwrap();
        let policy = RetryPolicy::immediate(0);
        let fetcher = CommentFetcher {
            client: &client,
            base_url: "",
            subdomain: "acme",
            cache: None,
            policy: &policy,
        };

        let mut updated = ticket(7);
        updated.updated_at = "2024-02-01T00:00:00Z".to_string();

        assert_ne!(fetcher.cache_key(&ticket(7)), fetcher.cache_key(&updated));
        assert_eq!(fetcher.cache_key(&ticket(7)), fetcher.cache_key(&ticket(7)));
    }

    #[test]
    fn test_auth() {
        let config = ZendeskConfig {
            subdomain: "acme".to_string(),
            email: "agent@example.com".to_string(),
            api_token: "secret".to_string(),
        };
        assert_eq!(config.base_url(), "https://acme.zendesk.com/api/v2");
        assert!(matches!(
            config.auth(),
            Auth::Basic { ref user, .. } if user == "agent@example.com/token"
        ));
    }
}
