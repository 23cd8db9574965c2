//! Transformation functions for GitHub issues

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Issue from `GET /repos/{owner}/{repo}/issues`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: Option<GitHubUser>,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub comments: u64,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl GitHubIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubLabel {
    pub name: String,
}

/// Comment from `GET /repos/{owner}/{repo}/issues/{number}/comments`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubComment {
    pub id: u64,
    pub user: Option<GitHubUser>,
    pub created_at: String,
    #[serde(default)]
    pub body: Option<String>,
}

// =============================================================================
// Pagination
// =============================================================================

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="([^"]+)""#).expect("link pattern is valid"))
}

/// Extract the `rel="next"` URL from a `Link` response header.
pub fn parse_next_link(header: &str) -> Option<String> {
    link_pattern()
        .captures_iter(header)
        .find(|caps| caps[2].split_whitespace().any(|rel| rel == "next"))
        .map(|caps| caps[1].to_string())
}

// =============================================================================
// Rendering
// =============================================================================

fn login(user: &Option<GitHubUser>) -> &str {
    user.as_ref().map(|u| u.login.as_str()).unwrap_or("ghost")
}

/// Output file name for an issue.
pub fn issue_file_name(issue: &GitHubIssue) -> String {
    format!("issue-{}.md", issue.number)
}

/// Render an issue and its comments as Markdown, one heading per record.
pub fn render_issue_markdown(issue: &GitHubIssue, comments: &[GitHubComment]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# #{} {}\n\n", issue.number, issue.title.trim()));
    out.push_str(&format!("- **State:** {}\n", issue.state));
    out.push_str(&format!("- **Author:** @{}\n", login(&issue.user)));
    out.push_str(&format!("- **Created:** {}\n", issue.created_at));
    if let Some(closed) = &issue.closed_at {
        out.push_str(&format!("- **Closed:** {closed}\n"));
    }
    if !issue.labels.is_empty() {
        let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
        out.push_str(&format!("- **Labels:** {}\n", labels.join(", ")));
    }
    out.push_str(&format!("- **URL:** {}\n", issue.html_url));

    let body = issue.body.as_deref().map(str::trim).unwrap_or("");
    out.push('\n');
    if body.is_empty() {
        out.push_str("_No description provided._\n");
    } else {
        out.push_str(body);
        out.push('\n');
    }

    if !comments.is_empty() {
        out.push_str("\n## Comments\n");
        for comment in comments {
            out.push_str(&format!(
                "\n### @{} on {}\n\n",
                login(&comment.user),
                comment.created_at
            ));
            out.push_str(comment.body.as_deref().map(str::trim).unwrap_or(""));
            out.push('\n');
        }
    }

    out
}
