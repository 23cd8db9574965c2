//! Linear issues to tagged-section plain text
//!
//! The output is meant to be pasted into an LLM context window: every issue
//! becomes an `<issue>` block with one tag per field, and free text is
//! escaped so it can never close a tag early.

use crate::dates::DateRange;
use crate::pagination::Page;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const ISSUES_QUERY: &str = r#"query Issues($filter: IssueFilter, $first: Int!, $after: String) {
  issues(filter: $filter, first: $first, after: $after, orderBy: createdAt) {
    nodes {
      identifier
      title
      description
      priorityLabel
      url
      createdAt
      updatedAt
      state { name }
      assignee { name }
      team { key }
      labels { nodes { name } }
      comments { nodes { body createdAt user { name } } }
    }
    pageInfo { hasNextPage endCursor }
  }
}"#;

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct IssuesData {
    pub issues: IssueConnection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueConnection {
    pub nodes: Vec<LinearIssue>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LinearIssue {
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority_label: Option<String>,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub state: Option<Named>,
    #[serde(default)]
    pub assignee: Option<Named>,
    #[serde(default)]
    pub team: Option<TeamRef>,
    #[serde(default)]
    pub labels: Option<Nodes<Named>>,
    #[serde(default)]
    pub comments: Option<Nodes<LinearComment>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TeamRef {
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LinearComment {
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub user: Option<Named>,
}

// =============================================================================
// Request building
// =============================================================================

/// Build the `IssueFilter` for a team key and an inclusive update-date range.
pub fn build_filter(team: Option<&str>, range: &DateRange) -> Value {
    let mut filter = serde_json::Map::new();

    if let Some(team) = team {
        filter.insert("team".to_string(), json!({ "key": { "eq": team } }));
    }

    let mut updated = serde_json::Map::new();
    if let Some(start) = range.start_timestamp() {
        updated.insert("gte".to_string(), Value::String(start));
    }
    if let Some(end) = range.end_timestamp() {
        updated.insert("lte".to_string(), Value::String(end));
    }
    if !updated.is_empty() {
        filter.insert("updatedAt".to_string(), Value::Object(updated));
    }

    Value::Object(filter)
}

/// Variables for one page of [`ISSUES_QUERY`].
pub fn build_variables(filter: &Value, first: usize, after: Option<&str>) -> Value {
    json!({
        "filter": filter,
        "first": first,
        "after": after,
    })
}

/// Convert a connection into a generic page. `endCursor` is only kept while
/// `hasNextPage` is true so the cursor is absent exactly on the last page.
pub fn into_page(connection: IssueConnection) -> Page<LinearIssue> {
    let cursor = if connection.page_info.has_next_page {
        connection.page_info.end_cursor
    } else {
        None
    };
    Page::with_cursor(connection.nodes, cursor).has_more(connection.page_info.has_next_page)
}

// =============================================================================
// Rendering
// =============================================================================

fn text(value: &str) -> String {
    html_escape::encode_text(value.trim()).to_string()
}

fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).to_string()
}

fn tag(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!("<{name}>{}</{name}>\n", text(value)));
}

/// Render one issue as a tagged section.
pub fn render_issue(issue: &LinearIssue) -> String {
    let mut out = format!("<issue id=\"{}\">\n", attr(&issue.identifier));

    tag(&mut out, "title", &issue.title);
    if let Some(team) = &issue.team {
        tag(&mut out, "team", &team.key);
    }
    if let Some(state) = &issue.state {
        tag(&mut out, "state", &state.name);
    }
    if let Some(priority) = &issue.priority_label {
        tag(&mut out, "priority", priority);
    }
    tag(
        &mut out,
        "assignee",
        issue
            .assignee
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("Unassigned"),
    );

    let labels: Vec<&str> = issue
        .labels
        .iter()
        .flat_map(|l| l.nodes.iter().map(|n| n.name.as_str()))
        .collect();
    if !labels.is_empty() {
        tag(&mut out, "labels", &labels.join(", "));
    }

    tag(&mut out, "created", &issue.created_at);
    tag(&mut out, "updated", &issue.updated_at);
    tag(&mut out, "url", &issue.url);

    let description = issue.description.as_deref().unwrap_or("").trim();
    if !description.is_empty() {
        out.push_str(&format!("<description>\n{}\n</description>\n", text(description)));
    }

    let comments: &[LinearComment] = issue
        .comments
        .as_ref()
        .map(|c| c.nodes.as_slice())
        .unwrap_or(&[]);
    if !comments.is_empty() {
        out.push_str("<comments>\n");
        for comment in comments {
            let author = comment
                .user
                .as_ref()
                .map(|u| u.name.as_str())
                .unwrap_or("Unknown");
            out.push_str(&format!(
                "<comment author=\"{}\" created=\"{}\">\n{}\n</comment>\n",
                attr(author),
                attr(&comment.created_at),
                text(&comment.body)
            ));
        }
        out.push_str("</comments>\n");
    }

    out.push_str("</issue>\n");
    out
}

/// Render all issues, separated by blank lines, in fetch order.
pub fn render_issues(issues: &[LinearIssue]) -> String {
    issues
        .iter()
        .map(render_issue)
        .collect::<Vec<_>>()
        .join("\n")
}
