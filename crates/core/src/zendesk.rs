//! Zendesk tickets to JSON records

use crate::dates::DateRange;
use crate::pagination::Page;
use serde::{Deserialize, Serialize};

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Response from `GET /api/v2/tickets.json` with cursor pagination.
#[derive(Debug, Deserialize, Clone)]
pub struct TicketsResponse {
    pub tickets: Vec<ZendeskTicket>,
    pub meta: CursorMeta,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CursorMeta {
    pub has_more: bool,
    #[serde(default)]
    pub after_cursor: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ZendeskTicket {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub requester_id: Option<u64>,
    #[serde(default)]
    pub assignee_id: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Response from `GET /api/v2/tickets/{id}/comments.json`.
#[derive(Debug, Deserialize, Clone)]
pub struct CommentsResponse {
    pub comments: Vec<ZendeskComment>,
    #[serde(default)]
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ZendeskComment {
    pub id: u64,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub public: bool,
    pub created_at: String,
}

/// Convert a tickets response into a generic page.
pub fn into_page(response: TicketsResponse) -> Page<ZendeskTicket> {
    let cursor = if response.meta.has_more {
        response.meta.after_cursor
    } else {
        None
    };
    Page::with_cursor(response.tickets, cursor).has_more(response.meta.has_more)
}

// =============================================================================
// Output Types
// =============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TicketRecord {
    pub id: u64,
    pub subject: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Vec<String>,
    pub requester_id: Option<u64>,
    pub assignee_id: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
    pub description: String,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentRecord {
    pub author_id: Option<u64>,
    pub public: bool,
    pub created_at: String,
    pub body: String,
}

/// Top-level JSON document written to stdout.
#[derive(Debug, Serialize, Clone)]
pub struct TicketExport {
    pub subdomain: String,
    pub total_count: usize,
    pub records: Vec<TicketRecord>,
}

/// Keep only tickets created inside `range`, preserving order.
pub fn filter_by_created(tickets: Vec<ZendeskTicket>, range: &DateRange) -> Vec<ZendeskTicket> {
    tickets
        .into_iter()
        .filter(|t| range.contains_timestamp(&t.created_at))
        .collect()
}

pub fn transform_ticket(
    ticket: ZendeskTicket,
    comments: Vec<ZendeskComment>,
    public_only: bool,
) -> TicketRecord {
    let comments = comments
        .into_iter()
        .filter(|c| c.public || !public_only)
        .map(|c| CommentRecord {
            author_id: c.author_id,
            public: c.public,
            created_at: c.created_at,
            body: c.body.trim().to_string(),
        })
        .collect();

    TicketRecord {
        id: ticket.id,
        subject: ticket.subject.unwrap_or_default(),
        status: ticket.status,
        priority: ticket.priority,
        tags: ticket.tags,
        requester_id: ticket.requester_id,
        assignee_id: ticket.assignee_id,
        created_at: ticket.created_at,
        updated_at: ticket.updated_at,
        description: ticket.description.unwrap_or_default().trim().to_string(),
        comments,
    }
}

pub fn build_export(subdomain: &str, records: Vec<TicketRecord>) -> TicketExport {
    TicketExport {
        subdomain: subdomain.to_string(),
        total_count: records.len(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(id: u64, created_at: &str) -> ZendeskTicket {
        serde_json::from_value(json!({
            "id": id,
            "subject": format!("Ticket {id}"),
            "description": " Printer on fire \n",
            "status": "open",
            "priority": null,
            "tags": ["hardware"],
            "created_at": created_at,
            "updated_at": created_at
        }))
        .unwrap()
    }

    fn comment(id: u64, public: bool) -> ZendeskComment {
        ZendeskComment {
            id,
            author_id: Some(7),
            body: format!(" body {id} "),
            public,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_into_page() {
        let response: TicketsResponse = serde_json::from_value(json!({
            "tickets": [],
            "meta": {"has_more": true, "after_cursor": "xyz"}
        }))
        .unwrap();
        let page = into_page(response);
        assert_eq!(page.next_cursor.as_deref(), Some("xyz"));

        let response: TicketsResponse = serde_json::from_value(json!({
            "tickets": [],
            "meta": {"has_more": false, "after_cursor": "stale"}
        }))
        .unwrap();
        let page = into_page(response);
        assert_eq!(page.next_cursor, None);
        assert_eq!(page.has_more, Some(false));
    }

    #[test]
    fn test_transform_ticket() {
        let record = transform_ticket(
            ticket(1, "2024-01-01T10:00:00Z"),
            vec![comment(1, true), comment(2, false)],
            false,
        );

        assert_eq!(record.id, 1);
        assert_eq!(record.subject, "Ticket 1");
        assert_eq!(record.description, "Printer on fire");
        assert_eq!(record.comments.len(), 2);
        assert_eq!(record.comments[0].body, "body 1");
    }

    #[test]
    fn test_transform_ticket_public_only() {
        let record = transform_ticket(
            ticket(1, "2024-01-01T10:00:00Z"),
            vec![comment(1, true), comment(2, false)],
            true,
        );
        assert_eq!(record.comments.len(), 1);
        assert!(record.comments[0].public);
    }

    #[test]
    fn test_filter_by_created() {
        let range = DateRange::parse(Some("2024-01-02"), Some("2024-01-03")).unwrap();
        let tickets = vec![
            ticket(1, "2024-01-01T23:59:59Z"),
            ticket(2, "2024-01-02T00:00:00Z"),
            ticket(3, "2024-01-03T12:00:00Z"),
            ticket(4, "2024-01-04T00:00:00Z"),
        ];

        let ids: Vec<u64> = filter_by_created(tickets, &range).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_build_export_shape() {
        let records = vec![transform_ticket(ticket(1, "2024-01-01T00:00:00Z"), vec![], false)];
        let export = build_export("acme", records);
        let value = serde_json::to_value(&export).unwrap();

        assert_eq!(value["subdomain"], "acme");
        assert_eq!(value["total_count"], 1);
        assert_eq!(value["records"][0]["id"], 1);
        assert_eq!(value["records"][0]["tags"][0], "hardware");
    }
}
