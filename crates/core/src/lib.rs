//! Core library for homecooked
//!
//! This crate implements the **Functional Core** of the homecooked tools,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`homecooked_core`** (this crate): Pure transformation functions with zero I/O
//! - **`homecooked`**: HTTP calls, sleeping, concurrency, disk and terminal output
//!
//! Every tool in the `homecooked` binary is the same pipeline:
//!
//! ```text
//! paginated fetch -> retry guard -> bounded-concurrency mapper -> record transformer -> reporter
//! ```
//!
//! The decisions inside that pipeline (when to ask for another page, how long
//! to back off, how to tally outcomes) live here so they can be tested with
//! plain fixture data.
//!
//! # Module Organization
//!
//! Pipeline building blocks:
//!
//! - [`pagination`]: Page continuation rules for cursor and offset APIs
//! - [`retry`]: Backoff arithmetic and transient-error classification
//! - [`outcome`]: Per-item success/failure results
//! - [`report`]: Batch summaries
//! - [`cache`]: Content-addressed cache keys
//! - [`llm`]: Prompt assembly and model output validation
//! - [`dates`]: Inclusive `YYYY-MM-DD` ranges
//! - [`graphql`]: Request/response envelopes
//! - [`text`]: Small text helpers shared by the Markdown renderers
//!
//! Per-tool transformations:
//!
//! - [`bank`]: Bank statement exports to budgeting CSV
//! - [`github`]: GitHub issues to Markdown
//! - [`linear`]: Linear issues to tagged plain text
//! - [`readwise`]: Readwise highlights to Markdown
//! - [`fireflies`]: Fireflies meeting transcripts to Markdown
//! - [`zendesk`]: Zendesk tickets to JSON records
//! - [`trustpilot`]: Trustpilot review pages to JSON records
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use homecooked_core::pagination::{next_request, Page, PageRequest, PageStyle};
//!
//! let request = PageRequest::first(2);
//! let page = Page::with_cursor(vec![1, 2], Some("abc".to_string()));
//!
//! let next = next_request(PageStyle::Cursor, &request, &page).unwrap();
//! assert_eq!(next.cursor.as_deref(), Some("abc"));
//! assert_eq!(next.offset, 2);
//! ```

pub mod bank;
pub mod cache;
pub mod dates;
pub mod fireflies;
pub mod github;
pub mod graphql;
pub mod linear;
pub mod llm;
pub mod outcome;
pub mod pagination;
pub mod readwise;
pub mod report;
pub mod retry;
pub mod text;
pub mod trustpilot;
pub mod zendesk;
