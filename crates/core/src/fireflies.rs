//! Fireflies meeting transcripts to Markdown

use crate::dates::DateRange;
use crate::text::slugify;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Largest page the transcripts query accepts.
pub const MAX_PAGE_SIZE: usize = 50;

pub const TRANSCRIPTS_QUERY: &str = r#"query Transcripts($limit: Int, $skip: Int, $fromDate: DateTime, $toDate: DateTime) {
  transcripts(limit: $limit, skip: $skip, fromDate: $fromDate, toDate: $toDate) {
    id
    title
    date
  }
}"#;

pub const TRANSCRIPT_QUERY: &str = r#"query Transcript($id: String!) {
  transcript(id: $id) {
    id
    title
    date
    duration
    participants
    transcript_url
    sentences { speaker_name text start_time }
    summary { overview action_items }
  }
}"#;

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptsData {
    pub transcripts: Vec<TranscriptSummary>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptData {
    pub transcript: Option<Transcript>,
}

/// List entry; details are fetched per transcript.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TranscriptSummary {
    pub id: String,
    pub title: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub date: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Transcript {
    pub id: String,
    pub title: Option<String>,
    pub date: Option<f64>,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub transcript_url: Option<String>,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    #[serde(default)]
    pub summary: Option<TranscriptNotes>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Sentence {
    pub speaker_name: Option<String>,
    pub text: String,
    /// Seconds from the start of the meeting.
    #[serde(default)]
    pub start_time: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TranscriptNotes {
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub action_items: Option<String>,
}

// =============================================================================
// Request building
// =============================================================================

pub fn list_variables(limit: usize, skip: usize, range: &DateRange) -> Value {
    json!({
        "limit": limit.min(MAX_PAGE_SIZE),
        "skip": skip,
        "fromDate": range.start_timestamp(),
        "toDate": range.end_timestamp(),
    })
}

pub fn detail_variables(id: &str) -> Value {
    json!({ "id": id })
}

// =============================================================================
// Rendering
// =============================================================================

/// `YYYY-MM-DD` for an epoch-milliseconds date.
pub fn format_day(date_ms: Option<f64>) -> Option<String> {
    let dt = DateTime::<Utc>::from_timestamp_millis(date_ms? as i64)?;
    Some(dt.format("%Y-%m-%d").to_string())
}

fn format_datetime(date_ms: Option<f64>) -> Option<String> {
    let dt = DateTime::<Utc>::from_timestamp_millis(date_ms? as i64)?;
    Some(dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// `mm:ss` (or `h:mm:ss`) offset for a sentence start time.
pub fn format_offset(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

pub fn transcript_file_name(summary: &TranscriptSummary) -> String {
    let day = format_day(summary.date).unwrap_or_else(|| "undated".to_string());
    let title = summary.title.as_deref().unwrap_or("untitled");
    format!("{day}-{}.md", slugify(title, 60))
}

/// A run of consecutive sentences by the same speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerTurn {
    pub speaker: String,
    pub start_time: Option<f64>,
    pub text: String,
}

/// Merge consecutive sentences from the same speaker.
pub fn group_turns(sentences: &[Sentence]) -> Vec<SpeakerTurn> {
    let mut turns: Vec<SpeakerTurn> = Vec::new();

    for sentence in sentences {
        let speaker = sentence
            .speaker_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Unknown speaker".to_string());
        let text = sentence.text.trim();
        if text.is_empty() {
            continue;
        }

        match turns.last_mut() {
            Some(turn) if turn.speaker == speaker => {
                turn.text.push(' ');
                turn.text.push_str(text);
            }
            _ => turns.push(SpeakerTurn {
                speaker,
                start_time: sentence.start_time,
                text: text.to_string(),
            }),
        }
    }

    turns
}

/// Render a transcript with one heading per speaker turn.
pub fn render_transcript_markdown(transcript: &Transcript) -> String {
    let title = transcript.title.as_deref().unwrap_or("Untitled meeting");
    let mut out = format!("# {}\n\n", title.trim());

    if let Some(date) = format_datetime(transcript.date) {
        out.push_str(&format!("- **Date:** {date}\n"));
    }
    if let Some(duration) = transcript.duration {
        out.push_str(&format!("- **Duration:** {} min\n", duration.round() as i64));
    }
    if !transcript.participants.is_empty() {
        out.push_str(&format!(
            "- **Participants:** {}\n",
            transcript.participants.join(", ")
        ));
    }
    if let Some(url) = &transcript.transcript_url {
        out.push_str(&format!("- **Recording:** {url}\n"));
    }

    if let Some(notes) = &transcript.summary {
        if let Some(overview) = notes.overview.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            out.push_str(&format!("\n## Overview\n\n{overview}\n"));
        }
        if let Some(items) = notes.action_items.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
            out.push_str(&format!("\n## Action Items\n\n{items}\n"));
        }
    }

    let turns = group_turns(&transcript.sentences);
    if !turns.is_empty() {
        out.push_str("\n## Transcript\n");
        for turn in turns {
            match turn.start_time {
                Some(start) => out.push_str(&format!(
                    "\n### {} [{}]\n\n",
                    turn.speaker,
                    format_offset(start)
                )),
                None => out.push_str(&format!("\n### {}\n\n", turn.speaker)),
            }
            out.push_str(&turn.text);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(speaker: &str, text: &str, start: f64) -> Sentence {
        Sentence {
            speaker_name: Some(speaker.to_string()),
            text: text.to_string(),
            start_time: Some(start),
        }
    }

    #[test]
    fn test_group_turns_merges_consecutive_speakers() {
        let sentences = vec![
            sentence("Ana", "Hi all.", 0.0),
            sentence("Ana", "Let's start.", 2.0),
            sentence("Ben", "Sure.", 5.0),
            sentence("Ana", "Great.", 7.5),
        ];

        let turns = group_turns(&sentences);

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text, "Hi all. Let's start.");
        assert_eq!(turns[0].start_time, Some(0.0));
        assert_eq!(turns[1].speaker, "Ben");
        assert_eq!(turns[2].start_time, Some(7.5));
    }

    #[test]
    fn test_group_turns_unknown_and_empty() {
        let sentences = vec![
            Sentence {
                speaker_name: None,
                text: "Hello".to_string(),
                start_time: None,
            },
            sentence("Ana", "   ", 1.0),
        ];

        let turns = group_turns(&sentences);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].speaker, "Unknown speaker");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0.0), "00:00");
        assert_eq!(format_offset(75.9), "01:15");
        assert_eq!(format_offset(3723.0), "1:02:03");
        assert_eq!(format_offset(-4.0), "00:00");
    }

    #[test]
    fn test_format_day() {
        assert_eq!(format_day(Some(1_704_067_200_000.0)).as_deref(), Some("2024-01-01"));
        assert_eq!(format_day(None), None);
    }

    #[test]
    fn test_transcript_file_name() {
        let summary = TranscriptSummary {
            id: "abc".to_string(),
            title: Some("Weekly Sync: Platform".to_string()),
            date: Some(1_704_067_200_000.0),
        };
        assert_eq!(transcript_file_name(&summary), "2024-01-01-weekly-sync-platform.md");

        let summary = TranscriptSummary {
            id: "abc".to_string(),
            title: None,
            date: None,
        };
        assert_eq!(transcript_file_name(&summary), "undated-untitled.md");
    }

    #[test]
    fn test_render_transcript_markdown() {
        let transcript = Transcript {
            id: "t1".to_string(),
            title: Some("Weekly Sync".to_string()),
            date: Some(1_704_067_200_000.0),
            duration: Some(29.6),
            participants: vec!["ana@example.com".to_string(), "ben@example.com".to_string()],
            transcript_url: Some("https://app.fireflies.ai/view/t1".to_string()),
            sentences: vec![sentence("Ana", "Hi.", 0.0), sentence("Ben", "Hello.", 61.0)],
            summary: Some(TranscriptNotes {
                overview: Some("Status update.".to_string()),
                action_items: Some("".to_string()),
            }),
        };

        let md = render_transcript_markdown(&transcript);

        assert_eq!(
            md,
            "# Weekly Sync\n\n\
             - **Date:** 2024-01-01 00:00 UTC\n\
             - **Duration:** 30 min\n\
             - **Participants:** ana@example.com, ben@example.com\n\
             - **Recording:** https://app.fireflies.ai/view/t1\n\
             \n## Overview\n\nStatus update.\n\
             \n## Transcript\n\
             \n### Ana [00:00]\n\nHi.\n\
             \n### Ben [01:01]\n\nHello.\n"
        );
    }

    #[test]
    fn test_list_variables_caps_limit() {
        let range = DateRange::parse(Some("2024-01-01"), None).unwrap();
        let vars = list_variables(500, 100, &range);
        assert_eq!(vars["limit"], 50);
        assert_eq!(vars["skip"], 100);
        assert_eq!(vars["fromDate"], "2024-01-01T00:00:00Z");
        assert!(vars["toDate"].is_null());
    }
}
