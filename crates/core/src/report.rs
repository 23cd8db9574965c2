//! Batch run summaries
//!
//! Tallies a sequence of [`TransformOutcome`] values and renders a
//! deterministic, human-readable summary. Rendering never fails.

use crate::outcome::{ArtifactStatus, TransformOutcome};
use serde::Serialize;

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub written: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub cached: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[TransformOutcome]) -> Self {
        let mut summary = Summary {
            total: outcomes.len(),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome {
                TransformOutcome::Success { artifact, .. } => {
                    summary.succeeded += 1;
                    match artifact.status {
                        ArtifactStatus::Written => summary.written += 1,
                        ArtifactStatus::Changed => summary.changed += 1,
                        ArtifactStatus::Unchanged => summary.unchanged += 1,
                        ArtifactStatus::Cached => summary.cached += 1,
                    }
                }
                TransformOutcome::Failure { .. } => summary.failed += 1,
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Render a summary followed by one line per failure, in input order.
///
/// Status sub-counts with a value of zero are omitted so tools that only
/// ever write new files get a short summary.
pub fn render_summary(title: &str, outcomes: &[TransformOutcome]) -> String {
    let summary = Summary::from_outcomes(outcomes);
    let mut out = String::new();

    out.push_str(&format!(
        "{title}: {} processed, {} succeeded, {} failed\n",
        summary.total, summary.succeeded, summary.failed
    ));

    let breakdown: Vec<String> = [
        ("written", summary.written),
        ("changed", summary.changed),
        ("unchanged", summary.unchanged),
        ("cached", summary.cached),
    ]
    .iter()
    .filter(|(_, count)| *count > 0)
    .map(|(label, count)| format!("{count} {label}"))
    .collect();

    if !breakdown.is_empty() {
        out.push_str(&format!("  {}\n", breakdown.join(", ")));
    }

    let failures: Vec<&TransformOutcome> = outcomes.iter().filter(|o| !o.is_success()).collect();
    if !failures.is_empty() {
        out.push_str("Failures:\n");
        for failure in failures {
            if let TransformOutcome::Failure { item, reason } = failure {
                out.push_str(&format!("  - {item}: {reason}\n"));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Artifact;

    fn ok(item: &str, status: ArtifactStatus) -> TransformOutcome {
        TransformOutcome::success(item, Artifact::new(format!("out/{item}.md"), status))
    }

    fn err(item: &str, reason: &str) -> TransformOutcome {
        TransformOutcome::failure(item, reason)
    }

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            ok("a", ArtifactStatus::Written),
            ok("b", ArtifactStatus::Changed),
            err("c", "boom"),
            ok("d", ArtifactStatus::Unchanged),
            ok("e", ArtifactStatus::Cached),
            ok("f", ArtifactStatus::Changed),
        ];

        let summary = Summary::from_outcomes(&outcomes);

        assert_eq!(summary.total, 6);
        assert_eq!(summary.succeeded, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.changed, 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.cached, 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_outcomes(&[]);
        assert_eq!(summary, Summary::default());
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_render_summary_lists_failures_in_order() {
        let outcomes = vec![
            err("first", "timeout"),
            ok("second", ArtifactStatus::Written),
            err("third", "invalid JSON"),
        ];

        let rendered = render_summary("gh2md", &outcomes);

        assert_eq!(
            rendered,
            "gh2md: 3 processed, 1 succeeded, 2 failed\n  1 written\nFailures:\n  - first: timeout\n  - third: invalid JSON\n"
        );
    }

    #[test]
    fn test_render_summary_no_failures() {
        let outcomes = vec![
            ok("a", ArtifactStatus::Changed),
            ok("b", ArtifactStatus::Unchanged),
        ];

        let rendered = render_summary("rewrite", &outcomes);

        assert!(rendered.starts_with("rewrite: 2 processed, 2 succeeded, 0 failed\n"));
        assert!(rendered.contains("1 changed, 1 unchanged"));
        assert!(!rendered.contains("Failures"));
    }

    #[test]
    fn test_render_summary_is_deterministic() {
        let outcomes = vec![ok("a", ArtifactStatus::Written), err("b", "nope")];
        assert_eq!(
            render_summary("x", &outcomes),
            render_summary("x", &outcomes)
        );
    }
}
