use colored::Colorize;
use homecooked_core::outcome::{ArtifactStatus, TransformOutcome};
use homecooked_core::report::{render_summary, Summary};
use std::io::Write;

fn status_label(outcome: &TransformOutcome) -> String {
    match outcome.artifact().map(|a| a.status) {
        Some(ArtifactStatus::Written) => "written".green().to_string(),
        Some(ArtifactStatus::Changed) => "changed".yellow().to_string(),
        Some(ArtifactStatus::Unchanged) => "unchanged".dimmed().to_string(),
        Some(ArtifactStatus::Cached) => "cached".cyan().to_string(),
        None => "failed".red().to_string(),
    }
}

/// Write the outcome table and summary to `out`.
///
/// Write errors are ignored: a broken stderr must not change the run's result.
pub fn write_summary(out: &mut dyn Write, title: &str, outcomes: &[TransformOutcome], verbose: bool) {
    if verbose && !outcomes.is_empty() {
        let mut table = crate::prelude::new_table();
        table.add_row(prettytable::row![
            "Item".bold().cyan(),
            "Status".bold().cyan(),
            "Artifact".bold().cyan()
        ]);
        for outcome in outcomes {
            let reference = outcome
                .artifact()
                .map(|a| a.reference.clone())
                .unwrap_or_default();
            table.add_row(prettytable::row![outcome.item(), status_label(outcome), reference]);
        }
        let _ = table.print(out);
        let _ = writeln!(out);
    }

    let text = render_summary(title, outcomes);
    let (headline, details) = text.split_once('\n').unwrap_or((text.as_str(), ""));
    let headline = if Summary::from_outcomes(outcomes).has_failures() {
        headline.yellow().bold()
    } else {
        headline.green().bold()
    };

    let _ = writeln!(out, "{headline}");
    let _ = write!(out, "{details}");
}

/// Print the run summary to stderr.
pub fn print_summary(title: &str, outcomes: &[TransformOutcome], verbose: bool) {
    let mut stderr = anstream::stderr();
    write_summary(&mut stderr, title, outcomes, verbose);
    let _ = stderr.flush();
}
