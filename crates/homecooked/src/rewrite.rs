//! `rewrite`: rewrite local files through an LLM following one instruction

use crate::artifact::write_artifact;
use crate::llm::{OllamaGenerator, Rewriter, TextGenerator};
use crate::options::{CacheArgs, RetryArgs};
use crate::pipeline::{map_bounded, print_summary};
use crate::prelude::{eprintln, *};
use homecooked_core::llm::Validation;
use homecooked_core::outcome::{Artifact, ArtifactStatus, TransformOutcome};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, clap::Args)]
pub struct App {
    /// Files to rewrite
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// What to do with each file
    #[arg(short, long, conflicts_with = "instruction_file", required_unless_present = "instruction_file")]
    pub instruction: Option<String>,

    /// Read the instruction from a file
    #[arg(long)]
    pub instruction_file: Option<PathBuf>,

    /// Write results into this directory instead of rewriting files in place
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Files processed at the same time
    #[arg(short = 'j', long, default_value_t = 3)]
    pub concurrency: usize,

    /// Copy files to <name>.bak before overwriting them
    #[arg(long)]
    pub backup: bool,

    /// Reject outputs shorter than this fraction of the input (0 disables)
    #[arg(long, default_value_t = 0.5)]
    pub min_ratio: f64,

    /// Require the output to be a JSON object with these top-level fields
    #[arg(long, value_delimiter = ',')]
    pub json_fields: Vec<String>,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model used for rewriting
    #[arg(long, env = "HOMECOOKED_MODEL", default_value = "llama3.1")]
    pub model: String,

    /// Upper bound on generated tokens per file
    #[arg(long, default_value_t = 4096)]
    pub max_tokens: u64,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub retry: RetryArgs,
}

impl App {
    pub fn validation(&self) -> Validation {
        Validation {
            min_length_ratio: self.min_ratio.max(0.0),
            required_json_fields: (!self.json_fields.is_empty()).then(|| self.json_fields.clone()),
        }
    }
}

/// What to do with every file in a batch.
#[derive(Debug, Clone)]
pub struct RewriteJob {
    pub instruction: String,
    pub output_dir: Option<PathBuf>,
    pub backup: bool,
}

/// Where the rewritten `path` goes.
pub fn target_path(path: &Path, output_dir: Option<&Path>) -> PathBuf {
    match (output_dir, path.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Keep the input's trailing newline, which models tend to drop.
fn match_trailing_newline(input: &str, mut output: String) -> String {
    if input.ends_with('\n') && !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

async fn rewrite_file<G: TextGenerator>(
    rewriter: &Rewriter<G>,
    job: &RewriteJob,
    path: PathBuf,
) -> Result<Artifact> {
    let input = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| eyre!("Failed to read file '{}': {}", path.display(), e))?;

    let rewrite = rewriter.rewrite(&job.instruction, &input).await?;
    let output = match_trailing_newline(&input, rewrite.output);

    let target = target_path(&path, job.output_dir.as_deref());
    let status = match write_artifact(&target, &output, job.backup).await? {
        ArtifactStatus::Unchanged if rewrite.cached => ArtifactStatus::Cached,
        status => status,
    };

    Ok(Artifact::new(target.display().to_string(), status))
}

/// Rewrite every file with at most `concurrency` model calls in flight.
pub async fn rewrite_files<G: TextGenerator>(
    rewriter: &Rewriter<G>,
    job: &RewriteJob,
    files: Vec<PathBuf>,
    concurrency: usize,
) -> Vec<TransformOutcome> {
    map_bounded(
        files,
        concurrency,
        |path| path.display().to_string(),
        |path| rewrite_file(rewriter, job, path),
    )
    .await
}

async fn read_instruction(app: &App) -> Result<String> {
    let instruction = match (&app.instruction, &app.instruction_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read instruction file '{}': {}", path.display(), e))?,
        (None, None) => return Err(eyre!("An instruction is required")),
    };

    if instruction.trim().is_empty() {
        return Err(eyre!("The instruction is empty"));
    }
    Ok(instruction)
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let instruction = read_instruction(&app).await?;
    let generator = OllamaGenerator::new(&app.ollama_url, &app.model, app.max_tokens)?;
    let cache = app.cache.open("rewrite")?;

    if global.verbose {
        eprintln!("Ollama URL: {}", app.ollama_url);
        eprintln!("Model: {}", app.model);
        eprintln!("Files: {}", app.files.len());
        if let Some(cache) = &cache {
            eprintln!("Cache: {}", cache.dir().display());
        }
    }

    let rewriter = Rewriter::new(generator)
        .with_cache(cache)
        .with_validation(app.validation())
        .with_policy(app.retry.policy());
    let job = RewriteJob {
        instruction,
        output_dir: app.output_dir.clone(),
        backup: app.backup,
    };

    let outcomes = rewrite_files(&rewriter, &job, app.files.clone(), app.concurrency).await;

    print_summary("rewrite", &outcomes, global.verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::JsonCache;
    use crate::llm::tests::FakeGenerator;
    use homecooked_core::retry::RetryPolicy;
    use tempfile::TempDir;

    const OUTPUT: &str = "# Notes\n\nThe quick brown fox jumps over the lazy dog.";

    fn write_inputs(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, f!("# notes\n\nthe quick brown fox ({name})\n")).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_second_run_is_served_from_cache() {
        let inputs = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let files = write_inputs(inputs.path(), &["a.md", "b.md", "c.md"]);

        let rewriter = Rewriter::new(FakeGenerator::answering(OUTPUT))
            .with_cache(Some(JsonCache::new(cache_dir.path())));
        let job = RewriteJob {
            instruction: "Capitalize sentences.".to_string(),
            output_dir: Some(outputs.path().to_path_buf()),
            backup: false,
        };

        let first = rewrite_files(&rewriter, &job, files.clone(), 2).await;
        let after_first: Vec<String> = ["a.md", "b.md", "c.md"]
            .iter()
            .map(|n| std::fs::read_to_string(outputs.path().join(n)).unwrap())
            .collect();
        assert_eq!(rewriter.generator().calls(), 3);
        assert!(first
            .iter()
            .all(|o| o.artifact().map(|a| a.status) == Some(ArtifactStatus::Written)));

        let second = rewrite_files(&rewriter, &job, files, 2).await;
        let after_second: Vec<String> = ["a.md", "b.md", "c.md"]
            .iter()
            .map(|n| std::fs::read_to_string(outputs.path().join(n)).unwrap())
            .collect();

        assert_eq!(rewriter.generator().calls(), 3);
        assert_eq!(after_first, after_second);
        assert!(second
            .iter()
            .all(|o| o.artifact().map(|a| a.status) == Some(ArtifactStatus::Cached)));
        assert_eq!(after_first[0], f!("{OUTPUT}\n"));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let inputs = TempDir::new().unwrap();
        let mut files = write_inputs(inputs.path(), &["a.md", "c.md"]);
        files.insert(1, inputs.path().join("missing.md"));

        let rewriter = Rewriter::new(FakeGenerator::answering(OUTPUT));
        let job = RewriteJob {
            instruction: "Capitalize sentences.".to_string(),
            output_dir: None,
            backup: true,
        };

        let outcomes = rewrite_files(&rewriter, &job, files.clone(), 3).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[1].item().ends_with("missing.md"));
        assert!(outcomes[2].is_success());
        assert_eq!(
            outcomes[0].artifact().unwrap().status,
            ArtifactStatus::Changed
        );

        // In-place rewrite with backup.
        assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), f!("{OUTPUT}\n"));
        let backup = crate::artifact::backup_path(&files[0]);
        assert!(std::fs::read_to_string(backup).unwrap().contains("the quick brown fox"));
    }

    #[tokio::test]
    async fn test_invalid_output_is_a_failure() {
        let inputs = TempDir::new().unwrap();
        let files = write_inputs(inputs.path(), &["a.md"]);
        let original = std::fs::read_to_string(&files[0]).unwrap();

        let rewriter = Rewriter::new(FakeGenerator::answering("   "))
            .with_policy(RetryPolicy::immediate(0));
        let job = RewriteJob {
            instruction: "Capitalize sentences.".to_string(),
            output_dir: None,
            backup: false,
        };

        let outcomes = rewrite_files(&rewriter, &job, files.clone(), 1).await;

        assert!(!outcomes[0].is_success());
        assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), original);
    }

    #[test]
    fn test_target_path() {
        assert_eq!(
            target_path(Path::new("docs/a.md"), Some(Path::new("out"))),
            PathBuf::from("out/a.md")
        );
        assert_eq!(target_path(Path::new("docs/a.md"), None), PathBuf::from("docs/a.md"));
    }

    #[test]
    fn test_match_trailing_newline() {
        assert_eq!(match_trailing_newline("a\n", "b".to_string()), "b\n");
        assert_eq!(match_trailing_newline("a", "b".to_string()), "b");
        assert_eq!(match_trailing_newline("a\n", "b\n".to_string()), "b\n");
    }

    #[test]
    fn test_validation_from_args() {
        use clap::Parser;

        #[derive(Debug, clap::Parser)]
        struct Cli {
            #[command(flatten)]
            app: App,
        }

        let cli = Cli::parse_from(["rewrite", "-i", "Summarize", "--json-fields", "title,summary", "a.md"]);
        let validation = cli.app.validation();

        assert_eq!(
            validation.required_json_fields,
            Some(vec!["title".to_string(), "summary".to_string()])
        );
        assert_eq!(validation.min_length_ratio, 0.5);
    }
}
