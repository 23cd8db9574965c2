//! Output files

use crate::prelude::*;
use homecooked_core::outcome::{Artifact, ArtifactStatus};
use std::path::{Path, PathBuf};

/// `<path>.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Write `content` to `path` unless it already holds exactly that content.
///
/// With `backup`, an existing file is copied to `<path>.bak` before being
/// replaced.
pub async fn write_artifact(path: &Path, content: &str, backup: bool) -> Result<ArtifactStatus> {
    let status = match tokio::fs::read(path).await {
        Ok(existing) if existing == content.as_bytes() => return Ok(ArtifactStatus::Unchanged),
        Ok(_) => {
            if backup {
                let target = backup_path(path);
                tokio::fs::copy(path, &target)
                    .await
                    .wrap_err_with(|| f!("Failed to back up {} to {}", path.display(), target.display()))?;
            }
            ArtifactStatus::Changed
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .wrap_err_with(|| f!("Failed to create directory {}", parent.display()))?;
            }
            ArtifactStatus::Written
        }
        Err(e) => return Err(e).wrap_err_with(|| f!("Failed to read {}", path.display())),
    };

    tokio::fs::write(path, content)
        .await
        .wrap_err_with(|| f!("Failed to write {}", path.display()))?;

    Ok(status)
}

/// Write `file_name` under `dir` and describe the result as an [`Artifact`].
pub async fn write_file_artifact(
    dir: &Path,
    file_name: &str,
    content: &str,
    backup: bool,
) -> Result<Artifact> {
    let path = dir.join(file_name);
    let status = write_artifact(&path, content, backup).await?;
    Ok(Artifact::new(path.display().to_string(), status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_written_changed_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("note.md");

        assert_eq!(write_artifact(&path, "one", false).await.unwrap(), ArtifactStatus::Written);
        assert_eq!(write_artifact(&path, "one", false).await.unwrap(), ArtifactStatus::Unchanged);
        assert_eq!(write_artifact(&path, "two", false).await.unwrap(), ArtifactStatus::Changed);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        assert!(!backup_path(&path).exists());
    }

    #[tokio::test]
    async fn test_backup_before_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.txt");
        std::fs::write(&path, "original").unwrap();

        let status = write_artifact(&path, "rewritten", true).await.unwrap();

        assert_eq!(status, ArtifactStatus::Changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "rewritten");
        assert_eq!(std::fs::read_to_string(backup_path(&path)).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_no_backup_when_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("same.txt");
        std::fs::write(&path, "same").unwrap();

        let status = write_artifact(&path, "same", true).await.unwrap();

        assert_eq!(status, ArtifactStatus::Unchanged);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(backup_path(Path::new("a/b.md")), PathBuf::from("a/b.md.bak"));
    }

    #[tokio::test]
    async fn test_write_file_artifact() {
        let dir = TempDir::new().unwrap();
        let artifact = write_file_artifact(dir.path(), "issue-1.md", "# Hi\n", false)
            .await
            .unwrap();

        assert_eq!(artifact.status, ArtifactStatus::Written);
        assert!(artifact.reference.ends_with("issue-1.md"));
    }
}
