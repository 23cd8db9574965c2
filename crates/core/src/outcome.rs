//! Per-item transform results

use serde::Serialize;

/// What happened to the artifact produced for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// A new artifact was created.
    Written,
    /// An existing artifact was replaced with different content.
    Changed,
    /// The artifact already had identical content; nothing was written.
    Unchanged,
    /// The result came from the on-disk cache without a remote call.
    Cached,
}

/// Reference to an artifact produced by a record transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Path or other identifier of the produced artifact.
    pub reference: String,
    pub status: ArtifactStatus,
}

impl Artifact {
    pub fn new(reference: impl Into<String>, status: ArtifactStatus) -> Self {
        Self {
            reference: reference.into(),
            status,
        }
    }
}

/// Result of converting one item. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransformOutcome {
    Success { item: String, artifact: Artifact },
    Failure { item: String, reason: String },
}

impl TransformOutcome {
    pub fn success(item: impl Into<String>, artifact: Artifact) -> Self {
        Self::Success {
            item: item.into(),
            artifact,
        }
    }

    pub fn failure(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failure {
            item: item.into(),
            reason: reason.into(),
        }
    }

    /// Label of the item this outcome belongs to.
    pub fn item(&self) -> &str {
        match self {
            Self::Success { item, .. } | Self::Failure { item, .. } => item,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Success { artifact, .. } => Some(artifact),
            Self::Failure { .. } => None,
        }
    }
}
