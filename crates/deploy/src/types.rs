//! Data types for the deploy flow.

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Per-deploy settings.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Labels attached to the new deployment.
    pub labels: Vec<String>,
    /// Strip the directory shared by every file before upload.
    pub path_detect: bool,
    /// Ask the API whether the batch is a single-page app.
    pub spa_detect: bool,
    /// Aborts the SPA check and the upload when cancelled.
    pub cancel: Option<CancellationToken>,
    /// Per-request timeout; the transport default applies when unset.
    pub timeout: Option<Duration>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            labels: Vec::new(),
            path_detect: true,
            spa_detect: true,
            cancel: None,
            timeout: None,
        }
    }
}

/// Where a deploy currently is.
///
/// `CollectingInput → Validating → (DetectingSpa) → Uploading`, ending in
/// one of the terminal phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployPhase {
    CollectingInput,
    Validating,
    DetectingSpa,
    Uploading,
    Completed,
    Cancelled,
    Failed,
}

impl DeployPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Progress event emitted during deployment.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// Entered a new phase.
    Phase(DeployPhase),
    /// The batch was classified as an SPA and a rewrite config was added.
    SpaDetected,
    /// SPA detection failed; the upload continues without it.
    SpaDetectionFailed { error: String },
    Completed { deployment: String, url: String },
    Failed { error: String },
    Cancelled,
}
