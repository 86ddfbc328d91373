//! Deploy orchestrator.
//!
//! Runs one batch through validation, path optimization, optional SPA
//! detection and upload, publishing progress events and supporting
//! cancellation.

use std::path::PathBuf;
use std::sync::Arc;

use staticship_files::{
    StaticFile, normalize_path, optimize_paths, precheck_files, resolve_inputs, validate_files,
};
use staticship_protocol::{Deployment, ShipError};
use staticship_transport::RequestOptions;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::spa;
use crate::transport::DeployTransport;
use crate::types::{DeployEvent, DeployOptions, DeployPhase};

/// Operation name carried by cancellation errors.
const DEPLOY_OPERATION: &str = "Deploy";

/// Orchestrates a deploy against a [`DeployTransport`].
pub struct DeployOrchestrator {
    transport: Arc<dyn DeployTransport>,
    events_tx: mpsc::Sender<DeployEvent>,
    events_rx: Option<mpsc::Receiver<DeployEvent>>,
    cancel: CancellationToken,
}

impl DeployOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(transport: Arc<dyn DeployTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            transport,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DeployEvent>> {
        self.events_rx.take()
    }

    /// Cancelling this token aborts every deploy run by this orchestrator.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Deploys a batch of files.
    ///
    /// Checks that need no platform limits run before any network call;
    /// validation failures are returned before any upload is attempted.
    /// A failed SPA check is logged and skipped, but an unreadable
    /// `index.html` fails the deploy. Cancellation through the orchestrator
    /// token or `options.cancel` yields a `Cancelled` error; every other
    /// failure propagates unchanged.
    pub async fn deploy(
        &self,
        files: Vec<StaticFile>,
        options: DeployOptions,
    ) -> Result<Deployment, ShipError> {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ShipError::cancelled(DEPLOY_OPERATION)),
            res = self.run(files, &options) => res,
        };

        match &result {
            Ok(deployment) => {
                self.emit_phase(DeployPhase::Completed);
                self.emit(DeployEvent::Completed {
                    deployment: deployment.deployment.clone(),
                    url: deployment.url.clone(),
                });
                info!(deployment = %deployment.deployment, url = %deployment.url, "deploy completed");
            }
            Err(e) if e.is_cancelled() => {
                self.emit_phase(DeployPhase::Cancelled);
                self.emit(DeployEvent::Cancelled);
                info!("deploy cancelled");
            }
            Err(e) => {
                self.emit_phase(DeployPhase::Failed);
                self.emit(DeployEvent::Failed {
                    error: e.to_string(),
                });
                error!(error = %e, "deploy failed");
            }
        }
        result
    }

    /// Resolves files and directories from disk, then deploys them.
    pub async fn deploy_paths(
        &self,
        inputs: &[PathBuf],
        options: DeployOptions,
    ) -> Result<Deployment, ShipError> {
        let inputs = inputs.to_vec();
        let files = tokio::task::spawn_blocking(move || resolve_inputs(&inputs))
            .await
            .map_err(|e| {
                debug!(error = %e, "input resolution task failed");
                ShipError::unexpected()
            })??;
        self.deploy(files, options).await
    }

    async fn run(
        &self,
        mut files: Vec<StaticFile>,
        options: &DeployOptions,
    ) -> Result<Deployment, ShipError> {
        self.emit_phase(DeployPhase::CollectingInput);
        for file in &mut files {
            file.path = normalize_path(&file.path);
        }

        self.emit_phase(DeployPhase::Validating);
        precheck_files(&files)?;
        let limits = self.transport.config_limits().await?;
        let validation = validate_files(files, &limits);
        for warning in &validation.warnings {
            warn!(file = %warning.file, "{}", warning.message);
        }
        if let Some(err) = validation.to_error() {
            return Err(err);
        }
        let mut files = validation.into_valid_files();
        debug!(files = files.len(), "batch validated");

        if options.path_detect {
            let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
            for (file, optimized) in files.iter_mut().zip(optimize_paths(&paths, true)) {
                file.path = optimized.path;
            }
        }

        let request_options = RequestOptions {
            cancel: options.cancel.clone(),
            timeout: options.timeout,
        };

        if options.spa_detect && spa::should_detect(&files) {
            self.emit_phase(DeployPhase::DetectingSpa);
            // An unreadable index.html fails the deploy.
            let request = spa::check_request(&mut files).await?;
            match self.transport.check_spa(&request, &request_options).await {
                Ok(true) => {
                    info!("single-page app detected, adding rewrite config");
                    files.push(spa::spa_config_file());
                    self.emit(DeployEvent::SpaDetected);
                }
                Ok(false) => debug!("not a single-page app"),
                Err(_) if is_cancelled(options) => {
                    return Err(ShipError::cancelled(DEPLOY_OPERATION));
                }
                Err(e) => {
                    warn!(error = %e, "SPA detection failed, uploading without rewrite config");
                    self.emit(DeployEvent::SpaDetectionFailed {
                        error: e.to_string(),
                    });
                }
            }
        }

        self.emit_phase(DeployPhase::Uploading);
        info!(files = files.len(), labels = options.labels.len(), "uploading batch");
        self.transport
            .upload(files, options.labels.clone(), &request_options)
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    ShipError::cancelled(DEPLOY_OPERATION)
                } else {
                    e
                }
            })
    }

    fn emit_phase(&self, phase: DeployPhase) {
        debug!(?phase, "deploy phase");
        self.emit(DeployEvent::Phase(phase));
    }

    /// Never blocks the deploy: events are dropped when nobody drains them.
    fn emit(&self, event: DeployEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(error = %e, "deploy event dropped");
        }
    }
}

fn is_cancelled(options: &DeployOptions) -> bool {
    options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
}
