//! Network seam of the deploy flow.
//!
//! `DeployTransport` is implemented for [`HttpTransport`]. Using a trait
//! keeps the deploy logic decoupled from HTTP and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use staticship_files::StaticFile;
use staticship_protocol::{ConfigLimits, Deployment, ShipError, SpaCheckRequest};
use staticship_transport::{HttpTransport, RequestOptions};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ShipError>> + Send + 'a>>;

/// The API operations a deploy needs.
pub trait DeployTransport: Send + Sync {
    /// Platform limits used to validate the batch.
    fn config_limits(&self) -> BoxFuture<'_, ConfigLimits>;

    /// Returns true if the batch looks like a single-page application.
    fn check_spa<'a>(
        &'a self,
        request: &'a SpaCheckRequest,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, bool>;

    /// Uploads the final batch as a new deployment.
    fn upload<'a>(
        &'a self,
        files: Vec<StaticFile>,
        labels: Vec<String>,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, Deployment>;
}

impl DeployTransport for HttpTransport {
    fn config_limits(&self) -> BoxFuture<'_, ConfigLimits> {
        Box::pin(HttpTransport::config_limits(self))
    }

    fn check_spa<'a>(
        &'a self,
        request: &'a SpaCheckRequest,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, bool> {
        Box::pin(HttpTransport::check_spa(self, request, options))
    }

    fn upload<'a>(
        &'a self,
        files: Vec<StaticFile>,
        labels: Vec<String>,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, Deployment> {
        Box::pin(self.deploy(files, labels, options))
    }
}
