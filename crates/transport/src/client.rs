//! Static-hosting API client.
//!
//! Async HTTP client using `reqwest` with Bearer authentication. Resource
//! helpers are thin wrappers over [`HttpTransport::request`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use staticship_files::StaticFile;
use staticship_protocol::constants::routes;
use staticship_protocol::{
    Account, ConfigLimits, Deployment, DeploymentList, Domain, DomainList, PingResponse,
    ShipError, SpaCheckRequest, SpaCheckResponse, Token, TokenList,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::body::{RequestBody, upload_form};
use crate::cache::ConfigCache;
use crate::classify::{Failure, classify};
use crate::config::ClientConfig;
use crate::deadline::{DeadlineTracker, RequestDeadline};
use crate::events::{EventBus, TransportEvent};

/// Characters escaped in a path segment (domain names keep their dots).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Per-call cancellation and timeout.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Cancelling this token aborts the request.
    pub cancel: Option<CancellationToken>,
    /// Overrides the transport's default timeout for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel: Some(cancel),
            timeout: None,
        }
    }
}

/// A 2xx response. `body` is `None` for empty bodies (e.g. 204).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ParsedResponse {
    /// Decodes the body into `T`. An empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ShipError> {
        serde_json::from_value(self.body.unwrap_or(Value::Null)).map_err(|e| {
            debug!(error = %e, "response did not match expected shape");
            ShipError::unexpected()
        })
    }
}

/// HTTP transport for the static-hosting API.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    auth: Option<HeaderValue>,
    timeout: Duration,
    events: EventBus,
    config_cache: Arc<ConfigCache>,
    deadlines: Arc<DeadlineTracker>,
}

impl HttpTransport {
    /// Creates a transport from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ShipError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ShipError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            auth: config.auth_header()?,
            timeout: config.timeout,
            events: EventBus::new(),
            config_cache: ConfigCache::global(),
            deadlines: Arc::new(DeadlineTracker::default()),
        })
    }

    /// Uses `cache` instead of the process-wide limits cache.
    pub fn with_config_cache(mut self, cache: Arc<ConfigCache>) -> Self {
        self.config_cache = cache;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Listener registry for request/response/error events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn deadlines(&self) -> &DeadlineTracker {
        &self.deadlines
    }

    /// Performs one request.
    ///
    /// The call is bounded by a deadline (the options' timeout or the
    /// transport default) and by the caller's token; either one aborts it
    /// with a `Cancelled` error naming `operation`. A `Request` event is
    /// emitted before sending, a `Response` event once per received
    /// response and an `Error` event for every failure.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: &RequestOptions,
        operation: &str,
    ) -> Result<ParsedResponse, ShipError> {
        let url = format!("{}{}", self.base_url, path);
        let timeout = options.timeout.unwrap_or(self.timeout);
        let deadline =
            RequestDeadline::arm(options.cancel.as_ref(), timeout, self.deadlines.clone());

        self.events.emit(&TransportEvent::Request {
            method: &method,
            url: &url,
        });
        debug!(%method, %url, operation, "sending request");
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = deadline.token().cancelled() => Err(Failure::Aborted),
            res = self.execute(method, &url, body) => res,
        };

        match outcome {
            Ok(resp) => {
                debug!(
                    %url,
                    status = resp.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request finished"
                );
                Ok(resp)
            }
            Err(failure) => {
                if matches!(failure, Failure::Aborted) {
                    if deadline.timed_out() {
                        warn!(
                            %url,
                            operation,
                            timeout_ms = timeout.as_millis() as u64,
                            "request timed out"
                        );
                    } else {
                        info!(%url, operation, "request cancelled by caller");
                    }
                }
                let error = classify(failure, operation, &url);
                self.events.emit(&TransportEvent::Error {
                    error: &error,
                    url: &url,
                });
                Err(error)
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<RequestBody>,
    ) -> Result<ParsedResponse, Failure> {
        let mut builder = self.http.request(method, url);
        if let Some(auth) = &self.auth {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }
        builder = match body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Upload { files, labels }) => {
                let form = upload_form(files, &labels).await.map_err(Failure::Local)?;
                builder.multipart(form)
            }
        };

        let resp = builder.send().await.map_err(Failure::Http)?;
        let status = resp.status();
        self.events.emit(&TransportEvent::Response {
            status: status.as_u16(),
            url,
        });

        let bytes = resp.bytes().await.map_err(Failure::Http)?;
        if !status.is_success() {
            return Err(Failure::Status {
                status,
                body: bytes.to_vec(),
            });
        }

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice(&bytes).map_err(Failure::Decode)?)
        };
        Ok(ParsedResponse {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn get(
        &self,
        path: &str,
        options: &RequestOptions,
        operation: &str,
    ) -> Result<ParsedResponse, ShipError> {
        self.request(Method::GET, path, None, options, operation).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: &RequestOptions,
        operation: &str,
    ) -> Result<ParsedResponse, ShipError> {
        self.request(Method::POST, path, body, options, operation).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: &RequestOptions,
        operation: &str,
    ) -> Result<ParsedResponse, ShipError> {
        self.request(Method::PUT, path, body, options, operation).await
    }

    pub async fn delete(
        &self,
        path: &str,
        options: &RequestOptions,
        operation: &str,
    ) -> Result<ParsedResponse, ShipError> {
        self.request(Method::DELETE, path, None, options, operation).await
    }

    /// Returns true if the API answers `/ping` with success.
    pub async fn ping(&self) -> Result<bool, ShipError> {
        let resp: PingResponse = self
            .get(routes::PING, &RequestOptions::default(), "Ping")
            .await?
            .json()?;
        Ok(resp.success)
    }

    /// Fetches the platform limits, bypassing the cache.
    pub async fn get_config(&self) -> Result<ConfigLimits, ShipError> {
        self.get(routes::CONFIG, &RequestOptions::default(), "Config")
            .await?
            .json()
    }

    /// Platform limits, fetched once per cache.
    pub async fn config_limits(&self) -> Result<ConfigLimits, ShipError> {
        self.config_cache
            .get_or_fetch(|| self.get_config())
            .await
    }

    /// Asks the API whether `files` look like a single-page application.
    pub async fn check_spa(
        &self,
        request: &SpaCheckRequest,
        options: &RequestOptions,
    ) -> Result<bool, ShipError> {
        let body = RequestBody::json(request)?;
        let resp: SpaCheckResponse = self
            .post(routes::SPA_CHECK, Some(body), options, "SPA check")
            .await?
            .json()?;
        Ok(resp.is_spa)
    }

    /// Uploads `files` as a new deployment in a single multipart request.
    pub async fn deploy(
        &self,
        files: Vec<StaticFile>,
        labels: Vec<String>,
        options: &RequestOptions,
    ) -> Result<Deployment, ShipError> {
        let count = files.len();
        let body = RequestBody::Upload { files, labels };
        let deployment: Deployment = self
            .post(routes::DEPLOYMENTS, Some(body), options, "Deploy")
            .await?
            .json()?;
        info!(deployment = %deployment.deployment, files = count, "deployment uploaded");
        Ok(deployment)
    }

    pub async fn list_deployments(&self) -> Result<DeploymentList, ShipError> {
        self.get(routes::DEPLOYMENTS, &RequestOptions::default(), "List deployments")
            .await?
            .json()
    }

    pub async fn get_deployment(&self, id: &str) -> Result<Deployment, ShipError> {
        self.get(
            &resource(routes::DEPLOYMENTS, id),
            &RequestOptions::default(),
            "Get deployment",
        )
        .await?
        .json()
    }

    pub async fn remove_deployment(&self, id: &str) -> Result<(), ShipError> {
        self.delete(
            &resource(routes::DEPLOYMENTS, id),
            &RequestOptions::default(),
            "Remove deployment",
        )
        .await?;
        Ok(())
    }

    /// Points `name` at `deployment`, creating the domain if needed.
    pub async fn set_domain(&self, name: &str, deployment: &str) -> Result<Domain, ShipError> {
        let body = RequestBody::Json(json!({ "deployment": deployment }));
        self.put(
            &resource(routes::DOMAINS, name),
            Some(body),
            &RequestOptions::default(),
            "Set domain",
        )
        .await?
        .json()
    }

    pub async fn get_domain(&self, name: &str) -> Result<Domain, ShipError> {
        self.get(
            &resource(routes::DOMAINS, name),
            &RequestOptions::default(),
            "Get domain",
        )
        .await?
        .json()
    }

    pub async fn list_domains(&self) -> Result<DomainList, ShipError> {
        self.get(routes::DOMAINS, &RequestOptions::default(), "List domains")
            .await?
            .json()
    }

    pub async fn remove_domain(&self, name: &str) -> Result<(), ShipError> {
        self.delete(
            &resource(routes::DOMAINS, name),
            &RequestOptions::default(),
            "Remove domain",
        )
        .await?;
        Ok(())
    }

    /// Triggers DNS verification for `name`.
    pub async fn verify_domain(&self, name: &str) -> Result<(), ShipError> {
        let path = format!("{}/verify", resource(routes::DOMAINS, name));
        self.post(&path, None, &RequestOptions::default(), "Verify domain")
            .await?;
        Ok(())
    }

    /// Creates a deploy token, optionally expiring after `ttl_secs`.
    pub async fn create_token(&self, ttl_secs: Option<u64>) -> Result<Token, ShipError> {
        let body = match ttl_secs {
            Some(ttl) => json!({ "ttl": ttl }),
            None => json!({}),
        };
        self.post(
            routes::TOKENS,
            Some(RequestBody::Json(body)),
            &RequestOptions::default(),
            "Create token",
        )
        .await?
        .json()
    }

    pub async fn list_tokens(&self) -> Result<TokenList, ShipError> {
        self.get(routes::TOKENS, &RequestOptions::default(), "List tokens")
            .await?
            .json()
    }

    pub async fn remove_token(&self, token: &str) -> Result<(), ShipError> {
        self.delete(
            &resource(routes::TOKENS, token),
            &RequestOptions::default(),
            "Remove token",
        )
        .await?;
        Ok(())
    }

    pub async fn get_account(&self) -> Result<Account, ShipError> {
        self.get(routes::ACCOUNT, &RequestOptions::default(), "Get account")
            .await?
            .json()
    }
}

/// `{collection}/{id}` with `id` percent-encoded.
fn resource(collection: &str, id: &str) -> String {
    format!("{collection}/{}", utf8_percent_encode(id, SEGMENT))
}
