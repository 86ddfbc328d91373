use reqwest::StatusCode;
use staticship_protocol::{ApiErrorBody, ShipError};
use tracing::debug;

/// Why a request did not produce a usable response.
#[derive(Debug)]
pub(crate) enum Failure {
    /// The request token fired (caller or deadline).
    Aborted,
    /// reqwest could not complete the exchange.
    Http(reqwest::Error),
    /// The server answered with a non-2xx status.
    Status { status: StatusCode, body: Vec<u8> },
    /// A success body that is not the JSON we expect.
    Decode(serde_json::Error),
    /// Failed before sending, already classified (e.g. unreadable file).
    Local(ShipError),
}

pub(crate) fn classify(failure: Failure, operation: &str, url: &str) -> ShipError {
    match failure {
        Failure::Aborted => ShipError::cancelled(operation),
        Failure::Http(err) => classify_http(&err, url),
        Failure::Status { status, body } => classify_status(status, &body),
        Failure::Decode(err) => {
            debug!(%url, error = %err, "response body did not decode");
            ShipError::unexpected()
        }
        Failure::Local(err) => err,
    }
}

/// Connectivity problems become `Network`; anything else is sanitized.
fn classify_http(err: &reqwest::Error, url: &str) -> ShipError {
    if err.is_connect() || err.is_request() || err.is_body() || err.is_timeout() {
        return ShipError::Network(format!(
            "could not reach {}: {}",
            host_of(url),
            root_cause(err)
        ));
    }
    debug!(%url, error = %err, "unexpected transport failure");
    ShipError::unexpected()
}

/// Maps a non-2xx response to `Api`, using the JSON error body when present.
pub(crate) fn classify_status(status: StatusCode, body: &[u8]) -> ShipError {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) => ShipError::Api {
            status: status.as_u16(),
            code: parsed.error,
            message: parsed.message,
            details: parsed.details,
        },
        Err(_) => ShipError::Api {
            status: status.as_u16(),
            code: "http_error".into(),
            message: status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            details: None,
        },
    }
}

fn root_cause(err: &reqwest::Error) -> String {
    let mut cause: &dyn std::error::Error = err;
    while let Some(next) = cause.source() {
        cause = next;
    }
    cause.to_string()
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str()
                .map(|h| u.port().map_or_else(|| h.to_string(), |p| format!("{h}:{p}")))
        })
        .unwrap_or_else(|| "the API".into())
}
