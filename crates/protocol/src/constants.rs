use std::time::Duration;

/// Production API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.shipstatic.com";

/// Per-request timeout used when neither the caller nor the config sets one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the generated platform config file (SPA rewrites).
pub const SPA_CONFIG_FILENAME: &str = "ship.json";

/// Entry document looked for by SPA detection.
pub const INDEX_HTML: &str = "index.html";

/// Multipart field name carrying each uploaded file.
pub const FILES_FIELD: &str = "files[]";

/// Multipart field name carrying the JSON-encoded label array.
pub const LABELS_FIELD: &str = "labels";

/// API routes, relative to the configured base URL.
pub mod routes {
    pub const PING: &str = "/ping";
    pub const CONFIG: &str = "/config";
    pub const SPA_CHECK: &str = "/spa-check";
    pub const DEPLOYMENTS: &str = "/deployments";
    pub const DOMAINS: &str = "/domains";
    pub const TOKENS: &str = "/tokens";
    pub const ACCOUNT: &str = "/account";
}
