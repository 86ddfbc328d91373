//! Wire types and shared error taxonomy for the static-hosting API.
//!
//! Every other `staticship-*` crate depends on this one: the response
//! payloads in [`types`] are what the transport decodes, and [`ShipError`]
//! is the single error type surfaced to callers.

pub mod constants;
pub mod error;
pub mod types;

// Re-export primary types for convenience.
pub use error::{ErrorKind, ShipError};
pub use types::{
    Account, ApiErrorBody, ConfigLimits, Deployment, DeploymentList, Domain, DomainList,
    PingResponse, SpaCheckRequest, SpaCheckResponse, Token, TokenList,
};
