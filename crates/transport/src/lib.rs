//! HTTP transport for the static-hosting API.
//!
//! Every call goes through [`HttpTransport::request`], which owns the
//! request lifecycle: a per-request deadline composed with the caller's
//! cancellation token, observer events around the network call, and
//! classification of every failure into a [`ShipError`].
//!
//! [`ShipError`]: staticship_protocol::ShipError

pub mod body;
pub mod cache;
mod classify;
pub mod client;
pub mod config;
mod deadline;
pub mod events;

#[cfg(test)]
mod mock;

pub use body::RequestBody;
pub use cache::ConfigCache;
pub use client::{HttpTransport, ParsedResponse, RequestOptions};
pub use config::{ClientConfig, ConfigOverrides};
pub use deadline::DeadlineTracker;
pub use events::{EventBus, EventKind, ListenerId, TransportEvent};
