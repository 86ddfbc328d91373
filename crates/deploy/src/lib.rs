//! Deploy flow: validate, optimize paths, detect SPAs, upload.
//!
//! This crate sequences the pieces provided by `staticship-files` and
//! `staticship-transport` into a single deploy operation. The network is
//! reached through the [`DeployTransport`] trait so the flow can be tested
//! without a server.
//!
//! # Pipeline
//!
//! 1. **Collect**: normalize the paths of the incoming batch
//! 2. **Validate**: fetch platform limits and reject the batch if any file fails
//! 3. **Optimize**: strip the common root directory
//! 4. **Detect SPA**: optionally add a generated `ship.json` rewrite config
//! 5. **Upload**: one multipart request carrying the whole batch

pub mod deploy;
pub mod spa;
pub mod transport;
pub mod types;

pub use deploy::DeployOrchestrator;
pub use transport::DeployTransport;
pub use types::{DeployEvent, DeployOptions, DeployPhase};
