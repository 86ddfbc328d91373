//! Static file model, batch validation and deploy path optimization.
//!
//! Nothing in this crate touches the network. The validator and the path
//! optimizer are pure functions; only [`scanner`] and
//! [`ByteSource::read_all`] perform disk I/O.

mod byte_source;
mod checksum;
mod paths;
pub mod scanner;
mod static_file;
mod validation;

pub use byte_source::ByteSource;
pub use checksum::{md5_file, md5_hex};
pub use paths::{OptimizedPath, normalize_path, optimize_paths};
pub use scanner::{resolve_inputs, scan_directory};
pub use static_file::StaticFile;
pub use validation::{
    FileIssue, FileStatus, ValidatedFile, ValidationResult, format_bytes, precheck_files,
    validate_file_name, validate_files,
};
