//! All-or-nothing validation of a deploy batch.
//!
//! Every file is checked independently so that all problems are reported at
//! once, but the verdict applies to the whole batch: a single hard error
//! marks every file [`FileStatus::ValidationFailed`] and nothing is deployed.
//! Empty files are the one exception; they only raise a warning and are
//! dropped from the batch.

use staticship_protocol::{ConfigLimits, ShipError};
use tracing::debug;

use crate::static_file::StaticFile;

/// Label used as the `file` of batch-level issues.
const BATCH: &str = "(batch)";

/// Characters that break URLs or need escaping in them.
const URL_UNSAFE: &[char] = &[
    '?', '&', '#', '%', '<', '>', '[', ']', '{', '}', '|', '\\', '^', '~', '`',
];

/// Characters with meaning to common shells.
const SHELL_UNSAFE: &[char] = &[';', '$', '(', ')', '\'', '"', '*'];

/// Device names reserved by Windows, with or without an extension.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Executables and installers. Compared case-insensitively.
const BLOCKED_EXTENSIONS: &[&str] = &[
    "exe", "msi", "msp", "dll", "sys", "drv", "ocx", "scr", "bat", "cmd", "com", "pif", "cpl",
    "hta", "lnk", "reg", "vbs", "vbe", "wsf", "wsh", "ps1", "psm1", "jar", "app", "dmg", "pkg",
    "mpkg", "deb", "rpm", "apk", "ipa",
];

/// Lifecycle of a file through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Pending,
    Ready,
    Excluded,
    ValidationFailed,
    ProcessingError,
}

/// An error or warning attached to a file (or to the batch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIssue {
    pub file: String,
    pub message: String,
}

impl FileIssue {
    fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// A file together with its validation verdict.
#[derive(Debug)]
pub struct ValidatedFile {
    pub file: StaticFile,
    pub status: FileStatus,
    pub status_message: Option<String>,
}

/// Outcome of [`validate_files`].
///
/// `can_deploy` is true exactly when `errors` is empty.
#[derive(Debug)]
pub struct ValidationResult {
    pub files: Vec<ValidatedFile>,
    pub errors: Vec<FileIssue>,
    pub warnings: Vec<FileIssue>,
    pub can_deploy: bool,
}

impl ValidationResult {
    /// Files cleared for upload.
    pub fn valid_files(&self) -> impl Iterator<Item = &StaticFile> {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Ready)
            .map(|f| &f.file)
    }

    pub fn valid_count(&self) -> usize {
        self.valid_files().count()
    }

    /// Consumes the result, keeping only the files cleared for upload.
    pub fn into_valid_files(self) -> Vec<StaticFile> {
        self.files
            .into_iter()
            .filter(|f| f.status == FileStatus::Ready)
            .map(|f| f.file)
            .collect()
    }

    /// The error to surface when the batch cannot be deployed.
    pub fn to_error(&self) -> Option<ShipError> {
        issues_error(&self.errors)
    }
}

/// Runs the checks that need no platform limits: empty batch, upstream
/// processing errors, names, extensions and negative sizes.
///
/// Lets a caller reject a batch before fetching limits. Passing does not
/// clear the batch; [`validate_files`] repeats these checks.
pub fn precheck_files(files: &[StaticFile]) -> Result<(), ShipError> {
    let errors: Vec<FileIssue> = if files.is_empty() {
        vec![FileIssue::new(BATCH, "At least one file is required")]
    } else {
        files
            .iter()
            .filter_map(|file| {
                let reason = file
                    .processing_error
                    .clone()
                    .or_else(|| check_file_local(file))?;
                Some(FileIssue::new(&file.path, reason))
            })
            .collect()
    };

    match issues_error(&errors) {
        Some(err) => {
            debug!(
                files = files.len(),
                errors = errors.len(),
                "batch rejected before fetching limits"
            );
            Err(err)
        }
        None => Ok(()),
    }
}

fn issues_error(errors: &[FileIssue]) -> Option<ShipError> {
    let first = errors.first()?;
    let message = match errors.len() {
        1 => format!("{}: {}", first.file, first.message),
        n => format!(
            "{}: {} (and {} more validation error{})",
            first.file,
            first.message,
            n - 1,
            if n == 2 { "" } else { "s" }
        ),
    };
    Some(ShipError::Validation {
        message,
        issues: errors.len(),
    })
}

/// Validates a deploy batch against the platform limits.
pub fn validate_files(files: Vec<StaticFile>, limits: &ConfigLimits) -> ValidationResult {
    if files.is_empty() {
        return ValidationResult {
            files: Vec::new(),
            errors: vec![FileIssue::new(BATCH, "At least one file is required")],
            warnings: Vec::new(),
            can_deploy: false,
        };
    }

    if files.len() > limits.max_files_count {
        let error = FileIssue::new(
            BATCH,
            format!(
                "File count ({}) exceeds limit of {} files",
                files.len(),
                limits.max_files_count
            ),
        );
        return reject_all(pending(files), vec![error], Vec::new());
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut entries = pending(files);
    let mut total: u64 = 0;
    let mut total_reported = false;

    for entry in &mut entries {
        let file = &entry.file;

        if let Some(reason) = &file.processing_error {
            errors.push(FileIssue::new(&file.path, reason.clone()));
            entry.status = FileStatus::ProcessingError;
            entry.status_message = Some(reason.clone());
        } else if let Some(reason) = check_file(file, limits) {
            errors.push(FileIssue::new(&file.path, reason.clone()));
            entry.status = FileStatus::ValidationFailed;
            entry.status_message = Some(reason);
        } else if file.size == 0 {
            let reason = "File is empty (0 bytes) and will be skipped".to_string();
            warnings.push(FileIssue::new(&file.path, reason.clone()));
            entry.status = FileStatus::Excluded;
            entry.status_message = Some(reason);
        }

        if file.size > 0 {
            total = total.saturating_add(file.size as u64);
            if total > limits.max_total_size && !total_reported {
                total_reported = true;
                errors.push(FileIssue::new(
                    &file.path,
                    format!(
                        "Total size ({}) exceeds limit of {}",
                        format_bytes(total),
                        format_bytes(limits.max_total_size)
                    ),
                ));
            }
        }
    }

    if !errors.is_empty() {
        debug!(
            files = entries.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "batch rejected"
        );
        return reject_all(entries, errors, warnings);
    }

    for entry in &mut entries {
        if entry.status == FileStatus::Pending {
            entry.status = FileStatus::Ready;
            entry.status_message = None;
        }
    }

    let ready = entries
        .iter()
        .filter(|e| e.status == FileStatus::Ready)
        .count();
    if ready == 0 {
        // Every file was excluded; an empty deploy is not a deploy.
        let error = FileIssue::new(BATCH, "No valid files to deploy");
        return reject_all(entries, vec![error], warnings);
    }

    debug!(
        files = entries.len(),
        ready,
        warnings = warnings.len(),
        "batch accepted"
    );

    ValidationResult {
        files: entries,
        errors,
        warnings,
        can_deploy: true,
    }
}

fn pending(files: Vec<StaticFile>) -> Vec<ValidatedFile> {
    files
        .into_iter()
        .map(|file| ValidatedFile {
            file,
            status: FileStatus::Pending,
            status_message: None,
        })
        .collect()
}

/// Marks every file failed, keeping per-file reasons where they exist.
fn reject_all(
    mut entries: Vec<ValidatedFile>,
    errors: Vec<FileIssue>,
    warnings: Vec<FileIssue>,
) -> ValidationResult {
    let summary = format!(
        "Deployment blocked: {} validation error{}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
    for entry in &mut entries {
        let own_error = matches!(
            entry.status,
            FileStatus::ValidationFailed | FileStatus::ProcessingError
        );
        if !own_error {
            entry.status_message = Some(summary.clone());
        }
        entry.status = FileStatus::ValidationFailed;
    }
    ValidationResult {
        files: entries,
        errors,
        warnings,
        can_deploy: false,
    }
}

/// Per-file hard checks. Returns the first failing reason.
fn check_file(file: &StaticFile, limits: &ConfigLimits) -> Option<String> {
    if let Some(reason) = check_file_local(file) {
        return Some(reason);
    }
    if file.size as u64 > limits.max_file_size {
        return Some(format!(
            "File size ({}) exceeds limit of {}",
            format_bytes(file.size as u64),
            format_bytes(limits.max_file_size)
        ));
    }
    None
}

fn check_file_local(file: &StaticFile) -> Option<String> {
    if let Err(reason) = validate_file_name(&file.path) {
        return Some(format!("Invalid file name: {reason}"));
    }
    if let Some(ext) = blocked_extension(file.name()) {
        return Some(format!("File extension not allowed: .{ext}"));
    }
    if file.size < 0 {
        return Some(format!("Invalid file size: {}", file.size));
    }
    None
}

/// Checks an upload key against the character and naming rules.
///
/// Nested paths are fine; `..` segments, absolute paths and names that are
/// unsafe in URLs, shells or on Windows are not.
pub fn validate_file_name(path: &str) -> Result<(), String> {
    if path.trim().is_empty() {
        return Err("name is empty".into());
    }
    if path.contains('\0') {
        return Err("contains a null byte".into());
    }
    if path.chars().any(char::is_control) {
        return Err("contains control characters".into());
    }
    if let Some(c) = path.chars().find(|c| URL_UNSAFE.contains(c)) {
        return Err(format!("contains URL-unsafe character '{c}'"));
    }
    if let Some(c) = path.chars().find(|c| SHELL_UNSAFE.contains(c)) {
        return Err(format!("contains unsafe character '{c}'"));
    }
    if path.starts_with('/') {
        return Err("absolute paths are not allowed".into());
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return Err("contains an empty path segment".into());
        }
        if segment == ".." {
            return Err("path traversal ('..') is not allowed".into());
        }
        if segment.trim() != segment {
            return Err("leading or trailing whitespace".into());
        }
        if segment != "." && segment.ends_with('.') {
            return Err("ends with a dot".into());
        }
        let stem = segment.split('.').next().unwrap_or(segment);
        if RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(stem))
        {
            return Err(format!("'{segment}' is a reserved system name"));
        }
    }

    Ok(())
}

/// Returns the lowercase extension if it is on the blocklist.
fn blocked_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        // Dotfile such as `.htaccess`: no extension.
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    BLOCKED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Human-readable size, 1024-based.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
