use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - the SBOM was produced (from cache or a fresh index run)
    Success = 0,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (resolution, scan, normalization, file I/O, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for image indexing.
///
/// The first six variants follow the failure taxonomy of an index run.
/// `CacheWrite` and `Lookup` are non-fatal: the orchestrator records them on
/// the response instead of aborting.
#[derive(Debug, Error)]
pub enum SbomError {
    #[error("Failed to resolve image: {reference}\nDetails: {details}\n\n💡 Hint: Pass a local OCI image layout directory (or --path <dir>), or a sha256 digest that was indexed before")]
    Resolution { reference: String, details: String },

    #[error("Malformed image manifest for {digest}: {layers} layer(s) but {diff_ids} diff ID(s)\n\n💡 Hint: The manifest layer list and the config rootfs.diff_ids must have the same length")]
    LayerMapping {
        digest: String,
        layers: usize,
        diff_ids: usize,
    },

    #[error("Scanner '{scanner}' failed to index {image}\nDetails: {details}\n\n💡 Hint: Verify that '{scanner}' is installed and on PATH, or configure its binary in image-sbom.config.yml")]
    Scan {
        scanner: String,
        image: String,
        details: String,
    },

    #[error("Failed to normalize packages from '{scanner}': package #{index} is missing its {field}")]
    Normalization {
        scanner: String,
        index: usize,
        field: &'static str,
    },

    #[error("Failed to write SBOM cache entry: {path}\nDetails: {details}")]
    CacheWrite { path: PathBuf, details: String },

    #[error("Vulnerability lookup failed for {purls} package(s)\nDetails: {details}")]
    Lookup { purls: usize, details: String },

    #[error("Invalid image digest: '{digest}'\nReason: {reason}\n\n💡 Hint: Digests look like sha256:<64 hex characters>")]
    InvalidDigest { digest: String, reason: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    /// Validation error for configuration and mapping tables
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },
}
