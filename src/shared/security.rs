use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum size for JSON metadata blobs (index, manifest, config): 16 MB.
/// Layer blobs are never read by this crate, only by the scanner engines.
pub const MAX_METADATA_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum size for a cached SBOM document: 256 MB
pub const MAX_SBOM_SIZE: u64 = 256 * 1024 * 1024;

/// Validates that a path exists and is a regular file (not a directory or symlink)
///
/// # Security
/// Uses `symlink_metadata()` so the link itself is inspected, not its target.
/// An OCI layout is untrusted input; following links out of it is refused.
///
/// # Arguments
/// * `path` - The path to validate
/// * `file_description` - Description of the file (e.g., "index.json", "manifest blob")
pub fn validate_regular_file(path: &Path, file_description: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| SbomError::FileReadError {
        path: path.to_path_buf(),
        details: format!("Failed to read {} metadata: {}", file_description, e),
    })?;

    if metadata.is_symlink() {
        return Err(SbomError::SecurityError {
            path: path.to_path_buf(),
            reason: format!("{} is a symbolic link", file_description),
            hint: "Copy the image into a self-contained OCI layout directory".to_string(),
        }
        .into());
    }

    if !metadata.is_file() {
        return Err(SbomError::FileReadError {
            path: path.to_path_buf(),
            details: format!("{} is not a regular file", file_description),
        }
        .into());
    }

    Ok(())
}

/// Validates file size is within acceptable limits
///
/// # Errors
/// Returns a security error if the file size exceeds `max_size`
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        return Err(SbomError::SecurityError {
            path: path.to_path_buf(),
            reason: format!(
                "file is too large ({} bytes). Maximum allowed size is {} bytes",
                file_size, max_size
            ),
            hint: "Check that the path points at image metadata, not a layer".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Reads a bounded regular file into memory.
///
/// Combines the symlink, file type, and size checks before reading.
pub fn read_bounded(path: &Path, file_description: &str, max_size: u64) -> Result<Vec<u8>> {
    validate_regular_file(path, file_description)?;

    let size = fs::metadata(path)
        .map_err(|e| SbomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?
        .len();
    validate_file_size(size, path, max_size)?;

    let bytes = fs::read(path).map_err(|e| SbomError::FileReadError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    Ok(bytes)
}
