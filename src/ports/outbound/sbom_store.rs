use crate::sbom_generation::domain::{ImageDigest, Sbom};
use crate::shared::Result;
use std::path::PathBuf;

/// SbomStore port for the content-addressed SBOM cache
///
/// Entries are keyed by image digest only, never by tag or name.
pub trait SbomStore {
    /// Returns the cached document for `digest`, or `None` on a miss.
    ///
    /// A missing file, an unreadable or corrupt file and a schema-version
    /// mismatch are all misses.
    fn read(&self, digest: &ImageDigest) -> Option<Sbom>;

    /// Persists `sbom` under its digest and returns the written path.
    ///
    /// Readers never observe a partially written document.
    ///
    /// # Errors
    /// Returns `SbomError::CacheWrite` if the document cannot be stored.
    fn write(&self, sbom: &Sbom) -> Result<PathBuf>;
}
