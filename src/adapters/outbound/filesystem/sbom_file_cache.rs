use crate::ports::outbound::SbomStore;
use crate::sbom_generation::domain::{ImageDigest, Sbom};
use crate::shared::error::SbomError;
use crate::shared::security::{read_bounded, MAX_SBOM_SIZE};
use crate::shared::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const SBOM_DIR: &str = "sbom";
const SBOM_FILE: &str = "sbom.json";

/// SbomFileCache adapter for the on-disk SBOM cache
///
/// Implements the SbomStore port. Documents live at
/// `<root>/sbom/<algorithm>/<hex>/sbom.json`, so every reference that
/// resolves to the same digest shares one entry. Entries whose
/// `descriptor.sbom_version` differs from the current schema version are
/// ignored and overwritten by the next successful run.
pub struct SbomFileCache {
    root: PathBuf,
    sbom_version: String,
}

impl SbomFileCache {
    /// Creates a cache rooted at `root` (the docker config directory)
    pub fn new(root: PathBuf, sbom_version: impl Into<String>) -> Self {
        Self {
            root,
            sbom_version: sbom_version.into(),
        }
    }

    /// Path of the document for `digest`
    pub fn entry_path(&self, digest: &ImageDigest) -> PathBuf {
        self.root
            .join(SBOM_DIR)
            .join(digest.algorithm())
            .join(digest.hex())
            .join(SBOM_FILE)
    }

    fn load(&self, path: &Path) -> Result<Sbom> {
        let bytes = read_bounded(path, "cached SBOM", MAX_SBOM_SIZE)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn store(&self, path: &Path, content: &str) -> std::io::Result<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        // Same directory as the target so the rename stays on one filesystem
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SbomStore for SbomFileCache {
    fn read(&self, digest: &ImageDigest) -> Option<Sbom> {
        let path = self.entry_path(digest);
        if !path.exists() {
            debug!(%digest, "SBOM cache miss");
            return None;
        }

        match self.load(&path) {
            Ok(sbom) if sbom.descriptor.sbom_version == self.sbom_version => {
                debug!(%digest, path = %path.display(), "SBOM cache hit");
                Some(sbom)
            }
            Ok(sbom) => {
                debug!(
                    %digest,
                    cached = %sbom.descriptor.sbom_version,
                    current = %self.sbom_version,
                    "Ignoring SBOM cache entry with a different schema version"
                );
                None
            }
            Err(e) => {
                warn!(
                    %digest,
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable SBOM cache entry"
                );
                None
            }
        }
    }

    fn write(&self, sbom: &Sbom) -> Result<PathBuf> {
        let digest = ImageDigest::parse(sbom.digest())?;
        let path = self.entry_path(&digest);

        let mut document = sbom.clone();
        document.vulnerabilities = None;
        let content = document.to_pretty_json()?;

        self.store(&path, &content)
            .map_err(|e| SbomError::CacheWrite {
                path: path.clone(),
                details: e.to_string(),
            })?;

        debug!(%digest, path = %path.display(), "Wrote SBOM cache entry");
        Ok(path)
    }
}
