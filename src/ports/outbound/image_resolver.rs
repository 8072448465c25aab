use crate::sbom_generation::domain::ImageSource;
use crate::shared::Result;
use std::path::{Path, PathBuf};

/// An image made available on local disk for scanning
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Directory the scanner engines read (an OCI image layout)
    pub layout_path: PathBuf,
    /// Identity and metadata; the distro is filled in after scanning
    pub source: ImageSource,
    /// Compressed layer digests, in manifest order
    pub layer_digests: Vec<String>,
    /// Uncompressed layer diff IDs, in config order
    pub diff_ids: Vec<String>,
}

/// ImageResolver port for turning a reference into a local image
///
/// Pulling from a registry is not part of this port's contract; an
/// implementation may only support images that are already on disk.
pub trait ImageResolver {
    /// Resolves `reference`, reading the image from `layout_path` when given
    ///
    /// # Errors
    /// Returns `SbomError::Resolution` if the image cannot be located or its
    /// manifest/config cannot be read.
    fn resolve(&self, reference: &str, layout_path: Option<&Path>) -> Result<ResolvedImage>;
}
