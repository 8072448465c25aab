use crate::sbom_generation::domain::{IndexResult, LayerMapping};
use async_trait::async_trait;
use std::path::Path;

/// PackageScanner port for one scanner engine
///
/// Implementations never return an error: engine failures (spawn error,
/// non-zero exit, timeout, unparsable output) come back as a failed
/// `IndexResult`. Every reported location must carry a layer digest or a
/// diff ID that belongs to `mapping`.
#[async_trait]
pub trait PackageScanner: Send + Sync {
    /// Short engine name used in logs and errors
    fn name(&self) -> &str;

    async fn scan(&self, image_path: &Path, mapping: &LayerMapping) -> IndexResult;
}
