use crate::sbom_generation::domain::Sbom;
use std::path::PathBuf;

/// How the SBOM cache took part in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the cache; no scanner ran
    Hit,
    /// Freshly indexed and written to the given path
    Persisted(PathBuf),
    /// Freshly indexed, but the cache write failed
    WriteFailed(String),
}

/// IndexResponse - Internal response DTO from the index image use case
#[derive(Debug, Clone)]
pub struct IndexResponse {
    pub sbom: Sbom,
    pub cache_status: CacheStatus,
    /// Set when a requested vulnerability lookup failed; the SBOM then
    /// carries no annotations
    pub vulnerability_lookup_error: Option<String>,
}

impl IndexResponse {
    pub fn new(sbom: Sbom, cache_status: CacheStatus) -> Self {
        Self {
            sbom,
            cache_status,
            vulnerability_lookup_error: None,
        }
    }

    pub fn from_cache(&self) -> bool {
        self.cache_status == CacheStatus::Hit
    }
}
