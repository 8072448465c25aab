use crate::sbom_generation::domain::VulnerabilitiesByPurl;
use crate::shared::Result;
use async_trait::async_trait;

/// VulnerabilityRepository port for the vulnerability lookup service
///
/// Only purls with at least one known vulnerability appear in the result.
#[async_trait]
pub trait VulnerabilityRepository: Send + Sync {
    async fn lookup(&self, purls: &[String]) -> Result<Vec<VulnerabilitiesByPurl>>;
}
