use crate::ports::outbound::VulnerabilityRepository;
use crate::sbom_generation::domain::{Cve, VulnerabilitiesByPurl};
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// CachingVulnerabilityRepository wraps a VulnerabilityRepository and adds
/// in-memory caching per purl.
///
/// Decorator over any VulnerabilityRepository. Only purls that were not
/// looked up before in this process reach the inner repository. A purl
/// without advisories is cached as an empty list. Failed lookups are not
/// cached.
pub struct CachingVulnerabilityRepository<R: VulnerabilityRepository> {
    inner: R,
    cache: Arc<DashMap<String, Vec<Cve>>>,
}

impl<R: VulnerabilityRepository> CachingVulnerabilityRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Returns the current cache size (for testing/monitoring)
    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<R: VulnerabilityRepository> VulnerabilityRepository for CachingVulnerabilityRepository<R> {
    async fn lookup(&self, purls: &[String]) -> Result<Vec<VulnerabilitiesByPurl>> {
        let misses: Vec<String> = purls
            .iter()
            .filter(|purl| !self.cache.contains_key(*purl))
            .cloned()
            .collect();

        if !misses.is_empty() {
            let fetched = self.inner.lookup(&misses).await?;
            for purl in &misses {
                self.cache.insert(purl.clone(), Vec::new());
            }
            for entry in fetched {
                self.cache.insert(entry.purl, entry.vulnerabilities);
            }
        }

        let mut seen = std::collections::HashSet::new();
        Ok(purls
            .iter()
            .filter(|purl| seen.insert(purl.as_str()))
            .filter_map(|purl| {
                let cached = self.cache.get(purl)?;
                (!cached.is_empty())
                    .then(|| VulnerabilitiesByPurl::new(purl.clone(), cached.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock repository that records every purl it is asked about
    struct MockVulnerabilityRepository {
        call_count: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl MockVulnerabilityRepository {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VulnerabilityRepository for MockVulnerabilityRepository {
        async fn lookup(&self, purls: &[String]) -> Result<Vec<VulnerabilitiesByPurl>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().extend(purls.iter().cloned());
            Ok(purls
                .iter()
                .filter(|purl| purl.contains("lodash"))
                .map(|purl| {
                    VulnerabilitiesByPurl::new(
                        purl.clone(),
                        vec![Cve {
                            purl: purl.clone(),
                            source: "osv".to_string(),
                            source_id: "GHSA-p6mc-m468-83gw".to_string(),
                            vulnerable_range: None,
                            fixed_by: Some("4.17.19".to_string()),
                            vendor_advisory: None,
                            nist_cve: None,
                        }],
                    )
                })
                .collect())
        }
    }

    fn purls(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let repo = CachingVulnerabilityRepository::new(MockVulnerabilityRepository::new());
        let query = purls(&["pkg:npm/lodash@4.17.15", "pkg:npm/left-pad@1.3.0"]);

        let first = repo.lookup(&query).await.unwrap();
        let second = repo.lookup(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(repo.inner.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(repo.cache_size(), 2);
    }

    #[tokio::test]
    async fn test_only_misses_reach_inner_repository() {
        let repo = CachingVulnerabilityRepository::new(MockVulnerabilityRepository::new());

        repo.lookup(&purls(&["pkg:npm/lodash@4.17.15"]))
            .await
            .unwrap();
        repo.lookup(&purls(&["pkg:npm/lodash@4.17.15", "pkg:gem/rake@13.0.6"]))
            .await
            .unwrap();

        let requested = repo.inner.requested.lock().unwrap().clone();
        assert_eq!(
            requested,
            purls(&["pkg:npm/lodash@4.17.15", "pkg:gem/rake@13.0.6"])
        );
    }

    #[tokio::test]
    async fn test_duplicate_purls_are_reported_once() {
        let repo = CachingVulnerabilityRepository::new(MockVulnerabilityRepository::new());
        let result = repo
            .lookup(&purls(&["pkg:npm/lodash@4.17.15", "pkg:npm/lodash@4.17.15"]))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
    }
}
