use async_trait::async_trait;
use image_sbom::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock VulnerabilityRepository backed by a purl → advisory id table
#[derive(Clone, Default)]
pub struct MockVulnerabilityRepository {
    advisories: HashMap<String, Vec<String>>,
    requested: Arc<Mutex<Vec<String>>>,
    should_fail: bool,
}

impl MockVulnerabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advisory(mut self, purl: &str, id: &str) -> Self {
        self.advisories
            .entry(purl.to_string())
            .or_default()
            .push(id.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Every purl passed to `lookup`, in call order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl VulnerabilityRepository for MockVulnerabilityRepository {
    async fn lookup(&self, purls: &[String]) -> Result<Vec<VulnerabilitiesByPurl>> {
        self.requested.lock().unwrap().extend(purls.iter().cloned());
        if self.should_fail {
            anyhow::bail!("Mock vulnerability service unavailable");
        }

        Ok(purls
            .iter()
            .filter_map(|purl| {
                let ids = self.advisories.get(purl)?;
                let cves = ids
                    .iter()
                    .map(|id| Cve {
                        purl: purl.clone(),
                        source: "osv".to_string(),
                        source_id: id.clone(),
                        vulnerable_range: None,
                        fixed_by: None,
                        vendor_advisory: None,
                        nist_cve: None,
                    })
                    .collect();
                Some(VulnerabilitiesByPurl::new(purl.clone(), cves))
            })
            .collect())
    }
}
