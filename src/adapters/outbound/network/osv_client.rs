use crate::ports::outbound::VulnerabilityRepository;
use crate::sbom_generation::domain::{
    Advisory, AdvisoryUrl, Cve, Cwe, PackageUrl, Reference, Score, VulnerabilitiesByPurl,
};
use crate::shared::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// purl types OSV can match; others are skipped instead of sent
const SUPPORTED_PURL_TYPES: &[&str] = &[
    "apk", "cargo", "composer", "deb", "gem", "golang", "hex", "maven", "npm", "nuget", "pub",
    "pypi", "swift",
];

/// Normalized purl types that OSV knows under another name
const OSV_PURL_TYPES: &[(&str, &str)] = &[("alpine", "apk")];

const NVD_DETAIL_URL: &str = "https://nvd.nist.gov/vuln/detail";

/// OSV API client for looking up vulnerabilities by purl
///
/// Uses the OSV.dev batch query API, then fetches each advisory's details
/// for its description, scores, and affected range.
///
/// # Security
/// - Implements timeout (30 seconds)
/// - Bounds concurrent detail requests
/// - Does not retry failed requests
pub struct OsvClient {
    client: Client,
    api_url: String,
    vuln_url: String,
}

impl OsvClient {
    const API_ENDPOINT: &'static str = "https://api.osv.dev/v1/querybatch";
    const VULN_ENDPOINT: &'static str = "https://api.osv.dev/v1/vulns";
    const TIMEOUT_SECONDS: u64 = 30;
    const MAX_BATCH_SIZE: usize = 100; // OSV API limit
    const MAX_CONCURRENT_DETAILS: usize = 8;

    /// Creates a new OSV API client with default configuration
    pub fn new() -> Result<Self> {
        let user_agent = format!("image-sbom/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_url: Self::API_ENDPOINT.to_string(),
            vuln_url: Self::VULN_ENDPOINT.to_string(),
        })
    }

    /// The purl to query OSV with, or `None` if OSV cannot match it
    fn query_purl(purl: &str) -> Option<String> {
        let parsed = PackageUrl::parse(purl)?;
        if parsed.version().is_empty() {
            return None;
        }

        let osv_type = OSV_PURL_TYPES
            .iter()
            .find(|(normalized, _)| *normalized == parsed.package_type())
            .map_or(parsed.package_type(), |(_, osv)| *osv);
        if !SUPPORTED_PURL_TYPES.contains(&osv_type) {
            return None;
        }

        let query = PackageUrl::new(
            osv_type,
            parsed.namespace(),
            parsed.name(),
            parsed.version(),
        );
        Some(query.to_string())
    }

    /// Queries one batch of `(purl, query purl)` pairs
    async fn fetch_batch(&self, purls: &[(String, String)]) -> Result<Vec<OsvResult>> {
        let batch_query = OsvBatchQuery {
            queries: purls
                .iter()
                .map(|(_, query)| OsvQuery {
                    package: OsvPackage {
                        purl: query.clone(),
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&batch_query)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("OSV API returned status code {}", response.status());
        }

        let batch_response: OsvBatchResponse = response.json().await?;
        if batch_response.results.len() != purls.len() {
            anyhow::bail!(
                "OSV API returned {} results for {} queries",
                batch_response.results.len(),
                purls.len()
            );
        }
        Ok(batch_response.results)
    }

    /// The batch API only returns ids; details carry descriptions and ranges.
    async fn fetch_vulnerability_details(&self, vuln_id: &str) -> Result<OsvVulnerability> {
        let url = format!("{}/{}", self.vuln_url, urlencoding::encode(vuln_id));
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "OSV API returned status code {} for vulnerability {}",
                response.status(),
                vuln_id
            );
        }

        Ok(response.json().await?)
    }

    async fn to_cve(&self, purl: String, vuln: OsvVulnerability) -> Cve {
        match self.fetch_vulnerability_details(&vuln.id).await {
            Ok(detailed) => convert_to_cve(purl, detailed),
            Err(e) => {
                warn!(id = %vuln.id, error = %e, "Failed to fetch vulnerability details");
                convert_to_cve(purl, vuln)
            }
        }
    }
}

#[async_trait]
impl VulnerabilityRepository for OsvClient {
    async fn lookup(&self, purls: &[String]) -> Result<Vec<VulnerabilitiesByPurl>> {
        let supported: Vec<(String, String)> = purls
            .iter()
            .filter_map(|purl| Some((purl.clone(), Self::query_purl(purl)?)))
            .collect();
        debug!(
            requested = purls.len(),
            supported = supported.len(),
            "Looking up vulnerabilities"
        );

        let mut hits: Vec<(String, OsvVulnerability)> = Vec::new();
        for chunk in supported.chunks(Self::MAX_BATCH_SIZE) {
            let results = self.fetch_batch(chunk).await?;
            for ((purl, _), result) in chunk.iter().zip(results) {
                hits.extend(result.vulns.into_iter().map(|v| (purl.clone(), v)));
            }
        }

        let cves: Vec<Cve> = stream::iter(hits)
            .map(|(purl, vuln)| self.to_cve(purl, vuln))
            .buffered(Self::MAX_CONCURRENT_DETAILS)
            .collect()
            .await;

        Ok(group_by_purl(cves))
    }
}

/// Groups advisories per purl, keeping first-seen purl order
fn group_by_purl(cves: Vec<Cve>) -> Vec<VulnerabilitiesByPurl> {
    let mut grouped: Vec<VulnerabilitiesByPurl> = Vec::new();
    for cve in cves {
        match grouped.iter_mut().find(|g| g.purl == cve.purl) {
            Some(group) => group.vulnerabilities.push(cve),
            None => grouped.push(VulnerabilitiesByPurl::new(cve.purl.clone(), vec![cve])),
        }
    }
    grouped
}

fn convert_to_cve(purl: String, vuln: OsvVulnerability) -> Cve {
    let events: Vec<&OsvEvent> = vuln
        .affected
        .iter()
        .flatten()
        .flat_map(|a| a.ranges.iter().flatten())
        .flat_map(|r| r.events.iter())
        .collect();

    let introduced = events.iter().find_map(|e| e.introduced.clone());
    let fixed_by = events.iter().find_map(|e| e.fixed.clone());
    let vulnerable_range = match (&introduced, &fixed_by) {
        (Some(from), Some(to)) => Some(format!(">={}, <{}", from, to)),
        (Some(from), None) => Some(format!(">={}", from)),
        (None, Some(to)) => Some(format!("<{}", to)),
        (None, None) => None,
    };

    Cve {
        purl,
        source: "osv".to_string(),
        nist_cve: nist_cve(&vuln),
        vendor_advisory: Some(vendor_advisory(&vuln)),
        source_id: vuln.id,
        vulnerable_range,
        fixed_by,
    }
}

/// The OSV record as an advisory of the database that issued the id
fn vendor_advisory(vuln: &OsvVulnerability) -> Advisory {
    let database = advisory_database(&vuln.id);
    let mut advisory = Advisory::new(database.clone(), vuln.id.clone());

    advisory.description = vuln
        .summary
        .iter()
        .chain(vuln.details.iter())
        .find(|text| !text.trim().is_empty())
        .cloned();

    let scores: Vec<Score> = vuln
        .severity
        .iter()
        .map(|s| Score {
            score_type: s.severity_type.clone(),
            value: s.score.clone(),
        })
        .collect();
    if !scores.is_empty() {
        advisory.references.push(Reference {
            source: database,
            scores,
        });
    }

    advisory.cwes = vuln
        .database_specific
        .iter()
        .flat_map(|d| d.cwe_ids.iter())
        .map(|id| Cwe {
            source_id: id.clone(),
            name: None,
        })
        .collect();

    advisory.urls = vuln
        .references
        .iter()
        .filter(|r| !r.url.is_empty())
        .map(|r| AdvisoryUrl {
            name: r.reference_type.clone(),
            value: r.url.clone(),
        })
        .collect();

    advisory
}

/// The NVD entry for the advisory's CVE id, when it has one
fn nist_cve(vuln: &OsvVulnerability) -> Option<Advisory> {
    let cve_id = std::iter::once(&vuln.id)
        .chain(vuln.aliases.iter())
        .find(|id| id.starts_with("CVE-"))?;

    let mut advisory = Advisory::new("nist", cve_id.clone());
    advisory.urls.push(AdvisoryUrl {
        name: "NVD".to_string(),
        value: format!("{}/{}", NVD_DETAIL_URL, cve_id),
    });
    Some(advisory)
}

/// `GHSA-xxxx` is issued by `ghsa`, `PYSEC-2023-74` by `pysec`
fn advisory_database(id: &str) -> String {
    match id.split_once('-') {
        Some((prefix, _)) if !prefix.is_empty() => prefix.to_ascii_lowercase(),
        _ => "osv".to_string(),
    }
}

// OSV API request/response structures

#[derive(Debug, Serialize)]
struct OsvBatchQuery {
    queries: Vec<OsvQuery>,
}

#[derive(Debug, Serialize)]
struct OsvQuery {
    package: OsvPackage,
}

#[derive(Debug, Serialize)]
struct OsvPackage {
    purl: String,
}

#[derive(Debug, Deserialize)]
struct OsvBatchResponse {
    results: Vec<OsvResult>,
}

#[derive(Debug, Deserialize)]
struct OsvResult {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    database_specific: Option<OsvDatabaseSpecific>,
    #[serde(default)]
    affected: Option<Vec<OsvAffected>>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String,
    score: String,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    #[serde(rename = "type", default)]
    reference_type: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct OsvDatabaseSpecific {
    #[serde(default)]
    cwe_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    ranges: Option<Vec<OsvRange>>,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    #[serde(default)]
    introduced: Option<String>,
    #[serde(default)]
    fixed: Option<String>,
}
