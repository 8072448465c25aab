use serde::{Deserialize, Serialize};

/// A severity score attached to an advisory reference, e.g. a CVSS vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "type")]
    pub score_type: String,
    pub value: String,
}

/// Scores published by one scoring source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub source: String,
    #[serde(default)]
    pub scores: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cwe {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A named link, e.g. `ADVISORY` or `FIX`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryUrl {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

/// One advisory record as published by a single source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub source: String,
    pub source_id: String,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwes: Vec<Cwe>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<AdvisoryUrl>,
}

impl Advisory {
    pub fn new(source: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_id: source_id.into(),
            references: Vec::new(),
            description: None,
            cwes: Vec::new(),
            urls: Vec::new(),
        }
    }
}

/// A vulnerability affecting one package, as returned by the lookup service
///
/// `vendor_advisory` is the lookup service's own record; `nist_cve` is the
/// matching CVE entry when the advisory has a CVE alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cve {
    pub purl: String,
    pub source: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerable_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_advisory: Option<Advisory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nist_cve: Option<Advisory>,
}

/// Vulnerability annotations for one purl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilitiesByPurl {
    pub purl: String,
    pub vulnerabilities: Vec<Cve>,
}

impl VulnerabilitiesByPurl {
    pub fn new(purl: impl Into<String>, vulnerabilities: Vec<Cve>) -> Self {
        Self {
            purl: purl.into(),
            vulnerabilities,
        }
    }
}

/// Total number of advisories across all purls
pub fn count_vulnerabilities(annotations: &[VulnerabilitiesByPurl]) -> usize {
    annotations.iter().map(|v| v.vulnerabilities.len()).sum()
}
