use crate::sbom_generation::domain::{Distro, Package, VulnerabilitiesByPurl};
use crate::shared::Result;
use oci_spec::image::{ImageConfiguration, ImageManifest};
use serde::{Deserialize, Serialize};

/// Target platform of the image, taken from its config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub architecture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Identity and metadata of the indexed image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    pub name: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub manifest: Option<ImageManifest>,
    pub config: Option<ImageConfiguration>,
    /// Base64 of the manifest bytes as stored in the layout
    pub raw_manifest: String,
    /// Base64 of the config bytes as stored in the layout
    pub raw_config: String,
    pub distro: Distro,
    pub platform: Platform,
    /// Size of the config blob as recorded in the manifest
    pub size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    pub image: ImageSource,
}

/// Tool identity plus the schema version used to validate cache entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub version: String,
    pub sbom_version: String,
}

/// The persisted SBOM document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sbom {
    pub source: Source,
    pub artifacts: Vec<Package>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<VulnerabilitiesByPurl>>,
    pub descriptor: Descriptor,
}

impl Sbom {
    /// Serializes the document as 2-space indented JSON
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn digest(&self) -> &str {
        &self.source.image.digest
    }
}
