use crate::sbom_generation::domain::Package;
use serde::{Deserialize, Serialize};

/// Base operating system detected by a scanner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distro {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_distro: String,
}

impl Distro {
    pub fn new(
        os_name: impl Into<String>,
        os_version: impl Into<String>,
        os_distro: impl Into<String>,
    ) -> Self {
        Self {
            os_name: os_name.into(),
            os_version: os_version.into(),
            os_distro: os_distro.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.os_name.is_empty() && self.os_version.is_empty() && self.os_distro.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Success,
    Failed,
}

/// Output of one scanner invocation.
///
/// Failures are values, not errors: an adapter always returns an
/// `IndexResult`, and the orchestrator decides what a failure means.
#[derive(Debug, Clone)]
pub struct IndexResult {
    pub scanner: String,
    pub packages: Vec<Package>,
    pub status: ScanStatus,
    pub error: Option<String>,
    pub distro: Distro,
}

impl IndexResult {
    pub fn success(scanner: impl Into<String>, packages: Vec<Package>, distro: Distro) -> Self {
        Self {
            scanner: scanner.into(),
            packages,
            status: ScanStatus::Success,
            error: None,
            distro,
        }
    }

    pub fn failed(scanner: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            scanner: scanner.into(),
            packages: Vec::new(),
            status: ScanStatus::Failed,
            error: Some(error.into()),
            distro: Distro::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScanStatus::Success
    }
}
