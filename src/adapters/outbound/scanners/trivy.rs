use super::coordinates;
use super::engine::{run_engine, EngineSettings, DEFAULT_ENGINE_TIMEOUT};
use crate::ports::outbound::PackageScanner;
use crate::sbom_generation::domain::{Distro, IndexResult, LayerMapping, Location, Package};
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use tracing::{info, warn};

const TRIVY: &str = "trivy";

/// Result class trivy uses for distribution packages
const OS_PACKAGES_CLASS: &str = "os-pkgs";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyReport {
    #[serde(default)]
    metadata: TrivyMetadata,
    #[serde(default)]
    results: Option<Vec<TrivyResult>>,
}

#[derive(Debug, Default, Deserialize)]
struct TrivyMetadata {
    #[serde(rename = "OS", default)]
    os: Option<TrivyOs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyOs {
    #[serde(default)]
    family: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyResult {
    #[serde(default)]
    target: String,
    #[serde(default)]
    class: String,
    #[serde(rename = "Type", default)]
    result_type: String,
    #[serde(default)]
    packages: Option<Vec<TrivyPackage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrivyPackage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    release: String,
    #[serde(default)]
    epoch: u32,
    #[serde(default)]
    licenses: Option<Vec<String>>,
    #[serde(default)]
    maintainer: Option<String>,
    #[serde(default)]
    identifier: TrivyIdentifier,
    #[serde(default)]
    layer: TrivyLayer,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    installed_files: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct TrivyIdentifier {
    #[serde(rename = "PURL", default)]
    purl: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TrivyLayer {
    #[serde(rename = "Digest", default)]
    digest: String,
    #[serde(rename = "DiffID", default)]
    diff_id: String,
}

/// TrivyScanner adapter: the primary (vulnerability-oriented) scanner
///
/// Runs `trivy image --input <layout> --format json --list-all-pkgs` and
/// converts the report's package lists. Trivy attributes packages by
/// layer digest and diff ID; whichever is missing is filled from the
/// layer mapping.
pub struct TrivyScanner {
    settings: EngineSettings,
}

impl TrivyScanner {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    fn args(image_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["image".into(), "--input".into()];
        args.push(image_path.as_os_str().to_owned());
        args.extend(
            ["--format", "json", "--list-all-pkgs", "--quiet"]
                .iter()
                .map(OsString::from),
        );
        args
    }

    /// Converts a trivy JSON report into packages and the detected distro
    pub fn parse_report(report: &[u8], mapping: &LayerMapping) -> Result<(Vec<Package>, Distro)> {
        let report: TrivyReport = serde_json::from_slice(report)
            .map_err(|e| anyhow::anyhow!("malformed trivy report: {}", e))?;

        let os = report.metadata.os.unwrap_or_default();
        let distro = Distro::new(&os.family, &os.name, &os.family);

        let mut packages = Vec::new();
        for result in report.results.unwrap_or_default() {
            let is_os = result.class == OS_PACKAGES_CLASS;
            for package in result.packages.unwrap_or_default() {
                packages.push(convert(
                    package,
                    &result.target,
                    &result.result_type,
                    is_os,
                    &os.family,
                    mapping,
                ));
            }
        }

        Ok((packages, distro))
    }
}

impl Default for TrivyScanner {
    fn default() -> Self {
        Self::new(EngineSettings::new(TRIVY, DEFAULT_ENGINE_TIMEOUT))
    }
}

fn convert(
    package: TrivyPackage,
    target: &str,
    package_type: &str,
    is_os: bool,
    os_family: &str,
    mapping: &LayerMapping,
) -> Package {
    let version = full_version(&package);
    let (namespace, name) =
        coordinates::identity(package.identifier.purl.as_deref(), &package.name);
    let namespace = match namespace {
        None if is_os && !os_family.is_empty() => Some(os_family.to_string()),
        namespace => namespace,
    };

    let (digest, diff_id) = mapping.complete(&package.layer.digest, &package.layer.diff_id);
    let path = package
        .file_path
        .clone()
        .filter(|p| !p.is_empty())
        .or_else(|| is_os.then(|| os_database_path(os_family).to_string()))
        .unwrap_or_else(|| target.to_string());

    let mut converted = Package::new(package_type, name, version)
        .with_purl(package.identifier.purl.unwrap_or_default())
        .with_location(Location::new(path, &digest, &diff_id));
    if let Some(namespace) = namespace {
        converted = converted.with_namespace(namespace);
    }
    converted.author = package.maintainer.filter(|m| !m.is_empty());
    converted.licenses = package.licenses.unwrap_or_default();
    converted.files = package
        .installed_files
        .unwrap_or_default()
        .into_iter()
        .map(|file| Location::new(file, &digest, &diff_id))
        .collect();
    converted
}

/// `[epoch:]version[-release]`, the way distro package managers print it
fn full_version(package: &TrivyPackage) -> String {
    let mut version = package.version.clone();
    if !package.release.is_empty() {
        version = format!("{}-{}", version, package.release);
    }
    if package.epoch > 0 {
        version = format!("{}:{}", package.epoch, version);
    }
    version
}

/// Package database trivy read OS packages from, by OS family
fn os_database_path(os_family: &str) -> &'static str {
    match os_family {
        "alpine" | "wolfi" | "chainguard" => "/lib/apk/db/installed",
        "debian" | "ubuntu" => "/var/lib/dpkg/status",
        _ => "/var/lib/rpm/Packages",
    }
}

#[async_trait]
impl PackageScanner for TrivyScanner {
    fn name(&self) -> &str {
        TRIVY
    }

    async fn scan(&self, image_path: &Path, mapping: &LayerMapping) -> IndexResult {
        let outcome = match run_engine(&self.settings, &Self::args(image_path)).await {
            Ok(stdout) => Self::parse_report(&stdout, mapping),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((packages, distro)) => {
                info!(
                    scanner = TRIVY,
                    packages = packages.len(),
                    "Scanner finished"
                );
                IndexResult::success(TRIVY, packages, distro)
            }
            Err(e) => {
                warn!(scanner = TRIVY, error = %e, "Scanner failed");
                IndexResult::failed(TRIVY, format!("{:#}", e))
            }
        }
    }
}
