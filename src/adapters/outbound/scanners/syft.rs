use super::coordinates;
use super::engine::{run_engine, EngineSettings, DEFAULT_ENGINE_TIMEOUT};
use crate::ports::outbound::PackageScanner;
use crate::sbom_generation::domain::{Distro, IndexResult, LayerMapping, Location, Package};
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsString;
use std::path::Path;
use tracing::{info, warn};

const SYFT: &str = "syft";

#[derive(Debug, Default, Deserialize)]
struct SyftReport {
    #[serde(default)]
    artifacts: Option<Vec<SyftArtifact>>,
    #[serde(default)]
    distro: Option<SyftDistro>,
}

#[derive(Debug, Deserialize)]
struct SyftArtifact {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(rename = "type", default)]
    artifact_type: String,
    #[serde(default)]
    purl: Option<String>,
    #[serde(default)]
    licenses: Option<Vec<SyftLicense>>,
    #[serde(default)]
    locations: Option<Vec<SyftLocation>>,
    /// Shape depends on `metadataType`; read field by field
    #[serde(default)]
    metadata: Value,
}

/// Older reports list licenses as strings, newer ones as objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyftLicense {
    Plain(String),
    Detailed { value: String },
}

impl SyftLicense {
    fn into_value(self) -> String {
        match self {
            SyftLicense::Plain(value) | SyftLicense::Detailed { value } => value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SyftLocation {
    #[serde(default)]
    path: String,
    /// Syft addresses layers by diff ID
    #[serde(rename = "layerID", default)]
    layer_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct SyftDistro {
    #[serde(default)]
    name: String,
    #[serde(default)]
    id: String,
    #[serde(rename = "versionID", default)]
    version_id: String,
}

/// SyftScanner adapter: the secondary (general package) scanner
///
/// Runs `syft scan oci-dir:<layout> -o syft-json` and converts the
/// artifact list. Syft reports diff IDs; the layer digest is filled from
/// the layer mapping.
pub struct SyftScanner {
    settings: EngineSettings,
}

impl SyftScanner {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    fn args(image_path: &Path) -> Vec<OsString> {
        let mut source = OsString::from("oci-dir:");
        source.push(image_path.as_os_str());
        vec![
            "scan".into(),
            source,
            "-o".into(),
            "syft-json".into(),
            "--quiet".into(),
        ]
    }

    /// Converts a syft-json report into packages and the detected distro
    pub fn parse_report(report: &[u8], mapping: &LayerMapping) -> Result<(Vec<Package>, Distro)> {
        let report: SyftReport = serde_json::from_slice(report)
            .map_err(|e| anyhow::anyhow!("malformed syft report: {}", e))?;

        let distro = report
            .distro
            .map(|d| Distro::new(d.name, d.version_id, d.id))
            .unwrap_or_default();

        let packages = report
            .artifacts
            .unwrap_or_default()
            .into_iter()
            .map(|artifact| convert(artifact, mapping))
            .collect();

        Ok((packages, distro))
    }
}

impl Default for SyftScanner {
    fn default() -> Self {
        Self::new(EngineSettings::new(SYFT, DEFAULT_ENGINE_TIMEOUT))
    }
}

fn convert(artifact: SyftArtifact, mapping: &LayerMapping) -> Package {
    let (namespace, name) = coordinates::identity(artifact.purl.as_deref(), &artifact.name);

    let locations: Vec<Location> = artifact
        .locations
        .unwrap_or_default()
        .into_iter()
        .map(|location| {
            let (digest, diff_id) = mapping.complete("", &location.layer_id);
            Location::new(location.path, digest, diff_id)
        })
        .collect();

    // Installed files live in the layer of the package's first location
    let (digest, diff_id) = locations
        .first()
        .map(|l| (l.digest.clone(), l.diff_id.clone()))
        .unwrap_or_default();
    let files = metadata_files(&artifact.metadata)
        .into_iter()
        .map(|path| Location::new(path, &digest, &diff_id))
        .collect();

    let mut package = Package::new(artifact.artifact_type, name, artifact.version)
        .with_purl(artifact.purl.unwrap_or_default());
    if let Some(namespace) = namespace {
        package = package.with_namespace(namespace);
    }
    package.locations = locations;
    package.files = files;
    package.licenses = artifact
        .licenses
        .unwrap_or_default()
        .into_iter()
        .map(SyftLicense::into_value)
        .filter(|l| !l.is_empty())
        .collect();

    let metadata = &artifact.metadata;
    package.author = metadata_str(metadata, &["author", "maintainer"]);
    package.description = metadata_str(metadata, &["description", "summary"]);
    package.url = metadata_str(metadata, &["url", "homepage"]);
    package.size = metadata_u64(metadata, "size");
    package.installed_size = metadata_u64(metadata, "installedSize");
    package
}

fn metadata_str(metadata: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| metadata.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn metadata_u64(metadata: &Value, key: &str) -> Option<u64> {
    metadata.get(key).and_then(Value::as_u64)
}

fn metadata_files(metadata: &Value) -> Vec<String> {
    metadata
        .get("files")
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(|f| f.get("path").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl PackageScanner for SyftScanner {
    fn name(&self) -> &str {
        SYFT
    }

    async fn scan(&self, image_path: &Path, mapping: &LayerMapping) -> IndexResult {
        let outcome = match run_engine(&self.settings, &Self::args(image_path)).await {
            Ok(stdout) => Self::parse_report(&stdout, mapping),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((packages, distro)) => {
                info!(
                    scanner = SYFT,
                    packages = packages.len(),
                    "Scanner finished"
                );
                IndexResult::success(SYFT, packages, distro)
            }
            Err(e) => {
                warn!(scanner = SYFT, error = %e, "Scanner failed");
                IndexResult::failed(SYFT, format!("{:#}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::ScanStatus;
    use std::time::Duration;

    const DIGEST: &str = "sha256:d0d0d0";
    const DIFF_ID: &str = "sha256:f0f0f0";

    fn mapping() -> LayerMapping {
        LayerMapping::new("sha256:img", &[DIGEST.to_string()], &[DIFF_ID.to_string()]).unwrap()
    }

    const REPORT: &str = r#"{
      "artifacts": [
        {
          "id": "4b5e0b6a1f",
          "name": "musl",
          "version": "1.2.4-r2",
          "type": "apk",
          "foundBy": "apk-db-cataloger",
          "locations": [{ "path": "/lib/apk/db/installed", "layerID": "sha256:f0f0f0" }],
          "licenses": [{ "value": "MIT", "spdxExpression": "MIT", "type": "declared" }],
          "purl": "pkg:apk/alpine/musl@1.2.4-r2?arch=x86_64&distro=alpine-3.18.4",
          "metadataType": "apk-db-entry",
          "metadata": {
            "package": "musl",
            "maintainer": "Timo Teräs <timo.teras@iki.fi>",
            "url": "https://musl.libc.org/",
            "description": "the musl c library (libc) implementation",
            "size": 383152,
            "installedSize": 622592,
            "files": [{ "path": "/lib" }, { "path": "/lib/ld-musl-x86_64.so.1" }]
          }
        },
        {
          "name": "commons-io",
          "version": "2.11.0",
          "type": "java-archive",
          "locations": [{ "path": "/app/lib/commons-io-2.11.0.jar", "layerID": "sha256:unknown" }],
          "licenses": ["Apache-2.0"],
          "purl": "pkg:maven/commons-io/commons-io@2.11.0",
          "metadata": { "virtualPath": "/app/lib/commons-io-2.11.0.jar" }
        }
      ],
      "distro": { "prettyName": "Alpine Linux v3.18", "name": "Alpine Linux", "id": "alpine", "versionID": "3.18.4" }
    }"#;

    #[test]
    fn test_parse_apk_artifact() {
        let (packages, _) = SyftScanner::parse_report(REPORT.as_bytes(), &mapping()).unwrap();
        let musl = &packages[0];

        assert_eq!(musl.package_type, "apk");
        assert_eq!(musl.namespace.as_deref(), Some("alpine"));
        assert_eq!(musl.name, "musl");
        assert_eq!(musl.licenses, vec!["MIT".to_string()]);
        assert_eq!(musl.url.as_deref(), Some("https://musl.libc.org/"));
        assert_eq!(musl.size, Some(383152));
        assert_eq!(musl.installed_size, Some(622592));
        assert!(musl.author.as_deref().unwrap().starts_with("Timo"));
        assert_eq!(
            musl.locations,
            vec![Location::new("/lib/apk/db/installed", DIGEST, DIFF_ID)]
        );
        assert_eq!(musl.files.len(), 2);
        assert_eq!(musl.files[1].digest, DIGEST);
    }

    #[test]
    fn test_plain_licenses_and_unknown_layer() {
        let (packages, _) = SyftScanner::parse_report(REPORT.as_bytes(), &mapping()).unwrap();
        let jar = &packages[1];

        assert_eq!(jar.namespace.as_deref(), Some("commons-io"));
        assert_eq!(jar.licenses, vec!["Apache-2.0".to_string()]);
        assert_eq!(jar.locations[0].digest, "");
        assert_eq!(jar.locations[0].diff_id, "sha256:unknown");
        assert!(jar.description.is_none());
    }

    #[test]
    fn test_parse_distro() {
        let (_, distro) = SyftScanner::parse_report(REPORT.as_bytes(), &mapping()).unwrap();
        assert_eq!(distro, Distro::new("Alpine Linux", "3.18.4", "alpine"));
    }

    #[test]
    fn test_missing_distro_and_artifacts() {
        let (packages, distro) =
            SyftScanner::parse_report(br#"{"artifacts": null, "distro": null}"#, &mapping())
                .unwrap();
        assert!(packages.is_empty());
        assert!(distro.is_empty());
    }

    #[test]
    fn test_malformed_report() {
        let err = SyftScanner::parse_report(b"[", &mapping()).unwrap_err();
        assert!(err.to_string().contains("malformed syft report"));
    }

    #[test]
    fn test_args() {
        let args = SyftScanner::args(Path::new("/tmp/layout"));
        assert_eq!(args[1], "oci-dir:/tmp/layout");
        assert_eq!(args[3], "syft-json");
    }

    #[tokio::test]
    async fn test_engine_failure_is_a_failed_result() {
        let scanner = SyftScanner::new(EngineSettings::new(
            "image-sbom-no-such-syft",
            Duration::from_secs(1),
        ));
        let result = scanner.scan(Path::new("/tmp/layout"), &mapping()).await;

        assert_eq!(result.status, ScanStatus::Failed);
        assert!(result.error.is_some());
    }
}
