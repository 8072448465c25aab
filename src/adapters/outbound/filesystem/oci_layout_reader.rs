use crate::ports::outbound::{ImageResolver, ResolvedImage};
use crate::sbom_generation::domain::{Distro, ImageDigest, ImageSource, Platform};
use crate::shared::error::SbomError;
use crate::shared::security::{read_bounded, MAX_METADATA_SIZE};
use crate::shared::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use oci_spec::image::{ImageConfiguration, ImageIndex, ImageManifest};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Annotation carrying the tag of an image in an OCI layout index
const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// OciLayoutResolver adapter for images stored as local OCI image layouts
///
/// Implements the ImageResolver port. A layout directory holds an
/// `oci-layout` marker, an `index.json`, and content-addressed blobs under
/// `blobs/<algorithm>/<hex>`. The first manifest of the index is the image.
/// Pulling from a registry is not supported.
pub struct OciLayoutResolver;

impl OciLayoutResolver {
    pub fn new() -> Self {
        Self
    }

    fn validate_layout(root: &Path) -> Result<()> {
        for entry in ["oci-layout", "index.json", "blobs"] {
            if !root.join(entry).exists() {
                anyhow::bail!(
                    "Not a valid OCI layout: missing {} in {}",
                    entry,
                    root.display()
                );
            }
        }
        Ok(())
    }

    fn blob_path(root: &Path, digest: &str) -> Result<PathBuf> {
        let digest = ImageDigest::parse(digest)?;
        Ok(root
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.hex()))
    }

    fn read_blob(root: &Path, digest: &str, description: &str) -> Result<Vec<u8>> {
        let path = Self::blob_path(root, digest)?;
        read_bounded(&path, description, MAX_METADATA_SIZE)
    }

    fn read_layout(&self, name: &str, root: &Path) -> Result<ResolvedImage> {
        Self::validate_layout(root)?;

        let index_bytes = read_bounded(&root.join("index.json"), "index.json", MAX_METADATA_SIZE)?;
        let index: ImageIndex = serde_json::from_slice(&index_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to parse index.json: {}", e))?;

        let descriptor = index
            .manifests()
            .first()
            .ok_or_else(|| anyhow::anyhow!("No manifests in index.json"))?;
        let manifest_digest = descriptor.digest().to_string();

        let tags: Vec<String> = index
            .manifests()
            .iter()
            .filter(|d| d.digest().to_string() == manifest_digest)
            .filter_map(|d| d.annotations().as_ref()?.get(REF_NAME_ANNOTATION).cloned())
            .collect();

        let raw_manifest = Self::read_blob(root, &manifest_digest, "manifest blob")?;
        let manifest: ImageManifest = serde_json::from_slice(&raw_manifest)
            .map_err(|e| anyhow::anyhow!("Failed to parse manifest: {}", e))?;

        let config_digest = manifest.config().digest().to_string();
        let raw_config = Self::read_blob(root, &config_digest, "config blob")?;
        let (config, platform) = parse_config(&raw_config)?;

        let layer_digests: Vec<String> = manifest
            .layers()
            .iter()
            .map(|layer| layer.digest().to_string())
            .collect();
        let diff_ids = config.rootfs().diff_ids().clone();
        let size = i64::try_from(manifest.config().size()).unwrap_or_default();

        debug!(
            digest = %manifest_digest,
            layers = layer_digests.len(),
            tags = tags.len(),
            "Read OCI layout"
        );

        Ok(ResolvedImage {
            layout_path: root.to_path_buf(),
            source: ImageSource {
                name: name.to_string(),
                digest: manifest_digest,
                tags: (!tags.is_empty()).then_some(tags),
                manifest: Some(manifest),
                config: Some(config),
                raw_manifest: STANDARD.encode(&raw_manifest),
                raw_config: STANDARD.encode(&raw_config),
                distro: Distro::default(),
                platform,
                size,
            },
            layer_digests,
            diff_ids,
        })
    }
}

impl Default for OciLayoutResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageResolver for OciLayoutResolver {
    fn resolve(&self, reference: &str, layout_path: Option<&Path>) -> Result<ResolvedImage> {
        let root = match layout_path {
            Some(path) => path.to_path_buf(),
            None if Path::new(reference).is_dir() => PathBuf::from(reference),
            None => {
                return Err(SbomError::Resolution {
                    reference: reference.to_string(),
                    details: "not a local OCI image layout; pulling from a registry is not supported"
                        .to_string(),
                }
                .into())
            }
        };

        self.read_layout(reference, &root).map_err(|e| {
            SbomError::Resolution {
                reference: reference.to_string(),
                details: format!("{:#}", e),
            }
            .into()
        })
    }
}

/// Parses an image config blob.
///
/// `history` is optional in image configs; a missing or null one is read as
/// empty so that `ImageConfiguration` accepts it.
fn parse_config(raw_config: &[u8]) -> Result<(ImageConfiguration, Platform)> {
    let mut value: serde_json::Value = serde_json::from_slice(raw_config)
        .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
    let platform = platform_of(&value);

    if let Some(object) = value.as_object_mut() {
        let history = object
            .entry("history")
            .or_insert(serde_json::Value::Null);
        if history.is_null() {
            *history = serde_json::Value::Array(Vec::new());
        }
    }

    let config = serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
    Ok((config, platform))
}

/// Platform fields read straight from the config JSON
fn platform_of(value: &serde_json::Value) -> Platform {
    let field = |key: &str| {
        value
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    Platform {
        os: field("os").unwrap_or_default(),
        architecture: field("architecture").unwrap_or_default(),
        variant: field("variant").filter(|v| !v.is_empty()),
    }
}

#[cfg(test)]
mod test_layout {
    use std::fs;
    use std::path::Path;

    pub const MANIFEST_HEX: &str =
        "1f3b3f1c5e2d4a6b8c0d2e4f6a8b0c2d4e6f8a0b2c4d6e8f0a1b3c5d7e9f1a3b";
    pub const CONFIG_HEX: &str =
        "2a4c6e8f0b1d3f5a7c9e1b3d5f7a9c1e3b5d7f9a1c3e5b7d9f1a3c5e7b9d1f3a";
    pub const LAYER_HEX: &str =
        "3b5d7f9a1c3e5b7d9f1a3c5e7b9d1f3a2a4c6e8f0b1d3f5a7c9e1b3d5f7a9c1e";
    pub const DIFF_ID_HEX: &str =
        "4c6e8f0b1d3f5a7c9e1b3d5f7a9c1e3b5d7f9a1c3e5b7d9f1a3c5e7b9d1f3a2a";

    /// Writes a single-layer OCI layout tagged `alpine:3.18`
    pub fn write(root: &Path) {
        let blobs = root.join("blobs/sha256");
        fs::create_dir_all(&blobs).unwrap();
        fs::write(root.join("oci-layout"), r#"{"imageLayoutVersion":"1.0.0"}"#).unwrap();

        let config = format!(
            r#"{{"architecture":"arm64","variant":"v8","os":"linux","rootfs":{{"type":"layers","diff_ids":["sha256:{}"]}}}}"#,
            DIFF_ID_HEX
        );
        fs::write(blobs.join(CONFIG_HEX), &config).unwrap();

        let manifest = format!(
            r#"{{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json","config":{{"mediaType":"application/vnd.oci.image.config.v1+json","digest":"sha256:{}","size":{}}},"layers":[{{"mediaType":"application/vnd.oci.image.layer.v1.tar+gzip","digest":"sha256:{}","size":100}}]}}"#,
            CONFIG_HEX,
            config.len(),
            LAYER_HEX
        );
        fs::write(blobs.join(MANIFEST_HEX), &manifest).unwrap();

        let index = format!(
            r#"{{"schemaVersion":2,"manifests":[{{"mediaType":"application/vnd.oci.image.manifest.v1+json","digest":"sha256:{}","size":{},"annotations":{{"org.opencontainers.image.ref.name":"alpine:3.18"}}}}]}}"#,
            MANIFEST_HEX,
            manifest.len()
        );
        fs::write(root.join("index.json"), index).unwrap();
    }
}
