//! Configuration file support for image-sbom.
//!
//! Provides YAML-based configuration through `image-sbom.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::outbound::scanners::{EngineSettings, DEFAULT_ENGINE_TIMEOUT};
use crate::sbom_generation::policies::NormalizationTables;
use crate::shared::Result;

const CONFIG_FILENAME: &str = "image-sbom.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub no_cache: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub check_cve: Option<bool>,
    pub scanners: Option<ScannersConfig>,
    pub type_mappings: Option<BTreeMap<String, String>>,
    pub namespace_mappings: Option<BTreeMap<String, String>>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Per-engine overrides.
#[derive(Debug, Deserialize, Default)]
pub struct ScannersConfig {
    pub trivy: Option<ScannerConfig>,
    pub syft: Option<ScannerConfig>,
}

/// How to run one scanner engine.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScannerConfig {
    pub binary: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ScannerConfig {
    /// Engine settings with unset fields taken from the defaults.
    pub fn engine_settings(&self, default_binary: &str) -> EngineSettings {
        EngineSettings::new(
            self.binary.as_deref().unwrap_or(default_binary),
            self.timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ENGINE_TIMEOUT),
        )
    }
}

impl ConfigFile {
    /// Settings for the `trivy` engine
    pub fn trivy_settings(&self) -> EngineSettings {
        self.scanner("trivy", |s| s.trivy.as_ref())
    }

    /// Settings for the `syft` engine
    pub fn syft_settings(&self) -> EngineSettings {
        self.scanner("syft", |s| s.syft.as_ref())
    }

    fn scanner(
        &self,
        default_binary: &str,
        pick: impl Fn(&ScannersConfig) -> Option<&ScannerConfig>,
    ) -> EngineSettings {
        self.scanners
            .as_ref()
            .and_then(pick)
            .cloned()
            .unwrap_or_default()
            .engine_settings(default_binary)
    }

    /// Default normalization tables extended with the configured mappings.
    pub fn normalization_tables(&self) -> Result<NormalizationTables> {
        let empty = BTreeMap::new();
        NormalizationTables::with_overrides(
            self.type_mappings.as_ref().unwrap_or(&empty),
            self.namespace_mappings.as_ref().unwrap_or(&empty),
        )
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(ref scanners) = config.scanners {
        for (name, scanner) in [("trivy", &scanners.trivy), ("syft", &scanners.syft)] {
            let Some(scanner) = scanner else { continue };
            if scanner.timeout_secs == Some(0) {
                bail!(
                    "Invalid config: scanners.{}.timeout_secs must be greater than 0.\n\n\
                     💡 Hint: Omit the field to use the default of {}s.",
                    name,
                    DEFAULT_ENGINE_TIMEOUT.as_secs()
                );
            }
            if scanner
                .binary
                .as_deref()
                .is_some_and(|b| b.trim().is_empty())
            {
                bail!(
                    "Invalid config: scanners.{}.binary must not be empty.\n\n\
                     💡 Hint: Use a command name on PATH (e.g., \"{}\") or an absolute path.",
                    name,
                    name
                );
            }
        }
    }

    config.normalization_tables()?;
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}
