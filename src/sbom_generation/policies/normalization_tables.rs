use crate::shared::error::SbomError;
use crate::shared::Result;
use std::collections::BTreeMap;

/// Scanner ecosystem names and their canonical package type
const DEFAULT_TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("apk", "alpine"),
    ("debian", "deb"),
    ("ubuntu", "deb"),
    ("node-pkg", "npm"),
    ("java", "maven"),
    ("gobinary", "golang"),
    ("go", "golang"),
    ("go-module", "golang"),
    ("java-archive", "maven"),
    ("jenkins-plugin", "maven"),
    ("python", "pypi"),
    ("python-pkg", "pypi"),
    ("jar", "maven"),
    ("gemspec", "gem"),
    ("centos", "rpm"),
    ("oracle", "rpm"),
    ("ol", "rpm"),
    ("amzn", "rpm"),
    ("amazon", "rpm"),
    ("redhat", "rpm"),
    ("photon", "rpm"),
    ("sles", "rpm"),
    ("rhel", "rpm"),
    ("pip", "pypi"),
    ("rubygems", "gem"),
    ("rust", "cargo"),
    ("crates.io", "cargo"),
    ("packagist", "composer"),
];

/// Distro identifiers and their canonical namespace
const DEFAULT_NAMESPACE_MAPPINGS: &[(&str, &str)] = &[
    ("oracle", "oraclelinux"),
    ("ol", "oraclelinux"),
    ("amazon", "amazonlinux"),
    ("amzn", "amazonlinux"),
    ("rhel", "redhatlinux"),
];

/// NormalizationTables policy: the two rewrite tables applied to every
/// scanner-reported package.
///
/// Both tables are data. The defaults cover the vocabularies of the bundled
/// scanners; deployments extend them through the config file. Unmapped
/// names pass through unchanged.
///
/// Invariant: no canonical value is itself a key, so applying the tables
/// twice gives the same result as applying them once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationTables {
    types: BTreeMap<String, String>,
    namespaces: BTreeMap<String, String>,
}

impl Default for NormalizationTables {
    fn default() -> Self {
        Self {
            types: to_map(DEFAULT_TYPE_MAPPINGS),
            namespaces: to_map(DEFAULT_NAMESPACE_MAPPINGS),
        }
    }
}

impl NormalizationTables {
    /// Builds tables from explicit maps, replacing the defaults entirely.
    pub fn from_maps(
        types: BTreeMap<String, String>,
        namespaces: BTreeMap<String, String>,
    ) -> Result<Self> {
        validate_table("type_mappings", &types)?;
        validate_table("namespace_mappings", &namespaces)?;
        Ok(Self { types, namespaces })
    }

    /// Returns the defaults extended (and overridden) by the given entries.
    pub fn with_overrides(
        types: &BTreeMap<String, String>,
        namespaces: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let mut merged_types = defaults.types;
        merged_types.extend(types.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut merged_namespaces = defaults.namespaces;
        merged_namespaces.extend(namespaces.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::from_maps(merged_types, merged_namespaces)
    }

    /// Canonical package type for a scanner-reported type
    pub fn map_type<'a>(&'a self, package_type: &'a str) -> &'a str {
        self.types
            .get(package_type)
            .map(String::as_str)
            .unwrap_or(package_type)
    }

    /// Canonical namespace for a scanner-reported namespace
    pub fn map_namespace<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.namespaces
            .get(namespace)
            .map(String::as_str)
            .unwrap_or(namespace)
    }
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn validate_table(table: &str, entries: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in entries {
        if key.trim().is_empty() || value.trim().is_empty() {
            return Err(SbomError::Validation {
                message: format!("{} must not contain empty names", table),
            }
            .into());
        }
        if entries.contains_key(value) && key != value {
            return Err(SbomError::Validation {
                message: format!(
                    "{}: '{}' maps to '{}', which is itself remapped; map '{}' to the final name instead",
                    table, key, value, key
                ),
            }
            .into());
        }
    }
    Ok(())
}
