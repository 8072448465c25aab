use crate::sbom_generation::domain::PackageUrl;
use serde::{Deserialize, Serialize};

/// Where a package was found: a path inside one image layer.
///
/// A location carries both layer addressing schemes so findings from
/// engines that use different native identifiers stay comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub digest: String,
    pub diff_id: String,
}

impl Location {
    pub fn new(
        path: impl Into<String>,
        digest: impl Into<String>,
        diff_id: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
            diff_id: diff_id.into(),
        }
    }

    /// Identity used when unioning location lists
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.path, &self.digest)
    }
}

/// A single detected software package.
///
/// `purl` is derived from (type, namespace, name, version) by the
/// normalizer and is the merge key across scanners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub purl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<u64>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Package {
    /// Creates a package with only its coordinates set.
    pub fn new(
        package_type: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            package_type: package_type.into(),
            namespace: None,
            name: name.into(),
            version: version.into(),
            purl: String::new(),
            author: None,
            description: None,
            licenses: Vec::new(),
            url: None,
            size: None,
            installed_size: None,
            locations: Vec::new(),
            files: Vec::new(),
            parent: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        self.purl = purl.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Computes the canonical purl from the current coordinates.
    pub fn derive_purl(&self) -> PackageUrl {
        PackageUrl::new(
            &self.package_type,
            self.namespace.as_deref(),
            &self.name,
            &self.version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_new_has_no_optional_fields() {
        let package = Package::new("gem", "rake", "13.0.6");
        assert_eq!(package.package_type, "gem");
        assert!(package.namespace.is_none());
        assert!(package.purl.is_empty());
        assert!(package.locations.is_empty());
    }

    #[test]
    fn test_with_namespace_ignores_empty() {
        let package = Package::new("gem", "rake", "13.0.6").with_namespace("");
        assert!(package.namespace.is_none());
    }

    #[test]
    fn test_derive_purl() {
        let package = Package::new("alpine", "musl", "1.2.3").with_namespace("alpine");
        assert_eq!(
            package.derive_purl().to_string(),
            "pkg:alpine/alpine/musl@1.2.3"
        );
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let package = Package::new("gem", "rake", "13.0.6")
            .with_purl("pkg:gem/rake@13.0.6")
            .with_location(Location::new("/usr/lib/ruby", "sha256:aa", "sha256:bb"));
        let json = serde_json::to_value(&package).unwrap();

        assert_eq!(json["type"], "gem");
        assert_eq!(json["purl"], "pkg:gem/rake@13.0.6");
        assert_eq!(json["locations"][0]["diff_id"], "sha256:bb");
        assert!(json.get("namespace").is_none());
        assert!(json.get("licenses").is_none());
        assert!(json.get("files").is_none());
        assert!(json.get("size").is_none());
    }

    #[test]
    fn test_location_dedup_key_ignores_diff_id() {
        let a = Location::new("/lib/apk/db/installed", "sha256:aa", "sha256:bb");
        let b = Location::new("/lib/apk/db/installed", "sha256:aa", "");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
