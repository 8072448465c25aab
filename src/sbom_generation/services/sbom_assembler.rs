use crate::sbom_generation::domain::{Descriptor, Distro, ImageSource, Package, Sbom, Source};

/// Tool name recorded in every SBOM descriptor
pub const TOOL_NAME: &str = "image-sbom";

/// Version of the persisted document layout. Cache entries written with a
/// different value are ignored.
pub const SBOM_VERSION: &str = "1";

/// SbomAssembler service for building the final SBOM document
///
/// Pure business logic: combines the resolved image metadata with the
/// merged package list and stamps the descriptor.
pub struct SbomAssembler;

impl SbomAssembler {
    /// Creates a descriptor for the given tool identity and schema version
    pub fn descriptor(tool_name: &str, tool_version: &str, sbom_version: &str) -> Descriptor {
        Descriptor {
            name: tool_name.to_string(),
            version: tool_version.to_string(),
            sbom_version: sbom_version.to_string(),
        }
    }

    /// Descriptor of this build, using the compile-time version from Cargo.toml
    pub fn default_descriptor() -> Descriptor {
        Self::descriptor(TOOL_NAME, env!("CARGO_PKG_VERSION"), SBOM_VERSION)
    }

    /// Picks the distro carried into the document: the secondary scanner's
    /// when it detected one, otherwise the primary's.
    pub fn select_distro(primary: &Distro, secondary: &Distro) -> Distro {
        if secondary.is_empty() {
            primary.clone()
        } else {
            secondary.clone()
        }
    }

    /// Assembles the document. Vulnerabilities are attached later and are
    /// never part of the assembled (cacheable) document.
    pub fn assemble(
        mut image: ImageSource,
        artifacts: Vec<Package>,
        distro: Distro,
        descriptor: Descriptor,
    ) -> Sbom {
        image.distro = distro;
        if image.tags.as_ref().is_some_and(Vec::is_empty) {
            image.tags = None;
        }

        Sbom {
            source: Source {
                source_type: "image".to_string(),
                image,
            },
            artifacts,
            vulnerabilities: None,
            descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::Platform;

    fn image(tags: Option<Vec<String>>) -> ImageSource {
        ImageSource {
            name: "alpine:3.18".to_string(),
            digest: format!("sha256:{}", "a".repeat(64)),
            tags,
            manifest: None,
            config: None,
            raw_manifest: String::new(),
            raw_config: String::new(),
            distro: Distro::default(),
            platform: Platform {
                os: "linux".to_string(),
                architecture: "amd64".to_string(),
                variant: None,
            },
            size: 1472,
        }
    }

    #[test]
    fn test_default_descriptor() {
        let descriptor = SbomAssembler::default_descriptor();

        assert_eq!(descriptor.name, "image-sbom");
        assert_eq!(descriptor.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(descriptor.sbom_version, SBOM_VERSION);
    }

    #[test]
    fn test_select_distro_prefers_secondary() {
        let primary = Distro::new("alpine", "3.18.4", "alpine");
        let secondary = Distro::new("Alpine Linux v3.18", "3.18.4", "alpine");

        assert_eq!(
            SbomAssembler::select_distro(&primary, &secondary),
            secondary
        );
        assert_eq!(
            SbomAssembler::select_distro(&primary, &Distro::default()),
            primary
        );
    }

    #[test]
    fn test_assemble_sets_source_and_distro() {
        let distro = Distro::new("debian", "12", "debian");
        let sbom = SbomAssembler::assemble(
            image(Some(vec!["alpine:3.18".to_string()])),
            vec![Package::new("gem", "rake", "13.0.6")],
            distro.clone(),
            SbomAssembler::default_descriptor(),
        );

        assert_eq!(sbom.source.source_type, "image");
        assert_eq!(sbom.source.image.distro, distro);
        assert_eq!(sbom.artifacts.len(), 1);
        assert!(sbom.vulnerabilities.is_none());
        assert_eq!(sbom.digest(), format!("sha256:{}", "a".repeat(64)));
    }

    #[test]
    fn test_empty_tags_are_omitted() {
        let sbom = SbomAssembler::assemble(
            image(Some(vec![])),
            vec![],
            Distro::default(),
            SbomAssembler::default_descriptor(),
        );

        assert!(sbom.source.image.tags.is_none());
        let json = sbom.to_pretty_json().unwrap();
        assert!(!json.contains("\"tags\""));
    }

    #[test]
    fn test_document_is_two_space_indented() {
        let sbom = SbomAssembler::assemble(
            image(None),
            vec![],
            Distro::default(),
            SbomAssembler::default_descriptor(),
        );
        let json = sbom.to_pretty_json().unwrap();
        assert!(json.starts_with("{\n  \"source\""));
    }
}
