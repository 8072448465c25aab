pub mod image_digest;
pub mod index_result;
pub mod layer_mapping;
pub mod package;
pub mod purl;
pub mod sbom;
pub mod vulnerability;

pub use image_digest::ImageDigest;
pub use index_result::{Distro, IndexResult, ScanStatus};
pub use layer_mapping::LayerMapping;
pub use package::{Location, Package};
pub use purl::PackageUrl;
pub use sbom::{Descriptor, ImageSource, Platform, Sbom, Source};
pub use vulnerability::{
    count_vulnerabilities, Advisory, AdvisoryUrl, Cve, Cwe, Reference, Score, VulnerabilitiesByPurl,
};
