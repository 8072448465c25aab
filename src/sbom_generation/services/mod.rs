mod package_merger;
mod package_normalizer;
mod sbom_assembler;

pub use package_merger::PackageMerger;
pub use package_normalizer::PackageNormalizer;
pub use sbom_assembler::{SbomAssembler, SBOM_VERSION, TOOL_NAME};
