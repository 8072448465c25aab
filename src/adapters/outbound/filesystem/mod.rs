/// Filesystem adapters: OCI layout reading, the SBOM cache, and output files
mod file_writer;
mod oci_layout_reader;
mod sbom_file_cache;

pub use file_writer::{FileSystemWriter, StdoutPresenter};
pub use oci_layout_reader::OciLayoutResolver;
pub use sbom_file_cache::SbomFileCache;
