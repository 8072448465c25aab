/// Adapters layer - Infrastructure implementations
///
/// This layer contains concrete implementations of the outbound ports:
/// OCI layouts and the SBOM cache on disk, the scanner engines, the
/// vulnerability service, and the console.
pub mod outbound;
