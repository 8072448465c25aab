/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (image layouts, scanner engines,
/// the SBOM cache, the vulnerability service, the console).
pub mod image_resolver;
pub mod output_presenter;
pub mod package_scanner;
pub mod progress_reporter;
pub mod sbom_store;
pub mod vulnerability_repository;

pub use image_resolver::{ImageResolver, ResolvedImage};
pub use output_presenter::OutputPresenter;
pub use package_scanner::PackageScanner;
pub use progress_reporter::ProgressReporter;
pub use sbom_store::SbomStore;
pub use vulnerability_repository::VulnerabilityRepository;
