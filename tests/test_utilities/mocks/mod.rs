/// Mock implementations for testing
mod mock_package_scanner;
mod mock_progress_reporter;
mod mock_vulnerability_repository;

pub use mock_package_scanner::MockPackageScanner;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_vulnerability_repository::MockVulnerabilityRepository;
