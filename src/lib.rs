//! image-sbom - SBOM generation for container images
//!
//! This library indexes a container image with two independent package
//! scanners, normalizes and merges their findings into one package list,
//! and caches the resulting SBOM by image digest. It follows hexagonal
//! architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_generation`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use cases and application services
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//! - **Config** (`config`): The optional YAML config file
//!
//! # Example
//!
//! ```no_run
//! use image_sbom::prelude::*;
//! use std::path::PathBuf;
//!
//! # async fn run() -> Result<()> {
//! // Create adapters
//! let use_case = IndexImageUseCase::new(
//!     OciLayoutResolver::new(),
//!     TrivyScanner::default(),
//!     SyftScanner::default(),
//!     SbomFileCache::new(PathBuf::from("/tmp/sbom-cache"), SBOM_VERSION),
//!     StderrProgressReporter::new(),
//!     None::<CachingVulnerabilityRepository<OsvClient>>,
//! );
//!
//! // Execute
//! let request = IndexRequest::new("alpine:3.18").with_image_path(PathBuf::from("./alpine"));
//! let response = use_case.execute(request).await?;
//! println!("{}", response.sbom.to_pretty_json()?);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod ports;
pub mod sbom_generation;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemWriter, OciLayoutResolver, SbomFileCache, StdoutPresenter,
    };
    pub use crate::adapters::outbound::network::{CachingVulnerabilityRepository, OsvClient};
    pub use crate::adapters::outbound::scanners::{EngineSettings, SyftScanner, TrivyScanner};
    pub use crate::application::dto::{CacheStatus, IndexRequest, IndexResponse};
    pub use crate::application::use_cases::{IndexImageUseCase, IndexStage};
    pub use crate::ports::outbound::{
        ImageResolver, OutputPresenter, PackageScanner, ProgressReporter, ResolvedImage,
        SbomStore, VulnerabilityRepository,
    };
    pub use crate::sbom_generation::domain::{
        Cve, Descriptor, Distro, ImageDigest, ImageSource, IndexResult, LayerMapping, Location,
        Package, PackageUrl, Platform, Sbom, ScanStatus, Source, VulnerabilitiesByPurl,
    };
    pub use crate::sbom_generation::policies::NormalizationTables;
    pub use crate::sbom_generation::services::{
        PackageMerger, PackageNormalizer, SbomAssembler, SBOM_VERSION, TOOL_NAME,
    };
    pub use crate::shared::error::{ExitCode, SbomError};
    pub use crate::shared::Result;
}
