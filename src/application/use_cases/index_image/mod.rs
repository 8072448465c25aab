use crate::application::dto::{CacheStatus, IndexRequest, IndexResponse};
use crate::ports::outbound::{
    ImageResolver, PackageScanner, ProgressReporter, SbomStore, VulnerabilityRepository,
};
use crate::sbom_generation::domain::{
    count_vulnerabilities, Descriptor, ImageDigest, IndexResult, LayerMapping, Sbom,
};
use crate::sbom_generation::services::{PackageMerger, PackageNormalizer, SbomAssembler};
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::cell::Cell;
use std::fmt;
use tracing::{debug, info, warn};

/// Number of scanners run per index operation
const SCANNER_COUNT: usize = 2;

/// Stages of one index run, in order. `Cached` and `Persisted` are the two
/// ways a run reaches `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStage {
    Resolving,
    MappingLayers,
    Scanning,
    Normalizing,
    Merging,
    Assembling,
    Cached,
    Persisted,
    Done,
}

impl fmt::Display for IndexStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexStage::Resolving => "resolving",
            IndexStage::MappingLayers => "mapping-layers",
            IndexStage::Scanning => "scanning",
            IndexStage::Normalizing => "normalizing",
            IndexStage::Merging => "merging",
            IndexStage::Assembling => "assembling",
            IndexStage::Cached => "cached",
            IndexStage::Persisted => "persisted",
            IndexStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// IndexImageUseCase - Core use case for producing an image SBOM
///
/// Orchestrates one index run: cache lookup, image resolution, layer
/// mapping, the two scanners in parallel, normalization, merge, assembly,
/// and the cache write. Infrastructure is injected through generics.
///
/// # Type Parameters
/// * `RES` - ImageResolver implementation
/// * `PRI` - PackageScanner for the primary (vulnerability-oriented) engine
/// * `SEC` - PackageScanner for the secondary (general package) engine
/// * `STORE` - SbomStore implementation
/// * `PR` - ProgressReporter implementation
/// * `VREPO` - VulnerabilityRepository implementation (optional)
pub struct IndexImageUseCase<RES, PRI, SEC, STORE, PR, VREPO> {
    resolver: RES,
    primary: PRI,
    secondary: SEC,
    store: STORE,
    progress_reporter: PR,
    vulnerability_repository: Option<VREPO>,
    normalizer: PackageNormalizer,
    descriptor: Descriptor,
}

impl<RES, PRI, SEC, STORE, PR, VREPO> IndexImageUseCase<RES, PRI, SEC, STORE, PR, VREPO>
where
    RES: ImageResolver,
    PRI: PackageScanner,
    SEC: PackageScanner,
    STORE: SbomStore,
    PR: ProgressReporter,
    VREPO: VulnerabilityRepository,
{
    /// Creates a new IndexImageUseCase with injected dependencies
    pub fn new(
        resolver: RES,
        primary: PRI,
        secondary: SEC,
        store: STORE,
        progress_reporter: PR,
        vulnerability_repository: Option<VREPO>,
    ) -> Self {
        Self {
            resolver,
            primary,
            secondary,
            store,
            progress_reporter,
            vulnerability_repository,
            normalizer: PackageNormalizer::default(),
            descriptor: SbomAssembler::default_descriptor(),
        }
    }

    /// Replaces the default normalization tables
    pub fn with_normalizer(mut self, normalizer: PackageNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replaces the descriptor stamped on new documents
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Executes one index run
    ///
    /// # Errors
    /// Any failure before assembly aborts the run and nothing is cached:
    /// resolution, layer mapping, either scanner, and normalization. Cache
    /// write and vulnerability lookup failures are recorded on the
    /// response instead.
    pub async fn execute(&self, request: IndexRequest) -> Result<IndexResponse> {
        let mut response = match self.cached_by_reference(&request)? {
            Some(sbom) => IndexResponse::new(sbom, CacheStatus::Hit),
            None => self.index(&request).await?,
        };

        if request.check_vulnerabilities {
            self.annotate_vulnerabilities(&mut response).await;
        }

        self.enter(IndexStage::Done, response.sbom.digest());
        let source = if response.from_cache() { " (cached)" } else { "" };
        self.progress_reporter.report_completion(&format!(
            "✅ Indexed {} packages{}",
            response.sbom.artifacts.len(),
            source
        ));

        Ok(response)
    }

    /// Cache check before resolving, for references that are digests
    fn cached_by_reference(&self, request: &IndexRequest) -> Result<Option<Sbom>> {
        if request.no_cache || !ImageDigest::looks_like_digest(&request.reference) {
            return Ok(None);
        }

        let digest = ImageDigest::parse(&request.reference)?;
        let cached = self.store.read(&digest);
        if cached.is_some() {
            self.enter(IndexStage::Cached, &request.reference);
        }
        Ok(cached)
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse> {
        self.enter(IndexStage::Resolving, &request.reference);
        self.progress_reporter
            .report(&format!("📦 Resolving image: {}", request.reference));
        let resolved = self
            .resolver
            .resolve(&request.reference, request.image_path.as_deref())?;
        let digest = ImageDigest::parse(&resolved.source.digest)?;

        if !request.no_cache {
            if let Some(sbom) = self.store.read(&digest) {
                self.enter(IndexStage::Cached, &resolved.source.digest);
                return Ok(IndexResponse::new(sbom, CacheStatus::Hit));
            }
        }

        self.enter(IndexStage::MappingLayers, &resolved.source.digest);
        let mapping = LayerMapping::new(
            &resolved.source.digest,
            &resolved.layer_digests,
            &resolved.diff_ids,
        )?;

        self.enter(IndexStage::Scanning, &resolved.source.digest);
        let (primary, secondary) = self.scan(&resolved.layout_path, &mapping).await;
        Self::ensure_scanned(&primary, &resolved.source.name)?;
        Self::ensure_scanned(&secondary, &resolved.source.name)?;

        self.enter(IndexStage::Normalizing, &resolved.source.digest);
        let primary = self.normalizer.normalize_result(primary)?;
        let secondary = self.normalizer.normalize_result(secondary)?;

        self.enter(IndexStage::Merging, &resolved.source.digest);
        let distro = SbomAssembler::select_distro(&primary.distro, &secondary.distro);
        let packages = PackageMerger::merge(primary, secondary)?;

        self.enter(IndexStage::Assembling, &resolved.source.digest);
        let sbom = SbomAssembler::assemble(
            resolved.source,
            packages,
            distro,
            self.descriptor.clone(),
        );

        let cache_status = self.persist(&sbom);
        Ok(IndexResponse::new(sbom, cache_status))
    }

    /// Runs both scanners concurrently and waits for both, whatever the
    /// outcome of either.
    async fn scan(
        &self,
        layout_path: &std::path::Path,
        mapping: &LayerMapping,
    ) -> (IndexResult, IndexResult) {
        self.progress_reporter.report(&format!(
            "🔍 Scanning with {} and {}...",
            self.primary.name(),
            self.secondary.name()
        ));

        let finished = Cell::new(0usize);
        let observe = |result: IndexResult| {
            finished.set(finished.get() + 1);
            self.progress_reporter.report_progress(
                finished.get(),
                SCANNER_COUNT,
                Some(result.scanner.as_str()),
            );
            result
        };

        futures::join!(
            async { observe(self.primary.scan(layout_path, mapping).await) },
            async { observe(self.secondary.scan(layout_path, mapping).await) },
        )
    }

    fn ensure_scanned(result: &IndexResult, image: &str) -> Result<()> {
        if result.is_success() {
            return Ok(());
        }
        Err(SbomError::Scan {
            scanner: result.scanner.clone(),
            image: image.to_string(),
            details: result
                .error
                .clone()
                .unwrap_or_else(|| "scanner reported failure".to_string()),
        }
        .into())
    }

    /// Best-effort cache write
    fn persist(&self, sbom: &Sbom) -> CacheStatus {
        match self.store.write(sbom) {
            Ok(path) => {
                self.enter(IndexStage::Persisted, sbom.digest());
                CacheStatus::Persisted(path)
            }
            Err(e) => {
                warn!(digest = sbom.digest(), error = %e, "Failed to cache SBOM");
                self.progress_reporter
                    .report_error(&format!("⚠️  Warning: SBOM was not cached: {}", e));
                CacheStatus::WriteFailed(e.to_string())
            }
        }
    }

    /// Annotates the SBOM with vulnerabilities. Failure leaves the SBOM
    /// without annotations.
    async fn annotate_vulnerabilities(&self, response: &mut IndexResponse) {
        let Some(repo) = &self.vulnerability_repository else {
            return;
        };

        let purls: Vec<String> = response
            .sbom
            .artifacts
            .iter()
            .map(|p| p.purl.clone())
            .filter(|purl| !purl.is_empty())
            .collect();

        self.progress_reporter.report(&format!(
            "🔐 Checking {} packages for vulnerabilities...",
            purls.len()
        ));

        match repo.lookup(&purls).await {
            Ok(found) => {
                self.progress_reporter.report(&format!(
                    "   - {} vulnerabilities in {} packages",
                    count_vulnerabilities(&found),
                    found.len()
                ));
                response.sbom.vulnerabilities = Some(found);
            }
            Err(e) => {
                let error = SbomError::Lookup {
                    purls: purls.len(),
                    details: format!("{:#}", e),
                };
                warn!(error = %error, "Vulnerability lookup failed");
                self.progress_reporter
                    .report_error(&format!("⚠️  Warning: {}", error));
                response.vulnerability_lookup_error = Some(error.to_string());
            }
        }
    }

    fn enter(&self, stage: IndexStage, subject: &str) {
        match stage {
            IndexStage::Cached | IndexStage::Persisted | IndexStage::Done => {
                info!(%stage, subject, "Index stage")
            }
            _ => debug!(%stage, subject, "Index stage"),
        }
    }
}
