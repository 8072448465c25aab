mod cli;

use cli::Args;
use image_sbom::adapters::outbound::console::StderrProgressReporter;
use image_sbom::adapters::outbound::filesystem::{
    FileSystemWriter, OciLayoutResolver, SbomFileCache, StdoutPresenter,
};
use image_sbom::adapters::outbound::network::{CachingVulnerabilityRepository, OsvClient};
use image_sbom::adapters::outbound::scanners::{SyftScanner, TrivyScanner};
use image_sbom::application::dto::{CacheStatus, IndexRequest};
use image_sbom::application::use_cases::IndexImageUseCase;
use image_sbom::config::{self, ConfigFile};
use image_sbom::ports::outbound::OutputPresenter;
use image_sbom::sbom_generation::services::{PackageNormalizer, SBOM_VERSION};
use image_sbom::shared::error::ExitCode;
use image_sbom::shared::Result;
use owo_colors::OwoColorize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Log filter directives, e.g. `IMAGE_SBOM_LOG=image_sbom=debug`
const LOG_ENV: &str = "IMAGE_SBOM_LOG";
/// Disables cache reads when set to anything but "", "0" or "false"
const NO_CACHE_ENV: &str = "IMAGE_SBOM_NO_CACHE";
const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

#[tokio::main]
async fn main() {
    let args = match Args::parse_args() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::InvalidArguments
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            process::exit(code.as_i32());
        }
    };

    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("\n{}\n", "❌ An error occurred:".red().bold());
        eprintln!("{}", e);

        // Display error chain
        for cause in e.chain().skip(1) {
            eprintln!("\nCaused by: {}", cause);
        }

        eprintln!();
        process::exit(ExitCode::ApplicationError.as_i32());
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Ignored when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let no_cache = args.no_cache
        || config
            .no_cache
            .unwrap_or_else(|| env_flag(std::env::var_os(NO_CACHE_ENV)));
    let check_cve = args.cve || config.check_cve.unwrap_or(false);
    let cache_root = resolve_cache_root(
        args.cache_dir.clone(),
        config.cache_dir.clone(),
        std::env::var_os(DOCKER_CONFIG_ENV),
        dirs::home_dir(),
    )?;
    debug!(
        cache_root = %cache_root.display(),
        no_cache,
        check_cve,
        "Resolved settings"
    );

    // Create adapters (Dependency Injection)
    let resolver = OciLayoutResolver::new();
    let primary = TrivyScanner::new(config.trivy_settings());
    let secondary = SyftScanner::new(config.syft_settings());
    let store = SbomFileCache::new(cache_root, SBOM_VERSION);
    let progress_reporter = if args.quiet {
        StderrProgressReporter::quiet()
    } else {
        StderrProgressReporter::new()
    };
    let vulnerability_repository = if check_cve {
        Some(CachingVulnerabilityRepository::new(OsvClient::new()?))
    } else {
        None
    };

    // Create use case with injected dependencies
    let use_case = IndexImageUseCase::new(
        resolver,
        primary,
        secondary,
        store,
        progress_reporter,
        vulnerability_repository,
    )
    .with_normalizer(PackageNormalizer::new(config.normalization_tables()?));

    let mut request = IndexRequest::new(args.image.as_str())
        .with_no_cache(no_cache)
        .with_vulnerabilities(check_cve);
    if let Some(path) = args.path {
        request = request.with_image_path(path);
    }

    let response = use_case.execute(request).await?;
    match &response.cache_status {
        CacheStatus::Hit => info!(digest = response.sbom.digest(), "Served from cache"),
        CacheStatus::Persisted(path) => info!(path = %path.display(), "Cached SBOM"),
        CacheStatus::WriteFailed(_) => {}
    }

    let presenter: Box<dyn OutputPresenter> = match args.output {
        Some(output_path) => Box::new(FileSystemWriter::new(output_path)),
        None => Box::new(StdoutPresenter::new()),
    };
    presenter.present(&response.sbom.to_pretty_json()?)?;

    Ok(())
}

/// Explicit `--config`, otherwise `image-sbom.config.yml` in the current directory
fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => config::load_config_from_path(path),
        None => Ok(config::discover_config(&std::env::current_dir()?)?.unwrap_or_default()),
    }
}

fn env_flag(value: Option<OsString>) -> bool {
    value.is_some_and(|v| {
        let v = v.to_string_lossy();
        let v = v.trim();
        !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
    })
}

/// Cache root precedence: `--cache-dir`, config `cache_dir`, `$DOCKER_CONFIG`, `~/.docker`.
fn resolve_cache_root(
    cli: Option<PathBuf>,
    configured: Option<PathBuf>,
    docker_config: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = cli.or(configured) {
        return Ok(dir);
    }
    if let Some(dir) = docker_config.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home.map(|home| home.join(".docker")).ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine the SBOM cache directory\n\n💡 Hint: Set {} or pass --cache-dir <DIR>",
            DOCKER_CONFIG_ENV
        )
    })
}
