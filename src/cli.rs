use clap::Parser;
use std::path::PathBuf;

/// Generate an SBOM for a container image by merging two package scanners
#[derive(Parser, Debug)]
#[command(name = "image-sbom")]
#[command(version)]
#[command(
    about = "Generate an SBOM for a container image by merging two package scanners",
    long_about = None
)]
pub struct Args {
    /// Image to index: an OCI image layout directory, or a sha256 digest
    /// that was indexed before. With --path, the name recorded for the image.
    #[arg(value_name = "IMAGE")]
    pub image: String,

    /// OCI image layout directory to index under the name IMAGE
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Ignore cached SBOMs and index the image again (the result is still cached)
    #[arg(long)]
    pub no_cache: bool,

    /// Directory holding the SBOM cache (defaults to $DOCKER_CONFIG or ~/.docker)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Path to a config file (defaults to ./image-sbom.config.yml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Annotate packages with known vulnerabilities from OSV
    #[arg(long)]
    pub cve: bool,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print warnings and errors to stderr
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Parses the process arguments. `--help` and `--version` also come
    /// back as errors; `clap::Error::use_stderr` tells them apart.
    pub fn parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}
