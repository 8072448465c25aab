use std::path::PathBuf;

/// IndexRequest - Internal request DTO for the index image use case
#[derive(Debug, Clone, Default)]
pub struct IndexRequest {
    /// Image reference: a name, a layout directory, or `sha256:<hex>`
    pub reference: String,
    /// Layout directory to index; `reference` is then only the image name
    pub image_path: Option<PathBuf>,
    /// Skip cache reads. Writes still happen.
    pub no_cache: bool,
    /// Annotate the result with known vulnerabilities
    pub check_vulnerabilities: bool,
}

impl IndexRequest {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }

    pub fn with_image_path(mut self, image_path: PathBuf) -> Self {
        self.image_path = Some(image_path);
        self
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    pub fn with_vulnerabilities(mut self, check_vulnerabilities: bool) -> Self {
        self.check_vulnerabilities = check_vulnerabilities;
        self
    }
}
