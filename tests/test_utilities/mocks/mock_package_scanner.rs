use async_trait::async_trait;
use image_sbom::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock PackageScanner returning a fixed result
///
/// Records how often it ran and which layout it was given.
#[derive(Clone)]
pub struct MockPackageScanner {
    name: String,
    result: IndexResult,
    calls: Arc<AtomicUsize>,
    scanned_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockPackageScanner {
    pub fn succeeding(name: &str, packages: Vec<Package>, distro: Distro) -> Self {
        Self::with_result(IndexResult::success(name, packages, distro))
    }

    pub fn failing(name: &str, error: &str) -> Self {
        Self::with_result(IndexResult::failed(name, error))
    }

    fn with_result(result: IndexResult) -> Self {
        Self {
            name: result.scanner.clone(),
            result,
            calls: Arc::new(AtomicUsize::new(0)),
            scanned_paths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn scanned_paths(&self) -> Vec<PathBuf> {
        self.scanned_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageScanner for MockPackageScanner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, image_path: &Path, _mapping: &LayerMapping) -> IndexResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scanned_paths
            .lock()
            .unwrap()
            .push(image_path.to_path_buf());
        self.result.clone()
    }
}
