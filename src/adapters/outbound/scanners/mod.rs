/// Scanner engine adapters, run as subprocesses
mod coordinates;
mod engine;
mod syft;
mod trivy;

pub use engine::{EngineSettings, DEFAULT_ENGINE_TIMEOUT};
pub use syft::SyftScanner;
pub use trivy::TrivyScanner;
