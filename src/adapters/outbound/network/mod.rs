/// Network adapters for the vulnerability lookup service
mod caching_vulnerability_repository;
mod osv_client;

pub use caching_vulnerability_repository::CachingVulnerabilityRepository;
pub use osv_client::OsvClient;
