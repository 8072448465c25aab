/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod index_request;
mod index_response;

pub use index_request::IndexRequest;
pub use index_response::{CacheStatus, IndexResponse};
