/// Use cases module containing application business logic orchestration
mod index_image;

pub use index_image::{IndexImageUseCase, IndexStage};
