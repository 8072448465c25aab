//! Domain layer: value objects, normalization policy, and the pure
//! services that turn two scanner results into one package list.
pub mod domain;
pub mod policies;
pub mod services;
