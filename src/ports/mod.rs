/// Ports module defining interfaces for hexagonal architecture
///
/// Only driven ports exist: the CLI drives the `IndexImageUseCase` directly.
pub mod outbound;
