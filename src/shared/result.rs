/// Type alias for Result with anyhow::Error as the error type.
/// Typed failures are `SbomError` values wrapped in the anyhow error;
/// recover them with `downcast_ref::<SbomError>()`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
