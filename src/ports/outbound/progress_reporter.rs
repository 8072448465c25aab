/// ProgressReporter port for user-facing progress of an index run
///
/// Messages go to the user (stderr in the CLI), separate from the
/// structured `tracing` diagnostics.
pub trait ProgressReporter {
    /// Reports a stage message
    fn report(&self, message: &str);

    /// Reports how many of `total` units of work have finished
    ///
    /// # Arguments
    /// * `current` - Units finished so far
    /// * `total` - Total expected units
    /// * `message` - Optional label for the unit that just finished
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports a warning for a degraded but successful run
    fn report_error(&self, message: &str);

    /// Reports completion of the run
    fn report_completion(&self, message: &str);
}
