// src/progress.rs
/// Lightweight progress reporting for a batch run.
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called at the start of each pass with the number of subjects queued
    /// for it. Counts restart here.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One subject was merged (published or already up to date).
    fn item_done(&mut self, _id: &str, _name: &str) {}

    /// One subject ran out of attempts.
    fn item_failed(&mut self, _id: &str, _name: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
