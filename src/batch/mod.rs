// src/batch/mod.rs
pub mod scheduler;
pub mod tracker;

pub use scheduler::{
    chunk_subjects, drive_subject, Driven, Pacer, PassReport, RetryPolicy, RunSummary, Scheduler,
    SubjectState, ThreadPacer,
};
pub use tracker::{ProcessingState, Tracker};
