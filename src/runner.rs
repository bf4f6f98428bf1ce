// src/runner.rs
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::{
    batch::{RunSummary, Scheduler, Tracker},
    config::{consts::STORE_DIR, options::RunOptions},
    pipeline::Pipeline,
    progress::Progress,
    store::{load_subjects, DirPageStore, JsonStatsSource},
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid options: {0}")]
    Options(String),
    #[error("cannot read subject list {path}: {source}")]
    Subjects { path: PathBuf, source: io::Error },
}

/// Where the tracker lives. Dry runs keep their own, so rehearsing never
/// marks real subjects as done.
fn tracker_dir(opts: &RunOptions) -> PathBuf {
    match &opts.dry_run {
        Some(out) => out.join(STORE_DIR),
        None => opts.paths.store_dir.clone(),
    }
}

/// Top-level runner: one pass plus one retry pass over the subject list.
pub fn run(opts: &RunOptions, progress: &mut dyn Progress) -> Result<RunSummary, RunError> {
    opts.validate().map_err(RunError::Options)?;

    let subjects = load_subjects(&opts.paths.subjects_file).map_err(|source| RunError::Subjects {
        path: opts.paths.subjects_file.clone(),
        source,
    })?;
    logf!(
        "Season {} run: {} subject(s) from {}",
        opts.year,
        subjects.len(),
        opts.paths.subjects_file.display()
    );
    if let Some(out) = &opts.dry_run {
        progress.log(&format!("Dry run: merged pages go to {}", out.display()));
    }

    let pages = DirPageStore::new(&opts.paths.pages_dir).dry_run(opts.dry_run.clone());
    let source = JsonStatsSource::new(&opts.paths.stats_dir);
    let accessed = chrono::Local::now().date_naive();
    let pipeline = Pipeline::new(source, pages, accessed).with_round(opts.as_of_round);

    let tracker = Arc::new(Tracker::open(tracker_dir(opts)));
    let scheduler = Scheduler::new(tracker, Arc::new(pipeline), &opts.batch);
    let summary = scheduler.run(&subjects, progress);

    logf!(
        "Run finished: {} processed, {} failed, {} skipped, {} cancelled",
        summary.processed,
        summary.failed.len(),
        summary.skipped,
        summary.cancelled
    );
    Ok(summary)
}
