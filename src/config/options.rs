// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub batch: BatchOptions,
    pub paths: PathOptions,
    /// Season being harvested; only used to label the run.
    pub year: i32,
    /// Explicit "as of round N" override for the table caption.
    pub as_of_round: Option<u32>,
    /// Write merged pages here instead of publishing.
    pub dry_run: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch: BatchOptions::default(),
            paths: PathOptions::default(),
            year: chrono::Datelike::year(&chrono::Local::now().date_naive()),
            as_of_round: None,
            dry_run: None,
        }
    }
}

impl RunOptions {
    /// Same bounds the interactive prompt used to enforce.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch.workers == 0 || self.batch.workers > MAX_WORKERS {
            return Err(format!("Worker count must be between 1 and {MAX_WORKERS}"));
        }
        let this_year = chrono::Datelike::year(&chrono::Local::now().date_naive());
        if self.year < FIRST_SEASON || self.year > this_year {
            return Err(format!(
                "Year must be between {FIRST_SEASON} and {this_year}, got {}",
                self.year
            ));
        }
        if self.batch.max_attempts == 0 {
            return Err(s!("At least one attempt per subject is required"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub rate_limit: Duration,
    pub pass_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: WORKERS,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            rate_limit: Duration::from_millis(RATE_LIMIT_MS),
            pass_timeout: Duration::from_secs(PASS_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathOptions {
    pub store_dir: PathBuf,
    pub subjects_file: PathBuf,
    pub stats_dir: PathBuf,
    pub pages_dir: PathBuf,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(STORE_DIR),
            subjects_file: PathBuf::from("subjects.txt"),
            stats_dir: PathBuf::from("stats"),
            pages_dir: PathBuf::from("pages"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let opts = RunOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.batch.max_attempts, 4);
    }

    #[test]
    fn worker_bounds_enforced() {
        let mut opts = RunOptions::default();
        opts.batch.workers = 0;
        assert!(opts.validate().is_err());
        opts.batch.workers = MAX_WORKERS + 1;
        assert!(opts.validate().is_err());
        opts.batch.workers = MAX_WORKERS;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn year_bounds_enforced() {
        let mut opts = RunOptions::default();
        opts.year = 1896;
        assert!(opts.validate().unwrap_err().contains("1897"));
        opts.year = 3000;
        assert!(opts.validate().is_err());
    }
}
