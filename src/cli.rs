// src/cli.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::batch::RunSummary;
use crate::config::consts::{PASS_TIMEOUT_SECS, RATE_LIMIT_MS, RETRY_DELAY_MS, STORE_DIR, WORKERS};
use crate::config::options::{BatchOptions, PathOptions, RunOptions};
use crate::progress::Progress;

#[derive(Parser, Debug)]
#[command(name = "afl_stats_sync")]
#[command(about = "Merge fresh AFL statistics into player pages, keeping editor formatting")]
#[command(version)]
pub struct Cli {
    /// Season being harvested
    #[arg(short, long)]
    pub year: i32,

    /// Subject list, one source id per line
    #[arg(short, long)]
    pub subjects: PathBuf,

    /// Directory of `<id>.json` scraped stats
    #[arg(long)]
    pub stats_dir: PathBuf,

    /// Directory of `<title>.wiki` pages
    #[arg(long)]
    pub pages_dir: PathBuf,

    /// Worker threads (1 to 20)
    #[arg(short, long, default_value_t = WORKERS)]
    pub workers: usize,

    /// Tracker and log directory
    #[arg(long, default_value = STORE_DIR)]
    pub store: PathBuf,

    #[arg(long, default_value_t = PASS_TIMEOUT_SECS)]
    pub pass_timeout_secs: u64,

    #[arg(long, default_value_t = RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    #[arg(long, default_value_t = RATE_LIMIT_MS)]
    pub rate_limit_ms: u64,

    /// Write merged pages here instead of saving them
    #[arg(long)]
    pub dry_run: Option<PathBuf>,

    /// Caption the table "end of round N" instead of "end of season"
    #[arg(long)]
    pub as_of_round: Option<u32>,

    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn options(&self) -> RunOptions {
        RunOptions {
            batch: BatchOptions {
                workers: self.workers,
                retry_delay: Duration::from_millis(self.retry_delay_ms),
                rate_limit: Duration::from_millis(self.rate_limit_ms),
                pass_timeout: Duration::from_secs(self.pass_timeout_secs),
                ..BatchOptions::default()
            },
            paths: PathOptions {
                store_dir: self.store.clone(),
                subjects_file: self.subjects.clone(),
                stats_dir: self.stats_dir.clone(),
                pages_dir: self.pages_dir.clone(),
            },
            year: self.year,
            as_of_round: self.as_of_round,
            dry_run: self.dry_run.clone(),
        }
    }
}

/// Prints one line per subject to stdout.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        println!("Processing {total} subject(s)…");
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn item_done(&mut self, id: &str, name: &str) {
        self.done += 1;
        println!("[{}/{}] ✓ {name} ({id})", self.done, self.total);
    }

    fn item_failed(&mut self, id: &str, name: &str) {
        self.done += 1;
        println!("[{}/{}] ✗ {name} ({id})", self.done, self.total);
    }

    fn finish(&mut self) {
        println!("Done.");
    }
}

pub fn print_summary(s: &RunSummary) {
    println!(
        "Processed: {}  Failed: {}  Skipped: {}  Cancelled: {}",
        s.processed,
        s.failed.len(),
        s.skipped,
        s.cancelled
    );
    if !s.failed.is_empty() {
        println!("Still failing: {}", s.failed.join(", "));
    }
    if s.reset {
        println!("Every subject is up to date; tracker reset for the next cycle.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "afl_stats_sync", "--year", "2024", "--subjects", "subs.txt",
            "--stats-dir", "stats", "--pages-dir", "pages", "-w", "8",
            "--dry-run", "out", "--as-of-round", "12", "-vv",
        ])
        .unwrap();
        let o = cli.options();
        assert_eq!(o.batch.workers, 8);
        assert_eq!(o.as_of_round, Some(12));
        assert_eq!(o.dry_run, Some(PathBuf::from("out")));
        assert_eq!(o.paths.store_dir, PathBuf::from(STORE_DIR));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn console_count_restarts_each_pass() {
        let mut p = ConsoleProgress::default();
        p.begin(3);
        p.item_done("a", "A");
        p.item_failed("b", "B");
        p.item_done("c", "C");
        p.begin(1);
        p.item_done("b", "B");
        assert_eq!((p.done, p.total), (1, 1));
    }

    #[test]
    fn worker_bounds_enforced() {
        let parse = |w: &str| {
            Cli::try_parse_from([
                "afl_stats_sync", "-y", "2024", "-s", "s", "--stats-dir", "a", "--pages-dir", "b", "-w", w,
            ])
            .unwrap()
            .options()
            .validate()
        };
        assert!(parse("0").is_err());
        assert!(parse("21").is_err());
        assert!(parse("20").is_ok());
    }
}
