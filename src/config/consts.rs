// src/config/consts.rs

// Source site
pub const SOURCE_PUBLISHER: &str = "AFL Tables";
pub const SOURCE_STATS_URL: &str = "https://afltables.com/afl/stats/";
pub const FIRST_SEASON: i32 = 1897;

// Local store
pub const STORE_DIR: &str = ".store";
pub const TRACKER_FILE: &str = "tracker.json";
pub const FAILED_FILE: &str = "failed.log";
pub const LOG_FILE: &str = "debug.log";

// Publishing
pub const EDIT_SUMMARY: &str = "Updated player statistics";
pub const PAGE_SUFFIXES: &[&str] = &["", " (footballer)", " (Australian footballer)"];
pub const PAGE_MUST_WORDS: &[&str] = &["afl"];
pub const PAGE_ONE_OF: &[&str] = &["footballer", "football", "afl"];

// Retry / pacing
pub const MAX_ATTEMPTS: u32 = 4;
pub const RETRY_DELAY_MS: u64 = 5_000;
pub const RATE_LIMIT_MS: u64 = 3_000; // be polite
pub const PASS_TIMEOUT_SECS: u64 = 6 * 60 * 60;
pub const PAUSE_SLICE_MS: u64 = 50;

// Concurrency
pub const WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 20;

// Markup
pub const LEADING_BG: &str = "CAE1FF";
pub const SPECIAL_BG: &str = "F0E68C";
pub const BANDED_ROW: &str = "|- style=\"background-color: #EAEAEA\"";
pub const LEADING_MARK: &str = "<sup>†</sup>";
