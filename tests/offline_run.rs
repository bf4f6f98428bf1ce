// tests/offline_run.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use afl_stats_sync::config::consts::{FAILED_FILE, STORE_DIR};
use afl_stats_sync::config::options::{BatchOptions, PathOptions, RunOptions};
use afl_stats_sync::pipeline::ScrapedStats;
use afl_stats_sync::progress::NullProgress;
use afl_stats_sync::runner;
use afl_stats_sync::stats::{RawStats, RawTable};
use afl_stats_sync::store::DirPageStore;

const HEADERS: [&str; 12] = ["Season", "Team", "No.", "Games", "G", "B", "K", "H", "D", "M", "T", "Votes"];

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

fn scraped(id: &str) -> ScrapedStats {
    let headers = row(&HEADERS);
    ScrapedStats {
        stats: RawStats {
            totals: RawTable {
                headers: headers.clone(),
                rows: vec![
                    row(&["2023", "Geelong", "9", "20", "15", "9", "210", "180", "390", "70", "25", "3"]),
                    row(&["Totals", "", "", "20", "15", "9", "210", "180", "390", "70", "25", ""]),
                    row(&["Averages", "", "", "", "0.75", "0.45", "10.50", "9.00", "19.50", "3.50", "1.25", ""]),
                ],
            },
            averages: RawTable {
                headers,
                rows: vec![row(&["2023", "Geelong", "9", "20", "0.75", "0.45", "10.50", "9.00", "19.50", "3.50", "1.25", "3"])],
            },
        },
        profile_url: format!("https://afltables.com/afl/stats/players/T/{id}.html"),
    }
}

fn write(p: &Path, text: &str) {
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, text).unwrap();
}

fn options(root: &Path) -> RunOptions {
    RunOptions {
        batch: BatchOptions {
            workers: 2,
            max_attempts: 2,
            retry_delay: Duration::ZERO,
            rate_limit: Duration::ZERO,
            pass_timeout: Duration::from_secs(60),
        },
        paths: PathOptions {
            store_dir: root.join("store"),
            subjects_file: root.join("subjects.txt"),
            stats_dir: root.join("stats"),
            pages_dir: root.join("pages"),
        },
        year: 2023,
        as_of_round: None,
        dry_run: Some(root.join("out")),
    }
}

#[test]
fn dry_run_writes_merged_pages_to_out_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let opts = options(root);

    write(&opts.paths.subjects_file, "# season 2023\nTom_Hawkins\nNo_Page\n");
    write(
        &opts.paths.stats_dir.join("Tom_Hawkins.json"),
        &serde_json::to_string(&scraped("Tom_Hawkins")).unwrap(),
    );
    write(&opts.paths.stats_dir.join("No_Page.json"), &serde_json::to_string(&scraped("No_Page")).unwrap());

    let pages = DirPageStore::new(&opts.paths.pages_dir);
    let original = "'''Tom Hawkins''' is a former AFL footballer.\n\n==References==\n{{reflist}}\n";
    write(&pages.path_for("Tom Hawkins (footballer)"), original);

    let summary = runner::run(&opts, &mut NullProgress).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, vec!["No_Page".to_string()]);

    // source page untouched, merged copy in the out dir
    let src = pages.path_for("Tom Hawkins (footballer)");
    assert_eq!(fs::read_to_string(&src).unwrap(), original);
    let out = DirPageStore::new(root.join("out")).path_for("Tom Hawkins (footballer)");
    let merged = fs::read_to_string(out).unwrap();
    assert!(merged.contains("==Statistics=="));
    assert!(merged.contains("[[2023 AFL season|2023]]"));
    assert!(merged.find("==Statistics==").unwrap() < merged.find("==References==").unwrap());

    // dry runs track progress apart from the real store
    assert!(!opts.paths.store_dir.exists());
    let failed = fs::read_to_string(root.join("out").join(STORE_DIR).join(FAILED_FILE)).unwrap();
    assert_eq!(failed.trim(), "No_Page");
}

#[test]
fn missing_subject_list_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let opts = options(tmp.path());
    let err = runner::run(&opts, &mut NullProgress).unwrap_err();
    assert!(matches!(err, runner::RunError::Subjects { .. }));
}

#[test]
fn bad_worker_count_is_rejected_before_any_work() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = options(tmp.path());
    opts.batch.workers = 0;
    let err = runner::run(&opts, &mut NullProgress).unwrap_err();
    assert!(matches!(err, runner::RunError::Options(_)));
}
