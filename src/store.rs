// src/store.rs
//! File-backed collaborators: pages as `.wiki` files, scraped stats as JSON,
//! and the subject list.
use std::{fs, io, path::{Path, PathBuf}};

use crate::core::sanitize::sanitize_page_filename;
use crate::pipeline::{PageStore, ScrapedStats, StatsSource, StoreError, Subject};

pub const PAGE_EXT: &str = ".wiki";
pub const STATS_EXT: &str = ".json";

fn page_path(dir: &Path, title: &str) -> PathBuf {
    dir.join(join!(&sanitize_page_filename(title), PAGE_EXT))
}

fn ensure_parent(p: &Path) -> io::Result<()> {
    if let Some(parent) = p.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn store_err(e: io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => StoreError::Timeout(e.to_string()),
        _ => StoreError::Failed(e.to_string()),
    }
}

/// One `<title>.wiki` file per page. With `out` set, saves go there instead
/// (dry run) and the source pages are never touched.
#[derive(Clone, Debug)]
pub struct DirPageStore {
    root: PathBuf,
    out: Option<PathBuf>,
}

impl DirPageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), out: None }
    }

    pub fn dry_run(mut self, out: Option<PathBuf>) -> Self {
        self.out = out;
        self
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        page_path(&self.root, title)
    }

    /// Where `save` will write `title`.
    pub fn target_for(&self, title: &str) -> PathBuf {
        page_path(self.out.as_deref().unwrap_or(&self.root), title)
    }
}

impl PageStore for DirPageStore {
    fn load(&self, title: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(title)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_err(e)),
        }
    }

    fn save(&self, title: &str, text: &str, summary: &str) -> Result<(), StoreError> {
        let p = self.target_for(title);
        ensure_parent(&p).map_err(store_err)?;
        // write then rename, so a reader never sees half a page
        let tmp = p.with_extension("wiki.tmp");
        fs::write(&tmp, text).map_err(store_err)?;
        fs::rename(&tmp, &p).map_err(store_err)?;
        logd!("Saved '{title}' to {} ({summary})", p.display());
        Ok(())
    }
}

/// Reads `<subject id>.json` files written by the scraper.
#[derive(Clone, Debug)]
pub struct JsonStatsSource {
    dir: PathBuf,
}

impl JsonStatsSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl StatsSource for JsonStatsSource {
    fn fetch(&self, subject: &Subject) -> Option<ScrapedStats> {
        let p = self.dir.join(join!(&subject.id, STATS_EXT));
        let text = match fs::read_to_string(&p) {
            Ok(t) => t,
            Err(e) => {
                logw!("{}: cannot read {}: {e}", subject.id, p.display());
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(stats) => Some(stats),
            Err(e) => {
                logw!("{}: bad stats file {}: {e}", subject.id, p.display());
                None
            }
        }
    }
}

/// One subject id per line. Blank lines and `#` comments are skipped,
/// duplicates keep their first position.
pub fn parse_subjects(text: &str) -> Vec<Subject> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(s!(*l)))
        .map(Subject::from_id)
        .collect()
}

pub fn load_subjects(path: &Path) -> io::Result<Vec<Subject>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_subjects(&text))
}
