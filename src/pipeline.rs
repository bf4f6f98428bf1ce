// src/pipeline.rs
//! One subject, end to end: fetch stats → normalize → find page → render →
//! merge → publish.
//!
//! Fetching and publishing are behind `StatsSource` and `PageStore`; the
//! batch layer only ever sees `SubjectProcessor`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::consts::{EDIT_SUMMARY, PAGE_MUST_WORDS, PAGE_ONE_OF, PAGE_SUFFIXES, SOURCE_STATS_URL};
use crate::core::sanitize::display_name;
use crate::markup::{render_statistics, update_statistics, AsOf, RenderError, RenderInput};
use crate::stats::{normalize, NormalizeError, RawStats};

/// A player as the source site names them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subject {
    /// Source slug, e.g. `Dustin_Martin`. Unique across a run.
    pub id: String,
    /// Display and page name, e.g. `Dustin Martin`.
    pub name: String,
}

impl Subject {
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        Self { id: s!(id), name: display_name(id) }
    }
}

/// What the scraper hands over for one subject.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedStats {
    pub stats: RawStats,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("page store timed out: {0}")]
    Timeout(String),
    #[error("page store failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no statistics available for {0}")]
    NoData(String),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("no qualifying page found for {0}")]
    PageNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Source of scraped stats. `None` means the subject has no usable data.
pub trait StatsSource: Send + Sync {
    fn fetch(&self, subject: &Subject) -> Option<ScrapedStats>;
}

/// Where pages are read from and written back to.
pub trait PageStore: Send + Sync {
    /// `Ok(None)` when the page does not exist.
    fn load(&self, title: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, title: &str, text: &str, summary: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Published { title: String },
    /// The merge produced the page as it already was; nothing saved.
    Unchanged { title: String },
}

/// One attempt at one subject. Implemented by `Pipeline`; tests swap in
/// scripted processors.
pub trait SubjectProcessor: Send + Sync {
    fn process(&self, subject: &Subject) -> Result<Outcome, ProcessError>;
}

/// Page text mentions the league and football at all.
pub fn page_matches(text: &str) -> bool {
    let lower = text.to_lowercase();
    PAGE_MUST_WORDS.iter().all(|w| lower.contains(w))
        && (PAGE_ONE_OF.is_empty() || PAGE_ONE_OF.iter().any(|w| lower.contains(w)))
}

pub struct Pipeline<S, P> {
    source: S,
    pages: P,
    accessed: NaiveDate,
    as_of_round: Option<u32>,
}

impl<S: StatsSource, P: PageStore> Pipeline<S, P> {
    pub fn new(source: S, pages: P, accessed: NaiveDate) -> Self {
        Self { source, pages, accessed, as_of_round: None }
    }

    pub fn with_round(mut self, round: Option<u32>) -> Self {
        self.as_of_round = round;
        self
    }

    /// First title variant whose page exists and looks like a football
    /// biography.
    pub fn resolve_page(&self, name: &str) -> Result<(String, String), ProcessError> {
        for suffix in PAGE_SUFFIXES {
            let title = join!(name, suffix);
            match self.pages.load(&title)? {
                Some(text) if page_matches(&text) => {
                    logd!("Page '{title}' matches");
                    return Ok((title, text));
                }
                Some(_) => logw!("Page '{title}' exists but is not a football biography"),
                None => logd!("Page '{title}' does not exist"),
            }
        }
        Err(ProcessError::PageNotFound(s!(name)))
    }
}

impl<S: StatsSource, P: PageStore> SubjectProcessor for Pipeline<S, P> {
    fn process(&self, subject: &Subject) -> Result<Outcome, ProcessError> {
        let scraped = self
            .source
            .fetch(subject)
            .ok_or_else(|| ProcessError::NoData(subject.id.clone()))?;
        let stats = normalize(&scraped.stats)?;
        let (title, old) = self.resolve_page(&subject.name)?;

        let as_of = match (self.as_of_round, stats.seasons.last()) {
            (Some(round), Some(last)) => Some(AsOf::Round { season: last.season.clone(), round }),
            _ => None,
        };
        let block = render_statistics(&RenderInput {
            stats: &stats,
            display_name: &subject.name,
            source_url: if scraped.profile_url.is_empty() { SOURCE_STATS_URL } else { scraped.profile_url.as_str() },
            accessed: self.accessed,
            as_of,
        })?;

        let merged = update_statistics(&old, &block);
        if merged == old {
            logf!("{}: no changes for '{title}'", subject.id);
            return Ok(Outcome::Unchanged { title });
        }
        self.pages.save(&title, &merged, EDIT_SUMMARY)?;
        logf!("{}: updated '{title}'", subject.id);
        Ok(Outcome::Published { title })
    }
}
