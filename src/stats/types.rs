// src/stats/types.rs
use std::collections::BTreeMap;

use super::columns::StatKey;

pub type StatValues = BTreeMap<StatKey, String>;

/// Synthetic vote-tally key holding the career sum.
pub const TOTAL_VOTES_KEY: &str = "Total";

/// One season of counting stats for one subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeasonStat {
    pub season: String,
    pub team: String,
    pub values: StatValues,
}

impl SeasonStat {
    pub fn get(&self, key: StatKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }
}

/// Per-game averages for one season.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AverageRow {
    pub season: String,
    pub values: StatValues,
}

impl AverageRow {
    pub fn get(&self, key: StatKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }
}

/// The two summary rows: career totals and career per-game averages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CareerAggregate {
    pub total: StatValues,
    pub average: StatValues,
}

/// Votes per season. The total is derived, so it can never drift from the
/// per-season figures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    by_season: BTreeMap<String, u32>,
}

impl VoteTally {
    pub fn add(&mut self, season: &str, votes: u32) {
        *self.by_season.entry(s!(season)).or_insert(0) += votes;
    }

    pub fn season(&self, season: &str) -> u32 {
        self.by_season.get(season).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.by_season.values().sum()
    }

    /// Lookup by season, or by `TOTAL_VOTES_KEY` for the sum.
    pub fn get(&self, key: &str) -> u32 {
        if key == TOTAL_VOTES_KEY { self.total() } else { self.season(key) }
    }
}

/// Everything the renderer needs for one subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedStats {
    pub seasons: Vec<SeasonStat>,
    pub career: CareerAggregate,
    pub votes: VoteTally,
    pub averages: Vec<AverageRow>,
}

impl NormalizedStats {
    pub fn average_for(&self, season: &str) -> Option<&AverageRow> {
        self.averages.iter().find(|a| a.season == season)
    }
}
