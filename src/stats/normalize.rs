// src/stats/normalize.rs
//! Raw scraped tables → season rows, career aggregate, vote tally, averages.
//!
//! The scraper hands over two tables per subject (season totals and season
//! averages). Both end with a `Totals` row and an `Averages` row, labelled in
//! the Season column. Blank cells mean zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::columns::{
    StatKey, AVERAGE_KEYS, CAREER_KEYS, SEASON_LABEL, TEAM_LABEL, TOTAL_KEYS, VOTES_LABEL,
};
use super::types::{AverageRow, CareerAggregate, NormalizedStats, SeasonStat, StatValues, VoteTally};
use crate::core::sanitize::blank_to_zero;

pub const TOTALS_ROW: &str = "Totals";
pub const AVERAGES_ROW: &str = "Averages";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStats {
    pub totals: RawTable,
    pub averages: RawTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("{table} table has no {column:?} column")]
    MissingColumn { table: &'static str, column: &'static str },

    #[error("{table} table does not end with Totals and Averages rows")]
    MissingAggregateRows { table: &'static str },

    #[error("{table} table row {row} has {found} cells, needs {needed}")]
    ShortRow { table: &'static str, row: usize, found: usize, needed: usize },

    #[error("invalid vote count {value:?} for season {season}")]
    InvalidVotes { season: String, value: String },
}

/// Column positions resolved once per table.
struct Layout {
    table: &'static str,
    season: usize,
    team: Option<usize>,
    stats: Vec<(StatKey, usize)>,
    votes: Option<usize>,
    width: usize,
}

impl Layout {
    fn resolve(
        table: &'static str,
        t: &RawTable,
        keys: &[StatKey],
        need_team: bool,
        need_votes: bool,
    ) -> Result<Self, NormalizeError> {
        let find = |label: &'static str| {
            t.headers.iter().position(|h| h.trim().eq_ignore_ascii_case(label))
        };
        let require = |label: &'static str| {
            find(label).ok_or(NormalizeError::MissingColumn { table, column: label })
        };

        let season = require(SEASON_LABEL)?;
        let team = if need_team { Some(require(TEAM_LABEL)?) } else { None };
        let votes = if need_votes { Some(require(VOTES_LABEL)?) } else { None };
        let mut stats = Vec::with_capacity(keys.len());
        for &k in keys {
            stats.push((k, require(k.label())?));
        }

        let width = stats.iter().map(|(_, i)| *i)
            .chain([season])
            .chain(team)
            .chain(votes)
            .max()
            .unwrap_or(0) + 1;

        Ok(Self { table, season, team, stats, votes, width })
    }

    fn check<'r>(&self, row_ix: usize, row: &'r [String]) -> Result<&'r [String], NormalizeError> {
        if row.len() < self.width {
            return Err(NormalizeError::ShortRow {
                table: self.table,
                row: row_ix,
                found: row.len(),
                needed: self.width,
            });
        }
        Ok(row)
    }

    fn values(&self, row: &[String], keys: &[StatKey]) -> StatValues {
        self.stats
            .iter()
            .filter(|(k, _)| keys.contains(k))
            .map(|(k, i)| (*k, blank_to_zero(&row[*i])))
            .collect()
    }

    fn label<'r>(&self, row: &'r [String]) -> &'r str {
        row.get(self.season).map(|s| s.trim()).unwrap_or("")
    }
}

fn is_aggregate_label(label: &str) -> bool {
    label.eq_ignore_ascii_case(TOTALS_ROW) || label.eq_ignore_ascii_case(AVERAGES_ROW)
}

/// Normalize one subject's scraped tables. Nothing is returned unless every
/// table is well formed.
pub fn normalize(raw: &RawStats) -> Result<NormalizedStats, NormalizeError> {
    let totals = Layout::resolve("totals", &raw.totals, &TOTAL_KEYS, true, true)?;
    let averages = Layout::resolve("averages", &raw.averages, &AVERAGE_KEYS, false, false)?;

    // Trailing Totals / Averages rows on the totals table are mandatory.
    let rows = &raw.totals.rows;
    let n = rows.len();
    if n < 2
        || !totals.label(&rows[n - 2]).eq_ignore_ascii_case(TOTALS_ROW)
        || !totals.label(&rows[n - 1]).eq_ignore_ascii_case(AVERAGES_ROW)
    {
        return Err(NormalizeError::MissingAggregateRows { table: "totals" });
    }

    let team_ix = totals.team.unwrap_or(0);
    let votes_ix = totals.votes.unwrap_or(0);

    let mut seasons = Vec::with_capacity(n - 2);
    let mut votes = VoteTally::default();
    for (i, row) in rows[..n - 2].iter().enumerate() {
        let row = totals.check(i, row)?;
        let season = s!(totals.label(row));

        let raw_votes = row[votes_ix].trim();
        let v = if raw_votes.is_empty() {
            0
        } else {
            raw_votes.parse::<u32>().map_err(|_| NormalizeError::InvalidVotes {
                season: season.clone(),
                value: s!(raw_votes),
            })?
        };
        votes.add(&season, v);

        seasons.push(SeasonStat {
            team: blank_to_zero(&row[team_ix]),
            values: totals.values(row, &TOTAL_KEYS),
            season,
        });
    }

    let total_row = totals.check(n - 2, &rows[n - 2])?;
    let average_row = totals.check(n - 1, &rows[n - 1])?;
    let career = CareerAggregate {
        total: totals.values(total_row, &CAREER_KEYS),
        average: totals.values(average_row, &CAREER_KEYS),
    };

    let mut average_rows = Vec::new();
    for (i, row) in raw.averages.rows.iter().enumerate() {
        if is_aggregate_label(averages.label(row)) {
            continue;
        }
        let row = averages.check(i, row)?;
        average_rows.push(AverageRow {
            season: s!(averages.label(row)),
            values: averages.values(row, &AVERAGE_KEYS),
        });
    }

    Ok(NormalizedStats { seasons, career, votes, averages: average_rows })
}
