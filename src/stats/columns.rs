// src/stats/columns.rs
//! Canonical column layout of the statistics table.
//!
//! The renderer writes cells in `COLUMNS` order and the table tokenizer maps
//! cell N of a season row back to `COLUMNS[N]`, so annotations are always
//! addressed by key rather than by counting separators.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKey {
    Number,
    Games,
    Goals,
    Behinds,
    Kicks,
    Handballs,
    Disposals,
    Marks,
    Tackles,
}

impl StatKey {
    /// Column label used by the scraped tables.
    pub const fn label(self) -> &'static str {
        match self {
            StatKey::Number => "No.",
            StatKey::Games => "Games",
            StatKey::Goals => "G",
            StatKey::Behinds => "B",
            StatKey::Kicks => "K",
            StatKey::Handballs => "H",
            StatKey::Disposals => "D",
            StatKey::Marks => "M",
            StatKey::Tackles => "T",
        }
    }
}

/// Per-season counting stats, in table order.
pub const TOTAL_KEYS: [StatKey; 9] = [
    StatKey::Number,
    StatKey::Games,
    StatKey::Goals,
    StatKey::Behinds,
    StatKey::Kicks,
    StatKey::Handballs,
    StatKey::Disposals,
    StatKey::Marks,
    StatKey::Tackles,
];

/// Stats that also get a per-game average column.
pub const AVERAGE_KEYS: [StatKey; 7] = [
    StatKey::Goals,
    StatKey::Behinds,
    StatKey::Kicks,
    StatKey::Handballs,
    StatKey::Disposals,
    StatKey::Marks,
    StatKey::Tackles,
];

/// Career footer totals (guernsey number has no career figure).
pub const CAREER_KEYS: [StatKey; 8] = [
    StatKey::Games,
    StatKey::Goals,
    StatKey::Behinds,
    StatKey::Kicks,
    StatKey::Handballs,
    StatKey::Disposals,
    StatKey::Marks,
    StatKey::Tackles,
];

pub const SEASON_LABEL: &str = "Season";
pub const TEAM_LABEL: &str = "Team";
pub const VOTES_LABEL: &str = "Votes";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Season,
    Team,
    Total(StatKey),
    Average(StatKey),
    Votes,
}

pub const COLUMNS: [Column; 19] = [
    Column::Season,
    Column::Team,
    Column::Total(StatKey::Number),
    Column::Total(StatKey::Games),
    Column::Total(StatKey::Goals),
    Column::Total(StatKey::Behinds),
    Column::Total(StatKey::Kicks),
    Column::Total(StatKey::Handballs),
    Column::Total(StatKey::Disposals),
    Column::Total(StatKey::Marks),
    Column::Total(StatKey::Tackles),
    Column::Average(StatKey::Goals),
    Column::Average(StatKey::Behinds),
    Column::Average(StatKey::Kicks),
    Column::Average(StatKey::Handballs),
    Column::Average(StatKey::Disposals),
    Column::Average(StatKey::Marks),
    Column::Average(StatKey::Tackles),
    Column::Votes,
];

impl Column {
    pub fn at(index: usize) -> Option<Column> {
        COLUMNS.get(index).copied()
    }

    pub fn index(self) -> usize {
        // COLUMNS covers every constructible value used by the table
        COLUMNS.iter().position(|c| *c == self).unwrap_or(COLUMNS.len())
    }

    /// Numeric columns an editor may highlight.
    pub fn is_stat(self) -> bool {
        !matches!(self, Column::Season | Column::Team)
    }

    /// Short name as used in bot logs: `G`, `G_avg`, `Votes`, ...
    pub fn name(self) -> String {
        match self {
            Column::Season => s!(SEASON_LABEL),
            Column::Team => s!(TEAM_LABEL),
            Column::Total(k) => s!(k.label()),
            Column::Average(k) => join!(k.label(), "_avg"),
            Column::Votes => s!(VOTES_LABEL),
        }
    }
}
