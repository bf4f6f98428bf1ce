// src/stats/mod.rs
//! Subject statistics as the rest of the crate sees them.
//!
//! `normalize` turns the scraper's raw tables into `NormalizedStats`;
//! `columns` fixes the table layout every other module agrees on.
pub mod columns;
pub mod normalize;
pub mod types;

pub use columns::{Column, StatKey, AVERAGE_KEYS, CAREER_KEYS, COLUMNS, TOTAL_KEYS};
pub use normalize::{normalize, NormalizeError, RawStats, RawTable};
pub use types::{
    AverageRow, CareerAggregate, NormalizedStats, SeasonStat, StatValues, VoteTally,
    TOTAL_VOTES_KEY,
};
