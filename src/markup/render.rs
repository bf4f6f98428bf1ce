// src/markup/render.rs
//! Normalized stats → statistics section markup.
//!
//! Pure: the access date is passed in, so equal inputs give byte-identical
//! output.

use chrono::NaiveDate;
use thiserror::Error;

use super::table::{row_line, Cell};
use crate::config::consts::{BANDED_ROW, SOURCE_PUBLISHER};
use crate::stats::{
    Column, NormalizedStats, StatKey, StatValues, AVERAGE_KEYS, CAREER_KEYS, COLUMNS, TOTAL_VOTES_KEY,
};

pub const SECTION_HEADING: &str = "==Statistics==";
pub const LEGEND: &str = "{{AFL player statistics legend|p=y}}";
pub const TABLE_START: &str = "{{AFL player statistics start with votes}}";
pub const CAREER_SEPARATOR: &str = "|- class=sortbottom";
pub const CAREER_LABEL: &str = "! colspan=3| Career";
pub const TABLE_END: &str = "|}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no season rows to render")]
    NoSeasons,
}

/// What the caption says the table is current to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsOf {
    EndOfSeason(String),
    Round { season: String, round: u32 },
}

#[derive(Clone, Debug)]
pub struct RenderInput<'a> {
    pub stats: &'a NormalizedStats,
    pub display_name: &'a str,
    pub source_url: &'a str,
    pub accessed: NaiveDate,
    /// `None` means "end of the last season in the table".
    pub as_of: Option<AsOf>,
}

pub fn season_link(season: &str) -> String {
    format!("[[{season} AFL season|{season}]]")
}

fn caption(as_of: &AsOf) -> String {
    match as_of {
        AsOf::EndOfSeason(season) => format!("''Updated to the end of the {season} season''."),
        AsOf::Round { season, round } => format!("''Updated to the end of round {round}, {season}''."),
    }
}

fn citation(url: &str, title: &str, accessed: NaiveDate) -> String {
    format!(
        "<ref>{{{{cite web|url={url}|title={title}|publisher={SOURCE_PUBLISHER}|access-date={}}}}}</ref>",
        accessed.format("%d %B %Y")
    )
}

/// Cells for one season, in `COLUMNS` order.
fn season_cells(stats: &NormalizedStats, ix: usize) -> Vec<Cell> {
    let row = &stats.seasons[ix];
    let avg = stats.average_for(&row.season);
    COLUMNS
        .iter()
        .map(|col| match *col {
            Column::Season => Cell::plain(season_link(&row.season)),
            Column::Team => Cell::plain(row.team.as_str()),
            Column::Total(k) => Cell::plain(row.get(k)),
            // no averages row for this season → blank, not zero
            Column::Average(k) => Cell::plain(avg.map(|a| a.get(k)).unwrap_or("")),
            Column::Votes => Cell::plain(stats.votes.season(&row.season).to_string()),
        })
        .collect()
}

/// Render the whole statistics section. Fails only when there is nothing to
/// put in the table.
pub fn render_statistics(input: &RenderInput<'_>) -> Result<String, RenderError> {
    let stats = input.stats;
    let last = stats.seasons.last().ok_or(RenderError::NoSeasons)?;
    let as_of = input
        .as_of
        .clone()
        .unwrap_or_else(|| AsOf::EndOfSeason(last.season.clone()));

    let mut out = String::with_capacity(256 + stats.seasons.len() * 160);
    let mut line = |l: &str| {
        out.push_str(l);
        out.push('\n');
    };

    line(SECTION_HEADING);
    line(&join!(&caption(&as_of), &citation(input.source_url, input.display_name, input.accessed)));
    line("");
    line(LEGEND);
    line(TABLE_START);

    for ix in 0..stats.seasons.len() {
        line(if ix % 2 == 0 { BANDED_ROW } else { "|-" });
        line(&row_line(&season_cells(stats, ix)));
    }

    line(CAREER_SEPARATOR);
    line(CAREER_LABEL);
    let career = |values: &StatValues, k: StatKey| values.get(&k).cloned().unwrap_or_default();
    for k in CAREER_KEYS {
        line(&join!("! ", &career(&stats.career.total, k)));
    }
    for k in AVERAGE_KEYS {
        line(&join!("! ", &career(&stats.career.average, k)));
    }
    line(&format!("! {}", stats.votes.get(TOTAL_VOTES_KEY)));
    line(TABLE_END);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::table::{classify, season_rows, LineKind};
    use crate::stats::{AverageRow, CareerAggregate, SeasonStat, VoteTally, TOTAL_KEYS};

    fn values(keys: &[StatKey], base: u32) -> StatValues {
        keys.iter().enumerate().map(|(i, k)| (*k, (base + i as u32).to_string())).collect()
    }

    fn stats(seasons: &[&str]) -> NormalizedStats {
        let mut votes = VoteTally::default();
        let mut rows = Vec::new();
        let mut avgs = Vec::new();
        for (i, s) in seasons.iter().enumerate() {
            votes.add(s, i as u32 * 3);
            rows.push(SeasonStat { season: s!(*s), team: s!("Richmond"), values: values(&TOTAL_KEYS, 10) });
            if i == 0 {
                avgs.push(AverageRow { season: s!(*s), values: values(&AVERAGE_KEYS, 1) });
            }
        }
        NormalizedStats {
            seasons: rows,
            career: CareerAggregate { total: values(&CAREER_KEYS, 100), average: values(&CAREER_KEYS, 1) },
            votes,
            averages: avgs,
        }
    }

    fn input(stats: &NormalizedStats) -> RenderInput<'_> {
        RenderInput {
            stats,
            display_name: "Dustin Martin",
            source_url: "https://afltables.com/afl/stats/players/D/Dustin_Martin.html",
            accessed: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            as_of: None,
        }
    }

    #[test]
    fn header_lines_are_exact() {
        let st = stats(&["2019", "2020"]);
        let out = render_statistics(&input(&st)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "==Statistics==");
        assert_eq!(
            lines[1],
            "''Updated to the end of the 2020 season''.<ref>{{cite web|url=https://afltables.com/afl/stats/players/D/Dustin_Martin.html|title=Dustin Martin|publisher=AFL Tables|access-date=05 March 2024}}</ref>"
        );
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], LEGEND);
        assert_eq!(lines[4], TABLE_START);
        assert_eq!(*lines.last().unwrap(), "|}");
    }

    #[test]
    fn round_override_changes_caption() {
        let st = stats(&["2024"]);
        let mut inp = input(&st);
        inp.as_of = Some(AsOf::Round { season: s!("2024"), round: 12 });
        let out = render_statistics(&inp).unwrap();
        assert!(out.lines().nth(1).unwrap().starts_with("''Updated to the end of round 12, 2024''."));
    }

    #[test]
    fn banding_starts_on_first_row_and_alternates() {
        let st = stats(&["2017", "2018", "2019"]);
        let out = render_statistics(&input(&st)).unwrap();
        let seps: Vec<LineKind> = out
            .lines()
            .map(classify)
            .filter(|k| matches!(k, LineKind::RowSeparator { career: false, .. }))
            .collect();
        assert_eq!(
            seps,
            vec![
                LineKind::RowSeparator { banded: true, career: false },
                LineKind::RowSeparator { banded: false, career: false },
                LineKind::RowSeparator { banded: true, career: false },
            ]
        );
    }

    #[test]
    fn rows_have_every_column_and_blank_missing_averages() {
        let st = stats(&["2019", "2020"]);
        let out = render_statistics(&input(&st)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let rows = season_rows(&lines);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.cells.len() == COLUMNS.len()));
        assert_eq!(rows[0].cell(Column::Average(StatKey::Goals)).unwrap().content, "1");
        assert_eq!(rows[1].cell(Column::Average(StatKey::Goals)).unwrap().content, "");
        assert_eq!(rows[1].cell(Column::Votes).unwrap().content, "3");
    }

    #[test]
    fn career_footer_layout() {
        let st = stats(&["2019", "2020"]);
        let out = render_statistics(&input(&st)).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let at = lines.iter().position(|l| *l == CAREER_SEPARATOR).unwrap();
        assert_eq!(lines[at + 1], CAREER_LABEL);
        // 8 totals + 7 averages + votes + table end
        assert_eq!(lines.len() - (at + 2), 8 + 7 + 1 + 1);
        assert_eq!(lines[at + 2], "! 100");
        assert_eq!(lines[at + 10], "! 2"); // career G average
        assert_eq!(lines[at + 17], "! 3");
    }

    #[test]
    fn deterministic() {
        let st = stats(&["2019", "2020", "2021"]);
        assert_eq!(render_statistics(&input(&st)), render_statistics(&input(&st)));
    }

    #[test]
    fn empty_stats_fail() {
        let st = NormalizedStats::default();
        assert_eq!(render_statistics(&input(&st)), Err(RenderError::NoSeasons));
    }
}
