// src/markup/extract.rs
//! Recover editor-added annotations from an existing page.
//!
//! Only the statistics section is scanned, so season links in the infobox
//! or prose never register as table rows.

use std::collections::BTreeMap;

use super::section::find_statistics;
use super::table::{season_rows, Cell, SeasonRow};
use crate::config::consts::LEADING_BG;
use crate::core::wikitext::{footnotes, strip_footnotes, unbold};
use crate::stats::Column;

/// An emphasized league-leading cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeadingStat {
    /// Value as it read in the old page.
    pub value: String,
    /// Cell attributes, reused verbatim around the new value.
    pub attrs: String,
    /// Whether the `†` marker followed the value.
    pub marked: bool,
}

/// A season styled as special by an editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecialYear {
    /// Styled season cell, footnotes removed.
    pub season_cell: Cell,
    /// Team cell as the editor left it, footnotes removed.
    pub team_cell: Option<Cell>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecialFormatting {
    pub leading_stats: BTreeMap<String, BTreeMap<Column, LeadingStat>>,
    pub special_years: BTreeMap<String, SpecialYear>,
    /// Footnote templates per season, concatenated in page order.
    pub notes: BTreeMap<String, String>,
}

impl SpecialFormatting {
    pub fn is_empty(&self) -> bool {
        self.leading_stats.is_empty() && self.special_years.is_empty() && self.notes.is_empty()
    }

    /// Anything to re-apply for this season?
    pub fn touches(&self, season: &str) -> bool {
        self.leading_stats.contains_key(season)
            || self.special_years.contains_key(season)
            || self.notes.contains_key(season)
    }
}

fn leading_stat(cell: &Cell) -> Option<LeadingStat> {
    if !cell.has_attr(LEADING_BG) {
        return None;
    }
    let content = strip_footnotes(&cell.content);
    let value = unbold(&content).unwrap_or(content.trim());
    Some(LeadingStat {
        value: s!(value),
        attrs: cell.attrs.clone().unwrap_or_default(),
        marked: content.contains('†'),
    })
}

fn without_footnotes(cell: &Cell) -> Cell {
    Cell { attrs: cell.attrs.clone(), content: s!(strip_footnotes(&cell.content).trim()) }
}

fn record_row(fmt: &mut SpecialFormatting, lines: &[&str], row: &SeasonRow) {
    let season = &row.season;

    let leading: BTreeMap<Column, LeadingStat> = row
        .keyed()
        .filter(|(col, _)| col.is_stat())
        .filter_map(|(col, cell)| leading_stat(cell).map(|l| (col, l)))
        .collect();
    if !leading.is_empty() {
        logd!("Season {season}: {} leading stat(s)", leading.len());
        fmt.leading_stats.insert(season.clone(), leading);
    }

    if row.special {
        if let Some(season_cell) = row.cell(Column::Season) {
            fmt.special_years.insert(
                season.clone(),
                SpecialYear {
                    season_cell: without_footnotes(season_cell),
                    team_cell: row.cell(Column::Team).map(without_footnotes),
                },
            );
        }
    }

    // Footnotes live on the season line or the line right after it.
    let last = row.end_line.min(row.first_line + 2);
    let notes: String = lines[row.first_line..last].iter().map(|l| footnotes(l)).collect();
    if !notes.is_empty() {
        fmt.notes.insert(season.clone(), notes);
    }
}

/// Annotations found in `doc`'s statistics section. A page without any is
/// the normal case and yields an empty value.
pub fn extract_special_formatting(doc: &str) -> SpecialFormatting {
    let mut fmt = SpecialFormatting::default();
    let Some(range) = find_statistics(doc) else {
        return fmt;
    };
    let lines: Vec<&str> = doc[range].lines().collect();
    for row in season_rows(&lines) {
        record_row(&mut fmt, &lines, &row);
    }
    fmt
}
