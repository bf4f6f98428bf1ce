// src/markup/apply.rs
//! Re-apply recovered annotations to a freshly rendered block.
//!
//! Numbers always come from the new render. Only the visual wrapper of an
//! annotation (cell attributes, bold, marker glyph, footnote) is carried
//! over from the old page.

use super::extract::{LeadingStat, SpecialFormatting};
use super::table::{classify, row_line, season_row_at, Cell, LineKind, SeasonRow};
use crate::config::consts::LEADING_MARK;
use crate::core::wikitext::{season_link, unbold};
use crate::stats::Column;

fn emphasize(cell: &Cell, lead: &LeadingStat) -> Option<Cell> {
    let value = unbold(&cell.content).unwrap_or(cell.content.trim());
    // Nothing to highlight in a blank average cell.
    if value.is_empty() {
        return None;
    }
    let mark = if lead.marked { LEADING_MARK } else { "" };
    Some(Cell::styled(lead.attrs.as_str(), format!("'''{value}'''{mark}")))
}

/// Footnotes go right after the season link, once.
fn insert_note(cell: &mut Cell, note: &str) {
    if cell.content.contains(note) {
        return;
    }
    match season_link(&cell.content).map(|(_, span)| span.end) {
        Some(at) => cell.content.insert_str(at, note),
        None => cell.content.push_str(note),
    }
}

fn annotate(row: &SeasonRow, fmt: &SpecialFormatting) -> Vec<Cell> {
    let season = row.season.as_str();
    let mut cells = row.cells.clone();

    if let Some(special) = fmt.special_years.get(season) {
        if let Some(c) = cells.get_mut(Column::Season.index()) {
            *c = special.season_cell.clone();
        }
        if let (Some(c), Some(team)) = (cells.get_mut(Column::Team.index()), &special.team_cell) {
            *c = team.clone();
        }
    }

    if let Some(leads) = fmt.leading_stats.get(season) {
        for (col, lead) in leads {
            let Some(c) = cells.get_mut(col.index()) else {
                logw!("Season {season}: no {} cell for leading stat", col.name());
                continue;
            };
            if let Some(styled) = emphasize(c, lead) {
                *c = styled;
            }
        }
    }

    if let Some(note) = fmt.notes.get(season) {
        if let Some(c) = cells.get_mut(Column::Season.index()) {
            insert_note(c, note);
        }
    }
    cells
}

/// `markup` with `fmt` applied. Rows of seasons without annotations and
/// the career footer pass through byte for byte.
pub fn apply_special_formatting(markup: &str, fmt: &SpecialFormatting) -> String {
    if fmt.is_empty() {
        return s!(markup);
    }
    let lines: Vec<&str> = markup.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if let LineKind::RowSeparator { career: true, .. } = classify(lines[i]) {
            // Footer separator and the line after it are never annotated.
            out.extend(lines[i..(i + 2).min(lines.len())].iter().map(|l| s!(*l)));
            i += 2;
            continue;
        }
        match season_row_at(&lines, i) {
            Some(row) if fmt.touches(&row.season) => {
                // A special year's team cell replaces the new team cell, so
                // continuation lines collapse into one.
                if row.has_continuation() {
                    logd!("Season {}: folding {} lines into one row", row.season, row.end_line - row.first_line);
                }
                out.push(row_line(&annotate(&row, fmt)));
                i = row.end_line;
            }
            Some(row) => {
                out.extend(lines[row.first_line..row.end_line].iter().map(|l| s!(*l)));
                i = row.end_line;
            }
            None => {
                out.push(s!(lines[i]));
                i += 1;
            }
        }
    }

    let mut text = out.join("\n");
    if markup.ends_with('\n') {
        text.push('\n');
    }
    text
}
