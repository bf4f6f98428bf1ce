// src/markup/table.rs
//! Line classifier and cell tokenizer for the statistics table.
//!
//! Both the extractor (old page) and the applier (fresh render) read the
//! table through this module, so a cell's column is decided in exactly one
//! place.

use crate::config::consts::SPECIAL_BG;
use crate::core::wikitext::{attribute_pipe, season_link, split_cells, strip_footnotes};
use crate::stats::Column;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub attrs: Option<String>,
    pub content: String,
}

impl Cell {
    pub fn plain(content: impl Into<String>) -> Self {
        Self { attrs: None, content: content.into() }
    }

    pub fn styled(attrs: impl Into<String>, content: impl Into<String>) -> Self {
        Self { attrs: Some(attrs.into()), content: content.into() }
    }

    /// `bgcolor=X | text` → attrs + content; anything else is all content.
    pub fn parse(raw: &str) -> Self {
        match attribute_pipe(raw) {
            Some(p) => Self::styled(raw[..p].trim(), raw[p + 1..].trim()),
            None => Self::plain(raw.trim()),
        }
    }

    pub fn has_attr(&self, needle: &str) -> bool {
        self.attrs
            .as_deref()
            .is_some_and(|a| a.to_ascii_uppercase().contains(&needle.to_ascii_uppercase()))
    }

    pub fn render(&self) -> String {
        match &self.attrs {
            Some(a) => format!("{a} | {}", self.content),
            None => self.content.clone(),
        }
    }
}

/// What a single line of table markup is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// `|-`, optionally banded or opening the career footer.
    RowSeparator { banded: bool, career: bool },
    /// Cell line whose first cell links a season.
    SeasonRow { season: String, special: bool },
    /// Further `|` cells belonging to the row above.
    Continuation,
    /// `!` cells that are not a season (career footer, headers).
    HeaderCells,
    TableEnd,
    Other,
}

/// Cells of one `|` or `!` line, marker stripped.
pub fn line_cells(line: &str) -> Vec<Cell> {
    let t = line.trim_start();
    let (headers, body) = match t.as_bytes().first() {
        Some(b'!') => (true, &t[1..]),
        Some(b'|') => (false, &t[1..]),
        _ => return Vec::new(),
    };
    split_cells(body, headers).into_iter().map(Cell::parse).collect()
}

/// Season of a first cell that opens with a (possibly bolded) season link.
/// Footnotes placed ahead of the link do not count.
fn leading_season(content: &str) -> Option<String> {
    let bare = strip_footnotes(content);
    let t = bare.trim_start().trim_start_matches('\'');
    let (season, span) = season_link(t)?;
    (span.start == 0).then(|| s!(season))
}

pub fn classify(line: &str) -> LineKind {
    let t = line.trim_start();
    if t.starts_with("|-") {
        return LineKind::RowSeparator {
            banded: t.contains("background"),
            career: t.contains("sortbottom"),
        };
    }
    if t.starts_with("|}") {
        return LineKind::TableEnd;
    }
    if t.starts_with("|+") || t.starts_with("{|") {
        return LineKind::Other;
    }
    let is_header = t.starts_with('!');
    if !is_header && !t.starts_with('|') {
        return LineKind::Other;
    }

    let cells = line_cells(t);
    if let Some(first) = cells.first() {
        if let Some(season) = leading_season(&first.content) {
            return LineKind::SeasonRow {
                season,
                special: first.has_attr(SPECIAL_BG),
            };
        }
    }
    if is_header { LineKind::HeaderCells } else { LineKind::Continuation }
}

/// A season line plus its continuation lines, as keyed cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeasonRow {
    pub season: String,
    pub special: bool,
    /// Index of the season line in the scanned slice.
    pub first_line: usize,
    /// One past the last line of the row.
    pub end_line: usize,
    pub cells: Vec<Cell>,
}

impl SeasonRow {
    pub fn cell(&self, col: Column) -> Option<&Cell> {
        self.cells.get(col.index())
    }

    pub fn keyed(&self) -> impl Iterator<Item = (Column, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| Column::at(i).map(|col| (col, c)))
    }

    pub fn has_continuation(&self) -> bool {
        self.end_line > self.first_line + 1
    }
}

/// Read the season row starting at `lines[start]`, if there is one.
pub fn season_row_at(lines: &[&str], start: usize) -> Option<SeasonRow> {
    let LineKind::SeasonRow { season, special } = classify(lines.get(start)?) else {
        return None;
    };
    let mut cells = line_cells(lines[start]);
    let mut end = start + 1;
    while end < lines.len() && classify(lines[end]) == LineKind::Continuation {
        cells.extend(line_cells(lines[end]));
        end += 1;
    }
    Some(SeasonRow { season, special, first_line: start, end_line: end, cells })
}

/// Every season row in `lines`, in order.
pub fn season_rows(lines: &[&str]) -> Vec<SeasonRow> {
    let mut rows = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        match season_row_at(lines, i) {
            Some(row) => {
                i = row.end_line;
                rows.push(row);
            }
            None => i += 1,
        }
    }
    rows
}

/// Serialize cells as one `|` line.
pub fn row_line(cells: &[Cell]) -> String {
    let body: Vec<String> = cells.iter().map(Cell::render).collect();
    join!("| ", &body.join(" || "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatKey;

    #[test]
    fn classify_basic_lines() {
        assert_eq!(classify("|-"), LineKind::RowSeparator { banded: false, career: false });
        assert_eq!(
            classify("|- style=\"background-color: #EAEAEA\""),
            LineKind::RowSeparator { banded: true, career: false }
        );
        assert_eq!(
            classify("|- class=sortbottom"),
            LineKind::RowSeparator { banded: false, career: true }
        );
        assert_eq!(classify("|}"), LineKind::TableEnd);
        assert_eq!(classify("! colspan=3| Career"), LineKind::HeaderCells);
        assert_eq!(classify("Some prose [[2019 AFL season|2019]]"), LineKind::Other);
        assert_eq!(classify("| {{AFL Col|Ric}} || 22"), LineKind::Continuation);
        // infobox parameters mention seasons too
        assert_eq!(classify("| years1 = [[2010]]–[[2019]]"), LineKind::Continuation);
    }

    #[test]
    fn classify_season_rows() {
        assert_eq!(
            classify("| [[2019 AFL season|2019]] || Richmond || 4"),
            LineKind::SeasonRow { season: s!("2019"), special: false }
        );
        assert_eq!(
            classify("| bgcolor=F0E68C | '''[[2017 AFL season|2017]]'''<sup>#</sup>"),
            LineKind::SeasonRow { season: s!("2017"), special: true }
        );
        assert_eq!(
            classify("! scope=\"row\" | [[2010 AFL season|2010]]"),
            LineKind::SeasonRow { season: s!("2010"), special: false }
        );
    }

    #[test]
    fn footnote_before_link_still_a_season_row() {
        assert_eq!(
            classify("| {{efn|Traded mid-season.}}[[2019 AFL season|2019]] || Richmond || 4"),
            LineKind::SeasonRow { season: s!("2019"), special: false }
        );
        assert_eq!(classify("| {{efn|x}} Some text [[2019 AFL season|2019]]"), LineKind::Continuation);
    }

    #[test]
    fn multi_line_rows_are_keyed_across_lines() {
        let lines = [
            "|-",
            "| bgcolor=F0E68C | '''[[2017 AFL season|2017]]'''<sup>#</sup>",
            "| {{AFL Col|Ric}} || 4 || 25 || 22",
            "|-",
        ];
        let rows = season_rows(&lines);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!(row.special);
        assert!(row.has_continuation());
        assert_eq!(row.cell(Column::Team).unwrap().content, "{{AFL Col|Ric}}");
        assert_eq!(row.cell(Column::Total(StatKey::Goals)).unwrap().content, "22");
    }

    #[test]
    fn cell_parse_and_render_agree() {
        let c = Cell::parse(" bgcolor=CAE1FF | '''22'''<sup>†</sup> ");
        assert!(c.has_attr("cae1ff"));
        assert_eq!(c.render(), "bgcolor=CAE1FF | '''22'''<sup>†</sup>");
        let line = row_line(&[Cell::plain("[[2019 AFL season|2019]]"), Cell::plain("Richmond"), c]);
        assert_eq!(line, "| [[2019 AFL season|2019]] || Richmond || bgcolor=CAE1FF | '''22'''<sup>†</sup>");
        assert_eq!(line_cells(&line).len(), 3);
    }
}
