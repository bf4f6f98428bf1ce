// src/markup/section.rs
//! Locating and replacing the statistics section of a whole page.
//!
//! The section runs from a `==Statistics==` heading up to the next top-level
//! heading, a `'''Notes'''` line, or end of page. Byte ranges returned here
//! always start on a line boundary.

use std::ops::Range;

use crate::core::wikitext::{is_heading, is_top_heading};

pub const STATISTICS_TITLE: &str = "Statistics";
pub const NOTES_MARKER: &str = "'''Notes'''";
/// Insertion anchors, in preference order.
pub const ANCHORS: [&str; 2] = ["References", "External links"];

/// `(offset, line)` pairs, line terminators included.
fn lines_with_offsets(doc: &str) -> impl Iterator<Item = (usize, &str)> {
    doc.split_inclusive('\n').scan(0usize, |at, line| {
        let start = *at;
        *at += line.len();
        Some((start, line))
    })
}

fn is_notes_marker(line: &str) -> bool {
    line.trim_start().starts_with(NOTES_MARKER)
}

/// Byte range of the statistics section, heading included.
pub fn find_statistics(doc: &str) -> Option<Range<usize>> {
    let mut lines = lines_with_offsets(doc);
    let start = lines
        .by_ref()
        .find(|(_, l)| is_heading(l, 2, STATISTICS_TITLE))
        .map(|(at, _)| at)?;
    let end = lines
        .find(|(_, l)| is_top_heading(l) || is_notes_marker(l))
        .map(|(at, _)| at)
        .unwrap_or(doc.len());
    Some(start..end)
}

/// Byte range of the editorial Notes block: from the `'''Notes'''` line up to
/// the next top-level heading or end of page.
pub fn find_notes(doc: &str) -> Option<Range<usize>> {
    let mut lines = lines_with_offsets(doc);
    let start = lines.by_ref().find(|(_, l)| is_notes_marker(l)).map(|(at, _)| at)?;
    let end = lines
        .find(|(_, l)| is_top_heading(l))
        .map(|(at, _)| at)
        .unwrap_or(doc.len());
    Some(start..end)
}

/// Start of the first insertion anchor heading that exists.
fn anchor(doc: &str) -> Option<usize> {
    ANCHORS.iter().find_map(|title| {
        lines_with_offsets(doc)
            .find(|(_, l)| is_heading(l, 2, title))
            .map(|(at, _)| at)
    })
}

/// `block` placed before `doc[at..]` with one blank line on each side.
fn insert_before(doc: &str, at: usize, block: &str) -> String {
    let head = doc[..at].trim_end();
    let mut out = String::with_capacity(doc.len() + block.len() + 4);
    if !head.is_empty() {
        out.push_str(head);
        out.push_str("\n\n");
    }
    out.push_str(block.trim_end());
    out.push_str("\n\n");
    out.push_str(&doc[at..]);
    out
}

/// `block` after everything in `doc`, separated by exactly one blank line.
fn append(doc: &str, block: &str) -> String {
    let head = doc.trim_end();
    if head.is_empty() {
        return join!(block.trim_end(), "\n");
    }
    join!(head, "\n\n", block.trim_end(), "\n")
}

/// Put a Notes block back if a replacement lost it.
pub fn reinsert_notes(doc: &str, notes: &str) -> String {
    let notes = notes.trim_end();
    if notes.is_empty() || doc.contains(notes) {
        return s!(doc);
    }
    match anchor(doc) {
        Some(at) => insert_before(doc, at, notes),
        None => append(doc, notes),
    }
}

/// Replace the statistics section of `doc` with `block`, or insert it before
/// References / External links, or append it.
pub fn splice_section(doc: &str, block: &str) -> String {
    let Some(range) = find_statistics(doc) else {
        return match anchor(doc) {
            Some(at) => {
                logd!("No statistics section; inserting before anchor at byte {at}");
                insert_before(doc, at, block)
            }
            None => {
                logd!("No statistics section or anchor; appending");
                append(doc, block)
            }
        };
    };

    // Keep whatever whitespace separated the old section from the rest.
    let old = &doc[range.clone()];
    let gap = &old[old.trim_end().len()..];
    let updated = join!(&doc[..range.start], block.trim_end(), gap, &doc[range.end..]);

    match find_notes(doc) {
        Some(notes) => reinsert_notes(&updated, &doc[notes]),
        None => updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "==Statistics==\n{{table}}\n|}\n";

    #[test]
    fn finds_section_bounds() {
        let doc = "Intro\n\n==Statistics==\nold\n\n==References==\n{{reflist}}\n";
        let r = find_statistics(doc).unwrap();
        assert_eq!(&doc[r], "==Statistics==\nold\n\n");
    }

    #[test]
    fn section_stops_at_notes_marker() {
        let doc = "==Statistics==\nold\n'''Notes'''\n{{notelist}}\n==References==\n";
        let r = find_statistics(doc).unwrap();
        assert_eq!(&doc[r], "==Statistics==\nold\n");
        let n = find_notes(doc).unwrap();
        assert_eq!(&doc[n], "'''Notes'''\n{{notelist}}\n");
    }

    #[test]
    fn commented_heading_is_replaced_not_duplicated() {
        let doc = "Bio AFL.\n==Statistics== <!-- keep -->\nold table\n==References==\n";
        let r = find_statistics(doc).unwrap();
        assert!(doc[r].contains("old table"));
        let out = splice_section(doc, BLOCK);
        assert_eq!(out.matches("Statistics==").count(), 1);
        assert!(!out.contains("old table"));
        assert_eq!(splice_section(&out, BLOCK), out);
    }

    #[test]
    fn subsection_headings_stay_inside() {
        let doc = "== Statistics ==\nold\n===Finals===\nmore\n==External links==\n";
        let r = find_statistics(doc).unwrap();
        assert!(doc[r].contains("===Finals==="));
    }

    #[test]
    fn replaces_and_keeps_gap() {
        let doc = "Intro\n\n==Statistics==\nold\n\n\n==References==\n";
        let out = splice_section(doc, BLOCK);
        assert_eq!(out, "Intro\n\n==Statistics==\n{{table}}\n|}\n\n\n==References==\n");
    }

    #[test]
    fn inserts_before_references_then_external_links() {
        let doc = "Intro\n==References==\n{{reflist}}\n==External links==\n* x\n";
        let out = splice_section(doc, BLOCK);
        let at = out.find("==Statistics==").unwrap();
        assert!(out[at..].starts_with("==Statistics==\n{{table}}\n|}\n\n==References=="));

        let doc = "Intro\n\n==External links==\n* x\n";
        let out = splice_section(doc, BLOCK);
        assert_eq!(out, "Intro\n\n==Statistics==\n{{table}}\n|}\n\n==External links==\n* x\n");
    }

    #[test]
    fn appends_with_one_blank_line() {
        let out = splice_section("Intro text.\n\n\n", BLOCK);
        assert_eq!(out, "Intro text.\n\n==Statistics==\n{{table}}\n|}\n");
        assert_eq!(splice_section("", BLOCK), "==Statistics==\n{{table}}\n|}\n");
    }

    #[test]
    fn splice_is_idempotent_on_every_path() {
        for doc in [
            "Intro\n\n==Statistics==\nold\n==References==\n",
            "Intro\n==References==\n",
            "Intro\n==External links==\n",
            "Intro",
            "==Statistics==\nold\n'''Notes'''\n{{notelist}}\n",
        ] {
            let once = splice_section(doc, BLOCK);
            assert_eq!(splice_section(&once, BLOCK), once, "doc: {doc:?}");
        }
    }

    #[test]
    fn notes_survive_replacement() {
        let doc = "==Statistics==\nold\n'''Notes'''\n{{notelist}}\n\n==References==\n";
        let out = splice_section(doc, BLOCK);
        assert!(out.contains("'''Notes'''\n{{notelist}}"));
        assert_eq!(out.matches("'''Notes'''").count(), 1);
    }

    #[test]
    fn lost_notes_go_before_anchor_or_at_end() {
        let notes = "'''Notes'''\n{{notelist}}\n";
        let out = reinsert_notes("==Statistics==\nx\n\n==References==\n", notes);
        assert_eq!(out, "==Statistics==\nx\n\n'''Notes'''\n{{notelist}}\n\n==References==\n");

        let out = reinsert_notes("==Statistics==\nx", notes);
        assert_eq!(out, "==Statistics==\nx\n\n'''Notes'''\n{{notelist}}\n");

        let same = reinsert_notes(&out, notes);
        assert_eq!(same, out);
    }
}
