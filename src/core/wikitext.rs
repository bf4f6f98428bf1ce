// src/core/wikitext.rs
//! Scanning helpers for MediaWiki markup.
//!
//! Everything here works on raw `&str` and returns byte offsets. All the
//! delimiters we look for are ASCII, so offsets always land on char
//! boundaries.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

static RE_SEASON_LINK: OnceLock<Regex> = OnceLock::new();

fn season_link_re() -> &'static Regex {
    RE_SEASON_LINK.get_or_init(|| Regex::new(r"\[\[(\d{4})[^\]]*\]\]").expect("valid regex"))
}

/// First `[[YYYY ...]]` link in `s`: the four-digit season and the link's span.
pub fn season_link(s: &str) -> Option<(&str, Range<usize>)> {
    let caps = season_link_re().captures(s)?;
    let whole = caps.get(0)?;
    let year = caps.get(1)?;
    Some((year.as_str(), whole.range()))
}

/// `line` without trailing whitespace or trailing `<!-- ... -->` comments.
fn strip_trailing_comments(line: &str) -> &str {
    let mut t = line.trim_end();
    while t.ends_with("-->") {
        match t.rfind("<!--") {
            Some(at) => t = t[..at].trim_end(),
            None => break,
        }
    }
    t
}

/// `== Title ==` → `Some((2, "Title"))`. Comments after the closing run are
/// ignored.
///
/// Unbalanced runs count as the shorter side; surplus `=` stay in the title,
/// which is what MediaWiki does too.
pub fn heading(line: &str) -> Option<(usize, &str)> {
    let t = strip_trailing_comments(line);
    let open = t.bytes().take_while(|&b| b == b'=').count();
    if open == 0 || open == t.len() {
        return None;
    }
    let close = t.bytes().rev().take_while(|&b| b == b'=').count();
    if close == 0 {
        return None;
    }
    let level = open.min(close);
    Some((level, t[level..t.len() - level].trim()))
}

/// True for a heading of at most `max_level` whose title matches `title`
/// (ASCII case-insensitive).
pub fn is_heading(line: &str, max_level: usize, title: &str) -> bool {
    matches!(heading(line), Some((lvl, t)) if lvl <= max_level && t.eq_ignore_ascii_case(title))
}

/// Heading of level 1 or 2.
pub fn is_top_heading(line: &str) -> bool {
    matches!(heading(line), Some((lvl, _)) if lvl <= 2)
}

/// Split `s` on `||` (and `!!` when `headers` is set) that sit outside any
/// `[[...]]` link or `{{...}}` template.
pub fn split_cells(s: &str, headers: bool) -> Vec<&str> {
    let b = s.as_bytes();
    let mut out = Vec::new();
    let mut links = 0usize;
    let mut templates = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < b.len() {
        let pair = if i + 1 < b.len() { Some((b[i], b[i + 1])) } else { None };
        match pair {
            Some((b'[', b'[')) => { links += 1; i += 2; continue; }
            Some((b']', b']')) if links > 0 => { links -= 1; i += 2; continue; }
            Some((b'{', b'{')) => { templates += 1; i += 2; continue; }
            Some((b'}', b'}')) if templates > 0 => { templates -= 1; i += 2; continue; }
            Some((b'|', b'|')) | Some((b'!', b'!'))
                if links == 0 && templates == 0 && (b[i] == b'|' || headers) =>
            {
                out.push(&s[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    out.push(&s[start..]);
    out
}

/// Offset of the single `|` separating cell attributes from cell content,
/// ignoring pipes inside links and templates.
pub fn attribute_pipe(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut links = 0usize;
    let mut templates = 0usize;
    let mut i = 0usize;

    while i < b.len() {
        let next = b.get(i + 1).copied();
        match (b[i], next) {
            (b'[', Some(b'[')) => { links += 1; i += 2; continue; }
            (b']', Some(b']')) if links > 0 => { links -= 1; i += 2; continue; }
            (b'{', Some(b'{')) => { templates += 1; i += 2; continue; }
            (b'}', Some(b'}')) if templates > 0 => { templates -= 1; i += 2; continue; }
            (b'|', _) if links == 0 && templates == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Spans of every `{{efn...}}` template in `s`, brace-balanced so nested
/// templates inside a footnote stay inside it.
pub fn footnote_spans(s: &str) -> Vec<Range<usize>> {
    let b = s.as_bytes();
    let mut spans = Vec::new();
    let mut from = 0usize;

    while let Some(rel) = s[from..].find("{{efn") {
        let start = from + rel;
        // `{{efnx` is some other template
        let after = b.get(start + 5).copied();
        if !matches!(after, Some(b'|') | Some(b'-') | Some(b'}') | Some(b' ')) {
            from = start + 5;
            continue;
        }
        let mut depth = 0usize;
        let mut i = start;
        let mut end = None;
        while i + 1 < b.len() {
            match (b[i], b[i + 1]) {
                (b'{', b'{') => { depth += 1; i += 2; }
                (b'}', b'}') => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 { end = Some(i); break; }
                }
                _ => i += 1,
            }
        }
        match end {
            Some(e) => { spans.push(start..e); from = e; }
            None => break, // unterminated; leave it alone
        }
    }
    spans
}

/// All footnotes in `s`, concatenated in order. Empty when there are none.
pub fn footnotes(s: &str) -> String {
    footnote_spans(s).into_iter().map(|r| &s[r]).collect()
}

/// `s` with every footnote template cut out.
pub fn strip_footnotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0usize;
    for r in footnote_spans(s) {
        out.push_str(&s[last..r.start]);
        last = r.end;
    }
    out.push_str(&s[last..]);
    out
}

/// `'''22'''<sup>†</sup>` → `Some("22")`.
pub fn unbold(s: &str) -> Option<&str> {
    let rest = s.trim().strip_prefix("'''")?;
    let close = rest.find("'''")?;
    Some(rest[..close].trim())
}
