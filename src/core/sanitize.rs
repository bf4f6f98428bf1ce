// src/core/sanitize.rs

/// Blank or whitespace-only cells become `"0"`; everything else is trimmed.
pub fn blank_to_zero(cell: &str) -> String {
    let t = cell.trim();
    if t.is_empty() { s!("0") } else { s!(t) }
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Source slugs look like `Dustin_Martin`; page titles use spaces.
pub fn display_name(slug: &str) -> String {
    normalize_ws(&slug.replace('_', " "))
}

/// Page title → file stem that is safe on every platform we run on.
pub fn sanitize_page_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    let out = out.trim().trim_matches('.').to_string();
    if out.is_empty() { s!("page") } else { out }
}
