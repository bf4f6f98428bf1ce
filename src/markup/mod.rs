// src/markup/mod.rs
//! The statistics section of a page: render, recover annotations, re-apply,
//! splice.
pub mod apply;
pub mod extract;
pub mod render;
pub mod section;
pub mod table;

pub use apply::apply_special_formatting;
pub use extract::{extract_special_formatting, LeadingStat, SpecialFormatting, SpecialYear};
pub use render::{render_statistics, AsOf, RenderError, RenderInput};
pub use section::{find_notes, find_statistics, splice_section};

/// Merge a freshly rendered statistics `block` into `old`, keeping any
/// annotations the old section carried.
pub fn update_statistics(old: &str, block: &str) -> String {
    let fmt = extract_special_formatting(old);
    if !fmt.is_empty() {
        logd!(
            "Re-applying {} leading-stat season(s), {} special year(s), {} note(s)",
            fmt.leading_stats.len(),
            fmt.special_years.len(),
            fmt.notes.len()
        );
    }
    let annotated = apply_special_formatting(block, &fmt);
    splice_section(old, &annotated)
}
