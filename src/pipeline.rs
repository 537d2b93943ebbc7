//! The per-document pipeline: normalize, profile, title, score, assemble.

use crate::assembler::assemble;
use crate::config::OutlineConfig;
use crate::error::{Error, Result};
use crate::font_profile::build_profile;
use crate::model::{DocumentInput, Outline, TextSpan};
use crate::normalize::{is_well_formed, normalize_spans};
use crate::scorer::assign_levels;
use crate::title::extract_title;

/// Extract the outline of one document.
///
/// Fails only when the spans are not in ascending `(page, order)` sequence;
/// every well-ordered input, including an empty one, yields an outline.
pub fn extract_outline(input: &DocumentInput, config: &OutlineConfig) -> Result<Outline> {
    validate_order(&input.spans)?;

    let lines = normalize_spans(&input.spans, config);
    let profile = build_profile(&lines, config);
    let title = extract_title(input.metadata_title.as_deref(), &lines, &profile, config);
    let leveled = assign_levels(&lines, &profile, config);
    let entries = assemble(&leveled, &title, config);

    log::debug!(
        "Outline: title {:?} ({:?}), {} entries",
        title.text,
        title.source,
        entries.len()
    );
    Ok(Outline { title, entries })
}

/// Check that pages ascend and that `order` strictly ascends within a page.
///
/// Malformed spans are skipped; the normalizer drops them anyway.
pub fn validate_order(spans: &[TextSpan]) -> Result<()> {
    let mut last: Option<&TextSpan> = None;
    for current in spans.iter().filter(|span| is_well_formed(span)) {
        let Some(previous) = last.replace(current) else {
            continue;
        };
        let in_order = current.page > previous.page
            || (current.page == previous.page && current.order > previous.order);
        if !in_order {
            return Err(Error::InvalidInputOrder {
                page: current.page,
                order: current.order,
                previous_page: previous.page,
                previous_order: previous.order,
            });
        }
    }
    Ok(())
}
