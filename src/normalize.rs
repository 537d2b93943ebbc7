//! Span cleanup: whitespace, malformed spans, line merging and running
//! headers/footers.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::OutlineConfig;
use crate::font_profile::round_size;
use crate::model::TextSpan;

/// Clean the raw span sequence of a document.
///
/// The output keeps the input order. Each returned span is one logical line
/// fragment: trimmed, whitespace-collapsed, merged with same-style neighbours
/// on its line, and free of punctuation-only text and boilerplate.
pub fn normalize_spans(spans: &[TextSpan], config: &OutlineConfig) -> Vec<TextSpan> {
    let mut malformed = 0usize;
    let cleaned: Vec<TextSpan> = spans
        .iter()
        .filter_map(|span| {
            if !is_well_formed(span) {
                malformed += 1;
                return None;
            }
            clean_span(span)
        })
        .collect();

    if malformed > 0 {
        log::warn!("Dropped {} malformed spans", malformed);
    }

    let merged = merge_line_fragments(cleaned, config);
    let lines: Vec<TextSpan> = merged
        .into_iter()
        .filter(|span| !is_punctuation_only(&span.text))
        .collect();

    let lines = remove_boilerplate(lines, config);
    log::debug!(
        "Normalized {} raw spans into {} lines",
        spans.len(),
        lines.len()
    );
    lines
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the text has no letters or digits at all.
pub fn is_punctuation_only(text: &str) -> bool {
    !text.chars().any(char::is_alphanumeric)
}

/// Spans with a page number, a positive finite size and a finite box.
/// Anything else is dropped before any other processing.
pub fn is_well_formed(span: &TextSpan) -> bool {
    span.page >= 1
        && span.font_size.is_finite()
        && span.font_size > 0.0
        && span.bounding_box.is_finite()
}

fn clean_span(span: &TextSpan) -> Option<TextSpan> {
    let text = collapse_whitespace(&span.text);
    if text.is_empty() {
        return None;
    }

    Some(TextSpan {
        text,
        bounding_box: span.bounding_box.normalized(),
        ..span.clone()
    })
}

/// Join consecutive spans that continue the same line in the same style.
fn merge_line_fragments(spans: Vec<TextSpan>, config: &OutlineConfig) -> Vec<TextSpan> {
    let mut lines: Vec<TextSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        match lines.last_mut() {
            Some(line) if continues_line(line, &span, config) => {
                line.text.push(' ');
                line.text.push_str(&span.text);
                line.bounding_box = line.bounding_box.union(&span.bounding_box);
                line.is_italic = line.is_italic && span.is_italic;
            }
            _ => lines.push(span),
        }
    }

    lines
}

fn continues_line(line: &TextSpan, next: &TextSpan, config: &OutlineConfig) -> bool {
    if line.page != next.page || line.is_bold != next.is_bold {
        return false;
    }

    if round_size(line.font_size, config.size_rounding)
        != round_size(next.font_size, config.size_rounding)
    {
        return false;
    }

    if !line.bounding_box.overlaps_vertically(&next.bounding_box) {
        return false;
    }

    let gap = line.bounding_box.horizontal_gap_to(&next.bounding_box);
    let max_gap = config.merge_gap_factor * line.font_size;
    gap >= -max_gap && gap <= max_gap
}

/// Drop every occurrence of text that repeats at one vertical position on
/// enough distinct pages to be a running header or footer.
fn remove_boilerplate(lines: Vec<TextSpan>, config: &OutlineConfig) -> Vec<TextSpan> {
    let mut positions: HashMap<&str, Vec<(usize, f64)>> = HashMap::new();
    for line in &lines {
        positions
            .entry(line.text.as_str())
            .or_default()
            .push((line.page, line.bounding_box.y0));
    }

    let boilerplate: HashSet<String> = positions
        .into_iter()
        .filter(|(_, occurrences)| repeats_at_same_position(occurrences, config))
        .map(|(text, _)| text.to_string())
        .collect();

    if boilerplate.is_empty() {
        return lines;
    }

    log::debug!("Removing {} boilerplate lines", boilerplate.len());
    lines
        .into_iter()
        .filter(|line| !boilerplate.contains(&line.text))
        .collect()
}

fn repeats_at_same_position(occurrences: &[(usize, f64)], config: &OutlineConfig) -> bool {
    if occurrences.len() < config.boilerplate_min_pages {
        return false;
    }

    occurrences.iter().any(|&(_, anchor)| {
        let pages: BTreeSet<usize> = occurrences
            .iter()
            .filter(|(_, y)| (y - anchor).abs() <= config.boilerplate_y_tolerance)
            .map(|(page, _)| *page)
            .collect();
        pages.len() >= config.boilerplate_min_pages
    })
}
