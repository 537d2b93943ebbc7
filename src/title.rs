//! Document title selection.

use crate::config::OutlineConfig;
use crate::font_profile::round_size;
use crate::model::{FontProfile, PatternKind, TextSpan, TitleResult, TitleSource};
use crate::normalize::collapse_whitespace;
use crate::patterns;
use crate::scorer::is_excluded_text;

/// Pick the document title.
///
/// Tried in order: the metadata title, then the largest heading-sized line on
/// page 1 that is neither a bullet nor a numbered heading. When neither
/// exists the result has source [`TitleSource::None`] and empty text.
pub fn extract_title(
    metadata_title: Option<&str>,
    lines: &[TextSpan],
    profile: &FontProfile,
    config: &OutlineConfig,
) -> TitleResult {
    if let Some(title) = metadata_title
        .map(collapse_whitespace)
        .filter(|title| !title.is_empty())
    {
        return TitleResult {
            text: title,
            source: TitleSource::Metadata,
            line: None,
        };
    }

    first_page_title(lines, profile, config).unwrap_or_else(TitleResult::none)
}

fn first_page_title(
    lines: &[TextSpan],
    profile: &FontProfile,
    config: &OutlineConfig,
) -> Option<TitleResult> {
    let mut best: Option<&TextSpan> = None;

    for line in lines.iter().filter(|line| line.page == 1) {
        if !is_title_eligible(line, profile, config) {
            continue;
        }

        // Earliest line wins among equal sizes.
        let size = round_size(line.font_size, profile.size_rounding);
        match best {
            Some(current) if size <= round_size(current.font_size, profile.size_rounding) => {}
            _ => best = Some(line),
        }
    }

    best.map(|line| TitleResult {
        text: line.text.clone(),
        source: TitleSource::FirstPageHeuristic,
        line: Some(line.position()),
    })
}

fn is_title_eligible(line: &TextSpan, profile: &FontProfile, config: &OutlineConfig) -> bool {
    if profile.tier_rank(line.font_size).is_none() {
        return false;
    }

    if line.word_count() > config.max_title_words || is_excluded_text(&line.text) {
        return false;
    }

    match patterns::match_line(&line.text, config.all_caps_max_words) {
        Some(m) => m.kind != PatternKind::Bullet && !m.kind.is_numbering(),
        None => true,
    }
}
