//! Heading decision and level assignment for normalized lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::OutlineConfig;
use crate::model::{
    FontProfile, HeadingCandidate, HeadingLevel, LeveledCandidate, PatternKind, PatternMatch,
    TextSpan,
};
use crate::patterns;

pub static PAGE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^page\s+\d+(\s*(of|/)\s*\d+)?$").unwrap());
pub static CAPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(figure|fig\.|table|chart)\s+\d+").unwrap());
pub static URL_OR_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(https?://|www\.|\S+@\S+\.[a-z]{2,})").unwrap());
pub static DOTTED_LEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.\s*){4,}\d*$").unwrap());

/// Why a line was turned down before level assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Bullet list item without heading-sized text.
    BulletedBody,
    /// More words than a heading may have.
    TooLong,
    /// Only digits, typically a page number.
    DigitsOnly,
    /// Page label, caption, link, copyright or table-of-contents row.
    Noise,
}

/// Signals gathered for one line, before the level decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLine {
    pub candidate: HeadingCandidate,
    pub font_score: u8,
    pub pattern: Option<PatternMatch>,
    pub rejection: Option<Rejection>,
}

/// Score one line against the document's font profile.
pub fn score_line(line: &TextSpan, profile: &FontProfile, config: &OutlineConfig) -> ScoredLine {
    let font_score = profile.font_score(line.font_size);
    let pattern = patterns::match_line(&line.text, config.all_caps_max_words);

    let rejection = rejection_for(line, font_score, pattern, config);

    let pattern_score = pattern.map_or(0, |m| m.depth);
    let bold_bonus = if line.is_bold { 0.5 } else { 0.0 };
    let level_hint = match pattern {
        Some(m) if m.kind.is_numbering() => m.depth,
        _ if font_score > 0 => 4 - font_score,
        Some(m) => m.depth,
        None => 0,
    };

    ScoredLine {
        candidate: HeadingCandidate {
            text: clean_heading_text(&line.text),
            page: line.page,
            order: line.order,
            font_size: line.font_size,
            is_bold: line.is_bold,
            level_hint,
            score: font_score as f64 + bold_bonus + pattern_score as f64,
            matched_pattern: pattern.map(|m| m.kind),
        },
        font_score,
        pattern,
        rejection,
    }
}

fn rejection_for(
    line: &TextSpan,
    font_score: u8,
    pattern: Option<PatternMatch>,
    config: &OutlineConfig,
) -> Option<Rejection> {
    if matches!(pattern, Some(m) if m.kind == PatternKind::Bullet) && font_score == 0 {
        return Some(Rejection::BulletedBody);
    }

    if line.word_count() > config.max_heading_words {
        return Some(Rejection::TooLong);
    }

    if is_digits_only(&line.text) {
        return Some(Rejection::DigitsOnly);
    }

    if is_excluded_text(&line.text) {
        return Some(Rejection::Noise);
    }

    None
}

fn is_digits_only(text: &str) -> bool {
    let mut digits = text.chars().filter(|c| !c.is_whitespace()).peekable();
    digits.peek().is_some() && digits.all(|c| c.is_ascii_digit())
}

/// Lines that are never headings regardless of how they are set.
pub fn is_excluded_text(line: &str) -> bool {
    let line_lower = line.to_lowercase();

    if line_lower.starts_with('©') || line_lower.starts_with("copyright") {
        return true;
    }

    if (line.starts_with('(') && line.ends_with(')'))
        || (line.starts_with('[') && line.ends_with(']'))
    {
        return true;
    }

    PAGE_LABEL.is_match(line)
        || CAPTION.is_match(line)
        || URL_OR_EMAIL.is_match(line)
        || DOTTED_LEADER.is_match(line)
}

/// Heading text as it appears in the outline: trailing colon removed.
pub fn clean_heading_text(text: &str) -> String {
    let text = text.trim();
    let cleaned = match text.strip_suffix(':') {
        Some(stripped) if !text.ends_with("::") => stripped.trim_end(),
        _ => text,
    };
    cleaned.to_string()
}

/// Score every line in document order and keep the ones that are headings.
///
/// Lines are judged independently except for one lookback: an all-caps line
/// set in body size is only promoted to H1 while no numbered H1 in the
/// largest heading tier has been accepted before it.
pub fn assign_levels(
    lines: &[TextSpan],
    profile: &FontProfile,
    config: &OutlineConfig,
) -> Vec<LeveledCandidate> {
    let mut accepted = Vec::new();
    let mut numbered_h1_in_largest_tier = false;

    for line in lines {
        let scored = score_line(line, profile, config);
        if let Some(reason) = scored.rejection {
            log::trace!("Rejected {:?} ({:?})", scored.candidate.text, reason);
            continue;
        }

        let Some(level) = decide_level(&scored, numbered_h1_in_largest_tier) else {
            continue;
        };
        log::trace!(
            "{} {:?} (pattern {})",
            level,
            scored.candidate.text,
            scored.pattern.map_or("none", |m| m.kind.as_str())
        );

        let numbered = scored.pattern.is_some_and(|m| m.kind.is_numbering());
        if numbered && level == HeadingLevel::H1 && profile.tier_rank(line.font_size) == Some(1) {
            numbered_h1_in_largest_tier = true;
        }

        if scored.candidate.text.is_empty() {
            continue;
        }

        accepted.push(LeveledCandidate {
            candidate: scored.candidate,
            level,
        });
    }

    log::debug!(
        "Accepted {} of {} lines as headings",
        accepted.len(),
        lines.len()
    );
    accepted
}

fn decide_level(scored: &ScoredLine, numbered_h1_in_largest_tier: bool) -> Option<HeadingLevel> {
    match scored.pattern {
        Some(m) if m.kind.is_numbering() => return HeadingLevel::from_depth(m.depth),
        _ => {}
    }

    if scored.font_score > 0 {
        return HeadingLevel::from_depth(4 - scored.font_score);
    }

    match scored.pattern {
        Some(m) if m.kind == PatternKind::AllCapsShort && !numbered_h1_in_largest_tier => {
            Some(HeadingLevel::H1)
        }
        _ => None,
    }
}
