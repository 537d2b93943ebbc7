//! Structural text cues: numbering, bullets and all-caps lines.
//!
//! Families are tried in a fixed priority order and the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{PatternKind, PatternMatch};

pub static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)((?:\.\d+)*)\.?\s+\S").unwrap());
pub static ROMAN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[IVXLCDM]+\.\s+\S").unwrap());
pub static LETTERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]\.\s+\S").unwrap());
pub static BULLET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[•\-*]\s+\S").unwrap());

/// Deepest level a numbering prefix can imply.
const MAX_DEPTH: u8 = 3;

/// Match a normalized line against the pattern families.
///
/// `all_caps_max_words` bounds the all-caps family; everything else is fixed.
pub fn match_line(text: &str, all_caps_max_words: usize) -> Option<PatternMatch> {
    let text = text.trim();

    if let Some(caps) = NUMBERED_HEADING.captures(text) {
        let sub_levels = caps
            .get(2)
            .map_or(0, |m| m.as_str().matches('.').count());
        let depth = (1 + sub_levels).min(MAX_DEPTH as usize) as u8;
        return Some(PatternMatch {
            kind: PatternKind::NumberedDecimal,
            depth,
        });
    }

    if ROMAN_HEADING.is_match(text) {
        return Some(PatternMatch {
            kind: PatternKind::RomanUpper,
            depth: 1,
        });
    }

    if LETTERED_HEADING.is_match(text) {
        return Some(PatternMatch {
            kind: PatternKind::LetteredItem,
            depth: 2,
        });
    }

    if BULLET_LINE.is_match(text) {
        return Some(PatternMatch {
            kind: PatternKind::Bullet,
            depth: 0,
        });
    }

    if is_all_caps_short(text, all_caps_max_words) {
        return Some(PatternMatch {
            kind: PatternKind::AllCapsShort,
            depth: 1,
        });
    }

    None
}

/// Uppercase letters, digits and punctuation only, with at least one letter.
pub fn is_all_caps_short(text: &str, max_words: usize) -> bool {
    let word_count = text.split_whitespace().count();
    if word_count == 0 || word_count > max_words {
        return false;
    }

    let mut has_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if !c.is_uppercase() {
                return false;
            }
            has_letter = true;
        }
    }
    has_letter
}
