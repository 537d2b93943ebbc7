//! Final outline assembly: title exclusion and duplicate suppression.

use std::collections::{BTreeSet, HashMap};

use crate::config::OutlineConfig;
use crate::model::{LeveledCandidate, OutlineEntry, TitleResult, TitleSource};

/// Turn leveled candidates into outline entries.
///
/// Document order is kept as delivered; this stage only filters. It drops
/// the line the title was taken from, copies of a heading text beyond
/// `max_text_recurrence` distinct pages, and consecutive repeats of the same
/// `(text, page)`.
pub fn assemble(
    leveled: &[LeveledCandidate],
    title: &TitleResult,
    config: &OutlineConfig,
) -> Vec<OutlineEntry> {
    let mut pages_by_text: HashMap<&str, BTreeSet<usize>> = HashMap::new();
    let mut entries: Vec<OutlineEntry> = Vec::with_capacity(leveled.len());

    for item in leveled {
        let candidate = &item.candidate;
        if candidate.text.is_empty() || is_title_line(item, title) {
            continue;
        }

        let pages = pages_by_text.entry(candidate.text.as_str()).or_default();
        if !pages.contains(&candidate.page) && pages.len() >= config.max_text_recurrence {
            log::debug!(
                "Dropping recurring heading {:?} on page {}",
                candidate.text,
                candidate.page
            );
            continue;
        }
        pages.insert(candidate.page);

        let repeats_previous = entries
            .last()
            .is_some_and(|last| last.text == candidate.text && last.page == candidate.page);
        if repeats_previous {
            continue;
        }

        entries.push(OutlineEntry {
            level: item.level,
            text: candidate.text.clone(),
            page: candidate.page,
        });
    }

    entries
}

fn is_title_line(leveled: &LeveledCandidate, title: &TitleResult) -> bool {
    let candidate = &leveled.candidate;
    match title.source {
        TitleSource::FirstPageHeuristic => {
            title.line == Some((candidate.page, candidate.order))
        }
        TitleSource::Metadata => {
            candidate.page == 1 && candidate.text.eq_ignore_ascii_case(&title.text)
        }
        TitleSource::None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingCandidate, HeadingLevel};

    fn leveled(text: &str, page: usize, order: usize, level: HeadingLevel) -> LeveledCandidate {
        LeveledCandidate {
            candidate: HeadingCandidate {
                text: text.to_string(),
                page,
                order,
                font_size: 16.0,
                is_bold: false,
                level_hint: level.depth(),
                score: 2.0,
                matched_pattern: None,
            },
            level,
        }
    }

    fn texts(entries: &[OutlineEntry]) -> Vec<(&str, usize)> {
        entries.iter().map(|e| (e.text.as_str(), e.page)).collect()
    }

    #[test]
    fn test_consecutive_duplicates_collapse() {
        let input = vec![
            leveled("Overview", 1, 0, HeadingLevel::H1),
            leveled("Overview", 1, 1, HeadingLevel::H1),
            leveled("Scope", 1, 2, HeadingLevel::H2),
        ];
        let entries = assemble(&input, &TitleResult::none(), &OutlineConfig::default());
        assert_eq!(texts(&entries), vec![("Overview", 1), ("Scope", 1)]);
    }

    #[test]
    fn test_recurrence_beyond_second_page_dropped() {
        let input: Vec<_> = (1..=5)
            .map(|page| leveled("Summary", page, 0, HeadingLevel::H2))
            .collect();
        let entries = assemble(&input, &TitleResult::none(), &OutlineConfig::default());
        assert_eq!(texts(&entries), vec![("Summary", 1), ("Summary", 2)]);
    }

    #[test]
    fn test_recurrence_limit_is_configurable() {
        let input: Vec<_> = (1..=5)
            .map(|page| leveled("Summary", page, 0, HeadingLevel::H2))
            .collect();
        let config = OutlineConfig::new().with_max_text_recurrence(4);
        assert_eq!(assemble(&input, &TitleResult::none(), &config).len(), 4);
    }

    #[test]
    fn test_first_page_title_line_excluded() {
        let input = vec![
            leveled("Project Charter", 1, 0, HeadingLevel::H1),
            leveled("1. Introduction", 1, 1, HeadingLevel::H1),
        ];
        let title = TitleResult {
            text: "Project Charter".to_string(),
            source: TitleSource::FirstPageHeuristic,
            line: Some((1, 0)),
        };
        let entries = assemble(&input, &title, &OutlineConfig::default());
        assert_eq!(texts(&entries), vec![("1. Introduction", 1)]);
    }

    #[test]
    fn test_metadata_title_match_excluded_on_first_page_only() {
        let input = vec![
            leveled("ANNUAL REPORT", 1, 0, HeadingLevel::H1),
            leveled("Annual Report", 3, 0, HeadingLevel::H1),
        ];
        let title = TitleResult {
            text: "Annual Report".to_string(),
            source: TitleSource::Metadata,
            line: None,
        };
        let entries = assemble(&input, &title, &OutlineConfig::default());
        assert_eq!(texts(&entries), vec![("Annual Report", 3)]);
    }

    #[test]
    fn test_order_is_preserved() {
        let input = vec![
            leveled("B", 1, 0, HeadingLevel::H1),
            leveled("A", 1, 1, HeadingLevel::H2),
            leveled("C", 2, 0, HeadingLevel::H1),
        ];
        let entries = assemble(&input, &TitleResult::none(), &OutlineConfig::default());
        assert_eq!(texts(&entries), vec![("B", 1), ("A", 1), ("C", 2)]);
        assert_eq!(entries[1].level, HeadingLevel::H2);
    }

    #[test]
    fn test_empty_text_never_emitted() {
        let input = vec![leveled("", 1, 0, HeadingLevel::H1)];
        assert!(assemble(&input, &TitleResult::none(), &OutlineConfig::default()).is_empty());
    }
}
