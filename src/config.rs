//! Tunable thresholds for the heuristic stages.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Thresholds used by the normalizer, profiler, scorer and assembler.
///
/// Every field defaults to the value the heuristics were calibrated with;
/// a JSON config file only needs to name the fields it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Font sizes are rounded to a multiple of this before tallying.
    pub size_rounding: f64,

    /// Sizes within this band of a tier representative join that tier.
    pub tier_tolerance: f64,

    /// Number of heading tiers kept; smaller sizes collapse into the last one.
    pub max_heading_tiers: usize,

    /// Lines with more words than this are body text.
    pub max_heading_words: usize,

    /// Upper word count for the all-caps pattern.
    pub all_caps_max_words: usize,

    /// Distinct pages a repeated line must appear on to count as boilerplate.
    pub boilerplate_min_pages: usize,

    /// Vertical band (page units) within which repeated lines share a position.
    pub boilerplate_y_tolerance: f64,

    /// Largest horizontal gap between merged spans, as a multiple of font size.
    pub merge_gap_factor: f64,

    /// Distinct pages a heading text may appear on before later copies are dropped.
    pub max_text_recurrence: usize,

    /// First-page lines longer than this are never taken as the title.
    pub max_title_words: usize,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            size_rounding: 0.5,
            tier_tolerance: 0.5,
            max_heading_tiers: 3,
            max_heading_words: 20,
            all_caps_max_words: 8,
            boilerplate_min_pages: 3,
            boilerplate_y_tolerance: 3.0,
            merge_gap_factor: 1.0,
            max_text_recurrence: 2,
            max_title_words: 30,
        }
    }
}

impl OutlineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a (possibly partial) config from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: OutlineConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_tier_tolerance(mut self, tolerance: f64) -> Self {
        self.tier_tolerance = tolerance;
        self
    }

    pub fn with_max_heading_tiers(mut self, tiers: usize) -> Self {
        self.max_heading_tiers = tiers;
        self
    }

    pub fn with_max_heading_words(mut self, words: usize) -> Self {
        self.max_heading_words = words;
        self
    }

    pub fn with_boilerplate_min_pages(mut self, pages: usize) -> Self {
        self.boilerplate_min_pages = pages;
        self
    }

    pub fn with_max_text_recurrence(mut self, count: usize) -> Self {
        self.max_text_recurrence = count;
        self
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("size_rounding", self.size_rounding),
            ("boilerplate_y_tolerance", self.boilerplate_y_tolerance),
            ("merge_gap_factor", self.merge_gap_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if !(self.tier_tolerance.is_finite() && self.tier_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tier_tolerance must not be negative, got {}",
                self.tier_tolerance
            )));
        }

        let non_zero = [
            ("max_heading_tiers", self.max_heading_tiers),
            ("max_heading_words", self.max_heading_words),
            ("all_caps_max_words", self.all_caps_max_words),
            ("boilerplate_min_pages", self.boilerplate_min_pages),
            ("max_text_recurrence", self.max_text_recurrence),
            ("max_title_words", self.max_title_words),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OutlineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_heading_words, 20);
        assert_eq!(config.max_heading_tiers, 3);
        assert_eq!(config.tier_tolerance, 0.5);
    }

    #[test]
    fn test_builder() {
        let config = OutlineConfig::new()
            .with_max_heading_words(12)
            .with_max_heading_tiers(2)
            .with_boilerplate_min_pages(4);
        assert_eq!(config.max_heading_words, 12);
        assert_eq!(config.max_heading_tiers, 2);
        assert_eq!(config.boilerplate_min_pages, 4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: OutlineConfig = serde_json::from_str(r#"{"max_heading_words": 15}"#).unwrap();
        assert_eq!(config.max_heading_words, 15);
        assert_eq!(config.boilerplate_min_pages, 3);
    }

    #[test]
    fn test_validate_rejects_zero_tiers() {
        let config = OutlineConfig::new().with_max_heading_tiers(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_negative_tolerance() {
        let config = OutlineConfig::new().with_tier_tolerance(-1.0);
        assert!(config.validate().is_err());
    }
}
