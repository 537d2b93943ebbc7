//! Document-wide font size statistics.

use std::collections::BTreeMap;

use crate::config::OutlineConfig;
use crate::model::{FontProfile, SizeKey, TextSpan};

const EPSILON: f64 = 1e-9;

/// Round a font size to the nearest multiple of `step`.
pub fn round_size(size: f64, step: f64) -> f64 {
    (size / step).round() * step
}

fn size_key(size: f64, step: f64) -> SizeKey {
    (size / step).round() as SizeKey
}

/// Build the font profile of a normalized document.
///
/// Occurrences are weighted by non-whitespace character count so that a
/// handful of short, large lines cannot outvote the body text.
pub fn build_profile(lines: &[TextSpan], config: &OutlineConfig) -> FontProfile {
    let step = config.size_rounding;
    let mut histogram: BTreeMap<SizeKey, usize> = BTreeMap::new();

    for line in lines {
        let weight = line.text.chars().filter(|c| !c.is_whitespace()).count();
        *histogram.entry(size_key(line.font_size, step)).or_insert(0) += weight;
    }

    // Ties go to the smaller size.
    let body_key = histogram
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(key, _)| *key);

    let Some(body_key) = body_key else {
        return FontProfile {
            tier_tolerance: config.tier_tolerance,
            size_rounding: step,
            ..FontProfile::default()
        };
    };

    let mut tiers: Vec<f64> = Vec::new();
    for key in histogram.keys().rev().filter(|key| **key > body_key) {
        let size = *key as f64 * step;
        match tiers.last() {
            Some(representative) if representative - size <= config.tier_tolerance + EPSILON => {}
            _ => tiers.push(size),
        }
    }
    tiers.truncate(config.max_heading_tiers);

    let profile = FontProfile {
        size_histogram: histogram,
        body_size: body_key as f64 * step,
        heading_size_tiers: tiers,
        tier_tolerance: config.tier_tolerance,
        size_rounding: step,
    };
    log::debug!(
        "Font profile: body size {}, heading tiers {:?}",
        profile.body_size,
        profile.heading_size_tiers
    );
    profile
}

impl FontProfile {
    /// 1-based heading tier of a font size, `None` for body-sized text.
    ///
    /// Sizes smaller than the last retained tier but above body size fall
    /// into that last tier.
    pub fn tier_rank(&self, font_size: f64) -> Option<usize> {
        if self.heading_size_tiers.is_empty() {
            return None;
        }

        let rounded = round_size(font_size, self.size_rounding);
        if rounded <= self.body_size + EPSILON {
            return None;
        }

        let rank = self
            .heading_size_tiers
            .iter()
            .position(|tier| rounded >= tier - self.tier_tolerance - EPSILON)
            .unwrap_or(self.heading_size_tiers.len() - 1);
        Some(rank + 1)
    }

    /// Font signal in `0..=3`: 3 for the largest tier, 0 for body text.
    pub fn font_score(&self, font_size: f64) -> u8 {
        match self.tier_rank(font_size) {
            Some(rank) => 3u8.saturating_sub(rank.min(3) as u8 - 1),
            None => 0,
        }
    }
}
