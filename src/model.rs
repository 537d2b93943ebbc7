//! Value records passed between the pipeline stages.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Same box with `x0 <= x1` and `y0 <= y1`.
    pub fn normalized(&self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    /// Whether the vertical extents of the two boxes intersect.
    pub fn overlaps_vertically(&self, other: &BoundingBox) -> bool {
        self.y0.max(other.y0) < self.y1.min(other.y1)
    }

    /// Horizontal distance from the right edge of `self` to the left edge of `other`.
    /// Negative when the boxes overlap.
    pub fn horizontal_gap_to(&self, other: &BoundingBox) -> f64 {
        other.x0 - self.x1
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A contiguous run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// 1-based page number.
    pub page: usize,
    /// Zero or missing sizes mark the span as malformed.
    #[serde(default)]
    pub font_size: f64,
    #[serde(default)]
    pub font_name: String,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(rename = "bbox")]
    pub bounding_box: BoundingBox,
    /// Extraction sequence within the page.
    pub order: usize,
}

impl TextSpan {
    /// Create a span, deriving weight and style from the font name.
    pub fn new(
        text: impl Into<String>,
        page: usize,
        font_size: f64,
        font_name: impl Into<String>,
        bounding_box: BoundingBox,
        order: usize,
    ) -> Self {
        let font_name = font_name.into();
        let (is_bold, is_italic) = analyze_font_style(&font_name);
        Self {
            text: text.into(),
            page,
            font_size,
            font_name,
            is_bold,
            is_italic,
            bounding_box,
            order,
        }
    }

    pub fn with_bold(mut self, is_bold: bool) -> Self {
        self.is_bold = is_bold;
        self
    }

    /// Position key used for ordering checks.
    pub fn position(&self) -> (usize, usize) {
        (self.page, self.order)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Infer bold/italic flags from a font name such as `Helvetica-BoldOblique`.
pub fn analyze_font_style(font_name: &str) -> (bool, bool) {
    let font_lower = font_name.to_lowercase();

    let is_bold = font_lower.contains("bold")
        || font_lower.contains("black")
        || font_lower.contains("heavy")
        || font_lower.contains("semibold");

    let is_italic = font_lower.contains("italic") || font_lower.contains("oblique");

    (is_bold, is_italic)
}

/// Font size expressed in half-point steps, the unit the profiler tallies in.
pub type SizeKey = i64;

/// Document-wide font statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontProfile {
    /// Character-weighted occurrences per rounded size.
    pub size_histogram: BTreeMap<SizeKey, usize>,
    /// Modal (character-weighted) rounded size; `0.0` for an empty document.
    pub body_size: f64,
    /// Tier representatives larger than `body_size`, largest first.
    pub heading_size_tiers: Vec<f64>,
    /// Merge band used when the tiers were built.
    pub tier_tolerance: f64,
    /// Rounding step used when the histogram was built.
    pub size_rounding: f64,
}

/// Final heading level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map a 1-based depth onto a level, capping at H3. Depth 0 has no level.
    pub fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            0 => None,
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            _ => Some(HeadingLevel::H3),
        }
    }

    pub fn depth(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.depth())
    }
}

/// Structural pattern recognised in a line's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    NumberedDecimal,
    RomanUpper,
    LetteredItem,
    Bullet,
    AllCapsShort,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::NumberedDecimal => "numbered-decimal",
            PatternKind::RomanUpper => "roman-upper",
            PatternKind::LetteredItem => "lettered-item",
            PatternKind::Bullet => "bullet",
            PatternKind::AllCapsShort => "all-caps-short",
        }
    }

    /// Numbering families whose depth decides the level outright.
    pub fn is_numbering(&self) -> bool {
        matches!(
            self,
            PatternKind::NumberedDecimal | PatternKind::RomanUpper | PatternKind::LetteredItem
        )
    }
}

/// Result of matching one line against the pattern families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub kind: PatternKind,
    /// 1..=3 for heading families, 0 for bullets.
    pub depth: u8,
}

/// A line considered for heading status.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    pub text: String,
    pub page: usize,
    pub order: usize,
    pub font_size: f64,
    pub is_bold: bool,
    /// Level suggested by the raw signals before the final decision.
    pub level_hint: u8,
    /// Tier score plus pattern depth; bold adds 0.5.
    pub score: f64,
    pub matched_pattern: Option<PatternKind>,
}

/// A candidate that survived scoring, with its final level.
#[derive(Debug, Clone, PartialEq)]
pub struct LeveledCandidate {
    pub candidate: HeadingCandidate,
    pub level: HeadingLevel,
}

/// One accepted outline heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

/// Where the document title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TitleSource {
    Metadata,
    FirstPageHeuristic,
    #[default]
    None,
}

/// The document title, kept apart from the heading entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TitleResult {
    pub text: String,
    pub source: TitleSource,
    /// `(page, order)` of the line the title was taken from, if any.
    #[serde(skip)]
    pub line: Option<(usize, usize)>,
}

impl TitleResult {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Everything the engine consumes for one document.
///
/// As a JSON span dump, `spans` is required and unknown keys are errors, so
/// an outline file or a config file is never read as an empty document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentInput {
    #[serde(default)]
    pub metadata_title: Option<String>,
    pub spans: Vec<TextSpan>,
}

impl DocumentInput {
    pub fn new(spans: Vec<TextSpan>) -> Self {
        Self {
            metadata_title: None,
            spans,
        }
    }

    pub fn with_metadata_title(mut self, title: impl Into<String>) -> Self {
        self.metadata_title = Some(title.into());
        self
    }
}

/// The structured result for one document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub title: TitleResult,
    pub entries: Vec<OutlineEntry>,
}

impl Outline {
    /// Serializable view in the `{"title", "outline"}` file format.
    pub fn to_record(&self) -> OutlineRecord<'_> {
        OutlineRecord {
            title: &self.title.text,
            outline: &self.entries,
        }
    }
}

/// On-disk shape of an outline.
#[derive(Debug, Serialize)]
pub struct OutlineRecord<'a> {
    pub title: &'a str,
    pub outline: &'a [OutlineEntry],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_style_from_name() {
        assert_eq!(analyze_font_style("Helvetica-BoldOblique"), (true, true));
        assert_eq!(analyze_font_style("Arial-Black"), (true, false));
        assert_eq!(analyze_font_style("Times-Roman"), (false, false));
    }

    #[test]
    fn test_level_from_depth_caps_at_h3() {
        assert_eq!(HeadingLevel::from_depth(0), None);
        assert_eq!(HeadingLevel::from_depth(1), Some(HeadingLevel::H1));
        assert_eq!(HeadingLevel::from_depth(5), Some(HeadingLevel::H3));
        assert_eq!(HeadingLevel::H2.to_string(), "H2");
    }

    #[test]
    fn test_bbox_overlap_and_gap() {
        let a = BoundingBox::new(0.0, 100.0, 50.0, 112.0);
        let b = BoundingBox::new(52.0, 101.0, 90.0, 113.0);
        let c = BoundingBox::new(0.0, 80.0, 50.0, 92.0);
        assert!(a.overlaps_vertically(&b));
        assert!(!a.overlaps_vertically(&c));
        assert_eq!(a.horizontal_gap_to(&b), 2.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 100.0, 90.0, 113.0));
    }

    #[test]
    fn test_record_serialization() {
        let outline = Outline {
            title: TitleResult {
                text: "Report".to_string(),
                source: TitleSource::Metadata,
                line: None,
            },
            entries: vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "1. Scope".to_string(),
                page: 2,
            }],
        };
        let json = serde_json::to_string(&outline.to_record()).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Report","outline":[{"level":"H1","text":"1. Scope","page":2}]}"#
        );
    }

    #[test]
    fn test_span_dump_defaults() {
        let json = r#"{"spans":[{"text":"Hi","page":1,"bbox":{"x0":0,"y0":0,"x1":1,"y1":1},"order":0}]}"#;
        let input: DocumentInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.metadata_title, None);
        assert_eq!(input.spans[0].font_size, 0.0);
    }

    #[test]
    fn test_outline_file_is_not_a_span_dump() {
        let outline = r#"{"title":"Quarterly Report","outline":[{"level":"H1","text":"1. Spending","page":1}]}"#;
        assert!(serde_json::from_str::<DocumentInput>(outline).is_err());
        assert!(serde_json::from_str::<DocumentInput>(r#"{"max_heading_words": 12}"#).is_err());
        assert!(serde_json::from_str::<DocumentInput>("{}").is_err());
    }
}
