//! # pdf-outline
//!
//! Heuristic heading classification for PDF documents.
//!
//! Given the positioned, styled text spans of a document, the engine picks a
//! title and classifies lines into a three-level (H1–H3) outline with page
//! numbers. It uses font-size tiers relative to the body text, numbering
//! patterns, and a few layout cues. No ML models are involved.
//!
//! ```no_run
//! use pdf_outline::{extract, extract_outline, OutlineConfig};
//!
//! fn main() -> pdf_outline::Result<()> {
//!     let input = extract::load_pdf("report.pdf")?;
//!     let outline = extract_outline(&input, &OutlineConfig::default())?;
//!     for entry in &outline.entries {
//!         println!("{} {} (p. {})", entry.level, entry.text, entry.page);
//!     }
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod font_profile;
pub mod model;
pub mod normalize;
pub mod patterns;
pub mod pipeline;
pub mod scorer;
pub mod title;

pub use batch::{process_directory, process_file, write_outline, BatchOptions, BatchReport};
pub use config::OutlineConfig;
pub use error::{Error, Result};
pub use model::{
    BoundingBox, DocumentInput, FontProfile, HeadingCandidate, HeadingLevel, Outline,
    OutlineEntry, PatternKind, PatternMatch, TextSpan, TitleResult, TitleSource,
};
pub use pipeline::extract_outline;
