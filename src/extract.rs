//! Span extraction from PDF content streams via lopdf.
//!
//! Positions are approximate: glyph widths are not read from the font
//! programs, so span widths use an average advance of half the font size.

use std::collections::HashMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;
use crate::model::{BoundingBox, DocumentInput, TextSpan};
use crate::normalize::collapse_whitespace;

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;
/// `TJ` adjustments (thousandths of text space) at or below this open a word gap.
const WORD_GAP_ADJUSTMENT: f64 = -250.0;

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Load a PDF file and extract its spans and metadata title.
pub fn load_pdf<P: AsRef<Path>>(path: P) -> Result<DocumentInput> {
    let doc = Document::load(path)?;
    Ok(document_input(&doc))
}

/// Same as [`load_pdf`] for an in-memory PDF.
pub fn load_pdf_bytes(data: &[u8]) -> Result<DocumentInput> {
    let doc = Document::load_mem(data)?;
    Ok(document_input(&doc))
}

pub fn document_input(doc: &Document) -> DocumentInput {
    DocumentInput {
        metadata_title: metadata_title(doc),
        spans: extract_spans(doc),
    }
}

/// The `/Title` entry of the trailer's `/Info` dictionary, if non-empty.
pub fn metadata_title(doc: &Document) -> Option<String> {
    let info = resolve_dict(doc, doc.trailer.get(b"Info").ok()?)?;
    let title = match info.get(b"Title").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    let text = match title {
        Object::String(bytes, _) => collapse_whitespace(&decode_pdf_string(bytes)),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Spans of every page in page order. Pages that fail to decode are skipped.
pub fn extract_spans(doc: &Document) -> Vec<TextSpan> {
    let mut spans = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        match page_spans(doc, page_id, page_number as usize) {
            Ok(mut page) => spans.append(&mut page),
            Err(e) => log::warn!("Could not extract text from page {}: {}", page_number, e),
        }
    }

    log::debug!("Extracted {} spans", spans.len());
    spans
}

fn page_spans(doc: &Document, page_id: ObjectId, page: usize) -> Result<Vec<TextSpan>> {
    let fonts = page_fonts(doc, page_id);
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut state = TextState::default();
    let mut spans = Vec::new();

    for op in content.operations {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => state.save(),
            "Q" => state.restore(),
            "cm" => {
                if let Some(matrix) = as_matrix(operands) {
                    state.graphics.ctm = concat(&matrix, &state.graphics.ctm);
                }
            }
            "BT" => state.begin_text(),
            "Tf" => {
                if let [Object::Name(name), size] = operands {
                    state.graphics.font = fonts.get(name).cloned().unwrap_or_else(|| PageFont {
                        name: String::from_utf8_lossy(name).into_owned(),
                        encoding: None,
                    });
                    if let Some(size) = as_number(size) {
                        state.graphics.font_size = size;
                    }
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(as_number) {
                    state.graphics.leading = leading;
                }
            }
            "Td" => {
                if let [tx, ty] = operands {
                    if let (Some(tx), Some(ty)) = (as_number(tx), as_number(ty)) {
                        state.move_line(tx, ty);
                    }
                }
            }
            "TD" => {
                if let [tx, ty] = operands {
                    if let (Some(tx), Some(ty)) = (as_number(tx), as_number(ty)) {
                        state.graphics.leading = -ty;
                        state.move_line(tx, ty);
                    }
                }
            }
            "Tm" => {
                if let Some(matrix) = as_matrix(operands) {
                    state.set_matrix(matrix);
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = state.graphics.font.decode(bytes);
                    state.show_text(text, 0.0, page, &mut spans);
                }
            }
            "'" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = state.graphics.font.decode(bytes);
                    state.show_text(text, 0.0, page, &mut spans);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = state.graphics.font.decode(bytes);
                    state.show_text(text, 0.0, page, &mut spans);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut combined = String::new();
                    let mut adjustment = 0.0;
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                combined.push_str(&state.graphics.font.decode(bytes))
                            }
                            other => {
                                if let Some(value) = as_number(other) {
                                    if value <= WORD_GAP_ADJUSTMENT && !combined.ends_with(' ') {
                                        combined.push(' ');
                                    }
                                    adjustment -= value / 1000.0 * state.graphics.font_size;
                                }
                            }
                        }
                    }
                    state.show_text(combined, adjustment, page, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// A page font resource: family name and how its strings are encoded.
#[derive(Debug, Clone, Default)]
struct PageFont {
    name: String,
    /// `/Encoding` name; `None` when the font dictionary has none.
    encoding: Option<String>,
}

impl PageFont {
    fn decode(&self, bytes: &[u8]) -> String {
        match self.encoding.as_deref() {
            // lopdf has no CMap support for composite fonts.
            Some(encoding) if !encoding.starts_with("Identity-") => {
                Document::decode_text(Some(encoding), bytes)
            }
            _ => decode_pdf_string(bytes),
        }
    }
}

/// Resource name (`/F1`) to font for a page, including inherited resources.
fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, PageFont> {
    doc.get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| {
            let base_font = font
                .get(b"BaseFont")
                .and_then(Object::as_name_str)
                .map(|base| strip_subset_prefix(base).to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&name).into_owned());
            let encoding = font
                .has(b"Encoding")
                .then(|| font.get_font_encoding().to_string());
            (
                name,
                PageFont {
                    name: base_font,
                    encoding,
                },
            )
        })
        .collect()
}

/// Parameters saved and restored by `q`/`Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: [f64; 6],
    font: PageFont,
    font_size: f64,
    leading: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font: PageFont::default(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

/// Content-stream state needed to place spans on the page.
struct TextState {
    graphics: GraphicsState,
    saved: Vec<GraphicsState>,
    matrix: [f64; 6],
    line_matrix: [f64; 6],
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            graphics: GraphicsState::default(),
            saved: Vec::new(),
            matrix: IDENTITY,
            line_matrix: IDENTITY,
        }
    }
}

impl TextState {
    fn save(&mut self) {
        self.saved.push(self.graphics.clone());
    }

    /// An unbalanced `Q` keeps the current state.
    fn restore(&mut self) {
        if let Some(saved) = self.saved.pop() {
            self.graphics = saved;
        }
    }

    fn begin_text(&mut self) {
        self.matrix = IDENTITY;
        self.line_matrix = IDENTITY;
    }

    fn set_matrix(&mut self, matrix: [f64; 6]) {
        self.matrix = matrix;
        self.line_matrix = matrix;
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = concat(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.graphics.leading);
    }

    /// Record a span at the current position and advance past it.
    ///
    /// `adjustment` is extra advance in text space from `TJ` kerning.
    fn show_text(&mut self, text: String, adjustment: f64, page: usize, spans: &mut Vec<TextSpan>) {
        let font_size = self.graphics.font_size.abs();
        let advance = text.chars().count() as f64 * font_size * AVG_GLYPH_WIDTH + adjustment;

        // Text space to page space.
        let rendering = concat(&self.matrix, &self.graphics.ctm);
        let size = font_size * vertical_scale(&rendering);
        let width = advance * horizontal_scale(&rendering);
        let x0 = rendering[4];
        let baseline = rendering[5];

        let [a, b, _, _, _, _] = self.matrix;
        self.matrix[4] += advance * a;
        self.matrix[5] += advance * b;

        if text.trim().is_empty() {
            return;
        }

        let bounding_box =
            BoundingBox::new(x0, baseline - size * 0.2, x0 + width, baseline + size * 0.8);
        let order = spans.len();
        spans.push(TextSpan::new(
            text,
            page,
            size,
            self.graphics.font.name.clone(),
            bounding_box,
            order,
        ));
    }
}

/// `m × n` for PDF matrices `[a b c d e f]`.
fn concat(m: &[f64; 6], n: &[f64; 6]) -> [f64; 6] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn vertical_scale(m: &[f64; 6]) -> f64 {
    let scale = (m[2] * m[2] + m[3] * m[3]).sqrt();
    if scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn horizontal_scale(m: &[f64; 6]) -> f64 {
    let scale = (m[0] * m[0] + m[1] * m[1]).sqrt();
    if scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn as_matrix(operands: &[Object]) -> Option<[f64; 6]> {
    let values: Vec<f64> = operands.iter().filter_map(as_number).collect();
    match values.as_slice() {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Real(r) => Some(*r as f64),
        Object::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

/// `ABCDEF+Helvetica-Bold` -> `Helvetica-Bold`.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => name,
    }
}

/// Decode a PDF string with no font encoding to go by: UTF-16BE with BOM,
/// UTF-8, or single-byte Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
