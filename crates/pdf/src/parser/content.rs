//! Content-stream walking.
//!
//! Interprets the text operators of a page's content stream and emits one
//! [`RawTextItem`] per shown string, positioned in user space.
//!
//! ```text
//! text_operations -> ContentOp[] -> TextCursor -> RawTextItem[]
//! ```
//!
//! Glyph metrics are not consulted. Advances use a fixed per-character
//! width, which is enough for line assembly and word-gap detection.

use super::backend::{ContentOp, Operand, PageId, PdfBackend};
use crate::types::RawTextItem;
use crate::PdfError;

/// Approximate glyph advance as a fraction of the font size.
const GLYPH_ADVANCE_RATIO: f32 = 0.5;

/// A `TJ` adjustment wider than this fraction of a glyph reads as a space.
const KERNING_SPACE_RATIO: f32 = 0.3;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Text state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextCursor {
    font_key: Vec<u8>,
    font_size: f32,
    matrix: [f32; 6],
    line_matrix: [f32; 6],
    horizontal_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    rise: f32,
    leading: f32,
}

impl Default for TextCursor {
    fn default() -> Self {
        TextCursor {
            font_key: Vec::new(),
            font_size: 0.0,
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            horizontal_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextCursor {
    fn begin_text(&mut self) {
        self.matrix = IDENTITY;
        self.line_matrix = IDENTITY;
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        self.matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: offset the start of the current line.
    fn move_line(&mut self, tx: f32, ty: f32) {
        let lm = self.line_matrix;
        self.line_matrix[4] = lm[0] * tx + lm[2] * ty + lm[4];
        self.line_matrix[5] = lm[1] * tx + lm[3] * ty + lm[5];
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Text rendering matrix `[fs * Th, 0, 0, fs, 0, rise] x Tm`.
    fn rendering_transform(&self) -> [f32; 6] {
        let fs = self.font_size;
        let th = self.horizontal_scale;
        let m = self.matrix;
        [
            fs * th * m[0],
            fs * th * m[1],
            fs * m[2],
            fs * m[3],
            self.rise * m[2] + m[4],
            self.rise * m[3] + m[5],
        ]
    }

    fn glyph_advance(&self) -> f32 {
        self.font_size * GLYPH_ADVANCE_RATIO * self.horizontal_scale
    }

    /// Unscaled text-space advance of `text`.
    fn advance_of(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| {
                let spacing = if c == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_advance() + self.char_spacing + spacing
            })
            .sum()
    }

    fn translate(&mut self, dx: f32) {
        self.matrix[4] += dx * self.matrix[0];
        self.matrix[5] += dx * self.matrix[1];
    }

    fn item(&self, text: String, advance: f32) -> RawTextItem {
        let transform = self.rendering_transform();
        let scale = self.matrix[0].hypot(self.matrix[1]);
        RawTextItem {
            text,
            transform,
            width: Some(advance * scale),
            height: Some(transform[2].hypot(transform[3])),
        }
    }
}

// ---------------------------------------------------------------------------
// Operator dispatch
// ---------------------------------------------------------------------------

struct PageWalker<'a> {
    backend: &'a dyn PdfBackend,
    page: PageId,
    cursor: TextCursor,
    items: Vec<RawTextItem>,
}

impl<'a> PageWalker<'a> {
    fn new(backend: &'a dyn PdfBackend, page: PageId) -> Self {
        PageWalker {
            backend,
            page,
            cursor: TextCursor::default(),
            items: Vec::new(),
        }
    }

    fn decode(&self, value: &Operand) -> Option<String> {
        match value {
            Operand::Str(bytes) => {
                Some(self.backend.shown_text(self.page, &self.cursor.font_key, bytes))
            }
            _ => None,
        }
    }

    fn apply(&mut self, op: &ContentOp) {
        let numbers: Vec<f32> = op.operands.iter().filter_map(Operand::as_number).collect();
        let c = &mut self.cursor;

        match op.operator.as_str() {
            "BT" => c.begin_text(),
            "Tf" => {
                if let Some(Operand::Name(key)) = op.operands.first() {
                    c.font_key = key.clone();
                }
                if let Some(size) = numbers.last() {
                    c.font_size = *size;
                }
            }
            "Tm" if numbers.len() >= 6 => {
                c.set_matrix([
                    numbers[0], numbers[1], numbers[2], numbers[3], numbers[4], numbers[5],
                ]);
            }
            "Td" if numbers.len() >= 2 => c.move_line(numbers[0], numbers[1]),
            "TD" if numbers.len() >= 2 => {
                c.leading = -numbers[1];
                c.move_line(numbers[0], numbers[1]);
            }
            "T*" => c.next_line(),
            "TL" => set_first(&mut c.leading, &numbers),
            "Tc" => set_first(&mut c.char_spacing, &numbers),
            "Tw" => set_first(&mut c.word_spacing, &numbers),
            "Ts" => set_first(&mut c.rise, &numbers),
            "Tz" => {
                if let Some(percent) = numbers.first() {
                    c.horizontal_scale = percent / 100.0;
                }
            }
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "'" => {
                c.next_line();
                if let Some(operand) = op.operands.first() {
                    self.show(operand);
                }
            }
            "\"" if op.operands.len() >= 3 => {
                c.word_spacing = numbers.first().copied().unwrap_or(c.word_spacing);
                c.char_spacing = numbers.get(1).copied().unwrap_or(c.char_spacing);
                c.next_line();
                self.show(&op.operands[2]);
            }
            "TJ" => {
                if let Some(Operand::Array(parts)) = op.operands.first() {
                    self.show_array(parts);
                }
            }
            _ => {}
        }
    }

    fn show(&mut self, operand: &Operand) {
        let Some(text) = self.decode(operand) else {
            return;
        };
        let advance = self.cursor.advance_of(&text);
        if !text.trim().is_empty() {
            self.items.push(self.cursor.item(text, advance));
        }
        self.cursor.translate(advance);
    }

    /// `TJ`: strings interleaved with kerning in thousandths of a text unit.
    /// Contiguous strings become one item; wide gaps become spaces.
    fn show_array(&mut self, parts: &[Operand]) {
        let start = self.cursor.clone();
        let mut text = String::new();
        let mut advance = 0.0;

        for part in parts {
            if let Some(fragment) = self.decode(part) {
                let dx = self.cursor.advance_of(&fragment);
                text.push_str(&fragment);
                advance += dx;
                self.cursor.translate(dx);
            } else if let Some(kerning) = part.as_number() {
                let dx = -kerning / 1000.0 * self.cursor.font_size * self.cursor.horizontal_scale;
                let space = self.cursor.glyph_advance() * KERNING_SPACE_RATIO;
                if dx > space && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
                advance += dx;
                self.cursor.translate(dx);
            }
        }

        let text = text.trim_end().to_string();
        if !text.trim().is_empty() {
            self.items.push(start.item(text, advance));
        }
    }
}

fn set_first(slot: &mut f32, numbers: &[f32]) {
    if let Some(v) = numbers.first() {
        *slot = *v;
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk one page's content stream and collect its positioned text runs.
///
/// Leading whitespace of each run is kept; runs that are blank are skipped.
pub fn extract_page_items(
    backend: &dyn PdfBackend,
    page: PageId,
) -> Result<Vec<RawTextItem>, PdfError> {
    let ops = backend.text_operations(page)?;

    let mut walker = PageWalker::new(backend, page);
    for op in &ops {
        walker.apply(op);
    }
    Ok(walker.items)
}

/// Collect the runs of every page, keyed by 1-based page number.
///
/// A page whose content cannot be decoded yields an empty run list and a
/// warning instead of failing the whole document.
pub fn extract_all_pages(backend: &dyn PdfBackend) -> Vec<(usize, Vec<RawTextItem>)> {
    backend
        .page_ids()
        .into_iter()
        .map(|(number, id)| {
            let items = extract_page_items(backend, id).unwrap_or_else(|e| {
                log::warn!("skipping text of page {}: {}", number, e);
                Vec::new()
            });
            (number as usize, items)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
