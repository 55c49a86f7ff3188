//! Layout-heuristic text extraction from PDF content streams.
//!
//! ```text
//! bytes -> LopdfBackend -> content::extract_all_pages -> RawTextItem[] per page
//!       -> lines::build_lines -> classify -> group -> ExtractedDocument
//! ```
//!
//! Everything after the backend is pure and works on plain values, so the
//! pipeline can be driven from [`extract_from_pages`] in tests.

use thiserror::Error;

pub mod parser;
pub mod render;
pub mod types;

pub use types::*;

use parser::classify::{build_page_stats, determine_dominant_font_size};
use parser::group::{build_semantic_blocks, build_website_blocks, merge_page_continuations};
use parser::lines::build_lines;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page {page} is out of range (document has {count} pages with text)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse PDF bytes and extract typed blocks in the given mode.
pub fn extract(bytes: &[u8], mode: ExtractionMode) -> Result<ExtractedDocument, PdfError> {
    let backend = parser::backend::LopdfBackend::from_bytes(bytes)?;
    log::debug!("loaded PDF with {} pages", backend.num_pages());
    let pages = parser::content::extract_all_pages(&backend);
    Ok(extract_from_pages(pages, mode))
}

/// Read a PDF from disk and extract it.
pub fn extract_file(
    path: impl AsRef<std::path::Path>,
    mode: ExtractionMode,
) -> Result<ExtractedDocument, PdfError> {
    let bytes = std::fs::read(path)?;
    extract(&bytes, mode)
}

/// Run the pure pipeline over positioned runs, keyed by page number.
pub fn extract_from_pages(
    pages: Vec<(usize, Vec<RawTextItem>)>,
    mode: ExtractionMode,
) -> ExtractedDocument {
    let lines: Vec<(usize, Vec<Line>)> = pages
        .into_iter()
        .map(|(number, items)| (number, build_lines(&items)))
        .collect();

    let dominant_font_size =
        determine_dominant_font_size(lines.iter().map(|(_, page)| page.as_slice()));

    let pages = match mode {
        ExtractionMode::Website => {
            let pages = lines
                .iter()
                .map(|(number, page)| Page {
                    number: *number,
                    blocks: build_website_blocks(page, dominant_font_size),
                })
                .collect();
            merge_page_continuations(pages)
        }
        ExtractionMode::Semantic => lines
            .iter()
            .map(|(number, page)| Page {
                number: *number,
                blocks: build_semantic_blocks(page, &build_page_stats(page)),
            })
            .filter(|page| !page.blocks.is_empty())
            .collect(),
    };

    ExtractedDocument {
        mode,
        dominant_font_size,
        pages,
    }
}

/// Split the blocks of a document into the blocks of pages
/// `start..start + count` and the blocks of every later page.
///
/// `start` is a 1-based page number and must not exceed the last page that
/// kept any text.
pub fn split_pages(
    doc: &ExtractedDocument,
    start: usize,
    count: usize,
) -> Result<(Vec<PageBlock>, Vec<PageBlock>), PdfError> {
    let last = doc.pages.last().map(|p| p.number).unwrap_or(0);
    if start == 0 || start > last || count == 0 {
        return Err(PdfError::PageOutOfRange {
            page: start,
            count: last,
        });
    }

    let end = start.saturating_add(count);
    let mut selected = Vec::new();
    let mut rest = Vec::new();
    for page in &doc.pages {
        if page.number < start {
            continue;
        }
        let target = if page.number < end {
            &mut selected
        } else {
            &mut rest
        };
        target.extend(page.blocks.iter().cloned());
    }

    Ok((selected, rest))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
