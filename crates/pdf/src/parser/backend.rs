use lopdf::content::Content;

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation).
pub type PageId = (u32, u16);

/// A content-stream operand, reduced to what text operators consume.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    /// Dictionaries, booleans, references and nulls.
    Other,
}

impl Operand {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&lopdf::Object> for Operand {
    fn from(obj: &lopdf::Object) -> Self {
        match obj {
            lopdf::Object::Integer(i) => Operand::Number(*i as f32),
            lopdf::Object::Real(r) => Operand::Number(*r),
            lopdf::Object::Name(name) => Operand::Name(name.clone()),
            lopdf::Object::String(bytes, _) => Operand::Str(bytes.clone()),
            lopdf::Object::Array(items) => Operand::Array(items.iter().map(Operand::from).collect()),
            _ => Operand::Other,
        }
    }
}

/// One operator with its operands.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

/// Decode PDF string bytes without font information.
///
/// UTF-16BE with a byte-order mark first, then UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// The slice of a PDF parser that text extraction needs.
///
/// Content walking only talks to this trait so it can run against
/// in-memory operation lists in tests.
pub trait PdfBackend {
    /// Page object ids in page order, with their 1-based page numbers.
    fn page_ids(&self) -> Vec<(u32, PageId)>;

    /// Text operators of one page, in stream order.
    fn text_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode the bytes of a shown string using the named font of `page`.
    fn shown_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String;
}

/// [`PdfBackend`] over a loaded [`lopdf::Document`].
pub struct LopdfBackend {
    document: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF held in memory. Encrypted documents are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let document =
            lopdf::Document::load_mem(bytes).map_err(|err| PdfError::Parse(err.to_string()))?;
        if document.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(LopdfBackend { document })
    }

    pub fn num_pages(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Whether the font behind `font_key` uses a two-byte Identity encoding.
    fn has_identity_encoding(&self, page: PageId, font_key: &[u8]) -> bool {
        let Ok(fonts) = self.document.get_page_fonts(page) else {
            return false;
        };
        fonts
            .get(font_key)
            .and_then(|font| font.get(b"Encoding").ok())
            .and_then(|encoding| encoding.as_name().ok())
            .is_some_and(|name| name.starts_with(b"Identity"))
    }
}

impl PdfBackend for LopdfBackend {
    fn page_ids(&self) -> Vec<(u32, PageId)> {
        self.document.get_pages().into_iter().collect()
    }

    fn text_operations(&self, page: PageId) -> Result<Vec<ContentOp>, PdfError> {
        let raw = self
            .document
            .get_page_content(page)
            .map_err(|err| PdfError::Parse(page_error(page, &err)))?;
        let content = Content::decode(&raw).map_err(|err| PdfError::Parse(page_error(page, &err)))?;

        let operations = content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(Operand::from).collect(),
                operator: op.operator,
            })
            .collect();
        Ok(operations)
    }

    fn shown_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String {
        if self.has_identity_encoding(page, font_key) && !bytes.is_empty() && bytes.len() % 2 == 0 {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            let decoded = String::from_utf16_lossy(&units);
            if !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                return decoded;
            }
        }

        decode_text_simple(bytes)
    }
}

fn page_error(page: PageId, err: &lopdf::Error) -> String {
    format!("page object {} {}: {}", page.0, page.1, err)
}
