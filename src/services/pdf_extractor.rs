use std::time::Instant;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId};

use crate::error::{AppError, AppResult};
use crate::models::Document;
use crate::services::pdf_objects::{is_name, page_resources, resolve, resolve_dict, resource};

/// Plain text of a PDF, one line per page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub pages: usize,
}

/// Turns PDF bytes into plain text: no layout, tables or formatting survive.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_text(&self, document: &Document) -> AppResult<ExtractedText> {
        let start = Instant::now();

        tracing::info!(
            "Starting PDF text extraction for file: {} ({} bytes)",
            document.name,
            document.size
        );

        document.ensure_pdf()?;

        let pdf = lopdf::Document::load_mem(&document.content).map_err(|e| {
            tracing::warn!("PDF structure validation failed: {}", e);
            AppError::extraction(format!("Failed to parse PDF: {}", e))
        })?;

        if pdf.is_encrypted() {
            return Err(AppError::extraction("PDF is encrypted"));
        }

        let page_ids = pdf.get_pages();
        if page_ids.is_empty() {
            return Err(AppError::extraction("PDF has no pages"));
        }

        // BTreeMap keyed by page number, so iteration is document order.
        let mut pages = Vec::with_capacity(page_ids.len());
        for (number, page_id) in &page_ids {
            let items = page_text_items(&pdf, *page_id).map_err(|e| {
                AppError::extraction(format!("Failed to read text on page {}: {}", number, e))
            })?;
            tracing::debug!(page = number, items = items.len(), "Collected page text items");
            pages.push(items);
        }

        let text = join_pages(&pages);

        tracing::info!(
            "PDF extraction completed in {}ms: {} pages, {} characters",
            start.elapsed().as_millis(),
            pages.len(),
            text.len()
        );

        Ok(ExtractedText {
            text,
            pages: pages.len(),
        })
    }

    /// Reports whether the extractor can serve requests; it has no external
    /// dependencies so it always can.
    pub fn is_available(&self) -> bool {
        true
    }
}

/// Joins each page's items with a single space and ends every page with a
/// newline. A page without items contributes only its newline.
pub fn join_pages<S: AsRef<str>>(pages: &[Vec<S>]) -> String {
    let mut text = String::new();
    for items in pages {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(item.as_ref());
        }
        text.push('\n');
    }
    text
}

// Nesting limit for form XObjects drawn from other forms.
const MAX_FORM_DEPTH: usize = 16;

// Simple-font encodings with a fixed byte-to-glyph table.
const SIMPLE_ENCODINGS: [&str; 4] = [
    "StandardEncoding",
    "MacRomanEncoding",
    "MacExpertEncoding",
    "WinAnsiEncoding",
];

/// Text-bearing items of one page, in rendering order. Every text-showing
/// operator yields one item, including those inside form XObjects the page
/// draws.
pub fn page_text_items(pdf: &lopdf::Document, page_id: ObjectId) -> lopdf::Result<Vec<String>> {
    let data = pdf.get_page_content(page_id)?;
    let mut items = Vec::new();
    if data.is_empty() {
        return Ok(items);
    }

    collect_items(pdf, &data, page_resources(pdf, page_id), 0, &mut items)?;
    Ok(items)
}

fn collect_items(
    pdf: &lopdf::Document,
    data: &[u8],
    resources: Option<&Dictionary>,
    depth: usize,
    items: &mut Vec<String>,
) -> lopdf::Result<()> {
    let content = Content::decode(data)?;
    let mut encoding: Option<String> = None;

    for operation in &content.operations {
        let current = encoding.as_deref();
        let item = match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .zip(resources)
                    .and_then(|(name, resources)| resource(pdf, resources, b"Font", name))
                    .and_then(|font| font.as_dict().ok())
                    .map(|font| font_encoding(pdf, font));
                None
            }
            "Tj" | "'" => operation.operands.last().and_then(|o| string_operand(o, current)),
            "\"" => operation.operands.get(2).and_then(|o| string_operand(o, current)),
            "TJ" => operation.operands.first().and_then(|o| array_operand(o, current)),
            "Do" => {
                if depth < MAX_FORM_DEPTH {
                    if let Some((form_data, form_resources)) = form_xobject(pdf, resources, operation) {
                        collect_items(pdf, &form_data, form_resources.or(resources), depth + 1, items)?;
                    }
                } else {
                    tracing::debug!(depth, "Form XObject nesting too deep, skipping");
                }
                None
            }
            _ => None,
        };

        if let Some(item) = item.filter(|s| !s.is_empty()) {
            items.push(item);
        }
    }

    Ok(())
}

/// Content and resources of the form XObject named by a `Do` operation.
/// Image XObjects and unknown names yield `None`.
fn form_xobject<'a>(
    pdf: &'a lopdf::Document,
    resources: Option<&'a Dictionary>,
    operation: &Operation,
) -> Option<(Vec<u8>, Option<&'a Dictionary>)> {
    let name = operation.operands.first()?.as_name().ok()?;
    let stream = resource(pdf, resources?, b"XObject", name)?.as_stream().ok()?;
    if !is_name(stream.dict.get(b"Subtype").ok(), b"Form") {
        return None;
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let form_resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .and_then(|resources| resolve_dict(pdf, resources));
    Some((data, form_resources))
}

/// Name of a font's base encoding. A `Differences` dictionary falls back to
/// its `BaseEncoding`, and a font without `/Encoding` uses the standard one.
fn font_encoding(pdf: &lopdf::Document, font: &Dictionary) -> String {
    match font.get(b"Encoding").ok().map(|encoding| resolve(pdf, encoding)) {
        Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
        Some(Object::Dictionary(dict)) => dict
            .get(b"BaseEncoding")
            .and_then(Object::as_name_str)
            .unwrap_or("StandardEncoding")
            .to_string(),
        _ => font.get_font_encoding().to_string(),
    }
}

fn string_operand(object: &Object, encoding: Option<&str>) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text(encoding, bytes)),
        _ => None,
    }
}

// Kerning adjustments between the strings of a TJ array are ignored.
fn array_operand(object: &Object, encoding: Option<&str>) -> Option<String> {
    match object {
        Object::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| string_operand(part, encoding))
                .collect(),
        ),
        _ => None,
    }
}

/// Decodes string bytes shown with a font of the given encoding. Strings
/// carrying a byte order mark are always UTF-16. Fonts with a simple
/// encoding go through lopdf's glyph tables; anything else (no font
/// selected, CID fonts) falls back to [`decode_pdf_string`].
pub fn decode_text(encoding: Option<&str>, bytes: &[u8]) -> String {
    if has_bom(bytes) {
        return decode_pdf_string(bytes);
    }
    match encoding {
        Some(name) if SIMPLE_ENCODINGS.contains(&name) => {
            lopdf::Document::decode_text(Some(name), bytes).replace('\0', "")
        }
        _ => decode_pdf_string(bytes),
    }
}

fn has_bom(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE])
}

/// Decodes a PDF string: UTF-16 when a byte order mark is present,
/// otherwise UTF-8 with a Latin-1 fallback.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    let decoded = if bytes.starts_with(&[0xFE, 0xFF]) {
        decode_utf16_be(&bytes[2..])
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        decode_utf16_le(&bytes[2..])
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    };

    decoded.replace('\0', "")
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_utf16_le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
