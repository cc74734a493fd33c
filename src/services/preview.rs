use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, ImageOutputFormat, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::services::pdf_objects::{inherited_entry, is_name, page_resources, resolve, resource};

/// Scale applied to the first page when rendering a preview.
pub const PREVIEW_SCALE: f32 = 0.5;

// US Letter, used when no MediaBox can be found.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Largest canvas or image side, in pixels, the renderer will allocate.
pub const MAX_PREVIEW_DIMENSION: u32 = 4096;

#[derive(Debug, Clone)]
pub struct PagePreview {
    pub width: u32,
    pub height: u32,
    /// Page count of the whole document, shown next to the preview.
    pub pages: usize,
    pub png: Vec<u8>,
}

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Rasterizes the first page at a reduced scale. Only embedded JPEG images
/// are painted onto the page; vector content and text are left blank.
#[derive(Debug, Clone, Copy)]
pub struct PreviewRenderer {
    scale: f32,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self {
            scale: PREVIEW_SCALE,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn render_first_page(&self, pdf_bytes: &[u8]) -> AppResult<PagePreview> {
        let pdf = lopdf::Document::load_mem(pdf_bytes)?;
        let page_ids = pdf.get_pages();
        let page_id = page_ids
            .get(&1)
            .copied()
            .ok_or_else(|| AppError::extraction("PDF has no pages"))?;

        let media_box = media_box(&pdf, page_id);
        let width = self
            .pixels((media_box[2] - media_box[0]).abs())
            .ok_or_else(|| AppError::extraction("Page is too large to preview"))?
            .max(1);
        let height = self
            .pixels((media_box[3] - media_box[1]).abs())
            .ok_or_else(|| AppError::extraction("Page is too large to preview"))?
            .max(1);

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        self.paint_images(&pdf, page_id, &media_box, &mut canvas)?;

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|e| AppError::internal(format!("Failed to encode preview: {}", e)))?;

        debug!(width, height, bytes = png.len(), "Rendered first page preview");

        Ok(PagePreview {
            width,
            height,
            pages: page_ids.len(),
            png,
        })
    }

    /// Scales a length in PDF units to pixels, or `None` when the result is
    /// not finite or exceeds [`MAX_PREVIEW_DIMENSION`].
    fn pixels(&self, length: f32) -> Option<u32> {
        let scaled = (length * self.scale).round();
        if !scaled.is_finite() || scaled < 0.0 || scaled > MAX_PREVIEW_DIMENSION as f32 {
            return None;
        }
        Some(scaled as u32)
    }

    /// Like [`render_first_page`](Self::render_first_page), but a failure is
    /// logged and reported as no preview.
    pub fn render_preview_best_effort(&self, pdf_bytes: &[u8]) -> Option<PagePreview> {
        match self.render_first_page(pdf_bytes) {
            Ok(preview) => Some(preview),
            Err(e) => {
                warn!(error = %e, "Error loading PDF preview");
                None
            }
        }
    }

    fn paint_images(
        &self,
        pdf: &lopdf::Document,
        page_id: ObjectId,
        media_box: &[f32; 4],
        canvas: &mut RgbaImage,
    ) -> AppResult<()> {
        let data = pdf.get_page_content(page_id)?;
        if data.is_empty() {
            return Ok(());
        }
        let content = Content::decode(&data)?;
        let Some(resources) = page_resources(pdf, page_id) else {
            return Ok(());
        };

        let mut stack = Vec::new();
        let mut ctm = IDENTITY;

        for operation in &content.operations {
            match operation.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or(IDENTITY),
                "cm" => {
                    let values: Vec<f32> = operation.operands.iter().filter_map(number).collect();
                    if let Ok(m) = <Matrix>::try_from(values.as_slice()) {
                        ctm = multiply(&m, &ctm);
                    }
                }
                "Do" => {
                    let Some(Object::Name(name)) = operation.operands.first() else {
                        continue;
                    };
                    if let Some(Object::Stream(stream)) = resource(pdf, resources, b"XObject", name) {
                        self.paint_image(stream, &ctm, media_box, canvas);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn paint_image(
        &self,
        stream: &lopdf::Stream,
        ctm: &Matrix,
        media_box: &[f32; 4],
        canvas: &mut RgbaImage,
    ) {
        if !is_name(stream.dict.get(b"Subtype").ok(), b"Image") || !is_jpeg(&stream.dict) {
            return;
        }

        let decoded = match image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
        {
            Ok(img) => img,
            Err(e) => {
                debug!(error = %e, "Skipping undecodable image in preview");
                return;
            }
        };

        // The image occupies the unit square mapped through the CTM.
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(x, y)| {
            (
                ctm[0] * x + ctm[2] * y + ctm[4],
                ctm[1] * x + ctm[3] * y + ctm[5],
            )
        });
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

        let (Some(w), Some(h)) = (self.pixels(max_x - min_x), self.pixels(max_y - min_y)) else {
            debug!(?ctm, "Skipping image with an unusable placement in preview");
            return;
        };
        if w == 0 || h == 0 {
            return;
        }

        // PDF space grows upwards from the bottom of the MediaBox.
        let left = ((min_x - media_box[0]) * self.scale).round() as i64;
        let top = ((media_box[3] - max_y) * self.scale).round() as i64;

        let resized = imageops::resize(&decoded.to_rgba8(), w, h, imageops::FilterType::Triangle);
        imageops::overlay(canvas, &resized, left, top);
    }
}

fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn is_jpeg(dict: &Dictionary) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name.as_slice() == b"DCTDecode",
        Ok(Object::Array(filters)) => {
            filters.len() == 1 && is_name(filters.first(), b"DCTDecode")
        }
        _ => false,
    }
}

fn media_box(pdf: &lopdf::Document, page_id: ObjectId) -> [f32; 4] {
    inherited_entry(pdf, page_id, b"MediaBox")
        .map(|object| resolve(pdf, object))
        .and_then(|object| object.as_array().ok())
        .map(|values| values.iter().filter_map(number).collect::<Vec<_>>())
        .and_then(|values| <[f32; 4]>::try_from(values.as_slice()).ok())
        .unwrap_or(DEFAULT_MEDIA_BOX)
}
