use image::{ImageEncoder, RgbaImage};
use mupdf::{Colorspace, Matrix};
use webp::Encoder as WebpEncoder;

use crate::error::{Error, Result};
use super::document::PdfDocument;
use super::page_index::PageIndex;

/// Default scale factor for preview rendering (2.0 for high DPI)
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Preview renderer for PDF documents
pub struct PageRenderer<'a> {
    /// The PDF document to render
    pub doc: &'a PdfDocument,
    /// Scale factor for rendering
    pub scale: f32,
}

impl<'a> PageRenderer<'a> {
    /// Create a renderer with default scale (2.0)
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            scale: DEFAULT_RENDER_SCALE,
        }
    }

    /// Create a renderer with custom scale
    pub const fn with_scale(doc: &'a PdfDocument, scale: f32) -> Self {
        Self { doc, scale }
    }

    /// Render a page to an RGBA image buffer
    pub fn render_page(&self, page_num: usize) -> Result<RgbaImage> {
        let page_index = PageIndex::try_from_page_num(page_num, self.doc.page_count())?;

        let doc = self.doc.open_document()?;
        let page = doc.load_page(page_index.into()).map_err(|e| {
            Error::PdfRender {
                page: page_num,
                reason: format!("Failed to load page: {e}"),
            }
        })?;

        // Create transformation matrix for scaling
        let matrix = Matrix::new_scale(self.scale, self.scale);

        // Render to pixmap (RGBA)
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| {
                Error::PdfRender {
                    page: page_num,
                    reason: format!("Failed to render: {e}"),
                }
            })?;

        // Convert to image
        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        // mupdf returns RGB, we need RGBA
        let n = pixmap.n() as usize; // components per pixel
        let mut rgba_pixels = Vec::with_capacity((img_width * img_height * 4) as usize);

        for chunk in pixels.chunks(n) {
            match n {
                3 => {
                    // RGB -> RGBA
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[1]);
                    rgba_pixels.push(chunk[2]);
                    rgba_pixels.push(255);
                }
                4 => {
                    // Already RGBA
                    rgba_pixels.extend_from_slice(chunk);
                }
                1 => {
                    // Grayscale -> RGBA
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(chunk[0]);
                    rgba_pixels.push(255);
                }
                _ => {
                    return Err(Error::PdfRender {
                        page: page_num,
                        reason: format!("Unexpected pixel format with {n} components"),
                    });
                }
            }
        }

        RgbaImage::from_raw(img_width, img_height, rgba_pixels).ok_or_else(|| {
            Error::PdfRender {
                page: page_num,
                reason: "Failed to create image buffer".to_string(),
            }
        })
    }

    /// Render a page to PNG bytes
    pub fn render_page_png(&self, page_num: usize) -> Result<Vec<u8>> {
        let img = self.render_page(page_num)?;

        let mut png_data = Vec::new();
        // Use fast compression for better performance (still lossless)
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut png_data,
            image::codecs::png::CompressionType::Fast,
            image::codecs::png::FilterType::Adaptive,
        );

        encoder
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::PdfRender {
                page: page_num,
                reason: format!("Failed to encode PNG: {e}"),
            })?;

        Ok(png_data)
    }

    /// Render a page to WebP bytes (lossy, quality 85 - good balance of size and quality)
    pub fn render_page_webp(&self, page_num: usize) -> Result<Vec<u8>> {
        let img = self.render_page(page_num)?;

        // Use libwebp for lossy encoding (5-10x smaller than lossless)
        let encoder = WebpEncoder::from_rgba(img.as_raw(), img.width(), img.height());
        let webp_data = encoder.encode(85.0);

        Ok(webp_data.to_vec())
    }
}

