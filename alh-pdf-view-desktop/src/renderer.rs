use alh_pdf_view::{Appearance, DocumentSource, Size};
use anyhow::{Context, Result};
use pdfium_render::prelude::*;
use std::collections::HashMap;

/// PDF renderer using pdfium-render
pub struct PdfRenderer {
    pdfium: &'static Pdfium,
    passwords: HashMap<String, &'static str>,
}

/// pdfium ties the password to the document lifetime, so each distinct
/// password is leaked once and reused by later loads
fn intern_password(
    passwords: &mut HashMap<String, &'static str>,
    password: &str,
) -> Option<&'static str> {
    if password.is_empty() {
        return None;
    }
    let interned = passwords
        .entry(password.to_owned())
        .or_insert_with_key(|key| Box::leak(key.clone().into_boxed_str()));
    Some(*interned)
}

impl PdfRenderer {
    /// Binds pdfium once for the lifetime of the process
    pub fn new() -> Result<Self> {
        let pdfium = Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .context("Failed to bind to PDFium library. Please install PDFium or download the library from https://github.com/bblanchon/pdfium-binaries")?,
        );
        Ok(Self {
            pdfium: Box::leak(Box::new(pdfium)),
            passwords: HashMap::new(),
        })
    }

    pub fn load_document(&mut self, source: &DocumentSource, password: &str) -> Result<Document> {
        let password = intern_password(&mut self.passwords, password);
        let inner = match source {
            DocumentSource::File(path) => self
                .pdfium
                .load_pdf_from_file(path, password)
                .with_context(|| format!("cannot open {}", path.display()))?,
            DocumentSource::Bytes(bytes) => self
                .pdfium
                .load_pdf_from_byte_vec(bytes.to_vec(), password)
                .context("cannot open in-memory document")?,
        };
        Ok(Document { inner })
    }
}

pub struct Document {
    inner: PdfDocument<'static>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.inner.pages().len() as usize
    }

    /// Page size in points
    pub fn page_size(&self, page_index: usize) -> Result<Size> {
        let page = self
            .inner
            .pages()
            .get(page_index as u16)
            .context("Page index out of bounds")?;
        Ok(Size::new(page.width().value as f64, page.height().value as f64))
    }

    /// Renders a page at `scale` pixels per point
    pub fn render_page(
        &self,
        page_index: usize,
        scale: f64,
        appearance: &Appearance,
    ) -> Result<image::RgbaImage> {
        let page = self
            .inner
            .pages()
            .get(page_index as u16)
            .context("Page index out of bounds")?;

        let render_width = (page.width().value as f64 * scale).round().max(1.0) as i32;
        let render_height = (page.height().value as f64 * scale).round().max(1.0) as i32;

        let background = appearance.background_color;
        let render_config = PdfRenderConfig::new()
            .set_target_width(render_width)
            .set_maximum_height(render_height)
            .set_clear_color(PdfColor::new(background.r, background.g, background.b, 255))
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .context("Failed to render page")?;

        // pdfium hands out BGRA
        let mut buffer = bitmap.as_raw_bytes().to_vec();
        for pixel in buffer.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
        let mut img = image::RgbaImage::from_raw(bitmap.width() as u32, bitmap.height() as u32, buffer)
            .context("Failed to create image from bitmap")?;

        if appearance.night_mode {
            image::imageops::invert(&mut img);
        }
        Ok(img)
    }
}
