//! Thin drawing surface over `printpdf` using top-left millimetre coordinates.

use printpdf::path::PaintMode;
use printpdf::{
    Color, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Rect, Rgb,
};

use super::layout::{PAGE_HEIGHT, PAGE_WIDTH};
use super::{save_document, Fonts, PdfError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint(pub f32, pub f32, pub f32);

impl Tint {
    fn color(self) -> Color {
        Color::Rgb(Rgb::new(self.0, self.1, self.2, None))
    }
}

pub const BRAND: Tint = Tint(0.11, 0.37, 0.64);
pub const BRAND_LIGHT: Tint = Tint(0.89, 0.94, 0.99);
pub const SHADE: Tint = Tint(0.92, 0.93, 0.95);
pub const BORDER: Tint = Tint(0.62, 0.66, 0.72);
pub const INK: Tint = Tint(0.13, 0.13, 0.15);
pub const MUTED: Tint = Tint(0.42, 0.44, 0.48);
pub const WHITE: Tint = Tint(1.0, 1.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Regular,
    Bold,
    Italic,
}

/// Font size, face and colour for a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub size: f32,
    pub style: Style,
    pub tint: Tint,
}

impl Pen {
    pub const fn new(size: f32, style: Style, tint: Tint) -> Self {
        Self { size, style, tint }
    }
}

pub struct Canvas {
    doc: PdfDocumentReference,
    layers: Vec<PdfLayerReference>,
    fonts: Fonts,
}

impl Canvas {
    /// Creates an A4 document with `pages` blank pages.
    pub fn new(title: &str, pages: usize) -> Result<Self, PdfError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let mut layers = vec![doc.get_page(page1).get_layer(layer1)];
        for n in 1..pages.max(1) {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Page {}", n + 1));
            layers.push(doc.get_page(page).get_layer(layer));
        }
        let fonts = Fonts::load(&doc)?;
        for layer in &layers {
            layer.set_outline_thickness(0.3);
            layer.set_outline_color(BORDER.color());
            layer.set_fill_color(INK.color());
        }
        Ok(Self { doc, layers, fonts })
    }

    pub fn page_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&self, page: usize) -> &PdfLayerReference {
        &self.layers[page.min(self.layers.len() - 1)]
    }

    /// Draws one line of text with its baseline `baseline` mm from the top.
    pub fn text(&self, page: usize, text: &str, x: f32, baseline: f32, pen: Pen) {
        let font = match pen.style {
            Style::Regular => &self.fonts.regular,
            Style::Bold => &self.fonts.bold,
            Style::Italic => &self.fonts.italic,
        };
        let layer = self.layer(page);
        layer.set_fill_color(pen.tint.color());
        layer.use_text(text, pen.size, Mm(x), Mm(PAGE_HEIGHT - baseline), font);
        layer.set_fill_color(INK.color());
    }

    fn rect(&self, page: usize, x: f32, top: f32, width: f32, height: f32, mode: PaintMode) {
        let rect = Rect::new(
            Mm(x),
            Mm(PAGE_HEIGHT - top - height),
            Mm(x + width),
            Mm(PAGE_HEIGHT - top),
        )
        .with_mode(mode);
        self.layer(page).add_rect(rect);
    }

    pub fn fill_rect(&self, page: usize, x: f32, top: f32, width: f32, height: f32, tint: Tint) {
        let layer = self.layer(page);
        layer.set_fill_color(tint.color());
        self.rect(page, x, top, width, height, PaintMode::Fill);
        layer.set_fill_color(INK.color());
    }

    pub fn stroke_rect(&self, page: usize, x: f32, top: f32, width: f32, height: f32) {
        self.rect(page, x, top, width, height, PaintMode::Stroke);
    }

    /// Horizontal rule drawn as a hairline filled rectangle.
    pub fn rule(&self, page: usize, x1: f32, x2: f32, top: f32, tint: Tint) {
        self.fill_rect(page, x1, top, x2 - x1, 0.3, tint);
    }

    pub fn finish(self) -> Result<Vec<u8>, PdfError> {
        save_document(self.doc)
    }
}
