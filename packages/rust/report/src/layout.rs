//! A paginating text cursor over a `printpdf` document.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rect, Rgb,
};

use pitchlens_shared::{PitchLensError, Result};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TOP: f32 = PAGE_HEIGHT - MARGIN;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Approximate Helvetica glyph width as a fraction of the font size in mm.
const GLYPH_WIDTH_PER_PT: f32 = 0.19;

pub(crate) const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
pub(crate) const NAVY: (f32, f32, f32) = (0.12, 0.23, 0.37);
pub(crate) const GREY: (f32, f32, f32) = (0.42, 0.45, 0.50);
pub(crate) const RED: (f32, f32, f32) = (0.94, 0.27, 0.27);

fn color((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn render_error(what: &str, e: impl std::fmt::Display) -> PitchLensError {
    PitchLensError::Render(format!("{what}: {e}"))
}

/// Writes lines top to bottom, starting a new page when space runs out.
pub(crate) struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
    pages: usize,
}

impl PageWriter {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| render_error("font", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| render_error("font", e))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: Mm(TOP),
            pages: 1,
        })
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn page_break(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.pages + 1));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = Mm(TOP);
        self.pages += 1;
    }

    /// Start a new page unless `height` mm still fit.
    fn ensure_space(&mut self, height: f32) {
        if self.y.0 - height < MARGIN {
            self.page_break();
        }
    }

    pub fn space(&mut self, height: f32) {
        self.y -= Mm(height);
    }

    fn line_height(size: f32) -> f32 {
        size * 0.45
    }

    fn chars_per_line(size: f32, indent: f32) -> usize {
        ((CONTENT_WIDTH - indent) / (size * GLYPH_WIDTH_PER_PT)).max(10.0) as usize
    }

    fn draw(&mut self, text: &str, size: f32, indent: f32, bold: bool, rgb: (f32, f32, f32)) {
        let height = Self::line_height(size);
        self.ensure_space(height);
        self.y -= Mm(height);
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color(rgb));
        self.layer
            .use_text(text, size, Mm(MARGIN + indent), self.y, font);
    }

    /// Wrapped text in the given style.
    pub fn text(&mut self, text: &str, size: f32, indent: f32, bold: bool, rgb: (f32, f32, f32)) {
        let clean = crate::format::sanitize(text);
        for paragraph in clean.split('\n') {
            for line in crate::format::wrap_text(paragraph, Self::chars_per_line(size, indent)) {
                self.draw(&line, size, indent, bold, rgb);
            }
        }
    }

    pub fn paragraph(&mut self, text: &str) {
        self.text(text, 10.0, 0.0, false, BLACK);
        self.space(2.0);
    }

    /// Section heading; starts a new page when fewer than a few lines remain.
    pub fn heading(&mut self, text: &str) {
        self.ensure_space(30.0);
        self.space(4.0);
        self.text(text, 15.0, 0.0, true, NAVY);
        self.space(2.0);
    }

    pub fn subheading(&mut self, text: &str) {
        self.ensure_space(15.0);
        self.text(text, 11.5, 0.0, true, BLACK);
        self.space(1.0);
    }

    pub fn label(&mut self, text: &str) {
        self.text(text, 10.0, 0.0, true, BLACK);
    }

    pub fn note(&mut self, text: &str) {
        self.text(text, 9.0, 0.0, false, GREY);
        self.space(1.5);
    }

    pub fn bullet(&mut self, marker: &str, text: &str, rgb: (f32, f32, f32)) {
        self.text(&format!("{marker} {text}"), 10.0, 5.0, false, rgb);
        self.space(0.8);
    }

    /// `label: value` with the label in bold on its own column.
    pub fn field(&mut self, label: &str, value: &str) {
        let value = if value.trim().is_empty() { "Not specified" } else { value };
        let label = crate::format::sanitize(label);
        let lines = crate::format::wrap_text(
            &crate::format::sanitize(value),
            Self::chars_per_line(10.0, 60.0),
        );

        for (i, line) in lines.iter().enumerate() {
            let height = Self::line_height(10.0);
            self.ensure_space(height);
            self.y -= Mm(height);
            self.layer.set_fill_color(color(BLACK));
            if i == 0 {
                self.layer
                    .use_text(format!("{label}:"), 10.0, Mm(MARGIN), self.y, &self.bold);
            }
            self.layer
                .use_text(line.as_str(), 10.0, Mm(MARGIN + 60.0), self.y, &self.regular);
        }
        self.space(1.5);
    }

    /// Full-width coloured band with white bold text.
    pub fn banner(&mut self, text: &str, rgb: (f32, f32, f32)) {
        let height = 12.0;
        self.ensure_space(height + 2.0);
        let top = self.y.0;
        self.layer.set_fill_color(color(rgb));
        self.layer.add_rect(Rect::new(
            Mm(MARGIN),
            Mm(top - height),
            Mm(PAGE_WIDTH - MARGIN),
            Mm(top),
        ));
        self.layer.set_fill_color(color((1.0, 1.0, 1.0)));
        self.layer.use_text(
            crate::format::sanitize(text),
            13.0,
            Mm(MARGIN + 4.0),
            Mm(top - height + 4.0),
            &self.bold,
        );
        self.y = Mm(top - height - 3.0);
    }

    /// One scorecard row: label, bar proportional to `score / max`, value text.
    pub fn score_row(&mut self, label: &str, score: f64, max: f64, value: &str, rgb: (f32, f32, f32)) {
        let height = 7.0;
        self.ensure_space(height);
        self.y -= Mm(height);
        let baseline = self.y.0;

        self.layer.set_fill_color(color(BLACK));
        self.layer
            .use_text(crate::format::sanitize(label), 9.5, Mm(MARGIN), Mm(baseline + 1.5), &self.regular);

        let bar_x = MARGIN + 55.0;
        let bar_width = 70.0;
        let fraction = if max > 0.0 { (score / max).clamp(0.0, 1.0) as f32 } else { 0.0 };

        self.layer.set_fill_color(color((0.90, 0.91, 0.93)));
        self.layer.add_rect(Rect::new(
            Mm(bar_x),
            Mm(baseline + 1.0),
            Mm(bar_x + bar_width),
            Mm(baseline + 5.0),
        ));
        if fraction > 0.0 {
            self.layer.set_fill_color(color(rgb));
            self.layer.add_rect(Rect::new(
                Mm(bar_x),
                Mm(baseline + 1.0),
                Mm(bar_x + bar_width * fraction),
                Mm(baseline + 5.0),
            ));
        }

        self.layer.set_fill_color(color(BLACK));
        self.layer.use_text(
            crate::format::sanitize(value),
            9.5,
            Mm(bar_x + bar_width + 4.0),
            Mm(baseline + 1.5),
            &self.bold,
        );
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| render_error("PDF save error", e))?;
        buf.into_inner()
            .map_err(|e| render_error("PDF buffer error", e))
    }
}
