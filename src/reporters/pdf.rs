//! PDF reporter
//!
//! A4 pages, built-in Helvetica, top-down text flow. Long values wrap on
//! word boundaries and a new page starts whenever the cursor reaches the
//! bottom margin. Built-in fonts only cover ASCII reliably, so anything else
//! is replaced before layout.

use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::models::Report;

/// Issues listed in the accessibility section
pub const MAX_LISTED_ISSUES: usize = 15;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 14.0;
const TITLE_SIZE: f32 = 20.0;
/// Helvetica averages about half an em per glyph
const AVG_GLYPH_EM: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

/// Render a report as PDF bytes
pub fn render(report: &Report) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new("Website Audit Report")?;

    pdf.text("Website Audit Report", TITLE_SIZE, true);
    pdf.gap(2.0);
    pdf.field("URL", report.url.as_str());
    pdf.field("Score", &format!("{}/100", report.score));
    pdf.field(
        "Generated",
        &chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    let sec = &report.security;
    pdf.heading("Security");
    pdf.field("HTTPS", yes_no(sec.uses_secure_transport));
    pdf.field("Present headers", &join_or_none(sec.present_headers.iter()));
    pdf.field("Missing headers", &join_or_none(sec.missing_headers.iter()));

    let perf = &report.performance;
    pdf.heading("Performance");
    pdf.field("Load time", &format!("{} ms", perf.load_time_ms));
    pdf.field("Resources", &perf.resource_count.to_string());
    pdf.field("Transfer size", &format!("{} bytes", perf.total_transfer_bytes));
    pdf.field("DOM nodes", &perf.dom_node_count.to_string());

    let seo = &report.seo;
    pdf.heading("SEO");
    pdf.field("Title", or_none(&seo.title));
    pdf.field("Meta description", or_none(&seo.meta_description));
    pdf.field("H1 headings", &seo.h1_count.to_string());
    pdf.field("Images without alt", &seo.images_missing_alt.to_string());

    let a11y = &report.accessibility;
    pdf.heading("Accessibility");
    pdf.field("Issues found", &a11y.issue_count.to_string());
    for (i, issue) in a11y.issues.iter().take(MAX_LISTED_ISSUES).enumerate() {
        let message = issue.message.split_whitespace().collect::<Vec<_>>().join(" ");
        pdf.paragraph(&format!("{}. [{}] {}", i + 1, issue.code, message));
    }
    let listed = a11y.issues.len().min(MAX_LISTED_ISSUES) as u64;
    if a11y.issue_count > listed {
        pdf.paragraph(&format!("... and {} more", a11y.issue_count - listed));
    }

    pdf.finish()
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, in mm from the page bottom
    cursor: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load font: {e:?}"))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load font: {e:?}"))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT - MARGIN,
        })
    }

    fn line_height(size: f32) -> f32 {
        size * PT_TO_MM * 1.4
    }

    fn ensure_room(&mut self, height: f32) {
        if self.cursor - height < MARGIN {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        let height = Self::line_height(size);
        self.ensure_room(height);
        self.cursor -= height;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(sanitize(text), size, Mm(MARGIN), Mm(self.cursor), font);
    }

    fn gap(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    fn heading(&mut self, title: &str) {
        self.gap(4.0);
        self.text(title, HEADING_SIZE, true);
        self.gap(1.0);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, chars_per_line(BODY_SIZE)) {
            self.text(&line, BODY_SIZE, false);
        }
    }

    fn field(&mut self, label: &str, value: &str) {
        self.paragraph(&format!("{label}: {value}"));
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| anyhow!("Failed to write PDF: {e:?}"))
    }
}

fn chars_per_line(size: f32) -> usize {
    let usable_pt = (PAGE_WIDTH - 2.0 * MARGIN) / PT_TO_MM;
    (usable_pt / (size * AVG_GLYPH_EM)) as usize
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a String>) -> String {
    let joined = items.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}
