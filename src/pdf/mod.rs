//! Client-side PDF documents: prescriptions and registration slips.
//!
//! Both generators are pure transforms from view-model structs to bytes.
//! Layout math lives in `layout` so it can be tested without a PDF parser;
//! `prescription` and `registration` only draw what the layout computed.
//! Drawing uses `printpdf` builtin fonts (Helvetica family), A4 portrait.

mod canvas;
pub mod layout;
pub mod prescription;
pub mod registration;

pub use prescription::{
    generate_and_save_prescription_pdf, generate_prescription_pdf, render_prescription_pdf,
};
pub use registration::{generate_registration_pdf, render_registration_pdf};

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Local, NaiveDate};
use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};
use regex::Regex;
use thiserror::Error;

use crate::config;
use crate::models::Patient;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),

    #[error("Cannot write PDF: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered document: raw bytes, the same bytes as a data URI, and the
/// file name a download should use.
#[derive(Debug, Clone)]
pub struct PdfArtifact {
    pub bytes: Vec<u8>,
    pub data_uri: String,
    pub file_name: String,
}

impl PdfArtifact {
    fn new(bytes: Vec<u8>, file_name: String) -> Self {
        let data_uri = to_data_uri(&bytes);
        Self {
            bytes,
            data_uri,
            file_name,
        }
    }
}

/// Branding and clock inputs shared by both generators.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub hospital_name: String,
    /// Date printed in the footer and used in the file name.
    pub printed_on: NaiveDate,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            hospital_name: config::DEFAULT_HOSPITAL_NAME.to_string(),
            printed_on: Local::now().date_naive(),
        }
    }
}

impl PdfOptions {
    pub fn from_config(config: &config::ClientConfig) -> Self {
        Self {
            hospital_name: config.hospital_name.clone(),
            ..Self::default()
        }
    }
}

/// Encodes PDF bytes as `data:application/pdf;base64,...`.
pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(bytes))
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"))
}

/// Collapses anything outside `[A-Za-z0-9_-]` into single underscores.
/// `None` when nothing usable is left, e.g. names in non-Latin script.
pub fn sanitize_file_stem(name: &str) -> Option<String> {
    let stem = unsafe_chars().replace_all(name.trim(), "_");
    let stem = stem.trim_matches('_');
    (!stem.is_empty()).then(|| stem.to_string())
}

/// File-name stem for a patient: the name, else the token, else the id.
/// The literal `patient` is the last resort.
pub fn patient_file_stem(patient: &Patient) -> String {
    sanitize_file_stem(&patient.full_name)
        .or_else(|| patient.token_number.map(|t| format!("token_{t}")))
        .or_else(|| sanitize_file_stem(&patient.id).map(|id| format!("patient_{id}")))
        .unwrap_or_else(|| "patient".to_string())
}

pub fn prescription_file_name(patient: &Patient, date: NaiveDate) -> String {
    format!(
        "Prescription_{}_{}.pdf",
        patient_file_stem(patient),
        date.format("%Y-%m-%d")
    )
}

pub fn registration_file_name(patient: &Patient, date: NaiveDate) -> String {
    let token = patient
        .token_number
        .map(|t| t.to_string())
        .unwrap_or_else(|| "NA".into());
    format!(
        "Registration_{}_{}_{}.pdf",
        patient_file_stem(patient),
        token,
        date.format("%Y-%m-%d")
    )
}

/// Writes PDF bytes into `dir` (created if missing) and returns the path.
pub fn save_download(bytes: &[u8], file_name: &str, dir: &Path) -> Result<PathBuf, PdfError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), size = bytes.len(), "PDF saved");
    Ok(path)
}

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Helvetica advance widths (1/1000 em) for ASCII 0x20..=0x7E, from the
/// standard AFM metrics.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Outside printable ASCII the builtin font has no reliable metric; a full
/// em keeps such text inside its box.
const FALLBACK_WIDTH: u16 = 1000;

fn glyph_width(c: char) -> u16 {
    match c as u32 {
        code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in millimetres at `font_size` points.
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    units as f32 / 1000.0 * font_size * MM_PER_PT
}

/// Word-wraps `text` so every line fits `width_mm` at `font_size` points.
pub fn wrap_text(text: &str, width_mm: f32, font_size: f32) -> Vec<String> {
    wrap_measured(text, |s| text_width_mm(s, font_size) <= width_mm)
}

/// Greedy word wrap; words wider than a line are hard-split. A line always
/// takes at least one character so wrapping terminates.
fn wrap_measured(text: &str, fits: impl Fn(&str) -> bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for paragraph in text.lines() {
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
                continue;
            }
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// `text` on one line, cut with an ellipsis when it does not fit.
pub fn fit_line(text: &str, width_mm: f32, font_size: f32) -> String {
    let text = text.trim();
    if text_width_mm(text, font_size) <= width_mm {
        return text.to_string();
    }
    let mut cut = String::new();
    for c in text.chars() {
        cut.push(c);
        if text_width_mm(&format!("{cut}..."), font_size) > width_mm {
            cut.pop();
            break;
        }
    }
    format!("{}...", cut.trim_end())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, PdfError> {
        let font = |f: BuiltinFont| {
            doc.add_builtin_font(f)
                .map_err(|e| PdfError::Font(e.to_string()))
        };
        Ok(Self {
            regular: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            italic: font(BuiltinFont::HelveticaOblique)?,
        })
    }
}

fn save_document(doc: PdfDocumentReference) -> Result<Vec<u8>, PdfError> {
    let mut buf = std::io::BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| PdfError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| PdfError::Save(format!("PDF buffer error: {e}")))
}
