//! Prescription document: header band, patient and doctor cards, diagnosis,
//! medicine table, notes, optional inventory references, fixed footer.

use std::path::{Path, PathBuf};

use super::canvas::{Canvas, Pen, Style, BORDER, BRAND, BRAND_LIGHT, INK, MUTED, SHADE, WHITE};
use super::layout::{
    column_offsets, column_widths, layout_prescription, Section, CARD_GAP, CARD_HEIGHT, CARD_TOP,
    CARD_WIDTH, CELL_INSET, CONTENT_WIDTH, FOOTER_Y, HEADER_HEIGHT, LINE_HEIGHT, MARGIN,
    NOTES_PADDING, PAGE_WIDTH, ROW_PADDING, TABLE_HEADER_HEIGHT,
};
use super::{fit_line, prescription_file_name, save_download, PdfArtifact, PdfError, PdfOptions};
use crate::config::ClientConfig;
use crate::models::{or_na, Doctor, Patient, Prescription};

pub const DOCUMENT_TITLE: &str = "Medical Prescription";
pub const DISCLAIMER: &str =
    "This is a computer-generated prescription. Do not change or stop any medicine without consulting your doctor.";

/// Baseline offset of a text line inside a `LINE_HEIGHT` slot.
const BASELINE: f32 = 3.7;

const TITLE_PEN: Pen = Pen::new(18.0, Style::Bold, WHITE);
const SUBTITLE_PEN: Pen = Pen::new(11.0, Style::Regular, WHITE);
const CARD_TITLE_PEN: Pen = Pen::new(11.0, Style::Bold, BRAND);
const CARD_PEN: Pen = Pen::new(9.0, Style::Regular, INK);
const LABEL_PEN: Pen = Pen::new(12.0, Style::Bold, BRAND);
const BODY_PEN: Pen = Pen::new(10.0, Style::Regular, INK);
const TABLE_HEAD_PEN: Pen = Pen::new(10.0, Style::Bold, INK);
const TABLE_PEN: Pen = Pen::new(9.5, Style::Regular, INK);
const FOOTER_PEN: Pen = Pen::new(9.0, Style::Regular, INK);
const DISCLAIMER_PEN: Pen = Pen::new(7.5, Style::Italic, MUTED);

/// Renders the prescription with explicit branding/date.
pub fn render_prescription_pdf(
    patient: &Patient,
    doctor: &Doctor,
    prescription: &Prescription,
    options: &PdfOptions,
) -> Result<PdfArtifact, PdfError> {
    let layout = layout_prescription(prescription);
    let canvas = Canvas::new(
        &format!("Prescription - {}", patient.full_name),
        layout.page_count,
    )?;

    draw_header(&canvas, patient, prescription, options);
    draw_cards(&canvas, patient, doctor, prescription);

    draw_section(&canvas, "Diagnosis", &layout.diagnosis, 0.0, false);

    let widths = column_widths();
    let offsets = column_offsets();
    for header in &layout.table_headers {
        canvas.fill_rect(header.page, MARGIN, header.top, CONTENT_WIDTH, TABLE_HEADER_HEIGHT, SHADE);
        canvas.stroke_rect(header.page, MARGIN, header.top, CONTENT_WIDTH, TABLE_HEADER_HEIGHT);
        for (title, x) in ["Medicine", "Dosage", "Duration"].iter().zip(offsets) {
            canvas.text(header.page, title, x + CELL_INSET, header.top + 5.5, TABLE_HEAD_PEN);
        }
    }
    for row in &layout.rows {
        for (col, lines) in row.cells.iter().enumerate() {
            canvas.stroke_rect(row.page, offsets[col], row.top, widths[col], row.height);
            for (i, line) in lines.iter().enumerate() {
                let baseline = row.top + ROW_PADDING / 2.0 + i as f32 * LINE_HEIGHT + BASELINE;
                canvas.text(row.page, line, offsets[col] + CELL_INSET, baseline, TABLE_PEN);
            }
        }
    }

    if let Some(notes) = &layout.notes {
        draw_section(&canvas, "Notes", notes, NOTES_PADDING, true);
    }
    if let Some(inventory) = &layout.inventory {
        draw_section(&canvas, "Inventory Items", inventory, 0.0, false);
    }
    if let Some(tests) = &layout.tests {
        draw_section(&canvas, "Recommended Tests", tests, 0.0, false);
    }

    let page_count = canvas.page_count();
    for page in 0..page_count {
        draw_footer(&canvas, page, page_count, doctor, options);
    }

    let bytes = canvas.finish()?;
    tracing::info!(
        medicines = prescription.medicines.len(),
        pages = page_count,
        size = bytes.len(),
        "Prescription PDF rendered"
    );
    Ok(PdfArtifact::new(
        bytes,
        prescription_file_name(patient, options.printed_on),
    ))
}

/// Renders the prescription using environment branding and today's date.
pub fn generate_prescription_pdf(
    patient: &Patient,
    doctor: &Doctor,
    prescription: &Prescription,
) -> Result<PdfArtifact, PdfError> {
    let options = PdfOptions::from_config(&ClientConfig::from_env());
    render_prescription_pdf(patient, doctor, prescription, &options)
}

/// Renders and also saves a copy into `dir`, like a browser download.
pub fn generate_and_save_prescription_pdf(
    patient: &Patient,
    doctor: &Doctor,
    prescription: &Prescription,
    dir: &Path,
) -> Result<(PdfArtifact, PathBuf), PdfError> {
    let artifact = generate_prescription_pdf(patient, doctor, prescription)?;
    let path = save_download(&artifact.bytes, &artifact.file_name, dir)?;
    Ok((artifact, path))
}

fn draw_header(canvas: &Canvas, patient: &Patient, prescription: &Prescription, options: &PdfOptions) {
    canvas.fill_rect(0, 0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, BRAND);
    canvas.text(0, &options.hospital_name, MARGIN, 12.0, TITLE_PEN);
    canvas.text(0, DOCUMENT_TITLE, MARGIN, 20.0, SUBTITLE_PEN);

    let issued = prescription.created_at.format("%d %b %Y").to_string();
    canvas.text(0, &format!("Date: {issued}"), PAGE_WIDTH - MARGIN - 45.0, 12.0, SUBTITLE_PEN);
    if let Some(follow_up) = prescription.follow_up_date {
        let label = format!("Follow-up: {}", follow_up.format("%d %b %Y"));
        canvas.text(0, &label, PAGE_WIDTH - MARGIN - 45.0, 20.0, SUBTITLE_PEN);
    }

    for page in 1..canvas.page_count() {
        canvas.fill_rect(page, 0.0, 0.0, PAGE_WIDTH, 4.0, BRAND);
        let label = format!("{DOCUMENT_TITLE} - {} (continued)", patient.full_name);
        canvas.text(page, &label, MARGIN, 12.0, Pen::new(9.0, Style::Italic, MUTED));
    }
}

fn draw_cards(canvas: &Canvas, patient: &Patient, doctor: &Doctor, prescription: &Prescription) {
    let patient_lines = [
        format!("Name: {}", patient.full_name),
        format!(
            "Age / Gender: {} / {}",
            patient.age_label(),
            or_na(patient.gender.as_deref())
        ),
        format!("Mobile: {}", or_na(patient.mobile_number.as_deref())),
        format!(
            "Token No: {}    Fee: {}",
            patient.token_label(),
            patient.fee_status.label()
        ),
        format!("Complaint: {}", or_na(patient.disease.as_deref())),
    ];
    draw_card(canvas, MARGIN, "Patient Details", &patient_lines);

    let doctor_lines = [
        doctor.display_name(),
        format!("Specialization: {}", or_na(doctor.specialization.as_deref())),
        format!("Qualification: {}", or_na(doctor.qualification.as_deref())),
        format!("Reg. No: {}", or_na(doctor.registration_number.as_deref())),
        format!("Issued: {}", prescription.created_at.format("%d/%m/%Y %H:%M")),
    ];
    draw_card(canvas, MARGIN + CARD_WIDTH + CARD_GAP, "Doctor", &doctor_lines);
}

fn draw_card(canvas: &Canvas, x: f32, title: &str, lines: &[String]) {
    canvas.fill_rect(0, x, CARD_TOP, CARD_WIDTH, 8.0, BRAND_LIGHT);
    canvas.stroke_rect(0, x, CARD_TOP, CARD_WIDTH, CARD_HEIGHT);
    canvas.text(0, title, x + 3.0, CARD_TOP + 5.8, CARD_TITLE_PEN);
    for (i, line) in lines.iter().enumerate() {
        let text = fit_line(line, CARD_WIDTH - 6.0, CARD_PEN.size);
        canvas.text(0, &text, x + 3.0, CARD_TOP + 13.0 + i as f32 * 5.0, CARD_PEN);
    }
}

fn draw_section(canvas: &Canvas, label: &str, section: &Section, padding: f32, boxed: bool) {
    canvas.text(section.label_page, label, MARGIN, section.label_top + 4.5, LABEL_PEN);
    let inset = if boxed { CELL_INSET } else { 0.0 };
    for segment in &section.segments {
        if boxed {
            canvas.stroke_rect(segment.page, MARGIN, segment.top, CONTENT_WIDTH, segment.height);
        }
        for (i, line) in segment.lines.iter().enumerate() {
            let baseline = segment.top + padding / 2.0 + i as f32 * LINE_HEIGHT + BASELINE;
            canvas.text(segment.page, line, MARGIN + inset, baseline, BODY_PEN);
        }
    }
}

fn draw_footer(canvas: &Canvas, page: usize, page_count: usize, doctor: &Doctor, options: &PdfOptions) {
    let sig_left = PAGE_WIDTH - MARGIN - 60.0;
    canvas.rule(page, sig_left, PAGE_WIDTH - MARGIN, FOOTER_Y, BORDER);
    canvas.text(page, "Doctor's Signature", sig_left, FOOTER_Y + 5.0, FOOTER_PEN);
    canvas.text(page, &doctor.display_name(), sig_left, FOOTER_Y + 9.5, CARD_PEN);

    let date = format!("Date: {}", options.printed_on.format("%d/%m/%Y"));
    canvas.text(page, &date, MARGIN, FOOTER_Y + 5.0, FOOTER_PEN);
    canvas.text(page, DISCLAIMER, MARGIN, FOOTER_Y + 15.0, DISCLAIMER_PEN);

    if page_count > 1 {
        let label = format!("Page {} of {}", page + 1, page_count);
        canvas.text(page, &label, PAGE_WIDTH - MARGIN - 20.0, FOOTER_Y + 20.0, DISCLAIMER_PEN);
    }
}
