//! Registration slip handed to the patient at the front desk.
//!
//! Unlike the prescription, every block has a fixed height: the slip never
//! grows with content, long values are cut to one line.

use super::canvas::{Canvas, Pen, Style, BRAND, BRAND_LIGHT, INK, MUTED, SHADE, WHITE};
use super::layout::{
    registration_blocks, RegistrationBlock, CONTENT_WIDTH, FOOTER_Y, HEADER_HEIGHT, MARGIN,
    PAGE_WIDTH,
};
use super::{fit_line, registration_file_name, PdfArtifact, PdfError, PdfOptions};
use crate::config::ClientConfig;
use crate::models::{or_na, Doctor, Patient, NOT_AVAILABLE};

pub const DOCUMENT_TITLE: &str = "Patient Registration";
pub const FOOTER_NOTE: &str =
    "Please keep this slip with you and present it at the consultation desk when your token is called.";

const TITLE_PEN: Pen = Pen::new(18.0, Style::Bold, WHITE);
const SUBTITLE_PEN: Pen = Pen::new(11.0, Style::Regular, WHITE);
const BLOCK_TITLE_PEN: Pen = Pen::new(11.0, Style::Bold, BRAND);
const LABEL_PEN: Pen = Pen::new(9.0, Style::Bold, INK);
const VALUE_PEN: Pen = Pen::new(9.0, Style::Regular, INK);
const TOKEN_PEN: Pen = Pen::new(16.0, Style::Bold, BRAND);
const NOTE_PEN: Pen = Pen::new(8.0, Style::Italic, MUTED);

const ROW_STEP: f32 = 5.5;
const LABEL_WIDTH: f32 = 34.0;

/// Renders the registration slip. Returns the artifact only; saving is up
/// to the caller.
pub fn render_registration_pdf(
    patient: &Patient,
    doctor: &Doctor,
    options: &PdfOptions,
) -> Result<PdfArtifact, PdfError> {
    let canvas = Canvas::new(&format!("Registration - {}", patient.full_name), 1)?;

    canvas.fill_rect(0, 0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, BRAND);
    canvas.text(0, &options.hospital_name, MARGIN, 12.0, TITLE_PEN);
    canvas.text(0, DOCUMENT_TITLE, MARGIN, 20.0, SUBTITLE_PEN);

    for (block, top) in registration_blocks() {
        draw_block(&canvas, block, top, patient, doctor, options);
    }

    canvas.rule(0, MARGIN, PAGE_WIDTH - MARGIN, FOOTER_Y, MUTED);
    canvas.text(0, FOOTER_NOTE, MARGIN, FOOTER_Y + 6.0, NOTE_PEN);
    let printed = format!("Printed on {}", options.printed_on.format("%d/%m/%Y"));
    canvas.text(0, &printed, MARGIN, FOOTER_Y + 11.0, NOTE_PEN);

    let bytes = canvas.finish()?;
    tracing::info!(token = ?patient.token_number, size = bytes.len(), "Registration PDF rendered");
    Ok(PdfArtifact::new(
        bytes,
        registration_file_name(patient, options.printed_on),
    ))
}

/// Renders with environment branding and today's date.
pub fn generate_registration_pdf(patient: &Patient, doctor: &Doctor) -> Result<PdfArtifact, PdfError> {
    let options = PdfOptions::from_config(&ClientConfig::from_env());
    render_registration_pdf(patient, doctor, &options)
}

/// Label/value rows printed inside a block.
pub fn block_rows(
    block: RegistrationBlock,
    patient: &Patient,
    doctor: &Doctor,
) -> Vec<(&'static str, String)> {
    match block {
        RegistrationBlock::TokenBanner => vec![("Token No", patient.token_label())],
        RegistrationBlock::PatientInfo => vec![
            ("Name", patient.full_name.clone()),
            ("Age", patient.age_label()),
            ("Gender", or_na(patient.gender.as_deref())),
            ("Mobile", or_na(patient.mobile_number.as_deref())),
            ("Address", or_na(patient.address.as_deref())),
        ],
        RegistrationBlock::DoctorInfo => vec![
            ("Doctor", doctor.display_name()),
            ("Specialization", or_na(doctor.specialization.as_deref())),
            ("Department", or_na(doctor.department.as_deref())),
        ],
        RegistrationBlock::VisitDetails => vec![
            ("Visit Type", patient.visit_type.label().to_string()),
            ("Chief Complaint", or_na(patient.disease.as_deref())),
            (
                "Registered At",
                patient
                    .registered_at
                    .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
        ],
        RegistrationBlock::Vitals => patient.vitals.rows().to_vec(),
        RegistrationBlock::Payment => vec![
            ("Fee Status", patient.fee_status.label().to_string()),
            (
                "Amount",
                patient
                    .consultation_fee
                    .map(|fee| format!("Rs. {fee:.2}"))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            (
                "Payment Mode",
                patient
                    .payment_mode
                    .map(|m| m.label().to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
        ],
    }
}

fn draw_block(
    canvas: &Canvas,
    block: RegistrationBlock,
    top: f32,
    patient: &Patient,
    doctor: &Doctor,
    options: &PdfOptions,
) {
    let height = block.height();
    let rows = block_rows(block, patient, doctor);

    if block == RegistrationBlock::TokenBanner {
        canvas.fill_rect(0, MARGIN, top, CONTENT_WIDTH, height, BRAND_LIGHT);
        canvas.stroke_rect(0, MARGIN, top, CONTENT_WIDTH, height);
        let token = format!("Token No: {}", patient.token_label());
        canvas.text(0, &token, MARGIN + 4.0, top + 11.5, TOKEN_PEN);
        let date = format!("Date: {}", options.printed_on.format("%d %b %Y"));
        canvas.text(0, &date, PAGE_WIDTH - MARGIN - 45.0, top + 11.0, VALUE_PEN);
        return;
    }

    canvas.fill_rect(0, MARGIN, top, CONTENT_WIDTH, 7.0, SHADE);
    canvas.stroke_rect(0, MARGIN, top, CONTENT_WIDTH, height);
    canvas.text(0, block.title(), MARGIN + 3.0, top + 5.2, BLOCK_TITLE_PEN);

    // Vitals use two columns to stay within the fixed block height.
    let columns = if block == RegistrationBlock::Vitals { 2 } else { 1 };
    let column_width = CONTENT_WIDTH / columns as f32;
    let per_column = rows.len().div_ceil(columns);
    for (i, (label, value)) in rows.iter().enumerate() {
        let col = i / per_column;
        let row = i % per_column;
        let x = MARGIN + 3.0 + col as f32 * column_width;
        let baseline = top + 12.0 + row as f32 * ROW_STEP;
        canvas.text(0, &format!("{label}:"), x, baseline, LABEL_PEN);
        let value = fit_line(value, column_width - LABEL_WIDTH - 6.0, VALUE_PEN.size);
        canvas.text(0, &value, x + LABEL_WIDTH, baseline, VALUE_PEN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeeStatus, PaymentMode, VisitType};
    use chrono::NaiveDate;

    fn options() -> PdfOptions {
        PdfOptions {
            hospital_name: "City Care Hospital".into(),
            printed_on: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        }
    }

    #[test]
    fn test_pdf_registration_generation() {
        let mut patient = Patient::new("p-1", "Asha Verma");
        patient.token_number = Some(14);
        patient.consultation_fee = Some(300.0);
        patient.payment_mode = Some(PaymentMode::Upi);
        patient.fee_status = FeeStatus::Paid;
        let doctor = Doctor::new("d-1", "Meera Iyer");

        let artifact = render_registration_pdf(&patient, &doctor, &options()).unwrap();
        assert_eq!(&artifact.bytes[0..4], b"%PDF");
        assert!(artifact.data_uri.starts_with("data:application/pdf;base64,"));
        assert_eq!(artifact.file_name, "Registration_Asha_Verma_14_2026-03-02.pdf");
    }

    #[test]
    fn missing_fields_print_na() {
        let patient = Patient::new("p-2", "Ravi");
        let doctor = Doctor::new("d-1", "Meera Iyer");
        let rows = block_rows(RegistrationBlock::PatientInfo, &patient, &doctor);
        assert_eq!(rows[1], ("Age", "N/A".to_string()));
        assert_eq!(rows[4], ("Address", "N/A".to_string()));

        let payment = block_rows(RegistrationBlock::Payment, &patient, &doctor);
        assert_eq!(payment[1].1, "N/A");
        assert_eq!(payment[2].1, "N/A");

        let vitals = block_rows(RegistrationBlock::Vitals, &patient, &doctor);
        assert!(vitals.iter().all(|(_, v)| v == "N/A"));
    }

    #[test]
    fn payment_block_formats_amount_and_mode() {
        let mut patient = Patient::new("p-3", "Kiran");
        patient.visit_type = VisitType::Recheckup;
        patient.fee_status = FeeStatus::NotRequired;
        patient.consultation_fee = Some(0.0);
        patient.payment_mode = Some(PaymentMode::Cash);
        let doctor = Doctor::new("d-1", "Meera Iyer");
        let rows = block_rows(RegistrationBlock::Payment, &patient, &doctor);
        assert_eq!(rows[0].1, "Not Required");
        assert_eq!(rows[1].1, "Rs. 0.00");
        assert_eq!(rows[2].1, "Cash");
    }

    #[test]
    fn renders_without_any_optional_data() {
        let artifact = render_registration_pdf(
            &Patient::new("p-4", ""),
            &Doctor::new("d-1", ""),
            &options(),
        )
        .unwrap();
        assert_eq!(&artifact.bytes[0..4], b"%PDF");
        assert_eq!(artifact.file_name, "Registration_patient_NA_2026-03-02.pdf");
    }
}
