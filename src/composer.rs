//! Prescription composer: the editable draft behind the doctor's
//! "write prescription" form, its validation, and the submit flow.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ClinicApi, PrescriptionSubmission};
use crate::error::{AppError, ValidationError};
use crate::models::{Doctor, InventoryItem, Medicine, Patient, Prescription};
use crate::pdf::{render_prescription_pdf, save_download, PdfArtifact, PdfOptions};

/// Times of day a medicine is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosageTimes {
    pub morning: bool,
    pub afternoon: bool,
    pub night: bool,
}

impl DosageTimes {
    pub const fn new(morning: bool, afternoon: bool, night: bool) -> Self {
        Self {
            morning,
            afternoon,
            night,
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.morning, "Morning"),
            (self.afternoon, "Afternoon"),
            (self.night, "Night"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        !(self.morning || self.afternoon || self.night)
    }
}

/// Builds the dosage descriptor printed in the medicine table:
/// `"<times> - <instructions> | <notes>"`, each part only when present.
pub fn format_dosage(times: DosageTimes, notes: &str, instructions: &str) -> String {
    let mut out = times.labels().join(", ");
    let instructions = instructions.trim();
    if !instructions.is_empty() {
        if !out.is_empty() {
            out.push_str(" - ");
        }
        out.push_str(instructions);
    }
    let notes = notes.trim();
    if !notes.is_empty() {
        if !out.is_empty() {
            out.push_str(" | ");
        }
        out.push_str(notes);
    }
    out
}

/// One editable medicine row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineDraft {
    pub name: String,
    #[serde(default)]
    pub times: DosageTimes,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub duration: String,
    /// Code of the inventory entry the name was picked from, if any.
    #[serde(default)]
    pub inventory_code: Option<String>,
}

impl MedicineDraft {
    pub fn new(name: impl Into<String>, times: DosageTimes, duration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            times,
            duration: duration.into(),
            ..Self::default()
        }
    }

    pub fn dosage(&self) -> String {
        format_dosage(self.times, &self.notes, &self.instructions)
    }

    pub fn to_line(&self) -> Medicine {
        Medicine::new(self.name.trim(), self.dosage(), self.duration.trim())
    }

    pub fn is_complete(&self) -> bool {
        self.to_line().is_complete()
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.times.is_empty()
            && self.instructions.trim().is_empty()
            && self.notes.trim().is_empty()
            && self.duration.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    pub diagnosis: String,
    pub rows: Vec<MedicineDraft>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub inventory_items: Vec<InventoryItem>,
    #[serde(default)]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
}

impl Default for PrescriptionDraft {
    /// The form opens with one empty medicine row.
    fn default() -> Self {
        Self {
            diagnosis: String::new(),
            rows: vec![MedicineDraft::default()],
            notes: String::new(),
            inventory_items: Vec::new(),
            recommended_tests: Vec::new(),
            follow_up_date: None,
        }
    }
}

impl PrescriptionDraft {
    pub fn add_row(&mut self) -> usize {
        self.rows.push(MedicineDraft::default());
        self.rows.len() - 1
    }

    /// Removing the only row clears it instead, so the form keeps one row.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        if self.rows.len() == 1 {
            self.rows[0] = MedicineDraft::default();
        } else {
            self.rows.remove(index);
        }
        true
    }

    pub fn update_row(&mut self, index: usize, edit: impl FnOnce(&mut MedicineDraft)) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                edit(row);
                true
            }
            None => false,
        }
    }

    /// Selects the item, or deselects it when its code is already selected.
    /// Returns whether the item is selected afterwards.
    pub fn toggle_inventory_item(&mut self, item: &InventoryItem) -> bool {
        if let Some(pos) = self.inventory_items.iter().position(|i| i.code == item.code) {
            self.inventory_items.remove(pos);
            false
        } else {
            self.inventory_items.push(item.clone());
            true
        }
    }

    /// Adds a recommended test unless an equal one (ignoring case) is listed.
    pub fn add_test(&mut self, test: &str) -> bool {
        let test = test.trim();
        if test.is_empty()
            || self
                .recommended_tests
                .iter()
                .any(|t| t.eq_ignore_ascii_case(test))
        {
            return false;
        }
        self.recommended_tests.push(test.to_string());
        true
    }

    pub fn remove_test(&mut self, test: &str) {
        self.recommended_tests.retain(|t| !t.eq_ignore_ascii_case(test.trim()));
    }

    pub fn complete_rows(&self) -> impl Iterator<Item = &MedicineDraft> {
        self.rows.iter().filter(|r| r.is_complete())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.diagnosis.trim().is_empty() {
            return Err(ValidationError::MissingDiagnosis);
        }
        if self.complete_rows().next().is_none() {
            return Err(ValidationError::NoCompleteMedicine);
        }
        Ok(())
    }

    /// Validates and produces the prescription; incomplete rows are dropped.
    pub fn build(&self, now: DateTime<Utc>) -> Result<Prescription, ValidationError> {
        self.validate()?;
        Ok(Prescription {
            diagnosis: self.diagnosis.trim().to_string(),
            medicines: self.complete_rows().map(MedicineDraft::to_line).collect(),
            notes: self.notes.trim().to_string(),
            inventory_items: self.inventory_items.clone(),
            recommended_tests: self.recommended_tests.clone(),
            follow_up_date: self.follow_up_date,
            created_at: now,
        })
    }
}

/// Result of a successful submit.
#[derive(Debug, Clone)]
pub struct SubmittedPrescription {
    pub prescription: Prescription,
    pub artifact: PdfArtifact,
    pub saved_to: PathBuf,
}

/// Drives validate, render, download and save for one doctor's session.
#[derive(Debug, Clone)]
pub struct PrescriptionComposer {
    options: PdfOptions,
    download_dir: PathBuf,
}

impl PrescriptionComposer {
    pub fn new(options: PdfOptions, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Nothing reaches the network unless the draft validates. The PDF is
    /// saved locally before the backend call, so a failed save request
    /// still leaves the doctor with a printable copy.
    pub fn submit(
        &self,
        draft: &PrescriptionDraft,
        patient: &Patient,
        doctor: &Doctor,
        api: &dyn ClinicApi,
        now: DateTime<Utc>,
    ) -> Result<SubmittedPrescription, AppError> {
        let prescription = draft.build(now).inspect_err(|e| {
            tracing::info!(patient_id = %patient.id, reason = %e, "Prescription rejected");
        })?;

        let artifact = render_prescription_pdf(patient, doctor, &prescription, &self.options)?;
        let saved_to = save_download(&artifact.bytes, &artifact.file_name, &self.download_dir)?;

        let submission = PrescriptionSubmission {
            prescription: prescription.clone(),
            doctor_id: doctor.id.clone(),
            pdf_data: artifact.data_uri.clone(),
        };
        api.save_prescription(&patient.id, &submission)?;
        tracing::info!(
            patient_id = %patient.id,
            medicines = prescription.medicines.len(),
            "Prescription saved"
        );

        Ok(SubmittedPrescription {
            prescription,
            artifact,
            saved_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::api::ApiError;
    use crate::models::InventoryCategory;

    fn now() -> DateTime<Utc> {
        "2026-03-14T09:30:00Z".parse().unwrap()
    }

    fn options() -> PdfOptions {
        PdfOptions {
            hospital_name: "Test Hospital".into(),
            printed_on: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        }
    }

    fn valid_draft() -> PrescriptionDraft {
        let mut draft = PrescriptionDraft {
            diagnosis: "Viral fever".into(),
            ..PrescriptionDraft::default()
        };
        draft.update_row(0, |row| {
            *row = MedicineDraft::new("Paracetamol 500mg", DosageTimes::new(true, false, true), "5 days");
            row.instructions = "after food".into();
        });
        draft
    }

    #[test]
    fn dosage_descriptor_orders_parts() {
        let times = DosageTimes::new(true, false, true);
        assert_eq!(
            format_dosage(times, "take with milk", "before food"),
            "Morning, Night - before food | take with milk"
        );
    }

    #[test]
    fn dosage_descriptor_skips_blank_parts() {
        let all = DosageTimes::new(true, true, true);
        assert_eq!(format_dosage(all, "", ""), "Morning, Afternoon, Night");
        assert_eq!(format_dosage(DosageTimes::default(), "", "before food"), "before food");
        assert_eq!(format_dosage(DosageTimes::default(), "with milk", ""), "with milk");
        assert_eq!(
            format_dosage(DosageTimes::new(false, true, false), " sos ", "  "),
            "Afternoon | sos"
        );
        assert_eq!(format_dosage(DosageTimes::default(), " ", ""), "");
    }

    #[test]
    fn blank_diagnosis_is_rejected() {
        let mut draft = valid_draft();
        draft.diagnosis = "   ".into();
        assert_eq!(draft.validate(), Err(ValidationError::MissingDiagnosis));
    }

    #[test]
    fn needs_one_complete_row() {
        let mut draft = valid_draft();
        draft.update_row(0, |row| row.duration.clear());
        assert_eq!(draft.validate(), Err(ValidationError::NoCompleteMedicine));

        // No time, instructions or notes means no dosage.
        let mut draft = valid_draft();
        draft.update_row(0, |row| {
            row.times = DosageTimes::default();
            row.instructions.clear();
        });
        assert_eq!(draft.validate(), Err(ValidationError::NoCompleteMedicine));
    }

    #[test]
    fn build_drops_incomplete_rows() {
        let mut draft = valid_draft();
        let idx = draft.add_row();
        draft.update_row(idx, |row| row.name = "Cetirizine".into());
        let idx = draft.add_row();
        draft.update_row(idx, |row| {
            *row = MedicineDraft::new("ORS", DosageTimes::new(false, true, false), "3 days");
        });

        let rx = draft.build(now()).unwrap();
        assert_eq!(rx.medicines.len(), 2);
        assert_eq!(rx.medicines[0].dosage, "Morning, Night - after food");
        assert_eq!(rx.medicines[1].name, "ORS");
        assert_eq!(rx.created_at, now());
    }

    #[test]
    fn removing_last_row_clears_it() {
        let mut draft = valid_draft();
        assert!(draft.remove_row(0));
        assert_eq!(draft.rows.len(), 1);
        assert!(draft.rows[0].is_blank());
        assert!(!draft.remove_row(3));
    }

    #[test]
    fn inventory_toggle_and_tests_dedupe() {
        let item = InventoryItem {
            name: "Ceftriaxone".into(),
            code: "INJ-001".into(),
            dosage: "1 g".into(),
            usage: "IV".into(),
            category: InventoryCategory::Injections,
        };
        let mut draft = valid_draft();
        assert!(draft.toggle_inventory_item(&item));
        assert!(!draft.toggle_inventory_item(&item));
        assert!(draft.inventory_items.is_empty());

        assert!(draft.add_test("CBC"));
        assert!(!draft.add_test("cbc"));
        assert!(!draft.add_test("  "));
        draft.remove_test("CBC");
        assert!(draft.recommended_tests.is_empty());
    }

    #[test]
    fn invalid_submit_makes_no_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let composer = PrescriptionComposer::new(options(), dir.path());
        let api = MockApi::default();
        let draft = PrescriptionDraft {
            diagnosis: "Cough".into(),
            ..PrescriptionDraft::default()
        };
        let err = composer
            .submit(&draft, &Patient::new("p1", "Ravi Kumar"), &Doctor::new("d1", "Asha Rao"), &api, now())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::NoCompleteMedicine)));
        assert_eq!(api.call_count(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn submit_saves_pdf_and_posts_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let composer = PrescriptionComposer::new(options(), dir.path());
        let api = MockApi::default();
        let patient = Patient::new("p1", "Ravi Kumar");

        let done = composer
            .submit(&valid_draft(), &patient, &Doctor::new("d1", "Asha Rao"), &api, now())
            .unwrap();

        assert!(done.saved_to.exists());
        assert_eq!(
            done.saved_to.file_name().unwrap(),
            "Prescription_Ravi_Kumar_2026-03-14.pdf"
        );
        assert_eq!(&done.artifact.bytes[0..4], b"%PDF");

        let saved = api.saved_prescriptions.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "p1");
        assert_eq!(saved[0].1.doctor_id, "d1");
        assert!(saved[0].1.pdf_data.starts_with("data:application/pdf;base64,"));
        assert_eq!(saved[0].1.prescription.diagnosis, "Viral fever");
    }

    #[test]
    fn backend_rejection_keeps_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let composer = PrescriptionComposer::new(options(), dir.path());
        let api = MockApi {
            fail_writes: Some(400),
            ..MockApi::default()
        };
        let err = composer
            .submit(&valid_draft(), &Patient::new("p1", "Ravi"), &Doctor::new("d1", "Asha"), &api, now())
            .unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Server { status: 400, .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
