//! REST collaborators: the hospital backend as seen from the desk client.
//!
//! `ClinicApi` is the seam every screen talks through; `ApiClient` is the
//! blocking `reqwest` implementation. Screens never build URLs themselves.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::*;

use crate::models::{DoctorStats, Patient};
use crate::upload::ProfilePhoto;

pub trait ClinicApi {
    /// `GET /patient/today/:doctorId`
    fn today_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError>;

    /// `GET /patient/emergency/:doctorId`
    fn emergency_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError>;

    /// `GET /doctor/:id/patients/history`
    fn patient_history(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError>;

    /// `GET /patient`
    fn list_patients(&self) -> Result<Vec<Patient>, ApiError>;

    /// `GET /doctor/:id/stats`
    fn doctor_stats(&self, doctor_id: &str) -> Result<DoctorStats, ApiError>;

    /// `PUT /doctor/:id/availability`
    fn set_availability(&self, doctor_id: &str, available: bool) -> Result<(), ApiError>;

    /// `PUT /doctor/:id/patient-limit`
    fn set_patient_limit(&self, doctor_id: &str, limit: u32) -> Result<(), ApiError>;

    /// `PUT /patient/:id/payment`
    fn update_payment(&self, patient_id: &str, update: &PaymentUpdate) -> Result<(), ApiError>;

    /// `PUT /prescription/:id`
    fn save_prescription(
        &self,
        patient_id: &str,
        submission: &PrescriptionSubmission,
    ) -> Result<(), ApiError>;

    /// `GET /inventory/medicines`
    fn search_medicines(&self, query: &MedicineQuery) -> Result<MedicinePage, ApiError>;

    /// `GET /inventory/medicines/search/suggestions`
    fn medicine_suggestions(&self, query: &str) -> Result<Vec<String>, ApiError>;

    /// `GET /inventory/export/excel`
    ///
    /// Raw spreadsheet bytes.
    fn export_inventory(&self) -> Result<Vec<u8>, ApiError>;

    /// `PUT /doctor/:id/profile-image` (multipart). Returns the stored image URL.
    fn upload_profile_image(&self, doctor_id: &str, photo: &ProfilePhoto) -> Result<String, ApiError>;

    /// `DELETE /doctor/:id/profile-image`
    fn remove_profile_image(&self, doctor_id: &str) -> Result<(), ApiError>;
}
