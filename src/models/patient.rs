use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{FeeStatus, PaymentMode, VisitType};
use super::prescription::Prescription;
use super::{or_na, NOT_AVAILABLE};

/// Vital signs captured at registration. The backend stores free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vitals {
    pub blood_pressure: Option<String>,
    pub pulse: Option<String>,
    pub temperature: Option<String>,
    pub weight: Option<String>,
    pub spo2: Option<String>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        [
            &self.blood_pressure,
            &self.pulse,
            &self.temperature,
            &self.weight,
            &self.spo2,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }

    /// Label/value pairs in print order, `"N/A"` for missing readings.
    pub fn rows(&self) -> [(&'static str, String); 5] {
        [
            ("Blood Pressure", or_na(self.blood_pressure.as_deref())),
            ("Pulse", or_na(self.pulse.as_deref())),
            ("Temperature", or_na(self.temperature.as_deref())),
            ("Weight", or_na(self.weight.as_deref())),
            ("SpO2", or_na(self.spo2.as_deref())),
        ]
    }
}

/// One patient visit as returned by the patient endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(alias = "_id")]
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub token_number: Option<u32>,
    /// Chief complaint / disease recorded at registration.
    #[serde(default)]
    pub disease: Option<String>,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default = "default_fee_status")]
    pub fee_status: FeeStatus,
    #[serde(default = "default_visit_type")]
    pub visit_type: VisitType,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub payment_mode: Option<PaymentMode>,
    /// Present on history entries once a prescription was written.
    #[serde(default)]
    pub prescription: Option<Prescription>,
}

fn default_fee_status() -> FeeStatus {
    FeeStatus::Pending
}

fn default_visit_type() -> VisitType {
    VisitType::New
}

impl Patient {
    /// Minimal patient; everything optional left empty.
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            age: None,
            gender: None,
            mobile_number: None,
            token_number: None,
            disease: None,
            vitals: Vitals::default(),
            fee_status: FeeStatus::Pending,
            visit_type: VisitType::New,
            registered_at: None,
            address: None,
            doctor_id: None,
            consultation_fee: None,
            payment_mode: None,
            prescription: None,
        }
    }

    pub fn age_label(&self) -> String {
        self.age
            .map(|a| format!("{a} yrs"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn token_label(&self) -> String {
        self.token_number
            .map(|t| t.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn has_prescription(&self) -> bool {
        self.prescription.is_some()
    }
}
