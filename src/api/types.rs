//! Request and response bodies for the backend endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{FeeStatus, MedicineRecord, PaymentMode, Prescription};

/// The backend answers either with the bare payload or with
/// `{ "success": .., "data": .., "message": .. }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Envelope {
        data: T,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Payload::Envelope { data, .. } => data,
            Payload::Bare(data) => data,
        }
    }

    /// Status text the backend attached to an enveloped response.
    pub fn message(&self) -> Option<&str> {
        match self {
            Payload::Envelope { message, .. } => message.as_deref(),
            Payload::Bare(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityUpdate {
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientLimitUpdate {
    pub daily_patient_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub fee_status: FeeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Body of `PUT /prescription/:id`: the structured prescription plus the
/// rendered PDF as a data URI for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionSubmission {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub doctor_id: String,
    pub pdf_data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MedicineSort {
    #[default]
    Name,
    Stock,
    Expiry,
}

impl MedicineSort {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Stock => "stockQuantity",
            Self::Expiry => "expiryDate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Paged, sorted inventory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_by: MedicineSort,
    pub sort_order: SortOrder,
    pub search: Option<String>,
}

impl Default for MedicineQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_by: MedicineSort::Name,
            sort_order: SortOrder::Asc,
            search: None,
        }
    }
}

impl MedicineQuery {
    /// Query-string pairs; blank search terms are left out.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.max(1).to_string()),
            ("sortBy", self.sort_by.as_param().to_string()),
            ("sortOrder", self.sort_order.as_param().to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicinePage {
    #[serde(default)]
    pub medicines: Vec<MedicineRecord>,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResponse {
    #[serde(alias = "imageUrl", alias = "url")]
    pub profile_image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    #[test]
    fn payload_accepts_envelope() {
        let json = r#"{"success":true,"data":[{"_id":"p1","fullName":"A"}],"message":"ok"}"#;
        let patients = serde_json::from_str::<Payload<Vec<Patient>>>(json)
            .unwrap()
            .into_inner();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, "p1");
    }

    #[test]
    fn payload_accepts_bare() {
        let json = r#"[{"id":"p1","fullName":"A"},{"id":"p2","fullName":"B"}]"#;
        let patients = serde_json::from_str::<Payload<Vec<Patient>>>(json)
            .unwrap()
            .into_inner();
        assert_eq!(patients.len(), 2);
    }

    #[test]
    fn medicine_query_params_skip_blank_search() {
        let query = MedicineQuery {
            search: Some("  ".into()),
            sort_by: MedicineSort::Expiry,
            sort_order: SortOrder::Desc,
            ..MedicineQuery::default()
        };
        let params = query.params();
        assert_eq!(params.len(), 4);
        assert!(params.contains(&("sortBy", "expiryDate".to_string())));
        assert!(params.contains(&("sortOrder", "desc".to_string())));
    }

    #[test]
    fn payment_update_omits_absent_fields() {
        let update = PaymentUpdate {
            fee_status: FeeStatus::Paid,
            payment_mode: None,
            amount: None,
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"feeStatus":"paid"}"#);
    }

    #[test]
    fn profile_image_response_aliases() {
        let r: ProfileImageResponse = serde_json::from_str(r#"{"imageUrl":"/u/a.png"}"#).unwrap();
        assert_eq!(r.profile_image, "/u/a.png");
    }
}
