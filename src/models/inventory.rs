use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::InventoryCategory;

/// Reference catalog entry a doctor can attach to a prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    pub code: String,
    /// Strength descriptor, e.g. "500 mg/2 ml".
    pub dosage: String,
    pub usage: String,
    pub category: InventoryCategory,
}

/// Medicine stock record from `GET /inventory/medicines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl MedicineRecord {
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medicine_record_expiry() {
        let record: MedicineRecord = serde_json::from_str(
            r#"{"_id":"m1","name":"Amoxicillin","stockQuantity":0,"expiryDate":"2026-01-31"}"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(record.is_expired(today));
        assert!(!record.in_stock());
    }
}
