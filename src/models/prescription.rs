use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::inventory::InventoryItem;

/// One row of the medicine table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub name: String,
    /// Dosage descriptor, e.g. "Morning, Night - after food".
    pub dosage: String,
    /// Free text, e.g. "5 days".
    pub duration: String,
}

impl Medicine {
    pub fn new(
        name: impl Into<String>,
        dosage: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
            duration: duration.into(),
        }
    }

    /// Name, dosage and duration all non-blank.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.dosage.trim().is_empty()
            && !self.duration.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub inventory_items: Vec<InventoryItem>,
    #[serde(default)]
    pub recommended_tests: Vec<String>,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Prescription {
    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }
}
