use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(alias = "_id")]
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub daily_patient_limit: Option<u32>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl Doctor {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            specialization: None,
            qualification: None,
            registration_number: None,
            department: None,
            profile_image: None,
            daily_patient_limit: None,
            is_available: true,
        }
    }

    /// "Dr. <name>" unless the stored name already carries the prefix.
    pub fn display_name(&self) -> String {
        let name = self.full_name.trim();
        let lower = name.to_lowercase();
        if lower.starts_with("dr.") || lower.starts_with("dr ") {
            name.to_string()
        } else {
            format!("Dr. {name}")
        }
    }
}

/// Daily capacity snapshot from `GET /doctor/:id/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorStats {
    pub daily_limit: u32,
    pub today_count: u32,
    pub remaining_slots: u32,
    pub is_available: bool,
}

impl DoctorStats {
    pub fn is_full(&self) -> bool {
        self.remaining_slots == 0 || self.today_count >= self.daily_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_adds_prefix_once() {
        assert_eq!(Doctor::new("d1", "Meera Iyer").display_name(), "Dr. Meera Iyer");
        assert_eq!(Doctor::new("d1", "Dr. Meera Iyer").display_name(), "Dr. Meera Iyer");
        assert_eq!(Doctor::new("d1", "Drishti Rao").display_name(), "Dr. Drishti Rao");
    }

    #[test]
    fn availability_defaults_true() {
        let doctor: Doctor = serde_json::from_str(r#"{"_id":"d1","fullName":"A"}"#).unwrap();
        assert!(doctor.is_available);
    }

    #[test]
    fn stats_full_when_no_slots() {
        let stats = DoctorStats {
            daily_limit: 20,
            today_count: 20,
            remaining_slots: 0,
            is_available: true,
        };
        assert!(stats.is_full());
    }
}
