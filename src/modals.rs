//! Supporting dialogs of the doctor screen: daily patient-limit editor,
//! capacity notice derived from stats, and the grouped visit history.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::api::ClinicApi;
use crate::error::{AppError, ValidationError};
use crate::models::{DoctorStats, Patient};

pub const MIN_PATIENT_LIMIT: u32 = 1;
pub const MAX_PATIENT_LIMIT: u32 = 200;

/// Remaining slots at or below which the doctor is warned.
pub const NEARLY_FULL_THRESHOLD: u32 = 3;

/// Checks a typed daily limit against the fixed range and today's count.
pub fn validate_patient_limit(input: &str, today_count: u32) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    let value: u32 = trimmed
        .parse()
        .map_err(|_| ValidationError::LimitNotANumber(trimmed.to_string()))?;
    if !(MIN_PATIENT_LIMIT..=MAX_PATIENT_LIMIT).contains(&value) {
        return Err(ValidationError::LimitOutOfRange {
            value,
            min: MIN_PATIENT_LIMIT,
            max: MAX_PATIENT_LIMIT,
        });
    }
    if value < today_count {
        return Err(ValidationError::LimitBelowToday {
            value,
            today: today_count,
        });
    }
    Ok(value)
}

/// State of the "set daily limit" dialog.
#[derive(Debug, Clone)]
pub struct PatientLimitEditor {
    doctor_id: String,
    today_count: u32,
    pub input: String,
}

impl PatientLimitEditor {
    /// Opens prefilled with the current limit.
    pub fn open(doctor_id: impl Into<String>, stats: &DoctorStats) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            today_count: stats.today_count,
            input: stats.daily_limit.to_string(),
        }
    }

    pub fn validate(&self) -> Result<u32, ValidationError> {
        validate_patient_limit(&self.input, self.today_count)
    }

    /// Validates, then sends. Returns the saved limit.
    pub fn save(&self, api: &dyn ClinicApi) -> Result<u32, AppError> {
        let limit = self.validate()?;
        api.set_patient_limit(&self.doctor_id, limit)?;
        tracing::info!(doctor_id = %self.doctor_id, limit, "Daily patient limit updated");
        Ok(limit)
    }
}

/// Capacity notice shown above the doctor's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsNotice {
    Unavailable,
    LimitReached { limit: u32 },
    NearlyFull { remaining: u32 },
}

impl StatsNotice {
    /// Unavailability wins over capacity: an off-duty doctor takes no
    /// registrations regardless of slots.
    pub fn from_stats(stats: &DoctorStats) -> Option<Self> {
        if !stats.is_available {
            Some(Self::Unavailable)
        } else if stats.is_full() {
            Some(Self::LimitReached {
                limit: stats.daily_limit,
            })
        } else if stats.remaining_slots <= NEARLY_FULL_THRESHOLD {
            Some(Self::NearlyFull {
                remaining: stats.remaining_slots,
            })
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Unavailable => {
                "You are marked unavailable. New patients cannot be registered to you.".into()
            }
            Self::LimitReached { limit } => {
                format!("Daily limit of {limit} patients reached. No more registrations today.")
            }
            Self::NearlyFull { remaining: 1 } => "Only 1 patient slot left today.".into(),
            Self::NearlyFull { remaining } => format!("Only {remaining} patient slots left today."),
        }
    }
}

/// Visits sharing one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitGroup {
    /// `None` collects visits without a registration timestamp.
    pub date: Option<NaiveDate>,
    pub visits: Vec<Patient>,
}

/// Whether `visit` belongs to the same person as `patient`: same mobile
/// number when both have one, else same name ignoring case.
pub fn same_person(patient: &Patient, visit: &Patient) -> bool {
    match (patient.mobile_number.as_deref(), visit.mobile_number.as_deref()) {
        (Some(a), Some(b)) if !a.trim().is_empty() && !b.trim().is_empty() => a.trim() == b.trim(),
        _ => patient.full_name.trim().eq_ignore_ascii_case(visit.full_name.trim()),
    }
}

/// Groups visits by date, newest date first and newest visit first within
/// a date. Undated visits come last.
pub fn group_history<'a>(visits: impl IntoIterator<Item = &'a Patient>) -> Vec<VisitGroup> {
    let mut by_date: BTreeMap<Option<NaiveDate>, Vec<Patient>> = BTreeMap::new();
    for visit in visits {
        let date = visit.registered_at.map(|t| t.date_naive());
        by_date.entry(date).or_default().push(visit.clone());
    }
    // BTreeMap orders None first, so reversing puts it last.
    by_date
        .into_iter()
        .rev()
        .map(|(date, mut visits)| {
            visits.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
            VisitGroup { date, visits }
        })
        .collect()
}

/// Prior visits of `patient` found in a doctor's history, grouped by date.
pub fn medical_history(patient: &Patient, history: &[Patient]) -> Vec<VisitGroup> {
    group_history(
        history
            .iter()
            .filter(|v| v.id != patient.id && same_person(patient, v)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use chrono::{TimeZone, Utc};

    fn stats(limit: u32, count: u32, available: bool) -> DoctorStats {
        DoctorStats {
            daily_limit: limit,
            today_count: count,
            remaining_slots: limit.saturating_sub(count),
            is_available: available,
        }
    }

    fn visit(id: &str, name: &str, day: u32, hour: u32) -> Patient {
        let mut p = Patient::new(id, name);
        p.registered_at = Some(Utc.with_ymd_and_hms(2026, 2, day, hour, 0, 0).unwrap());
        p
    }

    #[test]
    fn limit_bounds() {
        assert_eq!(validate_patient_limit(" 40 ", 10), Ok(40));
        assert_eq!(validate_patient_limit("200", 0), Ok(200));
        assert!(matches!(
            validate_patient_limit("0", 0),
            Err(ValidationError::LimitOutOfRange { value: 0, .. })
        ));
        assert!(matches!(
            validate_patient_limit("201", 0),
            Err(ValidationError::LimitOutOfRange { .. })
        ));
        assert!(matches!(
            validate_patient_limit("12.5", 0),
            Err(ValidationError::LimitNotANumber(_))
        ));
        assert!(validate_patient_limit("-3", 0).is_err());
    }

    #[test]
    fn limit_cannot_drop_below_todays_count() {
        assert_eq!(
            validate_patient_limit("8", 9),
            Err(ValidationError::LimitBelowToday { value: 8, today: 9 })
        );
        assert_eq!(validate_patient_limit("9", 9), Ok(9));
    }

    #[test]
    fn editor_saves_only_valid_limit() {
        let api = MockApi::default();
        let mut editor = PatientLimitEditor::open("d1", &stats(30, 12, true));
        assert_eq!(editor.input, "30");

        editor.input = "10".into();
        assert!(matches!(editor.save(&api), Err(AppError::Validation(_))));
        assert_eq!(api.call_count(), 0);

        editor.input = "25".into();
        assert_eq!(editor.save(&api).unwrap(), 25);
        assert_eq!(*api.limits.borrow(), vec![25]);
    }

    #[test]
    fn notices_from_stats() {
        assert_eq!(StatsNotice::from_stats(&stats(30, 10, true)), None);
        assert_eq!(
            StatsNotice::from_stats(&stats(30, 27, true)),
            Some(StatsNotice::NearlyFull { remaining: 3 })
        );
        assert_eq!(
            StatsNotice::from_stats(&stats(30, 30, true)),
            Some(StatsNotice::LimitReached { limit: 30 })
        );
        assert_eq!(
            StatsNotice::from_stats(&stats(30, 30, false)),
            Some(StatsNotice::Unavailable)
        );
    }

    #[test]
    fn notice_messages() {
        assert_eq!(
            StatsNotice::NearlyFull { remaining: 1 }.message(),
            "Only 1 patient slot left today."
        );
        assert!(StatsNotice::LimitReached { limit: 20 }.message().contains("20"));
    }

    #[test]
    fn history_groups_newest_first() {
        let visits = vec![
            visit("v1", "Ravi", 1, 9),
            visit("v2", "Ravi", 3, 9),
            visit("v3", "Ravi", 3, 15),
            Patient::new("v4", "Ravi"),
        ];
        let groups = group_history(&visits);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2026, 2, 3));
        assert_eq!(groups[0].visits[0].id, "v3");
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(groups[2].date, None);
    }

    #[test]
    fn history_matches_by_mobile_then_name() {
        let mut current = visit("now", "Ravi Kumar", 5, 10);
        current.mobile_number = Some("9876543210".into());

        let mut by_mobile = visit("a", "R. Kumar", 2, 10);
        by_mobile.mobile_number = Some("9876543210".into());
        let by_name = visit("b", "ravi kumar", 1, 10);
        let mut other = visit("c", "Ravi Kumar", 1, 11);
        other.mobile_number = Some("9000000000".into());

        let history = vec![current.clone(), by_mobile, by_name, other];
        let groups = medical_history(&current, &history);
        let ids: Vec<_> = groups
            .iter()
            .flat_map(|g| g.visits.iter().map(|v| v.id.as_str()))
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
