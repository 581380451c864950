//! View-model types exchanged with the hospital backend.
//!
//! Everything here is plain data: constructed fresh from API responses or
//! form state, handed to the PDF generators and dashboards, then dropped.

pub mod doctor;
pub mod enums;
pub mod inventory;
pub mod patient;
pub mod prescription;

pub use doctor::*;
pub use enums::*;
pub use inventory::*;
pub use patient::*;
pub use prescription::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Placeholder printed for absent optional fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Returns the trimmed value, or `"N/A"` when absent or blank.
pub fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
