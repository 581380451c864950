//! App-level error taxonomy. Every screen action returns `AppError`, and
//! `user_message()` is the text of the transient notice shown for it.

use thiserror::Error;

use crate::api::ApiError;
use crate::pdf::PdfError;
use crate::storage::StorageError;
use crate::upload::UploadError;

/// Client-side rejections raised before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a diagnosis")]
    MissingDiagnosis,

    #[error("Add at least one medicine with name, dosage and duration")]
    NoCompleteMedicine,

    #[error("Patient limit must be a whole number")]
    LimitNotANumber(String),

    #[error("Patient limit must be between {min} and {max}")]
    LimitOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Patient limit cannot be lower than today's {today} registered patients")]
    LimitBelowToday { value: u32, today: u32 },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("PDF generation failed: {0}")]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Text for the error notice. Nothing here is fatal.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Api(e) => api_message(e),
            AppError::Pdf(_) => "Could not generate the PDF. Please try again.".into(),
            AppError::Upload(UploadError::Api(e)) => api_message(e),
            AppError::Upload(e) => e.to_string(),
            AppError::Storage(_) => "Could not update saved session data.".into(),
            AppError::Io(e) => format!("File error: {e}"),
        }
    }
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Connection(_) | ApiError::HttpClient(_) => {
            "Cannot reach the server. Check your connection and try again.".into()
        }
        ApiError::Timeout(_) => "The server took too long to respond. Please try again.".into(),
        ApiError::Server { message, .. } => message.clone(),
        ApiError::Unauthorized | ApiError::ResponseParsing(_) => err.to_string(),
    }
}
