//! Doctor profile photo: validation before it ever reaches the network,
//! then upload / removal through `ClinicApi`.

use std::path::Path;

use thiserror::Error;

use crate::api::{ApiError, ClinicApi};
use crate::models::Doctor;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    FileTooLarge { size_mb: f64, max_mb: usize },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("File extension of {file_name} does not match its {detected} content")]
    ExtensionMismatch {
        file_name: String,
        detected: &'static str,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A photo that passed validation and is ready for multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePhoto {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Detect the image type from magic bytes. Only JPEG, PNG and WebP qualify.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        _ if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" => {
            Some("image/webp")
        }
        _ => None,
    }
}

impl ProfilePhoto {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(UploadError::FileTooLarge {
                size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
                max_mb: MAX_PHOTO_BYTES / (1024 * 1024),
            });
        }

        let detected = detect_image_mime(&bytes).ok_or_else(|| {
            UploadError::UnsupportedFormat(format!("{file_name} is not a JPEG, PNG or WebP image"))
        })?;

        let extension_agrees = mime_guess::from_path(&file_name)
            .iter()
            .any(|mime| mime.essence_str() == detected);
        if !extension_agrees {
            return Err(UploadError::ExtensionMismatch {
                file_name,
                detected,
            });
        }

        Ok(Self {
            file_name,
            mime_type: detected,
            bytes,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let len = std::fs::metadata(path)?.len() as usize;
        if len > MAX_PHOTO_BYTES {
            return Err(UploadError::FileTooLarge {
                size_mb: len as f64 / (1024.0 * 1024.0),
                max_mb: MAX_PHOTO_BYTES / (1024 * 1024),
            });
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(file_name, std::fs::read(path)?)
    }
}

/// Upload and record the returned URL on the doctor profile.
pub fn upload_profile_photo(
    api: &dyn ClinicApi,
    doctor: &mut Doctor,
    photo: &ProfilePhoto,
) -> Result<String, UploadError> {
    let url = api.upload_profile_image(&doctor.id, photo)?;
    tracing::info!(
        doctor_id = %doctor.id,
        size = photo.bytes.len(),
        mime = photo.mime_type,
        "Profile photo uploaded"
    );
    doctor.profile_image = Some(url.clone());
    Ok(url)
}

pub fn remove_profile_photo(api: &dyn ClinicApi, doctor: &mut Doctor) -> Result<(), UploadError> {
    api.remove_profile_image(&doctor.id)?;
    tracing::info!(doctor_id = %doctor.id, "Profile photo removed");
    doctor.profile_image = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use std::io::Write;

    fn png() -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 32]);
        bytes
    }

    fn webp() -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x24, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        bytes
    }

    #[test]
    fn detects_supported_images() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(detect_image_mime(&png()), Some("image/png"));
        assert_eq!(detect_image_mime(&webp()), Some("image/webp"));
        assert_eq!(detect_image_mime(b"%PDF-1.7"), None);
        assert_eq!(detect_image_mime(b"RIFF"), None);
    }

    #[test]
    fn accepts_matching_extension() {
        let photo = ProfilePhoto::from_bytes("me.PNG", png()).unwrap();
        assert_eq!(photo.mime_type, "image/png");
        let photo = ProfilePhoto::from_bytes("me.jpg", vec![0xFF, 0xD8, 0xFF, 0xDB]).unwrap();
        assert_eq!(photo.mime_type, "image/jpeg");
        assert!(ProfilePhoto::from_bytes("me.webp", webp()).is_ok());
    }

    #[test]
    fn rejects_mismatched_extension() {
        let err = ProfilePhoto::from_bytes("me.jpg", png()).unwrap_err();
        assert!(matches!(err, UploadError::ExtensionMismatch { detected: "image/png", .. }));
        assert!(ProfilePhoto::from_bytes("me", png()).is_err());
    }

    #[test]
    fn rejects_non_images() {
        let err = ProfilePhoto::from_bytes("scan.pdf", b"%PDF-1.4".to_vec()).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_oversized_photo() {
        let mut bytes = png();
        bytes.resize(MAX_PHOTO_BYTES + 1, 0);
        let err = ProfilePhoto::from_bytes("big.png", bytes).unwrap_err();
        assert!(matches!(err, UploadError::FileTooLarge { max_mb: 5, .. }));
    }

    #[test]
    fn exactly_five_megabytes_is_allowed() {
        let mut bytes = png();
        bytes.resize(MAX_PHOTO_BYTES, 0);
        assert!(ProfilePhoto::from_bytes("edge.png", bytes).is_ok());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::File::create(&path).unwrap().write_all(&png()).unwrap();
        let photo = ProfilePhoto::from_path(&path).unwrap();
        assert_eq!(photo.file_name, "avatar.png");
    }

    #[test]
    fn upload_updates_profile_image() {
        let api = MockApi::default();
        let mut doctor = Doctor::new("d1", "Asha Rao");
        let photo = ProfilePhoto::from_bytes("avatar.png", png()).unwrap();
        let url = upload_profile_photo(&api, &mut doctor, &photo).unwrap();
        assert_eq!(url, "/uploads/avatar.png");
        assert_eq!(doctor.profile_image.as_deref(), Some("/uploads/avatar.png"));

        remove_profile_photo(&api, &mut doctor).unwrap();
        assert!(doctor.profile_image.is_none());
        assert_eq!(api.call_count(), 2);
    }

    #[test]
    fn failed_upload_keeps_previous_image() {
        let api = MockApi {
            fail_writes: Some(413),
            ..MockApi::default()
        };
        let mut doctor = Doctor::new("d1", "Asha Rao");
        doctor.profile_image = Some("/uploads/old.png".into());
        let photo = ProfilePhoto::from_bytes("avatar.png", png()).unwrap();
        let err = upload_profile_photo(&api, &mut doctor, &photo).unwrap_err();
        assert!(matches!(err, UploadError::Api(ApiError::Server { status: 413, .. })));
        assert_eq!(doctor.profile_image.as_deref(), Some("/uploads/old.png"));
    }
}
