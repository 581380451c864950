//! Client-local persisted state: the auth token and the cached profile of
//! the signed-in doctor, kept in `session.json` under the app data dir.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::models::Doctor;

pub const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("No signed-in session")]
    NoSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    pub profile: Doctor,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new(config::app_data_dir())
    }
}

impl LocalStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nobody has signed in on this machine.
    pub fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        let session = serde_json::from_slice(&bytes)?;
        Ok(Some(session))
    }

    pub fn save(&self, token: &str, profile: &Doctor) -> Result<StoredSession, StorageError> {
        let session = StoredSession {
            token: token.to_string(),
            profile: profile.clone(),
            saved_at: Utc::now(),
        };
        self.write(&session)?;
        tracing::info!(doctor_id = %profile.id, "Session stored");
        Ok(session)
    }

    /// Replaces the cached profile and keeps the token.
    pub fn save_profile(&self, profile: &Doctor) -> Result<StoredSession, StorageError> {
        let mut session = self.load()?.ok_or(StorageError::NoSession)?;
        session.profile = profile.clone();
        session.saved_at = Utc::now();
        self.write(&session)?;
        tracing::debug!(doctor_id = %profile.id, "Cached profile updated");
        Ok(session)
    }

    /// Removes the session file. Clearing twice is fine.
    pub fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, session: &StoredSession) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        let doctor = Doctor::new("d1", "Asha Rao");

        store.save("tok-1", &doctor).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "tok-1");
        assert_eq!(loaded.profile, doctor);

        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn profile_update_keeps_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let mut doctor = Doctor::new("d1", "Asha Rao");
        store.save("tok-1", &doctor).unwrap();

        doctor.profile_image = Some("/uploads/a.png".into());
        let session = store.save_profile(&doctor).unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(
            store.load().unwrap().unwrap().profile.profile_image.as_deref(),
            Some("/uploads/a.png")
        );
    }

    #[test]
    fn profile_update_without_session_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store.save_profile(&Doctor::new("d1", "A")).unwrap_err();
        assert!(matches!(err, StorageError::NoSession));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        std::fs::write(store.path(), b"{not json").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }
}
