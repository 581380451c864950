use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Clinicdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hospital name printed in PDF headers unless overridden.
pub const DEFAULT_HOSPITAL_NAME: &str = "City Care Hospital";

/// Backend base URL used when `CLINICDESK_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Patient-list refresh cadence while a dashboard view is open.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Quiet period before a search input triggers a fetch.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Client-side timeout for photo upload / removal.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for every other API call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinicdesk=info,clinicdesk_lib=info,warn"
}

/// Get the application data directory
/// ~/Clinicdesk/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Where generated PDFs land when the caller does not pick a directory.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| app_data_dir().join("exports"))
}

/// Runtime settings for the API client and PDF branding.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub hospital_name: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            hospital_name: DEFAULT_HOSPITAL_NAME.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            upload_timeout: UPLOAD_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Build from `CLINICDESK_API_URL` / `CLINICDESK_HOSPITAL_NAME`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("CLINICDESK_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(name) = lookup("CLINICDESK_HOSPITAL_NAME").filter(|v| !v.trim().is_empty()) {
            config.hospital_name = name.trim().to_string();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Clinicdesk"));
    }

    #[test]
    fn app_name_is_clinicdesk() {
        assert_eq!(APP_NAME, "Clinicdesk");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_without_env() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.upload_timeout, Duration::from_secs(30));
    }

    #[test]
    fn env_overrides_trim_trailing_slash() {
        let config = ClientConfig::from_lookup(|key| match key {
            "CLINICDESK_API_URL" => Some("https://hms.example.org/api/".into()),
            "CLINICDESK_HOSPITAL_NAME" => Some("  St. Mary Clinic ".into()),
            _ => None,
        });
        assert_eq!(config.api_url, "https://hms.example.org/api");
        assert_eq!(config.hospital_name, "St. Mary Clinic");
    }

    #[test]
    fn blank_env_values_ignored() {
        let config = ClientConfig::from_lookup(|_| Some("   ".into()));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
