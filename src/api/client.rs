use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ApiError;
use super::types::*;
use super::ClinicApi;
use crate::config::ClientConfig;
use crate::models::{DoctorStats, Patient};
use crate::upload::ProfilePhoto;

/// Multipart field name the backend reads the photo from.
const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// Blocking HTTP client for the hospital backend.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
    upload_client: Client,
    timeout_secs: u64,
    upload_timeout_secs: u64,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let build = |timeout| {
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| ApiError::HttpClient(e.to_string()))
        };
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: None,
            client: build(config.request_timeout)?,
            upload_client: build(config.upload_timeout)?,
            timeout_secs: config.request_timeout.as_secs(),
            upload_timeout_secs: config.upload_timeout.as_secs(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, client: &Client, method: Method, path: &str) -> RequestBuilder {
        let builder = client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder, timeout_secs: u64) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .map_err(|e| ApiError::from_transport(e, &self.base_url, timeout_secs))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "API request failed");
            return Err(err);
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let builder = self.request(&self.client, Method::GET, path).query(query);
        let response = self.send(builder, self.timeout_secs)?;
        let payload: Payload<T> = response
            .json()
            .map_err(|e| ApiError::ResponseParsing(e.to_string()))?;
        if let Some(message) = payload.message() {
            tracing::debug!(path, message, "API response");
        }
        Ok(payload.into_inner())
    }

    fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let builder = self.request(&self.client, Method::PUT, path).json(body);
        self.send(builder, self.timeout_secs).map(|_| ())
    }
}

impl ClinicApi for ApiClient {
    fn today_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
        self.get_json(&format!("patient/today/{doctor_id}"), &[])
    }

    fn emergency_patients(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
        self.get_json(&format!("patient/emergency/{doctor_id}"), &[])
    }

    fn patient_history(&self, doctor_id: &str) -> Result<Vec<Patient>, ApiError> {
        self.get_json(&format!("doctor/{doctor_id}/patients/history"), &[])
    }

    fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
        self.get_json("patient", &[])
    }

    fn doctor_stats(&self, doctor_id: &str) -> Result<DoctorStats, ApiError> {
        self.get_json(&format!("doctor/{doctor_id}/stats"), &[])
    }

    fn set_availability(&self, doctor_id: &str, available: bool) -> Result<(), ApiError> {
        self.put_json(
            &format!("doctor/{doctor_id}/availability"),
            &AvailabilityUpdate {
                is_available: available,
            },
        )
    }

    fn set_patient_limit(&self, doctor_id: &str, limit: u32) -> Result<(), ApiError> {
        self.put_json(
            &format!("doctor/{doctor_id}/patient-limit"),
            &PatientLimitUpdate {
                daily_patient_limit: limit,
            },
        )
    }

    fn update_payment(&self, patient_id: &str, update: &PaymentUpdate) -> Result<(), ApiError> {
        self.put_json(&format!("patient/{patient_id}/payment"), update)
    }

    fn save_prescription(
        &self,
        patient_id: &str,
        submission: &PrescriptionSubmission,
    ) -> Result<(), ApiError> {
        self.put_json(&format!("prescription/{patient_id}"), submission)
    }

    fn search_medicines(&self, query: &MedicineQuery) -> Result<MedicinePage, ApiError> {
        self.get_json("inventory/medicines", &query.params())
    }

    fn medicine_suggestions(&self, query: &str) -> Result<Vec<String>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.get_json(
            "inventory/medicines/search/suggestions",
            &[("q", query.to_string())],
        )
    }

    fn export_inventory(&self) -> Result<Vec<u8>, ApiError> {
        let builder = self.request(&self.client, Method::GET, "inventory/export/excel");
        let response = self.send(builder, self.timeout_secs)?;
        let bytes = response
            .bytes()
            .map_err(|e| ApiError::ResponseParsing(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn upload_profile_image(&self, doctor_id: &str, photo: &ProfilePhoto) -> Result<String, ApiError> {
        let part = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(photo.mime_type)
            .map_err(|e| ApiError::HttpClient(e.to_string()))?;
        let form = Form::new().part(PROFILE_IMAGE_FIELD, part);
        let builder = self
            .request(&self.upload_client, Method::PUT, &format!("doctor/{doctor_id}/profile-image"))
            .multipart(form);
        let response = self.send(builder, self.upload_timeout_secs)?;
        let payload: Payload<ProfileImageResponse> = response
            .json()
            .map_err(|e| ApiError::ResponseParsing(e.to_string()))?;
        Ok(payload.into_inner().profile_image)
    }

    fn remove_profile_image(&self, doctor_id: &str) -> Result<(), ApiError> {
        let builder = self.request(
            &self.upload_client,
            Method::DELETE,
            &format!("doctor/{doctor_id}/profile-image"),
        );
        self.send(builder, self.upload_timeout_secs).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let config = ClientConfig {
            api_url: "http://localhost:5000/api/".into(),
            ..ClientConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let api = client();
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(api.url("/patient/today/d1"), "http://localhost:5000/api/patient/today/d1");
        assert_eq!(api.url("patient"), "http://localhost:5000/api/patient");
    }

    #[test]
    fn timeouts_taken_from_config() {
        let api = client();
        assert_eq!(api.timeout_secs, 15);
        assert_eq!(api.upload_timeout_secs, 30);
    }

    #[test]
    fn token_is_attached_as_bearer() {
        let api = client().with_token("abc123");
        let request = api
            .request(&api.client, Method::GET, "patient")
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer abc123"
        );
    }

    #[test]
    fn no_token_no_header() {
        let mut api = client().with_token("abc");
        api.set_token(None);
        let request = api.request(&api.client, Method::GET, "patient").build().unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn blank_suggestion_query_skips_network() {
        let api = client();
        assert_eq!(api.medicine_suggestions("   ").unwrap(), Vec::<String>::new());
    }
}
