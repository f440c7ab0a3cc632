//! GoHighLevel (LeadConnector) calendar client
//!
//! API documentation:
//! https://highlevel.stoplight.io/docs/integrations/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

const API_VERSION: &str = "2021-04-15";

#[derive(Debug, thiserror::Error)]
pub enum GhlError {
    #[error("GHL request timed out")]
    Timeout,
    #[error("GHL API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("GHL request failed: {0}")]
    Transport(String),
    #[error("unexpected GHL response: {0}")]
    UnexpectedResponse(String),
    #[error("project is missing GHL setting '{0}'")]
    MissingCredentials(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertContactRequest {
    pub location_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub calendar_id: String,
    pub location_id: String,
    pub contact_id: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub appointment_status: String,
    pub ignore_date_range: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Calendar operations used by the portal
#[async_trait]
pub trait GhlApi: Send + Sync {
    /// Create or find the contact, returning its GHL id
    async fn upsert_contact(&self, api_key: &str, request: &UpsertContactRequest) -> Result<String, GhlError>;

    /// Create an appointment, returning its GHL id
    async fn create_appointment(&self, api_key: &str, request: &CreateAppointmentRequest) -> Result<String, GhlError>;

    async fn update_appointment(
        &self,
        api_key: &str,
        appointment_id: &str,
        request: &UpdateAppointmentRequest,
    ) -> Result<(), GhlError>;
}

pub struct GhlClient {
    client: Client,
    base_url: String,
}

impl GhlClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, api_key: &str) -> Result<serde_json::Value, GhlError> {
        let response = request
            .bearer_auth(api_key)
            .header("Version", API_VERSION)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GhlError::Timeout
                } else {
                    GhlError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GhlError::Transport(e.to_string()))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "GHL request failed");
            return Err(GhlError::Api { status: status.as_u16(), body });
        }
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| GhlError::UnexpectedResponse(e.to_string()))
    }
}

/// Pull an id out of `{"id": ..}` or `{"<wrapper>": {"id": ..}}`
fn extract_id(value: &serde_json::Value, wrapper: &str) -> Result<String, GhlError> {
    value
        .get("id")
        .or_else(|| value.get(wrapper).and_then(|w| w.get("id")))
        .and_then(|id| id.as_str())
        .map(str::to_string)
        .ok_or_else(|| GhlError::UnexpectedResponse(format!("no {} id in response", wrapper)))
}

#[async_trait]
impl GhlApi for GhlClient {
    async fn upsert_contact(&self, api_key: &str, request: &UpsertContactRequest) -> Result<String, GhlError> {
        let url = format!("{}/contacts/upsert", self.base_url);
        let body = self.send(self.client.post(url).json(request), api_key).await?;
        let id = extract_id(&body, "contact")?;
        debug!(contact_id = %id, "GHL contact upserted");
        Ok(id)
    }

    async fn create_appointment(&self, api_key: &str, request: &CreateAppointmentRequest) -> Result<String, GhlError> {
        let url = format!("{}/calendars/events/appointments", self.base_url);
        let body = self.send(self.client.post(url).json(request), api_key).await?;
        let id = extract_id(&body, "appointment")?;
        debug!(ghl_appointment_id = %id, "GHL appointment created");
        Ok(id)
    }

    async fn update_appointment(
        &self,
        api_key: &str,
        appointment_id: &str,
        request: &UpdateAppointmentRequest,
    ) -> Result<(), GhlError> {
        let url = format!("{}/calendars/events/appointments/{}", self.base_url, appointment_id);
        self.send(self.client.put(url).json(request), api_key).await?;
        debug!(%appointment_id, "GHL appointment updated");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::*;

    /// Records every call; hands out sequential ids
    #[derive(Default)]
    pub struct FakeGhl {
        pub contacts: Mutex<Vec<UpsertContactRequest>>,
        pub created: Mutex<Vec<CreateAppointmentRequest>>,
        pub updated: Mutex<Vec<(String, UpdateAppointmentRequest)>>,
    }

    #[async_trait]
    impl GhlApi for FakeGhl {
        async fn upsert_contact(&self, _api_key: &str, request: &UpsertContactRequest) -> Result<String, GhlError> {
            let mut contacts = self.contacts.lock();
            contacts.push(request.clone());
            Ok(format!("contact-{}", contacts.len()))
        }

        async fn create_appointment(&self, _api_key: &str, request: &CreateAppointmentRequest) -> Result<String, GhlError> {
            let mut created = self.created.lock();
            created.push(request.clone());
            Ok(format!("appt-{}", created.len()))
        }

        async fn update_appointment(
            &self,
            _api_key: &str,
            appointment_id: &str,
            request: &UpdateAppointmentRequest,
        ) -> Result<(), GhlError> {
            self.updated.lock().push((appointment_id.to_string(), request.clone()));
            Ok(())
        }
    }
}
