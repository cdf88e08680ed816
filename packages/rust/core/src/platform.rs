//! Client for the startup-tracking platform API.
//!
//! JSON endpoints create the startup and its application; multipart
//! endpoints attach the scorecard report and the original pitch deck.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use pitchlens_shared::{PitchLensError, PlatformConfig, Result};

const USER_AGENT: &str = concat!("PitchLens/", env!("CARGO_PKG_VERSION"));

/// Body of `POST /startup`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupPayload {
    pub status: String,
    pub organization_id: String,
    pub evaluation_stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thesis_id: Option<String>,
    pub thesis_name: String,
    pub name: String,
    pub legal_name: String,
    pub description: String,
    pub stage: String,
    pub location: String,
    pub website: String,
    pub company_email: String,
    pub company_phone: String,
    pub ceo_name: String,
    pub ceo_email: String,
    pub ceo_phone: String,
    pub ceo_linkedin_url: String,
    pub company_goal: String,
    pub startup_industry_domain: String,
    pub funding_raised: i64,
    pub funding_ask_amount: i64,
    pub startup_source: String,
    pub data_room_g_drive_link_primary: String,
}

/// Body of `POST /startup-application`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    pub startup_id: String,
    pub program_id: String,
    pub status: String,
    pub evaluation_stage_id: String,
    pub full_name: String,
}

/// Multipart upload of the rendered report plus score fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorecardUpload {
    pub startup_id: String,
    pub pdf: Vec<u8>,
    /// Text fields in send order, e.g. `("overallScore", "7.2")`.
    pub fields: Vec<(String, String)>,
}

/// Multipart upload of the original pitch deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpload {
    pub startup_id: String,
    pub application_id: String,
    pub document_type: String,
    pub bytes: Vec<u8>,
}

pub struct PlatformClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlatformClient {
    pub fn new(base_url: &str, config: &PlatformConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PitchLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{endpoint}", self.base_url))
            .header("x-api-key", &self.api_key)
    }

    /// Create the startup entity; returns its id.
    #[instrument(skip_all, fields(name = %payload.name))]
    pub async fn create_entity(&self, payload: &StartupPayload) -> Result<String> {
        let body = send(self.post("startup").json(payload)).await?;
        let id = extract_id(&body, &["/startupId", "/id", "/data/id", "/data/startupId"])
            .ok_or_else(|| PitchLensError::parse("startup response carried no id"))?;
        info!(startup_id = %id, "startup created");
        Ok(id)
    }

    /// Create the application under a startup; returns its id.
    #[instrument(skip_all, fields(startup_id = %payload.startup_id))]
    pub async fn create_sub_entity(&self, payload: &ApplicationPayload) -> Result<String> {
        let body = send(self.post("startup-application").json(payload)).await?;
        let id = extract_id(&body, &["/id", "/applicationId", "/data/id"])
            .ok_or_else(|| PitchLensError::parse("application response carried no id"))?;
        info!(application_id = %id, "application created");
        Ok(id)
    }

    #[instrument(skip_all, fields(startup_id = %upload.startup_id))]
    pub async fn upload_scorecard(&self, upload: ScorecardUpload) -> Result<()> {
        let file = pdf_part(upload.pdf, "ai-analysis.pdf")?;
        let mut form = Form::new().part("file", file);
        for (name, value) in upload.fields {
            form = form.text(name, value);
        }

        send(self.post("ai-score").multipart(form)).await?;
        info!("scorecard uploaded");
        Ok(())
    }

    #[instrument(skip_all, fields(startup_id = %upload.startup_id))]
    pub async fn upload_document(&self, upload: DocumentUpload) -> Result<()> {
        let form = Form::new()
            .part("file", pdf_part(upload.bytes, "pitch_deck.pdf")?)
            .text("startupId", upload.startup_id)
            .text("documentType", upload.document_type)
            .text("startupApplicationId", upload.application_id);

        send(self.post("n8n/startup-document").multipart(form)).await?;
        info!("pitch deck uploaded");
        Ok(())
    }
}

fn pdf_part(bytes: Vec<u8>, file_name: &'static str) -> Result<Part> {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/pdf")
        .map_err(|e| PitchLensError::validation(format!("invalid MIME type: {e}")))
}

/// Send and read the body; any non-2xx status becomes an `Http` error.
async fn send(request: RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| PitchLensError::Network(format!("platform: {e}")))?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body_len = text.len(), "platform response");

    if !status.is_success() {
        return Err(PitchLensError::http("platform", status.as_u16(), text));
    }

    // Upload endpoints sometimes answer with plain text.
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// First non-empty id found at any of `pointers`. Numeric ids are stringified.
pub fn extract_id(body: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| match body.pointer(p)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
