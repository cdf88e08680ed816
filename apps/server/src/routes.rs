//! HTTP routes and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use pitchlens_core::{
    Pipeline, ResearchRequest, ResearchResponse, SilentProgress, UploadedDocument, prepare_record,
};
use pitchlens_shared::{PitchLensError, Result};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared by every request.
#[derive(Clone)]
pub(crate) struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub uploads_dir: PathBuf,
}

pub(crate) fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/research-startup", post(research_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "service": "PitchLens",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "research": "/research-startup",
        }
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "PitchLens",
        "timestamp": Utc::now(),
    }))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "status": "error",
        "message": message.into(),
        "timestamp": Utc::now(),
    });
    (status, Json(body)).into_response()
}

fn rejection(e: PitchLensError) -> Response {
    match e {
        PitchLensError::Validation { message } => error_response(StatusCode::BAD_REQUEST, message),
        other => {
            warn!(error = %other, "could not prepare research request");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<Option<T>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| PitchLensError::validation(format!("{field} must be a whole number, got {value:?}")))
}

/// Collect form fields and the optional `pitch_deck` file.
async fn read_request(mut multipart: Multipart) -> Result<ResearchRequest> {
    let mut request = ResearchRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PitchLensError::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "pitch_deck" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| PitchLensError::validation(e.body_text()))?;
            // Browsers send an empty part when no file was picked.
            if !bytes.is_empty() {
                request.pitch_deck = Some(UploadedDocument {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| PitchLensError::validation(e.body_text()))?;
        match name.as_str() {
            "name" => request.name = value,
            "legal_name" => request.legal_name = value,
            "industry" => request.industry = value,
            "description" => request.description = value,
            "email" => request.email = value,
            "phone" => request.phone = value,
            "website" => request.website = value,
            "founders" => request.founders = value,
            "stage" => request.stage = value,
            "team_size" => request.team_size = parse_number("team_size", &value)?,
            "founded_year" => request.founded_year = parse_number("founded_year", &value)?,
            "location" => request.location = value,
            "ceo_linkedin_url" => request.ceo_linkedin_url = value,
            "data_room_url" => request.data_room_url = value,
            "pitch_deck_url" | "google_drive_link" => {
                if !value.trim().is_empty() {
                    request.pitch_deck_url = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

async fn research_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request = match read_request(multipart).await {
        Ok(request) => request,
        Err(e) => return rejection(e),
    };
    let record = match prepare_record(request, &state.uploads_dir).await {
        Ok(record) => record,
        Err(e) => return rejection(e),
    };
    info!(run_id = %record.run_id(), startup = %record.input().name, "research request received");

    let record = state.pipeline.run(record, &SilentProgress).await;
    let response = ResearchResponse::from_record(&record);
    let status = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use pitchlens_core::Stage;
    use pitchlens_shared::{
        RecordField, RecordUpdate, ResearchFindings, ResearchRecord, StageStatus,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "pitchlens-test-boundary";

    /// Writes findings named after the input.
    struct EchoFindings;

    #[async_trait]
    impl Stage for EchoFindings {
        fn name(&self) -> &'static str {
            "structure"
        }

        fn reads(&self) -> &'static [RecordField] {
            &[RecordField::Input]
        }

        fn writes(&self) -> &'static [RecordField] {
            &[RecordField::Findings]
        }

        async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
            let mut update = RecordUpdate::new(StageStatus::StructuredByLlm);
            update.findings = Some(Box::new(ResearchFindings {
                name: record.input().name.clone(),
                ..Default::default()
            }));
            Ok(update)
        }
    }

    fn app(stages: Vec<Box<dyn Stage>>) -> Router {
        let uploads_dir = std::env::temp_dir().join(format!("pitchlens-server-{}", uuid::Uuid::now_v7()));
        let state = AppState {
            pipeline: Arc::new(Pipeline::new(stages)),
            uploads_dir,
        };
        router(state, 1024 * 1024)
    }

    fn form(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pitch_deck\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/research-startup")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(Vec::new()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = send(app(Vec::new()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["research"], "/research-startup");
    }

    #[tokio::test]
    async fn missing_name_is_bad_request() {
        let (status, body) = send(app(Vec::new()), form(&[("industry", "Aerospace")], None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "startup name is required");
    }

    #[tokio::test]
    async fn non_numeric_team_size_is_bad_request() {
        let request = form(&[("name", "Acme"), ("team_size", "a dozen")], None);
        let (status, _) = send(app(Vec::new()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_and_link_together_are_rejected() {
        let request = form(
            &[("name", "Acme"), ("google_drive_link", "https://drive.example/deck")],
            Some(("deck.pdf", b"%PDF-1.7")),
        );
        let (status, _) = send(app(Vec::new()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn run_without_findings_is_server_error() {
        let (status, body) = send(app(Vec::new()), form(&[("name", "Acme")], None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to generate research findings");
        assert_eq!(body["startup_name"], "Acme");
    }

    #[tokio::test]
    async fn run_with_findings_succeeds() {
        let request = form(
            &[("name", "Acme"), ("founders", "Ada, Alan")],
            Some(("deck.pdf", b"%PDF-1.7 deck")),
        );
        let (status, body) = send(app(vec![Box::new(EchoFindings)]), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["outcome"], "success");
        assert_eq!(body["research_findings"]["name"], "Acme");
    }
}
