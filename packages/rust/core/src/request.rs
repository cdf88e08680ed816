//! Inbound research requests and the response shape returned to callers.
//!
//! Transport-agnostic: the HTTP server and the CLI both build a
//! [`ResearchRequest`], turn it into a record with [`prepare_record`], run
//! the pipeline, and answer with [`ResearchResponse::from_record`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use pitchlens_shared::{
    CompetitorAnalysis, PipelineOutcome, PitchDeckInput, PitchLensError, ResearchFindings,
    ResearchRecord, Result, RunId, Scorecard, StageStatus, StartupInput,
};

const PDF_MAGIC: &[u8] = b"%PDF";

/// A pitch deck file sent along with the request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything a caller can submit for one startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResearchRequest {
    pub name: String,
    pub legal_name: String,
    pub industry: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    /// Comma-separated founder names.
    pub founders: String,
    pub stage: String,
    pub team_size: Option<u32>,
    pub founded_year: Option<i32>,
    pub location: String,
    pub ceo_linkedin_url: String,
    pub data_room_url: String,
    pub pitch_deck_url: Option<String>,
    #[serde(skip)]
    pub pitch_deck: Option<UploadedDocument>,
}

/// Split a comma-separated founder list, dropping blanks.
pub fn parse_founders(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn upload_file_name(file_name: &str) -> Result<&str> {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| PitchLensError::validation("pitch deck upload has no file name"))
}

fn check_pdf(doc: &UploadedDocument) -> Result<()> {
    let is_pdf_name = Path::new(&doc.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        return Err(PitchLensError::validation(format!(
            "pitch deck must be a PDF file, got {:?}",
            doc.file_name
        )));
    }
    if !doc.bytes.starts_with(PDF_MAGIC) {
        return Err(PitchLensError::validation(
            "pitch deck upload is not a valid PDF document",
        ));
    }
    Ok(())
}

/// Validate a request and build the record the pipeline will run on.
///
/// An uploaded deck is written to `<uploads_dir>/<run_id>_<file_name>` so the
/// document and upload stages can read it back.
pub async fn prepare_record(request: ResearchRequest, uploads_dir: &Path) -> Result<ResearchRecord> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(PitchLensError::validation("startup name is required"));
    }

    let deck_url = request
        .pitch_deck_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from);
    if request.pitch_deck.is_some() && deck_url.is_some() {
        return Err(PitchLensError::validation(
            "provide either a pitch deck upload or a pitch deck URL, not both",
        ));
    }

    let run_id = RunId::new();
    let file_path = match &request.pitch_deck {
        Some(doc) => {
            check_pdf(doc)?;
            Some(save_upload(doc, uploads_dir, run_id).await?)
        }
        None => None,
    };

    let legal_name = match request.legal_name.trim() {
        "" => name.to_string(),
        legal => legal.to_string(),
    };

    let input = StartupInput {
        name: name.to_string(),
        legal_name,
        industry: request.industry.trim().to_string(),
        description: request.description.trim().to_string(),
        email: request.email.trim().to_string(),
        phone: request.phone.trim().to_string(),
        website: request.website.trim().to_string(),
        founders: parse_founders(&request.founders),
        stage: request.stage.trim().to_string(),
        team_size: request.team_size,
        founded_year: request.founded_year,
        location: request.location.trim().to_string(),
        ceo_linkedin_url: request.ceo_linkedin_url.trim().to_string(),
        data_room_url: request.data_room_url.trim().to_string(),
    };

    let deck = PitchDeckInput {
        text: None,
        url: deck_url,
        file_path,
    };

    Ok(ResearchRecord::with_run_id(run_id, input, deck))
}

async fn save_upload(doc: &UploadedDocument, uploads_dir: &Path, run_id: RunId) -> Result<PathBuf> {
    let file_name = upload_file_name(&doc.file_name)?;
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| PitchLensError::io(uploads_dir, e))?;

    let path = uploads_dir.join(format!("{run_id}_{file_name}"));
    tokio::fs::write(&path, &doc.bytes)
        .await
        .map_err(|e| PitchLensError::io(&path, e))?;

    let path = std::path::absolute(&path).unwrap_or(path);
    info!(%run_id, path = %path.display(), bytes = doc.bytes.len(), "pitch deck upload saved");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Returned when structured findings were produced.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchSuccess {
    pub status: &'static str,
    pub startup_name: String,
    pub workflow_status: StageStatus,
    pub outcome: PipelineOutcome,
    pub research_findings: ResearchFindings,
    pub ai_scorecard: Scorecard,
    pub competitor_analysis: Option<CompetitorAnalysis>,
    pub report_path: Option<PathBuf>,
    pub timestamp: DateTime<Utc>,
    pub errors: Vec<String>,
}

/// Returned when the run ended without findings.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchFailure {
    pub status: &'static str,
    pub message: String,
    pub startup_name: String,
    pub workflow_status: StageStatus,
    pub outcome: PipelineOutcome,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResearchResponse {
    Success(Box<ResearchSuccess>),
    Failure(ResearchFailure),
}

impl ResearchResponse {
    pub fn from_record(record: &ResearchRecord) -> Self {
        let startup_name = record.input().name.clone();
        let timestamp = Utc::now();

        match record.findings() {
            Some(findings) => Self::Success(Box::new(ResearchSuccess {
                status: "success",
                startup_name,
                workflow_status: record.status(),
                outcome: record.outcome(),
                ai_scorecard: findings.ai_scorecard.clone(),
                research_findings: findings.clone(),
                competitor_analysis: record.competitor_analysis().cloned(),
                report_path: record.report_path().map(Path::to_path_buf),
                timestamp,
                errors: record.errors().to_vec(),
            })),
            None => Self::Failure(ResearchFailure {
                status: "error",
                message: "Failed to generate research findings".into(),
                startup_name,
                workflow_status: record.status(),
                outcome: record.outcome(),
                errors: record.errors().to_vec(),
                timestamp,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
