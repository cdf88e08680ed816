//! The four stages that push results to the startup-tracking platform.
//!
//! All of them skip with `skipped_platform_disabled` when no platform is
//! configured, before looking at their own preconditions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use pitchlens_shared::{
    PitchDeckInput, PitchLensError, PlatformConfig, RecordField, RecordUpdate, ResearchFindings,
    ResearchRecord, Result, ScoreCategory, Scorecard, StageStatus, StartupInput, ThesisCategory,
};

use crate::collaborators::PlatformBackend;
use crate::platform::{ApplicationPayload, DocumentUpload, ScorecardUpload, StartupPayload};
use crate::stage::Stage;

const DEFAULT_STAGE: &str = "EARLY_TRACTION";
const PITCH_DECK_DOCUMENT: &str = "PITCH_DECK";

/// Categories sent with the scorecard upload, in send order.
const UPLOADED_CATEGORIES: [ScoreCategory; 6] = [
    ScoreCategory::Founders,
    ScoreCategory::Team,
    ScoreCategory::Traction,
    ScoreCategory::Product,
    ScoreCategory::Market,
    ScoreCategory::Financials,
];

/// `"<api_prefix> <status>: <body>"` for HTTP failures, `"<prefix>: <e>"` otherwise.
fn platform_error(api_prefix: &str, prefix: &str, e: &PitchLensError) -> String {
    match e {
        PitchLensError::Http { status, body, .. } => format!("{api_prefix} {status}: {body}"),
        other => format!("{prefix}: {other}"),
    }
}

fn or_else<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

fn whole_amount(value: Option<f64>) -> i64 {
    value.filter(|v| v.is_finite()).map_or(0, |v| v.trunc() as i64)
}

fn thesis_id(config: &PlatformConfig, thesis: ThesisCategory) -> Option<String> {
    config
        .thesis_ids
        .get(thesis.as_str())
        .or_else(|| config.thesis_ids.get(ThesisCategory::Others.as_str()))
        .cloned()
}

/// Body of the startup creation call.
pub fn startup_payload(
    findings: &ResearchFindings,
    input: &StartupInput,
    deck: &PitchDeckInput,
    config: &PlatformConfig,
) -> StartupPayload {
    let deck_url = deck.url.as_deref().map(str::trim).unwrap_or_default();

    StartupPayload {
        status: "DRAFT".into(),
        organization_id: config.organization_id.clone(),
        evaluation_stage: "APPLICATION_RECEIVED".into(),
        thesis_id: thesis_id(config, findings.thesis_name),
        thesis_name: findings.thesis_name.as_str().into(),
        name: findings.name.clone(),
        legal_name: or_else(&findings.legal_name, &findings.name).into(),
        description: findings.description.clone(),
        stage: or_else(&findings.startup_stage, DEFAULT_STAGE).into(),
        location: findings.location.clone(),
        website: findings.website.clone(),
        company_email: or_else(&findings.company_email, &input.email).into(),
        company_phone: findings.company_phone.clone(),
        ceo_name: findings.ceo_name.clone(),
        ceo_email: findings.ceo_email.clone(),
        ceo_phone: findings.ceo_phone.clone(),
        ceo_linkedin_url: findings.ceo_linkedin_url.clone(),
        company_goal: findings.company_goal.clone(),
        startup_industry_domain: or_else(&findings.startup_industry_domain, &findings.industry).into(),
        funding_raised: whole_amount(findings.funding_raised),
        funding_ask_amount: whole_amount(findings.funding_ask_amount),
        startup_source: "WEBSITE_INBOUND".into(),
        data_room_g_drive_link_primary: or_else(deck_url, &input.data_room_url).trim().into(),
    }
}

/// Text fields of the scorecard upload.
pub fn scorecard_fields(startup_id: &str, scorecard: &Scorecard) -> Vec<(String, String)> {
    let mut fields = vec![
        ("startupId".to_string(), startup_id.to_string()),
        ("overallScore".to_string(), scorecard.overall_score.to_string()),
    ];
    for category in UPLOADED_CATEGORIES {
        fields.push((
            format!("{}Score", category.as_str()),
            scorecard.detail(category).score.to_string(),
        ));
    }
    for category in UPLOADED_CATEGORIES {
        let detail = scorecard.detail(category);
        fields.push((format!("{}Strengths", category.as_str()), detail.strengths.join(", ")));
        fields.push((format!("{}Weaknesses", category.as_str()), detail.weaknesses.join(", ")));
    }
    fields
}

// ---------------------------------------------------------------------------
// create-startup
// ---------------------------------------------------------------------------

pub struct CreateStartup {
    backend: Option<Arc<dyn PlatformBackend>>,
    config: Arc<PlatformConfig>,
}

impl CreateStartup {
    pub fn new(backend: Option<Arc<dyn PlatformBackend>>, config: Arc<PlatformConfig>) -> Self {
        Self { backend, config }
    }
}

#[async_trait]
impl Stage for CreateStartup {
    fn name(&self) -> &'static str {
        "create-startup"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::Findings, RecordField::Input, RecordField::PitchDeckInput]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::StartupId]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let Some(backend) = &self.backend else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPlatformDisabled));
        };
        let Some(findings) = record.findings() else {
            return Ok(RecordUpdate::failed(
                StageStatus::SkippedApiEntry,
                "No research findings available for API entry",
            ));
        };

        let payload = startup_payload(findings, record.input(), record.pitch_deck_input(), &self.config);
        if payload.thesis_id.is_none() {
            warn!(thesis = %payload.thesis_name, "no platform thesis id configured");
        }

        match backend.create_entity(&payload).await {
            Ok(id) => {
                info!(startup_id = %id, "startup entry created");
                let mut update = RecordUpdate::new(StageStatus::StartupEntryCreated);
                update.startup_id = Some(id);
                Ok(update)
            }
            Err(e) => {
                warn!(error = %e, "startup entry creation failed");
                Ok(RecordUpdate::failed(
                    StageStatus::ApiError,
                    platform_error("API Error", "Startup entry creation error", &e),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// create-application
// ---------------------------------------------------------------------------

pub struct CreateApplication {
    backend: Option<Arc<dyn PlatformBackend>>,
    config: Arc<PlatformConfig>,
}

impl CreateApplication {
    pub fn new(backend: Option<Arc<dyn PlatformBackend>>, config: Arc<PlatformConfig>) -> Self {
        Self { backend, config }
    }
}

#[async_trait]
impl Stage for CreateApplication {
    fn name(&self) -> &'static str {
        "create-application"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::StartupId, RecordField::Findings, RecordField::Input]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::ApplicationId]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let Some(backend) = &self.backend else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPlatformDisabled));
        };
        let Some(startup_id) = record.startup_id() else {
            return Ok(RecordUpdate::failed(
                StageStatus::SkippedApplicationCreation,
                "No startup_id available for application creation",
            ));
        };

        let full_name = record
            .findings()
            .map(|f| f.name.as_str())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(record.input().name.as_str());

        let payload = ApplicationPayload {
            startup_id: startup_id.to_string(),
            program_id: self.config.program_id.clone(),
            status: "SUBMITTED".into(),
            evaluation_stage_id: self.config.evaluation_stage_id.clone(),
            full_name: full_name.to_string(),
        };

        match backend.create_sub_entity(&payload).await {
            Ok(id) => {
                info!(application_id = %id, "application created");
                let mut update = RecordUpdate::new(StageStatus::ApplicationCreated);
                update.application_id = Some(id);
                Ok(update)
            }
            Err(e) => {
                warn!(error = %e, "application creation failed");
                Ok(RecordUpdate::failed(
                    StageStatus::ApiErrorApp,
                    platform_error("Application API Error", "Application creation error", &e),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// upload-report
// ---------------------------------------------------------------------------

pub struct UploadReport {
    backend: Option<Arc<dyn PlatformBackend>>,
}

impl UploadReport {
    pub fn new(backend: Option<Arc<dyn PlatformBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Stage for UploadReport {
    fn name(&self) -> &'static str {
        "upload-report"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::StartupId, RecordField::ReportPath, RecordField::Findings]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let Some(backend) = &self.backend else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPlatformDisabled));
        };
        let Some(startup_id) = record.startup_id() else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedUploadNoId));
        };
        let Some(path) = record.report_path().filter(|p| p.is_file()) else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedUploadNoPdf));
        };
        let Some(scorecard) = record
            .findings()
            .map(|f| &f.ai_scorecard)
            .filter(|s| s.has_scores())
        else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedUploadNoScores));
        };

        let pdf = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Ok(RecordUpdate::failed(
                    StageStatus::UploadError,
                    format!("Upload error: {}", PitchLensError::io(path, e)),
                ));
            }
        };

        let upload = ScorecardUpload {
            startup_id: startup_id.to_string(),
            pdf,
            fields: scorecard_fields(startup_id, scorecard),
        };

        match backend.upload_scorecard(upload).await {
            Ok(()) => {
                info!(path = %path.display(), "scorecard report uploaded");
                Ok(RecordUpdate::new(StageStatus::UploadComplete))
            }
            Err(e) => {
                warn!(error = %e, "scorecard upload failed");
                Ok(RecordUpdate::failed(
                    StageStatus::UploadError,
                    platform_error("Upload API Error", "Upload error", &e),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// upload-pitch-deck
// ---------------------------------------------------------------------------

pub struct UploadPitchDeck {
    backend: Option<Arc<dyn PlatformBackend>>,
}

impl UploadPitchDeck {
    pub fn new(backend: Option<Arc<dyn PlatformBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Stage for UploadPitchDeck {
    fn name(&self) -> &'static str {
        "upload-pitch-deck"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::StartupId, RecordField::ApplicationId, RecordField::PitchDeckInput]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let Some(backend) = &self.backend else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPlatformDisabled));
        };
        let Some(startup_id) = record.startup_id() else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPitchDeckUploadNoStartupId));
        };
        let Some(application_id) = record.application_id() else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPitchDeckUploadNoAppId));
        };
        let Some(path) = record
            .pitch_deck_input()
            .file_path
            .as_deref()
            .filter(|p| p.is_file())
        else {
            return Ok(RecordUpdate::skip(StageStatus::SkippedPitchDeckUploadNoFile));
        };

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Ok(RecordUpdate::failed(
                    StageStatus::PitchDeckUploadError,
                    format!("Pitch deck upload error: {}", PitchLensError::io(path, e)),
                ));
            }
        };

        let upload = DocumentUpload {
            startup_id: startup_id.to_string(),
            application_id: application_id.to_string(),
            document_type: PITCH_DECK_DOCUMENT.into(),
            bytes,
        };

        match backend.upload_document(upload).await {
            Ok(()) => {
                info!("pitch deck uploaded to platform");
                Ok(RecordUpdate::new(StageStatus::PitchDeckUploadComplete))
            }
            Err(e) => {
                warn!(error = %e, "pitch deck upload failed");
                Ok(RecordUpdate::failed(
                    StageStatus::PitchDeckUploadError,
                    platform_error("Pitch Deck Upload API Error", "Pitch deck upload error", &e),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use pitchlens_shared::ScoreDetail;

    use crate::stages::testing::{StubPlatform, temp_dir};

    fn findings() -> ResearchFindings {
        let mut scorecard = Scorecard::default();
        scorecard.founders_score = ScoreDetail {
            score: 8.0,
            strengths: vec!["Serial founders".into(), "Deep domain".into()],
            ..ScoreDetail::for_category(ScoreCategory::Founders)
        };
        scorecard.finalize();
        ResearchFindings {
            name: "Acme".into(),
            thesis_name: ThesisCategory::Healthcare,
            funding_raised: Some(1_250_000.75),
            ai_scorecard: scorecard,
            ..Default::default()
        }
    }

    fn config() -> Arc<PlatformConfig> {
        let mut config = PlatformConfig {
            organization_id: "org-1".into(),
            program_id: "prog-1".into(),
            evaluation_stage_id: "eval-1".into(),
            ..Default::default()
        };
        config.thesis_ids.insert("HEALTHCARE".into(), "th-health".into());
        config.thesis_ids.insert("OTHERS".into(), "th-others".into());
        Arc::new(config)
    }

    struct Setup {
        findings: bool,
        startup_id: bool,
        application_id: bool,
        report: Option<PathBuf>,
        deck: PitchDeckInput,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                findings: true,
                startup_id: true,
                application_id: true,
                report: None,
                deck: PitchDeckInput::default(),
            }
        }
    }

    fn record(setup: Setup) -> ResearchRecord {
        let mut input = StartupInput::named("Acme Input");
        input.email = "hello@acme.io".into();
        input.data_room_url = "https://drive.example/acme".into();
        let mut record = ResearchRecord::new(input, setup.deck);

        let mut update = RecordUpdate::new(StageStatus::ReportGenerated);
        if setup.findings {
            update.findings = Some(Box::new(findings()));
        }
        if setup.startup_id {
            update.startup_id = Some("st-1".into());
        }
        if setup.application_id {
            update.application_id = Some("app-1".into());
        }
        update.report_path = setup.report;
        record.apply(update);
        record
    }

    fn write_pdf() -> PathBuf {
        let path = temp_dir().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4 report").unwrap();
        path
    }

    #[test]
    fn payload_falls_back_and_maps_thesis() {
        let rec = record(Setup::default());
        let payload = startup_payload(
            rec.findings().unwrap(),
            rec.input(),
            rec.pitch_deck_input(),
            &config(),
        );
        assert_eq!(payload.status, "DRAFT");
        assert_eq!(payload.organization_id, "org-1");
        assert_eq!(payload.thesis_id.as_deref(), Some("th-health"));
        assert_eq!(payload.thesis_name, "HEALTHCARE");
        assert_eq!(payload.legal_name, "Acme");
        assert_eq!(payload.stage, "EARLY_TRACTION");
        assert_eq!(payload.company_email, "hello@acme.io");
        assert_eq!(payload.funding_raised, 1_250_000);
        assert_eq!(payload.funding_ask_amount, 0);
        assert_eq!(payload.data_room_g_drive_link_primary, "https://drive.example/acme");

        let mut f = findings();
        f.thesis_name = ThesisCategory::Rums;
        let deck = PitchDeckInput {
            url: Some("https://files.example/deck.pdf".into()),
            ..Default::default()
        };
        let payload = startup_payload(&f, rec.input(), &deck, &config());
        assert_eq!(payload.thesis_id.as_deref(), Some("th-others"));
        assert_eq!(payload.data_room_g_drive_link_primary, "https://files.example/deck.pdf");

        let payload = startup_payload(&f, rec.input(), &deck, &PlatformConfig::default());
        assert!(payload.thesis_id.is_none());
    }

    #[test]
    fn scorecard_fields_are_ordered_and_joined() {
        let fields = scorecard_fields("st-1", &findings().ai_scorecard);
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(&names[..4], ["startupId", "overallScore", "foundersScore", "teamScore"]);
        assert_eq!(names.len(), 2 + 6 + 12);
        assert!(fields.contains(&("overallScore".into(), "2".into())));
        assert!(fields.contains(&("foundersStrengths".into(), "Serial founders, Deep domain".into())));
        assert!(fields.contains(&("marketWeaknesses".into(), String::new())));
    }

    #[tokio::test]
    async fn disabled_platform_skips_every_stage_quietly() {
        let rec = record(Setup {
            findings: false,
            startup_id: false,
            application_id: false,
            ..Default::default()
        });
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(CreateStartup::new(None, config())),
            Box::new(CreateApplication::new(None, config())),
            Box::new(UploadReport::new(None)),
            Box::new(UploadPitchDeck::new(None)),
        ];
        for stage in stages {
            let update = stage.run(&rec).await.unwrap();
            assert_eq!(update.status, StageStatus::SkippedPlatformDisabled, "{}", stage.name());
            assert!(update.errors.is_empty());
        }
    }

    #[tokio::test]
    async fn create_startup_records_id() {
        let backend = Arc::new(StubPlatform::default());
        let stage = CreateStartup::new(Some(backend.clone()), config());
        let update = stage.run(&record(Setup::default())).await.unwrap();

        assert_eq!(update.status, StageStatus::StartupEntryCreated);
        assert_eq!(update.startup_id.as_deref(), Some("st-1"));
        assert_eq!(backend.entities.lock().unwrap()[0].name, "Acme");
    }

    #[tokio::test]
    async fn create_startup_without_findings_reports_error() {
        let stage = CreateStartup::new(Some(Arc::new(StubPlatform::default())), config());
        let update = stage
            .run(&record(Setup {
                findings: false,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedApiEntry);
        assert_eq!(update.errors, vec!["No research findings available for API entry"]);
    }

    #[tokio::test]
    async fn create_startup_http_error_text() {
        let backend = StubPlatform {
            fail_entity: Some((422, "name taken".into())),
            ..Default::default()
        };
        let stage = CreateStartup::new(Some(Arc::new(backend)), config());
        let update = stage.run(&record(Setup::default())).await.unwrap();
        assert_eq!(update.status, StageStatus::ApiError);
        assert_eq!(update.errors, vec!["API Error 422: name taken"]);
    }

    #[tokio::test]
    async fn create_application_uses_config_and_findings_name() {
        let backend = Arc::new(StubPlatform::default());
        let stage = CreateApplication::new(Some(backend.clone()), config());
        let update = stage.run(&record(Setup::default())).await.unwrap();
        assert_eq!(update.status, StageStatus::ApplicationCreated);
        assert_eq!(update.application_id.as_deref(), Some("app-1"));

        let sent = &backend.sub_entities.lock().unwrap()[0];
        assert_eq!(sent.startup_id, "st-1");
        assert_eq!(sent.program_id, "prog-1");
        assert_eq!(sent.status, "SUBMITTED");
        assert_eq!(sent.full_name, "Acme");
    }

    #[tokio::test]
    async fn create_application_without_startup_id_reports_error() {
        let stage = CreateApplication::new(Some(Arc::new(StubPlatform::default())), config());
        let update = stage
            .run(&record(Setup {
                startup_id: false,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedApplicationCreation);
        assert_eq!(update.errors, vec!["No startup_id available for application creation"]);
    }

    #[tokio::test]
    async fn create_application_http_error_text() {
        let backend = StubPlatform {
            fail_sub_entity: Some((500, "boom".into())),
            ..Default::default()
        };
        let stage = CreateApplication::new(Some(Arc::new(backend)), config());
        let update = stage.run(&record(Setup::default())).await.unwrap();
        assert_eq!(update.status, StageStatus::ApiErrorApp);
        assert_eq!(update.errors, vec!["Application API Error 500: boom"]);
    }

    #[tokio::test]
    async fn upload_report_skips_in_order() {
        let backend: Arc<dyn PlatformBackend> = Arc::new(StubPlatform::default());
        let stage = UploadReport::new(Some(backend));

        let update = stage
            .run(&record(Setup {
                startup_id: false,
                report: Some(write_pdf()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedUploadNoId);

        let update = stage
            .run(&record(Setup {
                report: Some(PathBuf::from("/nonexistent/report.pdf")),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedUploadNoPdf);

        let update = stage
            .run(&record(Setup {
                findings: false,
                report: Some(write_pdf()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedUploadNoScores);
        assert!(update.errors.is_empty());
    }

    #[tokio::test]
    async fn upload_report_sends_pdf_and_scores() {
        let backend = Arc::new(StubPlatform::default());
        let stage = UploadReport::new(Some(backend.clone()));
        let update = stage
            .run(&record(Setup {
                report: Some(write_pdf()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::UploadComplete);

        let sent = &backend.scorecards.lock().unwrap()[0];
        assert_eq!(sent.pdf, b"%PDF-1.4 report");
        assert_eq!(sent.fields[0], ("startupId".to_string(), "st-1".to_string()));
    }

    #[tokio::test]
    async fn upload_report_http_error_text() {
        let backend = StubPlatform {
            fail_scorecard: Some((413, "too large".into())),
            ..Default::default()
        };
        let stage = UploadReport::new(Some(Arc::new(backend)));
        let update = stage
            .run(&record(Setup {
                report: Some(write_pdf()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::UploadError);
        assert_eq!(update.errors, vec!["Upload API Error 413: too large"]);
    }

    #[tokio::test]
    async fn upload_pitch_deck_skips_in_order() {
        let stage = UploadPitchDeck::new(Some(Arc::new(StubPlatform::default())));
        let deck = PitchDeckInput {
            file_path: Some(write_pdf()),
            ..Default::default()
        };

        let update = stage
            .run(&record(Setup {
                startup_id: false,
                deck: deck.clone(),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedPitchDeckUploadNoStartupId);

        let update = stage
            .run(&record(Setup {
                application_id: false,
                deck,
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::SkippedPitchDeckUploadNoAppId);

        let update = stage.run(&record(Setup::default())).await.unwrap();
        assert_eq!(update.status, StageStatus::SkippedPitchDeckUploadNoFile);
        assert!(update.errors.is_empty());
    }

    #[tokio::test]
    async fn upload_pitch_deck_sends_document() {
        let backend = Arc::new(StubPlatform::default());
        let stage = UploadPitchDeck::new(Some(backend.clone()));
        let update = stage
            .run(&record(Setup {
                deck: PitchDeckInput {
                    file_path: Some(write_pdf()),
                    ..Default::default()
                },
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::PitchDeckUploadComplete);

        let sent = &backend.documents.lock().unwrap()[0];
        assert_eq!(sent.application_id, "app-1");
        assert_eq!(sent.document_type, "PITCH_DECK");
    }

    #[tokio::test]
    async fn upload_pitch_deck_http_error_text() {
        let backend = StubPlatform {
            fail_document: Some((400, "bad file".into())),
            ..Default::default()
        };
        let stage = UploadPitchDeck::new(Some(Arc::new(backend)));
        let update = stage
            .run(&record(Setup {
                deck: PitchDeckInput {
                    file_path: Some(write_pdf()),
                    ..Default::default()
                },
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(update.status, StageStatus::PitchDeckUploadError);
        assert_eq!(update.errors, vec!["Pitch Deck Upload API Error 400: bad file"]);
    }
}
