//! The research record threaded through the pipeline, and the delta type
//! stages use to change it.
//!
//! A record is only ever changed through [`ResearchRecord::apply`]. Updates
//! carry `Option` fields, so a stage that does not mention a field cannot
//! clear it, and errors are only ever appended.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::findings::{CompetitorAnalysis, ResearchFindings};
use crate::types::{
    DeepResearchReport, ExtractedPitchDeck, PitchDeckInput, RawGathering, RunId, ScrapedWebsite,
    SearchBundle, StartupInput,
};

// ---------------------------------------------------------------------------
// StageStatus
// ---------------------------------------------------------------------------

/// Outcome tag of a single stage. The record keeps the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Initialized,

    PitchDeckParsed,
    NoPitchDeck,
    PitchDeckFailed,

    WebsiteScraped,
    NoWebsite,
    WebsiteScrapeFailed,

    SearchCompleted,
    NoStartupName,
    SkippedSearchNoProvider,
    SearchFailed,

    StructuredByLlm,
    NoRawData,
    StructuringFailed,

    CompetitorsAnalyzed,
    NoResearchFindings,
    CompetitorAnalysisFailed,

    ReportGenerated,
    ReportFailed,

    StartupEntryCreated,
    SkippedApiEntry,
    SkippedPlatformDisabled,
    ApiError,

    ApplicationCreated,
    SkippedApplicationCreation,
    ApiErrorApp,

    UploadComplete,
    SkippedUploadNoId,
    SkippedUploadNoPdf,
    SkippedUploadNoScores,
    UploadError,

    PitchDeckUploadComplete,
    SkippedPitchDeckUploadNoStartupId,
    SkippedPitchDeckUploadNoAppId,
    SkippedPitchDeckUploadNoFile,
    PitchDeckUploadError,

    /// A stage failed unexpectedly or panicked.
    Error,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::PitchDeckParsed => "pitch_deck_parsed",
            Self::NoPitchDeck => "no_pitch_deck",
            Self::PitchDeckFailed => "pitch_deck_failed",
            Self::WebsiteScraped => "website_scraped",
            Self::NoWebsite => "no_website",
            Self::WebsiteScrapeFailed => "website_scrape_failed",
            Self::SearchCompleted => "search_completed",
            Self::NoStartupName => "no_startup_name",
            Self::SkippedSearchNoProvider => "skipped_search_no_provider",
            Self::SearchFailed => "search_failed",
            Self::StructuredByLlm => "structured_by_llm",
            Self::NoRawData => "no_raw_data",
            Self::StructuringFailed => "structuring_failed",
            Self::CompetitorsAnalyzed => "competitors_analyzed",
            Self::NoResearchFindings => "no_research_findings",
            Self::CompetitorAnalysisFailed => "competitor_analysis_failed",
            Self::ReportGenerated => "report_generated",
            Self::ReportFailed => "report_failed",
            Self::StartupEntryCreated => "startup_entry_created",
            Self::SkippedApiEntry => "skipped_api_entry",
            Self::SkippedPlatformDisabled => "skipped_platform_disabled",
            Self::ApiError => "api_error",
            Self::ApplicationCreated => "application_created",
            Self::SkippedApplicationCreation => "skipped_application_creation",
            Self::ApiErrorApp => "api_error_app",
            Self::UploadComplete => "upload_complete",
            Self::SkippedUploadNoId => "skipped_upload_no_id",
            Self::SkippedUploadNoPdf => "skipped_upload_no_pdf",
            Self::SkippedUploadNoScores => "skipped_upload_no_scores",
            Self::UploadError => "upload_error",
            Self::PitchDeckUploadComplete => "pitch_deck_upload_complete",
            Self::SkippedPitchDeckUploadNoStartupId => "skipped_pitch_deck_upload_no_startup_id",
            Self::SkippedPitchDeckUploadNoAppId => "skipped_pitch_deck_upload_no_app_id",
            Self::SkippedPitchDeckUploadNoFile => "skipped_pitch_deck_upload_no_file",
            Self::PitchDeckUploadError => "pitch_deck_upload_error",
            Self::Error => "error",
        }
    }

    /// Precondition not met. Not an error.
    pub fn is_skip(self) -> bool {
        let tag = self.as_str();
        tag.starts_with("no_") || tag.starts_with("skipped_")
    }

    /// The stage ran and its collaborator or data failed.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::PitchDeckFailed
                | Self::WebsiteScrapeFailed
                | Self::SearchFailed
                | Self::StructuringFailed
                | Self::CompetitorAnalysisFailed
                | Self::ReportFailed
                | Self::ApiError
                | Self::ApiErrorApp
                | Self::UploadError
                | Self::PitchDeckUploadError
                | Self::Error
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelineOutcome
// ---------------------------------------------------------------------------

/// Aggregate result of a run, derived from the record rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Running,
    PartialFailure,
    Success,
    Fatal,
}

// ---------------------------------------------------------------------------
// Fields and updates
// ---------------------------------------------------------------------------

/// Addressable parts of a record, used to declare what stages read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Input,
    PitchDeckInput,
    PitchDeck,
    Website,
    Search,
    DeepResearch,
    Findings,
    CompetitorAnalysis,
    ReportPath,
    StartupId,
    ApplicationId,
}

impl RecordField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::PitchDeckInput => "pitch_deck_input",
            Self::PitchDeck => "pitch_deck",
            Self::Website => "website",
            Self::Search => "search",
            Self::DeepResearch => "deep_research",
            Self::Findings => "research_findings",
            Self::CompetitorAnalysis => "competitor_analysis",
            Self::ReportPath => "report_path",
            Self::StartupId => "startup_id",
            Self::ApplicationId => "application_id",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse delta returned by a stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub status: StageStatus,
    pub errors: Vec<String>,
    pub pitch_deck: Option<ExtractedPitchDeck>,
    pub website: Option<ScrapedWebsite>,
    pub search: Option<SearchBundle>,
    pub deep_research: Option<DeepResearchReport>,
    pub findings: Option<Box<ResearchFindings>>,
    pub competitor_analysis: Option<CompetitorAnalysis>,
    pub report_path: Option<PathBuf>,
    pub startup_id: Option<String>,
    pub application_id: Option<String>,
}

impl RecordUpdate {
    pub fn new(status: StageStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Precondition not met: status only, no data, no error.
    pub fn skip(status: StageStatus) -> Self {
        Self::new(status)
    }

    /// Collaborator or data failure with one error message.
    pub fn failed(status: StageStatus, error: impl Into<String>) -> Self {
        Self::new(status).with_error(error)
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Fields this update would overwrite.
    pub fn touched(&self) -> Vec<RecordField> {
        let mut fields = Vec::new();
        if self.pitch_deck.is_some() {
            fields.push(RecordField::PitchDeck);
        }
        if self.website.is_some() {
            fields.push(RecordField::Website);
        }
        if self.search.is_some() {
            fields.push(RecordField::Search);
        }
        if self.deep_research.is_some() {
            fields.push(RecordField::DeepResearch);
        }
        if self.findings.is_some() {
            fields.push(RecordField::Findings);
        }
        if self.competitor_analysis.is_some() {
            fields.push(RecordField::CompetitorAnalysis);
        }
        if self.report_path.is_some() {
            fields.push(RecordField::ReportPath);
        }
        if self.startup_id.is_some() {
            fields.push(RecordField::StartupId);
        }
        if self.application_id.is_some() {
            fields.push(RecordField::ApplicationId);
        }
        fields
    }

    /// Drop every field not in `allowed`, returning the ones dropped.
    pub fn retain_only(&mut self, allowed: &[RecordField]) -> Vec<RecordField> {
        let dropped: Vec<RecordField> = self
            .touched()
            .into_iter()
            .filter(|f| !allowed.contains(f))
            .collect();

        for field in &dropped {
            match field {
                RecordField::PitchDeck => self.pitch_deck = None,
                RecordField::Website => self.website = None,
                RecordField::Search => self.search = None,
                RecordField::DeepResearch => self.deep_research = None,
                RecordField::Findings => self.findings = None,
                RecordField::CompetitorAnalysis => self.competitor_analysis = None,
                RecordField::ReportPath => self.report_path = None,
                RecordField::StartupId => self.startup_id = None,
                RecordField::ApplicationId => self.application_id = None,
                RecordField::Input | RecordField::PitchDeckInput => {}
            }
        }

        dropped
    }
}

// ---------------------------------------------------------------------------
// ResearchRecord
// ---------------------------------------------------------------------------

/// Workflow bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMeta {
    pub status: StageStatus,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Stage that panicked and stopped the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_in: Option<String>,
}

/// All state for one research request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    run_id: RunId,
    input: StartupInput,
    pitch_deck_input: PitchDeckInput,
    raw: RawGathering,
    #[serde(skip_serializing_if = "Option::is_none")]
    research_findings: Option<ResearchFindings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    competitor_analysis: Option<CompetitorAnalysis>,
    meta: WorkflowMeta,
}

impl ResearchRecord {
    pub fn new(input: StartupInput, pitch_deck_input: PitchDeckInput) -> Self {
        Self::with_run_id(RunId::new(), input, pitch_deck_input)
    }

    /// Start a record under an id chosen by the caller, e.g. one already
    /// used to name an uploaded file.
    pub fn with_run_id(run_id: RunId, input: StartupInput, pitch_deck_input: PitchDeckInput) -> Self {
        Self {
            run_id,
            input,
            pitch_deck_input,
            raw: RawGathering::default(),
            research_findings: None,
            competitor_analysis: None,
            meta: WorkflowMeta {
                status: StageStatus::Initialized,
                errors: Vec::new(),
                started_at: Utc::now(),
                completed_at: None,
                report_path: None,
                startup_id: None,
                application_id: None,
                aborted_in: None,
            },
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn input(&self) -> &StartupInput {
        &self.input
    }

    pub fn pitch_deck_input(&self) -> &PitchDeckInput {
        &self.pitch_deck_input
    }

    pub fn raw(&self) -> &RawGathering {
        &self.raw
    }

    pub fn findings(&self) -> Option<&ResearchFindings> {
        self.research_findings.as_ref()
    }

    pub fn competitor_analysis(&self) -> Option<&CompetitorAnalysis> {
        self.competitor_analysis.as_ref()
    }

    pub fn meta(&self) -> &WorkflowMeta {
        &self.meta
    }

    pub fn status(&self) -> StageStatus {
        self.meta.status
    }

    pub fn errors(&self) -> &[String] {
        &self.meta.errors
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.meta.report_path.as_deref()
    }

    pub fn startup_id(&self) -> Option<&str> {
        self.meta.startup_id.as_deref()
    }

    pub fn application_id(&self) -> Option<&str> {
        self.meta.application_id.as_deref()
    }

    /// Merge a stage's delta: present fields overwrite, errors append,
    /// status is replaced.
    pub fn apply(&mut self, update: RecordUpdate) {
        let RecordUpdate {
            status,
            errors,
            pitch_deck,
            website,
            search,
            deep_research,
            findings,
            competitor_analysis,
            report_path,
            startup_id,
            application_id,
        } = update;

        if let Some(v) = pitch_deck {
            self.raw.pitch_deck = Some(v);
        }
        if let Some(v) = website {
            self.raw.website = Some(v);
        }
        if let Some(v) = search {
            self.raw.search = Some(v);
        }
        if let Some(v) = deep_research {
            self.raw.deep_research = Some(v);
        }
        if let Some(v) = findings {
            self.research_findings = Some(*v);
        }
        if let Some(v) = competitor_analysis {
            self.competitor_analysis = Some(v);
        }
        if let Some(v) = report_path {
            self.meta.report_path = Some(v);
        }
        if let Some(v) = startup_id {
            self.meta.startup_id = Some(v);
        }
        if let Some(v) = application_id {
            self.meta.application_id = Some(v);
        }

        self.meta.errors.extend(errors);
        self.meta.status = status;
    }

    /// Record that `stage` blew up and no further stages will run.
    pub fn mark_aborted(&mut self, stage: &str, message: impl Into<String>) {
        self.meta.errors.push(message.into());
        self.meta.status = StageStatus::Error;
        self.meta.aborted_in = Some(stage.to_string());
    }

    pub fn mark_completed(&mut self) {
        self.meta.completed_at = Some(Utc::now());
    }

    /// Aggregate outcome of the run so far.
    pub fn outcome(&self) -> PipelineOutcome {
        if self.meta.aborted_in.is_some() {
            PipelineOutcome::Fatal
        } else if self.meta.completed_at.is_none() {
            PipelineOutcome::Running
        } else if self.research_findings.is_some() && self.meta.errors.is_empty() {
            PipelineOutcome::Success
        } else {
            PipelineOutcome::PartialFailure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResearchRecord {
        ResearchRecord::new(StartupInput::named("Acme"), PitchDeckInput::default())
    }

    #[test]
    fn status_tags_match_serde() {
        for status in [
            StageStatus::StructuredByLlm,
            StageStatus::ApiErrorApp,
            StageStatus::SkippedPitchDeckUploadNoAppId,
            StageStatus::SkippedUploadNoPdf,
        ] {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn skip_classification() {
        assert!(StageStatus::NoPitchDeck.is_skip());
        assert!(StageStatus::SkippedApiEntry.is_skip());
        assert!(!StageStatus::SkippedApiEntry.is_failure());
        assert!(!StageStatus::WebsiteScrapeFailed.is_skip());
        assert!(StageStatus::WebsiteScrapeFailed.is_failure());
        assert!(!StageStatus::Error.is_skip());
    }

    #[test]
    fn apply_overwrites_present_fields_and_appends_errors() {
        let mut rec = record();

        let mut update = RecordUpdate::new(StageStatus::WebsiteScraped);
        update.website = Some(ScrapedWebsite {
            page_title: "Acme".into(),
            ..Default::default()
        });
        rec.apply(update);

        rec.apply(RecordUpdate::failed(StageStatus::SearchFailed, "search down"));
        rec.apply(RecordUpdate::failed(StageStatus::ReportFailed, "renderer down"));

        assert_eq!(rec.raw().website.as_ref().map(|w| w.page_title.as_str()), Some("Acme"));
        assert_eq!(rec.errors(), ["search down", "renderer down"]);
        assert_eq!(rec.status(), StageStatus::ReportFailed);
    }

    #[test]
    fn later_updates_never_clear_earlier_fields() {
        let mut rec = record();

        let mut update = RecordUpdate::new(StageStatus::StartupEntryCreated);
        update.startup_id = Some("st_1".into());
        rec.apply(update);

        for status in [
            StageStatus::SkippedApplicationCreation,
            StageStatus::UploadError,
            StageStatus::Error,
        ] {
            rec.apply(RecordUpdate::new(status));
            assert_eq!(rec.startup_id(), Some("st_1"));
        }
    }

    #[test]
    fn retain_only_drops_undeclared_fields() {
        let mut update = RecordUpdate::new(StageStatus::WebsiteScraped);
        update.website = Some(ScrapedWebsite::default());
        update.startup_id = Some("sneaky".into());

        let dropped = update.retain_only(&[RecordField::Website]);
        assert_eq!(dropped, vec![RecordField::StartupId]);
        assert_eq!(update.touched(), vec![RecordField::Website]);
    }

    #[test]
    fn outcome_is_computed() {
        let mut rec = record();
        assert_eq!(rec.outcome(), PipelineOutcome::Running);

        rec.mark_completed();
        assert_eq!(rec.outcome(), PipelineOutcome::PartialFailure);

        let mut update = RecordUpdate::new(StageStatus::StructuredByLlm);
        update.findings = Some(Box::default());
        rec.apply(update);
        assert_eq!(rec.outcome(), PipelineOutcome::Success);

        rec.mark_aborted("report", "report aborted: boom");
        assert_eq!(rec.outcome(), PipelineOutcome::Fatal);
        assert_eq!(rec.status(), StageStatus::Error);
    }
}
