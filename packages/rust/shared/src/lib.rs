//! Shared types, error model, and configuration for PitchLens.
//!
//! This crate is the foundation depended on by all other PitchLens crates.
//! It provides:
//! - [`PitchLensError`], the unified error type
//! - The research record and its parts ([`ResearchRecord`], [`RecordUpdate`],
//!   [`ResearchFindings`], [`Scorecard`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod findings;
pub mod record;
pub mod scorecard;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DeepResearchConfig, DefaultsConfig, LlmConfig, PlatformConfig, SearchConfig,
    SearchProvider, ServerConfig, SiteConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{PitchLensError, Result};
pub use findings::{
    Competitor, CompetitorAnalysis, FounderProfile, MAX_COMPETITORS, MarketData, ResearchFindings,
    ThesisCategory,
};
pub use record::{
    PipelineOutcome, RecordField, RecordUpdate, ResearchRecord, StageStatus, WorkflowMeta,
};
pub use scorecard::{MAX_SCORE, Recommendation, ScoreBand, ScoreCategory, ScoreDetail, Scorecard};
pub use types::{
    DeepResearchReport, ExtractedPitchDeck, PitchDeckInput, RawGathering, RunId, ScrapedWebsite,
    SearchBundle, SearchHit, StartupInput,
};
