//! Research pipeline for PitchLens.
//!
//! This crate ties document extraction, site scraping, web research, LLM
//! structuring, report rendering and platform uploads into one sequential
//! run over a [`ResearchRecord`](pitchlens_shared::ResearchRecord).

pub mod collaborators;
pub mod llm;
pub mod pipeline;
pub mod platform;
pub mod prompts;
pub mod reconcile;
pub mod request;
pub mod stage;
pub mod stages;

pub use collaborators::Collaborators;
pub use pipeline::{Pipeline, ProgressReporter, SilentProgress};
pub use request::{ResearchRequest, ResearchResponse, UploadedDocument, prepare_record};
pub use stage::Stage;
