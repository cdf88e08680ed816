//! Sequential stage runner.
//!
//! Stages run one after another over a single [`ResearchRecord`]. A stage's
//! update is checked against its declared writes and merged; an `Err` is
//! recorded and the run continues; a panic is recorded and ends the run.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{error, info, instrument, warn};

use pitchlens_shared::{
    PlatformConfig, RecordField, RecordUpdate, ResearchRecord, StageStatus,
};

use crate::collaborators::Collaborators;
use crate::stage::Stage;
use crate::stages;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a stage runs. `index` is zero-based.
    fn stage_started(&self, name: &str, index: usize, total: usize);
    /// Called after a stage's update has been merged.
    fn stage_finished(&self, name: &str, status: StageStatus);
    /// Called once the run is over.
    fn done(&self, record: &ResearchRecord);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _name: &str, _index: usize, _total: usize) {}
    fn stage_finished(&self, _name: &str, _status: StageStatus) {}
    fn done(&self, _record: &ResearchRecord) {}
}

/// An ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline = Self { stages };
        for (stage, field) in pipeline.unsatisfied_reads() {
            warn!(stage, field = field.as_str(), "stage reads a field no earlier stage writes");
        }
        pipeline
    }

    /// The ten research stages in their fixed order.
    pub fn standard(collaborators: Collaborators, platform: PlatformConfig) -> Self {
        let Collaborators {
            documents,
            site,
            web_search,
            deep_research,
            llm,
            renderer,
            platform: backend,
        } = collaborators;
        let platform = Arc::new(platform);

        Self::new(vec![
            Box::new(stages::document::ExtractDocument::new(documents)),
            Box::new(stages::website::FetchSite::new(site)),
            Box::new(stages::search::Search::new(web_search, deep_research)),
            Box::new(stages::structure::Structure::new(llm.clone())),
            Box::new(stages::competitors::Competitors::new(llm)),
            Box::new(stages::report::Report::new(renderer)),
            Box::new(stages::platform::CreateStartup::new(backend.clone(), platform.clone())),
            Box::new(stages::platform::CreateApplication::new(backend.clone(), platform)),
            Box::new(stages::platform::UploadReport::new(backend.clone())),
            Box::new(stages::platform::UploadPitchDeck::new(backend)),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Declared reads that are neither request input nor written by an
    /// earlier stage, in stage order.
    pub fn unsatisfied_reads(&self) -> Vec<(&'static str, RecordField)> {
        let mut available = vec![RecordField::Input, RecordField::PitchDeckInput];
        let mut missing = Vec::new();
        for stage in &self.stages {
            for field in stage.reads() {
                if !available.contains(field) {
                    missing.push((stage.name(), *field));
                }
            }
            available.extend_from_slice(stage.writes());
        }
        missing
    }

    /// Run every stage over `record` and return it.
    ///
    /// Never fails: every problem ends up in the record's errors.
    #[instrument(skip_all, fields(run_id = %record.run_id(), startup = %record.input().name))]
    pub async fn run(&self, mut record: ResearchRecord, progress: &dyn ProgressReporter) -> ResearchRecord {
        let start = Instant::now();
        let total = self.stages.len();
        info!(stages = total, "starting research pipeline");

        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.name();
            progress.stage_started(name, index, total);
            let stage_start = Instant::now();

            let outcome = AssertUnwindSafe(stage.run(&record)).catch_unwind().await;

            match outcome {
                Ok(Ok(mut update)) => {
                    let dropped = update.retain_only(stage.writes());
                    if !dropped.is_empty() {
                        let fields: Vec<&str> = dropped.iter().map(|f| f.as_str()).collect();
                        warn!(stage = name, ?fields, "stage wrote undeclared fields, dropped");
                        update.errors.push(format!(
                            "{name}: wrote undeclared fields: {}",
                            fields.join(", ")
                        ));
                    }
                    for e in &update.errors {
                        warn!(stage = name, error = %e, "stage reported error");
                    }
                    record.apply(update);
                }
                Ok(Err(e)) => {
                    warn!(stage = name, error = %e, "stage failed");
                    record.apply(RecordUpdate::failed(StageStatus::Error, format!("{name}: {e}")));
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(stage = name, %message, "stage panicked, aborting run");
                    record.mark_aborted(name, format!("{name} aborted: {message}"));
                    progress.stage_finished(name, record.status());
                    break;
                }
            }

            let reads: Vec<&str> = stage.reads().iter().map(|f| f.as_str()).collect();
            info!(
                stage = name,
                ?reads,
                status = %record.status(),
                elapsed_ms = stage_start.elapsed().as_millis() as u64,
                "stage finished"
            );
            progress.stage_finished(name, record.status());
        }

        record.mark_completed();

        info!(
            outcome = ?record.outcome(),
            errors = record.errors().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "research pipeline finished"
        );
        progress.done(&record);

        record
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
