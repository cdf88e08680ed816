use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use pitchlens_shared::{
    PitchLensError, RecordField, RecordUpdate, ResearchRecord, Result, StageStatus,
};

use crate::collaborators::ReportRenderer;
use crate::stage::Stage;

/// Renders the investment thesis PDF.
pub struct Report {
    renderer: Arc<dyn ReportRenderer>,
}

impl Report {
    pub fn new(renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Stage for Report {
    fn name(&self) -> &'static str {
        "report"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::Input, RecordField::Findings, RecordField::CompetitorAnalysis]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::ReportPath]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        if record.findings().is_none() {
            return Ok(RecordUpdate::skip(StageStatus::NoResearchFindings));
        }

        let renderer = Arc::clone(&self.renderer);
        let snapshot = record.clone();
        let rendered = match tokio::task::spawn_blocking(move || renderer.render(&snapshot)).await {
            Ok(rendered) => rendered,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(PitchLensError::Render(format!("render task failed: {e}"))),
        };

        match rendered {
            Ok(path) => {
                info!(path = %path.display(), "report generated");
                let mut update = RecordUpdate::new(StageStatus::ReportGenerated);
                update.report_path = Some(path);
                Ok(update)
            }
            Err(e) => {
                warn!(error = %e, "report generation failed");
                Ok(RecordUpdate::failed(
                    StageStatus::ReportFailed,
                    format!("Report generation failed: {e}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::thread::ThreadId;

    use pitchlens_shared::{PitchDeckInput, ResearchFindings, StartupInput};

    use crate::stages::testing::StubRenderer;

    fn record(with_findings: bool) -> ResearchRecord {
        let mut record = ResearchRecord::new(StartupInput::named("Acme"), PitchDeckInput::default());
        if with_findings {
            let mut update = RecordUpdate::new(StageStatus::StructuredByLlm);
            update.findings = Some(Box::new(ResearchFindings::default()));
            record.apply(update);
        }
        record
    }

    #[tokio::test]
    async fn renders_to_a_file() {
        let stage = Report::new(Arc::new(StubRenderer::new()));
        let update = stage.run(&record(true)).await.unwrap();
        assert_eq!(update.status, StageStatus::ReportGenerated);
        assert!(update.report_path.unwrap().exists());
    }

    #[tokio::test]
    async fn render_failure_is_recorded() {
        let stage = Report::new(Arc::new(StubRenderer::failing("font missing")));
        let update = stage.run(&record(true)).await.unwrap();
        assert_eq!(update.status, StageStatus::ReportFailed);
        assert_eq!(update.errors, vec!["Report generation failed: render error: font missing"]);
    }

    /// Remembers which thread rendered.
    struct ThreadRecorder {
        thread: Mutex<Option<ThreadId>>,
    }

    impl ReportRenderer for ThreadRecorder {
        fn render(&self, _record: &ResearchRecord) -> Result<PathBuf> {
            *self.thread.lock().unwrap() = Some(std::thread::current().id());
            Ok(PathBuf::from("thesis.pdf"))
        }
    }

    #[tokio::test]
    async fn renders_off_the_runtime_thread() {
        let renderer = Arc::new(ThreadRecorder {
            thread: Mutex::new(None),
        });
        let stage = Report::new(renderer.clone());
        let update = stage.run(&record(true)).await.unwrap();

        assert_eq!(update.report_path, Some(PathBuf::from("thesis.pdf")));
        let render_thread = renderer.thread.lock().unwrap().unwrap();
        assert_ne!(render_thread, std::thread::current().id());
    }

    #[tokio::test]
    async fn skips_without_findings() {
        let stage = Report::new(Arc::new(StubRenderer::new()));
        let update = stage.run(&record(false)).await.unwrap();
        assert_eq!(update.status, StageStatus::NoResearchFindings);
        assert!(update.errors.is_empty());
    }
}
