use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use pitchlens_shared::{RecordField, RecordUpdate, ResearchRecord, Result, StageStatus};

use crate::collaborators::LanguageModel;
use crate::prompts;
use crate::reconcile::{self, ParsedOutput};
use crate::stage::Stage;

/// Asks the model to turn everything gathered into structured findings and
/// a scorecard.
pub struct Structure {
    llm: Arc<dyn LanguageModel>,
}

impl Structure {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage for Structure {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[
            RecordField::Input,
            RecordField::PitchDeck,
            RecordField::Website,
            RecordField::Search,
            RecordField::DeepResearch,
        ]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::Findings]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let raw = record.raw();
        if raw.is_empty() {
            info!("nothing gathered, skipping structuring");
            return Ok(RecordUpdate::skip(StageStatus::NoRawData));
        }

        let prompt = prompts::structure_prompt(record.input(), raw);
        debug!(prompt_chars = prompt.len(), "structuring with language model");

        let reply = match self.llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "structuring call failed");
                return Ok(RecordUpdate::failed(
                    StageStatus::StructuringFailed,
                    format!("LLM structuring failed: {e}"),
                ));
            }
        };

        let parsed = reconcile::parse_model_output(&reply);
        let valid = parsed.is_parsed();
        if let ParsedOutput::RawNested(_) = &parsed {
            debug!("model grouped fields under section headers, flattening");
        }

        let mut findings = reconcile::findings_from_map(&reconcile::normalize(parsed), record.input());
        findings.data_sources = raw.source_names();
        findings.research_timestamp = Some(Utc::now());

        let mut update = if valid {
            info!(
                name = %findings.name,
                thesis = %findings.thesis_name,
                overall = findings.ai_scorecard.overall_score,
                recommendation = %findings.ai_scorecard.investment_recommendation,
                "findings structured"
            );
            RecordUpdate::new(StageStatus::StructuredByLlm)
        } else {
            warn!(reply_chars = reply.len(), "model output was not JSON, using input fallbacks");
            RecordUpdate::failed(StageStatus::StructuringFailed, "LLM output was not valid JSON")
        };
        update.findings = Some(Box::new(findings));
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchlens_shared::{
        ExtractedPitchDeck, PitchDeckInput, Recommendation, StartupInput, ThesisCategory,
    };

    use crate::stages::testing::StubLlm;

    fn record_with_deck() -> ResearchRecord {
        let mut input = StartupInput::named("Acme");
        input.website = "https://acme.io".into();
        let mut record = ResearchRecord::new(input, PitchDeckInput::default());
        let mut update = RecordUpdate::new(StageStatus::PitchDeckParsed);
        update.pitch_deck = Some(ExtractedPitchDeck {
            raw_text: "Acme builds reusable rockets".into(),
            key_points: Vec::new(),
            page_count: 1,
        });
        record.apply(update);
        record
    }

    #[tokio::test]
    async fn empty_raw_bundle_skips_without_calling_model() {
        let llm = Arc::new(StubLlm::failing("unused"));
        let stage = Structure::new(llm.clone());
        let record = ResearchRecord::new(StartupInput::named("Acme"), PitchDeckInput::default());

        let update = stage.run(&record).await.unwrap();
        assert_eq!(update.status, StageStatus::NoRawData);
        assert!(update.errors.is_empty());
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nested_reply_becomes_findings() {
        let reply = r#"Sure! Here is the analysis:
        {
          "BASIC_INFORMATION": { "name": "Acme Rockets", "industry": "Aerospace" },
          "THESIS_CLASSIFICATION": { "thesis_name": "RUMS" },
          "AI_SCORECARD": {
            "founders_score": { "score": 8 }, "market_score": { "score": 8 },
            "product_score": { "score": 8 }, "traction_score": { "score": 8 },
            "team_score": { "score": 8 }, "financials_score": { "score": 8 },
            "investment_recommendation": "PASS"
          }
        }"#;
        let llm = Arc::new(StubLlm::replying(reply));
        let stage = Structure::new(llm.clone());

        let update = stage.run(&record_with_deck()).await.unwrap();
        assert_eq!(update.status, StageStatus::StructuredByLlm);
        assert!(update.errors.is_empty());

        let findings = update.findings.unwrap();
        assert_eq!(findings.name, "Acme Rockets");
        assert_eq!(findings.thesis_name, ThesisCategory::Rums);
        assert_eq!(findings.website, "https://acme.io");
        assert_eq!(findings.data_sources, vec!["pitch_deck"]);
        assert!(findings.research_timestamp.is_some());
        assert_eq!(findings.ai_scorecard.investment_recommendation, Recommendation::StrongBuy);

        assert!(llm.prompts.lock().unwrap()[0].contains("Acme builds reusable rockets"));
    }

    #[tokio::test]
    async fn prose_reply_records_error_and_keeps_fallbacks() {
        let stage = Structure::new(Arc::new(StubLlm::replying("I could not find anything.")));
        let update = stage.run(&record_with_deck()).await.unwrap();

        assert_eq!(update.status, StageStatus::StructuringFailed);
        assert_eq!(update.errors, vec!["LLM output was not valid JSON"]);
        let findings = update.findings.unwrap();
        assert_eq!(findings.name, "Acme");
        assert_eq!(findings.website, "https://acme.io");
        assert!(!findings.ai_scorecard.has_scores());
    }

    #[tokio::test]
    async fn model_failure_leaves_findings_unset() {
        let stage = Structure::new(Arc::new(StubLlm::failing("overloaded")));
        let update = stage.run(&record_with_deck()).await.unwrap();
        assert_eq!(update.status, StageStatus::StructuringFailed);
        assert!(update.findings.is_none());
        assert_eq!(
            update.errors,
            vec!["LLM structuring failed: language model returned HTTP 503: overloaded"]
        );
    }
}
