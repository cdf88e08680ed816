use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use pitchlens_shared::{
    Competitor, CompetitorAnalysis, MAX_COMPETITORS, MarketData, RecordField, RecordUpdate,
    ResearchRecord, Result, StageStatus,
};

use crate::collaborators::LanguageModel;
use crate::prompts;
use crate::reconcile::{self, FieldReader};
use crate::stage::Stage;

/// Market-data explanation bullets kept.
const MAX_EXPLANATION_POINTS: usize = 2;

/// Profiles the startup's main competitors and cross-checks market size.
pub struct Competitors {
    llm: Arc<dyn LanguageModel>,
}

impl Competitors {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

/// Read a competitor analysis out of a flat model map.
pub fn analysis_from_map(map: &Map<String, Value>, startup_name: &str) -> CompetitorAnalysis {
    let r = FieldReader::new(map);

    let competitors = match r.get("competitors") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(competitor_from_map)
            .filter(|c| !c.name.is_empty())
            .take(MAX_COMPETITORS)
            .collect(),
        _ => Vec::new(),
    };

    // Flattening hoists the market figures to the top level.
    let market = r.object("validated_market_data");
    let m = if market.is_empty() { FieldReader::new(map) } else { FieldReader::new(&market) };
    let mut explanation = m.list("explanation");
    explanation.truncate(MAX_EXPLANATION_POINTS);

    CompetitorAnalysis {
        startup_name: startup_name.to_string(),
        competitors,
        market_overview: r.text("market_overview"),
        competitive_advantages: r.text("competitive_advantages"),
        market_threats: r.text("market_threats"),
        validated_market_data: MarketData {
            tam: m.number("tam"),
            sam: m.number("sam"),
            som: m.number("som"),
            explanation,
        },
    }
}

fn competitor_from_map(obj: &Map<String, Value>) -> Competitor {
    let r = FieldReader::new(obj);
    Competitor {
        name: r.text("name"),
        founded_year: r
            .number("founded_year")
            .filter(|y| (1800.0..=2100.0).contains(y))
            .map(|y| y as i32),
        headquarters: r.text("headquarters"),
        funding_raised: r.number("funding_raised"),
        current_valuation: r.number("current_valuation"),
        revenue: r.number("revenue"),
        business_model: r.text("business_model"),
        focus_market: r.text("focus_market"),
        traction: r.text("traction"),
        similarities: r.text("similarities"),
    }
}

#[async_trait]
impl Stage for Competitors {
    fn name(&self) -> &'static str {
        "competitors"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::Findings, RecordField::DeepResearch]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::CompetitorAnalysis]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let Some(findings) = record.findings() else {
            return Ok(RecordUpdate::skip(StageStatus::NoResearchFindings));
        };

        let deep = record.raw().deep_research.as_ref().map(|r| r.report.as_str());
        let prompt = prompts::competitor_prompt(findings, deep);

        let reply = match self.llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "competitor analysis call failed");
                return Ok(RecordUpdate::failed(
                    StageStatus::CompetitorAnalysisFailed,
                    format!("Competitor analysis failed: {e}"),
                ));
            }
        };

        let parsed = reconcile::parse_model_output(&reply);
        let valid = parsed.is_parsed();
        let analysis = analysis_from_map(&reconcile::normalize(parsed), &findings.name);

        let mut update = if valid {
            info!(
                competitors = analysis.competitors.len(),
                validated_market = !analysis.validated_market_data.is_empty(),
                "competitors analyzed"
            );
            RecordUpdate::new(StageStatus::CompetitorsAnalyzed)
        } else {
            warn!(reply_chars = reply.len(), "competitor output was not JSON");
            RecordUpdate::failed(
                StageStatus::CompetitorAnalysisFailed,
                "Competitor analysis output was not valid JSON",
            )
        };
        update.competitor_analysis = Some(analysis);
        Ok(update)
    }
}
