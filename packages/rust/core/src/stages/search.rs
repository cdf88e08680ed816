use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use pitchlens_shared::{
    RecordField, RecordUpdate, ResearchRecord, Result, StageStatus, StartupInput,
};

use crate::collaborators::{DeepResearch, WebSearch};
use crate::stage::Stage;

/// Gathers outside research: a deep-research report when available, web
/// search results otherwise.
pub struct Search {
    web: Option<Arc<dyn WebSearch>>,
    deep: Option<Arc<dyn DeepResearch>>,
}

impl Search {
    pub fn new(web: Option<Arc<dyn WebSearch>>, deep: Option<Arc<dyn DeepResearch>>) -> Self {
        Self { web, deep }
    }
}

/// Research brief handed to the deep-research service.
pub fn research_query(input: &StartupInput) -> String {
    let legal = if input.legal_name.trim().is_empty() { &input.name } else { &input.legal_name };
    let mut query = format!(
        "Analyze the startup \"{}\" (legal name: \"{legal}\")",
        input.name.trim()
    );
    if !input.industry.trim().is_empty() {
        query.push_str(&format!(" in the {} industry", input.industry.trim()));
    }
    query.push_str(".\n");
    if !input.website.trim().is_empty() {
        query.push_str(&format!("Website: {}\n", input.website.trim()));
    }
    if !input.description.trim().is_empty() {
        query.push_str(&format!("Description: {}\n", input.description.trim()));
    }
    query.push_str(
        "Find detailed information about:\n\
         1. Founders and their backgrounds\n\
         2. Business model, pricing, and revenue streams\n\
         3. Funding history, investors, and amount raised\n\
         4. Market size, target audience, and competitors\n\
         5. Traction, customer reviews, and news",
    );
    query
}

#[async_trait]
impl Stage for Search {
    fn name(&self) -> &'static str {
        "search"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::Input]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::Search, RecordField::DeepResearch]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let input = record.input();
        let name = input.name.trim();
        if name.is_empty() {
            return Ok(RecordUpdate::skip(StageStatus::NoStartupName));
        }
        if self.web.is_none() && self.deep.is_none() {
            info!("no search provider configured");
            return Ok(RecordUpdate::skip(StageStatus::SkippedSearchNoProvider));
        }

        let mut deep_error = None;
        if let Some(deep) = &self.deep {
            match deep.research(&research_query(input)).await {
                Ok(report) => {
                    info!(chars = report.report.len(), sources = report.sources.len(), "deep research completed");
                    let mut update = RecordUpdate::new(StageStatus::SearchCompleted);
                    update.deep_research = Some(report);
                    return Ok(update);
                }
                Err(e) => {
                    warn!(error = %e, "deep research failed, falling back to web search");
                    deep_error = Some(format!("Deep research failed: {e}"));
                }
            }
        }

        let Some(web) = &self.web else {
            let mut update = RecordUpdate::new(StageStatus::SearchFailed);
            update.errors.extend(deep_error);
            return Ok(update);
        };

        match web.search_startup(name, input.industry.trim()).await {
            Ok(bundle) => {
                info!(hits = bundle.hit_count(), "web search completed");
                let mut update = RecordUpdate::new(StageStatus::SearchCompleted);
                update.search = Some(bundle);
                Ok(update)
            }
            Err(e) => {
                warn!(error = %e, "web search failed");
                let mut update = RecordUpdate::new(StageStatus::SearchFailed);
                update.errors.extend(deep_error);
                update.errors.push(format!("Web search failed: {e}"));
                Ok(update)
            }
        }
    }
}
