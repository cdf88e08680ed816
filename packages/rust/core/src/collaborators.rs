//! The external services the pipeline stages talk to.
//!
//! Each service sits behind a trait so stages can be exercised with stubs.
//! The concrete crates implement them here.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use pitchlens_crawler::{ScrapedPage, SiteScraper};
use pitchlens_document::{DocumentSource, ExtractedDocument, PdfDocumentExtractor};
use pitchlens_report::PdfReportRenderer;
use pitchlens_search::{DeepResearchClient, WebSearchClient};
use pitchlens_shared::{
    AppConfig, DeepResearchReport, ResearchRecord, Result, SearchBundle, validate_api_key,
};

use crate::llm::OpenAiCompatibleClient;
use crate::platform::{
    ApplicationPayload, DocumentUpload, PlatformClient, ScorecardUpload, StartupPayload,
};

/// Timeout for downloading remote pitch decks.
const DOCUMENT_TIMEOUT_SECS: u64 = 60;

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, source: DocumentSource<'_>) -> Result<ExtractedDocument>;
}

#[async_trait]
pub trait SiteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ScrapedPage>;
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Categorized search results about a startup.
    async fn search_startup(&self, name: &str, industry: &str) -> Result<SearchBundle>;
}

#[async_trait]
pub trait DeepResearch: Send + Sync {
    /// Long-form research report; may take minutes.
    async fn research(&self, query: &str) -> Result<DeepResearchReport>;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub trait ReportRenderer: Send + Sync {
    /// Render the record to a file and return its path.
    fn render(&self, record: &ResearchRecord) -> Result<PathBuf>;
}

#[async_trait]
pub trait PlatformBackend: Send + Sync {
    async fn create_entity(&self, payload: &StartupPayload) -> Result<String>;
    async fn create_sub_entity(&self, payload: &ApplicationPayload) -> Result<String>;
    async fn upload_scorecard(&self, upload: ScorecardUpload) -> Result<()>;
    async fn upload_document(&self, upload: DocumentUpload) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Implementations for the concrete clients
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentExtractor for PdfDocumentExtractor {
    async fn extract(&self, source: DocumentSource<'_>) -> Result<ExtractedDocument> {
        PdfDocumentExtractor::extract(self, source).await
    }
}

#[async_trait]
impl SiteFetcher for SiteScraper {
    async fn fetch(&self, url: &str) -> Result<ScrapedPage> {
        SiteScraper::fetch(self, url).await
    }
}

#[async_trait]
impl WebSearch for WebSearchClient {
    async fn search_startup(&self, name: &str, industry: &str) -> Result<SearchBundle> {
        WebSearchClient::search_startup(self, name, industry).await
    }
}

#[async_trait]
impl DeepResearch for DeepResearchClient {
    async fn research(&self, query: &str) -> Result<DeepResearchReport> {
        DeepResearchClient::research(self, query).await
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        OpenAiCompatibleClient::complete(self, prompt).await
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, record: &ResearchRecord) -> Result<PathBuf> {
        PdfReportRenderer::render(self, record)
    }
}

#[async_trait]
impl PlatformBackend for PlatformClient {
    async fn create_entity(&self, payload: &StartupPayload) -> Result<String> {
        PlatformClient::create_entity(self, payload).await
    }

    async fn create_sub_entity(&self, payload: &ApplicationPayload) -> Result<String> {
        PlatformClient::create_sub_entity(self, payload).await
    }

    async fn upload_scorecard(&self, upload: ScorecardUpload) -> Result<()> {
        PlatformClient::upload_scorecard(self, upload).await
    }

    async fn upload_document(&self, upload: DocumentUpload) -> Result<()> {
        PlatformClient::upload_document(self, upload).await
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Everything the standard pipeline needs. Optional services are skipped
/// by their stages when absent.
#[derive(Clone)]
pub struct Collaborators {
    pub documents: Arc<dyn DocumentExtractor>,
    pub site: Arc<dyn SiteFetcher>,
    pub web_search: Option<Arc<dyn WebSearch>>,
    pub deep_research: Option<Arc<dyn DeepResearch>>,
    pub llm: Arc<dyn LanguageModel>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub platform: Option<Arc<dyn PlatformBackend>>,
}

impl Collaborators {
    /// Build the real clients from config and environment keys.
    ///
    /// The LLM key is required. Search, deep research, and the platform are
    /// enabled only when their keys (and for the platform, `base_url`) are set.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let llm_key = validate_api_key(config)?;
        let llm = OpenAiCompatibleClient::new(&config.llm, llm_key)?;

        let web_search: Option<Arc<dyn WebSearch>> =
            match AppConfig::api_key(config.search.api_key_env()) {
                Some(key) => Some(Arc::new(WebSearchClient::new(&config.search, key)?)),
                None => {
                    info!(env = config.search.api_key_env(), "web search disabled, no API key");
                    None
                }
            };

        let deep_research: Option<Arc<dyn DeepResearch>> = if config.deep_research.enabled {
            match AppConfig::api_key(&config.deep_research.api_key_env) {
                Some(key) => Some(Arc::new(DeepResearchClient::new(&config.deep_research, key)?)),
                None => {
                    info!(env = %config.deep_research.api_key_env, "deep research disabled, no API key");
                    None
                }
            }
        } else {
            None
        };

        let platform: Option<Arc<dyn PlatformBackend>> = match &config.platform.base_url {
            Some(base_url) => match AppConfig::api_key(&config.platform.api_key_env) {
                Some(key) => Some(Arc::new(PlatformClient::new(base_url, &config.platform, key)?)),
                None => {
                    warn!(
                        env = %config.platform.api_key_env,
                        "platform base_url is set but the API key is missing, platform disabled"
                    );
                    None
                }
            },
            None => None,
        };

        let site = SiteScraper::new(&config.site)?;

        Ok(Self {
            documents: Arc::new(PdfDocumentExtractor::new(DOCUMENT_TIMEOUT_SECS)?),
            site: Arc::new(site),
            web_search,
            deep_research,
            llm: Arc::new(llm),
            renderer: Arc::new(PdfReportRenderer::new(&config.defaults.output_dir)),
            platform,
        })
    }
}
