//! The ten research stages, in pipeline order.
//!
//! Each stage returns a sparse update. Collaborator failures become a
//! failure status plus an error message; missing preconditions become a skip
//! status.

pub mod competitors;
pub mod document;
pub mod platform;
pub mod report;
pub mod search;
pub mod structure;
pub mod website;

#[cfg(test)]
pub(crate) mod testing {
    //! Stub collaborators for driving stages without network access.

    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use pitchlens_crawler::ScrapedPage;
    use pitchlens_document::{DocumentSource, ExtractedDocument};
    use pitchlens_shared::{
        DeepResearchReport, PitchLensError, ResearchRecord, Result, SearchBundle, SearchHit,
    };

    use crate::collaborators::{
        Collaborators, DeepResearch, DocumentExtractor, LanguageModel, PlatformBackend,
        ReportRenderer, SiteFetcher, WebSearch,
    };
    use crate::platform::{ApplicationPayload, DocumentUpload, ScorecardUpload, StartupPayload};

    pub fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pitchlens-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // -- documents ----------------------------------------------------------

    pub struct StubDocuments {
        pub reply: std::result::Result<ExtractedDocument, String>,
        pub sources: Mutex<Vec<String>>,
    }

    impl StubDocuments {
        pub fn pages(pages: &[&str]) -> Self {
            let full_text = pages
                .iter()
                .enumerate()
                .map(|(i, p)| format!("\n--- Page {} ---\n{p}", i + 1))
                .collect();
            Self {
                reply: Ok(ExtractedDocument {
                    full_text,
                    pages: pages.len(),
                }),
                sources: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                sources: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentExtractor for StubDocuments {
        async fn extract(&self, source: DocumentSource<'_>) -> Result<ExtractedDocument> {
            let label = match source {
                DocumentSource::Bytes(_) => "bytes".to_string(),
                DocumentSource::Path(p) => format!("path:{}", p.display()),
                DocumentSource::Url(u) => format!("url:{u}"),
            };
            self.sources.lock().unwrap().push(label);
            self.reply.clone().map_err(PitchLensError::Extraction)
        }
    }

    // -- site ---------------------------------------------------------------

    pub struct StubSite {
        pub reply: std::result::Result<ScrapedPage, String>,
    }

    impl StubSite {
        pub fn page(url: &str, text: &str) -> Self {
            Self {
                reply: Ok(ScrapedPage {
                    url: url.to_string(),
                    title: "Acme".into(),
                    description: "Rockets for everyone".into(),
                    main_text: text.to_string(),
                    links: vec![format!("{url}/about")],
                    content_hash: "abc123".into(),
                }),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl SiteFetcher for StubSite {
        async fn fetch(&self, _url: &str) -> Result<ScrapedPage> {
            self.reply.clone().map_err(PitchLensError::Network)
        }
    }

    // -- search -------------------------------------------------------------

    pub struct StubWebSearch {
        pub fail: Option<String>,
        pub calls: AtomicUsize,
    }

    impl StubWebSearch {
        pub fn ok() -> Self {
            Self {
                fail: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail: Some(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WebSearch for StubWebSearch {
        async fn search_startup(&self, name: &str, _industry: &str) -> Result<SearchBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail {
                return Err(PitchLensError::Network(message.clone()));
            }
            let mut bundle = SearchBundle {
                query: name.to_string(),
                ..Default::default()
            };
            bundle.categories.insert(
                "company_info".into(),
                vec![SearchHit {
                    title: format!("{name} overview"),
                    link: "https://news.example/acme".into(),
                    snippet: "A rocket company".into(),
                    ..Default::default()
                }],
            );
            Ok(bundle)
        }
    }

    pub struct StubDeepResearch {
        pub fail: Option<String>,
        pub queries: Mutex<Vec<String>>,
    }

    impl StubDeepResearch {
        pub fn ok() -> Self {
            Self {
                fail: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail: Some(message.to_string()),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DeepResearch for StubDeepResearch {
        async fn research(&self, query: &str) -> Result<DeepResearchReport> {
            self.queries.lock().unwrap().push(query.to_string());
            match &self.fail {
                Some(message) => Err(PitchLensError::Timeout(message.clone())),
                None => Ok(DeepResearchReport {
                    request_id: "req-1".into(),
                    report: "Acme competes with Globex in launch services.".into(),
                    sources: Vec::new(),
                }),
            }
        }
    }

    // -- language model -----------------------------------------------------

    /// Replies in order; the last reply repeats.
    pub struct StubLlm {
        replies: Mutex<VecDeque<std::result::Result<String, String>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl StubLlm {
        pub fn replying(text: &str) -> Self {
            Self::sequence(vec![Ok(text.to_string())])
        }

        pub fn failing(message: &str) -> Self {
            Self::sequence(vec![Err(message.to_string())])
        }

        pub fn sequence(replies: Vec<std::result::Result<String, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            };
            match reply {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(PitchLensError::http("language model", 503, message)),
                None => Err(PitchLensError::parse("no scripted reply")),
            }
        }
    }

    // -- renderer -----------------------------------------------------------

    /// Writes a tiny placeholder PDF into a fresh temp directory.
    pub struct StubRenderer {
        pub fail: Option<String>,
        pub dir: PathBuf,
    }

    impl StubRenderer {
        pub fn new() -> Self {
            Self {
                fail: None,
                dir: temp_dir(),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail: Some(message.to_string()),
                dir: temp_dir(),
            }
        }
    }

    impl ReportRenderer for StubRenderer {
        fn render(&self, record: &ResearchRecord) -> Result<PathBuf> {
            if let Some(message) = &self.fail {
                return Err(PitchLensError::Render(message.clone()));
            }
            let path = self.dir.join(format!("{}.pdf", record.run_id()));
            std::fs::write(&path, b"%PDF-1.4 stub").map_err(|e| PitchLensError::io(&path, e))?;
            Ok(path)
        }
    }

    // -- platform -----------------------------------------------------------

    #[derive(Default)]
    pub struct StubPlatform {
        /// `(status, body)` to fail the matching call with.
        pub fail_entity: Option<(u16, String)>,
        pub fail_sub_entity: Option<(u16, String)>,
        pub fail_scorecard: Option<(u16, String)>,
        pub fail_document: Option<(u16, String)>,
        pub entities: Mutex<Vec<StartupPayload>>,
        pub sub_entities: Mutex<Vec<ApplicationPayload>>,
        pub scorecards: Mutex<Vec<ScorecardUpload>>,
        pub documents: Mutex<Vec<DocumentUpload>>,
    }

    fn maybe_fail(fail: &Option<(u16, String)>) -> Result<()> {
        match fail {
            Some((status, body)) => Err(PitchLensError::http("platform", *status, body.clone())),
            None => Ok(()),
        }
    }

    #[async_trait]
    impl PlatformBackend for StubPlatform {
        async fn create_entity(&self, payload: &StartupPayload) -> Result<String> {
            maybe_fail(&self.fail_entity)?;
            self.entities.lock().unwrap().push(payload.clone());
            Ok("st-1".into())
        }

        async fn create_sub_entity(&self, payload: &ApplicationPayload) -> Result<String> {
            maybe_fail(&self.fail_sub_entity)?;
            self.sub_entities.lock().unwrap().push(payload.clone());
            Ok("app-1".into())
        }

        async fn upload_scorecard(&self, upload: ScorecardUpload) -> Result<()> {
            maybe_fail(&self.fail_scorecard)?;
            self.scorecards.lock().unwrap().push(upload);
            Ok(())
        }

        async fn upload_document(&self, upload: DocumentUpload) -> Result<()> {
            maybe_fail(&self.fail_document)?;
            self.documents.lock().unwrap().push(upload);
            Ok(())
        }
    }

    /// Offline collaborators: no search, no platform, a failing site.
    pub fn collaborators(llm: StubLlm) -> Collaborators {
        Collaborators {
            documents: Arc::new(StubDocuments::pages(&["Acme builds rockets"])),
            site: Arc::new(StubSite::failing("offline")),
            web_search: None,
            deep_research: None,
            llm: Arc::new(llm),
            renderer: Arc::new(StubRenderer::new()),
            platform: None,
        }
    }
}
