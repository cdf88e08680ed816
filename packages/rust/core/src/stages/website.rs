use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use pitchlens_crawler::detect_technologies;
use pitchlens_shared::{
    RecordField, RecordUpdate, ResearchRecord, Result, ScrapedWebsite, StageStatus,
};

use crate::collaborators::SiteFetcher;
use crate::stage::Stage;

/// Scrapes the company homepage.
pub struct FetchSite {
    fetcher: Arc<dyn SiteFetcher>,
}

impl FetchSite {
    pub fn new(fetcher: Arc<dyn SiteFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Stage for FetchSite {
    fn name(&self) -> &'static str {
        "fetch-site"
    }

    fn reads(&self) -> &'static [RecordField] {
        &[RecordField::Input]
    }

    fn writes(&self) -> &'static [RecordField] {
        &[RecordField::Website]
    }

    async fn run(&self, record: &ResearchRecord) -> Result<RecordUpdate> {
        let url = record.input().website.trim();
        if url.is_empty() {
            return Ok(RecordUpdate::skip(StageStatus::NoWebsite));
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, error = %e, "website scrape failed");
                return Ok(RecordUpdate::failed(
                    StageStatus::WebsiteScrapeFailed,
                    format!("Website scraping failed: {e}"),
                ));
            }
        };

        let technologies_detected = detect_technologies(&page.main_text);
        info!(
            url = %page.url,
            chars = page.main_text.len(),
            links = page.links.len(),
            ?technologies_detected,
            "website scraped"
        );

        let mut update = RecordUpdate::new(StageStatus::WebsiteScraped);
        update.website = Some(ScrapedWebsite {
            url: page.url,
            page_title: page.title,
            page_description: page.description,
            main_content: page.main_text,
            technologies_detected,
            links: page.links,
            content_hash: page.content_hash,
        });
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchlens_shared::{PitchDeckInput, StartupInput};

    use crate::stages::testing::StubSite;

    fn record(website: &str) -> ResearchRecord {
        let mut input = StartupInput::named("Acme");
        input.website = website.into();
        ResearchRecord::new(input, PitchDeckInput::default())
    }

    #[tokio::test]
    async fn scraped_page_maps_to_website() {
        let stage = FetchSite::new(Arc::new(StubSite::page(
            "https://acme.io",
            "Built with React and Python on AWS.",
        )));
        let update = stage.run(&record("acme.io")).await.unwrap();

        assert_eq!(update.status, StageStatus::WebsiteScraped);
        let site = update.website.unwrap();
        assert_eq!(site.page_title, "Acme");
        assert_eq!(site.technologies_detected, vec!["react", "python", "aws"]);
        assert_eq!(site.links, vec!["https://acme.io/about"]);
    }

    #[tokio::test]
    async fn missing_website_skips() {
        let stage = FetchSite::new(Arc::new(StubSite::failing("unused")));
        let update = stage.run(&record("  ")).await.unwrap();
        assert_eq!(update.status, StageStatus::NoWebsite);
        assert!(update.errors.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_recorded() {
        let stage = FetchSite::new(Arc::new(StubSite::failing("connection refused")));
        let update = stage.run(&record("https://acme.io")).await.unwrap();
        assert_eq!(update.status, StageStatus::WebsiteScrapeFailed);
        assert_eq!(
            update.errors,
            vec!["Website scraping failed: network error: connection refused"]
        );
    }
}
