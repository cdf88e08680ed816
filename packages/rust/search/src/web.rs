//! Web and news search via Serper or SerpAPI.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use pitchlens_shared::{PitchLensError, Result, SearchBundle, SearchConfig, SearchHit, SearchProvider};

use crate::{USER_AGENT, read_json};

const SERPER_BASE_URL: &str = "https://google.serper.dev";
const SERPAPI_BASE_URL: &str = "https://serpapi.com";

/// Hits kept per category query.
const TOP_PER_QUERY: usize = 3;

/// News articles kept in a bundle.
const TOP_NEWS: usize = 5;

/// `(category, query template)`; `{name}` is replaced with the startup name.
const CATEGORY_QUERIES: [(&str, &str); 11] = [
    ("company_info", "\"{name}\" company"),
    ("funding_info", "{name} funding startup investment"),
    ("funding_info", "{name} crunchbase funding rounds investors"),
    ("product_info", "{name} product features"),
    ("team_info", "{name} founders team CEO"),
    ("team_info", "{name} linkedin company employees"),
    ("founder_backgrounds", "{name} founder background education experience"),
    ("metrics_info", "{name} revenue ARR MRR metrics"),
    ("customer_info", "{name} customer reviews testimonials"),
    ("partnerships", "{name} partnerships collaborations"),
    ("market_info", "{name} market size TAM industry"),
];

/// Search client for one of the supported providers.
pub struct WebSearchClient {
    client: Client,
    provider: SearchProvider,
    api_key: String,
    base_url: String,
    results_per_query: u32,
}

impl WebSearchClient {
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PitchLensError::Network(format!("failed to build HTTP client: {e}")))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| match config.provider {
                SearchProvider::Serper => SERPER_BASE_URL.to_string(),
                SearchProvider::Serpapi => SERPAPI_BASE_URL.to_string(),
            });

        Ok(Self {
            client,
            provider: config.provider,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            results_per_query: config.results_per_query,
        })
    }

    pub fn provider(&self) -> SearchProvider {
        self.provider
    }

    /// Organic web results for `query`.
    pub async fn search(&self, query: &str, num: u32) -> Result<Vec<SearchHit>> {
        self.run(query, num, false).await
    }

    /// News results for `query`.
    pub async fn search_news(&self, query: &str, num: u32) -> Result<Vec<SearchHit>> {
        self.run(query, num, true).await
    }

    async fn run(&self, query: &str, num: u32, news: bool) -> Result<Vec<SearchHit>> {
        debug!(query, num, news, provider = ?self.provider, "search request");

        let request = match self.provider {
            SearchProvider::Serper => {
                let endpoint = if news { "news" } else { "search" };
                self.client
                    .post(format!("{}/{endpoint}", self.base_url))
                    .header("X-API-KEY", &self.api_key)
                    .json(&json!({ "q": query, "num": num }))
            }
            SearchProvider::Serpapi => {
                let mut params = vec![
                    ("engine", "google".to_string()),
                    ("q", query.to_string()),
                    ("num", num.to_string()),
                    ("api_key", self.api_key.clone()),
                ];
                if news {
                    params.push(("tbm", "nws".to_string()));
                }
                self.client
                    .get(format!("{}/search", self.base_url))
                    .query(&params)
            }
        };

        let body = read_json("search", request).await?;
        Ok(parse_hits(&body, self.provider, news))
    }

    /// Run the categorized startup query set plus a news search.
    ///
    /// Individual query failures are logged and skipped; the call fails only
    /// when every query failed.
    #[instrument(skip(self), fields(provider = ?self.provider))]
    pub async fn search_startup(&self, name: &str, industry: &str) -> Result<SearchBundle> {
        let mut queries: Vec<(&str, String)> = CATEGORY_QUERIES
            .iter()
            .map(|(category, template)| (*category, template.replace("{name}", name)))
            .collect();
        if !industry.trim().is_empty() {
            queries.push(("market_info", format!("{name} {} startup market", industry.trim())));
        }

        let mut bundle = SearchBundle {
            query: name.to_string(),
            ..SearchBundle::default()
        };
        let mut last_error = None;
        let mut succeeded = 0usize;

        for (category, query) in &queries {
            match self.search(query, self.results_per_query).await {
                Ok(hits) => {
                    succeeded += 1;
                    let slot = bundle.categories.entry((*category).to_string()).or_default();
                    for hit in hits.into_iter().take(TOP_PER_QUERY) {
                        if !slot.iter().any(|h| h.link == hit.link) {
                            slot.push(hit);
                        }
                    }
                }
                Err(e) => {
                    warn!(category, query = %query, error = %e, "search query failed, skipping");
                    last_error = Some(e);
                }
            }
        }

        match self.search_news(&format!("{name} news"), self.results_per_query).await {
            Ok(hits) => {
                succeeded += 1;
                bundle.news = hits.into_iter().take(TOP_NEWS).collect();
            }
            Err(e) => {
                warn!(error = %e, "news search failed, skipping");
                last_error = Some(e);
            }
        }

        if succeeded == 0 {
            if let Some(err) = last_error {
                return Err(err);
            }
        }

        info!(
            queries = queries.len() + 1,
            succeeded,
            hits = bundle.hit_count(),
            "startup search complete"
        );

        Ok(bundle)
    }
}

/// Pull hits out of a provider response.
fn parse_hits(body: &Value, provider: SearchProvider, news: bool) -> Vec<SearchHit> {
    let key = match (provider, news) {
        (SearchProvider::Serper, false) => "organic",
        (SearchProvider::Serper, true) => "news",
        (SearchProvider::Serpapi, false) => "organic_results",
        (SearchProvider::Serpapi, true) => "news_results",
    };

    body.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(hit_from_value).collect())
        .unwrap_or_default()
}

fn hit_from_value(item: &Value) -> Option<SearchHit> {
    let text = |k: &str| item.get(k).and_then(Value::as_str).unwrap_or_default().to_string();

    let link = text("link");
    if link.is_empty() {
        return None;
    }

    // SerpAPI sometimes nests the source as `{ "name": ... }`.
    let source = match item.get("source") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    Some(SearchHit {
        title: text("title"),
        link,
        snippet: text("snippet"),
        date: item.get("date").and_then(Value::as_str).map(str::to_string),
        source,
    })
}
