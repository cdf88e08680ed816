//! Input identity and raw-gathering types carried by a research record.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one research run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Input identity
// ---------------------------------------------------------------------------

/// What the caller told us about the startup. Only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupInput {
    pub name: String,
    pub legal_name: String,
    pub industry: String,
    pub description: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub founders: Vec<String>,
    pub stage: String,
    pub team_size: Option<u32>,
    pub founded_year: Option<i32>,
    pub location: String,
    pub ceo_linkedin_url: String,
    /// Link to a shared data room folder, forwarded to the platform.
    pub data_room_url: String,
}

impl StartupInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Where the pitch deck comes from, as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchDeckInput {
    /// Text already extracted by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// External URL to download the deck from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Local copy of an uploaded deck.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl PitchDeckInput {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty())
            && self.url.as_deref().is_none_or(|u| u.trim().is_empty())
            && self.file_path.is_none()
    }
}

// ---------------------------------------------------------------------------
// Raw gathering
// ---------------------------------------------------------------------------

/// Text pulled from the pitch deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedPitchDeck {
    pub raw_text: String,
    pub key_points: Vec<String>,
    pub page_count: usize,
}

/// What we scraped from the company website.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapedWebsite {
    pub url: String,
    pub page_title: String,
    pub page_description: String,
    pub main_content: String,
    pub technologies_detected: Vec<String>,
    pub links: Vec<String>,
    /// SHA-256 of the main content.
    pub content_hash: String,
}

/// One ranked search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Categorized web search results plus news.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBundle {
    pub query: String,
    /// Category name (e.g. `"funding_info"`) → top hits.
    pub categories: BTreeMap<String, Vec<SearchHit>>,
    pub news: Vec<SearchHit>,
}

impl SearchBundle {
    pub fn is_empty(&self) -> bool {
        self.news.is_empty() && self.categories.values().all(Vec::is_empty)
    }

    pub fn hit_count(&self) -> usize {
        self.news.len() + self.categories.values().map(Vec::len).sum::<usize>()
    }
}

/// Long-form report produced by the deep-research service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepResearchReport {
    pub request_id: String,
    pub report: String,
    pub sources: Vec<serde_json::Value>,
}

/// Everything gathered before synthesis. Each part is written by one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawGathering {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_deck: Option<ExtractedPitchDeck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<ScrapedWebsite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_research: Option<DeepResearchReport>,
}

impl RawGathering {
    /// True when no source produced usable content.
    pub fn is_empty(&self) -> bool {
        self.pitch_deck
            .as_ref()
            .is_none_or(|d| d.raw_text.trim().is_empty())
            && self
                .website
                .as_ref()
                .is_none_or(|w| w.main_content.trim().is_empty() && w.page_title.is_empty())
            && self.search.as_ref().is_none_or(SearchBundle::is_empty)
            && self
                .deep_research
                .as_ref()
                .is_none_or(|r| r.report.trim().is_empty())
    }

    /// Names of the sources that hold content.
    pub fn source_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.pitch_deck.as_ref().is_some_and(|d| !d.raw_text.trim().is_empty()) {
            names.push("pitch_deck".to_string());
        }
        if self.website.is_some() {
            names.push("website".to_string());
        }
        if self.search.as_ref().is_some_and(|s| !s.is_empty()) {
            names.push("web_search".to_string());
        }
        if self.deep_research.as_ref().is_some_and(|r| !r.report.trim().is_empty()) {
            names.push("deep_research".to_string());
        }
        names
    }
}
