//! Structured research findings and competitor analysis.
//!
//! Absent values use one representation per kind: empty string, empty list,
//! empty map, or `None` for numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scorecard::Scorecard;

/// Maximum competitors kept in an analysis.
pub const MAX_COMPETITORS: usize = 5;

// ---------------------------------------------------------------------------
// Thesis
// ---------------------------------------------------------------------------

/// Investment thesis a startup is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThesisCategory {
    Consumer,
    Healthcare,
    ImpactSdg,
    SingularityAi,
    Emc,
    Rums,
    Retain,
    #[default]
    Others,
}

impl ThesisCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consumer => "CONSUMER",
            Self::Healthcare => "HEALTHCARE",
            Self::ImpactSdg => "IMPACT_SDG",
            Self::SingularityAi => "SINGULARITY_AI",
            Self::Emc => "EMC",
            Self::Rums => "RUMS",
            Self::Retain => "RETAIN",
            Self::Others => "OTHERS",
        }
    }

    /// Lenient parse; anything unrecognised files under [`ThesisCategory::Others`].
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for ThesisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThesisCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s
            .trim()
            .to_ascii_uppercase()
            .replace([' ', '-', '/'], "_");
        match key.as_str() {
            "CONSUMER" => Ok(Self::Consumer),
            "HEALTHCARE" => Ok(Self::Healthcare),
            "IMPACT_SDG" | "IMPACT" | "SDG" => Ok(Self::ImpactSdg),
            "SINGULARITY_AI" | "AI" => Ok(Self::SingularityAi),
            "EMC" => Ok(Self::Emc),
            "RUMS" => Ok(Self::Rums),
            "RETAIN" => Ok(Self::Retain),
            "OTHERS" | "OTHER" => Ok(Self::Others),
            other => Err(format!("unknown thesis category: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Background of one founder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FounderProfile {
    pub name: String,
    pub role: String,
    pub linkedin_url: String,
    pub education: Vec<String>,
    pub previous_companies: Vec<String>,
    pub previous_exits: Vec<String>,
    pub years_experience: u32,
    pub domain_expertise: String,
    pub notable_achievements: Vec<String>,
}

/// The structured research profile synthesised from gathered sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchFindings {
    // Basic information
    pub name: String,
    pub legal_name: String,
    pub description: String,
    pub location: String,
    pub website: String,
    pub company_email: String,
    pub company_phone: String,
    pub industry: String,
    pub startup_industry_domain: String,

    // Classification
    pub thesis_name: ThesisCategory,
    pub startup_stage: String,

    // CEO
    pub ceo_name: String,
    pub ceo_email: String,
    pub ceo_phone: String,
    pub ceo_linkedin_url: String,

    // Company
    pub company_goal: String,
    pub employee_count: u32,
    pub funding_raised: Option<f64>,
    pub funding_ask_amount: Option<f64>,

    // Analysis
    pub company_info: Map<String, Value>,
    pub market_analysis: String,
    pub team_insights: String,
    pub competitive_landscape: String,
    pub funding_info: Map<String, Value>,
    pub news_mentions: Vec<String>,
    pub social_presence: Map<String, Value>,
    pub technology_stack: String,
    pub customer_base: String,

    pub founders: Vec<FounderProfile>,

    // Product & business
    pub product_description: String,
    pub unique_value_proposition: String,
    pub technology_moat: String,
    pub business_model_details: String,
    pub revenue_model: String,
    pub pricing_strategy: String,

    // Financial metrics
    pub current_mrr: Option<f64>,
    pub current_arr: Option<f64>,
    pub yoy_growth_rate: Option<f64>,
    pub customer_acquisition_cost: Option<f64>,
    pub lifetime_value: Option<f64>,
    pub burn_rate: Option<f64>,
    pub runway_months: Option<u32>,

    // Traction
    pub key_metrics: Map<String, Value>,
    pub total_customers: Option<u64>,
    pub active_users: Option<u64>,
    pub retention_rate: Option<f64>,

    // Market
    pub tam: Option<f64>,
    pub sam: Option<f64>,
    pub som: Option<f64>,
    pub market_growth_rate: Option<f64>,

    // Additional
    pub partnerships: Vec<String>,
    pub awards_recognition: Vec<String>,
    pub investment_highlights: Vec<String>,
    pub risk_factors: Vec<String>,

    pub ai_scorecard: Scorecard,
    pub known_competitors: Vec<String>,

    /// Which gathered sources fed the synthesis (e.g. `"pitch_deck"`).
    pub data_sources: Vec<String>,
    pub research_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl ResearchFindings {
    /// Top-level field names, as they appear in serialized findings.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "name",
        "legal_name",
        "description",
        "location",
        "website",
        "company_email",
        "company_phone",
        "industry",
        "startup_industry_domain",
        "thesis_name",
        "startup_stage",
        "ceo_name",
        "ceo_email",
        "ceo_phone",
        "ceo_linkedin_url",
        "company_goal",
        "employee_count",
        "funding_raised",
        "funding_ask_amount",
        "company_info",
        "market_analysis",
        "team_insights",
        "competitive_landscape",
        "funding_info",
        "news_mentions",
        "social_presence",
        "technology_stack",
        "customer_base",
        "founders",
        "product_description",
        "unique_value_proposition",
        "technology_moat",
        "business_model_details",
        "revenue_model",
        "pricing_strategy",
        "current_mrr",
        "current_arr",
        "yoy_growth_rate",
        "customer_acquisition_cost",
        "lifetime_value",
        "burn_rate",
        "runway_months",
        "key_metrics",
        "total_customers",
        "active_users",
        "retention_rate",
        "tam",
        "sam",
        "som",
        "market_growth_rate",
        "partnerships",
        "awards_recognition",
        "investment_highlights",
        "risk_factors",
        "ai_scorecard",
        "known_competitors",
        "data_sources",
        "research_timestamp",
    ];

    /// Market-figure fields, left out when a section object is collapsed to prose.
    pub const FIGURE_KEYS: &'static [&'static str] = &["tam", "sam", "som", "market_growth_rate"];
}

// ---------------------------------------------------------------------------
// Competitors
// ---------------------------------------------------------------------------

/// One competitor profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Competitor {
    pub name: String,
    pub founded_year: Option<i32>,
    pub headquarters: String,
    pub funding_raised: Option<f64>,
    pub current_valuation: Option<f64>,
    pub revenue: Option<f64>,
    pub business_model: String,
    pub focus_market: String,
    pub traction: String,
    pub similarities: String,
}

/// TAM/SAM/SOM figures cross-checked during competitor analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketData {
    pub tam: Option<f64>,
    pub sam: Option<f64>,
    pub som: Option<f64>,
    pub explanation: Vec<String>,
}

impl MarketData {
    pub fn is_empty(&self) -> bool {
        self.tam.is_none() && self.sam.is_none() && self.som.is_none() && self.explanation.is_empty()
    }
}

/// Competitive landscape for a startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorAnalysis {
    pub startup_name: String,
    pub competitors: Vec<Competitor>,
    pub market_overview: String,
    pub competitive_advantages: String,
    pub market_threats: String,
    pub validated_market_data: MarketData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thesis_parse_is_lenient() {
        assert_eq!(ThesisCategory::parse_lenient("singularity ai"), ThesisCategory::SingularityAi);
        assert_eq!(ThesisCategory::parse_lenient("impact-sdg"), ThesisCategory::ImpactSdg);
        assert_eq!(ThesisCategory::parse_lenient("fintech"), ThesisCategory::Others);
        assert_eq!(ThesisCategory::default(), ThesisCategory::Others);
    }

    #[test]
    fn findings_deserialize_from_sparse_json() {
        let findings: ResearchFindings =
            serde_json::from_str(r#"{"name":"Acme","tam":1.5e9,"thesis_name":"HEALTHCARE"}"#)
                .expect("deserialize");
        assert_eq!(findings.name, "Acme");
        assert_eq!(findings.tam, Some(1.5e9));
        assert_eq!(findings.thesis_name, ThesisCategory::Healthcare);
        assert!(findings.founders.is_empty());
        assert_eq!(findings.ai_scorecard.founders_score.weight, 0.25);
    }

    #[test]
    fn figure_keys_are_findings_fields() {
        for key in ResearchFindings::FIGURE_KEYS {
            assert!(ResearchFindings::FIELD_NAMES.contains(key), "unknown {key}");
        }
    }

    #[test]
    fn field_names_match_serialized_keys() {
        let value = serde_json::to_value(ResearchFindings::default()).expect("serialize");
        let obj = value.as_object().expect("object");
        assert_eq!(obj.len(), ResearchFindings::FIELD_NAMES.len());
        for name in ResearchFindings::FIELD_NAMES {
            assert!(obj.contains_key(*name), "missing {name}");
        }
    }
}
