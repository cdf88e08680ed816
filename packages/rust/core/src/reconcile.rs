//! Turning free-form model output into typed findings.
//!
//! Models are asked for one flat JSON object but often group fields under
//! section headers (`"BASIC_INFORMATION": { "name": ... }`) or wrap the JSON
//! in prose. Parsing is split into three testable steps:
//!
//! 1. [`parse_model_output`] finds the JSON object and classifies it.
//! 2. [`normalize`] hoists section contents to the top level.
//! 3. [`findings_from_map`] reads fields leniently, with input fallbacks.

use serde_json::{Map, Value};

use pitchlens_shared::{
    FounderProfile, Recommendation, ResearchFindings, ScoreCategory, ScoreDetail, Scorecard,
    StartupInput, ThesisCategory,
};

// ---------------------------------------------------------------------------
// Section table
// ---------------------------------------------------------------------------

/// How a normalized key is matched against a section pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPattern {
    Exact(&'static str),
    Suffix(&'static str),
    Contains(&'static str),
}

impl SectionPattern {
    pub fn matches(self, normalized_key: &str) -> bool {
        match self {
            Self::Exact(p) => normalized_key == p,
            Self::Suffix(p) => normalized_key.ends_with(p),
            Self::Contains(p) => normalized_key.contains(p),
        }
    }
}

/// Keys whose object values are section wrappers rather than fields.
pub const SECTION_PATTERNS: &[SectionPattern] = &[
    SectionPattern::Exact("BASIC_INFORMATION"),
    SectionPattern::Exact("THESIS_CLASSIFICATION"),
    SectionPattern::Exact("CEO_FOUNDER_INFORMATION"),
    SectionPattern::Exact("CEOFOUNDER_INFORMATION"),
    SectionPattern::Exact("DETAILED_FOUNDER_PROFILES"),
    SectionPattern::Exact("COMPANY_DETAILS"),
    SectionPattern::Exact("PRODUCT_BUSINESS"),
    SectionPattern::Exact("FINANCIAL_METRICS"),
    SectionPattern::Exact("TRACTION_METRICS"),
    SectionPattern::Exact("MARKET_ANALYSIS"),
    SectionPattern::Exact("ADDITIONAL_INFO"),
    SectionPattern::Exact("INVESTMENT_ANALYSIS"),
    SectionPattern::Exact("AI_SCORECARD"),
    SectionPattern::Suffix("_INFORMATION"),
    SectionPattern::Suffix("_CLASSIFICATION"),
    SectionPattern::Suffix("_DETAILS"),
    SectionPattern::Suffix("_PROFILES"),
    SectionPattern::Suffix("_BUSINESS"),
    SectionPattern::Suffix("_METRICS"),
    SectionPattern::Suffix("_ANALYSIS"),
    SectionPattern::Suffix("_INFO"),
    SectionPattern::Suffix("_SCORECARD"),
    SectionPattern::Contains("FOUNDER"),
    SectionPattern::Contains("CEO"),
    SectionPattern::Contains("PRODUCT"),
    SectionPattern::Contains("FINANCIAL"),
    SectionPattern::Contains("TRACTION"),
    SectionPattern::Contains("MARKET"),
    SectionPattern::Contains("INVESTMENT"),
    SectionPattern::Contains("COMPANY"),
    SectionPattern::Contains("THESIS"),
    SectionPattern::Contains("BASIC"),
];

/// Object-valued keys of a scorecard, which are fields and never sections.
const SCORECARD_KEYS: [&str; 7] = [
    "founders_score",
    "market_score",
    "product_score",
    "traction_score",
    "team_score",
    "financials_score",
    "competition_score",
];

/// Preferred keys when collapsing an object to text.
const TEXT_KEYS: [&str; 5] = ["text", "content", "description", "summary", "analysis"];

/// Uppercase, spaces and hyphens to `_`, `&` and `/` dropped, runs of `_`
/// collapsed: `"Product & Business"` becomes `"PRODUCT_BUSINESS"`.
pub fn normalize_key(key: &str) -> String {
    let upper: String = key
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '&' | '/'))
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    let mut out = String::with_capacity(upper.len());
    for c in upper.chars() {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

fn is_known_field(key: &str) -> bool {
    ResearchFindings::FIELD_NAMES.contains(&key) || SCORECARD_KEYS.contains(&key)
}

/// Whether `key` names a section wrapper.
pub fn is_section_key(key: &str) -> bool {
    if is_known_field(key) {
        return false;
    }
    let normalized = normalize_key(key);
    SECTION_PATTERNS.iter().any(|p| p.matches(&normalized))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Classified model output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    /// A JSON object with no section wrappers.
    RawFlat(Map<String, Value>),
    /// A JSON object with at least one section wrapper at the top level.
    RawNested(Map<String, Value>),
    /// No JSON object could be recovered.
    Unparseable { raw: String },
}

impl ParsedOutput {
    pub fn is_parsed(&self) -> bool {
        !matches!(self, Self::Unparseable { .. })
    }
}

/// Parse the whole text as a JSON object, or failing that the span from the
/// first `{` to the last `}`.
pub fn parse_model_output(text: &str) -> ParsedOutput {
    let trimmed = text.trim();

    let object = parse_object(trimmed).or_else(|| {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        (end > start).then(|| parse_object(&trimmed[start..=end])).flatten()
    });

    match object {
        Some(map) if has_sections(&map) => ParsedOutput::RawNested(map),
        Some(map) => ParsedOutput::RawFlat(map),
        None => ParsedOutput::Unparseable {
            raw: text.to_string(),
        },
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn has_sections(map: &Map<String, Value>) -> bool {
    map.iter().any(|(k, v)| v.is_object() && is_section_key(k))
}

/// Hoist the children of section wrappers to the top level, recursively.
///
/// A top-level value that is already present and non-null is never replaced
/// by a hoisted one; among hoisted values the first wins. The result has no
/// section wrappers left, so flattening it again changes nothing.
pub fn flatten(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let mut hoisted = Vec::new();

    for (key, value) in map {
        match value {
            Value::Object(section) if is_section_key(&key) => collect_section(section, &mut hoisted),
            other => {
                out.insert(key, other);
            }
        }
    }

    for (key, value) in hoisted {
        let occupied = out.get(&key).is_some_and(|v| !v.is_null());
        if !occupied {
            out.insert(key, value);
        }
    }

    out
}

fn collect_section(section: Map<String, Value>, into: &mut Vec<(String, Value)>) {
    for (key, value) in section {
        match value {
            Value::Object(child) if is_section_key(&key) => collect_section(child, into),
            other => {
                // Keep the first value seen for a key.
                if !into.iter().any(|(k, v)| *k == key && !v.is_null()) {
                    into.retain(|(k, _)| *k != key);
                    into.push((key, other));
                }
            }
        }
    }
}

/// The flat field map for any parse result; empty when unparseable.
pub fn normalize(parsed: ParsedOutput) -> Map<String, Value> {
    match parsed {
        ParsedOutput::RawFlat(map) => map,
        ParsedOutput::RawNested(map) => flatten(map),
        ParsedOutput::Unparseable { .. } => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Lenient readers
// ---------------------------------------------------------------------------

/// Display text for any JSON value.
///
/// Objects collapse through their `text`/`content`/`description`/`summary`/
/// `analysis` keys, falling back to their string values; arrays join with
/// `", "`; a string holding a JSON object is unpacked.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => {
            let t = s.trim();
            if t.starts_with('{') {
                if let Some(obj) = parse_object(t) {
                    return object_text(&obj);
                }
            }
            t.to_string()
        }
        Value::Object(obj) => object_text(obj),
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

fn object_text(obj: &Map<String, Value>) -> String {
    let preferred: Vec<String> = TEXT_KEYS
        .iter()
        .filter_map(|k| obj.get(*k))
        .map(text_of)
        .filter(|s| !s.is_empty())
        .collect();
    if !preferred.is_empty() {
        return preferred.join(" ");
    }

    obj.iter()
        .filter(|(k, _)| !ResearchFindings::FIGURE_KEYS.contains(&k.as_str()))
        .filter_map(|(_, v)| v.as_str().map(str::trim).filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A number from a JSON number or a numeric-looking string
/// (`"1,200,000"`, `"$4.5"`, `"35%"`).
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '%' | '₹' | ' '))
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

fn count_of(value: &Value) -> Option<u64> {
    number_of(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u64)
}

/// List items as text; a lone non-empty string becomes a one-item list.
pub fn list_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Typed field access over a flat map.
pub struct FieldReader<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn text(&self, key: &str) -> String {
        self.get(key).map(text_of).unwrap_or_default()
    }

    /// Text, or `fallback` when missing or blank.
    pub fn text_or(&self, key: &str, fallback: &str) -> String {
        let text = self.text(key);
        if text.is_empty() { fallback.trim().to_string() } else { text }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(number_of)
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(count_of)
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(list_of).unwrap_or_default()
    }

    pub fn object(&self, key: &str) -> Map<String, Value> {
        match self.get(key) {
            Some(Value::Object(obj)) => obj.clone(),
            _ => Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// Build findings from a flat map, using `input` for missing identity fields.
pub fn findings_from_map(map: &Map<String, Value>, input: &StartupInput) -> ResearchFindings {
    let r = FieldReader::new(map);

    let company_info = {
        let obj = r.object("company_info");
        match (obj.is_empty(), input.founded_year) {
            (true, Some(year)) => {
                let mut info = Map::new();
                info.insert("founded_year".into(), Value::from(year));
                info
            }
            _ => obj,
        }
    };

    let employee_count = r
        .count("employee_count")
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .or(input.team_size)
        .unwrap_or(0);

    ResearchFindings {
        name: r.text_or("name", &input.name),
        legal_name: r.text_or("legal_name", first_non_empty(&input.legal_name, &input.name)),
        description: r.text_or("description", &input.description),
        location: r.text_or("location", &input.location),
        website: r.text_or("website", &input.website),
        company_email: r.text_or("company_email", &input.email),
        company_phone: r.text_or("company_phone", &input.phone),
        industry: r.text_or("industry", &input.industry),
        startup_industry_domain: r.text_or("startup_industry_domain", &input.industry),

        thesis_name: ThesisCategory::parse_lenient(&r.text("thesis_name")),
        startup_stage: r.text_or("startup_stage", &input.stage),

        ceo_name: r.text("ceo_name"),
        ceo_email: r.text("ceo_email"),
        ceo_phone: r.text("ceo_phone"),
        ceo_linkedin_url: r.text_or("ceo_linkedin_url", &input.ceo_linkedin_url),

        company_goal: r.text("company_goal"),
        employee_count,
        funding_raised: r.number("funding_raised"),
        funding_ask_amount: r.number("funding_ask_amount"),

        company_info,
        market_analysis: r.text("market_analysis"),
        team_insights: r.text("team_insights"),
        competitive_landscape: r.text("competitive_landscape"),
        funding_info: r.object("funding_info"),
        news_mentions: r.list("news_mentions"),
        social_presence: r.object("social_presence"),
        technology_stack: r.text("technology_stack"),
        customer_base: r.text("customer_base"),

        founders: founders_of(r.get("founders")),

        product_description: r.text("product_description"),
        unique_value_proposition: r.text("unique_value_proposition"),
        technology_moat: r.text("technology_moat"),
        business_model_details: r.text("business_model_details"),
        revenue_model: r.text("revenue_model"),
        pricing_strategy: r.text("pricing_strategy"),

        current_mrr: r.number("current_mrr"),
        current_arr: r.number("current_arr"),
        yoy_growth_rate: r.number("yoy_growth_rate"),
        customer_acquisition_cost: r.number("customer_acquisition_cost"),
        lifetime_value: r.number("lifetime_value"),
        burn_rate: r.number("burn_rate"),
        runway_months: r.count("runway_months").and_then(|n| u32::try_from(n).ok()),

        key_metrics: r.object("key_metrics"),
        total_customers: r.count("total_customers"),
        active_users: r.count("active_users"),
        retention_rate: r.number("retention_rate"),

        tam: r.number("tam"),
        sam: r.number("sam"),
        som: r.number("som"),
        market_growth_rate: r.number("market_growth_rate"),

        partnerships: r.list("partnerships"),
        awards_recognition: r.list("awards_recognition"),
        investment_highlights: r.list("investment_highlights"),
        risk_factors: r.list("risk_factors"),

        ai_scorecard: scorecard_of(map),
        known_competitors: r.list("known_competitors"),

        data_sources: Vec::new(),
        research_timestamp: None,
    }
}

fn first_non_empty<'a>(a: &'a str, b: &'a str) -> &'a str {
    if a.trim().is_empty() { b } else { a }
}

fn founders_of(value: Option<&Value>) -> Vec<FounderProfile> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => {
                let r = FieldReader::new(obj);
                Some(FounderProfile {
                    name: r.text("name"),
                    role: r.text("role"),
                    linkedin_url: r.text("linkedin_url"),
                    education: r.list("education"),
                    previous_companies: r.list("previous_companies"),
                    previous_exits: r.list("previous_exits"),
                    years_experience: r
                        .count("years_experience")
                        .and_then(|n| u32::try_from(n).ok())
                        .unwrap_or(0),
                    domain_expertise: r.text("domain_expertise"),
                    notable_achievements: r.list("notable_achievements"),
                })
            }
            Value::String(name) if !name.trim().is_empty() => Some(FounderProfile {
                name: name.trim().to_string(),
                ..FounderProfile::default()
            }),
            _ => None,
        })
        .collect()
}

/// The scorecard source: top-level category keys when `founders_score` is
/// present, else the `ai_scorecard` object, else defaults. Always finalized.
pub fn scorecard_of(map: &Map<String, Value>) -> Scorecard {
    let source = if map.get("founders_score").is_some_and(|v| !v.is_null()) {
        Some(map)
    } else {
        match map.get("ai_scorecard") {
            Some(Value::Object(obj)) => Some(obj),
            _ => None,
        }
    };

    let mut scorecard = Scorecard::default();
    if let Some(source) = source {
        let r = FieldReader::new(source);
        for category in ScoreCategory::ALL {
            if let Some(value) = r.get(category.score_key()) {
                *scorecard.detail_mut(category) = score_detail_of(value, category);
            }
        }
        scorecard.overall_score = r.number("overall_score").unwrap_or(0.0);
        scorecard.investment_recommendation = r
            .text("investment_recommendation")
            .parse::<Recommendation>()
            .unwrap_or_default();
        scorecard.investment_summary = r.text("investment_summary");
        scorecard.key_risks = r.list("key_risks");
        scorecard.key_opportunities = r.list("key_opportunities");
    }

    scorecard.finalize();
    scorecard
}

fn score_detail_of(value: &Value, category: ScoreCategory) -> ScoreDetail {
    let mut detail = ScoreDetail::for_category(category);
    match value {
        Value::Object(obj) => {
            let r = FieldReader::new(obj);
            detail.score = r.number("score").unwrap_or(0.0);
            detail.justification = r.text("justification");
            detail.strengths = r.list("strengths");
            detail.weaknesses = r.list("weaknesses");
        }
        other => detail.score = number_of(other).unwrap_or(0.0),
    }
    detail
}
