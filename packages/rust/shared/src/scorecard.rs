//! The weighted investment scorecard.
//!
//! Six categories contribute to the overall score; competition is scored and
//! reported alongside them but carries no weight in the total.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Upper bound of every category score.
pub const MAX_SCORE: f64 = 10.0;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A scored evaluation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Founders,
    Market,
    Product,
    Traction,
    Team,
    Financials,
    Competition,
}

impl ScoreCategory {
    /// Categories counted towards the overall score.
    pub const WEIGHTED: [ScoreCategory; 6] = [
        Self::Founders,
        Self::Market,
        Self::Product,
        Self::Traction,
        Self::Team,
        Self::Financials,
    ];

    /// Every category, in report order.
    pub const ALL: [ScoreCategory; 7] = [
        Self::Founders,
        Self::Market,
        Self::Product,
        Self::Traction,
        Self::Team,
        Self::Financials,
        Self::Competition,
    ];

    /// Fixed weight of the category.
    pub fn weight(self) -> f64 {
        match self {
            Self::Founders => 0.25,
            Self::Market => 0.20,
            Self::Product => 0.15,
            Self::Traction => 0.20,
            Self::Team => 0.10,
            Self::Financials => 0.10,
            Self::Competition => 0.10,
        }
    }

    /// Whether the category contributes to [`Scorecard::weighted_overall`].
    pub fn is_weighted(self) -> bool {
        !matches!(self, Self::Competition)
    }

    /// Snake-case name, e.g. `"founders"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Founders => "founders",
            Self::Market => "market",
            Self::Product => "product",
            Self::Traction => "traction",
            Self::Team => "team",
            Self::Financials => "financials",
            Self::Competition => "competition",
        }
    }

    /// Key the category uses inside a scorecard object, e.g. `"founders_score"`.
    pub fn score_key(self) -> &'static str {
        match self {
            Self::Founders => "founders_score",
            Self::Market => "market_score",
            Self::Product => "product_score",
            Self::Traction => "traction_score",
            Self::Team => "team_score",
            Self::Financials => "financials_score",
            Self::Competition => "competition_score",
        }
    }

    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Founders => "Founders & Leadership",
            Self::Market => "Market Opportunity",
            Self::Product => "Product & Technology",
            Self::Traction => "Traction & Growth",
            Self::Team => "Team Strength",
            Self::Financials => "Financial Health",
            Self::Competition => "Competitive Position",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Investment recommendation derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    #[default]
    Hold,
    Pass,
}

impl Recommendation {
    /// Map an overall score to a recommendation. Each band includes its lower edge.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::StrongBuy
        } else if score >= 6.5 {
            Self::Buy
        } else if score >= 5.0 {
            Self::Hold
        } else {
            Self::Pass
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Pass => "PASS",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "STRONG_BUY" => Ok(Self::StrongBuy),
            "BUY" => Ok(Self::Buy),
            "HOLD" => Ok(Self::Hold),
            "PASS" => Ok(Self::Pass),
            other => Err(format!("unknown recommendation: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Score bands
// ---------------------------------------------------------------------------

/// Colour band a score falls into when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Good,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 8.0 {
            Self::Strong
        } else if score >= 6.5 {
            Self::Good
        } else if score >= 5.0 {
            Self::Fair
        } else {
            Self::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Weak => "Weak",
        }
    }

    /// RGB components in `0.0..=1.0`.
    pub fn rgb(self) -> (f32, f32, f32) {
        match self {
            Self::Strong => (0.09, 0.64, 0.29),
            Self::Good => (0.15, 0.39, 0.92),
            Self::Fair => (0.96, 0.62, 0.04),
            Self::Weak => (0.86, 0.15, 0.15),
        }
    }
}

// ---------------------------------------------------------------------------
// Scorecard
// ---------------------------------------------------------------------------

/// One category's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    #[serde(default)]
    pub score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

fn default_max_score() -> f64 {
    MAX_SCORE
}

impl ScoreDetail {
    /// An empty detail carrying the category's fixed weight.
    pub fn for_category(category: ScoreCategory) -> Self {
        Self {
            score: 0.0,
            max_score: MAX_SCORE,
            weight: category.weight(),
            justification: String::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }
}

/// Seven-category weighted evaluation of a startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scorecard {
    pub founders_score: ScoreDetail,
    pub market_score: ScoreDetail,
    pub product_score: ScoreDetail,
    pub traction_score: ScoreDetail,
    pub team_score: ScoreDetail,
    pub financials_score: ScoreDetail,
    pub competition_score: ScoreDetail,
    pub overall_score: f64,
    pub investment_recommendation: Recommendation,
    pub investment_summary: String,
    pub key_risks: Vec<String>,
    pub key_opportunities: Vec<String>,
}

impl Default for Scorecard {
    fn default() -> Self {
        Self {
            founders_score: ScoreDetail::for_category(ScoreCategory::Founders),
            market_score: ScoreDetail::for_category(ScoreCategory::Market),
            product_score: ScoreDetail::for_category(ScoreCategory::Product),
            traction_score: ScoreDetail::for_category(ScoreCategory::Traction),
            team_score: ScoreDetail::for_category(ScoreCategory::Team),
            financials_score: ScoreDetail::for_category(ScoreCategory::Financials),
            competition_score: ScoreDetail::for_category(ScoreCategory::Competition),
            overall_score: 0.0,
            investment_recommendation: Recommendation::default(),
            investment_summary: String::new(),
            key_risks: Vec::new(),
            key_opportunities: Vec::new(),
        }
    }
}

impl Scorecard {
    pub fn detail(&self, category: ScoreCategory) -> &ScoreDetail {
        match category {
            ScoreCategory::Founders => &self.founders_score,
            ScoreCategory::Market => &self.market_score,
            ScoreCategory::Product => &self.product_score,
            ScoreCategory::Traction => &self.traction_score,
            ScoreCategory::Team => &self.team_score,
            ScoreCategory::Financials => &self.financials_score,
            ScoreCategory::Competition => &self.competition_score,
        }
    }

    pub fn detail_mut(&mut self, category: ScoreCategory) -> &mut ScoreDetail {
        match category {
            ScoreCategory::Founders => &mut self.founders_score,
            ScoreCategory::Market => &mut self.market_score,
            ScoreCategory::Product => &mut self.product_score,
            ScoreCategory::Traction => &mut self.traction_score,
            ScoreCategory::Team => &mut self.team_score,
            ScoreCategory::Financials => &mut self.financials_score,
            ScoreCategory::Competition => &mut self.competition_score,
        }
    }

    /// Weighted sum of the six counted category scores.
    pub fn weighted_overall(&self) -> f64 {
        ScoreCategory::WEIGHTED
            .iter()
            .map(|c| self.detail(*c).score * c.weight())
            .sum()
    }

    /// Whether any category received a non-zero score.
    pub fn has_scores(&self) -> bool {
        ScoreCategory::ALL.iter().any(|c| self.detail(*c).score > 0.0)
    }

    /// Clamp scores, pin the fixed weights, and derive the overall score and
    /// recommendation from the category scores.
    ///
    /// Whatever `overall_score` was there before (typically the model's own
    /// arithmetic) is replaced.
    pub fn finalize(&mut self) {
        for category in ScoreCategory::ALL {
            let detail = self.detail_mut(category);
            detail.score = clamp_score(detail.score);
            detail.max_score = MAX_SCORE;
            detail.weight = category.weight();
        }

        let computed = self.weighted_overall();
        if self.overall_score > 0.0 && (self.overall_score - computed).abs() > 0.05 {
            warn!(
                reported = self.overall_score,
                computed, "model overall_score disagrees with weighted sum, using weighted sum"
            );
        }

        self.overall_score = computed;
        self.investment_recommendation = Recommendation::from_score(computed);
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    }
}
