//! Investment-thesis PDF rendering.
//!
//! [`PdfReportRenderer`] lays out a finished research record as a multi-page
//! A4 report and writes it to the output directory.

pub mod format;
mod layout;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, instrument};

use pitchlens_shared::{
    CompetitorAnalysis, PitchLensError, Recommendation, ResearchFindings, ResearchRecord, Result,
    ScoreBand, ScoreCategory, Scorecard, StartupInput,
};

pub use format::{format_currency, format_percent, slug, wrap_text};

use layout::{BLACK, GREY, PageWriter, RED};

/// Writes investment-thesis PDFs into `output_dir`.
pub struct PdfReportRenderer {
    output_dir: PathBuf,
}

impl PdfReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render the record and write it to disk, returning the file path.
    #[instrument(skip_all, fields(run_id = %record.run_id()))]
    pub fn render(&self, record: &ResearchRecord) -> Result<PathBuf> {
        let bytes = render_bytes(record)?;

        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| PitchLensError::io(&self.output_dir, e))?;

        let name = record
            .findings()
            .map(|f| f.name.as_str())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(record.input().name.as_str());
        let path = self
            .output_dir
            .join(report_file_name(name, &record.run_id().to_string(), Utc::now()));

        std::fs::write(&path, &bytes).map_err(|e| PitchLensError::io(&path, e))?;

        info!(path = %path.display(), size_kb = bytes.len() / 1024, "report written");
        Ok(path)
    }
}

/// `<slug>_investment_thesis_<YYYYMMDD_HHMMSS>_<run_id>.pdf`
pub fn report_file_name(name: &str, run_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_investment_thesis_{}_{run_id}.pdf",
        slug(name),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Lay out the record as PDF bytes. Requires structured findings.
pub fn render_bytes(record: &ResearchRecord) -> Result<Vec<u8>> {
    let findings = record
        .findings()
        .ok_or_else(|| PitchLensError::Render("no research findings to render".into()))?;
    let input = record.input();
    let name = first_non_empty(&[&findings.name, &input.name]);

    let mut w = PageWriter::new(&format!("{name} - Investment Thesis"))?;

    title_block(&mut w, name, findings, record.meta().started_at);
    key_details(&mut w, findings, input);
    executive_summary(&mut w, findings);

    let scorecard = &findings.ai_scorecard;
    if scorecard.has_scores() {
        scorecard_section(&mut w, scorecard);
    }

    founders_section(&mut w, findings);
    product_section(&mut w, findings);
    financial_section(&mut w, findings);
    market_section(&mut w, findings);
    competitors_section(&mut w, findings, record.competitor_analysis());
    risks_section(&mut w, findings);

    w.finish()
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|s| !s.trim().is_empty())
        .unwrap_or("")
}

fn recommendation_rgb(rec: Recommendation) -> (f32, f32, f32) {
    match rec {
        Recommendation::StrongBuy => ScoreBand::Strong.rgb(),
        Recommendation::Buy => ScoreBand::Good.rgb(),
        Recommendation::Hold => ScoreBand::Fair.rgb(),
        Recommendation::Pass => ScoreBand::Weak.rgb(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn title_block(w: &mut PageWriter, name: &str, findings: &ResearchFindings, at: DateTime<Utc>) {
    w.text("Investment Thesis", 22.0, 0.0, true, layout::NAVY);
    w.space(2.0);
    w.text(name, 16.0, 0.0, true, BLACK);
    w.note(&format!("Generated {}", at.format("%B %d, %Y")));
    w.space(3.0);

    let scorecard = &findings.ai_scorecard;
    if scorecard.has_scores() {
        let rec = scorecard.investment_recommendation;
        w.banner(
            &format!(
                "Recommendation: {}   Overall score: {:.1}/10",
                rec.as_str().replace('_', " "),
                scorecard.overall_score
            ),
            recommendation_rgb(rec),
        );
    }
}

fn key_details(w: &mut PageWriter, findings: &ResearchFindings, input: &StartupInput) {
    w.heading("Key Details");

    let founded = findings
        .company_info
        .get("founded_year")
        .and_then(|v| match v {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        })
        .or_else(|| input.founded_year.map(|y| y.to_string()))
        .unwrap_or_default();

    let team_size = if findings.employee_count > 0 {
        findings.employee_count.to_string()
    } else {
        input.team_size.map(|n| n.to_string()).unwrap_or_default()
    };

    let thesis = findings.thesis_name.as_str();
    let rows = [
        ("Startup Name", first_non_empty(&[&findings.name, &input.name])),
        (
            "Legal Name",
            first_non_empty(&[&findings.legal_name, &input.legal_name, &input.name]),
        ),
        ("Industry", first_non_empty(&[&findings.industry, &input.industry])),
        ("Thesis Category", thesis),
        ("Stage", first_non_empty(&[&findings.startup_stage, &input.stage])),
        ("Location", first_non_empty(&[&findings.location, &input.location])),
        ("Website", first_non_empty(&[&findings.website, &input.website])),
        ("Founded", founded.as_str()),
        ("Team Size", team_size.as_str()),
    ];
    for (label, value) in rows {
        w.field(label, value);
    }
}

fn executive_summary(w: &mut PageWriter, findings: &ResearchFindings) {
    w.heading("Executive Summary");

    let items = format::bullet_items(&findings.description);
    if items.is_empty() {
        w.note("No description available.");
    }
    for item in items {
        w.bullet("-", &item, BLACK);
    }

    if !findings.ai_scorecard.investment_summary.trim().is_empty() {
        w.space(2.0);
        w.paragraph(&findings.ai_scorecard.investment_summary);
    }
}

fn scorecard_section(w: &mut PageWriter, scorecard: &Scorecard) {
    w.page_break();
    w.heading("AI Investment Analysis");

    for category in ScoreCategory::ALL {
        let detail = scorecard.detail(category);
        let band = ScoreBand::of(detail.score);
        let weight = if category.is_weighted() {
            format!("{:.0}%", category.weight() * 100.0)
        } else {
            "not counted".to_string()
        };
        w.score_row(
            category.label(),
            detail.score,
            detail.max_score,
            &format!("{:.1}  {}  ({weight})", detail.score, band.label()),
            band.rgb(),
        );
    }
    w.space(3.0);
    w.label(&format!(
        "Overall: {:.1}/10, {}",
        scorecard.overall_score,
        scorecard.investment_recommendation.as_str().replace('_', " ")
    ));
    w.space(4.0);

    w.subheading("Strengths and Weaknesses");
    for category in ScoreCategory::ALL {
        let detail = scorecard.detail(category);
        if detail.strengths.is_empty() && detail.weaknesses.is_empty() && detail.justification.is_empty() {
            continue;
        }
        w.label(&format!("{} ({:.1}/10)", category.label(), detail.score));
        if !detail.justification.is_empty() {
            w.note(&detail.justification);
        }
        if !detail.strengths.is_empty() {
            w.bullet("+", &detail.strengths.iter().take(3).cloned().collect::<Vec<_>>().join(", "), BLACK);
        }
        if !detail.weaknesses.is_empty() {
            w.bullet("-", &detail.weaknesses.iter().take(3).cloned().collect::<Vec<_>>().join(", "), RED);
        }
        w.space(2.0);
    }
}

fn founders_section(w: &mut PageWriter, findings: &ResearchFindings) {
    w.heading("Founders & Team");

    if findings.founders.is_empty() {
        w.note("Detailed founder profiles not available from provided sources.");
    }
    for (idx, founder) in findings.founders.iter().enumerate() {
        let role = if founder.role.is_empty() {
            String::new()
        } else {
            format!(", {}", founder.role)
        };
        w.subheading(&format!("Founder {}: {}{role}", idx + 1, founder.name));

        if !founder.education.is_empty() {
            w.bullet("-", &format!("Education: {}", founder.education.join(", ")), BLACK);
        }
        if !founder.previous_companies.is_empty() {
            w.bullet("-", &format!("Previous: {}", founder.previous_companies.join(", ")), BLACK);
        }
        if !founder.previous_exits.is_empty() {
            w.bullet("-", &format!("Exits: {}", founder.previous_exits.join(", ")), BLACK);
        }
        if founder.years_experience > 0 {
            w.bullet("-", &format!("Experience: {} years", founder.years_experience), BLACK);
        }
        if !founder.domain_expertise.is_empty() {
            w.bullet("-", &format!("Expertise: {}", founder.domain_expertise), BLACK);
        }
        for achievement in founder.notable_achievements.iter().take(3) {
            w.bullet("*", achievement, BLACK);
        }
        if !founder.linkedin_url.is_empty() {
            w.note(&founder.linkedin_url);
        }
        w.space(1.5);
    }

    if !findings.team_insights.trim().is_empty() {
        w.label("Team Analysis:");
        for item in format::bullet_items(&findings.team_insights) {
            w.bullet("-", &item, BLACK);
        }
    }
}

fn product_section(w: &mut PageWriter, findings: &ResearchFindings) {
    w.heading("Product & Business Model");

    let parts = [
        ("Product Description", &findings.product_description),
        ("Unique Value Proposition", &findings.unique_value_proposition),
        ("Technology Moat", &findings.technology_moat),
        ("Business Model", &findings.business_model_details),
        ("Revenue Model", &findings.revenue_model),
        ("Pricing Strategy", &findings.pricing_strategy),
        ("Technology Stack", &findings.technology_stack),
    ];

    let mut any = false;
    for (label, text) in parts {
        let text = format::display_text(&Value::String(text.clone()));
        if text.is_empty() {
            continue;
        }
        any = true;
        w.label(&format!("{label}:"));
        for item in format::bullet_items(&text) {
            w.bullet("-", &item, BLACK);
        }
        w.space(1.5);
    }
    if !any {
        w.note("Detailed product information not available from provided sources.");
    }
}

fn financial_section(w: &mut PageWriter, findings: &ResearchFindings) {
    w.heading("Traction & Financials");

    w.field("Funding Raised", &format_currency(findings.funding_raised));
    w.field("Funding Ask", &format_currency(findings.funding_ask_amount));
    w.field("Monthly Recurring Revenue", &format_currency(findings.current_mrr));
    w.field("Annual Recurring Revenue", &format_currency(findings.current_arr));
    w.field("YoY Growth", &format_percent(findings.yoy_growth_rate));
    w.field("Burn Rate", &format_currency(findings.burn_rate));
    w.field(
        "Runway",
        &findings
            .runway_months
            .map(|m| format!("{m} months"))
            .unwrap_or_else(|| "Not disclosed".to_string()),
    );
    w.field(
        "Customers",
        &findings
            .total_customers
            .map(|n| n.to_string())
            .unwrap_or_else(|| "Not disclosed".to_string()),
    );
    w.field("Retention", &format_percent(findings.retention_rate));

    if !findings.customer_base.trim().is_empty() {
        w.space(2.0);
        w.label("Customer Base:");
        for item in format::bullet_items(&format::display_text(&Value::String(
            findings.customer_base.clone(),
        ))) {
            w.bullet("-", &item, BLACK);
        }
    }
}

fn market_section(w: &mut PageWriter, findings: &ResearchFindings) {
    w.heading("Market Analysis");

    w.field("Total Addressable Market (TAM)", &format_currency(findings.tam));
    w.field("Serviceable Addressable Market (SAM)", &format_currency(findings.sam));
    w.field("Serviceable Obtainable Market (SOM)", &format_currency(findings.som));
    w.field("Market Growth Rate", &format_percent(findings.market_growth_rate));

    let text = format::display_text(&Value::String(findings.market_analysis.clone()));
    if !text.is_empty() {
        w.space(2.0);
        w.label("Market Opportunity:");
        for item in format::bullet_items(&text) {
            w.bullet("-", &item, BLACK);
        }
    }
}

fn competitors_section(
    w: &mut PageWriter,
    findings: &ResearchFindings,
    analysis: Option<&CompetitorAnalysis>,
) {
    w.heading("Competitive Landscape");

    let landscape = format::display_text(&Value::String(findings.competitive_landscape.clone()));
    if landscape.is_empty() {
        w.note("Competitive landscape analysis not available.");
    } else {
        for item in format::bullet_items(&landscape) {
            w.bullet("-", &item, BLACK);
        }
    }

    let Some(analysis) = analysis.filter(|a| !a.competitors.is_empty()) else {
        return;
    };

    w.subheading("Competitor Analysis");
    for (idx, comp) in analysis.competitors.iter().enumerate() {
        let name = if comp.name.is_empty() { "Unknown Competitor" } else { &comp.name };
        w.label(&format!("{}. {name}", idx + 1));

        let mut facts = Vec::new();
        if let Some(year) = comp.founded_year {
            facts.push(format!("Founded {year}"));
        }
        if !comp.headquarters.is_empty() {
            facts.push(comp.headquarters.clone());
        }
        if comp.funding_raised.is_some() {
            facts.push(format!("Raised {}", format_currency(comp.funding_raised)));
        }
        if comp.current_valuation.is_some() {
            facts.push(format!("Valued {}", format_currency(comp.current_valuation)));
        }
        if !facts.is_empty() {
            w.note(&facts.join(" | "));
        }
        for (label, text) in [
            ("Business model", &comp.business_model),
            ("Focus", &comp.focus_market),
            ("Traction", &comp.traction),
            ("Similarities", &comp.similarities),
        ] {
            if !text.is_empty() {
                w.bullet("-", &format!("{label}: {text}"), BLACK);
            }
        }
        w.space(1.5);
    }

    for (label, text) in [
        ("Market Overview", &analysis.market_overview),
        ("Competitive Advantages", &analysis.competitive_advantages),
        ("Market Threats", &analysis.market_threats),
    ] {
        if !text.trim().is_empty() {
            w.label(&format!("{label}:"));
            w.paragraph(text);
        }
    }

    let market = &analysis.validated_market_data;
    if !market.explanation.is_empty() {
        w.label("Market Data Notes:");
        for line in &market.explanation {
            w.bullet("-", line, GREY);
        }
    }
}

fn risks_section(w: &mut PageWriter, findings: &ResearchFindings) {
    let scorecard = &findings.ai_scorecard;
    let lists: [(&str, &str, &[String], (f32, f32, f32)); 4] = [
        ("Investment Highlights", "+", &findings.investment_highlights, BLACK),
        ("Risk Factors", "!", &findings.risk_factors, RED),
        ("Key Opportunities", ">", &scorecard.key_opportunities, BLACK),
        ("Key Risks to Monitor", "-", &scorecard.key_risks, BLACK),
    ];
    if lists.iter().all(|(_, _, items, _)| items.is_empty()) {
        return;
    }

    w.heading("Risks & Opportunities");
    for (title, marker, items, rgb) in lists {
        if items.is_empty() {
            continue;
        }
        w.subheading(title);
        for item in items {
            w.bullet(marker, item, rgb);
        }
        w.space(2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pitchlens_shared::{
        Competitor, FounderProfile, PitchDeckInput, RecordUpdate, StageStatus,
    };

    fn record_with_findings() -> ResearchRecord {
        let mut record = ResearchRecord::new(StartupInput::named("Acme Robotics"), PitchDeckInput::default());

        let mut findings = ResearchFindings {
            name: "Acme Robotics".into(),
            description: "Warehouse robots for mid-size retailers. Founded by ex-Amazon engineers.".into(),
            tam: Some(4.2e9),
            founders: vec![FounderProfile {
                name: "Ada Lovelace".into(),
                role: "CEO".into(),
                education: vec!["MIT".into()],
                ..FounderProfile::default()
            }],
            risk_factors: vec!["Hardware margins".into()],
            ..ResearchFindings::default()
        };
        for category in ScoreCategory::ALL {
            findings.ai_scorecard.detail_mut(category).score = 7.0;
        }
        findings.ai_scorecard.founders_score.strengths = vec!["Prior exits".into()];
        findings.ai_scorecard.finalize();

        let mut update = RecordUpdate::new(StageStatus::StructuredByLlm);
        update.findings = Some(Box::new(findings));
        record.apply(update);

        let mut update = RecordUpdate::new(StageStatus::CompetitorsAnalyzed);
        update.competitor_analysis = Some(CompetitorAnalysis {
            startup_name: "Acme Robotics".into(),
            competitors: vec![Competitor {
                name: "Locus".into(),
                funding_raised: Some(4e8),
                ..Competitor::default()
            }],
            ..CompetitorAnalysis::default()
        });
        record.apply(update);
        record
    }

    #[test]
    fn file_name_uses_slug_timestamp_and_run_id() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            report_file_name("Acme Robotics", "0190-abcd", at),
            "acme_robotics_investment_thesis_20250304_050607_0190-abcd.pdf"
        );
    }

    #[test]
    fn render_bytes_produces_pdf() {
        let bytes = render_bytes(&record_with_findings()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn render_requires_findings() {
        let record = ResearchRecord::new(StartupInput::named("Empty"), PitchDeckInput::default());
        let err = render_bytes(&record).unwrap_err();
        assert!(matches!(err, PitchLensError::Render(_)));
    }

    #[test]
    fn render_writes_into_output_dir() {
        let dir = std::env::temp_dir().join(format!("pitchlens-report-{}", uuid::Uuid::now_v7()));
        let renderer = PdfReportRenderer::new(&dir);

        let path = renderer.render(&record_with_findings()).unwrap();
        assert!(path.starts_with(&dir));
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("acme_robotics_investment_thesis_"));
        assert!(file_name.ends_with(".pdf"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn same_name_runs_write_separate_files() {
        let dir = std::env::temp_dir().join(format!("pitchlens-report-{}", uuid::Uuid::now_v7()));
        let renderer = PdfReportRenderer::new(&dir);

        let first = record_with_findings();
        let second = record_with_findings();
        assert_ne!(first.run_id(), second.run_id());

        let first_path = renderer.render(&first).unwrap();
        let second_path = renderer.render(&second).unwrap();
        assert_ne!(first_path, second_path);
        assert!(first_path.exists());
        assert!(second_path.exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
