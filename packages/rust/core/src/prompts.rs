//! Prompt text for the two model-backed stages.

use std::fmt::Write as _;

use pitchlens_shared::{RawGathering, ResearchFindings, StartupInput};

/// Per-source caps on prompt text, in characters.
pub const PITCH_DECK_CHARS: usize = 30_000;
pub const WEBSITE_CHARS: usize = 15_000;
pub const DEEP_RESEARCH_CHARS: usize = 20_000;
pub const SEARCH_CHARS: usize = 12_000;
/// Deep research context handed to the competitor prompt.
pub const COMPETITOR_CONTEXT_CHARS: usize = 15_000;

const NOT_PROVIDED: &str = "Not provided";

/// First `max` characters of `text`, on a char boundary.
pub fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() { NOT_PROVIDED } else { value }
}

fn figure(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| format!("{v:.0}"))
}

/// Context block listing everything gathered about the startup.
pub fn gathered_context(input: &StartupInput, raw: &RawGathering) -> String {
    let mut out = String::new();

    out.push_str("STARTUP INFORMATION\n===================\n");
    let legal = if input.legal_name.trim().is_empty() { &input.name } else { &input.legal_name };
    let founders = input.founders.join(", ");
    let team_size = input.team_size.map(|n| n.to_string()).unwrap_or_default();
    let founded = input.founded_year.map(|n| n.to_string()).unwrap_or_default();
    for (label, value) in [
        ("Name", input.name.as_str()),
        ("Legal Name", legal.as_str()),
        ("Industry", input.industry.as_str()),
        ("Description", input.description.as_str()),
        ("Email", input.email.as_str()),
        ("Website", input.website.as_str()),
        ("Founders", founders.as_str()),
        ("Stage", input.stage.as_str()),
        ("Team Size", team_size.as_str()),
        ("Founded Year", founded.as_str()),
        ("Location", input.location.as_str()),
        ("CEO LinkedIn", input.ceo_linkedin_url.as_str()),
    ] {
        let _ = writeln!(out, "{label}: {}", or_missing(value));
    }

    out.push_str("\nPITCH DECK CONTENT\n==================\n");
    match raw.pitch_deck.as_ref().filter(|d| !d.raw_text.trim().is_empty()) {
        Some(deck) => out.push_str(clip(&deck.raw_text, PITCH_DECK_CHARS)),
        None => out.push_str("Pitch deck not provided"),
    }

    out.push_str("\n\nWEBSITE CONTENT\n===============\n");
    match &raw.website {
        Some(site) => {
            let _ = writeln!(out, "Title: {}", or_missing(&site.page_title));
            let _ = writeln!(out, "Description: {}", or_missing(&site.page_description));
            if !site.technologies_detected.is_empty() {
                let _ = writeln!(out, "Technologies: {}", site.technologies_detected.join(", "));
            }
            out.push_str(clip(&site.main_content, WEBSITE_CHARS));
        }
        None => out.push_str("Website not scraped"),
    }

    out.push_str("\n\nSEARCH RESULTS\n==============\n");
    match raw.search.as_ref().filter(|s| !s.is_empty()) {
        Some(bundle) => {
            let mut section = String::new();
            for (category, hits) in &bundle.categories {
                let _ = writeln!(section, "[{category}]");
                for hit in hits {
                    let _ = writeln!(section, "- {}: {} ({})", hit.title, hit.snippet, hit.link);
                }
            }
            if !bundle.news.is_empty() {
                section.push_str("[news]\n");
                for hit in &bundle.news {
                    let date = hit.date.as_deref().unwrap_or("undated");
                    let _ = writeln!(section, "- {} [{date}]: {}", hit.title, hit.snippet);
                }
            }
            out.push_str(clip(&section, SEARCH_CHARS));
        }
        None => out.push_str("No search results available"),
    }

    out.push_str("\n\nDEEP RESEARCH REPORT\n====================\n");
    match raw.deep_research.as_ref().filter(|r| !r.report.trim().is_empty()) {
        Some(report) => out.push_str(clip(&report.report, DEEP_RESEARCH_CHARS)),
        None => out.push_str("No deep research report available"),
    }
    out.push('\n');

    out
}

/// Prompt asking the model for the full findings object.
pub fn structure_prompt(input: &StartupInput, raw: &RawGathering) -> String {
    format!(
        r#"You are an expert startup analyst, venture capital investor and due diligence professional.

Analyze the following startup information gathered from a pitch deck, the company website and web research:

{context}

Provide a detailed analysis as ONE flat JSON object with exactly these keys. Use null for unknown numbers, "" for unknown text and [] for unknown lists. Monetary amounts are plain numbers in INR.

name, legal_name, description (5-7 sentences), location, website, company_email, company_phone,
industry, startup_industry_domain,
thesis_name: one of CONSUMER, HEALTHCARE, IMPACT_SDG, SINGULARITY_AI, EMC, RUMS, RETAIN, OTHERS
  (CONSUMER: B2C products; HEALTHCARE: medical and wellness; IMPACT_SDG: sustainability and social good;
   SINGULARITY_AI: deep-tech AI, quantum, neurotech; EMC: enterprise cloud and B2B SaaS;
   RUMS: remote work, utilities, mobility, space; RETAIN: HR and employee experience; OTHERS: nothing else fits),
startup_stage: one of IDEA, MVP, EARLY_TRACTION, GROWTH, SCALE_UP, EXPANSION_LATE_STAGE,
ceo_name, ceo_email, ceo_phone, ceo_linkedin_url,
founders: list of {{name, role, linkedin_url, education[], previous_companies[], previous_exits[], years_experience, domain_expertise, notable_achievements[]}},
company_goal (3-5 sentences), employee_count (integer), company_info (object), team_insights (3-5 sentences),
product_description (5-7 sentences), unique_value_proposition, technology_moat, business_model_details,
revenue_model, pricing_strategy, technology_stack,
funding_raised, funding_ask_amount, funding_info (object), current_mrr, current_arr, yoy_growth_rate,
customer_acquisition_cost, lifetime_value, burn_rate, runway_months (integer),
total_customers, active_users, retention_rate, key_metrics (object), customer_base,
market_analysis (5-7 sentences), tam, sam, som, market_growth_rate, competitive_landscape (5-7 sentences),
known_competitors: every competitor name mentioned in the sources,
partnerships[], awards_recognition[], news_mentions[], social_presence (object),
investment_highlights: 5-7 items, risk_factors: 5-7 items.

Also score the startup. Put these keys at the top level of the same object:
founders_score, market_score, product_score, traction_score, team_score, financials_score, competition_score.
Each is {{"score": 0-10 with decimals, "justification": 2-3 sentences, "strengths": [2-3 items], "weaknesses": [2-3 items]}}.
Weights: founders 0.25, market 0.20, product 0.15, traction 0.20, team 0.10, financials 0.10; competition is reported but not weighted.
overall_score: the weighted average.
investment_recommendation: STRONG_BUY if >= 8.0, BUY if >= 6.5, HOLD if >= 5.0, otherwise PASS.
investment_summary: 3-5 sentences of advice for investors.
key_risks: top 5. key_opportunities: top 5.

Return ONLY the JSON object, with no markdown and no commentary."#,
        context = gathered_context(input, raw),
    )
}

/// Prompt asking the model for five competitor profiles and validated market figures.
pub fn competitor_prompt(findings: &ResearchFindings, deep_research: Option<&str>) -> String {
    let known = if findings.known_competitors.is_empty() {
        "None identified".to_string()
    } else {
        findings.known_competitors.join(", ")
    };
    let context = deep_research
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map_or("No deep research report available", |r| clip(r, COMPETITOR_CONTEXT_CHARS));

    format!(
        r#"You are an expert startup analyst and competitive intelligence specialist with deep knowledge of the Indian startup ecosystem.

Identify and analyze 5 major competitors of this startup.

STARTUP DETAILS:
Name: {name}
Industry: {industry}
Business Model: {business_model}
Focus Market: {focus_market}
Description: {description}

Prefer competitors based in or focused on India. Fall back to global players only when there are not enough Indian ones.

RESEARCH CONTEXT:
--------------------------------
{context}
--------------------------------

KNOWN COMPETITORS:
{known}

First check whether the known competitors are real and relevant, and prioritize them if they are.

MARKET DATA TO VALIDATE (INR):
TAM: {tam}
SAM: {sam}
SOM: {som}
Validate these figures for the Indian market. If they are missing, global or wrong, estimate them. Always return numbers. Give at most 2 short bullet points naming the source or basis of the figures.

Return ONLY valid JSON with this structure:
{{
  "competitors": [
    {{
      "name": "",
      "founded_year": 2019,
      "headquarters": "",
      "funding_raised": 0,
      "current_valuation": null,
      "revenue": null,
      "business_model": "",
      "focus_market": "",
      "traction": "",
      "similarities": "how they are similar to {name}"
    }}
  ],
  "market_overview": "",
  "competitive_advantages": "",
  "market_threats": "",
  "validated_market_data": {{ "tam": 0, "sam": 0, "som": 0, "explanation": [] }}
}}"#,
        name = findings.name,
        industry = or_missing(&findings.industry),
        business_model = or_missing(&findings.company_goal),
        focus_market = or_missing(&findings.customer_base),
        description = or_missing(&findings.description),
        tam = figure(findings.tam),
        sam = figure(findings.sam),
        som = figure(findings.som),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchlens_shared::{DeepResearchReport, ExtractedPitchDeck, SearchBundle, SearchHit};

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip("héllo", 2), "hé");
        assert_eq!(clip("abc", 10), "abc");
        assert_eq!(clip("", 3), "");
    }

    #[test]
    fn context_caps_each_source() {
        let raw = RawGathering {
            pitch_deck: Some(ExtractedPitchDeck {
                raw_text: "ж".repeat(PITCH_DECK_CHARS + 500),
                ..Default::default()
            }),
            deep_research: Some(DeepResearchReport {
                report: "ю".repeat(DEEP_RESEARCH_CHARS + 500),
                ..Default::default()
            }),
            ..Default::default()
        };
        let context = gathered_context(&StartupInput::named("Acme"), &raw);
        assert_eq!(context.matches('ж').count(), PITCH_DECK_CHARS);
        assert_eq!(context.matches('ю').count(), DEEP_RESEARCH_CHARS);
        assert!(context.contains("Website not scraped"));
        assert!(context.contains("No search results available"));
    }

    #[test]
    fn context_lists_search_hits_by_category() {
        let mut bundle = SearchBundle::default();
        bundle.categories.insert(
            "funding_info".into(),
            vec![SearchHit {
                title: "Acme raises seed".into(),
                snippet: "Led by Example Ventures".into(),
                link: "https://news.example/acme".into(),
                ..Default::default()
            }],
        );
        let raw = RawGathering {
            search: Some(bundle),
            ..Default::default()
        };
        let context = gathered_context(&StartupInput::named("Acme"), &raw);
        assert!(context.contains("[funding_info]"));
        assert!(context.contains("Acme raises seed: Led by Example Ventures"));
        assert!(context.contains("Legal Name: Acme"));
    }

    #[test]
    fn competitor_prompt_carries_known_names_and_figures() {
        let findings = ResearchFindings {
            name: "Acme".into(),
            known_competitors: vec!["Globex".into(), "Initech".into()],
            tam: Some(5e9),
            ..Default::default()
        };
        let prompt = competitor_prompt(&findings, Some("   "));
        assert!(prompt.contains("Globex, Initech"));
        assert!(prompt.contains("TAM: 5000000000"));
        assert!(prompt.contains("SAM: unknown"));
        assert!(prompt.contains("No deep research report available"));
        assert!(prompt.contains("how they are similar to Acme"));
    }
}
