//! HTML content extraction for company websites.
//!
//! Pulls the title, description and main body out of a landing page, drops
//! navigation chrome, and converts what is left to Markdown text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use pitchlens_shared::{PitchLensError, Result};

/// Candidate roots for the main content, tried in order before `<body>`.
const CONTENT_SELECTORS: [&str; 4] = ["main", "article", r#"[role="main"]"#, ".content"];

/// Technologies we look for in page text, with the pattern that detects each.
const TECHNOLOGIES: [(&str, &str); 15] = [
    ("REACT", r"react"),
    ("PYTHON", r"python"),
    ("AWS", r"aws"),
    ("KUBERNETES", r"kubernetes|k8s"),
    ("NODEJS", r"node\.?js"),
    ("VUE", r"vue(?:\.js)?"),
    ("ANGULAR", r"angular"),
    ("DJANGO", r"django"),
    ("FLASK", r"flask"),
    ("POSTGRESQL", r"postgres(?:ql)?"),
    ("MONGODB", r"mongo(?:db)?"),
    ("DOCKER", r"docker"),
    ("FIREBASE", r"firebase"),
    ("GCP", r"gcp|google cloud"),
    ("AZURE", r"azure"),
];

static TECH_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TECHNOLOGIES
        .iter()
        .map(|(name, pat)| {
            let re = Regex::new(&format!(r"(?i)\b(?:{pat})\b")).expect("valid regex");
            (*name, re)
        })
        .collect()
});

/// Page `<title>`, falling back to the first `<h1>`.
pub fn page_title(doc: &Html) -> String {
    static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("title").expect("valid selector"));
    static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

    doc.select(&TITLE)
        .chain(doc.select(&H1))
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// `<meta name="description">`, falling back to `og:description`.
pub fn page_description(doc: &Html) -> String {
    static META: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(r#"meta[name="description"], meta[name="Description"]"#)
            .expect("valid selector")
    });
    static OG: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(r#"meta[property="og:description"]"#).expect("valid selector")
    });

    doc.select(&META)
        .chain(doc.select(&OG))
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|d| !d.is_empty())
        .unwrap_or_default()
}

/// Inner HTML of the main content area with chrome removed.
pub fn main_content_html(doc: &Html) -> String {
    for sel_str in CONTENT_SELECTORS {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            return strip_chrome(&el.inner_html());
        }
    }

    static BODY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("body").expect("valid selector"));
    doc.select(&BODY)
        .next()
        .map(|body| strip_chrome(&body.inner_html()))
        .unwrap_or_default()
}

/// Strip navigation and non-content elements from an HTML fragment.
fn strip_chrome(html: &str) -> String {
    static CHROME: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("nav, header, footer, aside, script, style, noscript, .cookie-banner")
            .expect("valid selector")
    });

    let doc = Html::parse_fragment(html);
    let mut result = html.to_string();
    for el in doc.select(&CHROME) {
        result = result.replace(&el.html(), "");
    }
    result
}

/// Convert content HTML to readable Markdown text.
pub fn html_to_text(html: &str) -> Result<String> {
    static MULTI_BLANK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg", "img"])
        .build();

    let markdown = converter
        .convert(html)
        .map_err(|e| PitchLensError::parse(format!("htmd conversion failed: {e}")))?;

    let trimmed: Vec<&str> = markdown.lines().map(str::trim_end).collect();
    Ok(MULTI_BLANK
        .replace_all(&trimmed.join("\n"), "\n\n")
        .trim()
        .to_string())
}

/// Technology tags mentioned in `text`, in a stable order.
pub fn detect_technologies(text: &str) -> Vec<String> {
    TECH_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
