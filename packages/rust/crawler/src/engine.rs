//! Single-page site fetcher.
//!
//! Fetches a company's landing page, guards against requests to private
//! networks, and extracts title, description, main text and outbound links.

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use url::Url;

use pitchlens_shared::{PitchLensError, Result, SiteConfig};

use crate::extract;

/// User-Agent string for site requests.
const USER_AGENT: &str = concat!("PitchLens/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects followed per fetch.
const MAX_REDIRECTS: usize = 5;

/// Maximum links kept from one page.
const MAX_LINKS: usize = 100;

// ---------------------------------------------------------------------------
// ScrapedPage
// ---------------------------------------------------------------------------

/// A fetched page with its extracted content.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    /// Final URL after redirects.
    pub url: String,
    pub title: String,
    pub description: String,
    /// Main content as Markdown text, truncated to the configured limit.
    pub main_text: String,
    /// Absolute http(s) links, deduplicated, in document order.
    pub links: Vec<String>,
    /// SHA-256 of `main_text`.
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// SiteScraper
// ---------------------------------------------------------------------------

/// Fetches and extracts a single web page.
pub struct SiteScraper {
    client: Client,
    max_content_chars: usize,
    /// Allow localhost/private IPs (for integration tests with mock servers).
    allow_private_hosts: bool,
}

impl SiteScraper {
    /// Create a scraper from the `[site]` config section.
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PitchLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_content_chars: config.max_content_chars,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Allow fetching localhost/private IPs (for integration tests).
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private_hosts = true;
        self
    }

    /// Fetch `raw_url` and extract its content.
    ///
    /// A missing scheme is treated as `https://`.
    #[instrument(skip(self), fields(url = %raw_url))]
    pub async fn fetch(&self, raw_url: &str) -> Result<ScrapedPage> {
        let url = normalize_site_url(raw_url)?;

        if !self.allow_private_hosts && is_ssrf_target(&url) {
            return Err(PitchLensError::validation(format!(
                "refusing to fetch private or non-http address: {url}"
            )));
        }

        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| PitchLensError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PitchLensError::http("website", status.as_u16(), url.to_string()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| PitchLensError::Network(format!("{url}: body read failed: {e}")))?;

        let page = self.extract_page(&body, &final_url)?;

        info!(
            url = %page.url,
            title = %page.title,
            text_len = page.main_text.len(),
            links = page.links.len(),
            "page scraped"
        );

        Ok(page)
    }

    fn extract_page(&self, body: &str, url: &Url) -> Result<ScrapedPage> {
        let doc = Html::parse_document(body);

        let title = extract::page_title(&doc);
        let description = extract::page_description(&doc);
        let links = extract_links(&doc, url);

        let content_html = extract::main_content_html(&doc);
        let text = extract::html_to_text(&content_html)?;
        let main_text = extract::truncate_chars(&text, self.max_content_chars);
        let content_hash = compute_hash(&main_text);

        Ok(ScrapedPage {
            url: url.to_string(),
            title,
            description,
            main_text,
            links,
            content_hash,
        })
    }
}

/// Parse a user-supplied site address, defaulting the scheme to https.
pub fn normalize_site_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PitchLensError::validation("website URL is empty"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    Url::parse(&with_scheme)
        .map_err(|e| PitchLensError::validation(format!("invalid website URL {trimmed:?}: {e}")))
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract absolute http(s) links, resolved against the base URL.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<String> {
    let Ok(link_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        // Skip anchors, javascript:, mailto:, tel:
        if href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let Ok(mut resolved) = base_url.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        resolved.set_fragment(None);

        let link = resolved.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
            if links.len() >= MAX_LINKS {
                break;
            }
        }
    }

    links
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod scraper_tests {
    use super::*;

    fn scraper() -> SiteScraper {
        SiteScraper::new(&SiteConfig::default())
            .unwrap()
            .allow_private_hosts()
    }

    #[test]
    fn test_normalize_site_url() {
        let url = normalize_site_url("acme.io").unwrap();
        assert_eq!(url.as_str(), "https://acme.io/");

        let url = normalize_site_url("http://acme.io/about").unwrap();
        assert_eq!(url.scheme(), "http");

        assert!(normalize_site_url("   ").is_err());
    }

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash("hello world");
        assert_eq!(hash.len(), 64); // SHA-256 = 64 hex chars
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_ssrf_protection_blocks_file() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(is_ssrf_target(&url));
    }

    #[test]
    fn test_ssrf_protection_blocks_private_ip() {
        for raw in ["http://192.168.1.1/admin", "http://10.0.0.1/", "http://127.0.0.1:8080/"] {
            let url = Url::parse(raw).unwrap();
            assert!(is_ssrf_target(&url), "{raw} should be blocked");
        }
    }

    #[test]
    fn test_ssrf_protection_allows_public() {
        let url = Url::parse("https://acme.io/").unwrap();
        assert!(!is_ssrf_target(&url));
    }

    #[test]
    fn test_ssrf_blocks_localhost() {
        let url = Url::parse("http://localhost:3000/api").unwrap();
        assert!(is_ssrf_target(&url));
    }

    #[test]
    fn test_extract_links_dedups_and_filters() {
        let html = r##"<html><body>
            <a href="/about">About</a>
            <a href="/about#team">About again</a>
            <a href="https://external.com">External</a>
            <a href="#section">Anchor</a>
            <a href="mailto:hi@acme.io">Mail</a>
            <a href="ftp://files.acme.io/x">FTP</a>
        </body></html>"##;

        let doc = Html::parse_document(html);
        let base = Url::parse("https://acme.io/").unwrap();
        let links = extract_links(&doc, &base);

        assert_eq!(
            links,
            vec!["https://acme.io/about".to_string(), "https://external.com/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_refuses_private_host_by_default() {
        let scraper = SiteScraper::new(&SiteConfig::default()).unwrap();
        let err = scraper.fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.to_string().contains("refusing"));
    }

    #[tokio::test]
    async fn test_fetch_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        let page = r#"<html>
            <head>
                <title>Acme</title>
                <meta name="description" content="Robots that pick and pack">
            </head>
            <body>
                <nav><a href="/login">Log in</a></nav>
                <main>
                    <h1>Pick faster</h1>
                    <p>Our fleet runs on Kubernetes.</p>
                    <a href="/customers">Customers</a>
                </main>
            </body>
        </html>"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let scraped = scraper().fetch(&server.uri()).await.unwrap();

        assert_eq!(scraped.title, "Acme");
        assert_eq!(scraped.description, "Robots that pick and pack");
        assert!(scraped.main_text.contains("Pick faster"));
        assert!(!scraped.main_text.contains("Log in"));
        assert!(scraped.links.iter().any(|l| l.ends_with("/customers")));
        assert_eq!(scraped.content_hash, compute_hash(&scraped.main_text));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = scraper().fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, PitchLensError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_truncates_content() {
        let server = wiremock::MockServer::start().await;
        let body = format!("<html><body><main><p>{}</p></main></body></html>", "a".repeat(500));

        wiremock::Mock::given(wiremock::matchers::path("/"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let config = SiteConfig {
            max_content_chars: 100,
            allow_private_hosts: true,
            ..SiteConfig::default()
        };
        let scraped = SiteScraper::new(&config).unwrap().fetch(&server.uri()).await.unwrap();
        assert_eq!(scraped.main_text.chars().count(), 100);
    }
}
