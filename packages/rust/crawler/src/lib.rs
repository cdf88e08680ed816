//! Website fetching and content extraction.
//!
//! This crate provides:
//! - [`SiteScraper`], which fetches one page with SSRF protection
//! - [`extract`], the HTML → title/description/text helpers and technology detection

pub mod engine;
pub mod extract;

pub use engine::{ScrapedPage, SiteScraper, normalize_site_url};
pub use extract::detect_technologies;
