//! Search collaborators.
//!
//! - [`WebSearchClient`]: ranked web and news snippets (Serper or SerpAPI)
//! - [`DeepResearchClient`]: long-form research reports with job polling

pub mod deep;
pub mod web;

use pitchlens_shared::{PitchLensError, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;

pub use deep::{DeepResearchClient, JobPoll};
pub use web::WebSearchClient;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("PitchLens/", env!("CARGO_PKG_VERSION"));

/// Send a request and decode a JSON body, mapping HTTP failures to errors.
async fn read_json(service: &'static str, request: RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| PitchLensError::Network(format!("{service}: {e}")))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(PitchLensError::Unauthorized(format!(
            "{service} rejected the API key"
        )));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PitchLensError::http(service, status.as_u16(), body));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| PitchLensError::parse(format!("{service}: invalid JSON response: {e}")))
}
