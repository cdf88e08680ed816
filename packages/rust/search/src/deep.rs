//! Deep-research client: submit a long-running research job and poll it.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use pitchlens_shared::{DeepResearchConfig, DeepResearchReport, PitchLensError, Result};

use crate::{USER_AGENT, read_json};

/// State of a submitted research job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPoll {
    Pending,
    Completed { report: String, sources: Vec<Value> },
    Failed { reason: String },
}

pub struct DeepResearchClient {
    client: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl DeepResearchClient {
    pub fn new(config: &DeepResearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PitchLensError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
        })
    }

    /// Override the poll interval (tests use zero).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start a research job; returns its id.
    pub async fn submit(&self, query: &str) -> Result<String> {
        let request = self
            .client
            .post(format!("{}/research", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "input": query,
                "model": "auto",
                "citation_format": "apa",
            }));

        let body = read_json("deep research", request).await?;
        body.get("request_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PitchLensError::parse("deep research response has no request_id"))
    }

    /// Check a job once.
    pub async fn poll(&self, job_id: &str) -> Result<JobPoll> {
        let request = self
            .client
            .get(format!("{}/research/{job_id}", self.base_url))
            .bearer_auth(&self.api_key);

        let body = read_json("deep research", request).await?;
        let status = body.get("status").and_then(Value::as_str).unwrap_or_default();

        Ok(match status {
            "completed" => JobPoll::Completed {
                report: body
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                sources: body
                    .get("sources")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            },
            "failed" => JobPoll::Failed {
                reason: body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("research task failed on server side")
                    .to_string(),
            },
            _ => JobPoll::Pending,
        })
    }

    /// Submit `query` and wait for the report.
    ///
    /// Polls up to `max_polls` times, sleeping `poll_interval` between polls.
    /// A failed poll request is logged and counts as a pending poll.
    #[instrument(skip_all, fields(max_polls = self.max_polls))]
    pub async fn research(&self, query: &str) -> Result<DeepResearchReport> {
        let request_id = self.submit(query).await?;
        info!(%request_id, "deep research job started");

        for attempt in 1..=self.max_polls {
            match self.poll(&request_id).await {
                Ok(JobPoll::Completed { report, sources }) => {
                    info!(%request_id, attempt, report_len = report.len(), sources = sources.len(), "deep research complete");
                    return Ok(DeepResearchReport {
                        request_id,
                        report,
                        sources,
                    });
                }
                Ok(JobPoll::Failed { reason }) => {
                    return Err(PitchLensError::Network(format!(
                        "deep research job {request_id} failed: {reason}"
                    )));
                }
                Ok(JobPoll::Pending) => debug!(attempt, "deep research still running"),
                Err(e) => warn!(attempt, error = %e, "deep research poll failed"),
            }

            if attempt < self.max_polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(PitchLensError::Timeout(format!(
            "deep research job {request_id} not finished after {} polls",
            self.max_polls
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, max_polls: u32) -> DeepResearchClient {
        let config = DeepResearchConfig {
            base_url: server.uri(),
            max_polls,
            ..DeepResearchConfig::default()
        };
        DeepResearchClient::new(&config, "tv-key")
            .unwrap()
            .with_poll_interval(Duration::ZERO)
    }

    async fn mount_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/research"))
            .and(header("authorization", "Bearer tv-key"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "request_id": "job-1" })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn research_polls_until_completed() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/research/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "in_progress" })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/research/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "content": "Acme is a robotics company.",
                "sources": [{ "url": "https://acme.io" }]
            })))
            .mount(&server)
            .await;

        let report = client(&server, 5).research("Acme").await.unwrap();
        assert_eq!(report.request_id, "job-1");
        assert_eq!(report.report, "Acme is a robotics company.");
        assert_eq!(report.sources.len(), 1);
    }

    #[tokio::test]
    async fn research_times_out_after_max_polls() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/research/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "pending" })))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, 3).research("Acme").await.unwrap_err();
        assert!(matches!(err, PitchLensError::Timeout(_)));
    }

    #[tokio::test]
    async fn poll_errors_do_not_stop_polling() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/research/job-1"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/research/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "content": "done"
            })))
            .mount(&server)
            .await;

        let report = client(&server, 3).research("Acme").await.unwrap();
        assert_eq!(report.report, "done");
    }

    #[tokio::test]
    async fn failed_job_is_an_error() {
        let server = MockServer::start().await;
        mount_submit(&server).await;

        Mock::given(method("GET"))
            .and(path("/research/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "failed" })))
            .mount(&server)
            .await;

        let err = client(&server, 3).research("Acme").await.unwrap_err();
        assert!(err.to_string().contains("failed"));
    }

    #[tokio::test]
    async fn unauthorized_submit() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/research"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server, 3).submit("Acme").await.unwrap_err();
        assert!(matches!(err, PitchLensError::Unauthorized(_)));
    }
}
