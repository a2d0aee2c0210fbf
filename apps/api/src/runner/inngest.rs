//! HTTP client for an Inngest-compatible runner.
//!
//! Submission goes to the event API (`POST /e/{event_key}`), status reads go to
//! the REST API (`GET /v1/events/{id}/runs`) authenticated with the signing key.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{JobEvent, JobRunner, RunnerError, RunsResponse, SubmitResponse};

/// Upper bound for a single runner call. The poll loop's own budget bounds the
/// total wait; this only stops one hung request from eating it.
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct InngestClient {
    client: Client,
    base_url: String,
    event_key: String,
    signing_key: String,
}

impl InngestClient {
    pub fn new(
        base_url: &str,
        event_key: String,
        signing_key: String,
    ) -> Result<Self, RunnerError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            event_key,
            signing_key,
        })
    }

    fn submit_url(&self) -> String {
        format!("{}/e/{}", self.base_url, self.event_key)
    }

    fn runs_url(&self, handle: &str) -> String {
        format!("{}/v1/events/{}/runs", self.base_url, handle)
    }
}

#[async_trait]
impl JobRunner for InngestClient {
    async fn submit(&self, event: &JobEvent) -> Result<SubmitResponse, RunnerError> {
        let response = self.client.post(self.submit_url()).json(event).send().await?;
        let submitted: SubmitResponse = decode(response).await?;
        debug!("Submitted event {} -> {:?}", event.name, submitted.ids);
        Ok(submitted)
    }

    async fn get_runs(&self, handle: &str) -> Result<RunsResponse, RunnerError> {
        let response = self
            .client
            .get(self.runs_url(handle))
            .bearer_auth(&self.signing_key)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RunnerError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(RunnerError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client =
            InngestClient::new("http://localhost:8288/", "evt".into(), "sig".into()).unwrap();
        assert_eq!(client.submit_url(), "http://localhost:8288/e/evt");
        assert_eq!(
            client.runs_url("01HXYZ"),
            "http://localhost:8288/v1/events/01HXYZ/runs"
        );
    }
}
