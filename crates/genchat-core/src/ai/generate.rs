use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GenerationService;
use crate::error::RequestFailure;
use crate::persona::Persona;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    question: &'a str,
    role: Persona,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the `/api/generate` endpoint.
///
/// No timeout is set: a request that never resolves keeps the session waiting.
#[derive(Clone)]
pub struct GenerateClient {
    client: Client,
    base_url: String,
}

impl GenerateClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn query(&self, question: &str, persona: Persona) -> Result<String, RequestFailure> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            question,
            role: persona,
        };

        debug!(%url, role = %persona, "posting question");

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(RequestFailure::new(format!(
                "service returned {}: {}",
                status, detail
            )));
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| RequestFailure::new(format!("malformed response body: {}", e)))?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl GenerationService for GenerateClient {
    async fn generate(&self, question: &str, persona: Persona) -> Result<String, RequestFailure> {
        self.query(question, persona).await
    }
}
