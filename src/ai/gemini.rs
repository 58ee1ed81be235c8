//! Google Gemini API Client
//!
//! Non-streaming client for the Gemini `generateContent` endpoint. Every
//! question costs exactly one request; generation is pinned to the low
//! temperature and output token cap carried by [`ModelConfig`].

use std::time::Duration;

use analyst_types::{ModelConfig, ModelError, ModelResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

use super::AnalysisModel;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: ModelConfig,
    client: Client,
    base_url: String,
}

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Gemini content structure
#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

/// Gemini content part
#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

/// Gemini generation configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

/// Gemini candidate response. `content` defaults to empty when the
/// service returns a candidate with no text, e.g. a safety stop.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: CandidateContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Gemini usage metadata
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::AuthenticationError);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ModelError::http(e.to_string()))?;

        Ok(Self {
            config,
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Create a client from `GEMINI_API_KEY` / `GEMINI_MODEL`
    pub fn from_env() -> ModelResult<Self> {
        Self::new(ModelConfig::from_env())
    }

    /// Endpoint URL with the API key as a query parameter.
    fn endpoint(&self) -> ModelResult<Url> {
        let raw = format!("{}/{}:generateContent", self.base_url, self.config.model);
        let mut url = Url::parse(&raw)
            .map_err(|e| ModelError::configuration(format!("bad endpoint {}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        Ok(url)
    }

    /// Send one prompt to the Gemini API and extract the reply text.
    async fn send(&self, prompt: &str) -> ModelResult<String> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            }),
        };

        let url = self.endpoint()?;
        // Never log the real key.
        let mut redacted = url.clone();
        redacted.set_query(Some("key=***"));
        debug!(url = %redacted, prompt_chars = prompt.len(), "sending Gemini request");

        let response = self
            .client
            .post(url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::TimeoutError
                } else {
                    ModelError::network(e.to_string())
                }
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ModelError::network(e.to_string()))?;

        debug!(%status, "Gemini API response received");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimitError);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ModelError::AuthenticationError);
        }
        if !status.is_success() {
            error!(%status, body = %response_text, "Gemini API error");
            return Err(ModelError::api(format!("HTTP {}: {}", status, response_text)));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(error = %e, "failed to parse Gemini response");
                ModelError::json(e.to_string())
            })?;

        let Some(candidate) = gemini_response.candidates.first() else {
            return Err(ModelError::invalid_response("no candidates in response"));
        };
        let Some(part) = candidate.content.parts.first() else {
            return Err(ModelError::invalid_response(format!(
                "candidate has no text parts (finish reason: {:?})",
                candidate.finish_reason
            )));
        };

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                prompt_tokens = ?usage.prompt_token_count,
                reply_tokens = ?usage.candidates_token_count,
                total_tokens = ?usage.total_token_count,
                "Gemini API usage"
            );
        }

        Ok(part.text.clone())
    }

    /// Connectivity probe: one tiny completion, errors reported as `false`.
    pub async fn health_check(&self) -> bool {
        match self.send("Reply with the single word OK.").await {
            Ok(reply) => !reply.trim().is_empty(),
            Err(error) => {
                warn!(%error, "Gemini health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl AnalysisModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> ModelResult<String> {
        self.send(prompt).await
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> ModelConfig {
        ModelConfig::new("test-key", "gemini-2.0-flash")
            .with_max_tokens(256)
            .with_temperature(0.2)
            .with_timeout(5)
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(create_test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let mut config = create_test_config();
        config.api_key = "".to_string();
        let client = GeminiClient::new(config);
        assert!(matches!(client.err(), Some(ModelError::AuthenticationError)));
    }

    #[test]
    fn test_endpoint_carries_model_and_key() {
        let client = GeminiClient::new(create_test_config()).unwrap();
        let url = client.endpoint().unwrap();
        assert!(url.path().contains("gemini-2.0-flash"));
        assert!(url.path().ends_with(":generateContent"));
        assert_eq!(url.query(), Some("key=test-key"));
    }

    #[test]
    fn test_request_body_uses_wire_field_names() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "hello".to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                max_output_tokens: Some(256),
            }),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_response_parses_wire_format() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "The answer." }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 120,
                "candidatesTokenCount": 30,
                "totalTokenCount": 150
            }
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].content.parts[0].text, "The answer.");
        assert_eq!(
            parsed.candidates[0].finish_reason.as_deref(),
            Some("STOP")
        );
        assert_eq!(
            parsed.usage_metadata.unwrap().total_token_count,
            Some(150)
        );
    }

    #[test]
    fn test_response_tolerates_empty_candidate() {
        let raw = r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.candidates[0].content.parts.is_empty());
    }

    // Integration test - requires API key
    #[tokio::test]
    #[ignore = "Requires GEMINI_API_KEY environment variable"]
    async fn test_gemini_integration() {
        let config = ModelConfig::from_env();
        if config.api_key.is_empty() {
            panic!("GEMINI_API_KEY environment variable required for integration test");
        }

        let client = GeminiClient::new(config).unwrap();
        let reply = client
            .complete("Reply with the single word OK.")
            .await
            .unwrap();
        assert!(!reply.trim().is_empty());
        println!("Gemini replied: {}", reply);
    }
}
