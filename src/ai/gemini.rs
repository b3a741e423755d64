use super::schema::ParseSchema;
use super::traits::QueryParser;
use crate::config::AiConfig;
use crate::error::SmartSearchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Query parser backed by the Gemini `generateContent` REST endpoint
pub struct GeminiParser {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiParser {
    /// Create a parser for the configured model
    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.into(),
        })
    }

    /// Create a parser when an API key is configured
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>> {
        match config.api_key.as_deref().map(str::trim) {
            Some(api_key) if !api_key.is_empty() => Self::new(config, api_key).map(Some),
            _ => Ok(None),
        }
    }
}

/// Models sometimes wrap JSON in a Markdown code fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl QueryParser for GeminiParser {
    async fn parse_query(&self, text: &str, schema: &ParseSchema) -> Result<Value, SmartSearchError> {
        let prompt = schema.instruction(text);
        let request = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema.response_schema(),
            },
        };

        debug!(endpoint = %self.endpoint, "Sending search text to Gemini");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Gemini returned status: {}", response.status());
            return Err(SmartSearchError::Request(format!(
                "model returned status {}",
                response.status()
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| SmartSearchError::InvalidResponse(err.to_string()))?;
        let answer = payload.text().ok_or_else(|| {
            SmartSearchError::InvalidResponse("response carries no text candidate".to_string())
        })?;

        let value = serde_json::from_str(strip_code_fence(&answer))
            .map_err(|err| SmartSearchError::InvalidResponse(err.to_string()))?;
        info!("Gemini parsed search text into filters");
        Ok(value)
    }

    fn provider_name(&self) -> &'static str {
        "Gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::{strip_code_fence, GeminiParser};
    use crate::ai::{ParseSchema, QueryParser};
    use crate::config::AiConfig;
    use crate::error::SmartSearchError;
    use crate::models::Catalog;
    use httpmock::MockServer;
    use serde_json::json;

    const PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn parser(server: &MockServer) -> GeminiParser {
        let config = AiConfig {
            base_url: server.base_url(),
            ..AiConfig::default()
        };
        GeminiParser::new(&config, "test-key").unwrap()
    }

    fn schema() -> ParseSchema {
        ParseSchema::from_catalog(&Catalog::default())
    }

    #[tokio::test]
    async fn sends_the_schema_and_parses_the_answer() {
        let server = MockServer::start_async().await;
        let gemini_mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST)
                    .path(PATH)
                    .header("x-goog-api-key", "test-key")
                    .body_contains("\"responseMimeType\":\"application/json\"")
                    .body_contains("\"responseSchema\"")
                    .body_contains("Twin House");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "candidates": [{
                            "content": {
                                "role": "model",
                                "parts": [{ "text": "{\"type\":\"Apartment\",\"beds\":3,\"maxPrice\":3000000}" }]
                            }
                        }]
                    }));
            })
            .await;

        let value = parser(&server)
            .parse_query("شقة 3 غرف تحت 3 مليون", &schema())
            .await
            .unwrap();
        gemini_mock.assert_async().await;
        assert_eq!(
            value,
            json!({ "type": "Apartment", "beds": 3, "maxPrice": 3000000 })
        );
    }

    #[tokio::test]
    async fn error_statuses_fail_the_request() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path(PATH);
                then.status(503);
            })
            .await;

        let result = parser(&server).parse_query("villa", &schema()).await;
        assert!(matches!(result, Err(SmartSearchError::Request(_))));
    }

    #[tokio::test]
    async fn non_json_answers_are_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path(PATH);
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "candidates": [{ "content": { "parts": [{ "text": "Sorry, I can't help." }] } }]
                    }));
            })
            .await;

        let result = parser(&server).parse_query("villa", &schema()).await;
        assert!(matches!(result, Err(SmartSearchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn empty_candidates_are_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path(PATH);
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({ "candidates": [] }));
            })
            .await;

        let result = parser(&server).parse_query("villa", &schema()).await;
        assert!(matches!(result, Err(SmartSearchError::InvalidResponse(_))));
    }

    #[test]
    fn parser_requires_an_api_key() {
        assert!(GeminiParser::from_config(&AiConfig::default())
            .unwrap()
            .is_none());
        let config = AiConfig {
            api_key: Some("  ".to_string()),
            ..AiConfig::default()
        };
        assert!(GeminiParser::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"beds\":2}\n```"), "{\"beds\":2}");
        assert_eq!(strip_code_fence(" {\"beds\":2} "), "{\"beds\":2}");
    }
}
