use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::core::config::ExtractionProviderConfig;
use crate::core::extraction::{ExtractedItem, ExtractionRequest, ExtractionService};

const PROMPT: &str = "You read supplier invoices, packing lists, chat messages and photos of \
goods. List every distinct item being bought. Reply with a JSON array only, one object per \
item, with the keys \"name\" (string), \"quantity\" (integer, default 1), \
\"estimated_value\" (number: your estimate of the item's resale value, relative to the \
other items) and \"category\" (string or null).";

/// Line-item extraction through the Gemini `generateContent` endpoint.
pub struct GeminiExtractionProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiExtractionProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Builds the provider, reading the key from the configured variable.
    pub fn from_config(config: &ExtractionProviderConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.model,
            std::env::var(&config.api_key_env).ok(),
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Models sometimes wrap JSON in a Markdown fence despite being asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_items(text: &str) -> Result<Vec<ExtractedItem>> {
    let body = strip_code_fence(text);
    let value: serde_json::Value =
        serde_json::from_str(body).context("Extraction response is not valid JSON")?;
    // Accept a bare array or an object wrapping one under "items".
    let array = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove("items")
            .ok_or_else(|| anyhow!("Extraction response has no item list"))?,
        _ => return Err(anyhow!("Extraction response has no item list")),
    };
    serde_json::from_value(array).context("Failed to parse extracted items")
}

#[async_trait]
impl ExtractionService for GeminiExtractionProvider {
    #[instrument(
        name = "GeminiExtract",
        skip(self, request),
        fields(model = %self.model, attachments = request.attachments.len())
    )]
    async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<ExtractedItem>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Missing API key for the extraction service"))?;
        if request.is_empty() {
            return Err(anyhow!("Nothing to extract: provide text or an attachment"));
        }

        let mut parts = vec![Part::Text { text: PROMPT }];
        if let Some(text) = request.text.as_deref().filter(|t| !t.trim().is_empty()) {
            parts.push(Part::Text { text });
        }
        for attachment in &request.attachments {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: &attachment.mime_type,
                    data: STANDARD.encode(&attachment.data),
                },
            });
        }
        let body = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Requesting extraction from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("shopkeep/0.1")
            .build()?;
        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for extraction", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(%status, detail = %detail, "Extraction request rejected");
            return Err(anyhow!("HTTP error: {} from extraction service", status));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse extraction response")?;
        let text: String = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("Extraction service returned no content"))?;

        let items = parse_items(&text)?;
        debug!(count = items.len(), "Extracted items");
        Ok(items)
    }
}
