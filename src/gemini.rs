use crate::config::Config;
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use serde::Deserialize;
use reqwest::Client;
use tracing::{info, warn, error};

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("API Configuration Error: API_KEY is missing")] MissingCredential,
    #[error("HTTP error: {0}")] Http(String),
    #[error("API error: status={status} body={body}")] Status { status: u16, body: String },
    #[error("Decode error: {0}")] Decode(String),
}

/// Base64 image payload as it travels inside a request or response part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Text-to-image or image-edit call.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub source: Option<InlineImage>,
    pub aspect_ratio: &'static str,
}

/// JSON-mode call constrained by a response schema.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub prompt: String,
    pub source: Option<InlineImage>,
    pub schema: Value,
}

/// The two capabilities the assistant needs from the remote generation service.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Returns a data URI, or `None` when the response carried no image.
    async fn generate_image(&self, request: &ImageRequest) -> Result<Option<String>, GeminiError>;

    /// Returns the raw JSON text of the response (possibly empty).
    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String, GeminiError>;
}

/// Stands in for the client when no credential is configured. Never touches the network.
pub struct UnconfiguredService;

#[async_trait]
impl GenerativeService for UnconfiguredService {
    async fn generate_image(&self, _request: &ImageRequest) -> Result<Option<String>, GeminiError> {
        Err(GeminiError::MissingCredential)
    }

    async fn generate_structured(&self, _request: &StructuredRequest) -> Result<String, GeminiError> {
        Err(GeminiError::MissingCredential)
    }
}

// Helper function to truncate base64 data in JSON for cleaner logging
pub(crate) fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=') {
                            *val = Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

pub(crate) fn preview(data: &str) -> String {
    match data.char_indices().nth(50) {
        Some((cut, _)) => format!("{}...[{} chars total]", &data[..cut], data.len()),
        None => data.to_string(),
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    text_model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Fails with `MissingCredential` for an empty or whitespace key, before any request is made.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, GeminiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            error!("❌ CRITICAL: GEMINI_API_KEY is missing in environment variables");
            return Err(GeminiError::MissingCredential);
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.trim().to_string(),
            base_url: base_url.into(),
            image_model: crate::config::DEFAULT_IMAGE_MODEL.to_string(),
            text_model: crate::config::DEFAULT_TEXT_MODEL.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GeminiError> {
        let mut client = Self::new(config.api_key.clone().unwrap_or_default(), config.api_base.clone())?;
        client.image_model = config.image_model.clone();
        client.text_model = config.text_model.clone();
        Ok(client)
    }

    async fn perform_api_call(&self, model: &str, request_body: &Value) -> Result<GeminiResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, model, self.api_key);

        info!("🔗 Making request to: {}", url.replace(&self.api_key, "***"));

        let mut logged_body = request_body.clone();
        truncate_base64_in_json(&mut logged_body);
        info!("📤 Request body: {}", serde_json::to_string(&logged_body).unwrap_or_default());

        let response = self.client
            .post(&url)
            .json(request_body)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string().replace(&self.api_key, "***")))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let response_text = response.text().await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("❌ API Error response: {}", response_text);
            return Err(GeminiError::Status { status: status.as_u16(), body: response_text });
        }

        // Truncate base64 image data for cleaner logging
        let truncated_response = if response_text.len() > 1000 {
            match serde_json::from_str::<Value>(&response_text) {
                Ok(mut json_value) => {
                    truncate_base64_in_json(&mut json_value);
                    serde_json::to_string(&json_value).unwrap_or_default()
                }
                Err(_) => preview(&response_text),
            }
        } else {
            response_text.clone()
        };
        info!("📥 Raw Gemini API response: {}", truncated_response);

        serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Decode(format!("response envelope: {}", e)))
    }
}

fn request_parts(prompt: &str, source: Option<&InlineImage>) -> Vec<Value> {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = source {
        parts.push(json!({ "inlineData": { "mimeType": image.mime_type, "data": image.data } }));
    }
    parts.push(json!({ "text": prompt }));
    parts
}

pub(crate) fn image_request_body(request: &ImageRequest) -> Value {
    json!({
        "contents": [{ "parts": request_parts(&request.prompt, request.source.as_ref()) }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": { "aspectRatio": request.aspect_ratio },
            "candidateCount": 1
        }
    })
}

pub(crate) fn structured_request_body(request: &StructuredRequest) -> Value {
    json!({
        "contents": [{ "parts": request_parts(&request.prompt, request.source.as_ref()) }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema,
            "candidateCount": 1
        }
    })
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Option<String>, GeminiError> {
        info!("🎨 Generating image with {} (aspect {}, edit: {})", self.image_model, request.aspect_ratio, request.source.is_some());
        let parsed = self.perform_api_call(&self.image_model, &image_request_body(request)).await?;

        match extract_first_image(&parsed) {
            Some(image) => {
                let uri = image.to_data_uri();
                info!("🖼️ Extracted {} image from API response: {}", image.mime_type, preview(&image.data));
                Ok(Some(uri))
            }
            None => {
                warn!("⚠️ No image data found in API response");
                Ok(None)
            }
        }
    }

    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String, GeminiError> {
        info!("🧾 Generating structured JSON with {}", self.text_model);
        let parsed = self.perform_api_call(&self.text_model, &structured_request_body(request)).await?;
        let text = extract_text(&parsed);
        info!("✅ Structured response received ({} chars)", text.len());
        Ok(text)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData
    },
    Text { text: String },
    #[allow(dead_code)]
    Other(Value)
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
    #[serde(rename = "mimeType", default = "default_mime")]
    mime_type: String,
}

fn default_mime() -> String { "image/png".to_string() }

pub(crate) fn extract_first_image(resp: &GeminiResponse) -> Option<InlineImage> {
    // Only the first candidate is considered; candidateCount is pinned to 1.
    let candidate = resp.candidates.first()?;
    candidate.content.parts.iter().find_map(|p| match p {
        Part::Inline { inline_data } => Some(InlineImage {
            mime_type: inline_data.mime_type.clone(),
            data: inline_data.data.clone(),
        }),
        _ => None,
    })
}

pub(crate) fn extract_text(resp: &GeminiResponse) -> String {
    let Some(candidate) = resp.candidates.first() else { return String::new() };
    candidate.content.parts.iter()
        .filter_map(|p| match p { Part::Text { text } => Some(text.as_str()), _ => None })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn envelope(raw: &str) -> GeminiResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn rejects_blank_credentials_before_any_request() {
        assert!(matches!(GeminiClient::new("", "http://unused"), Err(GeminiError::MissingCredential)));
        assert!(matches!(GeminiClient::new(" \t\n", "http://unused"), Err(GeminiError::MissingCredential)));
        assert!(GeminiClient::new("key", "http://unused").is_ok());
    }

    #[test]
    fn extracts_first_inline_image_with_mime_type() {
        let resp = envelope(r#"{"candidates":[{"content":{"parts":[
            {"text":"Here is your room"},
            {"inlineData":{"mimeType":"image/jpeg","data":"/9j/AAAA"}}
        ]}}]}"#);
        let image = extract_first_image(&resp).unwrap();
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,/9j/AAAA");
    }

    #[test]
    fn missing_image_is_none_not_error() {
        let resp = envelope(r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#);
        assert!(extract_first_image(&resp).is_none());
        assert!(extract_first_image(&envelope("{}")).is_none());
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let resp = envelope(r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#);
        assert_eq!(extract_text(&resp), "{\"a\":1}");
        assert_eq!(extract_text(&envelope(r#"{"candidates":[]}"#)), "");
    }

    #[test]
    fn request_bodies_put_source_image_before_prompt() {
        let body = structured_request_body(&StructuredRequest {
            prompt: "analyze".into(),
            source: Some(InlineImage { mime_type: "image/png".into(), data: "AAAA".into() }),
            schema: json!({"type": "OBJECT"}),
        });
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["text"], "analyze");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let body = image_request_body(&ImageRequest { prompt: "render".into(), source: None, aspect_ratio: "16:9" });
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "16:9");
    }

    #[test]
    fn truncates_long_base64_for_logs() {
        let long = "A".repeat(200);
        let mut value = json!({"parts": [{"inlineData": {"data": long}}]});
        truncate_base64_in_json(&mut value);
        let data = value["parts"][0]["inlineData"]["data"].as_str().unwrap();
        assert!(data.ends_with("[truncated 150 chars]"));
    }
}
