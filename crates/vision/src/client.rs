//! HTTP client for the vision model API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;

use crate::{
    parse_car_details, CarDetails, ImageSearchParams, VisionError, VisionResult,
    EXTRACTION_PROMPT,
};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for extraction.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Client for a Gemini-style `generateContent` vision endpoint.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for VisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl VisionClient {
    /// Creates a new client with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Sets the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL (used by tests against a local stub).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sends the image and the fixed extraction prompt to the model and
    /// returns the raw candidate text.
    async fn generate(&self, image: &[u8], mime_type: &str) -> VisionResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": STANDARD.encode(image),
                        }
                    },
                    { "text": EXTRACTION_PROMPT },
                ]
            }]
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or(VisionError::EmptyResponse)
    }

    /// Extracts structured car details from an image.
    pub async fn extract_car_details(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> VisionResult<CarDetails> {
        let text = self.generate(image, mime_type).await?;
        let details = parse_car_details(&text)?;

        tracing::debug!(
            make = %details.make,
            model = %details.model,
            confidence = details.confidence,
            "Extracted car details from image"
        );

        Ok(details)
    }

    /// Extracts the reduced filter set used for image-based catalog search.
    pub async fn image_search_params(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> VisionResult<ImageSearchParams> {
        let details = self.extract_car_details(image, mime_type).await?;
        Ok(ImageSearchParams::from(&details))
    }
}
