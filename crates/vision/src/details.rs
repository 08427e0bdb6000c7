//! Extracted car detail shapes and model-output parsing.

use serde::{Deserialize, Serialize};

use crate::{VisionError, VisionResult};

/// Structured car details extracted from an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarDetails {
    /// Manufacturer.
    #[serde(default)]
    pub make: String,
    /// Model name.
    #[serde(default)]
    pub model: String,
    /// Model year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Exterior color.
    #[serde(default)]
    pub color: String,
    /// Body type (SUV, Sedan, Hatchback, ...).
    #[serde(default, alias = "bodyType")]
    pub body_type: String,
    /// Fuel type best guess.
    #[serde(default, alias = "fuelType")]
    pub fuel_type: String,
    /// Transmission best guess.
    #[serde(default)]
    pub transmission: String,
    /// Estimated price.
    #[serde(default)]
    pub price: Option<f64>,
    /// Estimated mileage.
    #[serde(default)]
    pub mileage: Option<i32>,
    /// Short marketing description.
    #[serde(default)]
    pub description: String,
    /// Model's confidence in the identification, 0.0 to 1.0.
    #[serde(default)]
    pub confidence: f64,
}

/// Catalog filter parameters derived from an image, for image search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSearchParams {
    /// Detected make, if any.
    pub make: Option<String>,
    /// Detected body type, if any.
    pub body_type: Option<String>,
    /// Detected color, if any.
    pub color: Option<String>,
}

impl From<&CarDetails> for ImageSearchParams {
    fn from(details: &CarDetails) -> Self {
        let non_empty = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Self {
            make: non_empty(&details.make),
            body_type: non_empty(&details.body_type),
            color: non_empty(&details.color),
        }
    }
}

/// Fixed instruction sent alongside the image.
pub const EXTRACTION_PROMPT: &str = "\
Analyze this car image and extract the following information about the car. \
Respond with only a JSON object, no other text, using exactly these fields: \
make (string), model (string), year (number), color (string), \
bodyType (string), fuelType (string, best guess), transmission (string, best guess), \
price (number, estimated market price in USD), mileage (number, estimated), \
description (string, a short marketing description), \
confidence (number between 0 and 1 for how certain you are of the identification). \
If a field cannot be determined, use an empty string or null.";

/// Parses the model's text output into [`CarDetails`].
///
/// Models frequently wrap JSON in markdown code fences despite instructions;
/// fences are stripped before parsing.
pub fn parse_car_details(text: &str) -> VisionResult<CarDetails> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|e| VisionError::Parse(e.to_string()))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag ("json") after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "make": "Tesla",
        "model": "Model 3",
        "year": 2022,
        "color": "Red",
        "bodyType": "Sedan",
        "fuelType": "Electric",
        "transmission": "Automatic",
        "price": 30000,
        "mileage": 8000,
        "description": "A sleek electric sedan.",
        "confidence": 0.92
    }"#;

    #[test]
    fn test_parse_clean_json() {
        let details = parse_car_details(SAMPLE).unwrap();
        assert_eq!(details.make, "Tesla");
        assert_eq!(details.year, Some(2022));
        assert_eq!(details.body_type, "Sedan");
        assert!(details.confidence > 0.9);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{SAMPLE}\n```");
        let details = parse_car_details(&fenced).unwrap();
        assert_eq!(details.model, "Model 3");

        let fenced_no_tag = format!("```\n{SAMPLE}\n```");
        assert!(parse_car_details(&fenced_no_tag).is_ok());
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_car_details("I see a red car, probably a Tesla.").unwrap_err();
        assert!(matches!(err, VisionError::Parse(_)));
    }

    #[test]
    fn test_missing_fields_default() {
        let details = parse_car_details(r#"{"make": "BMW"}"#).unwrap();
        assert_eq!(details.make, "BMW");
        assert_eq!(details.year, None);
        assert_eq!(details.confidence, 0.0);
    }

    #[test]
    fn test_search_params_skip_empty() {
        let details = parse_car_details(r#"{"make": "BMW", "color": "  "}"#).unwrap();
        let params = ImageSearchParams::from(&details);
        assert_eq!(params.make.as_deref(), Some("BMW"));
        assert!(params.color.is_none());
        assert!(params.body_type.is_none());
    }
}
