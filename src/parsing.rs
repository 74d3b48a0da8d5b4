//! Typed parsing of the service's JSON payloads and of user-supplied images.

use crate::gemini::InlineImage;
use crate::models::{AnalysisResult, FurnitureListResponse};
use base64::Engine;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("service returned an empty payload")]
    EmptyPayload,
    #[error("payload is not valid JSON for the expected shape: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload violates the response contract: {0}")]
    Contract(String),
    #[error("invalid source image: {0}")]
    InvalidImage(String),
}

fn contract(msg: impl Into<String>) -> ParseError { ParseError::Contract(msg.into()) }

/// Drops a surrounding ```json fence if the model added one anyway.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else { return trimmed };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ParseError::EmptyPayload);
    }
    Ok(serde_json::from_str(body)?)
}

fn check_price(label: &str, value: f64) -> Result<(), ParseError> {
    if !value.is_finite() || value < 0.0 {
        return Err(contract(format!("{label} must be a non-negative number, got {value}")));
    }
    Ok(())
}

pub fn parse_furniture_list(raw: &str) -> Result<FurnitureListResponse, ParseError> {
    let list: FurnitureListResponse = parse_payload(raw)?;

    if list.items.is_empty() {
        return Err(contract("furniture list has no items"));
    }
    check_price("totalMinCost", list.total_min_cost)?;
    check_price("totalEstimatedCost", list.total_estimated_cost)?;
    check_price("totalMaxCost", list.total_max_cost)?;
    if !(list.total_min_cost <= list.total_estimated_cost && list.total_estimated_cost <= list.total_max_cost) {
        return Err(contract(format!(
            "total costs out of order: min={} estimated={} max={}",
            list.total_min_cost, list.total_estimated_cost, list.total_max_cost
        )));
    }
    for (idx, item) in list.items.iter().enumerate() {
        check_price(&format!("items[{idx}].priceMin"), item.price_min)?;
        check_price(&format!("items[{idx}].priceMax"), item.price_max)?;
        check_price(&format!("items[{idx}].estimatedPrice"), item.estimated_price)?;
        if item.price_min > item.price_max {
            return Err(contract(format!("items[{idx}] ({}) has priceMin above priceMax", item.name)));
        }
    }
    Ok(list)
}

fn is_hex_color(hex: &str) -> bool {
    let Some(digits) = hex.strip_prefix('#') else { return false };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ParseError> {
    let analysis: AnalysisResult = parse_payload(raw)?;

    if analysis.detected_objects.is_empty() && analysis.suggestions.is_empty() {
        return Err(contract("analysis contains neither objects nor suggestions"));
    }
    for obj in &analysis.detected_objects {
        if !(0.0..=1.0).contains(&obj.confidence) {
            return Err(contract(format!("confidence for {} outside [0,1]: {}", obj.name, obj.confidence)));
        }
    }
    for color in &analysis.color_palette {
        if !is_hex_color(&color.hex) {
            return Err(contract(format!("color {} has invalid hex {:?}", color.name, color.hex)));
        }
    }
    Ok(analysis)
}

/// Accepts `data:<mime>;base64,<data>` or bare base64. Bare input has its type sniffed.
pub fn parse_source_image(input: &str) -> Result<InlineImage, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::InvalidImage("no image supplied".into()));
    }

    let (declared_mime, data) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (mime, data) = rest
                .split_once(";base64,")
                .ok_or_else(|| ParseError::InvalidImage("data URI is not base64 encoded".into()))?;
            if !mime.starts_with("image/") {
                return Err(ParseError::InvalidImage(format!("unsupported media type {mime}")));
            }
            (Some(mime.to_string()), data)
        }
        None => (None, input),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| ParseError::InvalidImage(format!("base64: {e}")))?;
    if bytes.is_empty() {
        return Err(ParseError::InvalidImage("image is empty".into()));
    }

    let mime_type = declared_mime.unwrap_or_else(|| {
        image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "image/png".to_string())
    });

    Ok(InlineImage { mime_type, data: data.to_string() })
}
