//! Capability calls: request fields in, typed domain objects out.

use tracing::{info, warn, error};

use crate::{
    error::FlowError,
    gemini::{preview, GenerativeService, ImageRequest, InlineImage, StructuredRequest},
    models::{AnalysisResult, ColorRecommendation, DesignRequest, DetectedObject, FocusArea, FurnitureListResponse},
    parsing::{parse_analysis, parse_furniture_list},
    prompts,
};

/// Renders the design image. `Ok(None)` means the service answered without an image.
pub async fn render_design(service: &dyn GenerativeService, req: &DesignRequest) -> Result<Option<String>, FlowError> {
    let prompt = prompts::design_image_prompt(req);
    info!("🎯 Rendering design ({} / {} / {}㎡)", req.style, req.layout, req.area);
    let image = service
        .generate_image(&ImageRequest { prompt, source: None, aspect_ratio: prompts::DESIGN_ASPECT_RATIO })
        .await?;
    match &image {
        Some(uri) => info!("✅ Design image ready: {}", preview(uri)),
        None => warn!("⚠️ Design image unavailable, continuing without it"),
    }
    Ok(image)
}

pub async fn furniture_list(service: &dyn GenerativeService, req: &DesignRequest) -> Result<FurnitureListResponse, FlowError> {
    let request = StructuredRequest {
        prompt: prompts::furniture_list_prompt(req),
        source: None,
        schema: prompts::furniture_list_schema(),
    };
    let raw = service.generate_structured(&request).await?;
    let list = parse_furniture_list(&raw)?;
    info!("✅ Furniture list ready: {} items, {} {}", list.items.len(), list.currency, list.total_estimated_cost);
    Ok(list)
}

/// Edits the uploaded photo. Failures propagate; a missing image is `Ok(None)`.
pub async fn renovate_room(
    service: &dyn GenerativeService,
    source: &InlineImage,
    style: &str,
    area: FocusArea,
) -> Result<Option<String>, FlowError> {
    let request = ImageRequest {
        prompt: prompts::renovation_prompt(style, area),
        source: Some(source.clone()),
        aspect_ratio: prompts::RENOVATION_ASPECT_RATIO,
    };
    info!("🎯 Renovating room ({} / {})", style, area.label());
    Ok(service.generate_image(&request).await?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub analysis: AnalysisResult,
    pub degraded: bool,
}

/// Analyzes the photo. Never fails: any error yields the fixed fallback analysis.
pub async fn analyze_room(
    service: &dyn GenerativeService,
    source: &InlineImage,
    style: &str,
    area: FocusArea,
) -> AnalysisOutcome {
    let request = StructuredRequest {
        prompt: prompts::analysis_prompt(style, area),
        source: Some(source.clone()),
        schema: prompts::analysis_schema(),
    };
    let result = match service.generate_structured(&request).await {
        Ok(raw) => parse_analysis(&raw).map_err(FlowError::from),
        Err(e) => Err(FlowError::from(e)),
    };
    match result {
        Ok(analysis) => {
            info!("✅ Room analysis ready: {} objects, {} colors", analysis.detected_objects.len(), analysis.color_palette.len());
            AnalysisOutcome { analysis, degraded: false }
        }
        Err(e) => {
            error!("❌ Room analysis failed: {}", e);
            info!("🔄 Falling back to generic analysis");
            AnalysisOutcome { analysis: fallback_analysis(), degraded: true }
        }
    }
}

pub fn fallback_analysis() -> AnalysisResult {
    let color = |name: &str, hex: &str, usage: &str| ColorRecommendation {
        name: name.to_string(),
        hex: hex.to_string(),
        usage: usage.to_string(),
    };
    AnalysisResult {
        suggestions: vec![
            "Improve lighting".to_string(),
            "Change wall color".to_string(),
            "Update furniture".to_string(),
        ],
        detected_objects: vec![DetectedObject {
            name: "Furniture".to_string(),
            current_style: "Old".to_string(),
            suggestion: "Replace".to_string(),
            confidence: 0.8,
        }],
        color_palette: vec![
            color("White", "#FFFFFF", "Wall"),
            color("Grey", "#CCCCCC", "Floor"),
            color("Blue", "#0000FF", "Accent"),
            color("Wood", "#8B4513", "Furniture"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiError;
    use crate::testing::ScriptedService;
    use pretty_assertions::assert_eq;

    fn photo() -> InlineImage {
        InlineImage { mime_type: "image/jpeg".into(), data: "/9j/4AAQ".into() }
    }

    #[tokio::test]
    async fn analysis_failures_degrade_to_the_same_fallback() {
        let service = ScriptedService::new()
            .with_structured(Err(GeminiError::Http("down".into())))
            .with_structured(Ok("not json".into()));

        let first = analyze_room(&service, &photo(), "北欧风格", FocusArea::Furniture).await;
        let second = analyze_room(&service, &photo(), "北欧风格", FocusArea::Furniture).await;
        assert!(first.degraded && second.degraded);
        assert_eq!(first.analysis, second.analysis);
        assert_eq!(first.analysis, fallback_analysis());
    }

    #[tokio::test]
    async fn image_edit_propagates_failures() {
        let service = ScriptedService::new().with_image(Err(GeminiError::Http("down".into())));
        let err = renovate_room(&service, &photo(), "北欧风格", FocusArea::WallsAndFloor).await.unwrap_err();
        assert!(matches!(err, FlowError::Generation(_)));
        let sent = service.image_requests();
        assert_eq!(sent[0].source, Some(photo()));
        assert!(sent[0].prompt.contains("Walls & Floor"));
    }

    #[tokio::test]
    async fn empty_list_payload_is_a_parse_error() {
        let service = ScriptedService::new().with_structured(Ok(String::new()));
        let req = DesignRequest {
            layout: "一室一厅".into(), area: 40.0, orientation: "北".into(),
            style: "日式原木".into(), budget: "经济型".into(),
        };
        let err = furniture_list(&service, &req).await.unwrap_err();
        assert!(matches!(err, FlowError::Parse(crate::parsing::ParseError::EmptyPayload)));
    }
}
