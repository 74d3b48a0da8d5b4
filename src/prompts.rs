//! Deterministic prompt text and response schemas for the generation service.
//!
//! Every builder here is pure: the same request always yields the same prompt,
//! which keeps the remote calls reproducible and testable.

use crate::models::{DesignRequest, FocusArea};
use serde_json::{json, Value};

pub const DESIGN_ASPECT_RATIO: &str = "16:9";
pub const RENOVATION_ASPECT_RATIO: &str = "4:3";

pub fn design_image_prompt(req: &DesignRequest) -> String {
    format!(
        "Professional interior design architectural render.\n\
         Style: {style}.\n\
         Layout: {layout}.\n\
         Room Size: {area} square meters.\n\
         Lighting/Orientation: Natural light coming from the {orientation}.\n\
         Atmosphere: Photorealistic, high quality, 8k resolution, cozy, modern furniture placement, detailed textures.\n\
         View: Wide angle shot showing the main living area.",
        style = req.style,
        layout = req.layout,
        area = req.area,
        orientation = req.orientation,
    )
}

pub fn furniture_list_prompt(req: &DesignRequest) -> String {
    format!(
        "You are an expert interior cost estimator.\n\
         Generate a furniture shopping list for: {style} style, {layout}, {area} sqm, budget tier {budget}.\n\n\
         Goal: Smart Budgeting. Provide a price range (Min/Max) for each item to help with price comparison.\n\n\
         Output JSON with:\n\
         1. List of items.\n\
         2. For each item:\n\
            - priceMin: Low end market price (CNY)\n\
            - priceMax: High end market price (CNY)\n\
            - estimatedPrice: Average price (CNY), between priceMin and priceMax\n\
            - searchQuery: Specific search term to find this item online (e.g. \"北欧极简布艺沙发 米白色\")\n\
         3. Total costs calculated: totalMinCost, totalEstimatedCost and totalMaxCost are the sums of the item prices.",
        style = req.style,
        layout = req.layout,
        area = req.area,
        budget = req.budget,
    )
}

/// Fixed instruction per focus area, each limiting which parts of the room may change.
pub fn focus_instruction(area: FocusArea) -> &'static str {
    match area {
        FocusArea::OverallRoom => "Redesign the whole room: walls, floor, furniture and soft decor may all change. Keep windows, doors, ceiling height and the camera viewpoint exactly as in the photo.",
        FocusArea::WallsAndFloor => "Only change wall finishes, paint colors and flooring materials. Keep every piece of furniture, every decor item, all windows and doors, and the camera viewpoint exactly as they are.",
        FocusArea::Furniture => "Only replace or restyle the furniture pieces (sofas, tables, chairs, beds, cabinets). Keep walls, floor, windows, doors, lighting fixtures and soft decor unchanged.",
        FocusArea::SoftDecor => "Only change soft furnishings and decor: curtains, rugs, cushions, throws, plants, artwork and lamps. Keep walls, floor, furniture, windows and doors unchanged.",
    }
}

pub fn renovation_prompt(style: &str, area: FocusArea) -> String {
    format!(
        "Renovate this room interior.\n\
         Target Style: {style}.\n\
         Focus Area: {label}.\n\
         Instructions:\n\
         1. Keep structural elements.\n\
         2. {instruction}\n\
         3. Redecorate the focus area to match {style}.\n\
         4. High quality photorealistic render.",
        label = area.label(),
        instruction = focus_instruction(area),
    )
}

pub fn analysis_prompt(style: &str, area: FocusArea) -> String {
    format!(
        "Analyze this room image for a renovation project to {style} style, focusing on: {label}.\n\n\
         Tasks:\n\
         1. Element Recognition: Identify 3-5 existing furniture/decor items in the image. For each, state what it is, \
         its current look, how to change it, and a confidence score between 0 and 1.\n\
         2. Suggestions: 3 renovation steps.\n\
         3. Colors: a 4-5 color palette with hex codes and where to use each color.\n\n\
         Return JSON.",
        label = area.label(),
    )
}

pub fn furniture_list_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "totalEstimatedCost": { "type": "NUMBER", "description": "Sum of average prices" },
            "totalMinCost": { "type": "NUMBER", "description": "Sum of min prices" },
            "totalMaxCost": { "type": "NUMBER", "description": "Sum of max prices" },
            "currency": { "type": "STRING", "description": "CNY" },
            "designAdvice": { "type": "STRING" },
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING" },
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "material": { "type": "STRING" },
                        "dimensions": { "type": "STRING" },
                        "estimatedPrice": { "type": "NUMBER" },
                        "priceMin": { "type": "NUMBER", "description": "Lower bound price" },
                        "priceMax": { "type": "NUMBER", "description": "Upper bound price" },
                        "searchQuery": { "type": "STRING", "description": "Optimized search keyword" },
                        "buyingTip": { "type": "STRING" }
                    },
                    "required": ["category", "name", "description", "material", "dimensions",
                                 "estimatedPrice", "priceMin", "priceMax", "searchQuery", "buyingTip"]
                }
            }
        },
        "required": ["totalEstimatedCost", "totalMinCost", "totalMaxCost", "currency", "items", "designAdvice"]
    })
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggestions": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "detectedObjects": {
                "type": "ARRAY",
                "description": "List of identified items in the room",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "e.g. Sofa, Curtain" },
                        "currentStyle": { "type": "STRING", "description": "Current condition/style" },
                        "suggestion": { "type": "STRING", "description": "How to replace/renovate it" },
                        "confidence": { "type": "NUMBER", "description": "0.0 to 1.0" }
                    },
                    "required": ["name", "currentStyle", "suggestion", "confidence"]
                }
            },
            "colorPalette": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "hex": { "type": "STRING" },
                        "usage": { "type": "STRING" }
                    },
                    "required": ["name", "hex", "usage"]
                }
            }
        },
        "required": ["suggestions", "colorPalette", "detectedObjects"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DesignRequest {
        DesignRequest {
            layout: "两室一厅".into(),
            area: 90.0,
            orientation: "南".into(),
            style: "现代简约".into(),
            budget: "经济型".into(),
        }
    }

    #[test]
    fn design_prompt_is_deterministic_and_carries_fields() {
        let prompt = design_image_prompt(&sample());
        assert_eq!(prompt, design_image_prompt(&sample()));
        assert!(prompt.contains("Style: 现代简约."));
        assert!(prompt.contains("Layout: 两室一厅."));
        assert!(prompt.contains("Room Size: 90 square meters."));
        assert!(prompt.contains("coming from the 南."));
    }

    #[test]
    fn each_focus_area_has_its_own_instruction() {
        let mut seen = std::collections::HashSet::new();
        for area in FocusArea::ALL {
            assert!(seen.insert(focus_instruction(area)));
            assert!(renovation_prompt("北欧风格", area).contains(focus_instruction(area)));
        }
    }

    #[test]
    fn schemas_require_the_superset_item_fields() {
        let schema = furniture_list_schema();
        let required = schema["properties"]["items"]["items"]["required"].as_array().unwrap();
        for field in ["priceMin", "priceMax", "estimatedPrice", "searchQuery"] {
            assert!(required.iter().any(|v| v == field), "missing {field}");
        }
        assert_eq!(analysis_schema()["required"].as_array().unwrap().len(), 3);
    }
}
