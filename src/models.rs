use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn default_budget() -> String { "经济型".to_string() }
fn default_style() -> String { "现代简约".to_string() }

/// Room parameters submitted from the design form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignRequest {
    pub layout: String,        // e.g. 两室一厅
    pub area: f64,             // square meters
    pub orientation: String,   // e.g. 南
    pub style: String,         // e.g. 现代简约
    #[serde(default = "default_budget")]
    pub budget: String,        // e.g. 经济型
}

impl DesignRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.layout.trim().is_empty() { return Err("layout must not be empty".into()); }
        if self.style.trim().is_empty() { return Err("style must not be empty".into()); }
        if self.orientation.trim().is_empty() { return Err("orientation must not be empty".into()); }
        if !self.area.is_finite() || self.area <= 0.0 { return Err(format!("area must be a positive number, got {}", self.area)); }
        Ok(())
    }
}

/// Which physical elements of a room an AR edit may alter.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusArea {
    #[default]
    #[serde(rename = "Overall Room")]
    OverallRoom,
    #[serde(rename = "Walls & Floor")]
    WallsAndFloor,
    #[serde(rename = "Furniture")]
    Furniture,
    #[serde(rename = "Soft Decor")]
    SoftDecor,
}

impl FocusArea {
    pub const ALL: [FocusArea; 4] = [FocusArea::OverallRoom, FocusArea::WallsAndFloor, FocusArea::Furniture, FocusArea::SoftDecor];

    pub fn label(&self) -> &'static str {
        match self {
            FocusArea::OverallRoom => "Overall Room",
            FocusArea::WallsAndFloor => "Walls & Floor",
            FocusArea::Furniture => "Furniture",
            FocusArea::SoftDecor => "Soft Decor",
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            FocusArea::OverallRoom => "整体",
            FocusArea::WallsAndFloor => "墙地",
            FocusArea::Furniture => "家具",
            FocusArea::SoftDecor => "软装",
        }
    }
}

/// Photo-driven makeover request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArRequest {
    pub source_image: String, // data URI or bare base64
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub focus_area: FocusArea,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureItem {
    pub category: String,
    pub name: String,
    pub description: String,
    pub material: String,
    pub dimensions: String,
    pub estimated_price: f64,
    pub price_min: f64,
    pub price_max: f64,
    pub search_query: String,
    pub buying_tip: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureListResponse {
    pub total_estimated_cost: f64,
    pub total_min_cost: f64,
    pub total_max_cost: f64,
    pub currency: String,
    pub items: Vec<FurnitureItem>,
    pub design_advice: String,
}

/// Accumulator for one design-flow cycle. The image lands first, the list second.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignResult {
    pub image_url: Option<String>,
    pub furniture_data: Option<FurnitureListResponse>,
    /// The image step finished, whether or not it produced an image.
    #[serde(default)]
    pub image_settled: bool,
}

impl DesignResult {
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.furniture_data.is_none()
    }

    /// Records the image outcome. Returns false if the image step already settled this cycle.
    pub fn settle_image(&mut self, image_url: Option<String>) -> bool {
        if self.image_settled { return false; }
        self.image_url = image_url;
        self.image_settled = true;
        true
    }

    /// Records the furniture list. Refused until the image step settled, and only once.
    pub fn settle_furniture(&mut self, list: FurnitureListResponse) -> bool {
        if !self.image_settled || self.furniture_data.is_some() { return false; }
        self.furniture_data = Some(list);
        true
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    pub name: String,
    pub current_style: String,
    pub suggestion: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ColorRecommendation {
    pub name: String,
    pub hex: String,
    pub usage: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub suggestions: Vec<String>,
    pub detected_objects: Vec<DetectedObject>,
    pub color_palette: Vec<ColorRecommendation>,
}

/// One completed AR generation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArResult {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub style: String,
    pub focus_area: FocusArea,
    pub original_image: String,
    pub generated_image: Option<String>,
    pub analysis: AnalysisResult,
    /// The analysis is the fixed fallback content.
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn focus_area_uses_display_labels_on_the_wire() {
        let json = serde_json::to_string(&FocusArea::WallsAndFloor).unwrap();
        assert_eq!(json, "\"Walls & Floor\"");
        let parsed: FocusArea = serde_json::from_str("\"Soft Decor\"").unwrap();
        assert_eq!(parsed, FocusArea::SoftDecor);
    }

    #[test]
    fn ar_request_defaults_style_and_focus_area() {
        let req: ArRequest = serde_json::from_str(r#"{"sourceImage":"data:image/png;base64,AA=="}"#).unwrap();
        assert_eq!(req.focus_area, FocusArea::OverallRoom);
        assert_eq!(req.style, "现代简约");
    }

    #[test]
    fn design_request_defaults_budget_and_validates_area() {
        let req: DesignRequest = serde_json::from_str(
            r#"{"layout":"两室一厅","area":90,"orientation":"南","style":"现代简约"}"#,
        ).unwrap();
        assert_eq!(req.budget, "经济型");
        assert!(req.validate().is_ok());

        let bad = DesignRequest { area: 0.0, ..req };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn furniture_cannot_land_before_image_settles() {
        let list = FurnitureListResponse {
            total_estimated_cost: 1.0, total_min_cost: 1.0, total_max_cost: 1.0,
            currency: "CNY".into(), items: vec![], design_advice: String::new(),
        };
        let mut result = DesignResult::default();
        assert!(!result.settle_furniture(list.clone()));
        assert!(result.settle_image(None));
        assert!(!result.settle_image(Some("data:image/png;base64,AA==".into())));
        assert!(result.settle_furniture(list.clone()));
        assert!(!result.settle_furniture(list));
        assert_eq!(result.image_url, None);
    }
}
