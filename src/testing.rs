//! Scripted `GenerativeService` for unit tests.

use std::{collections::VecDeque, sync::atomic::{AtomicUsize, Ordering}, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::gemini::{GeminiError, GenerativeService, ImageRequest, StructuredRequest};

pub const SAMPLE_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAA";
pub const SAMPLE_PHOTO: &str = "data:image/jpeg;base64,/9j/4AAQ";

pub const SAMPLE_LIST: &str = r#"{
    "totalEstimatedCost": 9800, "totalMinCost": 7000, "totalMaxCost": 14000,
    "currency": "CNY", "designAdvice": "以白色和原木色为主，保持通透。",
    "items": [
        {"category": "客厅", "name": "布艺沙发", "description": "三人位", "material": "棉麻",
         "dimensions": "210x90x85cm", "estimatedPrice": 5800, "priceMin": 4000, "priceMax": 8000,
         "searchQuery": "现代简约布艺沙发 三人位", "buyingTip": "关注618大促"},
        {"category": "餐厅", "name": "实木餐桌", "description": "四人位", "material": "白橡木",
         "dimensions": "140x80x75cm", "estimatedPrice": 4000, "priceMin": 3000, "priceMax": 6000,
         "searchQuery": "白橡木餐桌 四人", "buyingTip": "选择工厂直营店"}
    ]
}"#;

pub const SAMPLE_ANALYSIS: &str = r##"{
    "suggestions": ["更换窗帘", "墙面刷浅灰色", "增加落地灯"],
    "detectedObjects": [
        {"name": "Sofa", "currentStyle": "深色皮质", "suggestion": "换成浅色布艺", "confidence": 0.92},
        {"name": "Curtain", "currentStyle": "厚重花纹", "suggestion": "换成亚麻纱帘", "confidence": 0.81},
        {"name": "Rug", "currentStyle": "无", "suggestion": "增加几何地毯", "confidence": 0.55}
    ],
    "colorPalette": [
        {"name": "Warm White", "hex": "#F5F1EA", "usage": "Wall"},
        {"name": "Oak", "hex": "#C8A27A", "usage": "Floor"},
        {"name": "Sage", "hex": "#9CAF88", "usage": "Accent"},
        {"name": "Charcoal", "hex": "#333333", "usage": "Furniture"}
    ]
}"##;

type Scripted<T> = (Duration, Result<T, GeminiError>);

#[derive(Default)]
pub struct ScriptedService {
    images: Mutex<VecDeque<Scripted<Option<String>>>>,
    structured: Mutex<VecDeque<Scripted<String>>>,
    image_log: Mutex<Vec<ImageRequest>>,
    structured_log: Mutex<Vec<StructuredRequest>>,
    image_calls: AtomicUsize,
    structured_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Self { Self::default() }

    pub fn with_image(self, result: Result<Option<String>, GeminiError>) -> Self {
        self.with_image_after(Duration::ZERO, result)
    }

    pub fn with_image_after(self, delay: Duration, result: Result<Option<String>, GeminiError>) -> Self {
        self.images.lock().push_back((delay, result));
        self
    }

    pub fn with_structured(self, result: Result<String, GeminiError>) -> Self {
        self.with_structured_after(Duration::ZERO, result)
    }

    pub fn with_structured_after(self, delay: Duration, result: Result<String, GeminiError>) -> Self {
        self.structured.lock().push_back((delay, result));
        self
    }

    pub fn image_calls(&self) -> usize { self.image_calls.load(Ordering::SeqCst) }

    pub fn structured_calls(&self) -> usize { self.structured_calls.load(Ordering::SeqCst) }

    pub fn image_requests(&self) -> Vec<ImageRequest> { self.image_log.lock().clone() }

    pub fn structured_requests(&self) -> Vec<StructuredRequest> { self.structured_log.lock().clone() }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn generate_image(&self, request: &ImageRequest) -> Result<Option<String>, GeminiError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image_log.lock().push(request.clone());
        let next = self.images.lock().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Err(GeminiError::Http("unscripted image call".into()))));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String, GeminiError> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.structured_log.lock().push(request.clone());
        let next = self.structured.lock().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Err(GeminiError::Http("unscripted structured call".into()))));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
