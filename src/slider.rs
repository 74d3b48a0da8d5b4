//! Before/after comparison control: pointer tracking and clip math.

use serde::Serialize;

pub const INITIAL_POSITION: f64 = 50.0;
pub const BEFORE_LABEL: &str = "改造前";
pub const AFTER_LABEL: &str = "改造后";

/// Horizontal extent of the slider container in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSlider {
    position: f64,
    dragging: bool,
    rect: Option<ContainerRect>,
}

impl Default for ComparisonSlider {
    fn default() -> Self {
        Self { position: INITIAL_POSITION, dragging: false, rect: None }
    }
}

/// Clamps a percentage into [0, 100]. Values inside the range pass through unchanged.
pub fn clamp_position(percent: f64) -> f64 {
    if percent.is_nan() {
        return INITIAL_POSITION;
    }
    percent.clamp(0.0, 100.0)
}

impl ComparisonSlider {
    pub fn new() -> Self { Self::default() }

    pub fn position(&self) -> f64 { self.position }

    pub fn is_dragging(&self) -> bool { self.dragging }

    /// Called on mount and on resize.
    pub fn set_container(&mut self, rect: ContainerRect) {
        self.rect = Some(rect);
    }

    pub fn set_position(&mut self, percent: f64) {
        self.position = clamp_position(percent);
    }

    /// Mouse or touch press inside the component.
    pub fn press(&mut self) {
        self.dragging = true;
    }

    /// Release anywhere in the document ends the drag.
    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Mouse movement only tracks while a drag is active.
    pub fn move_pointer(&mut self, client_x: f64) {
        if self.dragging {
            self.track(client_x);
        }
    }

    /// Touch movement always tracks.
    pub fn touch_move(&mut self, client_x: f64) {
        self.track(client_x);
    }

    fn track(&mut self, client_x: f64) {
        // Without a measured container there is nothing to map the pointer onto.
        let Some(rect) = self.rect else { return };
        if rect.width <= 0.0 {
            return;
        }
        self.set_position((client_x - rect.left) / rect.width * 100.0);
    }

    /// CSS clip-path for the "before" image: visible left of the handle.
    pub fn clip_path(&self) -> String {
        format!("inset(0 {}% 0 0)", 100.0 - self.position)
    }

    pub fn handle_offset(&self) -> String {
        format!("{}%", self.position)
    }

    pub fn before_label_opacity(&self) -> f64 {
        if self.position < 10.0 { 0.0 } else { 1.0 }
    }

    pub fn show_hint(&self) -> bool {
        !self.dragging && self.position == INITIAL_POSITION
    }

    pub fn view<'a>(&self, before: &'a str, after: Option<&'a str>) -> SliderView<'a> {
        SliderView {
            before_image: before,
            // Fall back to the original so the revealed side is never blank.
            after_image: after.unwrap_or(before),
            clip_path: self.clip_path(),
            handle_left: self.handle_offset(),
            before_label_opacity: self.before_label_opacity(),
            show_hint: self.show_hint(),
            before_label: BEFORE_LABEL,
            after_label: AFTER_LABEL,
        }
    }
}

/// Everything the view needs to draw the slider.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SliderView<'a> {
    pub before_image: &'a str,
    pub after_image: &'a str,
    pub clip_path: String,
    pub handle_left: String,
    pub before_label_opacity: f64,
    pub show_hint: bool,
    pub before_label: &'static str,
    pub after_label: &'static str,
}
