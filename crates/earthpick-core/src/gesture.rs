//! Click-vs-drag discrimination for pointer gestures.

use glam::Vec2;

/// Thresholds that separate a click from a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickSettings {
    /// Longest press, in milliseconds, that still counts as a click.
    pub click_timeout_ms: f64,
    /// Largest pointer travel, in canvas pixels, that still counts as a click.
    pub drag_threshold_px: f32,
}

impl Default for PickSettings {
    fn default() -> Self {
        Self {
            click_timeout_ms: 200.0,
            drag_threshold_px: 5.0,
        }
    }
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// A click at the release position; resolve it.
    Click(Vec2),
    /// Held too long or moved too far.
    Drag,
    /// Released without a recorded press.
    Unarmed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PointerSample {
    time_ms: f64,
    position: Vec2,
}

/// Tracks the last pointer-down so the matching pointer-up can be classified.
#[derive(Debug, Clone, Default)]
pub struct ClickGesture {
    start: Option<PointerSample>,
}

impl ClickGesture {
    /// Record a pointer-down, arming the gesture.
    pub fn press(&mut self, time_ms: f64, position: Vec2) {
        self.start = Some(PointerSample { time_ms, position });
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.start.is_some()
    }

    /// Classify a pointer-up against the recorded press and disarm.
    pub fn release(
        &mut self,
        time_ms: f64,
        position: Vec2,
        settings: &PickSettings,
    ) -> GestureOutcome {
        let Some(start) = self.start.take() else {
            return GestureOutcome::Unarmed;
        };

        if time_ms - start.time_ms > settings.click_timeout_ms {
            return GestureOutcome::Drag;
        }

        let max_move_sq = settings.drag_threshold_px * settings.drag_threshold_px;
        if start.position.distance_squared(position) > max_move_sq {
            return GestureOutcome::Drag;
        }

        GestureOutcome::Click(position)
    }
}
