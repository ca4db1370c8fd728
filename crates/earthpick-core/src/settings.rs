//! Control panel state.
//!
//! The panel never writes into scene objects. It emits [`PanelChange`]
//! events and [`ViewSettings::reduce`] folds each one into a new settings
//! value, which the viewer then projects onto the scene.

/// Presentation toggles exposed by the control panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    /// Cloud spin in radians per frame while auto-rotating.
    pub cloud_rotation_speed: f32,
    pub auto_rotate: bool,
    /// Depth of the Earth's elevation height map.
    pub bump_scale: f32,
    pub view_clouds: bool,
    /// Swap the Earth's color texture for the alternate one.
    pub reverse_color: bool,
    pub directional_light: bool,
    pub ambient_light: bool,
    /// Show the palette-shaded picking globe instead of the photo globe.
    pub picking_mode: bool,
    /// Show the detail overlay.
    pub detail_mode: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            cloud_rotation_speed: 0.001,
            auto_rotate: false,
            bump_scale: 0.02,
            view_clouds: true,
            reverse_color: false,
            directional_light: true,
            ambient_light: false,
            picking_mode: false,
            detail_mode: false,
        }
    }
}

/// A single edit made in the control panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelChange {
    CloudRotationSpeed(f32),
    AutoRotate(bool),
    BumpScale(f32),
    ViewClouds(bool),
    ReverseColor(bool),
    DirectionalLight(bool),
    AmbientLight(bool),
    PickingMode(bool),
    DetailMode(bool),
}

impl ViewSettings {
    pub const MAX_CLOUD_ROTATION_SPEED: f32 = 0.1;
    pub const MAX_BUMP_SCALE: f32 = 0.2;

    /// Apply one panel change, returning the new settings.
    #[must_use]
    pub fn reduce(self, change: PanelChange) -> Self {
        match change {
            PanelChange::CloudRotationSpeed(speed) => Self {
                cloud_rotation_speed: clamp_finite(speed, Self::MAX_CLOUD_ROTATION_SPEED),
                ..self
            },
            PanelChange::AutoRotate(auto_rotate) => Self {
                auto_rotate,
                ..self
            },
            PanelChange::BumpScale(scale) => Self {
                bump_scale: clamp_finite(scale, Self::MAX_BUMP_SCALE),
                ..self
            },
            PanelChange::ViewClouds(view_clouds) => Self {
                view_clouds,
                ..self
            },
            PanelChange::ReverseColor(reverse_color) => Self {
                reverse_color,
                ..self
            },
            PanelChange::DirectionalLight(directional_light) => Self {
                directional_light,
                ..self
            },
            PanelChange::AmbientLight(ambient_light) => Self {
                ambient_light,
                ..self
            },
            // Clouds would hide the palette, so picking mode turns them off.
            PanelChange::PickingMode(picking_mode) => Self {
                picking_mode,
                view_clouds: !picking_mode,
                ..self
            },
            PanelChange::DetailMode(detail_mode) => Self {
                detail_mode,
                ..self
            },
        }
    }

    /// Whether the orbit controls accept user input.
    #[must_use]
    pub fn orbit_enabled(&self) -> bool {
        !self.auto_rotate
    }

    /// Cloud spin to apply this frame.
    #[must_use]
    pub fn cloud_spin(&self) -> f32 {
        if self.auto_rotate {
            self.cloud_rotation_speed
        } else {
            0.0
        }
    }
}

fn clamp_finite(value: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picking_mode_hides_and_restores_clouds() {
        let settings = ViewSettings::default().reduce(PanelChange::PickingMode(true));
        assert!(settings.picking_mode);
        assert!(!settings.view_clouds);

        let settings = settings.reduce(PanelChange::PickingMode(false));
        assert!(!settings.picking_mode);
        assert!(settings.view_clouds);
    }

    #[test]
    fn sliders_are_clamped() {
        let settings = ViewSettings::default()
            .reduce(PanelChange::CloudRotationSpeed(3.0))
            .reduce(PanelChange::BumpScale(-1.0));
        assert!((settings.cloud_rotation_speed - 0.1).abs() < f32::EPSILON);
        assert!(settings.bump_scale.abs() < f32::EPSILON);

        let settings = settings.reduce(PanelChange::BumpScale(f32::NAN));
        assert!(settings.bump_scale.abs() < f32::EPSILON);
    }

    #[test]
    fn auto_rotate_disables_orbit_and_spins_clouds() {
        let idle = ViewSettings::default();
        assert!(idle.orbit_enabled());
        assert!(idle.cloud_spin().abs() < f32::EPSILON);

        let rotating = idle.reduce(PanelChange::AutoRotate(true));
        assert!(!rotating.orbit_enabled());
        assert!((rotating.cloud_spin() - 0.001).abs() < f32::EPSILON);
    }

    #[test]
    fn changes_touch_only_their_field() {
        let base = ViewSettings::default();
        let changed = base.reduce(PanelChange::AmbientLight(true));
        assert_eq!(
            changed,
            ViewSettings {
                ambient_light: true,
                ..base
            }
        );
    }
}
