//! Orbit camera controller for inspecting the globe.
//!
//! Drag with the left mouse button to spin around the globe and scroll to
//! zoom. Panning is disabled; the camera always looks at the globe center.
//! While auto-rotate is on the controls ignore input.

use std::f32::consts::FRAC_PI_2;

use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy_egui::input::egui_wants_any_pointer_input;

use crate::scene::SceneSettings;

/// Plugin for orbit camera controls.
pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OrbitSettings>().add_systems(
            Update,
            (
                (
                    orbit_rotate.run_if(left_button_held),
                    orbit_zoom,
                )
                    .run_if(orbit_enabled.and(not(egui_wants_any_pointer_input))),
                apply_orbit_transform,
            )
                .chain()
                .in_set(CameraSystems),
        );
    }
}

/// Systems that move the main camera. Anything projecting through the
/// camera runs after this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraSystems;

/// Settings for the orbit controls and the main camera's lens.
#[derive(Resource, Debug, Clone)]
pub struct OrbitSettings {
    pub min_distance: f32,
    pub max_distance: f32,
    pub start_distance: f32,
    /// Radians of rotation per pixel of mouse travel.
    pub rotate_sensitivity: f32,
    /// Distance factor per scroll line.
    pub zoom_step: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            min_distance: 1.5,
            max_distance: 5.0,
            start_distance: 2.5,
            rotate_sensitivity: 0.005,
            zoom_step: 0.95,
            fov: 45f32.to_radians(),
            near: 0.01,
            far: 500.0,
        }
    }
}

impl OrbitSettings {
    /// OpenGL-style projection matching the main camera, for label placement.
    #[must_use]
    pub fn clip_from_view(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect_ratio, self.near, self.far)
    }

    #[must_use]
    pub fn projection(&self) -> Projection {
        Projection::Perspective(PerspectiveProjection {
            fov: self.fov,
            near: self.near,
            far: self.far,
            ..Default::default()
        })
    }
}

/// Marker for the camera that renders the visible scene.
#[derive(Component)]
pub struct MainCamera;

/// Spherical position of the main camera around the globe center.
#[derive(Component, Debug, Clone, Copy)]
pub struct OrbitCamera {
    /// Rotation around +Y in radians.
    pub yaw: f32,
    /// Elevation above the equator in radians.
    pub pitch: f32,
    pub distance: f32,
}

impl OrbitCamera {
    /// Looking at the globe from +Z.
    #[must_use]
    pub fn new(distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
        }
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0);
        rotation * Vec3::new(0.0, 0.0, self.distance)
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(Vec3::ZERO, Vec3::Y)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn orbit_enabled(settings: Res<SceneSettings>) -> bool {
    settings.0.orbit_enabled()
}

#[allow(clippy::needless_pass_by_value)]
fn left_button_held(mouse: Res<ButtonInput<MouseButton>>) -> bool {
    mouse.pressed(MouseButton::Left)
}

/// Spin the camera around the globe while dragging.
#[allow(clippy::needless_pass_by_value)]
fn orbit_rotate(
    mut mouse_motion: MessageReader<MouseMotion>,
    settings: Res<OrbitSettings>,
    mut query: Query<&mut OrbitCamera, With<MainCamera>>,
) {
    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    // Stop just short of the poles so `looking_at` keeps a stable up vector.
    let max_pitch = FRAC_PI_2 - 0.01;
    for mut orbit in &mut query {
        orbit.yaw -= delta.x * settings.rotate_sensitivity;
        orbit.pitch = (orbit.pitch + delta.y * settings.rotate_sensitivity).clamp(-max_pitch, max_pitch);
    }
}

/// Zoom with the scroll wheel within the allowed distance range.
#[allow(clippy::needless_pass_by_value)]
fn orbit_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    settings: Res<OrbitSettings>,
    mut query: Query<&mut OrbitCamera, With<MainCamera>>,
) {
    let scroll: f32 = scroll_events.read().map(|event| event.y).sum();
    if scroll == 0.0 {
        return;
    }

    let factor = settings.zoom_step.powf(scroll);
    for mut orbit in &mut query {
        orbit.distance = (orbit.distance * factor).clamp(settings.min_distance, settings.max_distance);
    }
}

/// Write the orbit state into the camera transform.
fn apply_orbit_transform(
    mut query: Query<(&OrbitCamera, &mut Transform), (With<MainCamera>, Changed<OrbitCamera>)>,
) {
    for (orbit, mut transform) in &mut query {
        *transform = orbit.transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_positive_z() {
        let orbit = OrbitCamera::new(2.5);
        assert!(orbit.position().abs_diff_eq(Vec3::new(0.0, 0.0, 2.5), 1e-5));
    }

    #[test]
    fn positive_pitch_raises_the_camera() {
        let orbit = OrbitCamera {
            pitch: 0.5,
            ..OrbitCamera::new(2.0)
        };
        assert!(orbit.position().y > 0.0);
        assert!((orbit.position().length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn transform_looks_at_the_center() {
        let orbit = OrbitCamera {
            yaw: 1.0,
            pitch: -0.3,
            distance: 3.0,
        };
        let transform = orbit.transform();
        let forward = transform.forward();
        assert!(forward.abs_diff_eq(-orbit.position().normalize(), 1e-5));
    }
}
