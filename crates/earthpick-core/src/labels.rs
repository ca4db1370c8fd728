//! Per-frame label visibility and placement.
//!
//! Labels are re-evaluated every frame against the current camera. Nothing is
//! cached between frames except the static anchors on each record.

use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::dataset::CountryRecord;

/// Thresholds for label visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSettings {
    /// With nothing selected, only countries whose bounding box area reaches
    /// `min_area^2` are labelled.
    pub min_area: f32,
    /// Labels whose facing dot exceeds this are on the far side of the globe.
    pub max_visible_dot: f32,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            min_area: 20.0,
            max_visible_dot: -0.2,
        }
    }
}

/// Screen placement of a visible label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    /// Label center in viewport pixels, origin top-left.
    pub position: Vec2,
    /// Stacking order; nearer labels get larger values.
    pub z_index: i32,
}

/// Whether a country's label may show at all, ignoring orientation.
#[must_use]
pub fn is_eligible(record: &CountryRecord, any_selected: bool, settings: &LabelSettings) -> bool {
    let large = settings.min_area * settings.min_area;
    record.selected || (!any_selected && record.bounding_box_area >= large)
}

/// Dot product between the view-space surface normal at `anchor` and the
/// view-space direction from the camera to `anchor`.
///
/// -1 faces the camera head on, 0 sits on the horizon, positive values face
/// away. The globe is assumed centered at the origin.
#[must_use]
pub fn facing_dot(view: Mat4, anchor: Vec3) -> f32 {
    let normal_matrix = Mat3::from_mat4(view).inverse().transpose();
    let normal = (normal_matrix * anchor).normalize_or_zero();
    let camera_to_point = view.transform_point3(anchor).normalize_or_zero();
    normal.dot(camera_to_point)
}

/// Decide whether and where to draw a country's label this frame.
///
/// `view` maps world to view space and `clip_from_view` is an OpenGL-style
/// projection (NDC depth in `[-1, 1]`, near at -1). `viewport` is the size of
/// the canvas in the same units as the returned position.
#[must_use]
pub fn place_label(
    record: &CountryRecord,
    any_selected: bool,
    view: Mat4,
    clip_from_view: Mat4,
    viewport: Vec2,
    settings: &LabelSettings,
) -> Option<LabelPlacement> {
    if !is_eligible(record, any_selected, settings) {
        return None;
    }

    if facing_dot(view, record.centroid) > settings.max_visible_dot {
        return None;
    }

    let clip = clip_from_view * view * record.centroid.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;

    let position = Vec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.x,
        (ndc.y * -0.5 + 0.5) * viewport.y,
    );

    #[allow(clippy::cast_possible_truncation)]
    let z_index = ((-ndc.z * 0.5 + 0.5) * 100_000.0) as i32;

    Some(LabelPlacement { position, z_index })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::dataset::anchor_position;

    fn record(centroid: Vec3, area: f32, selected: bool) -> CountryRecord {
        CountryRecord {
            index: 1,
            name: "Testland".to_string(),
            centroid,
            bounding_box_area: area,
            selected,
        }
    }

    fn camera_on_z(distance: f32) -> (Mat4, Mat4) {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, distance), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(45f32.to_radians(), 1.0, 0.01, 500.0);
        (view, proj)
    }

    #[test]
    fn large_countries_show_when_nothing_is_selected() {
        let settings = LabelSettings::default();
        assert!(is_eligible(&record(Vec3::Z, 400.0, false), false, &settings));
        assert!(!is_eligible(&record(Vec3::Z, 399.9, false), false, &settings));
    }

    #[test]
    fn only_selected_countries_show_once_something_is_selected() {
        let settings = LabelSettings::default();
        assert!(!is_eligible(&record(Vec3::Z, 10_000.0, false), true, &settings));
        assert!(is_eligible(&record(Vec3::Z, 1.0, true), true, &settings));
    }

    #[test]
    fn facing_dot_reference_values() {
        let (view, _) = camera_on_z(2.5);
        let front = facing_dot(view, Vec3::new(0.0, 0.0, 0.5));
        assert!((front + 1.0).abs() < 1e-5);

        let back = facing_dot(view, Vec3::new(0.0, 0.0, -0.5));
        assert!((back - 1.0).abs() < 1e-5);
    }

    #[test]
    fn facing_dot_is_a_cosine_for_any_radius() {
        // Scaling the globe and the camera distance together keeps the angle.
        let (small_view, _) = camera_on_z(2.5);
        let (unit_view, _) = camera_on_z(5.0);
        let small = facing_dot(small_view, anchor_position(20.0, -60.0, 0.5));
        let unit = facing_dot(unit_view, anchor_position(20.0, -60.0, 1.0));
        assert!((small - unit).abs() < 1e-5);
        assert!((-1.0..=1.0).contains(&small));

        let (view, _) = camera_on_z(2.5);
        // The view is rigid, so the dot matches the world-space cosine.
        let anchor = Vec3::new(0.5 * 0.5f32.sin(), 0.0, 0.5 * 0.5f32.cos());
        let camera = Vec3::new(0.0, 0.0, 2.5);
        let expected = anchor.normalize().dot((anchor - camera).normalize());
        assert!((facing_dot(view, anchor) - expected).abs() < 1e-5);
    }

    #[test]
    fn dot_exactly_at_threshold_is_shown() {
        let (view, proj) = camera_on_z(2.5);
        let anchor = Vec3::new(0.3, 0.0, 0.4);
        let dot = facing_dot(view, anchor);
        let settings = LabelSettings {
            min_area: 0.0,
            max_visible_dot: dot,
        };
        let rec = record(anchor, 1.0, false);
        assert!(place_label(&rec, false, view, proj, Vec2::splat(800.0), &settings).is_some());

        let stricter = LabelSettings {
            max_visible_dot: dot - 1e-4,
            ..settings
        };
        assert!(place_label(&rec, false, view, proj, Vec2::splat(800.0), &stricter).is_none());
    }

    #[test]
    fn far_side_labels_are_hidden() {
        let (view, proj) = camera_on_z(2.5);
        let rec = record(Vec3::new(0.0, 0.0, -0.5), 1.0, true);
        let placement = place_label(&rec, true, view, proj, Vec2::splat(800.0), &LabelSettings::default());
        assert!(placement.is_none());
    }

    #[test]
    fn front_label_lands_at_viewport_center() {
        let (view, proj) = camera_on_z(2.5);
        let rec = record(Vec3::new(0.0, 0.0, 0.5), 1.0, true);
        let placement = place_label(
            &rec,
            true,
            view,
            proj,
            Vec2::new(1280.0, 720.0),
            &LabelSettings::default(),
        )
        .unwrap();
        assert!(placement.position.abs_diff_eq(Vec2::new(640.0, 360.0), 1e-2));
    }

    #[test]
    fn northern_anchor_is_above_center() {
        let (view, proj) = camera_on_z(2.5);
        let rec = record(anchor_position(30.0, -90.0, 0.5), 1.0, true);
        let placement = place_label(&rec, true, view, proj, Vec2::splat(800.0), &LabelSettings::default())
            .unwrap();
        assert!(placement.position.y < 400.0);
        assert!((placement.position.x - 400.0).abs() < 1e-2);
    }

    #[test]
    fn nearer_labels_stack_above() {
        let (view, proj) = camera_on_z(2.5);
        let settings = LabelSettings::default();
        let viewport = Vec2::splat(800.0);
        let near = record(anchor_position(0.0, -90.0, 0.5), 1.0, true);
        let far = record(anchor_position(40.0, -90.0, 0.5), 1.0, true);
        let near = place_label(&near, true, view, proj, viewport, &settings).unwrap();
        let far = place_label(&far, true, view, proj, viewport, &settings).unwrap();
        assert!(near.z_index > far.z_index);
    }

    proptest! {
        #[test]
        fn visible_labels_face_the_camera(lat in -80.0f32..80.0, lon in -180.0f32..180.0) {
            let (view, proj) = camera_on_z(2.5);
            let settings = LabelSettings::default();
            let rec = record(anchor_position(lat, lon, 0.5), 1.0, true);
            if place_label(&rec, true, view, proj, Vec2::splat(800.0), &settings).is_some() {
                // Camera sits on +Z, so visible anchors must be on the near hemisphere.
                prop_assert!(rec.centroid.z > 0.0);
            }
        }
    }
}
