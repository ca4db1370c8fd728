//! Country name labels drawn as UI text over the globe.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use earthpick_core::{LabelSettings, place_label};

use crate::camera::{CameraSystems, MainCamera, OrbitSettings};
use crate::picking::Countries;

const LABEL_FONT_SIZE: f32 = 12.0;

/// Plugin for the label overlay.
pub struct LabelPlugin;

impl Plugin for LabelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LabelConfig>().add_systems(
            Update,
            (spawn_labels, update_labels).chain().after(CameraSystems),
        );
    }
}

/// Label visibility thresholds.
#[derive(Resource, Default)]
pub struct LabelConfig(pub LabelSettings);

/// A label entity for the country with this index.
#[derive(Component)]
pub struct CountryLabel {
    pub index: u32,
}

/// Spawn one hidden label per country once the dataset has loaded.
#[allow(clippy::needless_pass_by_value)]
fn spawn_labels(
    mut commands: Commands,
    countries: Res<Countries>,
    existing: Query<(), With<CountryLabel>>,
) {
    if !countries.is_changed() || !existing.is_empty() {
        return;
    }
    let Some(state) = countries.state.as_ref() else {
        return;
    };

    for record in state.records() {
        commands.spawn((
            Text::new(record.name.clone()),
            TextFont {
                font_size: LABEL_FONT_SIZE,
                ..default()
            },
            TextColor(Color::WHITE),
            Node {
                position_type: PositionType::Absolute,
                display: Display::None,
                ..default()
            },
            ZIndex(0),
            CountryLabel {
                index: record.index,
            },
        ));
    }

    tracing::info!("Spawned {} country labels", state.country_count());
}

/// Show, hide and position labels for the current camera.
#[allow(clippy::needless_pass_by_value)]
fn update_labels(
    countries: Res<Countries>,
    config: Res<LabelConfig>,
    orbit: Res<OrbitSettings>,
    window: Single<&Window, With<PrimaryWindow>>,
    camera: Single<&Transform, With<MainCamera>>,
    mut labels: Query<(&CountryLabel, &mut Node, &mut ZIndex, &ComputedNode)>,
) {
    let Some(state) = countries.state.as_ref() else {
        return;
    };

    let viewport = Vec2::new(window.width(), window.height());
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return;
    }

    let view = Mat4::from_rotation_translation(camera.rotation, camera.translation).inverse();
    let clip_from_view = orbit.clip_from_view(viewport.x / viewport.y);
    let any_selected = state.any_selected();

    for (label, mut node, mut z_index, computed) in &mut labels {
        let placement = state.record(label.index).and_then(|record| {
            place_label(record, any_selected, view, clip_from_view, viewport, &config.0)
        });

        let Some(placement) = placement else {
            if node.display != Display::None {
                node.display = Display::None;
            }
            continue;
        };

        // Center the label on its anchor.
        let size = computed.size() * computed.inverse_scale_factor();
        node.display = Display::Flex;
        node.left = Val::Px(placement.position.x - size.x * 0.5);
        node.top = Val::Px(placement.position.y - size.y * 0.5);
        z_index.0 = placement.z_index;
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn ui_text_is_rendered() {
        // Label text nodes are only drawn when Bevy's UI renderer is built in.
        let plugin = std::any::type_name::<bevy::ui_render::UiRenderPlugin>();
        assert!(plugin.ends_with("UiRenderPlugin"));
    }
}
