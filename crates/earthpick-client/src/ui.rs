//! Control panel.
//!
//! Widgets never touch the scene directly. Each edit is sent as a
//! [`PanelChanged`] message and folded into [`SceneSettings`] by
//! [`apply_panel_changes`]; the scene reacts to the new settings value.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use earthpick_core::{PanelChange, ViewSettings};

use crate::picking::Countries;
use crate::scene::SceneSettings;

/// Plugin for the control panel.
pub struct ControlPanelPlugin;

impl Plugin for ControlPanelPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PanelChanged>()
            .add_systems(EguiPrimaryContextPass, control_panel)
            .add_systems(Update, apply_panel_changes);
    }
}

/// An edit made in the control panel.
#[derive(Message, Debug, Clone, Copy)]
pub struct PanelChanged(pub PanelChange);

/// Draw the control panel and send a message for every edited widget.
#[allow(clippy::needless_pass_by_value)]
fn control_panel(
    mut contexts: EguiContexts,
    settings: Res<SceneSettings>,
    countries: Res<Countries>,
    mut changes: MessageWriter<PanelChanged>,
) -> Result {
    let ctx = contexts.ctx_mut()?;
    let current = settings.0;
    let mut edited = Vec::new();

    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::CollapsingHeader::new("Camera")
                .default_open(true)
                .show(ui, |ui| {
                    let mut speed = current.cloud_rotation_speed;
                    if ui
                        .add(
                            egui::Slider::new(&mut speed, 0.0..=ViewSettings::MAX_CLOUD_ROTATION_SPEED)
                                .step_by(0.001)
                                .text("Cloud speed"),
                        )
                        .changed()
                    {
                        edited.push(PanelChange::CloudRotationSpeed(speed));
                    }

                    let mut auto_rotate = current.auto_rotate;
                    if ui.checkbox(&mut auto_rotate, "Auto rotate").changed() {
                        edited.push(PanelChange::AutoRotate(auto_rotate));
                    }
                });

            egui::CollapsingHeader::new("Surface")
                .default_open(true)
                .show(ui, |ui| {
                    let mut bump = current.bump_scale;
                    if ui
                        .add(
                            egui::Slider::new(&mut bump, 0.0..=ViewSettings::MAX_BUMP_SCALE)
                                .step_by(0.01)
                                .text("Bump scale"),
                        )
                        .changed()
                    {
                        edited.push(PanelChange::BumpScale(bump));
                    }

                    let mut view_clouds = current.view_clouds;
                    if ui.checkbox(&mut view_clouds, "View clouds").changed() {
                        edited.push(PanelChange::ViewClouds(view_clouds));
                    }

                    let mut reverse_color = current.reverse_color;
                    if ui.checkbox(&mut reverse_color, "Reverse color").changed() {
                        edited.push(PanelChange::ReverseColor(reverse_color));
                    }
                });

            egui::CollapsingHeader::new("Light")
                .default_open(true)
                .show(ui, |ui| {
                    let mut directional = current.directional_light;
                    if ui.checkbox(&mut directional, "Directional light").changed() {
                        edited.push(PanelChange::DirectionalLight(directional));
                    }

                    let mut ambient = current.ambient_light;
                    if ui.checkbox(&mut ambient, "Ambient light").changed() {
                        edited.push(PanelChange::AmbientLight(ambient));
                    }
                });

            egui::CollapsingHeader::new("Mode")
                .default_open(true)
                .show(ui, |ui| {
                    let mut picking = current.picking_mode;
                    if ui.checkbox(&mut picking, "Picking mode").changed() {
                        edited.push(PanelChange::PickingMode(picking));
                    }

                    let mut detail = current.detail_mode;
                    if ui.checkbox(&mut detail, "Detail mode").changed() {
                        edited.push(PanelChange::DetailMode(detail));
                    }
                });

            ui.separator();
            match countries.state.as_ref() {
                Some(state) => {
                    ui.label(format!(
                        "{} countries, {} selected",
                        state.country_count(),
                        state.selected_count()
                    ));
                }
                None => {
                    ui.label("Country data not loaded");
                }
            }
        });

    changes.write_batch(edited.into_iter().map(PanelChanged));
    Ok(())
}

/// Fold panel edits into the scene settings.
fn apply_panel_changes(
    mut changes: MessageReader<PanelChanged>,
    mut settings: ResMut<SceneSettings>,
) {
    for PanelChanged(change) in changes.read() {
        let next = settings.0.reduce(*change);
        tracing::debug!("Panel change {:?}", change);
        if next != settings.0 {
            settings.0 = next;
        }
    }
}
