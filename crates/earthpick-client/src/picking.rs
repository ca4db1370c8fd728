//! GPU country picking.
//!
//! A second globe, identical in shape to the visible one but textured with
//! the flat country index image, lives on its own render layer. A pick camera
//! renders that layer into a 1x1 image every frame, so its pipelines are
//! ready before the first click. When a click is released, the pick camera
//! copies the main camera and narrows its frustum to the pixel under the
//! cursor. The image is read back from the GPU, decoded into a country index
//! and applied to the selection, which repaints the palette texture.
//!
//! Readback is asynchronous, so a pick resolves a frame or two after the
//! pointer-up. Only one pick is in flight at a time.

use bevy::camera::visibility::RenderLayers;
use bevy::camera::{ClearColorConfig, RenderTarget, SubCameraView};
use bevy::core_pipeline::tonemapping::{DebandDither, Tonemapping};
use bevy::prelude::*;
use bevy::render::gpu_readback::{Readback, ReadbackComplete};
use bevy::render::view::Hdr;
use bevy::window::PrimaryWindow;
use bevy_egui::input::EguiWantsInput;
use earthpick_core::{
    ClickGesture, GestureOutcome, GlobeParams, Modifiers, PickSettings, PickingState,
    SelectionChange, uv_sphere,
};

use crate::AssetPaths;
use crate::camera::MainCamera;
use crate::materials::{
    IndexMaterial, PaletteMaterial, create_palette_image, create_pick_target_image,
    load_index_texture,
};
use crate::scene::sphere_mesh;

/// Render layer holding the index globe seen only by the pick camera.
pub const PICK_LAYER: usize = 1;

/// Frames to wait for a readback before giving up on a pick.
const PICK_TIMEOUT_FRAMES: u32 = 30;

/// Plugin for click handling, the pick pass and palette uploads.
pub struct PickingPlugin;

impl Plugin for PickingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Countries>()
            .init_resource::<PickInput>()
            .init_resource::<PendingPick>()
            .add_systems(Startup, setup_picking)
            .add_systems(
                Update,
                (track_pointer, advance_pending_pick, upload_palette).chain(),
            );
    }
}

/// Country selection state, present once the dataset has loaded.
#[derive(Resource, Default)]
pub struct Countries {
    pub state: Option<PickingState>,
}

/// Click-vs-drag tracking for the primary mouse button.
#[derive(Resource, Default)]
pub struct PickInput {
    gesture: ClickGesture,
    pub settings: PickSettings,
}

/// Images shared between the pick pass and the visible picking globe.
#[derive(Resource, Clone)]
pub struct PickingTextures {
    pub index: Handle<Image>,
    pub palette: Handle<Image>,
    pub pick_target: Handle<Image>,
    /// Material of the visible picking globe. It samples `palette` and must
    /// be touched whenever that image is replaced.
    pub palette_material: Handle<PaletteMaterial>,
}

/// Marker for the camera rendering the pick pixel.
#[derive(Component)]
pub struct PickCamera;

/// Marker for the index-textured globe.
#[derive(Component)]
pub struct IndexGlobe;

#[derive(Debug)]
struct InFlightPick {
    readback: Option<Entity>,
    pixel: Vec2,
    modifiers: Modifiers,
    frames: u32,
}

/// The pick currently waiting for GPU readback, if any.
#[derive(Resource, Default)]
pub struct PendingPick {
    in_flight: Option<InFlightPick>,
}

/// Create the pick target, palette and index textures, the index globe and
/// the pick camera.
#[allow(clippy::needless_pass_by_value)]
pub fn setup_picking(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    paths: Res<AssetPaths>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut index_materials: ResMut<Assets<IndexMaterial>>,
    mut palette_materials: ResMut<Assets<PaletteMaterial>>,
) {
    let index = load_index_texture(&asset_server, &paths.index_texture);
    let palette = images.add(create_palette_image(&earthpick_core::Palette::default()));
    let pick_target = images.add(create_pick_target_image());
    let palette_material = palette_materials.add(PaletteMaterial {
        outline_texture: asset_server.load(paths.country_outlines.clone()),
        index_texture: index.clone(),
        palette_texture: palette.clone(),
    });

    let params = GlobeParams::default();
    let geometry = uv_sphere(
        params.radius,
        params.picking_width_segments,
        params.picking_height_segments,
    );

    commands.spawn((
        Mesh3d(meshes.add(sphere_mesh(&geometry))),
        MeshMaterial3d(index_materials.add(IndexMaterial {
            index_texture: index.clone(),
        })),
        Transform::default(),
        RenderLayers::layer(PICK_LAYER),
        IndexGlobe,
    ));

    commands.spawn((
        Camera3d::default(),
        Camera {
            order: -1,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            sub_camera_view: Some(SubCameraView {
                full_size: UVec2::ONE,
                offset: Vec2::ZERO,
                size: UVec2::ONE,
            }),
            ..default()
        },
        RenderTarget::Image(pick_target.clone().into()),
        Transform::default(),
        Projection::default(),
        // A float target and no color processing keep the index bytes exact.
        Hdr,
        Tonemapping::None,
        DebandDither::Disabled,
        Msaa::Off,
        RenderLayers::layer(PICK_LAYER),
        PickCamera,
    ));

    commands.insert_resource(PickingTextures {
        index,
        palette,
        pick_target,
        palette_material,
    });

    tracing::info!("Picking pass ready (layer {})", PICK_LAYER);
}

fn held_modifiers(keyboard: &ButtonInput<KeyCode>) -> Modifiers {
    Modifiers {
        shift: keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        ctrl: keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
        meta: keyboard.any_pressed([KeyCode::SuperLeft, KeyCode::SuperRight]),
    }
}

/// Record presses and turn quick, still releases into pick requests.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments, clippy::type_complexity)]
fn track_pointer(
    time: Res<Time<Real>>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    window: Single<&Window, With<PrimaryWindow>>,
    main_camera: Single<(&Transform, &Projection), (With<MainCamera>, Without<PickCamera>)>,
    pick_camera: Single<
        (&mut Camera, &mut Transform, &mut Projection),
        (With<PickCamera>, Without<MainCamera>),
    >,
    mut input: ResMut<PickInput>,
    mut pending: ResMut<PendingPick>,
    countries: Res<Countries>,
    egui_input: Option<Res<EguiWantsInput>>,
) {
    let Some(cursor) = window.physical_cursor_position() else {
        return;
    };
    let now_ms = time.elapsed_secs_f64() * 1000.0;

    if mouse.just_pressed(MouseButton::Left) {
        let over_panel = egui_input.is_some_and(|egui| egui.wants_any_pointer_input());
        if !over_panel {
            input.gesture.press(now_ms, cursor);
        }
    }

    if !mouse.just_released(MouseButton::Left) {
        return;
    }

    let settings = input.settings;
    let GestureOutcome::Click(pixel) = input.gesture.release(now_ms, cursor, &settings) else {
        return;
    };

    // Clicks before the dataset arrives are dropped, not queued.
    if countries.state.is_none() {
        tracing::debug!("Ignoring click at {:?}: dataset not loaded", pixel);
        return;
    }
    if pending.in_flight.is_some() {
        tracing::debug!("Ignoring click at {:?}: pick already in flight", pixel);
        return;
    }

    let (main_transform, main_projection) = *main_camera;
    let (mut camera, mut transform, mut projection) = pick_camera.into_inner();
    camera.sub_camera_view = Some(SubCameraView {
        full_size: UVec2::new(window.physical_width(), window.physical_height()),
        offset: pixel.floor(),
        size: UVec2::ONE,
    });
    *transform = *main_transform;
    *projection = main_projection.clone();

    pending.in_flight = Some(InFlightPick {
        readback: None,
        pixel,
        modifiers: held_modifiers(&keyboard),
        frames: 0,
    });
}

/// Start the readback once the pick camera has rendered, and time out picks
/// that never complete.
#[allow(clippy::needless_pass_by_value)]
fn advance_pending_pick(
    mut commands: Commands,
    mut pending: ResMut<PendingPick>,
    textures: Res<PickingTextures>,
) {
    let Some(pick) = pending.in_flight.as_mut() else {
        return;
    };

    pick.frames += 1;

    if pick.readback.is_none() && pick.frames > 1 {
        let readback = commands
            .spawn(Readback::texture(textures.pick_target.clone()))
            .observe(resolve_pick)
            .id();
        pick.readback = Some(readback);
        return;
    }

    if pick.frames > PICK_TIMEOUT_FRAMES {
        tracing::warn!("Pick at {:?} timed out waiting for readback", pick.pixel);
        if let Some(pick) = pending.in_flight.take() {
            finish_pick(&mut commands, &pick);
        }
    }
}

/// Decode the read-back pixel and apply it to the selection.
#[allow(clippy::needless_pass_by_value)]
fn resolve_pick(
    event: On<ReadbackComplete>,
    mut commands: Commands,
    mut pending: ResMut<PendingPick>,
    mut countries: ResMut<Countries>,
) {
    let Some(pick) = pending.in_flight.take() else {
        return;
    };
    finish_pick(&mut commands, &pick);

    let Some(state) = countries.state.as_mut() else {
        return;
    };
    let Some(&[r, g, b, a]) = event.data.first_chunk::<4>() else {
        tracing::warn!("Pick readback returned {} bytes", event.data.len());
        return;
    };

    let change = state.apply_pixel([r, g, b, a], pick.modifiers);
    log_selection_change(state, change, pick.pixel);
}

fn finish_pick(commands: &mut Commands, pick: &InFlightPick) {
    if let Some(readback) = pick.readback {
        commands.entity(readback).despawn();
    }
}

fn log_selection_change(state: &PickingState, change: SelectionChange, pixel: Vec2) {
    let name = |index: u32| {
        state
            .record(index)
            .map_or("<unknown>", |record| record.name.as_str())
    };

    match change {
        SelectionChange::Unchanged => {
            tracing::debug!("Pick at {:?} hit the ocean", pixel);
        }
        SelectionChange::Cleared { previous_count } => {
            tracing::info!("Cleared {} selected countries", previous_count);
        }
        SelectionChange::Selected { index, exclusive } => {
            tracing::info!(
                "Selected #{} {} ({}, {} selected)",
                index,
                name(index),
                if exclusive { "exclusive" } else { "added" },
                state.selected_count()
            );
        }
        SelectionChange::Deselected { index } => {
            tracing::info!(
                "Deselected #{} {} ({} selected)",
                index,
                name(index),
                state.selected_count()
            );
        }
    }
}

/// Push the palette to the GPU when the selection changed it.
#[allow(clippy::needless_pass_by_value)]
fn upload_palette(
    mut countries: ResMut<Countries>,
    textures: Res<PickingTextures>,
    mut images: ResMut<Assets<Image>>,
    mut palette_materials: ResMut<Assets<PaletteMaterial>>,
) {
    let Some(state) = countries.bypass_change_detection().state.as_mut() else {
        return;
    };
    if !state.take_palette_dirty() {
        return;
    }

    let Some(image) = images.get_mut(&textures.palette) else {
        tracing::warn!("Palette image missing, selection not shown");
        return;
    };
    image.data = Some(state.palette().to_rgba8());

    // The new image gets a new GPU texture; touching the material rebuilds
    // its bind group against it.
    if palette_materials.get_mut(&textures.palette_material).is_none() {
        tracing::warn!("Palette material missing, selection not shown");
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::message::Messages;
    use bevy::math::DVec2;
    use earthpick_core::{CountryRecord, PaletteColors};

    use super::*;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<Countries>()
            .init_resource::<PickInput>()
            .init_resource::<PendingPick>()
            .add_systems(Update, track_pointer);

        let mut window = Window::default();
        window.set_physical_cursor_position(Some(DVec2::new(100.0, 200.0)));
        app.world_mut().spawn((window, PrimaryWindow));
        app.world_mut().spawn((
            Transform::from_xyz(0.0, 0.0, 2.5),
            Projection::default(),
            MainCamera,
        ));
        app.world_mut().spawn((
            Camera::default(),
            Transform::default(),
            Projection::default(),
            PickCamera,
        ));
        app
    }

    fn load_countries(app: &mut App) {
        let records = vec![CountryRecord {
            index: 1,
            name: "Testland".to_string(),
            centroid: Vec3::X * 0.5,
            bounding_box_area: 1000.0,
            selected: false,
        }];
        app.world_mut().resource_mut::<Countries>().state =
            Some(PickingState::new(records, PaletteColors::default()));
    }

    fn move_cursor(app: &mut App, x: f64, y: f64) {
        let mut windows = app.world_mut().query::<&mut Window>();
        for mut window in windows.iter_mut(app.world_mut()) {
            window.set_physical_cursor_position(Some(DVec2::new(x, y)));
        }
    }

    fn click(app: &mut App) {
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .clear();

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .release(MouseButton::Left);
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .clear();
    }

    fn in_flight_pixel(app: &App) -> Option<Vec2> {
        app.world()
            .resource::<PendingPick>()
            .in_flight
            .as_ref()
            .map(|pick| pick.pixel)
    }

    fn pick_sub_view(app: &mut App) -> Option<SubCameraView> {
        let mut cameras = app
            .world_mut()
            .query_filtered::<&Camera, With<PickCamera>>();
        cameras.single(app.world()).ok()?.sub_camera_view
    }

    #[test]
    fn clicks_before_the_dataset_loads_are_dropped() {
        let mut app = test_app();
        click(&mut app);

        assert_eq!(in_flight_pixel(&app), None);
        assert!(pick_sub_view(&mut app).is_none());

        // The dropped click is not replayed once the dataset arrives.
        load_countries(&mut app);
        app.update();
        assert_eq!(in_flight_pixel(&app), None);
    }

    #[test]
    fn click_aims_the_pick_camera_at_the_cursor() {
        let mut app = test_app();
        load_countries(&mut app);
        move_cursor(&mut app, 100.7, 200.2);
        click(&mut app);

        assert_eq!(in_flight_pixel(&app), Some(Vec2::new(100.7, 200.2)));
        let view = pick_sub_view(&mut app).expect("pick camera has a sub view");
        assert_eq!(view.offset, Vec2::new(100.0, 200.0));
        assert_eq!(view.size, UVec2::ONE);

        let mut cameras = app
            .world_mut()
            .query_filtered::<&Transform, With<PickCamera>>();
        let transform = cameras.single(app.world()).expect("one pick camera");
        assert_eq!(transform.translation, Vec3::new(0.0, 0.0, 2.5));
    }

    #[test]
    fn second_click_is_ignored_while_a_pick_is_in_flight() {
        let mut app = test_app();
        load_countries(&mut app);
        click(&mut app);
        assert_eq!(in_flight_pixel(&app), Some(Vec2::new(100.0, 200.0)));

        move_cursor(&mut app, 300.0, 50.0);
        click(&mut app);

        assert_eq!(in_flight_pixel(&app), Some(Vec2::new(100.0, 200.0)));
        let view = pick_sub_view(&mut app).expect("pick camera has a sub view");
        assert_eq!(view.offset, Vec2::new(100.0, 200.0));
    }

    #[test]
    fn drag_does_not_pick() {
        let mut app = test_app();
        load_countries(&mut app);

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .clear();

        move_cursor(&mut app, 140.0, 200.0);
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .release(MouseButton::Left);
        app.update();

        assert_eq!(in_flight_pixel(&app), None);
    }

    fn palette_app() -> (App, PickingTextures) {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<PaletteMaterial>()
            .init_resource::<Countries>()
            .add_systems(Update, upload_palette);

        let world = app.world_mut();
        let palette = world
            .resource_mut::<Assets<Image>>()
            .add(create_palette_image(&earthpick_core::Palette::default()));
        let palette_material = world
            .resource_mut::<Assets<PaletteMaterial>>()
            .add(PaletteMaterial {
                outline_texture: Handle::default(),
                index_texture: Handle::default(),
                palette_texture: palette.clone(),
            });
        let textures = PickingTextures {
            index: Handle::default(),
            palette,
            pick_target: Handle::default(),
            palette_material,
        };
        app.insert_resource(textures.clone());
        (app, textures)
    }

    fn palette_material_modified(app: &App, textures: &PickingTextures) -> bool {
        let id = textures.palette_material.id();
        app.world()
            .resource::<Messages<AssetEvent<PaletteMaterial>>>()
            .iter_current_update_messages()
            .any(|event| *event == AssetEvent::Modified { id })
    }

    #[test]
    fn selection_repaints_palette_and_refreshes_its_material() {
        let (mut app, textures) = palette_app();
        load_countries(&mut app);
        app.update();
        assert!(!palette_material_modified(&app, &textures));

        let change = app
            .world_mut()
            .resource_mut::<Countries>()
            .state
            .as_mut()
            .expect("dataset loaded")
            .apply_pick(1, Modifiers::NONE);
        assert_eq!(
            change,
            SelectionChange::Selected {
                index: 1,
                exclusive: true
            }
        );
        app.update();

        assert!(palette_material_modified(&app, &textures));
        let images = app.world().resource::<Assets<Image>>();
        let data = images
            .get(&textures.palette)
            .and_then(|image| image.data.as_ref())
            .expect("palette image has data");
        assert_eq!(&data[4..8], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&data[0..3], &[0x22, 0x22, 0x22]);
    }
}
