//! Globe layers, lights, and projection of control panel settings onto them.

use bevy::asset::RenderAssetUsages;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::ui::IsDefaultUiCamera;
use bevy_egui::PrimaryEguiContext;
use earthpick_core::{GlobeParams, SphereGeometry, ViewSettings, uv_sphere};

use crate::AssetPaths;
use crate::camera::{CameraSystems, MainCamera, OrbitCamera, OrbitSettings};
use crate::picking::PickingTextures;

/// Where a hidden globe layer is parked, well behind the camera's reach.
const PARKED_Z: f32 = 100.0;

const AMBIENT_BRIGHTNESS: f32 = 500.0;
const SUN_ILLUMINANCE: f32 = 10_000.0;

/// Plugin for the globe scene.
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneSettings>()
            .insert_resource(GlobalAmbientLight {
                color: Color::BLACK,
                brightness: AMBIENT_BRIGHTNESS,
                ..default()
            })
            .add_systems(
                Startup,
                setup_scene.after(crate::picking::setup_picking),
            )
            .add_systems(
                Update,
                (
                    spin_clouds,
                    apply_view_settings.run_if(resource_changed::<SceneSettings>),
                )
                    .after(CameraSystems),
            );
    }
}

/// Current control panel settings.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SceneSettings(pub ViewSettings);

/// Photo-textured Earth.
#[derive(Component)]
pub struct Earth;

/// Palette-shaded globe shown in picking mode.
#[derive(Component)]
pub struct PickingGlobe;

#[derive(Component)]
pub struct Clouds;

#[derive(Component)]
pub struct Starfield;

/// Flat detail map shown in detail mode.
#[derive(Component)]
pub struct DetailOverlay;

#[derive(Component)]
pub struct Sun;

/// Handles swapped by the control panel.
#[derive(Resource)]
pub struct EarthTextures {
    pub material: Handle<StandardMaterial>,
    pub color: Handle<Image>,
    pub color_alternate: Handle<Image>,
}

/// Convert generated sphere geometry into a Bevy mesh.
pub fn sphere_mesh(geometry: &SphereGeometry) -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, geometry.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, geometry.normals.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, geometry.uvs.clone())
        .with_inserted_indices(Indices::U32(geometry.indices.clone()))
}

/// Spawn the camera, lights and every globe layer.
#[allow(clippy::needless_pass_by_value)]
fn setup_scene(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    paths: Res<AssetPaths>,
    orbit: Res<OrbitSettings>,
    textures: Res<PickingTextures>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let params = GlobeParams::default();
    let settings = ViewSettings::default();

    let orbit_camera = OrbitCamera::new(orbit.start_distance);
    commands.spawn((
        Camera3d::default(),
        Camera::default(),
        orbit_camera.transform(),
        orbit.projection(),
        Tonemapping::None,
        orbit_camera,
        MainCamera,
        IsDefaultUiCamera,
        // The pick camera also exists, so the egui context is attached explicitly.
        PrimaryEguiContext,
    ));

    commands.spawn((
        Sun,
        DirectionalLight {
            color: Color::WHITE,
            illuminance: SUN_ILLUMINANCE,
            ..default()
        },
        Transform::from_xyz(5.0, 3.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Earth. The elevation map doubles as a parallax depth map, which needs tangents.
    let mut earth_mesh = sphere_mesh(&uv_sphere(params.radius, params.segments, params.segments));
    if let Err(e) = earth_mesh.generate_tangents() {
        tracing::warn!("Failed to generate Earth tangents, bump mapping disabled: {}", e);
    }
    let color = asset_server.load(paths.earth_color.clone());
    let color_alternate = asset_server.load(paths.earth_color_alternate.clone());
    let earth_material = materials.add(StandardMaterial {
        base_color_texture: Some(color.clone()),
        depth_map: Some(asset_server.load(paths.earth_elevation.clone())),
        parallax_depth_scale: settings.bump_scale,
        perceptual_roughness: 0.8,
        reflectance: 0.3,
        ..default()
    });
    commands.spawn((
        Mesh3d(meshes.add(earth_mesh)),
        MeshMaterial3d(earth_material.clone()),
        Transform::default(),
        Earth,
    ));
    commands.insert_resource(EarthTextures {
        material: earth_material,
        color,
        color_alternate,
    });

    // Palette-shaded globe, parked until picking mode is on.
    let picking_mesh = uv_sphere(
        params.radius,
        params.picking_width_segments,
        params.picking_height_segments,
    );
    commands.spawn((
        Mesh3d(meshes.add(sphere_mesh(&picking_mesh))),
        MeshMaterial3d(textures.palette_material.clone()),
        Transform::from_xyz(0.0, 0.0, PARKED_Z),
        PickingGlobe,
    ));

    let cloud_mesh = uv_sphere(params.radius + params.cloud_offset, params.segments, params.segments);
    commands.spawn((
        Mesh3d(meshes.add(sphere_mesh(&cloud_mesh))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(asset_server.load(paths.clouds.clone())),
            alpha_mode: AlphaMode::Blend,
            ..default()
        })),
        Transform::default(),
        Clouds,
    ));

    let star_mesh = uv_sphere(
        params.starfield_radius,
        params.starfield_segments,
        params.starfield_segments,
    )
    .inverted();
    commands.spawn((
        Mesh3d(meshes.add(sphere_mesh(&star_mesh))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(asset_server.load(paths.starfield.clone())),
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Starfield,
    ));

    commands.spawn((
        Mesh3d(meshes.add(Rectangle::new(1.4, 0.7))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(asset_server.load(paths.detail_overlay.clone())),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..default()
        })),
        Transform::from_xyz(0.0, 0.0, params.radius + 0.1),
        Visibility::Hidden,
        DetailOverlay,
    ));

    tracing::info!("Scene setup complete - drag to rotate, scroll to zoom, click to select");
}

/// Spin the clouds while auto-rotate is on.
#[allow(clippy::needless_pass_by_value)]
fn spin_clouds(settings: Res<SceneSettings>, mut clouds: Query<&mut Transform, With<Clouds>>) {
    let spin = settings.0.cloud_spin();
    if spin == 0.0 {
        return;
    }
    for mut transform in &mut clouds {
        transform.rotate_y(-spin);
    }
}

fn light_color(on: bool) -> Color {
    if on { Color::WHITE } else { Color::BLACK }
}

fn parked_z(shown: bool) -> f32 {
    if shown { 0.0 } else { PARKED_Z }
}

fn visibility(shown: bool) -> Visibility {
    if shown {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Project the control panel settings onto the scene.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
fn apply_view_settings(
    settings: Res<SceneSettings>,
    earth_textures: Option<Res<EarthTextures>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ambient: ResMut<GlobalAmbientLight>,
    mut sun: Query<&mut DirectionalLight, With<Sun>>,
    mut globes: ParamSet<(
        Query<&mut Transform, With<Earth>>,
        Query<&mut Transform, With<PickingGlobe>>,
    )>,
    mut clouds: Query<&mut Visibility, (With<Clouds>, Without<DetailOverlay>)>,
    mut overlay: Query<&mut Visibility, (With<DetailOverlay>, Without<Clouds>)>,
) {
    let settings = settings.0;

    for mut light in &mut sun {
        light.color = light_color(settings.directional_light);
    }
    ambient.color = light_color(settings.ambient_light);

    for mut transform in &mut globes.p0() {
        transform.translation.z = parked_z(!settings.picking_mode);
    }
    for mut transform in &mut globes.p1() {
        transform.translation.z = parked_z(settings.picking_mode);
    }

    for mut cloud_visibility in &mut clouds {
        *cloud_visibility = visibility(settings.view_clouds);
    }
    for mut overlay_visibility in &mut overlay {
        *overlay_visibility = visibility(settings.detail_mode);
    }

    if let Some(textures) = earth_textures
        && let Some(material) = materials.get_mut(&textures.material)
    {
        material.parallax_depth_scale = settings.bump_scale;
        let color = if settings.reverse_color {
            &textures.color_alternate
        } else {
            &textures.color
        };
        if material.base_color_texture.as_ref() != Some(color) {
            tracing::info!(
                "Switched Earth texture to {}",
                if settings.reverse_color { "alternate" } else { "default" }
            );
            material.base_color_texture = Some(color.clone());
        }
    }
}
