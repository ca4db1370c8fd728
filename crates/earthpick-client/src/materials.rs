//! Custom materials for the picking globes.
//!
//! Both materials read the country index texture, which must be loaded with
//! nearest filtering and without sRGB conversion (see
//! [`load_index_texture`]). Linear filtering would blend neighbouring indices
//! at borders and decode to unrelated countries.

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageLoaderSettings, ImageSampler};
use bevy::prelude::*;
use bevy::render::render_resource::{
    AsBindGroup, Extent3d, TextureDimension, TextureFormat, TextureUsages,
};
use bevy::shader::ShaderRef;
use earthpick_core::{MAX_COUNTRIES, Palette};

const INDEX_SHADER_PATH: &str = "shaders/country_index.wgsl";
const PALETTE_SHADER_PATH: &str = "shaders/country_palette.wgsl";

/// Plugin registering the picking materials.
pub struct PickingMaterialsPlugin;

impl Plugin for PickingMaterialsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            MaterialPlugin::<IndexMaterial>::default(),
            MaterialPlugin::<PaletteMaterial>::default(),
        ));
    }
}

/// Unlit material writing raw index texels, used only by the pick pass.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct IndexMaterial {
    #[texture(0)]
    #[sampler(1)]
    pub index_texture: Handle<Image>,
}

impl Material for IndexMaterial {
    fn fragment_shader() -> ShaderRef {
        INDEX_SHADER_PATH.into()
    }
}

/// Country outlines tinted by the selection palette.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct PaletteMaterial {
    #[texture(0)]
    #[sampler(1)]
    pub outline_texture: Handle<Image>,
    #[texture(2)]
    #[sampler(3)]
    pub index_texture: Handle<Image>,
    #[texture(4)]
    #[sampler(5)]
    pub palette_texture: Handle<Image>,
}

impl Material for PaletteMaterial {
    fn fragment_shader() -> ShaderRef {
        PALETTE_SHADER_PATH.into()
    }
}

/// Load the country index texture with exact texel values.
pub fn load_index_texture(asset_server: &AssetServer, path: &str) -> Handle<Image> {
    asset_server.load_with_settings(path.to_string(), |settings: &mut ImageLoaderSettings| {
        settings.sampler = ImageSampler::nearest();
        settings.is_srgb = false;
    })
}

/// Create the 1-D palette texture from its CPU copy.
pub fn create_palette_image(palette: &Palette) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: u32::try_from(MAX_COUNTRIES).unwrap_or(u32::MAX),
            height: 1,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        palette.to_rgba8(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    image.sampler = ImageSampler::nearest();
    image
}

/// Create a 1x1 render target the pick camera draws into and the GPU
/// readback copies from.
pub fn create_pick_target_image() -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8Unorm,
        RenderAssetUsages::RENDER_WORLD,
    );
    image.texture_descriptor.usage = TextureUsages::RENDER_ATTACHMENT
        | TextureUsages::COPY_SRC
        | TextureUsages::TEXTURE_BINDING;
    image
}
