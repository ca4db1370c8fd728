//! Interactive 3D globe with GPU country picking using Bevy.
//!
//! Click a country to select it, shift/ctrl/cmd-click to toggle it in a
//! multi-selection, click the ocean to clear. Selected countries light up on
//! the picking globe and their names are shown; with nothing selected, every
//! sufficiently large country is labelled.

mod camera;
mod labels;
mod loader;
mod materials;
mod picking;
mod scene;
mod ui;

use bevy::prelude::*;
use bevy_egui::{EguiGlobalSettings, EguiPlugin};
use camera::CameraControllerPlugin;
use labels::LabelPlugin;
use loader::DataLoaderPlugin;
use materials::PickingMaterialsPlugin;
use picking::PickingPlugin;
use scene::ScenePlugin;
use ui::ControlPanelPlugin;

/// Environment variable overriding the country dataset URL on native.
#[cfg(not(target_family = "wasm"))]
const DATASET_URL_ENV: &str = "EARTHPICK_DATASET_URL";

/// Where the viewer finds its data.
///
/// Texture paths are relative to the Bevy asset directory.
#[derive(Resource, Debug, Clone)]
pub struct AssetPaths {
    pub dataset_url: String,
    /// Flat country index image; texel red + green * 256 is the country index.
    pub index_texture: String,
    pub earth_color: String,
    /// Color texture shown while "reverse color" is on.
    pub earth_color_alternate: String,
    pub earth_elevation: String,
    pub country_outlines: String,
    pub clouds: String,
    pub starfield: String,
    pub detail_overlay: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            dataset_url: earthpick::Client::DEFAULT_DATASET_URL.to_string(),
            index_texture: "images/country-index-texture.png".to_string(),
            earth_color: "images/2_no_clouds_4k.jpg".to_string(),
            earth_color_alternate: "images/water_4k.png".to_string(),
            earth_elevation: "images/elev_bump_4k.jpg".to_string(),
            country_outlines: "images/country-outlines-4k.png".to_string(),
            clouds: "images/fair_clouds_4k.png".to_string(),
            starfield: "images/galaxy_starfield.png".to_string(),
            detail_overlay: "images/detail_overlay.png".to_string(),
        }
    }
}

impl AssetPaths {
    /// Defaults, with the dataset URL taken from the environment when set.
    #[must_use]
    pub fn from_env() -> Self {
        #[allow(unused_mut)]
        let mut paths = Self::default();
        #[cfg(not(target_family = "wasm"))]
        if let Ok(url) = std::env::var(DATASET_URL_ENV) {
            tracing::info!("Using dataset URL from {}: {}", DATASET_URL_ENV, url);
            paths.dataset_url = url;
        }
        paths
    }
}

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(AssetPaths::from_env())
            .insert_resource(ClearColor(Color::BLACK))
            .add_plugins((
                PickingMaterialsPlugin,
                CameraControllerPlugin,
                PickingPlugin,
                ScenePlugin,
                LabelPlugin,
                DataLoaderPlugin,
                ControlPanelPlugin,
            ));
    }
}

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "earthpick".to_string(),
        resolution: (1280, 720).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }))
    .add_plugins(EguiPlugin::default())
    // The main camera carries the primary egui context; see `scene::setup_scene`.
    .insert_resource(EguiGlobalSettings {
        auto_create_primary_context: false,
        ..default()
    });

    // Tokio runtime for reqwest on native; wasm uses the browser's fetch.
    #[cfg(not(target_family = "wasm"))]
    app.add_plugins(bevy_tokio_tasks::TokioTasksPlugin::default());

    app.add_plugins(AppPlugin).run();
}
