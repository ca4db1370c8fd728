//! Async loading of the country dataset.
//!
//! The dataset is fetched once at startup. Until it lands, picking and labels
//! are no-ops; if it fails, they stay disabled for the session.
//!
//! Uses platform-agnostic `async_channel` for communication between async tasks
//! and the main thread. The spawn mechanism differs by platform:
//! - Native: `bevy-tokio-tasks` for Tokio runtime (reqwest requires it)
//! - WASM: Bevy's built-in `AsyncComputeTaskPool` (reqwest uses browser fetch)

use std::sync::Arc;

use bevy::prelude::*;
#[cfg(target_family = "wasm")]
use bevy::tasks::AsyncComputeTaskPool;
#[cfg(not(target_family = "wasm"))]
use bevy_tokio_tasks::TokioTasksRuntime;

use earthpick::{Client, CountryRecord};
use earthpick_core::{GlobeParams, PaletteColors, PickingState};

use crate::AssetPaths;
use crate::picking::Countries;

/// Plugin for loading the country dataset.
pub struct DataLoaderPlugin;

impl Plugin for DataLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoaderChannels>()
            .add_systems(Startup, start_dataset_load)
            .add_systems(Update, poll_dataset_task);
    }
}

/// State for the data loader.
#[derive(Resource)]
pub struct LoaderState {
    /// The HTTP client for fetching data.
    pub client: Arc<Client>,
    /// Whether the dataset request has finished, successfully or not.
    pub finished: bool,
}

type DatasetResult = Result<Vec<CountryRecord>, earthpick::Error>;

/// Channel for receiving the dataset from the background task.
#[derive(Resource)]
pub struct LoaderChannels {
    dataset_rx: async_channel::Receiver<DatasetResult>,
    dataset_tx: async_channel::Sender<DatasetResult>,
}

impl Default for LoaderChannels {
    fn default() -> Self {
        let (dataset_tx, dataset_rx) = async_channel::bounded(1);
        Self {
            dataset_rx,
            dataset_tx,
        }
    }
}

/// Start fetching the country dataset.
#[allow(clippy::needless_pass_by_value)]
fn start_dataset_load(
    mut commands: Commands,
    channels: Res<LoaderChannels>,
    paths: Res<AssetPaths>,
    #[cfg(not(target_family = "wasm"))] runtime: ResMut<TokioTasksRuntime>,
) {
    let client = Arc::new(Client::with_dataset_url(paths.dataset_url.clone()));
    let task_client = Arc::clone(&client);
    let radius = GlobeParams::default().radius;
    let tx = channels.dataset_tx.clone();

    #[cfg(not(target_family = "wasm"))]
    {
        runtime.spawn_background_task(move |_ctx| async move {
            let result = task_client.fetch_records(radius).await;
            let _ = tx.send(result).await;
        });
    }

    #[cfg(target_family = "wasm")]
    {
        AsyncComputeTaskPool::get()
            .spawn(async move {
                let result = task_client.fetch_records(radius).await;
                let _ = tx.send(result).await;
            })
            .detach();
    }

    tracing::info!("Started loading country dataset from {}", client.dataset_url());
    commands.insert_resource(LoaderState {
        client,
        finished: false,
    });
}

/// Poll the dataset loading task.
#[allow(clippy::needless_pass_by_value)]
fn poll_dataset_task(
    mut state: ResMut<LoaderState>,
    channels: Res<LoaderChannels>,
    mut countries: ResMut<Countries>,
) {
    // The dataset is fetched exactly once.
    if state.finished {
        return;
    }

    let Ok(result) = channels.dataset_rx.try_recv() else {
        return;
    };
    state.finished = true;

    match result {
        Ok(records) => {
            tracing::info!(
                "Loaded {} countries from {}",
                records.len(),
                state.client.dataset_url()
            );
            countries.state = Some(PickingState::new(records, PaletteColors::default()));
        }
        Err(e) => {
            tracing::error!(
                "Failed to load country dataset, picking and labels disabled: {}",
                e
            );
        }
    }
}
