//! Core logic for the earthpick globe viewer.
//!
//! This crate holds everything about country picking that does not need a
//! GPU: building country records from the dataset, decoding pick pixels,
//! keeping the selection palette in step with selection state, telling clicks
//! from drags, and placing labels from camera matrices. The viewer feeds it
//! pixels and matrices and pushes the palette it produces back to the GPU.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Renderer-agnostic**: Only `glam` math, no engine types
//! - **Web-compatible**: Compiles to WASM
//!
//! # Key types
//!
//! - [`PickingState`]: Country records, selection count and palette
//! - [`ClickGesture`]: Click-vs-drag discrimination
//! - [`place_label`]: Per-frame label visibility and screen position
//! - [`uv_sphere`]: Sphere geometry shared by every globe layer
//! - [`ViewSettings`]: Control panel state and its reducer

mod error;

pub mod dataset;
pub mod geometry;
pub mod gesture;
pub mod labels;
pub mod palette;
pub mod selection;
pub mod settings;

pub use dataset::{CountryInfo, CountryRecord, anchor_position, build_records, parse_country_infos};
pub use error::{DatasetError, DatasetResult};
pub use geometry::{GlobeParams, SphereGeometry, uv_sphere};
pub use gesture::{ClickGesture, GestureOutcome, PickSettings};
pub use labels::{LabelPlacement, LabelSettings, facing_dot, is_eligible, place_label};
pub use palette::{MAX_COUNTRIES, Palette, PaletteColors};
pub use selection::{Modifiers, PickingState, SelectionChange, decode_index};
pub use settings::{PanelChange, ViewSettings};

/// Country index reserved for "no country" (ocean or a miss).
pub const OCEAN_INDEX: u32 = 0;
