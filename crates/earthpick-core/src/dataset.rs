//! Country dataset parsing and record construction.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::error::{DatasetError, DatasetResult};
use crate::palette::MAX_COUNTRIES;

/// One entry of the country dataset as served over HTTP.
///
/// `min` and `max` are the `[lon, lat]` corners of the country's bounding box
/// in degrees.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryInfo {
    pub name: String,
    pub lat: f32,
    pub lon: f32,
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl CountryInfo {
    /// Area of the lat/lon bounding box in square degrees.
    #[must_use]
    pub fn bounding_box_area(&self) -> f32 {
        let width = self.max[0] - self.min[0];
        let height = self.max[1] - self.min[1];
        width * height
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.min.iter().chain(&self.max).all(|v| v.is_finite())
    }
}

/// A country as seen by the picking and label systems.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    /// Identity baked into the index texture, `1..=N`.
    pub index: u32,
    pub name: String,
    /// Label anchor on the globe surface.
    pub centroid: Vec3,
    pub bounding_box_area: f32,
    pub selected: bool,
}

/// Parse and validate the JSON country dataset.
pub fn parse_country_infos(bytes: &[u8]) -> DatasetResult<Vec<CountryInfo>> {
    let infos: Vec<CountryInfo> = serde_json::from_slice(bytes)?;

    for (position, info) in infos.iter().enumerate() {
        if info.name.trim().is_empty() {
            return Err(DatasetError::EmptyName { position });
        }
        if !info.is_finite() {
            return Err(DatasetError::NonFinite {
                name: info.name.clone(),
            });
        }
    }

    Ok(infos)
}

/// Build country records from dataset entries.
///
/// The entry at position `k` gets index `k + 1`, matching the index texture.
/// Entries that do not fit in the palette are dropped.
#[must_use]
pub fn build_records(infos: &[CountryInfo], radius: f32) -> Vec<CountryRecord> {
    let capacity = MAX_COUNTRIES - 1;
    if infos.len() > capacity {
        tracing::warn!(
            "Dataset has {} countries but the palette holds {}; dropping the rest",
            infos.len(),
            capacity
        );
    }

    infos
        .iter()
        .take(capacity)
        .zip(1u32..)
        .map(|(info, index)| CountryRecord {
            index,
            name: info.name.clone(),
            centroid: anchor_position(info.lat, info.lon, radius),
            bounding_box_area: info.bounding_box_area(),
            selected: false,
        })
        .collect()
}

/// Place a latitude/longitude (degrees) on a globe of the given radius.
///
/// Matches the texture layout of [`crate::uv_sphere`]: `(0, 0)` lands on +X
/// and the north pole on +Y.
#[must_use]
pub fn anchor_position(lat: f32, lon: f32, radius: f32) -> Vec3 {
    let lon_rotation = Quat::from_rotation_y(lon.to_radians() + PI * 1.5);
    let lat_rotation = Quat::from_rotation_x(lat.to_radians() + PI);
    lon_rotation * lat_rotation * Vec3::new(0.0, 0.0, radius)
}
