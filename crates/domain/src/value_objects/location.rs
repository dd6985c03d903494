//! Player location and the projection from geographic to map coordinates.

use serde::{Deserialize, Serialize};

pub const MAP_WIDTH: f64 = 3600.0;
pub const MAP_HEIGHT: f64 = 2400.0;
const MAP_MARGIN: f64 = 0.075;
const MAP_SCALE: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub description: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

/// Geographic bounds of the world map (`world.mapConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_lng: 100.0,
            max_lng: 130.0,
            min_lat: 25.0,
            max_lat: 45.0,
        }
    }
}

impl MapConfig {
    /// Project longitude/latitude onto the virtual map. Inputs outside the
    /// bounds are clamped; north is up.
    pub fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let lng = longitude.clamp(self.min_lng.min(self.max_lng), self.max_lng.max(self.min_lng));
        let lat = latitude.clamp(self.min_lat.min(self.max_lat), self.max_lat.max(self.min_lat));

        let lng_span = self.max_lng - self.min_lng;
        let lat_span = self.max_lat - self.min_lat;
        let fx = if lng_span == 0.0 { 0.5 } else { (lng - self.min_lng) / lng_span };
        let fy = if lat_span == 0.0 { 0.5 } else { (self.max_lat - lat) / lat_span };

        (
            fx * MAP_WIDTH * MAP_SCALE + MAP_WIDTH * MAP_MARGIN,
            fy * MAP_HEIGHT * MAP_SCALE + MAP_HEIGHT * MAP_MARGIN,
        )
    }
}
