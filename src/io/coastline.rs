//! Coastline polylines from Natural Earth GeoJSON files.

use crate::types::ZooResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Coastline database resolution, crude to full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoastlineResolution {
    Crude,
    #[default]
    Low,
    Intermediate,
    High,
    Full,
}

impl CoastlineResolution {
    /// Natural Earth scale serving this resolution
    pub fn natural_earth_scale(self) -> &'static str {
        match self {
            Self::Crude | Self::Low => "110m",
            Self::Intermediate => "50m",
            Self::High | Self::Full => "10m",
        }
    }

    pub fn file_names(self) -> [String; 2] {
        let scale = self.natural_earth_scale();
        [
            format!("ne_{}_coastline.geojson", scale),
            format!("ne_{}_coastline.json", scale),
        ]
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

/// Coastline polylines as (lon, lat) vertices
#[derive(Debug, Clone, Default)]
pub struct Coastlines {
    lines: Vec<Vec<(f64, f64)>>,
}

impl Coastlines {
    pub fn from_geojson_str(text: &str) -> ZooResult<Self> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        let mut lines = Vec::new();

        for geometry in collection.features.into_iter().filter_map(|f| f.geometry) {
            match geometry {
                Geometry::LineString { coordinates } => lines.push(to_line(coordinates)),
                Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                    lines.extend(coordinates.into_iter().map(to_line))
                }
                Geometry::MultiPolygon { coordinates } => lines.extend(
                    coordinates
                        .into_iter()
                        .flat_map(|polygon| polygon.into_iter().map(to_line)),
                ),
                Geometry::Unsupported => {}
            }
        }

        lines.retain(|line| line.len() >= 2);
        Ok(Self { lines })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ZooResult<Self> {
        log::info!("Reading coastlines from: {}", path.as_ref().display());
        let text = std::fs::read_to_string(path.as_ref())?;
        let coastlines = Self::from_geojson_str(&text)?;
        log::debug!("Loaded {} coastline segments", coastlines.len());
        Ok(coastlines)
    }

    /// Find the coastline file for a resolution inside `dir`
    pub fn locate(dir: &Path, resolution: CoastlineResolution) -> Option<PathBuf> {
        resolution
            .file_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load coastlines when a database is available.
    ///
    /// Rendering goes on without coastlines when none is found or the file
    /// cannot be read.
    pub fn load(dir: Option<&Path>, resolution: CoastlineResolution) -> Option<Self> {
        let Some(dir) = dir else {
            log::warn!("No coastline directory configured, coastlines will not be drawn");
            return None;
        };

        let Some(path) = Self::locate(dir, resolution) else {
            log::warn!(
                "No {} coastline file in {}, coastlines will not be drawn",
                resolution.natural_earth_scale(),
                dir.display()
            );
            return None;
        };

        match Self::from_file(&path) {
            Ok(coastlines) => Some(coastlines),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn lines(&self) -> &[Vec<(f64, f64)>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn to_line(coordinates: Vec<Vec<f64>>) -> Vec<(f64, f64)> {
    coordinates
        .into_iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_scales() {
        assert_eq!(CoastlineResolution::Low.natural_earth_scale(), "110m");
        assert_eq!(CoastlineResolution::Intermediate.natural_earth_scale(), "50m");
        assert_eq!(CoastlineResolution::Full.natural_earth_scale(), "10m");
    }

    #[test]
    fn test_geojson_geometries() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry":
                    {"type": "LineString", "coordinates": [[120.0, 30.0], [121.0, 31.5]]}},
                {"type": "Feature", "properties": {}, "geometry":
                    {"type": "MultiLineString", "coordinates": [
                        [[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]],
                        [[5.0, 5.0]]
                    ]}},
                {"type": "Feature", "properties": {}, "geometry":
                    {"type": "Point", "coordinates": [3.0, 3.0]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#;

        let coastlines = Coastlines::from_geojson_str(text).unwrap();

        // The single-vertex line and the point are dropped
        assert_eq!(coastlines.len(), 2);
        assert_eq!(coastlines.lines()[0], vec![(120.0, 30.0), (121.0, 31.5)]);
        assert_eq!(coastlines.lines()[1].len(), 3);
    }

    #[test]
    fn test_load_without_directory() {
        assert!(Coastlines::load(None, CoastlineResolution::Low).is_none());
    }
}
