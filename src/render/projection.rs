//! Map projections used for plotting.
//!
//! Each projection maps (lon, lat) in degrees to plane coordinates and has a
//! fixed rectangular extent that becomes the plot area. Polar maps use the
//! spherical stereographic formulas with the pole at the origin; the
//! cylindrical map is plate carrée in degrees.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

/// Sphere radius for the stereographic maps (metres)
pub const EARTH_RADIUS: f64 = 6_370_997.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapProjection {
    /// Equidistant cylindrical map bounded by its lower-left and upper-right corners
    Cylindrical {
        lower_left_lat: f64,
        upper_right_lat: f64,
        lower_left_lon: f64,
        upper_right_lon: f64,
    },
    /// South polar stereographic, square around the `bounding_lat` circle;
    /// `central_lon` points up
    SouthPolarStereographic { bounding_lat: f64, central_lon: f64 },
    /// North polar stereographic, square around the `bounding_lat` circle;
    /// `central_lon` points down
    NorthPolarStereographic { bounding_lat: f64, central_lon: f64 },
}

/// Rectangle in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl MapExtent {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

impl MapProjection {
    pub fn cylindrical(lat_range: (f64, f64), lon_range: (f64, f64)) -> Self {
        Self::Cylindrical {
            lower_left_lat: lat_range.0,
            upper_right_lat: lat_range.1,
            lower_left_lon: lon_range.0,
            upper_right_lon: lon_range.1,
        }
    }

    pub fn south_polar(bounding_lat: f64, central_lon: f64) -> Self {
        Self::SouthPolarStereographic {
            bounding_lat,
            central_lon,
        }
    }

    pub fn north_polar(bounding_lat: f64, central_lon: f64) -> Self {
        Self::NorthPolarStereographic {
            bounding_lat,
            central_lon,
        }
    }

    /// Project (lon, lat) in degrees; `None` for non-finite input and for the
    /// pole opposite a stereographic map's centre
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }

        match *self {
            // The seam sits opposite the map centre
            Self::Cylindrical {
                lower_left_lon,
                upper_right_lon,
                ..
            } => {
                let west = (lower_left_lon + upper_right_lon) / 2.0 - 180.0;
                Some((wrap_longitude(lon, west), lat))
            }
            Self::SouthPolarStereographic { central_lon, .. } => {
                if lat >= 90.0 {
                    return None;
                }
                let rho = south_rho(lat);
                let dl = (lon - central_lon).to_radians();
                Some((rho * dl.sin(), rho * dl.cos()))
            }
            Self::NorthPolarStereographic { central_lon, .. } => {
                if lat <= -90.0 {
                    return None;
                }
                let rho = north_rho(lat);
                let dl = (lon - central_lon).to_radians();
                Some((rho * dl.sin(), -rho * dl.cos()))
            }
        }
    }

    pub fn extent(&self) -> MapExtent {
        match *self {
            Self::Cylindrical {
                lower_left_lat,
                upper_right_lat,
                lower_left_lon,
                upper_right_lon,
            } => MapExtent {
                x_min: lower_left_lon,
                x_max: upper_right_lon,
                y_min: lower_left_lat,
                y_max: upper_right_lat,
            },
            Self::SouthPolarStereographic { bounding_lat, .. } => square(south_rho(bounding_lat)),
            Self::NorthPolarStereographic { bounding_lat, .. } => square(north_rho(bounding_lat)),
        }
    }

    /// Latitude span worth sampling when drawing meridians
    pub fn latitude_span(&self) -> (f64, f64) {
        match *self {
            Self::Cylindrical {
                lower_left_lat,
                upper_right_lat,
                ..
            } => (lower_left_lat, upper_right_lat),
            // The square's corners reach past the bounding circle
            Self::SouthPolarStereographic { bounding_lat, .. } => {
                (-90.0, (bounding_lat + 20.0).min(89.0))
            }
            Self::NorthPolarStereographic { bounding_lat, .. } => {
                ((bounding_lat - 20.0).max(-89.0), 90.0)
            }
        }
    }

    /// Longitude span worth sampling when drawing parallels
    pub fn longitude_span(&self) -> (f64, f64) {
        match *self {
            Self::Cylindrical {
                lower_left_lon,
                upper_right_lon,
                ..
            } => (lower_left_lon, upper_right_lon),
            _ => (-180.0, 180.0),
        }
    }
}

fn south_rho(lat: f64) -> f64 {
    2.0 * EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan()
}

fn north_rho(lat: f64) -> f64 {
    2.0 * EARTH_RADIUS * (FRAC_PI_4 - lat.to_radians() / 2.0).tan()
}

fn square(half: f64) -> MapExtent {
    MapExtent {
        x_min: -half,
        x_max: half,
        y_min: -half,
        y_max: half,
    }
}

/// Shift `lon` by whole turns into `[west, west + 360)`
pub fn wrap_longitude(lon: f64, west: f64) -> f64 {
    west + (lon - west).rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_longitude() {
        assert_relative_eq!(wrap_longitude(-80.0, -87.5), -80.0);
        assert_relative_eq!(wrap_longitude(280.0, -87.5), -80.0);
        assert_relative_eq!(wrap_longitude(-170.0, 121.0), 190.0);
    }

    #[test]
    fn test_cylindrical_is_identity_inside_extent() {
        let proj = MapProjection::cylindrical((30.0, 36.0), (121.0, 133.0));
        assert_eq!(proj.forward(125.5, 33.25), Some((125.5, 33.25)));

        let extent = proj.extent();
        assert!(extent.contains(125.5, 33.25));
        assert!(!extent.contains(120.0, 33.25));

        // Just west of the map stays next to its west edge
        let (x, _) = proj.forward(120.95, 33.0).unwrap();
        assert_relative_eq!(x, 120.95);
        let (x, _) = proj.forward(-170.0, 33.0).unwrap();
        assert_relative_eq!(x, 190.0);
        assert_eq!(extent.width(), 12.0);
        assert_eq!(extent.height(), 6.0);
    }

    #[test]
    fn test_south_polar_orientation() {
        let proj = MapProjection::south_polar(-65.0, 180.0);

        let (x, y) = proj.forward(0.0, -90.0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);

        // Central meridian points up
        let (x, y) = proj.forward(180.0, -70.0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert!(y > 0.0);

        // Bounding circle touches the extent
        let (_, y) = proj.forward(180.0, -65.0).unwrap();
        assert_relative_eq!(y, proj.extent().y_max, epsilon = 1e-6);

        assert!(proj.forward(0.0, 90.0).is_none());
    }

    #[test]
    fn test_north_polar_orientation() {
        let proj = MapProjection::north_polar(60.0, 0.0);
        let (x, y) = proj.forward(0.0, 70.0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert!(y < 0.0);
        assert!(proj.forward(0.0, -90.0).is_none());
    }

    #[test]
    fn test_nan_input() {
        let proj = MapProjection::south_polar(-65.0, 180.0);
        assert!(proj.forward(f64::NAN, -70.0).is_none());
    }
}
