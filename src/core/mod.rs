//! Core processing stages: correction and geolocation

pub mod correct;
pub mod geolocate;

// Re-export main types
pub use correct::{CorrectionParams, Corrector, ScaleConvention};
pub use geolocate::{
    geolocate, linspace, meshgrid, parse_grid_corners, reproject_to_geographic, sinusoidal_grid,
    GeolocationSource, GridCorners, GridSource, SINUSOIDAL_PROJ4, STRUCT_METADATA,
};
