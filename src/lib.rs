//! eoszoo: Maps of HDF, HDF-EOS and netCDF satellite fields
//!
//! Each product is one linear run: the Loader reads a field and its
//! attributes, the Corrector masks fill and out-of-range samples and applies
//! the product's scale/offset convention, the Geolocator derives per-pixel
//! latitude/longitude, and the Renderer draws the field on a map and saves
//! `<input-stem>.<field>.png`.

pub mod config;
pub mod core;
pub mod io;
pub mod pipeline;
pub mod products;
pub mod render;
pub mod types;

// Re-export main types and functions for easier access
pub use config::Settings;
pub use pipeline::{CorrectionPolicy, FieldRenderer, FillPolicy, ProductConfig};
pub use types::{
    BoundingBox, FieldAttributes, GeoGrid, MaskedField, RasterField, ZooError, ZooResult,
};

pub use crate::core::{CorrectionParams, Corrector, GeolocationSource, GridCorners, ScaleConvention};
pub use io::{resolve_input, FieldReader, FieldSelector};
pub use render::{render_figure, MapProjection, RenderSpec};
