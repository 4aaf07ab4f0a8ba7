use crate::io::field_reader::{FieldReader, FieldSelector};
use crate::types::{GeoGrid, ZooError, ZooResult};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use ndarray::{Array1, Array2};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// MODIS sinusoidal grid definition
pub const SINUSOIDAL_PROJ4: &str = "+proj=sinu +R=6371007.181 +nadgrids=@null +wktext";

/// Global attribute holding the HDF-EOS structural metadata
pub const STRUCT_METADATA: &str = "StructMetadata.0";

/// Where a product keeps its per-pixel geolocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeolocationSource {
    /// Separate latitude and longitude arrays
    Direct { latitude: String, longitude: String },
    /// One 3D array whose last axis holds latitude and longitude
    Combined {
        array: String,
        latitude_index: usize,
        longitude_index: usize,
    },
    /// Projected grid rebuilt from its corners and reprojected to lon/lat
    SinusoidalGrid { proj4: String, source: GridSource },
}

/// Where the projected grid corners come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridSource {
    /// Parse `UpperLeftPointMtrs` / `LowerRightMtrs` from a metadata attribute
    StructMetadata { attribute: String },
    /// Read the geotransform of an `HDF4_EOS:EOS_GRID` subdataset
    GeoTransform { grid_name: String },
}

/// Upper-left and lower-right corners of a projected grid, in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCorners {
    pub upper_left: (f64, f64),
    pub lower_right: (f64, f64),
}

impl GridCorners {
    /// Parse the grid corners from HDF-EOS structural metadata
    pub fn from_struct_metadata(metadata: &str) -> ZooResult<Self> {
        Ok(Self {
            upper_left: parse_point(metadata, "UpperLeftPointMtrs")?,
            lower_right: parse_point(metadata, "LowerRightMtrs")?,
        })
    }

    /// Corners spanned by `nx` x `ny` pixels of an affine geotransform
    pub fn from_geo_transform(gt: &[f64; 6], nx: usize, ny: usize) -> Self {
        Self {
            upper_left: (gt[0], gt[3]),
            lower_right: (gt[0] + gt[1] * nx as f64, gt[3] + gt[5] * ny as f64),
        }
    }

    /// Projected coordinate mesh with `ny` rows and `nx` columns.
    ///
    /// The first point is the upper-left corner and the last point the
    /// lower-right corner.
    pub fn mesh(&self, nx: usize, ny: usize) -> (Array2<f64>, Array2<f64>) {
        let xs = linspace(self.upper_left.0, self.lower_right.0, nx);
        let ys = linspace(self.upper_left.1, self.lower_right.1, ny);
        meshgrid(&xs, &ys)
    }
}

/// Grid corners from an HDF-EOS `StructMetadata` text block
pub fn parse_grid_corners(metadata: &str) -> ZooResult<GridCorners> {
    GridCorners::from_struct_metadata(metadata)
}

fn parse_point(metadata: &str, key: &str) -> ZooResult<(f64, f64)> {
    let pattern = format!(
        r"{}=\(\s*(?P<x>[+-]?\d+(?:\.\d+)?)\s*,\s*(?P<y>[+-]?\d+(?:\.\d+)?)\s*\)",
        key
    );
    let regex = Regex::new(&pattern)
        .map_err(|e| ZooError::Processing(format!("Regex error: {}", e)))?;

    let captures = regex
        .captures(metadata)
        .ok_or_else(|| ZooError::Metadata(format!("{} not found in grid metadata", key)))?;

    let coordinate = |name: &str| -> ZooResult<f64> {
        captures[name]
            .parse::<f64>()
            .map_err(|e| ZooError::Metadata(format!("Invalid {} coordinate: {}", key, e)))
    };

    Ok((coordinate("x")?, coordinate("y")?))
}

/// `n` evenly spaced values from `start` to `stop`, both included
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    Array1::linspace(start, stop, n)
}

/// Row-major coordinate matrices: `X[[i, j]] = xs[j]`, `Y[[i, j]] = ys[i]`
pub fn meshgrid(xs: &Array1<f64>, ys: &Array1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (ys.len(), xs.len());
    let x = Array2::from_shape_fn(shape, |(_, j)| xs[j]);
    let y = Array2::from_shape_fn(shape, |(i, _)| ys[i]);
    (x, y)
}

/// Transform projected coordinates to geographic latitude/longitude.
///
/// Points the transform cannot handle come back as NaN.
pub fn reproject_to_geographic(
    x: &Array2<f64>,
    y: &Array2<f64>,
    proj4: &str,
) -> ZooResult<GeoGrid> {
    if x.dim() != y.dim() {
        return Err(ZooError::InvalidFormat(format!(
            "X shape {:?} does not match Y shape {:?}",
            x.dim(),
            y.dim()
        )));
    }

    log::info!("Reprojecting {} grid points from {}", x.len(), proj4);

    let source = SpatialRef::from_proj4(proj4)?;
    let target = SpatialRef::from_epsg(4326)?;
    source.set_axis_mapping_strategy(
        gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
    );
    target.set_axis_mapping_strategy(
        gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
    );
    let transform = CoordTransform::new(&source, &target)?;

    let mut xs: Vec<f64> = x.iter().copied().collect();
    let mut ys: Vec<f64> = y.iter().copied().collect();
    let mut zs = vec![0.0; xs.len()];

    if let Err(e) = transform.transform_coords(&mut xs, &mut ys, &mut zs) {
        log::warn!("Bulk reprojection failed ({}), retrying point by point", e);

        xs = x.iter().copied().collect();
        ys = y.iter().copied().collect();
        for (px, py) in xs.iter_mut().zip(ys.iter_mut()) {
            let mut bx = [*px];
            let mut by = [*py];
            let mut bz = [0.0];
            match transform.transform_coords(&mut bx, &mut by, &mut bz) {
                Ok(()) => {
                    *px = bx[0];
                    *py = by[0];
                }
                Err(_) => {
                    *px = f64::NAN;
                    *py = f64::NAN;
                }
            }
        }
    }

    let shape = x.dim();
    let longitude = Array2::from_shape_vec(shape, xs)
        .map_err(|e| ZooError::Processing(format!("Failed to reshape longitudes: {}", e)))?;
    let latitude = Array2::from_shape_vec(shape, ys)
        .map_err(|e| ZooError::Processing(format!("Failed to reshape latitudes: {}", e)))?;

    GeoGrid::new(latitude, longitude)
}

/// Rebuild the sinusoidal mesh from its corners and convert it to lon/lat
pub fn sinusoidal_grid(
    corners: &GridCorners,
    nx: usize,
    ny: usize,
    proj4: &str,
) -> ZooResult<GeoGrid> {
    log::debug!("Grid corners: {:?}, size {}x{}", corners, nx, ny);
    let (x, y) = corners.mesh(nx, ny);
    reproject_to_geographic(&x, &y, proj4)
}

/// Derive per-pixel coordinates for a field of `shape` read through `reader`
pub fn geolocate(
    source: &GeolocationSource,
    reader: &FieldReader,
    shape: (usize, usize),
) -> ZooResult<GeoGrid> {
    let grid = match source {
        GeolocationSource::Direct {
            latitude,
            longitude,
        } => {
            log::info!("Reading geolocation arrays {} / {}", latitude, longitude);
            let lat = reader.read_field(&FieldSelector::new(latitude.as_str()))?;
            let lon = reader.read_field(&FieldSelector::new(longitude.as_str()))?;
            GeoGrid::new(lat.data, lon.data)?
        }
        GeolocationSource::Combined {
            array,
            latitude_index,
            longitude_index,
        } => {
            log::info!("Splitting combined geolocation array {}", array);
            let lat = reader
                .read_field(&FieldSelector::new(array.as_str()).with_channel(2, *latitude_index))?;
            let lon = reader
                .read_field(&FieldSelector::new(array.as_str()).with_channel(2, *longitude_index))?;
            GeoGrid::new(lat.data, lon.data)?
        }
        GeolocationSource::SinusoidalGrid { proj4, source } => match source {
            GridSource::StructMetadata { attribute } => {
                let metadata = reader.read_global_string(attribute)?;
                let corners = parse_grid_corners(&metadata)?;
                let (ny, nx) = shape;
                sinusoidal_grid(&corners, nx, ny, proj4)?
            }
            GridSource::GeoTransform { grid_name } => {
                return Err(ZooError::Processing(format!(
                    "Grid {} geometry comes from its geotransform and must be read with the EOS grid reader",
                    grid_name
                )));
            }
        },
    };

    grid.ensure_shape(shape)?;
    if let Some(bbox) = grid.bounding_box() {
        log::debug!("Geolocation extent: {:?}", bbox);
    }
    Ok(grid)
}
