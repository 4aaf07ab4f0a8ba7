use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Raw 2D measurement array (rows x columns)
pub type RawImage = Array2<f64>;

/// Attributes attached to a data field in the container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldAttributes {
    pub fill_value: Option<f64>,
    pub valid_range: Option<(f64, f64)>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// A named 2D field as read from the container, before correction
#[derive(Debug, Clone)]
pub struct RasterField {
    pub name: String,
    pub data: RawImage,
    pub attributes: FieldAttributes,
}

impl RasterField {
    pub fn new(name: impl Into<String>, data: RawImage, attributes: FieldAttributes) -> Self {
        Self {
            name: name.into(),
            data,
            attributes,
        }
    }

    /// Shape as (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Corrected field in physical units.
///
/// Masked samples are stored as NaN and never take part in rendering or
/// colour scaling.
#[derive(Debug, Clone)]
pub struct MaskedField {
    data: Array2<f64>,
}

impl MaskedField {
    /// Wrap an array, masking every non-finite sample
    pub fn from_array(mut data: Array2<f64>) -> Self {
        data.mapv_inplace(|v| if v.is_finite() { v } else { f64::NAN });
        Self { data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Value at (row, col), or `None` when masked or out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied().filter(|v| v.is_finite())
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_none()
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    pub fn masked_count(&self) -> usize {
        self.data.len() - self.valid_count()
    }

    /// Min and max over unmasked samples
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Per-pixel latitude and longitude, same shape as the field they locate
#[derive(Debug, Clone)]
pub struct GeoGrid {
    pub latitude: Array2<f64>,
    pub longitude: Array2<f64>,
}

impl GeoGrid {
    pub fn new(latitude: Array2<f64>, longitude: Array2<f64>) -> ZooResult<Self> {
        if latitude.dim() != longitude.dim() {
            return Err(ZooError::InvalidFormat(format!(
                "Latitude shape {:?} does not match longitude shape {:?}",
                latitude.dim(),
                longitude.dim()
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.latitude.dim()
    }

    /// Fail unless the grid locates a field of the given shape
    pub fn ensure_shape(&self, shape: (usize, usize)) -> ZooResult<()> {
        if self.dim() != shape {
            return Err(ZooError::InvalidFormat(format!(
                "Geolocation shape {:?} does not match field shape {:?}",
                self.dim(),
                shape
            )));
        }
        Ok(())
    }

    /// Extent of the finite coordinates, if any
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for (&lat, &lon) in self.latitude.iter().zip(self.longitude.iter()) {
            if !lat.is_finite() || !lon.is_finite() {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox {
                    min_lon: lon,
                    max_lon: lon,
                    min_lat: lat,
                    max_lat: lat,
                },
                Some(b) => BoundingBox {
                    min_lon: b.min_lon.min(lon),
                    max_lon: b.max_lon.max(lon),
                    min_lat: b.min_lat.min(lat),
                    max_lat: b.max_lat.max(lat),
                },
            });
        }
        bbox
    }
}

/// Error types for field loading and rendering
#[derive(Debug, thiserror::Error)]
pub enum ZooError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Field not found: {0}")]
    MissingField(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for zoo operations
pub type ZooResult<T> = Result<T, ZooError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_masked_field_ignores_non_finite() {
        let field = MaskedField::from_array(array![[1.0, f64::NAN], [f64::INFINITY, -4.0]]);

        assert_eq!(field.valid_count(), 2);
        assert_eq!(field.masked_count(), 2);
        assert!(field.is_masked(1, 0));
        assert_eq!(field.get(1, 1), Some(-4.0));
        assert_eq!(field.get(5, 5), None);
        assert_eq!(field.value_range(), Some((-4.0, 1.0)));
    }

    #[test]
    fn test_fully_masked_field_has_no_range() {
        let field = MaskedField::from_array(Array2::from_elem((2, 3), f64::NAN));
        assert_eq!(field.value_range(), None);
    }

    #[test]
    fn test_geogrid_shape_checks() {
        let lat = Array2::<f64>::zeros((2, 3));
        let lon = Array2::<f64>::zeros((3, 2));
        assert!(GeoGrid::new(lat.clone(), lon).is_err());

        let grid = GeoGrid::new(lat.clone(), lat).unwrap();
        assert!(grid.ensure_shape((2, 3)).is_ok());
        assert!(grid.ensure_shape((3, 2)).is_err());
    }

    #[test]
    fn test_geogrid_bounding_box_skips_nan() {
        let lat = array![[10.0, 12.0], [f64::NAN, 11.0]];
        let lon = array![[-80.0, -78.0], [0.0, -85.0]];
        let bbox = GeoGrid::new(lat, lon).unwrap().bounding_box().unwrap();

        assert_eq!(bbox.min_lat, 10.0);
        assert_eq!(bbox.max_lat, 12.0);
        assert_eq!(bbox.min_lon, -85.0);
        assert_eq!(bbox.max_lon, -78.0);
    }
}
