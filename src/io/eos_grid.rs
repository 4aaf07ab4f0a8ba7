use crate::types::{FieldAttributes, RasterField, ZooError, ZooResult};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::path::Path;

/// Reader for a single HDF-EOS grid field opened through the classic GDAL
/// raster API (`HDF4_EOS:EOS_GRID` subdataset).
///
/// Used when the grid geometry should come from the driver's geotransform
/// instead of the `StructMetadata` text.
pub struct EosGridReader {
    dataset: Dataset,
    field_name: String,
}

impl EosGridReader {
    /// GDAL subdataset name for a field of an HDF-EOS grid
    pub fn subdataset_name(path: &Path, grid_name: &str, field_name: &str) -> String {
        format!(
            "HDF4_EOS:EOS_GRID:\"{}\":{}:{}",
            path.display(),
            grid_name,
            field_name
        )
    }

    pub fn open(path: &Path, grid_name: &str, field_name: &str) -> ZooResult<Self> {
        let name = Self::subdataset_name(path, grid_name, field_name);
        log::info!("Opening grid subdataset: {}", name);

        let dataset = Dataset::open(Path::new(&name))?;

        Ok(Self {
            dataset,
            field_name: field_name.to_string(),
        })
    }

    /// Raster size as (columns, rows)
    pub fn raster_size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    pub fn geo_transform(&self) -> ZooResult<[f64; 6]> {
        let gt = self.dataset.geo_transform()?;
        log::debug!("Grid geotransform: {:?}", gt);
        Ok(gt)
    }

    /// Read band 1 and the field attributes from the dataset metadata
    pub fn read_field(&self) -> ZooResult<RasterField> {
        let (width, height) = self.dataset.raster_size();
        log::debug!("Grid size: {}x{}", width, height);

        let rasterband = self.dataset.rasterband(1)?;
        let band_data =
            rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

        let data = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| ZooError::Processing(format!("Failed to reshape grid data: {}", e)))?;

        let mut attributes = self.attributes();
        if attributes.fill_value.is_none() {
            attributes.fill_value = rasterband.no_data_value();
        }
        log::debug!("Attributes of {}: {:?}", self.field_name, attributes);

        Ok(RasterField::new(self.field_name.clone(), data, attributes))
    }

    fn attributes(&self) -> FieldAttributes {
        let item = |key: &str| self.dataset.metadata_item(key, "");
        let number = |key: &str| item(key).and_then(|v| v.trim().parse::<f64>().ok());

        FieldAttributes {
            fill_value: number("_FillValue"),
            valid_range: item("valid_range").and_then(|v| parse_range(&v)),
            scale_factor: number("scale_factor"),
            add_offset: number("add_offset"),
            units: item("units"),
            long_name: item("long_name"),
        }
    }
}

/// Parse a `"min, max"` metadata item
pub fn parse_range(text: &str) -> Option<(f64, f64)> {
    let values: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match values.as_slice() {
        [lo, hi] => Some((*lo, *hi)),
        _ => None,
    }
}
