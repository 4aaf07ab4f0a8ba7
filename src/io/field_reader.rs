use crate::types::{FieldAttributes, RasterField, ZooError, ZooResult};
use gdal::cpl::CslStringList;
use gdal::raster::{Group, MDArray};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixes one axis of a 3D array to reduce it to a 2D field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSlice {
    pub axis: usize,
    pub index: usize,
}

/// Names the array to read, and the channel to take when it is 3D
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub name: String,
    #[serde(default)]
    pub channel: Option<ChannelSlice>,
}

impl FieldSelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: None,
        }
    }

    pub fn with_channel(mut self, axis: usize, index: usize) -> Self {
        self.channel = Some(ChannelSlice { axis, index });
        self
    }
}

/// Read window (start, count) and resulting 2D shape for an array of the
/// given dimensions
pub fn slice_window(
    dims: &[usize],
    channel: Option<&ChannelSlice>,
) -> ZooResult<(Vec<u64>, Vec<usize>, (usize, usize))> {
    match (dims.len(), channel) {
        (2, None) => Ok((vec![0, 0], dims.to_vec(), (dims[0], dims[1]))),
        (3, Some(slice)) => {
            if slice.axis >= 3 {
                return Err(ZooError::InvalidFormat(format!(
                    "Channel axis {} out of range for a 3-D array",
                    slice.axis
                )));
            }
            if slice.index >= dims[slice.axis] {
                return Err(ZooError::InvalidFormat(format!(
                    "Channel index {} out of range (axis {} has {} entries)",
                    slice.index, slice.axis, dims[slice.axis]
                )));
            }

            let mut start = vec![0u64; 3];
            let mut count = dims.to_vec();
            start[slice.axis] = slice.index as u64;
            count[slice.axis] = 1;

            let kept: Vec<usize> = dims
                .iter()
                .enumerate()
                .filter(|(axis, _)| *axis != slice.axis)
                .map(|(_, &size)| size)
                .collect();

            Ok((start, count, (kept[0], kept[1])))
        }
        (2, Some(_)) => Err(ZooError::InvalidFormat(
            "Cannot take a channel from a 2-D array".to_string(),
        )),
        (3, None) => Err(ZooError::InvalidFormat(
            "A 3-D array needs a channel to reduce it to 2-D".to_string(),
        )),
        (n, _) => Err(ZooError::InvalidFormat(format!(
            "Unsupported array rank {} (expected 2 or 3)",
            n
        ))),
    }
}

/// Reader for netCDF-style containers (netCDF, HDF4, HDF-EOS) through the
/// GDAL multidimensional API
pub struct FieldReader {
    path: PathBuf,
    dataset: Dataset,
}

impl FieldReader {
    pub fn open<P: AsRef<Path>>(path: P) -> ZooResult<Self> {
        log::info!("Opening data container: {}", path.as_ref().display());

        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER,
            ..Default::default()
        };
        let dataset = Dataset::open_ex(path.as_ref(), options)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            dataset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a named field as 2D f64 together with its attributes.
    ///
    /// The array is searched for anywhere in the group hierarchy.
    pub fn read_field(&self, selector: &FieldSelector) -> ZooResult<RasterField> {
        let root = self.dataset.root_group()?;

        let field = visit_array(&root, &selector.name, &mut |array| {
            let dims = array_dims(array)?;
            log::debug!("Array {} has dimensions {:?}", selector.name, dims);

            let (start, count, shape) = slice_window(&dims, selector.channel.as_ref())?;
            let values = array.read_as::<f64>(start, count)?;
            let data = Array2::from_shape_vec(shape, values).map_err(|e| {
                ZooError::Processing(format!("Failed to reshape {}: {}", selector.name, e))
            })?;

            let attributes = read_attributes(array);
            log::debug!("Attributes of {}: {:?}", selector.name, attributes);

            Ok(RasterField::new(selector.name.clone(), data, attributes))
        })?;

        let field = field.ok_or_else(|| {
            ZooError::MissingField(format!("{} in {}", selector.name, self.path.display()))
        })?;

        log::info!(
            "Read field {} with shape {:?}",
            field.name,
            field.shape()
        );
        Ok(field)
    }

    /// Read a string attribute stored on the root group or any nested group
    pub fn read_global_string(&self, name: &str) -> ZooResult<String> {
        let root = self.dataset.root_group()?;
        find_group_attribute(&root, name).ok_or_else(|| {
            ZooError::Metadata(format!(
                "Attribute {} not found in {}",
                name,
                self.path.display()
            ))
        })
    }
}

fn array_dims(array: &MDArray) -> ZooResult<Vec<usize>> {
    Ok(array.dimensions()?.iter().map(|d| d.size()).collect())
}

/// Depth-first search for an array by name, applying `read` to the first hit
fn visit_array<R, F>(group: &Group, name: &str, read: &mut F) -> ZooResult<Option<R>>
where
    F: FnMut(&MDArray) -> ZooResult<R>,
{
    if group
        .array_names(CslStringList::new())
        .iter()
        .any(|n| n == name)
    {
        let array = group.open_md_array(name, CslStringList::new())?;
        return read(&array).map(Some);
    }

    for child in group.group_names(CslStringList::new()) {
        let subgroup = match group.open_group(&child, CslStringList::new()) {
            Ok(g) => g,
            Err(e) => {
                log::debug!("Skipping group {}: {}", child, e);
                continue;
            }
        };
        if let Some(result) = visit_array(&subgroup, name, read)? {
            return Ok(Some(result));
        }
    }

    Ok(None)
}

fn find_group_attribute(group: &Group, name: &str) -> Option<String> {
    if let Ok(attribute) = group.attribute(name) {
        return Some(attribute.read_as_string());
    }

    group
        .group_names(CslStringList::new())
        .iter()
        .filter_map(|child| group.open_group(child, CslStringList::new()).ok())
        .find_map(|subgroup| find_group_attribute(&subgroup, name))
}

fn read_attributes(array: &MDArray) -> FieldAttributes {
    let number = |key: &str| array.attribute(key).ok().map(|a| a.read_as_f64());
    let text = |key: &str| {
        array
            .attribute(key)
            .ok()
            .map(|a| a.read_as_string())
            .filter(|s| !s.is_empty())
    };

    let valid_range = array
        .attribute("valid_range")
        .ok()
        .map(|a| a.read_as_f64_array())
        .and_then(|v| match v.as_slice() {
            [lo, hi] => Some((*lo, *hi)),
            _ => None,
        });

    let unit = array.unit();

    FieldAttributes {
        fill_value: number("_FillValue").or_else(|| array.no_data_value_as_double()),
        valid_range,
        scale_factor: number("scale_factor"),
        add_offset: number("add_offset"),
        units: text("units").or_else(|| Some(unit).filter(|u| !u.is_empty())),
        long_name: text("long_name"),
    }
}
