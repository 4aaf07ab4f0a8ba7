//! The linear Loader → Corrector → Geolocator → Renderer run shared by
//! every product binary.

use crate::config::Settings;
use crate::core::correct::{CorrectionParams, Corrector, ScaleConvention};
use crate::core::geolocate::{geolocate, sinusoidal_grid, GeolocationSource, GridCorners, GridSource};
use crate::io::coastline::Coastlines;
use crate::io::eos_grid::EosGridReader;
use crate::io::field_reader::{FieldReader, FieldSelector};
use crate::render::figure::{render_figure, save_png, FigureInputs, RenderSpec};
use crate::render::text::TextRenderer;
use crate::types::{FieldAttributes, GeoGrid, RasterField, ZooError, ZooResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Where the fill value comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillPolicy {
    /// `_FillValue` attribute, if present
    #[default]
    Attribute,
    /// Value documented for the product regardless of attributes
    Fixed { value: f64 },
    /// No fill masking
    Ignore,
}

/// Per-product correction rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionPolicy {
    #[serde(default)]
    pub convention: ScaleConvention,
    #[serde(default)]
    pub fill: FillPolicy,
    /// Mask raw values outside the `valid_range` attribute
    #[serde(default)]
    pub use_valid_range: bool,
}

impl CorrectionPolicy {
    pub fn params_for(&self, attributes: &FieldAttributes) -> CorrectionParams {
        let mut params = CorrectionParams::from_attributes(attributes, self.convention);
        params.fill_value = match self.fill {
            FillPolicy::Attribute => attributes.fill_value,
            FillPolicy::Fixed { value } => Some(value),
            FillPolicy::Ignore => None,
        };
        if !self.use_valid_range {
            params.valid_range = None;
        }
        params
    }
}

/// Everything that distinguishes one product script from another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Input file name, resolved against `HDFEOS_ZOO_DIR`
    pub file_name: String,
    pub field: FieldSelector,
    #[serde(default)]
    pub correction: CorrectionPolicy,
    pub geolocation: GeolocationSource,
    pub render: RenderSpec,
    /// Title template; `{name}`, `{long_name}` and `{units}` are substituted
    pub title: String,
    /// Units shown in the title instead of the `units` attribute
    #[serde(default)]
    pub units_override: Option<String>,
}

impl ProductConfig {
    pub fn from_json_str(text: &str) -> ZooResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ZooResult<Self> {
        log::info!("Reading product configuration: {}", path.as_ref().display());
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn title_for(&self, field: &RasterField) -> String {
        let long_name = field
            .attributes
            .long_name
            .as_deref()
            .unwrap_or(&field.name)
            .replace('_', " ");
        let units = self
            .units_override
            .as_deref()
            .or(field.attributes.units.as_deref())
            .unwrap_or("");

        self.title
            .replace("{name}", &field.name)
            .replace("{long_name}", &long_name)
            .replace("{units}", units)
    }
}

/// Runs one product through the whole pipeline
pub struct FieldRenderer {
    config: ProductConfig,
    settings: Settings,
}

impl FieldRenderer {
    pub fn new(config: ProductConfig, settings: Settings) -> Self {
        Self { config, settings }
    }

    pub fn config(&self) -> &ProductConfig {
        &self.config
    }

    pub fn input_path(&self) -> PathBuf {
        self.settings.input_path(&self.config.file_name)
    }

    pub fn output_path(&self, input: &Path) -> ZooResult<PathBuf> {
        self.settings.output_path(input, &self.config.field.name)
    }

    /// Read the raw field and its per-pixel coordinates
    pub fn load(&self, input: &Path) -> ZooResult<(RasterField, GeoGrid)> {
        if !input.is_file() {
            return Err(ZooError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Input file not found: {}", input.display()),
            )));
        }

        match &self.config.geolocation {
            GeolocationSource::SinusoidalGrid {
                proj4,
                source: GridSource::GeoTransform { grid_name },
            } => {
                let reader = EosGridReader::open(input, grid_name, &self.config.field.name)?;
                let field = reader.read_field()?;
                let (nx, ny) = reader.raster_size();
                let corners = GridCorners::from_geo_transform(&reader.geo_transform()?, nx, ny);
                let grid = sinusoidal_grid(&corners, nx, ny, proj4)?;
                Ok((field, grid))
            }
            source => {
                let reader = FieldReader::open(input)?;
                let field = reader.read_field(&self.config.field)?;
                let grid = geolocate(source, &reader, field.shape())?;
                Ok((field, grid))
            }
        }
    }

    /// Correct and render an already loaded field
    pub fn render(
        &self,
        field: &RasterField,
        grid: &GeoGrid,
        coastlines: Option<&Coastlines>,
        text: Option<&TextRenderer>,
    ) -> ZooResult<RgbaImage> {
        let params = self.config.correction.params_for(&field.attributes);
        let corrected = Corrector::new(params).correct_field(field);
        grid.ensure_shape(corrected.dim())?;

        let title = self.config.title_for(field);
        render_figure(
            &self.config.render,
            &FigureInputs {
                field: &corrected,
                grid,
                title: &title,
                coastlines,
                text,
            },
        )
    }

    /// Run the pipeline once; returns the written PNG path
    pub fn run(&self) -> ZooResult<PathBuf> {
        let input = self.input_path();
        log::info!(
            "Rendering {} from {}",
            self.config.field.name,
            input.display()
        );

        let (field, grid) = self.load(&input)?;
        let coastlines = Coastlines::load(
            self.settings.coastline_dir.as_deref(),
            self.config.render.coastline,
        );
        let text = TextRenderer::load(self.settings.font_path.as_deref());

        let figure = self.render(&field, &grid, coastlines.as_ref(), text.as_ref())?;

        let output = self.output_path(&input)?;
        save_png(&figure, &output)?;

        if self.settings.show {
            show(&output);
        }
        Ok(output)
    }
}

/// Hand the saved image to the platform viewer; the viewer outlives this process
fn show(path: &Path) {
    let spawned = if cfg!(target_os = "macos") {
        Command::new("open").arg(path).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", ""]).arg(path).spawn()
    } else {
        Command::new("xdg-open").arg(path).spawn()
    };

    match spawned {
        Ok(child) => log::debug!("Viewer for {} started, pid {}", path.display(), child.id()),
        Err(e) => log::warn!("Cannot open a viewer for {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::coastline::CoastlineResolution;
    use crate::render::figure::Graticule;
    use crate::render::projection::MapProjection;

    fn config() -> ProductConfig {
        ProductConfig {
            file_name: "sample.hdf".to_string(),
            field: FieldSelector::new("Gpp_1km"),
            correction: CorrectionPolicy::default(),
            geolocation: GeolocationSource::Direct {
                latitude: "Latitude".to_string(),
                longitude: "Longitude".to_string(),
            },
            render: RenderSpec::new(
                MapProjection::cylindrical((0.0, 10.0), (0.0, 10.0)),
                CoastlineResolution::Low,
                Graticule::new(0.0, 10.0, 5.0),
                Graticule::new(0.0, 10.0, 5.0),
            ),
            title: "{long_name}\n{units}".to_string(),
            units_override: None,
        }
    }

    fn attributes() -> FieldAttributes {
        FieldAttributes {
            fill_value: Some(32767.0),
            valid_range: Some((0.0, 30000.0)),
            scale_factor: Some(0.0001),
            add_offset: Some(0.0),
            units: Some("kg C/m^2".to_string()),
            long_name: Some("MYD17A2_GPP_1km".to_string()),
        }
    }

    #[test]
    fn test_fill_policies() {
        let attrs = attributes();

        let policy = CorrectionPolicy::default();
        let params = policy.params_for(&attrs);
        assert_eq!(params.fill_value, Some(32767.0));
        assert_eq!(params.valid_range, None);

        let policy = CorrectionPolicy {
            fill: FillPolicy::Fixed { value: -9999.0 },
            use_valid_range: true,
            ..CorrectionPolicy::default()
        };
        let params = policy.params_for(&attrs);
        assert_eq!(params.fill_value, Some(-9999.0));
        assert_eq!(params.valid_range, Some((0.0, 30000.0)));

        let policy = CorrectionPolicy {
            fill: FillPolicy::Ignore,
            ..CorrectionPolicy::default()
        };
        assert_eq!(policy.params_for(&attrs).fill_value, None);
    }

    #[test]
    fn test_title_template() {
        let field = RasterField::new("Gpp_1km", ndarray::Array2::zeros((2, 2)), attributes());
        assert_eq!(config().title_for(&field), "MYD17A2 GPP 1km\nkg C/m^2");

        let mut overridden = config();
        overridden.title = "{name} ({units}) at channel 567".to_string();
        overridden.units_override = Some("mW/m**2/cm**-1/sr".to_string());
        assert_eq!(
            overridden.title_for(&field),
            "Gpp_1km (mW/m**2/cm**-1/sr) at channel 567"
        );
    }

    #[test]
    fn test_long_name_falls_back_to_field_name() {
        let field = RasterField::new("dHat", ndarray::Array2::zeros((2, 2)), FieldAttributes::default());
        let mut cfg = config();
        cfg.title = "{long_name} [{units}]".to_string();
        assert_eq!(cfg.title_for(&field), "dHat []");
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/nonexistent/eoszoo")),
            ..Settings::default()
        };
        let renderer = FieldRenderer::new(config(), settings);
        assert_eq!(
            renderer.input_path(),
            PathBuf::from("/nonexistent/eoszoo/sample.hdf")
        );
        assert!(matches!(renderer.run(), Err(ZooError::Io(_))));
    }
}
