//! Runtime settings taken from the environment.
//!
//! Product-specific behaviour lives in [`crate::pipeline::ProductConfig`];
//! these settings only say where files are and how the run is presented.

use crate::io::paths::{output_png_name, resolve_input_from, DATA_DIR_ENV};
use crate::types::ZooResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Directory holding Natural Earth coastline GeoJSON files
pub const COASTLINE_DIR_ENV: &str = "EOSZOO_COASTLINE_DIR";
/// TrueType font used for titles and labels
pub const FONT_ENV: &str = "EOSZOO_FONT";
/// Directory the PNG is written to (default: working directory)
pub const OUTPUT_DIR_ENV: &str = "EOSZOO_OUTPUT_DIR";
/// Set to `0`/`false`/`no`/`off` to skip opening the saved image in the platform viewer
pub const SHOW_ENV: &str = "EOSZOO_SHOW";

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub coastline_dir: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Open the saved image once written. Off for `Default`; on for the
    /// environment unless disabled or there is no display.
    pub show: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            coastline_dir: None,
            font_path: None,
            output_dir: PathBuf::from("."),
            show: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Build settings from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let path = |key: &str| lookup(key).map(PathBuf::from);

        let settings = Self {
            data_dir: path(DATA_DIR_ENV),
            coastline_dir: path(COASTLINE_DIR_ENV),
            font_path: path(FONT_ENV),
            output_dir: path(OUTPUT_DIR_ENV).unwrap_or_else(|| PathBuf::from(".")),
            show: lookup(SHOW_ENV)
                .map(|v| is_truthy(&v.to_string_lossy()))
                .unwrap_or(true)
                && has_display(&lookup),
        };

        log::debug!("Settings: {:?}", settings);
        settings
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        resolve_input_from(self.data_dir.as_deref(), file_name)
    }

    pub fn output_path(&self, input: &Path, field_name: &str) -> ZooResult<PathBuf> {
        Ok(self.output_dir.join(output_png_name(input, field_name)?))
    }
}

/// X11/Wayland sessions advertise themselves; other platforms always have a desktop
fn has_display<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<OsString>,
{
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return true;
    }
    lookup("DISPLAY").is_some() || lookup("WAYLAND_DISPLAY").is_some()
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
