use crate::types::{ZooError, ZooResult};
use std::path::{Path, PathBuf};

/// Environment variable naming the directory that holds the input files
pub const DATA_DIR_ENV: &str = "HDFEOS_ZOO_DIR";

/// Resolve an input file against `HDFEOS_ZOO_DIR`, falling back to the
/// current directory when the variable is unset
pub fn resolve_input(file_name: &str) -> PathBuf {
    let data_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    resolve_input_from(data_dir.as_deref(), file_name)
}

pub fn resolve_input_from(data_dir: Option<&Path>, file_name: &str) -> PathBuf {
    match data_dir {
        Some(dir) => dir.join(file_name),
        None => Path::new(".").join(file_name),
    }
}

/// Output image name: `<input file stem>.<field>.png`
pub fn output_png_name(input: &Path, field_name: &str) -> ZooResult<String> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ZooError::InvalidFormat(format!("Input path has no file name: {}", input.display()))
        })?;

    Ok(format!("{}.{}.png", stem, field_name))
}
