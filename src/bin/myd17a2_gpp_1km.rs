//! MYD17A2 Gpp_1km on its sinusoidal tile, reprojected to a lat/lon map.

use anyhow::Result;
use eoszoo::products::myd17a2_gpp_1km;
use eoszoo::{FieldRenderer, Settings};

/// Rebuild the grid from `StructMetadata.0`; otherwise use GDAL's EOS grid
/// geotransform
const USE_STRUCT_METADATA: bool = true;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = myd17a2_gpp_1km(USE_STRUCT_METADATA);
    let output = FieldRenderer::new(config, Settings::from_env()).run()?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
