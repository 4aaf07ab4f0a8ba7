//! AIRS L2 radiances at channel 567, south polar stereographic map.

use anyhow::Result;
use eoszoo::products::airs_l2_radiances_channel567;
use eoszoo::{FieldRenderer, Settings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output = FieldRenderer::new(airs_l2_radiances_channel567(), Settings::from_env()).run()?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
