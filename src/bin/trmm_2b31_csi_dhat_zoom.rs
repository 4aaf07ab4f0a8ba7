//! TRMM 2B31 dHat, zoomed on the Korean peninsula.

use anyhow::Result;
use eoszoo::products::trmm_2b31_csi_dhat;
use eoszoo::{FieldRenderer, Settings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output = FieldRenderer::new(trmm_2b31_csi_dhat(), Settings::from_env()).run()?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
