//! TRMM 1B21 binDIDHmean, zoomed on the Korean peninsula.

use anyhow::Result;
use eoszoo::products::trmm_1b21_csi_bindidhmean;
use eoszoo::{FieldRenderer, Settings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output = FieldRenderer::new(trmm_1b21_csi_bindidhmean(), Settings::from_env()).run()?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
