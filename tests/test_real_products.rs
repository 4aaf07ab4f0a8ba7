//! End-to-end runs against the real product files.
//!
//! Each test skips unless the file is present in `HDFEOS_ZOO_DIR`.

use eoszoo::products::{
    airs_l2_radiances_channel567, myd17a2_gpp_1km, trmm_1b21_csi_bindidhmean, trmm_2b31_csi_dhat,
};
use eoszoo::{FieldRenderer, ProductConfig, Settings};
use tempfile::TempDir;

fn run_if_present(config: ProductConfig) {
    let _ = env_logger::builder().is_test(true).try_init();

    let output_dir = TempDir::new().unwrap();
    let settings = Settings {
        output_dir: output_dir.path().to_path_buf(),
        show: false,
        ..Settings::from_env()
    };
    let renderer = FieldRenderer::new(config, settings);

    let input = renderer.input_path();
    if !input.exists() {
        println!("{} not found, skipping test", input.display());
        return;
    }

    let output = renderer.run().expect("Failed to render product");
    assert!(output.starts_with(output_dir.path()));

    let image = image::open(&output).expect("Failed to reopen PNG");
    assert_eq!(image.width(), renderer.config().render.width);
    assert_eq!(image.height(), renderer.config().render.height);
}

#[test]
fn test_airs_l2_radiances_channel567() {
    run_if_present(airs_l2_radiances_channel567());
}

#[test]
fn test_trmm_2b31_dhat() {
    run_if_present(trmm_2b31_csi_dhat());
}

#[test]
fn test_trmm_1b21_bindidhmean() {
    run_if_present(trmm_1b21_csi_bindidhmean());
}

#[test]
fn test_myd17a2_gpp_from_struct_metadata() {
    run_if_present(myd17a2_gpp_1km(true));
}

#[test]
fn test_myd17a2_gpp_from_geotransform() {
    run_if_present(myd17a2_gpp_1km(false));
}
