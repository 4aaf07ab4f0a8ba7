//! Built-in product configurations, one per binary.

use crate::core::correct::ScaleConvention;
use crate::core::geolocate::{GeolocationSource, GridSource, SINUSOIDAL_PROJ4, STRUCT_METADATA};
use crate::io::coastline::CoastlineResolution;
use crate::io::field_reader::FieldSelector;
use crate::pipeline::{CorrectionPolicy, FillPolicy, ProductConfig};
use crate::render::figure::{Graticule, RenderSpec};
use crate::render::projection::MapProjection;

/// AIRS L2 radiances, channel 567, over the Antarctic
pub fn airs_l2_radiances_channel567() -> ProductConfig {
    ProductConfig {
        file_name: "AIRS.2002.12.31.001.L2.CC_H.v4.0.21.0.G06100185050.hdf".to_string(),
        field: FieldSelector::new("radiances").with_channel(2, 567),
        correction: CorrectionPolicy {
            convention: ScaleConvention::Cf,
            fill: FillPolicy::Fixed { value: -9999.0 },
            use_valid_range: true,
        },
        geolocation: GeolocationSource::Direct {
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
        },
        render: RenderSpec::new(
            MapProjection::south_polar(-65.0, 180.0),
            CoastlineResolution::Low,
            Graticule::new(-80.0, -50.0, 5.0),
            Graticule::new(-180.0, 181.0, 20.0),
        ),
        title: "{name} ({units}) at channel 567".to_string(),
        units_override: Some("mW/m**2/cm**-1/sr".to_string()),
    }
}

/// TRMM 2B31 surface rain (`dHat`) over Korea
pub fn trmm_2b31_csi_dhat() -> ProductConfig {
    ProductConfig {
        file_name: "2B31_CSI.990911.10296.KORA.6.HDF".to_string(),
        field: FieldSelector::new("dHat"),
        correction: CorrectionPolicy {
            convention: ScaleConvention::DivideThenOffset,
            fill: FillPolicy::Ignore,
            use_valid_range: false,
        },
        geolocation: trmm_geolocation(),
        render: RenderSpec::new(
            MapProjection::cylindrical((30.0, 36.0), (121.0, 133.0)),
            CoastlineResolution::High,
            Graticule::new(30.0, 36.0, 1.0),
            Graticule::new(121.0, 133.0, 1.0),
        ),
        title: "{name} (mm)".to_string(),
        units_override: None,
    }
}

/// TRMM 1B21 `binDIDHmean` over Korea
pub fn trmm_1b21_csi_bindidhmean() -> ProductConfig {
    ProductConfig {
        file_name: "1B21_CSI.990906.10217.KORA.6.HDF".to_string(),
        field: FieldSelector::new("binDIDHmean"),
        // Whatever packing attributes the file carries are applied the netCDF way
        correction: CorrectionPolicy {
            convention: ScaleConvention::Cf,
            fill: FillPolicy::Attribute,
            use_valid_range: true,
        },
        geolocation: trmm_geolocation(),
        render: RenderSpec::new(
            MapProjection::cylindrical((31.0, 36.0), (122.0, 133.0)),
            CoastlineResolution::High,
            Graticule::new(31.0, 36.0, 1.0),
            Graticule::new(122.0, 133.0, 1.0),
        ),
        title: "{name}".to_string(),
        units_override: None,
    }
}

/// MYD17A2 gross primary productivity on the h09v08 sinusoidal tile.
///
/// The grid comes from `StructMetadata.0`, or from the GDAL geotransform of
/// the `MOD_Grid_MOD17A2` grid when `use_struct_metadata` is false.
pub fn myd17a2_gpp_1km(use_struct_metadata: bool) -> ProductConfig {
    let source = if use_struct_metadata {
        GridSource::StructMetadata {
            attribute: STRUCT_METADATA.to_string(),
        }
    } else {
        GridSource::GeoTransform {
            grid_name: "MOD_Grid_MOD17A2".to_string(),
        }
    };

    ProductConfig {
        file_name: "MYD17A2.A2007073.h09v08.005.2007096132046.hdf".to_string(),
        field: FieldSelector::new("Gpp_1km"),
        correction: CorrectionPolicy {
            convention: ScaleConvention::OffsetThenScale,
            fill: FillPolicy::Attribute,
            use_valid_range: true,
        },
        geolocation: GeolocationSource::SinusoidalGrid {
            proj4: SINUSOIDAL_PROJ4.to_string(),
            source,
        },
        render: RenderSpec::new(
            MapProjection::cylindrical((2.5, 12.5), (-87.5, -77.5)),
            CoastlineResolution::Low,
            Graticule::new(0.0, 15.0, 5.0).labelled(),
            Graticule::new(-90.0, 75.0, 5.0).labelled(),
        ),
        title: "{long_name}\n{units}".to_string(),
        units_override: None,
    }
}

fn trmm_geolocation() -> GeolocationSource {
    GeolocationSource::Combined {
        array: "geolocation".to_string(),
        latitude_index: 0,
        longitude_index: 1,
    }
}
