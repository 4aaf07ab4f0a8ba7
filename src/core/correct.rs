use crate::types::{FieldAttributes, MaskedField, RasterField};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// How a product packs physical values into stored values.
///
/// This is per-product policy: products that carry the same attribute
/// names still document different formulas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleConvention {
    /// Stored values are already physical
    #[default]
    None,
    /// netCDF/CF: `value * scale + offset`
    Cf,
    /// MODIS land: `(value - offset) * scale`
    OffsetThenScale,
    /// TRMM: `value / scale + offset`
    DivideThenOffset,
}

impl ScaleConvention {
    pub fn apply(self, value: f64, scale: f64, offset: f64) -> f64 {
        match self {
            Self::None => value,
            Self::Cf => value * scale + offset,
            Self::OffsetThenScale => (value - offset) * scale,
            Self::DivideThenOffset => value / scale + offset,
        }
    }
}

/// Correction parameters for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionParams {
    /// Raw sentinel marking missing samples
    pub fill_value: Option<f64>,
    /// Inclusive raw-value bounds
    pub valid_range: Option<(f64, f64)>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub convention: ScaleConvention,
}

impl CorrectionParams {
    /// Parameters that leave data unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: &FieldAttributes, convention: ScaleConvention) -> Self {
        Self {
            fill_value: attributes.fill_value,
            valid_range: attributes.valid_range,
            scale: attributes.scale_factor,
            offset: attributes.add_offset,
            convention,
        }
    }

    /// Whether a raw sample survives fill and range masking
    pub fn is_valid(&self, raw: f64) -> bool {
        if !raw.is_finite() {
            return false;
        }
        if let Some(fill) = self.fill_value {
            if raw == fill {
                return false;
            }
        }
        if let Some((lo, hi)) = self.valid_range {
            if raw < lo || raw > hi {
                return false;
            }
        }
        true
    }

    /// Physical value for a raw sample, NaN when masked
    pub fn correct_value(&self, raw: f64) -> f64 {
        if !self.is_valid(raw) {
            return f64::NAN;
        }
        self.convention
            .apply(raw, self.scale.unwrap_or(1.0), self.offset.unwrap_or(0.0))
    }
}

/// Applies fill/range masking and scale/offset to raw fields
pub struct Corrector {
    params: CorrectionParams,
}

impl Corrector {
    pub fn new(params: CorrectionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CorrectionParams {
        &self.params
    }

    pub fn correct(&self, raw: &Array2<f64>) -> MaskedField {
        let (rows, cols) = raw.dim();
        log::info!("Correcting {}x{} field", rows, cols);
        log::debug!("Correction parameters: {:?}", self.params);

        let mut output = raw.clone();
        let params = &self.params;

        #[cfg(feature = "parallel")]
        output.par_mapv_inplace(|v| params.correct_value(v));
        #[cfg(not(feature = "parallel"))]
        output.mapv_inplace(|v| params.correct_value(v));

        let field = MaskedField::from_array(output);
        log::info!(
            "Masked {} of {} samples",
            field.masked_count(),
            rows * cols
        );
        field
    }

    pub fn correct_field(&self, field: &RasterField) -> MaskedField {
        self.correct(&field.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_conventions() {
        assert_eq!(ScaleConvention::None.apply(7.0, 2.0, 1.0), 7.0);
        assert_eq!(ScaleConvention::Cf.apply(7.0, 2.0, 1.0), 15.0);
        assert_eq!(ScaleConvention::OffsetThenScale.apply(7.0, 2.0, 1.0), 12.0);
        assert_eq!(ScaleConvention::DivideThenOffset.apply(7.0, 2.0, 1.0), 4.5);
    }

    #[test]
    fn test_fill_and_range_are_masked_before_scaling() {
        let params = CorrectionParams {
            fill_value: Some(32767.0),
            valid_range: Some((0.0, 30000.0)),
            scale: Some(0.0001),
            offset: Some(0.0),
            convention: ScaleConvention::OffsetThenScale,
        };
        let corrector = Corrector::new(params);
        let field = corrector.correct(&array![[32767.0, 15000.0], [-1.0, 30000.0]]);

        assert!(field.is_masked(0, 0));
        assert!(field.is_masked(1, 0));
        assert_relative_eq!(field.get(0, 1).unwrap(), 1.5, epsilon = 1e-12);
        assert_relative_eq!(field.get(1, 1).unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_scale_defaults_to_unit() {
        let params = CorrectionParams {
            convention: ScaleConvention::DivideThenOffset,
            ..CorrectionParams::identity()
        };
        assert_eq!(params.correct_value(42.0), 42.0);
    }

    #[test]
    fn test_nan_input_is_masked() {
        let params = CorrectionParams::identity();
        assert!(!params.is_valid(f64::NAN));
        assert!(params.correct_value(f64::NEG_INFINITY).is_nan());
    }
}
