use approx::assert_relative_eq;
use eoszoo::{CorrectionParams, Corrector, FieldAttributes, ScaleConvention};
use eoszoo::{CorrectionPolicy, FillPolicy};
use ndarray::{array, Array2};

#[test]
fn test_fill_value_never_survives() {
    let params = CorrectionParams {
        fill_value: Some(-9999.0),
        convention: ScaleConvention::Cf,
        scale: Some(2.0),
        offset: Some(1.0),
        ..CorrectionParams::identity()
    };
    let raw = Array2::from_shape_fn((20, 30), |(i, j)| {
        if (i + j) % 7 == 0 {
            -9999.0
        } else {
            (i * 30 + j) as f64
        }
    });

    let field = Corrector::new(params).correct(&raw);

    for ((i, j), &value) in raw.indexed_iter() {
        if value == -9999.0 {
            assert!(field.is_masked(i, j));
        } else {
            assert_relative_eq!(field.get(i, j).unwrap(), value * 2.0 + 1.0);
        }
    }
    let (lo, _) = field.value_range().unwrap();
    assert!(lo >= 1.0);
}

#[test]
fn test_out_of_range_samples_do_not_reach_colour_range() {
    let attributes = FieldAttributes {
        fill_value: Some(32767.0),
        valid_range: Some((0.0, 30000.0)),
        scale_factor: Some(0.0001),
        add_offset: Some(0.0),
        ..FieldAttributes::default()
    };
    let policy = CorrectionPolicy {
        convention: ScaleConvention::OffsetThenScale,
        fill: FillPolicy::Attribute,
        use_valid_range: true,
    };

    let raw = array![[32767.0, 32761.0, 100.0], [30000.0, -5.0, 0.0]];
    let field = Corrector::new(policy.params_for(&attributes)).correct(&raw);

    assert_eq!(field.valid_count(), 3);
    let (lo, hi) = field.value_range().unwrap();
    assert_relative_eq!(lo, 0.0);
    assert_relative_eq!(hi, 3.0, epsilon = 1e-12);
}

#[test]
fn test_identity_correction_is_idempotent() {
    let raw = array![[1.5, f64::NAN], [-3.0, 1e9]];
    let corrector = Corrector::new(CorrectionParams::identity());

    let once = corrector.correct(&raw);
    let twice = corrector.correct(once.data());

    for ((i, j), &value) in raw.indexed_iter() {
        assert_eq!(once.get(i, j), twice.get(i, j));
        if value.is_finite() {
            assert_eq!(once.get(i, j), Some(value));
        } else {
            assert!(once.is_masked(i, j));
        }
    }
}

#[test]
fn test_trmm_convention_divides_by_scale() {
    let params = CorrectionParams {
        scale: Some(100.0),
        offset: Some(0.5),
        convention: ScaleConvention::DivideThenOffset,
        ..CorrectionParams::identity()
    };
    let field = Corrector::new(params).correct(&array![[250.0]]);
    assert_relative_eq!(field.get(0, 0).unwrap(), 3.0);
}
