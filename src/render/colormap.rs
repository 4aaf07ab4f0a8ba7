//! Colour mapping for pseudocolour plots.

use crate::types::{MaskedField, ZooError, ZooResult};
use image::Rgba;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColormapName {
    #[default]
    Viridis,
    Jet,
    Greys,
}

/// Colour at a normalised position in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f64,
    pub color: [u8; 3],
}

const fn stop(position: f64, color: [u8; 3]) -> ColorStop {
    ColorStop { position, color }
}

const VIRIDIS: [ColorStop; 9] = [
    stop(0.0, [68, 1, 84]),
    stop(0.125, [71, 44, 122]),
    stop(0.25, [59, 81, 139]),
    stop(0.375, [44, 113, 142]),
    stop(0.5, [33, 144, 141]),
    stop(0.625, [39, 173, 129]),
    stop(0.75, [92, 200, 99]),
    stop(0.875, [170, 220, 50]),
    stop(1.0, [253, 231, 37]),
];

const JET: [ColorStop; 7] = [
    stop(0.0, [0, 0, 128]),
    stop(0.125, [0, 0, 255]),
    stop(0.375, [20, 255, 226]),
    stop(0.625, [226, 255, 20]),
    stop(0.875, [255, 33, 0]),
    stop(0.95, [180, 0, 0]),
    stop(1.0, [128, 0, 0]),
];

const GREYS: [ColorStop; 2] = [stop(0.0, [255, 255, 255]), stop(1.0, [0, 0, 0])];

/// Piecewise-linear colormap
#[derive(Debug, Clone)]
pub struct Colormap {
    stops: Vec<ColorStop>,
}

impl Colormap {
    pub fn named(name: ColormapName) -> Self {
        let stops = match name {
            ColormapName::Viridis => VIRIDIS.to_vec(),
            ColormapName::Jet => JET.to_vec(),
            ColormapName::Greys => GREYS.to_vec(),
        };
        Self { stops }
    }

    /// Stops must be at least two, ordered, and span exactly [0, 1]
    pub fn from_stops(stops: Vec<ColorStop>) -> ZooResult<Self> {
        if stops.len() < 2 {
            return Err(ZooError::Render(
                "A colormap needs at least two stops".to_string(),
            ));
        }
        if stops.windows(2).any(|w| w[1].position < w[0].position) {
            return Err(ZooError::Render(
                "Colormap stops must be ordered by position".to_string(),
            ));
        }
        let first = stops[0].position;
        let last = stops[stops.len() - 1].position;
        if first != 0.0 || last != 1.0 {
            return Err(ZooError::Render(format!(
                "Colormap stops must span [0, 1], got [{}, {}]",
                first, last
            )));
        }
        Ok(Self { stops })
    }

    /// Colour at fraction `t` (clamped to [0, 1])
    pub fn sample(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let upper = self
            .stops
            .iter()
            .position(|s| s.position >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            let [r, g, b] = self.stops[0].color;
            return Rgba([r, g, b, 255]);
        }

        let lo = self.stops[upper - 1];
        let hi = self.stops[upper];
        let span = hi.position - lo.position;
        let w = if span > 0.0 { (t - lo.position) / span } else { 1.0 };

        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * w).round() as u8;
        Rgba([
            mix(lo.color[0], hi.color[0]),
            mix(lo.color[1], hi.color[1]),
            mix(lo.color[2], hi.color[2]),
            255,
        ])
    }
}

/// Linear mapping from data values to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    /// A degenerate range is widened by one unit so colours stay defined
    pub fn new(vmin: f64, vmax: f64) -> Self {
        if vmax > vmin {
            Self { vmin, vmax }
        } else {
            Self {
                vmin: vmin - 0.5,
                vmax: vmin + 0.5,
            }
        }
    }

    /// Range of the unmasked samples; `None` when everything is masked
    pub fn from_field(field: &MaskedField) -> Option<Self> {
        field.value_range().map(|(lo, hi)| Self::new(lo, hi))
    }

    pub fn fraction(&self, value: f64) -> f64 {
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }

    /// Round tick values inside the range, about `target` of them
    pub fn ticks(&self, target: usize) -> Vec<f64> {
        let step = nice_step((self.vmax - self.vmin) / target.max(1) as f64);
        if !step.is_finite() || step <= 0.0 {
            return vec![self.vmin, self.vmax];
        }

        let first = (self.vmin / step).ceil() as i64;
        let last = (self.vmax / step).floor() as i64;
        (first..=last)
            .map(|k| k as f64 * step)
            // Clean up -0.0 and accumulated float noise
            .map(|v| if v.abs() < step * 1e-9 { 0.0 } else { v })
            .collect()
    }
}

/// Smallest of 1, 2, 2.5, 5, 10 times a power of ten that is >= `raw`
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return f64::NAN;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw * (1.0 - 1e-12))
        .unwrap_or(10.0 * magnitude)
}

/// Tick label text with no more decimals than the tick spacing needs
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 || step <= 0.0 || !step.is_finite() {
        0
    } else {
        (-step.log10().floor()) as usize + 1
    };
    let decimals = decimals.min(6);
    let text = format!("{:.*}", decimals, value);
    if decimals > 0 {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_sample_endpoints_and_clamping() {
        let cmap = Colormap::named(ColormapName::Viridis);
        assert_eq!(cmap.sample(0.0), Rgba([68, 1, 84, 255]));
        assert_eq!(cmap.sample(1.0), Rgba([253, 231, 37, 255]));
        assert_eq!(cmap.sample(-3.0), cmap.sample(0.0));
        assert_eq!(cmap.sample(7.0), cmap.sample(1.0));
    }

    #[test]
    fn test_sample_interpolates() {
        let cmap = Colormap::named(ColormapName::Greys);
        assert_eq!(cmap.sample(0.5), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_from_stops_validation() {
        assert!(Colormap::from_stops(vec![stop(0.0, [0, 0, 0])]).is_err());
        assert!(Colormap::from_stops(vec![stop(0.0, [0, 0, 0]), stop(0.5, [1, 1, 1])]).is_err());
        assert!(Colormap::from_stops(vec![stop(0.0, [0, 0, 0]), stop(1.0, [1, 1, 1])]).is_ok());
    }

    #[test]
    fn test_normalize_ignores_masked_samples() {
        let field = MaskedField::from_array(array![[f64::NAN, 2.0], [4.0, f64::NAN]]);
        let norm = Normalize::from_field(&field).unwrap();
        assert_eq!(norm.vmin, 2.0);
        assert_eq!(norm.vmax, 4.0);
        assert_eq!(norm.fraction(3.0), 0.5);
    }

    #[test]
    fn test_constant_field_gets_unit_range() {
        let norm = Normalize::new(5.0, 5.0);
        assert_eq!(norm.vmin, 4.5);
        assert_eq!(norm.vmax, 5.5);
    }

    #[test]
    fn test_ticks_are_round() {
        let ticks = Normalize::new(0.0, 1.0).ticks(5);
        assert_eq!(ticks.len(), 6);
        for (tick, expected) in ticks.iter().zip([0.0, 0.2, 0.4, 0.6, 0.8, 1.0]) {
            assert_relative_eq!(*tick, expected, epsilon = 1e-12);
        }

        let ticks = Normalize::new(-3.7, 12.2).ticks(5);
        assert_eq!(ticks.first().copied(), Some(0.0));
        assert_eq!(ticks.last().copied(), Some(10.0));
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(10.0, 5.0), "10");
        assert_eq!(format_tick(0.2, 0.2), "0.2");
        assert_eq!(format_tick(0.6000000000000001, 0.2), "0.6");
        assert_eq!(format_tick(1.25, 0.25), "1.25");
    }
}
