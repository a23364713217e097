use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Continuous colour maps
// ---------------------------------------------------------------------------

/// Sequential colour maps, sampled from matplotlib's anchor colours and
/// interpolated in linear RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMapKind {
    #[default]
    Viridis,
    Plasma,
    Magma,
    Cividis,
    Greys,
}

const VIRIDIS: &[[u8; 3]] = &[
    [0x44, 0x01, 0x54],
    [0x47, 0x2d, 0x7b],
    [0x3b, 0x52, 0x8b],
    [0x2c, 0x72, 0x8e],
    [0x21, 0x91, 0x8c],
    [0x28, 0xae, 0x80],
    [0x5e, 0xc9, 0x62],
    [0xad, 0xdc, 0x30],
    [0xfd, 0xe7, 0x25],
];

const PLASMA: &[[u8; 3]] = &[
    [0x0d, 0x08, 0x87],
    [0x4c, 0x02, 0xa1],
    [0x7e, 0x03, 0xa8],
    [0xa9, 0x23, 0x95],
    [0xcc, 0x47, 0x78],
    [0xe5, 0x6b, 0x5d],
    [0xf8, 0x95, 0x40],
    [0xfd, 0xc5, 0x27],
    [0xf0, 0xf9, 0x21],
];

const MAGMA: &[[u8; 3]] = &[
    [0x00, 0x00, 0x04],
    [0x1c, 0x10, 0x44],
    [0x4f, 0x12, 0x7b],
    [0x81, 0x25, 0x81],
    [0xb5, 0x36, 0x7a],
    [0xe5, 0x50, 0x64],
    [0xfb, 0x87, 0x61],
    [0xfe, 0xc2, 0x87],
    [0xfc, 0xfd, 0xbf],
];

const CIVIDIS: &[[u8; 3]] = &[
    [0x00, 0x20, 0x4c],
    [0x21, 0x3d, 0x6b],
    [0x55, 0x5b, 0x6c],
    [0x7b, 0x7a, 0x77],
    [0xa5, 0x9c, 0x74],
    [0xd3, 0xc0, 0x64],
    [0xfe, 0xe8, 0x38],
];

const GREYS: &[[u8; 3]] = &[[0xff, 0xff, 0xff], [0x00, 0x00, 0x00]];

impl ColorMapKind {
    pub const ALL: [ColorMapKind; 5] = [
        ColorMapKind::Viridis,
        ColorMapKind::Plasma,
        ColorMapKind::Magma,
        ColorMapKind::Cividis,
        ColorMapKind::Greys,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorMapKind::Viridis => "viridis",
            ColorMapKind::Plasma => "plasma",
            ColorMapKind::Magma => "magma",
            ColorMapKind::Cividis => "cividis",
            ColorMapKind::Greys => "greys",
        }
    }

    fn anchors(self) -> &'static [[u8; 3]] {
        match self {
            ColorMapKind::Viridis => VIRIDIS,
            ColorMapKind::Plasma => PLASMA,
            ColorMapKind::Magma => MAGMA,
            ColorMapKind::Cividis => CIVIDIS,
            ColorMapKind::Greys => GREYS,
        }
    }

    /// Colour at position `t` in `[0, 1]` (clamped; NaN maps to the low end).
    pub fn sample(self, t: f64) -> Color32 {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (anchors.len() - 1) as f64;
        let idx = pos.floor() as usize;
        let frac = (pos - idx as f64) as f32;

        if idx + 1 >= anchors.len() || frac == 0.0 {
            let [r, g, b] = anchors[idx.min(anchors.len() - 1)];
            return Color32::from_rgb(r, g, b);
        }

        let a = to_linear(anchors[idx]);
        let b = to_linear(anchors[idx + 1]);
        let rgb: Srgb<u8> = Srgb::from_linear(a.mix(b, frac));
        Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
    }
}

fn to_linear([r, g, b]: [u8; 3]) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

// ---------------------------------------------------------------------------
// Colour scale: value → clipped position → colour
// ---------------------------------------------------------------------------

/// Maps data values into a colour map over `[lo, hi]`, clipping outliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub lo: f64,
    pub hi: f64,
    pub map: ColorMapKind,
}

impl ColorScale {
    /// Scale over a fixed range; reversed bounds are swapped.
    pub fn fixed(lo: f64, hi: f64, map: ColorMapKind) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        ColorScale { lo, hi, map }
    }

    /// Scale over the finite data range. A flat or empty range is widened
    /// so that every value still maps to a well-defined colour.
    pub fn from_range(range: Option<(f64, f64)>, map: ColorMapKind) -> Self {
        match range {
            Some((lo, hi)) if hi > lo => ColorScale { lo, hi, map },
            Some((v, _)) => ColorScale {
                lo: v - 0.5,
                hi: v + 0.5,
                map,
            },
            None => ColorScale { lo: 0.0, hi: 1.0, map },
        }
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.lo, self.hi)
    }

    /// Position of `value` in `[0, 1]` after clipping.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.hi - self.lo;
        if span <= 0.0 {
            return 0.0;
        }
        (self.clip(value) - self.lo) / span
    }

    /// Quantised colour level in `0..levels`.
    pub fn level(&self, value: f64, levels: usize) -> usize {
        let levels = levels.max(1);
        ((self.normalize(value) * levels as f64) as usize).min(levels - 1)
    }

    /// Colour drawn for the given level (its centre).
    pub fn level_color(&self, level: usize, levels: usize) -> Color32 {
        let levels = levels.max(1);
        self.map.sample((level as f64 + 0.5) / levels as f64)
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        self.map.sample(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_endpoints() {
        assert_eq!(ColorMapKind::Viridis.sample(0.0), Color32::from_rgb(0x44, 0x01, 0x54));
        assert_eq!(ColorMapKind::Viridis.sample(1.0), Color32::from_rgb(0xfd, 0xe7, 0x25));
        assert_eq!(ColorMapKind::Viridis.sample(-3.0), ColorMapKind::Viridis.sample(0.0));
        assert_eq!(ColorMapKind::Viridis.sample(7.0), ColorMapKind::Viridis.sample(1.0));
    }

    #[test]
    fn greys_midpoint_is_grey() {
        let c = ColorMapKind::Greys.sample(0.5);
        assert_eq!(c.r(), c.g());
        assert_eq!(c.g(), c.b());
        assert!(c.r() > 0 && c.r() < 255);
    }

    #[test]
    fn fixed_scale_clips() {
        let scale = ColorScale::fixed(10.0, 20.0, ColorMapKind::Viridis);
        assert_eq!(scale.clip(5.0), 10.0);
        assert_eq!(scale.clip(25.0), 20.0);
        assert_eq!(scale.clip(12.5), 12.5);
        assert_eq!(scale.normalize(25.0), 1.0);
        assert_eq!(scale.color_for(-100.0), scale.color_for(10.0));
    }

    #[test]
    fn reversed_fixed_bounds_are_swapped() {
        let scale = ColorScale::fixed(36.0, 32.0, ColorMapKind::Viridis);
        assert_eq!((scale.lo, scale.hi), (32.0, 36.0));
    }

    #[test]
    fn degenerate_range_is_widened() {
        let scale = ColorScale::from_range(Some((3.0, 3.0)), ColorMapKind::Viridis);
        assert_eq!((scale.lo, scale.hi), (2.5, 3.5));
        let empty = ColorScale::from_range(None, ColorMapKind::Viridis);
        assert_eq!((empty.lo, empty.hi), (0.0, 1.0));
    }

    #[test]
    fn levels_cover_range() {
        let scale = ColorScale::fixed(0.0, 1.0, ColorMapKind::Viridis);
        assert_eq!(scale.level(0.0, 64), 0);
        assert_eq!(scale.level(1.0, 64), 63);
        assert_eq!(scale.level(0.5, 64), 32);
        assert_eq!(scale.level(0.5, 0), 0);
    }

    #[test]
    fn colormap_names_round_trip_through_serde() {
        for kind in ColorMapKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
            let back: ColorMapKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }
}
