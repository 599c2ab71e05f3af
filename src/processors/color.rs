//! Color space helpers: RGB ↔ HSV, RGB ↔ YCbCr (BT.601, full range) and the
//! pseudo-jet false-color map used for saliency overlays.
//!
//! All functions are pure and operate on 8-bit channel values.

/// A color in HSV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`.
    pub h: f32,
    /// Saturation, `[0, 1]`.
    pub s: f32,
    /// Value (brightness), `[0, 1]`.
    pub v: f32,
}

/// A color in YCbCr space with channels on the 0–255 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YCbCr {
    /// Luma.
    pub y: f32,
    /// Blue-difference chroma.
    pub cb: f32,
    /// Red-difference chroma.
    pub cr: f32,
}

/// Converts 8-bit RGB to HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    Hsv {
        h: if h >= 360.0 { h - 360.0 } else { h },
        s,
        v: max,
    }
}

/// Converts HSV back to 8-bit RGB.
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let h = hsv.h.rem_euclid(360.0);
    let s = hsv.s.clamp(0.0, 1.0);
    let v = hsv.v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [to_u8((r + m) * 255.0), to_u8((g + m) * 255.0), to_u8((b + m) * 255.0)]
}

/// Converts 8-bit RGB to full-range BT.601 YCbCr.
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> YCbCr {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    YCbCr {
        y: luminance(r, g, b),
        cb: 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b,
        cr: 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b,
    }
}

/// Converts full-range BT.601 YCbCr back to 8-bit RGB.
pub fn ycbcr_to_rgb(ycc: YCbCr) -> [u8; 3] {
    let cb = ycc.cb - 128.0;
    let cr = ycc.cr - 128.0;
    [
        to_u8(ycc.y + 1.402 * cr),
        to_u8(ycc.y - 0.344_136 * cb - 0.714_136 * cr),
        to_u8(ycc.y + 1.772 * cb),
    ]
}

/// BT.601 luma of an RGB triple on the 0–255 scale.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Maps a normalized scalar to a pseudo-jet false color.
///
/// Each channel is a triangular ramp: red peaks at 0.75, green at 0.50 and
/// blue at 0.25. Inputs outside `[0, 1]` (and NaN) are clamped first.
pub fn jet(value: f32) -> [u8; 3] {
    let v = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    let ramp = |center: f32| (1.5 - (4.0 * (v - center)).abs()).clamp(0.0, 1.0);
    [
        to_u8(ramp(0.75) * 255.0),
        to_u8(ramp(0.50) * 255.0),
        to_u8(ramp(0.25) * 255.0),
    ]
}

#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
