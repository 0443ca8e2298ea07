use image::RgbaImage;
use rayon::prelude::*;

/// Live adjustment parameters, matching the classic filter-function chain
/// `brightness(b%) contrast(c%) saturate(s%) hue-rotate(h°)`.
///
/// Brightness, contrast, and saturation are percentages (identity at 100);
/// hue is a rotation in degrees (identity at 0). The order of application is
/// fixed as listed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
        }
    }
}

impl FilterState {
    pub fn is_identity(&self) -> bool {
        (self.brightness - 100.0).abs() < 0.001
            && (self.contrast - 100.0).abs() < 0.001
            && (self.saturation - 100.0).abs() < 0.001
            && self.hue.abs() < 0.001
    }

    /// The filter that, applied on top of `baseline`, yields this state.
    ///
    /// Used once a baseline has been burned into a snapshot: the compositor
    /// previews `preview.relative_to(applied)` so equal states render the
    /// snapshot untouched. Brightness/contrast/saturation are multiplicative,
    /// hue is additive (wrapped to ±180°).
    pub fn relative_to(&self, baseline: &FilterState) -> FilterState {
        // A zero baseline collapsed the channel (e.g. contrast 0 is flat
        // mid-gray); no relative gain can recover it, so stay at identity.
        let ratio = |value: f32, base: f32| {
            if base <= 0.001 {
                100.0
            } else {
                value / (base / 100.0)
            }
        };
        let mut hue = self.hue - baseline.hue;
        if hue > 180.0 {
            hue -= 360.0;
        } else if hue < -180.0 {
            hue += 360.0;
        }
        FilterState {
            brightness: ratio(self.brightness, baseline.brightness),
            contrast: ratio(self.contrast, baseline.contrast),
            saturation: ratio(self.saturation, baseline.saturation),
            hue,
        }
    }
}

/// Renders `img` through the adjustment chain into a new raster.
/// Identity parameters return a pixel-identical clone.
pub fn apply(img: &RgbaImage, state: &FilterState) -> RgbaImage {
    if state.is_identity() {
        return img.clone();
    }

    let b = state.brightness / 100.0;
    let c = state.contrast / 100.0;
    let s = state.saturation / 100.0;
    let hue = state.hue;

    let mut out = img.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_exact_mut(4).for_each(|px| {
        let mut rgb = [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        ];
        rgb = brightness_step(rgb, b);
        rgb = contrast_step(rgb, c);
        rgb = saturate_step(rgb, s);
        rgb = hue_rotate_step(rgb, hue);
        px[0] = to_u8(rgb[0]);
        px[1] = to_u8(rgb[1]);
        px[2] = to_u8(rgb[2]);
    });
    out
}

pub(crate) fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Linear gain per channel.
pub(crate) fn brightness_step(rgb: [f32; 3], gain: f32) -> [f32; 3] {
    rgb.map(|v| (v * gain).clamp(0.0, 1.0))
}

/// Scales contrast around mid-gray.
pub(crate) fn contrast_step(rgb: [f32; 3], gain: f32) -> [f32; 3] {
    rgb.map(|v| ((v - 0.5) * gain + 0.5).clamp(0.0, 1.0))
}

// Rec.709 luminance weights used by the saturate/hue matrices.
const LR: f32 = 0.213;
const LG: f32 = 0.715;
const LB: f32 = 0.072;

/// Interpolates between luminance gray (s=0) and identity (s=1), and
/// oversaturates beyond 1.
pub(crate) fn saturate_step(rgb: [f32; 3], s: f32) -> [f32; 3] {
    let [r, g, b] = rgb;
    let out = [
        (LR + (1.0 - LR) * s) * r + LG * (1.0 - s) * g + LB * (1.0 - s) * b,
        LR * (1.0 - s) * r + (LG + (1.0 - LG) * s) * g + LB * (1.0 - s) * b,
        LR * (1.0 - s) * r + LG * (1.0 - s) * g + (LB + (1.0 - LB) * s) * b,
    ];
    out.map(|v| v.clamp(0.0, 1.0))
}

/// Standard hue-rotation color matrix.
pub(crate) fn hue_rotate_step(rgb: [f32; 3], degrees: f32) -> [f32; 3] {
    if degrees.abs() < 0.001 {
        return rgb;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let [r, g, b] = rgb;
    let out = [
        (LR + cos * (1.0 - LR) - sin * LR) * r
            + (LG - cos * LG - sin * LG) * g
            + (LB - cos * LB + sin * (1.0 - LB)) * b,
        (LR - cos * LR + sin * 0.143) * r
            + (LG + cos * (1.0 - LG) + sin * 0.140) * g
            + (LB - cos * LB - sin * 0.283) * b,
        (LR - cos * LR - sin * (1.0 - LR)) * r
            + (LG - cos * LG + sin * LG) * g
            + (LB + cos * (1.0 - LB) + sin * LB) * b,
    ];
    out.map(|v| v.clamp(0.0, 1.0))
}
