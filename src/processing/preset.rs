use image::RgbaImage;
use rayon::prelude::*;

use super::adjust::{brightness_step, contrast_step, saturate_step, to_u8};

/// Closed set of one-click filter recipes. Only one can be previewed at a
/// time; applying one commits it destructively and resets the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPreset {
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
    Vintage,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 5] = [
        FilterPreset::None,
        FilterPreset::Grayscale,
        FilterPreset::Sepia,
        FilterPreset::Invert,
        FilterPreset::Vintage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterPreset::None => "None",
            FilterPreset::Grayscale => "Grayscale",
            FilterPreset::Sepia => "Sepia",
            FilterPreset::Invert => "Invert",
            FilterPreset::Vintage => "Vintage",
        }
    }
}

/// Renders `img` through the preset into a new raster.
pub fn apply(img: &RgbaImage, preset: FilterPreset) -> RgbaImage {
    if preset == FilterPreset::None {
        return img.clone();
    }

    let mut out = img.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_exact_mut(4).for_each(|px| {
        let rgb = [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        ];
        let rgb = match preset {
            FilterPreset::None => rgb,
            FilterPreset::Grayscale => saturate_step(rgb, 0.0),
            FilterPreset::Sepia => sepia_step(rgb, 1.0),
            FilterPreset::Invert => rgb.map(|v| 1.0 - v),
            // Fixed aesthetic combination: sepia(60%) then contrast(75%),
            // brightness(120%), saturate(120%).
            FilterPreset::Vintage => {
                let rgb = sepia_step(rgb, 0.6);
                let rgb = contrast_step(rgb, 0.75);
                let rgb = brightness_step(rgb, 1.2);
                saturate_step(rgb, 1.2)
            }
        };
        px[0] = to_u8(rgb[0]);
        px[1] = to_u8(rgb[1]);
        px[2] = to_u8(rgb[2]);
    });
    out
}

/// Sepia tone matrix, interpolated toward identity by `1 - amount`.
fn sepia_step(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let [r, g, b] = rgb;
    let a = amount;
    let out = [
        (1.0 - a + a * 0.393) * r + a * 0.769 * g + a * 0.189 * b,
        a * 0.349 * r + (1.0 - a + a * 0.686) * g + a * 0.168 * b,
        a * 0.272 * r + a * 0.534 * g + (1.0 - a + a * 0.131) * b,
    ];
    out.map(|v| v.clamp(0.0, 1.0))
}
