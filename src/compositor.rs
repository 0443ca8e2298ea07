use image::RgbaImage;

use crate::processing::adjust::{self, FilterState};
use crate::processing::preset::{self, FilterPreset};
use crate::processing::text::{self, FontLibrary};
use crate::tools::text::TextObject;

/// The active tool's non-destructive preview effect.
#[derive(Debug, Clone, Copy)]
pub enum PreviewEffect<'a> {
    None,
    Adjust(&'a FilterState),
    Preset(FilterPreset),
}

/// Pure read+draw step: renders the current snapshot through the live
/// preview effect and transient text overlay into a fresh raster. The
/// snapshot is never mutated, so redraws are idempotent.
pub fn composite(
    snapshot: &RgbaImage,
    effect: PreviewEffect<'_>,
    overlay: Option<(&TextObject, &FontLibrary)>,
) -> RgbaImage {
    let mut out = match effect {
        PreviewEffect::None => snapshot.clone(),
        PreviewEffect::Adjust(state) => adjust::apply(snapshot, state),
        PreviewEffect::Preset(preset) => preset::apply(snapshot, preset),
    };
    if let Some((obj, fonts)) = overlay {
        text::draw(&mut out, obj, fonts);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn checker(w: u32, h: u32) -> RgbaImage {
        ImageBuffer::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([200, 60, 20, 255])
            } else {
                Rgba([20, 60, 200, 255])
            }
        })
    }

    #[test]
    fn no_effect_no_overlay_is_a_clone() {
        let img = checker(8, 8);
        assert_eq!(composite(&img, PreviewEffect::None, None), img);
    }

    #[test]
    fn identity_adjust_preview_leaves_pixels_untouched() {
        let img = checker(8, 8);
        let state = FilterState::default();
        assert_eq!(composite(&img, PreviewEffect::Adjust(&state), None), img);
    }

    #[test]
    fn redraws_are_idempotent() {
        let img = checker(16, 16);
        let a = composite(&img, PreviewEffect::Preset(FilterPreset::Sepia), None);
        let b = composite(&img, PreviewEffect::Preset(FilterPreset::Sepia), None);
        assert_eq!(a, b);
    }

    #[test]
    fn text_overlay_never_touches_the_snapshot() {
        let fonts = FontLibrary::load().unwrap();
        let img = checker(120, 60);
        let before = img.clone();
        let mut obj = TextObject::centered_in(120, 60);
        obj.content = "X".to_string();
        let out = composite(&img, PreviewEffect::None, Some((&obj, &fonts)));
        assert_eq!(img, before);
        assert_ne!(out, before);
    }
}
