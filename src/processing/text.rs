use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use anyhow::Context;
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::tools::text::{FontFamily, TextAlign, TextObject};

const SANS_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const SERIF_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSerif.ttf");
const MONO_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

/// Embedded fonts parsed once per session.
pub struct FontLibrary {
    sans: FontArc,
    serif: FontArc,
    mono: FontArc,
}

impl FontLibrary {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            sans: FontArc::try_from_slice(SANS_TTF).context("parsing embedded sans font")?,
            serif: FontArc::try_from_slice(SERIF_TTF).context("parsing embedded serif font")?,
            mono: FontArc::try_from_slice(MONO_TTF).context("parsing embedded mono font")?,
        })
    }

    pub fn get(&self, family: FontFamily) -> &FontArc {
        match family {
            FontFamily::Sans => &self.sans,
            FontFamily::Serif => &self.serif,
            FontFamily::Mono => &self.mono,
        }
    }
}

/// Advance width of a single line, including kerning.
pub fn measure(font: &FontArc, text: &str, size: f32) -> f32 {
    layout(font, text, size).1
}

/// Positions glyphs left-aligned at x=0 with baseline y=0.
/// Returns the glyph list and the total advance width.
fn layout(font: &FontArc, text: &str, size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut glyphs = Vec::new();
    let mut cursor = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            cursor += scaled.kern(p, id);
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        prev = Some(id);
    }
    (glyphs, cursor)
}

/// Rasterizes the text of `obj` onto `img` in place: shadow first (blurred,
/// offset silhouette), then outline strokes, then the fill. The same
/// coverage mask drives all three passes.
pub fn draw(img: &mut RgbaImage, obj: &TextObject, fonts: &FontLibrary) {
    if obj.content.trim().is_empty() || obj.size <= 0.0 {
        return;
    }
    let font = fonts.get(obj.font);
    let (glyphs, width) = layout(font, &obj.content, obj.size);

    let x_left = match obj.align {
        TextAlign::Left => obj.pos.0,
        TextAlign::Center => obj.pos.0 - width * 0.5,
        TextAlign::Right => obj.pos.0 - width,
    };
    let scaled = font.as_scaled(PxScale::from(obj.size));
    let baseline = obj.pos.1 - obj.size * 0.5 + scaled.ascent();

    let mask = coverage_mask(font, &glyphs, obj.size, x_left, baseline, img.dimensions());

    if let Some(ref shadow) = obj.shadow {
        let blurred = if shadow.blur > 0.0 {
            gaussian_blur_f32(&mask, shadow.blur)
        } else {
            mask.clone()
        };
        stamp(img, &blurred, shadow.color, shadow.offset.0.round() as i32, shadow.offset.1.round() as i32);
    }

    if let Some(ref outline) = obj.outline {
        if outline.width > 0.0 {
            for (dx, dy) in ring_offsets(outline.width) {
                stamp(img, &mask, outline.color, dx, dy);
            }
        }
    }

    stamp(img, &mask, obj.color, 0, 0);
}

/// Anti-aliased glyph coverage over the full image, 0..255 per pixel.
fn coverage_mask(
    font: &FontArc,
    glyphs: &[(GlyphId, f32)],
    size: f32,
    x_left: f32,
    baseline: f32,
    (w, h): (u32, u32),
) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    for &(id, gx) in glyphs {
        let glyph = id.with_scale_and_position(PxScale::from(size), point(x_left + gx, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|px, py, cov| {
            let x = bounds.min.x as i32 + px as i32;
            let y = bounds.min.y as i32 + py as i32;
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                let v = (cov * 255.0).round().clamp(0.0, 255.0) as u8;
                let p = mask.get_pixel_mut(x as u32, y as u32);
                p[0] = p[0].max(v);
            }
        });
    }
    mask
}

/// Integer offsets covering a stroke of the given radius.
fn ring_offsets(radius: f32) -> Vec<(i32, i32)> {
    let r = radius.max(0.5);
    let mut offsets = Vec::new();
    let steps = (16.0_f32).max(r * 8.0) as usize;
    for i in 0..steps {
        let a = i as f32 / steps as f32 * std::f32::consts::TAU;
        let off = ((a.cos() * r).round() as i32, (a.sin() * r).round() as i32);
        if !offsets.contains(&off) {
            offsets.push(off);
        }
    }
    offsets
}

/// Source-over blend of the mask, tinted with `color`, shifted by (dx, dy).
fn stamp(img: &mut RgbaImage, mask: &GrayImage, color: [u8; 4], dx: i32, dy: i32) {
    let (w, h) = img.dimensions();
    for (mx, my, cov) in mask.enumerate_pixels() {
        if cov[0] == 0 {
            continue;
        }
        let x = mx as i32 + dx;
        let y = my as i32 + dy;
        if x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
            continue;
        }
        let coverage = cov[0] as f32 / 255.0;
        blend(img.get_pixel_mut(x as u32, y as u32), color, coverage);
    }
}

fn blend(dst: &mut Rgba<u8>, color: [u8; 4], coverage: f32) {
    let sa = coverage * color[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return;
    }
    for c in 0..3 {
        let sc = color[c] as f32 / 255.0;
        let dc = dst[c] as f32 / 255.0;
        let oc = (sc * sa + dc * da * (1.0 - sa)) / oa;
        dst[c] = (oc * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (oa * 255.0).round().clamp(0.0, 255.0) as u8;
}
