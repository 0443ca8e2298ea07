use egui::{Rect, pos2};

use crate::processing::text::{FontLibrary, measure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [FontFamily::Sans, FontFamily::Serif, FontFamily::Mono];

    pub fn label(self) -> &'static str {
        match self {
            FontFamily::Sans => "Sans",
            FontFamily::Serif => "Serif",
            FontFamily::Mono => "Mono",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub const ALL: [TextAlign; 3] = [TextAlign::Left, TextAlign::Center, TextAlign::Right];

    pub fn label(self) -> &'static str {
        match self {
            TextAlign::Left => "Left",
            TextAlign::Center => "Center",
            TextAlign::Right => "Right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outline {
    pub color: [u8; 4],
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: [u8; 4],
    pub offset: (f32, f32),
    pub blur: f32,
}

/// Live text overlay state. Composited transiently on every redraw while in
/// text mode; burned into a snapshot only on Apply.
#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub content: String,
    pub font: FontFamily,
    pub size: f32,
    pub color: [u8; 4],
    pub align: TextAlign,
    /// Anchor point in image-space pixels.
    pub pos: (f32, f32),
    pub outline: Option<Outline>,
    pub shadow: Option<Shadow>,
}

impl TextObject {
    pub const DEFAULT_CONTENT: &'static str = "New text";

    /// Fresh default object centered on an image of the given size.
    pub fn centered_in(width: u32, height: u32) -> Self {
        Self {
            content: Self::DEFAULT_CONTENT.to_string(),
            font: FontFamily::Sans,
            size: 48.0,
            color: [255, 255, 255, 255],
            align: TextAlign::Center,
            pos: (width as f32 * 0.5, height as f32 * 0.5),
            outline: None,
            shadow: None,
        }
    }

    /// Image-space bounding box used for drag hit-testing: measured width,
    /// alignment-shifted x origin, font size as height with the anchor
    /// vertically centered.
    pub fn hit_box(&self, fonts: &FontLibrary) -> Rect {
        let width = measure(fonts.get(self.font), &self.content, self.size).max(1.0);
        let x_left = match self.align {
            TextAlign::Left => self.pos.0,
            TextAlign::Center => self.pos.0 - width * 0.5,
            TextAlign::Right => self.pos.0 - width,
        };
        Rect::from_min_max(
            pos2(x_left, self.pos.1 - self.size * 0.5),
            pos2(x_left + width, self.pos.1 + self.size * 0.5),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_object_is_centered_with_placeholder() {
        let obj = TextObject::centered_in(400, 300);
        assert_eq!(obj.content, TextObject::DEFAULT_CONTENT);
        assert_eq!(obj.pos, (200.0, 150.0));
    }

    #[test]
    fn alignment_shifts_the_hit_box_origin() {
        let fonts = FontLibrary::load().unwrap();
        let mut obj = TextObject::centered_in(400, 300);
        obj.content = "HELLO".to_string();

        obj.align = TextAlign::Left;
        let left = obj.hit_box(&fonts);
        obj.align = TextAlign::Center;
        let center = obj.hit_box(&fonts);
        obj.align = TextAlign::Right;
        let right = obj.hit_box(&fonts);

        assert!((left.width() - center.width()).abs() < 1e-3);
        assert!(left.min.x > center.min.x);
        assert!(center.min.x > right.min.x);
        // The anchor sits on the left/center/right edge respectively.
        assert!((left.min.x - 200.0).abs() < 1e-3);
        assert!((center.center().x - 200.0).abs() < 0.5);
        assert!((right.max.x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn hit_box_height_follows_font_size() {
        let fonts = FontLibrary::load().unwrap();
        let mut obj = TextObject::centered_in(400, 300);
        obj.size = 64.0;
        let rect = obj.hit_box(&fonts);
        assert!((rect.height() - 64.0).abs() < 1e-3);
        assert!((rect.center().y - 150.0).abs() < 1e-3);
    }
}
