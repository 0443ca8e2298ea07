use image::RgbaImage;
use image::imageops;

/// Rotates 90° clockwise. The output's dimensions are the input's swapped.
pub fn rotate90(img: &RgbaImage) -> RgbaImage {
    imageops::rotate90(img)
}

/// Mirrors along the vertical axis (left/right swap).
pub fn flip_horizontal(img: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(img)
}

/// Mirrors along the horizontal axis (top/bottom swap).
pub fn flip_vertical(img: &RgbaImage) -> RgbaImage {
    imageops::flip_vertical(img)
}
