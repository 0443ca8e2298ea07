use egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Wheel zoom multiplier per scroll notch.
pub const ZOOM_STEP: f32 = 1.1;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 10.0;

/// Maps image-space pixels to screen-space pixels inside a container rect.
///
/// `screen = container.min + pan + image * scale`. On each axis the pan
/// either centers the image (when the scaled image is smaller than the
/// container) or is clamped so the image edge never recedes past the
/// container edge.
#[derive(Debug, Clone)]
pub struct Viewport {
    pub scale: f32,
    pub pan: Vec2,
    container: Rect,
}

impl Viewport {
    pub fn new(container: Rect) -> Self {
        Self {
            scale: 1.0,
            pan: Vec2::ZERO,
            container,
        }
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    /// Resynchronizes to a new container rect (e.g. window resize) and
    /// re-clamps the pan. Never touches the raster itself.
    pub fn set_container(&mut self, container: Rect, image_size: (u32, u32)) {
        self.container = container;
        self.clamp_pan(image_size);
    }

    /// Contain-fit: scale so the whole image is visible, centered.
    pub fn fit(&mut self, image_size: (u32, u32)) {
        let (iw, ih) = (image_size.0 as f32, image_size.1 as f32);
        if iw <= 0.0 || ih <= 0.0 {
            return;
        }
        let scale = (self.container.width() / iw).min(self.container.height() / ih);
        if scale <= 0.0 {
            return;
        }
        // The wheel-zoom floor does not apply here: very large images need a
        // fit scale below MIN_SCALE to be fully visible.
        self.scale = scale.min(MAX_SCALE);
        self.clamp_pan(image_size);
    }

    /// 1:1 pixel view, centered (or clamped if larger than the container).
    pub fn reset(&mut self, image_size: (u32, u32)) {
        self.scale = 1.0;
        self.pan = Vec2::ZERO;
        self.clamp_pan(image_size);
    }

    /// Multiplies the scale by `ZOOM_STEP^steps`, anchored at `pointer`:
    /// the image-space point under the cursor stays put on screen.
    pub fn zoom_at(&mut self, pointer: Pos2, steps: f32, image_size: (u32, u32)) {
        // Fit may have landed below MIN_SCALE; never snap back up past it.
        let floor = MIN_SCALE.min(self.scale);
        let new_scale = (self.scale * ZOOM_STEP.powf(steps)).clamp(floor, MAX_SCALE);
        if (new_scale - self.scale).abs() < f32::EPSILON {
            return;
        }
        let anchor = self.screen_to_image(pointer);
        self.scale = new_scale;
        self.pan = pointer - self.container.min - anchor.to_vec2() * self.scale;
        self.clamp_pan(image_size);
    }

    /// Translates the pan by the pointer delta, clamped.
    pub fn pan_by(&mut self, delta: Vec2, image_size: (u32, u32)) {
        self.pan += delta;
        self.clamp_pan(image_size);
    }

    /// Whether the scaled image exceeds the container on some axis, i.e.
    /// whether a drag-pan would do anything.
    pub fn pannable(&self, image_size: (u32, u32)) -> bool {
        let scaled = self.scaled_size(image_size);
        scaled.x > self.container.width() + 0.5 || scaled.y > self.container.height() + 0.5
    }

    pub fn screen_to_image(&self, pos: Pos2) -> Pos2 {
        let local = pos - self.container.min - self.pan;
        pos2(local.x / self.scale, local.y / self.scale)
    }

    pub fn image_to_screen(&self, pos: Pos2) -> Pos2 {
        self.container.min + self.pan + pos.to_vec2() * self.scale
    }

    /// Screen rect covered by the whole image under the current transform.
    pub fn image_rect(&self, image_size: (u32, u32)) -> Rect {
        Rect::from_min_size(self.image_to_screen(pos2(0.0, 0.0)), self.scaled_size(image_size))
    }

    fn scaled_size(&self, image_size: (u32, u32)) -> Vec2 {
        vec2(image_size.0 as f32, image_size.1 as f32) * self.scale
    }

    fn clamp_pan(&mut self, image_size: (u32, u32)) {
        let scaled = self.scaled_size(image_size);
        self.pan.x = clamp_axis(self.pan.x, scaled.x, self.container.width());
        self.pan.y = clamp_axis(self.pan.y, scaled.y, self.container.height());
    }
}

/// Centers when the image fits, otherwise keeps the image covering the
/// container on that axis.
fn clamp_axis(pan: f32, scaled: f32, container: f32) -> f32 {
    if scaled <= container {
        (container - scaled) * 0.5
    } else {
        pan.clamp(container - scaled, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    #[test]
    fn fit_centers_smaller_axis() {
        let mut vp = Viewport::new(container());
        vp.fit((400, 600));
        // Height-limited: scale = 1.0, image is 400x600 in an 800x600 box.
        assert!((vp.scale - 1.0).abs() < 1e-6);
        assert!((vp.pan.x - 200.0).abs() < 1e-4);
        assert!((vp.pan.y - 0.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_keeps_pointer_anchor_fixed() {
        let mut vp = Viewport::new(container());
        vp.scale = 2.0;
        vp.pan = vec2(-300.0, -200.0);
        let image = (2000, 2000);
        let pointer = pos2(400.0, 300.0);

        let before = vp.screen_to_image(pointer);
        vp.zoom_at(pointer, 2.0, image);
        let after = vp.screen_to_image(pointer);

        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn fit_goes_below_the_wheel_zoom_floor_for_huge_images() {
        let mut vp = Viewport::new(container());
        let image = (100_000, 100);
        vp.fit(image);

        assert!((vp.scale - 800.0 / 100_000.0).abs() < 1e-7);
        assert!(vp.scale < MIN_SCALE);
        // The whole image is visible.
        assert!(vp.image_rect(image).width() <= 800.0 + 0.5);

        // Zooming out never drops below the fitted scale.
        let fitted = vp.scale;
        vp.zoom_at(pos2(400.0, 300.0), -5.0, image);
        assert!(vp.scale >= fitted - 1e-7);
    }

    #[test]
    fn zoom_respects_scale_bounds() {
        let mut vp = Viewport::new(container());
        vp.zoom_at(pos2(100.0, 100.0), 1000.0, (100, 100));
        assert!((vp.scale - MAX_SCALE).abs() < 1e-6);
        vp.zoom_at(pos2(100.0, 100.0), -10000.0, (100, 100));
        assert!((vp.scale - MIN_SCALE).abs() < 1e-6);
    }

    #[test]
    fn pan_is_clamped_to_image_edges() {
        let mut vp = Viewport::new(container());
        vp.scale = 2.0; // 2000x1200 scaled image
        let image = (1000, 600);

        vp.pan_by(vec2(1e6, 1e6), image);
        assert_eq!(vp.pan, vec2(0.0, 0.0));

        vp.pan_by(vec2(-1e6, -1e6), image);
        assert_eq!(vp.pan, vec2(800.0 - 2000.0, 600.0 - 1200.0));
    }

    #[test]
    fn pan_centers_when_image_fits() {
        let mut vp = Viewport::new(container());
        vp.scale = 1.0;
        vp.pan_by(vec2(500.0, -500.0), (400, 300));
        assert_eq!(vp.pan, vec2(200.0, 150.0));
    }

    #[test]
    fn pannable_only_when_scaled_image_exceeds_container() {
        let mut vp = Viewport::new(container());
        assert!(!vp.pannable((400, 300)));
        vp.scale = 3.0;
        assert!(vp.pannable((400, 300)));
    }

    #[test]
    fn screen_image_round_trip() {
        let mut vp = Viewport::new(container());
        vp.scale = 1.5;
        vp.pan = vec2(-40.0, -20.0);
        let p = pos2(123.0, 321.0);
        let rt = vp.image_to_screen(vp.screen_to_image(p));
        assert!((rt.x - p.x).abs() < 1e-3);
        assert!((rt.y - p.y).abs() < 1e-3);
    }
}
