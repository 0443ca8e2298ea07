use egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Hit radius around a handle's center, in screen pixels.
pub const HANDLE_RADIUS: f32 = 12.0;
const MIN_SIZE: f32 = 16.0;

/// The eight resize handles of the crop box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    NW,
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::N,
        Handle::NE,
        Handle::E,
        Handle::SE,
        Handle::S,
        Handle::SW,
        Handle::W,
    ];

    /// Screen position of the handle on the given rect.
    pub fn point(self, rect: Rect) -> Pos2 {
        let c = rect.center();
        match self {
            Handle::NW => rect.min,
            Handle::N => pos2(c.x, rect.min.y),
            Handle::NE => pos2(rect.max.x, rect.min.y),
            Handle::E => pos2(rect.max.x, c.y),
            Handle::SE => rect.max,
            Handle::S => pos2(c.x, rect.max.y),
            Handle::SW => pos2(rect.min.x, rect.max.y),
            Handle::W => pos2(rect.min.x, c.y),
        }
    }
}

/// Interactive crop rectangle in screen coordinates, with an optional locked
/// aspect ratio (width / height). Seeded when crop mode is entered, clamped
/// to the container on every update, consumed on Apply.
#[derive(Debug, Clone, PartialEq)]
pub struct CropBox {
    pub rect: Rect,
    pub aspect: Option<f32>,
}

impl CropBox {
    /// Default box: 60% of the container, centered, free aspect.
    pub fn default_in(container: Rect) -> Self {
        Self {
            rect: Rect::from_center_size(container.center(), container.size() * 0.6),
            aspect: None,
        }
    }

    /// Locks or frees the aspect ratio, reshaping the current box around its
    /// center when a ratio is set.
    pub fn set_aspect(&mut self, aspect: Option<f32>, container: Rect) {
        self.aspect = aspect;
        if let Some(a) = aspect {
            let mut w = self.rect.width();
            let mut h = w / a;
            if h > self.rect.height() {
                h = self.rect.height();
                w = h * a;
            }
            self.rect = Rect::from_center_size(self.rect.center(), vec2(w, h));
        }
        self.clamp_to(container);
    }

    pub fn hit_handle(&self, pos: Pos2) -> Option<Handle> {
        Handle::ALL
            .into_iter()
            .find(|h| h.point(self.rect).distance(pos) <= HANDLE_RADIUS)
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect.contains(pos)
    }

    /// Resizes from the dragged handle, keeping the opposite corner/edge
    /// fixed. With a locked aspect the dominant dimension is width for
    /// left/right and corner handles, height for top/bottom handles.
    pub fn drag_handle(&mut self, handle: Handle, pos: Pos2, container: Rect) {
        let mut r = self.rect;

        match handle {
            Handle::W | Handle::NW | Handle::SW => r.min.x = pos.x.min(r.max.x - MIN_SIZE),
            Handle::E | Handle::NE | Handle::SE => r.max.x = pos.x.max(r.min.x + MIN_SIZE),
            _ => {}
        }
        match handle {
            Handle::N | Handle::NW | Handle::NE => r.min.y = pos.y.min(r.max.y - MIN_SIZE),
            Handle::S | Handle::SW | Handle::SE => r.max.y = pos.y.max(r.min.y + MIN_SIZE),
            _ => {}
        }

        if let Some(a) = self.aspect {
            match handle {
                Handle::N | Handle::S => {
                    // Height drives; recenter the width.
                    let w = r.height() * a;
                    let cx = self.rect.center().x;
                    r.min.x = cx - w * 0.5;
                    r.max.x = cx + w * 0.5;
                }
                Handle::NW | Handle::NE => {
                    // Width drives; bottom edge stays fixed.
                    r.min.y = r.max.y - r.width() / a;
                }
                Handle::SW | Handle::SE => {
                    r.max.y = r.min.y + r.width() / a;
                }
                Handle::E | Handle::W => {
                    // Width drives; recenter the height.
                    let h = r.width() / a;
                    let cy = self.rect.center().y;
                    r.min.y = cy - h * 0.5;
                    r.max.y = cy + h * 0.5;
                }
            }
        }

        self.rect = r;
        self.clamp_to(container);
    }

    /// Translates the whole box, clamped inside the container.
    pub fn drag_body(&mut self, delta: Vec2, container: Rect) {
        self.rect = self.rect.translate(delta);
        self.clamp_to(container);
    }

    /// Corrects both size and position so the box never extends outside the
    /// container's visible bounds.
    pub fn clamp_to(&mut self, container: Rect) {
        let mut w = self.rect.width().min(container.width());
        let mut h = self.rect.height().min(container.height());
        if let Some(a) = self.aspect {
            if w / a > h {
                w = h * a;
            } else {
                h = w / a;
            }
        }

        let mut min = self.rect.min;
        min.x = min.x.clamp(container.min.x, container.max.x - w);
        min.y = min.y.clamp(container.min.y, container.max.y - h);
        self.rect = Rect::from_min_size(min, vec2(w, h));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    #[test]
    fn default_box_sits_centered_inside_the_container() {
        let cb = CropBox::default_in(container());
        assert_eq!(cb.rect.center(), pos2(400.0, 300.0));
        assert!(container().contains_rect(cb.rect));
    }

    #[test]
    fn east_handle_drag_moves_only_the_right_edge() {
        let mut cb = CropBox::default_in(container());
        let before = cb.rect;
        cb.drag_handle(Handle::E, pos2(700.0, 0.0), container());
        assert_eq!(cb.rect.min, before.min);
        assert!((cb.rect.max.x - 700.0).abs() < 1e-3);
        assert!((cb.rect.max.y - before.max.y).abs() < 1e-3);
    }

    #[test]
    fn corner_drag_keeps_opposite_corner_fixed() {
        let mut cb = CropBox::default_in(container());
        let anchor = cb.rect.max;
        cb.drag_handle(Handle::NW, pos2(100.0, 80.0), container());
        assert_eq!(cb.rect.max, anchor);
        assert_eq!(cb.rect.min, pos2(100.0, 80.0));
    }

    #[test]
    fn locked_aspect_recomputes_height_from_width_on_corner_drag() {
        let mut cb = CropBox::default_in(container());
        cb.set_aspect(Some(2.0), container());
        let bottom = cb.rect.max.y;
        cb.drag_handle(Handle::NE, pos2(cb.rect.min.x + 300.0, 0.0), container());
        assert!((cb.rect.width() - 300.0).abs() < 1e-3);
        assert!((cb.rect.height() - 150.0).abs() < 1e-3);
        assert!((cb.rect.max.y - bottom).abs() < 1e-3);
    }

    #[test]
    fn locked_aspect_recomputes_width_from_height_on_edge_drag() {
        let mut cb = CropBox::default_in(container());
        cb.set_aspect(Some(2.0), container());
        cb.drag_handle(Handle::S, pos2(0.0, cb.rect.min.y + 200.0), container());
        assert!((cb.rect.height() - 200.0).abs() < 1e-3);
        assert!((cb.rect.width() - 400.0).abs() < 1e-3);
    }

    #[test]
    fn body_drag_is_clamped_to_the_container() {
        let mut cb = CropBox::default_in(container());
        cb.drag_body(vec2(1e5, 1e5), container());
        assert!(container().contains_rect(cb.rect));
        assert_eq!(cb.rect.max, container().max);
    }

    #[test]
    fn handle_drag_never_escapes_the_container() {
        let mut cb = CropBox::default_in(container());
        cb.drag_handle(Handle::SE, pos2(5000.0, 5000.0), container());
        assert!(container().contains_rect(cb.rect));
    }

    #[test]
    fn hit_handle_finds_nearby_corner() {
        let cb = CropBox::default_in(container());
        let near = cb.rect.min + vec2(4.0, -4.0);
        assert_eq!(cb.hit_handle(near), Some(Handle::NW));
        assert_eq!(cb.hit_handle(cb.rect.center()), None);
    }
}
