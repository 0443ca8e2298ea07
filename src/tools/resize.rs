/// Target dimensions for the resize tool. The aspect ratio is captured when
/// the fields are seeded; while locked, editing one field recomputes the
/// other from that captured ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeFields {
    pub width: u32,
    pub height: u32,
    pub lock_aspect: bool,
    ratio: f32,
}

impl ResizeFields {
    /// Seeds from the current snapshot's dimensions.
    pub fn seeded(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            lock_aspect: true,
            ratio: if height > 0 {
                width as f32 / height as f32
            } else {
                1.0
            },
        }
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width;
        if self.lock_aspect && self.ratio > 0.0 {
            self.height = (width as f32 / self.ratio).round() as u32;
        }
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        if self.lock_aspect {
            self.width = (height as f32 * self.ratio).round() as u32;
        }
    }

    /// Target dimensions, or `None` when either is non-positive (Apply is a
    /// no-op in that case, and the fields stay put for correction).
    pub fn target(&self) -> Option<(u32, u32)> {
        (self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }
}
