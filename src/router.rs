use egui::Vec2;

use crate::editor::EditorMode;
use crate::tools::crop::Handle;

/// What a pointer-down begins. Crop drags are captured separately by the
/// crop controller before this table is consulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerTarget {
    /// Reposition the active text object (text mode, pointer inside its box).
    TextDrag,
    /// Drag-pan the viewport.
    Pan,
    /// No interaction.
    None,
}

/// In-flight drag session. Created on pointer-down, torn down on any
/// pointer-up no matter where it lands, so a lost `up` inside a small hit
/// region can never leave a stuck drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSession {
    Pan,
    /// `grab` is the image-space offset from the pointer to the text anchor,
    /// held fixed for the drag's duration.
    Text { grab: Vec2 },
    CropHandle(Handle),
    CropBody,
}

/// Dispatch table for pointer-down events, in priority order:
/// text hit beats panning, panning requires the image to exceed the
/// viewport on some axis.
pub fn route_pointer_down(mode: EditorMode, text_hit: bool, pannable: bool) -> PointerTarget {
    if mode == EditorMode::Text && text_hit {
        return PointerTarget::TextDrag;
    }
    if pannable {
        return PointerTarget::Pan;
    }
    PointerTarget::None
}
