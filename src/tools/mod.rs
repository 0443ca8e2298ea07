//! Per-mode interactive state: live geometry, aspect math, and hit boxes.
//! Destructive counterparts live in `crate::processing`.

pub mod crop;
pub mod resize;
pub mod text;
