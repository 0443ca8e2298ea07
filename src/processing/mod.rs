//! Destructive raster operations. Each function reads one snapshot and
//! produces a new one; committing the result is the caller's job.

pub mod adjust;
pub mod preset;
pub mod text;
pub mod transform;
