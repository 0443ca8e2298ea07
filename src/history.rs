use image::RgbaImage;

/// Linear undo/redo log of full-resolution raster snapshots.
///
/// Snapshots are immutable by convention: every destructive edit reads the
/// current snapshot and commits a brand-new one, so undo/redo is a pure
/// cursor move. Committing while the cursor is not at the end discards the
/// redo branch before appending.
pub struct HistoryStore {
    snapshots: Vec<RgbaImage>,
    cursor: usize,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: 0,
        }
    }

    /// Truncates any redo branch, appends `snapshot`, and moves the cursor
    /// to the new last index.
    pub fn commit(&mut self, snapshot: RgbaImage) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;
    }

    /// Moves the cursor one step back. Returns whether it moved.
    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Moves the cursor one step forward. Returns whether it moved.
    pub fn redo(&mut self) -> bool {
        if self.snapshots.is_empty() || self.cursor == self.snapshots.len() - 1 {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// The active snapshot, or `None` before the source image has loaded.
    pub fn current(&self) -> Option<&RgbaImage> {
        self.snapshots.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor < self.snapshots.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryStore;
    use image::{ImageBuffer, Rgba, RgbaImage};

    fn solid(w: u32, h: u32, v: u8) -> RgbaImage {
        ImageBuffer::from_pixel(w, h, Rgba([v, v, v, 255]))
    }

    #[test]
    fn current_is_none_before_first_commit() {
        let store = HistoryStore::new();
        assert!(store.current().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn undo_and_redo_at_bounds_are_noops() {
        let mut store = HistoryStore::new();
        assert!(!store.undo());
        assert!(!store.redo());

        store.commit(solid(2, 2, 10));
        assert!(!store.undo());
        assert!(!store.redo());
        assert_eq!(store.cursor(), 0);
    }

    #[test]
    fn undo_n_times_restores_original_and_redo_restores_final() {
        let mut store = HistoryStore::new();
        let original = solid(4, 4, 0);
        store.commit(original.clone());
        for v in 1..=3u8 {
            store.commit(solid(4, 4, v * 10));
        }

        for _ in 0..3 {
            assert!(store.undo());
        }
        assert_eq!(store.current(), Some(&original));

        for _ in 0..3 {
            assert!(store.redo());
        }
        assert_eq!(store.current(), Some(&solid(4, 4, 30)));
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut store = HistoryStore::new();
        store.commit(solid(2, 2, 1));
        store.commit(solid(2, 2, 2));
        store.commit(solid(2, 2, 3));

        store.undo();
        store.undo();
        store.commit(solid(2, 2, 9));

        assert_eq!(store.len(), 2);
        assert_eq!(store.cursor(), 1);
        assert!(!store.redo());
        assert_eq!(store.current(), Some(&solid(2, 2, 9)));
    }
}
