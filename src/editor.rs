use anyhow::Context;
use egui::Rect;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::compositor::{self, PreviewEffect};
use crate::history::HistoryStore;
use crate::processing::adjust::{self, FilterState};
use crate::processing::preset::{self, FilterPreset};
use crate::processing::text::{self as text_ops, FontLibrary};
use crate::processing::transform;
use crate::source;
use crate::tools::crop::CropBox;
use crate::tools::resize::ResizeFields;
use crate::tools::text::TextObject;
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Adjust,
    Filters,
    Crop,
    Resize,
    Text,
    Transform,
}

impl EditorMode {
    pub const ALL: [EditorMode; 6] = [
        EditorMode::Adjust,
        EditorMode::Filters,
        EditorMode::Crop,
        EditorMode::Resize,
        EditorMode::Text,
        EditorMode::Transform,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorMode::Adjust => "Adjust",
            EditorMode::Filters => "Filters",
            EditorMode::Crop => "Crop",
            EditorMode::Resize => "Resize",
            EditorMode::Text => "Text",
            EditorMode::Transform => "Transform",
        }
    }
}

/// The editing engine: snapshot history, viewport transform, per-mode live
/// state, and the Apply operations that commit new snapshots.
///
/// Everything here is synchronous; the session stays empty (and every Apply
/// and export is a no-op) until the source image has been loaded.
pub struct EditorSession {
    history: HistoryStore,
    pub viewport: Viewport,
    mode: EditorMode,
    /// Adjustment baseline already burned into the current snapshot.
    pub adjust_applied: FilterState,
    /// Live, uncommitted adjustment sliders.
    pub adjust_preview: FilterState,
    pub preset_preview: FilterPreset,
    pub crop: Option<CropBox>,
    pub resize: Option<ResizeFields>,
    pub text: Option<TextObject>,
    fonts: FontLibrary,
}

impl EditorSession {
    pub fn new(container: Rect) -> anyhow::Result<Self> {
        Ok(Self {
            history: HistoryStore::new(),
            viewport: Viewport::new(container),
            mode: EditorMode::Adjust,
            adjust_applied: FilterState::default(),
            adjust_preview: FilterState::default(),
            preset_preview: FilterPreset::None,
            crop: None,
            resize: None,
            text: None,
            fonts: FontLibrary::load().context("loading embedded fonts")?,
        })
    }

    /// Seeds the history with the decoded source image and fits it to the
    /// viewport.
    pub fn load_source(&mut self, img: RgbaImage) {
        debug!(width = img.width(), height = img.height(), "source image loaded");
        self.history.commit(img);
        if let Some(dims) = self.dimensions() {
            self.viewport.fit(dims);
        }
    }

    pub fn snapshot(&self) -> Option<&RgbaImage> {
        self.history.current()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.history.current().map(|s| s.dimensions())
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_cursor(&self) -> usize {
        self.history.cursor()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Switches editing mode, seeding or discarding mode-local state.
    /// Leaving crop mode without applying discards the box; the text object
    /// survives mode switches so a half-edited label is not lost.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if mode == self.mode {
            return;
        }
        if self.mode == EditorMode::Crop {
            self.crop = None;
        }
        self.mode = mode;
        match mode {
            EditorMode::Crop => {
                self.crop = Some(CropBox::default_in(self.viewport.container()));
            }
            EditorMode::Resize => {
                if let Some((w, h)) = self.dimensions() {
                    self.resize = Some(ResizeFields::seeded(w, h));
                }
            }
            EditorMode::Text => {
                if self.text.is_none() {
                    if let Some((w, h)) = self.dimensions() {
                        self.text = Some(TextObject::centered_in(w, h));
                    }
                }
            }
            _ => {}
        }
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.after_snapshot_change();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.after_snapshot_change();
        }
        moved
    }

    /// Restores the preview sliders to the committed baseline.
    pub fn reset_adjust(&mut self) {
        self.adjust_preview = self.adjust_applied;
    }

    /// The adjustment effect currently shown by the compositor: the preview
    /// relative to the baseline already burned into the snapshot.
    pub fn adjust_effect(&self) -> FilterState {
        self.adjust_preview.relative_to(&self.adjust_applied)
    }

    /// Burns the pending adjustment into a new snapshot and promotes the
    /// preview to the applied baseline. No-op when nothing changed.
    pub fn apply_adjust(&mut self) -> bool {
        let effect = self.adjust_effect();
        if effect.is_identity() {
            return false;
        }
        let Some(snap) = self.history.current() else {
            return false;
        };
        let out = adjust::apply(snap, &effect);
        self.history.commit(out);
        self.adjust_applied = self.adjust_preview;
        debug!(applied = ?self.adjust_applied, "adjustments applied");
        true
    }

    /// Burns the previewed preset and resets the preview to `None`.
    pub fn apply_preset(&mut self) -> bool {
        if self.preset_preview == FilterPreset::None {
            return false;
        }
        let Some(snap) = self.history.current() else {
            return false;
        };
        let out = preset::apply(snap, self.preset_preview);
        self.history.commit(out);
        debug!(preset = self.preset_preview.label(), "preset applied");
        self.preset_preview = FilterPreset::None;
        true
    }

    /// 90° clockwise, immediately destructive.
    pub fn rotate90(&mut self) -> bool {
        self.commit_transform(transform::rotate90)
    }

    pub fn flip_horizontal(&mut self) -> bool {
        self.commit_transform(transform::flip_horizontal)
    }

    pub fn flip_vertical(&mut self) -> bool {
        self.commit_transform(transform::flip_vertical)
    }

    fn commit_transform(&mut self, op: fn(&RgbaImage) -> RgbaImage) -> bool {
        let Some(snap) = self.history.current() else {
            return false;
        };
        let out = op(snap);
        self.history.commit(out);
        self.after_snapshot_change();
        true
    }

    /// Converts the crop box to an image-space rect via the inverse viewport
    /// transform, extracts that sub-raster, and commits it. Aborts without
    /// committing when the resulting dimensions are non-positive; the box is
    /// kept for correction in that case and reseeded after a successful crop.
    pub fn apply_crop(&mut self) -> bool {
        let Some(cb) = self.crop.clone() else {
            return false;
        };
        let Some(snap) = self.history.current() else {
            return false;
        };
        let (iw, ih) = snap.dimensions();

        let p0 = self.viewport.screen_to_image(cb.rect.min);
        let p1 = self.viewport.screen_to_image(cb.rect.max);
        let x0 = p0.x.round().clamp(0.0, iw as f32) as u32;
        let y0 = p0.y.round().clamp(0.0, ih as f32) as u32;
        let x1 = p1.x.round().clamp(0.0, iw as f32) as u32;
        let y1 = p1.y.round().clamp(0.0, ih as f32) as u32;
        let w = x1.saturating_sub(x0);
        let h = y1.saturating_sub(y0);
        if w == 0 || h == 0 {
            debug!(x0, y0, x1, y1, "crop rejected: empty source rectangle");
            return false;
        }

        let out = imageops::crop_imm(snap, x0, y0, w, h).to_image();
        self.history.commit(out);
        self.after_snapshot_change();
        self.crop = Some(CropBox::default_in(self.viewport.container()));
        true
    }

    /// Resamples to the target dimensions. No-op for non-positive targets.
    pub fn apply_resize(&mut self) -> bool {
        let Some(target) = self.resize.as_ref().and_then(|f| f.target()) else {
            return false;
        };
        let Some(snap) = self.history.current() else {
            return false;
        };
        let out = imageops::resize(snap, target.0, target.1, FilterType::Lanczos3);
        self.history.commit(out);
        self.after_snapshot_change();
        true
    }

    /// Rasterizes the live text object onto a new snapshot, then replaces it
    /// with a fresh default so another label can be placed without leaving
    /// text mode.
    pub fn apply_text(&mut self) -> bool {
        let Some(obj) = self.text.clone() else {
            return false;
        };
        if obj.content.trim().is_empty() {
            return false;
        }
        let Some(snap) = self.history.current() else {
            return false;
        };
        let mut out = snap.clone();
        text_ops::draw(&mut out, &obj, &self.fonts);
        self.history.commit(out);
        if let Some((w, h)) = self.dimensions() {
            self.text = Some(TextObject::centered_in(w, h));
        }
        true
    }

    /// Current snapshot through the active tool's live preview, ready for
    /// texture upload. `None` until the source has loaded.
    pub fn composite(&self) -> Option<RgbaImage> {
        let snap = self.history.current()?;
        let adjust_effect;
        let effect = match self.mode {
            EditorMode::Adjust => {
                adjust_effect = self.adjust_effect();
                PreviewEffect::Adjust(&adjust_effect)
            }
            EditorMode::Filters => PreviewEffect::Preset(self.preset_preview),
            _ => PreviewEffect::None,
        };
        let overlay = if self.mode == EditorMode::Text {
            self.text.as_ref().map(|t| (t, &self.fonts))
        } else {
            None
        };
        Some(compositor::composite(snap, effect, overlay))
    }

    /// Exports the current snapshot as a PNG data URI, or `None` when the
    /// source never loaded.
    pub fn export_png_data_uri(&self) -> anyhow::Result<Option<String>> {
        self.history
            .current()
            .map(source::to_png_data_uri)
            .transpose()
    }

    /// Screen-space hit box of the active text object, if any.
    pub fn text_hit_box(&self) -> Option<Rect> {
        let obj = self.text.as_ref()?;
        let rect = obj.hit_box(&self.fonts);
        Some(Rect::from_min_max(
            self.viewport.image_to_screen(rect.min),
            self.viewport.image_to_screen(rect.max),
        ))
    }

    /// Re-clamps viewport and reseeds dimension-dependent tool state after
    /// the active snapshot changed size (commit, undo, redo).
    fn after_snapshot_change(&mut self) {
        let Some(dims) = self.dimensions() else {
            return;
        };
        self.viewport.fit(dims);
        if self.mode == EditorMode::Resize {
            self.resize = Some(ResizeFields::seeded(dims.0, dims.1));
        }
        if let Some(ref mut text) = self.text {
            let max = (dims.0 as f32, dims.1 as f32);
            text.pos.0 = text.pos.0.clamp(0.0, max.0);
            text.pos.1 = text.pos.1.clamp(0.0, max.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2 as p2, vec2};
    use image::{ImageBuffer, Rgba};

    fn gradient(w: u32, h: u32) -> RgbaImage {
        ImageBuffer::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 99, 255]))
    }

    /// Session whose container matches the image 1:1 so the viewport fit is
    /// the identity transform.
    fn session(w: u32, h: u32) -> EditorSession {
        let container = Rect::from_min_size(p2(0.0, 0.0), vec2(w as f32, h as f32));
        let mut s = EditorSession::new(container).unwrap();
        s.load_source(gradient(w, h));
        s
    }

    #[test]
    fn empty_session_noops_everywhere() {
        let container = Rect::from_min_size(p2(0.0, 0.0), vec2(400.0, 300.0));
        let mut s = EditorSession::new(container).unwrap();
        assert!(!s.rotate90());
        assert!(!s.apply_preset());
        assert!(!s.apply_crop());
        assert!(!s.apply_resize());
        assert!(!s.apply_text());
        assert!(s.composite().is_none());
        assert!(s.export_png_data_uri().unwrap().is_none());
    }

    #[test]
    fn crop_dimension_invariant_at_identity_transform() {
        let mut s = session(400, 300);
        s.set_mode(EditorMode::Crop);
        s.crop.as_mut().unwrap().rect = Rect::from_min_size(p2(0.0, 0.0), vec2(200.0, 100.0));
        assert!(s.apply_crop());
        assert_eq!(s.dimensions(), Some((200, 100)));
    }

    #[test]
    fn crop_then_undo_scenario() {
        let mut s = session(400, 300);
        s.set_mode(EditorMode::Crop);
        s.crop.as_mut().unwrap().rect = Rect::from_min_size(p2(0.0, 0.0), vec2(100.0, 100.0));
        assert!(s.apply_crop());
        assert_eq!(s.history_len(), 2);
        assert_eq!(s.history_cursor(), 1);
        assert_eq!(s.dimensions(), Some((100, 100)));

        assert!(s.undo());
        assert_eq!(s.history_cursor(), 0);
        assert_eq!(s.dimensions(), Some((400, 300)));
    }

    #[test]
    fn crop_with_empty_source_rect_aborts() {
        let mut s = session(400, 300);
        s.set_mode(EditorMode::Crop);
        // Entirely to the right of the image: clamps to a zero-width rect.
        s.crop.as_mut().unwrap().rect = Rect::from_min_size(p2(450.0, 10.0), vec2(50.0, 50.0));
        assert!(!s.apply_crop());
        assert_eq!(s.history_len(), 1);
        // Live state preserved for correction.
        assert!(s.crop.is_some());
    }

    #[test]
    fn undo_n_times_restores_the_loaded_raster_exactly() {
        let mut s = session(64, 48);
        let original = s.snapshot().unwrap().clone();

        s.preset_preview = FilterPreset::Invert;
        assert!(s.apply_preset());
        assert!(s.rotate90());
        assert!(s.flip_horizontal());
        let final_snapshot = s.snapshot().unwrap().clone();

        for _ in 0..3 {
            assert!(s.undo());
        }
        assert_eq!(s.snapshot(), Some(&original));

        for _ in 0..3 {
            assert!(s.redo());
        }
        assert_eq!(s.snapshot(), Some(&final_snapshot));
    }

    #[test]
    fn new_edit_after_undo_discards_the_redo_branch() {
        let mut s = session(32, 32);
        assert!(s.rotate90());
        assert!(s.flip_vertical());
        assert!(s.undo());
        assert!(s.flip_horizontal());
        assert!(!s.redo());
        assert_eq!(s.history_len(), 3);
    }

    #[test]
    fn rotate_swaps_session_dimensions() {
        let mut s = session(400, 300);
        assert!(s.rotate90());
        assert_eq!(s.dimensions(), Some((300, 400)));
    }

    #[test]
    fn resize_applies_target_dimensions() {
        let mut s = session(800, 600);
        s.set_mode(EditorMode::Resize);
        s.resize.as_mut().unwrap().set_width(400);
        assert!(s.apply_resize());
        assert_eq!(s.dimensions(), Some((400, 300)));
        // Fields reseed from the new snapshot.
        assert_eq!(s.resize.as_ref().unwrap().width, 400);
    }

    #[test]
    fn identity_adjust_apply_is_a_noop() {
        let mut s = session(32, 32);
        assert!(!s.apply_adjust());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn adjust_apply_promotes_preview_to_applied() {
        let mut s = session(32, 32);
        s.set_mode(EditorMode::Adjust);
        s.adjust_preview.brightness = 150.0;
        assert!(s.apply_adjust());
        assert_eq!(s.adjust_applied, s.adjust_preview);
        // With preview == applied the compositor shows the snapshot as-is.
        assert!(s.adjust_effect().is_identity());
        assert_eq!(s.composite().as_ref(), s.snapshot());
    }

    #[test]
    fn adjust_reset_restores_preview_from_applied() {
        let mut s = session(32, 32);
        s.adjust_preview.brightness = 150.0;
        assert!(s.apply_adjust());
        s.adjust_preview.hue = 90.0;
        s.reset_adjust();
        assert_eq!(s.adjust_preview, s.adjust_applied);
    }

    #[test]
    fn preset_apply_resets_preview_to_none() {
        let mut s = session(32, 32);
        s.set_mode(EditorMode::Filters);
        s.preset_preview = FilterPreset::Grayscale;
        assert!(s.apply_preset());
        assert_eq!(s.preset_preview, FilterPreset::None);
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn text_apply_commits_and_resets_to_default() {
        let mut s = session(200, 100);
        s.set_mode(EditorMode::Text);
        let before = s.snapshot().unwrap().clone();
        s.text.as_mut().unwrap().content = "HELLO".to_string();
        s.text.as_mut().unwrap().color = [255, 255, 255, 255];

        assert!(s.apply_text());
        assert_eq!(s.history_len(), 2);
        assert_ne!(s.snapshot(), Some(&before));
        assert_eq!(s.text.as_ref().unwrap().content, TextObject::DEFAULT_CONTENT);
    }

    #[test]
    fn empty_text_apply_is_a_noop() {
        let mut s = session(64, 64);
        s.set_mode(EditorMode::Text);
        s.text.as_mut().unwrap().content = "  ".to_string();
        assert!(!s.apply_text());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn leaving_crop_mode_discards_the_box() {
        let mut s = session(400, 300);
        s.set_mode(EditorMode::Crop);
        assert!(s.crop.is_some());
        s.set_mode(EditorMode::Adjust);
        assert!(s.crop.is_none());
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn text_object_survives_mode_switches() {
        let mut s = session(400, 300);
        s.set_mode(EditorMode::Text);
        s.text.as_mut().unwrap().content = "KEEP".to_string();
        s.set_mode(EditorMode::Adjust);
        s.set_mode(EditorMode::Text);
        assert_eq!(s.text.as_ref().unwrap().content, "KEEP");
    }

    #[test]
    fn export_produces_a_png_data_uri_of_the_current_snapshot() {
        let mut s = session(10, 10);
        assert!(s.rotate90());
        let uri = s.export_png_data_uri().unwrap().unwrap();
        let back = crate::source::ImageSource::DataUri(uri).load().unwrap();
        assert_eq!(&back, s.snapshot().unwrap());
    }
}
