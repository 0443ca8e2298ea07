use std::sync::mpsc;

use egui::{Color32, CornerRadius, Key, Rect, StrokeKind, pos2, vec2};
use image::RgbaImage;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::editor::{EditorMode, EditorSession};
use crate::processing::preset::FilterPreset;
use crate::router::{self, DragSession, PointerTarget};
use crate::source::ImageSource;
use crate::tools::crop::Handle;
use crate::tools::text::{FontFamily, Outline, Shadow, TextAlign};

/// The editor's only outward surface: discard everything, or hand back the
/// exported PNG data URI.
pub struct EditorCallbacks {
    pub on_close: Box<dyn FnMut()>,
    pub on_save: Box<dyn FnMut(String)>,
}

enum LoadResult {
    Loaded(Box<RgbaImage>),
    Failed(String),
}

pub struct RetouchApp {
    session: EditorSession,
    callbacks: EditorCallbacks,
    texture: Option<egui::TextureHandle>,
    /// Compositor output is stale and needs a texture re-upload.
    dirty: bool,
    /// Viewport fit deferred until the first frame with a real canvas rect.
    fit_pending: bool,
    drag: Option<DragSession>,
    rx: mpsc::Receiver<LoadResult>,
    loading: bool,
    load_error: Option<String>,
    config: AppConfig,
}

impl RetouchApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        source: ImageSource,
        callbacks: EditorCallbacks,
    ) -> anyhow::Result<Self> {
        // Placeholder container; replaced by the real canvas rect each frame.
        let session = EditorSession::new(Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0)))?;

        let (tx, rx) = mpsc::channel();
        let ctx = cc.egui_ctx.clone();
        std::thread::spawn(move || {
            let result = match source.load() {
                Ok(img) => LoadResult::Loaded(Box::new(img)),
                Err(err) => LoadResult::Failed(format!("{err:#}")),
            };
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        Ok(Self {
            session,
            callbacks,
            texture: None,
            dirty: false,
            fit_pending: false,
            drag: None,
            rx,
            loading: true,
            load_error: None,
            config,
        })
    }

    fn drain(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                LoadResult::Loaded(img) => {
                    self.session.load_source(*img);
                    self.loading = false;
                    self.fit_pending = true;
                    self.dirty = true;
                }
                LoadResult::Failed(err) => {
                    // The editor stays open with no snapshot; every Apply and
                    // Save is a no-op in that state.
                    warn!(%err, "source image failed to load");
                    self.loading = false;
                    self.load_error = Some(err);
                }
            }
        }
    }

    fn close(&mut self, ctx: &egui::Context) {
        (self.callbacks.on_close)();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn save(&mut self, ctx: &egui::Context) {
        match self.session.export_png_data_uri() {
            Ok(Some(uri)) => {
                (self.callbacks.on_save)(uri);
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Ok(None) => info!("save ignored: no image loaded"),
            Err(err) => warn!(%err, "export failed"),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (undo, redo) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (
                cmd && !i.modifiers.shift && i.key_pressed(Key::Z),
                cmd && (i.key_pressed(Key::Y) || (i.modifiers.shift && i.key_pressed(Key::Z))),
            )
        });
        if undo && self.session.undo() {
            self.dirty = true;
        }
        if redo && self.session.redo() {
            self.dirty = true;
        }
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.close(ctx);
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for mode in EditorMode::ALL {
                    let selected = self.session.mode() == mode;
                    if ui.selectable_label(selected, mode.label()).clicked() && !selected {
                        self.session.set_mode(mode);
                        self.dirty = true;
                    }
                }
                ui.separator();
                if ui
                    .add_enabled(self.session.can_undo(), egui::Button::new("⟲ Undo"))
                    .clicked()
                    && self.session.undo()
                {
                    self.dirty = true;
                }
                if ui
                    .add_enabled(self.session.can_redo(), egui::Button::new("⟳ Redo"))
                    .clicked()
                    && self.session.redo()
                {
                    self.dirty = true;
                }

                ui.separator();
                if let Some(dims) = self.session.dimensions() {
                    if ui.button("Fit").clicked() {
                        self.session.viewport.fit(dims);
                    }
                    if ui.button("1:1").clicked() {
                        self.session.viewport.reset(dims);
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Save Changes").clicked() {
                        self.save(ui.ctx());
                    }
                    if ui.button("Cancel").clicked() {
                        self.close(ui.ctx());
                    }
                });
            });
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Edit Image").strong().size(15.0));
        ui.separator();
        match self.session.mode() {
            EditorMode::Adjust => self.adjust_controls(ui),
            EditorMode::Filters => self.filter_controls(ui),
            EditorMode::Crop => self.crop_controls(ui),
            EditorMode::Resize => self.resize_controls(ui),
            EditorMode::Text => self.text_controls(ui),
            EditorMode::Transform => self.transform_controls(ui),
        }
    }

    fn adjust_controls(&mut self, ui: &mut egui::Ui) {
        let preview = &mut self.session.adjust_preview;
        let mut changed = false;
        ui.label("Brightness");
        changed |= ui
            .add(egui::Slider::new(&mut preview.brightness, 0.0..=200.0).suffix("%"))
            .changed();
        ui.label("Contrast");
        changed |= ui
            .add(egui::Slider::new(&mut preview.contrast, 0.0..=200.0).suffix("%"))
            .changed();
        ui.label("Saturation");
        changed |= ui
            .add(egui::Slider::new(&mut preview.saturation, 0.0..=200.0).suffix("%"))
            .changed();
        ui.label("Hue");
        changed |= ui
            .add(egui::Slider::new(&mut preview.hue, -180.0..=180.0).suffix("°"))
            .changed();
        if changed {
            self.dirty = true;
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                self.session.reset_adjust();
                self.dirty = true;
            }
            if ui.button("Apply").clicked() && self.session.apply_adjust() {
                self.dirty = true;
            }
        });
    }

    fn filter_controls(&mut self, ui: &mut egui::Ui) {
        for preset in FilterPreset::ALL {
            if ui
                .selectable_value(&mut self.session.preset_preview, preset, preset.label())
                .changed()
            {
                self.dirty = true;
            }
        }
        ui.add_space(8.0);
        let enabled = self.session.preset_preview != FilterPreset::None;
        if ui.add_enabled(enabled, egui::Button::new("Apply")).clicked()
            && self.session.apply_preset()
        {
            self.dirty = true;
        }
    }

    fn crop_controls(&mut self, ui: &mut egui::Ui) {
        let container = self.session.viewport.container();
        if let Some(ref mut cb) = self.session.crop {
            ui.label("Aspect ratio");
            ui.horizontal(|ui| {
                let choices: [(&str, Option<f32>); 4] = [
                    ("Free", None),
                    ("1:1", Some(1.0)),
                    ("4:3", Some(4.0 / 3.0)),
                    ("16:9", Some(16.0 / 9.0)),
                ];
                for (label, aspect) in choices {
                    let selected = match (cb.aspect, aspect) {
                        (None, None) => true,
                        (Some(a), Some(b)) => (a - b).abs() < 1e-3,
                        _ => false,
                    };
                    if ui.selectable_label(selected, label).clicked() {
                        cb.set_aspect(aspect, container);
                    }
                }
            });
        }
        ui.add_space(8.0);
        if ui.button("Apply Crop").clicked() && self.session.apply_crop() {
            self.dirty = true;
        }
    }

    fn resize_controls(&mut self, ui: &mut egui::Ui) {
        if let Some(ref mut fields) = self.session.resize {
            let mut width = fields.width;
            let mut height = fields.height;
            ui.horizontal(|ui| {
                ui.label("Width");
                if ui
                    .add(egui::DragValue::new(&mut width).range(0..=20000).suffix(" px"))
                    .changed()
                {
                    fields.set_width(width);
                }
            });
            ui.horizontal(|ui| {
                ui.label("Height");
                if ui
                    .add(egui::DragValue::new(&mut height).range(0..=20000).suffix(" px"))
                    .changed()
                {
                    fields.set_height(height);
                }
            });
            ui.checkbox(&mut fields.lock_aspect, "Lock aspect ratio");
        }
        ui.add_space(8.0);
        if ui.button("Apply").clicked() && self.session.apply_resize() {
            self.dirty = true;
        }
    }

    fn text_controls(&mut self, ui: &mut egui::Ui) {
        let Some(ref mut obj) = self.session.text else {
            ui.label(egui::RichText::new("No image loaded").weak());
            return;
        };
        let mut changed = false;

        changed |= ui.text_edit_singleline(&mut obj.content).changed();

        egui::ComboBox::from_label("Font")
            .selected_text(obj.font.label())
            .show_ui(ui, |ui| {
                for family in FontFamily::ALL {
                    changed |= ui
                        .selectable_value(&mut obj.font, family, family.label())
                        .changed();
                }
            });

        ui.label("Size");
        changed |= ui
            .add(egui::Slider::new(&mut obj.size, 8.0..=256.0).suffix(" px"))
            .changed();

        ui.horizontal(|ui| {
            ui.label("Color");
            let mut color = color32(obj.color);
            if ui.color_edit_button_srgba(&mut color).changed() {
                obj.color = color.to_array();
                changed = true;
            }
        });

        egui::ComboBox::from_label("Alignment")
            .selected_text(obj.align.label())
            .show_ui(ui, |ui| {
                for align in TextAlign::ALL {
                    changed |= ui
                        .selectable_value(&mut obj.align, align, align.label())
                        .changed();
                }
            });

        ui.add_space(4.0);
        let mut has_outline = obj.outline.is_some();
        if ui.checkbox(&mut has_outline, "Outline").changed() {
            obj.outline = has_outline.then_some(Outline {
                color: [0, 0, 0, 255],
                width: 2.0,
            });
            changed = true;
        }
        if let Some(ref mut outline) = obj.outline {
            ui.horizontal(|ui| {
                let mut color = color32(outline.color);
                if ui.color_edit_button_srgba(&mut color).changed() {
                    outline.color = color.to_array();
                    changed = true;
                }
                changed |= ui
                    .add(egui::Slider::new(&mut outline.width, 0.5..=10.0).text("width"))
                    .changed();
            });
        }

        let mut has_shadow = obj.shadow.is_some();
        if ui.checkbox(&mut has_shadow, "Shadow").changed() {
            obj.shadow = has_shadow.then_some(Shadow {
                color: [0, 0, 0, 160],
                offset: (4.0, 4.0),
                blur: 3.0,
            });
            changed = true;
        }
        if let Some(ref mut shadow) = obj.shadow {
            ui.horizontal(|ui| {
                let mut color = color32(shadow.color);
                if ui.color_edit_button_srgba(&mut color).changed() {
                    shadow.color = color.to_array();
                    changed = true;
                }
                changed |= ui
                    .add(egui::DragValue::new(&mut shadow.offset.0).speed(0.5).prefix("x "))
                    .changed();
                changed |= ui
                    .add(egui::DragValue::new(&mut shadow.offset.1).speed(0.5).prefix("y "))
                    .changed();
            });
            changed |= ui
                .add(egui::Slider::new(&mut shadow.blur, 0.0..=20.0).text("blur"))
                .changed();
        }

        if changed {
            self.dirty = true;
        }

        ui.add_space(8.0);
        if ui.button("Apply").clicked() && self.session.apply_text() {
            self.dirty = true;
        }
    }

    fn transform_controls(&mut self, ui: &mut egui::Ui) {
        if ui.button("⟳ Rotate 90°").clicked() && self.session.rotate90() {
            self.dirty = true;
        }
        if ui.button("↔ Flip horizontal").clicked() && self.session.flip_horizontal() {
            self.dirty = true;
        }
        if ui.button("↕ Flip vertical").clicked() && self.session.flip_vertical() {
            self.dirty = true;
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        let Some(dims) = self.session.dimensions() else {
            ui.scope_builder(egui::UiBuilder::new().max_rect(rect), |ui| {
                ui.centered_and_justified(|ui| {
                    if self.loading {
                        ui.spinner();
                    } else if let Some(ref err) = self.load_error {
                        ui.label(format!("⚠ Could not load image: {err}"));
                    }
                });
            });
            return;
        };

        self.session.viewport.set_container(rect, dims);
        if self.fit_pending {
            self.session.viewport.fit(dims);
            self.fit_pending = false;
        }

        // Wheel zoom, anchored at the pointer.
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll.abs() > 0.1 {
                if let Some(pointer) = response.hover_pos() {
                    self.session.viewport.zoom_at(pointer, scroll / 50.0, dims);
                }
            }
        }

        if response.drag_started() {
            if let Some(pointer) = response.interact_pointer_pos() {
                self.drag = self.begin_drag(pointer);
            }
        }
        if response.dragged() {
            if let Some(pointer) = response.interact_pointer_pos() {
                self.continue_drag(pointer, response.drag_delta(), rect, dims);
            }
        }
        // Window-scoped teardown: any release ends the drag, even when the
        // pointer left the hit region or the canvas entirely.
        if ui.input(|i| i.pointer.any_released()) {
            self.drag = None;
        }

        let painter = ui.painter_at(rect);
        if let Some(ref texture) = self.texture {
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(texture.id(), self.session.viewport.image_rect(dims), uv, Color32::WHITE);
        }

        if self.session.mode() == EditorMode::Crop {
            if let Some(ref cb) = self.session.crop {
                draw_crop_overlay(&painter, rect, cb.rect);
            }
        }
        if self.session.mode() == EditorMode::Text {
            if let Some(hit_box) = self.session.text_hit_box() {
                painter.rect_stroke(
                    hit_box,
                    CornerRadius::ZERO,
                    egui::Stroke::new(1.0, Color32::from_white_alpha(140)),
                    StrokeKind::Outside,
                );
            }
        }
    }

    /// Pointer-down dispatch: crop captures its handles and body first, then
    /// the router decides between text drag, pan, and nothing.
    fn begin_drag(&mut self, pointer: egui::Pos2) -> Option<DragSession> {
        if self.session.mode() == EditorMode::Crop {
            if let Some(ref cb) = self.session.crop {
                if let Some(handle) = cb.hit_handle(pointer) {
                    return Some(DragSession::CropHandle(handle));
                }
                if cb.contains(pointer) {
                    return Some(DragSession::CropBody);
                }
            }
        }

        let dims = self.session.dimensions()?;
        let text_hit = self
            .session
            .text_hit_box()
            .is_some_and(|b| b.contains(pointer));
        let pannable = self.session.viewport.pannable(dims);
        match router::route_pointer_down(self.session.mode(), text_hit, pannable) {
            PointerTarget::TextDrag => {
                let anchor = self.session.text.as_ref()?.pos;
                let image_pt = self.session.viewport.screen_to_image(pointer);
                Some(DragSession::Text {
                    grab: vec2(anchor.0 - image_pt.x, anchor.1 - image_pt.y),
                })
            }
            PointerTarget::Pan => Some(DragSession::Pan),
            PointerTarget::None => None,
        }
    }

    fn continue_drag(
        &mut self,
        pointer: egui::Pos2,
        delta: egui::Vec2,
        container: Rect,
        dims: (u32, u32),
    ) {
        match self.drag {
            Some(DragSession::Pan) => {
                self.session.viewport.pan_by(delta, dims);
            }
            Some(DragSession::Text { grab }) => {
                let image_pt = self.session.viewport.screen_to_image(pointer);
                if let Some(ref mut obj) = self.session.text {
                    obj.pos = (image_pt.x + grab.x, image_pt.y + grab.y);
                    self.dirty = true;
                }
            }
            Some(DragSession::CropHandle(handle)) => {
                if let Some(ref mut cb) = self.session.crop {
                    cb.drag_handle(handle, pointer, container);
                }
            }
            Some(DragSession::CropBody) => {
                if let Some(ref mut cb) = self.session.crop {
                    cb.drag_body(delta, container);
                }
            }
            None => {}
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        if !self.dirty {
            return;
        }
        if let Some(img) = self.session.composite() {
            let size = [img.width() as usize, img.height() as usize];
            let color = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
            self.texture = Some(ctx.load_texture("editor_canvas", color, egui::TextureOptions::LINEAR));
        }
        self.dirty = false;
    }
}

impl eframe::App for RetouchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        self.drain();
        self.handle_shortcuts(ctx);
        self.toolbar(ctx);

        egui::SidePanel::right("controls")
            .min_width(240.0)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.controls(ui));
            });

        self.upload_texture(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}

fn color32(c: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

/// Darkens everything outside the crop box and draws its frame and handles.
fn draw_crop_overlay(painter: &egui::Painter, canvas: Rect, crop: Rect) {
    let shade = Color32::from_black_alpha(120);
    let bands = [
        Rect::from_min_max(canvas.min, pos2(canvas.max.x, crop.min.y)),
        Rect::from_min_max(pos2(canvas.min.x, crop.max.y), canvas.max),
        Rect::from_min_max(pos2(canvas.min.x, crop.min.y), pos2(crop.min.x, crop.max.y)),
        Rect::from_min_max(pos2(crop.max.x, crop.min.y), pos2(canvas.max.x, crop.max.y)),
    ];
    for band in bands {
        if band.is_positive() {
            painter.rect_filled(band, CornerRadius::ZERO, shade);
        }
    }

    painter.rect_stroke(
        crop,
        CornerRadius::ZERO,
        egui::Stroke::new(1.5, Color32::WHITE),
        StrokeKind::Middle,
    );
    for handle in Handle::ALL {
        let center = handle.point(crop);
        painter.rect_filled(
            Rect::from_center_size(center, vec2(8.0, 8.0)),
            CornerRadius::ZERO,
            Color32::WHITE,
        );
    }
}
