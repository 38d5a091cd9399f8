use std::path::{Path, PathBuf};

use eframe::egui;
use image::DynamicImage;

use crate::model::{Corner, Label, Point};
use crate::persist;
use crate::scene::{self, Primitive};
use crate::store::AnnotationStore;
use crate::viewport::Viewport;

/// The mutable editing context the UI threads through every core call:
/// which class a click places, whether a corner placement is armed, and the
/// zoom viewport. One instance, owned by the app.
struct EditorState {
    class: Label,
    armed_corner: Option<Corner>,
    // Created on the first canvas frame, anchored at that frame's canvas
    // midpoint, and never re-anchored afterwards.
    viewport: Option<Viewport>,
}

impl EditorState {
    fn new() -> Self {
        Self {
            class: Label::Red,
            armed_corner: None,
            viewport: None,
        }
    }

    fn viewport_at(&mut self, center: Point) -> Viewport {
        *self.viewport.get_or_insert_with(|| Viewport::new(center))
    }

    fn change_zoom(&mut self, factor: f32) {
        if let Some(vp) = &mut self.viewport {
            vp.change_zoom(factor);
        }
    }
}

pub struct PointmarkApp {
    image_paths: Vec<PathBuf>,
    index: usize,
    annotations_path: PathBuf,

    store: AnnotationStore,
    editor: EditorState,

    texture: Option<egui::TextureHandle>,
    raw_image: Option<DynamicImage>,
    image_size: (f32, f32),

    status: String,
}

fn is_image(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        return matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tiff");
    }
    false
}

fn list_images(folder: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)
        .ok()
        .map(|iter| {
            iter.filter_map(|entry| entry.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_image(p))
                .collect()
        })
        .unwrap_or_default();
    paths.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    paths
}

impl PointmarkApp {
    pub fn new(input_folder: &Path, output_folder: &Path) -> Self {
        let image_paths = list_images(input_folder);
        let annotations_path = output_folder.join(persist::ANNOTATIONS_FILE);

        let (committed, status) = match persist::load(&annotations_path) {
            Ok(committed) => (committed, String::new()),
            Err(e) => {
                log::error!("could not read {}: {e}", annotations_path.display());
                (
                    Default::default(),
                    format!("Could not read existing annotations: {e}"),
                )
            }
        };

        let mut app = Self {
            image_paths,
            index: 0,
            annotations_path,
            store: AnnotationStore::new(committed),
            editor: EditorState::new(),
            texture: None,
            raw_image: None,
            image_size: (800.0, 600.0),
            status,
        };
        app.load_image(0);
        app
    }

    fn current_image_name(&self) -> Option<String> {
        self.image_paths
            .get(self.index)?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Displays the image at `index` and rebuilds the working list for it.
    /// Does NOT commit the outgoing image; use [`navigate`](Self::navigate)
    /// for anything after startup.
    fn load_image(&mut self, index: usize) {
        let Some(path) = self.image_paths.get(index) else {
            return;
        };
        self.index = index;
        self.texture = None;
        match image::open(path) {
            Ok(img) => {
                self.image_size = (img.width() as f32, img.height() as f32);
                self.raw_image = Some(img);
            }
            Err(e) => {
                log::warn!("failed to decode {}: {e}", path.display());
                self.status = format!("Could not load {}: {e}", path.display());
                self.raw_image = None;
            }
        }
        if let Some(name) = self.current_image_name() {
            self.store.load_working_for(&name);
        }
    }

    /// Commits the outgoing image before the incoming working list is built;
    /// skipping that ordering would drop the edits.
    fn navigate(&mut self, index: usize) {
        if index == self.index || index >= self.image_paths.len() {
            return;
        }
        if let Some(name) = self.current_image_name() {
            self.store.commit(&name);
        }
        self.load_image(index);
    }

    fn prev_image(&mut self) {
        if self.index > 0 {
            self.navigate(self.index - 1);
        }
    }

    fn next_image(&mut self) {
        self.navigate(self.index + 1);
    }

    fn save_all(&mut self) {
        if let Some(name) = self.current_image_name() {
            self.store.commit(&name);
        }
        match persist::save(&self.annotations_path, self.store.committed()) {
            Ok(()) => {
                self.status = format!("Saved {}", self.annotations_path.display());
            }
            Err(e) => {
                log::error!("save failed: {e}");
                self.status = format!("Save failed: {e}");
            }
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(ref img) = self.raw_image {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture =
                Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn class_color(class: Label) -> egui::Color32 {
        match class {
            Label::Red => egui::Color32::RED,
            Label::Blue => egui::Color32::from_rgb(60, 110, 255),
        }
    }

    fn draw_primitives(&self, painter: &egui::Painter, canvas_rect: egui::Rect, vp: &Viewport) {
        let to_global =
            |p: Point| egui::pos2(canvas_rect.min.x + p.x, canvas_rect.min.y + p.y);

        let bbox = self
            .current_image_name()
            .and_then(|name| self.store.bbox(&name).copied());
        for prim in scene::build(self.store.working(), bbox.as_ref(), vp) {
            match prim {
                Primitive::Dot { center, class } => {
                    painter.circle_filled(
                        to_global(center),
                        scene::DOT_RADIUS,
                        Self::class_color(class),
                    );
                }
                Primitive::Line { from, to, class } => {
                    painter.line_segment(
                        [to_global(from), to_global(to)],
                        egui::Stroke::new(2.0, Self::class_color(class)),
                    );
                }
                Primitive::BoxOutline { a, b } => {
                    painter.rect_stroke(
                        egui::Rect::from_two_pos(to_global(a), to_global(b)),
                        0.0,
                        egui::Stroke::new(2.0, egui::Color32::YELLOW),
                        egui::StrokeKind::Middle,
                    );
                }
                Primitive::Connector { from, to } => {
                    painter.line_segment(
                        [to_global(from), to_global(to)],
                        egui::Stroke::new(1.5, egui::Color32::LIGHT_GREEN),
                    );
                }
            }
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.editor.class, Label::Red, "Red");
                ui.selectable_value(&mut self.editor.class, Label::Blue, "Blue");
                ui.separator();

                if ui.button("Previous").clicked() {
                    self.prev_image();
                }
                if ui.button("Next").clicked() {
                    self.next_image();
                }
                if !self.image_paths.is_empty() {
                    let mut idx = self.index;
                    ui.add(egui::Slider::new(&mut idx, 0..=self.image_paths.len() - 1));
                    if idx != self.index {
                        self.navigate(idx);
                    }
                }
                ui.separator();

                if ui.button("Save").clicked() {
                    self.save_all();
                }
                ui.separator();

                if let Some(name) = self.current_image_name() {
                    ui.label(name);
                }
                if let Some(vp) = &self.editor.viewport {
                    ui.label(format!("Zoom: {:.0}%", vp.zoom() * 100.0));
                }
                if !self.status.is_empty() {
                    ui.label(egui::RichText::new(&self.status).italics().size(12.0));
                }
                match self.editor.armed_corner {
                    Some(Corner::TopLeft) => {
                        ui.label("click places: top-left corner");
                    }
                    Some(Corner::BottomRight) => {
                        ui.label("click places: bottom-right corner");
                    }
                    None => {}
                }
            });
        });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click());
            let canvas_rect = response.rect;
            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            if self.image_paths.is_empty() {
                painter.text(
                    canvas_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No images found in the input folder",
                    egui::FontId::proportional(18.0),
                    egui::Color32::LIGHT_GRAY,
                );
                return;
            }

            // The zoom anchor is the canvas midpoint of the first frame the
            // canvas existed; resizing the window later does not move it.
            let vp = self.editor.viewport_at(Point::new(
                canvas_rect.width() * 0.5,
                canvas_rect.height() * 0.5,
            ));

            if let Some(ref tex) = self.texture {
                let tl = vp.to_screen(Point::new(0.0, 0.0));
                let br = vp.to_screen(Point::new(self.image_size.0, self.image_size.1));
                let img_rect = egui::Rect::from_min_max(
                    egui::pos2(canvas_rect.min.x + tl.x, canvas_rect.min.y + tl.y),
                    egui::pos2(canvas_rect.min.x + br.x, canvas_rect.min.y + br.y),
                );
                painter.image(
                    tex.id(),
                    img_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            self.draw_primitives(&painter, canvas_rect, &vp);

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let local = Point::new(pos.x - canvas_rect.min.x, pos.y - canvas_rect.min.y);
                    let p = vp.to_canonical(local);
                    match self.editor.armed_corner.take() {
                        Some(corner) => {
                            if let Some(name) = self.current_image_name() {
                                self.store.set_corner(&name, corner, p);
                            }
                        }
                        None => self.store.add_point(p, self.editor.class),
                    }
                }
            }
        });
    }
}

impl eframe::App for PointmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        struct Keys {
            prev: bool,
            next: bool,
            red: bool,
            blue: bool,
            top_left: bool,
            bottom_right: bool,
            undo: bool,
            zoom_in: bool,
            zoom_out: bool,
            quit: bool,
            close_requested: bool,
        }
        let keys = ctx.input(|i| Keys {
            prev: i.key_pressed(egui::Key::ArrowLeft),
            next: i.key_pressed(egui::Key::ArrowRight),
            red: i.key_pressed(egui::Key::Num1),
            blue: i.key_pressed(egui::Key::Num2),
            top_left: i.key_pressed(egui::Key::T),
            bottom_right: i.key_pressed(egui::Key::B),
            undo: i.key_pressed(egui::Key::U)
                || (i.modifiers.ctrl && i.key_pressed(egui::Key::Z)),
            zoom_in: i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
            zoom_out: i.key_pressed(egui::Key::Minus),
            quit: i.key_pressed(egui::Key::Q),
            close_requested: i.viewport().close_requested(),
        });

        if keys.prev {
            self.prev_image();
        }
        if keys.next {
            self.next_image();
        }
        if keys.red {
            self.editor.class = Label::Red;
        }
        if keys.blue {
            self.editor.class = Label::Blue;
        }
        if keys.top_left {
            self.editor.armed_corner = Some(Corner::TopLeft);
        }
        if keys.bottom_right {
            self.editor.armed_corner = Some(Corner::BottomRight);
        }
        if keys.undo {
            self.store.undo_last();
        }
        if keys.zoom_in {
            self.editor.change_zoom(1.25);
        }
        if keys.zoom_out {
            self.editor.change_zoom(0.8);
        }
        if keys.quit {
            self.save_all();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        } else if keys.close_requested {
            // Window close button: flush the working set and write the file
            // before the process goes away.
            self.save_all();
        }

        self.toolbar(ctx);
        self.canvas(ctx);
    }
}
