use egui::{ColorImage, TextureOptions};

#[cfg(all(not(target_arch = "wasm32"), not(target_os = "android")))]
use rfd::FileDialog;

use crate::error::SplitError;
use crate::export;
use crate::file_picker;
use crate::slicer::{self, Slice};

/// The whole session lives here: one decoded source image and one slice
/// sequence at a time. Loading a new file or resetting replaces the state
/// wholesale; there is no partial update.
///
/// We derive Deserialize/Serialize so the last opened path survives restarts.
/// Image data and slices are session-only and never persisted.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct SplitterApp {
    // Persist the last opened image path (native only)
    source_path: Option<String>,

    #[serde(skip)]
    source: Option<image::RgbaImage>,

    #[serde(skip)]
    slices: Vec<Slice>,

    #[serde(skip)]
    source_texture: Option<egui::TextureHandle>,

    // One entry per slice; None for zero-height bands that have no preview
    #[serde(skip)]
    slice_textures: Vec<Option<egui::TextureHandle>>,

    #[serde(skip)]
    error: Option<String>,
}

impl Default for SplitterApp {
    fn default() -> Self {
        Self {
            source_path: None,
            source: None,
            slices: Vec::new(),
            source_texture: None,
            slice_textures: Vec::new(),
            error: None,
        }
    }
}

impl SplitterApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Load previous app state (if any).
        // Note that you must enable the `persistence` feature for this to work.
        let mut this: Self = if let Some(storage) = cc.storage {
            eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default()
        } else {
            Default::default()
        };

        // Re-open the image from the previous session, if there was one.
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(path) = this.source_path.clone() {
            if let Err(e) = this.load_from_path(std::path::Path::new(&path)) {
                this.error = Some(e.to_string());
            }
        }

        // Set visuals to dark by default
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        this
    }

    /// Decodes an image file from disk and makes it the current session.
    #[cfg(not(target_arch = "wasm32"))]
    fn load_from_path(&mut self, path: &std::path::Path) -> Result<(), SplitError> {
        let img = image::open(path)
            .map_err(|e| SplitError::Decode(e.to_string()))?
            .to_rgba8();
        let label = path.to_string_lossy().to_string();
        self.install_source(img, label);
        Ok(())
    }

    /// Decodes in-memory bytes (the wasm picker hands us these) and makes
    /// them the current session.
    fn load_from_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), SplitError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| SplitError::Decode(e.to_string()))?
            .to_rgba8();
        self.install_source(img, name.to_owned());
        Ok(())
    }

    /// Replaces the session with a freshly decoded source. Any previous
    /// slices and previews are discarded.
    fn install_source(&mut self, img: image::RgbaImage, label: String) {
        log::info!("loaded '{}' ({}x{})", label, img.width(), img.height());
        self.source = Some(img);
        self.source_path = Some(label);
        self.slices = Vec::new();
        self.source_texture = None;
        self.slice_textures = Vec::new();
        self.error = None;
    }

    /// Runs the slicer over the current source. The new sequence fully
    /// replaces any prior one; on failure nothing is kept.
    fn split(&mut self) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        match slicer::slice_image(source) {
            Ok(slices) => {
                self.slices = slices;
                self.slice_textures = Vec::new();
                self.error = None;
            }
            Err(e) => {
                self.slices = Vec::new();
                self.slice_textures = Vec::new();
                self.error = Some(e.to_string());
            }
        }
    }

    /// Back to the empty session.
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Builds a preview image for one band straight from the source rows.
    /// Bands span the full width, so the rows are one contiguous byte range.
    fn make_band_image(&self, start_y: u32, band_height: u32) -> Option<ColorImage> {
        let source = self.source.as_ref()?;
        if band_height == 0 {
            return None;
        }
        let width = source.width() as usize;
        let stride = width * 4;
        let start = start_y as usize * stride;
        let end = start + band_height as usize * stride;
        let rows = source.as_raw().get(start..end)?;
        Some(ColorImage::from_rgba_unmultiplied(
            [width, band_height as usize],
            rows,
        ))
    }

    fn ensure_source_texture(&mut self, ctx: &egui::Context) {
        if self.source_texture.is_some() {
            return;
        }
        if let Some(source) = self.source.as_ref() {
            let size = [source.width() as usize, source.height() as usize];
            let img = ColorImage::from_rgba_unmultiplied(size, source.as_raw());
            self.source_texture =
                Some(ctx.load_texture("source_preview", img, TextureOptions::NEAREST));
        }
    }

    fn ensure_slice_textures(&mut self, ctx: &egui::Context) {
        if self.slices.is_empty() || self.slice_textures.len() == self.slices.len() {
            return;
        }
        let mut textures = Vec::with_capacity(self.slices.len());
        for slice in &self.slices {
            let texture = self.make_band_image(slice.start_y, slice.height).map(|img| {
                ctx.load_texture(
                    format!("slice_preview_{}", slice.index),
                    img,
                    TextureOptions::NEAREST,
                )
            });
            textures.push(texture);
        }
        self.slice_textures = textures;
    }

    /// Fit `(w, h)` into the available width, never upscaling past 1:1.
    fn fit_size(ui: &egui::Ui, w: f32, h: f32) -> egui::Vec2 {
        let max_w = (ui.available_width() - 20.0).max(10.0);
        let scale = (max_w / w).clamp(0.05, 1.0);
        egui::vec2(w * scale, h * scale)
    }

    fn open_button_clicked(&mut self) {
        #[cfg(all(not(target_arch = "wasm32"), not(target_os = "android")))]
        if let Some(path) = FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "gif", "bmp", "webp"])
            .pick_file()
        {
            if let Err(e) = self.load_from_path(&path) {
                self.error = Some(e.to_string());
            }
        }

        #[cfg(target_arch = "wasm32")]
        file_picker::open_image_picker();
    }

    fn save_slice_clicked(&self, slice: &Slice) {
        #[cfg(all(not(target_arch = "wasm32"), not(target_os = "android")))]
        if let Some(path) = FileDialog::new()
            .set_file_name(export::artifact_name(slice.index))
            .save_file()
        {
            if let Err(e) = export::save_slice(slice, &path) {
                log::error!("{}", e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        export::download_slice(slice);
    }

    fn save_all_clicked(&mut self) {
        #[cfg(all(not(target_arch = "wasm32"), not(target_os = "android")))]
        if let Some(dir) = FileDialog::new().pick_folder() {
            match export::save_all(&self.slices, &dir) {
                Ok(written) => log::info!("wrote {} artifacts to {}", written.len(), dir.display()),
                Err(e) => self.error = Some(e.to_string()),
            }
        }

        // The browser download channel drops simultaneous downloads, so the
        // web path staggers them; see export::download_all.
        #[cfg(target_arch = "wasm32")]
        export::download_all(&self.slices);
    }

    fn slice_row(&self, ui: &mut egui::Ui, slice: &Slice, texture: Option<&egui::TextureHandle>) {
        let width = self.source.as_ref().map_or(0, image::RgbaImage::width);
        ui.label(format!(
            "Part {} — {}x{} (rows {}..{})",
            slice.index + 1,
            width,
            slice.height,
            slice.start_y,
            slice.start_y + slice.height
        ));
        if let Some(tex) = texture {
            let size = Self::fit_size(ui, width as f32, slice.height as f32);
            ui.add(egui::Image::new((tex.id(), size)));
            let label = if cfg!(target_arch = "wasm32") {
                "Download"
            } else {
                "Save..."
            };
            if ui.button(label).clicked() {
                self.save_slice_clicked(slice);
            }
        } else {
            ui.weak("(empty band)");
        }
        ui.add_space(8.0);
    }
}

impl eframe::App for SplitterApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up a file chosen through the wasm picker on a previous frame
        if let Some((bytes, name)) = file_picker::take_picked_image_bytes() {
            if let Err(e) = self.load_from_bytes(&name, &bytes) {
                self.error = Some(e.to_string());
            }
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                // NOTE: no File->Quit on web pages!
                let is_web = cfg!(target_arch = "wasm32");
                if !is_web {
                    ui.menu_button("File", |ui| {
                        if ui.button("Quit").clicked() {
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                    ui.add_space(16.0);
                }

                egui::widgets::global_theme_preference_buttons(ui);
            });
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                powered_by_egui_and_eframe(ui);
                egui::warn_if_debug_build(ui);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Quadsplit");
            ui.label("Split an image into four horizontal strips.");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Image:");
                ui.label(self.source_path.as_deref().unwrap_or("(none)"));
                if ui.button("Open...").clicked() {
                    self.open_button_clicked();
                }
                if ui.button("Reset").clicked() {
                    self.reset();
                }
            });

            if let Some(err) = self.error.clone() {
                ui.colored_label(egui::Color32::RED, err);
                ui.label("Pick another image file and try again.");
            }

            self.ensure_source_texture(ctx);
            self.ensure_slice_textures(ctx);

            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(tex) = self.source_texture.clone() {
                    let (w, h) = self
                        .source
                        .as_ref()
                        .map_or((0, 0), |s| (s.width(), s.height()));
                    ui.label(format!("Source: {w}x{h}"));
                    let size = Self::fit_size(ui, w as f32, h as f32);
                    ui.add(egui::Image::new((tex.id(), size)));

                    ui.horizontal(|ui| {
                        if ui.button("Split").clicked() {
                            self.split();
                        }
                        if !self.slices.is_empty() {
                            let label = if cfg!(target_arch = "wasm32") {
                                "Download all"
                            } else {
                                "Save all..."
                            };
                            if ui.button(label).clicked() {
                                self.save_all_clicked();
                            }
                        }
                    });
                } else {
                    ui.label("Open an image to get started.");
                }

                if !self.slices.is_empty() {
                    ui.separator();
                    for i in 0..self.slices.len() {
                        let texture = self.slice_textures.get(i).cloned().flatten();
                        self.slice_row(ui, &self.slices[i], texture.as_ref());
                    }
                }
            });
        });
    }
}

fn powered_by_egui_and_eframe(ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        ui.label("Powered by ");
        ui.hyperlink_to("egui", "https://github.com/emilk/egui");
        ui.label(" and ");
        ui.hyperlink_to(
            "eframe",
            "https://github.com/emilk/egui/tree/master/crates/eframe",
        );
        ui.label(".");
    });
}
