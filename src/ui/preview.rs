use std::path::Path;

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions, Ui};

const MAX_PREVIEW_SIDE: u32 = 400;

// ---------------------------------------------------------------------------
// Preview of the selected image
// ---------------------------------------------------------------------------

/// Owns the display-sized texture for the selected image. Replacing it drops
/// the previous texture.
#[derive(Default)]
pub struct Preview {
    texture: Option<TextureHandle>,
    error: Option<String>,
}

impl Preview {
    pub fn load(&mut self, ctx: &egui::Context, path: &Path) {
        match load_thumbnail(path) {
            Ok(image) => {
                self.texture = Some(ctx.load_texture("preview", image, TextureOptions::LINEAR));
                self.error = None;
            }
            Err(e) => {
                log::error!("Error displaying image {:?}: {e}", path);
                self.texture = None;
                self.error = Some(format!("Error loading image: {e}"));
            }
        }
    }

    pub fn show(&self, ui: &mut Ui) {
        match (&self.texture, &self.error) {
            (Some(texture), _) => {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.add(
                        egui::Image::new(texture)
                            .max_size(egui::vec2(MAX_PREVIEW_SIDE as f32, MAX_PREVIEW_SIDE as f32)),
                    );
                });
            }
            (None, Some(error)) => {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.colored_label(egui::Color32::RED, error);
                });
            }
            (None, None) => {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.label("No image selected");
                });
            }
        }
    }
}

fn load_thumbnail(path: &Path) -> Result<ColorImage, image::ImageError> {
    let mut image = image::ImageReader::open(path)?.with_guessed_format()?.decode()?;
    if image.width() > MAX_PREVIEW_SIDE || image.height() > MAX_PREVIEW_SIDE {
        image = image.thumbnail(MAX_PREVIEW_SIDE, MAX_PREVIEW_SIDE);
    }
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
