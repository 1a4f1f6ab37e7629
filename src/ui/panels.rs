use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use snapclass::{SessionController, SessionState};

use super::Notice;

/// What the user asked for this frame.
pub enum Action {
    None,
    Selected(std::path::PathBuf),
    Classify,
}

// ---------------------------------------------------------------------------
// Left side panel – controls, status and predictions
// ---------------------------------------------------------------------------

pub fn control_panel(ui: &mut Ui, session: &SessionController) -> Action {
    let mut action = Action::None;

    ui.heading("Image Classifier");
    ui.separator();

    if ui.button("Select Image").clicked() {
        if let Some(path) = pick_image() {
            action = Action::Selected(path);
        }
    }

    match session.image_path().and_then(|p| p.file_name()) {
        Some(name) => ui.label(name.to_string_lossy()),
        None => ui.label("No image selected"),
    };
    ui.add_space(6.0);

    let enabled = session.is_ready() && !session.state().is_busy();
    if ui
        .add_enabled(enabled, egui::Button::new("Classify Image"))
        .clicked()
    {
        action = Action::Classify;
    }

    ui.separator();
    status_line(ui, session.state());
    ui.separator();

    if let Some(prediction) = session.prediction() {
        ui.strong(format!("Top {} Predictions:", prediction.len()));
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                for (rank, entry) in prediction.iter().enumerate() {
                    ui.label(RichText::new(format!("{}. {}", rank + 1, entry.label)).strong());
                    ui.label(format!("   Confidence: {:.2}%", entry.confidence * 100.0));
                    ui.add_space(4.0);
                }
            });
    }

    action
}

fn status_line(ui: &mut Ui, state: SessionState) {
    let color = if state.is_failure() {
        Color32::RED
    } else if state.is_busy() {
        Color32::from_rgb(70, 130, 220)
    } else {
        Color32::from_rgb(40, 160, 70)
    };

    ui.horizontal(|ui: &mut Ui| {
        if state.is_busy() {
            ui.spinner();
        }
        ui.label(RichText::new(state.status_text()).color(color));
    });
}

/// Notice for a completion the user should hear about, if any.
pub fn failure_notice(session: &SessionController) -> Option<Notice> {
    match session.state() {
        SessionState::ModelFailed => session
            .load_error()
            .map(|e| Notice::error("Model Error", format!("Failed to load model: {e}"))),
        SessionState::ClassificationFailed => session
            .classify_error()
            .map(|e| Notice::error("Classification Error", format!("Classification failed: {e}"))),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn pick_image() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select an image")
        .add_filter("Image files", &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff"])
        .add_filter("All files", &["*"])
        .pick_file()
}
