pub mod panels;
pub mod preview;

use eframe::egui::{self, Color32, RichText};
use snapclass::session::Severity;
use snapclass::ClassifyRejection;

/// A modal message waiting for the user to dismiss it.
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn from_rejection(rejection: ClassifyRejection) -> Self {
        Self {
            title: rejection.title().to_string(),
            message: rejection.to_string(),
            severity: rejection.severity(),
        }
    }
}

/// Render the pending notice, clearing it once dismissed.
pub fn show_notice(ctx: &egui::Context, notice: &mut Option<Notice>) {
    let Some(current) = notice.as_ref() else {
        return;
    };

    let color = match current.severity {
        Severity::Warning => Color32::from_rgb(230, 160, 0),
        Severity::Error => Color32::RED,
    };

    let mut dismissed = false;
    egui::Window::new(current.title.as_str())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(&current.message).color(color));
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });

    if dismissed {
        *notice = None;
    }
}
