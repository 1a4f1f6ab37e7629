use eframe::egui;

use snapclass::SessionController;

use crate::ui::panels::{self, Action};
use crate::ui::preview::Preview;
use crate::ui::{self, Notice};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SnapclassApp {
    session: SessionController,
    preview: Preview,
    notice: Option<Notice>,
    seen_revision: u64,
}

impl SnapclassApp {
    pub fn new(session: SessionController) -> Self {
        Self {
            session,
            preview: Preview::default(),
            notice: None,
            seen_revision: 0,
        }
    }

    fn handle(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::None => {}
            Action::Selected(path) => {
                self.preview.load(ctx, &path);
                self.session.select_image(path);
            }
            Action::Classify => {
                if let Err(rejection) = self.session.request_classification() {
                    log::warn!("Classify request rejected: {rejection}");
                    self.notice = Some(Notice::from_rejection(rejection));
                }
            }
        }
    }
}

impl eframe::App for SnapclassApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.session.pump() > 0 && self.session.revision() != self.seen_revision {
            self.seen_revision = self.session.revision();
            if let Some(notice) = panels::failure_notice(&self.session) {
                self.notice = Some(notice);
            }
        }

        // ---- Left side panel: controls and results ----
        let action = egui::SidePanel::left("control_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| panels::control_panel(ui, &self.session))
            .inner;
        self.handle(ctx, action);

        // ---- Central panel: preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            self.preview.show(ui);
        });

        ui::show_notice(ctx, &mut self.notice);
    }
}
