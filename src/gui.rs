//! Frequency entry form
//!
//! One text field and one button. Pressing the button publishes the field
//! contents; failures are shown in the window instead of ending the app.

use crate::channel::Publisher;
use eframe::egui;
use tracing::{error, info};

enum Status {
    Sent(String),
    Failed(String),
}

struct FrequencyForm {
    publisher: Publisher,
    entry: String,
    status: Option<Status>,
}

impl FrequencyForm {
    fn new(publisher: Publisher) -> Self {
        Self {
            publisher,
            entry: String::new(),
            status: None,
        }
    }

    fn send(&mut self) {
        self.status = Some(match self.publisher.publish(&self.entry) {
            Ok(()) => {
                let value = self.entry.trim().to_string();
                info!(value = %value, "frequency sent");
                Status::Sent(value)
            }
            Err(e) => {
                error!(error = %e, "failed to send frequency");
                Status::Failed(e.to_string())
            }
        });
    }
}

impl eframe::App for FrequencyForm {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Enter the Frequency:");
                ui.text_edit_singleline(&mut self.entry);
            });

            if ui.button("Send the Frequency").clicked() {
                self.send();
            }

            match &self.status {
                Some(Status::Sent(value)) => {
                    ui.label(format!("Sent: {}", value));
                }
                Some(Status::Failed(msg)) => {
                    ui.colored_label(egui::Color32::RED, msg.as_str());
                }
                None => {}
            }
        });
    }
}

/// Run the form until its window is closed
///
/// The publisher is released when the form is dropped.
pub fn run(publisher: Publisher) -> eframe::Result<()> {
    eframe::run_native(
        "Frequency Control For Buzzer",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([400.0, 100.0])
                .with_resizable(false),
            ..Default::default()
        },
        Box::new(move |_cc| Box::new(FrequencyForm::new(publisher))),
    )
}
