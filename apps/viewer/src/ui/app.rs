//! The egui viewer: file list, chart image, keyword panel, and two
//! side-by-side model result panels.

use std::collections::HashMap;

use client_core::{Direction, PanelSlot, SessionSnapshot};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{FileId, ModelId};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::queue_command;

enum ImageState {
    Loading,
    Ready(egui::TextureHandle),
    Failed(String),
}

pub struct ViewerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    snapshot: Option<SessionSnapshot>,
    // Decoded textures keyed by file id; never evicted, like the session cache.
    images: HashMap<FileId, ImageState>,
    status: String,
    fatal_error: Option<String>,
}

impl ViewerApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        let mut status = "loading enumerations".to_string();
        queue_command(&cmd_tx, BackendCommand::Initialize, &mut status);
        Self {
            cmd_tx,
            ui_rx,
            snapshot: None,
            images: HashMap::new(),
            status,
            fatal_error: None,
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Status(message) => {
                    self.status = message;
                }
                UiEvent::SnapshotUpdated(snapshot) => {
                    if let Some(file) = snapshot.current_file.clone() {
                        self.request_image(file);
                    }
                    self.status = status_line(&snapshot);
                    self.snapshot = Some(snapshot);
                }
                UiEvent::FatalError(message) => {
                    self.fatal_error = Some(message);
                }
                UiEvent::ImageLoaded { file_id, bytes } => {
                    let state = match decode_texture(ctx, &file_id, &bytes) {
                        Ok(texture) => ImageState::Ready(texture),
                        Err(reason) => ImageState::Failed(reason),
                    };
                    self.images.insert(file_id, state);
                }
                UiEvent::ImageFailed { file_id, reason } => {
                    self.images.insert(file_id, ImageState::Failed(reason));
                }
            }
        }
    }

    fn request_image(&mut self, file_id: FileId) {
        if self.images.contains_key(&file_id) {
            return;
        }
        self.images.insert(file_id.clone(), ImageState::Loading);
        queue_command(
            &self.cmd_tx,
            BackendCommand::FetchImage { file_id },
            &mut self.status,
        );
    }

    fn show_fatal_error(&self, ctx: &egui::Context, message: &str) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.heading("Session failed to start");
                ui.add_space(8.0);
                ui.label(message);
                ui.add_space(8.0);
                ui.weak("Restart the viewer once the dataset server is reachable.");
            });
        });
    }

    fn show_loading(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.spinner();
                ui.add_space(8.0);
                ui.label(&self.status);
            });
        });
    }

    fn show_main(&mut self, ctx: &egui::Context, snapshot: &SessionSnapshot) {
        egui::SidePanel::left("file_list")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Files");
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(snapshot.back_enabled, egui::Button::new("Previous"))
                        .clicked()
                    {
                        queue_command(
                            &self.cmd_tx,
                            BackendCommand::Navigate {
                                direction: Direction::Back,
                            },
                            &mut self.status,
                        );
                    }
                    if ui
                        .add_enabled(snapshot.forward_enabled, egui::Button::new("Next"))
                        .clicked()
                    {
                        queue_command(
                            &self.cmd_tx,
                            BackendCommand::Navigate {
                                direction: Direction::Forward,
                            },
                            &mut self.status,
                        );
                    }
                });
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for file in &snapshot.files {
                        let selected = snapshot.current_file.as_ref() == Some(file);
                        if ui.selectable_label(selected, file.as_str()).clicked() && !selected {
                            queue_command(
                                &self.cmd_tx,
                                BackendCommand::SelectFile {
                                    file_id: file.clone(),
                                },
                                &mut self.status,
                            );
                        }
                    }
                });
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small("Status:");
                ui.small(&self.status);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut chosen: Option<(PanelSlot, ModelId)> = None;
            ui.horizontal(|ui| {
                chosen = model_selector(
                    ui,
                    "panel_a_model",
                    "Panel A",
                    &snapshot.models,
                    snapshot.slot_a.as_ref(),
                )
                .map(|model| (PanelSlot::A, model))
                .or(model_selector(
                    ui,
                    "panel_b_model",
                    "Panel B",
                    &snapshot.models,
                    snapshot.slot_b.as_ref(),
                )
                .map(|model| (PanelSlot::B, model)));
            });
            if let Some((slot, model)) = chosen {
                queue_command(
                    &self.cmd_tx,
                    BackendCommand::SetModel { slot, model },
                    &mut self.status,
                );
            }
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_image(ui, snapshot);
                ui.separator();
                ui.columns(3, |columns| {
                    show_text_panel(&mut columns[0], "Keywords", &snapshot.keywords_text);
                    show_text_panel(
                        &mut columns[1],
                        panel_title(&snapshot.panel_a.header, "Panel A"),
                        &snapshot.panel_a.text,
                    );
                    show_text_panel(
                        &mut columns[2],
                        panel_title(&snapshot.panel_b.header, "Panel B"),
                        &snapshot.panel_b.text,
                    );
                });
            });
        });
    }

    fn show_image(&self, ui: &mut egui::Ui, snapshot: &SessionSnapshot) {
        let Some(file) = snapshot.current_file.as_ref() else {
            ui.weak("No files available.");
            return;
        };
        match self.images.get(file) {
            Some(ImageState::Ready(texture)) => {
                let size = texture.size_vec2();
                let scale = (ui.available_width() / size.x).min(1.0);
                ui.image((texture.id(), size * scale));
            }
            Some(ImageState::Failed(reason)) => {
                ui.colored_label(
                    egui::Color32::LIGHT_RED,
                    format!("image unavailable: {reason}"),
                );
            }
            Some(ImageState::Loading) | None => {
                ui.spinner();
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        if let Some(message) = self.fatal_error.clone() {
            self.show_fatal_error(ctx, &message);
            return;
        }

        match self.snapshot.clone() {
            Some(snapshot) => self.show_main(ctx, &snapshot),
            None => self.show_loading(ctx),
        }

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn model_selector(
    ui: &mut egui::Ui,
    id: &'static str,
    label: &str,
    models: &[ModelId],
    current: Option<&ModelId>,
) -> Option<ModelId> {
    let mut chosen = None;
    ui.label(label);
    egui::ComboBox::from_id_source(id)
        .selected_text(current.map(|model| model.as_str()).unwrap_or("-").to_string())
        .show_ui(ui, |ui| {
            for model in models {
                let selected = current == Some(model);
                if ui.selectable_label(selected, model.as_str()).clicked() && !selected {
                    chosen = Some(model.clone());
                }
            }
        });
    chosen
}

fn show_text_panel(ui: &mut egui::Ui, title: &str, text: &str) {
    ui.heading(title);
    ui.separator();
    ui.label(egui::RichText::new(text).monospace());
}

fn panel_title<'a>(header: &'a str, fallback: &'a str) -> &'a str {
    if header.is_empty() {
        fallback
    } else {
        header
    }
}

fn status_line(snapshot: &SessionSnapshot) -> String {
    match (snapshot.position, snapshot.current_file.as_ref()) {
        (Some(position), Some(file)) => {
            format!("{} ({}/{})", file, position + 1, snapshot.files.len())
        }
        _ => "no files in dataset".to_string(),
    }
}

fn decode_texture(
    ctx: &egui::Context,
    file_id: &FileId,
    bytes: &[u8],
) -> Result<egui::TextureHandle, String> {
    let decoded = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Ok(ctx.load_texture(
        format!("chart:{file_id}"),
        color_image,
        egui::TextureOptions::LINEAR,
    ))
}
