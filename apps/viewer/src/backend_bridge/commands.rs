//! Commands queued from the UI thread to the backend worker.

use client_core::{Direction, PanelSlot};
use shared::domain::{FileId, ModelId};

pub enum BackendCommand {
    Initialize,
    SelectFile { file_id: FileId },
    Navigate { direction: Direction },
    SetModel { slot: PanelSlot, model: ModelId },
    FetchImage { file_id: FileId },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Initialize => "initialize",
            BackendCommand::SelectFile { .. } => "select_file",
            BackendCommand::Navigate { .. } => "navigate",
            BackendCommand::SetModel { .. } => "set_model",
            BackendCommand::FetchImage { .. } => "fetch_image",
        }
    }
}
