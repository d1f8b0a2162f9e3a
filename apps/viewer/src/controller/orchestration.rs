//! Queueing of UI commands toward the backend worker.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn queue_command(cmd_tx: &Sender<BackendCommand>, cmd: BackendCommand, status: &mut String) {
    let name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = name, "queued ui->backend command");
        }
        Err(TrySendError::Full(_)) => {
            *status = "command queue is full; please retry".to_string();
            tracing::warn!(command = name, "ui->backend command queue is full");
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "backend worker disconnected; restart the viewer".to_string();
            tracing::error!(command = name, "ui->backend command queue disconnected");
        }
    }
}
