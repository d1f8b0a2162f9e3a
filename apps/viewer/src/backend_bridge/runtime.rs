//! Backend worker thread hosting the session controller on a tokio runtime.

use std::sync::Arc;
use std::thread;

use client_core::{HttpFetcher, SessionController};
use crossbeam_channel::{Receiver, Sender};
use shared::error::SessionError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn spawn_backend_thread(
    server_url: String,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::FatalError(format!(
                    "failed to build backend runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let fetcher = match HttpFetcher::new(&server_url) {
                Ok(fetcher) => Arc::new(fetcher),
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::FatalError(format!(
                        "failed to build http client: {err:#}"
                    )));
                    tracing::error!("failed to build http client: {err:#}");
                    return;
                }
            };
            let controller = SessionController::new(fetcher);
            let _ = ui_tx.try_send(UiEvent::Status(format!("connecting to {server_url}")));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Initialize => match controller.initialize().await {
                        Ok(snapshot) => {
                            let _ = ui_tx.try_send(UiEvent::SnapshotUpdated(snapshot));
                        }
                        Err(err) => {
                            // Enumeration failure is fatal; surface it once and
                            // stop servicing commands.
                            let _ = ui_tx.try_send(UiEvent::FatalError(err.to_string()));
                            tracing::error!("session initialization failed: {err}");
                            return;
                        }
                    },
                    BackendCommand::SelectFile { file_id } => {
                        match controller.select_file(&file_id).await {
                            Ok(snapshot) => {
                                let _ = ui_tx.try_send(UiEvent::SnapshotUpdated(snapshot));
                            }
                            Err(err @ SessionError::NotFound(_)) => {
                                let _ = ui_tx.try_send(UiEvent::Status(err.to_string()));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Status(err.to_string()));
                                tracing::warn!("select_file failed: {err}");
                            }
                        }
                    }
                    BackendCommand::Navigate { direction } => {
                        match controller.navigate(direction).await {
                            Ok(snapshot) => {
                                let _ = ui_tx.try_send(UiEvent::SnapshotUpdated(snapshot));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Status(err.to_string()));
                            }
                        }
                    }
                    BackendCommand::SetModel { slot, model } => {
                        match controller.set_model(slot, model).await {
                            Ok(snapshot) => {
                                let _ = ui_tx.try_send(UiEvent::SnapshotUpdated(snapshot));
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Status(err.to_string()));
                            }
                        }
                    }
                    BackendCommand::FetchImage { file_id } => {
                        match controller.load_image(&file_id).await {
                            Ok(bytes) => {
                                let _ = ui_tx.try_send(UiEvent::ImageLoaded { file_id, bytes });
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::ImageFailed {
                                    file_id,
                                    reason: format!("{err:#}"),
                                });
                            }
                        }
                    }
                }
            }
        });
    });
}
