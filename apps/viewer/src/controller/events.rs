//! Events flowing from the backend worker back to the UI thread.

use client_core::SessionSnapshot;
use shared::domain::FileId;

pub enum UiEvent {
    Status(String),
    SnapshotUpdated(SessionSnapshot),
    /// Initialization failed; the session is unusable and is not retried.
    FatalError(String),
    ImageLoaded {
        file_id: FileId,
        bytes: Vec<u8>,
    },
    ImageFailed {
        file_id: FileId,
        reason: String,
    },
}
