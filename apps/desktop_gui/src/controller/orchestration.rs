//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues one command toward the backend worker. Returns false when the
/// command was dropped, so callers can unwind optimistic UI state.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = match &cmd {
        BackendCommand::StoreUploadedImage { .. } => "store_uploaded_image",
        BackendCommand::StartCamera => "start_camera",
        BackendCommand::CapturePhoto { .. } => "capture_photo",
        BackendCommand::SavePhoto { .. } => "save_photo",
        BackendCommand::LoadStoredImages => "load_stored_images",
        BackendCommand::SendChat { .. } => "send_chat",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "Command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure)"
                    .to_string();
            false
        }
    }
}
