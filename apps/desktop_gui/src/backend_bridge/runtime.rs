//! Backend worker: owns the tokio runtime, the capture store, the assistant
//! client, and the live camera stream.

use std::{sync::Arc, thread, time::Duration};

use capture::{
    CameraConnector, MissingCameraConnector, SyntheticCameraConnector, VideoStream,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use relay_client::AssistantClient;
use storage::{CaptureStore, CAPTURED_PHOTO_SLOT, UPLOADED_IMAGE_SLOT};
use tracing::{error, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{ChatOutcome, StoredSlot, UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraBackend {
    Synthetic,
    None,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub relay_url: String,
    pub database_url: String,
    pub camera_backend: CameraBackend,
}

pub fn spawn_backend_thread(
    config: BackendConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(config, cmd_rx, ui_tx));
    });
}

async fn run_worker(
    config: BackendConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let store = match CaptureStore::new(&config.database_url).await {
        Ok(store) => store,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!(
                    "backend worker startup failure: could not open capture store '{}': {err:#}",
                    config.database_url
                ),
            )));
            error!(
                database_url = %config.database_url,
                "failed to open capture store: {err:#}"
            );
            return;
        }
    };

    let assistant = AssistantClient::new(config.relay_url.clone());
    let connector: Arc<dyn CameraConnector> = match config.camera_backend {
        CameraBackend::Synthetic => Arc::new(SyntheticCameraConnector),
        CameraBackend::None => Arc::new(MissingCameraConnector),
    };

    info!(relay_url = %config.relay_url, "backend worker ready");
    let _ = ui_tx.try_send(UiEvent::BackendReady);

    let mut frame_pump: Option<tokio::task::JoinHandle<()>> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::StoreUploadedImage { path } => {
                let mime_type = mime_guess::from_path(&path)
                    .first_raw()
                    .unwrap_or(capture::FALLBACK_MIME_TYPE);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        let data_url = capture::encode_data_url(mime_type, &bytes);
                        match store.put_image(UPLOADED_IMAGE_SLOT, &data_url).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::ImageStored {
                                    slot: StoredSlot::UploadedImage,
                                    data_url,
                                });
                            }
                            Err(err) => {
                                error!("failed to store uploaded image: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::UploadImage,
                                    format!("could not store the selected file: {err:#}"),
                                )));
                            }
                        }
                    }
                    Err(err) => {
                        error!(path = %path.display(), "failed to read selected file: {err}");
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::UploadImage,
                            format!("could not read '{}': {err}", path.display()),
                        )));
                    }
                }
            }
            BackendCommand::StartCamera => {
                if frame_pump
                    .as_ref()
                    .map(|task| !task.is_finished())
                    .unwrap_or(false)
                {
                    continue;
                }
                match connector.acquire().await {
                    Ok(stream) => {
                        let ui_tx = ui_tx.clone();
                        frame_pump = Some(tokio::spawn(pump_frames(stream, ui_tx)));
                    }
                    Err(err) => {
                        // Acquisition failures are logged only; the page stays
                        // in its awaiting-capture state.
                        error!("camera acquisition failed: {err:#}");
                    }
                }
            }
            BackendCommand::CapturePhoto { frame } => {
                match capture::encode_frame_png(&frame) {
                    Ok(png) => {
                        let data_url = capture::encode_data_url(capture::PNG_MIME_TYPE, &png);
                        match store.put_image(CAPTURED_PHOTO_SLOT, &data_url).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::ImageStored {
                                    slot: StoredSlot::CapturedPhoto,
                                    data_url,
                                });
                            }
                            Err(err) => {
                                error!("failed to store captured photo: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::CapturePhoto,
                                    format!("could not store the captured photo: {err:#}"),
                                )));
                            }
                        }
                    }
                    Err(err) => {
                        error!("failed to encode captured frame: {err:#}");
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::CapturePhoto,
                            format!("could not encode the captured frame: {err:#}"),
                        )));
                    }
                }
            }
            BackendCommand::SavePhoto { data_url } => match capture::decode_data_url(&data_url) {
                Ok((_mime_type, bytes)) => {
                    let save_path = rfd::FileDialog::new()
                        .set_file_name("captured_photo.png")
                        .save_file();
                    if let Some(path) = save_path {
                        match tokio::fs::write(&path, bytes).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::PhotoSaved { path });
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::SavePhoto,
                                    format!("failed to save photo: {err}"),
                                )));
                            }
                        }
                    }
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::SavePhoto,
                        format!("stored photo could not be decoded: {err:#}"),
                    )));
                }
            },
            BackendCommand::LoadStoredImages => {
                let uploaded = match store.load_image(UPLOADED_IMAGE_SLOT).await {
                    Ok(stored) => stored.map(|s| s.data_url),
                    Err(err) => {
                        warn!("failed to load uploaded image slot: {err:#}");
                        None
                    }
                };
                let captured = match store.load_image(CAPTURED_PHOTO_SLOT).await {
                    Ok(stored) => stored.map(|s| s.data_url),
                    Err(err) => {
                        warn!("failed to load captured photo slot: {err:#}");
                        None
                    }
                };
                let _ = ui_tx.try_send(UiEvent::StoredImagesLoaded { uploaded, captured });
            }
            BackendCommand::SendChat { request_id, text } => {
                let outcome = match assistant.send_chat(&text).await {
                    Ok(reply) => ChatOutcome::Reply(reply),
                    Err(err) if err.is_malformed_reply() => {
                        warn!("assistant reply was malformed: {err}");
                        ChatOutcome::MalformedReply
                    }
                    Err(err) => {
                        error!("assistant request failed: {err}");
                        ChatOutcome::RequestFailed
                    }
                };
                let _ = ui_tx.try_send(UiEvent::ChatCompleted {
                    request_id,
                    outcome,
                });
            }
        }
    }

    if let Some(task) = frame_pump {
        task.abort();
    }
}

/// Forwards preview frames to the UI at roughly 15 fps. Full queues drop the
/// frame; a disconnected UI ends the pump.
async fn pump_frames(stream: Arc<dyn VideoStream>, ui_tx: Sender<UiEvent>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(66));
    loop {
        ticker.tick().await;
        let Some(frame) = stream.latest_frame() else {
            continue;
        };
        match ui_tx.try_send(UiEvent::CameraFrame(frame)) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
}
