//! Backend commands queued from UI to backend worker.

use capture::VideoFrame;
use shared::domain::RequestId;
use std::path::PathBuf;

pub enum BackendCommand {
    StoreUploadedImage {
        path: PathBuf,
    },
    StartCamera,
    CapturePhoto {
        frame: VideoFrame,
    },
    SavePhoto {
        data_url: String,
    },
    LoadStoredImages,
    SendChat {
        request_id: RequestId,
        text: String,
    },
}
