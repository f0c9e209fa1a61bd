//! UI/backend events and error modeling for the page controller.

use capture::VideoFrame;
use shared::domain::RequestId;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredSlot {
    UploadedImage,
    CapturedPhoto,
}

pub enum UiEvent {
    BackendReady,
    Info(String),
    CameraFrame(VideoFrame),
    ImageStored {
        slot: StoredSlot,
        data_url: String,
    },
    StoredImagesLoaded {
        uploaded: Option<String>,
        captured: Option<String>,
    },
    PhotoSaved {
        path: PathBuf,
    },
    ChatCompleted {
        request_id: RequestId,
        outcome: ChatOutcome,
    },
    Error(UiError),
}

/// Terminal result of one chat submission. Exactly one of these resolves
/// every typing placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Reply(String),
    MalformedReply,
    RequestFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Storage,
    Media,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    UploadImage,
    CapturePhoto,
    SavePhoto,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("sqlite")
            || message_lower.contains("database")
            || message_lower.contains("store")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("camera")
            || message_lower.contains("frame")
            || message_lower.contains("png")
            || message_lower.contains("decode")
            || message_lower.contains("data url")
        {
            UiErrorCategory::Media
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("timeout")
            || message_lower.contains("unreachable")
            || message_lower.contains("transport")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Media => "Media",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
