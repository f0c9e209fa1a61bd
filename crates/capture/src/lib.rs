//! Image capture plumbing: the self-describing data-URL codec, the
//! fixed-size capture canvas, and the camera device seam.

use std::{
    io::Cursor,
    sync::Arc,
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, ImageBuffer, ImageFormat, RgbaImage};

/// Capture canvas dimensions; every captured photo is drawn into this frame
/// before encoding, regardless of the source resolution.
pub const CAPTURE_CANVAS_WIDTH: u32 = 640;
pub const CAPTURE_CANVAS_HEIGHT: u32 = 480;

pub const PNG_MIME_TYPE: &str = "image/png";
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// One decoded video frame, tightly packed RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Encodes raw bytes as a `data:<mime>;base64,<payload>` string, the
/// representation stored for both upload and camera slots.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URL"))?;
    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| anyhow!("data URL is missing its base64 payload"))?;
    let bytes = STANDARD
        .decode(payload)
        .context("data URL payload is not valid base64")?;
    Ok((mime_type.to_string(), bytes))
}

/// Draws the frame into the fixed-size capture canvas and encodes it as PNG.
pub fn encode_frame_png(frame: &VideoFrame) -> Result<Vec<u8>> {
    let source: RgbaImage =
        ImageBuffer::from_raw(frame.width, frame.height, frame.rgba.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match its declared dimensions"))?;
    let canvas = imageops::resize(
        &source,
        CAPTURE_CANVAS_WIDTH,
        CAPTURE_CANVAS_HEIGHT,
        imageops::FilterType::Triangle,
    );
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode the capture canvas as PNG")?;
    Ok(png)
}

/// A live video stream bound to a preview surface. `latest_frame` returns
/// `None` until the stream reports readiness; callers must not capture
/// before the first frame arrives.
pub trait VideoStream: Send + Sync + std::fmt::Debug {
    fn latest_frame(&self) -> Option<VideoFrame>;
}

/// The permissioned acquisition call for a video-only stream.
#[async_trait]
pub trait CameraConnector: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn VideoStream>>;
}

/// Fallback connector for builds with no camera backend wired in.
pub struct MissingCameraConnector;

#[async_trait]
impl CameraConnector for MissingCameraConnector {
    async fn acquire(&self) -> Result<Arc<dyn VideoStream>> {
        Err(anyhow!("camera device unavailable"))
    }
}

/// In-tree device backend producing a moving test pattern. The full
/// acquire/preview/capture path runs against it unchanged, so the scanner
/// works on machines with no camera hardware.
pub struct SyntheticCameraConnector;

#[async_trait]
impl CameraConnector for SyntheticCameraConnector {
    async fn acquire(&self) -> Result<Arc<dyn VideoStream>> {
        Ok(Arc::new(SyntheticVideoStream {
            started_at: Instant::now(),
        }))
    }
}

#[derive(Debug)]
struct SyntheticVideoStream {
    started_at: Instant,
}

impl VideoStream for SyntheticVideoStream {
    fn latest_frame(&self) -> Option<VideoFrame> {
        let phase = (self.started_at.elapsed().as_millis() / 40 % 256) as u32;
        Some(test_pattern_frame(phase))
    }
}

fn test_pattern_frame(phase: u32) -> VideoFrame {
    let width = CAPTURE_CANVAS_WIDTH;
    let height = CAPTURE_CANVAS_HEIGHT;
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            rgba.push(((x + phase) % 256) as u8);
            rgba.push((y % 256) as u8);
            rgba.push(((x + y + phase) % 256) as u8);
            rgba.push(0xff);
        }
    }
    VideoFrame {
        width,
        height,
        rgba,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
