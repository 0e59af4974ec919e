#![warn(missing_docs)]
//! # wake-call-capture
//!
//! ## Purpose
//! Provides camera stream acquisition and still-frame capture abstractions.
//!
//! ## Responsibilities
//! - Define backend-agnostic camera and stream traits.
//! - Encode raw stream frames into JPEG still images.
//! - Expose a deterministic synthetic camera for CI and unit tests.
//!
//! ## Data flow
//! The call session opens one [`CameraStream`] through a [`CameraBackend`].
//! Capture sites pull the current frame at the stream's reported dimensions
//! and encode it with [`capture_still`].
//!
//! ## Ownership and lifetimes
//! Streams are owned boxed handles; captured frames own their JPEG buffers so
//! attachment logic outlives the stream that produced them.
//!
//! ## Error model
//! Acquisition failures (denied permission, missing device) are
//! [`CaptureError`] values. Frame-level unavailability (stream still
//! negotiating, stopped tracks) is a silent `None`, never an error.
//!
//! ## Security and privacy notes
//! Capture backends must not persist raw frame bytes; persistence decisions
//! belong to the attachment policy.

use std::sync::Mutex;

use base64::Engine as _;
use thiserror::Error;
use wake_call_core::jpeg_data_url;

/// JPEG quality used for captured stills (canvas-equivalent 0.92).
pub const JPEG_QUALITY: u8 = 92;

/// One raw frame pulled from an active camera stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA pixel buffer (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

impl RawFrame {
    /// Constructs a validated raw frame.
    ///
    /// # Errors
    /// Returns [`CaptureError::InvalidFrameShape`] when the buffer length does
    /// not match the declared geometry.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(CaptureError::InvalidFrameShape {
                expected: usize::MAX,
                actual: rgba.len(),
            })?;
        if rgba.len() != expected {
            return Err(CaptureError::InvalidFrameShape {
                expected,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }
}

/// One encoded still image captured from the webcam stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// JPEG-encoded image bytes.
    pub jpeg: Vec<u8>,
}

impl CapturedFrame {
    /// Returns the JPEG bytes as base64 text (no data URL prefix).
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.jpeg)
    }

    /// Returns the image as a `data:image/jpeg;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        jpeg_data_url(&self.to_base64())
    }
}

/// Live camera stream handle bound to one acquisition.
pub trait CameraStream: Send {
    /// Reports pixel dimensions once the stream has produced a frame.
    ///
    /// # Returns
    /// `None` while the stream is still negotiating or after [`stop`].
    ///
    /// [`stop`]: CameraStream::stop
    fn dimensions(&self, now_ms: u64) -> Option<(u32, u32)>;

    /// Pulls the current frame at the reported dimensions.
    fn current_frame(&self, now_ms: u64) -> Option<RawFrame>;

    /// Stops every media track, releasing the camera hardware.
    fn stop(&mut self);

    /// Returns `true` while tracks have not been stopped.
    fn is_live(&self) -> bool;
}

/// Trait implemented by concrete camera providers.
pub trait CameraBackend: Send + Sync {
    /// Returns `false` when no camera API exists in this environment.
    fn is_available(&self) -> bool;

    /// Acquires a video-only camera stream.
    ///
    /// # Errors
    /// Returns [`CaptureError::PermissionDenied`] when access is refused and
    /// [`CaptureError::Backend`] for device failures.
    fn open_stream(&self, now_ms: u64) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// Captures one encoded still from an active stream.
///
/// # Semantics
/// Returns `None` whenever a valid frame cannot be produced right now: the
/// stream has no known non-zero dimensions yet, tracks are stopped, or the
/// frame buffer is missing. The frame is rasterized at exactly the stream's
/// reported dimensions before encoding so the captured image matches the
/// visible preview.
pub fn capture_still(stream: &dyn CameraStream, now_ms: u64) -> Option<CapturedFrame> {
    if !stream.is_live() {
        return None;
    }

    let (width, height) = stream.dimensions(now_ms)?;
    if width == 0 || height == 0 {
        return None;
    }

    let frame = stream.current_frame(now_ms)?;
    if frame.width != width || frame.height != height {
        return None;
    }

    encode_jpeg(&frame).map(|jpeg| CapturedFrame {
        width,
        height,
        jpeg,
    })
}

fn encode_jpeg(frame: &RawFrame) -> Option<Vec<u8>> {
    let mut rgb = Vec::with_capacity((frame.rgba.len() / 4) * 3);
    for px in frame.rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(&rgb, frame.width, frame.height, image::ColorType::Rgb8.into())
        .ok()?;

    Some(jpeg)
}

/// Deterministic synthetic camera for test and demo usage.
///
/// # Notes
/// The backend models stream negotiation with a configurable warm-up delay:
/// dimensions stay unknown until `warmup_ms` have elapsed since acquisition.
#[derive(Debug)]
pub struct SyntheticCameraBackend {
    width: u32,
    height: u32,
    warmup_ms: u64,
    available: bool,
    deny_access: bool,
    open_count: Mutex<u32>,
}

impl SyntheticCameraBackend {
    /// Creates an immediately-ready 640x480 synthetic camera.
    pub fn new() -> Self {
        Self {
            width: 640,
            height: 480,
            warmup_ms: 0,
            available: true,
            deny_access: false,
            open_count: Mutex::new(0),
        }
    }

    /// Creates a camera whose stream reports dimensions only after `warmup_ms`.
    pub fn with_warmup_ms(warmup_ms: u64) -> Self {
        Self {
            warmup_ms,
            ..Self::new()
        }
    }

    /// Creates a camera that refuses access (permission failure path).
    pub fn denied() -> Self {
        Self {
            deny_access: true,
            ..Self::new()
        }
    }

    /// Creates an environment without any camera API.
    pub fn unsupported() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Returns how many streams were acquired from this backend.
    pub fn open_count(&self) -> u32 {
        self.open_count.lock().map(|count| *count).unwrap_or(0)
    }
}

impl Default for SyntheticCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCameraBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn open_stream(&self, now_ms: u64) -> Result<Box<dyn CameraStream>, CaptureError> {
        if !self.available {
            return Err(CaptureError::Unavailable);
        }
        if self.deny_access {
            return Err(CaptureError::PermissionDenied(
                "camera access refused by synthetic backend".to_string(),
            ));
        }

        if let Ok(mut count) = self.open_count.lock() {
            *count += 1;
        }

        Ok(Box::new(SyntheticCameraStream {
            width: self.width,
            height: self.height,
            ready_at_ms: now_ms.saturating_add(self.warmup_ms),
            sequence: Mutex::new(0),
            live: true,
        }))
    }
}

/// Stream handle produced by [`SyntheticCameraBackend`].
#[derive(Debug)]
pub struct SyntheticCameraStream {
    width: u32,
    height: u32,
    ready_at_ms: u64,
    sequence: Mutex<u64>,
    live: bool,
}

impl CameraStream for SyntheticCameraStream {
    fn dimensions(&self, now_ms: u64) -> Option<(u32, u32)> {
        if !self.live || now_ms < self.ready_at_ms {
            return None;
        }
        Some((self.width, self.height))
    }

    fn current_frame(&self, now_ms: u64) -> Option<RawFrame> {
        let (width, height) = self.dimensions(now_ms)?;

        let mut sequence = self.sequence.lock().ok()?;
        *sequence += 1;
        let byte = (*sequence % 255) as u8;

        let rgba = vec![byte; (width as usize) * (height as usize) * 4];
        RawFrame::new(width, height, rgba).ok()
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No camera API is available in this environment.
    #[error("no camera api available")]
    Unavailable,
    /// Camera access was denied by the user or platform.
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    /// Frame buffer shape does not match declared geometry.
    #[error("invalid frame shape: expected {expected} bytes, got {actual}")]
    InvalidFrameShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
}
