#![warn(missing_docs)]
//! # wake-call-session
//!
//! ## Purpose
//! Models the call session lifecycle and the one-shot attachment flags.
//!
//! ## Responsibilities
//! - Own the single process-wide camera stream handle.
//! - Enforce idempotent start/stop transitions between Idle and Active.
//! - Track the skip-next-attachment and start-prompt-override one-shots.
//!
//! ## Data flow
//! UI start/stop actions and the alarm fire path call [`CallSession::start`] /
//! [`CallSession::stop`]. Capture sites read frames through
//! [`CallSession::capture_frame`], which re-checks stream liveness at attach
//! time rather than capture-schedule time.
//!
//! ## Ownership and lifetimes
//! The session exclusively owns its boxed stream; callers never touch the raw
//! handle, which keeps the single-stream invariant enforceable.
//!
//! ## Error model
//! Acquisition failures propagate as [`CaptureError`] with no partial state
//! retained. Stop is total and idempotent.
//!
//! ## Security and privacy notes
//! Stopping the session stops every media track so the camera hardware light
//! goes out immediately.

use wake_call_capture::{CameraBackend, CameraStream, CaptureError, CapturedFrame, capture_still};

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// No active call; no stream is held.
    Idle,
    /// Call is active with a held camera stream.
    Active,
}

/// Result of a successful start transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// No camera API exists; start was a silent no-op.
    Unsupported,
    /// Session is active.
    Started {
        /// `true` when an existing live stream was reused instead of
        /// acquiring a new one.
        reused: bool,
    },
}

/// One-shot coordination flags consumed by exactly the next qualifying use.
#[derive(Debug, Default)]
pub struct AttachmentFlags {
    skip_next_attachment: bool,
    start_prompt_override: Option<String>,
}

impl AttachmentFlags {
    /// Creates cleared flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms suppression of the next attachment attempt.
    pub fn set_skip_next_attachment(&mut self) {
        self.skip_next_attachment = true;
    }

    /// Returns whether suppression was armed, resetting it either way.
    pub fn consume_skip(&mut self) -> bool {
        std::mem::take(&mut self.skip_next_attachment)
    }

    /// Returns `true` while suppression is armed, without consuming it.
    pub fn skip_armed(&self) -> bool {
        self.skip_next_attachment
    }

    /// Stores a one-shot start announcement override.
    pub fn set_start_prompt_override(&mut self, text: impl Into<String>) {
        self.start_prompt_override = Some(text.into());
    }

    /// Takes the pending override, leaving none behind.
    pub fn take_start_prompt_override(&mut self) -> Option<String> {
        self.start_prompt_override.take()
    }

    /// Returns `true` while an override is pending.
    pub fn override_pending(&self) -> bool {
        self.start_prompt_override.is_some()
    }
}

/// Exclusive owner of the active camera stream and its lifecycle.
#[derive(Default)]
pub struct CallSession {
    stream: Option<Box<dyn CameraStream>>,
}

impl CallSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self { stream: None }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> CallPhase {
        if self.is_active() {
            CallPhase::Active
        } else {
            CallPhase::Idle
        }
    }

    /// Returns `true` while a live stream is held.
    pub fn is_active(&self) -> bool {
        self.stream
            .as_ref()
            .map(|stream| stream.is_live())
            .unwrap_or(false)
    }

    /// Starts (or re-enters) the call session.
    ///
    /// # Semantics
    /// - No camera API: `Ok(StartOutcome::Unsupported)`, nothing changes.
    /// - Already active: the held stream is reused; acquisition happens at
    ///   most once until [`stop`].
    /// - Acquisition failure: the error propagates and no stream is retained.
    ///
    /// [`stop`]: CallSession::stop
    pub fn start(
        &mut self,
        backend: &dyn CameraBackend,
        now_ms: u64,
    ) -> Result<StartOutcome, CaptureError> {
        if !backend.is_available() {
            return Ok(StartOutcome::Unsupported);
        }

        if self.is_active() {
            return Ok(StartOutcome::Started { reused: true });
        }

        let stream = backend.open_stream(now_ms)?;
        self.stream = Some(stream);
        Ok(StartOutcome::Started { reused: false })
    }

    /// Stops the session, releasing camera hardware.
    ///
    /// # Returns
    /// `true` when a stream was actually released; calling on an idle session
    /// is a safe no-op.
    pub fn stop(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                true
            }
            None => false,
        }
    }

    /// Returns `true` once the stream reports non-zero pixel dimensions.
    pub fn ready(&self, now_ms: u64) -> bool {
        self.stream
            .as_ref()
            .and_then(|stream| stream.dimensions(now_ms))
            .map(|(width, height)| width > 0 && height > 0)
            .unwrap_or(false)
    }

    /// Captures one encoded still from the held stream.
    ///
    /// # Semantics
    /// Liveness is re-checked here, at attach time, so a capture scheduled
    /// before [`stop`] degrades to `None` instead of using a dead stream.
    ///
    /// [`stop`]: CallSession::stop
    pub fn capture_frame(&self, now_ms: u64) -> Option<CapturedFrame> {
        let stream = self.stream.as_ref()?;
        if !stream.is_live() {
            return None;
        }
        capture_still(stream.as_ref(), now_ms)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session transitions and one-shot flags.

    use wake_call_capture::SyntheticCameraBackend;

    use super::*;

    #[test]
    fn start_reuses_stream_while_active() {
        let backend = SyntheticCameraBackend::new();
        let mut session = CallSession::new();

        let first = session.start(&backend, 0).expect("first start should work");
        let second = session.start(&backend, 1).expect("second start should work");

        assert_eq!(first, StartOutcome::Started { reused: false });
        assert_eq!(second, StartOutcome::Started { reused: true });
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn stop_is_idempotent_and_releases_stream() {
        let backend = SyntheticCameraBackend::new();
        let mut session = CallSession::new();
        session.start(&backend, 0).expect("start should work");

        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.phase(), CallPhase::Idle);
        assert!(session.capture_frame(1).is_none());
    }

    #[test]
    fn unsupported_backend_makes_start_a_no_op() {
        let backend = SyntheticCameraBackend::unsupported();
        let mut session = CallSession::new();
        let outcome = session.start(&backend, 0).expect("start should not fail");
        assert_eq!(outcome, StartOutcome::Unsupported);
        assert_eq!(session.phase(), CallPhase::Idle);
    }

    #[test]
    fn failed_acquisition_leaves_session_idle() {
        let backend = SyntheticCameraBackend::denied();
        let mut session = CallSession::new();
        assert!(session.start(&backend, 0).is_err());
        assert_eq!(session.phase(), CallPhase::Idle);
    }

    #[test]
    fn skip_flag_is_consumed_exactly_once() {
        let mut flags = AttachmentFlags::new();
        flags.set_skip_next_attachment();
        assert!(flags.consume_skip());
        assert!(!flags.consume_skip());
    }

    #[test]
    fn override_is_taken_exactly_once() {
        let mut flags = AttachmentFlags::new();
        flags.set_start_prompt_override("wake up");
        assert_eq!(flags.take_start_prompt_override().as_deref(), Some("wake up"));
        assert!(flags.take_start_prompt_override().is_none());
    }
}
