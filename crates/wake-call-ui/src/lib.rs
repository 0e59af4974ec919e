#![warn(missing_docs)]
//! # wake-call-ui
//!
//! ## Purpose
//! Defines the presentation-state model the embedding shell renders.
//!
//! ## Responsibilities
//! - Project call/auto toggle buttons into labels and icon classes.
//! - Track preview panel visibility and clamped resize geometry.
//! - Project the alarm scheduler into target and countdown display text.
//!
//! ## Data flow
//! Runtime transitions call [`UiState::sync`]; the shell reads the resulting
//! plain values. No DOM or rendering concerns live here.
//!
//! ## Ownership and lifetimes
//! `UiState` owns all display strings; reducers take current runtime facts by
//! value or reference and never retain them.
//!
//! ## Error model
//! This crate favors clamping and explicit state over recoverable errors.
//!
//! ## Security and privacy notes
//! UI state excludes message text and captured frames.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use wake_call_alarm::{AlarmScheduler, format_countdown, format_target};

/// Minimum preview panel width in pixels.
pub const PREVIEW_MIN_WIDTH: u32 = 280;

/// Minimum preview panel height in pixels.
pub const PREVIEW_MIN_HEIGHT: u32 = 160;

/// Panel name the preview geometry is persisted under.
pub const PREVIEW_PANEL_NAME: &str = "wake-call-preview";

/// Call toggle button projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallButton {
    /// No call active; clicking starts one.
    Start,
    /// Call active; clicking stops it.
    Stop,
}

impl CallButton {
    /// Returns the wand menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start Video Call",
            Self::Stop => "Stop Video",
        }
    }

    /// Returns the icon class for the wand menu entry.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Start => "fa-video",
            Self::Stop => "fa-video-slash",
        }
    }
}

/// Auto-send toggle button projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoButton {
    /// Loop stopped; clicking starts it.
    Start,
    /// Loop running; clicking stops it.
    Stop,
}

impl AutoButton {
    /// Returns the button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Start Auto",
            Self::Stop => "Stop Auto",
        }
    }
}

/// Floating preview panel state with persisted geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewPanel {
    /// Whether the panel is shown.
    pub visible: bool,
    /// Panel width in pixels.
    pub width: u32,
    /// Panel height in pixels.
    pub height: u32,
}

impl PreviewPanel {
    /// Creates a hidden panel at minimum geometry.
    pub fn new() -> Self {
        Self {
            visible: false,
            width: PREVIEW_MIN_WIDTH,
            height: PREVIEW_MIN_HEIGHT,
        }
    }

    /// Applies a manual resize, clamping to the minimum geometry.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(PREVIEW_MIN_WIDTH);
        self.height = height.max(PREVIEW_MIN_HEIGHT);
    }

    /// Returns the persistable geometry of this panel.
    pub fn geometry(&self) -> PanelGeometry {
        PanelGeometry {
            width: self.width,
            height: self.height,
        }
    }

    /// Restores persisted geometry, clamping to the minimum.
    pub fn apply_geometry(&mut self, geometry: PanelGeometry) {
        self.resize(geometry.width, geometry.height);
    }
}

/// Persisted panel geometry, stored under [`PREVIEW_PANEL_NAME`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelGeometry {
    /// Panel width in pixels.
    pub width: u32,
    /// Panel height in pixels.
    pub height: u32,
}

impl Default for PreviewPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Alarm countdown panel projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPanel {
    /// Whether the panel is shown.
    pub visible: bool,
    /// Scheduled target in 12-hour display form, e.g. `7:30 PM`.
    pub target_text: String,
    /// Remaining time as `HH:MM:SS`.
    pub countdown_text: String,
}

impl AlarmPanel {
    /// Creates a hidden panel.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            target_text: String::new(),
            countdown_text: String::new(),
        }
    }
}

/// Projects the alarm scheduler into panel display state.
pub fn project_alarm_panel(scheduler: &AlarmScheduler, now: OffsetDateTime) -> AlarmPanel {
    match scheduler.target() {
        Some(target) => AlarmPanel {
            visible: true,
            target_text: format_target(target),
            countdown_text: format_countdown(target - now),
        },
        None => AlarmPanel::hidden(),
    }
}

/// Aggregate presentation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// Call toggle projection.
    pub call_button: CallButton,
    /// Auto-send toggle projection.
    pub auto_button: AutoButton,
    /// Floating webcam preview panel.
    pub preview: PreviewPanel,
    /// Alarm countdown panel.
    pub alarm_panel: AlarmPanel,
    /// Whether persisted snapshot attachments are hidden in the transcript.
    pub hide_inline_attachments: bool,
}

impl UiState {
    /// Creates the initial idle state.
    pub fn new() -> Self {
        Self {
            call_button: CallButton::Start,
            auto_button: AutoButton::Start,
            preview: PreviewPanel::new(),
            alarm_panel: AlarmPanel::hidden(),
            hide_inline_attachments: false,
        }
    }

    /// Reduces current runtime facts into display state.
    ///
    /// # Invariant
    /// A held call stream implies the preview panel is visible.
    pub fn sync(
        &mut self,
        call_active: bool,
        auto_running: bool,
        hide_inline_attachments: bool,
        alarm: &AlarmScheduler,
        now: OffsetDateTime,
    ) {
        self.call_button = if call_active {
            CallButton::Stop
        } else {
            CallButton::Start
        };
        self.auto_button = if auto_running {
            AutoButton::Stop
        } else {
            AutoButton::Start
        };
        self.preview.visible = call_active;
        self.alarm_panel = project_alarm_panel(alarm, now);
        self.hide_inline_attachments = hide_inline_attachments;
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
