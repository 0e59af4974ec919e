#![warn(missing_docs)]
//! # wake-call-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `wake-call` workspace.
//!
//! ## Responsibilities
//! - Represent persisted user settings with default fill-in semantics.
//! - Resolve prompt templates (start/end announcements, alarm wake-up text).
//! - Model host chat messages and their media attachment lists.
//!
//! ## Data flow
//! The host settings blob deserializes into [`Settings`]. The runtime reads
//! prompt text through [`Settings::prompt_text`] and renders alarm overrides
//! with [`render_alarm_prompt`]. Attachment logic inspects and annotates
//! [`ChatMessage`] values fetched through the host seam.
//!
//! ## Ownership and lifetimes
//! Messages and settings own their string/media buffers so runtime stages can
//! exchange snapshots without borrow coupling to the host transcript.
//!
//! ## Error model
//! Settings codec failures surface as [`CoreError::Codec`]; everything else in
//! this crate is total (clamping and fallbacks instead of errors).
//!
//! ## Security and privacy notes
//! This crate never logs message text or captured image bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Namespace key under which the host persists this add-on's settings blob.
pub const SETTINGS_NAMESPACE: &str = "wake-call";

/// Placeholder substituted with the stored reminder in alarm start prompts.
pub const ALARM_REMINDER_PLACEHOLDER: &str = "{{alarm_reminder}}";

/// Lower bound for the auto-send interval in seconds.
pub const MIN_AUTO_INTERVAL_SECONDS: u32 = 5;

/// Upper bound for the auto-send interval in seconds.
pub const MAX_AUTO_INTERVAL_SECONDS: u32 = 120;

/// Fallback auto-send interval when input is absent or non-numeric.
pub const DEFAULT_AUTO_INTERVAL_SECONDS: u32 = 30;

const DEFAULT_START_PROMPT: &str = "[{{user}} has started a video call]";
const DEFAULT_END_PROMPT: &str = "[{{user}} has ended the video call]";
const DEFAULT_ALARM_START_PROMPT: &str = "[{{user}}'s alarm is going off! It's time for a video call. {{char}} initiated a video call with {{user}} to help them.\n\n{{user}} left the following note as a reminder: {{alarm_reminder}} ]";
const DEFAULT_ALARM_REMINDER: &str = "Hey! I'm setting an alarm for the time I need to wake up. Help me wake up, and don't stop calling until you see me front and center in the webcam!";

/// Selects how captured frames reach the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Frames are persisted as out-of-band file attachments on the message.
    #[default]
    Captions,
    /// Frames are injected transiently at generation time and never stored.
    Inline,
}

impl ImageMode {
    /// Parses a raw mode string; anything other than `inline` is `Captions`.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("inline") {
            Self::Inline
        } else {
            Self::Captions
        }
    }
}

/// Identifies one of the configurable prompt/reminder text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Announcement sent when a call starts.
    Start,
    /// Announcement sent when a call ends.
    End,
    /// Template used when the alarm autonomously starts a call.
    AlarmStart,
    /// Default reminder text prefilled in the alarm dialog.
    AlarmDefaultReminder,
}

/// Persisted add-on configuration, owned by the host settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hides persisted snapshot attachments in the rendered transcript.
    pub hide_inline_preview: bool,
    /// Auto-send cadence in seconds; clamped on read, not on store.
    pub auto_interval_seconds: u32,
    /// Call start announcement text.
    pub start_prompt: String,
    /// Call end announcement text.
    pub end_prompt: String,
    /// Alarm start template containing `{{alarm_reminder}}`.
    pub alarm_start_prompt: String,
    /// Default reminder text for the alarm dialog.
    pub alarm_default_reminder: String,
    /// Frame embedding strategy.
    pub image_mode: ImageMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hide_inline_preview: false,
            auto_interval_seconds: DEFAULT_AUTO_INTERVAL_SECONDS,
            start_prompt: DEFAULT_START_PROMPT.to_string(),
            end_prompt: DEFAULT_END_PROMPT.to_string(),
            alarm_start_prompt: DEFAULT_ALARM_START_PROMPT.to_string(),
            alarm_default_reminder: DEFAULT_ALARM_REMINDER.to_string(),
            image_mode: ImageMode::Captions,
        }
    }
}

impl Settings {
    /// Deserializes a host settings blob, filling absent fields with defaults.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when the blob is structurally invalid.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(CoreError::Codec)
    }

    /// Serializes settings back into a host-storable JSON value.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when serialization fails.
    pub fn to_json_value(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self).map_err(CoreError::Codec)
    }

    /// Returns the auto-send interval clamped to the supported range.
    pub fn effective_interval_seconds(&self) -> u32 {
        clamp_interval(self.auto_interval_seconds)
    }

    /// Returns the configured text for `kind`, falling back to the default
    /// when the stored value is blank.
    pub fn prompt_text(&self, kind: PromptKind) -> String {
        let defaults = Settings::default();
        let (raw, fallback) = match kind {
            PromptKind::Start => (&self.start_prompt, defaults.start_prompt),
            PromptKind::End => (&self.end_prompt, defaults.end_prompt),
            PromptKind::AlarmStart => (&self.alarm_start_prompt, defaults.alarm_start_prompt),
            PromptKind::AlarmDefaultReminder => {
                (&self.alarm_default_reminder, defaults.alarm_default_reminder)
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            fallback
        } else {
            trimmed.to_string()
        }
    }
}

/// Clamps an interval to `[MIN_AUTO_INTERVAL_SECONDS, MAX_AUTO_INTERVAL_SECONDS]`.
pub fn clamp_interval(seconds: u32) -> u32 {
    seconds.clamp(MIN_AUTO_INTERVAL_SECONDS, MAX_AUTO_INTERVAL_SECONDS)
}

/// Parses raw slider/text input into a usable interval.
///
/// # Semantics
/// Non-numeric input resolves to [`DEFAULT_AUTO_INTERVAL_SECONDS`]; numeric
/// input is clamped to the supported range.
pub fn parse_interval(raw: &str) -> u32 {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        // negative input saturates to zero, then clamps to the minimum
        .map(|value| value.max(0.0) as u32)
        .unwrap_or(DEFAULT_AUTO_INTERVAL_SECONDS);

    clamp_interval(value)
}

/// Substitutes every `{{alarm_reminder}}` occurrence in `template`.
pub fn render_alarm_prompt(template: &str, reminder: &str) -> String {
    template.replace(ALARM_REMINDER_PLACEHOLDER, reminder)
}

/// Media attachment kind recognized by the attachment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image attachment.
    Image,
    /// Video attachment.
    Video,
}

/// One entry in a message's uniform media list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// File reference path or data URL.
    pub url: String,
    /// Attachment kind.
    pub kind: MediaKind,
}

/// Index of a message within the host transcript.
pub type MessageId = usize;

/// Snapshot of one host chat message as consumed by this add-on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    /// Message body text.
    pub text: String,
    /// `true` when authored by the user rather than a character.
    pub is_user: bool,
    /// Legacy single-image reference kept for host compatibility.
    pub image: Option<String>,
    /// Uniform media attachment list.
    pub media: Vec<MediaAttachment>,
    /// Marks the image as system-attached rather than user-uploaded.
    pub inline_image: bool,
    /// One-shot marker for auto-sent messages awaiting a generation trigger.
    pub auto_call_followup: bool,
}

impl ChatMessage {
    /// Creates a user-authored message with the given text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            ..Self::default()
        }
    }

    /// Creates a character-authored message with the given text.
    pub fn character(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            ..Self::default()
        }
    }

    /// Returns `true` when an image or video attachment is already present.
    pub fn has_visual_media(&self) -> bool {
        self.image.is_some() || !self.media.is_empty()
    }

    /// Folds the legacy single `image` field into the uniform media list.
    ///
    /// # Semantics
    /// Mirrors the host's media normalization helper: after this call every
    /// visual attachment lives in `media` and `image` only carries the primary
    /// reference.
    pub fn normalize_media(&mut self) {
        if let Some(image) = &self.image
            && !self.media.iter().any(|entry| entry.url == *image)
        {
            self.media.push(MediaAttachment {
                url: image.clone(),
                kind: MediaKind::Image,
            });
        }
    }

    /// Attaches a system-captured image reference to this message.
    pub fn attach_snapshot(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        self.image = Some(reference);
        self.inline_image = true;
        self.normalize_media();
    }
}

/// Builds a JPEG data URL from raw base64 text.
pub fn jpeg_data_url(base64: &str) -> String {
    format!("data:image/jpeg;base64,{base64}")
}

/// Returns `true` when `reference` is a data URL rather than a file path.
pub fn is_data_url(reference: &str) -> bool {
    Url::parse(reference)
        .map(|url| url.scheme() == "data")
        .unwrap_or(false)
}

/// Error type for core model codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON encoding/decoding error for the settings blob.
    #[error("settings codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings fallbacks and message model helpers.

    use super::*;

    #[test]
    fn interval_clamps_to_supported_range() {
        assert_eq!(clamp_interval(1), 5);
        assert_eq!(clamp_interval(60), 60);
        assert_eq!(clamp_interval(500), 120);
    }

    #[test]
    fn non_numeric_interval_falls_back_to_default() {
        assert_eq!(parse_interval("abc"), 30);
        assert_eq!(parse_interval(""), 30);
        assert_eq!(parse_interval("10"), 10);
        assert_eq!(parse_interval("2"), 5);
        assert_eq!(parse_interval("-5"), 5);
        assert_eq!(parse_interval("NaN"), 30);
    }

    #[test]
    fn blank_prompt_falls_back_to_default_text() {
        let settings = Settings {
            start_prompt: "   ".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            settings.prompt_text(PromptKind::Start),
            "[{{user}} has started a video call]"
        );
    }

    #[test]
    fn partial_settings_blob_fills_with_defaults() {
        let blob = serde_json::json!({ "auto_interval_seconds": 15 });
        let settings = Settings::from_json_value(blob).expect("blob should decode");
        assert_eq!(settings.auto_interval_seconds, 15);
        assert_eq!(settings.image_mode, ImageMode::Captions);
        assert!(!settings.start_prompt.is_empty());
    }

    #[test]
    fn alarm_template_substitutes_every_placeholder() {
        let rendered = render_alarm_prompt("a {{alarm_reminder}} b {{alarm_reminder}}", "note");
        assert_eq!(rendered, "a note b note");
    }

    #[test]
    fn normalize_media_folds_legacy_image_once() {
        let mut message = ChatMessage::user("");
        message.image = Some("file/ref.jpg".to_string());
        message.normalize_media();
        message.normalize_media();
        assert_eq!(message.media.len(), 1);
        assert_eq!(message.media[0].kind, MediaKind::Image);
    }

    #[test]
    fn data_url_classifier_distinguishes_file_refs() {
        assert!(is_data_url(&jpeg_data_url("abcd")));
        assert!(!is_data_url("user/images/snapshot.jpg"));
    }
}
