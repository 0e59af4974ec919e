//! Wake-call runtime.
//!
//! ## Purpose
//! Wires the leaf crates into the single coordinator that a chat frontend
//! drives. The runtime owns the call session, the auto-send loop, the alarm
//! scheduler and the attachment flags, and it reaches the outside world only
//! through the [`CameraBackend`], [`ChatHost`] and [`SettingsStore`] seams.
//!
//! ## Data flow
//! The embedding shell forwards chat events through [`Runtime::handle_event`]
//! and drives time by calling [`Runtime::on_timer_tick`] with the current
//! wall-clock instant. Every internal timer (auto-send interval, alarm fire,
//! webcam readiness wait, deferred generation) is stored as a due instant and
//! resolved inside the tick, so behaviour is a pure function of the instants
//! the shell feeds in.
//!
//! ## Error model
//! Event and tick handlers absorb failures: a capture or host error inside a
//! handler is logged through `tracing` and never propagated back into the
//! embedding chat pipeline. Operations invoked directly by the user surface
//! failures as host notices instead.

#![warn(missing_docs)]

use std::sync::Arc;

use time::OffsetDateTime;
use wake_call_alarm::{AlarmError, AlarmPoll, AlarmScheduler, Meridiem};
use wake_call_capture::CameraBackend;
use wake_call_core::{
    ChatMessage, CoreError, ImageMode, MediaAttachment, MediaKind, MessageId, PromptKind,
    SETTINGS_NAMESPACE, Settings, parse_interval, render_alarm_prompt,
};
use wake_call_host::{ChatHost, HostError, NoticeLevel, SettingsStore};
use wake_call_session::{AttachmentFlags, CallSession, StartOutcome};
use wake_call_ui::{PREVIEW_PANEL_NAME, PanelGeometry, UiState};

/// Delay between sending an auto-call message and asking the host to
/// generate a reply, giving the attachment pipeline time to settle.
pub const GENERATION_SETTLE_DELAY_MS: u64 = 250;

/// Re-poll interval while the host reports a generation already in flight.
pub const GENERATION_POLL_INTERVAL_MS: u64 = 200;

/// How long an alarm-started call waits for the webcam to deliver frames
/// before the auto-send loop starts anyway.
pub const ALARM_READY_TIMEOUT_MS: u64 = 7_000;

/// Errors surfaced by runtime operations that return `Result`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A chat-host operation failed.
    #[error(transparent)]
    Host(#[from] HostError),
    /// Alarm input was out of range.
    #[error(transparent)]
    Alarm(#[from] AlarmError),
    /// Settings could not be serialized.
    #[error(transparent)]
    Codec(#[from] CoreError),
}

/// Chat-pipeline events the embedding shell forwards to the runtime.
pub enum ChatEvent<'a> {
    /// The frontend finished booting and the runtime may touch the chat.
    AppReady,
    /// A user message finished rendering and is addressable by id.
    UserMessageRendered(MessageId),
    /// A generation is about to start; `chat` is the transient working copy
    /// of the transcript the model will see.
    BeforeGeneration {
        /// Working copy of the transcript, mutated in place.
        chat: &'a mut Vec<ChatMessage>,
        /// True for background refreshes that must not gain attachments.
        quiet: bool,
    },
}

/// Repeating auto-send timer modeled as a due instant.
#[derive(Debug, Default)]
struct AutoSendLoop {
    running: bool,
    interval_ms: u64,
    next_due_ms: u64,
}

impl AutoSendLoop {
    fn start(&mut self, now_ms: u64, interval_seconds: u32) {
        if self.running {
            return;
        }
        self.running = true;
        self.interval_ms = u64::from(interval_seconds) * 1_000;
        self.next_due_ms = now_ms + self.interval_ms;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    /// Returns true at most once per interval; the caller re-arms with
    /// [`Self::rearm`] after its tick body finishes, so a slow tick never
    /// stacks a second one behind it.
    fn take_due(&mut self, now_ms: u64) -> bool {
        if self.running && now_ms >= self.next_due_ms {
            self.next_due_ms = u64::MAX;
            true
        } else {
            false
        }
    }

    fn rearm(&mut self, now_ms: u64) {
        if self.running {
            self.next_due_ms = now_ms + self.interval_ms;
        }
    }
}

/// One-shot deferred generation request.
#[derive(Debug, Clone, Copy)]
struct PendingGeneration {
    ready_at_ms: u64,
}

/// Post-alarm wait for the webcam to become ready.
#[derive(Debug, Clone, Copy)]
struct AlarmFollowup {
    deadline_ms: u64,
}

/// Central coordinator owning all wake-call state.
pub struct Runtime {
    camera: Arc<dyn CameraBackend>,
    host: Arc<dyn ChatHost>,
    store: Arc<dyn SettingsStore>,
    settings: Settings,
    session: CallSession,
    flags: AttachmentFlags,
    auto: AutoSendLoop,
    alarm: AlarmScheduler,
    alarm_followup: Option<AlarmFollowup>,
    pending_generation: Option<PendingGeneration>,
    ui: UiState,
}

impl Runtime {
    /// Builds a runtime, loading persisted settings from `store` and falling
    /// back to defaults when the namespace is empty or malformed.
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        host: Arc<dyn ChatHost>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let settings = match store.load(SETTINGS_NAMESPACE) {
            Some(blob) => Settings::from_json_value(blob).unwrap_or_else(|error| {
                tracing::warn!(%error, "stored settings malformed, using defaults");
                Settings::default()
            }),
            None => Settings::default(),
        };
        let mut ui = UiState::new();
        if let Some(blob) = store.load(PREVIEW_PANEL_NAME) {
            match serde_json::from_value::<PanelGeometry>(blob) {
                Ok(geometry) => ui.preview.apply_geometry(geometry),
                Err(error) => {
                    tracing::warn!(%error, "stored preview geometry malformed, ignoring");
                }
            }
        }
        Self {
            camera,
            host,
            store,
            settings,
            session: CallSession::new(),
            flags: AttachmentFlags::default(),
            auto: AutoSendLoop::default(),
            alarm: AlarmScheduler::new(),
            alarm_followup: None,
            pending_generation: None,
            ui,
        }
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True while a call session holds a live camera stream.
    pub fn is_call_active(&self) -> bool {
        self.session.is_active()
    }

    /// True while the auto-send loop is armed.
    pub fn is_auto_running(&self) -> bool {
        self.auto.is_running()
    }

    /// Alarm scheduler, for surface code that renders the countdown.
    pub fn alarm(&self) -> &AlarmScheduler {
        &self.alarm
    }

    /// True when the next rendered user message will skip the snapshot.
    pub fn attachment_skip_armed(&self) -> bool {
        self.flags.skip_armed()
    }

    /// Last projected UI state.
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Starts a call: acquires the camera, shows the preview and posts the
    /// start announcement (or a pending one-shot override) as the user.
    ///
    /// # Semantics
    /// - Backend unsupported: silent no-op.
    /// - Acquisition failure: error notice, no partial state.
    /// - Already active: stream is reused; the announcement is resent only
    ///   when a one-shot override is pending.
    pub fn start_call(&mut self, now: OffsetDateTime) {
        let now_ms = epoch_ms(now);
        match self.session.start(self.camera.as_ref(), now_ms) {
            Ok(StartOutcome::Unsupported) => {
                tracing::debug!("camera backend unsupported, ignoring start");
            }
            Err(error) => {
                tracing::warn!(%error, "webcam acquisition failed");
                self.host
                    .notify(NoticeLevel::Error, "Could not access webcam");
            }
            Ok(StartOutcome::Started { reused }) => {
                let announcement = match self.flags.take_start_prompt_override() {
                    Some(text) => text,
                    None if reused => String::new(),
                    None => self.settings.prompt_text(PromptKind::Start),
                };
                let announcement = announcement.trim().to_string();
                if !announcement.is_empty() {
                    self.flags.set_skip_next_attachment();
                    if let Err(error) = self.host.send_message_as_user(&announcement) {
                        tracing::warn!(%error, "start announcement failed");
                    }
                }
                tracing::info!(reused, "video call started");
            }
        }
        self.sync_ui(now);
    }

    /// Ends the call, stops the auto-send loop and posts the end
    /// announcement. Stopping while idle is a no-op.
    pub fn stop_call(&mut self, now: OffsetDateTime) {
        let released = self.session.stop();
        self.auto.stop();
        self.alarm_followup = None;
        if released {
            let farewell = self.settings.prompt_text(PromptKind::End);
            if !farewell.is_empty() {
                self.flags.set_skip_next_attachment();
                if let Err(error) = self.host.send_message_as_user(&farewell) {
                    tracing::warn!(%error, "end announcement failed");
                }
            }
            tracing::info!("video call stopped");
        }
        self.sync_ui(now);
    }

    /// Starts or stops the call depending on the current phase.
    pub fn toggle_call(&mut self, now: OffsetDateTime) {
        if self.session.is_active() {
            self.stop_call(now);
        } else {
            self.start_call(now);
        }
    }

    /// Arms the auto-send loop at the configured interval. Starting while
    /// already running is a no-op; the interval is sampled once at start.
    pub fn start_auto(&mut self, now: OffsetDateTime) {
        self.auto
            .start(epoch_ms(now), self.settings.effective_interval_seconds());
        self.sync_ui(now);
    }

    /// Disarms the auto-send loop. The call session stays up.
    pub fn stop_auto(&mut self, now: OffsetDateTime) {
        self.auto.stop();
        self.sync_ui(now);
    }

    /// Toggles the auto-send loop.
    pub fn toggle_auto(&mut self, now: OffsetDateTime) {
        if self.auto.is_running() {
            self.stop_auto(now);
        } else {
            self.start_auto(now);
        }
    }

    /// Schedules (or replaces) the wall-clock alarm and returns the fire
    /// instant.
    ///
    /// # Errors
    /// Rejects hours outside `1..=12` and minutes outside `0..=59`.
    pub fn schedule_alarm(
        &mut self,
        now: OffsetDateTime,
        hour12: u8,
        minute: u8,
        meridiem: Meridiem,
        reminder: &str,
    ) -> Result<OffsetDateTime, AppError> {
        let target = self.alarm.schedule(now, hour12, minute, meridiem, reminder)?;
        tracing::info!(%target, "alarm scheduled");
        self.sync_ui(now);
        Ok(target)
    }

    /// Cancels a pending alarm and any post-fire readiness wait.
    pub fn clear_alarm(&mut self, now: OffsetDateTime) {
        self.alarm.clear();
        self.alarm_followup = None;
        self.sync_ui(now);
    }

    /// Parses, clamps and persists the auto-send interval, returning the
    /// value that was stored.
    pub fn set_auto_interval(&mut self, raw: &str) -> u32 {
        let seconds = parse_interval(raw);
        self.settings.auto_interval_seconds = seconds;
        self.persist_settings();
        seconds
    }

    /// Persists a new image mode.
    pub fn set_image_mode(&mut self, raw: &str) -> ImageMode {
        let mode = ImageMode::parse(raw);
        self.settings.image_mode = mode;
        self.persist_settings();
        mode
    }

    /// Persists the inline-preview visibility toggle.
    pub fn set_hide_inline_preview(&mut self, hide: bool) {
        self.settings.hide_inline_preview = hide;
        self.persist_settings();
    }

    /// Applies a manual preview-panel resize and persists the clamped
    /// geometry under the panel name.
    pub fn resize_preview(&mut self, width: u32, height: u32) {
        self.ui.preview.resize(width, height);
        match serde_json::to_value(self.ui.preview.geometry()) {
            Ok(blob) => self.store.save_debounced(PREVIEW_PANEL_NAME, blob),
            Err(error) => tracing::warn!(%error, "preview geometry serialization failed"),
        }
    }

    /// Persists one of the announcement or reminder templates.
    pub fn set_prompt(&mut self, kind: PromptKind, text: &str) {
        let slot = match kind {
            PromptKind::Start => &mut self.settings.start_prompt,
            PromptKind::End => &mut self.settings.end_prompt,
            PromptKind::AlarmStart => &mut self.settings.alarm_start_prompt,
            PromptKind::AlarmDefaultReminder => &mut self.settings.alarm_default_reminder,
        };
        *slot = text.to_string();
        self.persist_settings();
    }

    /// Forwards a chat event into the runtime. Handler failures are logged
    /// and absorbed so the embedding pipeline never sees them.
    pub fn handle_event(&mut self, event: ChatEvent<'_>, now: OffsetDateTime) {
        let outcome = match event {
            ChatEvent::AppReady => {
                tracing::info!(version = app_version(), "wake-call ready");
                self.sync_ui(now);
                Ok(())
            }
            ChatEvent::UserMessageRendered(id) => self.attach_snapshot_to_message(id, now),
            ChatEvent::BeforeGeneration { chat, quiet } => {
                self.apply_inline_capture(chat, quiet, now);
                Ok(())
            }
        };
        if let Err(error) = outcome {
            tracing::warn!(%error, "chat event handler failed");
        }
    }

    /// Advances every due-instant timer to `now`: alarm fire, post-alarm
    /// readiness wait, auto-send ticks and deferred generation.
    pub fn on_timer_tick(&mut self, now: OffsetDateTime) {
        let now_ms = epoch_ms(now);

        if let AlarmPoll::Fired { reminder } = self.alarm.poll(now) {
            self.fire_alarm(reminder, now);
        }

        if let Some(followup) = self.alarm_followup {
            if self.session.ready(now_ms) || now_ms >= followup.deadline_ms {
                self.alarm_followup = None;
                self.auto
                    .start(now_ms, self.settings.effective_interval_seconds());
                self.run_auto_tick(now);
            }
        }

        if self.auto.take_due(now_ms) {
            self.run_auto_tick(now);
            self.auto.rearm(now_ms);
        }

        if let Some(pending) = self.pending_generation {
            if now_ms >= pending.ready_at_ms {
                if self.host.is_generating() {
                    self.pending_generation = Some(PendingGeneration {
                        ready_at_ms: now_ms + GENERATION_POLL_INTERVAL_MS,
                    });
                } else {
                    self.pending_generation = None;
                    if let Err(error) = self.host.trigger_generation(true) {
                        tracing::warn!(%error, "deferred generation failed");
                    }
                }
            }
        }

        self.sync_ui(now);
    }

    /// Inline-mode interceptor: attaches a fresh snapshot as a data URL to
    /// the last user entry of the transient working transcript. Nothing is
    /// persisted; quiet generations and non-user tails are left alone.
    pub fn apply_inline_capture(
        &mut self,
        chat: &mut [ChatMessage],
        quiet: bool,
        now: OffsetDateTime,
    ) {
        if self.settings.image_mode != ImageMode::Inline || quiet {
            return;
        }
        let Some(last) = chat.last_mut() else {
            return;
        };
        if !last.is_user {
            return;
        }
        let Some(frame) = self.session.capture_frame(epoch_ms(now)) else {
            return;
        };
        last.normalize_media();
        last.media.push(MediaAttachment {
            url: frame.to_data_url(),
            kind: MediaKind::Image,
        });
    }

    /// Alarm fire: notice, optional override-announced call start, then a
    /// bounded wait for camera readiness before the loop arms.
    fn fire_alarm(&mut self, reminder: String, now: OffsetDateTime) {
        self.host.notify(NoticeLevel::Info, "Wakeup Call: time is up!");
        tracing::info!("alarm fired");
        if !self.session.is_active() {
            let template = self.settings.prompt_text(PromptKind::AlarmStart);
            let announcement = render_alarm_prompt(&template, &reminder);
            self.flags.set_start_prompt_override(announcement);
            self.start_call(now);
        }
        self.alarm_followup = Some(AlarmFollowup {
            deadline_ms: epoch_ms(now) + ALARM_READY_TIMEOUT_MS,
        });
    }

    /// One auto-send beat: verify a frame is obtainable, post an empty user
    /// turn (the render-time policy attaches the real snapshot), and in
    /// inline mode queue a deferred generation.
    fn run_auto_tick(&mut self, now: OffsetDateTime) {
        let now_ms = epoch_ms(now);
        if self.session.capture_frame(now_ms).is_none() {
            tracing::debug!("auto tick skipped, no frame available");
            return;
        }
        if let Err(error) = self.host.send_message_as_user("") {
            tracing::warn!(%error, "auto-call message failed");
            return;
        }
        if self.settings.image_mode == ImageMode::Inline {
            self.queue_generation(now_ms + GENERATION_SETTLE_DELAY_MS);
        }
    }

    /// Captions-mode attachment policy for a freshly rendered user message.
    fn attach_snapshot_to_message(
        &mut self,
        id: MessageId,
        now: OffsetDateTime,
    ) -> Result<(), AppError> {
        let Some(message) = self.host.message(id) else {
            return Ok(());
        };
        if self.flags.consume_skip() {
            return Ok(());
        }
        if !message.is_user || message.has_visual_media() {
            return Ok(());
        }
        if self.settings.image_mode == ImageMode::Inline {
            return Ok(());
        }
        let Some(frame) = self.session.capture_frame(epoch_ms(now)) else {
            return Ok(());
        };
        let auto_sent = message.text.is_empty() && self.auto.is_running();
        let reference = self
            .host
            .save_image_file(&frame.to_base64(), &self.host.character_name())?;
        self.host.with_message_mut(id, &mut |message| {
            message.attach_snapshot(&reference);
            message.auto_call_followup = auto_sent;
        });
        if auto_sent {
            self.host.rerender_message_media(id);
            self.host.persist_chat()?;
            self.host.emit_file_embedded(id);
            self.queue_generation(epoch_ms(now) + GENERATION_SETTLE_DELAY_MS);
            self.host.with_message_mut(id, &mut |message| {
                message.auto_call_followup = false;
            });
        }
        Ok(())
    }

    fn queue_generation(&mut self, ready_at_ms: u64) {
        if self.pending_generation.is_none() {
            self.pending_generation = Some(PendingGeneration { ready_at_ms });
        }
    }

    fn persist_settings(&self) {
        match self.settings.to_json_value() {
            Ok(blob) => self.store.save_debounced(SETTINGS_NAMESPACE, blob),
            Err(error) => tracing::warn!(%error, "settings serialization failed"),
        }
    }

    fn sync_ui(&mut self, now: OffsetDateTime) {
        self.ui.sync(
            self.session.is_active(),
            self.auto.is_running(),
            self.settings.hide_inline_preview,
            &self.alarm,
            now,
        );
    }
}

/// Milliseconds since the Unix epoch for `now`, saturating below zero.
fn epoch_ms(now: OffsetDateTime) -> u64 {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).unwrap_or(0)
}

/// Crate version baked in from the workspace `VERSION` file.
pub fn app_version() -> &'static str {
    env!("WAKE_CALL_VERSION")
}
