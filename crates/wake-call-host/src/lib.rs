#![warn(missing_docs)]
//! # wake-call-host
//!
//! ## Purpose
//! Defines the narrow capability seam between this add-on and the host chat
//! application, plus deterministic in-memory doubles.
//!
//! ## Responsibilities
//! - List exactly the host chat operations the coordination core consumes.
//! - Abstract the host's namespaced, debounced settings persistence.
//! - Provide in-memory host/store implementations for tests and demos.
//!
//! ## Data flow
//! The runtime submits user turns, annotates transcript messages, saves
//! snapshot files, and triggers generation exclusively through [`ChatHost`].
//! All host side effects performed by [`InMemoryChatHost`] are recorded as
//! [`HostEffect`] values for assertion.
//!
//! ## Ownership and lifetimes
//! Hosts are shared behind `Arc<dyn ChatHost>`; interior state uses mutexes
//! because host callbacks interleave with timer callbacks.
//!
//! ## Error model
//! Host failures surface as [`HostError`]; the runtime absorbs them at
//! handler boundaries so host workflows never abort on add-on failure.
//!
//! ## Security and privacy notes
//! The in-memory host stores transcript text for assertions only; nothing is
//! written to disk.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};
use thiserror::Error;
use wake_call_core::{ChatMessage, MessageId};

/// Severity of a user-facing transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational toast.
    Info,
    /// Error toast.
    Error,
}

/// Narrow host-chat capability interface consumed by the coordination core.
pub trait ChatHost: Send + Sync {
    /// Appends a user-authored message to the transcript.
    ///
    /// # Errors
    /// Returns [`HostError`] when the host rejects the submission.
    fn send_message_as_user(&self, text: &str) -> Result<MessageId, HostError>;

    /// Returns `true` while a generation is already in flight.
    fn is_generating(&self) -> bool;

    /// Name of the active character, used to title saved snapshot files.
    /// May be empty when no character is selected.
    fn character_name(&self) -> String;

    /// Requests one response generation.
    ///
    /// # Errors
    /// Returns [`HostError`] when the host rejects the request.
    fn trigger_generation(&self, automatic: bool) -> Result<(), HostError>;

    /// Returns a snapshot of the message at `id`.
    fn message(&self, id: MessageId) -> Option<ChatMessage>;

    /// Mutates the message at `id` in place.
    ///
    /// # Returns
    /// `false` when no such message exists.
    fn with_message_mut(&self, id: MessageId, f: &mut dyn FnMut(&mut ChatMessage)) -> bool;

    /// Returns the newest transcript entry, if any.
    fn last_message(&self) -> Option<(MessageId, ChatMessage)>;

    /// Returns the transcript length.
    fn message_count(&self) -> usize;

    /// Persists base64 image bytes as a named file.
    ///
    /// # Returns
    /// A host file reference path for later message annotation.
    ///
    /// # Errors
    /// Returns [`HostError`] on storage failure.
    fn save_image_file(&self, jpeg_base64: &str, name_hint: &str) -> Result<String, HostError>;

    /// Persists the chat transcript to host storage.
    ///
    /// # Errors
    /// Returns [`HostError`] on storage failure.
    fn persist_chat(&self) -> Result<(), HostError>;

    /// Re-renders the media block of an already displayed message.
    fn rerender_message_media(&self, id: MessageId);

    /// Emits the host's file-embedded event for `id`.
    fn emit_file_embedded(&self, id: MessageId);

    /// Shows a transient user-facing notification.
    fn notify(&self, level: NoticeLevel, text: &str);
}

/// Host settings persistence seam: namespaced blobs saved on a debounce.
pub trait SettingsStore: Send + Sync {
    /// Loads the blob stored under `namespace`, if any.
    fn load(&self, namespace: &str) -> Option<serde_json::Value>;

    /// Schedules a debounced save of `value` under `namespace`.
    fn save_debounced(&self, namespace: &str, value: serde_json::Value);
}

/// Recorded side effect from the in-memory host double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEffect {
    /// A generation request was accepted.
    GenerationTriggered {
        /// `true` for automatic (non-user-initiated) triggers.
        automatic: bool,
    },
    /// The transcript was persisted.
    ChatPersisted,
    /// A snapshot file was stored under this reference.
    FileSaved(String),
    /// Message media was re-rendered.
    MediaRerendered(MessageId),
    /// The file-embedded event was emitted.
    FileEmbedded(MessageId),
    /// A notification was shown.
    Notice(NoticeLevel, String),
}

/// Deterministic in-memory chat host for tests and the demo shell.
#[derive(Debug, Default)]
pub struct InMemoryChatHost {
    transcript: Mutex<Vec<ChatMessage>>,
    effects: Mutex<Vec<HostEffect>>,
    generating: AtomicBool,
    character_name: Mutex<String>,
}

impl InMemoryChatHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the transcript with an existing message (e.g. a character turn).
    pub fn push_message(&self, message: ChatMessage) -> MessageId {
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        transcript.push(message);
        transcript.len() - 1
    }

    /// Sets the active character name reported to the policy layer.
    pub fn set_character_name(&self, name: &str) {
        *self
            .character_name
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = name.to_string();
    }

    /// Flips the in-flight generation flag observed by `is_generating`.
    pub fn set_generating(&self, generating: bool) {
        self.generating.store(generating, Ordering::SeqCst);
    }

    /// Returns a snapshot of the full transcript.
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns every recorded side effect in order.
    pub fn effects(&self) -> Vec<HostEffect> {
        self.effects.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Counts recorded generation triggers.
    pub fn generation_trigger_count(&self) -> usize {
        self.effects()
            .iter()
            .filter(|effect| matches!(effect, HostEffect::GenerationTriggered { .. }))
            .count()
    }

    fn record(&self, effect: HostEffect) {
        self.effects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(effect);
    }
}

impl ChatHost for InMemoryChatHost {
    fn send_message_as_user(&self, text: &str) -> Result<MessageId, HostError> {
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        transcript.push(ChatMessage::user(text));
        Ok(transcript.len() - 1)
    }

    fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    fn character_name(&self) -> String {
        self.character_name
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn trigger_generation(&self, automatic: bool) -> Result<(), HostError> {
        self.record(HostEffect::GenerationTriggered { automatic });
        Ok(())
    }

    fn message(&self, id: MessageId) -> Option<ChatMessage> {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn with_message_mut(&self, id: MessageId, f: &mut dyn FnMut(&mut ChatMessage)) -> bool {
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        match transcript.get_mut(id) {
            Some(message) => {
                f(message);
                true
            }
            None => false,
        }
    }

    fn last_message(&self) -> Option<(MessageId, ChatMessage)> {
        let transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        transcript
            .last()
            .cloned()
            .map(|message| (transcript.len() - 1, message))
    }

    fn message_count(&self) -> usize {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn save_image_file(&self, jpeg_base64: &str, name_hint: &str) -> Result<String, HostError> {
        let reference = snapshot_file_name(jpeg_base64, name_hint);
        self.record(HostEffect::FileSaved(reference.clone()));
        Ok(reference)
    }

    fn persist_chat(&self) -> Result<(), HostError> {
        self.record(HostEffect::ChatPersisted);
        Ok(())
    }

    fn rerender_message_media(&self, id: MessageId) {
        self.record(HostEffect::MediaRerendered(id));
    }

    fn emit_file_embedded(&self, id: MessageId) {
        self.record(HostEffect::FileEmbedded(id));
    }

    fn notify(&self, level: NoticeLevel, text: &str) {
        self.record(HostEffect::Notice(level, text.to_string()));
    }
}

/// In-memory settings store with namespaced blobs.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    blobs: Mutex<Vec<(String, serde_json::Value)>>,
    save_count: Mutex<usize>,
}

impl InMemorySettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many debounced saves were requested.
    pub fn save_count(&self) -> usize {
        *self.save_count.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self, namespace: &str) -> Option<serde_json::Value> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|(key, _)| key == namespace)
            .map(|(_, value)| value.clone())
    }

    fn save_debounced(&self, namespace: &str, value: serde_json::Value) {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = blobs.iter_mut().find(|(key, _)| key == namespace) {
            entry.1 = value;
        } else {
            blobs.push((namespace.to_string(), value));
        }
        *self.save_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}

/// Derives a stable snapshot file reference from image content.
///
/// # Semantics
/// The name embeds a short content digest so repeated saves of identical
/// frames map to the same reference.
pub fn snapshot_file_name(jpeg_base64: &str, name_hint: &str) -> String {
    let digest = Sha256::digest(jpeg_base64.as_bytes());
    let short = hex::encode(&digest[..6]);
    let hint = if name_hint.trim().is_empty() {
        "snapshot"
    } else {
        name_hint.trim()
    };
    format!("user/images/{hint}_{short}.jpg")
}

/// Host seam error type.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host rejected or failed the requested operation.
    #[error("host operation failed: {0}")]
    Failed(String),
    /// No message exists at the given transcript index.
    #[error("unknown message id: {0}")]
    UnknownMessage(MessageId),
}
