#![warn(missing_docs)]
//! # wake-call-app binary
//!
//! Headless walkthrough of a simulated video call: starts a call against the
//! synthetic camera, runs the auto-send loop for a while, schedules an alarm
//! one minute out and fast-forwards past it, printing the resulting
//! transcript and host side effects.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use wake_call_app::{ChatEvent, Runtime, app_version};
use wake_call_capture::SyntheticCameraBackend;
use wake_call_host::{ChatHost, InMemoryChatHost, InMemorySettingsStore};

/// Simulated tick granularity.
const STEP_MS: i64 = 100;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("wake-call-app {}", app_version());

    let camera = Arc::new(SyntheticCameraBackend::with_warmup_ms(300));
    let host = Arc::new(InMemoryChatHost::new());
    host.set_character_name("Demo");
    let store = Arc::new(InMemorySettingsStore::new());

    let mut runtime = Runtime::new(camera, host.clone(), store);
    runtime.set_auto_interval("10");

    let mut now = OffsetDateTime::now_utc();
    let mut rendered = host.message_count();

    runtime.handle_event(ChatEvent::AppReady, now);
    runtime.start_call(now);
    runtime.start_auto(now);

    let dialog = wake_call_alarm::dialog_prefill(now);
    if let Err(error) = runtime.schedule_alarm(now, dialog.0, dialog.1, dialog.2, "Demo wake-up") {
        eprintln!("failed to schedule alarm: {error}");
        std::process::exit(1);
    }

    // Walk simulated time past the alarm target, replaying render events the
    // way the embedding frontend would.
    let total_steps = (90 * 1_000) / STEP_MS;
    for _ in 0..total_steps {
        now += Duration::milliseconds(STEP_MS);
        runtime.on_timer_tick(now);
        while rendered < host.message_count() {
            runtime.handle_event(ChatEvent::UserMessageRendered(rendered), now);
            rendered += 1;
        }
    }

    runtime.stop_call(now);

    println!("\n--- transcript ---");
    for (index, message) in host.transcript().iter().enumerate() {
        let author = if message.is_user { "user" } else { "char" };
        let media = if message.has_visual_media() {
            " [snapshot]"
        } else {
            ""
        };
        println!("{index:>3} {author}: {:?}{media}", message.text);
    }

    println!("\n--- host effects ---");
    for effect in host.effects() {
        println!("{effect:?}");
    }
}
