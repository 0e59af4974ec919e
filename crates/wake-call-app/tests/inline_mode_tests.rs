//! Integration tests for the inline-mode generation interceptor.

mod common;

use common::{harness, plus_ms, wall};
use wake_call_app::{ChatEvent, GENERATION_SETTLE_DELAY_MS};
use wake_call_core::{ChatMessage, MediaKind, is_data_url};
use wake_call_host::ChatHost;

#[test]
fn inline_mode_tests_attaches_data_url_to_last_user_entry() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.set_image_mode("inline");
    h.runtime.start_call(now);

    let mut working = vec![
        ChatMessage::character("hello"),
        ChatMessage::user("can you see me?"),
    ];
    h.runtime.handle_event(
        ChatEvent::BeforeGeneration {
            chat: &mut working,
            quiet: false,
        },
        now,
    );

    let last = working.last().unwrap();
    assert_eq!(last.media.len(), 1);
    assert_eq!(last.media[0].kind, MediaKind::Image);
    assert!(is_data_url(&last.media[0].url));
    assert!(last.media[0].url.starts_with("data:image/jpeg;base64,"));
    // the character entry is untouched
    assert!(!working[0].has_visual_media());
}

#[test]
fn inline_mode_tests_quiet_generations_are_untouched() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.set_image_mode("inline");
    h.runtime.start_call(now);

    let mut working = vec![ChatMessage::user("hi")];
    h.runtime.handle_event(
        ChatEvent::BeforeGeneration {
            chat: &mut working,
            quiet: true,
        },
        now,
    );

    assert!(!working[0].has_visual_media());
}

#[test]
fn inline_mode_tests_character_tail_is_untouched() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.set_image_mode("inline");
    h.runtime.start_call(now);

    let mut working = vec![ChatMessage::user("hi"), ChatMessage::character("hello")];
    h.runtime.handle_event(
        ChatEvent::BeforeGeneration {
            chat: &mut working,
            quiet: false,
        },
        now,
    );

    assert!(working.iter().all(|m| !m.has_visual_media()));
}

#[test]
fn inline_mode_tests_captions_mode_never_intercepts() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);

    let mut working = vec![ChatMessage::user("hi")];
    h.runtime.handle_event(
        ChatEvent::BeforeGeneration {
            chat: &mut working,
            quiet: false,
        },
        now,
    );

    assert!(!working[0].has_visual_media());
}

#[test]
fn inline_mode_tests_persisted_transcript_is_never_mutated() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.set_image_mode("inline");
    h.runtime.start_call(now);
    let id = h.host.push_message(ChatMessage::user("can you see me?"));

    let mut working = h.host.transcript();
    h.runtime.handle_event(
        ChatEvent::BeforeGeneration {
            chat: &mut working,
            quiet: false,
        },
        now,
    );

    assert!(working[working.len() - 1].has_visual_media());
    assert!(!h.host.transcript()[id].has_visual_media());
}

#[test]
fn inline_mode_tests_transient_attachment_is_not_marked_inline() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.set_image_mode("inline");
    h.runtime.start_call(now);

    let mut working = vec![ChatMessage::user("hi")];
    h.runtime.handle_event(
        ChatEvent::BeforeGeneration {
            chat: &mut working,
            quiet: false,
        },
        now,
    );

    // only the rendered-transcript policy sets the system-attached marker;
    // the working copy just carries the media entry
    assert!(working[0].has_visual_media());
    assert!(!working[0].inline_image);
}

#[test]
fn inline_mode_tests_auto_loop_defers_generation_instead_of_attaching() {
    let mut h = harness();
    let mut now = wall(9, 0, 0);

    h.runtime.set_image_mode("inline");
    h.runtime.set_auto_interval("10");
    h.runtime.start_call(now);
    h.runtime.handle_event(ChatEvent::UserMessageRendered(0), now);
    h.runtime.start_auto(now);

    now = plus_ms(now, 10_000);
    h.runtime.on_timer_tick(now);
    let id = h.host.message_count() - 1;
    h.runtime.handle_event(ChatEvent::UserMessageRendered(id), now);

    // no persisted attachment in inline mode
    assert!(!h.host.transcript()[id].has_visual_media());

    now = plus_ms(now, GENERATION_SETTLE_DELAY_MS as i64);
    h.runtime.on_timer_tick(now);
    assert_eq!(h.host.generation_trigger_count(), 1);
}
