//! Integration tests for the one-shot skip-next-attachment flag.

mod common;

use common::{harness, wall};
use wake_call_app::ChatEvent;

#[test]
fn skip_attachment_tests_announcement_renders_without_snapshot() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);
    assert!(h.runtime.attachment_skip_armed());

    h.runtime.handle_event(ChatEvent::UserMessageRendered(0), now);

    assert!(!h.runtime.attachment_skip_armed());
    assert!(!h.host.transcript()[0].has_visual_media());
}

#[test]
fn skip_attachment_tests_flag_is_consumed_only_once() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);
    h.runtime.handle_event(ChatEvent::UserMessageRendered(0), now);

    let id = h.host.push_message(wake_call_core::ChatMessage::user("look at me"));
    h.runtime.handle_event(ChatEvent::UserMessageRendered(id), now);

    let transcript = h.host.transcript();
    assert!(!transcript[0].has_visual_media());
    assert!(transcript[id].has_visual_media());
}

#[test]
fn skip_attachment_tests_farewell_also_skips() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);
    h.runtime.handle_event(ChatEvent::UserMessageRendered(0), now);
    h.runtime.stop_call(now);
    h.runtime.handle_event(ChatEvent::UserMessageRendered(1), now);

    assert!(!h.host.transcript()[1].has_visual_media());
}
