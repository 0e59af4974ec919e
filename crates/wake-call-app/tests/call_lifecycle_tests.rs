//! Integration tests for call start/stop orchestration.

mod common;

use common::{harness, harness_with_camera, wall};
use wake_call_capture::SyntheticCameraBackend;
use wake_call_host::{HostEffect, NoticeLevel};

#[test]
fn call_lifecycle_tests_start_posts_announcement_and_arms_skip() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);

    assert!(h.runtime.is_call_active());
    assert!(h.runtime.attachment_skip_armed());
    let transcript = h.host.transcript();
    assert_eq!(transcript.len(), 1);
    assert!(transcript[0].is_user);
    assert_eq!(transcript[0].text, "[{{user}} has started a video call]");
}

#[test]
fn call_lifecycle_tests_start_while_active_reuses_stream_silently() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);
    h.runtime.start_call(now);

    assert_eq!(h.camera.open_count(), 1);
    assert_eq!(h.host.transcript().len(), 1);
}

#[test]
fn call_lifecycle_tests_stop_posts_farewell_and_releases() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);
    h.runtime.stop_call(now);

    assert!(!h.runtime.is_call_active());
    let transcript = h.host.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].text, "[{{user}} has ended the video call]");
}

#[test]
fn call_lifecycle_tests_stop_while_idle_is_silent() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.stop_call(now);

    assert!(h.host.transcript().is_empty());
    assert!(h.host.effects().is_empty());
}

#[test]
fn call_lifecycle_tests_stop_also_stops_auto_loop() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);
    h.runtime.start_auto(now);
    assert!(h.runtime.is_auto_running());

    h.runtime.stop_call(now);
    assert!(!h.runtime.is_auto_running());
}

#[test]
fn call_lifecycle_tests_denied_camera_notifies_without_partial_state() {
    let mut h = harness_with_camera(SyntheticCameraBackend::denied());
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);

    assert!(!h.runtime.is_call_active());
    assert!(h.host.transcript().is_empty());
    assert!(h.host.effects().iter().any(|effect| matches!(
        effect,
        HostEffect::Notice(NoticeLevel::Error, text) if text == "Could not access webcam"
    )));
}

#[test]
fn call_lifecycle_tests_unsupported_backend_is_a_silent_noop() {
    let mut h = harness_with_camera(SyntheticCameraBackend::unsupported());
    let now = wall(9, 0, 0);

    h.runtime.start_call(now);

    assert!(!h.runtime.is_call_active());
    assert!(h.host.transcript().is_empty());
    assert!(h.host.effects().is_empty());
}

#[test]
fn call_lifecycle_tests_toggle_flips_between_phases() {
    let mut h = harness();
    let now = wall(9, 0, 0);

    h.runtime.toggle_call(now);
    assert!(h.runtime.is_call_active());
    h.runtime.toggle_call(now);
    assert!(!h.runtime.is_call_active());
}
