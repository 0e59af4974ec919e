//! Shared fixtures for app integration tests.

use std::sync::Arc;

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};
use wake_call_app::Runtime;
use wake_call_capture::SyntheticCameraBackend;
use wake_call_host::{InMemoryChatHost, InMemorySettingsStore};

/// Fixture bundling a runtime with handles to its synthetic seams.
#[allow(dead_code)]
pub struct Harness {
    pub runtime: Runtime,
    pub camera: Arc<SyntheticCameraBackend>,
    pub host: Arc<InMemoryChatHost>,
    pub store: Arc<InMemorySettingsStore>,
}

/// Builds a runtime over an instantly-ready synthetic camera.
#[allow(dead_code)]
pub fn harness() -> Harness {
    harness_with_camera(SyntheticCameraBackend::new())
}

/// Builds a runtime over the given camera backend.
#[allow(dead_code)]
pub fn harness_with_camera(camera: SyntheticCameraBackend) -> Harness {
    let camera = Arc::new(camera);
    let host = Arc::new(InMemoryChatHost::new());
    host.set_character_name("Nova");
    let store = Arc::new(InMemorySettingsStore::new());
    let runtime = Runtime::new(camera.clone(), host.clone(), store.clone());
    Harness {
        runtime,
        camera,
        host,
        store,
    }
}

/// Deterministic wall-clock instant on 2026-03-10 at the given time of day.
#[allow(dead_code)]
pub fn wall(hour: u8, minute: u8, second: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(2026, Month::March, 10).expect("valid fixture date");
    let time = Time::from_hms(hour, minute, second).expect("valid fixture time");
    PrimitiveDateTime::new(date, time).assume_utc()
}

/// Advances a fixture instant by whole milliseconds.
#[allow(dead_code)]
pub fn plus_ms(now: OffsetDateTime, ms: i64) -> OffsetDateTime {
    now + time::Duration::milliseconds(ms)
}
