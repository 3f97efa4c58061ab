//! Shared setup for tests that go through the process-wide native table.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

use yumstudio::fake::{self, FakeEngine};

static SERIAL: Mutex<()> = Mutex::new(());

/// Serializes tests that register tables; hold the guard for the whole test.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers the fake engine's table over an empty scene.
pub fn fake_engine() -> &'static FakeEngine {
    let engine = fake::install();
    engine.reset();
    engine
}
