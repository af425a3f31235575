// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host time sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use strata_core::time::{Duration, HostTime, Timebase};

/// Source of [`HostTime`] for the engine.
pub trait Clock {
    /// The current host time.
    fn now(&self) -> HostTime;

    /// Conversion between ticks and nanoseconds.
    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }
}

/// Monotonic clock with a nanosecond timebase, counting from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock reading zero now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u64 nanoseconds cover centuries of uptime"
    )]
    fn now(&self) -> HostTime {
        HostTime(self.origin.elapsed().as_nanos() as u64)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the engine.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(start.ticks())),
        }
    }

    /// Jumps to `time`.
    pub fn set(&self, time: HostTime) {
        self.ticks.store(time.ticks(), Ordering::Release);
    }

    /// Moves forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.ticks.fetch_add(by.ticks(), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.ticks.load(Ordering::Acquire))
    }
}
