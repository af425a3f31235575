// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time, durations and signed phase offsets.
//!
//! [`HostTime`] is a point on the compositor's monotonic clock in ticks.
//! [`Duration`] is an unsigned tick span and [`PhaseOffset`] is a signed one,
//! used to place the update and snapshot phases of a frame *before* its vsync
//! and the presentation phase *after* it.
//!
//! [`Timebase`] carries the rational ticks-to-nanoseconds factor reported by
//! the vsync source. Conversions go through `u128` intermediates.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time expressed in monotonic ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Ticks elapsed since `earlier`, clamped to zero when `earlier` is later.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// `self + duration`, or `None` past the end of the tick range.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Shifts this time by a signed offset, saturating at both ends of the
    /// tick range.
    #[inline]
    #[must_use]
    pub const fn offset(self, offset: PhaseOffset) -> Self {
        if offset.0 >= 0 {
            Self(self.0.saturating_add(offset.0.unsigned_abs()))
        } else {
            Self(self.0.saturating_sub(offset.0.unsigned_abs()))
        }
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// How many nanoseconds one tick lasts, as the fraction `numer / denom`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Nanoseconds per `denom` ticks.
    pub numer: u32,
    /// Tick count `numer` nanoseconds span. Never zero.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a new timebase.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Tick count in nanoseconds, rounded toward zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the product is computed in u128 and any result that fits a tick count fits u64"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        wide as u64
    }

    /// Nanoseconds in ticks, rounded toward zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the product is computed in u128 and any result that fits a tick count fits u64"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        let wide = nanos as u128 * self.denom as u128 / self.numer as u128;
        wide as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// An unsigned span of ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Builds a span of `nanos` nanoseconds on the given clock.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Saturating multiplication by a whole factor.
    #[inline]
    #[must_use]
    pub const fn saturating_mul(self, factor: u64) -> Self {
        Self(self.0.saturating_mul(factor))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

/// A signed span of ticks, relative to a vsync timestamp.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhaseOffset(pub i64);

impl PhaseOffset {
    /// Scales `interval` by the ratio `numer / denom`, which may be negative.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "i128 intermediate; clamped to the i64 range before narrowing"
    )]
    pub const fn of_interval(interval: Duration, numer: i32, denom: u32) -> Self {
        assert!(denom != 0, "phase ratio denominator must not be zero");
        let wide = interval.0 as i128 * numer as i128 / denom as i128;
        let clamped = if wide > i64::MAX as i128 {
            i64::MAX
        } else if wide < i64::MIN as i128 {
            i64::MIN
        } else {
            wide as i64
        };
        Self(clamped)
    }
}

impl Sub<HostTime> for HostTime {
    type Output = PhaseOffset;

    #[inline]
    fn sub(self, rhs: Self) -> PhaseOffset {
        PhaseOffset(self.0.wrapping_sub(rhs.0) as i64)
    }
}

impl fmt::Debug for PhaseOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhaseOffset({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timebase_conversion_round_trips() {
        let tb = Timebase::new(125, 3);
        let ticks = 24_000_000_u64;
        let nanos = tb.ticks_to_nanos(ticks);
        assert_eq!(nanos, 1_000_000_000, "24 MHz ticks for one second");
        assert_eq!(tb.nanos_to_ticks(nanos), ticks);
    }

    #[test]
    fn offset_moves_both_directions_and_saturates() {
        let t = HostTime(1_000);
        assert_eq!(t.offset(PhaseOffset(250)), HostTime(1_250));
        assert_eq!(t.offset(PhaseOffset(-250)), HostTime(750));
        assert_eq!(t.offset(PhaseOffset(-5_000)), HostTime(0));
        assert_eq!(HostTime(u64::MAX).offset(PhaseOffset(1)), HostTime(u64::MAX));
    }

    #[test]
    fn phase_offset_scales_interval() {
        let interval = Duration(16_000);
        assert_eq!(PhaseOffset::of_interval(interval, -1, 1), PhaseOffset(-16_000));
        assert_eq!(PhaseOffset::of_interval(interval, -1, 6), PhaseOffset(-2_666));
        assert_eq!(PhaseOffset::of_interval(interval, 2, 1), PhaseOffset(32_000));
    }

    #[test]
    fn host_time_difference_is_signed() {
        assert_eq!(HostTime(100) - HostTime(40), PhaseOffset(60));
        assert_eq!(HostTime(40) - HostTime(100), PhaseOffset(-60));
    }

    #[test]
    fn duration_helpers() {
        assert_eq!(Duration(10).saturating_mul(3), Duration(30));
        assert_eq!(Duration(u64::MAX).saturating_mul(2), Duration(u64::MAX));
        assert_eq!(
            HostTime(10).saturating_duration_since(HostTime(50)),
            Duration::ZERO
        );
    }
}
