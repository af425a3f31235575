// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase scheduling relative to a vsync signal.
//!
//! A [`VsyncScheduler`] turns the most recent `(timebase, interval)` pair
//! reported by the display into concrete times for the phases of one frame:
//!
//! ```text
//!        update         snapshot     vsync                presentation
//!   ───────┼───────────────┼───────────┼───────────────────────┼──────▶
//!          V + update      V + snapshot V                    V + presentation
//! ```
//!
//! The update phase runs frame callbacks so clients can publish, the
//! snapshot phase resolves and paints, and the presentation time is when
//! the result is expected on screen. The scheduler is pure bookkeeping: it
//! never sleeps or arms timers itself. The caller arms timers for the times
//! in a [`ScheduledFrame`] and reports back through
//! [`take_update`](VsyncScheduler::take_update) and
//! [`take_snapshot`](VsyncScheduler::take_snapshot), quoting the frame's
//! ticket so stale timers are ignored.

use crate::dispatch::FrameInfo;
use crate::time::{Duration, HostTime, PhaseOffset};

/// The latest timing reported by a vsync source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VsyncTiming {
    /// Timestamp of a recent vsync.
    pub timebase: HostTime,
    /// Refresh interval.
    pub interval: Duration,
}

/// Phase offsets relative to a vsync timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VsyncPhases {
    /// When frame callbacks run.
    pub update: PhaseOffset,
    /// When the snapshot is built and painted.
    pub snapshot: PhaseOffset,
    /// When the painted frame is expected on screen.
    pub presentation: PhaseOffset,
}

/// A signed fraction of the refresh interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ratio {
    /// Numerator, negative for phases before vsync.
    pub numer: i32,
    /// Denominator.
    pub denom: u32,
}

/// Update and snapshot phases as fractions of the refresh interval.
///
/// The presentation phase is always `interval × pipeline_depth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseRatios {
    /// Update phase.
    pub update: Ratio,
    /// Snapshot phase.
    pub snapshot: Ratio,
}

impl PhaseRatios {
    /// One full interval ahead for updates, a sixth ahead for snapshots.
    pub const DEFAULT: Self = Self {
        update: Ratio { numer: -1, denom: 1 },
        snapshot: Ratio { numer: -1, denom: 6 },
    };

    /// Concrete offsets for `interval` at `pipeline_depth`.
    #[must_use]
    pub fn phases(&self, interval: Duration, pipeline_depth: u8) -> VsyncPhases {
        VsyncPhases {
            update: PhaseOffset::of_interval(interval, self.update.numer, self.update.denom),
            snapshot: PhaseOffset::of_interval(interval, self.snapshot.numer, self.snapshot.denom),
            presentation: PhaseOffset::of_interval(interval, i32::from(pipeline_depth), 1),
        }
    }
}

impl Default for PhaseRatios {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which phases a requested frame includes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameMode {
    /// Resolve and paint only.
    Snapshot,
    /// Run frame callbacks first, then resolve and paint.
    UpdateAndSnapshot,
}

/// Phase times for one pending frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledFrame {
    /// Identifies this frame in later `take_*` calls.
    pub ticket: u64,
    /// Phases included.
    pub mode: FrameMode,
    /// The vsync this frame is aligned to.
    pub vsync_time: HostTime,
    /// When to run frame callbacks, if the frame includes an update.
    pub update_time: Option<HostTime>,
    /// When to snapshot.
    pub snapshot_time: HostTime,
    /// Expected display time.
    pub presentation_time: HostTime,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    frame: ScheduledFrame,
    update_delivered: bool,
}

/// Computes frame phase times from vsync timing.
#[derive(Clone, Debug, Default)]
pub struct VsyncScheduler {
    timing: Option<VsyncTiming>,
    phases: Option<VsyncPhases>,
    pending: Option<Pending>,
    deferred: Option<FrameMode>,
    last_presentation: Option<HostTime>,
    next_ticket: u64,
    frame_index: u64,
}

impl VsyncScheduler {
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) scheduling with new timing and phases.
    ///
    /// A pending frame is rescheduled against the new timing, as is any
    /// frame requested while the scheduler was stopped; the resulting frame
    /// is returned.
    ///
    /// # Panics
    ///
    /// Panics if `timing.interval` is zero.
    pub fn start(
        &mut self,
        timing: VsyncTiming,
        phases: VsyncPhases,
        now: HostTime,
    ) -> Option<ScheduledFrame> {
        assert!(timing.interval.ticks() > 0, "vsync interval must be non-zero");
        self.timing = Some(timing);
        self.phases = Some(phases);
        if let Some(p) = self.pending.take() {
            self.defer(p.frame.mode);
        }
        let mode = self.deferred.take()?;
        self.schedule_frame(mode, now)
    }

    /// Stops scheduling. Outstanding tickets become stale.
    pub fn stop(&mut self) {
        self.timing = None;
        self.phases = None;
        if let Some(p) = self.pending.take() {
            self.defer(p.frame.mode);
        }
    }

    /// Returns `true` between [`start`](Self::start) and
    /// [`stop`](Self::stop).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timing.is_some()
    }

    /// The timing the scheduler is running with.
    #[must_use]
    pub fn timing(&self) -> Option<VsyncTiming> {
        self.timing
    }

    /// The frame currently awaiting its phases.
    #[must_use]
    pub fn pending(&self) -> Option<ScheduledFrame> {
        self.pending.map(|p| p.frame)
    }

    /// Requests a frame.
    ///
    /// Returns the frame whose timers the caller must arm, or `None` when
    /// nothing new needs arming: the request was folded into the pending
    /// frame, or the scheduler is stopped (the request is kept until
    /// [`start`](Self::start)).
    ///
    /// Requesting an update while a snapshot-only frame is pending upgrades
    /// that frame when its update time is still ahead; otherwise the update
    /// is carried over to the frame after it.
    pub fn schedule_frame(&mut self, mode: FrameMode, now: HostTime) -> Option<ScheduledFrame> {
        let (Some(timing), Some(phases)) = (self.timing, self.phases) else {
            self.defer(mode);
            return None;
        };

        if let Some(pending) = &mut self.pending {
            if mode == FrameMode::UpdateAndSnapshot && pending.frame.mode == FrameMode::Snapshot {
                let update_time = pending.frame.vsync_time.offset(phases.update);
                if update_time >= now {
                    pending.frame.mode = FrameMode::UpdateAndSnapshot;
                    pending.frame.update_time = Some(update_time);
                    return Some(pending.frame);
                }
                self.defer(mode);
            }
            return None;
        }

        let lead = match mode {
            FrameMode::Snapshot => phases.snapshot,
            FrameMode::UpdateAndSnapshot => phases.update,
        };
        let mut vsync = next_vsync(timing, now.offset(PhaseOffset(lead.0.saturating_neg())));
        if let Some(last) = self.last_presentation {
            while vsync.offset(phases.presentation) <= last {
                vsync = vsync + timing.interval;
            }
        }

        let frame = ScheduledFrame {
            ticket: self.next_ticket,
            mode,
            vsync_time: vsync,
            update_time: (mode == FrameMode::UpdateAndSnapshot).then_some(vsync.offset(phases.update)),
            snapshot_time: vsync.offset(phases.snapshot),
            presentation_time: vsync.offset(phases.presentation),
        };
        self.next_ticket += 1;
        self.pending = Some(Pending {
            frame,
            update_delivered: false,
        });
        Some(frame)
    }

    /// Claims the update phase of frame `ticket`.
    ///
    /// Returns `None` for stale tickets, snapshot-only frames and repeated
    /// claims.
    pub fn take_update(&mut self, ticket: u64, now: HostTime) -> Option<FrameInfo> {
        let interval = self.timing?.interval;
        let pending = self.pending.as_mut().filter(|p| p.frame.ticket == ticket)?;
        if pending.frame.mode != FrameMode::UpdateAndSnapshot || pending.update_delivered {
            return None;
        }
        pending.update_delivered = true;
        let frame = pending.frame;
        Some(Self::frame_info(self.frame_index + 1, &frame, interval, now))
    }

    /// Claims the snapshot phase of frame `ticket`, completing the frame.
    ///
    /// Returns `None` for stale tickets.
    pub fn take_snapshot(&mut self, ticket: u64, now: HostTime) -> Option<FrameInfo> {
        let interval = self.timing?.interval;
        if self.pending?.frame.ticket != ticket {
            return None;
        }
        let pending = self.pending.take()?;
        self.last_presentation = Some(pending.frame.presentation_time);
        self.frame_index += 1;
        Some(Self::frame_info(self.frame_index, &pending.frame, interval, now))
    }

    /// Takes a request that could not be served by the last frame.
    ///
    /// Callers check this after [`take_snapshot`](Self::take_snapshot) and
    /// feed it back into [`schedule_frame`](Self::schedule_frame).
    pub fn take_deferred(&mut self) -> Option<FrameMode> {
        if self.pending.is_some() || !self.is_running() {
            return None;
        }
        self.deferred.take()
    }

    fn defer(&mut self, mode: FrameMode) {
        self.deferred = Some(self.deferred.map_or(mode, |d| d.max(mode)));
    }

    /// Info for the frame numbered `frame_index`.
    fn frame_info(
        frame_index: u64,
        frame: &ScheduledFrame,
        interval: Duration,
        now: HostTime,
    ) -> FrameInfo {
        FrameInfo {
            frame_index,
            base_time: now,
            presentation_time: frame.presentation_time,
            presentation_interval: interval,
            publish_deadline: frame.snapshot_time,
        }
    }
}

/// First vsync at or after `not_before`, on the grid defined by `timing`.
fn next_vsync(timing: VsyncTiming, not_before: HostTime) -> HostTime {
    let base = i128::from(timing.timebase.ticks());
    let interval = i128::from(timing.interval.ticks());
    let target = i128::from(not_before.ticks());
    let k = (target - base).div_euclid(interval)
        + i128::from((target - base).rem_euclid(interval) != 0);
    let t = base + k * interval;
    HostTime(u64::try_from(t.max(0)).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration(6_000);

    fn running(now: HostTime) -> VsyncScheduler {
        let mut s = VsyncScheduler::new();
        let timing = VsyncTiming {
            timebase: HostTime(60_000),
            interval: INTERVAL,
        };
        let started = s.start(timing, PhaseRatios::DEFAULT.phases(INTERVAL, 1), now);
        assert!(started.is_none(), "nothing deferred");
        s
    }

    #[test]
    fn default_phase_math() {
        let p = PhaseRatios::DEFAULT.phases(INTERVAL, 2);
        assert_eq!(p.update, PhaseOffset(-6_000));
        assert_eq!(p.snapshot, PhaseOffset(-1_000));
        assert_eq!(p.presentation, PhaseOffset(12_000));
    }

    #[test]
    fn snapshot_frame_aligns_to_next_vsync() {
        let mut s = running(HostTime(61_000));
        let f = s.schedule_frame(FrameMode::Snapshot, HostTime(61_000)).unwrap();
        // Snapshot lead is 1000 ticks, so vsync 66000 is the first that fits.
        assert_eq!(f.vsync_time, HostTime(66_000));
        assert_eq!(f.snapshot_time, HostTime(65_000));
        assert_eq!(f.presentation_time, HostTime(72_000));
        assert_eq!(f.update_time, None);
    }

    #[test]
    fn update_frame_needs_a_full_interval_of_lead() {
        let mut s = running(HostTime(61_000));
        let f = s
            .schedule_frame(FrameMode::UpdateAndSnapshot, HostTime(61_000))
            .unwrap();
        assert_eq!(f.vsync_time, HostTime(72_000));
        assert_eq!(f.update_time, Some(HostTime(66_000)));
        assert_eq!(f.snapshot_time, HostTime(71_000));
    }

    #[test]
    fn requests_coalesce_and_upgrade() {
        let mut s = running(HostTime(59_500));
        let first = s.schedule_frame(FrameMode::Snapshot, HostTime(59_500)).unwrap();
        assert_eq!(first.vsync_time, HostTime(66_000));
        assert!(s.schedule_frame(FrameMode::Snapshot, HostTime(59_550)).is_none());

        let upgraded = s
            .schedule_frame(FrameMode::UpdateAndSnapshot, HostTime(59_600))
            .expect("update time still ahead");
        assert_eq!(upgraded.ticket, first.ticket);
        assert_eq!(upgraded.update_time, Some(first.vsync_time.offset(PhaseOffset(-6_000))));
    }

    #[test]
    fn late_upgrade_is_deferred_to_next_frame() {
        let mut s = running(HostTime(64_500));
        let f = s.schedule_frame(FrameMode::Snapshot, HostTime(64_500)).unwrap();
        assert_eq!(f.vsync_time, HostTime(66_000));
        // Update for vsync 66000 would have been at 60000: too late.
        assert!(s.schedule_frame(FrameMode::UpdateAndSnapshot, HostTime(64_600)).is_none());
        assert!(s.take_snapshot(f.ticket, f.snapshot_time).is_some());
        assert_eq!(s.take_deferred(), Some(FrameMode::UpdateAndSnapshot));
    }

    #[test]
    fn presentation_times_strictly_increase() {
        let mut s = running(HostTime(61_000));
        let a = s.schedule_frame(FrameMode::Snapshot, HostTime(61_000)).unwrap();
        s.take_snapshot(a.ticket, HostTime(65_000)).unwrap();
        // Asking again at the same instant must not reuse vsync 66000.
        let b = s.schedule_frame(FrameMode::Snapshot, HostTime(61_000)).unwrap();
        assert!(b.presentation_time > a.presentation_time);
    }

    #[test]
    fn stale_tickets_are_ignored() {
        let mut s = running(HostTime(61_000));
        let f = s
            .schedule_frame(FrameMode::UpdateAndSnapshot, HostTime(61_000))
            .unwrap();
        assert!(s.take_update(f.ticket + 1, HostTime(66_000)).is_none());
        let info = s.take_update(f.ticket, HostTime(66_000)).unwrap();
        assert_eq!(info.presentation_time, f.presentation_time);
        assert_eq!(info.publish_deadline, f.snapshot_time);
        assert!(s.take_update(f.ticket, HostTime(66_000)).is_none(), "claimed once");
        let snap = s.take_snapshot(f.ticket, HostTime(67_000)).unwrap();
        assert_eq!(snap.frame_index, info.frame_index, "both phases belong to one frame");
        assert!(s.take_snapshot(f.ticket, HostTime(67_000)).is_none());

        let g = s
            .schedule_frame(FrameMode::Snapshot, HostTime(67_000))
            .unwrap();
        s.stop();
        assert!(s.take_snapshot(g.ticket, HostTime(71_000)).is_none());
    }

    #[test]
    fn requests_while_stopped_start_with_the_scheduler() {
        let mut s = VsyncScheduler::new();
        assert!(s.schedule_frame(FrameMode::UpdateAndSnapshot, HostTime(0)).is_none());
        let timing = VsyncTiming {
            timebase: HostTime(0),
            interval: INTERVAL,
        };
        let f = s
            .start(timing, PhaseRatios::DEFAULT.phases(INTERVAL, 1), HostTime(100))
            .expect("deferred request scheduled on start");
        assert_eq!(f.mode, FrameMode::UpdateAndSnapshot);
    }
}
