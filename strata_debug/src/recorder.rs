// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event to a
//! shared log. Clones share the log, so one clone can be boxed into the
//! engine while another reads the recording back.

use std::sync::Arc;

use parking_lot::Mutex;

use strata_core::id::{RendererId, SceneToken};
use strata_core::time::HostTime;
use strata_core::trace::{
    FrameDrawnEvent, FrameDroppedEvent, PhaseBeginEvent, PhaseEndEvent, PublishEvent,
    SnapshotEvent, SubmitEvent, TeardownEvent, TraceSink,
};

/// One recorded trace event.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`SnapshotEvent`].
    Snapshot(SnapshotEvent),
    /// A [`SubmitEvent`].
    Submit(SubmitEvent),
    /// A [`FrameDroppedEvent`].
    FrameDropped(FrameDroppedEvent),
    /// A [`FrameDrawnEvent`].
    FrameDrawn(FrameDrawnEvent),
    /// A [`PublishEvent`].
    Publish(PublishEvent),
    /// A [`TeardownEvent`].
    Teardown(TeardownEvent),
}

impl RecordedEvent {
    /// When the event happened.
    #[must_use]
    pub fn timestamp(&self) -> HostTime {
        match self {
            Self::PhaseBegin(e) => e.timestamp,
            Self::PhaseEnd(e) => e.timestamp,
            Self::Snapshot(e) => e.timestamp,
            Self::Submit(e) => e.submitted_at,
            Self::FrameDropped(e) => e.timestamp,
            Self::FrameDrawn(e) => e.timestamp,
            Self::Publish(e) => e.timestamp,
            Self::Teardown(TeardownEvent::Scene { timestamp, .. })
            | Self::Teardown(TeardownEvent::Renderer { timestamp, .. }) => *timestamp,
        }
    }

    /// The renderer the event belongs to, if any.
    #[must_use]
    pub fn renderer(&self) -> Option<RendererId> {
        match self {
            Self::PhaseBegin(e) => Some(e.renderer),
            Self::PhaseEnd(e) => Some(e.renderer),
            Self::Snapshot(e) => Some(e.renderer),
            Self::Submit(e) => Some(e.renderer),
            Self::FrameDropped(e) => Some(e.renderer),
            Self::FrameDrawn(e) => Some(e.renderer),
            Self::Teardown(TeardownEvent::Renderer { renderer, .. }) => Some(*renderer),
            Self::Publish(_) | Self::Teardown(TeardownEvent::Scene { .. }) => None,
        }
    }

    /// The scene the event belongs to, if any.
    #[must_use]
    pub fn scene(&self) -> Option<SceneToken> {
        match self {
            Self::Publish(e) => Some(e.scene),
            Self::Teardown(TeardownEvent::Scene { scene, .. }) => Some(*scene),
            _ => None,
        }
    }
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    #[must_use]
    pub fn take(&self) -> Vec<RecordedEvent> {
        core::mem::take(&mut *self.events.lock())
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.lock().push(event);
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.push(RecordedEvent::PhaseBegin(*e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.push(RecordedEvent::PhaseEnd(*e));
    }

    fn on_snapshot(&mut self, e: &SnapshotEvent) {
        self.push(RecordedEvent::Snapshot(*e));
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        self.push(RecordedEvent::Submit(*e));
    }

    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        self.push(RecordedEvent::FrameDropped(*e));
    }

    fn on_frame_drawn(&mut self, e: &FrameDrawnEvent) {
        self.push(RecordedEvent::FrameDrawn(*e));
    }

    fn on_publish(&mut self, e: &PublishEvent) {
        self.push(RecordedEvent::Publish(*e));
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        self.push(RecordedEvent::Teardown(*e));
    }
}
