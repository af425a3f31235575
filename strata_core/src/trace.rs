// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! engine calls as scenes publish and frames move through a renderer's
//! pipeline. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! The engine never calls a sink directly. It goes through [`Tracer`], which
//! holds an optional borrowed sink and is inert unless the `trace` feature is
//! enabled, so an uninstrumented build pays nothing per phase.
//!
//! These events complement the `tracing` log records: log records explain
//! *why* something happened, trace events carry timestamps for timeline
//! export.
//!
//! # Crate features
//!
//! - `trace`: forward [`Tracer`] calls to the installed sink.

use crate::id::{OutputId, RendererId, SceneToken, SceneVersion};
use crate::snapshot::Disposition;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a renderer's frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Frame callbacks running.
    Update,
    /// Snapshot resolution.
    Snapshot,
    /// Turning the snapshot into a render frame.
    Paint,
    /// Handing the frame to the pipeline.
    Submit,
}

/// What applying a publish did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PublishOutcome {
    /// No mutations; no new version.
    Unchanged,
    /// A new version was presented.
    Applied,
    /// Validation failed; the scene was destroyed.
    Failed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Renderer doing the work.
    pub renderer: RendererId,
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Renderer doing the work.
    pub renderer: RendererId,
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after a snapshot pass.
#[derive(Clone, Copy, Debug)]
pub struct SnapshotEvent {
    /// Renderer the snapshot was built for.
    pub renderer: RendererId,
    /// Its output.
    pub output: OutputId,
    /// Resolution generation.
    pub generation: u64,
    /// Overall result.
    pub disposition: Disposition,
    /// Distinct scenes resolved.
    pub scenes_resolved: u32,
    /// Distinct nodes resolved.
    pub nodes_resolved: u32,
    /// When the pass finished.
    pub timestamp: HostTime,
}

/// Emitted when a frame enters a renderer's pipeline.
#[derive(Clone, Copy, Debug)]
pub struct SubmitEvent {
    /// Renderer.
    pub renderer: RendererId,
    /// Frame counter.
    pub frame_index: u64,
    /// Host time of submission.
    pub submitted_at: HostTime,
    /// Expected presentation time.
    pub expected_present: HostTime,
    /// Pipeline length after the submit.
    pub queue_len: usize,
}

/// Emitted when an undrawn frame is replaced by a newer one.
#[derive(Clone, Copy, Debug)]
pub struct FrameDroppedEvent {
    /// Renderer.
    pub renderer: RendererId,
    /// The frame that will never be drawn.
    pub dropped_frame: u64,
    /// The frame that replaced it.
    pub replaced_by: u64,
    /// Host time of the replacement.
    pub timestamp: HostTime,
}

/// Emitted when the rasterizer reports a finished draw.
#[derive(Clone, Copy, Debug)]
pub struct FrameDrawnEvent {
    /// Renderer.
    pub renderer: RendererId,
    /// Frame counter.
    pub frame_index: u64,
    /// Whether the frame reached the display.
    pub presented: bool,
    /// Host time the report was handled.
    pub timestamp: HostTime,
}

/// Emitted after a publish is applied.
#[derive(Clone, Copy, Debug)]
pub struct PublishEvent {
    /// Scene.
    pub scene: SceneToken,
    /// New version, for applied publishes.
    pub version: Option<SceneVersion>,
    /// What happened.
    pub outcome: PublishOutcome,
    /// Host time of application.
    pub timestamp: HostTime,
}

/// Emitted when a scene or renderer is torn down.
#[derive(Clone, Copy, Debug)]
pub enum TeardownEvent {
    /// A scene was destroyed.
    Scene {
        /// The scene.
        scene: SceneToken,
        /// When.
        timestamp: HostTime,
    },
    /// A renderer was destroyed.
    Renderer {
        /// The renderer.
        renderer: RendererId,
        /// When.
        timestamp: HostTime,
    },
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the engine.
///
/// Every method defaults to doing nothing; a sink that only wants publish
/// outcomes overrides [`on_publish`](Self::on_publish) and nothing else.
pub trait TraceSink {
    /// Called at the beginning of a frame phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after a snapshot pass.
    fn on_snapshot(&mut self, e: &SnapshotEvent) {
        _ = e;
    }

    /// Called when a frame is submitted.
    fn on_submit(&mut self, e: &SubmitEvent) {
        _ = e;
    }

    /// Called when an undrawn frame is replaced.
    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        _ = e;
    }

    /// Called when a draw finishes.
    fn on_frame_drawn(&mut self, e: &FrameDrawnEvent) {
        _ = e;
    }

    /// Called after a publish is applied.
    fn on_publish(&mut self, e: &PublishEvent) {
        _ = e;
    }

    /// Called when a scene or renderer is torn down.
    fn on_teardown(&mut self, e: &TeardownEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A sink that ignores everything it is handed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Per-poll handle the engine emits trace events through.
///
/// Without the `trace` feature the sink is never stored and every emit is
/// empty. With it, an emit forwards to the sink if one is present.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Expands to a `Tracer` method that forwards one event to the sink.
macro_rules! forward {
    ($(#[$meta:meta])* $name:ident => $hook:ident($ty:ty)) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer with no sink attached.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`PhaseBeginEvent`].
        phase_begin => on_phase_begin(PhaseBeginEvent)
    );
    forward!(
        /// Emits a [`PhaseEndEvent`].
        phase_end => on_phase_end(PhaseEndEvent)
    );
    forward!(
        /// Emits a [`SnapshotEvent`].
        snapshot => on_snapshot(SnapshotEvent)
    );
    forward!(
        /// Emits a [`SubmitEvent`].
        submit => on_submit(SubmitEvent)
    );
    forward!(
        /// Emits a [`FrameDroppedEvent`].
        frame_dropped => on_frame_dropped(FrameDroppedEvent)
    );
    forward!(
        /// Emits a [`FrameDrawnEvent`].
        frame_drawn => on_frame_drawn(FrameDrawnEvent)
    );
    forward!(
        /// Emits a [`PublishEvent`].
        publish => on_publish(PublishEvent)
    );
    forward!(
        /// Emits a [`TeardownEvent`].
        teardown => on_teardown(TeardownEvent)
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        submits: u32,
        drops: u32,
    }

    impl TraceSink for Counting {
        fn on_submit(&mut self, _e: &SubmitEvent) {
            self.submits += 1;
        }

        fn on_frame_dropped(&mut self, _e: &FrameDroppedEvent) {
            self.drops += 1;
        }
    }

    fn submit() -> SubmitEvent {
        SubmitEvent {
            renderer: RendererId::from_raw(3),
            frame_index: 1,
            submitted_at: HostTime(10),
            expected_present: HostTime(26),
            queue_len: 1,
        }
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        let mut tracer = Tracer::new(&mut sink);
        tracer.submit(&submit());
        tracer.teardown(&TeardownEvent::Scene {
            scene: SceneToken::from_raw(1),
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn tracer_forwards_only_with_feature() {
        let mut sink = Counting::default();
        {
            let mut tracer = Tracer::new(&mut sink);
            tracer.submit(&submit());
            tracer.submit(&submit());
            tracer.frame_dropped(&FrameDroppedEvent {
                renderer: RendererId::from_raw(3),
                dropped_frame: 1,
                replaced_by: 2,
                timestamp: HostTime(12),
            });
        }
        if cfg!(feature = "trace") {
            assert_eq!(sink.submits, 2);
            assert_eq!(sink.drops, 1);
        } else {
            assert_eq!(sink.submits, 0, "tracer compiled out");
        }
    }

    #[test]
    fn none_tracer_is_silent() {
        let mut tracer = Tracer::none();
        tracer.submit(&submit());
    }
}
