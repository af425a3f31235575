// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] turns each engine trace event into a single bracketed
//! line such as `[publish] scene=#3 v2 applied`, with host times shown in
//! microseconds. Useful when watching a live engine from a terminal.

use std::io::Write;

use strata_core::snapshot::Disposition;
use strata_core::time::{HostTime, Timebase};
use strata_core::trace::{
    FrameDrawnEvent, FrameDroppedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, PublishEvent,
    PublishOutcome, SnapshotEvent, SubmitEvent, TeardownEvent, TraceSink,
};

/// Line-per-event trace sink over any [`Write`] destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Logs to standard error.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Logs to an already boxed destination.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Logs to `writer`, keeping its concrete type so tests can read it back.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn us(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Update => "update",
        PhaseKind::Snapshot => "snapshot",
        PhaseKind::Paint => "paint",
        PhaseKind::Submit => "submit",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] r={} frame={} {} at {:.1}µs",
            e.renderer.raw(),
            e.frame_index,
            phase_name(e.phase),
            self.us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] r={} frame={} {} at {:.1}µs",
            e.renderer.raw(),
            e.frame_index,
            phase_name(e.phase),
            self.us(e.timestamp),
        );
    }

    fn on_snapshot(&mut self, e: &SnapshotEvent) {
        let disposition = match e.disposition {
            Disposition::Success => "ok",
            Disposition::Blocked => "BLOCKED",
        };
        let _ = writeln!(
            self.writer,
            "[snapshot] r={} output={} gen={} {disposition} scenes={} nodes={}",
            e.renderer.raw(),
            e.output.0,
            e.generation,
            e.scenes_resolved,
            e.nodes_resolved,
        );
    }

    fn on_submit(&mut self, e: &SubmitEvent) {
        let _ = writeln!(
            self.writer,
            "[submit] r={} frame={} at {:.1}µs present={:.1}µs queue={}",
            e.renderer.raw(),
            e.frame_index,
            self.us(e.submitted_at),
            self.us(e.expected_present),
            e.queue_len,
        );
    }

    fn on_frame_dropped(&mut self, e: &FrameDroppedEvent) {
        let _ = writeln!(
            self.writer,
            "[dropped] r={} frame={} replaced_by={}",
            e.renderer.raw(),
            e.dropped_frame,
            e.replaced_by,
        );
    }

    fn on_frame_drawn(&mut self, e: &FrameDrawnEvent) {
        let presented = if e.presented { "presented" } else { "not-presented" };
        let _ = writeln!(
            self.writer,
            "[drawn] r={} frame={} {presented} at {:.1}µs",
            e.renderer.raw(),
            e.frame_index,
            self.us(e.timestamp),
        );
    }

    fn on_publish(&mut self, e: &PublishEvent) {
        let outcome = match e.outcome {
            PublishOutcome::Unchanged => "unchanged",
            PublishOutcome::Applied => "applied",
            PublishOutcome::Failed => "FAILED",
        };
        match e.version {
            Some(v) => {
                let _ = writeln!(
                    self.writer,
                    "[publish] scene={} v{} {outcome}",
                    e.scene, v.0,
                );
            }
            None => {
                let _ = writeln!(self.writer, "[publish] scene={} {outcome}", e.scene);
            }
        }
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        let _ = match e {
            TeardownEvent::Scene { scene, .. } => {
                writeln!(self.writer, "[teardown] scene={scene}")
            }
            TeardownEvent::Renderer { renderer, .. } => {
                writeln!(self.writer, "[teardown] r={}", renderer.raw())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::id::{OutputId, RendererId, SceneToken};

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn phase_lines_name_the_phase() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_phase_begin(&PhaseBeginEvent {
            renderer: RendererId::from_raw(2),
            frame_index: 1,
            phase: PhaseKind::Snapshot,
            timestamp: HostTime(1_500),
        });
        let out = output(sink);
        assert!(out.contains("[phase:begin]"), "got: {out}");
        assert!(out.contains("frame=1 snapshot"), "got: {out}");
        assert!(out.contains("1.5µs"), "got: {out}");
    }

    #[test]
    fn blocked_snapshot_is_loud() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_snapshot(&SnapshotEvent {
            renderer: RendererId::from_raw(0),
            output: OutputId(3),
            generation: 5,
            disposition: Disposition::Blocked,
            scenes_resolved: 2,
            nodes_resolved: 0,
            timestamp: HostTime(0),
        });
        sink.on_teardown(&TeardownEvent::Scene {
            scene: SceneToken::from_raw(4),
            timestamp: HostTime(0),
        });
        let out = output(sink);
        assert!(out.contains("BLOCKED"), "got: {out}");
        assert!(out.contains("[teardown] scene=#4"), "got: {out}");
    }
}
