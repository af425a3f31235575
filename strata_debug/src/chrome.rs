// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Export of a recording to the Chrome trace JSON format.
//!
//! [`export`] turns events captured by a
//! [`RecorderSink`](super::recorder::RecorderSink) into
//! [Chrome Trace Event Format][format] JSON.
//!
//! Each renderer becomes one process row (`pid` = renderer id + 1) with its
//! frame phases as nested slices. Scene events land on process 0, one
//! thread per scene.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use strata_core::time::{HostTime, Timebase};
use strata_core::trace::TeardownEvent;

use crate::recorder::RecordedEvent;

/// Writes `events` to `writer` as one JSON array that opens in Perfetto or
/// `chrome://tracing`.
///
/// `timebase` converts host ticks to the microseconds the format expects.
pub fn export(
    events: &[RecordedEvent],
    timebase: Timebase,
    writer: &mut dyn Write,
) -> io::Result<()> {
    let out: Vec<Value> = events.iter().map(|e| to_json(e, timebase)).collect();
    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn to_json(event: &RecordedEvent, timebase: Timebase) -> Value {
    let ts = us(event.timestamp(), timebase);
    let pid = event.renderer().map_or(0, |r| u64::from(r.raw()) + 1);
    match event {
        RecordedEvent::PhaseBegin(e) => json!({
            "ph": "B",
            "name": format!("{:?}", e.phase),
            "cat": "Frame",
            "ts": ts,
            "pid": pid,
            "tid": 0,
            "args": { "frame_index": e.frame_index },
        }),
        RecordedEvent::PhaseEnd(e) => json!({
            "ph": "E",
            "name": format!("{:?}", e.phase),
            "cat": "Frame",
            "ts": ts,
            "pid": pid,
            "tid": 0,
            "args": { "frame_index": e.frame_index },
        }),
        RecordedEvent::Snapshot(e) => json!({
            "ph": "i",
            "name": "Snapshot",
            "cat": "Frame",
            "ts": ts,
            "pid": pid,
            "tid": 0,
            "s": "t",
            "args": {
                "output": e.output.0,
                "generation": e.generation,
                "disposition": format!("{:?}", e.disposition),
                "scenes": e.scenes_resolved,
                "nodes": e.nodes_resolved,
            },
        }),
        RecordedEvent::Submit(e) => json!({
            "ph": "i",
            "name": "Submit",
            "cat": "Pipeline",
            "ts": ts,
            "pid": pid,
            "tid": 0,
            "s": "t",
            "args": {
                "frame_index": e.frame_index,
                "expected_present_us": us(e.expected_present, timebase),
                "queue_len": e.queue_len,
            },
        }),
        RecordedEvent::FrameDropped(e) => json!({
            "ph": "i",
            "name": "FrameDropped",
            "cat": "Pipeline",
            "ts": ts,
            "pid": pid,
            "tid": 0,
            "s": "p",
            "args": {
                "frame_index": e.dropped_frame,
                "replaced_by": e.replaced_by,
            },
        }),
        RecordedEvent::FrameDrawn(e) => json!({
            "ph": "i",
            "name": "FrameDrawn",
            "cat": "Pipeline",
            "ts": ts,
            "pid": pid,
            "tid": 1,
            "s": "t",
            "args": {
                "frame_index": e.frame_index,
                "presented": e.presented,
            },
        }),
        RecordedEvent::Publish(e) => json!({
            "ph": "i",
            "name": "Publish",
            "cat": "Scene",
            "ts": ts,
            "pid": 0,
            "tid": e.scene.raw(),
            "s": "t",
            "args": {
                "version": e.version.map(|v| v.0),
                "outcome": format!("{:?}", e.outcome),
            },
        }),
        RecordedEvent::Teardown(TeardownEvent::Scene { scene, .. }) => json!({
            "ph": "i",
            "name": "SceneDestroyed",
            "cat": "Lifecycle",
            "ts": ts,
            "pid": 0,
            "tid": scene.raw(),
            "s": "p",
        }),
        RecordedEvent::Teardown(TeardownEvent::Renderer { .. }) => json!({
            "ph": "i",
            "name": "RendererDestroyed",
            "cat": "Lifecycle",
            "ts": ts,
            "pid": pid,
            "tid": 0,
            "s": "p",
        }),
    }
}

fn us(t: HostTime, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
}
