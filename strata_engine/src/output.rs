// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-renderer frame pipeline and rasterizer thread.
//!
//! Every renderer owns an [`Output`]: a short queue of painted frames shared
//! with a dedicated rasterizer thread. The queue moves each frame through
//! `Pending → Drawing → Finished`:
//!
//! ```text
//!   engine                         rasterizer thread
//!   ──────                         ─────────────────
//!   submit(frame) ──► [.., Pending]
//!        │ Draw command ──────────► begin_draw(): Pending → Drawing
//!        │                          Rasterizer::draw()   (outside the lock)
//!   on_finished_draw() ◄─ event ─── FinishedDraw
//!        Drawing → Finished, pop finished fronts
//! ```
//!
//! The queue is only empty before the first submission; afterwards the most
//! recently finished frame is retained so it can be redrawn when the
//! rasterizer comes back from a suspension. At most `pipeline_depth` frames
//! are `Drawing` and at most one is `Pending`: a newer frame replaces an
//! undrawn one in place.
//!
//! Only the queue and the `rasterizer_ready` / `draw_scheduled` / `shutdown`
//! flags are shared, under one [`parking_lot::Mutex`]; every critical section
//! is O(1) or bounded by the queue length.
//!
//! Dropping an [`Output`] never waits for the rasterizer. It raises
//! `shutdown`, which turns every draw command still in the channel into a
//! no-op, and detaches the thread. A draw already in progress finishes on its
//! own and the thread exits right after.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use strata_core::id::RendererId;
use strata_render::RenderFrame;

use crate::event::{Posted, RasterEvent};
use crate::raster::{DrawResult, Rasterizer};

/// Where a frame is in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameState {
    /// Painted, waiting for the rasterizer.
    Pending,
    /// Handed to the rasterizer.
    Drawing,
    /// Drawn; retained until a newer frame finishes.
    Finished,
}

/// Read-only view of one queued frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSlot {
    /// Frame counter of the queued frame.
    pub frame_index: u64,
    /// Its state.
    pub state: FrameState,
}

#[derive(Debug)]
struct QueuedFrame {
    frame: Arc<RenderFrame>,
    state: FrameState,
}

/// Result of [`PipelineState::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SubmitOutcome {
    /// Index of the undrawn frame that was replaced, if any.
    pub(crate) dropped: Option<u64>,
    /// Queue length after the submit.
    pub(crate) queue_len: usize,
}

#[derive(Debug, Default)]
struct PipelineState {
    frames: VecDeque<QueuedFrame>,
    rasterizer_ready: bool,
    draw_scheduled: bool,
    shutdown: bool,
}

impl PipelineState {
    fn submit(&mut self, frame: Arc<RenderFrame>) -> SubmitOutcome {
        let mut dropped = None;
        let queued = QueuedFrame {
            frame,
            state: FrameState::Pending,
        };
        match self.frames.back_mut() {
            Some(tail) if tail.state != FrameState::Drawing => {
                if tail.state == FrameState::Pending {
                    dropped = Some(tail.frame.frame_index());
                }
                *tail = queued;
            }
            _ => self.frames.push_back(queued),
        }
        SubmitOutcome {
            dropped,
            queue_len: self.frames.len(),
        }
    }

    fn drawing(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.state == FrameState::Drawing)
            .count()
    }

    fn wants_draw(&self, depth: usize) -> bool {
        !self.shutdown
            && self.rasterizer_ready
            && !self.draw_scheduled
            && self.drawing() < depth
            && self.frames.iter().any(|f| f.state == FrameState::Pending)
    }

    /// Claims the oldest pending frame for drawing. Nothing is claimed once
    /// the output is shutting down.
    fn begin_draw(&mut self) -> Option<Arc<RenderFrame>> {
        self.draw_scheduled = false;
        if self.shutdown {
            return None;
        }
        let slot = self
            .frames
            .iter_mut()
            .find(|f| f.state == FrameState::Pending)?;
        slot.state = FrameState::Drawing;
        Some(Arc::clone(&slot.frame))
    }

    fn finish_draw(&mut self, frame_index: u64) -> bool {
        let Some(slot) = self
            .frames
            .iter_mut()
            .find(|f| f.state == FrameState::Drawing && f.frame.frame_index() == frame_index)
        else {
            return false;
        };
        slot.state = FrameState::Finished;
        while self.frames.len() > 1
            && self
                .frames
                .front()
                .is_some_and(|f| f.state == FrameState::Finished)
        {
            self.frames.pop_front();
        }
        true
    }

    /// Returns drawing frames to the queue. A drawing frame followed by a
    /// newer one is superseded and discarded.
    fn suspend(&mut self) {
        self.rasterizer_ready = false;
        self.draw_scheduled = false;
        let last = self.frames.len().saturating_sub(1);
        let mut i = 0;
        self.frames.retain(|f| {
            let keep = f.state != FrameState::Drawing || i == last;
            i += 1;
            keep
        });
        if let Some(tail) = self.frames.back_mut()
            && tail.state == FrameState::Drawing
        {
            tail.state = FrameState::Pending;
        }
    }

    fn ready(&mut self) {
        self.rasterizer_ready = true;
        if let Some(tail) = self.frames.back_mut()
            && tail.state == FrameState::Finished
        {
            tail.state = FrameState::Pending;
        }
    }

    fn slots(&self) -> Vec<FrameSlot> {
        self.frames
            .iter()
            .map(|f| FrameSlot {
                frame_index: f.frame.frame_index(),
                state: f.state,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
enum Command {
    Initialize,
    Draw,
    Shutdown,
}

/// A renderer's frame pipeline plus the thread that rasterizes it.
pub(crate) struct Output {
    renderer: RendererId,
    depth: usize,
    shared: Arc<Mutex<PipelineState>>,
    commands: Sender<Command>,
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("renderer", &self.renderer)
            .field("depth", &self.depth)
            .field("frames", &self.shared.lock().frames.len())
            .finish_non_exhaustive()
    }
}

impl Output {
    /// Starts the rasterizer thread and asks it to initialize.
    pub(crate) fn spawn(
        renderer: RendererId,
        label: &str,
        pipeline_depth: u8,
        rasterizer: impl Rasterizer,
        events: Sender<Posted>,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Mutex::new(PipelineState::default()));
        let (commands, rx) = unbounded();
        let thread_shared = Arc::clone(&shared);
        // Detached: teardown must not wait on a draw in progress.
        thread::Builder::new()
            .name(format!("strata-raster-{label}"))
            .spawn(move || raster_loop(renderer, rasterizer, &thread_shared, &rx, &events))?;
        let _ = commands.send(Command::Initialize);
        Ok(Self {
            renderer,
            depth: usize::from(pipeline_depth.max(1)),
            shared,
            commands,
        })
    }

    /// Queues a painted frame and kicks the rasterizer if it has capacity.
    pub(crate) fn submit(&self, frame: RenderFrame) -> SubmitOutcome {
        let mut state = self.shared.lock();
        let outcome = state.submit(Arc::new(frame));
        self.schedule_draw(&mut state);
        outcome
    }

    /// The rasterizer initialized: redraw the retained frame, if any.
    pub(crate) fn on_ready(&self) {
        let mut state = self.shared.lock();
        state.ready();
        self.schedule_draw(&mut state);
    }

    pub(crate) fn on_suspended(&self) {
        self.shared.lock().suspend();
    }

    /// Returns `false` if no drawing frame had that index.
    pub(crate) fn on_finished_draw(&self, frame_index: u64) -> bool {
        let mut state = self.shared.lock();
        let found = state.finish_draw(frame_index);
        self.schedule_draw(&mut state);
        found
    }

    /// Asks a suspended rasterizer to initialize again.
    pub(crate) fn resume(&self) {
        let _ = self.commands.send(Command::Initialize);
    }

    pub(crate) fn slots(&self) -> Vec<FrameSlot> {
        self.shared.lock().slots()
    }

    fn schedule_draw(&self, state: &mut PipelineState) {
        if state.wants_draw(self.depth) {
            state.draw_scheduled = true;
            tracing::trace!(renderer = %self.renderer, "draw scheduled");
            let _ = self.commands.send(Command::Draw);
        }
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        let _ = self.commands.send(Command::Shutdown);
        tracing::trace!(renderer = %self.renderer, "rasterizer thread detached");
    }
}

fn raster_loop(
    renderer: RendererId,
    mut rasterizer: impl Rasterizer,
    shared: &Mutex<PipelineState>,
    commands: &Receiver<Command>,
    events: &Sender<Posted>,
) {
    let post = |event| {
        let _ = events.send(Posted { renderer, event });
    };
    for command in commands {
        if shared.lock().shutdown {
            break;
        }
        match command {
            Command::Initialize => match rasterizer.initialize() {
                Ok(timing) => post(RasterEvent::Ready(timing)),
                Err(e) => post(RasterEvent::Error(e)),
            },
            Command::Draw => {
                let Some(frame) = shared.lock().begin_draw() else {
                    continue;
                };
                let frame_index = frame.frame_index();
                let event = match rasterizer.draw(&frame) {
                    Ok(DrawResult::Presented) => RasterEvent::FinishedDraw {
                        frame_index,
                        presented: true,
                    },
                    Ok(DrawResult::NotPresented) => RasterEvent::FinishedDraw {
                        frame_index,
                        presented: false,
                    },
                    Ok(DrawResult::Suspended) => RasterEvent::Suspended,
                    Err(e) => RasterEvent::Error(e),
                };
                post(event);
            }
            Command::Shutdown => break,
        }
    }
    tracing::trace!(renderer = %renderer, "rasterizer thread exiting");
}
