// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for engine integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use kurbo::Rect;
use strata_core::id::{ResourceId, SceneToken};
use strata_core::time::{Duration, HostTime};
use strata_core::vsync::VsyncTiming;
use strata_core::id::RendererId;
use strata_engine::{
    Clock, DrawResult, Engine, EngineConfig, ManualClock, RasterError, Rasterizer, SceneListener,
};
use strata_render::RenderFrame;

/// Refresh interval used by every test rasterizer.
pub const INTERVAL: Duration = Duration(1_000);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn engine(config: EngineConfig) -> (Engine, ManualClock) {
    init_tracing();
    let clock = ManualClock::new(HostTime(10_000));
    (Engine::new(config, clock.clone()), clock)
}

pub fn viewport() -> Rect {
    Rect::new(0.0, 0.0, 640.0, 480.0)
}

/// A rasterizer that reports every drawn frame index and can be held
/// inside `draw` until released.
pub struct Scripted {
    drawn: Sender<u64>,
    gate: Option<Receiver<()>>,
    suspend: Arc<AtomicBool>,
    fail_init: bool,
}

/// Test-side handles of a [`Scripted`] rasterizer.
pub struct ScriptedHandle {
    pub drawn: Receiver<u64>,
    /// Each message lets one held draw complete; dropping it releases all.
    pub gate: Option<Sender<()>>,
    /// When set, the next draw reports the surface lost instead of drawing.
    pub suspend: Arc<AtomicBool>,
}

impl Scripted {
    pub fn free() -> (Self, ScriptedHandle) {
        let (tx, rx) = unbounded();
        let suspend = Arc::new(AtomicBool::new(false));
        (
            Self {
                drawn: tx,
                gate: None,
                suspend: Arc::clone(&suspend),
                fail_init: false,
            },
            ScriptedHandle {
                drawn: rx,
                gate: None,
                suspend,
            },
        )
    }

    pub fn gated() -> (Self, ScriptedHandle) {
        let (tx, rx) = unbounded();
        let (gate_tx, gate_rx) = unbounded();
        let suspend = Arc::new(AtomicBool::new(false));
        (
            Self {
                drawn: tx,
                gate: Some(gate_rx),
                suspend: Arc::clone(&suspend),
                fail_init: false,
            },
            ScriptedHandle {
                drawn: rx,
                gate: Some(gate_tx),
                suspend,
            },
        )
    }

    pub fn broken() -> Self {
        let (tx, _) = unbounded();
        Self {
            drawn: tx,
            gate: None,
            suspend: Arc::new(AtomicBool::new(false)),
            fail_init: true,
        }
    }
}

impl Rasterizer for Scripted {
    fn initialize(&mut self) -> Result<VsyncTiming, RasterError> {
        if self.fail_init {
            return Err(RasterError::Initialize("no device".into()));
        }
        Ok(VsyncTiming {
            timebase: HostTime(0),
            interval: INTERVAL,
        })
    }

    fn draw(&mut self, frame: &RenderFrame) -> Result<DrawResult, RasterError> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        if self.suspend.swap(false, Ordering::SeqCst) {
            return Ok(DrawResult::Suspended);
        }
        let _ = self.drawn.send(frame.frame_index());
        Ok(DrawResult::Presented)
    }
}

/// Pumps the engine until `done` holds.
///
/// # Panics
///
/// Panics if it never does.
pub fn pump_until(engine: &mut Engine, mut done: impl FnMut(&Engine) -> bool) {
    for _ in 0..500 {
        if done(engine) {
            return;
        }
        engine.wait(StdDuration::from_millis(10));
    }
    assert!(done(engine), "condition not reached");
}

/// Waits for the renderer's rasterizer to come up and its first frame to be
/// scheduled.
pub fn until_scheduled(engine: &mut Engine, renderer: RendererId) {
    pump_until(engine, |e| {
        e.scheduled_frame(renderer).is_ok_and(|f| f.is_some())
    });
}

/// Advances the clock to the pending frame's snapshot phase and runs it.
///
/// # Panics
///
/// Panics if no frame is pending.
pub fn run_frame(engine: &mut Engine, clock: &ManualClock, renderer: RendererId) {
    let frame = engine
        .scheduled_frame(renderer)
        .expect("renderer exists")
        .expect("a frame is pending");
    if frame.snapshot_time > clock.now() {
        clock.set(frame.snapshot_time);
    }
    engine.poll();
}

/// What a [`Recorder`] listener heard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Heard {
    Unavailable(SceneToken, ResourceId),
    Destroyed(SceneToken),
}

/// Listener that appends to a shared log.
#[derive(Clone, Default)]
pub struct Recorder(pub Rc<RefCell<Vec<Heard>>>);

impl SceneListener for Recorder {
    fn on_resource_unavailable(&mut self, scene: SceneToken, resource: ResourceId) {
        self.0.borrow_mut().push(Heard::Unavailable(scene, resource));
    }

    fn on_scene_destroyed(&mut self, scene: SceneToken) {
        self.0.borrow_mut().push(Heard::Destroyed(scene));
    }
}
