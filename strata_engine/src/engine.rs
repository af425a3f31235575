// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine façade: scene and renderer lifecycle plus the frame loop.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration as StdDuration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use kurbo::{Point, Rect, Vec2};
use strata_core::dirty::{CONTENT, FRAME, InvalidationTracker};
use strata_core::dispatch::{FrameDispatcher, FrameInfo};
use strata_core::id::{
    OutputId, RendererId, SceneToken, SceneVersion, TokenAllocator, VersionRequest,
};
use strata_core::registry::Registry;
use strata_core::resolve::BlockLog;
use strata_core::scene::{ApplyDisposition, SceneUpdate, apply_publish};
use strata_core::snapshot::HitTestResult;
use strata_core::time::HostTime;
use strata_core::trace::{
    FrameDrawnEvent, FrameDroppedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, PublishEvent,
    PublishOutcome, SnapshotEvent, SubmitEvent, TeardownEvent, TraceSink, Tracer,
};
use strata_core::vsync::{FrameMode, ScheduledFrame, VsyncScheduler};
use strata_render::paint;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::{Posted, RasterEvent};
use crate::output::{FrameSlot, Output};
use crate::raster::Rasterizer;
use crate::renderer::{RendererState, RendererStatus, RootBinding};
use crate::scene::{ConnectionId, SceneListener, SceneState};
use crate::timer::TimerQueue;

/// What a next-frame callback is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameTarget {
    /// Fires with the next frame of any renderer showing the scene.
    Scene(SceneToken),
    /// Fires with the renderer's next frame.
    Renderer(RendererId),
}

impl From<SceneToken> for FrameTarget {
    fn from(scene: SceneToken) -> Self {
        Self::Scene(scene)
    }
}

impl From<RendererId> for FrameTarget {
    fn from(renderer: RendererId) -> Self {
        Self::Renderer(renderer)
    }
}

#[derive(Clone, Copy, Debug)]
enum Timer {
    Publish(SceneToken),
    Update { renderer: RendererId, ticket: u64 },
    Snapshot { renderer: RendererId, ticket: u64 },
}

impl Timer {
    fn renderer(&self) -> Option<RendererId> {
        match self {
            Self::Publish(_) => None,
            Self::Update { renderer, .. } | Self::Snapshot { renderer, .. } => Some(*renderer),
        }
    }
}

fn tracer(sink: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match sink {
        Some(s) => Tracer::new(s.as_mut()),
        None => Tracer::none(),
    }
}

/// Owns every scene and renderer and drives their frames.
///
/// The engine is single-threaded: all methods run on the caller's
/// scheduling context. Rasterizer threads never touch engine state; they
/// post events that [`poll`](Self::poll) and [`wait`](Self::wait) apply.
///
/// # Frame loop
///
/// Each renderer runs a [`VsyncScheduler`]. When a frame is requested the
/// engine arms timers for its phases:
///
/// - **update**: the renderer's next-frame callbacks run, then those of
///   every scene its last snapshot depended on.
/// - **snapshot**: the root scene is resolved, painted and submitted to the
///   renderer's pipeline. A blocked snapshot leaves the previous frame on
///   screen.
///
/// Frames are requested when a scene the renderer depends on publishes or is
/// destroyed (snapshot only), when a next-frame callback is registered
/// (update and snapshot), and when the root scene is bound.
pub struct Engine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    tokens: TokenAllocator,
    next_connection: u32,
    registry: Registry,
    block_log: BlockLog,
    scenes: BTreeMap<SceneToken, SceneState>,
    renderers: BTreeMap<RendererId, RendererState>,
    invalidation: InvalidationTracker,
    timers: TimerQueue<Timer>,
    events_tx: Sender<Posted>,
    events: Receiver<Posted>,
    trace_sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("scenes", &self.scenes.len())
            .field("renderers", &self.renderers.len())
            .field("generation", &self.registry.generation())
            .field("timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine reading time from `clock`.
    #[must_use]
    pub fn new(config: EngineConfig, clock: impl Clock + 'static) -> Self {
        let (events_tx, events) = unbounded();
        Self {
            config,
            clock: Box::new(clock),
            tokens: TokenAllocator::new(),
            next_connection: 0,
            registry: Registry::new(),
            block_log: BlockLog::new(),
            scenes: BTreeMap::new(),
            renderers: BTreeMap::new(),
            invalidation: InvalidationTracker::new(),
            timers: TimerQueue::new(),
            events_tx,
            events,
            trace_sink: None,
        }
    }

    /// Creates an engine on the monotonic system clock.
    #[must_use]
    pub fn with_system_clock(config: EngineConfig) -> Self {
        Self::new(config, SystemClock::new())
    }

    /// Installs a sink for frame-loop trace events.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace_sink = Some(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace_sink.take()
    }

    /// The configuration the engine was created with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current host time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.clock.now()
    }

    // ---------------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------------

    /// Opens a new client connection.
    pub fn connect(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        id
    }

    /// Destroys every scene and renderer created under `connection`.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        let scenes: Vec<_> = self
            .scenes
            .iter()
            .filter(|(_, s)| s.connection == connection)
            .map(|(t, _)| *t)
            .collect();
        let renderers: Vec<_> = self
            .renderers
            .iter()
            .filter(|(_, r)| r.connection == connection)
            .map(|(id, _)| *id)
            .collect();
        tracing::debug!(
            ?connection,
            scenes = scenes.len(),
            renderers = renderers.len(),
            "disconnecting"
        );
        for scene in scenes {
            self.destroy_scene_inner(scene);
        }
        for renderer in renderers {
            self.destroy_renderer_inner(renderer);
        }
    }

    // ---------------------------------------------------------------------
    // Scenes
    // ---------------------------------------------------------------------

    /// Creates an empty scene owned by `connection`.
    ///
    /// # Panics
    ///
    /// Panics if the token namespace is exhausted.
    pub fn create_scene(
        &mut self,
        connection: ConnectionId,
        label: impl Into<String>,
        listener: impl SceneListener + 'static,
    ) -> SceneToken {
        let token = self.tokens.scene();
        let label = label.into();
        tracing::debug!(scene = %token, %label, "scene created");
        self.registry.add_scene(token, label);
        self.scenes
            .insert(token, SceneState::new(connection, Box::new(listener)));
        token
    }

    /// Queues a mutation for the scene's next publish.
    pub fn update(&mut self, scene: SceneToken, mutation: SceneUpdate) -> EngineResult<()> {
        self.scene_mut(scene)?.log.enqueue(mutation);
        Ok(())
    }

    /// Seals the queued mutations into a publish taking effect at
    /// `presentation_time`.
    ///
    /// Publishes apply in the order they were made. One whose time has
    /// already elapsed applies before this call returns, unless it is
    /// waiting behind an earlier publish. A publish that fails validation
    /// destroys the scene.
    pub fn publish(&mut self, scene: SceneToken, presentation_time: HostTime) -> EngineResult<()> {
        self.scene_mut(scene)?.log.publish(presentation_time);
        self.apply_due_publishes(scene);
        Ok(())
    }

    /// Destroys a scene, notifying its listener and the listeners of scenes
    /// that reference it.
    pub fn destroy_scene(&mut self, scene: SceneToken) -> EngineResult<()> {
        if !self.scenes.contains_key(&scene) {
            return Err(EngineError::UnknownScene(scene));
        }
        self.destroy_scene_inner(scene);
        Ok(())
    }

    /// Latest applied version of a scene, `None` before the first publish.
    pub fn scene_version(&self, scene: SceneToken) -> EngineResult<Option<SceneVersion>> {
        self.scenes
            .get(&scene)
            .map(|s| s.version)
            .ok_or(EngineError::UnknownScene(scene))
    }

    fn scene_mut(&mut self, scene: SceneToken) -> EngineResult<&mut SceneState> {
        self.scenes
            .get_mut(&scene)
            .ok_or(EngineError::UnknownScene(scene))
    }

    fn apply_due_publishes(&mut self, scene: SceneToken) {
        let now = self.clock.now();
        loop {
            let Some(state) = self.scenes.get_mut(&scene) else {
                return;
            };
            let Some(pending) = state.log.pop_due(now) else {
                break;
            };
            let previous = self.registry.latest(scene).cloned();
            match apply_publish(scene, previous.as_deref(), pending.updates) {
                ApplyDisposition::Unchanged => {
                    tracing::trace!(scene = %scene, "empty publish");
                    tracer(&mut self.trace_sink).publish(&PublishEvent {
                        scene,
                        version: None,
                        outcome: PublishOutcome::Unchanged,
                        timestamp: now,
                    });
                }
                ApplyDisposition::Succeeded(content) => {
                    let version = content.version();
                    state.version = Some(version);
                    self.registry.present(content);
                    tracing::debug!(scene = %scene, %version, "publish applied");
                    tracer(&mut self.trace_sink).publish(&PublishEvent {
                        scene,
                        version: Some(version),
                        outcome: PublishOutcome::Applied,
                        timestamp: now,
                    });
                    self.invalidate(scene);
                }
                ApplyDisposition::Failed(error) => {
                    tracing::warn!(scene = %scene, %error, "publish rejected, destroying scene");
                    tracer(&mut self.trace_sink).publish(&PublishEvent {
                        scene,
                        version: None,
                        outcome: PublishOutcome::Failed,
                        timestamp: now,
                    });
                    self.destroy_scene_inner(scene);
                    return;
                }
            }
        }
        self.arm_publish_timer(scene);
    }

    fn arm_publish_timer(&mut self, scene: SceneToken) {
        let Some(state) = self.scenes.get_mut(&scene) else {
            return;
        };
        let Some(next) = state.log.next_due() else {
            return;
        };
        if state.publish_timer.is_some_and(|armed| armed <= next) {
            return;
        }
        state.publish_timer = Some(next);
        self.timers.schedule(next, Timer::Publish(scene));
    }

    /// Requests a snapshot from every renderer depending on `scene`.
    fn invalidate(&mut self, scene: SceneToken) {
        let affected = self.invalidation.invalidate(scene, CONTENT);
        if !affected.is_empty() {
            tracing::debug!(scene = %scene, renderers = affected.len(), "invalidated");
        }
        for renderer in affected {
            self.request_frame(renderer, FrameMode::Snapshot);
        }
    }

    fn destroy_scene_inner(&mut self, scene: SceneToken) {
        let Some(mut state) = self.scenes.remove(&scene) else {
            return;
        };
        state.log.clear();
        state.dispatcher.clear();

        for (token, other) in &mut self.scenes {
            if let Some(content) = self.registry.latest(*token) {
                for resource in content.resources_for_scene(scene) {
                    other.listener.on_resource_unavailable(*token, resource);
                }
            }
        }
        state.listener.on_scene_destroyed(scene);

        self.invalidate(scene);
        self.registry.remove_scene(scene);
        self.invalidation.remove_scene(scene);
        tracing::debug!(scene = %scene, "scene destroyed");
        tracer(&mut self.trace_sink).teardown(&TeardownEvent::Scene {
            scene,
            timestamp: self.clock.now(),
        });
    }

    // ---------------------------------------------------------------------
    // Renderers
    // ---------------------------------------------------------------------

    /// Creates a renderer presenting to `output` and starts its rasterizer
    /// thread. The renderer draws nothing until a root scene is bound.
    ///
    /// # Panics
    ///
    /// Panics if the token namespace is exhausted.
    pub fn create_renderer(
        &mut self,
        connection: ConnectionId,
        output: OutputId,
        label: impl Into<String>,
        rasterizer: impl Rasterizer,
    ) -> EngineResult<RendererId> {
        let id = self.tokens.renderer();
        let label = label.into();
        let pipeline = Output::spawn(
            id,
            &label,
            self.config.effective_depth(),
            rasterizer,
            self.events_tx.clone(),
        )?;
        tracing::debug!(renderer = %id, %label, ?output, "renderer created");
        self.renderers.insert(
            id,
            RendererState {
                label,
                connection,
                output_id: output,
                root: None,
                output: pipeline,
                dispatcher: FrameDispatcher::new(),
                vsync: VsyncScheduler::new(),
                visible: None,
            },
        );
        Ok(id)
    }

    /// Binds `scene` as the renderer's root and requests a frame.
    ///
    /// An invalid viewport or an unknown scene destroys the renderer.
    pub fn set_root_scene(
        &mut self,
        renderer: RendererId,
        scene: SceneToken,
        version: VersionRequest,
        viewport: Rect,
    ) -> EngineResult<()> {
        if !self.renderers.contains_key(&renderer) {
            return Err(EngineError::UnknownRenderer(renderer));
        }
        let max = self.config.max_viewport;
        let limit = f64::from(max);
        let valid = viewport.is_finite()
            && viewport.width() > 0.0
            && viewport.height() > 0.0
            && viewport.width() < limit
            && viewport.height() < limit;
        let error = if !valid {
            Some(EngineError::InvalidViewport {
                width: viewport.width(),
                height: viewport.height(),
                max,
            })
        } else if !self.scenes.contains_key(&scene) {
            Some(EngineError::MissingRootScene(scene))
        } else {
            None
        };
        if let Some(error) = error {
            tracing::warn!(renderer = %renderer, %error, "destroying renderer");
            self.destroy_renderer_inner(renderer);
            return Err(error);
        }

        if let Some(state) = self.renderers.get_mut(&renderer) {
            state.root = Some(RootBinding {
                scene,
                version,
                viewport,
            });
            state.visible = None;
        }
        self.invalidation
            .set_dependencies(renderer, &BTreeSet::from([scene]));
        self.request_frame(renderer, FrameMode::Snapshot);
        Ok(())
    }

    /// Unbinds the renderer's root scene. The last drawn frame stays on the
    /// output.
    pub fn clear_root_scene(&mut self, renderer: RendererId) -> EngineResult<()> {
        let state = self.renderer_mut(renderer)?;
        state.root = None;
        state.visible = None;
        self.invalidation
            .set_dependencies(renderer, &BTreeSet::new());
        Ok(())
    }

    /// Destroys a renderer.
    ///
    /// Returns without waiting for the rasterizer: a draw in progress runs to
    /// completion on its own thread and nothing queued after it is drawn.
    pub fn destroy_renderer(&mut self, renderer: RendererId) -> EngineResult<()> {
        if !self.renderers.contains_key(&renderer) {
            return Err(EngineError::UnknownRenderer(renderer));
        }
        self.destroy_renderer_inner(renderer);
        Ok(())
    }

    /// Asks a suspended renderer's rasterizer to initialize again.
    pub fn resume_renderer(&mut self, renderer: RendererId) -> EngineResult<()> {
        self.renderer_mut(renderer)?.output.resume();
        Ok(())
    }

    /// Lifecycle state of a renderer.
    #[must_use]
    pub fn renderer_status(&self, renderer: RendererId) -> RendererStatus {
        self.renderers
            .get(&renderer)
            .map_or(RendererStatus::Destroyed, RendererState::status)
    }

    /// The frames currently queued in the renderer's pipeline, oldest first.
    pub fn pipeline_snapshot(&self, renderer: RendererId) -> EngineResult<Vec<FrameSlot>> {
        self.renderers
            .get(&renderer)
            .map(|r| r.output.slots())
            .ok_or(EngineError::UnknownRenderer(renderer))
    }

    /// The frame the renderer's scheduler is waiting to run, if any.
    pub fn scheduled_frame(&self, renderer: RendererId) -> EngineResult<Option<ScheduledFrame>> {
        self.renderers
            .get(&renderer)
            .map(|r| r.vsync.pending())
            .ok_or(EngineError::UnknownRenderer(renderer))
    }

    /// Finds the nodes under `point` (in output coordinates) in the
    /// renderer's most recent successful snapshot, front-most first.
    ///
    /// Returns an empty result when nothing has been resolved yet.
    pub fn hit_test(&self, renderer: RendererId, point: Point) -> EngineResult<HitTestResult> {
        let state = self
            .renderers
            .get(&renderer)
            .ok_or(EngineError::UnknownRenderer(renderer))?;
        let Some(snapshot) = &state.visible else {
            return Ok(HitTestResult::default());
        };
        let shift = state
            .root
            .map_or(Vec2::ZERO, |b| b.viewport.origin().to_vec2());
        Ok(snapshot.hit_test(point + shift))
    }

    fn renderer_mut(&mut self, renderer: RendererId) -> EngineResult<&mut RendererState> {
        self.renderers
            .get_mut(&renderer)
            .ok_or(EngineError::UnknownRenderer(renderer))
    }

    fn destroy_renderer_inner(&mut self, renderer: RendererId) {
        let Some(state) = self.renderers.remove(&renderer) else {
            return;
        };
        self.invalidation.remove_renderer(renderer);
        self.timers.retain(|t| t.renderer() != Some(renderer));
        tracing::debug!(renderer = %renderer, label = %state.label, "renderer destroyed");
        drop(state);
        tracer(&mut self.trace_sink).teardown(&TeardownEvent::Renderer {
            renderer,
            timestamp: self.clock.now(),
        });
    }

    // ---------------------------------------------------------------------
    // Frame callbacks
    // ---------------------------------------------------------------------

    /// Registers a callback for the next frame of `target`.
    ///
    /// The first pending callback of a scene requests an update frame from
    /// every renderer whose current snapshot depends on the scene; the first
    /// pending callback of a renderer requests one from that renderer.
    pub fn schedule_frame(
        &mut self,
        target: impl Into<FrameTarget>,
        callback: impl FnOnce(&FrameInfo) + 'static,
    ) -> EngineResult<()> {
        match target.into() {
            FrameTarget::Scene(scene) => {
                if self.scene_mut(scene)?.dispatcher.add_callback(Box::new(callback)) {
                    for renderer in self.invalidation.invalidate(scene, FRAME) {
                        self.request_frame(renderer, FrameMode::UpdateAndSnapshot);
                    }
                }
            }
            FrameTarget::Renderer(renderer) => {
                if self
                    .renderer_mut(renderer)?
                    .dispatcher
                    .add_callback(Box::new(callback))
                {
                    self.request_frame(renderer, FrameMode::UpdateAndSnapshot);
                }
            }
        }
        Ok(())
    }

    fn request_frame(&mut self, renderer: RendererId, mode: FrameMode) {
        let now = self.clock.now();
        let Some(state) = self.renderers.get_mut(&renderer) else {
            return;
        };
        let armed = state.vsync.pending().map(|f| f.ticket);
        if let Some(frame) = state.vsync.schedule_frame(mode, now) {
            if armed == Some(frame.ticket) {
                self.arm_upgrade(renderer, &frame);
            } else {
                self.arm_frame(renderer, &frame);
            }
        }
    }

    /// A pending snapshot-only frame gained an update phase. Its snapshot
    /// timer is already armed.
    fn arm_upgrade(&mut self, renderer: RendererId, frame: &ScheduledFrame) {
        tracing::trace!(renderer = %renderer, ticket = frame.ticket, "frame upgraded");
        if let Some(at) = frame.update_time {
            self.timers.schedule(
                at,
                Timer::Update {
                    renderer,
                    ticket: frame.ticket,
                },
            );
        }
    }

    fn arm_frame(&mut self, renderer: RendererId, frame: &ScheduledFrame) {
        tracing::trace!(
            renderer = %renderer,
            ticket = frame.ticket,
            mode = ?frame.mode,
            vsync = ?frame.vsync_time,
            "frame scheduled"
        );
        if let Some(at) = frame.update_time {
            self.timers.schedule(
                at,
                Timer::Update {
                    renderer,
                    ticket: frame.ticket,
                },
            );
        }
        self.timers.schedule(
            frame.snapshot_time,
            Timer::Snapshot {
                renderer,
                ticket: frame.ticket,
            },
        );
    }

    fn run_update(&mut self, renderer: RendererId, ticket: u64) {
        let now = self.clock.now();
        let Some(state) = self.renderers.get_mut(&renderer) else {
            return;
        };
        let Some(info) = state.vsync.take_update(ticket, now) else {
            return;
        };
        tracer(&mut self.trace_sink).phase_begin(&PhaseBeginEvent {
            renderer,
            frame_index: info.frame_index,
            phase: PhaseKind::Update,
            timestamp: now,
        });
        state.dispatcher.dispatch(&info);
        let scenes: Vec<SceneToken> = match self.invalidation.dependencies(renderer) {
            Some(deps) => deps.iter().copied().collect(),
            None => state.root.map(|b| b.scene).into_iter().collect(),
        };
        for scene in scenes {
            if let Some(s) = self.scenes.get_mut(&scene) {
                s.dispatcher.dispatch(&info);
            }
        }
        tracer(&mut self.trace_sink).phase_end(&PhaseEndEvent {
            renderer,
            frame_index: info.frame_index,
            phase: PhaseKind::Update,
            timestamp: self.clock.now(),
        });
    }

    fn run_snapshot(&mut self, renderer: RendererId, ticket: u64) {
        let now = self.clock.now();
        let Some(state) = self.renderers.get_mut(&renderer) else {
            return;
        };
        let Some(info) = state.vsync.take_snapshot(ticket, now) else {
            return;
        };
        let deferred = state.vsync.take_deferred();

        if let Some(binding) = state.root {
            let frame_index = info.frame_index;
            tracer(&mut self.trace_sink).phase_begin(&PhaseBeginEvent {
                renderer,
                frame_index,
                phase: PhaseKind::Snapshot,
                timestamp: now,
            });
            let snapshot =
                self.registry
                    .snapshot_scene(binding.scene, binding.version, &mut self.block_log);
            self.invalidation
                .set_dependencies(renderer, snapshot.dependencies());
            let stats = snapshot.stats();
            let resolved_at = self.clock.now();
            let mut t = tracer(&mut self.trace_sink);
            t.snapshot(&SnapshotEvent {
                renderer,
                output: state.output_id,
                generation: snapshot.generation(),
                disposition: snapshot.disposition(),
                scenes_resolved: stats.scenes_resolved,
                nodes_resolved: stats.nodes_resolved,
                timestamp: resolved_at,
            });
            t.phase_end(&PhaseEndEvent {
                renderer,
                frame_index,
                phase: PhaseKind::Snapshot,
                timestamp: resolved_at,
            });

            if snapshot.is_blocked() {
                tracing::debug!(
                    renderer = %renderer,
                    generation = snapshot.generation(),
                    "snapshot blocked, keeping previous frame"
                );
            } else {
                t.phase_begin(&PhaseBeginEvent {
                    renderer,
                    frame_index,
                    phase: PhaseKind::Paint,
                    timestamp: resolved_at,
                });
                let frame = paint(&snapshot, renderer, state.output_id, binding.viewport, info);
                let painted_at = self.clock.now();
                t.phase_end(&PhaseEndEvent {
                    renderer,
                    frame_index,
                    phase: PhaseKind::Paint,
                    timestamp: painted_at,
                });

                t.phase_begin(&PhaseBeginEvent {
                    renderer,
                    frame_index,
                    phase: PhaseKind::Submit,
                    timestamp: painted_at,
                });
                let outcome = state.output.submit(frame);
                if let Some(dropped) = outcome.dropped {
                    tracing::debug!(
                        renderer = %renderer,
                        dropped,
                        replaced_by = frame_index,
                        "undrawn frame replaced"
                    );
                    t.frame_dropped(&FrameDroppedEvent {
                        renderer,
                        dropped_frame: dropped,
                        replaced_by: frame_index,
                        timestamp: painted_at,
                    });
                }
                t.submit(&SubmitEvent {
                    renderer,
                    frame_index,
                    submitted_at: painted_at,
                    expected_present: info.presentation_time,
                    queue_len: outcome.queue_len,
                });
                t.phase_end(&PhaseEndEvent {
                    renderer,
                    frame_index,
                    phase: PhaseKind::Submit,
                    timestamp: self.clock.now(),
                });
                state.visible = Some(snapshot);
            }
        }

        if let Some(mode) = deferred {
            self.request_frame(renderer, mode);
        }
    }

    // ---------------------------------------------------------------------
    // Event pump
    // ---------------------------------------------------------------------

    /// Applies posted rasterizer events, then fires every due timer.
    ///
    /// Returns the number of events and timers handled. The
    /// [`block_log`](Self::block_log) is reset at the start of every poll.
    pub fn poll(&mut self) -> usize {
        self.block_log.clear();
        let mut handled = 0;
        while let Ok(posted) = self.events.try_recv() {
            self.handle_event(posted);
            handled += 1;
        }
        let now = self.clock.now();
        while let Some((at, timer)) = self.timers.pop_due(now) {
            tracing::trace!(?timer, ?at, "timer fired");
            self.fire(at, timer);
            handled += 1;
        }
        handled
    }

    /// Earliest armed timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.timers.next_deadline()
    }

    /// Blocks until a rasterizer event arrives, the next timer is due, or
    /// `timeout` elapses, then [`poll`](Self::poll)s.
    pub fn wait(&mut self, timeout: StdDuration) -> usize {
        let mut timeout = timeout;
        if let Some(deadline) = self.next_deadline() {
            let ticks = deadline.saturating_duration_since(self.clock.now()).ticks();
            let nanos = self.clock.timebase().ticks_to_nanos(ticks);
            timeout = timeout.min(StdDuration::from_nanos(nanos));
        }
        let mut handled = 0;
        if let Ok(posted) = self.events.recv_timeout(timeout) {
            self.handle_event(posted);
            handled += 1;
        }
        handled + self.poll()
    }

    /// Block reasons recorded by snapshot passes since the last
    /// [`poll`](Self::poll) began.
    #[must_use]
    pub fn block_log(&self) -> &BlockLog {
        &self.block_log
    }

    /// The scene registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn fire(&mut self, at: HostTime, timer: Timer) {
        match timer {
            Timer::Publish(scene) => {
                if let Some(state) = self.scenes.get_mut(&scene)
                    && state.publish_timer == Some(at)
                {
                    state.publish_timer = None;
                }
                self.apply_due_publishes(scene);
            }
            Timer::Update { renderer, ticket } => self.run_update(renderer, ticket),
            Timer::Snapshot { renderer, ticket } => self.run_snapshot(renderer, ticket),
        }
    }

    fn handle_event(&mut self, posted: Posted) {
        let Posted { renderer, event } = posted;
        let now = self.clock.now();
        let Some(state) = self.renderers.get_mut(&renderer) else {
            tracing::trace!(renderer = %renderer, "event for unknown renderer ignored");
            return;
        };
        match event {
            RasterEvent::Ready(timing) => {
                if timing.interval.ticks() == 0 {
                    tracing::warn!(renderer = %renderer, "rasterizer reported a zero vsync interval");
                    self.destroy_renderer_inner(renderer);
                    return;
                }
                tracing::debug!(renderer = %renderer, interval = ?timing.interval, "rasterizer ready");
                let phases = self.config.phases(timing.interval);
                let frame = state.vsync.start(timing, phases, now);
                state.output.on_ready();
                if let Some(frame) = frame {
                    self.arm_frame(renderer, &frame);
                }
            }
            RasterEvent::Suspended => {
                tracing::debug!(renderer = %renderer, "rasterizer suspended");
                state.vsync.stop();
                state.output.on_suspended();
            }
            RasterEvent::FinishedDraw {
                frame_index,
                presented,
            } => {
                if !state.output.on_finished_draw(frame_index) {
                    tracing::trace!(renderer = %renderer, frame_index, "stale draw report");
                }
                tracer(&mut self.trace_sink).frame_drawn(&FrameDrawnEvent {
                    renderer,
                    frame_index,
                    presented,
                    timestamp: now,
                });
            }
            RasterEvent::Error(source) => {
                let error = EngineError::Raster { renderer, source };
                tracing::warn!(
                    renderer = %renderer,
                    error = &error as &(dyn std::error::Error + 'static),
                    "destroying renderer"
                );
                self.destroy_renderer_inner(renderer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_core::time::Duration;
    use strata_core::vsync::VsyncTiming;
    use strata_render::RenderFrame;

    use super::*;
    use crate::clock::ManualClock;
    use crate::error::RasterError;
    use crate::raster::DrawResult;
    use crate::scene::NoopListener;

    struct Immediate;

    impl Rasterizer for Immediate {
        fn initialize(&mut self) -> Result<VsyncTiming, RasterError> {
            Ok(VsyncTiming {
                timebase: HostTime(0),
                interval: Duration(1_000),
            })
        }

        fn draw(&mut self, _: &RenderFrame) -> Result<DrawResult, RasterError> {
            Ok(DrawResult::Presented)
        }
    }

    #[test]
    fn upgrading_a_pending_frame_arms_only_its_update() {
        let mut engine = Engine::new(EngineConfig::default(), ManualClock::new(HostTime(10_000)));
        let conn = engine.connect();
        let s = engine.create_scene(conn, "s", NoopListener);
        let r = engine
            .create_renderer(conn, OutputId(1), "r", Immediate)
            .expect("spawn rasterizer");
        engine
            .set_root_scene(r, s, VersionRequest::Latest, Rect::new(0.0, 0.0, 64.0, 64.0))
            .expect("bind root");
        for _ in 0..500 {
            if engine.scheduled_frame(r).is_ok_and(|f| f.is_some()) {
                break;
            }
            engine.wait(StdDuration::from_millis(10));
        }
        let first = engine
            .scheduled_frame(r)
            .expect("renderer exists")
            .expect("frame pending");
        assert_eq!(first.mode, FrameMode::Snapshot);
        let armed = engine.timers.len();

        engine.schedule_frame(r, |_| {}).expect("renderer exists");
        let upgraded = engine
            .scheduled_frame(r)
            .expect("renderer exists")
            .expect("frame pending");
        assert_eq!(upgraded.ticket, first.ticket);
        assert_eq!(upgraded.mode, FrameMode::UpdateAndSnapshot);
        assert_eq!(engine.timers.len(), armed + 1, "one update timer, no second snapshot");
    }
}
