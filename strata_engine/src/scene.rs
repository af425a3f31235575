// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-scene engine state and the client listener contract.

use std::fmt;

use strata_core::dispatch::FrameDispatcher;
use strata_core::id::{ResourceId, SceneToken, SceneVersion};
use strata_core::scene::UpdateLog;
use strata_core::time::HostTime;

/// Groups the scenes and renderers one client created, so they can be torn
/// down together by [`Engine::disconnect`](crate::Engine::disconnect).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub(crate) u32);

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Notifications delivered to the client owning a scene.
///
/// Delivery is best effort and happens on the scheduling context.
pub trait SceneListener {
    /// A resource of `scene` points at a scene that no longer exists.
    fn on_resource_unavailable(&mut self, scene: SceneToken, resource: ResourceId) {
        _ = (scene, resource);
    }

    /// `scene` itself was destroyed.
    fn on_scene_destroyed(&mut self, scene: SceneToken) {
        _ = scene;
    }
}

/// Listener that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl SceneListener for NoopListener {}

pub(crate) struct SceneState {
    pub(crate) connection: ConnectionId,
    pub(crate) listener: Box<dyn SceneListener>,
    pub(crate) log: UpdateLog,
    pub(crate) dispatcher: FrameDispatcher,
    pub(crate) version: Option<SceneVersion>,
    /// Deadline of the armed publish timer.
    pub(crate) publish_timer: Option<HostTime>,
}

impl fmt::Debug for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneState")
            .field("connection", &self.connection)
            .field("log", &self.log)
            .field("dispatcher", &self.dispatcher)
            .field("version", &self.version)
            .field("publish_timer", &self.publish_timer)
            .finish_non_exhaustive()
    }
}

impl SceneState {
    pub(crate) fn new(connection: ConnectionId, listener: Box<dyn SceneListener>) -> Self {
        Self {
            connection,
            listener,
            log: UpdateLog::new(),
            dispatcher: FrameDispatcher::new(),
            version: None,
            publish_timer: None,
        }
    }
}
