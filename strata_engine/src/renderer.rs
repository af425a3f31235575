// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-renderer engine state.

use kurbo::Rect;
use strata_core::dispatch::FrameDispatcher;
use strata_core::id::{OutputId, SceneToken, VersionRequest};
use strata_core::snapshot::Snapshot;
use strata_core::vsync::VsyncScheduler;

use crate::output::Output;
use crate::scene::ConnectionId;

/// Lifecycle state of a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RendererStatus {
    /// Created, nothing to draw yet.
    NoRootScene,
    /// Bound to a root scene.
    HasRootScene,
    /// Torn down, or never existed.
    Destroyed,
}

/// The scene a renderer draws and how it is framed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RootBinding {
    pub(crate) scene: SceneToken,
    pub(crate) version: VersionRequest,
    pub(crate) viewport: Rect,
}

#[derive(Debug)]
pub(crate) struct RendererState {
    pub(crate) label: String,
    pub(crate) connection: ConnectionId,
    pub(crate) output_id: OutputId,
    pub(crate) root: Option<RootBinding>,
    pub(crate) output: Output,
    pub(crate) dispatcher: FrameDispatcher,
    pub(crate) vsync: VsyncScheduler,
    /// Most recent successful snapshot, used for hit testing.
    pub(crate) visible: Option<Snapshot>,
}

impl RendererState {
    pub(crate) fn status(&self) -> RendererStatus {
        if self.root.is_some() {
            RendererStatus::HasRootScene
        } else {
            RendererStatus::NoRootScene
        }
    }
}
