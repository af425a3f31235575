// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render frame: an ordered sequence of draw items for one frame.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Rect, Vec2};
use strata_core::dispatch::FrameInfo;
use strata_core::id::{NodeId, OutputId, RendererId, SceneToken};
use strata_core::scene::{Resource, SceneContent};

/// A single draw command in the render frame.
///
/// Items are produced in back-to-front order, matching the snapshot's
/// traversal order.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// Scene the originating node belongs to.
    pub scene: SceneToken,
    /// The originating node.
    pub node: NodeId,
    /// Opaque instruction of the operation.
    pub instruction: u64,
    /// Resources the operation references, resolved against the node's
    /// scene content.
    pub resources: Vec<Resource>,
    /// Translation from output space to the node's local space.
    pub origin: Vec2,
}

/// An ordered list of draw commands for a single frame on a single output.
///
/// A frame keeps every scene content it was painted from alive, so it stays
/// valid after those scenes publish newer versions or are destroyed.
#[derive(Clone, Debug)]
pub struct RenderFrame {
    /// Renderer that painted the frame.
    pub renderer: RendererId,
    /// Target output.
    pub output: OutputId,
    /// Output-space rectangle the frame covers.
    pub viewport: Rect,
    /// Timing of the frame.
    pub info: FrameInfo,
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
    pub(crate) retained: Vec<Arc<SceneContent>>,
}

impl RenderFrame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new(renderer: RendererId, output: OutputId, viewport: Rect, info: FrameInfo) -> Self {
        Self {
            renderer,
            output,
            viewport,
            info,
            items: Vec::new(),
            retained: Vec::new(),
        }
    }

    /// Frame counter of the renderer that painted this frame.
    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.info.frame_index
    }

    /// Scene contents this frame holds on to.
    #[must_use]
    pub fn retained(&self) -> &[Arc<SceneContent>] {
        &self.retained
    }

    /// Returns `true` if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
