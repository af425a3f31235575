// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer invalidation driven by snapshot dependencies.
//!
//! Every renderer depends on the scenes its current snapshot consulted.
//! [`InvalidationTracker`] records those edges in an
//! [`understory_dirty`] graph (renderer → scene) and answers "which
//! renderers does this scene affect?" by marking the scene with
//! [`EagerPolicy`] and draining the affected set.
//!
//! # Channels
//!
//! - [`CONTENT`] — a scene published new content or was destroyed. Affected
//!   renderers need a snapshot-only pass.
//! - [`FRAME`] — a scene's first next-frame callback became pending.
//!   Affected renderers need an update-and-snapshot pass.
//!
//! Scene tokens and renderer ids come from one allocator, so both share the
//! tracker's `u32` key space without colliding.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use understory_dirty::{Channel, CycleHandling, DirtyTracker, EagerPolicy};

use crate::id::{RendererId, SceneToken};

/// Scene content changed or the scene went away.
pub const CONTENT: Channel = Channel::new(0);

/// A scene wants a frame callback dispatched.
pub const FRAME: Channel = Channel::new(1);

const CHANNELS: [Channel; 2] = [CONTENT, FRAME];

/// Tracks which renderers depend on which scenes.
pub struct InvalidationTracker {
    dirty: DirtyTracker<u32>,
    edges: BTreeMap<RendererId, BTreeSet<SceneToken>>,
}

impl core::fmt::Debug for InvalidationTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InvalidationTracker")
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}

impl Default for InvalidationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            edges: BTreeMap::new(),
        }
    }

    /// Replaces `renderer`'s dependencies with `scenes`.
    pub fn set_dependencies(&mut self, renderer: RendererId, scenes: &BTreeSet<SceneToken>) {
        let old = self.edges.remove(&renderer).unwrap_or_default();
        for gone in old.difference(scenes) {
            for ch in CHANNELS {
                self.dirty.remove_dependency(renderer.raw(), gone.raw(), ch);
            }
        }
        for added in scenes.difference(&old) {
            for ch in CHANNELS {
                let _ = self.dirty.add_dependency(renderer.raw(), added.raw(), ch);
            }
        }
        if !scenes.is_empty() {
            self.edges.insert(renderer, scenes.clone());
        }
    }

    /// Scenes `renderer` currently depends on.
    #[must_use]
    pub fn dependencies(&self, renderer: RendererId) -> Option<&BTreeSet<SceneToken>> {
        self.edges.get(&renderer)
    }

    /// Forgets `renderer` and all of its edges.
    pub fn remove_renderer(&mut self, renderer: RendererId) {
        self.edges.remove(&renderer);
        self.dirty.remove_key(renderer.raw());
    }

    /// Forgets `scene`. Call after the final [`invalidate`](Self::invalidate)
    /// for it has been drained.
    pub fn remove_scene(&mut self, scene: SceneToken) {
        for deps in self.edges.values_mut() {
            deps.remove(&scene);
        }
        self.dirty.remove_key(scene.raw());
    }

    /// Returns the renderers affected by a change to `scene` on `channel`,
    /// in id order.
    pub fn invalidate(&mut self, scene: SceneToken, channel: Channel) -> Vec<RendererId> {
        self.dirty.mark_with(scene.raw(), channel, &EagerPolicy);
        let affected: Vec<u32> = self
            .dirty
            .drain(channel)
            .affected()
            .deterministic()
            .run()
            .collect();
        affected
            .into_iter()
            .map(RendererId::from_raw)
            .filter(|r| self.edges.contains_key(r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TokenAllocator;

    fn set(items: &[SceneToken]) -> BTreeSet<SceneToken> {
        items.iter().copied().collect()
    }

    #[test]
    fn only_dependent_renderers_are_invalidated() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.scene();
        let b = alloc.scene();
        let unrelated = alloc.scene();
        let r1 = alloc.renderer();
        let r2 = alloc.renderer();

        let mut t = InvalidationTracker::new();
        t.set_dependencies(r1, &set(&[a, b]));
        t.set_dependencies(r2, &set(&[b]));

        assert_eq!(t.invalidate(a, CONTENT), alloc::vec![r1]);
        assert_eq!(t.invalidate(b, CONTENT), alloc::vec![r1, r2]);
        assert!(t.invalidate(unrelated, CONTENT).is_empty());
    }

    #[test]
    fn replaced_dependencies_drop_old_edges() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.scene();
        let b = alloc.scene();
        let r = alloc.renderer();

        let mut t = InvalidationTracker::new();
        t.set_dependencies(r, &set(&[a]));
        t.set_dependencies(r, &set(&[b]));
        assert!(t.invalidate(a, CONTENT).is_empty());
        assert_eq!(t.invalidate(b, CONTENT), alloc::vec![r]);
    }

    #[test]
    fn channels_drain_independently() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.scene();
        let r = alloc.renderer();

        let mut t = InvalidationTracker::new();
        t.set_dependencies(r, &set(&[a]));
        assert_eq!(t.invalidate(a, FRAME), alloc::vec![r]);
        assert_eq!(t.invalidate(a, CONTENT), alloc::vec![r]);
    }

    #[test]
    fn removed_renderer_is_not_reported() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.scene();
        let r = alloc.renderer();

        let mut t = InvalidationTracker::new();
        t.set_dependencies(r, &set(&[a]));
        t.remove_renderer(r);
        assert!(t.invalidate(a, CONTENT).is_empty());
        assert!(t.dependencies(r).is_none());
    }
}
