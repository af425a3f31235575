// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene registry: authoritative per-scene version history.
//!
//! [`Registry`] owns a short history of published [`SceneContent`] per scene
//! token, newest first, and is the single entry point for resolving a scene
//! into a [`Snapshot`]. Each call to [`Registry::snapshot_scene`] is one
//! resolution pass with its own generation number; memoization and cycle
//! bookkeeping live in a per-pass resolver that is dropped when the pass
//! ends.
//!
//! # History pruning
//!
//! After every pass the registry trims history so it stays bounded:
//!
//! - A scene whose content was selected during the pass keeps its selected
//!   entry and its newest entry. Everything else is dropped, so a pinned
//!   scene holds at most two versions however often it publishes.
//! - A scene not visited during the pass is cut down to its newest entry.
//!
//! A renderer that pins an older version of a scene it did not visit in the
//! latest pass can therefore find that version gone on its next pass and
//! resolve to blocked.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::sync::Arc;

use crate::id::{SceneToken, VersionRequest};
use crate::resolve::{BlockLog, Resolver};
use crate::scene::SceneContent;
use crate::snapshot::Snapshot;

#[derive(Debug)]
pub(crate) struct SceneEntry {
    pub(crate) label: String,
    /// Newest first.
    pub(crate) history: VecDeque<Arc<SceneContent>>,
}

/// Per-scene version history and resolution entry point.
#[derive(Debug, Default)]
pub struct Registry {
    scenes: BTreeMap<SceneToken, SceneEntry>,
    generation: u64,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` with an empty history.
    ///
    /// # Panics
    ///
    /// Panics if `token` is already registered.
    pub fn add_scene(&mut self, token: SceneToken, label: impl Into<String>) {
        let previous = self.scenes.insert(
            token,
            SceneEntry {
                label: label.into(),
                history: VecDeque::new(),
            },
        );
        assert!(previous.is_none(), "scene {token:?} registered twice");
    }

    /// Pushes a newly published version to the front of its scene's history.
    ///
    /// Content for an unregistered scene is dropped.
    pub fn present(&mut self, content: Arc<SceneContent>) {
        match self.scenes.get_mut(&content.scene()) {
            Some(entry) => entry.history.push_front(content),
            None => tracing::debug!(
                scene = %content.scene(),
                "dropping content for unregistered scene"
            ),
        }
    }

    /// Removes a scene and its history.
    ///
    /// Snapshots that already hold content of this scene keep it alive.
    pub fn remove_scene(&mut self, token: SceneToken) {
        self.scenes.remove(&token);
    }

    /// Resolves `token` at `requested` into a snapshot.
    ///
    /// Starts a new generation, runs one resolution pass, then prunes
    /// history (see the [module docs](self)). Reasons for blocked
    /// resolution are appended to `log`.
    pub fn snapshot_scene(
        &mut self,
        token: SceneToken,
        requested: VersionRequest,
        log: &mut BlockLog,
    ) -> Snapshot {
        self.generation += 1;
        let (snapshot, selections) = Resolver::new(self, self.generation, log).build(token, requested);

        for (token, entry) in &mut self.scenes {
            match selections.get(token) {
                Some(Some(version)) => {
                    let mut index = 0;
                    entry.history.retain(|c| {
                        let keep = index == 0 || c.version() == *version;
                        index += 1;
                        keep
                    });
                }
                // Visited without a selection: leave history for a later pass.
                Some(None) => {}
                None => entry.history.truncate(1),
            }
        }
        snapshot
    }

    /// Generation number of the most recent pass.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if `token` is registered.
    #[must_use]
    pub fn contains(&self, token: SceneToken) -> bool {
        self.scenes.contains_key(&token)
    }

    /// Newest published content of `token`.
    #[must_use]
    pub fn latest(&self, token: SceneToken) -> Option<&Arc<SceneContent>> {
        self.scenes.get(&token)?.history.front()
    }

    /// Number of retained versions of `token`.
    #[must_use]
    pub fn history_len(&self, token: SceneToken) -> usize {
        self.scenes.get(&token).map_or(0, |e| e.history.len())
    }

    /// Debug label of `token`.
    #[must_use]
    pub fn label(&self, token: SceneToken) -> Option<&str> {
        self.scenes.get(&token).map(|e| e.label.as_str())
    }

    pub(crate) fn entry(&self, token: SceneToken) -> Option<&SceneEntry> {
        self.scenes.get(&token)
    }
}
