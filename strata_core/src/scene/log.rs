// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-scene update log: queued mutations and timed publishes.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::time::HostTime;

use super::update::SceneUpdate;

/// A publish waiting for its presentation time.
#[derive(Clone, Debug)]
pub struct PendingPublish {
    /// When the publish should take effect.
    pub presentation_time: HostTime,
    /// Mutations queued between the previous publish and this one.
    pub updates: Vec<SceneUpdate>,
}

/// Ordered mutations and publishes for one scene.
///
/// Mutations accumulate until [`publish`](Self::publish) seals them into a
/// [`PendingPublish`]. Publishes are released strictly in the order they
/// were requested: a publish whose time has elapsed still waits behind an
/// earlier one whose time has not.
#[derive(Clone, Debug, Default)]
pub struct UpdateLog {
    pending: Vec<SceneUpdate>,
    publishes: VecDeque<PendingPublish>,
}

impl UpdateLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mutation to the unsealed batch.
    pub fn enqueue(&mut self, update: SceneUpdate) {
        self.pending.push(update);
    }

    /// Seals the current batch into a publish for `presentation_time`.
    pub fn publish(&mut self, presentation_time: HostTime) {
        let updates = core::mem::take(&mut self.pending);
        self.publishes.push_back(PendingPublish {
            presentation_time,
            updates,
        });
    }

    /// Presentation time of the oldest queued publish.
    #[must_use]
    pub fn next_due(&self) -> Option<HostTime> {
        self.publishes.front().map(|p| p.presentation_time)
    }

    /// Removes and returns the oldest publish if its time is at or before
    /// `now`.
    pub fn pop_due(&mut self, now: HostTime) -> Option<PendingPublish> {
        if self.next_due()? <= now {
            self.publishes.pop_front()
        } else {
            None
        }
    }

    /// Number of mutations not yet sealed by a publish.
    #[must_use]
    pub fn unsealed_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of queued publishes.
    #[must_use]
    pub fn publish_count(&self) -> usize {
        self.publishes.len()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.publishes.clear();
    }
}
