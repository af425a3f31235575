// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deadline-ordered timer queue.

use std::collections::BTreeMap;

use strata_core::time::HostTime;

/// Timers ordered by deadline, then by arming order.
#[derive(Debug)]
pub(crate) struct TimerQueue<T> {
    entries: BTreeMap<(HostTime, u64), T>,
    seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arms a timer firing at `at`.
    pub(crate) fn schedule(&mut self, at: HostTime, item: T) {
        self.entries.insert((at, self.seq), item);
        self.seq += 1;
    }

    /// Earliest deadline.
    pub(crate) fn next_deadline(&self) -> Option<HostTime> {
        self.entries.keys().next().map(|(at, _)| *at)
    }

    /// Removes the earliest timer if it is due at `now`.
    pub(crate) fn pop_due(&mut self, now: HostTime) -> Option<(HostTime, T)> {
        let entry = self.entries.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        let ((at, _), item) = entry.remove_entry();
        Some((at, item))
    }

    /// Drops every timer `keep` rejects.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.retain(|_, item| keep(item));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
