// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Next-frame callbacks.
//!
//! Every scene and renderer owns a [`FrameDispatcher`]. Clients register
//! "call me when the next frame happens" callbacks on it; the engine
//! dispatches the whole batch once per frame with a shared [`FrameInfo`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::time::{Duration, HostTime};

/// Timing of the frame a callback is being run for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Monotonic frame counter of the renderer that produced the frame.
    pub frame_index: u64,
    /// When work on the frame began.
    pub base_time: HostTime,
    /// When the frame is expected to reach the display.
    pub presentation_time: HostTime,
    /// Display refresh interval.
    pub presentation_interval: Duration,
    /// Latest time a publish can land and still make this frame.
    pub publish_deadline: HostTime,
}

/// A callback awaiting the next frame.
pub type FrameCallback = Box<dyn FnOnce(&FrameInfo)>;

/// Ordered list of pending next-frame callbacks.
#[derive(Default)]
pub struct FrameDispatcher {
    pending: Vec<FrameCallback>,
}

impl fmt::Debug for FrameDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDispatcher")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl FrameDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback. Returns `true` if it is the only pending one,
    /// meaning the caller needs to request a frame.
    pub fn add_callback(&mut self, callback: FrameCallback) -> bool {
        self.pending.push(callback);
        self.pending.len() == 1
    }

    /// Runs every pending callback once with `info`, in registration order,
    /// and clears the list.
    ///
    /// Callbacks registered while dispatching are not reachable from here
    /// and wait for the next call.
    pub fn dispatch(&mut self, info: &FrameInfo) {
        for callback in core::mem::take(&mut self.pending) {
            callback(info);
        }
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drops every pending callback without running it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
