// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

use strata_core::time::Duration;
use strata_core::vsync::{PhaseRatios, VsyncPhases};

/// Largest supported pipeline depth.
pub const MAX_PIPELINE_DEPTH: u8 = 3;

/// Configuration for the [`Engine`](crate::Engine).
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Frames a renderer may have handed to its rasterizer at once (1–3).
    /// Also scales the presentation phase.
    pub pipeline_depth: u8,
    /// Exclusive upper bound on viewport width and height.
    pub max_viewport: u32,
    /// Update and snapshot phases relative to vsync.
    pub phase_ratios: PhaseRatios,
}

impl EngineConfig {
    /// One frame in flight: lowest input-to-photon latency.
    #[must_use]
    pub const fn low_latency() -> Self {
        Self {
            pipeline_depth: 1,
            max_viewport: 16384,
            phase_ratios: PhaseRatios::DEFAULT,
        }
    }

    /// Two frames in flight: tolerates a slow rasterizer at the cost of one
    /// extra interval of latency.
    #[must_use]
    pub const fn throughput() -> Self {
        Self {
            pipeline_depth: 2,
            ..Self::low_latency()
        }
    }

    /// Returns `self` with `depth` clamped to `1..=MAX_PIPELINE_DEPTH`.
    #[must_use]
    pub fn with_pipeline_depth(mut self, depth: u8) -> Self {
        self.pipeline_depth = depth.clamp(1, MAX_PIPELINE_DEPTH);
        self
    }

    /// The pipeline depth actually used.
    #[inline]
    #[must_use]
    pub fn effective_depth(&self) -> u8 {
        self.pipeline_depth.clamp(1, MAX_PIPELINE_DEPTH)
    }

    /// Concrete vsync phases for a display refreshing every `interval`.
    #[must_use]
    pub fn phases(&self, interval: Duration) -> VsyncPhases {
        self.phase_ratios.phases(interval, self.effective_depth())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::low_latency()
    }
}
