// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events posted from rasterizer threads to the scheduling context.

use strata_core::id::RendererId;
use strata_core::vsync::VsyncTiming;

use crate::error::RasterError;

/// Something a rasterizer thread wants the engine to know.
#[derive(Debug)]
pub(crate) enum RasterEvent {
    /// Initialization succeeded.
    Ready(VsyncTiming),
    /// The output went away mid-draw.
    Suspended,
    /// A draw call returned.
    FinishedDraw {
        frame_index: u64,
        presented: bool,
    },
    /// Unrecoverable backend failure.
    Error(RasterError),
}

/// A [`RasterEvent`] tagged with the renderer it belongs to.
#[derive(Debug)]
pub(crate) struct Posted {
    pub(crate) renderer: RendererId,
    pub(crate) event: RasterEvent,
}
