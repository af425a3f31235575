// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterizer backend contract.

use strata_core::vsync::VsyncTiming;
use strata_render::RenderFrame;

use crate::error::RasterError;

/// What happened to a frame handed to [`Rasterizer::draw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawResult {
    /// The frame reached the display.
    Presented,
    /// The frame was drawn but not shown (e.g. occluded).
    NotPresented,
    /// The output went away; nothing was drawn. The rasterizer will be
    /// re-initialized when the renderer is resumed.
    Suspended,
}

/// A rasterization backend driven from a renderer's dedicated thread.
///
/// Implementations own their device state. They are never called from the
/// engine's scheduling context.
pub trait Rasterizer: Send + 'static {
    /// Brings the backend up and reports the display's vsync timing.
    fn initialize(&mut self) -> Result<VsyncTiming, RasterError>;

    /// Draws one frame.
    fn draw(&mut self, frame: &RenderFrame) -> Result<DrawResult, RasterError>;
}
