// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use strata_core::id::{RendererId, SceneToken};
use thiserror::Error;

/// Failures reported by a [`Rasterizer`](crate::Rasterizer).
#[derive(Debug, Error)]
pub enum RasterError {
    /// The backend could not be brought up.
    #[error("rasterizer initialization failed: {0}")]
    Initialize(String),
    /// A draw call failed.
    #[error("draw failed: {0}")]
    Draw(String),
    /// The device went away and cannot be recovered.
    #[error("device lost")]
    DeviceLost,
}

/// Errors returned by [`Engine`](crate::Engine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The scene does not exist or was destroyed.
    #[error("unknown scene {0}")]
    UnknownScene(SceneToken),
    /// The renderer does not exist or was destroyed.
    #[error("unknown renderer {0}")]
    UnknownRenderer(RendererId),
    /// A viewport was empty, non-finite or too large.
    #[error("invalid viewport {width}x{height} (limit {max})")]
    InvalidViewport {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
        /// Exclusive limit for either side.
        max: u32,
    },
    /// The root scene named in `set_root_scene` does not exist.
    #[error("root scene {0} does not exist")]
    MissingRootScene(SceneToken),
    /// The rasterizer reported a fatal error.
    #[error("rasterizer of renderer {renderer} failed")]
    Raster {
        /// Renderer whose rasterizer failed.
        renderer: RendererId,
        /// Underlying failure.
        #[source]
        source: RasterError,
    },
    /// The rasterizer thread could not be started.
    #[error("failed to spawn rasterizer thread")]
    Spawn(#[from] std::io::Error),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
