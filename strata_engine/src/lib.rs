// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene and renderer lifecycle, frame pipelines and rasterizer threads.
//!
//! `strata_engine` wraps [`strata_core`] in a single-threaded [`Engine`]
//! that a transport layer calls on behalf of its clients:
//!
//! ```text
//!   clients ──► Engine::{update, publish, schedule_frame, set_root_scene}
//!                  │
//!                  ▼
//!             timer queue ──► update phase ──► FrameDispatcher callbacks
//!                  │
//!                  └────────► snapshot phase ──► Registry::snapshot_scene()
//!                                                   │  paint()
//!                                                   ▼
//!                               Output queue ──► rasterizer thread
//!                                    ▲                  │
//!                                    └── RasterEvent ◄──┘ (crossbeam channel)
//! ```
//!
//! Time comes from a [`Clock`]: [`SystemClock`] in production,
//! [`ManualClock`] in tests. Nothing in the engine sleeps except
//! [`Engine::wait`].
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Delivers frame-loop events to the sink
//!   installed with [`Engine::set_trace_sink`].

mod clock;
mod config;
mod engine;
mod error;
mod event;
mod output;
mod raster;
mod renderer;
mod scene;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, MAX_PIPELINE_DEPTH};
pub use engine::{Engine, FrameTarget};
pub use error::{EngineError, EngineResult, RasterError};
pub use output::{FrameSlot, FrameState};
pub use raster::{DrawResult, Rasterizer};
pub use renderer::RendererStatus;
pub use scene::{ConnectionId, NoopListener, SceneListener};
