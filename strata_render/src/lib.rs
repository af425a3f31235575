// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render frames for strata.
//!
//! This crate sits between [`strata_core`]'s snapshot resolution and a
//! rasterizer backend. It defines:
//!
//! - [`RenderItem`]: a single draw command (one node operation)
//! - [`RenderFrame`]: the ordered draw list for one frame on one output
//! - [`paint`]: flattens a resolved [`Snapshot`](strata_core::snapshot::Snapshot)
//!   into a [`RenderFrame`]

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod frame;
mod paint;

pub use frame::{RenderFrame, RenderItem};
pub use paint::paint;
