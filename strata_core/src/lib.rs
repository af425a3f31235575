// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Versioned scene graphs, snapshot resolution and vsync scheduling.
//!
//! `strata_core` holds the platform-independent half of the strata
//! compositor. It is `no_std` compatible (with `alloc`) and performs no I/O
//! and no threading; the engine crate drives it from a timer loop.
//!
//! # Architecture
//!
//! ```text
//!   client ──► UpdateLog ──► apply_publish() ──► SceneContent (Arc, immutable)
//!                                                     │
//!                                                     ▼
//!                                                 Registry
//!                                                     │
//!   VsyncScheduler ──► snapshot phase ──► Registry::snapshot_scene()
//!                                                     │
//!                                                     ▼
//!                               Snapshot + BlockLog + dependency set
//!                                                     │
//!                                                     ▼
//!                                   InvalidationTracker (scene → renderer)
//! ```
//!
//! **[`scene`]**: node trees, resource tables, the update log and
//! publish-time validation.
//!
//! **[`registry`]**: the universe of live scenes and their retained
//! version history.
//!
//! **[`resolve`]**: recursive snapshot resolution with version pinning,
//! node combinators and cycle detection. Blocked scenes are reported through
//! a [`BlockLog`](resolve::BlockLog).
//!
//! **[`snapshot`]**: the resolved tree, painter-order traversal and hit
//! testing.
//!
//! **[`dirty`]**: renderer invalidation via `understory_dirty`.
//!
//! **[`vsync`]**: per-renderer vsync phase math and frame coalescing.
//!
//! **[`dispatch`]**: next-frame callback lists.
//!
//! **[`time`]** and **[`id`]**: host time, durations and identifiers.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types
//! for frame-loop instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod dispatch;
pub mod id;
pub mod registry;
pub mod resolve;
pub mod scene;
pub mod snapshot;
pub mod time;
pub mod trace;
pub mod vsync;
