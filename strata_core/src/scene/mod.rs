// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Versioned scene graphs.
//!
//! A scene is a client-owned tree of [`Node`]s plus a resource table. Clients
//! mutate a scene by queueing [`SceneUpdate`]s on its [`UpdateLog`] and
//! sealing them with a publish; [`apply_publish`] folds a sealed batch into a
//! new immutable [`SceneContent`] or rejects it as a whole.
//!
//! Nodes may embed other scenes through [`Resource::Scene`] entries, which
//! makes the set of scenes a directed graph that can contain cycles. Those
//! edges are only followed at resolution time; see
//! [`resolve`](crate::resolve).

mod content;
mod log;
mod node;
mod update;

pub use content::SceneContent;
pub use log::{PendingPublish, UpdateLog};
pub use node::{Combinator, Node, Operation, Resource, SceneRef};
pub use update::{ApplyDisposition, SceneUpdate, UpdateError, apply_publish};
