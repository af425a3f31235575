// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable published scene content.

use alloc::collections::BTreeMap;

use crate::id::{NodeId, ResourceId, SceneToken, SceneVersion};

use super::node::{Node, Resource};

/// One scene's node and resource tables at one published version.
///
/// Content is created by applying a publish and is never mutated afterwards.
/// It is shared through `Arc` by the registry history and by every snapshot
/// that resolved it, so it outlives the destruction of its scene for as long
/// as a snapshot still holds it.
#[derive(Clone, Debug)]
pub struct SceneContent {
    pub(super) scene: SceneToken,
    pub(super) version: SceneVersion,
    pub(super) nodes: BTreeMap<NodeId, Node>,
    pub(super) resources: BTreeMap<ResourceId, Resource>,
}

impl SceneContent {
    /// Creates an empty content for `scene` at `version`.
    #[must_use]
    pub fn empty(scene: SceneToken, version: SceneVersion) -> Self {
        Self {
            scene,
            version,
            nodes: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    /// The scene this content belongs to.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> SceneToken {
        self.scene
    }

    /// The version this content was published as.
    #[inline]
    #[must_use]
    pub fn version(&self) -> SceneVersion {
        self.version
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the root node, if this content defines one.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&NodeId::ROOT)
    }

    /// Looks up a resource.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<Resource> {
        self.resources.get(&id).copied()
    }

    /// Iterates over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    /// Iterates over all resources in id order.
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, Resource)> + '_ {
        self.resources.iter().map(|(id, r)| (*id, *r))
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns every resource id whose entry embeds `scene`.
    pub fn resources_for_scene(&self, scene: SceneToken) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources
            .iter()
            .filter(move |(_, r)| **r == Resource::Scene(scene))
            .map(|(id, _)| *id)
    }
}
