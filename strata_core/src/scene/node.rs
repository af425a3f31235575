// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nodes, operations and resources of a scene graph.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::id::{NodeId, ResourceId, ResourceKey, SceneToken, VersionRequest};

/// An opaque render instruction and the resources it draws from.
///
/// The instruction payload is never interpreted by the compositor core; the
/// rasterizer gives it meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    /// Backend-defined instruction word.
    pub instruction: u64,
    /// Resources in the owning scene's table this instruction uses.
    pub resources: Vec<ResourceId>,
}

impl Operation {
    /// Creates an operation without resource references.
    #[must_use]
    pub fn new(instruction: u64) -> Self {
        Self {
            instruction,
            resources: Vec::new(),
        }
    }

    /// Adds a resource reference.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceId) -> Self {
        self.resources.push(resource);
        self
    }
}

/// A reference from a node to another scene.
///
/// The target scene is named indirectly through a [`Resource::Scene`] entry in
/// the referring scene's resource table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneRef {
    /// Resource holding the referenced scene token.
    pub resource: ResourceId,
    /// Which version of the referenced scene is wanted.
    pub version: VersionRequest,
}

/// How a node's disposition depends on its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Any blocked child blocks the node.
    #[default]
    Merge,
    /// Blocked children are left out; the node itself stays resolvable.
    Prune,
    /// Children are alternatives; the first one that resolves is used.
    Fallback,
}

/// One element of a scene graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    /// Children in back-to-front order.
    pub children: Vec<NodeId>,
    /// Render instructions, drawn before the children.
    pub operations: Vec<Operation>,
    /// Optional embedded scene, drawn after the operations.
    pub scene_ref: Option<SceneRef>,
    /// Translation relative to the parent.
    pub offset: Vec2,
    /// Hit region in local coordinates.
    pub hit_region: Option<Rect>,
    /// Child combination rule.
    pub combinator: Combinator,
}

impl Node {
    /// Creates an empty node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: NodeId) -> Self {
        self.children.push(child);
        self
    }

    /// Appends an operation.
    #[must_use]
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Embeds another scene through the given resource.
    #[must_use]
    pub fn with_scene_ref(mut self, resource: ResourceId, version: VersionRequest) -> Self {
        self.scene_ref = Some(SceneRef { resource, version });
        self
    }

    /// Sets the translation relative to the parent.
    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the hit region.
    #[must_use]
    pub fn with_hit_region(mut self, region: Rect) -> Self {
        self.hit_region = Some(region);
        self
    }

    /// Sets the child combinator.
    #[must_use]
    pub fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Iterates over every resource id this node refers to.
    pub fn referenced_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.operations
            .iter()
            .flat_map(|op| op.resources.iter().copied())
            .chain(self.scene_ref.map(|r| r.resource))
    }
}

/// An entry in a scene's resource table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Another scene, the target of scene references.
    Scene(SceneToken),
    /// A backend-managed resource such as an image.
    Opaque(ResourceKey),
}
