// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene mutations and atomic publish application.

use alloc::collections::BTreeSet;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::id::{NodeId, ResourceId, SceneToken, SceneVersion};

use super::content::SceneContent;
use super::node::{Node, Resource};

/// One queued mutation of a scene's tables.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneUpdate {
    /// Defines or replaces a resource.
    PutResource(ResourceId, Resource),
    /// Removes a resource. Fails if the resource is not defined.
    RemoveResource(ResourceId),
    /// Defines or replaces a node.
    PutNode(NodeId, Node),
    /// Removes a node. Fails if the node is not defined.
    RemoveNode(NodeId),
    /// Removes every node and resource.
    Clear,
}

/// Why a publish was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// A `RemoveNode` named a node that does not exist.
    #[error("cannot remove unknown node {0:?}")]
    UnknownNode(NodeId),
    /// A `RemoveResource` named a resource that does not exist.
    #[error("cannot remove unknown resource {0:?}")]
    UnknownResource(ResourceId),
    /// A node lists a child that does not exist.
    #[error("node {parent:?} has missing child {child:?}")]
    MissingChild {
        /// The referring node.
        parent: NodeId,
        /// The absent child.
        child: NodeId,
    },
    /// A node refers to a resource that does not exist.
    #[error("node {node:?} refers to missing resource {resource:?}")]
    MissingResource {
        /// The referring node.
        node: NodeId,
        /// The absent resource.
        resource: ResourceId,
    },
    /// A scene reference goes through a resource that is not a scene.
    #[error("node {node:?} embeds resource {resource:?}, which is not a scene")]
    NotASceneResource {
        /// The referring node.
        node: NodeId,
        /// The offending resource.
        resource: ResourceId,
    },
    /// A node is reachable from the root along more than one path.
    #[error("node {0:?} is reachable more than once from the root")]
    NodeReachedTwice(NodeId),
}

/// Result of applying one publish to a scene.
#[derive(Clone, Debug)]
pub enum ApplyDisposition {
    /// The publish carried no mutations; no new version was created.
    Unchanged,
    /// A new content version was produced.
    Succeeded(Arc<SceneContent>),
    /// Validation failed; nothing was applied and the scene must be destroyed.
    Failed(UpdateError),
}

/// Folds `updates` into a new version of `scene`, atomically.
///
/// The tables of `previous` are cloned, every mutation is applied to the
/// clone, and the result is validated. On any failure the clone is dropped
/// and `previous` is left untouched, so a partially applied state is never
/// observable.
#[must_use]
pub fn apply_publish(
    scene: SceneToken,
    previous: Option<&SceneContent>,
    updates: Vec<SceneUpdate>,
) -> ApplyDisposition {
    if updates.is_empty() {
        return ApplyDisposition::Unchanged;
    }
    let version = previous.map_or(SceneVersion::FIRST, |c| c.version().next());
    let mut next = match previous {
        Some(prev) => SceneContent {
            scene,
            version,
            nodes: prev.nodes.clone(),
            resources: prev.resources.clone(),
        },
        None => SceneContent::empty(scene, version),
    };

    for update in updates {
        if let Err(e) = apply_one(&mut next, update) {
            return ApplyDisposition::Failed(e);
        }
    }
    if let Err(e) = validate(&next) {
        return ApplyDisposition::Failed(e);
    }
    ApplyDisposition::Succeeded(Arc::new(next))
}

fn apply_one(content: &mut SceneContent, update: SceneUpdate) -> Result<(), UpdateError> {
    match update {
        SceneUpdate::PutResource(id, resource) => {
            content.resources.insert(id, resource);
        }
        SceneUpdate::RemoveResource(id) => {
            content
                .resources
                .remove(&id)
                .ok_or(UpdateError::UnknownResource(id))?;
        }
        SceneUpdate::PutNode(id, node) => {
            content.nodes.insert(id, node);
        }
        SceneUpdate::RemoveNode(id) => {
            content
                .nodes
                .remove(&id)
                .ok_or(UpdateError::UnknownNode(id))?;
        }
        SceneUpdate::Clear => {
            content.nodes.clear();
            content.resources.clear();
        }
    }
    Ok(())
}

/// Checks every node's references, then walks the tree under the root to
/// make sure it is a tree.
fn validate(content: &SceneContent) -> Result<(), UpdateError> {
    for (id, node) in content.nodes() {
        if let Some(&child) = node.children.iter().find(|c| content.node(**c).is_none()) {
            return Err(UpdateError::MissingChild { parent: id, child });
        }
        if let Some(resource) = node
            .referenced_resources()
            .find(|r| content.resource(*r).is_none())
        {
            return Err(UpdateError::MissingResource { node: id, resource });
        }
        if let Some(scene_ref) = node.scene_ref
            && !matches!(content.resource(scene_ref.resource), Some(Resource::Scene(_)))
        {
            return Err(UpdateError::NotASceneResource {
                node: id,
                resource: scene_ref.resource,
            });
        }
    }

    if content.root().is_none() {
        return Ok(());
    }
    let mut seen = BTreeSet::new();
    let mut stack = alloc::vec![NodeId::ROOT];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            return Err(UpdateError::NodeReachedTwice(id));
        }
        if let Some(node) = content.node(id) {
            stack.extend(node.children.iter().copied());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ResourceKey;
    use crate::scene::node::Operation;

    fn token() -> SceneToken {
        SceneToken::from_raw(9)
    }

    fn succeeded(d: ApplyDisposition) -> Arc<SceneContent> {
        match d {
            ApplyDisposition::Succeeded(c) => c,
            other => panic!("expected Succeeded, got {other:?}"),
        }
    }

    #[test]
    fn three_mutations_make_one_version() {
        let updates = alloc::vec![
            SceneUpdate::PutResource(ResourceId(1), Resource::Opaque(ResourceKey(77))),
            SceneUpdate::PutNode(
                NodeId(1),
                Node::new().with_operation(Operation::new(5).with_resource(ResourceId(1))),
            ),
            SceneUpdate::PutNode(NodeId::ROOT, Node::new().with_child(NodeId(1))),
        ];
        let content = succeeded(apply_publish(token(), None, updates));
        assert_eq!(content.version(), SceneVersion::FIRST);
        assert_eq!(content.node_count(), 2);
        assert!(content.resource(ResourceId(1)).is_some());

        let next = succeeded(apply_publish(
            token(),
            Some(&content),
            alloc::vec![SceneUpdate::RemoveNode(NodeId(1)), SceneUpdate::PutNode(NodeId::ROOT, Node::new())],
        ));
        assert_eq!(next.version(), SceneVersion(2), "exactly one increment");
        assert_eq!(content.node_count(), 2, "previous version untouched");
    }

    #[test]
    fn empty_publish_is_unchanged() {
        assert!(matches!(
            apply_publish(token(), None, Vec::new()),
            ApplyDisposition::Unchanged
        ));
    }

    #[test]
    fn failed_publish_applies_nothing() {
        let updates = alloc::vec![
            SceneUpdate::PutNode(NodeId::ROOT, Node::new()),
            SceneUpdate::RemoveNode(NodeId(42)),
        ];
        match apply_publish(token(), None, updates) {
            ApplyDisposition::Failed(e) => assert_eq!(e, UpdateError::UnknownNode(NodeId(42))),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_child_and_resource_are_rejected() {
        let missing_child = alloc::vec![SceneUpdate::PutNode(
            NodeId::ROOT,
            Node::new().with_child(NodeId(3))
        )];
        assert!(matches!(
            apply_publish(token(), None, missing_child),
            ApplyDisposition::Failed(UpdateError::MissingChild { .. })
        ));

        let missing_resource = alloc::vec![SceneUpdate::PutNode(
            NodeId::ROOT,
            Node::new().with_operation(Operation::new(1).with_resource(ResourceId(8)))
        )];
        assert!(matches!(
            apply_publish(token(), None, missing_resource),
            ApplyDisposition::Failed(UpdateError::MissingResource { .. })
        ));
    }

    #[test]
    fn scene_ref_through_opaque_resource_is_rejected() {
        let updates = alloc::vec![
            SceneUpdate::PutResource(ResourceId(1), Resource::Opaque(ResourceKey(1))),
            SceneUpdate::PutNode(
                NodeId::ROOT,
                Node::new().with_scene_ref(ResourceId(1), crate::id::VersionRequest::Latest)
            ),
        ];
        assert!(matches!(
            apply_publish(token(), None, updates),
            ApplyDisposition::Failed(UpdateError::NotASceneResource { .. })
        ));
    }

    #[test]
    fn shared_child_is_rejected() {
        let updates = alloc::vec![
            SceneUpdate::PutNode(NodeId(1), Node::new()),
            SceneUpdate::PutNode(
                NodeId::ROOT,
                Node::new().with_child(NodeId(1)).with_child(NodeId(1))
            ),
        ];
        assert!(matches!(
            apply_publish(token(), None, updates),
            ApplyDisposition::Failed(UpdateError::NodeReachedTwice(NodeId(1)))
        ));
    }

    #[test]
    fn clear_then_rebuild() {
        let first = succeeded(apply_publish(
            token(),
            None,
            alloc::vec![SceneUpdate::PutNode(NodeId::ROOT, Node::new())],
        ));
        let cleared = succeeded(apply_publish(token(), Some(&first), alloc::vec![SceneUpdate::Clear]));
        assert!(cleared.root().is_none());
        assert_eq!(cleared.version(), SceneVersion(2));
    }
}
