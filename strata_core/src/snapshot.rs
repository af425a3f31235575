// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolved snapshots of a renderer's root scene.
//!
//! A [`Snapshot`] is the result of one resolution pass. When it succeeded it
//! owns `Arc` references to every [`SceneContent`] it resolved, so the
//! rasterizer can paint it even after the scenes involved publish newer
//! versions or are destroyed. Every snapshot, blocked or not, carries the set
//! of scenes consulted during the pass; renderers use it to decide which
//! scene changes require a new snapshot.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Point, Vec2};

use crate::id::{NodeId, SceneToken, SceneVersion};
use crate::scene::{Combinator, Node, SceneContent};

/// Outcome of resolving a scene or node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Resolved and renderable.
    Success,
    /// Not renderable in this pass.
    Blocked,
}

/// Identifies a node of one specific content version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    /// Scene owning the node.
    pub scene: SceneToken,
    /// Content version the node belongs to.
    pub version: SceneVersion,
    /// The node.
    pub node: NodeId,
}

impl NodeKey {
    /// Key of `node` within `content`.
    #[must_use]
    pub fn new(content: &SceneContent, node: NodeId) -> Self {
        Self {
            scene: content.scene(),
            version: content.version(),
            node,
        }
    }
}

/// Work done by a resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Distinct scenes resolved.
    pub scenes_resolved: u32,
    /// Distinct nodes resolved.
    pub nodes_resolved: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct ResolvedTree {
    pub(crate) root: Arc<SceneContent>,
    pub(crate) refs: BTreeMap<NodeKey, Arc<SceneContent>>,
    pub(crate) nodes: BTreeMap<NodeKey, Disposition>,
}

/// The resolved tree of one renderer for one frame attempt.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub(crate) generation: u64,
    pub(crate) dependencies: BTreeSet<SceneToken>,
    pub(crate) stats: ResolveStats,
    pub(crate) tree: Option<ResolvedTree>,
}

/// A node reached while walking a resolved snapshot.
#[derive(Clone, Copy, Debug)]
pub struct VisitedNode<'a> {
    /// Content the node belongs to.
    pub content: &'a Arc<SceneContent>,
    /// Node id within that content.
    pub id: NodeId,
    /// The node.
    pub node: &'a Node,
    /// Accumulated translation from the snapshot root to this node.
    pub origin: Vec2,
    /// Nesting depth, 0 for the root node.
    pub depth: usize,
}

/// One hit-test match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Scene owning the node that was hit.
    pub scene: SceneToken,
    /// The node that was hit.
    pub node: NodeId,
    /// The query point in the node's local coordinates.
    pub local_point: Point,
}

/// Result of a hit test, front-most match first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitTestResult {
    /// Matches ordered front to back.
    pub hits: Vec<Hit>,
}

impl HitTestResult {
    /// Returns `true` if nothing was hit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl Snapshot {
    /// A blocked snapshot that depended on nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generation: 0,
            dependencies: BTreeSet::new(),
            stats: ResolveStats::default(),
            tree: None,
        }
    }

    /// Overall disposition.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        if self.tree.is_some() {
            Disposition::Success
        } else {
            Disposition::Blocked
        }
    }

    /// Returns `true` if the root scene did not resolve.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.tree.is_none()
    }

    /// Generation of the pass that produced this snapshot.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Scenes consulted while resolving.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeSet<SceneToken> {
        &self.dependencies
    }

    /// Returns `true` if `scene` was consulted while resolving.
    #[must_use]
    pub fn depends_on(&self, scene: SceneToken) -> bool {
        self.dependencies.contains(&scene)
    }

    /// Work done by the pass.
    #[must_use]
    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    /// Root content, if resolved.
    #[must_use]
    pub fn root_content(&self) -> Option<&Arc<SceneContent>> {
        self.tree.as_ref().map(|t| &t.root)
    }

    /// Content a scene-reference node resolved to.
    #[must_use]
    pub fn resolved_scene(&self, node: NodeKey) -> Option<&Arc<SceneContent>> {
        self.tree.as_ref()?.refs.get(&node)
    }

    /// Disposition of a node, if the pass reached it.
    #[must_use]
    pub fn node_disposition(&self, node: NodeKey) -> Option<Disposition> {
        self.tree.as_ref()?.nodes.get(&node).copied()
    }

    /// Walks the resolved tree back to front.
    ///
    /// Each node's operations come before its embedded scene, which comes
    /// before its children. Blocked children of a [`Combinator::Prune`] node
    /// are skipped, and a [`Combinator::Fallback`] node contributes only its
    /// first resolved child. Blocked snapshots visit nothing.
    pub fn visit<'a>(&'a self, mut f: impl FnMut(&VisitedNode<'a>)) {
        if let Some(tree) = &self.tree {
            tree.visit_node(&tree.root, NodeId::ROOT, Vec2::ZERO, 0, &mut f);
        }
    }

    /// Finds the nodes whose hit region contains `point`, front-most first.
    ///
    /// `point` is in the snapshot root's coordinate space.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> HitTestResult {
        let mut hits = Vec::new();
        self.visit(|v| {
            let local = point - v.origin;
            if v.node.hit_region.is_some_and(|r| r.contains(local)) {
                hits.push(Hit {
                    scene: v.content.scene(),
                    node: v.id,
                    local_point: local,
                });
            }
        });
        hits.reverse();
        HitTestResult { hits }
    }
}

impl ResolvedTree {
    fn disposition(&self, content: &SceneContent, id: NodeId) -> Disposition {
        self.nodes
            .get(&NodeKey::new(content, id))
            .copied()
            .unwrap_or(Disposition::Blocked)
    }

    fn visit_node<'a>(
        &'a self,
        content: &'a Arc<SceneContent>,
        id: NodeId,
        parent_origin: Vec2,
        depth: usize,
        f: &mut impl FnMut(&VisitedNode<'a>),
    ) {
        let Some(node) = content.node(id) else {
            return;
        };
        let origin = parent_origin + node.offset;
        f(&VisitedNode {
            content,
            id,
            node,
            origin,
            depth,
        });

        if node.scene_ref.is_some()
            && let Some(embedded) = self.refs.get(&NodeKey::new(content, id))
        {
            self.visit_node(embedded, NodeId::ROOT, origin, depth + 1, f);
        }

        let mut resolved = node
            .children
            .iter()
            .copied()
            .filter(|c| self.disposition(content, *c) == Disposition::Success);
        match node.combinator {
            Combinator::Merge | Combinator::Prune => {
                for child in resolved {
                    self.visit_node(content, child, origin, depth + 1, f);
                }
            }
            Combinator::Fallback => {
                if let Some(child) = resolved.next() {
                    self.visit_node(content, child, origin, depth + 1, f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::id::{ResourceId, TokenAllocator, VersionRequest};
    use crate::registry::Registry;
    use crate::resolve::BlockLog;
    use crate::scene::{ApplyDisposition, Resource, SceneUpdate, apply_publish};

    fn publish(reg: &mut Registry, token: SceneToken, updates: Vec<SceneUpdate>) {
        let prev = reg.latest(token).cloned();
        match apply_publish(token, prev.as_deref(), updates) {
            ApplyDisposition::Succeeded(c) => reg.present(c),
            other => panic!("publish failed: {other:?}"),
        }
    }

    /// A host with a full-size hit region and a guest offset by (10, 10)
    /// with a smaller region on top.
    fn layered() -> (Registry, SceneToken, SceneToken) {
        let mut alloc = TokenAllocator::new();
        let mut reg = Registry::new();
        let host = alloc.scene();
        let guest = alloc.scene();
        reg.add_scene(host, "host");
        reg.add_scene(guest, "guest");
        publish(
            &mut reg,
            guest,
            alloc::vec![SceneUpdate::PutNode(
                NodeId::ROOT,
                Node::new().with_hit_region(Rect::new(0.0, 0.0, 20.0, 20.0))
            )],
        );
        publish(
            &mut reg,
            host,
            alloc::vec![
                SceneUpdate::PutResource(ResourceId(1), Resource::Scene(guest)),
                SceneUpdate::PutNode(
                    NodeId(1),
                    Node::new()
                        .with_offset(Vec2::new(10.0, 10.0))
                        .with_scene_ref(ResourceId(1), VersionRequest::Latest)
                ),
                SceneUpdate::PutNode(
                    NodeId::ROOT,
                    Node::new()
                        .with_hit_region(Rect::new(0.0, 0.0, 100.0, 100.0))
                        .with_child(NodeId(1))
                ),
            ],
        );
        (reg, host, guest)
    }

    #[test]
    fn hit_test_orders_front_to_back() {
        let (mut reg, host, guest) = layered();
        let snap = reg.snapshot_scene(host, VersionRequest::Latest, &mut BlockLog::new());

        let result = snap.hit_test(Point::new(15.0, 15.0));
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].scene, guest, "guest is drawn on top");
        assert_eq!(result.hits[0].local_point, Point::new(5.0, 5.0));
        assert_eq!(result.hits[1].scene, host);

        let outside_guest = snap.hit_test(Point::new(50.0, 50.0));
        assert_eq!(outside_guest.hits.len(), 1);
        assert!(snap.hit_test(Point::new(500.0, 0.0)).is_empty());
    }

    #[test]
    fn blocked_snapshot_hits_nothing() {
        let snap = Snapshot::empty();
        assert!(snap.is_blocked());
        assert!(snap.hit_test(Point::ZERO).is_empty());
        let mut count = 0;
        snap.visit(|_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn visit_accumulates_offsets_and_depth() {
        let (mut reg, host, _) = layered();
        let snap = reg.snapshot_scene(host, VersionRequest::Latest, &mut BlockLog::new());
        let mut seen = Vec::new();
        snap.visit(|v| seen.push((v.content.scene(), v.id, v.origin, v.depth)));
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].3, 0);
        assert_eq!(seen[2].2, Vec2::new(10.0, 10.0), "guest root inherits offset");
        assert_eq!(seen[2].3, 2);
    }
}
