// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshot resolution: turning a possibly cyclic scene graph into one
//! acyclic render tree.
//!
//! A [`Resolver`] performs a single pass for one generation. It walks the
//! root scene's node tree, following scene references through the
//! [`Registry`], and classifies every scene and node as resolved or blocked.
//!
//! # Memoization
//!
//! Each scene is resolved at most once per pass. Its outcome (and the content
//! version chosen for it) is recorded in a per-pass visit table, and later
//! references to the same scene reuse that outcome. Node outcomes are
//! memoized per `(scene, version, node)`.
//!
//! # Cycles
//!
//! Before a scene is resolved for the first time it is marked with a
//! provisional cycle marker. A reference that reaches a scene still carrying
//! the marker has closed a loop: it returns [`Resolution::Cycle`] and records
//! the re-entered scene as the cycle origin. While unwinding, every scene
//! between the re-entry and the origin is recorded as blocked and keeps
//! propagating the cycle; the origin itself records blocked, logs the cycle
//! and returns blocked, which ends the unwinding. A cycle propagates through
//! every [`Combinator`] without being pruned or skipped.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::id::{NodeId, ResourceId, SceneToken, SceneVersion, VersionRequest};
use crate::registry::Registry;
use crate::scene::{Combinator, Resource, SceneContent, SceneRef};
use crate::snapshot::{Disposition, NodeKey, ResolveStats, ResolvedTree, Snapshot};

/// Outcome of resolving a scene or node during a pass.
///
/// `Cycle` never leaves the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    Success,
    Blocked,
    Cycle,
}

#[derive(Clone, Debug)]
struct Visit {
    resolution: Resolution,
    selected: Option<Arc<SceneContent>>,
}

/// The version chosen for each scene visited in a pass, `None` when the
/// scene resolved blocked.
pub(crate) type Selections = BTreeMap<SceneToken, Option<SceneVersion>>;

/// One resolution pass over the registry.
pub(crate) struct Resolver<'a> {
    registry: &'a Registry,
    generation: u64,
    log: &'a mut BlockLog,
    visits: BTreeMap<SceneToken, Visit>,
    nodes: BTreeMap<NodeKey, Disposition>,
    refs: BTreeMap<NodeKey, Arc<SceneContent>>,
    dependencies: BTreeSet<SceneToken>,
    stack: Vec<SceneToken>,
    cycle_origin: Option<SceneToken>,
    cycle_path: Vec<SceneToken>,
    stats: ResolveStats,
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("generation", &self.generation)
            .field("stack", &self.stack)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(registry: &'a Registry, generation: u64, log: &'a mut BlockLog) -> Self {
        Self {
            registry,
            generation,
            log,
            visits: BTreeMap::new(),
            nodes: BTreeMap::new(),
            refs: BTreeMap::new(),
            dependencies: BTreeSet::new(),
            stack: Vec::new(),
            cycle_origin: None,
            cycle_path: Vec::new(),
            stats: ResolveStats::default(),
        }
    }

    /// Resolves `root` and composes the snapshot.
    pub(crate) fn build(mut self, root: SceneToken, requested: VersionRequest) -> (Snapshot, Selections) {
        self.dependencies.insert(root);
        let resolution = self.snapshot_scene(root, requested);

        let selections = self
            .visits
            .iter()
            .map(|(token, v)| (*token, v.selected.as_ref().map(|c| c.version())))
            .collect();

        let tree = match resolution {
            Resolution::Success => self
                .visits
                .get(&root)
                .and_then(|v| v.selected.clone())
                .map(|root| ResolvedTree {
                    root,
                    refs: self.refs,
                    nodes: self.nodes,
                }),
            Resolution::Blocked | Resolution::Cycle => None,
        };
        let snapshot = Snapshot {
            generation: self.generation,
            dependencies: self.dependencies,
            stats: self.stats,
            tree,
        };
        (snapshot, selections)
    }

    fn snapshot_scene(&mut self, token: SceneToken, requested: VersionRequest) -> Resolution {
        if let Some(visit) = self.visits.get(&token) {
            return match visit.resolution {
                Resolution::Cycle => {
                    if self.cycle_origin.is_none() {
                        self.cycle_origin = Some(token);
                        let start = self.stack.iter().position(|t| *t == token).unwrap_or(0);
                        self.cycle_path = self.stack[start..].to_vec();
                        self.cycle_path.push(token);
                    }
                    Resolution::Cycle
                }
                Resolution::Blocked => Resolution::Blocked,
                Resolution::Success => {
                    let selected = visit.selected.as_ref().map(|c| c.version());
                    match selected {
                        Some(v) if requested.accepts(v) => Resolution::Success,
                        _ => {
                            self.block(token, BlockReason::VersionMismatch {
                                requested,
                                selected,
                            });
                            Resolution::Blocked
                        }
                    }
                }
            };
        }

        self.visits.insert(
            token,
            Visit {
                resolution: Resolution::Cycle,
                selected: None,
            },
        );
        self.stack.push(token);
        self.stats.scenes_resolved += 1;
        let (resolution, selected) = self.select_content(token, requested);
        self.stack.pop();

        let (recorded, returned) = match resolution {
            Resolution::Cycle if self.cycle_origin == Some(token) => {
                self.cycle_origin = None;
                let path = core::mem::take(&mut self.cycle_path)
                    .into_iter()
                    .map(|t| self.scene_name(t))
                    .collect();
                self.block(token, BlockReason::Cycle { path });
                (Resolution::Blocked, Resolution::Blocked)
            }
            Resolution::Cycle => (Resolution::Blocked, Resolution::Cycle),
            other => (other, other),
        };
        let selected = if recorded == Resolution::Success { selected } else { None };
        self.visits.insert(
            token,
            Visit {
                resolution: recorded,
                selected,
            },
        );
        returned
    }

    /// Chooses the content of `token` that satisfies `requested` and
    /// resolves it.
    fn select_content(
        &mut self,
        token: SceneToken,
        requested: VersionRequest,
    ) -> (Resolution, Option<Arc<SceneContent>>) {
        let registry = self.registry;
        let Some(entry) = registry.entry(token) else {
            self.block(token, BlockReason::UnknownScene);
            return (Resolution::Blocked, None);
        };
        let Some(newest) = entry.history.front() else {
            self.block(token, BlockReason::NoContent);
            return (Resolution::Blocked, None);
        };

        match requested {
            VersionRequest::Exact(version) => {
                let Some(content) = entry.history.iter().find(|c| c.version() == version) else {
                    self.block(token, BlockReason::VersionUnavailable { requested: version });
                    return (Resolution::Blocked, None);
                };
                if content.root().is_none() {
                    self.block(token, BlockReason::MissingRoot { version });
                    return (Resolution::Blocked, None);
                }
                let r = self.snapshot_node(content, NodeId::ROOT);
                (r, Some(Arc::clone(content)))
            }
            VersionRequest::Latest => {
                if newest.root().is_none() {
                    self.block(token, BlockReason::MissingRoot {
                        version: newest.version(),
                    });
                    return (Resolution::Blocked, None);
                }
                for content in entry.history.iter().filter(|c| c.root().is_some()) {
                    match self.snapshot_node(content, NodeId::ROOT) {
                        Resolution::Success => {
                            return (Resolution::Success, Some(Arc::clone(content)));
                        }
                        Resolution::Cycle => return (Resolution::Cycle, None),
                        Resolution::Blocked => {}
                    }
                }
                (Resolution::Blocked, None)
            }
        }
    }

    fn snapshot_node(&mut self, content: &Arc<SceneContent>, id: NodeId) -> Resolution {
        let key = NodeKey::new(content, id);
        if let Some(d) = self.nodes.get(&key) {
            return (*d).into();
        }
        let Some(node) = content.node(id) else {
            return Resolution::Blocked;
        };
        self.stats.nodes_resolved += 1;

        let mut resolution = Resolution::Success;
        if let Some(resource) = node
            .operations
            .iter()
            .flat_map(|op| op.resources.iter().copied())
            .find(|r| content.resource(*r).is_none())
        {
            self.block(content.scene(), BlockReason::MissingResource { node: id, resource });
            resolution = Resolution::Blocked;
        }

        if resolution == Resolution::Success
            && let Some(scene_ref) = node.scene_ref
        {
            resolution = self.snapshot_referenced_scene(content, key, scene_ref);
            if resolution == Resolution::Cycle {
                return Resolution::Cycle;
            }
        }

        if resolution == Resolution::Success {
            resolution = match self.snapshot_children(content, &node.children, node.combinator) {
                Resolution::Cycle => return Resolution::Cycle,
                other => other,
            };
        }

        let disposition = if resolution == Resolution::Success {
            Disposition::Success
        } else {
            Disposition::Blocked
        };
        self.nodes.insert(key, disposition);
        resolution
    }

    fn snapshot_children(
        &mut self,
        content: &Arc<SceneContent>,
        children: &[NodeId],
        combinator: Combinator,
    ) -> Resolution {
        match combinator {
            Combinator::Merge => {
                for &child in children {
                    match self.snapshot_node(content, child) {
                        Resolution::Success => {}
                        other => return other,
                    }
                }
                Resolution::Success
            }
            Combinator::Prune => {
                for &child in children {
                    if self.snapshot_node(content, child) == Resolution::Cycle {
                        return Resolution::Cycle;
                    }
                }
                Resolution::Success
            }
            Combinator::Fallback => {
                if children.is_empty() {
                    return Resolution::Success;
                }
                for &child in children {
                    match self.snapshot_node(content, child) {
                        Resolution::Blocked => {}
                        other => return other,
                    }
                }
                Resolution::Blocked
            }
        }
    }

    fn snapshot_referenced_scene(
        &mut self,
        content: &Arc<SceneContent>,
        referrer: NodeKey,
        scene_ref: SceneRef,
    ) -> Resolution {
        let target = match content.resource(scene_ref.resource) {
            Some(Resource::Scene(target)) => target,
            _ => {
                self.block(content.scene(), BlockReason::NotAScene {
                    node: referrer.node,
                    resource: scene_ref.resource,
                });
                return Resolution::Blocked;
            }
        };
        self.dependencies.insert(target);

        let resolution = self.snapshot_scene(target, scene_ref.version);
        if resolution == Resolution::Success
            && let Some(selected) = self.visits.get(&target).and_then(|v| v.selected.clone())
        {
            self.refs.insert(referrer, selected);
        }
        resolution
    }

    fn scene_name(&self, token: SceneToken) -> SceneName {
        SceneName {
            token,
            label: self.registry.label(token).map(String::from).unwrap_or_default(),
        }
    }

    fn block(&mut self, token: SceneToken, reason: BlockReason) {
        let entry = BlockEntry {
            scene: self.scene_name(token),
            generation: self.generation,
            reason,
        };
        tracing::debug!(generation = self.generation, "resolution blocked: {entry}");
        self.log.entries.push(entry);
    }
}

impl From<Disposition> for Resolution {
    fn from(d: Disposition) -> Self {
        match d {
            Disposition::Success => Self::Success,
            Disposition::Blocked => Self::Blocked,
        }
    }
}

/// A scene token with its debug label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneName {
    /// The scene.
    pub token: SceneToken,
    /// Its label, empty if unknown.
    pub label: String,
}

impl fmt::Display for SceneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.token)
        } else {
            write!(f, "{}{}", self.label, self.token)
        }
    }
}

/// Why a scene or edge resolved blocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockReason {
    /// The scene takes part in a reference cycle. The path starts and ends
    /// at the scene that closed the loop.
    Cycle {
        /// Scenes along the cycle.
        path: Vec<SceneName>,
    },
    /// No scene with this token is registered.
    UnknownScene,
    /// The scene has not published any content yet.
    NoContent,
    /// The chosen content has no root node.
    MissingRoot {
        /// Version lacking a root.
        version: SceneVersion,
    },
    /// The pinned version is not in the scene's retained history.
    VersionUnavailable {
        /// The pinned version.
        requested: SceneVersion,
    },
    /// The scene was already resolved in this pass at a version the
    /// reference does not accept.
    VersionMismatch {
        /// What the reference asked for.
        requested: VersionRequest,
        /// What the pass selected.
        selected: Option<SceneVersion>,
    },
    /// An operation refers to a resource that is not defined.
    MissingResource {
        /// Node carrying the operation.
        node: NodeId,
        /// The absent resource.
        resource: ResourceId,
    },
    /// A scene reference goes through a resource that is not a scene.
    NotAScene {
        /// Node carrying the reference.
        node: NodeId,
        /// The offending resource.
        resource: ResourceId,
    },
}

/// One record in a [`BlockLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockEntry {
    /// The scene that blocked.
    pub scene: SceneName,
    /// Generation of the pass that recorded it.
    pub generation: u64,
    /// Why.
    pub reason: BlockReason,
}

impl fmt::Display for BlockEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            BlockReason::Cycle { path } => {
                f.write_str("cycle: ")?;
                for (i, name) in path.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    write!(f, "{name}")?;
                }
                Ok(())
            }
            BlockReason::UnknownScene => write!(f, "{}: unknown scene", self.scene),
            BlockReason::NoContent => write!(f, "{}: no content published", self.scene),
            BlockReason::MissingRoot { version } => {
                write!(f, "{}: {version} has no root node", self.scene)
            }
            BlockReason::VersionUnavailable { requested } => {
                write!(f, "{}: {requested} is no longer retained", self.scene)
            }
            BlockReason::VersionMismatch {
                requested,
                selected,
            } => write!(
                f,
                "{}: requested {requested:?} but this pass selected {selected:?}",
                self.scene
            ),
            BlockReason::MissingResource { node, resource } => {
                write!(f, "{}: {node:?} uses missing {resource:?}", self.scene)
            }
            BlockReason::NotAScene { node, resource } => write!(
                f,
                "{}: {node:?} embeds {resource:?}, which is not a scene",
                self.scene
            ),
        }
    }
}

/// Diagnostic record of why resolution passes blocked.
///
/// Entries accumulate across passes until [`clear`](Self::clear) is called.
/// Every entry is also emitted as a `tracing` debug event when recorded.
#[derive(Clone, Debug, Default)]
pub struct BlockLog {
    entries: Vec<BlockEntry>,
}

impl BlockLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Entries describing reference cycles.
    pub fn cycles(&self) -> impl Iterator<Item = &BlockEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.reason, BlockReason::Cycle { .. }))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::id::{ResourceKey, TokenAllocator};
    use crate::scene::{ApplyDisposition, Node, Operation, SceneUpdate, apply_publish};

    struct World {
        alloc: TokenAllocator,
        reg: Registry,
        log: BlockLog,
    }

    impl World {
        fn new() -> Self {
            Self {
                alloc: TokenAllocator::new(),
                reg: Registry::new(),
                log: BlockLog::new(),
            }
        }

        fn scene(&mut self, label: &str) -> SceneToken {
            let t = self.alloc.scene();
            self.reg.add_scene(t, label);
            t
        }

        fn publish(&mut self, token: SceneToken, updates: Vec<SceneUpdate>) {
            let prev = self.reg.latest(token).cloned();
            match apply_publish(token, prev.as_deref(), updates) {
                ApplyDisposition::Succeeded(c) => self.reg.present(c),
                other => panic!("publish failed: {other:?}"),
            }
        }

        fn embed(&mut self, host: SceneToken, guests: &[(SceneToken, VersionRequest)], combinator: Combinator) {
            let mut updates = Vec::new();
            let mut root = Node::new().with_combinator(combinator);
            for (i, (guest, version)) in guests.iter().enumerate() {
                let idx = u32::try_from(i).unwrap() + 1;
                updates.push(SceneUpdate::PutResource(ResourceId(idx), Resource::Scene(*guest)));
                updates.push(SceneUpdate::PutNode(
                    NodeId(idx),
                    Node::new().with_scene_ref(ResourceId(idx), *version),
                ));
                root = root.with_child(NodeId(idx));
            }
            updates.push(SceneUpdate::PutNode(NodeId::ROOT, root));
            self.publish(host, updates);
        }

        fn leaf(&mut self, token: SceneToken) {
            self.publish(
                token,
                alloc::vec![SceneUpdate::PutNode(NodeId::ROOT, Node::new())],
            );
        }

        fn snapshot(&mut self, token: SceneToken, requested: VersionRequest) -> Snapshot {
            self.reg.snapshot_scene(token, requested, &mut self.log)
        }
    }

    #[test]
    fn two_scene_cycle_blocks_and_names_both() {
        let mut w = World::new();
        let a = w.scene("A");
        let b = w.scene("B");
        w.embed(a, &[(b, VersionRequest::Latest)], Combinator::Merge);
        w.embed(b, &[(a, VersionRequest::Latest)], Combinator::Merge);

        let snap = w.snapshot(a, VersionRequest::Latest);
        assert!(snap.is_blocked());
        assert!(snap.depends_on(a) && snap.depends_on(b));
        assert_eq!(snap.stats().scenes_resolved, 2, "each scene resolved once");

        let cycles: Vec<_> = w.log.cycles().collect();
        assert_eq!(cycles.len(), 1);
        let text = cycles[0].to_string();
        assert!(text.contains("cycle"), "{text}");
        assert!(text.contains('A') && text.contains('B'), "{text}");
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut w = World::new();
        let a = w.scene("self");
        w.embed(a, &[(a, VersionRequest::Latest)], Combinator::Merge);
        let snap = w.snapshot(a, VersionRequest::Latest);
        assert!(snap.is_blocked());
        assert_eq!(w.log.cycles().count(), 1);
    }

    #[test]
    fn long_cycle_is_bounded_by_scene_count() {
        let mut w = World::new();
        let scenes: Vec<_> = (0..8).map(|i| w.scene(&alloc::format!("s{i}"))).collect();
        for i in 0..scenes.len() {
            let next = scenes[(i + 1) % scenes.len()];
            // Reference the successor twice to widen the graph without
            // widening the pass.
            w.embed(
                scenes[i],
                &[(next, VersionRequest::Latest), (next, VersionRequest::Latest)],
                Combinator::Merge,
            );
        }
        let snap = w.snapshot(scenes[0], VersionRequest::Latest);
        assert!(snap.is_blocked());
        assert_eq!(snap.stats().scenes_resolved, 8);
        assert_eq!(w.log.cycles().count(), 1);
    }

    #[test]
    fn inner_cycle_does_not_leak_through_prune() {
        // root -> {B <-> C, D}. The cycle is detected and converted at B,
        // so root sees a blocked child it can prune.
        let mut w = World::new();
        let root = w.scene("root");
        let b = w.scene("B");
        let c = w.scene("C");
        let d = w.scene("D");
        w.leaf(d);
        w.embed(b, &[(c, VersionRequest::Latest)], Combinator::Merge);
        w.embed(c, &[(b, VersionRequest::Latest)], Combinator::Merge);
        w.embed(
            root,
            &[(b, VersionRequest::Latest), (d, VersionRequest::Latest)],
            Combinator::Prune,
        );

        let snap = w.snapshot(root, VersionRequest::Latest);
        assert_eq!(snap.disposition(), Disposition::Success);
        assert_eq!(w.log.cycles().count(), 1);
        let mut visited = Vec::new();
        snap.visit(|v| visited.push(v.content.scene()));
        assert!(visited.contains(&d));
        assert!(!visited.contains(&b));
    }

    #[test]
    fn fallback_uses_first_resolvable_child() {
        let mut w = World::new();
        let root = w.scene("root");
        let missing = w.scene("empty");
        let ok = w.scene("ok");
        w.leaf(ok);
        w.embed(
            root,
            &[(missing, VersionRequest::Latest), (ok, VersionRequest::Latest)],
            Combinator::Fallback,
        );
        let snap = w.snapshot(root, VersionRequest::Latest);
        assert_eq!(snap.disposition(), Disposition::Success);
        assert!(
            w.log.entries().iter().any(|e| e.reason == BlockReason::NoContent),
            "empty scene reported"
        );
    }

    #[test]
    fn merge_blocks_on_any_blocked_child() {
        let mut w = World::new();
        let root = w.scene("root");
        let missing = w.scene("empty");
        let ok = w.scene("ok");
        w.leaf(ok);
        w.embed(
            root,
            &[(ok, VersionRequest::Latest), (missing, VersionRequest::Latest)],
            Combinator::Merge,
        );
        assert!(w.snapshot(root, VersionRequest::Latest).is_blocked());
    }

    #[test]
    fn pinned_version_resolves_exactly() {
        let mut w = World::new();
        let host = w.scene("host");
        let guest = w.scene("guest");
        w.leaf(guest);
        w.leaf(guest);
        w.embed(host, &[(guest, VersionRequest::Exact(SceneVersion(1)))], Combinator::Merge);

        let snap = w.snapshot(host, VersionRequest::Latest);
        assert_eq!(snap.disposition(), Disposition::Success);
        let key = NodeKey {
            scene: host,
            version: SceneVersion(1),
            node: NodeId(1),
        };
        assert_eq!(snap.resolved_scene(key).map(|c| c.version()), Some(SceneVersion(1)));
    }

    #[test]
    fn conflicting_pins_in_one_pass_block_the_second_edge() {
        let mut w = World::new();
        let host = w.scene("host");
        let guest = w.scene("guest");
        w.leaf(guest);
        w.leaf(guest);
        w.embed(
            host,
            &[
                (guest, VersionRequest::Exact(SceneVersion(2))),
                (guest, VersionRequest::Exact(SceneVersion(1))),
            ],
            Combinator::Prune,
        );
        let snap = w.snapshot(host, VersionRequest::Latest);
        assert_eq!(snap.disposition(), Disposition::Success);
        assert!(w.log.entries().iter().any(|e| matches!(
            e.reason,
            BlockReason::VersionMismatch { .. }
        )));
        let blocked = NodeKey {
            scene: host,
            version: SceneVersion(1),
            node: NodeId(2),
        };
        assert_eq!(snap.node_disposition(blocked), Some(Disposition::Blocked));
    }

    #[test]
    fn latest_falls_back_to_older_resolvable_version() {
        let mut w = World::new();
        let host = w.scene("host");
        let guest = w.scene("guest");
        let dangling = w.scene("dangling");
        w.embed(host, &[(guest, VersionRequest::Latest)], Combinator::Merge);
        w.embed(host, &[(dangling, VersionRequest::Latest)], Combinator::Merge);
        w.leaf(guest);

        // v2 embeds a scene with no content; v1 resolves.
        let snap = w.snapshot(host, VersionRequest::Latest);
        assert_eq!(snap.disposition(), Disposition::Success);
        assert_eq!(snap.root_content().map(|c| c.version()), Some(SceneVersion(1)));
    }

    #[test]
    fn newest_without_root_blocks_latest() {
        let mut w = World::new();
        let a = w.scene("a");
        w.leaf(a);
        w.publish(a, alloc::vec![SceneUpdate::RemoveNode(NodeId::ROOT)]);
        let snap = w.snapshot(a, VersionRequest::Latest);
        assert!(snap.is_blocked());
        assert!(snap.root_content().is_none());
        assert!(matches!(
            w.log.entries().last().map(|e| &e.reason),
            Some(BlockReason::MissingRoot { .. })
        ));
    }

    #[test]
    fn unknown_and_empty_scenes_block() {
        let mut w = World::new();
        let empty = w.scene("empty");
        let unknown = w.alloc.scene();
        assert!(w.snapshot(empty, VersionRequest::Latest).is_blocked());
        assert!(w.snapshot(unknown, VersionRequest::Latest).is_blocked());
        assert_eq!(w.log.len(), 2);
    }

    #[test]
    fn operations_need_their_resources() {
        let mut w = World::new();
        let a = w.scene("a");
        w.publish(
            a,
            alloc::vec![
                SceneUpdate::PutResource(ResourceId(4), Resource::Opaque(ResourceKey(1))),
                SceneUpdate::PutNode(
                    NodeId::ROOT,
                    Node::new().with_operation(Operation::new(3).with_resource(ResourceId(4)))
                ),
            ],
        );
        assert_eq!(
            w.snapshot(a, VersionRequest::Latest).disposition(),
            Disposition::Success
        );
    }

    #[test]
    fn diamond_resolves_shared_scene_once() {
        let mut w = World::new();
        let top = w.scene("top");
        let left = w.scene("left");
        let right = w.scene("right");
        let shared = w.scene("shared");
        w.leaf(shared);
        w.embed(left, &[(shared, VersionRequest::Latest)], Combinator::Merge);
        w.embed(right, &[(shared, VersionRequest::Latest)], Combinator::Merge);
        w.embed(
            top,
            &[(left, VersionRequest::Latest), (right, VersionRequest::Latest)],
            Combinator::Merge,
        );
        let snap = w.snapshot(top, VersionRequest::Latest);
        assert_eq!(snap.disposition(), Disposition::Success);
        assert_eq!(snap.stats().scenes_resolved, 4);
        assert!(w.log.is_empty());
    }
}
