// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening snapshots into render frames.

use alloc::collections::BTreeSet;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::Rect;
use strata_core::dispatch::FrameInfo;
use strata_core::id::{OutputId, RendererId};
use strata_core::snapshot::Snapshot;

use crate::frame::{RenderFrame, RenderItem};

/// Paints `snapshot` into a frame covering `viewport`.
///
/// Every operation of every visited node becomes one [`RenderItem`], in
/// back-to-front order, with its origin expressed relative to the viewport's
/// top-left corner. A blocked snapshot paints an empty frame.
#[must_use]
pub fn paint(
    snapshot: &Snapshot,
    renderer: RendererId,
    output: OutputId,
    viewport: Rect,
    info: FrameInfo,
) -> RenderFrame {
    let mut frame = RenderFrame::new(renderer, output, viewport, info);
    let mut seen = BTreeSet::new();
    let shift = viewport.origin().to_vec2();

    snapshot.visit(|v| {
        if seen.insert((v.content.scene(), v.content.version())) {
            frame.retained.push(Arc::clone(v.content));
        }
        for op in &v.node.operations {
            let resources: Vec<_> = op
                .resources
                .iter()
                .filter_map(|id| v.content.resource(*id))
                .collect();
            frame.items.push(RenderItem {
                scene: v.content.scene(),
                node: v.id,
                instruction: op.instruction,
                resources,
                origin: v.origin - shift,
            });
        }
    });
    frame
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Vec2;
    use strata_core::id::{NodeId, ResourceId, ResourceKey, TokenAllocator, VersionRequest};
    use strata_core::registry::Registry;
    use strata_core::resolve::BlockLog;
    use strata_core::scene::{
        ApplyDisposition, Node, Operation, Resource, SceneUpdate, apply_publish,
    };
    use strata_core::time::{Duration, HostTime};

    use super::*;

    fn info() -> FrameInfo {
        FrameInfo {
            frame_index: 4,
            base_time: HostTime(0),
            presentation_time: HostTime(16),
            presentation_interval: Duration(16),
            publish_deadline: HostTime(13),
        }
    }

    fn publish(reg: &mut Registry, token: strata_core::id::SceneToken, updates: Vec<SceneUpdate>) {
        let prev = reg.latest(token).cloned();
        match apply_publish(token, prev.as_deref(), updates) {
            ApplyDisposition::Succeeded(c) => reg.present(c),
            other => panic!("publish failed: {other:?}"),
        }
    }

    #[test]
    fn paints_operations_back_to_front() {
        let mut alloc = TokenAllocator::new();
        let renderer = alloc.renderer();
        let host = alloc.scene();
        let guest = alloc.scene();
        let mut reg = Registry::new();
        reg.add_scene(host, "host");
        reg.add_scene(guest, "guest");

        publish(
            &mut reg,
            guest,
            vec![
                SceneUpdate::PutResource(ResourceId(7), Resource::Opaque(ResourceKey(70))),
                SceneUpdate::PutNode(
                    NodeId::ROOT,
                    Node::new().with_operation(Operation::new(2).with_resource(ResourceId(7))),
                ),
            ],
        );
        publish(
            &mut reg,
            host,
            vec![
                SceneUpdate::PutResource(ResourceId(1), Resource::Scene(guest)),
                SceneUpdate::PutNode(
                    NodeId(1),
                    Node::new()
                        .with_offset(Vec2::new(30.0, 40.0))
                        .with_scene_ref(ResourceId(1), VersionRequest::Latest),
                ),
                SceneUpdate::PutNode(
                    NodeId::ROOT,
                    Node::new()
                        .with_operation(Operation::new(1))
                        .with_child(NodeId(1)),
                ),
            ],
        );

        let snap = reg.snapshot_scene(host, VersionRequest::Latest, &mut BlockLog::new());
        let viewport = Rect::new(10.0, 10.0, 110.0, 110.0);
        let frame = paint(&snap, renderer, OutputId(9), viewport, info());

        assert_eq!(frame.frame_index(), 4);
        assert_eq!(frame.items.len(), 2);
        assert_eq!(frame.items[0].instruction, 1, "host draws first");
        assert_eq!(frame.items[0].origin, Vec2::new(-10.0, -10.0));
        assert_eq!(frame.items[1].scene, guest);
        assert_eq!(frame.items[1].origin, Vec2::new(20.0, 30.0));
        assert_eq!(
            frame.items[1].resources,
            vec![Resource::Opaque(ResourceKey(70))]
        );
        assert_eq!(frame.retained().len(), 2);
    }

    #[test]
    fn blocked_snapshot_paints_nothing() {
        let mut alloc = TokenAllocator::new();
        let frame = paint(
            &Snapshot::empty(),
            alloc.renderer(),
            OutputId(0),
            Rect::new(0.0, 0.0, 1.0, 1.0),
            info(),
        );
        assert!(frame.is_empty());
        assert!(frame.retained().is_empty());
    }
}
