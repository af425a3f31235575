// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers for scenes, renderers, nodes, resources and outputs.
//!
//! [`SceneToken`] and [`RendererId`] are drawn from one shared
//! [`TokenAllocator`], so the two namespaces never overlap and a raw token
//! value identifies at most one entity for the lifetime of the process.
//! Tokens are never reused.

use core::fmt;

/// Identifies one client-owned scene.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneToken(pub(crate) u32);

impl SceneToken {
    /// Returns the raw token value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuilds a token from a raw value previously returned by
    /// [`raw`](Self::raw).
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for SceneToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneToken({})", self.0)
    }
}

impl fmt::Display for SceneToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one renderer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RendererId(pub(crate) u32);

impl RendererId {
    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuilds an id from a raw value previously returned by
    /// [`raw`](Self::raw).
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RendererId({})", self.0)
    }
}

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Identifies a display output or surface a renderer presents to.
///
/// Assigned by the windowing layer; core passes it through uninterpreted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// Identifies a node within one scene.
///
/// Node ids are chosen by the client and are only meaningful inside the
/// scene that defines them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node every published scene content must define.
    pub const ROOT: Self = Self(0);
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Identifies a resource within one scene's resource table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub u32);

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.0)
    }
}

/// An opaque handle to a backend-managed resource (image, buffer, etc.).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}

/// Per-scene content version, starting at 1 for the first applied publish.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneVersion(pub u32);

impl SceneVersion {
    /// The version of the first applied publish.
    pub const FIRST: Self = Self(1);

    /// Returns the version following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for SceneVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for SceneVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which version of a scene a reference asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VersionRequest {
    /// The newest version that resolves.
    #[default]
    Latest,
    /// Exactly this version, or nothing.
    Exact(SceneVersion),
}

impl VersionRequest {
    /// Returns `true` if `version` satisfies this request.
    #[inline]
    #[must_use]
    pub fn accepts(self, version: SceneVersion) -> bool {
        match self {
            Self::Latest => true,
            Self::Exact(v) => v == version,
        }
    }
}

/// Hands out scene tokens and renderer ids from one monotonic counter.
#[derive(Clone, Debug)]
pub struct TokenAllocator {
    next: u32,
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenAllocator {
    /// Creates an allocator whose first token is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocates a fresh scene token.
    ///
    /// # Panics
    ///
    /// Panics if the token namespace is exhausted.
    pub fn scene(&mut self) -> SceneToken {
        SceneToken(self.bump())
    }

    /// Allocates a fresh renderer id.
    ///
    /// # Panics
    ///
    /// Panics if the token namespace is exhausted.
    pub fn renderer(&mut self) -> RendererId {
        RendererId(self.bump())
    }

    fn bump(&mut self) -> u32 {
        let raw = self.next;
        self.next = raw
            .checked_add(1)
            .unwrap_or_else(|| panic!("token namespace exhausted after {raw} allocations"));
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenes_and_renderers_share_one_namespace() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.scene();
        let r = alloc.renderer();
        let b = alloc.scene();
        assert_ne!(a.raw(), r.raw());
        assert_ne!(r.raw(), b.raw());
        assert!(a.raw() < r.raw() && r.raw() < b.raw(), "monotonic");
    }

    #[test]
    #[should_panic(expected = "token namespace exhausted")]
    fn exhaustion_is_fatal() {
        let mut alloc = TokenAllocator { next: u32::MAX };
        let _ = alloc.scene();
    }

    #[test]
    fn version_request_matching() {
        assert!(VersionRequest::Latest.accepts(SceneVersion(7)));
        assert!(VersionRequest::Exact(SceneVersion(7)).accepts(SceneVersion(7)));
        assert!(!VersionRequest::Exact(SceneVersion(6)).accepts(SceneVersion(7)));
        assert_eq!(SceneVersion::FIRST.next(), SceneVersion(2));
    }
}
