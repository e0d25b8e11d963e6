// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generic quadtree engine: navigation, range accumulation, and leaf splitting.
//!
//! Nodes live in an arena. A node's arena index doubles as its slot: when a
//! leaf is split, its replacement is written over the same index, so parents
//! never need to be revisited and there are no back-pointers.

use alloc::vec::Vec;
use core::fmt::Debug;

use smallvec::SmallVec;

use crate::types::{Coord, Rect, quadrant};

/// Payload stored in each leaf, and the hooks the engine needs to split it.
///
/// `A` is whatever the bucket needs to look up point coordinates, for example
/// a [`PointAccessor`][crate::PointAccessor]. Buckets whose items know their
/// own coordinates use `()`.
pub trait Bucket<T: Coord, A: ?Sized = ()>: Default {
    /// Size compared against a tree's bucket limit.
    ///
    /// The engine only relies on this being zero exactly when the bucket holds
    /// no points.
    fn size(&self) -> usize;

    /// Choose the dividers for a leaf with the given extent holding this bucket.
    fn choose_dividers(&self, accessor: &A, extent: &Rect<T>) -> (T, T);

    /// Partition this bucket into four buckets, indexed by [`quadrant`].
    fn split(self, accessor: &A, x_divider: T, y_divider: T) -> [Self; 4];
}

/// Stable handle for a node slot in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdx(usize);

impl NodeIdx {
    /// Slot of the root node.
    pub const ROOT: Self = Self(0);

    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
struct Leaf<T, B> {
    bucket: B,
    // Half-open, except at the outer boundary of the tree.
    extent: Rect<T>,
}

#[derive(Clone, Debug)]
struct Internal<T> {
    x_divider: T,
    y_divider: T,
    children: [NodeIdx; 4],
}

#[derive(Clone, Debug)]
enum Node<T, B> {
    Leaf(Leaf<T, B>),
    Internal(Internal<T>),
}

/// Outcome of [`QuadTree::split_leaf`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Split {
    /// Neither axis of the leaf was wide enough; nothing changed.
    Unsplittable,
    /// All points fell into one quadrant; the leaf was replaced by a leaf of
    /// the same extent.
    Solitary,
    /// The leaf was replaced by an internal node with four new leaves.
    Internal,
}

/// Adaptive point quadtree, generic over the coordinate scalar `T` and the
/// leaf payload `B`.
///
/// The tree only ever grows: leaves are split when a payload asks for it, and
/// nothing is merged back on removal.
pub struct QuadTree<T: Coord, B> {
    arena: Vec<Node<T, B>>,
}

impl<T: Coord, B> Debug for QuadTree<T, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("nodes", &self.node_count())
            .field("leaves", &self.leaf_count())
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl<T: Coord, B: Default> Default for QuadTree<T, B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<T: Coord, B> QuadTree<T, B> {
    /// Create a tree whose root leaf spans the whole coordinate domain.
    pub fn new(root_bucket: B) -> Self {
        let mut arena = Vec::new();
        arena.push(Node::Leaf(Leaf {
            bucket: root_bucket,
            extent: Rect::everything(),
        }));
        Self { arena }
    }

    /// Find the leaf whose extent owns `(x, y)`.
    pub fn leaf(&self, x: T, y: T) -> NodeIdx {
        let mut idx = NodeIdx::ROOT;
        loop {
            match &self.arena[idx.get()] {
                Node::Leaf(_) => return idx,
                Node::Internal(n) => {
                    idx = n.children[quadrant(n.x_divider, n.y_divider, x, y)];
                }
            }
        }
    }

    /// Bucket of the leaf at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not refer to a leaf.
    pub fn bucket(&self, idx: NodeIdx) -> &B {
        &self.leaf_ref(idx).bucket
    }

    /// Mutable bucket of the leaf at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not refer to a leaf.
    pub fn bucket_mut(&mut self, idx: NodeIdx) -> &mut B {
        match &mut self.arena[idx.get()] {
            Node::Leaf(leaf) => &mut leaf.bucket,
            Node::Internal(_) => unreachable!("quadtree invariant violated: {idx:?} is not a leaf"),
        }
    }

    /// Extent of the leaf at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not refer to a leaf.
    pub fn extent(&self, idx: NodeIdx) -> Rect<T> {
        self.leaf_ref(idx).extent
    }

    /// Visit every leaf that may hold points inside `query`.
    ///
    /// Calls `f(bucket, extent)` with the leaf's own extent rather than the
    /// query, so the callback can tell whether the whole bucket is inside the
    /// query or whether points need to be tested one by one. Each point in the
    /// bucket has `x` in `[extent.min_x, extent.max_x)` and `y` in
    /// `[extent.min_y, extent.max_y)`.
    pub fn accumulate<'a, F: FnMut(&'a B, &'a Rect<T>)>(&'a self, query: &Rect<T>, mut f: F) {
        let mut stack: SmallVec<[NodeIdx; 32]> = SmallVec::new();
        stack.push(NodeIdx::ROOT);
        while let Some(idx) = stack.pop() {
            match &self.arena[idx.get()] {
                Node::Leaf(leaf) => f(&leaf.bucket, &leaf.extent),
                Node::Internal(n) => {
                    let small_x = query.min_x < n.x_divider;
                    let large_x = query.max_x >= n.x_divider;
                    let small_y = query.min_y < n.y_divider;
                    let large_y = query.max_y >= n.y_divider;
                    // Pushed in reverse so children are visited in quadrant order.
                    if large_x && large_y {
                        stack.push(n.children[3]);
                    }
                    if small_x && large_y {
                        stack.push(n.children[2]);
                    }
                    if large_x && small_y {
                        stack.push(n.children[1]);
                    }
                    if small_x && small_y {
                        stack.push(n.children[0]);
                    }
                }
            }
        }
    }

    /// Number of nodes, leaves and internal nodes alike.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.arena
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }

    /// Number of internal nodes on the longest root-to-leaf path.
    ///
    /// A tree that has never split has depth `0`.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: SmallVec<[(NodeIdx, usize); 32]> = SmallVec::new();
        stack.push((NodeIdx::ROOT, 0));
        while let Some((idx, d)) = stack.pop() {
            match &self.arena[idx.get()] {
                Node::Leaf(_) => deepest = deepest.max(d),
                Node::Internal(n) => {
                    for &child in &n.children {
                        stack.push((child, d + 1));
                    }
                }
            }
        }
        deepest
    }

    fn leaf_ref(&self, idx: NodeIdx) -> &Leaf<T, B> {
        match &self.arena[idx.get()] {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("quadtree invariant violated: {idx:?} is not a leaf"),
        }
    }
}

impl<T: Coord, B> QuadTree<T, B> {
    /// Split the leaf at `idx`, typically because its bucket got too full.
    ///
    /// An axis narrower than [`Coord::is_splittable`] allows is not divided:
    /// its divider is pinned to the leaf's minimum so every point lands on the
    /// large side. If neither axis can be divided the bucket is left as it is,
    /// even if that keeps it above its size limit.
    ///
    /// If at most one of the four resulting buckets holds points, no internal
    /// node is created. The leaf is replaced by a leaf of the same extent
    /// holding that bucket, which keeps coincident points from deepening the
    /// tree forever.
    ///
    /// [`Bucket::choose_dividers`] is called with this leaf's bucket, so
    /// payloads that cannot handle an empty bucket should not split empty
    /// leaves.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not refer to a leaf.
    pub fn split_leaf<A: ?Sized>(&mut self, idx: NodeIdx, accessor: &A) -> Split
    where
        B: Bucket<T, A>,
    {
        let Node::Leaf(leaf) = &mut self.arena[idx.get()] else {
            unreachable!("quadtree invariant violated: {idx:?} is not a leaf");
        };
        let extent = leaf.extent;

        let x_splittable = T::is_splittable(extent.min_x, extent.max_x);
        let y_splittable = T::is_splittable(extent.min_y, extent.max_y);
        if !x_splittable && !y_splittable {
            tracing::debug!(?extent, "leaf too small to split");
            return Split::Unsplittable;
        }

        let (x_divider, y_divider) = leaf.bucket.choose_dividers(accessor, &extent);
        let x_divider = if x_splittable { x_divider } else { extent.min_x };
        let y_divider = if y_splittable { y_divider } else { extent.min_y };

        let bucket = core::mem::take(&mut leaf.bucket);
        let mut buckets = bucket.split(accessor, x_divider, y_divider);

        let mut non_empty = buckets.iter().enumerate().filter(|(_, b)| b.size() > 0);
        let first = non_empty.next().map(|(q, _)| q);
        if non_empty.next().is_none() {
            // Zero or one non-empty bucket; keep the extent, swap the payload.
            let q = first.unwrap_or(0);
            leaf.bucket = core::mem::take(&mut buckets[q]);
            tracing::debug!(?extent, ?x_divider, ?y_divider, "solitary split");
            return Split::Solitary;
        }

        let [b0, b1, b2, b3] = buckets;
        let quads = [
            (b0, Rect::new(extent.min_x, extent.min_y, x_divider, y_divider)),
            (b1, Rect::new(x_divider, extent.min_y, extent.max_x, y_divider)),
            (b2, Rect::new(extent.min_x, y_divider, x_divider, extent.max_y)),
            (b3, Rect::new(x_divider, y_divider, extent.max_x, extent.max_y)),
        ];
        let base = self.arena.len();
        let children = [
            NodeIdx::new(base),
            NodeIdx::new(base + 1),
            NodeIdx::new(base + 2),
            NodeIdx::new(base + 3),
        ];
        for (bucket, extent) in quads {
            self.arena.push(Node::Leaf(Leaf { bucket, extent }));
        }
        self.arena[idx.get()] = Node::Internal(Internal {
            x_divider,
            y_divider,
            children,
        });
        tracing::debug!(?extent, ?x_divider, ?y_divider, "split leaf into quadrants");
        Split::Internal
    }
}
