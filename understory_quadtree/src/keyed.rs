// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree over copyable point identifiers, with duplicate-coordinate grouping.
//!
//! The tree stores identifiers only. Coordinates are looked up through a
//! [`PointAccessor`] whenever they are needed, so they must not change while an
//! identifier is in the tree.
//!
//! Points that share an exact coordinate pair can be grouped under a single
//! key in their bucket. A group counts as one entry toward the bucket limit no
//! matter how many identifiers it holds, so a pile of coincident points cannot
//! force endless splitting.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::DEFAULT_MAX_BUCKET_SIZE;
use crate::tree::{Bucket, QuadTree};
use crate::types::{Centroid, Rect, quadrant};

/// Looks up the coordinates of a point identifier.
///
/// Implemented for a pair of closures `(x, y)`:
///
/// ```rust
/// use understory_quadtree::PointAccessor;
///
/// let xs = [1.0_f32, 2.0];
/// let ys = [5.0_f32, 6.0];
/// let accessor = (|i: u32| xs[i as usize], |i: u32| ys[i as usize]);
/// assert_eq!(accessor.y(1), 6.0);
/// ```
pub trait PointAccessor<I> {
    /// X coordinate of `id`.
    fn x(&self, id: I) -> f32;

    /// Y coordinate of `id`.
    fn y(&self, id: I) -> f32;
}

impl<I, FX, FY> PointAccessor<I> for (FX, FY)
where
    FX: Fn(I) -> f32,
    FY: Fn(I) -> f32,
{
    #[inline]
    fn x(&self, id: I) -> f32 {
        (self.0)(id)
    }

    #[inline]
    fn y(&self, id: I) -> f32 {
        (self.1)(id)
    }
}

/// Identifiers sharing one exact coordinate pair.
type Group<I> = SmallVec<[I; 8]>;

/// Pack both coordinates' bit patterns into one key.
#[inline]
pub(crate) fn xy_key(x: f32, y: f32) -> u64 {
    (u64::from(x.to_bits()) << 32) | u64::from(y.to_bits())
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "The high half of the key is exactly the x bit pattern."
)]
#[inline]
pub(crate) fn x_from_key(key: u64) -> f32 {
    f32::from_bits((key >> 32) as u32)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "The low half of the key is exactly the y bit pattern."
)]
#[inline]
pub(crate) fn y_from_key(key: u64) -> f32 {
    f32::from_bits(key as u32)
}

/// Groups at least this large are kept together by compaction.
#[inline]
pub(crate) fn dupe_threshold(max_bucket_size: usize) -> usize {
    (max_bucket_size / 10).max(2)
}

/// Leaf payload of a [`KeyedQuadTree`].
///
/// Every identifier is either in `singles` or in exactly one duplicate group.
/// A group is dropped as soon as it becomes empty.
#[derive(Clone, Debug)]
pub struct KeyedBucket<I> {
    singles: Vec<I>,
    dupes: HashMap<u64, Group<I>>,
}

impl<I> Default for KeyedBucket<I> {
    fn default() -> Self {
        Self {
            singles: Vec::new(),
            dupes: HashMap::new(),
        }
    }
}

impl<I: Copy> KeyedBucket<I> {
    /// Identifiers not in any duplicate group.
    pub fn singles(&self) -> &[I] {
        &self.singles
    }

    /// Duplicate groups as `(x, y, identifiers)`, in no particular order.
    pub fn dupes(&self) -> impl Iterator<Item = (f32, f32, &[I])> + '_ {
        self.dupes
            .iter()
            .map(|(&key, group)| (x_from_key(key), y_from_key(key), group.as_slice()))
    }

    /// Number of identifiers held, counting every member of every group.
    pub fn len(&self) -> usize {
        self.singles.len() + self.dupes.values().map(|g| g.len()).sum::<usize>()
    }

    /// Whether the bucket holds no identifiers.
    pub fn is_empty(&self) -> bool {
        self.singles.is_empty() && self.dupes.is_empty()
    }

    /// Singles plus groups: the size compared against the bucket limit.
    fn entries(&self) -> usize {
        self.singles.len() + self.dupes.len()
    }

    fn push(&mut self, key: u64, id: I) {
        match self.dupes.get_mut(&key) {
            Some(group) => group.push(id),
            None => self.singles.push(id),
        }
    }

    fn remove(&mut self, key: u64, id: I) -> bool
    where
        I: PartialEq,
    {
        if let Some(group) = self.dupes.get_mut(&key) {
            let Some(pos) = group.iter().position(|&v| v == id) else {
                return false;
            };
            group.swap_remove(pos);
            if group.is_empty() {
                self.dupes.remove(&key);
            }
            return true;
        }
        match self.singles.iter().position(|&v| v == id) {
            Some(pos) => {
                self.singles.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Regroup `singles` by exact coordinates, keeping groups of at least
    /// `threshold` identifiers and flattening the rest back into `singles`.
    fn compact<A: PointAccessor<I> + ?Sized>(&mut self, accessor: &A, threshold: usize) {
        let mut groups: HashMap<u64, Group<I>> = HashMap::new();
        for &v in &self.singles {
            groups
                .entry(xy_key(accessor.x(v), accessor.y(v)))
                .or_default()
                .push(v);
        }

        self.singles.clear();
        let mut promoted = 0_usize;
        for (key, group) in groups {
            if group.len() >= threshold {
                self.dupes.insert(key, group);
                promoted += 1;
            } else {
                self.singles.extend_from_slice(&group);
            }
        }
        tracing::debug!(
            promoted,
            singles = self.singles.len(),
            groups = self.dupes.len(),
            "compacted bucket"
        );
    }
}

impl<I, A> Bucket<f32, A> for KeyedBucket<I>
where
    I: Copy,
    A: PointAccessor<I> + ?Sized,
{
    fn size(&self) -> usize {
        self.entries()
    }

    fn choose_dividers(&self, accessor: &A, _extent: &Rect<f32>) -> (f32, f32) {
        // Each group contributes once, however many members it has.
        let mut centroid = Centroid::new(self.singles.len() + self.dupes.len());
        for &v in &self.singles {
            centroid.add(accessor.x(v), accessor.y(v));
        }
        for &key in self.dupes.keys() {
            centroid.add(x_from_key(key), y_from_key(key));
        }
        centroid.finish()
    }

    fn split(self, accessor: &A, x_divider: f32, y_divider: f32) -> [Self; 4] {
        let mut out: [Self; 4] = Default::default();
        for v in self.singles {
            let q = quadrant(x_divider, y_divider, accessor.x(v), accessor.y(v));
            out[q].singles.push(v);
        }
        for (key, group) in self.dupes {
            let q = quadrant(x_divider, y_divider, x_from_key(key), y_from_key(key));
            out[q].dupes.insert(key, group);
        }
        out
    }
}

/// Adaptive quadtree of copyable identifiers with `f32` coordinates.
///
/// See [`QuadTreeInts`][crate::QuadTreeInts] and
/// [`QuadTreeLongs2`][crate::QuadTreeLongs2] for the usual identifier types.
///
/// When an insertion pushes a bucket over `max_bucket_size`, the bucket is
/// first compacted: identifiers sharing exact coordinates are grouped if the
/// group is big enough. Only if the bucket is still above 90% of the limit
/// is its leaf split.
pub struct KeyedQuadTree<I, A> {
    tree: QuadTree<f32, KeyedBucket<I>>,
    accessor: A,
    max_bucket_size: usize,
}

impl<I, A> Debug for KeyedQuadTree<I, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyedQuadTree")
            .field("max_bucket_size", &self.max_bucket_size)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

impl<I, A: Default> Default for KeyedQuadTree<I, A> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUCKET_SIZE, A::default())
    }
}

impl<I, A> KeyedQuadTree<I, A> {
    /// Create an empty tree.
    pub fn new(max_bucket_size: usize, accessor: A) -> Self {
        debug_assert!(max_bucket_size > 0, "max_bucket_size must be positive");
        Self {
            tree: QuadTree::default(),
            accessor,
            max_bucket_size,
        }
    }

    /// The configured bucket limit.
    pub fn max_bucket_size(&self) -> usize {
        self.max_bucket_size
    }

    /// The coordinate accessor.
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// The underlying engine, for inspecting structure.
    pub fn tree(&self) -> &QuadTree<f32, KeyedBucket<I>> {
        &self.tree
    }
}

impl<I, A> KeyedQuadTree<I, A>
where
    I: Copy + PartialEq,
    A: PointAccessor<I>,
{
    /// Insert `id` at its current coordinates.
    ///
    /// Does nothing if either coordinate is `NaN`.
    pub fn add(&mut self, id: I) {
        let x = self.accessor.x(id);
        if x.is_nan() {
            tracing::trace!("skipping point with NaN x");
            return;
        }
        let y = self.accessor.y(id);
        if y.is_nan() {
            tracing::trace!("skipping point with NaN y");
            return;
        }

        let idx = self.tree.leaf(x, y);
        let bucket = self.tree.bucket_mut(idx);
        bucket.push(xy_key(x, y), id);

        let max = self.max_bucket_size;
        if bucket.entries() > max {
            bucket.compact(&self.accessor, dupe_threshold(max));
            // Split only if compaction left the bucket above 90% of the limit.
            if bucket.entries() * 10 > max * 9 {
                self.tree.split_leaf(idx, &self.accessor);
            }
        }
    }

    /// Remove `id`, found by its current coordinates.
    ///
    /// The coordinates should be the same as when `id` was added. If they
    /// changed, only the leaf owning the new coordinates is searched: `id` is
    /// still removed if it sits among that leaf's ungrouped identifiers and no
    /// group exists at the new coordinates, and otherwise nothing is removed.
    ///
    /// Returns whether `id` was removed. Leaves are never merged, even when
    /// they become empty.
    pub fn remove(&mut self, id: I) -> bool {
        let x = self.accessor.x(id);
        let y = self.accessor.y(id);
        let idx = self.tree.leaf(x, y);
        self.tree.bucket_mut(idx).remove(xy_key(x, y), id)
    }

    /// Identifiers with `min_x <= x <= max_x` and `min_y <= y <= max_y`.
    pub fn search(&self, rect: Rect<f32>) -> Vec<I> {
        let mut out = Vec::new();
        self.search_into(rect, &mut out);
        out
    }

    /// Like [`search`][Self::search], appending to `out`.
    ///
    /// Returns the number of identifiers appended.
    pub fn search_into(&self, rect: Rect<f32>, out: &mut Vec<I>) -> usize {
        self.gather(&rect, None::<fn(I) -> bool>, out)
    }

    /// Identifiers in `rect` for which `include` returns `true`.
    pub fn search_filtered<F: FnMut(I) -> bool>(&self, rect: Rect<f32>, include: F) -> Vec<I> {
        let mut out = Vec::new();
        self.search_filtered_into(rect, include, &mut out);
        out
    }

    /// Like [`search_filtered`][Self::search_filtered], appending to `out`.
    ///
    /// Returns the number of identifiers appended.
    pub fn search_filtered_into<F: FnMut(I) -> bool>(
        &self,
        rect: Rect<f32>,
        include: F,
        out: &mut Vec<I>,
    ) -> usize {
        self.gather(&rect, Some(include), out)
    }

    /// Number of identifiers in the tree.
    pub fn len(&self) -> usize {
        let mut n = 0;
        self.tree
            .accumulate(&Rect::everything(), |bucket, _| n += bucket.len());
        n
    }

    /// Whether the tree holds no identifiers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gather<F: FnMut(I) -> bool>(
        &self,
        rect: &Rect<f32>,
        mut include: Option<F>,
        out: &mut Vec<I>,
    ) -> usize {
        let before = out.len();
        let accessor = &self.accessor;

        self.tree.accumulate(rect, |bucket, extent| {
            let singles = &bucket.singles;
            let dupes = &bucket.dupes;

            match (rect.covers_x(extent), rect.covers_y(extent)) {
                // Whole leaf is inside: no coordinate tests at all.
                (true, true) => {
                    append(singles, &mut include, out);
                    for group in dupes.values() {
                        append(group, &mut include, out);
                    }
                }
                (true, false) => {
                    for &v in singles {
                        if admits(&mut include, v) && rect.contains_y(accessor.y(v)) {
                            out.push(v);
                        }
                    }
                    for (&key, group) in dupes {
                        if rect.contains_y(y_from_key(key)) {
                            append(group, &mut include, out);
                        }
                    }
                }
                (false, true) => {
                    for &v in singles {
                        if admits(&mut include, v) && rect.contains_x(accessor.x(v)) {
                            out.push(v);
                        }
                    }
                    for (&key, group) in dupes {
                        if rect.contains_x(x_from_key(key)) {
                            append(group, &mut include, out);
                        }
                    }
                }
                (false, false) => {
                    for &v in singles {
                        if admits(&mut include, v)
                            && rect.contains_x(accessor.x(v))
                            && rect.contains_y(accessor.y(v))
                        {
                            out.push(v);
                        }
                    }
                    for (&key, group) in dupes {
                        if rect.contains_point(x_from_key(key), y_from_key(key)) {
                            append(group, &mut include, out);
                        }
                    }
                }
            }
        });

        out.len() - before
    }
}

#[inline]
fn admits<I, F: FnMut(I) -> bool>(include: &mut Option<F>, v: I) -> bool {
    include.as_mut().is_none_or(|f| f(v))
}

#[inline]
fn append<I: Copy, F: FnMut(I) -> bool>(from: &[I], include: &mut Option<F>, out: &mut Vec<I>) {
    match include {
        None => out.extend_from_slice(from),
        Some(f) => out.extend(from.iter().copied().filter(|&v| f(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeIdx;
    use alloc::vec;

    #[test]
    fn key_round_trips_bit_patterns() {
        for (x, y) in [(0.0_f32, -0.0_f32), (1.5, -2.25), (f32::INFINITY, f32::MIN_POSITIVE)] {
            let key = xy_key(x, y);
            assert_eq!(x_from_key(key).to_bits(), x.to_bits());
            assert_eq!(y_from_key(key).to_bits(), y.to_bits());
        }
        assert_ne!(xy_key(0.0, 0.0), xy_key(-0.0, 0.0));
    }

    #[test]
    fn dupe_threshold_floor() {
        assert_eq!(dupe_threshold(1), 2);
        assert_eq!(dupe_threshold(4), 2);
        assert_eq!(dupe_threshold(29), 2);
        assert_eq!(dupe_threshold(30), 3);
        assert_eq!(dupe_threshold(100), 10);
    }

    fn grid_accessor() -> (impl Fn(u32) -> f32, impl Fn(u32) -> f32) {
        // Identifier `i` sits at (i % 16, i / 16).
        (|i: u32| (i % 16) as f32, |i: u32| (i / 16) as f32)
    }

    #[test]
    fn compaction_groups_only_large_piles() {
        let accessor = (|i: u32| if i < 3 { 1.0 } else { i as f32 }, |_: u32| 0.0_f32);
        let mut bucket = KeyedBucket::default();
        for i in 0..6 {
            bucket.push(xy_key(accessor.x(i), accessor.y(i)), i);
        }
        bucket.compact(&accessor, 3);

        let groups: Vec<_> = bucket.dupes().collect();
        assert_eq!(groups.len(), 1);
        assert_eq!((groups[0].0, groups[0].1), (1.0, 0.0));
        let mut members = groups[0].2.to_vec();
        members.sort_unstable();
        assert_eq!(members, vec![0, 1, 2]);

        let mut singles = bucket.singles().to_vec();
        singles.sort_unstable();
        assert_eq!(singles, vec![3, 4, 5]);
        assert_eq!(bucket.entries(), 4);
        assert_eq!(bucket.len(), 6);

        // New arrivals at a grouped coordinate join the group.
        bucket.push(xy_key(1.0, 0.0), 2);
        assert_eq!(bucket.singles().len(), 3);
        assert_eq!(bucket.len(), 7);
    }

    #[test]
    fn removing_last_member_drops_group() {
        let accessor = (|_: u32| 7.0_f32, |_: u32| 7.0_f32);
        let mut bucket = KeyedBucket::default();
        for i in 0..4 {
            bucket.push(xy_key(7.0, 7.0), i);
        }
        bucket.compact(&accessor, 2);
        assert_eq!(bucket.dupes().count(), 1);
        for i in 0..4 {
            assert!(bucket.remove(xy_key(7.0, 7.0), i));
        }
        assert!(bucket.is_empty());
        assert!(!bucket.remove(xy_key(7.0, 7.0), 0));
    }

    #[test]
    fn split_moves_groups_whole() {
        let accessor = (|i: u32| if i < 4 { 0.0_f32 } else { 10.0 }, |_: u32| 0.0_f32);
        let mut bucket = KeyedBucket::default();
        for i in 0..4 {
            bucket.push(xy_key(0.0, 0.0), i);
        }
        bucket.compact(&accessor, 2);
        bucket.push(xy_key(10.0, 0.0), 4);

        let (xd, yd) = bucket.choose_dividers(&accessor, &Rect::everything());
        // One group and one single: the group counts once.
        assert_eq!((xd, yd), (5.0, 0.0));

        let parts = bucket.split(&accessor, xd, yd);
        // y equal to its divider goes to the large side.
        assert!(parts[0].is_empty());
        assert!(parts[1].is_empty());
        assert_eq!(parts[2].len(), 4);
        assert_eq!(parts[2].dupes().count(), 1);
        assert_eq!(parts[3].singles(), &[4]);
    }

    #[test]
    fn full_and_partial_leaf_paths_agree() {
        let mut tree = KeyedQuadTree::new(8, grid_accessor());
        for i in 0..256 {
            tree.add(i);
        }
        assert!(tree.tree().leaf_count() > 1);
        assert_eq!(tree.len(), 256);

        let accessor = grid_accessor();
        let rects = [
            Rect::new(0.0, 0.0, 15.0, 15.0),
            Rect::new(2.0, 3.0, 9.0, 11.0),
            Rect::new(-5.0, 4.0, 100.0, 4.0),
            Rect::new(7.0, -1.0, 7.0, 100.0),
            Rect::new(3.5, 3.5, 3.9, 3.9),
        ];
        for rect in rects {
            let mut got = tree.search(rect);
            got.sort_unstable();
            let want: Vec<u32> = (0..256)
                .filter(|&i| rect.contains_point(accessor.x(i), accessor.y(i)))
                .collect();
            assert_eq!(got, want, "mismatch for {rect:?}");
        }
    }

    #[test]
    fn filtered_search_applies_to_groups_too() {
        let accessor = (|i: u32| if i < 10 { 1.0_f32 } else { 2.0 }, |_: u32| 1.0_f32);
        let mut tree = KeyedQuadTree::new(4, accessor);
        for i in 0..20 {
            tree.add(i);
        }
        let mut even = tree.search_filtered(Rect::everything(), |i| i % 2 == 0);
        even.sort_unstable();
        assert_eq!(even, (0..20).filter(|i| i % 2 == 0).collect::<Vec<_>>());

        let mut out = vec![99];
        let n = tree.search_filtered_into(Rect::new(0.0, 0.0, 1.5, 1.5), |i| i < 3, &mut out);
        assert_eq!(n, 3);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 99);
    }

    #[test]
    fn remove_after_move_searches_new_leaf_only() {
        let x0 = core::cell::Cell::new(0.0_f32);
        let accessor = (
            |i: u32| if i == 0 { x0.get() } else { i as f32 },
            |_: u32| 0.0_f32,
        );
        let mut tree = KeyedQuadTree::new(4, accessor);
        for i in 0..12 {
            tree.add(i);
        }
        let home = tree.tree().leaf(0.0, 0.0);
        assert_ne!(home, tree.tree().leaf(100.0, 0.0), "test needs a split tree");

        // Moved into another leaf: not found there.
        x0.set(100.0);
        assert!(!tree.remove(0));
        assert_eq!(tree.len(), 12);

        // Moved within its leaf: still found among the ungrouped identifiers.
        x0.set(0.5);
        assert_eq!(tree.tree().leaf(0.5, 0.0), home);
        assert!(tree.remove(0));
        assert_eq!(tree.len(), 11);
        assert!(!tree.remove(0));
    }

    #[test]
    fn remove_after_move_misses_grouped_identifier() {
        let x0 = core::cell::Cell::new(1.0_f32);
        let accessor = (
            |i: u32| if i == 0 { x0.get() } else { 1.0 },
            |_: u32| 1.0_f32,
        );
        let mut tree = KeyedQuadTree::new(4, accessor);
        for i in 0..10 {
            tree.add(i);
        }
        assert_eq!(tree.tree().node_count(), 1);
        let root = tree.tree().bucket(NodeIdx::ROOT);
        assert_eq!(root.dupes().count(), 1, "identifiers should be grouped");
        assert!(root.singles().is_empty());

        // Same leaf, but no group at the new coordinates and 0 is not a single.
        x0.set(1.5);
        assert!(!tree.remove(0));
        assert_eq!(tree.len(), 10);

        x0.set(1.0);
        assert!(tree.remove(0));
        assert_eq!(tree.len(), 9);
    }
}
