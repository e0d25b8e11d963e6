// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree of objects that know their own coordinates.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::DEFAULT_MAX_BUCKET_SIZE;
use crate::tree::{Bucket, QuadTree};
use crate::types::{Centroid, Coord, Rect, quadrant};

/// An object with a 2D position.
pub trait Xy<T: Coord = f32> {
    /// X coordinate.
    fn x(&self) -> T;

    /// Y coordinate.
    fn y(&self) -> T;
}

impl<T: Coord> Xy<T> for (T, T) {
    #[inline]
    fn x(&self) -> T {
        self.0
    }

    #[inline]
    fn y(&self) -> T {
        self.1
    }
}

impl<T: Coord, V: Xy<T>> Bucket<T> for Vec<V> {
    fn size(&self) -> usize {
        self.len()
    }

    fn choose_dividers(&self, _: &(), _extent: &Rect<T>) -> (T, T) {
        let mut centroid = Centroid::new(self.len());
        for v in self {
            centroid.add(v.x(), v.y());
        }
        centroid.finish()
    }

    fn split(self, _: &(), x_divider: T, y_divider: T) -> [Self; 4] {
        let mut out: [Self; 4] = Default::default();
        for v in self {
            let q = quadrant(x_divider, y_divider, v.x(), v.y());
            out[q].push(v);
        }
        out
    }
}

/// Adaptive quadtree that owns objects implementing [`Xy`].
///
/// Coincident objects are not grouped: they simply stay together in one
/// bucket, which may then exceed `max_bucket_size`.
///
/// The coordinate type defaults to `f32`; `i64` works as well, which suits
/// intervals stored as `(start, end)` points.
///
/// ```rust
/// use understory_quadtree::{QuadTreeXys, Rect};
///
/// // Events as (start, end).
/// let mut tree: QuadTreeXys<(i64, i64), i64> = QuadTreeXys::new(4);
/// for ev in [(1, 2), (1, 10), (3, 6), (8, 9), (13, 22)] {
///     tree.add(ev);
/// }
///
/// // Events overlapping [6, 12]: start <= 12 and end >= 6.
/// let hits = tree.search(Rect::new(i64::MIN, 6, 12, i64::MAX));
/// assert_eq!(hits.len(), 3);
/// ```
pub struct QuadTreeXys<V, T: Coord = f32> {
    tree: QuadTree<T, Vec<V>>,
    max_bucket_size: usize,
}

impl<V, T: Coord> Debug for QuadTreeXys<V, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTreeXys")
            .field("max_bucket_size", &self.max_bucket_size)
            .field("tree", &self.tree)
            .finish()
    }
}

impl<V, T: Coord> Default for QuadTreeXys<V, T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUCKET_SIZE)
    }
}

impl<V, T: Coord> QuadTreeXys<V, T> {
    /// Create an empty tree.
    pub fn new(max_bucket_size: usize) -> Self {
        debug_assert!(max_bucket_size > 0, "max_bucket_size must be positive");
        Self {
            tree: QuadTree::default(),
            max_bucket_size,
        }
    }

    /// The configured bucket limit.
    pub fn max_bucket_size(&self) -> usize {
        self.max_bucket_size
    }

    /// The underlying engine, for inspecting structure.
    pub fn tree(&self) -> &QuadTree<T, Vec<V>> {
        &self.tree
    }
}

impl<V: Xy<T>, T: Coord> QuadTreeXys<V, T> {
    /// Insert `v` at its current coordinates.
    ///
    /// Does nothing if either coordinate is `NaN`.
    pub fn add(&mut self, v: V) {
        let x = v.x();
        if x.is_nan() {
            tracing::trace!("skipping object with NaN x");
            return;
        }
        let y = v.y();
        if y.is_nan() {
            tracing::trace!("skipping object with NaN y");
            return;
        }

        let idx = self.tree.leaf(x, y);
        let bucket = self.tree.bucket_mut(idx);
        bucket.push(v);
        if bucket.len() > self.max_bucket_size {
            self.tree.split_leaf(idx, &());
        }
    }

    /// Remove one object equal to `v`, found by `v`'s current coordinates.
    ///
    /// The coordinates must be the same as those of the stored object when it
    /// was added. Returns the removed object, if any. Leaves are never merged.
    pub fn remove(&mut self, v: &V) -> Option<V>
    where
        V: PartialEq,
    {
        let idx = self.tree.leaf(v.x(), v.y());
        let bucket = self.tree.bucket_mut(idx);
        let pos = bucket.iter().position(|w| w == v)?;
        Some(bucket.swap_remove(pos))
    }

    /// Objects with `min_x <= x <= max_x` and `min_y <= y <= max_y`.
    pub fn search(&self, rect: Rect<T>) -> Vec<&V> {
        let mut out = Vec::new();
        self.search_into(rect, &mut out);
        out
    }

    /// Like [`search`][Self::search], appending to `out`.
    ///
    /// Returns the number of objects appended.
    pub fn search_into<'a>(&'a self, rect: Rect<T>, out: &mut Vec<&'a V>) -> usize {
        self.gather(&rect, |_| true, out)
    }

    /// Objects in `rect` for which `include` returns `true`.
    pub fn search_filtered<F: FnMut(&V) -> bool>(&self, rect: Rect<T>, include: F) -> Vec<&V> {
        let mut out = Vec::new();
        self.search_filtered_into(rect, include, &mut out);
        out
    }

    /// Like [`search_filtered`][Self::search_filtered], appending to `out`.
    ///
    /// Returns the number of objects appended.
    pub fn search_filtered_into<'a, F: FnMut(&V) -> bool>(
        &'a self,
        rect: Rect<T>,
        include: F,
        out: &mut Vec<&'a V>,
    ) -> usize {
        self.gather(&rect, include, out)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        let mut n = 0;
        self.tree
            .accumulate(&Rect::everything(), |bucket, _| n += bucket.len());
        n
    }

    /// Whether the tree holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gather<'a, F: FnMut(&V) -> bool>(
        &'a self,
        rect: &Rect<T>,
        mut include: F,
        out: &mut Vec<&'a V>,
    ) -> usize {
        let before = out.len();
        self.tree.accumulate(rect, |bucket, extent| {
            let candidates = bucket.iter().filter(|v| include(v));
            match (rect.covers_x(extent), rect.covers_y(extent)) {
                (true, true) => out.extend(candidates),
                (true, false) => out.extend(candidates.filter(|v| rect.contains_y(v.y()))),
                (false, true) => out.extend(candidates.filter(|v| rect.contains_x(v.x()))),
                (false, false) => out.extend(
                    candidates.filter(|v| rect.contains_x(v.x()) && rect.contains_y(v.y())),
                ),
            }
        });
        out.len() - before
    }
}
