// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree of `u32` point identifiers.

use crate::keyed::{KeyedBucket, KeyedQuadTree};

/// Quadtree of `u32` identifiers, typically indices into caller-owned
/// coordinate arrays.
///
/// ```rust
/// use understory_quadtree::{QuadTreeInts, Rect};
///
/// let xs = [0.0_f32, 1.0, 2.0, 3.0, 4.0];
/// let ys = [0.0_f32, 1.0, 2.0, 3.0, 4.0];
/// let mut tree = QuadTreeInts::new(4, (|i: u32| xs[i as usize], |i: u32| ys[i as usize]));
/// for i in 0..5 {
///     tree.add(i);
/// }
///
/// let mut hits = tree.search(Rect::new(0.0, 0.0, 2.0, 2.0));
/// hits.sort_unstable();
/// assert_eq!(hits, [0, 1, 2]);
/// ```
pub type QuadTreeInts<A> = KeyedQuadTree<u32, A>;

/// Leaf payload of a [`QuadTreeInts`].
pub type IntsBucket = KeyedBucket<u32>;
