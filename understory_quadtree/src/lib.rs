// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_quadtree --heading-base-level=0

//! Understory Quadtree: an adaptive 2D point quadtree.
//!
//! Points live in the leaves of a tree that starts as a single leaf spanning
//! the whole coordinate domain. When a leaf's bucket gets too full it is split
//! at the centroid of its points, so the tree adapts to how the data is
//! distributed rather than to a fixed grid.
//!
//! - [`QuadTreeInts`]: `u32` identifiers whose coordinates are looked up through
//!   a [`PointAccessor`].
//! - [`QuadTreeLongs2`]: the same for two-word identifiers.
//! - [`QuadTreeXys`]: owned objects that know their own coordinates via [`Xy`],
//!   with `f32` or `i64` coordinates.
//!
//! The identifier trees group identifiers that share an exact coordinate pair,
//! so a pile of coincident points counts once toward the bucket limit instead
//! of forcing endless splits. Splits that would put every point into one
//! quadrant do not create a new level either.
//!
//! Range searches are inclusive on every edge. Leaves that lie entirely inside
//! the query are copied out without looking at any coordinates.
//!
//! The generic engine is exposed as [`QuadTree`] with the [`Bucket`] trait, for
//! building trees over other payloads.
//!
//! # Example
//!
//! ```rust
//! use understory_quadtree::{QuadTreeInts, Rect};
//!
//! let xs = [0.0_f32, 10.0, 10.0, 0.0, 5.0];
//! let ys = [0.0_f32, 0.0, 10.0, 10.0, 5.0];
//! let mut tree = QuadTreeInts::new(2, (|i: u32| xs[i as usize], |i: u32| ys[i as usize]));
//! for i in 0..5 {
//!     tree.add(i);
//! }
//! assert!(tree.tree().leaf_count() > 1);
//!
//! let mut hits = tree.search(Rect::new(0.0, 0.0, 5.0, 10.0));
//! hits.sort_unstable();
//! assert_eq!(hits, [0, 3, 4]);
//!
//! assert!(tree.remove(4));
//! assert!(!tree.remove(4));
//! ```
//!
//! ## Mutation contract
//!
//! Identifiers are located by their coordinates, so an identifier's
//! coordinates must not change while it is in a tree. To move a point, remove
//! it, update its coordinates, then add it again. Points with a `NaN`
//! coordinate are silently skipped. Infinite coordinates are allowed.
//!
//! ## Logging
//!
//! Splits and compactions are reported through [`tracing`] at `debug` level.
//! Nothing is emitted unless the application installs a subscriber.

#![no_std]

extern crate alloc;

mod ints;
mod keyed;
mod longs2;
mod tree;
mod types;
mod xys;

pub use ints::{IntsBucket, QuadTreeInts};
pub use keyed::{KeyedBucket, KeyedQuadTree, PointAccessor};
pub use longs2::{Long2, Longs2Bucket, QuadTreeLongs2};
pub use tree::{Bucket, NodeIdx, QuadTree, Split};
pub use types::{Coord, Rect, quadrant, trunc_inf};
pub use xys::{QuadTreeXys, Xy};

/// Bucket limit used by the `Default` impls of the trees.
pub const DEFAULT_MAX_BUCKET_SIZE: usize = 64;
