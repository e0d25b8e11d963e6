// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree of two-word identifiers.
//!
//! Each identifier is a pair of `u64` words treated as one logical value, for
//! example an object id plus a revision, or the two halves of a 128-bit key.

use crate::keyed::{KeyedBucket, KeyedQuadTree, PointAccessor};

/// Two-word identifier.
pub type Long2 = [u64; 2];

/// Quadtree of [`Long2`] identifiers.
///
/// Both words together identify a point: removal and filtering compare the
/// full pair.
pub type QuadTreeLongs2<A> = KeyedQuadTree<Long2, A>;

/// Leaf payload of a [`QuadTreeLongs2`].
pub type Longs2Bucket = KeyedBucket<Long2>;

impl<A: PointAccessor<Long2>> KeyedQuadTree<Long2, A> {
    /// Insert the identifier `(v1, v2)`.
    ///
    /// Does nothing if either coordinate is `NaN`.
    pub fn add_pair(&mut self, v1: u64, v2: u64) {
        self.add([v1, v2]);
    }

    /// Remove the identifier `(v1, v2)`.
    ///
    /// See [`remove`][KeyedQuadTree::remove] for the preconditions.
    pub fn remove_pair(&mut self, v1: u64, v2: u64) -> bool {
        self.remove([v1, v2])
    }
}
