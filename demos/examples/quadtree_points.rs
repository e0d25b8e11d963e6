// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Points indexed by `u32` identifiers, with coordinates kept in caller-owned arrays.
//!
//! Shows:
//! - adding points, including a pile of coincident ones that gets grouped,
//! - inclusive range searches, with and without a filter,
//! - moving a point by removing and re-adding it.
//!
//! Run:
//! - `cargo run -p understory_examples --example quadtree_points`
//! - `RUST_LOG=debug cargo run -p understory_examples --example quadtree_points` to see splits

use std::cell::RefCell;

use tracing_subscriber::EnvFilter;
use understory_quadtree::{QuadTreeInts, Rect};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A 10x10 lattice, then 40 points stacked on (2.5, 2.5).
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in 0..10_u8 {
        for col in 0..10_u8 {
            xs.push(f32::from(col));
            ys.push(f32::from(row));
        }
    }
    for _ in 0..40 {
        xs.push(2.5);
        ys.push(2.5);
    }
    let xs = RefCell::new(xs);
    let ys = RefCell::new(ys);

    let accessor = (
        |i: u32| xs.borrow()[i as usize],
        |i: u32| ys.borrow()[i as usize],
    );
    let mut tree = QuadTreeInts::new(8, accessor);
    let count = u32::try_from(xs.borrow().len()).expect("point count fits in u32");
    for i in 0..count {
        tree.add(i);
    }

    let t = tree.tree();
    println!(
        "{} points in {} nodes ({} leaves, depth {})",
        tree.len(),
        t.node_count(),
        t.leaf_count(),
        t.depth()
    );

    let rect = Rect::new(2.0, 2.0, 3.0, 3.0);
    let mut hits = tree.search(rect);
    hits.sort_unstable();
    println!("{} points in {rect:?}", hits.len());

    let odd = tree.search_filtered(rect, |i| i % 2 == 1);
    println!("{} of them have odd ids", odd.len());

    // Move point 0 from (0, 0) to (9.5, 9.5).
    assert!(tree.remove(0));
    xs.borrow_mut()[0] = 9.5;
    ys.borrow_mut()[0] = 9.5;
    tree.add(0);
    println!(
        "after move: {:?} near the far corner",
        tree.search(Rect::new(9.25, 9.25, 10.0, 10.0))
    );
}
