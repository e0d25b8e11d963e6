// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time intervals as points in an `i64` quadtree.
//!
//! An event `[start, end]` is stored as the point `(start, end)`. Events that
//! overlap a window `[lo, hi]` are then the points with `start <= hi` and
//! `end >= lo`, which is a single range search.
//!
//! Run:
//! - `cargo run -p understory_examples --example event_intervals`

use tracing_subscriber::EnvFilter;
use understory_quadtree::{QuadTreeXys, Rect, Xy};

#[derive(Debug, PartialEq)]
struct Event {
    name: &'static str,
    start: i64,
    end: i64,
}

impl Xy<i64> for Event {
    fn x(&self) -> i64 {
        self.start
    }

    fn y(&self) -> i64 {
        self.end
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let events = [
        ("a", 1, 2),
        ("b", 1, 10),
        ("c", 2, 22),
        ("d", 3, 6),
        ("e", 4, 17),
        ("f", 4, 18),
        ("g", 5, 13),
        ("h", 5, 17),
        ("i", 7, 14),
        ("j", 8, 9),
        ("k", 8, 13),
        ("l", 10, 17),
        ("m", 13, 22),
    ];

    let mut tree: QuadTreeXys<Event, i64> = QuadTreeXys::new(4);
    for (name, start, end) in events {
        tree.add(Event { name, start, end });
    }
    println!("{tree:?}");

    let (lo, hi) = (6, 12);
    let mut overlapping: Vec<_> = tree
        .search(Rect::new(i64::MIN, lo, hi, i64::MAX))
        .into_iter()
        .map(|e| e.name)
        .collect();
    overlapping.sort_unstable();
    println!("overlapping [{lo}, {hi}]: {overlapping:?}");

    let contained: Vec<_> = tree
        .search(Rect::new(lo, lo, hi, hi))
        .into_iter()
        .map(|e| e.name)
        .collect();
    println!("contained in [{lo}, {hi}]: {contained:?}");
}
