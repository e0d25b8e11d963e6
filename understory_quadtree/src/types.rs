// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate scalars, rectangles, and the quadrant helpers shared by every tree.

use core::fmt::Debug;

/// Coordinate scalar abstraction used by [`QuadTree`][crate::QuadTree].
///
/// This trait carries the few type-specific decisions the engine needs: the
/// extent of the root leaf, when an axis is too narrow to split, and how a
/// centroid is accumulated and converted back.
pub trait Coord: Copy + PartialOrd + Debug {
    /// Lower bound of the root leaf.
    const LOWEST: Self;

    /// Upper bound of the root leaf.
    const HIGHEST: Self;

    /// Whether this value must be rejected on insertion.
    fn is_nan(self) -> bool;

    /// Whether a leaf spanning `[min, max)` along one axis may be divided further.
    fn is_splittable(min: Self, max: Self) -> bool;

    /// The value contributed to a centroid sum.
    fn mean_term(self) -> f64;

    /// Convert an accumulated centroid back to a divider.
    fn from_mean(mean: f64) -> Self;
}

impl Coord for f32 {
    const LOWEST: Self = Self::NEG_INFINITY;
    const HIGHEST: Self = Self::INFINITY;

    #[inline]
    fn is_nan(self) -> bool {
        Self::is_nan(self)
    }

    #[inline]
    fn is_splittable(min: Self, max: Self) -> bool {
        // Twice the unit roundoff. Narrower leaves would keep splitting on
        // coordinates that are equal after rounding.
        max - min > Self::EPSILON
    }

    #[inline]
    fn mean_term(self) -> f64 {
        f64::from(trunc_inf(self))
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Dividers are stored as f32; the mean is clamped to the finite range afterwards."
    )]
    #[inline]
    fn from_mean(mean: f64) -> Self {
        trunc_inf(mean as Self)
    }
}

// Means truncate toward zero, so points spread over only two adjacent values
// (say 0 and 1) get a divider equal to the lower one and stay together.
impl Coord for i64 {
    const LOWEST: Self = Self::MIN;
    const HIGHEST: Self = Self::MAX;

    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    #[inline]
    fn is_splittable(min: Self, max: Self) -> bool {
        // Widened so the root span does not overflow.
        i128::from(max) - i128::from(min) > 1
    }

    #[inline]
    fn mean_term(self) -> f64 {
        self as f64
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Float to int casts saturate, which is the intended clamping."
    )]
    #[inline]
    fn from_mean(mean: f64) -> Self {
        mean as Self
    }
}

/// Axis-aligned rectangle in 2D.
///
/// Used both for query rectangles and for the extent of a leaf. Point tests
/// through [`Rect::contains_point`] are inclusive on every edge, while the
/// extent of a leaf only owns `[min_x, max_x) × [min_y, max_y)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
    pub max_y: T,
}

impl<T> Rect<T> {
    /// Create a new rectangle from min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Coord> Rect<T> {
    /// The whole coordinate domain, which is also the extent of the root leaf.
    #[inline]
    pub const fn everything() -> Self {
        Self::new(T::LOWEST, T::LOWEST, T::HIGHEST, T::HIGHEST)
    }

    /// Whether `min_x <= x <= max_x`.
    #[inline]
    pub fn contains_x(&self, x: T) -> bool {
        self.min_x <= x && x <= self.max_x
    }

    /// Whether `min_y <= y <= max_y`.
    #[inline]
    pub fn contains_y(&self, y: T) -> bool {
        self.min_y <= y && y <= self.max_y
    }

    /// Whether this rectangle contains the point, edges included.
    #[inline]
    pub fn contains_point(&self, x: T, y: T) -> bool {
        self.contains_x(x) && self.contains_y(y)
    }

    /// Whether the x range of `other` lies within this rectangle's x range.
    #[inline]
    pub fn covers_x(&self, other: &Self) -> bool {
        self.min_x <= other.min_x && other.max_x <= self.max_x
    }

    /// Whether the y range of `other` lies within this rectangle's y range.
    #[inline]
    pub fn covers_y(&self, other: &Self) -> bool {
        self.min_y <= other.min_y && other.max_y <= self.max_y
    }
}

/// Quadrant of `(x, y)` relative to a pair of dividers.
///
/// - `0` = small-x small-y
/// - `1` = large-x small-y
/// - `2` = small-x large-y
/// - `3` = large-x large-y
///
/// A coordinate equal to its divider lands on the large side.
#[inline]
pub fn quadrant<T: PartialOrd>(x_divider: T, y_divider: T, x: T, y: T) -> usize {
    let h = if x < x_divider { 0 } else { 1 };
    let v = if y < y_divider { 0 } else { 2 };
    h | v
}

/// Clamp `x` into `[-f32::MAX, f32::MAX]`, so that infinities become finite.
///
/// `NaN` passes through unchanged.
#[inline]
pub fn trunc_inf(x: f32) -> f32 {
    if x > f32::MAX {
        f32::MAX
    } else if x < -f32::MAX {
        -f32::MAX
    } else {
        x
    }
}

/// Running mean of point coordinates, used to choose dividers.
///
/// Each term is scaled as it is added rather than dividing a total at the end,
/// so very large coordinates cannot overflow the sum.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Centroid {
    x: f64,
    y: f64,
    weight: f64,
}

impl Centroid {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            weight: 1.0 / count as f64,
        }
    }

    #[inline]
    pub(crate) fn add<T: Coord>(&mut self, x: T, y: T) {
        self.x += x.mean_term() * self.weight;
        self.y += y.mean_term() * self.weight;
    }

    pub(crate) fn finish<T: Coord>(self) -> (T, T) {
        (T::from_mean(self.x), T::from_mean(self.y))
    }
}
