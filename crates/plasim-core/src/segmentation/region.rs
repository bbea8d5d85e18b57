//! Streaming feasible region of an ε-bounded line.
//!
//! The region is the convex set of `(slope, intercept)` pairs such that every
//! admitted point `(xᵢ, yᵢ)` satisfies `|yᵢ − (slope·xᵢ + intercept)| ≤ ε`.
//! It is represented by the two convex chains of the shifted points
//! `(xᵢ, yᵢ + ε)` (upper) and `(xᵢ, yᵢ − ε)` (lower), plus four extreme points
//! whose connecting lines bound the admissible slopes.
//!
//! Chains only grow at the tail and only lose their prefix, so each point is
//! pushed and popped at most once: admission is amortized O(1).

use crate::error::{Result, SimError};

/// Start compacting a chain once this many entries are dead.
const COMPACT_THRESHOLD: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Direction from `origin` to `self`.
    #[inline]
    fn slope_from(self, origin: Point) -> Slope {
        Slope {
            dx: self.x - origin.x,
            dy: self.y - origin.y,
        }
    }
}

/// Slope kept as a fraction so comparisons avoid division.
///
/// Comparisons assume both operands have `dx` of the same sign.
#[derive(Debug, Clone, Copy)]
struct Slope {
    dx: f64,
    dy: f64,
}

impl Slope {
    #[inline]
    fn lt(self, other: Slope) -> bool {
        self.dy * other.dx < self.dx * other.dy
    }

    #[inline]
    fn gt(self, other: Slope) -> bool {
        self.dy * other.dx > self.dx * other.dy
    }

    fn value(self) -> f64 {
        self.dy / self.dx
    }
}

/// Cross product of `o→a` and `o→b`; positive for a left turn.
#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    let oa = a.slope_from(o);
    let ob = b.slope_from(o);
    oa.dx * ob.dy - oa.dy * ob.dx
}

/// Reject error bounds that are negative or not finite.
pub fn check_epsilon(epsilon: f64) -> Result<()> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            "epsilon",
            epsilon,
            "must be finite and non-negative",
        ))
    }
}

/// Result of offering a point to a [`FeasibleRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The point fits; the region shrank to include its constraint.
    Admitted,
    /// No line fits every point; the region is closed and unchanged.
    Break,
}

/// Set of lines within ε of every point of the current segment.
#[derive(Debug, Clone)]
pub struct FeasibleRegion {
    epsilon: f64,
    upper: Vec<Point>,
    lower: Vec<Point>,
    upper_start: usize,
    lower_start: usize,
    /// `[0]`, `[2]` support the minimum slope; `[1]`, `[3]` the maximum.
    rectangle: [Point; 4],
    points: usize,
    last: Point,
    closed: bool,
}

impl FeasibleRegion {
    /// An unconstrained region for error bound `epsilon`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `epsilon` is negative or not finite.
    pub fn new(epsilon: f64) -> Result<Self> {
        check_epsilon(epsilon)?;
        let origin = Point { x: 0.0, y: 0.0 };
        Ok(Self {
            epsilon,
            upper: Vec::new(),
            lower: Vec::new(),
            upper_start: 0,
            lower_start: 0,
            rectangle: [origin; 4],
            points: 0,
            last: origin,
            closed: false,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of points admitted since the last reset.
    pub fn len(&self) -> usize {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Whether a point has been refused since the last reset.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Forget every point and start a new segment.
    pub fn reset(&mut self) {
        self.upper.clear();
        self.lower.clear();
        self.upper_start = 0;
        self.lower_start = 0;
        self.points = 0;
        self.closed = false;
    }

    /// Offer the point `(x, y)` to the region.
    ///
    /// The first two points are always admitted. A refused point leaves the
    /// region untouched and closes it; later calls return [`Admission::Break`]
    /// until [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` when a coordinate is not finite, `x` does not
    /// strictly increase, or `y` decreases.
    pub fn add_point(&mut self, x: f64, y: f64) -> Result<Admission> {
        if self.closed {
            return Ok(Admission::Break);
        }
        self.check(x, y)?;
        self.last = Point { x, y };

        let p1 = Point {
            x,
            y: y + self.epsilon,
        };
        let p2 = Point {
            x,
            y: y - self.epsilon,
        };

        if self.points == 0 {
            self.rectangle[0] = p1;
            self.rectangle[1] = p2;
            self.upper.clear();
            self.lower.clear();
            self.upper.push(p1);
            self.lower.push(p2);
            self.upper_start = 0;
            self.lower_start = 0;
            self.points = 1;
            return Ok(Admission::Admitted);
        }

        if self.points == 1 {
            self.rectangle[2] = p2;
            self.rectangle[3] = p1;
            self.upper.push(p1);
            self.lower.push(p2);
            self.points = 2;
            return Ok(Admission::Admitted);
        }

        let min_slope = self.rectangle[2].slope_from(self.rectangle[0]);
        let max_slope = self.rectangle[3].slope_from(self.rectangle[1]);
        let too_low = p1.slope_from(self.rectangle[2]).lt(min_slope);
        let too_high = p2.slope_from(self.rectangle[3]).gt(max_slope);
        if too_low || too_high {
            self.closed = true;
            return Ok(Admission::Break);
        }

        if p1.slope_from(self.rectangle[1]).lt(max_slope) {
            // Tighten the maximum slope: steepest lower-chain point seen from p1.
            let mut best = self.lower[self.lower_start].slope_from(p1);
            let mut best_i = self.lower_start;
            for i in self.lower_start + 1..self.lower.len() {
                let s = self.lower[i].slope_from(p1);
                if s.gt(best) {
                    break;
                }
                best = s;
                best_i = i;
            }
            self.rectangle[1] = self.lower[best_i];
            self.rectangle[3] = p1;
            self.lower_start = best_i;

            let mut end = self.upper.len();
            while end >= self.upper_start + 2
                && cross(self.upper[end - 2], self.upper[end - 1], p1) <= 0.0
            {
                end -= 1;
            }
            self.upper.truncate(end);
            self.upper.push(p1);
        }

        if p2.slope_from(self.rectangle[0]).gt(min_slope) {
            // Tighten the minimum slope: shallowest upper-chain point seen from p2.
            let mut best = self.upper[self.upper_start].slope_from(p2);
            let mut best_i = self.upper_start;
            for i in self.upper_start + 1..self.upper.len() {
                let s = self.upper[i].slope_from(p2);
                if s.lt(best) {
                    break;
                }
                best = s;
                best_i = i;
            }
            self.rectangle[0] = self.upper[best_i];
            self.rectangle[2] = p2;
            self.upper_start = best_i;

            let mut end = self.lower.len();
            while end >= self.lower_start + 2
                && cross(self.lower[end - 2], self.lower[end - 1], p2) >= 0.0
            {
                end -= 1;
            }
            self.lower.truncate(end);
            self.lower.push(p2);
        }

        self.points += 1;
        self.compact();
        Ok(Admission::Admitted)
    }

    /// Interval `[lo, hi]` of slopes still admissible.
    ///
    /// Unbounded while fewer than two points have been admitted. After a
    /// break this is the interval just before the refused point.
    pub fn slope_range(&self) -> (f64, f64) {
        if self.points < 2 {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        let lo = self.rectangle[2].slope_from(self.rectangle[0]).value();
        let hi = self.rectangle[3].slope_from(self.rectangle[1]).value();
        (lo, hi)
    }

    /// Total number of chain entries currently held, dead prefix included.
    pub fn hull_size(&self) -> usize {
        self.upper.len() + self.lower.len()
    }

    fn check(&self, x: f64, y: f64) -> Result<()> {
        let violation = |reason| SimError::PreconditionViolation {
            index: self.points,
            x,
            y,
            reason,
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(violation("coordinates must be finite"));
        }
        if self.points > 0 {
            if x <= self.last.x {
                return Err(violation("x must be strictly increasing"));
            }
            if y < self.last.y {
                return Err(violation("y must be non-decreasing"));
            }
        }
        Ok(())
    }

    /// Drop chain prefixes that can no longer become extreme points.
    fn compact(&mut self) {
        if self.upper_start >= COMPACT_THRESHOLD && self.upper_start * 2 >= self.upper.len() {
            self.upper.drain(..self.upper_start);
            self.upper_start = 0;
        }
        if self.lower_start >= COMPACT_THRESHOLD && self.lower_start * 2 >= self.lower.len() {
            self.lower.drain(..self.lower_start);
            self.lower_start = 0;
        }
    }
}
