//! Online ε-bounded piecewise-linear segmentation.
//!
//! [`FeasibleRegion`] answers whether one more point still fits a single line;
//! [`Segmenter`] drives regions over a whole stream and cuts it into maximal
//! segments. A break is an ordinary outcome: the refused point becomes the
//! first point of the next segment, so the segments partition the stream.
//!
//! ```
//! use plasim_core::segmentation::Segmenter;
//!
//! let mut segmenter = Segmenter::new(0.0).unwrap();
//! let mut closed = Vec::new();
//! for (x, y) in [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 10.0), (4.0, 11.0)] {
//!     closed.extend(segmenter.push(x, y).unwrap());
//! }
//! closed.extend(segmenter.finish());
//! assert_eq!(closed.len(), 2);
//! assert_eq!((closed[0].start, closed[0].end), (0, 3));
//! assert_eq!((closed[1].start, closed[1].end), (3, 5));
//! ```

mod region;

pub use region::{check_epsilon, Admission, FeasibleRegion};

use crate::error::Result;
use serde::Serialize;

/// Maximal run of consecutive points fitting one line within ε.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// Index of the first point.
    pub start: usize,
    /// Index one past the last point.
    pub end: usize,
    /// Smallest admissible slope when the segment closed.
    pub slope_lo: f64,
    /// Largest admissible slope when the segment closed.
    pub slope_hi: f64,
}

impl Segment {
    /// Number of points covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Cuts a stream of points into maximal ε-bounded segments.
#[derive(Debug, Clone)]
pub struct Segmenter {
    region: FeasibleRegion,
    start: usize,
    next: usize,
}

impl Segmenter {
    pub fn new(epsilon: f64) -> Result<Self> {
        Ok(Self {
            region: FeasibleRegion::new(epsilon)?,
            start: 0,
            next: 0,
        })
    }

    /// Feed the next point, returning the segment it closed, if any.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` from the underlying region. The violating point
    /// is not counted.
    pub fn push(&mut self, x: f64, y: f64) -> Result<Option<Segment>> {
        match self.region.add_point(x, y)? {
            Admission::Admitted => {
                self.next += 1;
                Ok(None)
            }
            Admission::Break => {
                let closed = self.current();
                self.region.reset();
                self.start = self.next;
                // A fresh region admits its first point unconditionally.
                self.region.add_point(x, y)?;
                self.next += 1;
                Ok(Some(closed))
            }
        }
    }

    /// Close the open segment, if it holds any point.
    pub fn finish(self) -> Option<Segment> {
        (self.next > self.start).then(|| self.current())
    }

    /// Number of points consumed so far.
    pub fn points(&self) -> usize {
        self.next
    }

    /// Slope interval of the open segment.
    pub fn slope_range(&self) -> (f64, f64) {
        self.region.slope_range()
    }

    fn current(&self) -> Segment {
        let (slope_lo, slope_hi) = self.region.slope_range();
        Segment {
            start: self.start,
            end: self.next,
            slope_lo,
            slope_hi,
        }
    }
}

/// Segment a whole stream of points.
pub fn segment_points<I>(epsilon: f64, points: I) -> Result<Vec<Segment>>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut segmenter = Segmenter::new(epsilon)?;
    let mut segments = Vec::new();
    for (x, y) in points {
        segments.extend(segmenter.push(x, y)?);
    }
    segments.extend(segmenter.finish());
    Ok(segments)
}
