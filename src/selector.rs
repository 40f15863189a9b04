use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};

use crate::error::Error;

type Result<T> = std::result::Result<T, Error>;

/// Selects either a single frame or a slice of frames from a video.
///
/// Most callers never construct this directly and rely on the `From` conversions instead:
///
/// ```ignore
/// video.get(3)?;         // single frame
/// video.get(-1)?;        // last frame
/// video.get(2..5)?;      // frames 2, 3, 4
/// video.get(..)?;        // every frame
/// video.get(Slice::new(None, None, Some(-2)))?; // every other frame, backwards
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(i64),
    Slice(Slice),
}

/// A slice over frame indices with Python semantics: negative values count from the end,
/// missing values take their natural default and bounds outside the video are clamped.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Slice over every index.
    pub fn full() -> Self {
        Self::default()
    }

    /// Resolve the slice against a sequence of length `len`.
    ///
    /// # Return value
    ///
    /// The concrete indices selected, or [`Error::InvalidStep`] if the step is zero.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(Error::InvalidStep);
        }

        let len = len as i64;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = match self.start {
            Some(start) => clamp(start),
            None if step < 0 => upper,
            None => lower,
        };
        let stop = match self.stop {
            Some(stop) => clamp(stop),
            None if step < 0 => lower,
            None => upper,
        };

        // `start` and `stop` lie in [-1, len], so their distance fits in a u64.
        let count = if step > 0 && start < stop {
            (stop - start - 1) as u64 / step.unsigned_abs() + 1
        } else if step < 0 && stop < start {
            (start - stop - 1) as u64 / step.unsigned_abs() + 1
        } else {
            0
        };

        Ok(ResolvedSlice {
            start,
            step,
            count: count as usize,
        })
    }
}

/// Concrete, in-bounds indices produced by [`Slice::resolve`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolvedSlice {
    start: i64,
    step: i64,
    count: usize,
}

impl ResolvedSlice {
    /// Number of selected indices.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Selected indices in order.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let ResolvedSlice { start, step, count } = *self;
        (0..count as i64).map(move |i| (start + i * step) as usize)
    }
}

impl From<i64> for Selector {
    fn from(index: i64) -> Self {
        Selector::Index(index)
    }
}

impl From<i32> for Selector {
    fn from(index: i32) -> Self {
        Selector::Index(index as i64)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<Slice> for Selector {
    fn from(slice: Slice) -> Self {
        Selector::Slice(slice)
    }
}

impl From<Range<i64>> for Slice {
    fn from(range: Range<i64>) -> Self {
        Slice::new(Some(range.start), Some(range.end), None)
    }
}

impl From<RangeFrom<i64>> for Slice {
    fn from(range: RangeFrom<i64>) -> Self {
        Slice::new(Some(range.start), None, None)
    }
}

impl From<RangeTo<i64>> for Slice {
    fn from(range: RangeTo<i64>) -> Self {
        Slice::new(None, Some(range.end), None)
    }
}

impl From<RangeInclusive<i64>> for Slice {
    fn from(range: RangeInclusive<i64>) -> Self {
        let (start, end) = range.into_inner();
        // `..=-1` runs up to and including the last frame.
        let stop = match end {
            -1 => None,
            end => Some(end.saturating_add(1)),
        };
        Slice::new(Some(start), stop, None)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Slice::full()
    }
}

impl From<Range<i64>> for Selector {
    fn from(range: Range<i64>) -> Self {
        Selector::Slice(range.into())
    }
}

impl From<RangeFrom<i64>> for Selector {
    fn from(range: RangeFrom<i64>) -> Self {
        Selector::Slice(range.into())
    }
}

impl From<RangeTo<i64>> for Selector {
    fn from(range: RangeTo<i64>) -> Self {
        Selector::Slice(range.into())
    }
}

impl From<RangeInclusive<i64>> for Selector {
    fn from(range: RangeInclusive<i64>) -> Self {
        Selector::Slice(range.into())
    }
}

impl From<RangeFull> for Selector {
    fn from(range: RangeFull) -> Self {
        Selector::Slice(range.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, Selector, Slice};

    fn indices(slice: Slice, len: usize) -> Vec<usize> {
        slice.resolve(len).unwrap().indices().collect()
    }

    fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Slice {
        Slice::new(start, stop, step)
    }

    #[test]
    fn plain_range() {
        assert_eq!(indices(slice(Some(2), Some(5), None), 10), vec![2, 3, 4]);
    }

    #[test]
    fn full_slice_selects_everything() {
        assert_eq!(indices(Slice::full(), 4), vec![0, 1, 2, 3]);
        assert!(Slice::full().resolve(0).unwrap().is_empty());
    }

    #[test]
    fn negative_bounds_count_from_end() {
        assert_eq!(indices(slice(Some(-3), None, None), 10), vec![7, 8, 9]);
        assert_eq!(indices(slice(None, Some(-8), None), 10), vec![0, 1]);
    }

    #[test]
    fn out_of_range_bounds_are_clamped() {
        assert_eq!(indices(slice(Some(-100), Some(100), None), 3), vec![0, 1, 2]);
        assert!(indices(slice(Some(20), Some(30), None), 10).is_empty());
    }

    #[test]
    fn stepped() {
        assert_eq!(indices(slice(Some(1), None, Some(3)), 10), vec![1, 4, 7]);
        assert_eq!(indices(slice(None, None, Some(4)), 9), vec![0, 4, 8]);
    }

    #[test]
    fn negative_step_runs_backwards() {
        assert_eq!(indices(slice(None, None, Some(-1)), 4), vec![3, 2, 1, 0]);
        assert_eq!(indices(slice(Some(8), Some(2), Some(-3)), 10), vec![8, 5]);
        assert_eq!(indices(slice(Some(100), None, Some(-4)), 10), vec![9, 5, 1]);
        assert!(indices(slice(Some(2), Some(8), Some(-1)), 10).is_empty());
    }

    #[test]
    fn extreme_steps_select_one_index() {
        assert_eq!(indices(slice(None, None, Some(i64::MIN)), 10), vec![9]);
        assert_eq!(indices(slice(None, None, Some(i64::MAX)), 10), vec![0]);
        assert_eq!(
            indices(slice(Some(i64::MAX), Some(i64::MIN), Some(i64::MIN)), 10),
            vec![9]
        );
        assert_eq!(
            indices(slice(Some(i64::MIN), Some(i64::MAX), Some(i64::MAX)), 10),
            vec![0]
        );
        assert!(indices(slice(None, None, Some(i64::MIN)), 0).is_empty());
    }

    #[test]
    fn reversed_bounds_are_empty() {
        assert!(indices(slice(Some(5), Some(2), None), 10).is_empty());
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(matches!(
            slice(None, None, Some(0)).resolve(10),
            Err(Error::InvalidStep)
        ));
    }

    #[test]
    fn step_one_count_matches_closed_form() {
        let len = 10_i64;
        for a in 0..14 {
            for b in 0..14 {
                let resolved = slice(Some(a), Some(b), None).resolve(len as usize).unwrap();
                let expected = (b.min(len) - a.max(0)).max(0) as usize;
                assert_eq!(resolved.len(), expected, "slice {a}..{b}");
            }
        }
    }

    #[test]
    fn ranges_convert_to_slices() {
        assert_eq!(
            Selector::from(2..5),
            Selector::Slice(slice(Some(2), Some(5), None))
        );
        assert_eq!(Selector::from(..), Selector::Slice(Slice::full()));
        assert_eq!(
            Selector::from(1..=-1),
            Selector::Slice(slice(Some(1), None, None))
        );
        assert_eq!(
            Selector::from(0..=2),
            Selector::Slice(slice(Some(0), Some(3), None))
        );
        assert_eq!(Selector::from(7usize), Selector::Index(7));
    }
}
