//! Lanes: 1-D windows over caller-owned storage.
//!
//! A lane maps logical positions `0..len()` onto a backing buffer. Kernels
//! are written once against [`SampleLane`] and monomorphized for each lane
//! kind, so contiguous rows, strided columns and `ndarray` views share the
//! same scan.

use ndarray::ArrayViewMut1;

use crate::error::{Error, Result};
use crate::filters::sample::Sample;

pub trait SampleLane {
    type Item: Sample;

    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Self::Item;

    fn set(&mut self, index: usize, value: Self::Item);
}

/// Every `step`-th element of a slice, starting at `offset`.
#[derive(Debug)]
pub struct StridedLane<'a, T> {
    data: &'a mut [T],
    offset: usize,
    count: usize,
    step: usize,
}

impl<'a, T: Sample> StridedLane<'a, T> {
    /// Whole slice, step 1.
    pub fn contiguous(data: &'a mut [T]) -> Self {
        let count = data.len();
        Self {
            data,
            offset: 0,
            count,
            step: 1,
        }
    }

    /// `data[offset..offset + length]`.
    pub fn window(data: &'a mut [T], offset: usize, length: usize) -> Result<Self> {
        let len = data.len();
        match offset.checked_add(length) {
            Some(end) if end <= len => Ok(Self {
                data,
                offset,
                count: length,
                step: 1,
            }),
            _ => Err(Error::WindowOutOfRange {
                offset,
                length,
                len,
            }),
        }
    }

    /// `data[offset + k * step]` for `k < count`.
    pub fn strided(data: &'a mut [T], offset: usize, count: usize, step: usize) -> Result<Self> {
        if step == 0 {
            return Err(Error::ZeroStep);
        }
        let len = data.len();
        let out_of_range = Error::WindowOutOfRange {
            offset,
            length: count,
            len,
        };
        if count == 0 {
            return if offset <= len {
                Ok(Self {
                    data,
                    offset,
                    count,
                    step,
                })
            } else {
                Err(out_of_range)
            };
        }
        let last = (count - 1)
            .checked_mul(step)
            .and_then(|span| span.checked_add(offset));
        match last {
            Some(last) if last < len => Ok(Self {
                data,
                offset,
                count,
                step,
            }),
            _ => Err(out_of_range),
        }
    }
}

impl<T: Sample> SampleLane for StridedLane<'_, T> {
    type Item = T;

    #[inline]
    fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        self.data[self.offset + index * self.step]
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        self.data[self.offset + index * self.step] = value;
    }
}

impl<T: Sample> SampleLane for ArrayViewMut1<'_, T> {
    type Item = T;

    #[inline]
    fn len(&self) -> usize {
        ArrayViewMut1::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        self[index]
    }

    #[inline]
    fn set(&mut self, index: usize, value: T) {
        self[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_window_bounds() {
        let mut data = [0u8; 8];
        assert!(StridedLane::window(&mut data, 2, 6).is_ok());
        assert!(StridedLane::window(&mut data, 8, 0).is_ok());
        assert!(matches!(
            StridedLane::window(&mut data, 3, 6),
            Err(Error::WindowOutOfRange { offset: 3, length: 6, len: 8 })
        ));
        assert!(StridedLane::window(&mut data, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_strided_bounds() {
        let mut data = [0u16; 10];
        assert!(StridedLane::strided(&mut data, 0, 4, 3).is_ok()); // last = 9
        assert!(StridedLane::strided(&mut data, 1, 3, 4).is_ok()); // last = 9
        assert!(matches!(
            StridedLane::strided(&mut data, 1, 4, 3), // last = 10
            Err(Error::WindowOutOfRange { offset: 1, length: 4, len: 10 })
        ));
        assert!(StridedLane::strided(&mut data, 2, 4, 3).is_err()); // last = 11
        assert!(matches!(
            StridedLane::strided(&mut data, 0, 2, 0),
            Err(Error::ZeroStep)
        ));
        assert!(StridedLane::strided(&mut data, 0, 2, usize::MAX).is_err());
        assert!(StridedLane::strided(&mut data, 10, 0, 5).is_ok());
        assert!(StridedLane::strided(&mut data, 11, 0, 5).is_err());
    }

    #[test]
    fn test_strided_addressing() {
        let mut data: Vec<i64> = (0..9).collect();
        let mut lane = StridedLane::strided(&mut data, 1, 3, 3).unwrap();
        assert_eq!(lane.len(), 3);
        assert_eq!(lane.get(2), 7);
        lane.set(1, -4);
        assert_eq!(data[4], -4);
    }

    #[test]
    fn test_ndarray_column_lane() {
        let mut plane = Array2::<f32>::zeros((3, 2));
        plane[[2, 1]] = 5.0;
        let mut column = plane.column_mut(1);
        assert_eq!(SampleLane::len(&column), 3);
        assert_eq!(SampleLane::get(&column, 2), 5.0);
        SampleLane::set(&mut column, 0, 1.5);
        assert_eq!(plane[[0, 1]], 1.5);
    }
}
