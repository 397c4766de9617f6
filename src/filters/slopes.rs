//! Slope emphasis: sharpening of gradual transitions in a row.
//!
//! A *slope* is a strictly monotonic run `V(x1) < ... < V(x2)` (or `>`)
//! bounded by local extrema. A slope is emphasized when its total change
//! `|V(x2) - V(x1)|` reaches `minimal_change` and it spans at most
//! `slope_width` samples. With `allow_long_slopes`, a longer slope is still
//! emphasized on every maximal sub-range whose every `slope_width`-sample
//! window changes by at least `minimal_change`.
//!
//! Emphasis replaces every interior sample with the nearest of the two end
//! levels, turning the slope into a step of width 1. A sample exactly at the
//! midpoint goes to the end level.
//!
//! ## Midpoint arithmetic
//!
//! Integer levels are compared against an integer split:
//! - ascending: `V < ceil((L + R) / 2)` with `exact_half_sum`, which is
//!   exactly `V < (L + R) / 2`; `V < floor((L + R) / 2)` otherwise;
//! - descending: `V > floor((L + R) / 2)`, exact in both modes.
//!
//! Float samples always use the exact midpoint computed in `f64`, so in
//! exact mode the same magnitudes stored as `u8`, `u16`, `i64` or `f32`
//! give the same result.
//!
//! ## Supported Formats
//!
//! | Type | Level | Notes |
//! |------|-------|-------|
//! | u8 | u32 | unsigned magnitude 0-255 |
//! | u16 | u32 | unsigned magnitude 0-65535 |
//! | i64 | i128 | full signed range, no wraparound |
//! | f32 | f64 | exact midpoint |

use log::debug;
use ndarray::ArrayViewMut1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filters::lane::{SampleLane, StridedLane};
use crate::filters::sample::{ChangeThreshold, Sample, SamplesMut};

// ============================================================================
// Parameters
// ============================================================================

/// Mutable, serde-loadable settings of a [`SlopeEmphasizer`].
///
/// Validated into an immutable snapshot by [`SlopeEmphasizerParams::build`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeEmphasizerParams {
    /// Maximal number of samples in a slope that is emphasized as a whole.
    pub slope_width: usize,
    /// Minimal total change of the function along an emphasized slope.
    pub minimal_change: f64,
    pub process_ascending: bool,
    pub process_descending: bool,
    /// Emphasize steep parts of slopes longer than `slope_width`.
    pub allow_long_slopes: bool,
    /// Split ascending integer slopes at the exact midpoint instead of its floor.
    pub exact_half_sum: bool,
}

impl Default for SlopeEmphasizerParams {
    fn default() -> Self {
        Self {
            slope_width: 1,
            minimal_change: 0.0,
            process_ascending: false,
            process_descending: false,
            allow_long_slopes: false,
            exact_half_sum: false,
        }
    }
}

impl SlopeEmphasizerParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slope_width(mut self, slope_width: usize) -> Self {
        self.slope_width = slope_width;
        self
    }

    pub fn with_minimal_change(mut self, minimal_change: f64) -> Self {
        self.minimal_change = minimal_change;
        self
    }

    pub fn with_process_ascending(mut self, process_ascending: bool) -> Self {
        self.process_ascending = process_ascending;
        self
    }

    pub fn with_process_descending(mut self, process_descending: bool) -> Self {
        self.process_descending = process_descending;
        self
    }

    pub fn with_allow_long_slopes(mut self, allow_long_slopes: bool) -> Self {
        self.allow_long_slopes = allow_long_slopes;
        self
    }

    pub fn with_exact_half_sum(mut self, exact_half_sum: bool) -> Self {
        self.exact_half_sum = exact_half_sum;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.slope_width == 0 {
            return Err(Error::InvalidSlopeWidth(self.slope_width));
        }
        // NaN fails this comparison as well
        if !(self.minimal_change >= 0.0) {
            return Err(Error::InvalidMinimalChange(self.minimal_change));
        }
        Ok(())
    }

    /// Validate and freeze the settings.
    pub fn build(self) -> Result<SlopeEmphasizer> {
        self.validate()?;
        debug!(
            "slope emphasizer: width={}, minimal_change={}, ascending={}, descending={}, long={}, exact_half_sum={}",
            self.slope_width,
            self.minimal_change,
            self.process_ascending,
            self.process_descending,
            self.allow_long_slopes,
            self.exact_half_sum
        );
        Ok(SlopeEmphasizer {
            params: self,
            threshold: ChangeThreshold::new(self.minimal_change),
        })
    }
}

// ============================================================================
// Emphasizer
// ============================================================================

/// Immutable, validated slope emphasizer.
///
/// Cheap to copy and safe to share between threads; one instance is
/// normally reused for every row of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeEmphasizer {
    params: SlopeEmphasizerParams,
    threshold: ChangeThreshold,
}

impl SlopeEmphasizer {
    pub fn builder() -> SlopeEmphasizerParams {
        SlopeEmphasizerParams::new()
    }

    pub fn params(&self) -> &SlopeEmphasizerParams {
        &self.params
    }

    /// Emphasize slopes inside `values[offset..offset + length]`.
    ///
    /// The range is checked before any sample is touched; `length == 0` is a
    /// no-op for every `offset <= values.len()`.
    pub fn emphasize<T: Sample>(&self, values: &mut [T], offset: usize, length: usize) -> Result<()> {
        let mut lane = StridedLane::window(values, offset, length)?;
        self.emphasize_lane(&mut lane);
        Ok(())
    }

    /// Emphasize slopes of the whole buffer.
    pub fn emphasize_all<T: Sample>(&self, values: &mut [T]) {
        self.emphasize_lane(&mut StridedLane::contiguous(values));
    }

    /// Emphasize slopes of `values[offset + k * step]`, `k < count`.
    ///
    /// Processes an image column (`step` = row stride) or one channel of
    /// interleaved pixels (`step` = channel count) in place.
    pub fn emphasize_strided<T: Sample>(
        &self,
        values: &mut [T],
        offset: usize,
        count: usize,
        step: usize,
    ) -> Result<()> {
        let mut lane = StridedLane::strided(values, offset, count, step)?;
        self.emphasize_lane(&mut lane);
        Ok(())
    }

    /// Emphasize slopes of a 1-D `ndarray` view of any stride.
    pub fn emphasize_view<T: Sample>(&self, mut view: ArrayViewMut1<'_, T>) {
        if let Some(values) = view.as_slice_mut() {
            self.emphasize_all(values);
            return;
        }
        self.emphasize_lane(&mut view);
    }

    /// Runtime-typed entry point: the element type is resolved once here.
    pub fn emphasize_samples(&self, samples: SamplesMut<'_>, offset: usize, length: usize) -> Result<()> {
        match samples {
            SamplesMut::U8(values) => self.emphasize(values, offset, length),
            SamplesMut::U16(values) => self.emphasize(values, offset, length),
            SamplesMut::I64(values) => self.emphasize(values, offset, length),
            SamplesMut::F32(values) => self.emphasize(values, offset, length),
        }
    }

    /// Allocating variant: returns an emphasized copy of `values`.
    pub fn emphasized<T: Sample>(&self, values: &[T]) -> Vec<T> {
        let mut result = values.to_vec();
        self.emphasize_all(&mut result);
        result
    }

    /// Single left-to-right pass over a lane.
    pub fn emphasize_lane<L: SampleLane>(&self, lane: &mut L) {
        let count = lane.len();
        if count == 0 || (!self.params.process_ascending && !self.params.process_descending) {
            return;
        }
        let last = count - 1;
        let mut p = 0;
        let mut left = lane.get(p);
        loop {
            let mut v;
            loop {
                p += 1;
                if p >= last {
                    return;
                }
                v = lane.get(p);
                if v != left {
                    break;
                }
            }
            // p - 1 is the left boundary of the slope, p its first inner sample
            let mut q = p + 1;
            p -= 1;
            if v.level() > left.level() {
                while q <= last {
                    let probe = lane.get(q);
                    if !(probe.level() > v.level()) {
                        break;
                    }
                    v = probe;
                    q += 1;
                }
                q -= 1;
                // q is a local maximum or the start of a plateau
                if self.params.process_ascending && L::Item::change_reaches(left, v, &self.threshold) {
                    self.analyze_ascending(lane, p, q, left, v);
                }
            } else {
                while q <= last {
                    let probe = lane.get(q);
                    if !(probe.level() < v.level()) {
                        break;
                    }
                    v = probe;
                    q += 1;
                }
                q -= 1;
                // q is a local minimum or the start of a plateau
                if self.params.process_descending && L::Item::change_reaches(v, left, &self.threshold) {
                    self.analyze_descending(lane, p, q, left, v);
                }
            }
            left = v;
            p = q;
        }
    }

    fn analyze_ascending<L: SampleLane>(
        &self,
        lane: &mut L,
        first: usize,
        last: usize,
        left_value: L::Item,
        right_value: L::Item,
    ) {
        debug_assert!(first < last);
        debug_assert!(left_value.level() < right_value.level());
        let d = self.params.slope_width - 1;
        if last - first <= d {
            self.fill_ascending(lane, first, last, left_value, right_value);
            return;
        }
        if !self.params.allow_long_slopes {
            return;
        }
        let threshold = &self.threshold;
        let mut p = first;
        let mut q = first + d;
        let mut left = left_value;
        let mut right = lane.get(q);
        loop {
            while !L::Item::change_reaches(left, right, threshold) {
                p += 1;
                q += 1;
                if q > last {
                    return;
                }
                left = lane.get(p);
                right = lane.get(q);
            }
            // every window p..p+d, p+1..p+1+d, ..., q-d..q changes enough
            while q < last {
                let probe_q = q + 1;
                let probe_left = lane.get(probe_q - d);
                let probe_right = lane.get(probe_q);
                if !L::Item::change_reaches(probe_left, probe_right, threshold) {
                    break;
                }
                q = probe_q;
                right = probe_right;
            }
            self.fill_ascending(lane, p, q, left, right);
            // q+1-d..q+1 is already a weak window
            if q + 1 >= last {
                return;
            }
            q += 2;
            p = q - d;
            left = lane.get(p);
            right = lane.get(q);
        }
    }

    fn analyze_descending<L: SampleLane>(
        &self,
        lane: &mut L,
        first: usize,
        last: usize,
        left_value: L::Item,
        right_value: L::Item,
    ) {
        debug_assert!(first < last);
        debug_assert!(left_value.level() > right_value.level());
        let d = self.params.slope_width - 1;
        if last - first <= d {
            self.fill_descending(lane, first, last, left_value, right_value);
            return;
        }
        if !self.params.allow_long_slopes {
            return;
        }
        let threshold = &self.threshold;
        let mut p = first;
        let mut q = first + d;
        let mut left = left_value;
        let mut right = lane.get(q);
        loop {
            while !L::Item::change_reaches(right, left, threshold) {
                p += 1;
                q += 1;
                if q > last {
                    return;
                }
                left = lane.get(p);
                right = lane.get(q);
            }
            while q < last {
                let probe_q = q + 1;
                let probe_left = lane.get(probe_q - d);
                let probe_right = lane.get(probe_q);
                if !L::Item::change_reaches(probe_right, probe_left, threshold) {
                    break;
                }
                q = probe_q;
                right = probe_right;
            }
            self.fill_descending(lane, p, q, left, right);
            if q + 1 >= last {
                return;
            }
            q += 2;
            p = q - d;
            left = lane.get(p);
            right = lane.get(q);
        }
    }

    /// Replace the interior of `first..=last` by `left` below the split and
    /// by `right` from the split on.
    fn fill_ascending<L: SampleLane>(&self, lane: &mut L, first: usize, last: usize, left: L::Item, right: L::Item) {
        let split = L::Item::ascending_split(left, right, self.params.exact_half_sum);
        let mut p = first + 1;
        while p < last && lane.get(p).level() < split {
            lane.set(p, left);
            p += 1;
        }
        while p < last {
            lane.set(p, right);
            p += 1;
        }
    }

    fn fill_descending<L: SampleLane>(&self, lane: &mut L, first: usize, last: usize, left: L::Item, right: L::Item) {
        // floor of the midpoint keeps the comparison exact for integers
        let split = L::Item::descending_split(right, left);
        let mut p = first + 1;
        while p < last && lane.get(p).level() > split {
            lane.set(p, left);
            p += 1;
        }
        while p < last {
            lane.set(p, right);
            p += 1;
        }
    }
}
