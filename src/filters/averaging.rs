//! Division-free exact averaging.
//!
//! Box filters divide a window sum by the window size once per pixel and
//! channel. [`FastExactDivider`] replaces that division by a multiplication
//! with a precomputed `f64` reciprocal while staying bit-exact with integer
//! floor division for every sum in `[0, max_sum]`.
//!
//! ## Exactness
//!
//! - **Single stage** (`floor(sum * (1/n))`): used only when `n` is a power
//!   of two. Then `1/n` is exactly representable and `sum * (1/n)` is exact
//!   for every `sum < 2^53`.
//! - **Two stage**: the same product gives an estimate, then one comparison
//!   of `estimate * n` against `sum` corrects it by ±1. For `sum <= 2^50`
//!   the rounded product is within `2^50 * 2^-52 = 1/4` of `sum / n`, so the
//!   estimate is never off by more than one and the correction makes it
//!   exact for *any* window size.
//!
//! A plain `sum * (1.0 / n)` is not exact in general: `n = 49` already fails
//! below `255 * 49`.
//!
//! [`BoxAverager`] applies the divider to sliding 1-D box means of `u8` and
//! `u16` rows.

use std::marker::PhantomData;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filters::sample::{ElementType, IntegerSample};

/// Largest window size and sum accepted by [`FastExactDivider`].
pub const MAX_EXACT_SUM: u64 = 1 << 50;

// ============================================================================
// Divider
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastExactDivider {
    window_size: u64,
    max_sum: u64,
    reciprocal: f64,
    two_stage: bool,
}

impl FastExactDivider {
    /// Prepare division by `window_size` for sums in `[0, max_sum]`.
    ///
    /// Picks the single-stage path when it is provably exact, the two-stage
    /// path otherwise.
    pub fn configure(window_size: u64, max_sum: u64) -> Result<Self> {
        Self::check_domain(window_size, max_sum)?;
        let two_stage = !window_size.is_power_of_two();
        Ok(Self::new(window_size, max_sum, two_stage))
    }

    /// Like [`configure`](Self::configure), but always applies the correction step.
    pub fn configure_two_stage(window_size: u64, max_sum: u64) -> Result<Self> {
        Self::check_domain(window_size, max_sum)?;
        Ok(Self::new(window_size, max_sum, true))
    }

    /// Divider for means of `window_size` samples of the given type:
    /// `max_sum = max_level * window_size`.
    pub fn for_element_type(element_type: ElementType, window_size: u64) -> Result<Self> {
        let max_level = element_type
            .unsigned_max()
            .ok_or(Error::UnboundedElementType { element_type })?;
        Self::check_window_size(window_size)?;
        let max_sum = max_level
            .checked_mul(window_size)
            .ok_or(Error::MaxSumTooLarge {
                max_sum: u64::MAX,
                limit: MAX_EXACT_SUM,
            })?;
        Self::configure(window_size, max_sum)
    }

    pub fn for_samples<T: IntegerSample>(window_size: u64) -> Result<Self> {
        Self::for_element_type(T::ELEMENT_TYPE, window_size)
    }

    fn new(window_size: u64, max_sum: u64, two_stage: bool) -> Self {
        let reciprocal = 1.0 / window_size as f64;
        debug!(
            "fast divider: window_size={window_size}, max_sum={max_sum}, reciprocal={reciprocal:e}, two_stage={two_stage}"
        );
        Self {
            window_size,
            max_sum,
            reciprocal,
            two_stage,
        }
    }

    fn check_window_size(window_size: u64) -> Result<()> {
        if window_size == 0 || window_size > MAX_EXACT_SUM {
            return Err(Error::InvalidWindowSize {
                window_size,
                limit: MAX_EXACT_SUM,
            });
        }
        Ok(())
    }

    fn check_domain(window_size: u64, max_sum: u64) -> Result<()> {
        Self::check_window_size(window_size)?;
        if max_sum > MAX_EXACT_SUM {
            return Err(Error::MaxSumTooLarge {
                max_sum,
                limit: MAX_EXACT_SUM,
            });
        }
        Ok(())
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    pub fn max_sum(&self) -> u64 {
        self.max_sum
    }

    pub fn reciprocal(&self) -> f64 {
        self.reciprocal
    }

    pub fn is_two_stage(&self) -> bool {
        self.two_stage
    }

    /// `sum / window_size`, rounded down.
    ///
    /// # Panics
    ///
    /// Panics if `sum > max_sum`: outside the declared domain the result is
    /// not guaranteed, and a silently wrong quotient is worse than a crash.
    #[inline]
    pub fn divide(&self, sum: u64) -> u64 {
        assert!(
            sum <= self.max_sum,
            "sum {sum} exceeds the declared maximum {}",
            self.max_sum
        );
        self.divide_unchecked(sum)
    }

    /// Checked variant of [`divide`](Self::divide).
    pub fn try_divide(&self, sum: u64) -> Result<u64> {
        if sum > self.max_sum {
            return Err(Error::SumOutOfRange {
                sum,
                max_sum: self.max_sum,
            });
        }
        Ok(self.divide_unchecked(sum))
    }

    #[inline]
    fn divide_unchecked(&self, sum: u64) -> u64 {
        let estimate = (sum as f64 * self.reciprocal) as u64;
        if !self.two_stage {
            return estimate;
        }
        // estimate is within one of the quotient; estimate * n <= sum + n cannot overflow
        let product = estimate * self.window_size;
        if product > sum {
            estimate - 1
        } else if sum - product >= self.window_size {
            estimate + 1
        } else {
            estimate
        }
    }
}

// ============================================================================
// Box averaging
// ============================================================================

/// Settings of a [`BoxAverager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxAveragerParams {
    pub window_size: usize,
    /// Round means half up instead of down.
    pub rounding: bool,
    /// Use plain integer division (reference path) instead of the reciprocal.
    pub strict_division: bool,
}

impl Default for BoxAveragerParams {
    fn default() -> Self {
        Self {
            window_size: 3,
            rounding: true,
            strict_division: false,
        }
    }
}

/// Sliding box mean over rows of `u8` or `u16` samples.
#[derive(Debug, Clone, Copy)]
pub struct BoxAverager<T> {
    params: BoxAveragerParams,
    divider: FastExactDivider,
    _marker: PhantomData<T>,
}

impl<T: IntegerSample> BoxAverager<T> {
    pub fn new(params: BoxAveragerParams) -> Result<Self> {
        let window_size = params.window_size as u64;
        FastExactDivider::check_window_size(window_size)?;
        let half = if params.rounding { window_size / 2 } else { 0 };
        // the rounding bias widens the domain of the divider
        let max_sum = T::MAX_LEVEL
            .checked_mul(window_size)
            .and_then(|sum| sum.checked_add(half))
            .ok_or(Error::MaxSumTooLarge {
                max_sum: u64::MAX,
                limit: MAX_EXACT_SUM,
            })?;
        let divider = FastExactDivider::configure(window_size, max_sum)?;
        debug!(
            "box averager: element_type={}, window_size={}, rounding={}, strict_division={}",
            T::ELEMENT_TYPE,
            params.window_size,
            params.rounding,
            params.strict_division
        );
        Ok(Self {
            params,
            divider,
            _marker: PhantomData,
        })
    }

    pub fn params(&self) -> &BoxAveragerParams {
        &self.params
    }

    pub fn divider(&self) -> &FastExactDivider {
        &self.divider
    }

    /// Number of full windows in a row of `len` samples.
    pub fn output_len(&self, len: usize) -> usize {
        (len + 1).saturating_sub(self.params.window_size)
    }

    /// Write the mean of every full window of `src` into `dst`.
    ///
    /// `dst[k]` is the mean of `src[k..k + window_size]`.
    pub fn average(&self, src: &[T], dst: &mut [T]) -> Result<()> {
        let expected = self.output_len(src.len());
        if dst.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: dst.len(),
            });
        }
        self.average_into(src, dst);
        Ok(())
    }

    /// Allocating variant of [`average`](Self::average).
    pub fn averaged(&self, src: &[T]) -> Vec<T> {
        let mut dst = vec![T::from_u64_saturating(0); self.output_len(src.len())];
        self.average_into(src, &mut dst);
        dst
    }

    /// `dst.len()` must be `output_len(src.len())`.
    fn average_into(&self, src: &[T], dst: &mut [T]) {
        debug_assert_eq!(dst.len(), self.output_len(src.len()));
        if dst.is_empty() {
            return;
        }
        let n = self.params.window_size;
        let window_size = n as u64;
        let half = if self.params.rounding { window_size / 2 } else { 0 };

        let mut sum: u64 = src[..n].iter().map(|&v| v.to_u64()).sum();
        for (k, out) in dst.iter_mut().enumerate() {
            if k > 0 {
                sum = sum + src[k + n - 1].to_u64() - src[k - 1].to_u64();
            }
            let mean = if self.params.strict_division {
                (sum + half) / window_size
            } else {
                self.divider.divide(sum + half)
            };
            *out = T::from_u64_saturating(mean);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two_is_single_stage() {
        for shift in 0..=13 {
            let divider = FastExactDivider::for_element_type(ElementType::U8, 1 << shift).unwrap();
            assert!(!divider.is_two_stage());
            assert_eq!(divider.max_sum(), 255 << shift);
            assert_eq!(divider.reciprocal(), 1.0 / (1u64 << shift) as f64);
        }
    }

    #[test]
    fn test_other_sizes_are_two_stage() {
        let divider = FastExactDivider::configure(49, 255 * 49).unwrap();
        assert!(divider.is_two_stage());
        assert_eq!(divider.window_size(), 49);
    }

    #[test]
    fn test_plain_reciprocal_is_not_exact_for_49() {
        let reciprocal = 1.0 / 49.0;
        let inexact = (0..255 * 49u64).any(|sum| (sum as f64 * reciprocal) as u64 != sum / 49);
        assert!(inexact);
    }

    #[test]
    fn test_two_stage_exact_for_small_windows() {
        for n in 1..=64u64 {
            let divider = FastExactDivider::configure(n, 255 * n).unwrap();
            for sum in 0..=255 * n {
                assert_eq!(divider.divide(sum), sum / n, "{sum}/{n}");
            }
        }
    }

    #[test]
    fn test_forced_two_stage_matches_single_stage() {
        let single = FastExactDivider::configure(16, 65535 * 16).unwrap();
        let corrected = FastExactDivider::configure_two_stage(16, 65535 * 16).unwrap();
        assert!(corrected.is_two_stage());
        for sum in (0..=65535 * 16).step_by(7) {
            assert_eq!(single.divide(sum), corrected.divide(sum));
        }
    }

    #[test]
    fn test_two_stage_near_the_domain_limit() {
        for n in [3u64, 7, 49, 255, 1_000_003, (1 << 20) - 1] {
            let divider = FastExactDivider::configure(n, MAX_EXACT_SUM).unwrap();
            let top = MAX_EXACT_SUM;
            for sum in top - 4 * n..=top {
                assert_eq!(divider.divide(sum), sum / n, "{sum}/{n}");
            }
            for q in [top / n - 1, top / n] {
                for sum in [q * n, q * n + n - 1, (q * n).saturating_sub(1)] {
                    if sum <= top {
                        assert_eq!(divider.divide(sum), sum / n, "{sum}/{n}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_domain_sum() {
        let divider = FastExactDivider::for_samples::<u8>(9).unwrap();
        assert_eq!(divider.try_divide(255 * 9).unwrap(), 255);
        assert!(matches!(
            divider.try_divide(255 * 9 + 1),
            Err(Error::SumOutOfRange { sum: 2296, max_sum: 2295 })
        ));
    }

    #[test]
    #[should_panic(expected = "exceeds the declared maximum")]
    fn test_divide_panics_outside_domain() {
        let divider = FastExactDivider::configure(4, 100).unwrap();
        divider.divide(101);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            FastExactDivider::configure(0, 10),
            Err(Error::InvalidWindowSize { window_size: 0, .. })
        ));
        assert!(matches!(
            FastExactDivider::configure(3, MAX_EXACT_SUM + 1),
            Err(Error::MaxSumTooLarge { .. })
        ));
        assert!(matches!(
            FastExactDivider::for_element_type(ElementType::F32, 4),
            Err(Error::UnboundedElementType { element_type: ElementType::F32 })
        ));
        assert!(matches!(
            FastExactDivider::for_element_type(ElementType::I64, 4),
            Err(Error::UnboundedElementType { .. })
        ));
    }

    #[test]
    fn test_box_mean_truncating() {
        let averager = BoxAverager::<u8>::new(BoxAveragerParams {
            window_size: 3,
            rounding: false,
            strict_division: false,
        })
        .unwrap();
        let src = [0u8, 1, 2, 255, 255, 255, 10];
        let mut dst = [0u8; 5];
        averager.average(&src, &mut dst).unwrap();
        // sums 3, 258, 512, 765, 520
        assert_eq!(dst, [1, 86, 170, 255, 173]);
    }

    #[test]
    fn test_box_mean_rounding() {
        let averager = BoxAverager::<u16>::new(BoxAveragerParams {
            window_size: 4,
            rounding: true,
            strict_division: false,
        })
        .unwrap();
        let src = [1u16, 2, 2, 1, 65535, 65535, 65535, 65535];
        // sums 6, 65540, 131073, 196606, 262140
        assert_eq!(averager.averaged(&src), vec![2, 16385, 32768, 49152, 65535]);
    }

    #[test]
    fn test_strict_division_agrees() {
        let base = BoxAveragerParams {
            window_size: 7,
            rounding: true,
            strict_division: false,
        };
        let fast = BoxAverager::<u8>::new(base).unwrap();
        let strict = BoxAverager::<u8>::new(BoxAveragerParams {
            strict_division: true,
            ..base
        })
        .unwrap();
        let src: Vec<u8> = (0..500u32).map(|k| (k * 37 % 256) as u8).collect();
        assert_eq!(fast.averaged(&src), strict.averaged(&src));
    }

    #[test]
    fn test_allocating_and_in_place_means_agree() {
        let averager = BoxAverager::<u16>::new(BoxAveragerParams {
            window_size: 5,
            rounding: false,
            strict_division: false,
        })
        .unwrap();
        let src: Vec<u16> = (0..40u32).map(|k| (k * 1_777 % 65_536) as u16).collect();
        let mut dst = vec![0u16; averager.output_len(src.len())];
        averager.average(&src, &mut dst).unwrap();
        assert_eq!(dst.len(), 36);
        assert_eq!(averager.averaged(&src), dst);
        assert!(averager.averaged(&src[..4]).is_empty());
        assert_eq!(averager.averaged(&src[..5]), vec![dst[0]]);
    }

    #[test]
    fn test_short_rows_and_length_mismatch() {
        let averager = BoxAverager::<u8>::new(BoxAveragerParams::default()).unwrap();
        assert!(averager.averaged(&[1, 2]).is_empty());
        assert_eq!(averager.output_len(3), 1);

        let mut dst = [0u8; 2];
        assert!(matches!(
            averager.average(&[1, 2, 3], &mut dst),
            Err(Error::LengthMismatch { expected: 1, actual: 2 })
        ));
        assert!(matches!(
            BoxAverager::<u8>::new(BoxAveragerParams {
                window_size: 0,
                ..BoxAveragerParams::default()
            }),
            Err(Error::InvalidWindowSize { .. })
        ));
    }
}
