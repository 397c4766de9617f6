//! Sample types understood by the row kernels.
//!
//! Four element types are specialized: `u8`, `u16`, `i64` and `f32`.
//! 8- and 16-bit samples are unsigned magnitudes (pixel semantics), so a
//! stored `0xFF` byte is the level 255. Every specialization exposes a
//! *level* in a wider type, and all comparisons, differences and half sums
//! are evaluated on levels, never on the narrow storage type.
//!
//! The specialization is resolved at compile time through the [`Sample`]
//! trait. [`SamplesMut`] is the runtime-typed counterpart for callers that
//! only know the element type of a buffer at run time; it is matched once
//! per call, outside the hot loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Element type of a row buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "float32")]
    F32,
}

impl ElementType {
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::I64 => "int64",
            Self::F32 => "float32",
        }
    }

    /// Largest level of an unsigned integer element type.
    ///
    /// `None` for types without a bounded non-negative domain.
    pub fn unsigned_max(self) -> Option<u64> {
        match self {
            Self::U8 => Some(u64::from(u8::MAX)),
            Self::U16 => Some(u64::from(u16::MAX)),
            Self::I64 | Self::F32 => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u8" | "uint8" => Ok(Self::U8),
            "u16" | "uint16" => Ok(Self::U16),
            "i64" | "int64" => Ok(Self::I64),
            "f32" | "float32" => Ok(Self::F32),
            _ => Err(Error::UnsupportedElementType(s.to_string())),
        }
    }
}

/// Minimal change precomputed for both integer and floating levels.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeThreshold {
    real: f64,
    /// `ceil(real)`: for integer levels `diff >= real` iff `diff >= ceil(real)`.
    integral: i128,
}

impl ChangeThreshold {
    pub fn new(minimal_change: f64) -> Self {
        Self {
            real: minimal_change,
            integral: minimal_change.ceil() as i128,
        }
    }
}

/// One numeric sample of a row.
pub trait Sample: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Wide representation used for comparisons and midpoints.
    type Level: Copy + PartialOrd + fmt::Debug;

    const ELEMENT_TYPE: ElementType;

    fn level(self) -> Self::Level;

    /// `greater - less >= threshold`, evaluated without wraparound.
    #[doc(hidden)]
    fn change_reaches(less: Self, greater: Self, threshold: &ChangeThreshold) -> bool;

    /// Split level of an ascending run: samples strictly below it join the
    /// lower plateau. `ceil((less + greater) / 2)` in exact mode,
    /// `floor((less + greater) / 2)` otherwise.
    fn ascending_split(less: Self, greater: Self, exact: bool) -> Self::Level;

    /// Split level of a descending run: samples strictly above it join the
    /// upper plateau. Always `floor((less + greater) / 2)`.
    fn descending_split(less: Self, greater: Self) -> Self::Level;
}

macro_rules! impl_unsigned_sample {
    ($t:ty, $variant:ident) => {
        impl Sample for $t {
            type Level = u32;

            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn level(self) -> u32 {
                u32::from(self)
            }

            #[inline]
            fn change_reaches(less: Self, greater: Self, threshold: &ChangeThreshold) -> bool {
                i128::from(greater) - i128::from(less) >= threshold.integral
            }

            #[inline]
            fn ascending_split(less: Self, greater: Self, exact: bool) -> u32 {
                (u32::from(less) + u32::from(greater) + u32::from(exact)) >> 1
            }

            #[inline]
            fn descending_split(less: Self, greater: Self) -> u32 {
                (u32::from(less) + u32::from(greater)) >> 1
            }
        }
    };
}

impl_unsigned_sample!(u8, U8);
impl_unsigned_sample!(u16, U16);

impl Sample for i64 {
    type Level = i128;

    const ELEMENT_TYPE: ElementType = ElementType::I64;

    #[inline]
    fn level(self) -> i128 {
        i128::from(self)
    }

    #[inline]
    fn change_reaches(less: Self, greater: Self, threshold: &ChangeThreshold) -> bool {
        i128::from(greater) - i128::from(less) >= threshold.integral
    }

    #[inline]
    fn ascending_split(less: Self, greater: Self, exact: bool) -> i128 {
        // Arithmetic shift floors negative sums as well.
        (i128::from(less) + i128::from(greater) + i128::from(exact)) >> 1
    }

    #[inline]
    fn descending_split(less: Self, greater: Self) -> i128 {
        (i128::from(less) + i128::from(greater)) >> 1
    }
}

impl Sample for f32 {
    type Level = f64;

    const ELEMENT_TYPE: ElementType = ElementType::F32;

    #[inline]
    fn level(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn change_reaches(less: Self, greater: Self, threshold: &ChangeThreshold) -> bool {
        f64::from(greater) - f64::from(less) >= threshold.real
    }

    #[inline]
    fn ascending_split(less: Self, greater: Self, _exact: bool) -> f64 {
        0.5 * (f64::from(less) + f64::from(greater))
    }

    #[inline]
    fn descending_split(less: Self, greater: Self) -> f64 {
        0.5 * (f64::from(less) + f64::from(greater))
    }
}

/// Unsigned integer samples with a bounded domain, usable for averaging.
pub trait IntegerSample: Sample {
    const MAX_LEVEL: u64;

    fn to_u64(self) -> u64;

    fn from_u64_saturating(value: u64) -> Self;
}

impl IntegerSample for u8 {
    const MAX_LEVEL: u64 = u8::MAX as u64;

    #[inline]
    fn to_u64(self) -> u64 {
        u64::from(self)
    }

    #[inline]
    fn from_u64_saturating(value: u64) -> Self {
        value.min(Self::MAX_LEVEL) as u8
    }
}

impl IntegerSample for u16 {
    const MAX_LEVEL: u64 = u16::MAX as u64;

    #[inline]
    fn to_u64(self) -> u64 {
        u64::from(self)
    }

    #[inline]
    fn from_u64_saturating(value: u64) -> Self {
        value.min(Self::MAX_LEVEL) as u16
    }
}

/// Mutable row buffer whose element type is known only at run time.
#[derive(Debug)]
pub enum SamplesMut<'a> {
    U8(&'a mut [u8]),
    U16(&'a mut [u16]),
    I64(&'a mut [i64]),
    F32(&'a mut [f32]),
}

impl SamplesMut<'_> {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::U8,
            Self::U16(_) => ElementType::U16,
            Self::I64(_) => ElementType::I64,
            Self::F32(_) => ElementType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a mut [u8]> for SamplesMut<'a> {
    fn from(values: &'a mut [u8]) -> Self {
        Self::U8(values)
    }
}

impl<'a> From<&'a mut [u16]> for SamplesMut<'a> {
    fn from(values: &'a mut [u16]) -> Self {
        Self::U16(values)
    }
}

impl<'a> From<&'a mut [i64]> for SamplesMut<'a> {
    fn from(values: &'a mut [i64]) -> Self {
        Self::I64(values)
    }
}

impl<'a> From<&'a mut [f32]> for SamplesMut<'a> {
    fn from(values: &'a mut [f32]) -> Self {
        Self::F32(values)
    }
}
