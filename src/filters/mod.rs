//! Row kernels.
//!
//! ## Supported Element Types
//!
//! | Type | Level | Description |
//! |------|-------|-------------|
//! | u8 | u32 | 8-bit samples, unsigned 0-255 |
//! | u16 | u32 | 16-bit samples, unsigned 0-65535 |
//! | i64 | i128 | signed samples, full range |
//! | f32 | f64 | float samples |
//!
//! Every kernel works in place on caller-owned storage: a contiguous
//! window of a slice, a strided lane (image column, single channel of
//! interleaved pixels) or a 1-D `ndarray` view.
//!
//! ## Kernels
//!
//! - **Slopes**: [`slopes::SlopeEmphasizer`] turns short steep slopes into
//!   step edges (all element types)
//! - **Averaging**: [`averaging::FastExactDivider`] and
//!   [`averaging::BoxAverager`] compute exact box means without integer
//!   division (u8, u16)

pub mod sample;
pub mod lane;
pub mod slopes;
pub mod averaging;
