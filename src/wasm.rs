//! WebAssembly exports for the row kernels.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Bit Depth Support
//!
//! Slope emphasis has two versions:
//! - **u8**: `Uint8Array` rows, 0-255
//! - **f32**: `Float32Array` rows
//!
//! Both versions modify the typed array in place and share the Rust
//! implementation. Errors are thrown as JavaScript strings.

use wasm_bindgen::prelude::*;

use crate::error::Error;
use crate::filters::averaging::{BoxAverager, BoxAveragerParams};
use crate::filters::sample::Sample;
use crate::filters::slopes::{SlopeEmphasizer, SlopeEmphasizerParams};

fn to_js_err(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn emphasizer(
    slope_width: usize,
    minimal_change: f64,
    process_ascending: bool,
    process_descending: bool,
    allow_long_slopes: bool,
    exact_half_sum: bool,
) -> Result<SlopeEmphasizer, JsValue> {
    SlopeEmphasizerParams {
        slope_width,
        minimal_change,
        process_ascending,
        process_descending,
        allow_long_slopes,
        exact_half_sum,
    }
    .build()
    .map_err(to_js_err)
}

fn emphasize_strided<T: Sample>(
    emphasizer: &SlopeEmphasizer,
    data: &mut [T],
    offset: usize,
    count: usize,
    step: usize,
) -> Result<(), JsValue> {
    emphasizer
        .emphasize_strided(data, offset, count, step)
        .map_err(to_js_err)
}

// ============================================================================
// Slope Emphasis - u8 (8-bit)
// ============================================================================

/// Emphasize slopes of `count` samples `data[offset + k * step]` in place.
///
/// # Arguments
/// * `data` - Flat array of bytes, e.g. a grayscale image
/// * `offset`, `count`, `step` - Lane to process: a row is
///   `(y * width, width, 1)`, a column `(x, height, width)`
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn emphasize_slopes_u8_wasm(
    data: &mut [u8],
    offset: usize,
    count: usize,
    step: usize,
    slope_width: usize,
    minimal_change: f64,
    process_ascending: bool,
    process_descending: bool,
    allow_long_slopes: bool,
    exact_half_sum: bool,
) -> Result<(), JsValue> {
    let emphasizer = emphasizer(
        slope_width,
        minimal_change,
        process_ascending,
        process_descending,
        allow_long_slopes,
        exact_half_sum,
    )?;
    emphasize_strided(&emphasizer, data, offset, count, step)
}

// ============================================================================
// Slope Emphasis - f32 (float)
// ============================================================================

/// Emphasize slopes of `count` samples `data[offset + k * step]` in place.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn emphasize_slopes_f32_wasm(
    data: &mut [f32],
    offset: usize,
    count: usize,
    step: usize,
    slope_width: usize,
    minimal_change: f64,
    process_ascending: bool,
    process_descending: bool,
    allow_long_slopes: bool,
) -> Result<(), JsValue> {
    // floats always split at the exact midpoint
    let emphasizer = emphasizer(
        slope_width,
        minimal_change,
        process_ascending,
        process_descending,
        allow_long_slopes,
        true,
    )?;
    emphasize_strided(&emphasizer, data, offset, count, step)
}

// ============================================================================
// Box Mean - u8 (8-bit)
// ============================================================================

/// Box mean of every full window of a byte row.
///
/// # Returns
/// `data.length - window_size + 1` means, empty for shorter rows
#[wasm_bindgen]
pub fn box_mean_u8_wasm(data: &[u8], window_size: usize, rounding: bool) -> Result<Vec<u8>, JsValue> {
    let averager = BoxAverager::<u8>::new(BoxAveragerParams {
        window_size,
        rounding,
        strict_division: false,
    })
    .map_err(to_js_err)?;
    Ok(averager.averaged(data))
}
