//! Row Kernels
//!
//! In-place 1-D kernels for image rows and columns, with Python bindings
//! via PyO3 and WASM bindings for JavaScript.
//!
//! ## Kernels
//! - **Slope emphasis**: replaces short monotone slopes whose total change
//!   is large enough by a sharp step between the two plateaus around them.
//! - **Exact averaging**: box means computed by multiplying with a
//!   precomputed reciprocal, bit-exact with integer floor division.
//!
//! ## Element Types
//! - `u8`, `u16`: unsigned pixel magnitudes
//! - `i64`: full signed range, evaluated without wraparound
//! - `f32`: float samples
//!
//! Kernels address a window of a slice, a strided lane (for columns and
//! interleaved channels) or a 1-D `ndarray` view, and never allocate.
//!
//! ```
//! use rowkernels::SlopeEmphasizer;
//!
//! let emphasizer = SlopeEmphasizer::builder()
//!     .with_slope_width(4)
//!     .with_minimal_change(10.0)
//!     .with_process_ascending(true)
//!     .build()?;
//! let mut row = [0u8, 0, 40, 90, 100, 100];
//! emphasizer.emphasize_all(&mut row);
//! assert_eq!(row, [0, 0, 0, 100, 100, 100]);
//! # Ok::<(), rowkernels::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod filters;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{load_config, KernelConfig};
pub use error::{Error, Result};
pub use filters::averaging::{BoxAverager, BoxAveragerParams, FastExactDivider, MAX_EXACT_SUM};
pub use filters::lane::{SampleLane, StridedLane};
pub use filters::sample::{ElementType, IntegerSample, Sample, SamplesMut};
pub use filters::slopes::{SlopeEmphasizer, SlopeEmphasizerParams};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{Element, IntoPyArray, PyArray1, PyArrayMethods, PyReadonlyArray1};
    use pyo3::exceptions::{PyTypeError, PyValueError};
    use pyo3::prelude::*;

    use crate::error::Error;
    use crate::filters::averaging::{self, BoxAverager, BoxAveragerParams};
    use crate::filters::sample::{ElementType, Sample};
    use crate::filters::slopes::{SlopeEmphasizer, SlopeEmphasizerParams};

    fn to_py_err(err: Error) -> PyErr {
        match err {
            Error::UnsupportedElementType(_) | Error::UnboundedElementType { .. } => {
                PyTypeError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }

    fn emphasize_array<T: Sample + Element>(
        array: &Bound<'_, PyArray1<T>>,
        emphasizer: &SlopeEmphasizer,
    ) -> PyResult<()> {
        let mut values = array
            .try_readwrite()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        emphasizer.emphasize_view(values.as_array_mut());
        Ok(())
    }

    // ========================================================================
    // Slope Emphasis
    // ========================================================================

    /// Emphasize slopes of a 1-D array in place.
    ///
    /// Accepts uint8, uint16, int64 and float32 arrays of any stride, so a
    /// column `image[:, x]` or a channel `image[y, :, c]` can be passed
    /// directly.
    ///
    /// # Arguments
    /// * `values` - 1-D numpy array, modified in place
    /// * `slope_width` - Maximal number of samples of an emphasized slope
    /// * `minimal_change` - Minimal total change along an emphasized slope
    /// * `process_ascending` / `process_descending` - Enabled directions
    /// * `allow_long_slopes` - Emphasize steep parts of longer slopes
    /// * `exact_half_sum` - Split integer slopes at the exact midpoint
    #[pyfunction]
    #[pyo3(signature = (
        values,
        slope_width=1,
        minimal_change=0.0,
        process_ascending=false,
        process_descending=false,
        allow_long_slopes=false,
        exact_half_sum=false
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn emphasize_slopes(
        values: &Bound<'_, PyAny>,
        slope_width: usize,
        minimal_change: f64,
        process_ascending: bool,
        process_descending: bool,
        allow_long_slopes: bool,
        exact_half_sum: bool,
    ) -> PyResult<()> {
        let emphasizer = SlopeEmphasizerParams {
            slope_width,
            minimal_change,
            process_ascending,
            process_descending,
            allow_long_slopes,
            exact_half_sum,
        }
        .build()
        .map_err(to_py_err)?;

        if let Ok(array) = values.downcast::<PyArray1<u8>>() {
            return emphasize_array(array, &emphasizer);
        }
        if let Ok(array) = values.downcast::<PyArray1<u16>>() {
            return emphasize_array(array, &emphasizer);
        }
        if let Ok(array) = values.downcast::<PyArray1<i64>>() {
            return emphasize_array(array, &emphasizer);
        }
        if let Ok(array) = values.downcast::<PyArray1<f32>>() {
            return emphasize_array(array, &emphasizer);
        }
        Err(PyTypeError::new_err(
            "expected a 1-D numpy array of uint8, uint16, int64 or float32",
        ))
    }

    // ========================================================================
    // Exact Averaging
    // ========================================================================

    /// Box mean of every full window of a uint8 row.
    #[pyfunction]
    #[pyo3(signature = (row, window_size, rounding=true))]
    pub fn box_mean_u8<'py>(
        py: Python<'py>,
        row: PyReadonlyArray1<'py, u8>,
        window_size: usize,
        rounding: bool,
    ) -> PyResult<Bound<'py, PyArray1<u8>>> {
        let averager = BoxAverager::<u8>::new(BoxAveragerParams {
            window_size,
            rounding,
            strict_division: false,
        })
        .map_err(to_py_err)?;
        let src = row.as_array().to_vec();
        Ok(averager.averaged(&src).into_pyarray(py))
    }

    /// Floor division by a fixed window size without integer division.
    #[pyclass(name = "FastExactDivider", module = "rowkernels")]
    pub struct PyFastExactDivider {
        inner: averaging::FastExactDivider,
    }

    #[pymethods]
    impl PyFastExactDivider {
        #[new]
        #[pyo3(signature = (window_size, max_sum, two_stage=false))]
        fn new(window_size: u64, max_sum: u64, two_stage: bool) -> PyResult<Self> {
            let inner = if two_stage {
                averaging::FastExactDivider::configure_two_stage(window_size, max_sum)
            } else {
                averaging::FastExactDivider::configure(window_size, max_sum)
            }
            .map_err(to_py_err)?;
            Ok(Self { inner })
        }

        /// Divider for means of `window_size` samples of a dtype name
        /// (`"uint8"` or `"uint16"`).
        #[staticmethod]
        fn for_dtype(dtype: &str, window_size: u64) -> PyResult<Self> {
            let element_type: ElementType = dtype.parse().map_err(to_py_err)?;
            let inner = averaging::FastExactDivider::for_element_type(element_type, window_size)
                .map_err(to_py_err)?;
            Ok(Self { inner })
        }

        /// `sum // window_size`; raises ValueError outside `[0, max_sum]`.
        fn divide(&self, sum: u64) -> PyResult<u64> {
            self.inner.try_divide(sum).map_err(to_py_err)
        }

        #[getter]
        fn window_size(&self) -> u64 {
            self.inner.window_size()
        }

        #[getter]
        fn max_sum(&self) -> u64 {
            self.inner.max_sum()
        }

        #[getter]
        fn reciprocal(&self) -> f64 {
            self.inner.reciprocal()
        }

        #[getter]
        fn two_stage(&self) -> bool {
            self.inner.is_two_stage()
        }

        fn __repr__(&self) -> String {
            format!(
                "FastExactDivider(window_size={}, max_sum={}, two_stage={})",
                self.inner.window_size(),
                self.inner.max_sum(),
                if self.inner.is_two_stage() { "True" } else { "False" }
            )
        }
    }

    // ========================================================================
    // Module
    // ========================================================================

    #[pymodule]
    pub fn rowkernels(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Slope emphasis
        m.add_function(wrap_pyfunction!(emphasize_slopes, m)?)?;

        // Averaging
        m.add_function(wrap_pyfunction!(box_mean_u8, m)?)?;
        m.add_class::<PyFastExactDivider>()?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::rowkernels;
