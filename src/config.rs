//! JSON configuration of the kernels.
//!
//! ```json
//! {
//!   "slopes": { "slope_width": 5, "minimal_change": 5.0, "process_ascending": true },
//!   "averaging": { "window_size": 9, "rounding": false }
//! }
//! ```
//!
//! Missing sections and fields take their defaults. Values are validated
//! when the kernels are built, not when the file is parsed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filters::averaging::{BoxAverager, BoxAveragerParams};
use crate::filters::sample::IntegerSample;
use crate::filters::slopes::{SlopeEmphasizer, SlopeEmphasizerParams};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub slopes: SlopeEmphasizerParams,
    pub averaging: BoxAveragerParams,
}

impl KernelConfig {
    pub fn from_json_str(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn slope_emphasizer(&self) -> Result<SlopeEmphasizer> {
        self.slopes.build()
    }

    pub fn box_averager<T: IntegerSample>(&self) -> Result<BoxAverager<T>> {
        BoxAverager::new(self.averaging)
    }
}

pub fn load_config(path: &Path) -> Result<KernelConfig> {
    let data = fs::read_to_string(path)?;
    let config = KernelConfig::from_json_str(&data)?;
    log::debug!("loaded kernel config from {}", path.display());
    Ok(config)
}
