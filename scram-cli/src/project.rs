//! `ProjectConfig`: a repeatable batch-run settings file, loaded with
//! `serde_json` the same way `scram-core::report` writes its output — no
//! bespoke config format, just the one (de)serialisation stack this
//! binary already depends on.
//!
//! CLI flags always win over a loaded project file, field by field; see
//! `Settings::merge` in `main.rs`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use scram_core::error::{ScramError, ScramResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Input model files, used when none are given on the command line.
    #[serde(default)]
    pub input_files: Vec<PathBuf>,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub limit_order: Option<usize>,
    #[serde(default)]
    pub cut_off: Option<f64>,
    #[serde(default)]
    pub mission_time: Option<f64>,
    #[serde(default)]
    pub time_step: Option<f64>,
    #[serde(default)]
    pub num_trials: Option<u64>,
    #[serde(default)]
    pub num_quantiles: Option<usize>,
    #[serde(default)]
    pub num_bins: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub approximation: Option<String>,
    #[serde(default)]
    pub prime_implicants: Option<bool>,
    #[serde(default)]
    pub probability: Option<bool>,
    #[serde(default)]
    pub importance: Option<bool>,
    #[serde(default)]
    pub uncertainty: Option<bool>,
    #[serde(default)]
    pub ccf: Option<bool>,
    #[serde(default)]
    pub sil: Option<bool>,
}

impl ProjectConfig {
    pub fn load(path: &std::path::Path) -> ScramResult<ProjectConfig> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ScramError::settings(format!("malformed project file '{}': {e}", path.display())))
    }
}
