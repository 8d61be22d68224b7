use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Which `--mocus` engine to run; only meaningful when `--bdd`/`--zbdd`
/// are not given — the classical algebraic/combinatorial engine pair
/// covered here stands in for `--mocus`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Algebraic,
    Combinatorial,
}

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Computes minimal cut sets or prime implicants of a static fault tree, plus its probability, importance measures, uncertainty distribution, and safety integrity level, from an OPSA-MEF XML model."
)]
pub struct Arguments {
    /// Input model file(s) in OPSA-MEF XML. Each file is parsed and
    /// analysed as its own independent model; when more than one is
    /// given, analyses run concurrently on a `rayon` thread pool (spec
    /// §5's "independent-analysis parallelism"). Falls back to
    /// `--project`'s `input_files` when omitted.
    pub inputs: Vec<PathBuf>,

    /// Load a project configuration file (input file list and default
    /// settings). Flags given on the command line override the loaded
    /// file field-by-field.
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Select the cut-set algorithm. [default: mocus]
    #[arg(long, conflicts_with_all = ["zbdd", "mocus"])]
    pub bdd: bool,
    #[arg(long, conflicts_with_all = ["bdd", "mocus"])]
    pub zbdd: bool,
    #[arg(long, conflicts_with_all = ["bdd", "zbdd"])]
    pub mocus: bool,

    /// Which `--mocus` engine to run. [default: algebraic]
    #[arg(long, value_enum)]
    pub algorithm: Option<Method>,

    /// Compute and report the top-event probability.
    #[arg(long, default_value_t = false)]
    pub probability: bool,
    /// Compute and report per-event importance measures.
    #[arg(long, default_value_t = false)]
    pub importance: bool,
    /// Run Monte-Carlo uncertainty propagation.
    #[arg(long, default_value_t = false)]
    pub uncertainty: bool,
    /// Expand common-cause-failure groups before analysis.
    #[arg(long, default_value_t = false)]
    pub ccf: bool,
    /// Report the safety integrity level banding over mission time.
    #[arg(long, default_value_t = false)]
    pub sil: bool,

    /// Switch from minimal cut sets to prime implicants; incompatible
    /// with the MCUB approximation, which assumes a coherent model.
    #[arg(long, default_value_t = false)]
    pub prime_implicants: bool,

    /// Maximum cut-set/prime-implicant order to keep. 0 means unlimited.
    #[arg(long)]
    pub limit_order: Option<usize>,
    /// Drop cut sets whose own probability falls below this threshold
    /// from the sum-of-products report (does not affect the computed
    /// top-event probability, which always uses the full set).
    #[arg(long)]
    pub cut_off: Option<f64>,
    /// Mission time, overriding the model's `<define-mission-time>`.
    #[arg(long)]
    pub mission_time: Option<f64>,
    /// Time step for the probability-over-time curve and SIL banding.
    /// Mutually exclusive with `--num-quantiles`/`--num-bins` as the
    /// point-count source; the first one given wins.
    #[arg(long)]
    pub time_step: Option<f64>,

    /// Number of Monte-Carlo trials. [default: 10000]
    #[arg(long)]
    pub num_trials: Option<u64>,
    /// Number of equally spaced points to sample the mission-time curve
    /// at, used only when `--time-step` is not given.
    #[arg(long)]
    pub num_quantiles: Option<usize>,
    /// Number of equally spaced time bins used for SIL-band fraction
    /// reporting when neither `--time-step` nor `--num-quantiles` is given.
    #[arg(long)]
    pub num_bins: Option<usize>,
    /// PRNG seed for Monte-Carlo sampling. [default: 0]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Approximate the top-event probability instead of computing it
    /// exactly via inclusion-exclusion.
    #[arg(long, conflicts_with = "mcub")]
    pub rare_event: bool,
    #[arg(long, conflicts_with = "rare_event")]
    pub mcub: bool,

    /// Persist the computed cut sets/prime implicants to a legacy
    /// `.mcs` file alongside the JSON report.
    #[arg(long)]
    pub mcs_file: Option<PathBuf>,

    /// Report destination. Defaults to `<input file stem>.report.json`.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Verbosity: repeat for more detail (`-v`, `-vv`), also settable
    /// via `RUST_LOG`.
    #[arg(short = 'v', long = "verb", action = clap::ArgAction::Count)]
    pub verbosity: u8,
    /// Display a progress bar during cut-set generation and Monte-Carlo.
    #[arg(long, default_value_t = false)]
    pub display: bool,
}
