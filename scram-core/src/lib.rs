//! `scram-core`: the analysis engine — MEF model, CCF expansion, cut-set
//! engines (algebraic and combinatorial), quantification, and Monte-Carlo
//! uncertainty propagation over static fault trees.
//!
//! Built throughout on an arena-and-tagged-enum idiom (an
//! `IndexVec`-based node arena and a generic `Formula<A>` enum); see
//! `DESIGN.md` for the per-module grounding ledger.

pub mod bitset;
pub mod ccf_expand;
pub mod context;
pub mod cutset;
pub mod error;
pub mod eval;
pub mod expr;
pub mod model;
pub mod modularize;
pub mod montecarlo;
pub mod persist;
pub mod quantify;
pub mod report;
pub mod sop;

pub use error::{Locus, ScramError, ScramResult};
