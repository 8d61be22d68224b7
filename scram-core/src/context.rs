//! `AnalysisContext`: the single object threaded through every analysis
//! pass, carrying the seeded PRNG, a progress callback, and a
//! cancellation check.
//!
//! This replaces global singletons: rather than a CLI binary reaching
//! for `rayon`'s global thread pool and free functions directly, every
//! long-running pass takes a `&AnalysisContext` instead, so
//! progress/cancellation plumbing is explicit and testable rather than
//! ambient.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{ScramError, ScramResult};

/// Phase labels reported to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Preprocessing,
    CcfExpansion,
    CutSetGeneration,
    Quantification,
    MonteCarlo,
}

/// One progress tick: `done` out of `total` units of work in `phase`.
/// `total == 0` means the unit count isn't known up front.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub phase: Phase,
    pub done: u64,
    pub total: u64,
}

pub trait ProgressSink: Send {
    fn report(&mut self, progress: Progress);
}

/// A no-op sink for callers that don't want progress reporting (e.g. tests).
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _progress: Progress) {}
}

impl<F: FnMut(Progress) + Send> ProgressSink for F {
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Threaded through every long-running analysis pass (cut-set generation,
/// quantification, Monte-Carlo). Owns the deterministic PRNG used by
/// `Expression::sample`, so reruns with the same seed reproduce identical
/// results.
pub struct AnalysisContext {
    pub mission_time: f64,
    rng: ChaCha8Rng,
    progress: Box<dyn ProgressSink>,
    cancelled: Box<dyn Fn() -> bool + Send>,
}

impl AnalysisContext {
    pub fn new(seed: u64, mission_time: f64) -> Self {
        AnalysisContext {
            mission_time,
            rng: ChaCha8Rng::seed_from_u64(seed),
            progress: Box::new(NullProgress),
            cancelled: Box::new(|| false),
        }
    }

    pub fn with_progress(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn with_cancellation(mut self, predicate: Box<dyn Fn() -> bool + Send>) -> Self {
        self.cancelled = predicate;
        self
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn report(&mut self, phase: Phase, done: u64, total: u64) {
        self.progress.report(Progress { phase, done, total });
    }

    /// Returns `Err(ScramError::Cancelled)` if the caller asked to stop;
    /// analysis passes call this at natural checkpoints (per cut set, per
    /// trial) rather than polling continuously.
    pub fn check_cancelled(&self) -> ScramResult<()> {
        if (self.cancelled)() {
            Err(ScramError::Cancelled)
        } else {
            Ok(())
        }
    }
}
