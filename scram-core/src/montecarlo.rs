//! Monte-Carlo uncertainty propagation over the gate tree.
//!
//! Rather than enumerate cut sets, each trial draws a fresh probability
//! for every basic event from its expression (so parameter distributions
//! propagate into the result, not just their means), then decides which
//! events fail. Per-event probabilities are typically small, so sampling
//! `n` independent Bernoullis per trial wastes almost all of them on
//! "nothing failed" draws; instead we bias-sample which event fails
//! first from the cumulative-probability vector, forcing at least one
//! failure per trial, and independently sample only the events that
//! come after it in index order. The empirical top-true rate over these
//! conditioned trials is then rescaled by the trial-averaged
//! P(≥1 event failed) to recover an unbiased top-event probability
//! estimate — exact when failure probabilities are small (the common
//! case for the safety systems this models), approximate otherwise.
//!
//! Evaluates the gate tree with [`crate::eval::evaluate_gate`], the same
//! evaluator the combinatorial cut-set engine uses.

use std::collections::HashMap;

use rand::Rng;

use crate::bitset::BitSet;
use crate::context::{AnalysisContext, Phase};
use crate::error::{Locus, ScramError, ScramResult};
use crate::eval::evaluate_gate;
use crate::expr::EvalContext;
use crate::model::ids::BasicEventId;
use crate::model::Model;

#[derive(Debug, Clone)]
pub struct UncertaintyOptions {
    pub num_trials: u64,
    /// Absorb failure modes that are supersets of another observed mode
    /// into that smaller mode's count (same rule as [`crate::sop::Expr::or_group`]).
    pub compress_modes: bool,
}

impl Default for UncertaintyOptions {
    fn default() -> Self {
        UncertaintyOptions { num_trials: 10_000, compress_modes: true }
    }
}

#[derive(Debug, Clone)]
pub struct ModeSummary {
    pub bits: BitSet,
    pub count: u64,
    pub frequency: f64,
    pub std_error: f64,
}

#[derive(Debug, Clone)]
pub struct UncertaintyResult {
    pub mean_probability: f64,
    pub modes: Vec<ModeSummary>,
    pub importance: HashMap<BasicEventId, f64>,
}

pub fn propagate(
    model: &Model,
    eval_ctx: &EvalContext,
    ctx: &mut AnalysisContext,
    options: &UncertaintyOptions,
) -> ScramResult<UncertaintyResult> {
    let top = model
        .top_gate
        .ok_or_else(|| ScramError::logic("model has no top gate; cannot propagate uncertainty"))?;
    let n = model.basic_events.len();
    if n == 0 {
        return Ok(UncertaintyResult { mean_probability: 0.0, modes: Vec::new(), importance: HashMap::new() });
    }

    let mut p_any_sum = 0.0;
    let mut count_true: u64 = 0;
    let mut mode_counts: HashMap<BitSet, u64> = HashMap::new();
    let mut trial_probs = vec![0.0f64; n];
    let mut failed = vec![false; n];

    for trial in 0..options.num_trials {
        ctx.check_cancelled()?;
        for (i, event) in model.basic_events.iter().enumerate() {
            let expr = event.expression.as_ref().ok_or_else(|| {
                ScramError::validity("basic event has no probability expression", Locus::element(event.id.clone()))
            })?;
            trial_probs[i] = expr.sample(eval_ctx, ctx.rng())?.clamp(0.0, 1.0);
        }
        let total: f64 = trial_probs.iter().sum();
        let p_any = 1.0 - trial_probs.iter().fold(1.0, |acc, &p| acc * (1.0 - p));
        p_any_sum += p_any;

        if total > 0.0 {
            let r = ctx.rng().gen_range(0.0..total);
            let mut cum = 0.0;
            let mut first = n - 1;
            for (i, &p) in trial_probs.iter().enumerate() {
                cum += p;
                if r < cum {
                    first = i;
                    break;
                }
            }
            failed.iter_mut().for_each(|f| *f = false);
            failed[first] = true;
            for (i, slot) in failed.iter_mut().enumerate().skip(first + 1) {
                *slot = ctx.rng().gen_bool(trial_probs[i]);
            }

            let top_true = evaluate_gate(model, top, &|id: BasicEventId| failed[id.index()], &mut Vec::new())?;
            if top_true {
                count_true += 1;
                let bits = BitSet::from_indices(n, (0..n).filter(|&i| failed[i]));
                *mode_counts.entry(bits).or_insert(0) += 1;
            }
        }

        ctx.report(Phase::MonteCarlo, trial + 1, options.num_trials);
    }
    tracing::debug!(trials = options.num_trials, hits = count_true, "monte-carlo propagation finished");

    let num_trials = options.num_trials.max(1) as f64;
    let p_any_avg = p_any_sum / num_trials;
    let mean_probability = (count_true as f64 / num_trials) * p_any_avg;

    let mut modes: Vec<(BitSet, u64)> = mode_counts.into_iter().collect();
    if options.compress_modes {
        modes = compress_modes(modes);
    }

    let modes: Vec<ModeSummary> = modes
        .into_iter()
        .map(|(bits, count)| {
            let frequency = (count as f64 / num_trials) * p_any_avg;
            let std_error = (f64::sqrt(count as f64) / num_trials) * p_any_avg;
            ModeSummary { bits, count, frequency, std_error }
        })
        .collect();

    let mut importance: HashMap<BasicEventId, f64> = HashMap::new();
    for mode in &modes {
        for bit in mode.bits.iter_ones() {
            *importance.entry(BasicEventId::new(bit as u32)).or_insert(0.0) += mode.frequency;
        }
    }

    Ok(UncertaintyResult { mean_probability, modes, importance })
}

/// Absorb failure modes whose bit set is a strict superset of another
/// observed mode's into that smaller mode, summing counts. A superset
/// mode is not a separate failure cause; it is the same minimal cause
/// plus incidental extra failures that happened to co-occur in that trial.
fn compress_modes(mut modes: Vec<(BitSet, u64)>) -> Vec<(BitSet, u64)> {
    modes.sort_by_key(|(bits, _)| bits.popcount());
    let mut kept: Vec<(BitSet, u64)> = Vec::new();
    'outer: for (bits, count) in modes {
        for (kept_bits, kept_count) in kept.iter_mut() {
            if kept_bits.is_subset_of(&bits) {
                *kept_count += count;
                continue 'outer;
            }
        }
        kept.push((bits, count));
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullProgress;
    use crate::expr::Expression;
    use crate::model::container::Gate;
    use crate::model::event::{BasicEvent, Role};
    use crate::model::formula::{Arg, Connective, Formula, Literal};
    use crate::model::ids::EventRef;
    use crate::model::Model;

    fn two_event_or_model(p1: f64, p2: f64) -> Model {
        let mut model = Model::new("uncertainty-demo");
        let root = model.root;
        let be1 = model.add_basic_event(
            root,
            BasicEvent { id: "E1".into(), role: Role::Public, expression: Some(Expression::Constant(p1)) },
        );
        let be2 = model.add_basic_event(
            root,
            BasicEvent { id: "E2".into(), role: Role::Public, expression: Some(Expression::Constant(p2)) },
        );
        let formula = Formula {
            connective: Connective::Or,
            args: vec![
                Literal { complement: false, arg: Arg::Event(EventRef::Basic(be1)) },
                Literal { complement: false, arg: Arg::Event(EventRef::Basic(be2)) },
            ],
        };
        let top = model.add_gate(root, Gate { id: "TOP".into(), role: Role::Public, formula });
        model.set_top_gate(top);
        model
    }

    #[test]
    fn or_gate_probability_converges_to_inclusion_exclusion() {
        let model = two_event_or_model(0.1, 0.2);
        let eval_ctx = EvalContext::new(model.mission_time);
        let mut ctx = AnalysisContext::new(42, model.mission_time).with_progress(Box::new(NullProgress));
        let options = UncertaintyOptions { num_trials: 20_000, compress_modes: true };
        let result = propagate(&model, &eval_ctx, &mut ctx, &options).unwrap();
        let expected = 0.1 + 0.2 - 0.1 * 0.2;
        assert!((result.mean_probability - expected).abs() < 0.02, "got {}", result.mean_probability);
        assert!(!result.modes.is_empty());
    }

    #[test]
    fn compress_modes_absorbs_supersets() {
        let a = BitSet::from_indices(4, [0]);
        let b = BitSet::from_indices(4, [0, 1]);
        let result = compress_modes(vec![(b, 3), (a.clone(), 5)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, a);
        assert_eq!(result[0].1, 8);
    }
}
