//! Quantification: turn an [`Expr`](crate::sop::Expr) of cut
//! sets/prime implicants plus a probability vector into the numbers a
//! report actually shows — top-event probability (exact or
//! approximated), importance measures, a time-dependent curve, and SIL
//! banding.
//!
//! Birnbaum importance is `pos_tep - neg_tep`, obtained by forcing a
//! basic event's probability to 1 and 0 and re-solving. The same
//! one-variable conditioning underlies criticality, RAW, and RRW, each
//! re-running [`Expr::probability`] over the already-computed cut sets
//! rather than invoking an external model counter.

use std::collections::HashMap;

use crate::error::{Locus, ScramError, ScramResult};
use crate::expr::EvalContext;
use crate::model::ids::BasicEventId;
use crate::model::Model;
use crate::sop::Expr;

/// How the top-event probability is derived from the cut-set list;
/// `--rare-event`/`--mcub` are mutually exclusive with exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approximation {
    /// `Expr::probability(E, p, max_order, 0)` — full inclusion–exclusion.
    Exact,
    /// `Σ P(cut set)`; valid only when every cut-set probability is small.
    RareEvent,
    /// `1 − ∏(1 − P(cut set))`.
    Mcub,
}

/// A cut-set probability large enough to make the rare-event
/// approximation untrustworthy; above this, the result is reported as an
/// upper bound rather than an estimate.
const RARE_EVENT_WARN_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ProbabilityResult {
    pub value: f64,
    pub approximation: Approximation,
    pub warning: Option<String>,
}

/// Build the per-basic-event probability vector the cut-set engines'
/// doubled bit layout expects: even bit `2*i` is P(event i fails), odd
/// bit `2*i+1` is its complement, used only when the sum-of-products
/// carries negative literals (prime-implicant mode).
pub fn build_probability_vector(model: &Model, ctx: &EvalContext) -> ScramResult<Vec<f64>> {
    let mut probs = vec![0.0; 2 * model.basic_events.len()];
    for (id, event) in model.basic_events.iter_enumerated() {
        let expr = event.expression.as_ref().ok_or_else(|| {
            ScramError::validity("basic event has no probability expression", Locus::element(event.id.clone()))
        })?;
        let p = expr.mean(ctx)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(ScramError::domain(
                format!("basic event probability {p} out of [0,1]"),
                Locus::element(event.id.clone()),
            ));
        }
        probs[2 * id.index()] = p;
        probs[2 * id.index() + 1] = 1.0 - p;
    }
    Ok(probs)
}

/// Top-event probability under the chosen approximation.
pub fn top_probability(
    sop: &Expr,
    probs: &[f64],
    approximation: Approximation,
    max_order: usize,
    n_terms: usize,
    non_coherent: bool,
) -> ProbabilityResult {
    match approximation {
        Approximation::Exact => ProbabilityResult {
            value: sop.probability(probs, max_order, n_terms),
            approximation,
            warning: None,
        },
        Approximation::RareEvent => {
            let cutset_probs = sop.cutset_probs(probs);
            let value: f64 = cutset_probs.iter().sum();
            let warning = if cutset_probs.iter().any(|&p| p > RARE_EVENT_WARN_THRESHOLD) {
                Some("rare-event approximation used with a cut-set probability that is not small; result is an upper bound, not an estimate".to_string())
            } else {
                None
            };
            ProbabilityResult { value, approximation, warning }
        }
        Approximation::Mcub => {
            let cutset_probs = sop.cutset_probs(probs);
            let value = 1.0 - cutset_probs.iter().fold(1.0, |acc, &p| acc * (1.0 - p));
            let warning = if non_coherent {
                Some("MCUB assumes a coherent model; this model has complemented literals".to_string())
            } else {
                None
            };
            ProbabilityResult { value, approximation, warning }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Importance {
    pub fussell_vesely: f64,
    pub birnbaum: f64,
    pub criticality: f64,
    pub raw: f64,
    pub rrw: f64,
}

/// Importance measures for every basic event that appears in `sop`:
/// Fussell-Vesely from the sum of containing cut sets,
/// Birnbaum/criticality/RAW/RRW from one-variable conditioning (probability
/// forced to 1, then to 0) on the same exact inclusion–exclusion.
pub fn importance_measures(
    sop: &Expr,
    probs: &[f64],
    top_prob: f64,
    max_order: usize,
) -> HashMap<BasicEventId, Importance> {
    let mut events: Vec<usize> = Vec::new();
    for g in sop.groups() {
        for bit in g.bits().iter_ones() {
            if bit % 2 == 0 {
                events.push(bit / 2);
            }
        }
    }
    events.sort_unstable();
    events.dedup();

    let mut out = HashMap::new();
    for event_idx in events {
        let pos_bit = 2 * event_idx;
        let p_i = probs[pos_bit];

        let sum_containing: f64 = sop
            .groups()
            .iter()
            .filter(|g| g.bits().get(pos_bit))
            .map(|g| g.bits().iter_ones().map(|b| probs[b]).product::<f64>())
            .sum();
        let fussell_vesely = if top_prob > 0.0 { sum_containing / top_prob } else { 0.0 };

        let mut probs_at_1 = probs.to_vec();
        probs_at_1[pos_bit] = 1.0;
        if pos_bit + 1 < probs_at_1.len() {
            probs_at_1[pos_bit + 1] = 0.0;
        }
        let top_at_1 = sop.probability(&probs_at_1, max_order, 0);

        let mut probs_at_0 = probs.to_vec();
        probs_at_0[pos_bit] = 0.0;
        if pos_bit + 1 < probs_at_0.len() {
            probs_at_0[pos_bit + 1] = 1.0;
        }
        let top_at_0 = sop.probability(&probs_at_0, max_order, 0);

        let birnbaum = top_at_1 - top_at_0;
        let criticality = if top_prob > 0.0 { birnbaum * p_i / top_prob } else { 0.0 };
        let raw = if top_prob > 0.0 { top_at_1 / top_prob } else { 1.0 };
        let rrw = if top_at_0 > 0.0 { top_prob / top_at_0 } else { 0.0 };

        out.insert(
            BasicEventId::new(event_idx as u32),
            Importance { fussell_vesely, birnbaum, criticality, raw, rrw },
        );
    }
    out
}

/// Re-evaluate the top-event probability at each time step of a mission,
/// rebinding `time` in `ctx` between runs. `probability_at` recomputes
/// the probability vector and
/// calls [`top_probability`] for the given time; callers own the
/// `Expr`/options and just supply the per-step evaluation closure.
pub fn time_curve(times: &[f64], mut probability_at: impl FnMut(f64) -> ScramResult<f64>) -> ScramResult<Vec<(f64, f64)>> {
    times.iter().map(|&t| Ok((t, probability_at(t)?))).collect()
}

/// Safety Integrity Level band (IEC 61508): the four SIL bands, plus
/// `BelowSil4` for a value better than SIL4's lower bound and
/// `OutOfRange` for a value at or above SIL1's upper bound — the
/// standard five bands plus the one explicit "out of range" band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilBand {
    BelowSil4,
    Sil4,
    Sil3,
    Sil2,
    Sil1,
    OutOfRange,
}

/// Bucket a time-averaged probability-of-failure-on-demand or
/// probability-of-failure-per-hour value into the standard five bands
/// plus the out-of-range band.
pub fn classify_sil(value: f64) -> SilBand {
    match value {
        v if v < 1e-5 => SilBand::BelowSil4,
        v if (1e-5..1e-4).contains(&v) => SilBand::Sil4,
        v if (1e-4..1e-3).contains(&v) => SilBand::Sil3,
        v if (1e-3..1e-2).contains(&v) => SilBand::Sil2,
        v if (1e-2..1e-1).contains(&v) => SilBand::Sil1,
        _ => SilBand::OutOfRange,
    }
}

/// Fraction of mission time spent in each SIL band, given one value per
/// time step (equal-length steps assumed, matching
/// `--mission-time`/`--time-step`).
pub fn sil_time_fractions(values: &[f64]) -> HashMap<SilBand, f64> {
    let mut counts: HashMap<SilBand, u64> = HashMap::new();
    for &v in values {
        *counts.entry(classify_sil(v)).or_insert(0) += 1;
    }
    let total = values.len().max(1) as f64;
    counts.into_iter().map(|(band, count)| (band, count as f64 / total)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;
    use crate::sop::Group;

    fn group(width: usize, pos_bits: &[usize]) -> Group {
        Group::new(BitSet::from_indices(width, pos_bits.iter().copied()))
    }

    /// Pump/valve tree: checks exact P(top), MCUB, and
    /// Fussell-Vesely(PumpOne) against a hand calculation.
    #[test]
    fn pump_valve_tree_probability_and_importance() {
        // events: PumpOne=0 PumpTwo=1 ValveOne=2 ValveTwo=3 (positive bits 0,2,4,6)
        let width = 8;
        let mut sop = Expr::create(width);
        sop.or_group(group(width, &[0, 2])); // PumpOne, PumpTwo
        sop.or_group(group(width, &[0, 6])); // PumpOne, ValveTwo
        sop.or_group(group(width, &[2, 4])); // PumpTwo, ValveOne
        sop.or_group(group(width, &[4, 6])); // ValveOne, ValveTwo

        let mut probs = vec![0.0; width];
        probs[0] = 0.6; // PumpOne
        probs[2] = 0.7; // PumpTwo
        probs[4] = 0.4; // ValveOne
        probs[6] = 0.5; // ValveTwo

        let exact = top_probability(&sop, &probs, Approximation::Exact, 4, 0, false);
        assert!((exact.value - 0.646).abs() < 1e-3, "got {}", exact.value);

        let mcub = top_probability(&sop, &probs, Approximation::Mcub, 4, 0, false);
        assert!((mcub.value - 0.766144).abs() < 1e-5, "got {}", mcub.value);

        let importance = importance_measures(&sop, &probs, exact.value, 4);
        let pump_one = importance.get(&BasicEventId::new(0)).unwrap();
        assert!((pump_one.fussell_vesely - 0.7895).abs() < 1e-3, "got {}", pump_one.fussell_vesely);
    }

    #[test]
    fn sil_bands_cover_the_five_ranges() {
        assert_eq!(classify_sil(5e-7), SilBand::BelowSil4);
        assert_eq!(classify_sil(5e-5), SilBand::Sil4);
        assert_eq!(classify_sil(5e-4), SilBand::Sil3);
        assert_eq!(classify_sil(5e-3), SilBand::Sil2);
        assert_eq!(classify_sil(5e-2), SilBand::Sil1);
        assert_eq!(classify_sil(5e-1), SilBand::OutOfRange);
    }

    #[test]
    fn rare_event_warns_when_cutset_probability_is_not_small() {
        let width = 2;
        let mut sop = Expr::create(width);
        sop.or_group(group(width, &[0]));
        let probs = vec![0.5, 0.5];
        let result = top_probability(&sop, &probs, Approximation::RareEvent, 2, 0, false);
        assert!(result.warning.is_some());
    }
}
