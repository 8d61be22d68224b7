//! CCF expansion: rewrite each `CcfGroup` into auxiliary basic events
//! plus a Boolean formula substitution, so every downstream pass
//! (cut-set engines, quantification, Monte-Carlo) only ever sees plain
//! basic events.
//!
//! Uses a formula-rewriting style of walking and replacing `Formula`
//! nodes in place, generalised from NNF rewriting to CCF-member
//! substitution.

use std::collections::HashMap;

use itertools::Itertools;

use crate::error::ScramResult;
use crate::expr::{EvalContext, Expression};
use crate::model::ccf::CcfModelKind;
use crate::model::event::{BasicEvent, Role};
use crate::model::formula::{Arg, Connective, Formula, Literal};
use crate::model::ids::{BasicEventId, EventRef};
use crate::model::Model;

fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result *= (n - i) as f64 / (i + 1) as f64;
    }
    result
}

fn level_probability(kind: CcfModelKind, factors: &[crate::model::ccf::CcfFactor], level: u32, m: u32, q: f64) -> f64 {
    let factor_at = |lvl: u32| factors.iter().find(|f| f.level == lvl).map(|f| f.value).unwrap_or(0.0);
    match kind {
        CcfModelKind::BetaFactor => {
            let beta = factor_at(2);
            if level == 1 {
                (1.0 - beta) * q
            } else if level == m {
                beta * q
            } else {
                0.0
            }
        }
        CcfModelKind::Mgl => {
            let mut product = 1.0;
            for j in 2..=level {
                product *= factor_at(j);
            }
            let rho_next = if level + 1 > m { 0.0 } else { factor_at(level + 1) };
            q * product * (1.0 - rho_next) / binomial(m - 1, level - 1)
        }
        CcfModelKind::AlphaFactor => {
            let sum: f64 = (1..=m).map(|j| j as f64 * factor_at(j)).sum();
            (level as f64 * factor_at(level) * q) / (binomial(m, level) * sum)
        }
        CcfModelKind::PhiFactor => factor_at(level) * q / binomial(m - 1, level - 1),
    }
}

/// Runs the CCF expansion pass over every group currently in the model.
/// `eval_ctx` resolves the group distribution / factor expressions (both
/// are typically constants, but may reference parameters).
pub fn expand(model: &mut Model, eval_ctx: &EvalContext) -> ScramResult<()> {
    let groups = std::mem::take(&mut model.ccf_groups);
    tracing::debug!(group_count = groups.len(), "expanding common-cause-failure groups");
    let mut replacements: HashMap<BasicEventId, Vec<BasicEventId>> = HashMap::new();

    for group in groups.iter() {
        let m = group.group_size() as u32;
        let q = group.distribution.mean(eval_ctx)?;

        for level in 1..=m {
            for subset in group.members.iter().combinations(level as usize) {
                let p = level_probability(group.kind, &group.factors, level, m, q);
                let name = format!(
                    "__ccf_{}_{}",
                    group.id,
                    subset.iter().map(|id| id.index().to_string()).join("_")
                );
                let aux = model.add_basic_event(
                    model.root,
                    BasicEvent { id: name, role: Role::Private, expression: Some(Expression::constant(p)) },
                );
                for &&member in subset.iter() {
                    replacements.entry(member).or_default().push(aux);
                }
            }
        }
    }

    if !replacements.is_empty() {
        for gate in model.gates.iter_mut() {
            rewrite_formula(&mut gate.formula, &replacements);
        }
    }
    tracing::debug!(auxiliary_events = replacements.values().map(Vec::len).sum::<usize>(), "ccf expansion complete");
    Ok(())
}

fn rewrite_formula(formula: &mut Formula, replacements: &HashMap<BasicEventId, Vec<BasicEventId>>) {
    for lit in formula.args.iter_mut() {
        rewrite_literal(lit, replacements);
    }
}

fn rewrite_literal(lit: &mut Literal, replacements: &HashMap<BasicEventId, Vec<BasicEventId>>) {
    match &mut lit.arg {
        Arg::Event(EventRef::Basic(id)) => {
            if let Some(aux_ids) = replacements.get(id) {
                let or_args = aux_ids
                    .iter()
                    .map(|&aux| Literal::positive(Arg::Event(EventRef::Basic(aux))))
                    .collect();
                lit.arg = Arg::Nested(Box::new(Formula { connective: Connective::Or, args: or_args }));
            }
        }
        Arg::Event(_) => {}
        Arg::Nested(nested) => rewrite_formula(nested, replacements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_factor_levels_match_expected_contributions() {
        let q = 0.01;
        let beta = 0.1;
        let factors = vec![crate::model::ccf::CcfFactor { level: 2, value: beta }];
        let p1 = level_probability(CcfModelKind::BetaFactor, &factors, 1, 3, q);
        let p3 = level_probability(CcfModelKind::BetaFactor, &factors, 3, 3, q);
        assert!((p1 - 0.009).abs() < 1e-12);
        assert!((p3 - 0.001).abs() < 1e-12);
    }

    #[test]
    fn binomial_matches_pascals_triangle() {
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(5, 0), 1.0);
        assert_eq!(binomial(5, 5), 1.0);
    }
}
