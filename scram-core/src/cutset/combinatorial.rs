//! Combinatorial cut-set method: enumerate combinations of basic events
//! in increasing order and test each against the gate graph, in the
//! style of OpenFTA's `mcs_combo` — much simpler than the algebraic
//! method, and a useful cross-check on small trees, but its cost grows
//! with `C(n, order)` so it is only practical up to a modest order.

use itertools::Itertools;

use super::{BitLayout, CutSetMode};
use crate::context::{AnalysisContext, Phase};
use crate::error::{ScramError, ScramResult};
use crate::eval::evaluate_gate;
use crate::model::ids::BasicEventId;
use crate::model::Model;
use crate::sop::{Expr, Group};

pub struct CombinatorialEngine<'a> {
    model: &'a Model,
    layout: BitLayout,
    mode: CutSetMode,
    max_order: usize,
}

impl<'a> CombinatorialEngine<'a> {
    pub fn new(model: &'a Model, mode: CutSetMode, max_order: usize) -> Self {
        CombinatorialEngine { model, layout: BitLayout::for_model(model), mode, max_order }
    }

    /// Enumerate every combination of basic events of increasing order up
    /// to `max_order`, keep the ones that make the top gate true while no
    /// already-found cut set of lower order is a subset (the absorption
    /// that `Expr::or_group` gives us for free).
    pub fn compute(&self, ctx: &mut AnalysisContext) -> ScramResult<Expr> {
        let top = self
            .model
            .top_gate
            .ok_or_else(|| ScramError::logic("model has no top gate; cannot compute cut sets"))?;
        if self.mode == CutSetMode::PrimeImplicants {
            // The combinatorial method only ever asserts "fails" literals; it
            // cannot discover prime implicants that depend on an event *not*
            // failing, since that requires evaluating the tree under a mixed
            // assignment outside the monotone combination space. Non-coherent
            // trees need the algebraic engine instead.
            return Err(ScramError::logic(
                "the combinatorial cut-set engine supports minimal-cut-set mode only; use the algebraic engine for prime implicants",
            ));
        }
        let n = self.model.basic_events.len();
        let mut result = Expr::create(self.layout.width());

        for order in 1..=self.max_order.min(n) {
            ctx.check_cancelled()?;
            ctx.report(Phase::CutSetGeneration, order as u64, self.max_order as u64);
            tracing::trace!(order, cut_sets_so_far = result.count(), "combinatorial enumeration at order");
            for combo in (0..n).combinations(order) {
                let ids: Vec<BasicEventId> = combo.into_iter().map(|i| BasicEventId::new(i as u32)).collect();
                // A combination that is a superset of an already-accepted
                // (necessarily smaller) cut set cannot itself be minimal;
                // skip the tree evaluation entirely.
                if self.dominated_by(&result, &ids) {
                    continue;
                }
                if evaluate_gate(self.model, top, &|id| ids.contains(&id), &mut Vec::new())? {
                    let bits = ids.iter().map(|id| self.layout.positive_bit(*id));
                    let group = Group::new(crate::bitset::BitSet::from_indices(self.layout.width(), bits));
                    result.or_group(group);
                }
            }
        }

        Ok(result)
    }

    fn dominated_by(&self, result: &Expr, ids: &[BasicEventId]) -> bool {
        let bits = crate::bitset::BitSet::from_indices(
            self.layout.width(),
            ids.iter().map(|id| self.layout.positive_bit(*id)),
        );
        result.groups().iter().any(|g| g.bits().is_subset_of(&bits))
    }
}

/// Rough cost estimate for the combinatorial method, in the style of
/// `mcs_time_est`/`combo_time_estimate`: proportional to the number of
/// combinations that must be tree-evaluated.
pub fn combinatorial_time_estimate(n_basic_events: usize, max_order: usize, per_eval_seconds: f64) -> f64 {
    let mut total = 0.0f64;
    for order in 1..=max_order.min(n_basic_events) {
        total += binomial(n_basic_events as u32, order as u32);
    }
    total * per_eval_seconds
}

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AnalysisContext;
    use crate::expr::Expression;
    use crate::model::container::Gate;
    use crate::model::event::{BasicEvent, Role};
    use crate::model::formula::{Arg, Connective, Formula, Literal};
    use crate::model::ids::EventRef;

    fn or_of_two() -> Model {
        let mut model = Model::new("Two");
        let root = model.root;
        let a = model.add_basic_event(
            root,
            BasicEvent { id: "A".to_string(), role: Role::Public, expression: Some(Expression::Constant(0.1)) },
        );
        let b = model.add_basic_event(
            root,
            BasicEvent { id: "B".to_string(), role: Role::Public, expression: Some(Expression::Constant(0.2)) },
        );
        let formula = Formula::new(
            Connective::Or,
            vec![
                Literal::positive(Arg::Event(EventRef::Basic(a))),
                Literal::positive(Arg::Event(EventRef::Basic(b))),
            ],
        );
        let top = model.add_gate(root, Gate { id: "TOP".to_string(), role: Role::Public, formula });
        model.set_top_gate(top);
        model
    }

    #[test]
    fn enumerates_both_singleton_cut_sets() {
        let model = or_of_two();
        let mut ctx = AnalysisContext::new(0, model.mission_time);
        let engine = CombinatorialEngine::new(&model, CutSetMode::MinimalCutSets, 2);
        let sop = engine.compute(&mut ctx).unwrap();
        assert_eq!(sop.count(), 2);
        assert!(sop.groups().iter().all(|g| g.order() == 1));
    }

    #[test]
    fn rejects_prime_implicant_mode() {
        let model = or_of_two();
        let mut ctx = AnalysisContext::new(0, model.mission_time);
        let engine = CombinatorialEngine::new(&model, CutSetMode::PrimeImplicants, 2);
        assert!(engine.compute(&mut ctx).is_err());
    }

    #[test]
    fn time_estimate_grows_with_order() {
        let cheap = combinatorial_time_estimate(20, 1, 1e-6);
        let expensive = combinatorial_time_estimate(20, 3, 1e-6);
        assert!(expensive > cheap);
    }
}
