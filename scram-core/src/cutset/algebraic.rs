//! Algebraic cut-set method: fold the gate graph bottom-up into a single
//! [`Expr`], using [`Expr::and_expr`]/[`Expr::or_expr`] at every gate so
//! absorption keeps the intermediate SOP minimal at every step, in the
//! style of OpenFTA's `mcs_algebraic` routine folding `Expr`s while
//! walking the tree.

use std::collections::HashMap;

use super::{BitLayout, CutSetMode};
use crate::context::{AnalysisContext, Phase};
use crate::error::{ScramError, ScramResult};
use crate::model::formula::{Arg, Connective, Formula, Literal};
use crate::model::ids::{EventRef, GateId};
use crate::model::Model;
use crate::sop::{Expr, Group};

pub struct AlgebraicEngine<'a> {
    model: &'a Model,
    layout: BitLayout,
    mode: CutSetMode,
    order_limit: usize,
    cache: HashMap<GateId, Expr>,
}

impl<'a> AlgebraicEngine<'a> {
    pub fn new(model: &'a Model, mode: CutSetMode, order_limit: usize) -> Self {
        AlgebraicEngine { model, layout: BitLayout::for_model(model), mode, order_limit, cache: HashMap::new() }
    }

    pub fn width(&self) -> usize {
        self.layout.width()
    }

    pub fn compute(&mut self, ctx: &mut AnalysisContext) -> ScramResult<Expr> {
        let top = self
            .model
            .top_gate
            .ok_or_else(|| ScramError::logic("model has no top gate; cannot compute cut sets"))?;
        ctx.report(Phase::CutSetGeneration, 0, 0);
        tracing::debug!(basic_events = self.model.basic_events.len(), mode = ?self.mode, "algebraic cut-set generation starting");
        let e = self.gate_expr(top, ctx)?;
        let result = match self.mode {
            CutSetMode::PrimeImplicants => e,
            CutSetMode::MinimalCutSets => {
                let mut filtered = Expr::create(self.layout.width());
                for g in e.groups() {
                    if g.bits().iter_ones().all(BitLayout::is_positive) {
                        filtered.or_group(g.clone());
                    }
                }
                filtered
            }
        };
        ctx.report(Phase::CutSetGeneration, 1, 1);
        tracing::debug!(cut_sets = result.count(), "algebraic cut-set generation finished");
        Ok(result)
    }

    fn gate_expr(&mut self, gate: GateId, ctx: &mut AnalysisContext) -> ScramResult<Expr> {
        ctx.check_cancelled()?;
        if let Some(e) = self.cache.get(&gate) {
            return Ok(e.clone());
        }
        let formula = self.model.gates[gate].formula.clone();
        let e = self.formula_expr(&formula, ctx)?;
        self.cache.insert(gate, e.clone());
        Ok(e)
    }

    fn formula_expr(&mut self, formula: &Formula, ctx: &mut AnalysisContext) -> ScramResult<Expr> {
        let width = self.layout.width();
        let arg_exprs = |engine: &mut Self, ctx: &mut AnalysisContext| -> ScramResult<Vec<Expr>> {
            formula.args.iter().map(|lit| engine.literal_expr(lit, ctx)).collect()
        };
        let e = match formula.connective {
            Connective::And => {
                let args = arg_exprs(self, ctx)?;
                self.and_fold(&args)
            }
            Connective::Or => {
                let args = arg_exprs(self, ctx)?;
                self.or_fold(&args)
            }
            Connective::Nand => {
                let args = arg_exprs(self, ctx)?;
                self.negate(&self.and_fold(&args))?
            }
            Connective::Nor => {
                let args = arg_exprs(self, ctx)?;
                self.negate(&self.or_fold(&args))?
            }
            Connective::Not => {
                let args = arg_exprs(self, ctx)?;
                self.negate(&args[0])?
            }
            Connective::Null => {
                let mut args = arg_exprs(self, ctx)?;
                args.pop().unwrap_or_else(|| Expr::create(width))
            }
            Connective::Imply => {
                let args = arg_exprs(self, ctx)?;
                let not_a = self.negate(&args[0])?;
                not_a.or_expr(&args[1])
            }
            Connective::Iff => {
                let args = arg_exprs(self, ctx)?;
                let not_a = self.negate(&args[0])?;
                let not_b = self.negate(&args[1])?;
                self.and(&args[0], &args[1]).or_expr(&self.and(&not_a, &not_b))
            }
            Connective::Xor => {
                let args = arg_exprs(self, ctx)?;
                let mut acc = args[0].clone();
                for b in &args[1..] {
                    acc = self.xor2(&acc, b)?;
                }
                acc
            }
            Connective::Atleast(k) => {
                let args = arg_exprs(self, ctx)?;
                self.k_of_n(&args, k as usize)
            }
            Connective::Cardinality(min, _max) => {
                let args = arg_exprs(self, ctx)?;
                self.k_of_n(&args, min as usize)
            }
            Connective::Constant(true) => Self::tautology(width),
            Connective::Constant(false) => Expr::create(width),
            Connective::TransferIn(target) => self.gate_expr(target, ctx)?,
        };
        Ok(e)
    }

    fn literal_expr(&mut self, lit: &Literal, ctx: &mut AnalysisContext) -> ScramResult<Expr> {
        let width = self.layout.width();
        let base = match &lit.arg {
            Arg::Event(EventRef::Basic(id)) => {
                let bit = if lit.complement { self.layout.negative_bit(*id) } else { self.layout.positive_bit(*id) };
                let mut e = Expr::create(width);
                e.or_group(Group::singleton(width, bit));
                return Ok(e);
            }
            Arg::Event(EventRef::House(id)) => {
                let state = self.model.house_events[*id].state ^ lit.complement;
                return Ok(if state { Self::tautology(width) } else { Expr::create(width) });
            }
            Arg::Event(EventRef::Gate(id)) => self.gate_expr(*id, ctx)?,
            Arg::Nested(f) => self.formula_expr(f, ctx)?,
        };
        if lit.complement {
            self.negate(&base)
        } else {
            Ok(base)
        }
    }

    /// Order-truncated AND of two sub-expressions, with every resulting
    /// group that asserts both a basic event and its complement (bits
    /// `2*e` and `2*e+1` both set) dropped: such a group is a
    /// contradiction (`e ∧ ¬e` is false), and `Expr::and_expr`'s plain
    /// bitwise OR plus subset-only absorption has no way to notice that
    /// on its own.
    fn and(&self, a: &Expr, b: &Expr) -> Expr {
        let raw = a.and_expr(b, self.order_limit);
        if raw.count() == 0 {
            return raw;
        }
        let mut result = Expr::create(self.layout.width());
        for g in raw.groups() {
            if !Self::is_contradictory(g) {
                result.or_group(g.clone());
            }
        }
        result
    }

    /// True iff `g` sets both the positive and negative bit of some
    /// basic event.
    fn is_contradictory(g: &Group) -> bool {
        g.bits().iter_ones().any(|bit| BitLayout::is_positive(bit) && g.bits().get(BitLayout::flip(bit)))
    }

    fn and_fold(&self, args: &[Expr]) -> Expr {
        let width = self.layout.width();
        args.iter().fold(Self::tautology(width), |acc, e| self.and(&acc, e))
    }

    fn or_fold(&self, args: &[Expr]) -> Expr {
        let width = self.layout.width();
        args.iter().fold(Expr::create(width), |acc, e| acc.or_expr(e))
    }

    fn k_of_n(&self, args: &[Expr], k: usize) -> Expr {
        use itertools::Itertools;
        let width = self.layout.width();
        if k == 0 || k > args.len() {
            return Self::tautology(width);
        }
        let mut result = Expr::create(width);
        for combo in args.iter().combinations(k) {
            let anded = combo.into_iter().fold(Self::tautology(width), |acc, e| self.and(&acc, e));
            result = result.or_expr(&anded);
        }
        result
    }

    fn xor2(&self, a: &Expr, b: &Expr) -> ScramResult<Expr> {
        let not_a = self.negate(a)?;
        let not_b = self.negate(b)?;
        Ok(self.and(a, &not_b).or_expr(&self.and(&not_a, b)))
    }

    fn tautology(width: usize) -> Expr {
        let mut e = Expr::create(width);
        e.or_group(Group::new(crate::bitset::BitSet::create(width)));
        e
    }

    /// De Morgan complement of a sum-of-products: the complement of an OR
    /// of groups is the AND of each group's complemented form, where a
    /// group's complement is the OR of its negated literals. This is an
    /// NNF pushdown adapted to operate on already-expanded SOP
    /// expressions rather than formula trees.
    fn negate(&self, e: &Expr) -> ScramResult<Expr> {
        let width = self.layout.width();
        if e.is_empty() {
            return Ok(Self::tautology(width));
        }
        if e.count() == 1 && e.groups()[0].order() == 0 {
            return Ok(Expr::create(width));
        }
        let mut acc = Self::tautology(width);
        for g in e.groups() {
            let mut term = Expr::create(width);
            for bit in g.bits().iter_ones() {
                term.or_group(Group::singleton(width, BitLayout::flip(bit)));
            }
            acc = self.and(&acc, &term);
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AnalysisContext;
    use crate::expr::Expression;
    use crate::model::container::Gate;
    use crate::model::event::{BasicEvent, Role};

    fn two_event_model(connective: Connective) -> Model {
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
            connective,
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
    fn and_gate_yields_one_cut_set_of_both_events() {
        let model = two_event_model(Connective::And);
        let mut ctx = AnalysisContext::new(0, model.mission_time);
        let mut engine = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 2);
        let sop = engine.compute(&mut ctx).unwrap();
        assert_eq!(sop.count(), 1);
        assert_eq!(sop.groups()[0].order(), 2);
    }

    #[test]
    fn or_gate_yields_two_singleton_cut_sets() {
        let model = two_event_model(Connective::Or);
        let mut ctx = AnalysisContext::new(0, model.mission_time);
        let mut engine = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 2);
        let sop = engine.compute(&mut ctx).unwrap();
        assert_eq!(sop.count(), 2);
        assert!(sop.groups().iter().all(|g| g.order() == 1));
    }

    #[test]
    fn order_limit_truncates_and_gate_of_three() {
        let mut model = Model::new("Three");
        let root = model.root;
        let ids: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|name| {
                model.add_basic_event(
                    root,
                    BasicEvent { id: name.to_string(), role: Role::Public, expression: Some(Expression::Constant(0.1)) },
                )
            })
            .collect();
        let formula = Formula::new(Connective::And, ids.iter().map(|id| Literal::positive(Arg::Event(EventRef::Basic(*id)))).collect());
        let top = model.add_gate(root, Gate { id: "TOP".to_string(), role: Role::Public, formula });
        model.set_top_gate(top);

        let mut ctx = AnalysisContext::new(0, model.mission_time);
        let mut engine = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 2);
        let sop = engine.compute(&mut ctx).unwrap();
        assert!(sop.is_empty(), "order-3 cut set must be dropped by a limit of 2");
    }

    #[test]
    fn prime_implicants_drop_contradictory_groups() {
        // TOP = A AND (NOT A OR B), logically A AND B: the naive AND of
        // A's group with NOT-A's group is a contradiction and must not
        // survive as a spurious prime implicant.
        let mut model = Model::new("Contradiction");
        let root = model.root;
        let a = model.add_basic_event(
            root,
            BasicEvent { id: "A".to_string(), role: Role::Public, expression: Some(Expression::Constant(0.3)) },
        );
        let b = model.add_basic_event(
            root,
            BasicEvent { id: "B".to_string(), role: Role::Public, expression: Some(Expression::Constant(0.4)) },
        );
        let inner = Formula::new(
            Connective::Or,
            vec![Literal::negated(Arg::Event(EventRef::Basic(a))), Literal::positive(Arg::Event(EventRef::Basic(b)))],
        );
        let formula = Formula::new(
            Connective::And,
            vec![Literal::positive(Arg::Event(EventRef::Basic(a))), Literal::positive(Arg::Nested(Box::new(inner)))],
        );
        let top = model.add_gate(root, Gate { id: "TOP".to_string(), role: Role::Public, formula });
        model.set_top_gate(top);

        let mut ctx = AnalysisContext::new(0, model.mission_time);
        let mut engine = AlgebraicEngine::new(&model, CutSetMode::PrimeImplicants, 4);
        let sop = engine.compute(&mut ctx).unwrap();

        assert_eq!(sop.count(), 1, "only {{A,B}} should survive, got {:?}", sop.groups());
        let group = &sop.groups()[0];
        assert!(group.bits().get(engine.layout.positive_bit(a)));
        assert!(group.bits().get(engine.layout.positive_bit(b)));
        assert!(!AlgebraicEngine::is_contradictory(group));
    }
}
