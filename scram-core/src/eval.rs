//! Shared gate-tree evaluator under a Boolean assignment of basic events.
//!
//! Both the combinatorial cut-set method and Monte-Carlo uncertainty
//! propagation need the same thing: "evaluate the gate tree bottom-up
//! given which basic events have failed". Factored out once here instead
//! of duplicated in both callers.

use crate::error::{ScramError, ScramResult};
use crate::model::formula::{Arg, Connective, Formula, Literal};
use crate::model::ids::{EventRef, GateId};
use crate::model::Model;

/// Evaluate `gate` under the assignment given by `failed` (true iff that
/// basic event has failed in this trial/combination). `stack` guards
/// against a cyclic `TransferIn` chain; the gate graph is acyclic in a
/// validated model, so a well-formed model always terminates without
/// tripping it.
pub fn evaluate_gate(
    model: &Model,
    gate: GateId,
    failed: &impl Fn(crate::model::ids::BasicEventId) -> bool,
    stack: &mut Vec<GateId>,
) -> ScramResult<bool> {
    if stack.contains(&gate) {
        return Err(ScramError::logic("cycle encountered evaluating gate graph"));
    }
    stack.push(gate);
    let formula = &model.gates[gate].formula;
    let result = evaluate_formula(model, formula, failed, stack)?;
    stack.pop();
    Ok(result)
}

fn evaluate_formula(
    model: &Model,
    formula: &Formula,
    failed: &impl Fn(crate::model::ids::BasicEventId) -> bool,
    stack: &mut Vec<GateId>,
) -> ScramResult<bool> {
    let values = formula
        .args
        .iter()
        .map(|lit| evaluate_literal(model, lit, failed, stack))
        .collect::<ScramResult<Vec<bool>>>()?;
    let true_count = values.iter().filter(|&&v| v).count();
    Ok(match formula.connective {
        Connective::And => values.iter().all(|&v| v),
        Connective::Or => values.iter().any(|&v| v),
        Connective::Nand => !values.iter().all(|&v| v),
        Connective::Nor => !values.iter().any(|&v| v),
        Connective::Not | Connective::Null if values.len() == 1 => {
            if matches!(formula.connective, Connective::Not) {
                !values[0]
            } else {
                values[0]
            }
        }
        Connective::Not | Connective::Null => {
            return Err(ScramError::logic("not/null formula must have exactly one argument"))
        }
        Connective::Xor => true_count % 2 == 1,
        Connective::Imply => !values[0] || values[1],
        Connective::Iff => values[0] == values[1],
        Connective::Atleast(k) => true_count >= k as usize,
        Connective::Cardinality(min, max) => true_count >= min as usize && true_count <= max as usize,
        Connective::Constant(v) => v,
        Connective::TransferIn(target) => evaluate_gate(model, target, failed, stack)?,
    })
}

fn evaluate_literal(
    model: &Model,
    lit: &Literal,
    failed: &impl Fn(crate::model::ids::BasicEventId) -> bool,
    stack: &mut Vec<GateId>,
) -> ScramResult<bool> {
    let value = match &lit.arg {
        Arg::Event(EventRef::Basic(id)) => failed(*id),
        Arg::Event(EventRef::House(id)) => model.house_events[*id].state,
        Arg::Event(EventRef::Gate(id)) => evaluate_gate(model, *id, failed, stack)?,
        Arg::Nested(f) => evaluate_formula(model, f, failed, stack)?,
    };
    Ok(value ^ lit.complement)
}
