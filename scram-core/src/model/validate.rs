//! Structural validation pipeline.
//!
//! Runs the model through its structural checks: gate graph acyclic,
//! parameter graph acyclic, formula arity/type rules, CCF factor list
//! shape per model kind, and (if requested) every basic event having
//! a probability expression.

use std::collections::HashMap;

use super::ccf::CcfModelKind;
use super::formula::{Arg, Connective, Formula};
use super::ids::{EventRef, GateId, ParameterId};
use super::{Lifecycle, Model};
use crate::error::{Locus, ScramError, ScramResult};
use crate::expr::Expression;

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    pub require_probabilities: bool,
}

impl Model {
    pub fn validate(&mut self, options: ValidationOptions) -> ScramResult<()> {
        check_gate_acyclic(self)?;
        check_parameter_acyclic(self)?;
        check_formula_arity(self)?;
        check_ccf_groups(self)?;
        if options.require_probabilities {
            check_basic_event_probabilities(self)?;
        }
        self.advance_lifecycle(Lifecycle::Validated);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

fn check_gate_acyclic(model: &Model) -> ScramResult<()> {
    let n = model.gates.len();
    let mut colour = vec![Colour::White; n];
    let mut stack_path: Vec<String> = Vec::new();

    fn visit(
        model: &Model,
        id: GateId,
        colour: &mut [Colour],
        path: &mut Vec<String>,
    ) -> ScramResult<()> {
        let idx = id.index();
        match colour[idx] {
            Colour::Black => return Ok(()),
            Colour::Grey => {
                path.push(model.gates[id].id.clone());
                return Err(ScramError::Cycle {
                    cycle: path.clone(),
                    locus: Locus::element(model.gates[id].id.clone()),
                });
            }
            Colour::White => {}
        }
        colour[idx] = Colour::Grey;
        path.push(model.gates[id].id.clone());
        for lit in &model.gates[id].formula.args {
            visit_arg(model, &lit.arg, colour, path)?;
        }
        path.pop();
        colour[idx] = Colour::Black;
        Ok(())
    }

    fn visit_arg(
        model: &Model,
        arg: &Arg,
        colour: &mut [Colour],
        path: &mut Vec<String>,
    ) -> ScramResult<()> {
        match arg {
            Arg::Event(EventRef::Gate(gid)) => visit(model, *gid, colour, path),
            Arg::Event(_) => Ok(()),
            Arg::Nested(f) => {
                for lit in &f.args {
                    visit_arg(model, &lit.arg, colour, path)?;
                }
                Ok(())
            }
        }
    }

    for (id, _) in model.gates.iter_enumerated() {
        if colour[id.index()] == Colour::White {
            visit(model, id, &mut colour, &mut stack_path)?;
        }
    }
    Ok(())
}

fn check_parameter_acyclic(model: &Model) -> ScramResult<()> {
    let n = model.parameters.len();
    let mut colour = vec![Colour::White; n];

    let name_to_id: HashMap<&str, ParameterId> = model
        .parameters
        .iter_enumerated()
        .map(|(id, p)| (p.id.as_str(), id))
        .collect();

    fn visit(
        model: &Model,
        name_to_id: &HashMap<&str, ParameterId>,
        id: ParameterId,
        colour: &mut [Colour],
        path: &mut Vec<String>,
    ) -> ScramResult<()> {
        let idx = id.index();
        match colour[idx] {
            Colour::Black => return Ok(()),
            Colour::Grey => {
                path.push(model.parameters[id].id.clone());
                return Err(ScramError::Cycle {
                    cycle: path.clone(),
                    locus: Locus::element(model.parameters[id].id.clone()),
                });
            }
            Colour::White => {}
        }
        colour[idx] = Colour::Grey;
        path.push(model.parameters[id].id.clone());
        for name in referenced_parameters(&model.parameters[id].expression) {
            if let Some(&next) = name_to_id.get(name.as_str()) {
                visit(model, name_to_id, next, colour, path)?;
            }
        }
        path.pop();
        colour[idx] = Colour::Black;
        Ok(())
    }

    for (id, _) in model.parameters.iter_enumerated() {
        if colour[id.index()] == Colour::White {
            let mut path = Vec::new();
            visit(model, &name_to_id, id, &mut colour, &mut path)?;
        }
    }
    Ok(())
}

fn referenced_parameters(expr: &Expression) -> Vec<String> {
    let mut out = Vec::new();
    expr.collect_parameter_refs(&mut out);
    out
}

fn check_formula_arity(model: &Model) -> ScramResult<()> {
    for gate in model.gates.iter() {
        validate_formula(&gate.id, &gate.formula)?;
    }
    Ok(())
}

fn validate_formula(owner: &str, formula: &Formula) -> ScramResult<()> {
    let n = formula.args.len();
    let locus = || Locus::element(owner.to_string()).attribute("formula");
    match formula.connective {
        Connective::Not | Connective::Null => {
            if n != 1 {
                return Err(ScramError::validity(
                    format!("'not'/'null' formula requires exactly one argument, got {n}"),
                    locus(),
                ));
            }
        }
        Connective::Imply | Connective::Iff => {
            if n != 2 {
                return Err(ScramError::validity(
                    format!("'imply'/'iff' formula requires exactly two arguments, got {n}"),
                    locus(),
                ));
            }
        }
        Connective::Atleast(k) => {
            if !(2 <= k && (k as usize) <= n) {
                return Err(ScramError::validity(
                    format!("'atleast({k})' requires 2 <= k <= #args ({n})"),
                    locus(),
                ));
            }
        }
        Connective::Cardinality(min, max) => {
            if !(min <= max && (max as usize) <= n) {
                return Err(ScramError::validity(
                    format!("'cardinality({min},{max})' requires 0 <= min <= max <= #args ({n})"),
                    locus(),
                ));
            }
        }
        Connective::TransferIn(_) => {}
        Connective::And | Connective::Or | Connective::Xor | Connective::Nand | Connective::Nor => {
            if n == 0 {
                return Err(ScramError::validity(
                    "and/or/xor/nand/nor formula requires at least one argument",
                    locus(),
                ));
            }
        }
        Connective::Constant(_) => {
            if n != 0 {
                return Err(ScramError::validity("constant formula takes no arguments", locus()));
            }
        }
    }

    // no duplicate argument literal within one formula
    let mut seen: Vec<(&EventRef, bool)> = Vec::new();
    for lit in &formula.args {
        if let Arg::Event(ev) = &lit.arg {
            if seen.iter().any(|(e, c)| **e == *ev && *c == lit.complement) {
                return Err(ScramError::validity(
                    "duplicate argument literal within one formula",
                    locus(),
                ));
            }
            seen.push((ev, lit.complement));
        }
        if let Arg::Nested(f) = &lit.arg {
            validate_formula(owner, f)?;
        }
    }
    Ok(())
}

fn check_ccf_groups(model: &Model) -> ScramResult<()> {
    for group in model.ccf_groups.iter() {
        let m = group.group_size();
        let locus = || Locus::element(group.id.clone()).attribute("factors");
        match group.kind {
            CcfModelKind::BetaFactor => {
                if group.factors.len() != 1 || group.factors[0].level != 2 {
                    return Err(ScramError::validity(
                        "beta-factor CCF group requires exactly one factor at level 2",
                        locus(),
                    ));
                }
            }
            CcfModelKind::Mgl => {
                let mut levels: Vec<u32> = group.factors.iter().map(|f| f.level).collect();
                levels.sort_unstable();
                let expected: Vec<u32> = (2..=m as u32).collect();
                if levels != expected {
                    return Err(ScramError::validity(
                        format!("MGL CCF group requires factors for levels 2..{m}"),
                        locus(),
                    ));
                }
            }
            CcfModelKind::AlphaFactor => {
                let mut levels: Vec<u32> = group.factors.iter().map(|f| f.level).collect();
                levels.sort_unstable();
                let expected: Vec<u32> = (1..=m as u32).collect();
                if levels != expected {
                    return Err(ScramError::validity(
                        format!("alpha-factor CCF group requires factors for levels 1..{m}"),
                        locus(),
                    ));
                }
                let sum: f64 = group.factors.iter().map(|f| f.value).sum();
                if (sum - 1.0).abs() > 1e-9 {
                    return Err(ScramError::validity(
                        format!("alpha-factor values must sum to 1, got {sum}"),
                        locus(),
                    ));
                }
            }
            CcfModelKind::PhiFactor => {
                let mut levels: Vec<u32> = group.factors.iter().map(|f| f.level).collect();
                levels.sort_unstable();
                let expected: Vec<u32> = (1..=m as u32).collect();
                if levels != expected {
                    return Err(ScramError::validity(
                        format!("phi-factor CCF group requires factors for levels 1..{m}"),
                        locus(),
                    ));
                }
                let sum: f64 = group.factors.iter().map(|f| f.value).sum();
                if (sum - 1.0).abs() > 1e-6 {
                    return Err(ScramError::validity(
                        format!("phi-factor values must sum to 1 within tolerance, got {sum}"),
                        locus(),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn check_basic_event_probabilities(model: &Model) -> ScramResult<()> {
    for event in model.basic_events.iter() {
        if event.expression.is_none() {
            return Err(ScramError::validity(
                "basic event has no probability expression but probability analysis was requested",
                Locus::element(event.id.clone()),
            ));
        }
    }
    Ok(())
}
