//! Synthetic random fault-tree generator: produces a
//! `scram_core::model::Model` of a requested size for stress-testing the
//! cut-set engines' order-truncation behaviour, in place of an external
//! CNF-solver benchmark harness.
//!
//! Same shape as a typical random-fault-tree generator: a chain of gates
//! `G0..Gn` where gate `i` may only take children from gates with a
//! strictly larger index or from the basic event pool, guaranteeing an
//! acyclic graph by construction; a `root` gate on top drawing from the
//! earliest gates; unused basic events stitched into the tail of the
//! chain. Built against `scram-core`'s own arena API.

use std::collections::HashMap;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use scram_core::expr::Expression;
use scram_core::model::container::Gate;
use scram_core::model::event::{BasicEvent, Role};
use scram_core::model::formula::{Arg, Connective, Formula, Literal};
use scram_core::model::ids::{EventRef, GateId};
use scram_core::model::Model;

/// Proportions of basic events vs. AND/OR/at-least gates among the
/// generated nodes. `and_rate + or_rate + atleast_rate` must sum to 1.
#[derive(Debug, Clone, Copy)]
pub struct RftConfig {
    pub basic_event_rate: f64,
    pub and_rate: f64,
    pub or_rate: f64,
    pub atleast_rate: f64,
}

impl RftConfig {
    pub fn new(basic_event_rate: f64, and_rate: f64, or_rate: f64, atleast_rate: f64) -> Self {
        let total = and_rate + or_rate + atleast_rate;
        assert!(
            (total - 1.0).abs() < 1e-9,
            "gate rates must sum to 1, got and={and_rate} or={or_rate} atleast={atleast_rate} (sum={total})"
        );
        RftConfig { basic_event_rate, and_rate, or_rate, atleast_rate }
    }
}

enum ConnectiveKind {
    And,
    Or,
    Atleast(u32),
}

enum ChildRef {
    Basic(String),
    Gate(String),
}

/// Generate a random `Model` of approximately `n_nodes` basic
/// events + gates combined.
///
/// `prob_multiplier` scales each basic event's raw `[0,1)` draw down (so
/// top-event probability stays small, as in a realistic safety system);
/// `perc_last` is the fraction of the gate chain (by index) eligible to
/// receive basic events that no earlier gate picked up, so no basic
/// event is left dangling and unreachable from the root; `max_children`
/// bounds how many arguments a single gate's formula may take.
pub fn generate(
    n_nodes: usize,
    config: RftConfig,
    prob_multiplier: f64,
    perc_last: f64,
    seed: u64,
    max_children: usize,
) -> Model {
    assert!(config.basic_event_rate < 1.0, "the rate of basic events can't be 1");
    let n_be = (config.basic_event_rate * n_nodes as f64) as usize;
    assert!(n_be > 1, "need at least more than 2 basic events");
    let n_gates = (n_nodes - n_be).saturating_sub(1);
    assert!(n_gates > 0, "need at least one gate besides the root");

    let mut rng = StdRng::seed_from_u64(seed);

    let be_names: Vec<String> = (0..n_be).map(|i| format!("BE{i}")).collect();
    let gate_names: Vec<String> = (0..n_gates).map(|i| format!("G{i}")).collect();

    let ahead = max_children.max(8);
    let mut used_be: Vec<String> = Vec::new();
    let mut children: Vec<(ConnectiveKind, Vec<ChildRef>)> = Vec::with_capacity(n_gates);

    for i in 0..n_gates {
        let k = rng.gen_range(3..=max_children.max(3));
        let mut offsets: Vec<usize> = (1..=ahead).collect();
        offsets.shuffle(&mut rng);
        let picks = &offsets[..k.min(offsets.len())];

        let mut refs = Vec::with_capacity(picks.len());
        for &off in picks {
            let idx = i + off;
            if idx >= n_gates {
                let be = be_names.choose(&mut rng).expect("basic event pool is non-empty").clone();
                used_be.push(be.clone());
                refs.push(ChildRef::Basic(be));
            } else {
                refs.push(ChildRef::Gate(gate_names[idx].clone()));
            }
        }

        let val: f64 = rng.gen();
        let kind = if val <= config.and_rate {
            ConnectiveKind::And
        } else if val <= config.and_rate + config.or_rate || refs.len() < 3 {
            ConnectiveKind::Or
        } else {
            let k = rng.gen_range(2..refs.len());
            ConnectiveKind::Atleast(k as u32)
        };
        children.push((kind, refs));
    }

    // Stitch any basic event no gate picked up into the trailing
    // `perc_last` fraction of the chain, so every basic event is
    // reachable from the root.
    let unused: Vec<String> = be_names.iter().filter(|be| !used_be.contains(be)).cloned().collect();
    let last_start = ((n_gates as f64) * perc_last) as usize;
    let last_start = last_start.min(n_gates.saturating_sub(1));
    if last_start < n_gates {
        for be in &unused {
            let idx = (last_start..n_gates).choose(&mut rng).expect("trailing gate range is non-empty");
            children[idx].1.push(ChildRef::Basic(be.clone()));
        }
    }

    let mut model = Model::new("RandomFaultTree");
    let root_container = model.root;

    let mut be_ids = HashMap::new();
    for name in &be_names {
        let raw: f64 = rng.gen();
        let p = (raw * prob_multiplier).clamp(0.0, 1.0);
        let id = model.add_basic_event(
            root_container,
            BasicEvent { id: name.clone(), role: Role::Public, expression: Some(Expression::Constant(p)) },
        );
        be_ids.insert(name.clone(), id);
    }

    // Placeholder gates first so every name has a stable `GateId` before
    // any formula (which may reference a later gate) is wired up.
    let mut gate_ids: HashMap<String, GateId> = HashMap::new();
    for name in &gate_names {
        let placeholder = Formula::new(Connective::Constant(false), Vec::new());
        let id = model.add_gate(root_container, Gate { id: name.clone(), role: Role::Public, formula: placeholder });
        gate_ids.insert(name.clone(), id);
    }

    for (i, name) in gate_names.iter().enumerate() {
        let (kind, refs) = &children[i];
        let args: Vec<Literal> = refs
            .iter()
            .map(|r| match r {
                ChildRef::Basic(n) => Literal::positive(Arg::Event(EventRef::Basic(be_ids[n]))),
                ChildRef::Gate(n) => Literal::positive(Arg::Event(EventRef::Gate(gate_ids[n]))),
            })
            .collect();
        let connective = match kind {
            ConnectiveKind::And => Connective::And,
            ConnectiveKind::Or => Connective::Or,
            ConnectiveKind::Atleast(k) => Connective::Atleast(*k),
        };
        model.gates[gate_ids[name]].formula = Formula::new(connective, args);
    }

    let pool_size = gate_names.len().min(6);
    let elems = rng.gen_range(2..=pool_size.max(2));
    let root_children: Vec<String> = gate_names[..pool_size].iter().cloned().choose_multiple(&mut rng, elems);
    let root_args: Vec<Literal> =
        root_children.iter().map(|n| Literal::positive(Arg::Event(EventRef::Gate(gate_ids[n])))).collect();
    let root_connective = if rng.gen::<f64>() <= config.and_rate { Connective::And } else { Connective::Or };
    let root_id =
        model.add_gate(root_container, Gate { id: "TOP".to_string(), role: Role::Public, formula: Formula::new(root_connective, root_args) });
    model.set_top_gate(root_id);

    model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_acyclic_model_of_requested_scale() {
        let config = RftConfig::new(0.5, 0.5, 0.5, 0.0);
        let mut model = generate(200, config, 1e-3, 0.6, 42, 5);
        assert!(model.top_gate.is_some());
        assert!(model.basic_events.len() > 1);
        assert!(model.gates.len() > 1);
        model.validate(scram_core::model::validate::ValidationOptions { require_probabilities: true }).unwrap();
    }

    #[test]
    fn same_seed_is_deterministic() {
        let config = RftConfig::new(0.5, 0.6, 0.4, 0.0);
        let a = generate(100, config, 1e-3, 0.6, 7, 5);
        let b = generate(100, config, 1e-3, 0.6, 7, 5);
        assert_eq!(a.basic_events.len(), b.basic_events.len());
        assert_eq!(a.gates.len(), b.gates.len());
        for (ea, eb) in a.basic_events.iter().zip(b.basic_events.iter()) {
            assert_eq!(ea.id, eb.id);
        }
    }

    #[test]
    #[should_panic(expected = "gate rates must sum to 1")]
    fn rejects_gate_rates_not_summing_to_one() {
        RftConfig::new(0.5, 0.5, 0.9, 0.0);
    }
}
