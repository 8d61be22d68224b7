//! End-to-end scenarios built as real `Model`s (gates, formulas, and
//! basic-event probabilities wired up directly, no XML fixture) and run
//! through the actual cut-set engines and quantification pipeline.

use scram_core::context::AnalysisContext;
use scram_core::cutset::algebraic::AlgebraicEngine;
use scram_core::cutset::combinatorial::CombinatorialEngine;
use scram_core::cutset::CutSetMode;
use scram_core::expr::{EvalContext, Expression};
use scram_core::model::container::Gate;
use scram_core::model::event::{BasicEvent, Role};
use scram_core::model::formula::{Arg, Connective, Formula, Literal};
use scram_core::model::ids::EventRef;
use scram_core::model::Model;
use scram_core::quantify::{build_probability_vector, importance_measures, top_probability, Approximation};

fn basic(model: &mut Model, name: &str, p: f64) -> scram_core::model::ids::BasicEventId {
    let root = model.root;
    model.add_basic_event(
        root,
        BasicEvent { id: name.to_string(), role: Role::Public, expression: Some(Expression::Constant(p)) },
    )
}

/// Two-train pump/valve tree: `TOP = (PumpOne OR ValveOne) AND (PumpTwo OR
/// ValveTwo)`, whose minimal cut sets are the four two-event combinations
/// that pick one event from each train.
fn two_train_pump_valve_model() -> Model {
    let mut model = Model::new("PumpValve");
    let root = model.root;

    let pump_one = basic(&mut model, "PumpOne", 0.6);
    let pump_two = basic(&mut model, "PumpTwo", 0.7);
    let valve_one = basic(&mut model, "ValveOne", 0.4);
    let valve_two = basic(&mut model, "ValveTwo", 0.5);

    let train_a = model.add_gate(
        root,
        Gate {
            id: "TrainA".to_string(),
            role: Role::Public,
            formula: Formula::new(
                Connective::Or,
                vec![
                    Literal::positive(Arg::Event(EventRef::Basic(pump_one))),
                    Literal::positive(Arg::Event(EventRef::Basic(valve_one))),
                ],
            ),
        },
    );
    let train_b = model.add_gate(
        root,
        Gate {
            id: "TrainB".to_string(),
            role: Role::Public,
            formula: Formula::new(
                Connective::Or,
                vec![
                    Literal::positive(Arg::Event(EventRef::Basic(pump_two))),
                    Literal::positive(Arg::Event(EventRef::Basic(valve_two))),
                ],
            ),
        },
    );
    let top = model.add_gate(
        root,
        Gate {
            id: "TOP".to_string(),
            role: Role::Public,
            formula: Formula::new(
                Connective::And,
                vec![
                    Literal::positive(Arg::Event(EventRef::Gate(train_a))),
                    Literal::positive(Arg::Event(EventRef::Gate(train_b))),
                ],
            ),
        },
    );
    model.set_top_gate(top);
    model
}

#[test]
fn two_train_pump_valve_minimal_cut_sets_and_probability() {
    let model = two_train_pump_valve_model();
    model
        .validate(scram_core::model::validate::ValidationOptions { require_probabilities: true })
        .expect("well-formed tree should validate");

    let mut ctx = AnalysisContext::new(1, model.mission_time);
    let mut engine = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 4);
    let sop = engine.compute(&mut ctx).unwrap();

    // PumpOne=0 PumpTwo=1 ValveOne=2 ValveTwo=3 -> positive bits 0,2,4,6.
    assert_eq!(sop.count(), 4);
    let orders: Vec<usize> = sop.groups().iter().map(|g| g.order()).collect();
    assert!(orders.iter().all(|&o| o == 2), "every cut set should be order 2, got {orders:?}");

    let eval_ctx = EvalContext::new(model.mission_time);
    let probs = build_probability_vector(&model, &eval_ctx).unwrap();

    let exact = top_probability(&sop, &probs, Approximation::Exact, 4, 0, false);
    assert!((exact.value - 0.646).abs() < 1e-3, "got {}", exact.value);

    let mcub = top_probability(&sop, &probs, Approximation::Mcub, 4, 0, false);
    assert!((mcub.value - 0.766144).abs() < 1e-5, "got {}", mcub.value);

    let importance = importance_measures(&sop, &probs, exact.value, 4);
    let pump_one = importance.get(&scram_core::model::ids::BasicEventId::new(0)).unwrap();
    assert!((pump_one.fussell_vesely - 0.7895).abs() < 1e-3, "got {}", pump_one.fussell_vesely);
}

/// Property: the algebraic and combinatorial engines must agree on the
/// minimal-cut-set `Expr`, ignoring nothing — both keep the same
/// canonical sorted-group-vector invariant, so equal cut-set sets compare
/// as equal `Expr`s directly.
#[test]
fn algebraic_and_combinatorial_engines_agree() {
    let model = two_train_pump_valve_model();

    let mut ctx_a = AnalysisContext::new(2, model.mission_time);
    let mut algebraic = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 4);
    let from_algebraic = algebraic.compute(&mut ctx_a).unwrap();

    let mut ctx_b = AnalysisContext::new(3, model.mission_time);
    let combinatorial = CombinatorialEngine::new(&model, CutSetMode::MinimalCutSets, 4);
    let from_combinatorial = combinatorial.compute(&mut ctx_b).unwrap();

    assert_eq!(from_algebraic, from_combinatorial);
}

/// A gate with a complemented literal (`B OR (A AND NOT B)`) is
/// non-coherent: its full prime-implicant form keeps a group with a
/// negative literal, but the coherent (minimal-cut-set) filter drops it.
#[test]
fn non_coherent_gate_splits_between_mcs_and_prime_implicant_modes() {
    let mut model = Model::new("NonCoherent");
    let root = model.root;
    let a = basic(&mut model, "A", 0.2);
    let b = basic(&mut model, "B", 0.3);

    let a_and_not_b = Formula::new(
        Connective::And,
        vec![
            Literal::positive(Arg::Event(EventRef::Basic(a))),
            Literal::negated(Arg::Event(EventRef::Basic(b))),
        ],
    );
    let top_formula = Formula::new(
        Connective::Or,
        vec![
            Literal::positive(Arg::Event(EventRef::Basic(b))),
            Literal::positive(Arg::Nested(Box::new(a_and_not_b))),
        ],
    );
    assert!(top_formula.is_non_coherent());
    let top = model.add_gate(root, Gate { id: "TOP".to_string(), role: Role::Public, formula: top_formula });
    model.set_top_gate(top);

    let mut ctx = AnalysisContext::new(4, model.mission_time);

    let mut pi_engine = AlgebraicEngine::new(&model, CutSetMode::PrimeImplicants, 4);
    let pi = pi_engine.compute(&mut ctx).unwrap();
    assert_eq!(pi.count(), 2, "expected {{B}} and {{A, not B}}, got {:?}", pi.groups());
    assert!(
        pi.groups().iter().any(|g| g.order() == 2 && g.bits().iter_ones().any(|bit| !scram_core::cutset::BitLayout::is_positive(bit))),
        "prime-implicant form should retain a group with a negative literal"
    );

    let mut mcs_engine = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 4);
    let mcs = mcs_engine.compute(&mut ctx).unwrap();
    assert_eq!(mcs.count(), 1, "coherent filter should keep only {{B}}");
    assert_eq!(mcs.groups()[0].order(), 1);

    // The combinatorial engine can't reason about negative literals at all.
    let combo = CombinatorialEngine::new(&model, CutSetMode::PrimeImplicants, 4);
    assert!(combo.compute(&mut ctx).is_err());
}

/// A single basic event that is its own (only) cut set, forced to
/// probability 1: Birnbaum stays finite, RAW saturates at 1 (forcing the
/// already-certain event to 1 changes nothing), and RRW falls back to its
/// defined zero rather than dividing by the now-zero denominator.
#[test]
fn importance_measures_are_defined_at_probability_one() {
    let mut model = Model::new("SinglePoint");
    let root = model.root;
    let a = basic(&mut model, "A", 1.0);
    let top = model.add_gate(
        root,
        Gate {
            id: "TOP".to_string(),
            role: Role::Public,
            formula: Formula::new(Connective::Null, vec![Literal::positive(Arg::Event(EventRef::Basic(a)))]),
        },
    );
    model.set_top_gate(top);

    let mut ctx = AnalysisContext::new(5, model.mission_time);
    let mut engine = AlgebraicEngine::new(&model, CutSetMode::MinimalCutSets, 1);
    let sop = engine.compute(&mut ctx).unwrap();
    assert_eq!(sop.count(), 1);

    let eval_ctx = EvalContext::new(model.mission_time);
    let probs = build_probability_vector(&model, &eval_ctx).unwrap();
    let exact = top_probability(&sop, &probs, Approximation::Exact, 1, 0, false);
    assert!((exact.value - 1.0).abs() < 1e-12);

    let importance = importance_measures(&sop, &probs, exact.value, 1);
    let a_importance = importance.get(&scram_core::model::ids::BasicEventId::new(0)).unwrap();
    assert!(a_importance.birnbaum.is_finite());
    assert!((a_importance.raw - 1.0).abs() < 1e-12);
    assert_eq!(a_importance.rrw, 0.0);
}
