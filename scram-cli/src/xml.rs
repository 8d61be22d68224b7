//! Best-effort OPSA-MEF XML reader: the core does not parse XML itself —
//! it only consumes the validated in-memory `Model` of
//! `scram-core::model` — so this binary owns a small `quick-xml`-based
//! translator covering a practical subset of the OPSA-MEF grammar. This
//! is a convenience reader, not a validating parser; RELAX-NG validation
//! is out of scope.
//!
//! Follows `quick-xml`'s own recommended event-loop style.
//!
//! Two passes over a generic XML tree, built once with `quick-xml`:
//! the first registers every container/gate/basic-event/house-event/
//! parameter/CCF-group name (so forward references between gates resolve
//! regardless of declaration order), the second parses gate formulas now
//! that every name in scope is known.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use scram_core::error::{Locus, ScramError, ScramResult};
use scram_core::model::ccf::{CcfFactor, CcfGroup, CcfModelKind};
use scram_core::model::container::Gate;
use scram_core::model::event::{BasicEvent, HouseEvent, Parameter, Role};
use scram_core::model::formula::{Arg, Connective, Formula, Literal};
use scram_core::model::ids::{ContainerId, EventRef, GateId};
use scram_core::model::Model;
use scram_core::expr::{Expression, HistogramBin};

/// A generic, order-preserving XML element tree. Attribute and child
/// order within a tag is not meaningful to OPSA-MEF so it is not
/// preserved beyond source order, which is all parsing below needs.
#[derive(Debug, Clone)]
struct XmlNode {
    tag: String,
    attrs: HashMap<String, String>,
    children: Vec<XmlNode>,
    text: String,
}

fn parse_tree(bytes: &[u8]) -> ScramResult<XmlNode> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut stack: Vec<XmlNode> = vec![XmlNode { tag: "#root".to_string(), attrs: HashMap::new(), children: Vec::new(), text: String::new() }];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| ScramError::parse(format!("XML syntax error: {e}")))? {
            Event::Start(start) => {
                let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();
                let mut attrs = HashMap::new();
                for attr in start.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr.unescape_value().map(|v| v.to_string()).unwrap_or_default();
                    attrs.insert(key, value);
                }
                stack.push(XmlNode { tag, attrs, children: Vec::new(), text: String::new() });
            }
            Event::Empty(start) => {
                let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();
                let mut attrs = HashMap::new();
                for attr in start.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr.unescape_value().map(|v| v.to_string()).unwrap_or_default();
                    attrs.insert(key, value);
                }
                let node = XmlNode { tag, attrs, children: Vec::new(), text: String::new() };
                stack.last_mut().unwrap().children.push(node);
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| ScramError::parse("unbalanced XML closing tag"))?;
                stack.last_mut().ok_or_else(|| ScramError::parse("unbalanced XML closing tag"))?.children.push(node);
            }
            Event::Text(text) => {
                let decoded = text.unescape().map(|t| t.to_string()).unwrap_or_default();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(decoded.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut root = stack.pop().ok_or_else(|| ScramError::parse("empty XML document"))?;
    root.children.pop().ok_or_else(|| ScramError::parse("XML document has no root element"))
}

fn attr<'a>(node: &'a XmlNode, name: &str) -> ScramResult<&'a str> {
    node.attrs.get(name).map(|s| s.as_str()).ok_or_else(|| {
        ScramError::parse_at(format!("missing required attribute '{name}'"), Locus::element(node.tag.clone()).attribute(name))
    })
}

fn role_of(node: &XmlNode) -> Role {
    match node.attrs.get("role").map(|s| s.as_str()) {
        Some("private") => Role::Private,
        _ => Role::Public,
    }
}

fn content_children<'a>(node: &'a XmlNode) -> impl Iterator<Item = &'a XmlNode> {
    node.children.iter().filter(|c| c.tag != "label" && c.tag != "attributes")
}

struct GateSlot {
    container: ContainerId,
    gate: GateId,
    node: XmlNode,
}

struct CcfSlot {
    container: ContainerId,
    node: XmlNode,
}

/// Parse an OPSA-MEF XML document into a `Model`.
pub fn parse_model(bytes: &[u8], model_name: &str) -> ScramResult<Model> {
    let tree = parse_tree(bytes)?;
    let mef_root = tree
        .children
        .iter()
        .find(|c| c.tag == "opsa-mef")
        .ok_or_else(|| ScramError::parse("document has no <opsa-mef> root element"))?;

    let mut model = Model::new(model_name);
    let root = model.root;
    let mut gate_slots = Vec::new();
    let mut ccf_slots = Vec::new();

    register(&mut model, mef_root, root, &mut gate_slots, &mut ccf_slots)?;

    for slot in ccf_slots {
        build_ccf_group(&mut model, slot)?;
    }

    for slot in gate_slots {
        let formula_node = content_children(&slot.node)
            .next()
            .ok_or_else(|| ScramError::validity("gate has no formula", Locus::element(model.gates[slot.gate].id.clone())))?;
        let formula = parse_formula(&model, slot.container, formula_node)?;
        model.gates[slot.gate].formula = formula;
    }

    Ok(model)
}

fn register(
    model: &mut Model,
    node: &XmlNode,
    container: ContainerId,
    gate_slots: &mut Vec<GateSlot>,
    ccf_slots: &mut Vec<CcfSlot>,
) -> ScramResult<()> {
    for child in &node.children {
        match child.tag.as_str() {
            "define-fault-tree" | "define-component" => {
                let name = attr(child, "name")?.to_string();
                let sub = model.new_component(name, role_of(child), container);
                register(model, child, sub, gate_slots, ccf_slots)?;
            }
            "define-gate" => {
                let name = attr(child, "name")?.to_string();
                let placeholder = Formula::new(Connective::Constant(false), Vec::new());
                let gate = model.add_gate(container, Gate { id: name, role: role_of(child), formula: placeholder });
                gate_slots.push(GateSlot { container, gate, node: child.clone() });
            }
            "define-basic-event" => {
                let name = attr(child, "name")?.to_string();
                let expression = content_children(child).next().map(|n| parse_expression(n)).transpose()?;
                model.add_basic_event(container, BasicEvent { id: name, role: role_of(child), expression });
            }
            "define-house-event" => {
                let name = attr(child, "name")?.to_string();
                let state = content_children(child)
                    .next()
                    .map(parse_house_state)
                    .transpose()?
                    .unwrap_or(false);
                model.add_house_event(container, HouseEvent { id: name, role: role_of(child), state });
            }
            "define-parameter" => {
                let name = attr(child, "name")?.to_string();
                let unit = child.attrs.get("unit").cloned();
                let expr_node = content_children(child)
                    .next()
                    .ok_or_else(|| ScramError::validity("parameter has no value expression", Locus::element(name.clone())))?;
                let expression = parse_expression(expr_node)?;
                model.add_parameter(container, Parameter { id: name, role: role_of(child), unit, expression, unused: false });
            }
            "define-CCF-group" => {
                ccf_slots.push(CcfSlot { container, node: child.clone() });
            }
            "define-mission-time" => {
                if let Some(value) = child.attrs.get("value") {
                    model.mission_time = value.parse().map_err(|_| ScramError::parse("mission-time value is not a number"))?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_house_state(node: &XmlNode) -> ScramResult<bool> {
    match node.tag.as_str() {
        "constant" => {
            let v = attr(node, "value")?;
            match v {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(ScramError::parse(format!("house-event constant must be true/false, got '{other}'"))),
            }
        }
        other => Err(ScramError::parse(format!("unsupported house-event state element '{other}'"))),
    }
}

fn build_ccf_group(model: &mut Model, slot: CcfSlot) -> ScramResult<()> {
    let node = &slot.node;
    let name = attr(node, "name")?.to_string();
    let model_attr = attr(node, "model")?;
    let kind = match model_attr {
        "beta-factor" => CcfModelKind::BetaFactor,
        "MGL" => CcfModelKind::Mgl,
        "alpha-factor" => CcfModelKind::AlphaFactor,
        "phi-factor" => CcfModelKind::PhiFactor,
        other => return Err(ScramError::validity(format!("unknown CCF group model '{other}'"), Locus::element(name))),
    };

    let members_node = node
        .children
        .iter()
        .find(|c| c.tag == "members")
        .ok_or_else(|| ScramError::validity("CCF group has no <members>", Locus::element(name.clone())))?;
    let mut members = Vec::new();
    for member in &members_node.children {
        if member.tag != "basic-event" {
            continue;
        }
        let member_name = attr(member, "name")?.to_string();
        let id = match model.resolve_event(slot.container, &member_name) {
            Some(EventRef::Basic(id)) => id,
            Some(_) => return Err(ScramError::validity("CCF member name resolves to a non-basic-event", Locus::element(member_name))),
            None => model.add_basic_event(slot.container, BasicEvent { id: member_name.clone(), role: Role::Public, expression: None }),
        };
        members.push(id);
    }

    let distribution_node = node
        .children
        .iter()
        .find(|c| c.tag == "distribution")
        .ok_or_else(|| ScramError::validity("CCF group has no <distribution>", Locus::element(name.clone())))?;
    let distribution = parse_expression(
        content_children(distribution_node)
            .next()
            .ok_or_else(|| ScramError::validity("CCF <distribution> has no value expression", Locus::element(name.clone())))?,
    )?;

    let factors_node = node
        .children
        .iter()
        .find(|c| c.tag == "factors")
        .ok_or_else(|| ScramError::validity("CCF group has no <factors>", Locus::element(name.clone())))?;
    let mut factors = Vec::new();
    for factor_node in &factors_node.children {
        if factor_node.tag != "factor" {
            continue;
        }
        let level: u32 = attr(factor_node, "level")?
            .parse()
            .map_err(|_| ScramError::parse("CCF factor level is not an integer"))?;
        let value_expr = parse_expression(
            content_children(factor_node)
                .next()
                .ok_or_else(|| ScramError::validity("CCF <factor> has no value expression", Locus::element(name.clone())))?,
        )?;
        let value = value_expr.mean(&scram_core::expr::EvalContext::new(0.0))?;
        factors.push(CcfFactor { level, value });
    }

    model.add_ccf_group(slot.container, CcfGroup { id: name, role: role_of(node), kind, members, distribution, factors });
    Ok(())
}

fn parse_formula(model: &Model, container: ContainerId, node: &XmlNode) -> ScramResult<Formula> {
    let connective = match node.tag.as_str() {
        "and" => Connective::And,
        "or" => Connective::Or,
        "xor" => Connective::Xor,
        "nand" => Connective::Nand,
        "nor" => Connective::Nor,
        "not" => Connective::Not,
        "imply" => Connective::Imply,
        "iff" => Connective::Iff,
        "atleast" | "vote" | "cardinality" if node.attrs.contains_key("min") && node.attrs.contains_key("max") => {
            let min: u32 = attr(node, "min")?.parse().map_err(|_| ScramError::parse("cardinality min is not an integer"))?;
            let max: u32 = attr(node, "max")?.parse().map_err(|_| ScramError::parse("cardinality max is not an integer"))?;
            Connective::Cardinality(min, max)
        }
        "atleast" | "vote" => {
            let k: u32 = attr(node, "min")?.parse().map_err(|_| ScramError::parse("atleast min is not an integer"))?;
            Connective::Atleast(k)
        }
        "gate" | "basic-event" | "house-event" => {
            let literal = parse_literal(model, container, node)?;
            return Ok(Formula::new(Connective::Null, vec![literal]));
        }
        "transfer-in" => {
            let name = attr(node, "name")?;
            return match model.resolve_event(container, name) {
                Some(EventRef::Gate(target)) => Ok(Formula::new(Connective::TransferIn(target), Vec::new())),
                _ => Err(ScramError::validity(format!("transfer-in target '{name}' is not a known gate"), Locus::element(name))),
            };
        }
        "transfer-out" => {
            return Err(ScramError::validity("transfer-out has no modelled counterpart", Locus::element(node.tag.clone())));
        }
        other => return Err(ScramError::parse(format!("unsupported formula connective '{other}'"))),
    };

    let args = content_children(node).map(|c| parse_literal(model, container, c)).collect::<ScramResult<Vec<_>>>()?;
    Ok(Formula::new(connective, args))
}

fn parse_literal(model: &Model, container: ContainerId, node: &XmlNode) -> ScramResult<Literal> {
    match node.tag.as_str() {
        "basic-event" => {
            let name = attr(node, "name")?;
            match model.resolve_event(container, name) {
                Some(EventRef::Basic(id)) => Ok(Literal::positive(Arg::Event(EventRef::Basic(id)))),
                _ => Err(ScramError::validity(format!("unresolved basic-event reference '{name}'"), Locus::element(name))),
            }
        }
        "gate" => {
            let name = attr(node, "name")?;
            match model.resolve_event(container, name) {
                Some(EventRef::Gate(id)) => Ok(Literal::positive(Arg::Event(EventRef::Gate(id)))),
                _ => Err(ScramError::validity(format!("unresolved gate reference '{name}'"), Locus::element(name))),
            }
        }
        "house-event" => {
            let name = attr(node, "name")?;
            match model.resolve_event(container, name) {
                Some(EventRef::House(id)) => Ok(Literal::positive(Arg::Event(EventRef::House(id)))),
                _ => Err(ScramError::validity(format!("unresolved house-event reference '{name}'"), Locus::element(name))),
            }
        }
        "not" => {
            let inner = content_children(node)
                .next()
                .ok_or_else(|| ScramError::validity("not has no argument", Locus::element("not")))?;
            let mut literal = parse_literal(model, container, inner)?;
            literal.complement = !literal.complement;
            Ok(literal)
        }
        "and" | "or" | "xor" | "nand" | "nor" | "atleast" | "vote" | "cardinality" | "imply" | "iff" => {
            let nested = parse_formula(model, container, node)?;
            Ok(Literal::positive(Arg::Nested(Box::new(nested))))
        }
        other => Err(ScramError::parse(format!("unsupported formula argument element '{other}'"))),
    }
}

fn parse_expression(node: &XmlNode) -> ScramResult<Expression> {
    let e = match node.tag.as_str() {
        "float" | "int" => {
            let value: f64 = attr(node, "value")?.parse().map_err(|_| ScramError::parse("numeric value is not a number"))?;
            Expression::Constant(value)
        }
        "constant" => {
            let value = attr(node, "value")?;
            Expression::Boolean(value == "true")
        }
        "parameter" => Expression::Parameter(attr(node, "name")?.to_string()),
        "neg" => Expression::Neg(Box::new(first_arg(node)?)),
        "add" => Expression::Add(all_args(node)?),
        "sub" => {
            let args = all_args(node)?;
            two_ary(args, "sub").map(|(a, b)| Expression::Sub(Box::new(a), Box::new(b)))?
        }
        "mul" => Expression::Mul(all_args(node)?),
        "div" => {
            let args = all_args(node)?;
            two_ary(args, "div").map(|(a, b)| Expression::Div(Box::new(a), Box::new(b)))?
        }
        "lt" => binary(node, Expression::Lt as fn(Box<Expression>, Box<Expression>) -> Expression)?,
        "gt" => binary(node, Expression::Gt as fn(Box<Expression>, Box<Expression>) -> Expression)?,
        "leq" => binary(node, Expression::Leq as fn(Box<Expression>, Box<Expression>) -> Expression)?,
        "geq" => binary(node, Expression::Geq as fn(Box<Expression>, Box<Expression>) -> Expression)?,
        "eq" => binary(node, Expression::Eq as fn(Box<Expression>, Box<Expression>) -> Expression)?,
        "exponential" => Expression::Exponential { rate: Box::new(first_arg(node)?) },
        "weibull" => {
            let args = all_args(node)?;
            three_ary(args, "weibull").map(|(alpha, beta, t0)| Expression::Weibull {
                alpha: Box::new(alpha),
                beta: Box::new(beta),
                t0: Box::new(t0),
            })?
        }
        "glm" => {
            let args = all_args(node)?;
            three_ary(args, "glm").map(|(gamma, lambda, mu)| Expression::Glm {
                gamma: Box::new(gamma),
                lambda: Box::new(lambda),
                mu: Box::new(mu),
            })?
        }
        "periodic-test" => {
            let args = all_args(node)?;
            three_ary(args, "periodic-test").map(|(lambda, tau, theta)| Expression::PeriodicTest {
                lambda: Box::new(lambda),
                tau: Box::new(tau),
                theta: Box::new(theta),
            })?
        }
        "uniform-deviate" => {
            let args = all_args(node)?;
            two_ary(args, "uniform-deviate").map(|(min, max)| Expression::Uniform { min: Box::new(min), max: Box::new(max) })?
        }
        "normal-deviate" => {
            let args = all_args(node)?;
            two_ary(args, "normal-deviate").map(|(mean, std_dev)| Expression::Normal { mean: Box::new(mean), std_dev: Box::new(std_dev) })?
        }
        "lognormal-deviate" => {
            let args = all_args(node)?;
            two_ary(args, "lognormal-deviate")
                .map(|(mean, error_factor)| Expression::LogNormal { mean: Box::new(mean), error_factor: Box::new(error_factor) })?
        }
        "gamma-deviate" => {
            let args = all_args(node)?;
            two_ary(args, "gamma-deviate").map(|(shape, scale)| Expression::Gamma { shape: Box::new(shape), scale: Box::new(scale) })?
        }
        "beta-deviate" => {
            let args = all_args(node)?;
            two_ary(args, "beta-deviate").map(|(alpha, beta)| Expression::Beta { alpha: Box::new(alpha), beta: Box::new(beta) })?
        }
        "histogram" => {
            let mut bins = Vec::new();
            for bin_node in content_children(node) {
                if bin_node.tag != "bin" {
                    continue;
                }
                let upper_bound: f64 = attr(bin_node, "value")?.parse().map_err(|_| ScramError::parse("histogram bin bound is not a number"))?;
                let weight: f64 = attr(bin_node, "weight")?.parse().map_err(|_| ScramError::parse("histogram bin weight is not a number"))?;
                bins.push(HistogramBin { upper_bound, weight });
            }
            Expression::Histogram { bins }
        }
        other => return Err(ScramError::parse(format!("unsupported expression element '{other}'"))),
    };
    Ok(e)
}

fn first_arg(node: &XmlNode) -> ScramResult<Expression> {
    content_children(node)
        .next()
        .ok_or_else(|| ScramError::validity(format!("'{}' has no argument", node.tag), Locus::element(node.tag.clone())))
        .and_then(parse_expression)
}

fn all_args(node: &XmlNode) -> ScramResult<Vec<Expression>> {
    content_children(node).map(parse_expression).collect()
}

fn two_ary(mut args: Vec<Expression>, what: &str) -> ScramResult<(Expression, Expression)> {
    if args.len() != 2 {
        return Err(ScramError::validity(format!("'{what}' requires exactly two arguments"), Locus::element(what)));
    }
    let b = args.pop().unwrap();
    let a = args.pop().unwrap();
    Ok((a, b))
}

fn three_ary(mut args: Vec<Expression>, what: &str) -> ScramResult<(Expression, Expression, Expression)> {
    if args.len() != 3 {
        return Err(ScramError::validity(format!("'{what}' requires exactly three arguments"), Locus::element(what)));
    }
    let c = args.pop().unwrap();
    let b = args.pop().unwrap();
    let a = args.pop().unwrap();
    Ok((a, b, c))
}

fn binary(node: &XmlNode, ctor: fn(Box<Expression>, Box<Expression>) -> Expression) -> ScramResult<Expression> {
    let args = all_args(node)?;
    let (a, b) = two_ary(args, &node.tag)?;
    Ok(ctor(Box::new(a), Box::new(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <opsa-mef>
      <define-fault-tree name="Demo">
        <define-gate name="TOP">
          <or>
            <basic-event name="E1"/>
            <gate name="SUB"/>
          </or>
        </define-gate>
        <define-gate name="SUB">
          <and>
            <basic-event name="E2"/>
            <not><basic-event name="E3"/></not>
          </and>
        </define-gate>
        <define-basic-event name="E1">
          <float value="0.1"/>
        </define-basic-event>
        <define-basic-event name="E2">
          <exponential>
            <float value="1e-5"/>
          </exponential>
        </define-basic-event>
        <define-basic-event name="E3">
          <float value="0.2"/>
        </define-basic-event>
      </define-fault-tree>
    </opsa-mef>
    "#;

    #[test]
    fn parses_gates_with_forward_references() {
        let model = parse_model(SAMPLE.as_bytes(), "Demo").unwrap();
        assert_eq!(model.basic_events.len(), 3);
        assert_eq!(model.gates.len(), 2);
        assert!(model.top_gate.is_none()); // top gate selection is the caller's job; see main.rs
    }

    #[test]
    fn rejects_transfer_out() {
        let doc = r#"<opsa-mef><define-fault-tree name="T"><define-gate name="G"><transfer-out/></define-gate></define-fault-tree></opsa-mef>"#;
        let err = parse_model(doc.as_bytes(), "T").unwrap_err();
        assert!(matches!(err, ScramError::Validity { .. }));
    }
}
