//! Fault-tree modularisation (supplemental, off by default): find gates
//! whose entire set of descendant basic/house events appears nowhere
//! else in the tree, so each such subtree ("module") can be quantified
//! independently and substituted back in as a single pseudo-event,
//! instead of cut-set-generating the whole tree at once.
//!
//! Implements Dutuit & Rauzy's linear-time algorithm (IEEE Trans.
//! Reliability 45(3), 1996, "A linear-time algorithm to find modules of
//! fault trees"): two depth-first passes record first/second/last visit
//! times per node, and a node is a module iff the visit-time window of
//! its descendants nests strictly inside its own first/second-visit
//! window. This crate keeps separate gate/basic-event/house-event
//! arenas rather than one flat node arena, so a small [`Node`] enum plus
//! a discovery pass builds a unified node list and adjacency over them.
//! Formulas nested inline in a gate (this crate's `Arg::Nested`) have no
//! identity of their own to be a module boundary, so they are flattened
//! into their owning gate's child list rather than given separate DFS
//! nodes.

use std::collections::HashMap;

use crate::error::{ScramError, ScramResult};
use crate::model::formula::{Arg, Formula};
use crate::model::ids::{BasicEventId, EventRef, GateId, HouseEventId};
use crate::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Gate(GateId),
    Basic(BasicEventId),
    House(HouseEventId),
}

#[derive(Clone, Debug)]
struct DfsNode {
    visited: bool,
    t_fst_visit: usize,
    t_snd_visit: usize,
    t_lst_visit: usize,
    t_max_desc: usize,
    t_min_desc: usize,
}

impl Default for DfsNode {
    fn default() -> Self {
        DfsNode { visited: false, t_fst_visit: 0, t_snd_visit: 0, t_lst_visit: 0, t_max_desc: usize::MIN, t_min_desc: usize::MAX }
    }
}

impl DfsNode {
    fn is_module(&self) -> bool {
        self.t_min_desc > self.t_fst_visit && self.t_max_desc < self.t_snd_visit
    }

    fn snd_dfs_visited(&self) -> bool {
        self.t_min_desc == usize::MAX
    }

    fn update_t_desc(&mut self, min_c: usize, max_c: usize) {
        if self.snd_dfs_visited() {
            self.t_min_desc = min_c;
            self.t_max_desc = max_c;
        } else {
            self.t_min_desc = self.t_min_desc.min(min_c);
            self.t_max_desc = self.t_max_desc.max(max_c);
        }
    }
}

/// Flatten a gate's direct children, following inline nested formulas
/// transparently (they are not separately shareable, so they cannot be
/// module boundaries on their own).
fn flatten_children(formula: &Formula) -> Vec<Node> {
    let mut out = Vec::new();
    collect_literal_children(formula, &mut out);
    out
}

fn collect_literal_children(formula: &Formula, out: &mut Vec<Node>) {
    for lit in &formula.args {
        match &lit.arg {
            Arg::Event(EventRef::Gate(g)) => out.push(Node::Gate(*g)),
            Arg::Event(EventRef::Basic(b)) => out.push(Node::Basic(*b)),
            Arg::Event(EventRef::House(h)) => out.push(Node::House(*h)),
            Arg::Nested(f) => collect_literal_children(f, out),
        }
    }
}

struct Registry {
    nodes: Vec<Node>,
    children: Vec<Vec<usize>>,
    index_of: HashMap<Node, usize>,
}

fn discover(model: &Model, node: Node, registry: &mut Registry) -> usize {
    if let Some(&idx) = registry.index_of.get(&node) {
        return idx;
    }
    let idx = registry.nodes.len();
    registry.nodes.push(node);
    registry.children.push(Vec::new());
    registry.index_of.insert(node, idx);

    let kids = match node {
        Node::Gate(g) => flatten_children(&model.gates[g].formula),
        Node::Basic(_) | Node::House(_) => Vec::new(),
    };
    let kid_idxs: Vec<usize> = kids.into_iter().map(|k| discover(model, k, registry)).collect();
    registry.children[idx] = kid_idxs;
    idx
}

fn fst_dfs(dfs: &mut [DfsNode], children: &[Vec<usize>], curr: usize, time: &mut usize) {
    *time += 1;
    dfs[curr].t_lst_visit = *time;
    if children[curr].is_empty() {
        if !dfs[curr].visited {
            dfs[curr].visited = true;
            dfs[curr].t_fst_visit = *time;
            dfs[curr].t_snd_visit = *time;
        }
    } else if !dfs[curr].visited {
        dfs[curr].visited = true;
        dfs[curr].t_fst_visit = *time;
        for &child in &children[curr] {
            fst_dfs(dfs, children, child, time);
        }
        fst_dfs(dfs, children, curr, time);
    } else if dfs[curr].t_snd_visit == 0 {
        dfs[curr].t_snd_visit = *time;
    }
}

fn snd_dfs(dfs: &mut [DfsNode], children: &[Vec<usize>], curr: usize) -> (usize, usize) {
    if !dfs[curr].snd_dfs_visited() {
        return (dfs[curr].t_fst_visit, dfs[curr].t_lst_visit);
    }
    let t_fst_node = dfs[curr].t_fst_visit;
    let t_lst_node = dfs[curr].t_lst_visit;
    for &child in &children[curr] {
        let (d_min, d_max) = snd_dfs(dfs, children, child);
        dfs[curr].update_t_desc(d_min, d_max);
    }
    let t_min_desc = dfs[curr].t_min_desc;
    let t_max_desc = dfs[curr].t_max_desc;
    (t_min_desc.min(t_fst_node), t_max_desc.max(t_lst_node))
}

/// Gates that are modules of the model's top gate, excluding the top
/// gate itself and leaf gates (a gate with no children can't bound a
/// module, hence the `!children[nid].is_empty()` filter).
pub fn find_modules(model: &Model) -> ScramResult<Vec<GateId>> {
    let top = model.top_gate.ok_or_else(|| ScramError::logic("model has no top gate; cannot modularise"))?;

    let mut registry = Registry { nodes: Vec::new(), children: Vec::new(), index_of: HashMap::new() };
    let root_idx = discover(model, Node::Gate(top), &mut registry);

    let mut dfs_nodes: Vec<DfsNode> = vec![DfsNode::default(); registry.nodes.len()];
    let mut time = 0usize;
    fst_dfs(&mut dfs_nodes, &registry.children, root_idx, &mut time);
    snd_dfs(&mut dfs_nodes, &registry.children, root_idx);

    let modules = registry
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(idx, node)| match node {
            Node::Gate(g) if idx != root_idx && !registry.children[idx].is_empty() && dfs_nodes[idx].is_module() => Some(*g),
            _ => None,
        })
        .collect();
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::container::Gate;
    use crate::model::event::{BasicEvent, Role};
    use crate::model::formula::{Connective, Literal};

    fn basic(model: &mut Model, name: &str) -> BasicEventId {
        let root = model.root;
        model.add_basic_event(root, BasicEvent { id: name.into(), role: Role::Public, expression: None })
    }

    fn gate(model: &mut Model, name: &str, connective: Connective, args: Vec<Literal>) -> GateId {
        let root = model.root;
        model.add_gate(root, Gate { id: name.into(), role: Role::Public, formula: Formula::new(connective, args) })
    }

    /// TOP = AND(M, E3), M = OR(E1, E2): M's descendants appear nowhere
    /// else, so M is a module.
    #[test]
    fn independent_subtree_is_a_module() {
        let mut model = Model::new("modularize-demo");
        let e1 = basic(&mut model, "E1");
        let e2 = basic(&mut model, "E2");
        let e3 = basic(&mut model, "E3");
        let m = gate(
            &mut model,
            "M",
            Connective::Or,
            vec![Literal::positive(Arg::Event(EventRef::Basic(e1))), Literal::positive(Arg::Event(EventRef::Basic(e2)))],
        );
        let top = gate(
            &mut model,
            "TOP",
            Connective::And,
            vec![Literal::positive(Arg::Event(EventRef::Gate(m))), Literal::positive(Arg::Event(EventRef::Basic(e3)))],
        );
        model.set_top_gate(top);

        let modules = find_modules(&model).unwrap();
        assert_eq!(modules, vec![m]);
    }

    /// TOP = OR(AND(E1,E2), AND(E1,E3)): E1 is shared between both AND
    /// gates, so neither is a module.
    #[test]
    fn shared_event_breaks_modularity() {
        let mut model = Model::new("modularize-demo-2");
        let e1 = basic(&mut model, "E1");
        let e2 = basic(&mut model, "E2");
        let e3 = basic(&mut model, "E3");
        let left = gate(
            &mut model,
            "LEFT",
            Connective::And,
            vec![Literal::positive(Arg::Event(EventRef::Basic(e1))), Literal::positive(Arg::Event(EventRef::Basic(e2)))],
        );
        let right = gate(
            &mut model,
            "RIGHT",
            Connective::And,
            vec![Literal::positive(Arg::Event(EventRef::Basic(e1))), Literal::positive(Arg::Event(EventRef::Basic(e3)))],
        );
        let top = gate(
            &mut model,
            "TOP",
            Connective::Or,
            vec![Literal::positive(Arg::Event(EventRef::Gate(left))), Literal::positive(Arg::Event(EventRef::Gate(right)))],
        );
        model.set_top_gate(top);

        let modules = find_modules(&model).unwrap();
        assert!(modules.is_empty(), "got {modules:?}");
    }
}
