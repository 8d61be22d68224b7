//! Normalised Boolean expression (sum-of-products) layer.
//!
//! In the style of OpenFTA's `NormalisedBooleanExpressions` module: an
//! `Expr` is the OR of `Group`s, each `Group` the AND of the basic
//! events whose bit is set. OpenFTA represents the list as a
//! doubly-linked list of `Group`s terminated by a sentinel; this port
//! keeps the same canonical-order / absorption invariants but stores
//! them in a sorted `Vec`, which is the idiom the rest of this crate
//! (and the crate it was grounded on) uses for ordered collections.

use crate::bitset::BitSet;
use itertools::Itertools;
use std::cmp::Ordering;

/// A single AND-term (product) of an SOP: a minimal cut set or prime
/// implicant candidate, represented as a bit set over basic events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group(BitSet);

impl Group {
    pub fn new(bits: BitSet) -> Self {
        Group(bits)
    }

    pub fn singleton(width: usize, index: usize) -> Self {
        let mut b = BitSet::create(width);
        b.set(index, true);
        Group(b)
    }

    pub fn bits(&self) -> &BitSet {
        &self.0
    }

    /// Number of basic events asserted in this group ("order").
    pub fn order(&self) -> usize {
        self.0.popcount()
    }

    /// The AND of two groups is the bit-wise OR of their bit arrays: a
    /// group means "these events all fail", so combining two such
    /// conditions asserts the union of the events.
    pub fn and(&self, other: &Group) -> Group {
        Group(self.0.or(&other.0))
    }
}

impl PartialOrd for Group {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Group {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.lex_compare(&other.0)
    }
}

/// An ordered, absorption-reduced sum-of-products over a fixed basic-event
/// universe of size `width`.
#[derive(Clone, Debug, Default)]
pub struct Expr {
    width: usize,
    groups: Vec<Group>,
}

impl Expr {
    /// `create()` — empty SOP over `width` basic events.
    pub fn create(width: usize) -> Expr {
        Expr { width, groups: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `count(E)`.
    pub fn count(&self) -> usize {
        self.groups.len()
    }

    /// `count_order(E, k)`.
    pub fn count_order(&self, k: usize) -> usize {
        self.groups.iter().filter(|g| g.order() <= k).count()
    }

    /// `or_group(E, g)`: insert `g`, enforcing absorption. Returns `true`
    /// if `g` (or a group it dominates) ends up represented in `E`,
    /// `false` if `g` was absorbed by an existing, more general group.
    pub fn or_group(&mut self, g: Group) -> bool {
        let mut i = 0;
        while i < self.groups.len() {
            if g.bits().is_subset_of(self.groups[i].bits()) {
                // g dominates the existing group: strike out the longer one.
                self.groups.remove(i);
                continue;
            } else if self.groups[i].bits().is_subset_of(g.bits()) {
                // g is redundant: an existing, more general group already covers it.
                return false;
            }
            i += 1;
        }
        let pos = self.groups.partition_point(|p| *p < g);
        self.groups.insert(pos, g);
        true
    }

    /// `or_expr(E1, E2)`.
    pub fn or_expr(&self, other: &Expr) -> Expr {
        debug_assert_eq!(self.width, other.width);
        let mut result = self.clone();
        for g in &other.groups {
            result.or_group(g.clone());
        }
        result
    }

    /// `and_expr(E1, E2, limit)`: order-truncated AND. `limit == 0` means
    /// unlimited.
    pub fn and_expr(&self, other: &Expr, limit: usize) -> Expr {
        debug_assert_eq!(self.width, other.width);
        let mut result = Expr::create(self.width);
        for p1 in &self.groups {
            for p2 in &other.groups {
                let g = p1.and(p2);
                if limit > 0 && g.order() > limit {
                    continue;
                }
                result.or_group(g);
            }
        }
        result
    }

    /// `cutset_probs(E, probs)`: per-group probability as a product of
    /// member basic-event probabilities.
    pub fn cutset_probs(&self, probs: &[f64]) -> Vec<f64> {
        self.groups.iter().map(|g| group_probability(g, probs)).collect()
    }

    /// `probability(E, probs, max_order, n_terms)`: inclusion–exclusion
    /// truncated to `n_terms` terms over groups of order ≤ `max_order`.
    /// `n_terms == 0` means "all terms" (exact).
    pub fn probability(&self, probs: &[f64], max_order: usize, n_terms: usize) -> f64 {
        let used: Vec<&Group> = self.groups.iter().filter(|g| g.order() <= max_order).collect();
        let n = used.len();
        if n == 0 {
            return 0.0;
        }
        let orders: Vec<usize> = if n_terms == 0 { (1..=n).collect() } else { (1..=n_terms.min(n)).collect() };
        let mut total = 0.0;
        for r in orders {
            if r == 0 || r > n {
                continue;
            }
            let sign = if r % 2 == 1 { 1.0 } else { -1.0 };
            let term_sum: f64 = used
                .iter()
                .copied()
                .combinations(r)
                .map(|combo| combo_probability(&combo, self.width, probs))
                .sum();
            total += sign * term_sum;
        }
        total
    }

    /// `serialise`: one group per line (fixed-width 0/1 string), trailing
    /// blank line.
    pub fn serialise(&self) -> String {
        let mut out = String::new();
        for g in &self.groups {
            out.push_str(&g.bits().to_bit_string());
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// `parse`: exact inverse of [`serialise`](Self::serialise). The
    /// first blank line terminates the list.
    pub fn parse(width: usize, text: &str) -> Option<Expr> {
        let mut e = Expr::create(width);
        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            if line.len() != width {
                return None;
            }
            let bits = BitSet::from_bit_string(line)?;
            e.groups.push(Group::new(bits));
        }
        e.groups.sort();
        Some(e)
    }
}

fn group_probability(g: &Group, probs: &[f64]) -> f64 {
    g.bits().iter_ones().map(|i| probs[i]).product()
}

fn combo_probability(combo: &[&Group], width: usize, probs: &[f64]) -> f64 {
    let mut bits = BitSet::create(width);
    for g in combo {
        bits = bits.or(g.bits());
    }
    bits.iter_ones().map(|i| probs[i]).product()
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.groups == other.groups
    }
}
impl Eq for Expr {}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(width: usize, idx: &[usize]) -> Group {
        Group::new(BitSet::from_indices(width, idx.iter().copied()))
    }

    #[test]
    fn absorption_drops_supersets() {
        let mut e = Expr::create(4);
        assert!(e.or_group(g(4, &[0])));
        // {0,1} is absorbed by {0}
        assert!(!e.or_group(g(4, &[0, 1])));
        assert_eq!(e.count(), 1);
    }

    #[test]
    fn absorption_removes_existing_superset() {
        let mut e = Expr::create(4);
        assert!(e.or_group(g(4, &[0, 1])));
        assert!(e.or_group(g(4, &[0])));
        assert_eq!(e.count(), 1);
        assert_eq!(e.groups()[0].order(), 1);
    }

    #[test]
    fn and_expr_expands_and_truncates() {
        // (A + BC) . (AB + BC + CD)  -> AB + ACD + BC   (Fault Tree Handbook-style worked example)
        let mut e1 = Expr::create(4); // A=0 B=1 C=2 D=3
        e1.or_group(g(4, &[0]));
        e1.or_group(g(4, &[1, 2]));

        let mut e2 = Expr::create(4);
        e2.or_group(g(4, &[0, 1]));
        e2.or_group(g(4, &[1, 2]));
        e2.or_group(g(4, &[2, 3]));

        let result = e1.and_expr(&e2, 0);
        let mut orders: Vec<usize> = result.groups().iter().map(|gr| gr.order()).collect();
        orders.sort();
        assert_eq!(result.count(), 3);
        assert_eq!(orders, vec![2, 2, 3]);
    }

    #[test]
    fn and_expr_respects_limit() {
        let mut e1 = Expr::create(4);
        e1.or_group(g(4, &[0]));
        let mut e2 = Expr::create(4);
        e2.or_group(g(4, &[1, 2, 3]));
        let result = e1.and_expr(&e2, 2);
        assert!(result.is_empty(), "order-4 group must be truncated by limit=2");
    }

    #[test]
    fn probability_exact_matches_inclusion_exclusion() {
        // Two independent single-event cut sets: P = p1 + p2 - p1*p2
        let mut e = Expr::create(2);
        e.or_group(g(2, &[0]));
        e.or_group(g(2, &[1]));
        let probs = [0.3, 0.4];
        let p = e.probability(&probs, 2, 0);
        assert!((p - (0.3 + 0.4 - 0.12)).abs() < 1e-12);
    }

    #[test]
    fn truncated_terms_bracket_the_exact_value() {
        // Three independent single-event cut sets: exact P = 1 - (1-p1)(1-p2)(1-p3).
        let mut e = Expr::create(3);
        e.or_group(g(3, &[0]));
        e.or_group(g(3, &[1]));
        e.or_group(g(3, &[2]));
        let probs = [0.3, 0.2, 0.1];
        let exact = e.probability(&probs, 3, 0);
        let after_one = e.probability(&probs, 3, 1); // first term only: upper bound
        let after_two = e.probability(&probs, 3, 2); // first two terms: lower bound
        assert!(after_one >= exact - 1e-12, "odd truncation must be an upper bound");
        assert!(after_two <= exact + 1e-12, "even truncation must be a lower bound");
        assert!((e.probability(&probs, 3, 0) - exact).abs() < 1e-12);
    }

    #[test]
    fn serialise_parse_roundtrip() {
        let mut e = Expr::create(5);
        e.or_group(g(5, &[0, 2]));
        e.or_group(g(5, &[1]));
        let text = e.serialise();
        let back = Expr::parse(5, &text).unwrap();
        assert_eq!(e, back);
    }
}
