//! The `Formula` entity: the Boolean expression under a gate.
//!
//! Replaces a deep Gate/Formula inheritance hierarchy with a single
//! tagged `Connective` carrying its own parameters (k for `atleast`,
//! (min,max) for `cardinality`), generalised over an atom type the way a
//! tagged-enum formula tree usually is, except here the connective set
//! matches the full MEF grammar rather than a narrower CNF-oriented one.

use super::ids::EventRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    Xor,
    Not,
    Nand,
    Nor,
    /// `atleast(k)`: true iff at least `k` of the arguments are true.
    Atleast(u32),
    /// `cardinality(min, max)`: true iff the number of true arguments is
    /// in `[min, max]`.
    Cardinality(u32, u32),
    Imply,
    Iff,
    /// Pass-through of a single argument (identity connective).
    Null,
    Constant(bool),
    /// Legacy GALILEO transfer-in: follow to the referenced subtree.
    /// `transfer-out` has no modelled counterpart — encountering it is a
    /// validity error, not silently dropped.
    TransferIn(super::ids::GateId),
}

/// One argument of a formula: either a reference to an `Event` (basic,
/// house, or a nested gate) or a nested sub-formula, with an optional
/// complement (NOT) flag carried on the literal itself rather than as a
/// separate `Not` wrapper, matching how most MEF tools represent negated
/// arguments of `and`/`or`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Event(EventRef),
    Nested(Box<Formula>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub arg: Arg,
    pub complement: bool,
}

impl Literal {
    pub fn positive(arg: Arg) -> Self {
        Literal { arg, complement: false }
    }

    pub fn negated(arg: Arg) -> Self {
        Literal { arg, complement: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub connective: Connective,
    pub args: Vec<Literal>,
}

impl Formula {
    pub fn new(connective: Connective, args: Vec<Literal>) -> Self {
        Formula { connective, args }
    }

    /// Whether this formula's connective is monotone (never introduces a
    /// complemented literal on its own). `Not`/`Nand`/`Nor`/`Xor`/complement
    /// flags on arguments make a formula non-coherent.
    pub fn is_non_coherent(&self) -> bool {
        matches!(self.connective, Connective::Not | Connective::Nand | Connective::Nor | Connective::Xor)
            || self.args.iter().any(|a| a.complement)
            || self.args.iter().any(|a| match &a.arg {
                Arg::Nested(f) => f.is_non_coherent(),
                _ => false,
            })
    }
}
