//! `CcfGroup`: a named set of basic events whose failures are correlated
//! via a named model (beta-factor, MGL, alpha-factor, phi-factor).

use super::event::Role;
use super::ids::BasicEventId;
use crate::expr::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CcfModelKind {
    BetaFactor,
    Mgl,
    AlphaFactor,
    PhiFactor,
}

/// One factor at a given level of a factor list.
#[derive(Debug, Clone, Copy)]
pub struct CcfFactor {
    pub level: u32,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct CcfGroup {
    pub id: String,
    pub role: Role,
    pub kind: CcfModelKind,
    /// Ordered member basic events, distinct, owned by the same container.
    pub members: Vec<BasicEventId>,
    /// Group distribution value `Q`.
    pub distribution: Expression,
    pub factors: Vec<CcfFactor>,
}

impl CcfGroup {
    pub fn group_size(&self) -> usize {
        self.members.len()
    }
}
