//! `Gate`, `FaultTree`/`Component` namespace containers.

use super::event::Role;
use super::formula::Formula;
use super::ids::ContainerId;

#[derive(Debug, Clone)]
pub struct Gate {
    pub id: String,
    pub role: Role,
    pub formula: Formula,
}

/// A namespace: either the top-level `FaultTree` or a nested `Component`.
/// Both share the same shape, matching the MEF grammar.
#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub role: Role,
    pub base_path: Vec<String>,
    pub gates: Vec<String>,
    pub basic_events: Vec<String>,
    pub house_events: Vec<String>,
    pub parameters: Vec<String>,
    pub ccf_groups: Vec<String>,
    pub sub_components: Vec<ContainerId>,
}

impl Container {
    pub fn new(name: impl Into<String>, role: Role, base_path: Vec<String>) -> Self {
        Container {
            name: name.into(),
            role,
            base_path,
            gates: Vec::new(),
            basic_events: Vec::new(),
            house_events: Vec::new(),
            parameters: Vec::new(),
            ccf_groups: Vec::new(),
            sub_components: Vec::new(),
        }
    }
}

// Re-exported so callers building formulas don't need to know the ids
// module layout.
pub use super::ids::EventRef;
