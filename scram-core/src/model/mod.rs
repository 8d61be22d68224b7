//! The MEF model: a typed, validated DAG of gates, basic events, house
//! events, parameters, CCF groups, and fault-tree/component namespaces.
//!
//! Every entity lives in one `IndexVec` owned by the `Model`, referenced
//! elsewhere only by its typed index, rather than an owning pointer graph.

pub mod ccf;
pub mod container;
pub mod event;
pub mod formula;
pub mod ids;
pub mod validate;

use std::collections::HashMap;

use index_vec::IndexVec;

use self::ccf::CcfGroup;
use self::container::{Container, Gate};
use self::event::{BasicEvent, HouseEvent, Parameter, Role};
use self::ids::{BasicEventId, CcfGroupId, ContainerId, EventRef, GateId, HouseEventId, ParameterId};

/// Model lifecycle: every transition is one-way, and only `Analysable`
/// may enter cut-set or Monte-Carlo computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unparsed,
    Parsed,
    Validated,
    Preprocessed,
    Analysable,
}

pub struct Model {
    pub name: String,
    pub mission_time: f64,
    pub gates: IndexVec<GateId, Gate>,
    pub basic_events: IndexVec<BasicEventId, BasicEvent>,
    pub house_events: IndexVec<HouseEventId, HouseEvent>,
    pub parameters: IndexVec<ParameterId, Parameter>,
    pub ccf_groups: IndexVec<CcfGroupId, CcfGroup>,
    pub containers: IndexVec<ContainerId, Container>,
    pub root: ContainerId,
    pub top_gate: Option<GateId>,
    lifecycle: Lifecycle,

    gate_owner: HashMap<GateId, ContainerId>,
    basic_owner: HashMap<BasicEventId, ContainerId>,
    house_owner: HashMap<HouseEventId, ContainerId>,
    container_parent: HashMap<ContainerId, ContainerId>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        let mut containers = IndexVec::new();
        let root = containers.push(Container::new("root", Role::Public, Vec::new()));
        Model {
            name: name.into(),
            mission_time: 1.0,
            gates: IndexVec::new(),
            basic_events: IndexVec::new(),
            house_events: IndexVec::new(),
            parameters: IndexVec::new(),
            ccf_groups: IndexVec::new(),
            containers,
            root,
            top_gate: None,
            lifecycle: Lifecycle::Unparsed,
            gate_owner: HashMap::new(),
            basic_owner: HashMap::new(),
            house_owner: HashMap::new(),
            container_parent: HashMap::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Transition the model's lifecycle forward. The caller is the only
    /// one who knows *why* the transition is legal (e.g. "validate() just
    /// returned Ok"); this just stamps the one-way state.
    pub fn advance_lifecycle(&mut self, to: Lifecycle) {
        self.lifecycle = to;
    }

    pub fn new_component(&mut self, name: impl Into<String>, role: Role, parent: ContainerId) -> ContainerId {
        let parent_container = &self.containers[parent];
        let mut base_path = parent_container.base_path.clone();
        base_path.push(parent_container.name.clone());
        let id = self.containers.push(Container::new(name, role, base_path));
        self.containers[parent].sub_components.push(id);
        self.container_parent.insert(id, parent);
        id
    }

    pub fn add_gate(&mut self, container: ContainerId, gate: Gate) -> GateId {
        let name = gate.id.clone();
        let id = self.gates.push(gate);
        self.containers[container].gates.push(name);
        self.gate_owner.insert(id, container);
        id
    }

    pub fn add_basic_event(&mut self, container: ContainerId, event: BasicEvent) -> BasicEventId {
        let name = event.id.clone();
        let id = self.basic_events.push(event);
        self.containers[container].basic_events.push(name);
        self.basic_owner.insert(id, container);
        id
    }

    pub fn add_house_event(&mut self, container: ContainerId, event: HouseEvent) -> HouseEventId {
        let name = event.id.clone();
        let id = self.house_events.push(event);
        self.containers[container].house_events.push(name);
        self.house_owner.insert(id, container);
        id
    }

    pub fn add_parameter(&mut self, container: ContainerId, parameter: Parameter) -> ParameterId {
        let name = parameter.id.clone();
        let id = self.parameters.push(parameter);
        self.containers[container].parameters.push(name);
        id
    }

    pub fn add_ccf_group(&mut self, container: ContainerId, group: CcfGroup) -> CcfGroupId {
        let name = group.id.clone();
        let id = self.ccf_groups.push(group);
        self.containers[container].ccf_groups.push(name);
        id
    }

    pub fn set_top_gate(&mut self, id: GateId) {
        self.top_gate = Some(id);
    }

    /// Resolve `name` to an `EventRef` starting the search in container
    /// `from`: private names are visible only within their own owner;
    /// resolution then walks outward through ancestors, considering only
    /// `Public` members.
    pub fn resolve_event(&self, from: ContainerId, name: &str) -> Option<EventRef> {
        if let Some(found) = self.find_in_container(from, name, true) {
            return Some(found);
        }
        let mut current = from;
        while let Some(&parent) = self.container_parent.get(&current) {
            if let Some(found) = self.find_in_container(parent, name, false) {
                return Some(found);
            }
            current = parent;
        }
        None
    }

    fn find_in_container(&self, container: ContainerId, name: &str, allow_private: bool) -> Option<EventRef> {
        for (id, gate) in self.gates.iter_enumerated() {
            if gate.id == name && self.gate_owner.get(&id) == Some(&container) && (allow_private || gate.role == Role::Public) {
                return Some(EventRef::Gate(id));
            }
        }
        for (id, event) in self.basic_events.iter_enumerated() {
            if event.id == name && self.basic_owner.get(&id) == Some(&container) && (allow_private || event.role == Role::Public) {
                return Some(EventRef::Basic(id));
            }
        }
        for (id, event) in self.house_events.iter_enumerated() {
            if event.id == name && self.house_owner.get(&id) == Some(&container) && (allow_private || event.role == Role::Public) {
                return Some(EventRef::House(id));
            }
        }
        None
    }

    pub fn basic_event_count(&self) -> usize {
        self.basic_events.len()
    }
}
