//! Stable integer indices for every arena-owned entity in the model.
//!
//! Uses `index_vec::define_index_type!` to get a typed, newtype'd index
//! instead of a bare `usize`, replacing a cyclic pointer/reference graph
//! with plain integer handles into per-kind arenas.

use index_vec::define_index_type;

define_index_type! { pub struct GateId = u32; }
define_index_type! { pub struct BasicEventId = u32; }
define_index_type! { pub struct HouseEventId = u32; }
define_index_type! { pub struct ParameterId = u32; }
define_index_type! { pub struct CcfGroupId = u32; }
define_index_type! { pub struct ContainerId = u32; }

/// A reference to anything that can appear as an argument of a `Formula`.
/// Nested formulas are owned inline by their gate (the data model forbids
/// sharing a nested formula), so they are not an arena-indexed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRef {
    Gate(GateId),
    Basic(BasicEventId),
    House(HouseEventId),
}
