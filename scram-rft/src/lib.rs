//! `scram-rft`: synthetic random fault-tree generator, in place of a CNF
//! benchmark harness, producing a model generator for stress-testing
//! `scram-core`'s cut-set engines. Not part of the analysis core and not
//! reachable from `scram-cli`'s normal analysis flow.

pub mod generator;
pub mod xml_out;

pub use generator::{generate, RftConfig};
pub use xml_out::to_opsa_mef_xml;
