//! `BasicEvent`, `HouseEvent`, and `Parameter`.

use crate::expr::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub struct BasicEvent {
    pub id: String,
    pub role: Role,
    /// Probability or rate expression. Required only if a probability
    /// analysis is requested.
    pub expression: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct HouseEvent {
    pub id: String,
    pub role: Role,
    pub state: bool,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub id: String,
    pub role: Role,
    pub unit: Option<String>,
    pub expression: Expression,
    pub unused: bool,
}
