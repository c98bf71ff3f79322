//! Spatial query filters, serialized into `filter[objects]`.
//!
//! The server expects a JSON array of filter nodes. A node is either a field
//! comparison `{"name", "op", "val"}` or a boolean group `{"and": [...]}` /
//! `{"or": [...]}`. Relationship tests use `has` with a nested node as `val`.

use projection::geo::Bounds;
use serde::Serialize;

use crate::model::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Le,
    Ge,
    Has,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Id(ObjectId),
    Number(f64),
    Bool(bool),
    Filter(Box<Filter>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    And { and: Vec<Filter> },
    Or { or: Vec<Filter> },
    Field { name: String, op: Op, val: Operand },
}

impl Filter {
    #[must_use]
    pub fn field(name: &str, op: Op, val: Operand) -> Self {
        Self::Field { name: name.to_owned(), op, val }
    }
}

/// Query for one reconciliation cycle:
/// `(in bounds AND in the player's world AND on map) OR is the player`.
///
/// Without bounds only the player's own record matches. Without a world the
/// world clause is dropped.
#[must_use]
pub fn spatial_filter(bounds: Option<&Bounds>, world: Option<ObjectId>, player: ObjectId) -> Vec<Filter> {
    let own = Filter::field("id", Op::Eq, Operand::Id(player));
    let Some(bounds) = bounds else {
        return vec![own];
    };

    let mut visible = vec![
        Filter::field("latitude", Op::Ge, Operand::Number(bounds.southwest.latitude)),
        Filter::field("latitude", Op::Le, Operand::Number(bounds.northeast.latitude)),
        Filter::field("longitude", Op::Ge, Operand::Number(bounds.southwest.longitude)),
        Filter::field("longitude", Op::Le, Operand::Number(bounds.northeast.longitude)),
    ];
    if let Some(world) = world {
        let same_world = Filter::field("id", Op::Eq, Operand::Id(world));
        visible.push(Filter::field("world", Op::Has, Operand::Filter(Box::new(same_world))));
    }
    visible.push(Filter::field("isonmap", Op::Eq, Operand::Bool(true)));

    vec![Filter::Or { or: vec![Filter::And { and: visible }, own] }]
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
