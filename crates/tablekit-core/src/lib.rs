//! Core runtime for TableKit: model schemas, the value marshal engine,
//! attribute envelope encryption, the expression compiler, and the
//! secondary-index selector.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod crypto;
pub mod db;
pub mod error;
pub mod expr;
pub mod index;
pub mod marshal;
pub mod model;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Maximum number of operands accepted by an `IN` condition.
pub const MAX_IN_OPERANDS: usize = 100;

/// Current encrypted envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, transports, ciphers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        expr::{Condition, ConditionOp, Filter, UpdateKind, UpdateOperation},
        model::{AttributeKind, AttributeSpec, IndexSpec, ModelDescriptor, ModelSchema, Registry},
        value::{Number, Record, Value, WireValue},
    };
}
