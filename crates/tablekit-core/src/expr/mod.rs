//! Expression compiler: structured conditions and update operations in,
//! placeholder-only expression text out.

mod compile;
mod components;
mod condition;
mod path;
mod update;

#[cfg(test)]
mod tests;

pub use compile::{ExpressionRequest, compile};
pub use components::ExpressionComponents;
pub use condition::{Condition, ConditionOp, Filter};
pub use path::{DocumentPath, MAX_ATTRIBUTE_NAME_LEN, is_identifier};
pub use update::{Operand, UpdateKind, UpdateOperation, UpdateSection};
