use crate::{expr::ExpressionComponents, value::Item};

///
/// GetRequest
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GetRequest {
    pub table: String,
    pub key: Item,
    pub expression: ExpressionComponents,
    pub consistent: bool,
}

///
/// PutRequest
///
/// `expression` carries the write condition, if any.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PutRequest {
    pub table: String,
    pub item: Item,
    pub expression: ExpressionComponents,
}

///
/// UpdateRequest
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub key: Item,
    pub expression: ExpressionComponents,
}

///
/// DeleteRequest
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeleteRequest {
    pub table: String,
    pub key: Item,
    pub expression: ExpressionComponents,
}

///
/// QueryRequest
///
/// `index` is `None` for the base table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub expression: ExpressionComponents,
    pub limit: u32,
    pub start_key: Option<Item>,
    pub consistent: bool,
}

///
/// ScanRequest
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanRequest {
    pub table: String,
    pub index: Option<String>,
    pub expression: ExpressionComponents,
    pub limit: u32,
    pub start_key: Option<Item>,
    pub consistent: bool,
}

///
/// Page
///
/// One page of stored items. `last_key` is set when more may follow.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_key: Option<Item>,
}

///
/// WriteOp
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteOp {
    Delete(DeleteRequest),
    Put(PutRequest),
}

///
/// TransactOp
///
/// `Check` asserts a condition on an item without writing it.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactOp {
    Check(DeleteRequest),
    Delete(DeleteRequest),
    Put(PutRequest),
    Update(UpdateRequest),
}

///
/// WriteOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    Applied,
    ConditionFailed,
}

///
/// BatchOutcome
///
/// `Partial` lists the positions of operations that were not applied.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BatchOutcome {
    Complete,
    Partial(Vec<usize>),
}

impl BatchOutcome {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}
