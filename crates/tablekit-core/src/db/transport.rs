use crate::{
    db::{
        BatchOutcome, DeleteRequest, GetRequest, Page, PutRequest, QueryRequest, ScanRequest,
        TransactOp, UpdateRequest, WriteOp, WriteOutcome,
    },
    error::Error,
    value::Item,
};
use async_trait::async_trait;

///
/// Transport
///
/// Executes compiled requests against the store. Implementations own
/// retries, throttling and connection handling; the engine performs none.
///
/// A failed write condition is an `Ok(WriteOutcome::ConditionFailed)`,
/// not an error.
///

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: GetRequest) -> Result<Option<Item>, Error>;

    async fn put(&self, request: PutRequest) -> Result<WriteOutcome, Error>;

    async fn update(&self, request: UpdateRequest) -> Result<WriteOutcome, Error>;

    async fn delete(&self, request: DeleteRequest) -> Result<WriteOutcome, Error>;

    async fn query(&self, request: QueryRequest) -> Result<Page, Error>;

    async fn scan(&self, request: ScanRequest) -> Result<Page, Error>;

    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<BatchOutcome, Error>;

    /// All-or-nothing. `Partial` names the operations whose condition
    /// cancelled the transaction; nothing was applied.
    async fn transact(&self, ops: Vec<TransactOp>) -> Result<BatchOutcome, Error>;
}
