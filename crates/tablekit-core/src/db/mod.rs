//! Store boundary: request shapes handed to a `Transport`, and the opaque
//! pagination cursor.

mod cursor;
mod request;
mod transport;


pub use cursor::Cursor;
pub use request::{
    BatchOutcome, DeleteRequest, GetRequest, Page, PutRequest, QueryRequest, ScanRequest,
    TransactOp, UpdateRequest, WriteOp, WriteOutcome,
};
pub use transport::Transport;
