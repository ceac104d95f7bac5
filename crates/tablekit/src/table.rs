use crate::{
    engine::EngineInner,
    query::{Query, QueryPage, plan},
};
use std::sync::Arc;
use tablekit_core::{
    crypto::CallContext,
    db::{
        BatchOutcome, Cursor, DeleteRequest, GetRequest, PutRequest, QueryRequest, ScanRequest,
        TransactOp, UpdateRequest, WriteOp, WriteOutcome,
    },
    error::{Error, ErrorKind, ErrorOrigin},
    expr::{
        Condition, DocumentPath, ExpressionComponents, ExpressionRequest, Filter, Operand,
        UpdateKind, UpdateOperation, compile,
    },
    marshal::Marshaller,
    model::ModelSchema,
    value::{Record, Value},
};

///
/// BatchWrite
///

#[derive(Clone, Debug)]
pub enum BatchWrite {
    Delete(Record),
    Put(Record),
}

///
/// Transact
///
/// One step of an all-or-nothing write. `Check` asserts a condition on an
/// item without writing it.
///

#[derive(Clone, Debug)]
pub enum Transact {
    Check {
        key: Record,
        condition: Filter,
    },
    Delete {
        key: Record,
        condition: Option<Filter>,
    },
    Put {
        record: Record,
        condition: Option<Filter>,
    },
    Update {
        key: Record,
        ops: Vec<UpdateOperation>,
        condition: Option<Filter>,
    },
}

///
/// TableHandle
///
/// Reads and writes for one model. Every key-management call made on
/// behalf of this handle runs under its `CallContext`.
///

#[derive(Clone)]
pub struct TableHandle {
    engine: Arc<EngineInner>,
    marshaller: Arc<Marshaller>,
    table: String,
    cx: CallContext,
}

impl TableHandle {
    pub(crate) fn new(engine: Arc<EngineInner>, marshaller: Arc<Marshaller>) -> Self {
        let table = engine.config.table_name(marshaller.schema().table());

        Self {
            engine,
            marshaller,
            table,
            cx: CallContext::new(),
        }
    }

    /// Use `cx` for cancellation and deadlines of encryption calls.
    #[must_use]
    pub fn with_context(mut self, cx: CallContext) -> Self {
        self.cx = cx;
        self
    }

    #[must_use]
    pub fn schema(&self) -> &ModelSchema {
        self.marshaller.schema()
    }

    /// Physical table name, prefix included.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    //
    // Reads
    //

    /// Read one record by key; a miss is `ItemNotFound`.
    pub async fn get(&self, key: &Record) -> Result<Record, Error> {
        self.find(key)
            .await?
            .ok_or_else(|| Error::item_not_found(&self.table))
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub async fn find(&self, key: &Record) -> Result<Option<Record>, Error> {
        let request = GetRequest {
            table: self.table.clone(),
            key: self.marshaller.marshal_key(key)?,
            expression: ExpressionComponents::default(),
            consistent: self.engine.config.query.consistent_reads,
        };

        match self.engine.transport.get(request).await? {
            Some(item) => Ok(Some(self.marshaller.unmarshal(&item, &self.cx).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub async fn query(&self, query: Query) -> Result<QueryPage, Error> {
        let plan = plan(self.schema(), &query)?;

        let start_key = match &query.cursor {
            Some(token) => {
                let cursor = Cursor::decode(token)?;
                if cursor.index != plan.index {
                    return Err(Error::new(
                        ErrorKind::InvalidOperator,
                        ErrorOrigin::Cursor,
                        "cursor was issued for a different index",
                    ));
                }
                Some(cursor.last_key)
            }
            None => None,
        };
        let limit = self.engine.config.query.page_limit(query.limit);
        let consistent = query
            .consistent
            .unwrap_or(self.engine.config.query.consistent_reads);

        let page = if plan.scan {
            let request = ScanRequest {
                table: self.table.clone(),
                index: plan.index.clone(),
                expression: plan.expression,
                limit,
                start_key,
                consistent,
            };
            self.engine.transport.scan(request).await?
        } else {
            let request = QueryRequest {
                table: self.table.clone(),
                index: plan.index.clone(),
                expression: plan.expression,
                limit,
                start_key,
                consistent,
            };
            self.engine.transport.query(request).await?
        };

        let mut records = Vec::with_capacity(page.items.len());
        for item in &page.items {
            records.push(self.marshaller.unmarshal(item, &self.cx).await?);
        }
        let cursor = page
            .last_key
            .map(|key| Cursor::new(key, plan.index).encode())
            .transpose()?;

        Ok(QueryPage { records, cursor })
    }

    //
    // Writes
    //

    /// Store a record. With a version attribute, a version of zero must
    /// not exist yet and any other version must match the stored one; the
    /// returned record carries the incremented version.
    pub async fn put(&self, record: &Record) -> Result<Record, Error> {
        self.put_with(record, None).await
    }

    /// `put` with an extra write condition.
    pub async fn put_if(
        &self,
        record: &Record,
        condition: impl Into<Filter>,
    ) -> Result<Record, Error> {
        self.put_with(record, Some(condition.into())).await
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    async fn put_with(&self, record: &Record, condition: Option<Filter>) -> Result<Record, Error> {
        let (request, stored) = self.prepare_put(record, condition).await?;
        let outcome = self.engine.transport.put(request).await?;
        self.check_outcome(outcome)?;

        Ok(stored)
    }

    /// Apply update operations to one item. Plain values assigned to
    /// encrypted attributes are sealed first.
    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub async fn update(
        &self,
        key: &Record,
        ops: Vec<UpdateOperation>,
        condition: Option<Filter>,
    ) -> Result<(), Error> {
        let request = self.prepare_update(key, ops, condition).await?;
        let outcome = self.engine.transport.update(request).await?;

        self.check_outcome(outcome)
    }

    #[tracing::instrument(skip_all, fields(table = %self.table))]
    pub async fn delete(&self, key: &Record, condition: Option<Filter>) -> Result<(), Error> {
        let request = self.prepare_delete(key, condition)?;
        let outcome = self.engine.transport.delete(request).await?;

        self.check_outcome(outcome)
    }

    /// Unconditional puts and deletes in one round trip. Positions of
    /// operations the store did not apply come back in `Partial`.
    #[tracing::instrument(skip_all, fields(table = %self.table, ops = ops.len()))]
    pub async fn batch_write(&self, ops: Vec<BatchWrite>) -> Result<BatchOutcome, Error> {
        let mut requests = Vec::with_capacity(ops.len());
        for op in ops {
            requests.push(match op {
                BatchWrite::Put(record) => WriteOp::Put(PutRequest {
                    table: self.table.clone(),
                    item: self.marshaller.marshal(&record, &self.cx).await?,
                    expression: ExpressionComponents::default(),
                }),
                BatchWrite::Delete(key) => WriteOp::Delete(self.prepare_delete(&key, None)?),
            });
        }

        self.engine.transport.batch_write(requests).await
    }

    /// All-or-nothing writes. A cancelled transaction is `ConditionFailed`
    /// naming the operations that failed.
    #[tracing::instrument(skip_all, fields(table = %self.table, ops = ops.len()))]
    pub async fn transact(&self, ops: Vec<Transact>) -> Result<(), Error> {
        let mut requests = Vec::with_capacity(ops.len());
        for op in ops {
            requests.push(match op {
                Transact::Check { key, condition } => {
                    TransactOp::Check(self.prepare_delete(&key, Some(condition))?)
                }
                Transact::Delete { key, condition } => {
                    TransactOp::Delete(self.prepare_delete(&key, condition)?)
                }
                Transact::Put { record, condition } => {
                    TransactOp::Put(self.prepare_put(&record, condition).await?.0)
                }
                Transact::Update {
                    key,
                    ops,
                    condition,
                } => TransactOp::Update(self.prepare_update(&key, ops, condition).await?),
            });
        }

        match self.engine.transport.transact(requests).await? {
            BatchOutcome::Complete => Ok(()),
            BatchOutcome::Partial(failed) => Err(Error::new(
                ErrorKind::ConditionFailed,
                ErrorOrigin::Transport,
                format!(
                    "transaction on '{}' cancelled by operations {failed:?}",
                    self.table
                ),
            )),
        }
    }

    //
    // Request preparation
    //

    async fn prepare_put(
        &self,
        record: &Record,
        condition: Option<Filter>,
    ) -> Result<(PutRequest, Record), Error> {
        let (stored, version_condition) = self.versioned(record)?;

        let mut request = ExpressionRequest::new();
        for clause in version_condition.into_iter().chain(condition) {
            request = request.condition(clause);
        }
        let expression = compile(self.schema(), &request)?;

        let item = self.marshaller.marshal(&stored, &self.cx).await?;

        Ok((
            PutRequest {
                table: self.table.clone(),
                item,
                expression,
            },
            stored,
        ))
    }

    async fn prepare_update(
        &self,
        key: &Record,
        ops: Vec<UpdateOperation>,
        condition: Option<Filter>,
    ) -> Result<UpdateRequest, Error> {
        let key = self.marshaller.marshal_key(key)?;

        // the whole request is checked against stand-in envelopes before
        // any key-management call
        let checked = ops
            .iter()
            .map(|op| self.with_stand_in(op))
            .collect::<Result<Vec<_>, _>>()?;
        compile(self.schema(), &build_request(checked, condition.clone()))?;

        let mut sealed = Vec::with_capacity(ops.len());
        for op in ops {
            sealed.push(if self.needs_sealing(&op) {
                self.seal_operand(op).await?
            } else {
                op
            });
        }
        let expression = compile(self.schema(), &build_request(sealed, condition))?;

        Ok(UpdateRequest {
            table: self.table.clone(),
            key,
            expression,
        })
    }

    fn prepare_delete(
        &self,
        key: &Record,
        condition: Option<Filter>,
    ) -> Result<DeleteRequest, Error> {
        let key = self.marshaller.marshal_key(key)?;
        let expression = compile(self.schema(), &build_request([], condition))?;

        Ok(DeleteRequest {
            table: self.table.clone(),
            key,
            expression,
        })
    }

    // Bump the version attribute and derive the optimistic-lock condition.
    fn versioned(&self, record: &Record) -> Result<(Record, Option<Filter>), Error> {
        let schema = self.schema();
        let Some(attr) = schema.version_attribute() else {
            return Ok((record.clone(), None));
        };

        let current = match record.get(attr.name()) {
            None | Some(Value::Null) => 0,
            Some(Value::Number(n)) => n
                .as_i64()
                .filter(|v| *v >= 0)
                .ok_or_else(|| bad_version(attr.name()))?,
            Some(_) => return Err(bad_version(attr.name())),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| bad_version(attr.name()))?;

        let condition = if current == 0 {
            Condition::not_exists(schema.partition_key().name())
        } else {
            Condition::eq(attr.name(), current)
        };

        let mut stored = record.clone();
        stored.set(attr.name(), next);

        Ok((stored, Some(condition.into())))
    }

    fn needs_sealing(&self, op: &UpdateOperation) -> bool {
        if !matches!(op.kind, UpdateKind::Set | UpdateKind::SetIfAbsent)
            || !matches!(op.operand, Some(Operand::Native(_)))
        {
            return false;
        }

        DocumentPath::parse(&op.path).is_ok_and(|path| {
            path.index().is_none()
                && self
                    .schema()
                    .attribute(path.attribute())
                    .is_some_and(|attr| attr.is_encrypted())
        })
    }

    fn with_stand_in(&self, op: &UpdateOperation) -> Result<UpdateOperation, Error> {
        let Some(Operand::Native(value)) = op.operand.as_ref().filter(|_| self.needs_sealing(op))
        else {
            return Ok(op.clone());
        };
        let stand_in = self.marshaller.stand_in_value(&op.path, value)?;

        Ok(UpdateOperation::new(
            op.path.clone(),
            op.kind,
            Some(Operand::Sealed(stand_in)),
        ))
    }

    async fn seal_operand(&self, op: UpdateOperation) -> Result<UpdateOperation, Error> {
        let UpdateOperation {
            path,
            kind,
            operand,
        } = op;
        let Some(Operand::Native(value)) = operand else {
            return Ok(UpdateOperation::new(path, kind, operand));
        };

        let sealed = self.marshaller.seal_value(&path, &value, &self.cx).await?;

        Ok(UpdateOperation::new(path, kind, Some(Operand::Sealed(sealed))))
    }

    fn check_outcome(&self, outcome: WriteOutcome) -> Result<(), Error> {
        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::ConditionFailed => Err(Error::condition_failed(&self.table)),
        }
    }
}

impl std::fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHandle")
            .field("model", &self.schema().name())
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

fn build_request(
    ops: impl IntoIterator<Item = UpdateOperation>,
    condition: Option<Filter>,
) -> ExpressionRequest {
    let mut request = ops
        .into_iter()
        .fold(ExpressionRequest::new(), ExpressionRequest::update);
    if let Some(condition) = condition {
        request = request.condition(condition);
    }

    request
}

fn bad_version(attribute: &str) -> Error {
    Error::invalid_model(
        ErrorOrigin::Engine,
        format!("version attribute '{attribute}' must be a non-negative integer below the maximum"),
    )
}
