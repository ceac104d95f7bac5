//! In-memory store double and shared models for facade tests.
//!
//! Understands the expression subset the engine emits for these models:
//! `attribute_exists`, `attribute_not_exists` and `=` clauses joined by
//! `AND`, plus `SET`/`REMOVE` update sections.

#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tablekit::{
    Engine,
    config::EngineConfig,
    core::{
        crypto::LocalKeyProvider,
        db::{
            BatchOutcome, DeleteRequest, GetRequest, Page, PutRequest, QueryRequest, ScanRequest,
            TransactOp, Transport, UpdateRequest, WriteOp, WriteOutcome,
        },
        error::Error,
        expr::ExpressionComponents,
        model::{AttributeKind, AttributeSpec, IndexSpec, ModelDescriptor, Registry},
        value::{Item, WireValue},
    },
};

///
/// MemoryTransport
///

#[derive(Debug, Default)]
pub struct MemoryTransport {
    tables: Mutex<BTreeMap<String, BTreeMap<String, Item>>>,
    queries: Mutex<Vec<QueryRequest>>,
    scans: Mutex<Vec<ScanRequest>>,
    unprocessed: Mutex<Vec<usize>>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Raw stored item, bypassing the engine.
    pub fn raw(&self, table: &str, id: &str) -> Option<Item> {
        self.read(table, &Item::from([("ID".to_string(), WireValue::string(id))]))
    }

    fn row(&self, table: &str, id: &str) -> Option<Item> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned()
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    pub fn queries(&self) -> Vec<QueryRequest> {
        self.queries.lock().unwrap().clone()
    }

    pub fn scans(&self) -> Vec<ScanRequest> {
        self.scans.lock().unwrap().clone()
    }

    /// The next batch write skips these positions and reports them back.
    pub fn leave_unprocessed(&self, positions: Vec<usize>) {
        *self.unprocessed.lock().unwrap() = positions;
    }

    fn read(&self, table: &str, key: &Item) -> Option<Item> {
        self.row(table, &row_id(key))
    }

    fn write(&self, table: &str, item: Item) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .insert(row_id(&item), item);
    }

    fn remove(&self, table: &str, key: &Item) {
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
            rows.remove(&row_id(key));
        }
    }

    fn apply_update(&self, request: &UpdateRequest) {
        let mut item = self
            .read(&request.table, &request.key)
            .unwrap_or_else(|| request.key.clone());
        apply_update(&mut item, &request.expression);
        self.write(&request.table, item);
    }

    fn page(
        &self,
        table: &str,
        expression: &ExpressionComponents,
        limit: u32,
        start_key: Option<&Item>,
    ) -> Page {
        let rows = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default();
        let after = start_key.map(row_id);

        let mut matching = rows
            .into_iter()
            .filter(|(id, _)| after.as_ref().is_none_or(|after| id > after))
            .map(|(_, item)| item)
            .filter(|item| {
                holds(expression.key_condition.as_deref(), expression, Some(item))
                    && holds(expression.filter.as_deref(), expression, Some(item))
            });

        let items: Vec<Item> = matching.by_ref().take(limit as usize).collect();
        let more = matching.next().is_some();
        let last_key = items
            .last()
            .filter(|_| more)
            .map(|item| key_only(item));

        Page { items, last_key }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, request: GetRequest) -> Result<Option<Item>, Error> {
        Ok(self.read(&request.table, &request.key))
    }

    async fn put(&self, request: PutRequest) -> Result<WriteOutcome, Error> {
        let current = self.read(&request.table, &request.item);
        if !holds(
            request.expression.condition.as_deref(),
            &request.expression,
            current.as_ref(),
        ) {
            return Ok(WriteOutcome::ConditionFailed);
        }
        self.write(&request.table, request.item);

        Ok(WriteOutcome::Applied)
    }

    async fn update(&self, request: UpdateRequest) -> Result<WriteOutcome, Error> {
        let current = self.read(&request.table, &request.key);
        if !holds(
            request.expression.condition.as_deref(),
            &request.expression,
            current.as_ref(),
        ) {
            return Ok(WriteOutcome::ConditionFailed);
        }
        self.apply_update(&request);

        Ok(WriteOutcome::Applied)
    }

    async fn delete(&self, request: DeleteRequest) -> Result<WriteOutcome, Error> {
        let current = self.read(&request.table, &request.key);
        if !holds(
            request.expression.condition.as_deref(),
            &request.expression,
            current.as_ref(),
        ) {
            return Ok(WriteOutcome::ConditionFailed);
        }
        self.remove(&request.table, &request.key);

        Ok(WriteOutcome::Applied)
    }

    async fn query(&self, request: QueryRequest) -> Result<Page, Error> {
        self.queries.lock().unwrap().push(request.clone());

        Ok(self.page(
            &request.table,
            &request.expression,
            request.limit,
            request.start_key.as_ref(),
        ))
    }

    async fn scan(&self, request: ScanRequest) -> Result<Page, Error> {
        self.scans.lock().unwrap().push(request.clone());

        Ok(self.page(
            &request.table,
            &request.expression,
            request.limit,
            request.start_key.as_ref(),
        ))
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<BatchOutcome, Error> {
        let skipped = std::mem::take(&mut *self.unprocessed.lock().unwrap());

        for (pos, op) in ops.into_iter().enumerate() {
            if skipped.contains(&pos) {
                continue;
            }
            match op {
                WriteOp::Put(put) => self.write(&put.table, put.item),
                WriteOp::Delete(delete) => self.remove(&delete.table, &delete.key),
            }
        }

        Ok(if skipped.is_empty() {
            BatchOutcome::Complete
        } else {
            BatchOutcome::Partial(skipped)
        })
    }

    async fn transact(&self, ops: Vec<TransactOp>) -> Result<BatchOutcome, Error> {
        let failed: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| {
                let (table, key, expression) = match op {
                    TransactOp::Check(r) | TransactOp::Delete(r) => (&r.table, &r.key, &r.expression),
                    TransactOp::Put(r) => (&r.table, &r.item, &r.expression),
                    TransactOp::Update(r) => (&r.table, &r.key, &r.expression),
                };
                let current = self.read(table, key);
                !holds(expression.condition.as_deref(), expression, current.as_ref())
            })
            .map(|(pos, _)| pos)
            .collect();

        if !failed.is_empty() {
            return Ok(BatchOutcome::Partial(failed));
        }

        for op in ops {
            match op {
                TransactOp::Check(_) => {}
                TransactOp::Delete(r) => self.remove(&r.table, &r.key),
                TransactOp::Put(r) => self.write(&r.table, r.item),
                TransactOp::Update(r) => self.apply_update(&r),
            }
        }

        Ok(BatchOutcome::Complete)
    }
}

// Every test model keys on a single string attribute stored as `ID`.
fn row_id(item: &Item) -> String {
    format!("{:?}", item.get("ID"))
}

fn key_only(item: &Item) -> Item {
    item.iter()
        .filter(|(name, _)| name.as_str() == "ID")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn holds(text: Option<&str>, expression: &ExpressionComponents, item: Option<&Item>) -> bool {
    let Some(text) = text else { return true };
    let attribute = |placeholder: &str| {
        item.and_then(|item| item.get(&expression.names[placeholder]))
    };

    text.split(" AND ").all(|clause| {
        if let Some(name) = call_arg(clause, "attribute_not_exists") {
            return attribute(name).is_none();
        }
        if let Some(name) = call_arg(clause, "attribute_exists") {
            return attribute(name).is_some();
        }
        let (name, value) = clause
            .split_once(" = ")
            .unwrap_or_else(|| panic!("unsupported clause '{clause}'"));

        attribute(name) == Some(&expression.values[value])
    })
}

fn call_arg<'a>(clause: &'a str, function: &str) -> Option<&'a str> {
    clause
        .strip_prefix(function)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn apply_update(item: &mut Item, expression: &ExpressionComponents) {
    let text = expression.update.as_deref().unwrap_or_default();
    let (set, remove) = match text.split_once("REMOVE ") {
        Some((set, remove)) => (set.trim(), Some(remove)),
        None => (text, None),
    };

    if let Some(assignments) = set.strip_prefix("SET ") {
        for assignment in assignments.split(", ") {
            let (name, value) = assignment
                .split_once(" = ")
                .unwrap_or_else(|| panic!("unsupported assignment '{assignment}'"));
            item.insert(
                expression.names[name].clone(),
                expression.values[value].clone(),
            );
        }
    }
    for name in remove.into_iter().flat_map(|r| r.split(", ")) {
        item.remove(&expression.names[name]);
    }
}

//
// Models
//

/// `Account`: plain attributes, a version counter and an owner index.
pub fn account() -> ModelDescriptor {
    ModelDescriptor::new("Account")
        .table("accounts")
        .attribute(AttributeSpec::string("ID").partition_key())
        .attribute(AttributeSpec::string("Owner"))
        .attribute(AttributeSpec::number("Balance"))
        .attribute(AttributeSpec::string("Status").omit_if_empty())
        .attribute(AttributeSpec::number("Revision").version())
        .index(IndexSpec::global("by-owner", "Owner"))
}

/// `Vault`: encrypted attributes next to plain ones.
pub fn vault() -> ModelDescriptor {
    ModelDescriptor::new("Vault")
        .table("vaults")
        .attribute(AttributeSpec::string("ID").partition_key())
        .attribute(AttributeSpec::string("Label"))
        .attribute(AttributeSpec::string("Secret").encrypted().omit_if_empty())
        .attribute(AttributeSpec::new("Codes", AttributeKind::StringSet).encrypted().omit_if_empty())
}

pub fn registry() -> Registry {
    Registry::builder()
        .with(account())
        .unwrap()
        .with(vault())
        .unwrap()
        .build()
}

/// Engine over both models with a local key provider.
pub fn engine(transport: &Arc<MemoryTransport>) -> Engine {
    engine_with(transport, EngineConfig::default())
}

pub fn engine_with(transport: &Arc<MemoryTransport>, config: EngineConfig) -> Engine {
    Engine::builder()
        .registry(registry())
        .transport(Arc::clone(transport) as Arc<dyn Transport>)
        .key_provider(Arc::new(LocalKeyProvider::generate()))
        .config(config)
        .build()
        .unwrap()
}
