use tablekit_core::{
    error::{Error, ErrorKind, ErrorOrigin},
    expr::{
        Condition, ConditionOp, DocumentPath, ExpressionComponents, ExpressionRequest, Filter,
        compile,
    },
    index::{analyze_conditions, select_optimal},
    model::{IndexSpec, ModelSchema},
    value::{Record, Value},
};

///
/// Query
///
/// Conditions eligible to drive a key lookup, plus an optional filter tree
/// that never does. Index choice is automatic unless `index` names one.
///

#[derive(Clone, Debug, Default)]
pub struct Query {
    pub(crate) conditions: Vec<Condition>,
    pub(crate) filter: Option<Filter>,
    pub(crate) index: Option<String>,
    pub(crate) limit: Option<u32>,
    pub(crate) cursor: Option<String>,
    pub(crate) projection: Vec<String>,
    pub(crate) allow_scan: bool,
    pub(crate) consistent: Option<bool>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Build a condition from a textual operator.
    pub fn where_(
        self,
        path: &str,
        op: &str,
        operands: impl IntoIterator<Item = Value>,
    ) -> Result<Self, Error> {
        Ok(self.condition(Condition::parse(path, op, operands)?))
    }

    /// AND a filter tree into the query. Filters never select an index.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        let filter = filter.into();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn cursor(mut self, token: impl Into<String>) -> Self {
        self.cursor = Some(token.into());
        self
    }

    #[must_use]
    pub fn project(mut self, path: impl Into<String>) -> Self {
        self.projection.push(path.into());
        self
    }

    /// Permit a full scan when no key condition can be used.
    #[must_use]
    pub const fn allow_scan(mut self) -> Self {
        self.allow_scan = true;
        self
    }

    #[must_use]
    pub const fn consistent(mut self, consistent: bool) -> Self {
        self.consistent = Some(consistent);
        self
    }
}

///
/// QueryPage
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryPage {
    pub records: Vec<Record>,

    /// Pass to `Query::cursor` to read the next page.
    pub cursor: Option<String>,
}

///
/// Plan
///

#[derive(Debug)]
pub(crate) struct Plan {
    /// `None` targets the base table.
    pub(crate) index: Option<String>,
    pub(crate) scan: bool,
    pub(crate) expression: ExpressionComponents,
}

/// Choose the access path and compile every expression for a query.
pub(crate) fn plan(schema: &ModelSchema, query: &Query) -> Result<Plan, Error> {
    let conditions = query
        .conditions
        .iter()
        .map(|c| normalize(schema, c))
        .collect::<Result<Vec<_>, _>>()?;

    let chosen = match &query.index {
        Some(name) => Some(schema.index(name).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidOperator,
                ErrorOrigin::Index,
                format!("model '{}' has no index '{name}'", schema.name()),
            )
        })?),
        None => {
            let candidates = schema.index_candidates();
            select_optimal(&analyze_conditions(&conditions), &candidates).cloned()
        }
    };

    let mut request = ExpressionRequest::new();
    if !query.projection.is_empty() {
        // keys are always read back so results can be decoded and paged
        for attr in schema.key_attributes() {
            request = request.project(attr.name());
        }
        for path in &query.projection {
            request = request.project(path.clone());
        }
    }

    if let Some(index) = &chosen
        && let Some((keys, rest)) = split_key_conditions(index, &conditions)
    {
        reject_key_filters(schema, index, &rest, query.filter.as_ref())?;
        for key in keys {
            request = request.key(key);
        }
        let request = with_filters(request, rest, query.filter.clone());

        return Ok(Plan {
            index: (!index.is_primary()).then(|| index.name().to_string()),
            scan: false,
            expression: compile(schema, &request)?,
        });
    }

    if !query.allow_scan {
        return Err(Error::scan_required(schema.name()));
    }
    tracing::warn!(model = %schema.name(), "no usable key condition, scanning");

    let request = with_filters(request, conditions, query.filter.clone());

    Ok(Plan {
        index: query.index.clone(),
        scan: true,
        expression: compile(schema, &request)?,
    })
}

// Rewrite the path to the logical attribute name so it compares equal to
// index key names.
fn normalize(schema: &ModelSchema, condition: &Condition) -> Result<Condition, Error> {
    let path = DocumentPath::parse(&condition.path)?;
    let attr = path.resolve(schema)?;
    if attr.is_encrypted() {
        return Err(Error::encrypted_not_queryable(attr.name()));
    }

    let path = match path.index() {
        Some(index) => format!("{}[{index}]", attr.name()),
        None => attr.name().to_string(),
    };

    Ok(Condition {
        path,
        op: condition.op,
        operands: condition.operands.clone(),
    })
}

// Partition-key equality plus at most one sort-key condition become the
// key condition; everything else filters.
fn split_key_conditions(
    index: &IndexSpec,
    conditions: &[Condition],
) -> Option<(Vec<Condition>, Vec<Condition>)> {
    let pk = conditions.iter().position(|c| {
        c.path == index.partition_key_name() && c.op == ConditionOp::Eq
    })?;
    let sk = index.sort_key_name().and_then(|sk| {
        conditions
            .iter()
            .enumerate()
            .position(|(i, c)| i != pk && c.path == sk && c.op.is_key_capable())
    });

    let mut keys = vec![conditions[pk].clone()];
    keys.extend(sk.map(|i| conditions[i].clone()));

    let rest = conditions
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pk && Some(*i) != sk)
        .map(|(_, c)| c.clone())
        .collect();

    Some((keys, rest))
}

// Key attributes of the queried index may only appear in the key
// condition.
fn reject_key_filters(
    schema: &ModelSchema,
    index: &IndexSpec,
    rest: &[Condition],
    extra: Option<&Filter>,
) -> Result<(), Error> {
    let extra = extra.map(Filter::conditions).unwrap_or_default();
    for condition in rest.iter().chain(extra) {
        let Ok(path) = DocumentPath::parse(&condition.path) else {
            continue;
        };
        let Ok(attr) = path.resolve(schema) else {
            continue;
        };
        if index.key_fields().any(|key| key == attr.name()) {
            return Err(Error::new(
                ErrorKind::InvalidOperator,
                ErrorOrigin::Index,
                format!(
                    "attribute '{}' is a key of '{}' and can only be constrained by the key condition",
                    attr.name(),
                    index.name()
                ),
            ));
        }
    }

    Ok(())
}

fn with_filters(
    mut request: ExpressionRequest,
    conditions: Vec<Condition>,
    extra: Option<Filter>,
) -> ExpressionRequest {
    if !conditions.is_empty() {
        request = request.filter(Filter::all(conditions));
    }
    if let Some(extra) = extra {
        request = request.filter(extra);
    }

    request
}
