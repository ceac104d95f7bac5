use crate::{
    crypto::EncryptedEnvelope,
    error::{Error, ErrorOrigin},
    expr::{
        Condition, ConditionOp, DocumentPath, ExpressionComponents, Filter, Operand,
        UpdateKind, UpdateOperation, UpdateSection,
    },
    marshal::{encode_value, infer_wire},
    model::{AttributeKind, AttributeSpec, ModelSchema},
    value::{Value, WireKind, WireValue},
};
use std::collections::BTreeMap;

///
/// ExpressionRequest
///
/// Everything a single store call needs compiled together, so that all
/// sections share one placeholder namespace.
///

#[derive(Clone, Debug, Default)]
pub struct ExpressionRequest {
    pub key_conditions: Vec<Condition>,
    pub filter: Option<Filter>,
    pub condition: Option<Filter>,
    pub updates: Vec<UpdateOperation>,
    pub projection: Vec<String>,
}

impl ExpressionRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn key(mut self, condition: Condition) -> Self {
        self.key_conditions.push(condition);
        self
    }

    /// AND another clause into the filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(conjoin(self.filter.take(), filter.into()));
        self
    }

    /// AND another clause into the write condition.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<Filter>) -> Self {
        self.condition = Some(conjoin(self.condition.take(), condition.into()));
        self
    }

    #[must_use]
    pub fn update(mut self, op: UpdateOperation) -> Self {
        self.updates.push(op);
        self
    }

    #[must_use]
    pub fn project(mut self, path: impl Into<String>) -> Self {
        self.projection.push(path.into());
        self
    }
}

fn conjoin(existing: Option<Filter>, next: Filter) -> Filter {
    match existing {
        Some(existing) => existing.and(next),
        None => next,
    }
}

/// Compile a request against a schema.
///
/// Pure: the same schema and request always produce the same components.
/// Any rejection aborts the whole compilation; no partial text escapes.
pub fn compile(
    schema: &ModelSchema,
    request: &ExpressionRequest,
) -> Result<ExpressionComponents, Error> {
    let mut compiler = Compiler::new(schema);

    let key_condition = compiler.key_conditions(&request.key_conditions)?;
    let filter = request
        .filter
        .as_ref()
        .map(|f| compiler.filter(f, true))
        .transpose()?;
    let condition = request
        .condition
        .as_ref()
        .map(|f| compiler.filter(f, true))
        .transpose()?;
    let update = compiler.updates(&request.updates)?;
    let projection = compiler.projection(&request.projection)?;

    let components = ExpressionComponents {
        key_condition,
        filter,
        condition,
        update,
        projection,
        names: compiler.names,
        values: compiler.values,
    };

    tracing::debug!(
        model = %schema.name(),
        names = components.names.len(),
        values = components.values.len(),
        "compiled expression"
    );

    Ok(components)
}

///
/// Compiler
///

struct Compiler<'s> {
    schema: &'s ModelSchema,
    names: BTreeMap<String, String>,
    name_refs: BTreeMap<String, String>,
    values: BTreeMap<String, WireValue>,
}

impl<'s> Compiler<'s> {
    const fn new(schema: &'s ModelSchema) -> Self {
        Self {
            schema,
            names: BTreeMap::new(),
            name_refs: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    ///
    /// PLACEHOLDERS
    ///

    // One name placeholder per distinct stored attribute.
    fn name_ref(&mut self, attr: &AttributeSpec) -> String {
        let stored = attr.stored_name();
        if let Some(placeholder) = self.name_refs.get(stored) {
            return placeholder.clone();
        }

        let placeholder = format!("#n{}", self.name_refs.len());
        self.name_refs
            .insert(stored.to_string(), placeholder.clone());
        self.names.insert(placeholder.clone(), stored.to_string());

        placeholder
    }

    fn path_ref(&mut self, path: &DocumentPath, attr: &AttributeSpec) -> String {
        let name = self.name_ref(attr);
        match path.index() {
            Some(index) => format!("{name}[{index}]"),
            None => name,
        }
    }

    // Values are never shared, even when equal.
    fn value_ref(&mut self, value: WireValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);

        placeholder
    }

    fn resolve(&self, path: &str) -> Result<(DocumentPath, &'s AttributeSpec), Error> {
        let path = DocumentPath::parse(path)?;
        let attr = path.resolve(self.schema)?;

        Ok((path, attr))
    }

    ///
    /// CONDITIONS
    ///

    fn key_conditions(&mut self, conditions: &[Condition]) -> Result<Option<String>, Error> {
        if conditions.is_empty() {
            return Ok(None);
        }

        let rendered = conditions
            .iter()
            .map(|c| self.condition(c, true))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(rendered.join(" AND ")))
    }

    fn filter(&mut self, filter: &Filter, top: bool) -> Result<String, Error> {
        match filter {
            Filter::Condition(c) => self.condition(c, false),
            Filter::Not(inner) => Ok(format!("NOT ({})", self.filter(inner, true)?)),
            Filter::And(children) => self.group(children, " AND ", top),
            Filter::Or(children) => self.group(children, " OR ", top),
        }
    }

    fn group(&mut self, children: &[Filter], joiner: &str, top: bool) -> Result<String, Error> {
        match children {
            [] => Err(Error::invalid_operator(format!(
                "empty{}group in filter",
                joiner.to_ascii_lowercase()
            ))),
            [only] => self.filter(only, top),
            _ => {
                let rendered = children
                    .iter()
                    .map(|child| self.filter(child, false))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(joiner);

                Ok(if top { rendered } else { format!("({rendered})") })
            }
        }
    }

    fn condition(&mut self, condition: &Condition, key: bool) -> Result<String, Error> {
        let (path, attr) = self.resolve(&condition.path)?;
        let op = condition.op;

        if attr.is_encrypted() {
            return Err(Error::encrypted_not_queryable(attr.name()));
        }

        let (min, max) = op.arity();
        let count = condition.operands.len();
        if count < min || count > max {
            return Err(Error::invalid_operator(format!(
                "{op:?} on '{}' takes {} operand(s), got {count}",
                attr.name(),
                if min == max {
                    min.to_string()
                } else {
                    format!("{min}..={max}")
                },
            )));
        }

        if key {
            if !op.is_key_capable() {
                return Err(Error::invalid_operator(format!(
                    "{op:?} is not allowed in a key condition"
                )));
            }
            if path.index().is_some() {
                return Err(Error::invalid_operator(
                    "key conditions cannot address list elements",
                ));
            }
        }

        // validate and encode everything before a placeholder is minted
        let operands = condition
            .operands
            .iter()
            .map(|v| encode_operand(&path, attr, op, v))
            .collect::<Result<Vec<_>, _>>()?;

        let lhs = self.path_ref(&path, attr);
        let refs: Vec<String> = operands.into_iter().map(|w| self.value_ref(w)).collect();

        let text = match (op, refs.as_slice()) {
            (ConditionOp::Eq, [v]) => format!("{lhs} = {v}"),
            (ConditionOp::Ne, [v]) => format!("{lhs} <> {v}"),
            (ConditionOp::Lt, [v]) => format!("{lhs} < {v}"),
            (ConditionOp::Le, [v]) => format!("{lhs} <= {v}"),
            (ConditionOp::Gt, [v]) => format!("{lhs} > {v}"),
            (ConditionOp::Ge, [v]) => format!("{lhs} >= {v}"),
            (ConditionOp::Between, [low, high]) => format!("{lhs} BETWEEN {low} AND {high}"),
            (ConditionOp::In, list) => format!("{lhs} IN ({})", list.join(", ")),
            (ConditionOp::BeginsWith, [v]) => format!("begins_with({lhs}, {v})"),
            (ConditionOp::Contains, [v]) => format!("contains({lhs}, {v})"),
            (ConditionOp::Exists, []) => format!("attribute_exists({lhs})"),
            (ConditionOp::NotExists, []) => format!("attribute_not_exists({lhs})"),
            (ConditionOp::AttributeType, [v]) => format!("attribute_type({lhs}, {v})"),
            _ => {
                return Err(Error::invalid_operator(format!(
                    "{op:?} received {} operand(s)",
                    refs.len()
                )));
            }
        };

        Ok(text)
    }

    ///
    /// UPDATES
    ///

    fn updates(&mut self, ops: &[UpdateOperation]) -> Result<Option<String>, Error> {
        if ops.is_empty() {
            return Ok(None);
        }

        let mut planned: Vec<(DocumentPath, &AttributeSpec, UpdateKind, Option<WireValue>)> =
            Vec::with_capacity(ops.len());
        for op in ops {
            let (path, attr) = self.resolve(&op.path)?;
            let operand = validate_update(op, &path, attr)?;

            if let Some((prev, ..)) = planned
                .iter()
                .find(|(p, a, ..)| a.name() == attr.name() && overlaps(p.index(), path.index()))
            {
                return Err(Error::invalid_operator(format!(
                    "update paths '{prev}' and '{path}' overlap"
                )));
            }

            planned.push((path, attr, op.kind, operand));
        }

        // section order, then rank, then input order
        planned.sort_by_key(|(_, _, kind, _)| (kind.section(), kind.rank()));

        let mut sections: Vec<(UpdateSection, Vec<String>)> = Vec::new();
        for (path, attr, kind, operand) in planned {
            let target = self.path_ref(&path, attr);
            let value = operand.map(|w| self.value_ref(w)).unwrap_or_default();

            let text = match kind {
                UpdateKind::Set => format!("{target} = {value}"),
                UpdateKind::SetIfAbsent => {
                    format!("{target} = if_not_exists({target}, {value})")
                }
                UpdateKind::Remove => target,
                UpdateKind::NumericAdd | UpdateKind::SetAdd | UpdateKind::SetDelete => {
                    format!("{target} {value}")
                }
                UpdateKind::ListAppend => {
                    format!("{target} = list_append({target}, {value})")
                }
                UpdateKind::ListPrepend => {
                    format!("{target} = list_append({value}, {target})")
                }
            };

            match sections.last_mut() {
                Some((section, clauses)) if *section == kind.section() => clauses.push(text),
                _ => sections.push((kind.section(), vec![text])),
            }
        }

        let rendered = sections
            .into_iter()
            .map(|(section, clauses)| format!("{} {}", section.keyword(), clauses.join(", ")))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Some(rendered))
    }

    ///
    /// PROJECTION
    ///

    fn projection(&mut self, paths: &[String]) -> Result<Option<String>, Error> {
        if paths.is_empty() {
            return Ok(None);
        }

        let mut seen = Vec::with_capacity(paths.len());
        let mut rendered = Vec::with_capacity(paths.len());
        for text in paths {
            let (path, attr) = self.resolve(text)?;
            let key = (attr.name(), path.index());
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            rendered.push(self.path_ref(&path, attr));
        }

        Ok(Some(rendered.join(", ")))
    }
}

const fn overlaps(a: Option<u32>, b: Option<u32>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

// Condition operand encoding. Top-level comparisons use the declared kind;
// list elements and set members are encoded by shape.
fn encode_operand(
    path: &DocumentPath,
    attr: &AttributeSpec,
    op: ConditionOp,
    value: &Value,
) -> Result<WireValue, Error> {
    match op {
        ConditionOp::AttributeType => {
            let descriptor = value.as_text().unwrap_or_default();
            let Some(kind) = WireKind::from_descriptor(descriptor) else {
                return Err(Error::invalid_operator(format!(
                    "unknown attribute type descriptor '{descriptor}'"
                )));
            };
            Ok(WireValue::string(kind.descriptor()))
        }
        ConditionOp::BeginsWith if path.index().is_none() => {
            if attr.flags().json
                || !matches!(
                    attr.kind(),
                    AttributeKind::String | AttributeKind::Binary | AttributeKind::Timestamp
                )
            {
                return Err(Error::invalid_operator(format!(
                    "begins_with is not supported on attribute '{}'",
                    attr.name()
                )));
            }
            encode_value(attr, value)
        }
        ConditionOp::Contains
            if path.index().is_none() && (attr.kind().is_set() || attr.kind() == AttributeKind::List) =>
        {
            infer_wire(value)
        }
        _ if path.index().is_some() => infer_wire(value),
        _ => encode_value(attr, value),
    }
}

// Check one update against its attribute and encode its operand.
fn validate_update(
    op: &UpdateOperation,
    path: &DocumentPath,
    attr: &AttributeSpec,
) -> Result<Option<WireValue>, Error> {
    let kind = op.kind;

    if attr.is_key() {
        return Err(Error::invalid_operator(format!(
            "key attribute '{}' cannot be updated",
            attr.name()
        )));
    }

    let operand = match (kind.needs_operand(), &op.operand) {
        (true, Some(operand)) => operand,
        (true, None) => {
            return Err(Error::invalid_operator(format!(
                "{kind:?} on '{path}' requires an operand"
            )));
        }
        (false, None) => return Ok(None),
        (false, Some(_)) => {
            return Err(Error::invalid_operator(format!(
                "{kind:?} on '{path}' takes no operand"
            )));
        }
    };

    if attr.is_encrypted() {
        if !matches!(kind, UpdateKind::Set | UpdateKind::SetIfAbsent) {
            return Err(Error::invalid_operator(format!(
                "encrypted attribute '{}' does not support {kind:?}",
                attr.name()
            )));
        }
        if path.index().is_some() {
            return Err(Error::invalid_operator(format!(
                "encrypted attribute '{}' cannot be updated by element",
                attr.name()
            )));
        }

        return match operand {
            Operand::Sealed(wire) => {
                EncryptedEnvelope::from_wire(attr.name(), wire)?;
                Ok(Some(wire.clone()))
            }
            Operand::Native(_) => Err(Error::invalid_model(
                ErrorOrigin::Expression,
                format!("encrypted attribute '{}' requires a sealed operand", attr.name()),
            )),
        };
    }

    let Operand::Native(value) = operand else {
        return Err(Error::invalid_model(
            ErrorOrigin::Expression,
            format!("attribute '{}' is not encrypted", attr.name()),
        ));
    };

    let unsupported = || {
        Error::invalid_operator(format!(
            "{kind:?} is not supported on attribute '{path}' of kind {:?}",
            attr.kind()
        ))
    };

    let wire = match kind {
        UpdateKind::Set | UpdateKind::SetIfAbsent if path.index().is_some() => infer_wire(value)?,
        UpdateKind::Set | UpdateKind::SetIfAbsent => encode_value(attr, value)?,
        UpdateKind::NumericAdd => {
            if attr.kind() != AttributeKind::Number || path.index().is_some() {
                return Err(unsupported());
            }
            encode_value(attr, value)?
        }
        UpdateKind::ListAppend | UpdateKind::ListPrepend => {
            if attr.kind() != AttributeKind::List || path.index().is_some() {
                return Err(unsupported());
            }
            encode_value(attr, value)?
        }
        UpdateKind::SetAdd | UpdateKind::SetDelete => {
            if !attr.kind().is_set() || path.index().is_some() {
                return Err(unsupported());
            }
            let wire = encode_value(attr, value)?;
            if wire == WireValue::Null {
                return Err(Error::invalid_operator(format!(
                    "{kind:?} on '{path}' requires a non-empty set"
                )));
            }
            wire
        }
        UpdateKind::Remove => return Ok(None),
    };

    Ok(Some(wire))
}
