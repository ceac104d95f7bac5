use crate::{
    error::{Error, ErrorOrigin},
    expr::is_identifier,
    model::{
        AttributeKind, AttributeRole, AttributeSpec, IndexKind, IndexSpec, ModelDescriptor,
        NamingConvention, Projection, Shape,
    },
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// ModelSchema
///
/// Validated, immutable description of one record type. Every invariant is
/// checked by `ModelSchema::register`; nothing is re-validated per request.
///

#[derive(Clone, Debug)]
pub struct ModelSchema {
    name: String,
    table: String,
    attributes: Vec<AttributeSpec>,
    lookup: BTreeMap<String, usize>,
    partition_key: usize,
    sort_key: Option<usize>,
    version: Option<usize>,
    ttl: Option<usize>,
    indexes: Vec<IndexSpec>,
}

impl ModelSchema {
    /// Validate a descriptor and freeze it into a schema.
    pub fn register(descriptor: ModelDescriptor) -> Result<Self, Error> {
        let ModelDescriptor {
            name,
            table,
            naming,
            attributes,
            includes,
            indexes,
        } = descriptor;

        if name.trim().is_empty() {
            return Err(invalid("model name must not be empty"));
        }
        let table = table.unwrap_or_else(|| name.clone());
        if table.trim().is_empty() {
            return Err(invalid(format!("model '{name}' has an empty table name")));
        }

        // composition: own attributes first, then each fragment in order
        let attributes: Vec<AttributeSpec> = attributes
            .into_iter()
            .chain(includes.iter().flat_map(|s| s.attributes().iter().cloned()))
            .map(|attr| resolve_attribute(attr, naming))
            .collect();

        if attributes.is_empty() {
            return Err(invalid(format!("model '{name}' declares no attributes")));
        }

        let lookup = build_lookup(&name, &attributes)?;

        let mut partition_key = None;
        let mut sort_key = None;
        let mut version = None;
        let mut ttl = None;

        for (pos, attr) in attributes.iter().enumerate() {
            validate_attribute(&name, attr)?;

            let Some(role) = attr.role() else { continue };
            let slot = match role {
                AttributeRole::PartitionKey => &mut partition_key,
                AttributeRole::SortKey => &mut sort_key,
                AttributeRole::Version => &mut version,
                AttributeRole::Ttl => &mut ttl,
            };
            if let Some(prev) = slot.replace(pos) {
                let prev: &AttributeSpec = &attributes[prev];
                return Err(invalid(format!(
                    "model '{name}' assigns role {role:?} to both '{}' and '{}'",
                    prev.name(),
                    attr.name()
                )));
            }
        }

        let Some(partition_key) = partition_key else {
            return Err(invalid(format!("model '{name}' has no partition key")));
        };

        let mut schema = Self {
            name,
            table,
            attributes,
            lookup,
            partition_key,
            sort_key,
            version,
            ttl,
            indexes: Vec::with_capacity(indexes.len()),
        };

        let mut index_names = BTreeSet::new();
        for index in indexes {
            let index = schema.validate_index(index)?;
            if !index_names.insert(index.name.clone()) {
                return Err(invalid(format!(
                    "model '{}' declares index '{}' twice",
                    schema.name, index.name
                )));
            }
            schema.indexes.push(index);
        }

        tracing::debug!(
            model = %schema.name,
            table = %schema.table,
            attributes = schema.attributes.len(),
            indexes = schema.indexes.len(),
            "registered model schema"
        );

        Ok(schema)
    }

    // Resolve index key references to logical names and check key rules.
    fn validate_index(&self, mut index: IndexSpec) -> Result<IndexSpec, Error> {
        if index.name.trim().is_empty() {
            return Err(invalid(format!(
                "model '{}' declares an index with an empty name",
                self.name
            )));
        }

        index.partition_key = self.index_key(&index, &index.partition_key)?;
        if let Some(sk) = index.sort_key.take() {
            index.sort_key = Some(self.index_key(&index, &sk)?);
        }

        if index.kind == IndexKind::Local {
            if index.partition_key != self.partition_key().name() {
                return Err(invalid(format!(
                    "local index '{}' must use the table partition key '{}'",
                    index.name,
                    self.partition_key().name()
                )));
            }
            if index.sort_key.is_none() {
                return Err(invalid(format!(
                    "local index '{}' requires a sort key",
                    index.name
                )));
            }
        }

        if let Projection::Include(fields) = &mut index.projection {
            for field in fields.iter_mut() {
                let Some(attr) = self.attribute(field) else {
                    return Err(invalid(format!(
                        "index '{}' projects unknown attribute '{field}'",
                        index.name
                    )));
                };
                *field = attr.name().to_string();
            }
        }

        Ok(index)
    }

    fn index_key(&self, index: &IndexSpec, field: &str) -> Result<String, Error> {
        let Some(attr) = self.attribute(field) else {
            return Err(invalid(format!(
                "index '{}' references unknown attribute '{field}'",
                index.name
            )));
        };
        if attr.is_encrypted() {
            return Err(invalid(format!(
                "encrypted attribute '{}' cannot key index '{}'",
                attr.name(),
                index.name
            )));
        }
        if !attr.kind().is_key_capable() {
            return Err(invalid(format!(
                "attribute '{}' of kind {:?} cannot key index '{}'",
                attr.name(),
                attr.kind(),
                index.name
            )));
        }

        Ok(attr.name().to_string())
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Look up an attribute by logical or stored name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.lookup.get(name).map(|pos| &self.attributes[*pos])
    }

    #[must_use]
    pub fn partition_key(&self) -> &AttributeSpec {
        &self.attributes[self.partition_key]
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&AttributeSpec> {
        self.sort_key.map(|pos| &self.attributes[pos])
    }

    /// Partition key followed by the sort key, if any.
    pub fn key_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        std::iter::once(self.partition_key()).chain(self.sort_key())
    }

    #[must_use]
    pub fn version_attribute(&self) -> Option<&AttributeSpec> {
        self.version.map(|pos| &self.attributes[pos])
    }

    #[must_use]
    pub fn ttl_attribute(&self) -> Option<&AttributeSpec> {
        self.ttl.map(|pos| &self.attributes[pos])
    }

    #[must_use]
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexSpec> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// Index candidates for a query: the table key first, then every
    /// declared index in declaration order.
    #[must_use]
    pub fn index_candidates(&self) -> Vec<IndexSpec> {
        let primary = IndexSpec::primary(
            self.partition_key().name(),
            self.sort_key().map(AttributeSpec::name),
        );

        std::iter::once(primary)
            .chain(self.indexes.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn has_encrypted(&self) -> bool {
        self.attributes.iter().any(AttributeSpec::is_encrypted)
    }

    #[must_use]
    pub fn encrypted_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|attr| attr.is_encrypted())
            .map(AttributeSpec::name)
            .collect()
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::invalid_model(ErrorOrigin::Schema, message)
}

// Apply the naming convention, recursing into nested shapes.
fn resolve_attribute(mut attr: AttributeSpec, naming: NamingConvention) -> AttributeSpec {
    if !attr.stored_explicit {
        attr.stored = naming.apply(&attr.name);
    }
    if let Some(shape) = attr.shape.take() {
        let mut resolved = Shape::new(shape.name());
        for nested in shape.attributes() {
            resolved = resolved.attribute(resolve_attribute(nested.clone(), naming));
        }
        attr.shape = Some(Arc::new(resolved));
    }

    attr
}

fn build_lookup(model: &str, attributes: &[AttributeSpec]) -> Result<BTreeMap<String, usize>, Error> {
    let mut lookup = BTreeMap::new();

    for (pos, attr) in attributes.iter().enumerate() {
        if attr.name().trim().is_empty() || attr.stored_name().trim().is_empty() {
            return Err(invalid(format!("model '{model}' has an unnamed attribute")));
        }
        for key in [attr.name(), attr.stored_name()] {
            if !is_identifier(key) {
                return Err(invalid(format!(
                    "model '{model}' has invalid attribute name '{key}'"
                )));
            }
            match lookup.insert(key.to_string(), pos) {
                Some(prev) if prev != pos => {
                    return Err(invalid(format!(
                        "model '{model}' has conflicting attribute name '{key}'"
                    )));
                }
                _ => {}
            }
        }
    }

    Ok(lookup)
}

fn validate_attribute(model: &str, attr: &AttributeSpec) -> Result<(), Error> {
    let name = attr.name();
    let kind = attr.kind();
    let flags = attr.flags();

    if flags.json && kind != AttributeKind::String {
        return Err(invalid(format!(
            "attribute '{model}.{name}': json attributes must be of string kind"
        )));
    }
    if flags.binary && kind != AttributeKind::Binary {
        return Err(invalid(format!(
            "attribute '{model}.{name}': binary flag requires binary kind"
        )));
    }
    if attr.shape.is_some() && kind != AttributeKind::Document {
        return Err(invalid(format!(
            "attribute '{model}.{name}': only document attributes may declare a shape"
        )));
    }

    match attr.role() {
        Some(role) if role.is_key() => {
            if flags.encrypted {
                return Err(invalid(format!(
                    "attribute '{model}.{name}': key attributes cannot be encrypted"
                )));
            }
            if !kind.is_key_capable() {
                return Err(invalid(format!(
                    "attribute '{model}.{name}': key attributes must be string, number, or binary"
                )));
            }
        }
        Some(role @ (AttributeRole::Version | AttributeRole::Ttl)) => {
            if kind != AttributeKind::Number {
                return Err(invalid(format!(
                    "attribute '{model}.{name}': {role:?} attribute must be numeric"
                )));
            }
            if flags.encrypted {
                return Err(invalid(format!(
                    "attribute '{model}.{name}': {role:?} attribute cannot be encrypted"
                )));
            }
        }
        _ => {}
    }

    if let Some(shape) = attr.nested_shape() {
        validate_shape(model, shape)?;
    }

    Ok(())
}

// Nested shapes carry plain attributes only.
fn validate_shape(model: &str, shape: &Shape) -> Result<(), Error> {
    let mut seen = BTreeSet::new();

    for attr in shape.attributes() {
        let stored_clash =
            attr.stored_name() != attr.name() && !seen.insert(attr.stored_name());
        if !seen.insert(attr.name()) || stored_clash {
            return Err(invalid(format!(
                "shape '{}' in model '{model}' has conflicting attribute name '{}'",
                shape.name(),
                attr.name()
            )));
        }
        if attr.role().is_some() || attr.is_encrypted() {
            return Err(invalid(format!(
                "shape '{}' in model '{model}': nested attribute '{}' cannot carry a role or encryption",
                shape.name(),
                attr.name()
            )));
        }
        validate_attribute(model, attr)?;
    }

    Ok(())
}
