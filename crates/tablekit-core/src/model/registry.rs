use crate::{
    error::{Error, ErrorOrigin},
    model::{ModelDescriptor, ModelSchema},
};
use std::{collections::BTreeMap, sync::Arc};

///
/// Registry
///
/// Read-only set of registered schemas. Built once, then shared freely
/// across threads.
///

#[derive(Clone, Debug, Default)]
pub struct Registry {
    models: BTreeMap<String, Arc<ModelSchema>>,
    tables: BTreeMap<String, String>,
}

impl Registry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a schema by logical model name.
    pub fn get(&self, name: &str) -> Result<Arc<ModelSchema>, Error> {
        self.models.get(name).cloned().ok_or_else(|| {
            Error::invalid_model(
                ErrorOrigin::Schema,
                format!("model '{name}' is not registered"),
            )
        })
    }

    /// Look up a schema by its table name.
    #[must_use]
    pub fn by_table(&self, table: &str) -> Option<Arc<ModelSchema>> {
        self.tables
            .get(table)
            .and_then(|name| self.models.get(name))
            .cloned()
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelSchema>> {
        self.models.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

///
/// RegistryBuilder
///

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    inner: Registry,
}

impl RegistryBuilder {
    /// Validate and add a model. Model and table names must be unique.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Result<Arc<ModelSchema>, Error> {
        let schema = ModelSchema::register(descriptor)?;

        if self.inner.models.contains_key(schema.name()) {
            return Err(Error::invalid_model(
                ErrorOrigin::Schema,
                format!("model '{}' is already registered", schema.name()),
            ));
        }
        if let Some(owner) = self.inner.tables.get(schema.table()) {
            return Err(Error::invalid_model(
                ErrorOrigin::Schema,
                format!(
                    "table '{}' is already bound to model '{owner}'",
                    schema.table()
                ),
            ));
        }

        let schema = Arc::new(schema);
        self.inner
            .tables
            .insert(schema.table().to_string(), schema.name().to_string());
        self.inner
            .models
            .insert(schema.name().to_string(), Arc::clone(&schema));

        Ok(schema)
    }

    /// Chaining variant of `register`.
    pub fn with(mut self, descriptor: ModelDescriptor) -> Result<Self, Error> {
        self.register(descriptor)?;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> Registry {
        self.inner
    }
}
