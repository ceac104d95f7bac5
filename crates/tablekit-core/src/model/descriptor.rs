use crate::model::{AttributeSpec, IndexSpec};
use tablekit_utils::case::{camel_case, snake_case};

///
/// NamingConvention
///
/// Derives stored attribute names from logical names.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NamingConvention {
    #[default]
    Verbatim,
    CamelCase,
    SnakeCase,
}

impl NamingConvention {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Verbatim => name.to_string(),
            Self::CamelCase => camel_case(name),
            Self::SnakeCase => snake_case(name),
        }
    }
}

///
/// Shape
///
/// Named attribute group. Used either as the nested record shape of a
/// document attribute or as a fragment included into a model.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    name: String,
    attributes: Vec<AttributeSpec>,
}

impl Shape {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes
            .iter()
            .find(|attr| attr.name() == name || attr.stored_name() == name)
    }
}

///
/// ModelDescriptor
///
/// Unvalidated model declaration handed to registration.
///

#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub(crate) name: String,
    pub(crate) table: Option<String>,
    pub(crate) naming: NamingConvention,
    pub(crate) attributes: Vec<AttributeSpec>,
    pub(crate) includes: Vec<Shape>,
    pub(crate) indexes: Vec<IndexSpec>,
}

impl ModelDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            naming: NamingConvention::default(),
            attributes: Vec::new(),
            includes: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Override the table name; defaults to the model name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub const fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Append a fragment's attributes after the model's own.
    #[must_use]
    pub fn include(mut self, fragment: &Shape) -> Self {
        self.includes.push(fragment.clone());
        self
    }

    #[must_use]
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }
}
