///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexKind {
    Global,
    Local,
    /// The table's own key. Never declared, only offered to the selector.
    Primary,
}

///
/// Projection
///
/// Attributes a secondary index stores alongside its keys.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Projection {
    #[default]
    All,
    KeysOnly,
    Include(Vec<String>),
}

///
/// IndexSpec
///
/// Descriptive only; carries no runtime state.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexSpec {
    pub(crate) name: String,
    pub(crate) kind: IndexKind,
    pub(crate) partition_key: String,
    pub(crate) sort_key: Option<String>,
    pub(crate) projection: Projection,
}

impl IndexSpec {
    #[must_use]
    pub fn global(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::Global,
            partition_key: partition_key.into(),
            sort_key: None,
            projection: Projection::All,
        }
    }

    /// A local index shares the table partition key; registration checks
    /// that `partition_key` names it.
    #[must_use]
    pub fn local(
        name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: IndexKind::Local,
            partition_key: partition_key.into(),
            sort_key: Some(sort_key.into()),
            projection: Projection::All,
        }
    }

    /// The base table's key as an index candidate.
    #[must_use]
    pub(crate) fn primary(partition_key: &str, sort_key: Option<&str>) -> Self {
        Self {
            name: String::new(),
            kind: IndexKind::Primary,
            partition_key: partition_key.to_string(),
            sort_key: sort_key.map(str::to_string),
            projection: Projection::All,
        }
    }

    #[must_use]
    pub fn sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    #[must_use]
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> IndexKind {
        self.kind
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.kind == IndexKind::Primary
    }

    #[must_use]
    pub fn partition_key_name(&self) -> &str {
        &self.partition_key
    }

    #[must_use]
    pub fn sort_key_name(&self) -> Option<&str> {
        self.sort_key.as_deref()
    }

    #[must_use]
    pub const fn projection_mode(&self) -> &Projection {
        &self.projection
    }

    /// Attribute names this index is keyed on.
    pub fn key_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }
}
