use crate::value::{Value, WireValue};

///
/// UpdateKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UpdateKind {
    Set,
    SetIfAbsent,
    Remove,
    NumericAdd,
    ListAppend,
    ListPrepend,
    SetAdd,
    SetDelete,
}

impl UpdateKind {
    /// Clause section the operation renders into.
    #[must_use]
    pub const fn section(self) -> UpdateSection {
        match self {
            Self::Set | Self::SetIfAbsent | Self::ListAppend | Self::ListPrepend => {
                UpdateSection::Set
            }
            Self::Remove => UpdateSection::Remove,
            Self::NumericAdd | Self::SetAdd => UpdateSection::Add,
            Self::SetDelete => UpdateSection::Delete,
        }
    }

    /// Emission rank inside a section: assignment, then increment/append,
    /// then set membership.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Self::Set | Self::SetIfAbsent | Self::Remove | Self::SetDelete => 0,
            Self::NumericAdd | Self::ListAppend | Self::ListPrepend => 1,
            Self::SetAdd => 2,
        }
    }

    #[must_use]
    pub const fn needs_operand(self) -> bool {
        !matches!(self, Self::Remove)
    }
}

///
/// UpdateSection
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum UpdateSection {
    Set,
    Remove,
    Add,
    Delete,
}

impl UpdateSection {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Remove => "REMOVE",
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }
}

///
/// Operand
///
/// `Sealed` carries an envelope produced by the encryption subsystem and
/// is the only operand an encrypted attribute accepts.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Native(Value),
    Sealed(WireValue),
}

///
/// UpdateOperation
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateOperation {
    pub path: String,
    pub kind: UpdateKind,
    pub operand: Option<Operand>,
}

impl UpdateOperation {
    #[must_use]
    pub fn new(path: impl Into<String>, kind: UpdateKind, operand: Option<Operand>) -> Self {
        Self {
            path: path.into(),
            kind,
            operand,
        }
    }

    fn native(path: impl Into<String>, kind: UpdateKind, value: impl Into<Value>) -> Self {
        Self::new(path, kind, Some(Operand::Native(value.into())))
    }

    #[must_use]
    pub fn set(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::native(path, UpdateKind::Set, value)
    }

    #[must_use]
    pub fn set_if_absent(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::native(path, UpdateKind::SetIfAbsent, value)
    }

    /// Assign an already-sealed envelope to an encrypted attribute.
    #[must_use]
    pub fn set_sealed(path: impl Into<String>, envelope: WireValue) -> Self {
        Self::new(path, UpdateKind::Set, Some(Operand::Sealed(envelope)))
    }

    #[must_use]
    pub fn remove(path: impl Into<String>) -> Self {
        Self::new(path, UpdateKind::Remove, None)
    }

    #[must_use]
    pub fn add(path: impl Into<String>, delta: impl Into<Value>) -> Self {
        Self::native(path, UpdateKind::NumericAdd, delta)
    }

    #[must_use]
    pub fn append(path: impl Into<String>, items: Vec<Value>) -> Self {
        Self::native(path, UpdateKind::ListAppend, Value::List(items))
    }

    #[must_use]
    pub fn prepend(path: impl Into<String>, items: Vec<Value>) -> Self {
        Self::native(path, UpdateKind::ListPrepend, Value::List(items))
    }

    #[must_use]
    pub fn set_add(path: impl Into<String>, members: impl Into<Value>) -> Self {
        Self::native(path, UpdateKind::SetAdd, members)
    }

    #[must_use]
    pub fn set_delete(path: impl Into<String>, members: impl Into<Value>) -> Self {
        Self::native(path, UpdateKind::SetDelete, members)
    }
}
