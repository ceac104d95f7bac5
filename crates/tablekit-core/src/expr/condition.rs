use crate::{
    MAX_IN_OPERANDS,
    error::Error,
    value::{Value, WireKind},
};
use std::str::FromStr;

///
/// ConditionOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum ConditionOp {
    AttributeType,
    BeginsWith,
    Between,
    Contains,
    Eq,
    Exists,
    Ge,
    Gt,
    In,
    Le,
    Lt,
    Ne,
    NotExists,
}

impl ConditionOp {
    /// Operators a key condition may use.
    #[must_use]
    pub const fn is_key_capable(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Between | Self::BeginsWith
        )
    }

    /// Operand count range accepted by the operator.
    #[must_use]
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Exists | Self::NotExists => (0, 0),
            Self::Between => (2, 2),
            Self::In => (1, MAX_IN_OPERANDS),
            _ => (1, 1),
        }
    }
}

impl FromStr for ConditionOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" | "EQ" => Self::Eq,
            "!=" | "<>" | "NE" => Self::Ne,
            "<" | "LT" => Self::Lt,
            "<=" | "LE" => Self::Le,
            ">" | "GT" => Self::Gt,
            ">=" | "GE" => Self::Ge,
            "BETWEEN" => Self::Between,
            "IN" => Self::In,
            "BEGINS_WITH" => Self::BeginsWith,
            "CONTAINS" => Self::Contains,
            "EXISTS" | "ATTRIBUTE_EXISTS" => Self::Exists,
            "NOT_EXISTS" | "ATTRIBUTE_NOT_EXISTS" => Self::NotExists,
            "ATTRIBUTE_TYPE" => Self::AttributeType,
            _ => {
                return Err(Error::invalid_operator(format!(
                    "unsupported condition operator '{s}'"
                )));
            }
        };

        Ok(op)
    }
}

///
/// Condition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Condition {
    pub path: String,
    pub op: ConditionOp,
    pub operands: Vec<Value>,
}

impl Condition {
    fn new(path: impl Into<String>, op: ConditionOp, operands: Vec<Value>) -> Self {
        Self {
            path: path.into(),
            op,
            operands,
        }
    }

    /// Build from a textual operator, e.g. `Condition::parse("Age", ">=", [18])`.
    pub fn parse(
        path: impl Into<String>,
        op: &str,
        operands: impl IntoIterator<Item = Value>,
    ) -> Result<Self, Error> {
        let op = op.parse()?;

        Ok(Self::new(path, op, operands.into_iter().collect()))
    }

    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Eq, vec![value.into()])
    }

    #[must_use]
    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Ne, vec![value.into()])
    }

    #[must_use]
    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Lt, vec![value.into()])
    }

    #[must_use]
    pub fn le(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Le, vec![value.into()])
    }

    #[must_use]
    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Gt, vec![value.into()])
    }

    #[must_use]
    pub fn ge(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Ge, vec![value.into()])
    }

    #[must_use]
    pub fn between(
        path: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::new(path, ConditionOp::Between, vec![low.into(), high.into()])
    }

    #[must_use]
    pub fn in_(path: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(path, ConditionOp::In, values)
    }

    #[must_use]
    pub fn begins_with(path: impl Into<String>, prefix: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::BeginsWith, vec![prefix.into()])
    }

    #[must_use]
    pub fn contains(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(path, ConditionOp::Contains, vec![value.into()])
    }

    #[must_use]
    pub fn exists(path: impl Into<String>) -> Self {
        Self::new(path, ConditionOp::Exists, Vec::new())
    }

    #[must_use]
    pub fn not_exists(path: impl Into<String>) -> Self {
        Self::new(path, ConditionOp::NotExists, Vec::new())
    }

    #[must_use]
    pub fn attribute_type(path: impl Into<String>, kind: WireKind) -> Self {
        Self::new(
            path,
            ConditionOp::AttributeType,
            vec![Value::from(kind.descriptor())],
        )
    }
}

///
/// Filter
///
/// Boolean tree of conditions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    And(Vec<Self>),
    Condition(Condition),
    Not(Box<Self>),
    Or(Vec<Self>),
}

impl Filter {
    /// Conjunction of plain conditions.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::And(conditions.into_iter().map(Self::Condition).collect())
    }

    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or(conditions.into_iter().map(Self::Condition).collect())
    }

    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other.into());
                Self::And(children)
            }
            this => Self::And(vec![this, other.into()]),
        }
    }

    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(other.into());
                Self::Or(children)
            }
            this => Self::Or(vec![this, other.into()]),
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Every leaf condition, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Self::Condition(c) => out.push(c),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect(out);
                }
            }
            Self::Not(inner) => inner.collect(out),
        }
    }
}

impl From<Condition> for Filter {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}
