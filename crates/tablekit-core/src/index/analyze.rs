use crate::expr::{Condition, ConditionOp, DocumentPath};

///
/// SortKeyOp
///
/// Operator class of a sort-key condition, best first.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SortKeyOp {
    Equality,
    Prefix,
    Range,
}

impl SortKeyOp {
    /// Class of a condition operator, if it can address a sort key at all.
    #[must_use]
    pub const fn classify(op: ConditionOp) -> Option<Self> {
        match op {
            ConditionOp::Eq => Some(Self::Equality),
            ConditionOp::BeginsWith => Some(Self::Prefix),
            ConditionOp::Lt
            | ConditionOp::Le
            | ConditionOp::Gt
            | ConditionOp::Ge
            | ConditionOp::Between => Some(Self::Range),
            _ => None,
        }
    }
}

///
/// SortKeyCondition
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortKeyCondition {
    pub attribute: String,
    pub op: SortKeyOp,
}

///
/// RequiredKeys
///
/// Key attributes a query's conditions can drive.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequiredKeys {
    pub partition_key: Option<String>,
    pub sort_key: Option<SortKeyCondition>,
}

impl RequiredKeys {
    #[must_use]
    pub fn partition(attribute: impl Into<String>) -> Self {
        Self {
            partition_key: Some(attribute.into()),
            sort_key: None,
        }
    }

    #[must_use]
    pub fn with_sort(mut self, attribute: impl Into<String>, op: SortKeyOp) -> Self {
        self.sort_key = Some(SortKeyCondition {
            attribute: attribute.into(),
            op,
        });
        self
    }
}

/// Derive key requirements from a query's conditions.
///
/// The first equality becomes the partition key. The sort key is the first
/// later condition on another attribute, or failing that the first earlier
/// one. Element paths and operators no key condition accepts never qualify.
#[must_use]
pub fn analyze_conditions(conditions: &[Condition]) -> RequiredKeys {
    let candidates: Vec<(&str, ConditionOp)> = conditions
        .iter()
        .filter_map(|c| {
            let path = DocumentPath::parse(&c.path).ok()?;
            path.index().is_none().then_some((c.path.as_str(), c.op))
        })
        .collect();

    let Some(pk_pos) = candidates.iter().position(|(_, op)| *op == ConditionOp::Eq) else {
        return RequiredKeys::default();
    };
    let partition_key = candidates[pk_pos].0;

    let sort_from = |range: &[(&str, ConditionOp)]| {
        range.iter().find_map(|(attribute, op)| {
            if *attribute == partition_key {
                return None;
            }
            SortKeyOp::classify(*op).map(|op| SortKeyCondition {
                attribute: (*attribute).to_string(),
                op,
            })
        })
    };

    let sort_key =
        sort_from(&candidates[pk_pos + 1..]).or_else(|| sort_from(&candidates[..pk_pos]));

    RequiredKeys {
        partition_key: Some(partition_key.to_string()),
        sort_key,
    }
}

