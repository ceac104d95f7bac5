use crate::{
    error::Error,
    model::{AttributeKind, AttributeSpec, ModelSchema},
};
use std::{fmt, str::FromStr};

/// Longest attribute name the store accepts.
pub const MAX_ATTRIBUTE_NAME_LEN: usize = 255;

/// Attribute identifiers: `[A-Za-z0-9_-]+`, bounded length.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ATTRIBUTE_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

///
/// DocumentPath
///
/// `attribute` or `attribute[index]`, parsed structurally. The only text
/// ever emitted for a path is a name placeholder plus an optional decimal
/// subscript.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DocumentPath {
    attribute: String,
    index: Option<u32>,
}

impl DocumentPath {
    #[must_use]
    pub fn attribute_only(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            index: None,
        }
    }

    /// Parse `name` or `name[digits]`. Everything else is rejected.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let reject = |why: &str| Error::invalid_operator(format!("invalid document path: {why}"));

        let (name, index) = match text.find('[') {
            None => (text, None),
            Some(open) => {
                let Some(inner) = text[open + 1..].strip_suffix(']') else {
                    return Err(reject("subscript must close the path"));
                };
                if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(reject("subscript must be a non-negative integer"));
                }
                let index = inner
                    .parse::<u32>()
                    .map_err(|_| reject("subscript out of range"))?;

                (&text[..open], Some(index))
            }
        };

        if !is_identifier(name) {
            return Err(reject("attribute name must match [A-Za-z0-9_-]+"));
        }

        Ok(Self {
            attribute: name.to_string(),
            index,
        })
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub const fn index(&self) -> Option<u32> {
        self.index
    }

    /// Resolve against a schema. Subscripts are only valid on list
    /// attributes.
    pub fn resolve<'s>(&self, schema: &'s ModelSchema) -> Result<&'s AttributeSpec, Error> {
        let attr = schema
            .attribute(&self.attribute)
            .ok_or_else(|| Error::unknown_attribute(schema.name(), &self.attribute))?;

        if self.index.is_some() && attr.kind() != AttributeKind::List {
            return Err(Error::invalid_operator(format!(
                "attribute '{}' is not a list and cannot be subscripted",
                attr.name()
            )));
        }

        Ok(attr)
    }

    /// Same path, same attribute, or one path contains the other.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.attribute == other.attribute
            && (self.index.is_none() || other.index.is_none() || self.index == other.index)
    }
}

impl FromStr for DocumentPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.attribute),
            None => f.write_str(&self.attribute),
        }
    }
}
