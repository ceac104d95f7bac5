use crate::value::WireValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

///
/// ExpressionComponents
///
/// Compiled expression text plus the shared placeholder tables. Handed to
/// the transport exactly once.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExpressionComponents {
    pub key_condition: Option<String>,
    pub filter: Option<String>,
    pub condition: Option<String>,
    pub update: Option<String>,
    pub projection: Option<String>,

    /// `#nK` -> stored attribute name.
    pub names: BTreeMap<String, String>,

    /// `:vK` -> wire value.
    pub values: BTreeMap<String, WireValue>,
}

impl ExpressionComponents {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.key_condition.is_none()
            && self.filter.is_none()
            && self.condition.is_none()
            && self.update.is_none()
            && self.projection.is_none()
    }

    /// Stable SHA-256 digest over every section and both tables.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        for (tag, section) in [
            (0x01, &self.key_condition),
            (0x02, &self.filter),
            (0x03, &self.condition),
            (0x04, &self.update),
            (0x05, &self.projection),
        ] {
            write_tag(&mut hasher, tag);
            match section {
                Some(text) => write_str(&mut hasher, text),
                None => write_tag(&mut hasher, 0x00),
            }
        }

        write_tag(&mut hasher, 0x10);
        write_len_u32(&mut hasher, self.names.len());
        for (placeholder, name) in &self.names {
            write_str(&mut hasher, placeholder);
            write_str(&mut hasher, name);
        }

        write_tag(&mut hasher, 0x11);
        write_len_u32(&mut hasher, self.values.len());
        for (placeholder, value) in &self.values {
            write_str(&mut hasher, placeholder);
            hash_wire(&mut hasher, value);
        }

        hasher.finalize().into()
    }
}

fn hash_wire(hasher: &mut Sha256, value: &WireValue) {
    match value {
        WireValue::Binary(bytes) => {
            write_tag(hasher, 0x21);
            write_bytes(hasher, bytes);
        }
        WireValue::BinarySet(set) => {
            write_tag(hasher, 0x22);
            write_len_u32(hasher, set.len());
            for bytes in set {
                write_bytes(hasher, bytes);
            }
        }
        WireValue::Bool(b) => {
            write_tag(hasher, 0x23);
            write_tag(hasher, u8::from(*b));
        }
        WireValue::Document(map) => {
            write_tag(hasher, 0x24);
            write_len_u32(hasher, map.len());
            for (k, v) in map {
                write_str(hasher, k);
                hash_wire(hasher, v);
            }
        }
        WireValue::List(items) => {
            write_tag(hasher, 0x25);
            write_len_u32(hasher, items.len());
            for item in items {
                hash_wire(hasher, item);
            }
        }
        WireValue::Null => write_tag(hasher, 0x26),
        WireValue::Number(n) => {
            write_tag(hasher, 0x27);
            write_str(hasher, n.as_str());
        }
        WireValue::NumberSet(set) => {
            write_tag(hasher, 0x28);
            write_len_u32(hasher, set.len());
            for n in set {
                write_str(hasher, n.as_str());
            }
        }
        WireValue::String(s) => {
            write_tag(hasher, 0x29);
            write_str(hasher, s);
        }
        WireValue::StringSet(set) => {
            write_tag(hasher, 0x2a);
            write_len_u32(hasher, set.len());
            for s in set {
                write_str(hasher, s);
            }
        }
    }
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

fn write_len_u32(hasher: &mut Sha256, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
}

fn write_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    write_len_u32(hasher, bytes.len());
    hasher.update(bytes);
}

fn write_str(hasher: &mut Sha256, value: &str) {
    write_bytes(hasher, value.as_bytes());
}
