//! Shared schemas for unit tests.

use crate::model::{
    AttributeKind, AttributeSpec, IndexSpec, ModelDescriptor, ModelSchema, Projection, Shape,
};

/// `{pk: ID, sk: Ver, Value: number, Note: string omit-if-empty}`
pub(crate) fn note_descriptor() -> ModelDescriptor {
    ModelDescriptor::new("Note")
        .attribute(AttributeSpec::string("ID").partition_key())
        .attribute(AttributeSpec::string("Ver").sort_key())
        .attribute(AttributeSpec::number("Value"))
        .attribute(AttributeSpec::string("Note").omit_if_empty())
}

pub(crate) fn note_schema() -> ModelSchema {
    ModelSchema::register(note_descriptor()).unwrap()
}

pub(crate) fn address_shape() -> Shape {
    Shape::new("Address")
        .attribute(AttributeSpec::string("Street"))
        .attribute(AttributeSpec::string("City").omit_if_empty())
}

/// Order model covering every attribute flavour plus three indexes.
pub(crate) fn order_descriptor() -> ModelDescriptor {
    ModelDescriptor::new("Order")
        .table("orders")
        .attribute(AttributeSpec::string("ID").partition_key())
        .attribute(AttributeSpec::string("CreatedAt").sort_key())
        .attribute(AttributeSpec::string("Customer"))
        .attribute(AttributeSpec::string("Status"))
        .attribute(AttributeSpec::number("Total"))
        .attribute(AttributeSpec::number("Revision").version())
        .attribute(AttributeSpec::number("ExpiresAt").ttl().omit_if_empty())
        .attribute(AttributeSpec::list("Items"))
        .attribute(AttributeSpec::new("Tags", AttributeKind::StringSet).omit_if_empty())
        .attribute(AttributeSpec::json("Meta").omit_if_empty())
        .attribute(AttributeSpec::binary("Avatar").omit_if_empty())
        .attribute(AttributeSpec::document("Address").shape(address_shape()))
        .attribute(AttributeSpec::document("Extra").omit_if_empty())
        .attribute(AttributeSpec::timestamp("ShippedAt").omit_if_empty())
        .attribute(AttributeSpec::boolean("Paid"))
        .attribute(AttributeSpec::string("Secret").encrypted().omit_if_empty())
        .index(IndexSpec::global("by-customer", "Customer").sort_key("CreatedAt"))
        .index(
            IndexSpec::global("by-status", "Status")
                .sort_key("Total")
                .projection(Projection::KeysOnly),
        )
        .index(IndexSpec::local("by-total", "ID", "Total"))
}

pub(crate) fn order_schema() -> ModelSchema {
    ModelSchema::register(order_descriptor()).unwrap()
}

/// Model with an encrypted attribute and nothing else of note.
pub(crate) fn vault_schema() -> ModelSchema {
    ModelSchema::register(
        ModelDescriptor::new("Vault")
            .attribute(AttributeSpec::string("ID").partition_key())
            .attribute(AttributeSpec::string("Secret").encrypted())
            .attribute(AttributeSpec::number("Score"))
            .attribute(AttributeSpec::new("Codes", AttributeKind::StringSet).encrypted())
            .attribute(AttributeSpec::list("Notes")),
    )
    .unwrap()
}
