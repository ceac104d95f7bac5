mod attribute;
mod descriptor;
mod index;
mod registry;
mod schema;


pub use attribute::{AttributeFlags, AttributeKind, AttributeRole, AttributeSpec};
pub use descriptor::{ModelDescriptor, NamingConvention, Shape};
pub use index::{IndexKind, IndexSpec, Projection};
pub use registry::{Registry, RegistryBuilder};
pub use schema::ModelSchema;
