//! ## Crate layout
//! - `core`: value model, schemas, marshal engine, envelope encryption,
//!   expression compiler, index selector, transport boundary.
//! - `config`: TOML engine configuration.
//!
//! `Engine` binds a registry, a transport and an optional key provider
//! once; `TableHandle` runs reads, writes and queries for one model.

pub use tablekit_config as config;
pub use tablekit_core as core;

mod engine;
mod query;
mod table;

pub use engine::{Engine, EngineBuilder};
pub use query::{Query, QueryPage};
pub use table::{BatchWrite, TableHandle, Transact};
pub use tablekit_core::error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{BatchWrite, Engine, Query, QueryPage, TableHandle, Transact};
    pub use tablekit_core::{
        crypto::{CallContext, CancelToken, KeyProvider},
        db::Transport,
        prelude::*,
    };
}
