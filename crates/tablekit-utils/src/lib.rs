//! Small shared helpers for TableKit crates.

pub mod case;
