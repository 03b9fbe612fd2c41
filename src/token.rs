//! Token-domain identifiers and binding records.

pub mod binding;
pub mod id;

pub use binding::*;
pub use id::*;
