//! Hierarchical key/value namespace for Canopy
//!
//! This crate provides the in-memory configuration tree the rest of the
//! workspace operates on:
//!
//! - **[`Key`]**: a named entry carrying a raw binary value and ordered
//!   metadata
//! - **[`MetaEntry`]**: an immutable metadata pair, shared across keys by
//!   reference (flyweight; sameness is instance identity, not content)
//! - **[`KeySet`]**: an ordered, name-unique collection of keys
//!
//! Names and values are opaque byte strings throughout; nothing here
//! validates configuration semantics. Persistence lives in `canopy-dump`.

mod key;
mod keyset;
mod meta;

pub use key::Key;
pub use keyset::KeySet;
pub use meta::MetaEntry;
