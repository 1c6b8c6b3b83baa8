//! Lossless dump codec for Canopy key sets
//!
//! This crate persists a [`canopy_core::KeySet`] to a byte stream and
//! restores it, preserving:
//!
//! - key ordering and name uniqueness
//! - raw binary names and values (embedded newlines and NULs included)
//! - metadata content *and* the sharing relationships between metadata
//!   instances: entries shared by reference across keys are written once
//!   and re-linked on read
//!
//! The format is record-oriented: ASCII command lines frame raw binary
//! payloads whose lengths are stated up front, so no byte of payload is
//! ever scanned for delimiters.
//!
//! # Example
//!
//! ```
//! use canopy_core::{Key, KeySet};
//!
//! let mut key = Key::with_value(b"system/hosts", b"127.0.0.1");
//! key.set_meta(b"comment", b"loopback");
//! let set: KeySet = [key].into_iter().collect();
//!
//! let mut stream = Vec::new();
//! canopy_dump::serialize(&set, &mut stream)?;
//! let restored = canopy_dump::deserialize(&stream[..])?;
//! assert_eq!(restored, set);
//! # Ok::<(), canopy_dump::DumpError>(())
//! ```
//!
//! All failures are fatal for the call that produced them; see
//! [`DumpError`] for the taxonomy.

mod error;
mod format;
mod reader;
mod writer;

pub use error::{DumpError, Result};
pub use reader::{deserialize, deserialize_into, load};
pub use writer::{save, serialize};
