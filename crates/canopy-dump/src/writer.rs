//! Dump writer: key set → byte stream.
//!
//! A single pass over the set emits the header, the size record, and one
//! `keyNew .. keyEnd` block per key. Metadata dedup works on instance
//! identity: the first sighting of a shared entry writes its payload and
//! remembers where it was defined; every later sighting writes a by-name
//! reference to that first location instead. The dedup table lives only for
//! the duration of one call.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use canopy_core::KeySet;
use tracing::{debug, trace};

use crate::error::Result;
use crate::format;

/// Where a shared metadata instance was first written: the defining key's
/// name and the metadata name under that key.
struct MetaLocation {
    key: Box<[u8]>,
    meta: Box<[u8]>,
}

/// Serialize a key set to a byte sink.
///
/// The output reconstructs, via [`deserialize`](crate::deserialize), a set
/// with identical keys, ordering, values, and metadata content, including
/// the sharing relationships between metadata instances. Fails only when
/// the sink refuses bytes; key and value content cannot make it fail.
pub fn serialize<W: Write>(set: &KeySet, mut out: W) -> Result<()> {
    writeln!(out, "{} {}", format::HEADER, format::VERSION)?;
    writeln!(out, "{} {}", format::SET_NEW, set.len())?;

    // Keyed on the instance's address, stable for the lifetime of this
    // call's borrow of the set.
    let mut seen: HashMap<usize, MetaLocation> = HashMap::new();

    for key in set.iter() {
        trace!(key = %key, meta = key.meta_len(), "writing key");
        writeln!(
            out,
            "{} {} {}",
            format::KEY_NEW,
            key.name().len(),
            key.value().len()
        )?;
        out.write_all(key.name())?;
        out.write_all(key.value())?;
        out.write_all(&[format::TERMINATOR])?;

        for meta in key.meta_iter() {
            match seen.entry(Arc::as_ptr(meta) as usize) {
                Entry::Vacant(slot) => {
                    writeln!(
                        out,
                        "{} {} {}",
                        format::KEY_META,
                        meta.name().len(),
                        meta.value().len()
                    )?;
                    out.write_all(meta.name())?;
                    out.write_all(meta.value())?;
                    out.write_all(&[format::TERMINATOR])?;
                    slot.insert(MetaLocation {
                        key: key.name().into(),
                        meta: meta.name().into(),
                    });
                }
                Entry::Occupied(slot) => {
                    let location = slot.get();
                    writeln!(
                        out,
                        "{} {} {}",
                        format::KEY_COPY_META,
                        location.key.len(),
                        location.meta.len()
                    )?;
                    out.write_all(&location.key)?;
                    out.write_all(&location.meta)?;
                    out.write_all(&[format::TERMINATOR])?;
                }
            }
        }

        writeln!(out, "{}", format::KEY_END)?;
    }
    writeln!(out, "{}", format::SET_END)?;

    debug!(keys = set.len(), shared = seen.len(), "serialized key set");
    Ok(())
}

/// Serialize a key set to a file, creating or truncating it.
pub fn save<P: AsRef<Path>>(path: P, set: &KeySet) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    serialize(set, &mut out)?;
    out.flush()?;
    debug!(path = %path.display(), keys = set.len(), "saved key set");
    Ok(())
}
