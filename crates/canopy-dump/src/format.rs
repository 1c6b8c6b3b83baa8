//! Shared framing vocabulary for the dump wire format.
//!
//! A stream is a sequence of records. Each record starts with an ASCII
//! command line (`\n`-terminated); commands that carry payloads state the
//! exact byte count of every variable-length field on that line, followed
//! by the raw bytes and a single `\n` terminator. Payload bytes are opaque
//! (they may contain newlines, NULs, or text that looks like a command)
//! and are never scanned for delimiters.
//!
//! ```text
//! kdbOpen 1
//! ksNew <count>
//! keyNew <nameLen> <valueLen>
//! <name bytes><value bytes>\n
//! keyMeta <metaNameLen> <metaValueLen>
//! <name bytes><value bytes>\n
//! keyCopyMeta <ownerNameLen> <metaNameLen>
//! <owner name bytes><meta name bytes>\n
//! keyEnd
//! ksEnd
//! ```

/// Stream header command; carries the format version token.
pub(crate) const HEADER: &str = "kdbOpen";

/// Format version this codec reads and writes.
pub(crate) const VERSION: &str = "1";

/// Collection-size record; the count is a capacity hint, not a contract.
pub(crate) const SET_NEW: &str = "ksNew";

/// Begin-key record: `(nameLen, valueLen)` plus payload.
pub(crate) const KEY_NEW: &str = "keyNew";

/// Define-metadata record: `(metaNameLen, metaValueLen)` plus payload.
pub(crate) const KEY_META: &str = "keyMeta";

/// Reference-metadata record: `(ownerNameLen, metaNameLen)` plus the owner
/// key name and metadata name of a previously defined entry.
pub(crate) const KEY_COPY_META: &str = "keyCopyMeta";

/// End-key record; no payload.
pub(crate) const KEY_END: &str = "keyEnd";

/// End-collection trailer; no payload.
pub(crate) const SET_END: &str = "ksEnd";

/// Record terminator following every payload and command line.
pub(crate) const TERMINATOR: u8 = b'\n';
