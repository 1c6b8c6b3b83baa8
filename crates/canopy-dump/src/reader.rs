//! Dump reader: byte stream → key set.
//!
//! Records are dispatched through a small state machine. Command lines are
//! ASCII and read up to the terminator; payloads are read by exact length
//! into reused scratch buffers, so payload bytes are never inspected for
//! delimiters. A metadata reference is resolved by name against the keys
//! already appended to the target; the writer only ever references a
//! first-seen location, which by construction precedes all its users in
//! the stream.
//!
//! Any deviation from the format is a hard error; the reader never skips a
//! record or resynchronises, and a failed call leaves the target set in an
//! unspecified partial state the caller must discard.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use canopy_core::{Key, KeySet};
use tracing::{debug, trace};

use crate::error::{DumpError, Result};
use crate::format;

/// The size record's count is an untrusted hint; cap what it can make us
/// preallocate.
const MAX_RESERVE_HINT: usize = 4096;

/// Reader states. At most one key is ever under construction; the
/// `Building` variant owns it, so that invariant is structural rather than
/// a nullable slot.
enum State {
    /// Nothing consumed yet; the header record is expected.
    Start,
    /// Header verified; the collection-size record is expected.
    Opened,
    /// Between keys.
    Idle,
    /// Assembling the key begun by the last `keyNew`.
    Building(Key),
}

/// Deserialize a stream into a fresh key set.
pub fn deserialize<R: BufRead>(source: R) -> Result<KeySet> {
    let mut set = KeySet::new();
    deserialize_into(source, &mut set)?;
    Ok(set)
}

/// Deserialize a stream into `target`.
///
/// The target is cleared when the collection-size record arrives, which is
/// after the header has been verified, so a version mismatch leaves
/// the target's prior content untouched. On any other error the target may
/// hold a partial result and must be treated as unusable.
pub fn deserialize_into<R: BufRead>(mut source: R, target: &mut KeySet) -> Result<()> {
    let mut line = Vec::new();
    let mut name_buf = Vec::new();
    let mut value_buf = Vec::new();
    let mut state = State::Start;

    loop {
        line.clear();
        if source.read_until(format::TERMINATOR, &mut line)? == 0 {
            return Err(DumpError::Truncated {
                context: "next record header".into(),
            });
        }
        if line.last() == Some(&format::TERMINATOR) {
            line.pop();
        }

        let mut fields = line.split(|&b| b == b' ');
        let token = fields.next().unwrap_or_default();
        let command = std::str::from_utf8(token)
            .map_err(|_| DumpError::UnknownCommand(lossy(token)))?;

        state = match (command, state) {
            (format::HEADER, State::Start) => {
                let version = fields.next().ok_or_else(|| DumpError::Malformed {
                    command: command.to_string(),
                    detail: "missing version token".into(),
                })?;
                if version != format::VERSION.as_bytes() {
                    return Err(DumpError::UnsupportedVersion(lossy(version)));
                }
                State::Opened
            }
            (format::SET_NEW, State::Opened) => {
                let count = parse_count(command, fields.next(), "key count")?;
                target.clear();
                target.reserve(count.min(MAX_RESERVE_HINT));
                trace!(count, "collection begins");
                State::Idle
            }
            (format::KEY_NEW, State::Idle) => {
                let name_len = parse_count(command, fields.next(), "name length")?;
                let value_len = parse_count(command, fields.next(), "value length")?;
                read_payload(&mut source, &mut name_buf, name_len, "key name")?;
                read_payload(&mut source, &mut value_buf, value_len, "key value")?;
                read_terminator(&mut source, command)?;
                State::Building(Key::with_value(&name_buf, &value_buf))
            }
            (format::KEY_META, State::Building(mut key)) => {
                let name_len = parse_count(command, fields.next(), "name length")?;
                let value_len = parse_count(command, fields.next(), "value length")?;
                read_payload(&mut source, &mut name_buf, name_len, "metadata name")?;
                read_payload(&mut source, &mut value_buf, value_len, "metadata value")?;
                read_terminator(&mut source, command)?;
                key.set_meta(&name_buf, &value_buf);
                State::Building(key)
            }
            (format::KEY_COPY_META, State::Building(mut key)) => {
                let owner_len = parse_count(command, fields.next(), "owner name length")?;
                let meta_len = parse_count(command, fields.next(), "metadata name length")?;
                read_payload(&mut source, &mut name_buf, owner_len, "owner key name")?;
                read_payload(&mut source, &mut value_buf, meta_len, "metadata name")?;
                read_terminator(&mut source, command)?;
                let owner =
                    target
                        .lookup(&name_buf)
                        .ok_or_else(|| DumpError::DanglingReference {
                            key: lossy(&name_buf),
                            meta: lossy(&value_buf),
                        })?;
                if !key.copy_meta_from(owner, &value_buf) {
                    return Err(DumpError::DanglingReference {
                        key: lossy(&name_buf),
                        meta: lossy(&value_buf),
                    });
                }
                State::Building(key)
            }
            (format::KEY_END, State::Building(mut key)) => {
                key.mark_synced();
                trace!(key = %key, "key complete");
                target.append(key);
                State::Idle
            }
            (format::SET_END, State::Idle) => {
                debug!(keys = target.len(), "deserialized key set");
                return Ok(());
            }
            (other, _) => return Err(DumpError::UnknownCommand(other.to_string())),
        };
    }
}

/// Deserialize a key set from a file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<KeySet> {
    let path = path.as_ref();
    let set = deserialize(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), keys = set.len(), "loaded key set");
    Ok(set)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parse one decimal length/count field from a command line.
fn parse_count(command: &str, field: Option<&[u8]>, what: &str) -> Result<usize> {
    let raw = field.ok_or_else(|| DumpError::Malformed {
        command: command.to_string(),
        detail: format!("missing {what}"),
    })?;
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| DumpError::Malformed {
            command: command.to_string(),
            detail: format!("invalid {what} `{}`", String::from_utf8_lossy(raw)),
        })
}

/// Read exactly `len` payload bytes into `buf`, growing it as needed.
fn read_payload<R: BufRead>(
    source: &mut R,
    buf: &mut Vec<u8>,
    len: usize,
    what: &str,
) -> Result<()> {
    buf.resize(len, 0);
    source.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DumpError::Truncated {
                context: format!("{what} ({len} bytes)"),
            }
        } else {
            DumpError::Io(err)
        }
    })
}

/// Consume the single terminator byte that follows every payload.
fn read_terminator<R: BufRead>(source: &mut R, command: &str) -> Result<()> {
    let mut byte = [0u8; 1];
    source.read_exact(&mut byte).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DumpError::Truncated {
                context: "record terminator".into(),
            }
        } else {
            DumpError::Io(err)
        }
    })?;
    if byte[0] != format::TERMINATOR {
        return Err(DumpError::Malformed {
            command: command.to_string(),
            detail: "payload is not followed by a record terminator".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use canopy_core::Key;

    #[test]
    fn rejects_unsupported_version() {
        let err = deserialize(&b"kdbOpen 2\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::UnsupportedVersion(v) if v == "2");
    }

    #[test]
    fn version_mismatch_leaves_target_untouched() {
        let mut target: KeySet = [Key::with_value(b"user/kept", b"v")].into_iter().collect();
        let err = deserialize_into(&b"kdbOpen 9\n"[..], &mut target).unwrap_err();

        assert_matches!(err, DumpError::UnsupportedVersion(_));
        assert_eq!(target.len(), 1);
        assert!(target.lookup(b"user/kept").is_some());
    }

    #[test]
    fn rejects_unknown_command() {
        let err = deserialize(&b"kdbOpen 1\nksNew 0\nbogus\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::UnknownCommand(c) if c == "bogus");
    }

    #[test]
    fn rejects_known_command_in_wrong_state() {
        // keyMeta outside a keyNew..keyEnd block is not valid.
        let err = deserialize(&b"kdbOpen 1\nksNew 0\nkeyMeta 1 1\nmx\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::UnknownCommand(c) if c == "keyMeta");

        // Header must come first.
        let err = deserialize(&b"ksNew 0\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::UnknownCommand(c) if c == "ksNew");
    }

    #[test]
    fn truncated_payload_is_reported() {
        // Declares 10 name bytes but the stream ends after 3.
        let err = deserialize(&b"kdbOpen 1\nksNew 1\nkeyNew 10 0\nabc"[..]).unwrap_err();
        assert_matches!(err, DumpError::Truncated { .. });
    }

    #[test]
    fn missing_trailer_is_reported() {
        let err = deserialize(&b"kdbOpen 1\nksNew 0\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::Truncated { .. });
    }

    #[test]
    fn empty_stream_is_reported() {
        let err = deserialize(&b""[..]).unwrap_err();
        assert_matches!(err, DumpError::Truncated { .. });
    }

    #[test]
    fn payload_without_terminator_is_malformed() {
        // Value length lies: 1 byte declared, 2 present, so the terminator
        // slot holds `1` instead of a newline.
        let err = deserialize(&b"kdbOpen 1\nksNew 1\nkeyNew 3 1\na/bv1\nkeyEnd\nksEnd\n"[..])
            .unwrap_err();
        assert_matches!(err, DumpError::Malformed { command, .. } if command == "keyNew");
    }

    #[test]
    fn bad_length_field_is_malformed() {
        let err = deserialize(&b"kdbOpen 1\nksNew 1\nkeyNew x 0\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::Malformed { command, .. } if command == "keyNew");

        let err = deserialize(&b"kdbOpen 1\nksNew 1\nkeyNew 3\n"[..]).unwrap_err();
        assert_matches!(err, DumpError::Malformed { command, .. } if command == "keyNew");
    }

    #[test]
    fn reference_to_unknown_key_is_dangling() {
        let stream =
            b"kdbOpen 1\nksNew 1\nkeyNew 3 0\nu/a\nkeyCopyMeta 5 4\nu/ghomode\nkeyEnd\nksEnd\n";
        let err = deserialize(&stream[..]).unwrap_err();
        assert_matches!(err, DumpError::DanglingReference { key, .. } if key == "u/gho");
    }

    #[test]
    fn reference_to_missing_metadata_name_is_dangling() {
        // u/a exists but carries no metadata named `mode`.
        let stream = b"kdbOpen 1\nksNew 2\nkeyNew 3 0\nu/a\nkeyEnd\nkeyNew 3 0\nu/b\nkeyCopyMeta 3 4\nu/amode\nkeyEnd\nksEnd\n";
        let err = deserialize(&stream[..]).unwrap_err();
        assert_matches!(
            err,
            DumpError::DanglingReference { key, meta } if key == "u/a" && meta == "mode"
        );
    }

    #[test]
    fn restored_keys_are_marked_synced() {
        let set = deserialize(&b"kdbOpen 1\nksNew 1\nkeyNew 3 2\na/bv1\nkeyEnd\nksEnd\n"[..])
            .unwrap();
        let key = set.lookup(b"a/b").unwrap();
        assert!(key.is_synced());
        assert_eq!(key.value(), b"v1");
    }

    #[test]
    fn size_record_clears_previous_content() {
        let mut target: KeySet = [Key::new(b"user/old")].into_iter().collect();
        deserialize_into(
            &b"kdbOpen 1\nksNew 1\nkeyNew 3 0\nu/a\nkeyEnd\nksEnd\n"[..],
            &mut target,
        )
        .unwrap();

        assert_eq!(target.len(), 1);
        assert!(target.lookup(b"user/old").is_none());
        assert!(target.lookup(b"u/a").is_some());
    }
}
