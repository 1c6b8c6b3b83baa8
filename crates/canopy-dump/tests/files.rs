//! File-backed save/load entry points.

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use assert_matches::assert_matches;
use canopy_core::{Key, KeySet};
use canopy_dump::{load, save, DumpError};

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mounts.dump");

    let mut root = Key::with_value(b"system/mounts/root", b"/dev/sda1");
    root.set_meta(b"fstype", b"ext4");
    let set: KeySet = [Key::new(b"system/mounts"), root].into_iter().collect();

    save(&path, &set).expect("save");
    let restored = load(&path).expect("load");
    assert_eq!(restored, set);
}

#[test]
fn save_truncates_previous_content() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.dump");

    let large: KeySet = (0..16)
        .map(|i| Key::with_value(format!("user/key/{i}").as_bytes(), b"some longer value"))
        .collect();
    save(&path, &large).expect("first save");

    let small: KeySet = [Key::new(b"user/only")].into_iter().collect();
    save(&path, &small).expect("second save");

    assert_eq!(load(&path).expect("load"), small);
}

#[test]
fn load_of_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load(dir.path().join("absent.dump")).unwrap_err();
    assert_matches!(err, DumpError::Io(_));
}
