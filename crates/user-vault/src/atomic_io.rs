//! Atomic record file writes.
//!
//! Record flushes go through a temporary file in the store directory followed
//! by a rename, so a crash mid-write never leaves a truncated record behind.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes `contents` to `file_name` inside `dir` atomically.
///
/// The temporary file name is hidden and unique per process, timestamp and
/// call, so concurrent stores sharing a directory cannot collide on it. The
/// temp file is synced before the rename and removed on any failure.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(".{file_name}.tmp.{}.{stamp}.{counter}", std::process::id());

    if let Err(err) = write_temp_file(dir, &tmp_name, contents) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }

    if let Err(err) = rename_over(dir, &tmp_name, file_name) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }

    // Best-effort directory sync; the rename itself already succeeded.
    drop(dir.open(".").and_then(|handle| handle.sync_all()));

    Ok(())
}

fn write_temp_file(dir: &Dir, tmp_name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(windows)]
fn rename_over(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists, so remove it first.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn rename_over(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp_dir(dir: &tempfile::TempDir) -> Dir {
        Dir::open_ambient_dir(dir.path(), cap_std::ambient_authority()).expect("dir opens")
    }

    #[test]
    fn writes_fresh_file() {
        let workspace = tempfile::tempdir().expect("temp dir");
        let dir = open_temp_dir(&workspace);

        write_atomic(&dir, "7.json", "{\"gems\": 1}\n").expect("write succeeds");

        let contents = dir.read_to_string("7.json").expect("file reads");
        assert_eq!(contents, "{\"gems\": 1}\n");
    }

    #[test]
    fn replaces_existing_file_and_leaves_no_temp_behind() {
        let workspace = tempfile::tempdir().expect("temp dir");
        let dir = open_temp_dir(&workspace);

        write_atomic(&dir, "7.json", "first").expect("first write");
        write_atomic(&dir, "7.json", "second").expect("second write");

        let contents = dir.read_to_string("7.json").expect("file reads");
        assert_eq!(contents, "second");

        let names: Vec<_> = std::fs::read_dir(workspace.path())
            .expect("dir listing")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("7.json")]);
    }
}
