//! Crash-safe file replacement inside a capability directory.

use std::io::{self, ErrorKind, Write};

use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::{Dir, File};

/// Name of the scratch file used while replacing `file_name`.
pub(crate) fn temp_name(file_name: &str) -> String {
    format!(".{file_name}.tmp")
}

/// Replaces `file_name` in `dir` with `contents`.
///
/// The data is written and synced to a sibling temporary file which is then
/// renamed over the target, so readers see either the old or the new file.
/// When `private` is set the file is readable by the owner only, from the
/// moment it is created.
pub(crate) fn write_atomically(
    dir: &Dir,
    file_name: &str,
    contents: &[u8],
    private: bool,
) -> io::Result<()> {
    let scratch = temp_name(file_name);
    let mut file = open_scratch(dir, &scratch, private)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    dir.rename(&scratch, dir, file_name)
}

/// Creates a fresh scratch file, removing any left behind by a crash so its
/// permissions cannot leak into the new one.
fn open_scratch(dir: &Dir, scratch: &str, private: bool) -> io::Result<File> {
    match dir.remove_file(scratch) {
        Ok(()) => {}
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    if private {
        use cap_std::fs::OpenOptionsExt;

        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = private;

    dir.open_with(scratch, &options)
}

#[cfg(test)]
mod tests {
    use cap_std::ambient_authority;
    use cap_std::fs_utf8::Dir;
    use tempfile::TempDir;

    use super::{open_scratch, temp_name, write_atomically};

    #[test]
    fn replaces_existing_file_and_removes_scratch() {
        let temp = TempDir::new().expect("temp dir");
        let dir = Dir::open_ambient_dir(
            temp.path().to_str().expect("utf-8 temp path"),
            ambient_authority(),
        )
        .expect("open temp dir");
        dir.write("state.json", "old").expect("seed file");

        write_atomically(&dir, "state.json", b"new", false).expect("write should succeed");

        assert_eq!(dir.read_to_string("state.json").expect("read"), "new");
        assert!(!dir.exists(temp_name("state.json")));
    }

    #[cfg(unix)]
    #[test]
    fn private_files_are_owner_only() {
        use cap_std::fs::PermissionsExt;

        let temp = TempDir::new().expect("temp dir");
        let dir = Dir::open_ambient_dir(
            temp.path().to_str().expect("utf-8 temp path"),
            ambient_authority(),
        )
        .expect("open temp dir");

        write_atomically(&dir, "secrets.json", b"{}", true).expect("write should succeed");

        let mode = dir
            .metadata("secrets.json")
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn private_scratch_is_owner_only_before_any_write() {
        use cap_std::fs::PermissionsExt;

        let temp = TempDir::new().expect("temp dir");
        let dir = Dir::open_ambient_dir(
            temp.path().to_str().expect("utf-8 temp path"),
            ambient_authority(),
        )
        .expect("open temp dir");
        let scratch = temp_name("credentials.json");
        dir.write(&scratch, "left over").expect("seed stale scratch");
        let mut loose = dir.metadata(&scratch).expect("metadata").permissions();
        loose.set_mode(0o644);
        dir.set_permissions(&scratch, loose).expect("loosen stale scratch");

        let file = open_scratch(&dir, &scratch, true).expect("scratch should open");

        let mode = file.metadata().expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(file.metadata().expect("metadata").len(), 0);
    }
}
