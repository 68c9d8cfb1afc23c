//! Data Directory Layout
//!
//! Everything the engine persists lives in one directory:
//!
//! ```text
//! <root>/.redigo/
//! ├── appendonly.aof        command log since the last snapshot
//! ├── snapshot.redigo.json  whole-database snapshot
//! └── indexes.redigo.json   reverse-index dump (non-authoritative)
//! ```
//!
//! `<root>` is the configured root path, or `$HOME` when none is set.
//! Resolution creates the directory (mode 0755) if it is missing and is
//! otherwise pure: the same inputs always give the same paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const AOF_FILENAME: &str = "appendonly.aof";
pub const SNAPSHOT_FILENAME: &str = "snapshot.redigo.json";
pub const INDEXES_FILENAME: &str = "indexes.redigo.json";
pub const DATA_DIR_NAME: &str = ".redigo";

/// The resolved data directory and the three canonical file paths.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub aof: PathBuf,
    pub snapshot: PathBuf,
    pub indexes: PathBuf,
}

impl DataPaths {
    /// Resolves the data directory under `root` (or `$HOME`), creating it
    /// if necessary.
    pub fn resolve(root: Option<&Path>) -> io::Result<Self> {
        let root = match root {
            Some(path) => path.to_path_buf(),
            None => home_dir()?,
        };
        let dir = root.join(DATA_DIR_NAME);
        fs::create_dir_all(&dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755))?;
        }

        Ok(Self {
            aof: dir.join(AOF_FILENAME),
            snapshot: dir.join(SNAPSHOT_FILENAME),
            indexes: dir.join(INDEXES_FILENAME),
            dir,
        })
    }

    /// The temporary path the snapshot is written to before the atomic
    /// rename over [`DataPaths::snapshot`].
    pub fn snapshot_tmp(&self) -> PathBuf {
        let mut tmp = self.snapshot.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

fn home_dir() -> io::Result<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "HOME is not set and no root directory was configured",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(tmp.path())).unwrap();

        assert!(paths.dir.is_dir());
        assert_eq!(paths.dir, tmp.path().join(DATA_DIR_NAME));
        assert_eq!(paths.aof, paths.dir.join(AOF_FILENAME));
        assert_eq!(paths.snapshot, paths.dir.join(SNAPSHOT_FILENAME));
        assert_eq!(paths.indexes, paths.dir.join(INDEXES_FILENAME));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let first = DataPaths::resolve(Some(tmp.path())).unwrap();
        let second = DataPaths::resolve(Some(tmp.path())).unwrap();
        assert_eq!(first.dir, second.dir);
    }

    #[test]
    fn test_snapshot_tmp_extends_snapshot_path() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(tmp.path())).unwrap();
        let tmp_path = paths.snapshot_tmp();

        assert_eq!(
            tmp_path.file_name().unwrap().to_str().unwrap(),
            format!("{SNAPSHOT_FILENAME}.tmp")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(tmp.path())).unwrap();
        let mode = std::fs::metadata(&paths.dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
