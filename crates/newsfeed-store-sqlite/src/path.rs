//! Database path handling shared by the service binaries.

use std::path::{Path, PathBuf};

/// Resolve a configured database path, expanding a leading `~` component to
/// `$HOME`. Anything else, `:memory:` included, is returned unchanged.
pub fn resolve_db_path(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
