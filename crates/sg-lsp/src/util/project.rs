//! Workspace discovery (§1 Non-goals / §6): `find_project_root` is a
//! narrow, dependency-free directory walk upward from a starting path
//! looking for a project manifest file, `sg.toml`.

use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "sg.toml";

/// Walk upward from `start` (a file or directory) looking for a
/// directory containing `sg.toml`. Returns that directory, or `None` if
/// no ancestor has one.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() { Some(start) } else { start.parent() };
    while let Some(candidate) = dir {
        if candidate.join(MANIFEST_FILE_NAME).is_file() {
            return Some(candidate.to_path_buf());
        }
        dir = candidate.parent();
    }
    None
}
