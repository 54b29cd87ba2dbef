use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Recursively applies `a+rwX`: read and write for everyone, and execute for
/// everyone on directories and on files that are already executable by someone.
///
/// Returns the number of entries visited, including `root` itself.
pub(crate) fn relax_permissions(root: &Path) -> Result<usize> {
    let mut visited = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        let metadata = entry
            .metadata()
            .with_context(|| format!("metadata for {}", entry.path().display()))?;
        if metadata.file_type().is_symlink() {
            continue;
        }
        let mut permissions = metadata.permissions();
        relax(&mut permissions, metadata.is_dir());
        fs::set_permissions(entry.path(), permissions)
            .with_context(|| format!("setting permissions on {}", entry.path().display()))?;
        visited += 1;
    }
    Ok(visited)
}

#[cfg(unix)]
fn relax(permissions: &mut fs::Permissions, is_dir: bool) {
    use std::os::unix::fs::PermissionsExt;

    let mode = permissions.mode();
    let mut relaxed = mode | 0o666;
    if is_dir || mode & 0o111 != 0 {
        relaxed |= 0o111;
    }
    permissions.set_mode(relaxed);
}

#[cfg(not(unix))]
fn relax(permissions: &mut fs::Permissions, _is_dir: bool) {
    permissions.set_readonly(false);
}
