//! Output tree writes.

use std::fs;
use std::path::Path;

use crate::error::BuildError;

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| BuildError::write(parent, e))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let tmp = parent.join(format!(".{}.brisk-tmp", file_name));

    fs::write(&tmp, contents).map_err(|e| BuildError::write(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        BuildError::write(path, e)
    })
}

/// True when `dest` exists and is at least as new as `source`.
pub fn is_up_to_date(source: &Path, dest: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified());

    match (modified(source), modified(dest)) {
        (Ok(src), Ok(dst)) => dst >= src,
        _ => false,
    }
}

/// Delete the output tree. Returns whether anything was removed.
pub fn remove_tree(dir: &Path) -> Result<bool, BuildError> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir).map_err(|e| BuildError::write(dir, e))?;
    Ok(true)
}
