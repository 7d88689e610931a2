// Output naming

use std::path::{Path, PathBuf};

const COUNTER_SEPARATOR: &str = "_";

/// `<stem><suffix><ext>` next to `base`, or `<stem><suffix>_<n><ext>` with the
/// first counter that does not exist yet. Never returns an existing path.
pub fn generate_unique_path(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let candidate = base.with_file_name(format!("{stem}{suffix}{ext}"));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        let candidate =
            base.with_file_name(format!("{stem}{suffix}{COUNTER_SEPARATOR}{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
