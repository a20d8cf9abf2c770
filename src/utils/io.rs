//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use glob_match::glob_match;
use std::fs;
use std::path::Path;

/// Read file contents with standardized error handling.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Write content to file atomically (write to .tmp, then rename).
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation))))?;

    Ok(())
}

/// True when a path relative to the copy root matches any exclusion pattern.
///
/// Patterns are anchored at the copy root: `node_modules` excludes only the
/// top-level directory, `**/node_modules` excludes it at every depth.
pub fn is_excluded(relative: &Path, exclude: &[String]) -> bool {
    let rel = relative.to_string_lossy().replace('\\', "/");
    exclude.iter().any(|pattern| glob_match(pattern, &rel))
}

/// Recursively copy `src` into `dest`, skipping excluded entries.
///
/// Symlinks are not followed. Returns the number of files copied.
pub fn copy_dir_filtered(src: &Path, dest: &Path, exclude: &[String]) -> Result<usize> {
    copy_tree(src, src, dest, exclude)
}

fn copy_tree(root: &Path, current: &Path, dest: &Path, exclude: &[String]) -> Result<usize> {
    let ctx = |action: &str, p: &Path| Some(format!("{} {}", action, p.display()));

    fs::create_dir_all(dest).map_err(|e| Error::internal_io(e.to_string(), ctx("create", dest)))?;

    let entries =
        fs::read_dir(current).map_err(|e| Error::internal_io(e.to_string(), ctx("read", current)))?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|e| Error::internal_io(e.to_string(), ctx("read", current)))?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);

        if is_excluded(relative, exclude) {
            continue;
        }

        let file_type = entry
            .file_type()
            .map_err(|e| Error::internal_io(e.to_string(), ctx("stat", &path)))?;
        let target = dest.join(entry.file_name());

        if file_type.is_dir() {
            copied += copy_tree(root, &path, &target, exclude)?;
        } else if file_type.is_file() {
            fs::copy(&path, &target)
                .map_err(|e| Error::internal_io(e.to_string(), ctx("copy", &path)))?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn exclude() -> Vec<String> {
        vec![
            ".git".to_string(),
            ".devbox".to_string(),
            "node_modules".to_string(),
            ".fluentci".to_string(),
        ]
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let err = read_file(Path::new("/nonexistent/path.txt"), "test read").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn write_file_atomic_replaces_content() {
        let temp = NamedTempFile::new().unwrap();
        write_file_atomic(temp.path(), "new content", "test write").unwrap();
        assert_eq!(fs::read_to_string(temp.path()).unwrap(), "new content");
    }

    #[test]
    fn excluded_is_anchored_at_root() {
        assert!(is_excluded(Path::new("node_modules"), &exclude()));
        assert!(is_excluded(Path::new(".git"), &exclude()));
        assert!(!is_excluded(Path::new("tests/fixtures/node_modules"), &exclude()));
        assert!(!is_excluded(Path::new("vendor/lib/.git"), &exclude()));
        assert!(!is_excluded(Path::new("src/index.ts"), &exclude()));
        assert!(!is_excluded(Path::new(".github"), &exclude()));
    }

    #[test]
    fn excluded_supports_globs() {
        let patterns = vec!["**/*.log".to_string()];
        assert!(is_excluded(Path::new("logs/debug.log"), &patterns));
        assert!(!is_excluded(Path::new("logs/debug.txt"), &patterns));
    }

    #[test]
    fn copy_dir_filtered_skips_excluded_entries() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::write(src.path().join("package.json"), "{}").unwrap();
        fs::create_dir_all(src.path().join("src")).unwrap();
        fs::write(src.path().join("src/index.ts"), "export {}").unwrap();
        fs::create_dir_all(src.path().join("node_modules/left-pad")).unwrap();
        fs::write(src.path().join("node_modules/left-pad/index.js"), "").unwrap();
        fs::create_dir_all(src.path().join(".git")).unwrap();
        fs::write(src.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(src.path().join(".fluentci")).unwrap();
        fs::create_dir_all(src.path().join("tests/fixtures/node_modules")).unwrap();
        fs::write(src.path().join("tests/fixtures/node_modules/dep.js"), "").unwrap();

        let copied = copy_dir_filtered(src.path(), dest.path(), &exclude()).unwrap();

        assert_eq!(copied, 3);
        assert!(dest
            .path()
            .join("tests/fixtures/node_modules/dep.js")
            .exists());
        assert!(dest.path().join("package.json").exists());
        assert!(dest.path().join("src/index.ts").exists());
        assert!(!dest.path().join("node_modules").exists());
        assert!(!dest.path().join(".git").exists());
        assert!(!dest.path().join(".fluentci").exists());
    }
}
