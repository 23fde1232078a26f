//! Working-directory helpers: input discovery and two-pass stats cleanup.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Where pass one of a two-pass encode sends its discarded video.
pub fn null_sink() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

/// Regular files directly inside `dir` with the given extension, sorted.
pub fn find_by_extension(dir: &Path, extension: &str) -> mb_core::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_extension(&path, extension) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Regular files anywhere under `dir` with the given extension, sorted.
pub fn find_by_extension_recursive(dir: &Path, extension: &str) -> mb_core::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            mb_core::Error::from(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// Whether `name` matches the `*pass*.log` statistics pattern.
fn is_pass_log(name: &str) -> bool {
    name.ends_with(".log") && name[..name.len() - 4].contains("pass")
}

/// Delete leftover two-pass statistics files (`*pass*.log`) from `dir`.
///
/// libvpx appends to an existing stats file rather than replacing it, so a
/// stale one from an interrupted run would corrupt the next second pass.
/// `preserve` (the run log) is skipped even when its name matches. Returns
/// the number of files removed.
pub fn remove_pass_logs(dir: &Path, preserve: &Path) -> mb_core::Result<usize> {
    let preserve = std::fs::canonicalize(preserve).ok();
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_pass_log(name) && entry.file_type()?.is_file() {
            if preserve.is_some() && std::fs::canonicalize(entry.path()).ok() == preserve {
                tracing::debug!("keeping {name}: it is the run log");
                continue;
            }
            tracing::debug!("removing stale stats file {name}");
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn finds_matching_files_in_directory_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.avi"));
        touch(&dir.path().join("a.avi"));
        touch(&dir.path().join("c.AVI"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("sub/d.avi"));

        let found = find_by_extension(dir.path(), "avi").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.avi", "b.avi", "c.AVI"]);
    }

    #[test]
    fn recursive_search_descends_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("z.avi"));
        touch(&dir.path().join("sub/a.avi"));
        touch(&dir.path().join("sub/deeper/m.avi"));
        touch(&dir.path().join("sub/skip.mkv"));

        let found = find_by_extension_recursive(dir.path(), ".avi").unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("sub/a.avi"),
                dir.path().join("sub/deeper/m.avi"),
                dir.path().join("z.avi"),
            ]
        );
    }

    #[test]
    fn missing_directory_is_error() {
        assert!(find_by_extension(Path::new("/nonexistent/dir"), "avi").is_err());
        assert!(find_by_extension_recursive(Path::new("/nonexistent/dir"), "avi").is_err());
    }

    #[test]
    fn pass_log_pattern() {
        assert!(is_pass_log("ffmpeg2pass-0.log"));
        assert!(is_pass_log("pass.log"));
        assert!(is_pass_log("x264_2pass.log"));
        assert!(!is_pass_log("encodings.log"));
        assert!(!is_pass_log("ffmpeg2pass-0.log.mbtree"));
        assert!(!is_pass_log("passive.txt"));
        assert!(!is_pass_log(".log"));
    }

    #[test]
    fn removes_only_pass_logs() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("ffmpeg2pass-0.log"));
        touch(&dir.path().join("ffmpeg2pass-1.log"));
        touch(&dir.path().join("encodings.log"));
        touch(&dir.path().join("movie.avi"));

        let log = dir.path().join("encodings.log");
        let removed = remove_pass_logs(dir.path(), &log).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("ffmpeg2pass-0.log").exists());
        assert!(log.exists());
        assert!(dir.path().join("movie.avi").exists());

        assert_eq!(remove_pass_logs(dir.path(), &log).unwrap(), 0);
    }

    #[test]
    fn preserved_file_survives_even_when_it_matches() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("twopass.log");
        touch(&log);
        touch(&dir.path().join("ffmpeg2pass-0.log"));

        // Same file, spelled through a `.` component.
        let spelled = dir.path().join(".").join("twopass.log");
        assert_eq!(remove_pass_logs(dir.path(), &spelled).unwrap(), 1);
        assert!(log.exists());
        assert!(!dir.path().join("ffmpeg2pass-0.log").exists());
    }
}
