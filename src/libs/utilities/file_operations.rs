use crate::log_debug;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Appends `line` to `path` unless a line with the same trimmed content is
/// already present. Creates the file when it does not exist.
///
/// # Returns
/// * `Ok(true)` if the line was written, `Ok(false)` if it was already there.
pub fn append_line_if_missing(path: &Path, line: &str) -> io::Result<bool> {
    let wanted = line.trim();
    if file_contains_line(path, wanted)? {
        log_debug!("[Files] '{}' already present in {}", wanted, path.display());
        return Ok(false);
    }

    // A file without a trailing newline would glue our line onto its last one.
    let needs_separator = fs::read(path)
        .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
        .unwrap_or(false);

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_separator {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{line}")?;
    log_debug!("[Files] Appended '{}' to {}", wanted, path.display());
    Ok(true)
}

/// Reports whether `path` has a line equal to `wanted` once trimmed.
/// A missing file contains nothing.
pub fn file_contains_line(path: &Path, wanted: &str) -> io::Result<bool> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    for existing in BufReader::new(file).lines() {
        if existing?.trim() == wanted {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Byte-for-byte copy, overwriting any existing destination.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

/// Regular files directly inside `dir` (no recursion) whose name ends with one
/// of `suffixes`, sorted by name.
pub fn files_with_suffix(dir: &Path, suffixes: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if suffixes.iter().any(|suffix| name.ends_with(suffix)) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Whether `dir` has at least one entry.
pub fn dir_has_entries(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = tmp.path().join(".bashrc");
        let line = "source /var/lib/svc/ansible_venv/bin/activate";

        assert!(append_line_if_missing(&rc, line).unwrap());
        assert!(!append_line_if_missing(&rc, line).unwrap());

        let content = fs::read_to_string(&rc).unwrap();
        assert_eq!(content.matches(line).count(), 1);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn append_matches_trimmed_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = tmp.path().join(".bashrc");
        fs::write(&rc, "  export FOO=1  \n").unwrap();
        assert!(!append_line_if_missing(&rc, "export FOO=1").unwrap());
    }

    #[test]
    fn append_keeps_last_line_intact() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = tmp.path().join(".bashrc");
        fs::write(&rc, "alias ll='ls -l'").unwrap();
        append_line_if_missing(&rc, "export FOO=1").unwrap();
        assert_eq!(fs::read_to_string(&rc).unwrap(), "alias ll='ls -l'\nexport FOO=1\n");
    }

    #[test]
    fn suffix_scan_is_single_level_and_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.tgz"), "").unwrap();
        fs::write(tmp.path().join("a.tar.gz"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("nested.tgz")).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("c.tgz"), "").unwrap();

        let found = files_with_suffix(tmp.path(), &[".tar.gz", ".tgz"]).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.tar.gz", "b.tgz"]);
    }
}
