use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Replace the contents of `path`, creating missing parent directories.
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(contents.as_ref())?;
    Ok(())
}

/// A directory that artifacts are written into.
///
/// The directory exists once a value has been constructed, so every writer
/// handed an `OutputDir` can write without checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Create the directory (and parents) if missing.
    pub fn create<P: Into<PathBuf>>(root: P) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of an artifact inside this directory.
    pub fn join<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.root.join(name)
    }

    /// Write `contents` to `name`, returning the full path written.
    pub fn write<C: AsRef<[u8]>>(&self, name: &str, contents: C) -> io::Result<PathBuf> {
        let path = self.join(name);
        write_file(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("data/raw/AAPL.csv");

        write_file(&cache, "date,close\n").unwrap();
        assert_eq!(fs::read_to_string(cache).unwrap(), "date,close\n");
    }

    #[test]
    fn test_output_dir_created_before_write() {
        let dir = tempdir().unwrap();
        let reports = OutputDir::create(dir.path().join("nested/reports")).unwrap();
        assert!(reports.path().is_dir());

        let written = reports.write("metrics.json", "{}").unwrap();
        assert_eq!(written, dir.path().join("nested/reports/metrics.json"));
        assert_eq!(fs::read_to_string(written).unwrap(), "{}");
    }

    #[test]
    fn test_output_dir_overwrites() {
        let dir = tempdir().unwrap();
        let out = OutputDir::create(dir.path()).unwrap();
        out.write("a.txt", "first").unwrap();
        out.write("a.txt", "second").unwrap();
        assert_eq!(fs::read_to_string(out.join("a.txt")).unwrap(), "second");
    }
}
