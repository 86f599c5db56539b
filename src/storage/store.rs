//! File Store
//!
//! Whole-file operations against the storage root. There is no locking:
//! concurrent sessions touching the same name race at the filesystem level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::protocol::Filename;

/// The server's storage root
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the storage root, creating it if missing
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a file in the root
    ///
    /// `Filename` is a single non-reserved component, so the result never
    /// leaves the root.
    pub fn path_of(&self, name: &Filename) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Format the root's contents, one entry per line, sorted by name
    ///
    /// ```text
    /// -rw-r--r--        512 notes.txt
    /// drwxr-xr-x       4096 old
    /// ```
    ///
    /// Hidden (dot) entries are skipped. An empty root gives an empty listing.
    pub fn list(&self) -> io::Result<Vec<u8>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            // Entries removed by another session mid-listing are skipped
            let Ok(meta) = fs::symlink_metadata(entry.path()) else {
                continue;
            };
            entries.push((name, meta));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut listing = String::new();
        for (name, meta) in &entries {
            listing.push_str(&format!(
                "{}{} {:>10} {}\n",
                file_type_char(meta),
                permissions(meta),
                meta.len(),
                name
            ));
        }
        Ok(listing.into_bytes())
    }

    /// Read a whole file
    pub fn read(&self, name: &Filename) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(name))
    }

    /// Create or fully overwrite a file
    pub fn write(&self, name: &Filename, contents: &[u8]) -> io::Result<()> {
        fs::write(self.path_of(name), contents)
    }

    /// Remove a file
    pub fn remove(&self, name: &Filename) -> io::Result<()> {
        fs::remove_file(self.path_of(name))
    }
}

fn file_type_char(meta: &fs::Metadata) -> char {
    let file_type = meta.file_type();
    if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'l'
    } else {
        '-'
    }
}

#[cfg(unix)]
fn permissions(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    let mode = meta.permissions().mode();
    BITS.iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}

#[cfg(not(unix))]
fn permissions(_meta: &fs::Metadata) -> String {
    "?????????".to_string()
}
