use anyhow::{Context, Result, bail};
use encoding_rs::WINDOWS_1252;
use std::io::Write;

/// One line of an install manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    /// A directory, relative to the distribution root (`.`, `.\sub\dir`).
    Folder(String),
    /// A file inside the most recent folder, by name only.
    File(String),
}

impl ManifestEntry {
    pub fn line(&self) -> String {
        match self {
            ManifestEntry::Folder(path) => format!("Folder: {}\r\n", path),
            ManifestEntry::File(name) => format!("File: {}\r\n", name),
        }
    }
}

/// Writes manifest entries as Windows-1252 text with CRLF terminators.
///
/// The underlying handle is owned, so it is closed whenever the writer is dropped.
pub struct ManifestWriter {
    out: Box<dyn Write + Send>,
}

impl ManifestWriter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    /// Append one entry. A name with characters outside Windows-1252 is an error and
    /// nothing is written for it.
    pub fn write(&mut self, entry: &ManifestEntry) -> Result<()> {
        let line = entry.line();
        let (bytes, _, had_unmappable) = WINDOWS_1252.encode(&line);
        if had_unmappable {
            bail!(
                "Manifest entry {:?} has characters outside Windows-1252",
                line.trim_end()
            );
        }
        self.out
            .write_all(&bytes)
            .context("Failed to write manifest entry")
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush().context("Failed to flush manifest")
    }
}
