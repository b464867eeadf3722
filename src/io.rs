//! Buffered output files
//!
//! Generated artifacts are accumulated in memory and committed to storage in
//! one write, with the byte-order marker and line-ending convention the
//! consuming tool expects. Everything is regenerated wholesale on every run;
//! there is no incremental diffing.

use std::fs;
use std::path::PathBuf;

use crate::error::Error;

const BOM_UTF8: &[u8] = b"\xef\xbb\xbf";

/// Line-ending convention for a committed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eol {
    Unix,
    Windows,
}

/// An output file buffered until [`OutputFile::commit`].
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    eol: Eol,
    bom: bool,
    buf: String,
}

impl OutputFile {
    pub fn new(path: impl Into<PathBuf>, eol: Eol, bom: bool) -> Self {
        Self {
            path: path.into(),
            eol,
            bom,
            buf: String::new(),
        }
    }

    /// Append text. Use plain `\n` line endings; conversion happens at
    /// commit time.
    pub fn write(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Write the buffered content to storage, creating parent directories
    /// as needed.
    pub fn commit(self) -> Result<(), Error> {
        let mut bytes: Vec<u8> = Vec::with_capacity(self.buf.len() + 3);
        if self.bom {
            bytes.extend_from_slice(BOM_UTF8);
        }
        match self.eol {
            Eol::Unix => bytes.extend_from_slice(self.buf.as_bytes()),
            Eol::Windows => bytes.extend_from_slice(self.buf.replace('\n', "\r\n").as_bytes()),
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, bytes)?;
        tracing::debug!(path = %self.path.display(), "committed output file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_applies_bom_and_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sln");
        let mut f = OutputFile::new(&path, Eol::Windows, true);
        f.write("a\nb\n");
        f.commit().unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes, b"\xef\xbb\xbfa\r\nb\r\n");
    }

    #[test]
    fn commit_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("dir").join("x.txt");
        let mut f = OutputFile::new(&path, Eol::Unix, false);
        f.write("hello\n");
        f.commit().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
