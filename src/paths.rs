//! Path-anchor resolution
//!
//! Every anchored path is resolved relative to the file being written, so
//! relative references come out correct regardless of where the model's
//! notional build directory lives. All directories are tracked as component
//! vectors from a common notional root; the native separator is only applied
//! at the very end.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::expr::{Anchor, PathValue};

/// Resolution context tying the three anchors to concrete directories and
/// rendering paths relative to one output file.
#[derive(Debug, Clone)]
pub struct PathAnchors {
    dirsep: char,
    /// Directory containing the file being written.
    outdir: Vec<String>,
    srcdir: Vec<String>,
    top_srcdir: Vec<String>,
    /// Absent in contexts with no current target (e.g. solution files).
    builddir: Option<Vec<String>>,
}

impl PathAnchors {
    pub fn new(
        dirsep: char,
        outdir: Vec<String>,
        srcdir: Vec<String>,
        builddir: Option<Vec<String>>,
    ) -> Self {
        Self {
            dirsep,
            outdir,
            srcdir,
            top_srcdir: Vec::new(),
            builddir,
        }
    }

    /// The anchor's directory as components from the notional root.
    fn anchor_dir(&self, anchor: Anchor) -> Result<&[String], Error> {
        match anchor {
            Anchor::SrcDir => Ok(&self.srcdir),
            Anchor::TopSrcDir => Ok(&self.top_srcdir),
            Anchor::BuildDir => self
                .builddir
                .as_deref()
                .ok_or_else(|| Error::Internal("no build directory in this context".into())),
        }
    }

    /// Components of `path` from the notional root.
    pub fn absolute(&self, path: &PathValue) -> Result<Vec<String>, Error> {
        let mut out: Vec<String> = self.anchor_dir(path.anchor)?.to_vec();
        out.extend(path.components.iter().cloned());
        Ok(out)
    }

    /// Render `path` as a native string relative to the output file's
    /// directory. An empty relative path renders as ".".
    pub fn native(&self, path: &PathValue) -> Result<String, Error> {
        let abs = self.absolute(path)?;

        let common = abs
            .iter()
            .zip(self.outdir.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = Vec::new();
        for _ in common..self.outdir.len() {
            parts.push("..");
        }
        parts.extend(abs[common..].iter().map(String::as_str));

        if parts.is_empty() {
            return Ok(".".into());
        }
        Ok(parts.join(&self.dirsep.to_string()))
    }
}

/// Where a root-relative component vector lands on disk.
pub fn disk_path(out_root: &Path, components: &[String]) -> PathBuf {
    let mut p = out_root.to_path_buf();
    for c in components {
        p.push(c);
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sibling_file_is_plain_name() {
        let anchors = PathAnchors::new('\\', v(&["lib"]), v(&["lib"]), None);
        let p = PathValue::new(v(&["util.cpp"]), Anchor::SrcDir);
        assert_eq!(anchors.native(&p).unwrap(), "util.cpp");
    }

    #[test]
    fn cross_directory_path_uses_parent_steps() {
        let anchors = PathAnchors::new('\\', v(&["app"]), v(&["app"]), None);
        let p = PathValue::new(v(&["lib", "core.vcxproj"]), Anchor::TopSrcDir);
        assert_eq!(anchors.native(&p).unwrap(), "..\\lib\\core.vcxproj");
    }

    #[test]
    fn builddir_anchor_resolves_when_present() {
        let anchors = PathAnchors::new(
            '\\',
            v(&["app"]),
            v(&["app"]),
            Some(v(&["app", "$(Configuration)"])),
        );
        let p = PathValue::new(v(&["gen.cpp"]), Anchor::BuildDir);
        assert_eq!(anchors.native(&p).unwrap(), "$(Configuration)\\gen.cpp");
    }

    #[test]
    fn builddir_anchor_fails_without_context() {
        let anchors = PathAnchors::new('\\', v(&[]), v(&[]), None);
        let p = PathValue::new(v(&["x"]), Anchor::BuildDir);
        assert!(anchors.native(&p).is_err());
    }

    #[test]
    fn empty_relative_path_is_dot() {
        let anchors = PathAnchors::new('\\', v(&["lib"]), v(&["lib"]), None);
        let p = PathValue::new(vec![], Anchor::SrcDir);
        assert_eq!(anchors.native(&p).unwrap(), ".");
    }
}
