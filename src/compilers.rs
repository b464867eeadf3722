//! Compiler/translator lookup
//!
//! Sources whose extension is not natively compilable are first translated
//! into a native-language file by an external tool. The backend resolves the
//! tool through this registry, keyed by the (source, target) file-type pair,
//! and only ever asks it for the shell-level commands to run.

use std::collections::HashMap;

use crate::error::Error;
use crate::model::Target;

/// A class of files identified by name, with the extensions that map to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileType {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Native C/C++ sources, compiled directly by the toolset.
pub fn native_file_type() -> FileType {
    FileType::new("C/C++", &["cpp", "cxx", "cc", "c"])
}

/// Produces the shell commands that translate one file into another.
pub trait Compiler {
    /// Commands to turn `input` into `output` for `target`. Paths are
    /// already rendered native to the output context.
    fn commands(&self, target: &Target, input: &str, output: &str) -> Vec<String>;
}

/// Registry of translators keyed by (from, to) file-type name.
pub struct CompilerRegistry {
    file_types: Vec<FileType>,
    compilers: HashMap<(String, String), Box<dyn Compiler>>,
}

impl CompilerRegistry {
    pub fn new() -> Self {
        Self {
            file_types: vec![native_file_type()],
            compilers: HashMap::new(),
        }
    }

    /// Register a file type so its extensions resolve in lookups.
    pub fn add_file_type(&mut self, ft: FileType) {
        self.file_types.push(ft);
    }

    /// Register the translator for a (from, to) pair.
    pub fn register(&mut self, from: &FileType, to: &FileType, compiler: Box<dyn Compiler>) {
        self.compilers
            .insert((from.name.clone(), to.name.clone()), compiler);
    }

    /// The file type owning `ext`, if any is registered.
    pub fn file_type_for_extension(&self, ext: &str) -> Option<&FileType> {
        self.file_types
            .iter()
            .find(|ft| ft.extensions.iter().any(|e| e == ext))
    }

    /// The translator for a (from, to) pair; absence is an error naming
    /// both sides.
    pub fn compiler(&self, from: &FileType, to: &FileType) -> Result<&dyn Compiler, Error> {
        self.compilers
            .get(&(from.name.clone(), to.name.clone()))
            .map(|b| b.as_ref())
            .ok_or_else(|| Error::MissingCompiler {
                from: from.name.clone(),
                to: to.name.clone(),
            })
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("file_types", &self.file_types)
            .field("pairs", &self.compilers.keys().collect::<Vec<_>>())
            .finish()
    }
}
