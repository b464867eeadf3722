//! Error taxonomy and diagnostics reporting for the generation backend
//!
//! Fatal conditions are `Error` values that propagate up through the
//! generation call chain with `?`. Recoverable conditions are `Warning`
//! values recorded in a [`DiagnosticsSink`] that the caller passes through
//! the run; warnings never stop generation.

use miette::Diagnostic;
use thiserror::Error;

/// A fatal generation error.
///
/// Anything in here aborts the run for the target/module in progress; the
/// caller is responsible for reporting it to the end user with context.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// A value does not match its declared type's validation contract.
    #[error("type error: {value} is not a valid {type_name}{}", reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    #[diagnostic(code(vcxgen::type_error))]
    Type {
        type_name: String,
        value: String,
        reason: Option<String>,
    },

    /// A generated project's name disagrees with its source target's name.
    #[error("project name \"{project}\" differs from target name \"{target}\", they must be the same")]
    #[diagnostic(code(vcxgen::name_mismatch))]
    NameMismatch { project: String, target: String },

    /// A generated project targets a newer format version than the toolset
    /// can load.
    #[error("project {project} is for Visual Studio {found} and will not work with {native}")]
    #[diagnostic(code(vcxgen::unsupported_version))]
    UnsupportedVersion {
        project: String,
        found: u32,
        native: u32,
    },

    /// A declared dependency cannot be resolved to any generated project
    /// anywhere in the solution tree.
    #[error("can't find project \"{0}\" anywhere in the solution tree")]
    #[diagnostic(
        code(vcxgen::unresolved_dependency),
        help("a dependency can only be declared on a target that this toolset generated")
    )]
    UnresolvedDependency(String),

    /// An expression still contains a reference that should have been
    /// expanded upstream. Internal-consistency failure.
    #[error("unresolved reference to \"{0}\" reached the output formatter")]
    #[diagnostic(code(vcxgen::unresolved_reference))]
    UnresolvedReference(String),

    /// No translator registered for a source/target file-type pair.
    #[error("don't know how to compile {from} files into {to} files")]
    #[diagnostic(code(vcxgen::missing_compiler))]
    MissingCompiler { from: String, to: String },

    #[error("I/O error: {0}")]
    #[diagnostic(code(vcxgen::io))]
    Io(#[from] std::io::Error),

    /// An internal invariant was violated. Always a bug in the generator,
    /// never a user error.
    #[error("internal error: {0}")]
    #[diagnostic(code(vcxgen::internal))]
    Internal(String),
}

/// A recoverable condition; the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A target's product kind has no generation strategy; the target is
    /// skipped and everything else proceeds.
    UnsupportedTarget { target: String, kind: String },

    /// A project targets an older format version than the toolset's native
    /// one; the consuming tool will silently upgrade it.
    VersionSkew {
        project: String,
        found: u32,
        native: u32,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnsupportedTarget { target, kind } => write!(
                f,
                "target \"{target}\" has type \"{kind}\", which is not supported by this toolset; ignoring"
            ),
            Warning::VersionSkew {
                project,
                found,
                native,
            } => write!(
                f,
                "project {project} is for Visual Studio {found}, not {native}, will be converted when built"
            ),
        }
    }
}

/// Explicit warning accumulator threaded through the generation call chain.
///
/// Passing the sink explicitly (instead of ambient process-wide reporting)
/// keeps the backend testable; warnings are also mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    warnings: Vec<Warning>,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and continue.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// All warnings recorded so far, in the order they occurred.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
