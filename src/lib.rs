#![forbid(unsafe_code)]
//! vcxgen - Visual Studio project and solution generator
//!
//! vcxgen turns a toolchain-neutral description of modules and targets into
//! native Visual Studio build files: one `.vcxproj` per target, one `.sln`
//! per module, with deterministic GUIDs so regenerating never churns
//! unchanged output.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents an internal logic error, use
//!   `.expect("INVARIANT: reason")` with a clear explanation.

pub mod backend;
pub mod compilers;
pub mod error;
pub mod expr;
pub mod guid;
pub mod io;
pub mod model;
pub mod paths;
pub mod vartypes;

pub use backend::{ProjectGenerator, SolutionSet, VsProject, VsToolset};
pub use error::{DiagnosticsSink, Error, Warning};
pub use expr::{Anchor, PathValue, Value};
pub use model::{BuildModel, Module, Target, TargetKind};
pub use vartypes::VarType;
