//! Visual Studio Output Backend
//!
//! This module turns a [`crate::model::BuildModel`] into on-disk Visual
//! Studio artifacts.
//!
//! The pipeline is:
//! 1. One `.vcxproj` (plus `.filters` companion) per buildable target
//! 2. One `.sln` per module, wiring projects and sub-module solution
//!    folders together
//! 3. Cross-module dependency closure so every solution loads all the
//!    projects it needs
//!
//! ## Module Organization
//!
//! - `xml.rs` - Generic XML output tree and MSBuild-flavoured serializer
//! - `project.rs` - Per-target project file generation
//! - `solution.rs` - Solution model, folder folding, `.sln` writer
//! - `toolset.rs` - Toolset descriptors and the generation orchestrator

pub mod project;
pub mod solution;
pub mod toolset;
pub mod xml;

pub use project::ProjectGenerator;
pub use solution::{SolutionSet, VsProject};
pub use toolset::VsToolset;
