//! Toolset orchestrator for the Visual Studio 2010 family
//!
//! A [`VsToolset`] value describes one family member (VS2010 or VS11) and
//! drives the whole run: one pass generating every module's targets into
//! project files, a second pass attaching submodule solutions (which can
//! only happen once every module's solution exists, because a module may
//! depend on targets defined in modules processed later), and a third pass
//! committing every solution that has not opted out.

use std::collections::HashMap;
use std::path::Path;

use crate::backend::project::ProjectGenerator;
use crate::backend::solution::{SolutionId, SolutionSet, VsProject};
use crate::compilers::CompilerRegistry;
use crate::error::{DiagnosticsSink, Error, Warning};
use crate::expr::{Anchor, PathValue};
use crate::guid::{Guid, NAMESPACE_PROJECT, NAMESPACE_SLN_GROUP};
use crate::model::{BuildModel, Module, Target};

/// One member of the VS2010 toolset family.
#[derive(Debug, Clone)]
pub struct VsToolset {
    /// Property prefix and toolset identifier, e.g. "vs2010".
    pub name: &'static str,
    /// The version this toolset writes natively.
    pub version: u32,
    /// Project file versions that can be loaded, ascending.
    pub proj_versions: &'static [u32],
    /// PlatformToolset value, when the version sets one explicitly.
    pub platform_toolset: Option<&'static str>,
    /// Solution header format version.
    pub sln_format_version: &'static str,
    /// Solution header human-readable version.
    pub sln_human_version: &'static str,
    /// Whether projects pin VCTargetsPath in a Globals group.
    pub(crate) set_vc_targets_path: bool,
}

impl VsToolset {
    /// Visual Studio 2010.
    pub fn vs2010() -> Self {
        Self {
            name: "vs2010",
            version: 10,
            proj_versions: &[10],
            // vs2010 doesn't explicitly set a PlatformToolset by default.
            platform_toolset: None,
            sln_format_version: "11.00",
            sln_human_version: "2010",
            set_vc_targets_path: false,
        }
    }

    /// Visual Studio 11.
    pub fn vs11() -> Self {
        Self {
            name: "vs11",
            version: 11,
            proj_versions: &[10, 11],
            platform_toolset: Some("v110"),
            sln_format_version: "12.00",
            sln_human_version: "11",
            set_vc_targets_path: true,
        }
    }

    /// Generate project and solution files for the whole model under
    /// `out_root`.
    #[tracing::instrument(skip_all, fields(toolset = self.name, module_count = model.modules.len()))]
    pub fn generate(
        &self,
        model: &BuildModel,
        out_root: &Path,
        registry: &CompilerRegistry,
        sink: &mut DiagnosticsSink,
    ) -> Result<(), Error> {
        let top_name = model
            .modules
            .first()
            .map(|m| m.name.clone())
            .unwrap_or_default();

        // Pass 1: generate project files and fill each module's solution.
        let mut solutions = SolutionSet::new();
        let mut ids: HashMap<String, SolutionId> = HashMap::new();
        let generator = ProjectGenerator::new(self, model, registry, out_root);
        for module in &model.modules {
            let id = solutions.create(
                &module.name,
                Guid::from_name(&NAMESPACE_SLN_GROUP, &top_name, &module.name),
                self.solution_file(module)?,
                module.srcdir.clone(),
            );
            ids.insert(module.name.clone(), id);

            for target in &module.targets {
                match generator.generate(module, target)? {
                    Some(project) => {
                        self.check_project(target, &project, sink)?;
                        solutions.add_project(id, project);
                    }
                    None => sink.warn(Warning::UnsupportedTarget {
                        target: target.name.clone(),
                        kind: target.kind.name().to_string(),
                    }),
                }
            }
        }

        // Pass 2: attach nested solutions. Deferred until every module has
        // been generated so cross-module dependencies can resolve.
        for module in &model.modules {
            let parent = ids[&module.name];
            for sub in &module.submodules {
                let child = *ids.get(sub).ok_or_else(|| {
                    Error::Internal(format!(
                        "module \"{}\" names unknown submodule \"{sub}\"",
                        module.name
                    ))
                })?;
                solutions.add_subsolution(parent, child);
            }
        }

        // Pass 3: commit, skipping modules that opted out.
        for module in &model.modules {
            let wanted =
                module.bool_property(&format!("{}.generate-solution", self.name), true)?;
            if wanted {
                solutions.commit(
                    ids[&module.name],
                    out_root,
                    self.sln_format_version,
                    self.sln_human_version,
                )?;
            }
        }
        Ok(())
    }

    /// Re-anchor a module-relative property path at the top source
    /// directory so it stays meaningful across module boundaries.
    fn module_anchored(&self, module: &Module, path: PathValue) -> Result<PathValue, Error> {
        match path.anchor {
            Anchor::SrcDir => {
                let mut components = module.srcdir.clone();
                components.extend(path.components);
                Ok(PathValue::new(components, Anchor::TopSrcDir))
            }
            Anchor::TopSrcDir => Ok(path),
            Anchor::BuildDir => Err(Error::Internal(format!(
                "output file for module \"{}\" cannot be anchored at @builddir",
                module.name
            ))),
        }
    }

    /// The module's solution file: the `<name>.solutionfile` property, or
    /// `<module>.sln` next to the module's source description.
    pub(crate) fn solution_file(&self, module: &Module) -> Result<PathValue, Error> {
        let property = format!("{}.solutionfile", self.name);
        match module.path_property(&property)? {
            Some(path) => self.module_anchored(module, path),
            None => {
                let mut components = module.srcdir.clone();
                components.push(format!("{}.sln", module.name));
                Ok(PathValue::new(components, Anchor::TopSrcDir))
            }
        }
    }

    /// The target's project file: the `<name>.projectfile` property, or
    /// `<target>.vcxproj` in the same directory as the solution file.
    pub(crate) fn project_file(&self, module: &Module, target: &Target) -> Result<PathValue, Error> {
        let property = format!("{}.projectfile", self.name);
        match target.path_property(&property)? {
            Some(path) => self.module_anchored(module, path),
            None => {
                let sln = self.solution_file(module)?;
                let mut components =
                    sln.components[..sln.components.len().saturating_sub(1)].to_vec();
                components.push(format!("{}.vcxproj", target.name));
                Ok(PathValue::new(components, sln.anchor))
            }
        }
    }

    /// The target's project GUID: the `<name>.guid` property, or a
    /// deterministic GUID derived from the module and target names.
    pub(crate) fn project_guid(&self, module: &Module, target: &Target) -> Result<Guid, Error> {
        let property = format!("{}.guid", self.name);
        match target.properties.get(&property).and_then(|v| v.as_literal()) {
            Some(text) => text.parse().map_err(|_| Error::Type {
                type_name: "guid".into(),
                value: text.to_string(),
                reason: Some("not a valid GUID".into()),
            }),
            None => Ok(Guid::from_name(
                &NAMESPACE_PROJECT,
                &module.name,
                &target.name,
            )),
        }
    }

    /// Validation gate for a generated project: its name must match the
    /// source target, and its format version must be loadable. Newer than
    /// native is fatal; older but loadable is a forward-compatibility note.
    fn check_project(
        &self,
        target: &Target,
        project: &VsProject,
        sink: &mut DiagnosticsSink,
    ) -> Result<(), Error> {
        if project.name != target.name {
            return Err(Error::NameMismatch {
                project: project.name.clone(),
                target: target.name.clone(),
            });
        }
        if !self.proj_versions.contains(&project.version) {
            let file = project
                .project_file
                .components
                .last()
                .cloned()
                .unwrap_or_else(|| project.name.clone());
            let newest = *self.proj_versions.last().unwrap_or(&self.version);
            if project.version > newest {
                return Err(Error::UnsupportedVersion {
                    project: file,
                    found: project.version,
                    native: self.version,
                });
            }
            sink.warn(Warning::VersionSkew {
                project: file,
                found: project.version,
                native: self.version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetKind;

    fn module() -> Module {
        Module::new("engine", vec!["engine".into()])
    }

    fn project_named(name: &str, version: u32) -> VsProject {
        VsProject {
            name: name.into(),
            guid: Guid::from_name(&NAMESPACE_PROJECT, "engine", name),
            project_file: PathValue::new(
                vec!["engine".into(), format!("{name}.vcxproj")],
                Anchor::TopSrcDir,
            ),
            deps: vec![],
            version,
        }
    }

    #[test]
    fn default_output_paths_follow_the_module() {
        let ts = VsToolset::vs2010();
        let m = module();
        let t = Target::new("core", TargetKind::Library);
        let sln = ts.solution_file(&m).unwrap();
        assert_eq!(sln.components, vec!["engine".to_string(), "engine.sln".into()]);
        let prj = ts.project_file(&m, &t).unwrap();
        assert_eq!(prj.components, vec!["engine".to_string(), "core.vcxproj".into()]);
    }

    #[test]
    fn projectfile_property_overrides_the_default() {
        let ts = VsToolset::vs2010();
        let m = module();
        let mut t = Target::new("core", TargetKind::Library);
        t.properties.set("vs2010.projectfile", "build/core10.vcxproj");
        let prj = ts.project_file(&m, &t).unwrap();
        assert_eq!(
            prj.components,
            vec!["engine".to_string(), "build".into(), "core10.vcxproj".into()]
        );
        assert_eq!(prj.anchor, Anchor::TopSrcDir);
    }

    #[test]
    fn guid_property_overrides_derivation() {
        let ts = VsToolset::vs2010();
        let m = module();
        let mut t = Target::new("core", TargetKind::Library);
        t.properties
            .set("vs2010.guid", "{31DC1570-67C5-40FD-9130-C5F57BAEBA88}");
        let guid = ts.project_guid(&m, &t).unwrap();
        assert_eq!(guid.to_string(), "{31DC1570-67C5-40FD-9130-C5F57BAEBA88}");

        t.properties.set("vs2010.guid", "not-a-guid");
        assert!(ts.project_guid(&m, &t).is_err());
    }

    #[test]
    fn name_mismatch_is_fatal() {
        let ts = VsToolset::vs2010();
        let t = Target::new("core", TargetKind::Library);
        let mut sink = DiagnosticsSink::new();
        let err = ts
            .check_project(&t, &project_named("other", 10), &mut sink)
            .unwrap_err();
        assert!(matches!(err, Error::NameMismatch { .. }));
    }

    #[test]
    fn newer_project_version_is_fatal_older_is_a_warning() {
        let ts = VsToolset::vs11();
        let t = Target::new("core", TargetKind::Library);
        let mut sink = DiagnosticsSink::new();

        // Native and still-loadable versions pass without noise.
        ts.check_project(&t, &project_named("core", 11), &mut sink)
            .unwrap();
        ts.check_project(&t, &project_named("core", 10), &mut sink)
            .unwrap();
        assert!(sink.warnings().is_empty());

        let err = ts
            .check_project(&t, &project_named("core", 12), &mut sink)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { found: 12, .. }));

        let ts2010 = VsToolset::vs2010();
        // vs2010 can't load a version-9 project natively; it converts it.
        ts2010
            .check_project(&t, &project_named("core", 9), &mut sink)
            .unwrap();
        assert!(matches!(
            sink.warnings().last(),
            Some(Warning::VersionSkew { found: 9, .. })
        ));
    }
}
