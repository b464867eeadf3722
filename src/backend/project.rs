//! Per-target project file generation
//!
//! Builds one `.vcxproj` output tree per target, writes it together with its
//! static `.vcxproj.filters` companion, and returns the project's identity
//! record for the owning module's solution.
//!
//! All paths embedded in the project are rendered relative to the project
//! file itself, so the generated artifacts are correct regardless of where
//! the model's notional build directory lives.

use std::path::Path;

use crate::backend::solution::VsProject;
use crate::backend::toolset::VsToolset;
use crate::backend::xml::{XmlFormatter, XmlNode};
use crate::compilers::{native_file_type, CompilerRegistry};
use crate::error::Error;
use crate::expr::{Anchor, PathValue, Value};
use crate::io::{Eol, OutputFile};
use crate::model::{BuildModel, Module, Target, TargetKind};
use crate::paths::{disk_path, PathAnchors};
use crate::vartypes::VarType;

const CONFIGS: [&str; 2] = ["Debug", "Release"];

/// Generates `.vcxproj` and `.vcxproj.filters` files, one target at a time.
pub struct ProjectGenerator<'a> {
    toolset: &'a VsToolset,
    model: &'a BuildModel,
    registry: &'a CompilerRegistry,
    out_root: &'a Path,
}

impl<'a> ProjectGenerator<'a> {
    pub fn new(
        toolset: &'a VsToolset,
        model: &'a BuildModel,
        registry: &'a CompilerRegistry,
        out_root: &'a Path,
    ) -> Self {
        Self {
            toolset,
            model,
            registry,
            out_root,
        }
    }

    /// Generate the project for `target`. Returns `None` when the target's
    /// kind has no generation strategy here; the caller decides whether the
    /// target is skipped with a warning.
    #[tracing::instrument(skip_all, fields(target = %target.name))]
    pub fn generate(
        &self,
        module: &Module,
        target: &Target,
    ) -> Result<Option<VsProject>, Error> {
        let (is_program, is_library, is_dll) = match &target.kind {
            TargetKind::Program => (true, false, false),
            TargetKind::Library => (false, true, false),
            TargetKind::SharedLibrary => (false, false, true),
            TargetKind::Other(_) => return Ok(None),
        };

        let project_file = self.toolset.project_file(module, target)?;
        let project_dir: Vec<String> = project_file.components
            [..project_file.components.len().saturating_sub(1)]
            .to_vec();
        // Build output goes into a per-configuration directory next to the
        // project file.
        let mut builddir = project_dir.clone();
        builddir.push("$(Configuration)".into());
        let anchors = PathAnchors::new(
            '\\',
            project_dir,
            module.srcdir.clone(),
            Some(builddir),
        );

        let guid = self.toolset.project_guid(module, target)?;

        let mut root = XmlNode::new("Project");
        root.set_attr("DefaultTargets", "Build");
        root.set_attr("ToolsVersion", "4.0");
        root.set_attr("xmlns", "http://schemas.microsoft.com/developer/msbuild/2003");

        let configurations = root.add_elem("ItemGroup");
        configurations.set_attr("Label", "ProjectConfigurations");
        for config in CONFIGS {
            let n = configurations.add_elem("ProjectConfiguration");
            n.set_attr("Include", format!("{config}|Win32"));
            n.add_leaf("Configuration", config);
            n.add_leaf("Platform", "Win32");
        }

        if self.toolset.set_vc_targets_path {
            let globals = root.add_elem("PropertyGroup");
            globals.set_attr("Label", "Globals");
            let mut vc = XmlNode::with_text("VCTargetsPath", "$(VCTargetsPath11)");
            vc.set_attr(
                "Condition",
                "'$(VCTargetsPath11)' != '' and '$(VSVersion)' == '' and '$(VisualStudioVersion)' == ''",
            );
            globals.add_child(vc);
        }

        let mut globals = XmlNode::new("PropertyGroup");
        globals.set_attr("Label", "Globals");
        self.add_extra_options(target, &mut globals);
        globals.add_leaf("ProjectGuid", guid.to_string());
        globals.add_leaf("Keyword", "Win32Proj");
        globals.add_leaf("RootNamespace", target.name.as_str());
        root.add_child(globals);

        let import = root.add_elem("Import");
        import.set_attr("Project", "$(VCTargetsPath)\\Microsoft.Cpp.Default.props");

        for config in CONFIGS {
            let mut n = XmlNode::new("PropertyGroup");
            n.set_attr("Label", "Configuration");
            n.set_attr("Condition", config_condition(config));
            self.add_extra_options(target, &mut n);
            let kind = if is_program {
                "Application"
            } else if is_library {
                "StaticLibrary"
            } else {
                "DynamicLibrary"
            };
            n.add_leaf("ConfigurationType", kind);
            n.add_leaf("UseDebugLibraries", config == "Debug");
            if let Some(toolset) = self.toolset.platform_toolset {
                n.add_leaf("PlatformToolset", toolset);
            }
            if target.bool_property("win32-unicode", true)? {
                n.add_leaf("CharacterSet", "Unicode");
            } else {
                n.add_leaf("CharacterSet", "MultiByte");
            }
            root.add_child(n);
        }

        let import = root.add_elem("Import");
        import.set_attr("Project", "$(VCTargetsPath)\\Microsoft.Cpp.props");
        let ext_settings = root.add_elem("ImportGroup");
        ext_settings.set_attr("Label", "ExtensionSettings");

        for config in CONFIGS {
            let group = root.add_elem("ImportGroup");
            group.set_attr("Label", "PropertySheets");
            group.set_attr("Condition", config_condition(config));
            let import = group.add_elem("Import");
            import.set_attr(
                "Project",
                "$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props",
            );
            import.set_attr(
                "Condition",
                "exists('$(UserRootDir)\\Microsoft.Cpp.$(Platform).user.props')",
            );
            import.set_attr("Label", "LocalAppDataPlatform");
        }

        let macros = root.add_elem("PropertyGroup");
        macros.set_attr("Label", "UserMacros");

        let outputdir = target
            .path_property("outputdir")?
            .unwrap_or_else(|| PathValue::new(vec![], Anchor::BuildDir));
        let default_outdir = PathValue::new(vec![], Anchor::BuildDir);
        for config in CONFIGS {
            let mut n = XmlNode::new("PropertyGroup");
            self.add_extra_options(target, &mut n);
            if !is_library {
                n.add_leaf("LinkIncremental", config == "Debug");
            }
            n.add_leaf("TargetName", target.basename());
            if anchors.native(&outputdir)? != anchors.native(&default_outdir)? {
                n.add_leaf("OutDir", outputdir.clone());
            }
            if n.has_children() {
                n.set_attr("Condition", config_condition(config));
            }
            root.add_child(n);
        }

        for config in CONFIGS {
            let n = self.item_definition_group(
                target, config, is_program, is_library, is_dll,
            )?;
            root.add_child(n);
        }

        self.add_sources(target, &anchors, &mut root)?;
        self.add_headers(target, &mut root);
        self.add_project_references(target, &mut root)?;

        let import = root.add_elem("Import");
        import.set_attr("Project", "$(VCTargetsPath)\\Microsoft.Cpp.targets");
        let ext_targets = root.add_elem("ImportGroup");
        ext_targets.set_attr("Label", "ExtensionTargets");

        let disk = disk_path(self.out_root, &anchors.absolute(&project_file)?);
        let mut f = OutputFile::new(&disk, Eol::Windows, true);
        f.write(&XmlFormatter::new(&anchors).format(&root)?);
        f.commit()?;
        write_filters_file(&disk)?;

        Ok(Some(VsProject {
            name: target.name.clone(),
            guid,
            project_file,
            deps: target.deps.clone(),
            version: self.toolset.version,
        }))
    }

    /// The per-configuration compiler/linker/librarian settings block.
    fn item_definition_group(
        &self,
        target: &Target,
        config: &str,
        is_program: bool,
        is_library: bool,
        is_dll: bool,
    ) -> Result<XmlNode, Error> {
        let debug = config == "Debug";
        let mut group = XmlNode::new("ItemDefinitionGroup");
        group.set_attr("Condition", config_condition(config));

        let mut cl = XmlNode::new("ClCompile");
        self.add_extra_options(target, &mut cl);
        cl.add_leaf("WarningLevel", "Level3");
        let mut std_defs = if debug {
            cl.add_leaf("Optimization", "Disabled");
            String::from("WIN32;_DEBUG")
        } else {
            cl.add_leaf("Optimization", "MaxSpeed");
            cl.add_leaf("FunctionLevelLinking", true);
            cl.add_leaf("IntrinsicFunctions", true);
            String::from("WIN32;NDEBUG")
        };
        if is_program {
            std_defs.push_str(";_CONSOLE");
        }
        if is_library {
            std_defs.push_str(";_LIB");
        }
        if is_dll {
            std_defs.push_str(";_USRDLL;");
            std_defs.push_str(&target.name.to_uppercase());
            std_defs.push_str("_EXPORTS");
        }
        // Trailing placeholder lets the build engine merge inherited
        // definitions back in.
        std_defs.push_str(";%(PreprocessorDefinitions)");
        let mut defines = target.list_property("defines", VarType::Any)?;
        defines.push(Value::literal(std_defs));
        cl.add_leaf("PreprocessorDefinitions", defines);
        cl.add_leaf("MultiProcessorCompilation", true);
        cl.add_leaf("MinimalRebuild", false);
        cl.add_leaf(
            "AdditionalIncludeDirectories",
            target.list_property("includedirs", VarType::Path)?,
        );

        let mut crt = String::from("MultiThreaded");
        if debug {
            crt.push_str("Debug");
        }
        if target.enum_property("win32-crt-linkage", &["dll", "static"], "dll")? == "dll" {
            crt.push_str("DLL");
        }
        cl.add_leaf("RuntimeLibrary", crt);

        // Compiler flags for all language variants end up in one
        // AdditionalOptions value at this level.
        let mut cflags = target.list_property("compiler-options", VarType::Any)?;
        cflags.extend(target.list_property("c-compiler-options", VarType::Any)?);
        cflags.extend(target.list_property("cxx-compiler-options", VarType::Any)?);
        if !cflags.is_empty() {
            cl.add_leaf(
                "AdditionalOptions",
                format!("{} %(AdditionalOptions)", join_plain(&cflags, " ")?),
            );
        }
        group.add_child(cl);

        let mut link = XmlNode::new("Link");
        self.add_extra_options(target, &mut link);
        if is_program {
            let subsystem =
                target.enum_property("win32-subsystem", &["console", "windows"], "console")?;
            link.add_leaf(
                "SubSystem",
                if subsystem == "windows" { "Windows" } else { "Console" },
            );
        } else {
            link.add_leaf("SubSystem", "Windows");
        }
        link.add_leaf("GenerateDebugInformation", true);
        if !debug {
            link.add_leaf("EnableCOMDATFolding", true);
            link.add_leaf("OptimizeReferences", true);
        }
        if !is_library {
            let ldflags = target.list_property("link-options", VarType::Any)?;
            if !ldflags.is_empty() {
                link.add_leaf(
                    "AdditionalOptions",
                    format!("{} %(AdditionalOptions)", join_plain(&ldflags, " ")?),
                );
            }
        }
        group.add_child(link);

        if is_library {
            let libs = target.list_property("libs", VarType::Any)?;
            if !libs.is_empty() {
                let mut lib = XmlNode::new("Lib");
                self.add_extra_options(target, &mut lib);
                let names: Vec<String> = libs
                    .iter()
                    .map(|l| Ok(format!("{}.lib", l.as_plain_string()?)))
                    .collect::<Result<_, Error>>()?;
                lib.add_leaf("AdditionalDependencies", names.join(" "));
                group.add_child(lib);
            }
        }

        for (property, tag) in [
            ("pre-build-commands", "PreBuildEvent"),
            ("post-build-commands", "PostBuildEvent"),
        ] {
            let commands = target.list_property(property, VarType::Any)?;
            if !commands.is_empty() {
                let event = group.add_elem(tag);
                event.add_leaf("Command", join_plain(&commands, "\n")?);
            }
        }

        Ok(group)
    }

    /// Source files: native-language extensions compile directly; anything
    /// else goes through a custom translation step producing an
    /// intermediate native file, which is then compiled.
    fn add_sources(
        &self,
        target: &Target,
        anchors: &PathAnchors,
        root: &mut XmlNode,
    ) -> Result<(), Error> {
        if target.sources.is_empty() {
            return Ok(());
        }
        let native = native_file_type();
        let items = root.add_elem("ItemGroup");
        for source in &target.sources {
            let ext = source.extension().unwrap_or_default();
            if native.extensions.iter().any(|e| e.as_str() == ext) {
                let n = items.add_elem("ClCompile");
                n.set_attr("Include", source.clone());
                continue;
            }
            let from = self
                .registry
                .file_type_for_extension(ext)
                .ok_or_else(|| Error::MissingCompiler {
                    from: format!(".{ext}"),
                    to: native.name.clone(),
                })?;
            let compiler = self.registry.compiler(from, &native)?;
            let generated = source.change_extension("cpp").with_anchor(Anchor::BuildDir);
            let commands = compiler.commands(
                target,
                &anchors.native(source)?,
                &anchors.native(&generated)?,
            );

            let custom = items.add_elem("CustomBuild");
            custom.set_attr("Include", source.clone());
            custom.add_leaf("Command", commands.join("\n"));
            custom.add_leaf("Outputs", generated.clone());
            let n = items.add_elem("ClCompile");
            n.set_attr("Include", generated);
        }
        Ok(())
    }

    fn add_headers(&self, target: &Target, root: &mut XmlNode) {
        if target.headers.is_empty() {
            return;
        }
        let items = root.add_elem("ItemGroup");
        for header in &target.headers {
            let n = items.add_elem("ClInclude");
            n.set_attr("Include", header.clone());
        }
    }

    /// Declared dependencies become cross-project references carrying the
    /// dependency's own generated file and lowercased GUID.
    fn add_project_references(
        &self,
        target: &Target,
        root: &mut XmlNode,
    ) -> Result<(), Error> {
        if target.deps.is_empty() {
            return Ok(());
        }
        let refs = root.add_elem("ItemGroup");
        for dep_name in &target.deps {
            let (dep_module, dep_target) = self
                .model
                .get_target(dep_name)
                .ok_or_else(|| Error::UnresolvedDependency(dep_name.clone()))?;
            let dep_file = self.toolset.project_file(dep_module, dep_target)?;
            let dep_guid = self.toolset.project_guid(dep_module, dep_target)?;
            let n = refs.add_elem("ProjectReference");
            n.set_attr("Include", dep_file);
            n.add_leaf("Project", dep_guid.braced_lower());
        }
        Ok(())
    }

    /// Inject escape-hatch settings declared as `<toolset>.option.*`
    /// properties into the node they are scoped to. The scope suffix is
    /// the node's Label when it has one, its element name otherwise; bare
    /// `<toolset>.option.<name>` properties land in unlabelled
    /// PropertyGroup nodes.
    fn add_extra_options(&self, target: &Target, node: &mut XmlNode) {
        let scope = match node.attr("Label").and_then(|v| v.as_literal()) {
            Some(label) => format!("{}.option.{label}", self.toolset.name),
            None if node.name == "PropertyGroup" => format!("{}.option", self.toolset.name),
            None => format!("{}.option.{}", self.toolset.name, node.name),
        };
        let values: Vec<(String, Value)> = target
            .properties
            .iter()
            .filter_map(|(name, value)| {
                let (prefix, option) = name.rsplit_once('.')?;
                (prefix == scope).then(|| (option.to_string(), value.clone()))
            })
            .collect();
        for (option, value) in values {
            node.add_leaf(&option, value);
        }
    }
}

fn config_condition(config: &str) -> String {
    format!("'$(Configuration)|$(Platform)'=='{config}|Win32'")
}

fn join_plain(values: &[Value], sep: &str) -> Result<String, Error> {
    let parts: Result<Vec<String>, Error> =
        values.iter().map(|v| v.as_plain_string()).collect();
    Ok(parts?.join(sep))
}

/// The static grouping-by-extension companion document, identical for every
/// project.
fn write_filters_file(project_path: &Path) -> Result<(), Error> {
    let mut path = project_path.as_os_str().to_owned();
    path.push(".filters");
    let mut f = OutputFile::new(std::path::PathBuf::from(path), Eol::Windows, false);
    f.write(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <Project ToolsVersion=\"4.0\" xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n\
         \x20 <ItemGroup>\n\
         \x20   <Filter Include=\"Source Files\">\n\
         \x20     <UniqueIdentifier>{4FC737F1-C7A5-4376-A066-2A32D752A2FF}</UniqueIdentifier>\n\
         \x20     <Extensions>cpp;c;cc;cxx;def;odl;idl;hpj;bat;asm;asmx</Extensions>\n\
         \x20   </Filter>\n\
         \x20   <Filter Include=\"Header Files\">\n\
         \x20     <UniqueIdentifier>{93995380-89BD-4b04-88EB-625FBE52EBFB}</UniqueIdentifier>\n\
         \x20     <Extensions>h;hpp;hxx;hm;inl;inc;xsd</Extensions>\n\
         \x20   </Filter>\n\
         \x20   <Filter Include=\"Resource Files\">\n\
         \x20     <UniqueIdentifier>{67DA6AB6-F800-4c08-8B7A-83BB121AAD01}</UniqueIdentifier>\n\
         \x20     <Extensions>rc;ico;cur;bmp;dlg;rc2;rct;bin;rgs;gif;jpg;jpeg;jpe;resx;tiff;tif;png;wav;mfcribbon-ms</Extensions>\n\
         \x20   </Filter>\n\
         \x20 </ItemGroup>\n\
         </Project>\n",
    );
    f.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_condition_names_both_axes() {
        assert_eq!(
            config_condition("Debug"),
            "'$(Configuration)|$(Platform)'=='Debug|Win32'"
        );
    }

    #[test]
    fn join_plain_rejects_unresolved_references() {
        let values = vec![Value::literal("a"), Value::Reference("x".into())];
        assert!(join_plain(&values, " ").is_err());
    }
}
