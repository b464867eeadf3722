//! Solution model: per-module aggregation of generated projects
//!
//! Solutions form a tree mirroring the module tree. Nodes live in a flat
//! arena addressed by [`SolutionId`]; the parent link is a plain index used
//! only for upward navigation, ownership is strictly top-down. A committed
//! solution lists every project its subtree needs, including projects that
//! live in other parts of the forest and are pulled in by the
//! additional-dependency closure.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::backend::xml::VsExprFormatter;
use crate::error::Error;
use crate::expr::{PathValue, Value};
use crate::guid::{Guid, NAMESPACE_INTERNAL};
use crate::io::{Eol, OutputFile};
use crate::paths::{disk_path, PathAnchors};

/// Entry GUID marking a C++ project in a solution file.
const PROJECT_TYPE_GUID: &str = "{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}";
/// Entry GUID marking a solution folder.
const FOLDER_TYPE_GUID: &str = "{2150E333-8FDC-42A3-9474-1A3956D46DE8}";

/// The generated identity of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsProject {
    /// Must equal the originating target's name; enforced by the toolset.
    pub name: String,
    pub guid: Guid,
    /// Project file location, anchored at the top source directory.
    pub project_file: PathValue,
    /// Names of targets this project depends on, in declaration order.
    pub deps: Vec<String>,
    /// Project file format version (10 for VS2010, 11 for VS11).
    pub version: u32,
}

/// Handle into a [`SolutionSet`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolutionId(usize);

#[derive(Debug)]
struct SolutionNode {
    name: String,
    guid: Guid,
    /// Solution file location, anchored at the top source directory.
    sln_file: PathValue,
    /// Owning module's source directory, for the formatting context.
    srcdir: Vec<String>,
    projects: Vec<VsProject>,
    subsolutions: Vec<SolutionId>,
    parent: Option<SolutionId>,
    /// GUIDs of direct children only.
    guid_lookup: HashMap<String, Guid>,
}

/// Arena of solution nodes for one generation run.
#[derive(Debug, Default)]
pub struct SolutionSet {
    nodes: Vec<SolutionNode>,
}

impl SolutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        name: impl Into<String>,
        guid: Guid,
        sln_file: PathValue,
        srcdir: Vec<String>,
    ) -> SolutionId {
        self.nodes.push(SolutionNode {
            name: name.into(),
            guid,
            sln_file,
            srcdir,
            projects: Vec::new(),
            subsolutions: Vec::new(),
            parent: None,
            guid_lookup: HashMap::new(),
        });
        SolutionId(self.nodes.len() - 1)
    }

    pub fn name(&self, id: SolutionId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn guid(&self, id: SolutionId) -> Guid {
        self.nodes[id.0].guid
    }

    /// Append a generated project to a solution.
    pub fn add_project(&mut self, id: SolutionId, project: VsProject) {
        let node = &mut self.nodes[id.0];
        node.guid_lookup.insert(project.name.clone(), project.guid);
        node.projects.push(project);
    }

    /// Attach `child` as a nested solution of `parent`.
    pub fn add_subsolution(&mut self, parent: SolutionId, child: SolutionId) {
        self.nodes[parent.0].subsolutions.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Projects of the whole subtree, own projects first, then each nested
    /// solution depth-first.
    pub fn all_projects(&self, id: SolutionId) -> Vec<&VsProject> {
        let node = &self.nodes[id.0];
        let mut out: Vec<&VsProject> = node.projects.iter().collect();
        for &sub in &node.subsolutions {
            out.extend(self.all_projects(sub));
        }
        out
    }

    /// Every nested solution of the subtree, depth-first, self excluded.
    pub fn all_subsolutions(&self, id: SolutionId) -> Vec<SolutionId> {
        let mut out = Vec::new();
        for &sub in &self.nodes[id.0].subsolutions {
            out.push(sub);
            out.extend(self.all_subsolutions(sub));
        }
        out
    }

    fn find_project(&self, id: SolutionId, name: &str) -> Option<&VsProject> {
        let node = &self.nodes[id.0];
        if let Some(p) = node.projects.iter().find(|p| p.name == name) {
            return Some(p);
        }
        node.subsolutions
            .iter()
            .find_map(|&sub| self.find_project(sub, name))
    }

    fn top(&self, id: SolutionId) -> SolutionId {
        let mut cur = id;
        while let Some(parent) = self.nodes[cur.0].parent {
            cur = parent;
        }
        cur
    }

    /// Transitive closure of declared dependencies that are not part of this
    /// solution's own tree, in discovery order, each exactly once.
    ///
    /// A top-level solution sees the whole forest already, so it never has
    /// additional dependencies. A name that cannot be located anywhere under
    /// the top-most ancestor is an internal-consistency failure: it means a
    /// dependency on a target this toolset never generated.
    pub fn additional_deps(&self, id: SolutionId) -> Result<Vec<VsProject>, Error> {
        let top = self.top(id);
        if top == id {
            return Ok(Vec::new());
        }

        let own = self.all_projects(id);
        let mut included: HashSet<String> = own.iter().map(|p| p.name.clone()).collect();
        let mut todo: Vec<String> = Vec::new();
        let mut queued: HashSet<String> = HashSet::new();
        for p in &own {
            for dep in &p.deps {
                if queued.insert(dep.clone()) {
                    todo.push(dep.clone());
                }
            }
        }

        let mut additional = Vec::new();
        while !todo.is_empty() {
            let pending: Vec<String> = todo
                .drain(..)
                .filter(|name| !included.contains(name))
                .collect();
            if pending.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for name in pending {
                if included.contains(&name) {
                    continue;
                }
                included.insert(name.clone());
                let project = self
                    .find_project(top, &name)
                    .ok_or_else(|| Error::UnresolvedDependency(name.clone()))?;
                next.extend(project.deps.iter().cloned());
                additional.push(project.clone());
            }
            todo.extend(next);
        }
        Ok(additional)
    }

    fn find_guid_recursively(&self, id: SolutionId, name: &str) -> Option<Guid> {
        if let Some(guid) = self.nodes[id.0].guid_lookup.get(name) {
            return Some(*guid);
        }
        self.nodes[id.0]
            .subsolutions
            .iter()
            .find_map(|&sub| self.find_guid_recursively(sub, name))
    }

    /// The GUID a project name resolves to: the local lookup first, then an
    /// exhaustive search from the top-most ancestor down. A dependency can
    /// only be declared on a target that exists in the model, so absence is
    /// fatal.
    pub fn target_guid(&self, id: SolutionId, name: &str) -> Result<Guid, Error> {
        if let Some(guid) = self.nodes[id.0].guid_lookup.get(name) {
            return Ok(*guid);
        }
        self.find_guid_recursively(self.top(id), name)
            .ok_or_else(|| Error::UnresolvedDependency(name.to_string()))
    }

    /// Serialize this solution's subtree to its `.sln` file under
    /// `out_root`. A solution with no projects at all writes nothing.
    pub fn commit(
        &self,
        id: SolutionId,
        out_root: &Path,
        format_version: &str,
        human_version: &str,
    ) -> Result<(), Error> {
        let node = &self.nodes[id.0];

        let mut entries: Vec<VsProject> =
            self.all_projects(id).into_iter().cloned().collect();
        let additional = self.additional_deps(id)?;
        entries.extend(additional.iter().cloned());
        if entries.is_empty() {
            return Ok(()); // don't write empty solution files
        }

        let sln_dir: Vec<String> = node.sln_file.components
            [..node.sln_file.components.len().saturating_sub(1)]
            .to_vec();
        let anchors = PathAnchors::new('\\', sln_dir, node.srcdir.clone(), None);
        let formatter = VsExprFormatter::new(&anchors);

        let mut f = OutputFile::new(
            disk_path(out_root, &anchors.absolute(&node.sln_file)?),
            Eol::Windows,
            true,
        );
        f.write("\n");
        f.write(&format!(
            "Microsoft Visual Studio Solution File, Format Version {format_version}\n"
        ));
        f.write(&format!("# Visual Studio {human_version}\n"));

        // Projects, own tree first, then the additional-dependency closure.
        let mut guids = Vec::new();
        for project in &entries {
            guids.push(project.guid);
            f.write(&format!(
                "Project(\"{PROJECT_TYPE_GUID}\") = \"{}\", \"{}\", \"{}\"\n",
                project.name,
                formatter.format(&Value::Path(project.project_file.clone()))?,
                project.guid
            ));
            if !project.deps.is_empty() {
                f.write("\tProjectSection(ProjectDependencies) = postProject\n");
                for dep in &project.deps {
                    let guid = self.target_guid(id, dep)?;
                    f.write(&format!("\t\t{guid} = {guid}\n"));
                }
                f.write("\tEndProjectSection\n");
            }
            f.write("EndProject\n");
        }

        // Folders: every nested solution, plus one synthetic folder for the
        // closure result, each subject to the single-item fold rule.
        let folders = self.collect_folders(id, &additional);
        for folder in folders.iter().filter(|fo| !fo.omit) {
            f.write(&format!(
                "Project(\"{FOLDER_TYPE_GUID}\") = \"{0}\", \"{0}\", \"{1}\"\n",
                folder.name, folder.guid
            ));
            f.write("EndProject\n");
        }

        f.write("Global\n");
        f.write("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n");
        f.write("\t\tDebug|Win32 = Debug|Win32\n");
        f.write("\t\tRelease|Win32 = Release|Win32\n");
        f.write("\tEndGlobalSection\n");
        f.write("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n");
        for guid in &guids {
            f.write(&format!("\t\t{guid}.Debug|Win32.ActiveCfg = Debug|Win32\n"));
            f.write(&format!("\t\t{guid}.Debug|Win32.Build.0 = Debug|Win32\n"));
            f.write(&format!("\t\t{guid}.Release|Win32.ActiveCfg = Release|Win32\n"));
            f.write(&format!("\t\t{guid}.Release|Win32.Build.0 = Release|Win32\n"));
        }
        f.write("\tEndGlobalSection\n");
        f.write("\tGlobalSection(SolutionProperties) = preSolution\n");
        f.write("\t\tHideSolutionNode = FALSE\n");
        f.write("\tEndGlobalSection\n");

        let nesting = nesting_lines(&folders);
        if !nesting.is_empty() {
            f.write("\tGlobalSection(NestedProjects) = preSolution\n");
            for line in nesting {
                f.write(&line);
            }
            f.write("\tEndGlobalSection\n");
        }

        f.write("EndGlobal\n");
        f.commit()
    }

    /// Flatten the subtree's nested solutions (and the synthetic
    /// additional-dependencies folder) into grouping records with the fold
    /// rule applied.
    fn collect_folders(&self, id: SolutionId, additional: &[VsProject]) -> Vec<Folder> {
        let mut folders = Vec::new();
        let mut index_of: HashMap<SolutionId, usize> = HashMap::new();

        for sub in self.all_subsolutions(id) {
            let sub_node = &self.nodes[sub.0];
            // A grouping holding one or fewer total items is folded away;
            // the committed root itself is not a grouping and never folds.
            let omit = sub_node.projects.len() + sub_node.subsolutions.len() <= 1;
            index_of.insert(sub, folders.len());
            folders.push(Folder {
                name: sub_node.name.clone(),
                guid: sub_node.guid,
                project_guids: sub_node.projects.iter().map(|p| p.guid).collect(),
                omit,
                parent: sub_node.parent.filter(|&p| p != id),
                parent_guid: None,
            });
        }

        if !additional.is_empty() {
            let name = "Additional Dependencies";
            folders.push(Folder {
                name: name.to_string(),
                guid: Guid::from_name(&NAMESPACE_INTERNAL, &self.nodes[id.0].name, name),
                project_guids: additional.iter().map(|p| p.guid).collect(),
                omit: false,
                parent: None,
                parent_guid: None,
            });
        }

        // Resolve each folder's effective parent GUID: the nearest surviving
        // ancestor grouping, or none when everything up to the root folded.
        let effective_parent: Vec<Option<Guid>> = folders
            .iter()
            .map(|folder| {
                let mut cur = folder.parent;
                while let Some(pid) = cur {
                    let idx = index_of[&pid];
                    if !folders[idx].omit {
                        return Some(folders[idx].guid);
                    }
                    cur = folders[idx].parent;
                }
                None
            })
            .collect();
        for (folder, parent_guid) in folders.iter_mut().zip(effective_parent) {
            folder.parent_guid = parent_guid;
        }
        folders
    }
}

#[derive(Debug)]
struct Folder {
    name: String,
    guid: Guid,
    project_guids: Vec<Guid>,
    omit: bool,
    /// Parent nested solution, if the parent is itself a grouping.
    parent: Option<SolutionId>,
    parent_guid: Option<Guid>,
}

/// NestedProjects lines: each directly-held project attaches to its
/// grouping's GUID (or, for a folded grouping, to the nearest surviving
/// ancestor), and each surviving grouping attaches to its surviving parent.
fn nesting_lines(folders: &[Folder]) -> Vec<String> {
    let mut lines = Vec::new();
    for folder in folders {
        let attach_to = if folder.omit {
            folder.parent_guid
        } else {
            Some(folder.guid)
        };
        if let Some(parent) = attach_to {
            for prj in &folder.project_guids {
                lines.push(format!("\t\t{prj} = {parent}\n"));
            }
        }
        if !folder.omit {
            if let Some(parent) = folder.parent_guid {
                lines.push(format!("\t\t{} = {parent}\n", folder.guid));
            }
        }
    }
    lines
}
