//! The resolved build model the backend consumes
//!
//! This is the interface boundary to the interpreter: modules own targets
//! and submodules, targets expose typed, already-reference-resolved property
//! values. The backend only reads the model; it never mutates it.
//!
//! Property access goes through the type system: accessors normalize the
//! stored value for the expected type and validate it, so a type error
//! surfaces at the point of use with the offending value attached.

use crate::error::Error;
use crate::expr::{PathValue, Value};
use crate::vartypes::VarType;

/// Insertion-ordered property name/value map.
///
/// Output determinism leans on insertion order, so this is a plain vector
/// scanned linearly; models are small.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    /// All properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Normalize and validate the named property against `ty`. Returns
    /// `None` when the property is absent.
    pub fn get_typed(&self, name: &str, ty: &VarType) -> Result<Option<Value>, Error> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let normalized = ty.normalize(value.clone());
        ty.validate(&normalized)?;
        Ok(Some(normalized))
    }
}

/// What a target builds. Closed set; kinds with no generation strategy are
/// carried as `Other` and skipped with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// An executable program.
    Program,
    /// A static library.
    Library,
    /// A dynamically loaded library.
    SharedLibrary,
    /// Anything this backend has no strategy for.
    Other(String),
}

impl TargetKind {
    pub fn name(&self) -> &str {
        match self {
            TargetKind::Program => "program",
            TargetKind::Library => "library",
            TargetKind::SharedLibrary => "shared-library",
            TargetKind::Other(name) => name,
        }
    }
}

/// A single buildable unit.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// Source files, in declaration order.
    pub sources: Vec<PathValue>,
    /// Header files, in declaration order.
    pub headers: Vec<PathValue>,
    /// Names of targets this one depends on, in declaration order.
    pub deps: Vec<String>,
    pub properties: PropertyMap,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sources: Vec::new(),
            headers: Vec::new(),
            deps: Vec::new(),
            properties: PropertyMap::new(),
        }
    }

    /// A list-typed property; absent properties are empty lists.
    pub fn list_property(&self, name: &str, item: VarType) -> Result<Vec<Value>, Error> {
        let ty = VarType::List(Box::new(item));
        match self.properties.get_typed(name, &ty)? {
            Some(Value::List(items)) => Ok(items),
            Some(_) | None => Ok(Vec::new()),
        }
    }

    /// A boolean property with a default for absence.
    pub fn bool_property(&self, name: &str, default: bool) -> Result<bool, Error> {
        match self.properties.get_typed(name, &VarType::Bool)? {
            Some(v) => v.as_bool().ok_or_else(|| Error::Internal(format!(
                "validated bool property \"{name}\" has no boolean shape"
            ))),
            None => Ok(default),
        }
    }

    /// An enum-typed property with a default for absence.
    pub fn enum_property(
        &self,
        name: &str,
        allowed: &[&str],
        default: &str,
    ) -> Result<String, Error> {
        let ty = VarType::Enum(allowed.iter().map(|s| s.to_string()).collect());
        match self.properties.get_typed(name, &ty)? {
            Some(v) => Ok(v
                .as_literal()
                .unwrap_or(default)
                .to_string()),
            None => Ok(default.to_string()),
        }
    }

    /// A path-typed property, if present.
    pub fn path_property(&self, name: &str) -> Result<Option<PathValue>, Error> {
        match self.properties.get_typed(name, &VarType::Path)? {
            Some(Value::Path(p)) => Ok(Some(p)),
            Some(_) => Err(Error::Internal(format!(
                "validated path property \"{name}\" has no path shape"
            ))),
            None => Ok(None),
        }
    }

    /// The stem used for the produced file's name; defaults to the target
    /// name.
    pub fn basename(&self) -> String {
        self.properties
            .get("basename")
            .and_then(|v| v.as_literal())
            .unwrap_or(&self.name)
            .to_string()
    }
}

/// A unit of the build model owning targets and nested submodules.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    /// Directory of the module's source description, as components from the
    /// top source directory.
    pub srcdir: Vec<String>,
    /// Names of directly nested submodules.
    pub submodules: Vec<String>,
    pub targets: Vec<Target>,
    pub properties: PropertyMap,
}

impl Module {
    pub fn new(name: impl Into<String>, srcdir: Vec<String>) -> Self {
        Self {
            name: name.into(),
            srcdir,
            submodules: Vec::new(),
            targets: Vec::new(),
            properties: PropertyMap::new(),
        }
    }

    /// A boolean module property with a default for absence.
    pub fn bool_property(&self, name: &str, default: bool) -> Result<bool, Error> {
        match self.properties.get_typed(name, &VarType::Bool)? {
            Some(v) => v.as_bool().ok_or_else(|| Error::Internal(format!(
                "validated bool property \"{name}\" has no boolean shape"
            ))),
            None => Ok(default),
        }
    }

    /// A path-typed module property, if present.
    pub fn path_property(&self, name: &str) -> Result<Option<PathValue>, Error> {
        match self.properties.get_typed(name, &VarType::Path)? {
            Some(Value::Path(p)) => Ok(Some(p)),
            Some(_) => Err(Error::Internal(format!(
                "validated path property \"{name}\" has no path shape"
            ))),
            None => Ok(None),
        }
    }
}

/// The whole resolved model: modules in the model's own stable order.
#[derive(Debug, Clone, Default)]
pub struct BuildModel {
    pub modules: Vec<Module>,
}

impl BuildModel {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// Find a target by name anywhere in the model.
    pub fn get_target(&self, name: &str) -> Option<(&Module, &Target)> {
        self.modules.iter().find_map(|m| {
            m.targets
                .iter()
                .find(|t| t.name == name)
                .map(|t| (m, t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Anchor;

    #[test]
    fn property_map_preserves_insertion_order() {
        let mut props = PropertyMap::new();
        props.set("zeta", "1");
        props.set("alpha", "2");
        props.set("zeta", "3"); // replaced in place, order unchanged
        let names: Vec<&str> = props.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(props.get("zeta"), Some(&Value::literal("3")));
    }

    #[test]
    fn typed_access_normalizes_and_validates() {
        let mut t = Target::new("app", TargetKind::Program);
        t.properties.set("outputdir", "@builddir/bin");
        let p = t.path_property("outputdir").unwrap().unwrap();
        assert_eq!(p.anchor, Anchor::BuildDir);
        assert_eq!(p.components, vec!["bin".to_string()]);
    }

    #[test]
    fn typed_access_surfaces_type_errors() {
        let mut t = Target::new("app", TargetKind::Program);
        t.properties.set("win32-unicode", "yes");
        assert!(t.bool_property("win32-unicode", true).is_err());

        t.properties.set("win32-crt-linkage", "shared");
        assert!(t
            .enum_property("win32-crt-linkage", &["dll", "static"], "dll")
            .is_err());
    }

    #[test]
    fn absent_properties_fall_back_to_defaults() {
        let t = Target::new("app", TargetKind::Program);
        assert!(t.bool_property("win32-unicode", true).unwrap());
        assert_eq!(
            t.enum_property("win32-subsystem", &["console", "windows"], "console")
                .unwrap(),
            "console"
        );
        assert!(t
            .list_property("defines", VarType::Any)
            .unwrap()
            .is_empty());
        assert_eq!(t.basename(), "app");
    }

    #[test]
    fn get_target_searches_all_modules() {
        let mut m1 = Module::new("a", vec!["a".into()]);
        m1.targets.push(Target::new("x", TargetKind::Library));
        let mut m2 = Module::new("b", vec!["b".into()]);
        m2.targets.push(Target::new("y", TargetKind::Program));
        let model = BuildModel::new(vec![m1, m2]);
        assert_eq!(model.get_target("y").unwrap().0.name, "b");
        assert!(model.get_target("z").is_none());
    }
}
