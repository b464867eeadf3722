//! Resolved expression values flowing from the build model into output
//!
//! By the time the backend sees a value, every cross-reference has been
//! expanded by the interpreter upstream. The one exception is
//! [`Value::Reference`], which exists so the output formatter can fail fast
//! on internal-consistency violations instead of silently emitting garbage.

use crate::error::Error;

/// Literal token for boolean "true".
pub const TRUE: &str = "true";
/// Literal token for boolean "false".
pub const FALSE: &str = "false";

/// A named root that a path is resolved relative to.
///
/// The anchor set is closed; anything else fails [`Anchor::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Directory of the source description that defined the value.
    SrcDir,
    /// Top-level source directory of the whole model.
    TopSrcDir,
    /// Build output directory of the current target.
    BuildDir,
}

impl Anchor {
    /// Parse an `@anchor` token. Returns `None` for unknown anchors.
    pub fn parse(token: &str) -> Option<Anchor> {
        match token {
            "@srcdir" => Some(Anchor::SrcDir),
            "@top_srcdir" => Some(Anchor::TopSrcDir),
            "@builddir" => Some(Anchor::BuildDir),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::SrcDir => "@srcdir",
            Anchor::TopSrcDir => "@top_srcdir",
            Anchor::BuildDir => "@builddir",
        }
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file or directory name as a sequence of components under an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathValue {
    pub components: Vec<String>,
    pub anchor: Anchor,
}

impl PathValue {
    pub fn new(components: Vec<String>, anchor: Anchor) -> Self {
        Self { components, anchor }
    }

    /// The extension of the last component, if any.
    pub fn extension(&self) -> Option<&str> {
        let last = self.components.last()?;
        let (_, ext) = last.rsplit_once('.')?;
        Some(ext)
    }

    /// A copy of this path with the last component's extension replaced.
    pub fn change_extension(&self, new_ext: &str) -> PathValue {
        let mut components = self.components.clone();
        if let Some(last) = components.last_mut() {
            let stem = match last.rsplit_once('.') {
                Some((stem, _)) => stem.to_string(),
                None => last.clone(),
            };
            *last = format!("{stem}.{new_ext}");
        }
        PathValue::new(components, self.anchor)
    }

    /// A copy of this path re-rooted at a different anchor.
    pub fn with_anchor(&self, anchor: Anchor) -> PathValue {
        PathValue::new(self.components.clone(), anchor)
    }
}

impl std::fmt::Display for PathValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.anchor, self.components.join("/"))
    }
}

/// A resolved expression value.
///
/// This is a closed set; the serializer's rendering rules are total
/// functions over these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A plain string literal.
    Literal(String),
    /// A boolean constant.
    Bool(bool),
    /// An anchored path.
    Path(PathValue),
    /// An ordered list of items.
    List(Vec<Value>),
    /// An unresolved reference to a named variable. Must never survive
    /// interpretation; the formatter rejects it.
    Reference(String),
}

impl Value {
    pub fn literal(s: impl Into<String>) -> Value {
        Value::Literal(s.into())
    }

    /// The literal string, if this value is one.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret this value as a boolean, accepting either a boolean
    /// constant or one of the two literal tokens.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Literal(s) if s == TRUE => Some(true),
            Value::Literal(s) if s == FALSE => Some(false),
            _ => None,
        }
    }

    /// Split a literal on a separator into trimmed, non-empty pieces.
    /// Non-literal values are returned whole.
    pub fn split(&self, sep: char) -> Vec<Value> {
        match self {
            Value::Literal(s) => s
                .split(sep)
                .filter(|p| !p.is_empty())
                .map(Value::literal)
                .collect(),
            other => vec![other.clone()],
        }
    }

    /// Render this value via generic string conversion, without any
    /// path-anchor context. Fails fast on unresolved references.
    pub fn as_plain_string(&self) -> Result<String, Error> {
        match self {
            Value::Literal(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(if *b { TRUE } else { FALSE }.to_string()),
            Value::Path(p) => Ok(p.to_string()),
            Value::List(items) => {
                let parts: Result<Vec<_>, _> = items.iter().map(|i| i.as_plain_string()).collect();
                Ok(parts?.join(" "))
            }
            Value::Reference(name) => Err(Error::UnresolvedReference(name.clone())),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Literal(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Literal(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<PathValue> for Value {
    fn from(p: PathValue) -> Value {
        Value::Path(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_parse_rejects_unknown() {
        assert_eq!(Anchor::parse("@srcdir"), Some(Anchor::SrcDir));
        assert_eq!(Anchor::parse("@builddir"), Some(Anchor::BuildDir));
        assert_eq!(Anchor::parse("@outdir"), None);
        assert_eq!(Anchor::parse("srcdir"), None);
    }

    #[test]
    fn change_extension_keeps_stem_and_anchor() {
        let p = PathValue::new(vec!["gen".into(), "parser.y".into()], Anchor::SrcDir);
        let q = p.change_extension("cpp");
        assert_eq!(q.components, vec!["gen".to_string(), "parser.cpp".into()]);
        assert_eq!(q.anchor, Anchor::SrcDir);
    }

    #[test]
    fn change_extension_without_existing_extension() {
        let p = PathValue::new(vec!["Makefile".into()], Anchor::SrcDir);
        assert_eq!(p.change_extension("cpp").components, vec!["Makefile.cpp".to_string()]);
        assert_eq!(p.extension(), None);
    }

    #[test]
    fn split_literal_drops_empty_pieces() {
        let v = Value::literal("a/b//c");
        let parts = v.split('/');
        assert_eq!(
            parts,
            vec![Value::literal("a"), Value::literal("b"), Value::literal("c")]
        );
    }

    #[test]
    fn as_bool_accepts_tokens_and_constants() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::literal("false").as_bool(), Some(false));
        assert_eq!(Value::literal("yes").as_bool(), None);
    }

    #[test]
    fn reference_fails_generic_conversion() {
        let v = Value::Reference("outputdir".into());
        assert!(v.as_plain_string().is_err());
    }
}
