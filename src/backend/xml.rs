//! Generic output tree and its XML serializer
//!
//! The tree models an XML-like document abstractly: named nodes with
//! insertion-ordered attributes and children, where a child is either a
//! nested node or a scalar value rendered as a simple leaf element. The
//! serializer walks the tree with the expression formatter and produces the
//! exact byte layout the consuming tool expects; serializing the same tree
//! twice yields byte-identical output.

use crate::error::Error;
use crate::expr::{Value, FALSE, TRUE};
use crate::paths::PathAnchors;

/// A child of an [`XmlNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChild {
    /// A nested element.
    Elem(XmlNode),
    /// A scalar value rendered as `<tag>value</tag>`, omitted entirely when
    /// the rendered value is empty.
    Leaf(Value),
}

/// One node of the output tree.
///
/// Invariant: a node with children must not also carry `text`; the
/// serializer treats that as an internal error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    pub name: String,
    pub text: Option<String>,
    attrs: Vec<(String, Value)>,
    children: Vec<(String, XmlChild)>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set an attribute; insertion order is preserved in output.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(attr) => attr.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append an existing node under its own name.
    pub fn add_child(&mut self, node: XmlNode) {
        self.children.push((node.name.clone(), XmlChild::Elem(node)));
    }

    /// Create, append and return an empty child element.
    pub fn add_elem(&mut self, tag: &str) -> &mut XmlNode {
        self.children
            .push((tag.to_string(), XmlChild::Elem(XmlNode::new(tag))));
        match &mut self.children.last_mut().expect("INVARIANT: just pushed").1 {
            XmlChild::Elem(node) => node,
            XmlChild::Leaf(_) => unreachable!("INVARIANT: pushed an element"),
        }
    }

    /// Append a scalar leaf child.
    pub fn add_leaf(&mut self, tag: &str, value: impl Into<Value>) {
        self.children
            .push((tag.to_string(), XmlChild::Leaf(value.into())));
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = &(String, XmlChild)> {
        self.children.iter()
    }
}

/// Renders resolved expression values the way this target family spells
/// them: booleans as literal tokens, lists joined with ";", paths native to
/// the anchor context.
pub struct VsExprFormatter<'a> {
    anchors: &'a PathAnchors,
}

impl<'a> VsExprFormatter<'a> {
    pub const LIST_SEP: &'static str = ";";

    pub fn new(anchors: &'a PathAnchors) -> Self {
        Self { anchors }
    }

    pub fn format(&self, value: &Value) -> Result<String, Error> {
        match value {
            Value::Literal(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(if *b { TRUE } else { FALSE }.to_string()),
            Value::Path(p) => self.anchors.native(p),
            Value::List(items) => {
                let parts: Result<Vec<_>, _> = items.iter().map(|i| self.format(i)).collect();
                Ok(parts?.join(Self::LIST_SEP))
            }
            // All references must be expanded before values reach output.
            Value::Reference(name) => Err(Error::UnresolvedReference(name.clone())),
        }
    }
}

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
    <!-- This file was generated by vcxgen. Do not modify, all changes will be overwritten! -->\n";

/// Serializes an [`XmlNode`] hierarchy into the toolset's native-looking
/// XML layout.
pub struct XmlFormatter<'a> {
    expr: VsExprFormatter<'a>,
}

impl<'a> XmlFormatter<'a> {
    pub fn new(anchors: &'a PathAnchors) -> Self {
        Self {
            expr: VsExprFormatter::new(anchors),
        }
    }

    pub fn format(&self, root: &XmlNode) -> Result<String, Error> {
        let mut out = String::from(XML_HEADER);
        self.format_node(root, "", &mut out)?;
        Ok(out)
    }

    fn format_node(&self, node: &XmlNode, indent: &str, out: &mut String) -> Result<(), Error> {
        out.push_str(indent);
        out.push('<');
        out.push_str(&node.name);
        for (key, value) in node.attrs() {
            out.push(' ');
            out.push_str(key);
            out.push('=');
            out.push_str(&quote_attr(&self.expr.format(value)?));
        }
        if node.has_children() {
            if node.text.is_some() {
                return Err(Error::Internal(format!(
                    "node <{}> carries both text and children",
                    node.name
                )));
            }
            out.push_str(">\n");
            let subindent = format!("{indent}  ");
            for (tag, child) in node.children() {
                match child {
                    XmlChild::Elem(elem) => {
                        self.format_node(elem, &subindent, out)?;
                    }
                    XmlChild::Leaf(value) => {
                        let v = escape_text(&self.expr.format(value)?);
                        // An empty leaf produces no element at all.
                        if !v.is_empty() {
                            out.push_str(&format!("{subindent}<{tag}>{v}</{tag}>\n"));
                        }
                    }
                }
            }
            out.push_str(&format!("{indent}</{}>\n", node.name));
        } else if let Some(text) = &node.text {
            out.push_str(&format!(">{text}</{}>\n", node.name));
        } else {
            out.push_str(" />\n");
        }
        Ok(())
    }
}

/// Escape character data.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Quote an attribute value, escaping markup and the quote itself.
fn quote_attr(s: &str) -> String {
    format!("\"{}\"", escape_text(s).replace('"', "&quot;"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Anchor, PathValue};

    fn anchors() -> PathAnchors {
        PathAnchors::new('\\', vec![], vec![], None)
    }

    fn fmt(root: &XmlNode) -> String {
        let a = anchors();
        XmlFormatter::new(&a).format(root).unwrap()
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let mut n = XmlNode::new("Project");
        n.set_attr("DefaultTargets", "Build");
        n.set_attr("ToolsVersion", "4.0");
        n.set_attr("xmlns", "http://schemas.microsoft.com/developer/msbuild/2003");
        let s = fmt(&n);
        assert!(s.ends_with(
            "<Project DefaultTargets=\"Build\" ToolsVersion=\"4.0\" \
             xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\" />\n"
        ));
    }

    #[test]
    fn leaves_render_inline_and_empty_leaves_vanish() {
        let mut n = XmlNode::new("PropertyGroup");
        n.add_leaf("RootNamespace", "demo");
        n.add_leaf("Empty", "");
        n.add_leaf("UseDebugLibraries", true);
        let s = fmt(&n);
        assert!(s.contains("  <RootNamespace>demo</RootNamespace>\n"));
        assert!(s.contains("  <UseDebugLibraries>true</UseDebugLibraries>\n"));
        assert!(!s.contains("Empty"));
    }

    #[test]
    fn lists_join_with_semicolons() {
        let mut n = XmlNode::new("ClCompile");
        n.add_leaf(
            "PreprocessorDefinitions",
            Value::List(vec![
                Value::literal("WIN32"),
                Value::literal("_DEBUG"),
                Value::literal("%(PreprocessorDefinitions)"),
            ]),
        );
        let s = fmt(&n);
        assert!(s.contains(
            "<PreprocessorDefinitions>WIN32;_DEBUG;%(PreprocessorDefinitions)</PreprocessorDefinitions>"
        ));
    }

    #[test]
    fn text_node_renders_on_one_line() {
        let mut root = XmlNode::new("PropertyGroup");
        root.add_child(XmlNode::with_text("VCTargetsPath", "$(VCTargetsPath11)"));
        let s = fmt(&root);
        assert!(s.contains("  <VCTargetsPath>$(VCTargetsPath11)</VCTargetsPath>\n"));
    }

    #[test]
    fn text_plus_children_is_an_internal_error() {
        let mut n = XmlNode::with_text("Bad", "text");
        n.add_leaf("Child", "x");
        let a = anchors();
        assert!(XmlFormatter::new(&a).format(&n).is_err());
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut n = XmlNode::new("X");
        n.set_attr("Condition", "'$(A)'=='\"<&>\"'");
        let s = fmt(&n);
        assert!(s.contains("Condition=\"'$(A)'=='&quot;&lt;&amp;&gt;&quot;'\""));
    }

    #[test]
    fn unresolved_reference_fails_fast() {
        let mut n = XmlNode::new("X");
        n.add_leaf("OutDir", Value::Reference("outputdir".into()));
        let a = anchors();
        let err = XmlFormatter::new(&a).format(&n).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(_)));
    }

    #[test]
    fn serialization_is_idempotent() {
        let mut root = XmlNode::new("Project");
        root.set_attr("ToolsVersion", "4.0");
        let group = root.add_elem("ItemGroup");
        group.set_attr("Label", "ProjectConfigurations");
        group.add_leaf("Configuration", "Debug");
        root.add_leaf(
            "Path",
            Value::Path(PathValue::new(vec!["a".into(), "b.cpp".into()], Anchor::SrcDir)),
        );
        let first = fmt(&root);
        let second = fmt(&root);
        assert_eq!(first, second);
        assert!(first.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
    }

    #[test]
    fn nested_nodes_indent_two_spaces() {
        let mut root = XmlNode::new("Project");
        let group = root.add_elem("ItemGroup");
        let conf = group.add_elem("ProjectConfiguration");
        conf.set_attr("Include", "Debug|Win32");
        conf.add_leaf("Configuration", "Debug");
        let s = fmt(&root);
        let expected = "<Project>\n  <ItemGroup>\n    <ProjectConfiguration Include=\"Debug|Win32\">\n      <Configuration>Debug</Configuration>\n    </ProjectConfiguration>\n  </ItemGroup>\n</Project>\n";
        assert!(s.ends_with(expected), "{s}");
    }
}
