//! The expression type system
//!
//! Types verify validity of variable values before they are embedded into
//! generated output. Each type can *normalize* a value (best-effort coercion
//! into canonical shape) and *validate* it (confirm the runtime shape
//! matches). Callers always validate after normalizing and never mutate a
//! value except through `normalize`, so normalization only ever needs one
//! pass.

use crate::error::Error;
use crate::expr::{Anchor, PathValue, Value, FALSE, TRUE};

/// A variable type. The set is closed and matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarType {
    /// Fallback type that allows any value at all.
    Any,
    /// Boolean; only the literal tokens "true"/"false" or boolean constants.
    Bool,
    /// Target identifier.
    Id,
    /// A file or directory name.
    Path,
    /// One of a fixed set of literal strings.
    Enum(Vec<String>),
    /// Homogeneous list of items.
    List(Box<VarType>),
}

impl VarType {
    /// Human-readable name of the type, e.g. "path" or "list of bool".
    pub fn name(&self) -> String {
        match self {
            VarType::Any => "any".into(),
            VarType::Bool => "bool".into(),
            VarType::Id => "id".into(),
            VarType::Path => "path".into(),
            VarType::Enum(_) => "enum".into(),
            VarType::List(item) => format!("list of {}", item.name()),
        }
    }

    /// Normalize `value` to this type if that can be done; values that
    /// cannot be coerced are returned unchanged and left for `validate`
    /// to reject.
    pub fn normalize(&self, value: Value) -> Value {
        match self {
            VarType::Path => normalize_path(value),
            VarType::List(item) => match value {
                Value::List(items) => {
                    Value::List(items.into_iter().map(|i| item.normalize(i)).collect())
                }
                // A single value is a special case of a list for
                // convenience; translate it into a one-item list.
                single => Value::List(vec![item.normalize(single)]),
            },
            _ => value,
        }
    }

    /// Validate that `value` is of this type.
    pub fn validate(&self, value: &Value) -> Result<(), Error> {
        match self {
            VarType::Any => Ok(()),
            VarType::Bool => match value {
                Value::Bool(_) => Ok(()),
                Value::Literal(s) if s == TRUE || s == FALSE => Ok(()),
                other => Err(self.type_error(other, None)),
            },
            VarType::Id => match value {
                Value::Literal(_) => Ok(()),
                other => Err(self.type_error(other, None)),
            },
            VarType::Path => match value {
                Value::Path(_) => Ok(()),
                Value::Literal(s) => {
                    // An un-normalized literal with an unknown anchor gets a
                    // pointed message; anything else is just not a path.
                    let reason = s
                        .split('/')
                        .next()
                        .filter(|first| first.starts_with('@'))
                        .map(|first| format!("\"{first}\" is not a valid path anchor"));
                    Err(self.type_error(value, reason))
                }
                other => Err(self.type_error(other, None)),
            },
            VarType::Enum(allowed) => match value {
                Value::Literal(s) if allowed.iter().any(|a| a == s) => Ok(()),
                other => Err(self.type_error(
                    other,
                    Some(format!("must be one of {allowed:?}")),
                )),
            },
            VarType::List(item) => match value {
                Value::List(items) => {
                    for i in items {
                        item.validate(i)?;
                    }
                    Ok(())
                }
                other => Err(self.type_error(other, None)),
            },
        }
    }

    fn type_error(&self, value: &Value, reason: Option<String>) -> Error {
        Error::Type {
            type_name: self.name(),
            value: value.as_plain_string().unwrap_or_else(|_| format!("{value:?}")),
            reason,
        }
    }
}

/// Split a literal into path components, consuming a leading `@anchor`
/// token when one is present. Already-shaped paths pass through; values
/// that cannot be coerced are returned unchanged.
fn normalize_path(value: Value) -> Value {
    let components = match &value {
        Value::Path(_) => return value,
        Value::Literal(_) => value.split('/'),
        _ => return value,
    };
    let Some(first) = components.first().and_then(|c| c.as_literal()) else {
        return value; // empty path = invalid
    };
    match Anchor::parse(first) {
        Some(anchor) => Value::Path(PathValue::new(
            components[1..]
                .iter()
                .filter_map(|c| c.as_literal().map(str::to_string))
                .collect(),
            anchor,
        )),
        None if first.starts_with('@') => value, // unknown anchor, rejected by validate
        None => Value::Path(PathValue::new(
            components
                .iter()
                .filter_map(|c| c.as_literal().map(str::to_string))
                .collect(),
            Anchor::SrcDir,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm_and_validate(ty: &VarType, v: Value) -> Result<Value, Error> {
        let n = ty.normalize(v);
        ty.validate(&n)?;
        Ok(n)
    }

    #[test]
    fn any_accepts_everything() {
        assert!(VarType::Any.validate(&Value::literal("whatever")).is_ok());
        assert!(VarType::Any.validate(&Value::Bool(true)).is_ok());
        assert!(VarType::Any
            .validate(&Value::List(vec![Value::literal("x")]))
            .is_ok());
    }

    #[test]
    fn bool_accepts_only_the_two_tokens() {
        assert!(VarType::Bool.validate(&Value::literal("true")).is_ok());
        assert!(VarType::Bool.validate(&Value::literal("false")).is_ok());
        assert!(VarType::Bool.validate(&Value::Bool(false)).is_ok());
        assert!(VarType::Bool.validate(&Value::literal("True")).is_err());
        assert!(VarType::Bool.validate(&Value::literal("1")).is_err());
    }

    #[test]
    fn path_normalizes_literal_with_anchor() {
        let v = norm_and_validate(&VarType::Path, Value::literal("@builddir/obj/main.o")).unwrap();
        assert_eq!(
            v,
            Value::Path(PathValue::new(
                vec!["obj".into(), "main.o".into()],
                Anchor::BuildDir
            ))
        );
    }

    #[test]
    fn path_defaults_to_srcdir_anchor() {
        let v = norm_and_validate(&VarType::Path, Value::literal("src/main.cpp")).unwrap();
        assert_eq!(
            v,
            Value::Path(PathValue::new(
                vec!["src".into(), "main.cpp".into()],
                Anchor::SrcDir
            ))
        );
    }

    #[test]
    fn path_rejects_invalid_anchor_with_reason() {
        let err = norm_and_validate(&VarType::Path, Value::literal("@objdir/main.o")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"@objdir\" is not a valid path anchor"), "{msg}");
    }

    #[test]
    fn enum_rejection_lists_allowed_values() {
        let ty = VarType::Enum(vec!["dll".into(), "static".into()]);
        assert!(ty.validate(&Value::literal("dll")).is_ok());
        assert!(ty.validate(&Value::literal("static")).is_ok());
        let err = ty.validate(&Value::literal("shared")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dll") && msg.contains("static"), "{msg}");
    }

    #[test]
    fn list_wraps_single_value() {
        let ty = VarType::List(Box::new(VarType::Path));
        let v = ty.normalize(Value::literal("a/b"));
        let Value::List(items) = &v else {
            panic!("expected list, got {v:?}")
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], VarType::Path.normalize(Value::literal("a/b")));
        assert!(ty.validate(&v).is_ok());
    }

    #[test]
    fn empty_list_is_valid_for_any_item_type() {
        let ty = VarType::List(Box::new(VarType::Bool));
        assert!(ty.validate(&Value::List(vec![])).is_ok());
    }

    #[test]
    fn list_validation_is_element_wise() {
        let ty = VarType::List(Box::new(VarType::Bool));
        let ok = Value::List(vec![Value::literal("true"), Value::Bool(false)]);
        let bad = Value::List(vec![Value::literal("true"), Value::literal("nope")]);
        assert!(ty.validate(&ok).is_ok());
        assert!(ty.validate(&bad).is_err());
    }

    #[test]
    fn normalization_is_a_fixpoint_after_one_pass() {
        let cases: Vec<(VarType, Value)> = vec![
            (VarType::Path, Value::literal("@top_srcdir/include")),
            (
                VarType::List(Box::new(VarType::Path)),
                Value::literal("x/y.cpp"),
            ),
            (
                VarType::List(Box::new(VarType::List(Box::new(VarType::Id)))),
                Value::literal("core"),
            ),
        ];
        for (ty, v) in cases {
            let once = ty.normalize(v);
            ty.validate(&once).unwrap();
            let twice = ty.normalize(once.clone());
            assert_eq!(once, twice);
            ty.validate(&twice).unwrap();
        }
    }
}
