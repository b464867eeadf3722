//! Property-based checks for value normalization and validation.

use proptest::prelude::*;

use vcxgen::{Anchor, Value, VarType};

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}".prop_map(|s| s)
}

proptest! {
    // Normalization must be a fixpoint: feeding a normalized value back in
    // changes nothing, so regeneration never drifts.
    #[test]
    fn normalize_is_idempotent_for_paths(parts in prop::collection::vec(word(), 1..5)) {
        let ty = VarType::Path;
        let raw = Value::literal(parts.join("/"));
        let once = ty.normalize(raw);
        prop_assert_eq!(once.clone(), ty.normalize(once));
    }

    #[test]
    fn normalize_is_idempotent_for_lists(items in prop::collection::vec(word(), 0..6)) {
        let ty = VarType::List(Box::new(VarType::Any));
        let raw = Value::List(items.into_iter().map(Value::literal).collect());
        let once = ty.normalize(raw);
        prop_assert_eq!(once.clone(), ty.normalize(once));
    }

    #[test]
    fn path_normalization_splits_components(parts in prop::collection::vec(word(), 1..5)) {
        let raw = Value::literal(parts.join("/"));
        match VarType::Path.normalize(raw) {
            Value::Path(p) => {
                prop_assert_eq!(p.components, parts);
                prop_assert_eq!(p.anchor, Anchor::SrcDir);
            }
            other => prop_assert!(false, "expected a path, got {:?}", other),
        }
    }

    #[test]
    fn list_normalization_wraps_scalars(item in word()) {
        let ty = VarType::List(Box::new(VarType::Any));
        match ty.normalize(Value::literal(&item)) {
            Value::List(items) => prop_assert_eq!(items, vec![Value::literal(item)]),
            other => prop_assert!(false, "expected a list, got {:?}", other),
        }
    }

    // Enum admits exactly its declared values.
    #[test]
    fn enum_accepts_only_allowed_values(allowed in prop::collection::vec(word(), 1..4), candidate in word()) {
        let ty = VarType::Enum(allowed.clone());
        let ok = ty.validate(&Value::literal(&candidate)).is_ok();
        prop_assert_eq!(ok, allowed.contains(&candidate));
    }

    #[test]
    fn bool_round_trips_through_normalize(flag in any::<bool>()) {
        let raw = Value::literal(if flag { "true" } else { "false" });
        let normalized = VarType::Bool.normalize(raw);
        prop_assert!(VarType::Bool.validate(&normalized).is_ok());
        prop_assert_eq!(normalized.as_bool(), Some(flag));
    }
}
