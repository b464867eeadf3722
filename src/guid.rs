//! Deterministic GUID identity for generated projects and solution groups
//!
//! Identity must be stable across regenerations, so GUIDs are name-based
//! (UUID v5) over a fixed namespace plus the owning scope and the item name.

use uuid::Uuid;

/// Namespace for project GUIDs.
pub const NAMESPACE_PROJECT: Uuid = Uuid::from_u128(0xd9bd5916_f055_4d77_8c69_9448e02bf433);
/// Namespace for solution-group (module) GUIDs.
pub const NAMESPACE_SLN_GROUP: Uuid = Uuid::from_u128(0x2d0c29e0_512f_47be_9ac4_f4cae74ae16e);
/// Namespace for internal synthetic entries (e.g. the extra-dependencies folder).
pub const NAMESPACE_INTERNAL: Uuid = Uuid::from_u128(0xbaa4019e_6d67_4ef1_b3cb_ae6cd82e4060);

/// A project or solution-group identifier, rendered by default in the
/// braced uppercase form the solution format expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(Uuid);

impl Guid {
    /// Derive the GUID for `name` within `scope` under `namespace`.
    /// The same inputs always produce the same GUID.
    pub fn from_name(namespace: &Uuid, scope: &str, name: &str) -> Guid {
        Guid(Uuid::new_v5(
            namespace,
            format!("{scope}/{name}").as_bytes(),
        ))
    }

    /// Braced lowercase form, used by project-to-project references.
    pub fn braced_lower(&self) -> String {
        format!("{{{}}}", self.0)
    }
}

impl std::str::FromStr for Guid {
    type Err = uuid::Error;

    /// Parse a GUID in hyphenated form, with or without braces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim_start_matches('{').trim_end_matches('}')).map(Guid)
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated().to_string().to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = Guid::from_name(&NAMESPACE_PROJECT, "mymodule", "mylib");
        let b = Guid::from_name(&NAMESPACE_PROJECT, "mymodule", "mylib");
        assert_eq!(a, b);
    }

    #[test]
    fn scope_and_namespace_both_matter() {
        let a = Guid::from_name(&NAMESPACE_PROJECT, "m1", "lib");
        let b = Guid::from_name(&NAMESPACE_PROJECT, "m2", "lib");
        let c = Guid::from_name(&NAMESPACE_SLN_GROUP, "m1", "lib");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn parse_round_trips_display() {
        let g = Guid::from_name(&NAMESPACE_PROJECT, "m", "t");
        let parsed: Guid = g.to_string().parse().unwrap();
        assert_eq!(parsed, g);
        assert!("not-a-guid".parse::<Guid>().is_err());
    }

    #[test]
    fn display_is_braced_uppercase() {
        let g = Guid::from_name(&NAMESPACE_PROJECT, "m", "t");
        let s = g.to_string();
        assert!(s.starts_with('{') && s.ends_with('}'));
        assert_eq!(s.len(), 38);
        assert_eq!(s, s.to_uppercase());
        assert_eq!(g.braced_lower(), s.to_lowercase());
    }
}
