//! Field type representation.

use indexmap::IndexMap;

use crate::{NamespacedSymbol, Symbol};

/// Built-in scalar types recognized by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int32,
    Uint32,
    Int64,
    Uint64,
}

impl ScalarKind {
    /// Look up a built-in scalar by its wire type name. Exact and
    /// case-sensitive; anything else is a user-defined type reference.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "int32" => Some(Self::Int32),
            "uint32" => Some(Self::Uint32),
            "int64" => Some(Self::Int64),
            "uint64" => Some(Self::Uint64),
            _ => None,
        }
    }
}

/// The type of a message field or method payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarKind),
    Message(NamespacedSymbol),
    Enum(NamespacedSymbol),
    /// A oneof group: ordered mapping of alternative name to its type.
    Oneof(IndexMap<String, FieldType>),
    /// A reference that could not be resolved during the scan phase.
    /// Only legal while the definition is being built; the fixup pass
    /// replaces every occurrence or fails the build.
    Unresolved {
        access: String,
        scope: Vec<Symbol>,
    },
}

impl FieldType {
    /// The referenced symbol, for message and enum references.
    pub fn symbol(&self) -> Option<&NamespacedSymbol> {
        match self {
            Self::Message(symbol) | Self::Enum(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Unresolved { .. } => false,
            Self::Oneof(alternatives) => alternatives.values().all(FieldType::is_resolved),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_lookup_is_case_sensitive() {
        assert_eq!(ScalarKind::from_name("string"), Some(ScalarKind::String));
        assert_eq!(ScalarKind::from_name("uint32"), Some(ScalarKind::Uint32));
        assert_eq!(ScalarKind::from_name("String"), None);
        assert_eq!(ScalarKind::from_name("UINT32"), None);
        assert_eq!(ScalarKind::from_name("bytes"), None);
    }

    #[test]
    fn test_oneof_resolution_state_is_recursive() {
        let mut alternatives = IndexMap::new();
        alternatives.insert("a".to_string(), FieldType::Scalar(ScalarKind::String));
        assert!(FieldType::Oneof(alternatives.clone()).is_resolved());

        alternatives.insert(
            "b".to_string(),
            FieldType::Unresolved {
                access: "Missing".to_string(),
                scope: Vec::new(),
            },
        );
        assert!(!FieldType::Oneof(alternatives).is_resolved());
    }
}
