//! Naming conventions for generated identifiers.
//!
//! A [`NamingTransformer`] decides how a symbol's decomposed words are
//! recomposed into a target-language identifier based on the symbol's
//! role. The transformer is the single seam for renaming policy: the
//! emitters never touch raw names directly.

use grpcgen_core::{to_camel_case, to_pascal_case};
use grpcgen_ir::{Symbol, SymbolRole};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NamingError {
    /// A symbol role this transformer has no convention for. Reached when
    /// the symbol model grows a role before the transformer learns it.
    #[error("no naming convention for symbol role {role:?} (symbol `{name}`)")]
    UnknownRole { role: SymbolRole, name: String },
}

/// Role-dispatched renaming policy for one target language.
pub trait NamingTransformer {
    /// Render a symbol as an identifier in the target language.
    fn convert_symbol(&self, symbol: &Symbol) -> Result<String, NamingError>;
}

/// The standard TypeScript conventions: PascalCase types, camelCase
/// fields, an `I` prefix on service interfaces, and pass-through for
/// synthesized names.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformer;

impl NamingTransformer for DefaultTransformer {
    fn convert_symbol(&self, symbol: &Symbol) -> Result<String, NamingError> {
        let words = symbol.decompose();
        match symbol.role() {
            SymbolRole::Enum
            | SymbolRole::EnumValue
            | SymbolRole::Message
            | SymbolRole::Namespace
            | SymbolRole::Procedure => Ok(to_pascal_case(&words)),
            SymbolRole::Field => Ok(to_camel_case(&words)),
            SymbolRole::Service => Ok(format!("I{}", to_pascal_case(&words))),
            SymbolRole::Special => Ok(symbol.name().to_string()),
            role => Err(NamingError::UnknownRole {
                role,
                name: symbol.name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(name: &str, role: SymbolRole) -> String {
        DefaultTransformer
            .convert_symbol(&Symbol::new(name, role))
            .unwrap()
    }

    #[test]
    fn test_pascal_case_roles() {
        assert_eq!(convert("simple_message", SymbolRole::Message), "SimpleMessage");
        assert_eq!(convert("LOGGED_IN", SymbolRole::EnumValue), "LoggedIn");
        assert_eq!(convert("holey_status", SymbolRole::Enum), "HoleyStatus");
        assert_eq!(convert("data", SymbolRole::Namespace), "Data");
        assert_eq!(convert("method1", SymbolRole::Procedure), "Method1");
    }

    #[test]
    fn test_fields_are_camel_case() {
        assert_eq!(convert("some_number", SymbolRole::Field), "someNumber");
        assert_eq!(convert("username", SymbolRole::Field), "username");
    }

    #[test]
    fn test_services_get_interface_prefix() {
        assert_eq!(convert("simple_service", SymbolRole::Service), "ISimpleService");
        assert_eq!(convert("Echo", SymbolRole::Service), "IEcho");
    }

    #[test]
    fn test_special_is_identity() {
        assert_eq!(convert("WeirdName_Kept.As-Is", SymbolRole::Special), "WeirdName_Kept.As-Is");
    }
}
