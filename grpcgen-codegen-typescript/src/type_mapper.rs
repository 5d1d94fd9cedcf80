//! Scalar type mapping for TypeScript.

use grpcgen_ir::ScalarKind;

/// Map a proto scalar to its nearest native TypeScript type. All integer
/// kinds collapse to `number`; precision loss beyond the safe-integer
/// range is accepted.
pub fn scalar_type(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::String => "string",
        ScalarKind::Int32 | ScalarKind::Uint32 | ScalarKind::Int64 | ScalarKind::Uint64 => "number",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_kinds_collapse_to_number() {
        assert_eq!(scalar_type(ScalarKind::String), "string");
        assert_eq!(scalar_type(ScalarKind::Int32), "number");
        assert_eq!(scalar_type(ScalarKind::Uint32), "number");
        assert_eq!(scalar_type(ScalarKind::Int64), "number");
        assert_eq!(scalar_type(ScalarKind::Uint64), "number");
    }
}
