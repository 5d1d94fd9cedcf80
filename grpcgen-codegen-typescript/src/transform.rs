//! Two-way field renaming between wire-shaped and named values.
//!
//! The emitted server performs exactly this transformation in TypeScript;
//! implementing it over `serde_json::Value` as well makes the renaming
//! semantics directly testable. Wire values carry raw proto field names,
//! named values carry transformer-converted names, and oneof groups are
//! flattened on the wire side but nested under the group property on the
//! named side. Explicit nulls are preserved; absent keys stay absent;
//! nothing is coerced.

use eyre::{Result, bail};
use grpcgen_codegen::NamingTransformer;
use grpcgen_ir::{FieldType, NamespacedSymbol, ProtoDefinition, Symbol, SymbolRole};
use serde_json::{Map, Value};

/// Rename a wire-shaped request into the named shape for `message`.
pub fn wire_to_named(
    definition: &ProtoDefinition,
    transformer: &dyn NamingTransformer,
    message: &NamespacedSymbol,
    value: &Value,
) -> Result<Value> {
    let Value::Object(wire) = value else {
        bail!("wire value for `{}` is not an object", message.assemble());
    };
    let message = definition.find_message(message)?;

    let mut named = Map::new();
    for field in &message.fields {
        let name = transformer.convert_symbol(&field.symbol)?;
        match &field.ty {
            FieldType::Oneof(alternatives) => {
                let mut group = Map::new();
                for (alt_raw, alternative) in alternatives {
                    let alt_name =
                        transformer.convert_symbol(&Symbol::new(alt_raw.clone(), SymbolRole::Field))?;
                    if let Some(alt_value) = wire.get(alt_raw) {
                        group.insert(
                            alt_name,
                            translate_value(definition, transformer, alternative, alt_value, true)?,
                        );
                    }
                }
                named.insert(name, Value::Object(group));
            }
            ty => {
                if let Some(field_value) = wire.get(field.symbol.name()) {
                    named.insert(
                        name,
                        translate_value(definition, transformer, ty, field_value, true)?,
                    );
                }
            }
        }
    }
    Ok(Value::Object(named))
}

/// Rename a named response back into the wire shape for `message`.
pub fn named_to_wire(
    definition: &ProtoDefinition,
    transformer: &dyn NamingTransformer,
    message: &NamespacedSymbol,
    value: &Value,
) -> Result<Value> {
    let Value::Object(named) = value else {
        bail!("named value for `{}` is not an object", message.assemble());
    };
    let message = definition.find_message(message)?;

    let mut wire = Map::new();
    for field in &message.fields {
        let name = transformer.convert_symbol(&field.symbol)?;
        match &field.ty {
            FieldType::Oneof(alternatives) => {
                let group = match named.get(&name) {
                    Some(Value::Object(group)) => group,
                    Some(Value::Null) | None => continue,
                    Some(_) => bail!(
                        "oneof group `{}` of `{}` is not an object",
                        field.symbol.name(),
                        message.symbol.assemble()
                    ),
                };
                for (alt_raw, alternative) in alternatives {
                    let alt_name =
                        transformer.convert_symbol(&Symbol::new(alt_raw.clone(), SymbolRole::Field))?;
                    if let Some(alt_value) = group.get(&alt_name) {
                        wire.insert(
                            alt_raw.clone(),
                            translate_value(definition, transformer, alternative, alt_value, false)?,
                        );
                    }
                }
            }
            ty => {
                if let Some(field_value) = named.get(&name) {
                    wire.insert(
                        field.symbol.name().to_string(),
                        translate_value(definition, transformer, ty, field_value, false)?,
                    );
                }
            }
        }
    }
    Ok(Value::Object(wire))
}

fn translate_value(
    definition: &ProtoDefinition,
    transformer: &dyn NamingTransformer,
    ty: &FieldType,
    value: &Value,
    to_named: bool,
) -> Result<Value> {
    match ty {
        FieldType::Message(symbol) if !value.is_null() => {
            if to_named {
                wire_to_named(definition, transformer, symbol, value)
            } else {
                named_to_wire(definition, transformer, symbol, value)
            }
        }
        _ => Ok(value.clone()),
    }
}
