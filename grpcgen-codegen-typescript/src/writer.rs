//! The top-level TypeScript emitter.
//!
//! Walks a [`ProtoDefinition`] in three passes (messages, enums, services)
//! writing interface modules grouped by namespace, then emits the package
//! definition and the server scaffold next to them.

use eyre::Result;
use grpcgen_codegen::NamingTransformer;
use grpcgen_core::VirtualDirectory;
use grpcgen_ir::{Enum, FieldType, Message, NamespacedSymbol, ProtoDefinition, Service, Symbol, SymbolRole};

use crate::grouping::GroupingGenerator;
use crate::server::ServerGenerator;
use crate::type_mapper::scalar_type;

/// Knobs the emitter takes from configuration.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Display name the server class identifier is derived from.
    pub server_name: String,
    /// Spread request fields as handler parameters instead of passing the
    /// whole request object.
    pub request_body_as_parameters: bool,
    /// File stem for the root module.
    pub default_module: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            server_name: "Proto".to_string(),
            request_body_as_parameters: true,
            default_module: "index".to_string(),
        }
    }
}

/// Deterministic alias for a cross-module import, encoding the raw dotted
/// path so two same-named types from different namespaces never collide.
pub(crate) fn import_alias(symbol: &NamespacedSymbol) -> String {
    format!("IMPORT_{}", symbol.assemble().replace('.', "_"))
}

/// Emits the full TypeScript output tree for one definition.
pub struct TsCodeWriter<'a> {
    definition: &'a ProtoDefinition,
    transformer: &'a dyn NamingTransformer,
    options: &'a GenerationOptions,
}

impl<'a> TsCodeWriter<'a> {
    pub fn new(
        definition: &'a ProtoDefinition,
        transformer: &'a dyn NamingTransformer,
        options: &'a GenerationOptions,
    ) -> Self {
        Self {
            definition,
            transformer,
            options,
        }
    }

    /// Produce the whole output tree: interface modules, the package
    /// definition carrying `descriptor`, and the server scaffold.
    pub fn generate(&self, descriptor: &serde_json::Value) -> Result<VirtualDirectory> {
        let mut definitions =
            GroupingGenerator::new(self.transformer, self.options.default_module.clone());
        for message in self.definition.messages() {
            self.write_message(&mut definitions, message)?;
        }
        for declared in self.definition.enums() {
            self.write_enum(&mut definitions, declared)?;
        }
        for service in self.definition.services() {
            self.write_service(&mut definitions, service)?;
        }

        let mut vd = VirtualDirectory::new();
        definitions.generate(&mut vd)?;
        vd.add_entry(
            "package_definition.ts",
            format!("export const protoJson = {descriptor};\n"),
        )?;
        ServerGenerator::new(self.definition, self.transformer, self.options).generate(&mut vd)?;
        Ok(vd)
    }

    fn write_message(&self, generator: &mut GroupingGenerator, message: &Message) -> Result<()> {
        generator.group(message.symbol.namespace(), |generator| {
            generator.define_interface(message.symbol.name(), |generator| {
                for field in &message.fields {
                    let name = self.transformer.convert_symbol(&field.symbol)?;
                    let marker = if field.optional { "?" } else { "" };
                    let ty = self.type_expression(generator, &field.ty)?;
                    generator.add_line(format!("readonly {name}{marker}: {ty};"));
                }
                Ok(())
            })
        })
    }

    fn write_enum(&self, generator: &mut GroupingGenerator, declared: &Enum) -> Result<()> {
        generator.group(declared.symbol.namespace(), |generator| {
            generator.define_enum(declared.symbol.name(), |generator| {
                for value in &declared.values {
                    let name = self.transformer.convert_symbol(&value.symbol)?;
                    generator.add_line(format!("{name} = {},", value.value));
                }
                Ok(())
            })
        })
    }

    fn write_service(&self, generator: &mut GroupingGenerator, service: &Service) -> Result<()> {
        generator.group(service.symbol.namespace(), |generator| {
            generator.define_interface(service.symbol.name(), |generator| {
                for method in &service.methods {
                    let name = self.transformer.convert_symbol(&method.symbol)?;
                    let parameters = self.method_parameters(generator, &method.input)?;
                    let output = self.type_expression(generator, &method.output)?;
                    generator.add_line(format!("{name}: ({parameters}) => Promise<{output}>;"));
                }
                Ok(())
            })
        })
    }

    /// Parameter list for a service method, per the configured calling
    /// convention. The spread convention requires the request type to be a
    /// concrete message.
    fn method_parameters(
        &self,
        generator: &mut GroupingGenerator,
        input: &FieldType,
    ) -> Result<String> {
        if !self.options.request_body_as_parameters {
            let ty = self.type_expression(generator, input)?;
            return Ok(format!("request: {ty}"));
        }

        let FieldType::Message(symbol) = input else {
            eyre::bail!("spread calling convention requires a message-typed request");
        };
        let message = self.definition.find_message(symbol)?;
        let mut parameters = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            let name = self.transformer.convert_symbol(&field.symbol)?;
            let ty = self.type_expression(generator, &field.ty)?;
            if field.optional {
                parameters.push(format!("{name}: {ty} | undefined"));
            } else {
                parameters.push(format!("{name}: {ty}"));
            }
        }
        Ok(parameters.join(", "))
    }

    /// Render a field type as a TypeScript type expression, registering a
    /// cross-module import when the referenced type lives in another
    /// module. Same-module references use the local name directly.
    fn type_expression(&self, generator: &mut GroupingGenerator, ty: &FieldType) -> Result<String> {
        match ty {
            FieldType::Scalar(kind) => Ok(scalar_type(*kind).to_string()),
            FieldType::Message(symbol) | FieldType::Enum(symbol) => {
                let module: Vec<String> = symbol
                    .namespace()
                    .iter()
                    .map(|part| Ok(self.transformer.convert_symbol(part)?))
                    .collect::<Result<_>>()?;
                let local = self.transformer.convert_symbol(symbol.name())?;
                if module == generator.current_path() {
                    return Ok(local);
                }
                let alias = import_alias(symbol);
                generator.add_import(symbol, Some(&alias))?;
                Ok(alias)
            }
            FieldType::Oneof(alternatives) => {
                let mut parts = Vec::with_capacity(alternatives.len());
                for (name, alternative) in alternatives {
                    let property = self
                        .transformer
                        .convert_symbol(&Symbol::new(name.clone(), SymbolRole::Field))?;
                    let ty = self.type_expression(generator, alternative)?;
                    parts.push(format!("{property}?: {ty};"));
                }
                Ok(format!("{{ {} }}", parts.join(" ")))
            }
            FieldType::Unresolved { access, .. } => {
                eyre::bail!("unresolved reference `{access}` reached the emitter")
            }
        }
    }
}
