//! Server scaffold emission.
//!
//! Emits one root-level module containing the transport seam, the status
//! error types, a pair of field-renaming translation functions per message
//! reachable from a service method, and the server class itself. The class
//! exposes one `Add<Namespace...><Service>` method per service; each
//! registers a dispatch entry mapping the wire method path to an adapter
//! that renames request fields wire->named, invokes the typed handler, and
//! renames the response back.

use eyre::Result;
use grpcgen_codegen::NamingTransformer;
use grpcgen_core::{VirtualDirectory, to_pascal_case};
use grpcgen_ir::{
    FieldType, Message, Method, NamespacedSymbol, ProtoDefinition, Service, Symbol, SymbolRole,
};
use indexmap::IndexMap;

use crate::grouping::GroupingGenerator;
use crate::writer::{GenerationOptions, import_alias};

const GRPC_STATUS_VALUES: &[(&str, i32)] = &[
    ("OK", 0),
    ("CANCELLED", 1),
    ("UNKNOWN", 2),
    ("INVALID_ARGUMENT", 3),
    ("DEADLINE_EXCEEDED", 4),
    ("NOT_FOUND", 5),
    ("ALREADY_EXISTS", 6),
    ("PERMISSION_DENIED", 7),
    ("RESOURCE_EXHAUSTED", 8),
    ("FAILED_PRECONDITION", 9),
    ("ABORTED", 10),
    ("OUT_OF_RANGE", 11),
    ("UNIMPLEMENTED", 12),
    ("INTERNAL", 13),
    ("UNAVAILABLE", 14),
    ("DATA_LOSS", 15),
    ("UNAUTHENTICATED", 16),
];

pub(crate) struct ServerGenerator<'a> {
    definition: &'a ProtoDefinition,
    transformer: &'a dyn NamingTransformer,
    options: &'a GenerationOptions,
}

impl<'a> ServerGenerator<'a> {
    pub(crate) fn new(
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

    pub(crate) fn generate(&self, vd: &mut VirtualDirectory) -> Result<()> {
        let class_name = format!("{}Server", self.options.server_name);
        let mut generator =
            GroupingGenerator::new(self.transformer, self.options.default_module.clone());
        let group = [Symbol::new(class_name.clone(), SymbolRole::Special)];
        generator.group(&group, |generator| {
            let translated = self.collect_messages()?;
            for symbol in translated.values() {
                generator.add_import(symbol, Some(&import_alias(symbol)))?;
            }
            for service in self.definition.services() {
                generator.add_import(&service.symbol, Some(&import_alias(&service.symbol)))?;
            }

            self.write_support(generator)?;
            for symbol in translated.values() {
                let message = self.definition.find_message(symbol)?;
                self.write_wire_to_named(generator, symbol, message)?;
                self.write_named_to_wire(generator, symbol, message)?;
            }
            self.write_class(generator, &class_name)?;
            Ok(())
        })?;
        generator.generate(vd)
    }

    /// Every message reachable from a service method signature, including
    /// messages nested through fields and oneof alternatives.
    fn collect_messages(&self) -> Result<IndexMap<String, NamespacedSymbol>> {
        let mut found: IndexMap<String, NamespacedSymbol> = IndexMap::new();
        let mut queue: Vec<NamespacedSymbol> = Vec::new();
        for service in self.definition.services() {
            for method in &service.methods {
                for ty in [&method.input, &method.output] {
                    if let FieldType::Message(symbol) = ty {
                        queue.push(symbol.clone());
                    }
                }
            }
        }
        while let Some(symbol) = queue.pop() {
            let fq_name = symbol.assemble();
            if found.contains_key(&fq_name) {
                continue;
            }
            let message = self.definition.find_message(&symbol)?;
            found.insert(fq_name, symbol);
            for field in &message.fields {
                collect_from_type(&field.ty, &mut queue);
            }
        }
        Ok(found)
    }

    fn write_support(&self, generator: &mut GroupingGenerator) -> Result<()> {
        generator.add_line("export enum GrpcStatus {");
        generator.indent();
        for (name, value) in GRPC_STATUS_VALUES {
            generator.add_line(format!("{name} = {value},"));
        }
        generator.unindent()?;
        generator.add_line("}");

        generator.add_line("export class GrpcResponseError extends Error {");
        generator.indent();
        generator.add_line("constructor(public readonly grpcErrorCode: GrpcStatus) {");
        generator.indent();
        generator.add_line("super(`grpc call failed with status ${GrpcStatus[grpcErrorCode]}`);");
        generator.unindent()?;
        generator.add_line("}");
        generator.unindent()?;
        generator.add_line("}");

        generator.add_line("export interface ServerTransport {");
        generator.indent();
        generator
            .add_line("addMethod(path: string, handler: (request: unknown) => Promise<unknown>): void;");
        generator.unindent()?;
        generator.add_line("}");
        Ok(())
    }

    fn write_wire_to_named(
        &self,
        generator: &mut GroupingGenerator,
        symbol: &NamespacedSymbol,
        message: &Message,
    ) -> Result<()> {
        let alias = import_alias(symbol);
        generator.add_line(format!(
            "function {}(value: any): {alias} {{",
            wire_to_named_fn(symbol)
        ));
        generator.indent();
        generator.add_line("return {");
        generator.indent();
        for field in &message.fields {
            let named = self.transformer.convert_symbol(&field.symbol)?;
            let raw = field.symbol.name();
            match &field.ty {
                FieldType::Scalar(_) | FieldType::Enum(_) => {
                    generator.add_line(format!("{named}: value[\"{raw}\"],"));
                }
                FieldType::Message(target) => {
                    let translate = wire_to_named_fn(target);
                    generator.add_line(format!(
                        "{named}: value[\"{raw}\"] === undefined ? undefined : {translate}(value[\"{raw}\"]),"
                    ));
                }
                FieldType::Oneof(alternatives) => {
                    generator.add_line(format!("{named}: {{"));
                    generator.indent();
                    for (alt_raw, alternative) in alternatives {
                        let alt_named = self
                            .transformer
                            .convert_symbol(&Symbol::new(alt_raw.clone(), SymbolRole::Field))?;
                        if let FieldType::Message(target) = alternative {
                            let translate = wire_to_named_fn(target);
                            generator.add_line(format!(
                                "{alt_named}: value[\"{alt_raw}\"] === undefined ? undefined : {translate}(value[\"{alt_raw}\"]),"
                            ));
                        } else {
                            generator.add_line(format!("{alt_named}: value[\"{alt_raw}\"],"));
                        }
                    }
                    generator.unindent()?;
                    generator.add_line("},");
                }
                FieldType::Unresolved { access, .. } => {
                    eyre::bail!("unresolved reference `{access}` reached the emitter")
                }
            }
        }
        generator.unindent()?;
        generator.add_line("};");
        generator.unindent()?;
        generator.add_line("}");
        Ok(())
    }

    fn write_named_to_wire(
        &self,
        generator: &mut GroupingGenerator,
        symbol: &NamespacedSymbol,
        message: &Message,
    ) -> Result<()> {
        let alias = import_alias(symbol);
        generator.add_line(format!(
            "function {}(value: {alias}): any {{",
            named_to_wire_fn(symbol)
        ));
        generator.indent();
        generator.add_line("return {");
        generator.indent();
        for field in &message.fields {
            let named = self.transformer.convert_symbol(&field.symbol)?;
            let raw = field.symbol.name();
            match &field.ty {
                FieldType::Scalar(_) | FieldType::Enum(_) => {
                    generator.add_line(format!("\"{raw}\": value.{named},"));
                }
                FieldType::Message(target) => {
                    let translate = named_to_wire_fn(target);
                    generator.add_line(format!(
                        "\"{raw}\": value.{named} === undefined ? undefined : {translate}(value.{named}),"
                    ));
                }
                // oneof alternatives are flattened back to the wire level
                FieldType::Oneof(alternatives) => {
                    for (alt_raw, alternative) in alternatives {
                        let alt_named = self
                            .transformer
                            .convert_symbol(&Symbol::new(alt_raw.clone(), SymbolRole::Field))?;
                        if let FieldType::Message(target) = alternative {
                            let translate = named_to_wire_fn(target);
                            generator.add_line(format!(
                                "\"{alt_raw}\": value.{named} === undefined || value.{named}.{alt_named} === undefined ? undefined : {translate}(value.{named}.{alt_named}),"
                            ));
                        } else {
                            generator.add_line(format!(
                                "\"{alt_raw}\": value.{named} === undefined ? undefined : value.{named}.{alt_named},"
                            ));
                        }
                    }
                }
                FieldType::Unresolved { access, .. } => {
                    eyre::bail!("unresolved reference `{access}` reached the emitter")
                }
            }
        }
        generator.unindent()?;
        generator.add_line("};");
        generator.unindent()?;
        generator.add_line("}");
        Ok(())
    }

    fn write_class(&self, generator: &mut GroupingGenerator, class_name: &str) -> Result<()> {
        generator.add_line(format!("export class {class_name} {{"));
        generator.indent();
        generator.add_line("constructor(private readonly transport: ServerTransport) {}");
        for service in self.definition.services() {
            self.write_add_method(generator, service)?;
        }
        generator.unindent()?;
        generator.add_line("}");
        Ok(())
    }

    fn write_add_method(&self, generator: &mut GroupingGenerator, service: &Service) -> Result<()> {
        let mut add_name = String::from("Add");
        for part in service.symbol.namespace() {
            add_name.push_str(&to_pascal_case(&part.decompose()));
        }
        add_name.push_str(&to_pascal_case(&service.symbol.name().decompose()));

        generator.add_line(format!(
            "{add_name}(service: {}): void {{",
            import_alias(&service.symbol)
        ));
        generator.indent();
        for method in &service.methods {
            self.write_method_registration(generator, service, method)?;
        }
        generator.unindent()?;
        generator.add_line("}");
        Ok(())
    }

    fn write_method_registration(
        &self,
        generator: &mut GroupingGenerator,
        service: &Service,
        method: &Method,
    ) -> Result<()> {
        let (FieldType::Message(input), FieldType::Message(output)) =
            (&method.input, &method.output)
        else {
            eyre::bail!(
                "method `{}` of `{}` must take and return messages",
                method.symbol.name(),
                service.symbol.assemble()
            );
        };
        let path = format!("/{}/{}", service.symbol.assemble(), method.symbol.name());
        let method_name = self.transformer.convert_symbol(&method.symbol)?;

        let invocation = if self.options.request_body_as_parameters {
            let message = self.definition.find_message(input)?;
            let arguments = message
                .fields
                .iter()
                .map(|field| {
                    Ok(format!(
                        "named.{}",
                        self.transformer.convert_symbol(&field.symbol)?
                    ))
                })
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            format!("service.{method_name}({arguments})")
        } else {
            format!("service.{method_name}(named)")
        };

        generator.add_line(format!(
            "this.transport.addMethod(\"{path}\", (request) => {{"
        ));
        generator.indent();
        generator.add_line(format!(
            "const named = {}(request as any);",
            wire_to_named_fn(input)
        ));
        generator.add_line(format!("return Promise.resolve({invocation})"));
        generator.indent();
        generator.add_line(format!(
            ".then((response) => {}(response) as unknown)",
            named_to_wire_fn(output)
        ));
        generator.add_line(".catch((error) => {");
        generator.indent();
        generator.add_line("if (error instanceof GrpcResponseError) {");
        generator.indent();
        generator.add_line("throw new GrpcResponseError(error.grpcErrorCode);");
        generator.unindent()?;
        generator.add_line("}");
        generator.add_line("console.error(error);");
        generator.add_line("throw new GrpcResponseError(GrpcStatus.INTERNAL);");
        generator.unindent()?;
        generator.add_line("});");
        generator.unindent()?;
        generator.unindent()?;
        generator.add_line("});");
        Ok(())
    }
}

fn collect_from_type(ty: &FieldType, queue: &mut Vec<NamespacedSymbol>) {
    match ty {
        FieldType::Message(symbol) => queue.push(symbol.clone()),
        FieldType::Oneof(alternatives) => {
            for alternative in alternatives.values() {
                collect_from_type(alternative, queue);
            }
        }
        _ => {}
    }
}

fn wire_to_named_fn(symbol: &NamespacedSymbol) -> String {
    format!("wireToNamed_{}", symbol.assemble().replace('.', "_"))
}

fn named_to_wire_fn(symbol: &NamespacedSymbol) -> String {
    format!("namedToWire_{}", symbol.assemble().replace('.', "_"))
}
