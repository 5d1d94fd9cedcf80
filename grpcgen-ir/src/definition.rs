//! The resolved definition model.
//!
//! [`ProtoDefinition`] is a queryable graph of every message, enum and
//! service in a compilation unit, keyed by fully-qualified dotted name.
//! Construction is two-phase: [`DefinitionBuilder`] scans the reflection
//! tree depth-first, resolving type references eagerly where possible and
//! recording [`FieldType::Unresolved`] placeholders for forward and
//! cross-namespace references; `finish` then re-runs the same
//! namespace-climbing search over every placeholder, now that the full
//! mapping is populated, and produces the immutable model. The model is
//! never mutated after that.

use indexmap::IndexMap;

use crate::{
    Error, FieldType, NamespacedSymbol, ReflectionField, ReflectionMethod, ReflectionNode, Result,
    ScalarKind, Symbol, SymbolRole,
};

/// Which mapping a reference is expected to land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

/// A message field. Fields of a message are kept sorted by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub symbol: Symbol,
    pub ty: FieldType,
    /// Wire tag; doubles as the ordering key.
    pub id: u32,
    pub optional: bool,
}

/// A message declaration with its fields in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub symbol: NamespacedSymbol,
    pub fields: Vec<Field>,
}

impl Message {
    /// Ordered insert keyed on `id`.
    fn insert_field(&mut self, field: Field) {
        let index = match self.fields.binary_search_by_key(&field.id, |f| f.id) {
            Ok(index) | Err(index) => index,
        };
        self.fields.insert(index, field);
    }
}

/// A single enum value. Values need not be contiguous or unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub symbol: Symbol,
    pub value: i32,
}

/// An enum declaration with its values in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub symbol: NamespacedSymbol,
    pub values: Vec<EnumValue>,
}

/// A service method. Input and output always resolve to messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub symbol: Symbol,
    pub input: FieldType,
    pub output: FieldType,
}

/// A service declaration with its methods in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub symbol: NamespacedSymbol,
    pub methods: Vec<Method>,
}

/// The resolved, read-only model of a compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtoDefinition {
    messages: IndexMap<String, Message>,
    enums: IndexMap<String, Enum>,
    services: IndexMap<String, Service>,
}

impl ProtoDefinition {
    /// Build the model from a reflection tree.
    ///
    /// Fails with [`Error::UnresolvedReference`] if any type reference
    /// cannot be found anywhere up the enclosing-namespace chain after the
    /// fixup pass, or [`Error::MalformedOneof`] for invalid oneof groups.
    pub fn from_reflection(root: &ReflectionNode) -> Result<Self> {
        let mut builder = DefinitionBuilder::default();
        if let ReflectionNode::Namespace { nested } = root {
            builder.scan(&mut Vec::new(), nested)?;
        }
        builder.finish()
    }

    /// Messages in depth-first declaration order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Enums in depth-first declaration order.
    pub fn enums(&self) -> impl Iterator<Item = &Enum> {
        self.enums.values()
    }

    /// Services in depth-first declaration order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Exact lookup by fully-qualified name. A miss is a caller contract
    /// violation, not a recoverable condition.
    pub fn find_message(&self, symbol: &NamespacedSymbol) -> Result<&Message> {
        let name = symbol.assemble();
        self.messages.get(&name).ok_or(Error::NotFound {
            kind: "message",
            name,
        })
    }

    /// Exact lookup by fully-qualified name, for enums.
    pub fn find_enum(&self, symbol: &NamespacedSymbol) -> Result<&Enum> {
        let name = symbol.assemble();
        self.enums.get(&name).ok_or(Error::NotFound {
            kind: "enum",
            name,
        })
    }
}

/// Phase-one accumulator. Holds the same maps as [`ProtoDefinition`] but
/// with provisional [`FieldType::Unresolved`] entries still allowed.
#[derive(Debug, Default)]
struct DefinitionBuilder {
    messages: IndexMap<String, Message>,
    enums: IndexMap<String, Enum>,
    services: IndexMap<String, Service>,
}

impl DefinitionBuilder {
    fn scan(
        &mut self,
        namespace: &mut Vec<Symbol>,
        nested: &IndexMap<String, ReflectionNode>,
    ) -> Result<()> {
        for (name, node) in nested {
            match node {
                ReflectionNode::Namespace { nested } => {
                    namespace.push(Symbol::new(name, SymbolRole::Namespace));
                    self.scan(namespace, nested)?;
                    namespace.pop();
                }
                ReflectionNode::Enum { values } => self.add_enum(namespace, name, values),
                ReflectionNode::Message { fields, oneofs } => {
                    self.add_message(namespace, name, fields, oneofs)?;
                }
                ReflectionNode::Service { methods } => self.add_service(namespace, name, methods),
            }
        }
        Ok(())
    }

    fn add_enum(&mut self, namespace: &[Symbol], name: &str, values: &IndexMap<String, i32>) {
        let symbol = NamespacedSymbol::new(
            namespace.to_vec(),
            Symbol::new(name, SymbolRole::Enum),
        );
        let definition = Enum {
            values: values
                .iter()
                .map(|(value_name, value)| EnumValue {
                    symbol: Symbol::new(value_name, SymbolRole::EnumValue),
                    value: *value,
                })
                .collect(),
            symbol,
        };
        self.enums.insert(definition.symbol.assemble(), definition);
    }

    fn add_message(
        &mut self,
        namespace: &[Symbol],
        name: &str,
        fields: &IndexMap<String, ReflectionField>,
        oneofs: &IndexMap<String, Vec<String>>,
    ) -> Result<()> {
        let symbol = NamespacedSymbol::new(
            namespace.to_vec(),
            Symbol::new(name, SymbolRole::Message),
        );
        let fq_name = symbol.assemble();

        let mut flat: IndexMap<String, Field> = IndexMap::with_capacity(fields.len());
        for (field_name, field) in fields {
            flat.insert(
                field_name.clone(),
                Field {
                    symbol: Symbol::new(field_name, SymbolRole::Field),
                    ty: self.resolve_type(namespace, &field.type_name, None),
                    id: field.id,
                    optional: field.optional,
                },
            );
        }

        for (group_name, members) in oneofs {
            self.fold_oneof(&fq_name, group_name, members, &mut flat)?;
        }

        let mut message = Message {
            symbol,
            fields: Vec::with_capacity(flat.len()),
        };
        for (_, field) in flat {
            message.insert_field(field);
        }
        self.messages.insert(fq_name, message);
        Ok(())
    }

    /// Replace a oneof group's member fields with one synthetic field of
    /// oneof type, positioned at the minimum member id. A one-member group
    /// wrapping an `optional` field is proto3's encoding of true optionals
    /// and is unwrapped instead of folded.
    fn fold_oneof(
        &mut self,
        message_name: &str,
        group_name: &str,
        members: &[String],
        flat: &mut IndexMap<String, Field>,
    ) -> Result<()> {
        let malformed = |reason: String| Error::MalformedOneof {
            message: message_name.to_string(),
            group: group_name.to_string(),
            reason,
        };

        if let [member] = members {
            let field = flat
                .get(member)
                .ok_or_else(|| malformed(format!("references unknown field `{member}`")))?;
            if field.optional {
                return Ok(());
            }
        }

        let mut alternatives = IndexMap::with_capacity(members.len());
        let mut group_id = u32::MAX;
        for member in members {
            let field = flat
                .shift_remove(member)
                .ok_or_else(|| malformed(format!("references unknown field `{member}`")))?;
            if field.optional {
                return Err(malformed(format!(
                    "optional field `{member}` cannot be a oneof member"
                )));
            }
            group_id = group_id.min(field.id);
            alternatives.insert(member.clone(), field.ty);
        }

        flat.insert(
            group_name.to_string(),
            Field {
                symbol: Symbol::new(group_name, SymbolRole::Field),
                ty: FieldType::Oneof(alternatives),
                id: group_id,
                optional: false,
            },
        );
        Ok(())
    }

    fn add_service(
        &mut self,
        namespace: &[Symbol],
        name: &str,
        methods: &IndexMap<String, ReflectionMethod>,
    ) {
        let symbol = NamespacedSymbol::new(
            namespace.to_vec(),
            Symbol::new(name, SymbolRole::Service),
        );
        let definition = Service {
            methods: methods
                .iter()
                .map(|(method_name, method)| Method {
                    symbol: Symbol::new(method_name, SymbolRole::Procedure),
                    input: self.resolve_type(
                        namespace,
                        &method.request_type,
                        Some(TypeKind::Message),
                    ),
                    output: self.resolve_type(
                        namespace,
                        &method.response_type,
                        Some(TypeKind::Message),
                    ),
                })
                .collect(),
            symbol,
        };
        self.services
            .insert(definition.symbol.assemble(), definition);
    }

    /// Resolve an access string against the current mappings.
    ///
    /// Built-in scalar names win outright. Otherwise the namespace scope is
    /// climbed from most-specific to root, checking `scope.access` at each
    /// level; a match of the wrong kind is skipped, not accepted. The
    /// innermost iteration with an empty prefix is the final unqualified
    /// top-level check. Anything still unknown comes back as
    /// [`FieldType::Unresolved`], which is only legal before `finish`.
    fn resolve_type(
        &self,
        scope: &[Symbol],
        access: &str,
        expected: Option<TypeKind>,
    ) -> FieldType {
        if expected.is_none()
            && let Some(kind) = ScalarKind::from_name(access)
        {
            return FieldType::Scalar(kind);
        }

        for depth in (0..=scope.len()).rev() {
            let mut candidate = String::new();
            for part in &scope[..depth] {
                candidate.push_str(part.name());
                candidate.push('.');
            }
            candidate.push_str(access);

            if expected != Some(TypeKind::Enum) && self.messages.contains_key(&candidate) {
                return FieldType::Message(NamespacedSymbol::from_dotted(
                    &candidate,
                    SymbolRole::Message,
                ));
            }
            if expected != Some(TypeKind::Message) && self.enums.contains_key(&candidate) {
                return FieldType::Enum(NamespacedSymbol::from_dotted(
                    &candidate,
                    SymbolRole::Enum,
                ));
            }
        }

        FieldType::Unresolved {
            access: access.to_string(),
            scope: scope.to_vec(),
        }
    }

    /// Fixup pass: re-resolve every provisional reference against the now
    /// complete mappings and freeze the model.
    fn finish(self) -> Result<ProtoDefinition> {
        let mut messages = IndexMap::with_capacity(self.messages.len());
        for (fq_name, message) in &self.messages {
            let fields = message
                .fields
                .iter()
                .map(|field| {
                    Ok(Field {
                        symbol: field.symbol.clone(),
                        ty: self.finalize_type(&field.ty, None)?,
                        id: field.id,
                        optional: field.optional,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            messages.insert(
                fq_name.clone(),
                Message {
                    symbol: message.symbol.clone(),
                    fields,
                },
            );
        }

        let mut services = IndexMap::with_capacity(self.services.len());
        for (fq_name, service) in &self.services {
            let methods = service
                .methods
                .iter()
                .map(|method| {
                    Ok(Method {
                        symbol: method.symbol.clone(),
                        input: self.finalize_type(&method.input, Some(TypeKind::Message))?,
                        output: self.finalize_type(&method.output, Some(TypeKind::Message))?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            services.insert(
                fq_name.clone(),
                Service {
                    symbol: service.symbol.clone(),
                    methods,
                },
            );
        }

        Ok(ProtoDefinition {
            messages,
            enums: self.enums.clone(),
            services,
        })
    }

    fn finalize_type(&self, ty: &FieldType, expected: Option<TypeKind>) -> Result<FieldType> {
        match ty {
            FieldType::Unresolved { access, scope } => {
                match self.resolve_type(scope, access, expected) {
                    FieldType::Unresolved { access, scope } => Err(Error::UnresolvedReference {
                        access,
                        namespace: scope
                            .iter()
                            .map(Symbol::name)
                            .collect::<Vec<_>>()
                            .join("."),
                    }),
                    resolved => Ok(resolved),
                }
            }
            FieldType::Oneof(alternatives) => {
                let alternatives = alternatives
                    .iter()
                    .map(|(name, alternative)| {
                        Ok((name.clone(), self.finalize_type(alternative, None)?))
                    })
                    .collect::<Result<IndexMap<_, _>>>()?;
                Ok(FieldType::Oneof(alternatives))
            }
            resolved => Ok(resolved.clone()),
        }
    }
}
