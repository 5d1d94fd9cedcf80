//! Boundary adapter for the external reflection library.
//!
//! The descriptor loader hands us a loosely-typed namespace tree (the JSON
//! shape produced by protobuf.js). This module converts it once, at the
//! boundary, into an explicit tagged union so the rest of the crate never
//! inspects raw shape again. A node is classified by the presence of
//! `nested`, `values`, `fields` or `methods`, in that priority order.

use indexmap::IndexMap;
use serde::Deserialize;

/// One node of the reflection tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionNode {
    Namespace {
        nested: IndexMap<String, ReflectionNode>,
    },
    Enum {
        values: IndexMap<String, i32>,
    },
    Message {
        fields: IndexMap<String, ReflectionField>,
        /// Oneof group name to member field names, in declaration order.
        oneofs: IndexMap<String, Vec<String>>,
    },
    Service {
        methods: IndexMap<String, ReflectionMethod>,
    },
}

/// A declared message field, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionField {
    /// Scalar name or (possibly partial) dotted type reference.
    pub type_name: String,
    /// Wire tag, also the declaration ordinal.
    pub id: u32,
    pub optional: bool,
}

/// A declared service method, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionMethod {
    pub request_type: String,
    pub response_type: String,
}

impl ReflectionNode {
    /// Convert a protobuf.js JSON descriptor into the tagged tree.
    pub fn from_descriptor(value: &serde_json::Value) -> serde_json::Result<Self> {
        let raw: RawNode = RawNode::deserialize(value)?;
        Ok(raw.classify())
    }

    /// Parse a descriptor from its JSON text form.
    pub fn from_descriptor_str(text: &str) -> serde_json::Result<Self> {
        let raw: RawNode = serde_json::from_str(text)?;
        Ok(raw.classify())
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    nested: Option<IndexMap<String, RawNode>>,
    values: Option<IndexMap<String, i32>>,
    fields: Option<IndexMap<String, RawField>>,
    #[serde(default)]
    oneofs: IndexMap<String, RawOneof>,
    methods: Option<IndexMap<String, RawMethod>>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(rename = "type")]
    type_name: String,
    id: u32,
    #[serde(default)]
    optional: bool,
    options: Option<RawFieldOptions>,
}

#[derive(Debug, Deserialize)]
struct RawFieldOptions {
    #[serde(rename = "proto3_optional", default)]
    proto3_optional: bool,
}

#[derive(Debug, Deserialize)]
struct RawOneof {
    oneof: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    #[serde(rename = "requestType")]
    request_type: String,
    #[serde(rename = "responseType")]
    response_type: String,
}

impl RawNode {
    fn classify(self) -> ReflectionNode {
        if let Some(nested) = self.nested {
            return ReflectionNode::Namespace {
                nested: nested
                    .into_iter()
                    .map(|(name, node)| (name, node.classify()))
                    .collect(),
            };
        }
        if let Some(values) = self.values {
            return ReflectionNode::Enum { values };
        }
        if let Some(fields) = self.fields {
            return ReflectionNode::Message {
                fields: fields
                    .into_iter()
                    .map(|(name, field)| (name, field.into_field()))
                    .collect(),
                oneofs: self
                    .oneofs
                    .into_iter()
                    .map(|(name, group)| (name, group.oneof))
                    .collect(),
            };
        }
        if let Some(methods) = self.methods {
            return ReflectionNode::Service {
                methods: methods
                    .into_iter()
                    .map(|(name, method)| {
                        (
                            name,
                            ReflectionMethod {
                                request_type: method.request_type,
                                response_type: method.response_type,
                            },
                        )
                    })
                    .collect(),
            };
        }
        // A bare node (a package statement with no declarations).
        ReflectionNode::Namespace {
            nested: IndexMap::new(),
        }
    }
}

impl RawField {
    fn into_field(self) -> ReflectionField {
        let proto3_optional = self.options.is_some_and(|o| o.proto3_optional);
        ReflectionField {
            type_name: self.type_name,
            id: self.id,
            optional: self.optional || proto3_optional,
        }
    }
}
