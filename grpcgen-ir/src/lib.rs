//! Definition model types for the grpcgen code generator.
//!
//! This crate provides the normalized, cross-referenced model of messages,
//! enums and services that the code emitters consume.
//!
//! # Architecture
//!
//! ```text
//! descriptor JSON → reflection (tagged tree) → definition (resolved model) → codegen
//! ```
//!
//! The model is built in two phases: a depth-first scan that records
//! provisional type references, and a fixup pass that resolves every
//! forward and cross-namespace reference or fails with a terminal error.

mod definition;
mod error;
mod reflection;
mod symbol;
mod types;

pub use definition::{
    Enum, EnumValue, Field, Message, Method, ProtoDefinition, Service, TypeKind,
};
pub use error::{Error, Result};
pub use reflection::{ReflectionField, ReflectionMethod, ReflectionNode};
pub use symbol::{NamespacedSymbol, Symbol, SymbolRole};
pub use types::{FieldType, ScalarKind};
