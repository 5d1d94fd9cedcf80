//! TypeScript code generator backend for grpcgen.
//!
//! Takes a resolved [`grpcgen_ir::ProtoDefinition`] and emits a tree of
//! TypeScript modules: one interface module per proto namespace, a
//! package-definition module carrying the raw descriptor, and a server
//! scaffold class that adapts wire-shaped requests to the typed handler
//! interfaces.
//!
//! The [`transform`] and [`dispatch`] modules implement the same two-way
//! field renaming and status handling that the emitted server performs,
//! so the runtime semantics are testable without executing TypeScript.

mod dispatch;
mod grouping;
mod server;
mod transform;
mod type_mapper;
mod writer;

pub use dispatch::{DispatchTable, Handler, StatusCode, StatusError};
pub use grouping::{GroupingError, GroupingGenerator, relative_specifier};
pub use transform::{named_to_wire, wire_to_named};
pub use type_mapper::scalar_type;
pub use writer::{GenerationOptions, TsCodeWriter};
