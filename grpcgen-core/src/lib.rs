//! Core utilities for the grpcgen code generator.
//!
//! This crate provides the casing helpers and the in-memory output tree
//! shared by every code generation backend.

mod casing;
mod vfs;

// Casing over decomposed word sequences
pub use casing::{to_camel_case, to_pascal_case, to_screaming_snake_case, to_snake_case};
// In-memory output tree
pub use vfs::{VfsError, VirtualDirectory};
