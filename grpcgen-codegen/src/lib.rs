//! Shared, target-language-agnostic code generation utilities.
//!
//! A backend needs two things from this crate: a [`NamingTransformer`] to
//! turn symbols into identifiers in the target language's conventions, and
//! a [`LineWriter`] to accumulate indented lines of output.

mod line_writer;
mod naming;

pub use line_writer::{LineWriter, LineWriterError};
pub use naming::{DefaultTransformer, NamingError, NamingTransformer};
