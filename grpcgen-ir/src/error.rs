//! Errors raised while building and querying the definition model.
//!
//! All of these are terminal for a generation run: they indicate malformed
//! input or a caller contract violation, never a transient condition.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A type reference that the fixup pass could not resolve anywhere up
    /// the enclosing-namespace chain or at the root.
    #[error("unresolved type reference `{access}` (searched from namespace `{namespace}`)")]
    UnresolvedReference { access: String, namespace: String },

    /// A oneof group that violates the optional/oneof exclusivity rules or
    /// names a member that does not exist.
    #[error("malformed oneof `{group}` in message `{message}`: {reason}")]
    MalformedOneof {
        message: String,
        group: String,
        reason: String,
    },

    /// Exact lookup miss on `find_message`/`find_enum`. The caller should
    /// only query symbols known to exist in this definition.
    #[error("no {kind} named `{name}` in this definition")]
    NotFound { kind: &'static str, name: String },
}
