use std::result::Result as StdResult;

use thiserror::Error;

use crate::id::ComponentId;

/// Result type for trellis operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// The component id does not resolve to a live component.
    #[error("component not found: {0:?}")]
    ComponentNotFound(ComponentId),
    /// No child is registered under the given name.
    #[error("unknown child: {0}")]
    UnknownChild(String),
    /// Invalid input error.
    #[error("invalid: {0}")]
    Invalid(String),
    /// A misuse of the API that strict mode promotes to an error.
    #[error("misconfigured: {0}")]
    Misconfigured(String),
    /// A display surface failed to render or reveal.
    #[error("surface: {0}")]
    Surface(String),
    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}
