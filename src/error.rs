use thiserror::Error;

use crate::client::{ClientError, Kind};

#[derive(Debug, Error)]
#[error("invalid input: {0}")]
/// The declared input is not valid.
///
/// Raised before any remote mutation. Most of these are detected before the
/// first remote call, some (e.g. a connection that already exists with a
/// different type) need the current remote definition.
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Debug, Error)]
#[error("{operation} {kind} '{id}' failed: {source}")]
/// A call to the remote API failed.
///
/// This is always fatal for the reconciliation, the operation name and the
/// resource identity are kept for diagnostics.
pub struct RemoteError {
    pub operation: &'static str,
    pub kind: Kind,
    pub id: String,
    #[source]
    pub source: ClientError,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{kind} '{id}' does not exist and cannot be created")]
    NotFound { kind: Kind, id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn remote(
        operation: &'static str,
        kind: &Kind,
        id: &str,
    ) -> impl FnOnce(ClientError) -> Error {
        let kind = kind.clone();
        let id = id.to_string();
        move |source| {
            Error::Remote(RemoteError {
                operation,
                kind,
                id,
                source,
            })
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
