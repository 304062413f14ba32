//! Interface to the remote DSS API
//!
//! The reconciliation only needs to list, fetch, create, update and delete
//! resources, and to wait for a few long-running operations. The transport
//! behind these traits is up to the implementation.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

use crate::definition::Definition;

pub mod memory;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The resource does not exist on the remote side
    #[error("{0} does not exist")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// Language of a code environment
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Lang {
    Python,
    R,
}

impl Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::Python => write!(f, "PYTHON"),
            Lang::R => write!(f, "R"),
        }
    }
}

/// The kinds of resources managed through the API
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    User,
    Group,
    Connection,
    CodeEnv(Lang),
    Plugin,
    GeneralSettings,
    ApiDeployerInfra,
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::User => write!(f, "user"),
            Kind::Group => write!(f, "group"),
            Kind::Connection => write!(f, "connection"),
            Kind::CodeEnv(lang) => write!(f, "{lang} code env"),
            Kind::Plugin => write!(f, "plugin"),
            Kind::GeneralSettings => write!(f, "general settings"),
            Kind::ApiDeployerInfra => write!(f, "API deployer infrastructure"),
        }
    }
}

/// Long-running operations that can be started on an existing resource
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", content = "source", rename_all = "snake_case")]
pub enum Action {
    /// Install or update the packages of a code env
    UpdatePackages,
    /// Create the code env a plugin depends on
    CreateCodeEnv,
    /// Reinstall a plugin from the given source
    UpdateFromSource(Value),
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::UpdatePackages => write!(f, "update packages"),
            Action::CreateCodeEnv => write!(f, "create code env"),
            Action::UpdateFromSource(_) => write!(f, "update from source"),
        }
    }
}

/// A resource that was just created
pub struct Created<'a> {
    pub handle: Box<dyn Handle + 'a>,
    /// Result of the creation when the remote side runs it as a job, e.g.
    /// the descriptor of an installed plugin
    pub result: Option<Value>,
}

#[async_trait]
pub trait Client: Send + Sync {
    /// List the summaries of every resource of the given kind
    async fn list(&self, kind: &Kind) -> Result<Vec<Value>, ClientError>;

    /// Get a handle on a resource. This does not check the resource exists.
    fn resource<'a>(&'a self, kind: &Kind, id: &str) -> Box<dyn Handle + 'a>;

    /// Create a new resource with the given fields
    async fn create<'a>(
        &'a self,
        kind: &Kind,
        id: &str,
        fields: &Definition,
    ) -> Result<Created<'a>, ClientError>;
}

#[async_trait]
pub trait Handle: Send + Sync {
    /// Fetch the definition, fails with [`ClientError::NotFound`] if the
    /// resource does not exist
    async fn get_definition(&self) -> Result<Definition, ClientError>;

    async fn set_definition(&self, def: &Definition) -> Result<(), ClientError>;

    /// Delete the resource. With `force` the remote side deletes it even
    /// if it is still in use.
    async fn delete(&self, force: bool) -> Result<(), ClientError>;

    async fn start(&self, action: &Action) -> Result<Box<dyn Job>, ClientError>;
}

/// A long-running operation started on the remote side
#[async_trait]
pub trait Job: Send {
    async fn wait_for_result(&mut self) -> Result<Value, ClientError>;
}
