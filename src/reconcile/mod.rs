//! Reconciliation of a declared resource with its remote counterpart
//!
//! Every resource goes through the same procedure: fetch the current
//! definition, compute the desired one, decide between
//! [`Outcome::Created`], [`Outcome::Modified`], [`Outcome::Deleted`] and
//! [`Outcome::Unchanged`], then apply the decision unless running dry.
//!
//! What changes between resource kinds is described by a [`Declaration`].
use json_patch::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

mod declaration;
mod plan;
mod reconciler;

pub use declaration::*;
pub use plan::*;
pub use reconciler::*;

/// Desired state of a resource
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Created,
    Modified,
    Unchanged,
    Deleted,
}

impl Outcome {
    /// Whether the outcome requires a change on the remote side
    pub fn is_change(&self) -> bool {
        !matches!(self, Outcome::Unchanged)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Created => "CREATED",
            Outcome::Modified => "MODIFIED",
            Outcome::Unchanged => "UNCHANGED",
            Outcome::Deleted => "DELETED",
        };
        write!(f, "{s}")
    }
}

/// The result of a reconciliation, as reported to the caller
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub changed: bool,
    pub message: Outcome,
    /// The definition before the reconciliation, if the resource existed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
    /// The desired definition, unless the resource was meant to be absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Value>,
    /// Changes between `previous` and `current`
    pub diff: Patch,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub job_results: Vec<Value>,
}
