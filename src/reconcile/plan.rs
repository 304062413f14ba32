use super::{Outcome, SecretPolicy, State};
use crate::definition::{Definition, Node};
use crate::path::DottedPath;
use crate::toolkit::exclude;

/// Secret aware comparison of definitions
#[derive(Clone, Debug)]
pub struct SecretCheck {
    paths: Vec<DottedPath>,
    policy: SecretPolicy,
    supplied: bool,
}

impl SecretCheck {
    pub fn new(paths: Vec<DottedPath>, policy: SecretPolicy, declared: &Definition) -> Self {
        let supplied = paths
            .iter()
            .any(|p| p.lookup(declared).is_some_and(|v| !v.is_null()));
        SecretCheck {
            paths,
            policy,
            supplied,
        }
    }

    pub fn paths(&self) -> &[DottedPath] {
        &self.paths
    }

    /// Whether at least one secret was declared explicitly
    pub fn supplied(&self) -> bool {
        self.supplied
    }

    /// Compare the definitions ignoring secret fields. Declared secrets
    /// always count as a difference with [`SecretPolicy::Rewrite`].
    pub fn differ(&self, current: &Definition, desired: &Definition) -> bool {
        if self.supplied && self.policy == SecretPolicy::Rewrite {
            return true;
        }
        exclude(&Node::from(current), &self.paths) != exclude(&Node::from(desired), &self.paths)
    }
}

/// Decide what needs to happen to the remote resource
pub fn decide(
    state: State,
    current: Option<&Definition>,
    desired: &Definition,
    secrets: &SecretCheck,
) -> Outcome {
    match (current, state) {
        (None, State::Present) => Outcome::Created,
        (None, State::Absent) => Outcome::Unchanged,
        (Some(_), State::Absent) => Outcome::Deleted,
        (Some(current), State::Present) => {
            if secrets.differ(current, desired) {
                Outcome::Modified
            } else {
                Outcome::Unchanged
            }
        }
    }
}
