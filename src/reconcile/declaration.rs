use serde_json::Value;

use super::{Outcome, State};
use crate::client::{Action, Kind};
use crate::definition::Definition;
use crate::error::ValidationError;
use crate::path::DottedPath;
use crate::toolkit::merge_definition;

/// How existence of a resource is checked
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// The resource exists if its definition can be fetched
    Fetch,
    /// The resource exists if it shows up when listing its kind
    List,
}

/// How secret fields affect change detection
///
/// Secrets are stored encrypted on the remote side, so their values can
/// never be compared with the declared ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecretPolicy {
    /// Secret fields are ignored when deciding whether something changed
    #[default]
    Silent,
    /// Any secret explicitly declared counts as a change
    Rewrite,
}

/// The desired state of one remote resource.
///
/// Only the identity and the declared fields are required, the rest of the
/// hooks have defaults matching the plain reconciliation procedure.
pub trait Declaration {
    fn kind(&self) -> Kind;

    fn id(&self) -> &str;

    fn state(&self) -> State {
        State::Present
    }

    fn probe(&self) -> Probe {
        Probe::Fetch
    }

    /// Whether a summary returned by listing the kind is this resource.
    ///
    /// Only used with [`Probe::List`].
    fn identifies(&self, _summary: &Value) -> bool {
        false
    }

    /// Singletons cannot be created, reconciling a missing one fails
    fn creatable(&self) -> bool {
        true
    }

    /// Checks that only need the declared input
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Checks against the current remote definition, if any
    fn validate_against(&self, _current: Option<&Definition>) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Checks that only apply when the resource is about to be created
    fn validate_creation(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Base definition for a resource that does not exist yet
    fn template(&self) -> Definition {
        Definition::new()
    }

    /// The fields the caller wants, given what the remote currently holds
    fn declared(&self, current: Option<&Definition>) -> Result<Definition, ValidationError>;

    /// Apply the declared fields on top of the base definition
    fn apply(&self, base: &mut Definition, declared: &Definition) -> Result<(), ValidationError> {
        merge_definition(base, declared);
        Ok(())
    }

    /// Put a definition in canonical form before comparison
    fn normalize(&self, _def: &mut Definition) {}

    fn secret_fields(&self) -> Vec<DottedPath> {
        Vec::new()
    }

    fn secret_policy(&self) -> SecretPolicy {
        SecretPolicy::Silent
    }

    /// Fields sent along with the create call
    fn creation_fields(&self, desired: &Definition) -> Definition {
        desired.clone()
    }

    /// Long-running operations to run once the decision is applied
    fn follow_ups(
        &self,
        _outcome: Outcome,
        _current: Option<&Definition>,
        _desired: &Definition,
    ) -> Vec<Action> {
        Vec::new()
    }

    /// More operations to run given the result of a finished one.
    ///
    /// `action` is `None` for the result of the creation itself.
    fn after_job(&self, _action: Option<&Action>, _result: &Value, _desired: &Definition) -> Vec<Action> {
        Vec::new()
    }

    /// Whether deleting the resource should ignore remaining usages
    fn force_delete(&self) -> bool {
        false
    }

    /// The part of a definition shown in the report
    fn snapshot(&self, def: &Definition, _declared: &Definition) -> Definition {
        def.clone()
    }
}
