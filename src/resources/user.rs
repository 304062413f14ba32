use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::Kind;
use crate::config::NodeType;
use crate::definition::Definition;
use crate::error::ValidationError;
use crate::path::{paths, DottedPath};
use crate::reconcile::{Declaration, SecretPolicy, State};

pub const USER_NODE_TYPES: &[NodeType] = &[
    NodeType::Design,
    NodeType::Automation,
    NodeType::Deployer,
    NodeType::Govern,
];

const DEFAULT_GROUP: &str = "readers";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserSource {
    #[default]
    Local,
    Ldap,
    LocalNoAuth,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub state: State,
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub set_password_at_creation_only: bool,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub groups: Option<Vec<String>>,
    pub profile: Option<String>,
    #[serde(default)]
    pub source_type: UserSource,
}

impl Declaration for User {
    fn kind(&self) -> Kind {
        Kind::User
    }

    fn id(&self) -> &str {
        &self.login
    }

    fn state(&self) -> State {
        self.state
    }

    fn validate_creation(&self) -> Result<(), ValidationError> {
        if self.password.is_none() && self.source_type == UserSource::Local {
            return Err(ValidationError::new(format!(
                "the 'password' parameter is mandatory to create the local user '{}'",
                self.login
            )));
        }
        Ok(())
    }

    fn declared(&self, current: Option<&Definition>) -> Result<Definition, ValidationError> {
        let creating = current.is_none();
        let mut declared = Definition::new();

        // New users get a display name and a group by default
        let display_name = self
            .display_name
            .clone()
            .or_else(|| creating.then(|| self.login.clone()));
        let groups = self
            .groups
            .clone()
            .or_else(|| creating.then(|| vec![DEFAULT_GROUP.to_string()]));

        let fields = [
            ("email", self.email.as_ref().map(|v| json!(v))),
            ("displayName", display_name.map(Value::from)),
            ("userProfile", self.profile.as_ref().map(|v| json!(v))),
            ("groups", groups.map(Value::from)),
            ("sourceType", Some(serde_json::to_value(self.source_type)?)),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                declared.insert(key.into(), value);
            }
        }

        if let Some(password) = &self.password {
            if creating || !self.set_password_at_creation_only {
                declared.insert("password".into(), json!(password));
            }
        }
        Ok(declared)
    }

    fn normalize(&self, def: &mut Definition) {
        if let Some(Value::Array(groups)) = def.get_mut("groups") {
            groups.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        }
    }

    fn secret_fields(&self) -> Vec<DottedPath> {
        paths(&["password"])
    }

    // Passwords are never returned by the API, a declared one always
    // needs to be written
    fn secret_policy(&self) -> SecretPolicy {
        SecretPolicy::Rewrite
    }

    fn creation_fields(&self, desired: &Definition) -> Definition {
        let mut fields = desired.clone();
        fields.insert("login".into(), json!(self.login));
        fields
    }
}
