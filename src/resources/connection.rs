use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::Kind;
use crate::config::NodeType;
use crate::definition::{to_definition, Definition};
use crate::error::ValidationError;
use crate::path::{paths, DottedPath};
use crate::reconcile::{Declaration, SecretPolicy, State};
use crate::toolkit::{merge_definition, merged};

pub const CONNECTION_NODE_TYPES: &[NodeType] =
    &[NodeType::Design, NodeType::Automation, NodeType::Deployer];

const POSTGRESQL: &str = "PostgreSQL";

fn connection_template() -> Value {
    json!({
        "allowManagedDatasets": true,
        "allowManagedFolders": false,
        "allowWrite": true,
        "allowedGroups": [],
        "detailsReadability": {"allowedGroups": [], "readableBy": "NONE"},
        "maxActivities": 0,
        "params": {},
        "usableBy": "ALL",
        "useGlobalProxy": false,
    })
}

fn check_type(name: &str, expected: &str, current: Option<&Definition>) -> Result<(), ValidationError> {
    match current.and_then(|def| def.get("type")) {
        Some(Value::String(found)) if found != expected => Err(ValidationError::new(format!(
            "connection '{name}' already exists but is of type '{found}'"
        ))),
        _ => Ok(()),
    }
}

fn default_true() -> bool {
    true
}

/// A connection of any type, its settings are passed through as is
#[derive(Clone, Debug, Deserialize)]
pub struct Connection {
    pub name: String,
    #[serde(default)]
    pub state: State,
    #[serde(rename = "type")]
    pub connection_type: String,
    pub connection_args: Definition,
    #[serde(default)]
    pub set_encrypted_fields_at_creation_only: bool,
}

impl Declaration for Connection {
    fn kind(&self) -> Kind {
        Kind::Connection
    }

    fn id(&self) -> &str {
        &self.name
    }

    fn state(&self) -> State {
        self.state
    }

    fn validate_against(&self, current: Option<&Definition>) -> Result<(), ValidationError> {
        check_type(&self.name, &self.connection_type, current)
    }

    fn template(&self) -> Definition {
        to_definition(connection_template())
    }

    fn declared(&self, _current: Option<&Definition>) -> Result<Definition, ValidationError> {
        let mut declared = self.connection_args.clone();
        declared.insert("name".into(), json!(self.name));
        declared.insert("type".into(), json!(self.connection_type));
        Ok(declared)
    }

    fn secret_fields(&self) -> Vec<DottedPath> {
        paths(&["params.password"])
    }

    fn secret_policy(&self) -> SecretPolicy {
        if self.set_encrypted_fields_at_creation_only {
            SecretPolicy::Silent
        } else {
            SecretPolicy::Rewrite
        }
    }
}

/// A PostgreSQL connection described by its typed parameters
#[derive(Clone, Debug, Deserialize)]
pub struct PostgresConnection {
    pub name: String,
    #[serde(default)]
    pub state: State,
    pub postgresql_host: Option<String>,
    pub postgresql_port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    #[serde(default = "default_true")]
    pub silent_update_password: bool,
    #[serde(default)]
    pub additional_args: Definition,
}

impl Declaration for PostgresConnection {
    fn kind(&self) -> Kind {
        Kind::Connection
    }

    fn id(&self) -> &str {
        &self.name
    }

    fn state(&self) -> State {
        self.state
    }

    fn validate_against(&self, current: Option<&Definition>) -> Result<(), ValidationError> {
        check_type(&self.name, POSTGRESQL, current)
    }

    fn validate_creation(&self) -> Result<(), ValidationError> {
        let required = [
            ("user", &self.user),
            ("password", &self.password),
            ("database", &self.database),
            ("postgresql_host", &self.postgresql_host),
        ];
        match required.iter().find(|(_, value)| value.is_none()) {
            Some((field, _)) => Err(ValidationError::new(format!(
                "connection '{}' does not exist and cannot be created without the '{field}' parameter",
                self.name
            ))),
            None => Ok(()),
        }
    }

    fn template(&self) -> Definition {
        to_definition(merged(
            connection_template(),
            &json!({
                "credentialsMode": "GLOBAL",
                "indexingSettings": {
                    "indexForeignKeys": false,
                    "indexIndices": false,
                    "indexSystemTables": false
                },
                "params": {
                    "autocommitMode": false,
                    "namingRule": {
                        "canOverrideSchemaInManagedDatasetCreation": false,
                        "tableNameDatasetNamePrefix": "${projectKey}_"
                    },
                    "port": 5432,
                    "properties": [],
                    "useTruncate": false,
                    "useURL": false
                },
                "type": POSTGRESQL,
            }),
        ))
    }

    fn declared(&self, _current: Option<&Definition>) -> Result<Definition, ValidationError> {
        let mut params = Definition::new();
        let fields = [
            ("db", self.database.as_ref().map(|v| json!(v))),
            ("user", self.user.as_ref().map(|v| json!(v))),
            ("password", self.password.as_ref().map(|v| json!(v))),
            ("host", self.postgresql_host.as_ref().map(|v| json!(v))),
            ("port", self.postgresql_port.map(|v| json!(v))),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                params.insert(key.into(), value);
            }
        }

        let mut declared = to_definition(json!({
            "name": self.name,
            "params": params,
        }));
        merge_definition(&mut declared, &self.additional_args);
        Ok(declared)
    }

    fn secret_fields(&self) -> Vec<DottedPath> {
        paths(&["params.password"])
    }

    fn secret_policy(&self) -> SecretPolicy {
        if self.silent_update_password {
            SecretPolicy::Silent
        } else {
            SecretPolicy::Rewrite
        }
    }
}
