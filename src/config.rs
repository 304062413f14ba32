//! Connection settings and module invocation
//!
//! Every declaration may carry connection arguments. These are resolved
//! into an [`Endpoint`] with the following precedence: explicit argument,
//! then the `connect_to` mapping, then the environment, then the default.
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::env;
use std::fmt::Display;

use crate::error::{Error, ValidationError};

pub const API_KEY_VAR: &str = "DATAIKU_ANSIBLE_DSS_API_KEY";
pub const PORT_VAR: &str = "DATAIKU_ANSIBLE_DSS_PORT";
pub const HOST_VAR: &str = "DATAIKU_ANSIBLE_DSS_HOST";
pub const NODE_TYPE_VAR: &str = "DATAIKU_ANSIBLE_DSS_NODE_TYPE";
pub const DATA_DIR_VAR: &str = "DATAIKU_ANSIBLE_DSS_DATADIR";

const DEFAULT_PORT: &str = "80";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_DATA_DIR: &str = "/data/dataiku/dss_data";

/// The flavours of DSS nodes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Design,
    Automation,
    Deployer,
    Govern,
    Api,
}

impl NodeType {
    pub const ALL: &'static [NodeType] = &[
        NodeType::Design,
        NodeType::Automation,
        NodeType::Deployer,
        NodeType::Govern,
        NodeType::Api,
    ];

    fn parse(s: &str) -> Result<NodeType, ValidationError> {
        NodeType::ALL
            .iter()
            .find(|t| t.to_string() == s)
            .copied()
            .ok_or_else(|| ValidationError::new(format!("unknown node type '{s}'")))
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeType::Design => "design",
            NodeType::Automation => "automation",
            NodeType::Deployer => "deployer",
            NodeType::Govern => "govern",
            NodeType::Api => "api",
        };
        write!(f, "{s}")
    }
}

// Ports may be given either as numbers or strings
fn port<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    Ok(Option::<Port>::deserialize(deserializer)?.map(|p| match p {
        Port::Number(n) => n.to_string(),
        Port::Text(s) => s,
    }))
}

/// Connection arguments grouped in a single mapping
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectTo {
    pub host: Option<String>,
    #[serde(default, deserialize_with = "port")]
    pub port: Option<String>,
    pub api_key: Option<String>,
    pub node_type: Option<NodeType>,
    pub data_dir: Option<String>,
}

/// Connection arguments accepted by every declaration
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ConnectArgs {
    pub connect_to: Option<ConnectTo>,
    pub host: Option<String>,
    #[serde(default, deserialize_with = "port")]
    pub port: Option<String>,
    pub api_key: Option<String>,
    pub node_type: Option<NodeType>,
    pub data_dir: Option<String>,
}

/// Where and how to reach the DSS API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub api_key: String,
    pub node_type: NodeType,
    pub data_dir: String,
}

impl ConnectArgs {
    /// Resolve the endpoint using the process environment
    pub fn resolve(&self, supported: &[NodeType]) -> Result<Endpoint, ValidationError> {
        self.resolve_with(supported, |var| env::var(var).ok())
    }

    /// Resolve the endpoint, looking up environment variables with `lookup`
    pub fn resolve_with<F>(&self, supported: &[NodeType], lookup: F) -> Result<Endpoint, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let grouped = self.connect_to.clone().unwrap_or_default();
        let pick = |explicit: &Option<String>, grouped: Option<String>, var: &str| {
            explicit.clone().or(grouped).or_else(|| lookup(var))
        };

        let api_key = pick(&self.api_key, grouped.api_key, API_KEY_VAR).ok_or_else(|| {
            ValidationError::new(format!(
                "missing an API key, either from 'api_key', 'connect_to' or the {API_KEY_VAR} variable"
            ))
        })?;
        let port = pick(&self.port, grouped.port, PORT_VAR).unwrap_or_else(|| DEFAULT_PORT.into());
        let host = pick(&self.host, grouped.host, HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.into());
        let data_dir = pick(&self.data_dir, grouped.data_dir, DATA_DIR_VAR)
            .unwrap_or_else(|| DEFAULT_DATA_DIR.into());

        let node_type = match self.node_type.or(grouped.node_type) {
            Some(t) => t,
            None => lookup(NODE_TYPE_VAR)
                .map(|s| NodeType::parse(&s))
                .transpose()?
                .unwrap_or_default(),
        };
        if !supported.contains(&node_type) {
            let names: Vec<String> = supported.iter().map(NodeType::to_string).collect();
            return Err(ValidationError::new(format!(
                "node type {node_type} is not supported, expected one of [{}]",
                names.join(", ")
            )));
        }

        Ok(Endpoint {
            url: format!("http://{host}:{port}"),
            api_key,
            node_type,
            data_dir,
        })
    }
}

/// The arguments of one module call: connection, dry-run flag and the
/// declaration itself
///
/// Declarations must not flatten their own fields, the keys they take
/// would otherwise be reported as unsupported.
#[derive(Clone, Debug, Deserialize)]
pub struct Invocation<D> {
    #[serde(flatten)]
    pub connection: ConnectArgs,
    #[serde(default)]
    pub check_mode: bool,
    #[serde(flatten)]
    pub declaration: D,
    // must stay last, it gets whatever the fields above did not take
    #[serde(flatten)]
    unsupported: Map<String, Value>,
}

impl<D> Invocation<D>
where
    D: for<'de> Deserialize<'de>,
{
    /// Parse the module arguments, rejecting any argument not understood
    /// by either the connection settings or the declaration
    pub fn from_args(args: Value) -> Result<Self, Error> {
        let invocation: Invocation<D> =
            serde_json::from_value(args).map_err(|e| Error::Validation(ValidationError::from(e)))?;
        if !invocation.unsupported.is_empty() {
            let mut names: Vec<&str> = invocation.unsupported.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(ValidationError::new(format!(
                "unsupported parameters: {}",
                names.join(", ")
            ))
            .into());
        }
        Ok(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    fn args(value: Value) -> ConnectArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn it_uses_defaults_when_nothing_is_given() {
        let endpoint = args(json!({}))
            .resolve_with(NodeType::ALL, env(&[(API_KEY_VAR, "secret")]))
            .unwrap();
        assert_eq!(
            endpoint,
            Endpoint {
                url: "http://127.0.0.1:80".into(),
                api_key: "secret".into(),
                node_type: NodeType::Design,
                data_dir: "/data/dataiku/dss_data".into(),
            }
        );
    }

    #[test]
    fn it_requires_an_api_key() {
        let err = args(json!({})).resolve_with(NodeType::ALL, env(&[])).unwrap_err();
        assert!(err.message().contains(API_KEY_VAR));
    }

    #[test]
    fn it_prefers_explicit_arguments() {
        let lookup = env(&[
            (API_KEY_VAR, "from-env"),
            (HOST_VAR, "env-host"),
            (PORT_VAR, "8080"),
            (NODE_TYPE_VAR, "govern"),
        ]);
        let endpoint = args(json!({
            "host": "explicit",
            "connect_to": {"host": "grouped", "port": 11200, "api_key": "grouped-key", "data_dir": "/opt/dss"}
        }))
        .resolve_with(NodeType::ALL, lookup)
        .unwrap();

        assert_eq!(endpoint.url, "http://explicit:11200");
        assert_eq!(endpoint.api_key, "grouped-key");
        assert_eq!(endpoint.node_type, NodeType::Govern);
        assert_eq!(endpoint.data_dir, "/opt/dss");
    }

    #[test]
    fn it_rejects_unsupported_node_types() {
        let lookup = env(&[(API_KEY_VAR, "k")]);
        let err = args(json!({"node_type": "govern"}))
            .resolve_with(&[NodeType::Design, NodeType::Automation], &lookup)
            .unwrap_err();
        assert_eq!(
            err.message(),
            "node type govern is not supported, expected one of [design, automation]"
        );

        let lookup = env(&[(API_KEY_VAR, "k"), (NODE_TYPE_VAR, "mainframe")]);
        assert!(args(json!({})).resolve_with(NodeType::ALL, lookup).is_err());
    }

    #[test]
    fn it_parses_invocations() {
        #[derive(Debug, Deserialize)]
        struct Named {
            name: String,
        }

        let invocation: Invocation<Named> =
            Invocation::from_args(json!({"name": "x", "port": "11000", "check_mode": true})).unwrap();
        assert_eq!(invocation.declaration.name, "x");
        assert_eq!(invocation.connection.port.as_deref(), Some("11000"));
        assert!(invocation.check_mode);

        let err = Invocation::<Named>::from_args(json!({"port": 1})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn it_rejects_unsupported_parameters() {
        #[derive(Debug, Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }

        let err = Invocation::<Named>::from_args(json!({
            "name": "x",
            "api_key": "k",
            "nmae": "y",
            "chek_mode": true
        }))
        .unwrap_err();
        let Error::Validation(err) = err else {
            panic!("expected a validation error");
        };
        assert_eq!(err.message(), "unsupported parameters: chek_mode, nmae");

        let err = Invocation::<Named>::from_args(json!({"name": "x", "connect_to": {"hots": "dss"}}));
        assert!(err.unwrap_err().is_validation());
    }
}
