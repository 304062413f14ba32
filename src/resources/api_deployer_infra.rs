use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::Kind;
use crate::config::NodeType;
use crate::definition::Definition;
use crate::error::ValidationError;
use crate::reconcile::{Declaration, Probe, State};

pub const API_DEPLOYER_INFRA_NODE_TYPES: &[NodeType] = &[NodeType::Deployer];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiNode {
    pub url: String,
    #[serde(rename(serialize = "adminAPIKey"))]
    pub admin_api_key: String,
    #[serde(default, rename(serialize = "graphitePrefix"))]
    pub graphite_prefix: String,
}

/// An infrastructure of the API deployer.
///
/// The API nodes and permissions are replaced as a whole on every run.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiDeployerInfra {
    pub id: String,
    #[serde(default)]
    pub state: State,
    pub stage: String,
    #[serde(rename = "type")]
    pub infra_type: String,
    pub api_nodes: Vec<ApiNode>,
    #[serde(default)]
    pub permissions: Vec<Value>,
    pub carbonapi_url: Option<String>,
}

impl Declaration for ApiDeployerInfra {
    fn kind(&self) -> Kind {
        Kind::ApiDeployerInfra
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> State {
        self.state
    }

    fn probe(&self) -> Probe {
        Probe::List
    }

    fn identifies(&self, summary: &Value) -> bool {
        summary["infraBasicInfo"]["id"] == json!(self.id)
    }

    fn declared(&self, _current: Option<&Definition>) -> Result<Definition, ValidationError> {
        let mut declared = Definition::new();
        declared.insert("permissions".into(), json!(self.permissions));
        declared.insert("apiNodes".into(), serde_json::to_value(&self.api_nodes)?);
        if let Some(url) = &self.carbonapi_url {
            declared.insert("carbonAPISettings".into(), json!({"carbonAPIURL": url}));
        }
        Ok(declared)
    }

    fn creation_fields(&self, desired: &Definition) -> Definition {
        let mut fields = desired.clone();
        fields.insert("id".into(), json!(self.id));
        fields.insert("stage".into(), json!(self.stage));
        fields.insert("type".into(), json!(self.infra_type));
        fields
    }
}
