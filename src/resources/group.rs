use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::Kind;
use crate::config::NodeType;
use crate::definition::{to_definition, Definition};
use crate::error::ValidationError;
use crate::reconcile::{Declaration, State};

pub const GROUP_NODE_TYPES: &[NodeType] = &[
    NodeType::Design,
    NodeType::Automation,
    NodeType::Deployer,
    NodeType::Govern,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupSource {
    Local,
    Ldap,
    Saas,
    AzureAd,
    LocalNoAuth,
    Custom,
}

/// A group and its permissions.
///
/// Only the permission flags are serialized, with the names used by the API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Group {
    #[serde(skip_serializing)]
    pub name: String,
    #[serde(default, skip_serializing)]
    pub state: State,
    #[serde(skip_serializing)]
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub source_type: Option<GroupSource>,
    #[serde(skip_serializing)]
    pub admin: Option<bool>,
    #[serde(skip_serializing)]
    pub ldap_group_names: Option<Vec<String>>,
    #[serde(skip_serializing)]
    pub sso_group_names: Option<Vec<String>>,
    #[serde(skip_serializing)]
    pub azure_ad_group_names: Option<Vec<String>>,
    #[serde(skip_serializing)]
    pub custom_group_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_authenticated_connections: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_code_envs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_code_studio_templates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_clusters: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_data_collections: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_projects_from_macros: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_projects_from_templates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_projects_from_dataiku_apps: Option<bool>,
    #[serde(
        rename(
            serialize = "mayCreatePublishedAPIServices",
            deserialize = "may_create_published_API_services"
        ),
        skip_serializing_if = "Option::is_none"
    )]
    pub may_create_published_api_services: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_published_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_active_web_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_create_workspaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_develop_plugins: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_edit_lib_folders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_manage_code_envs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_manage_code_studio_templates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_manage_clusters: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_manage_feature_store: Option<bool>,
    #[serde(
        rename(serialize = "mayManageUDM", deserialize = "may_manage_UDM"),
        skip_serializing_if = "Option::is_none"
    )]
    pub may_manage_udm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_publish_to_data_collections: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_share_to_workspaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_view_indexed_hive_connections: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_write_safe_code: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_write_unsafe_code: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_write_in_root_project_folder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub may_manage_govern: Option<bool>,
    #[serde(
        rename(
            serialize = "canObtainAPITicketFromCookiesForGroupsRegex",
            deserialize = "can_obtain_API_ticket_from_cookies_for_groups_regex"
        ),
        skip_serializing_if = "Option::is_none"
    )]
    pub can_obtain_api_ticket_from_cookies_for_groups_regex: Option<String>,
}

impl Group {
    fn external_groups(&self) -> [(&'static str, Option<&Vec<String>>); 4] {
        [
            ("ldapGroupNames", self.ldap_group_names.as_ref()),
            ("ssoGroupNames", self.sso_group_names.as_ref()),
            ("azureADGroupNames", self.azure_ad_group_names.as_ref()),
            ("customGroupNames", self.custom_group_names.as_ref()),
        ]
    }
}

// External group names are sets, stored either as a list or as a single
// comma separated string depending on the DSS version
fn sorted_names(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) if !s.is_empty() => {
            let mut names: Vec<&str> = s.split(',').collect();
            names.sort_unstable();
            Some(json!(names.join(",")))
        }
        Value::Array(items) => {
            let mut items = items.clone();
            items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
            Some(Value::Array(items))
        }
        _ => None,
    }
}

impl Declaration for Group {
    fn kind(&self) -> Kind {
        Kind::Group
    }

    fn id(&self) -> &str {
        &self.name
    }

    fn state(&self) -> State {
        self.state
    }

    fn template(&self) -> Definition {
        to_definition(json!({"mayWriteSafeCode": true}))
    }

    fn declared(&self, current: Option<&Definition>) -> Result<Definition, ValidationError> {
        let mut declared = to_definition(serde_json::to_value(self)?);
        if let Some(description) = &self.description {
            declared.insert("description".into(), json!(description));
        }
        if let Some(source) = self.source_type {
            declared.insert("sourceType".into(), serde_json::to_value(source)?);
        }
        if let Some(admin) = self.admin {
            declared.insert("admin".into(), json!(admin));
        }

        for (key, names) in self.external_groups() {
            let Some(names) = names else {
                continue;
            };
            let mut names = names.clone();
            names.sort_unstable();
            // follow whatever format the remote already uses
            let joined = matches!(current.and_then(|c| c.get(key)), Some(Value::String(_)));
            let value = if joined {
                json!(names.join(","))
            } else {
                json!(names)
            };
            declared.insert(key.into(), value);
        }
        Ok(declared)
    }

    fn normalize(&self, def: &mut Definition) {
        for (key, _) in self.external_groups() {
            if let Some(sorted) = def.get(key).and_then(sorted_names) {
                def.insert(key.into(), sorted);
            }
        }
    }

    fn creation_fields(&self, desired: &Definition) -> Definition {
        let mut fields = desired.clone();
        fields.insert("name".into(), json!(self.name));
        fields
            .entry("sourceType")
            .or_insert_with(|| json!(GroupSource::Local));
        fields
    }
}
