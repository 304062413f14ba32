use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::Kind;
use crate::config::NodeType;
use crate::definition::{to_definition, Definition, Node};
use crate::error::ValidationError;
use crate::path::{paths, DottedPath};
use crate::reconcile::{Declaration, SecretPolicy};
use crate::toolkit::{build_template, merge_definition, merge_named, project_definition};

pub const GENERAL_SETTINGS_NODE_TYPES: &[NodeType] =
    &[NodeType::Design, NodeType::Automation, NodeType::Deployer];

/// Identifier of the settings singleton
pub const GENERAL_SETTINGS_ID: &str = "general";

const ENCRYPTED_FIELDS: &[&str] = &[
    "ldapSettings.bindPassword",
    "ssoSettings.samlSPParams.keystorePassword",
    "ssoSettings.openIDParams.clientSecret",
    "azureADSettings.credentialsClientSecret",
    "azureADSettings.credentialsCertificatePassword",
];

/// Named lists updated entry by entry
const SMART_UPDATE_FIELDS: &[&str] = &[
    "containerSettings.executionConfigs",
    "sparkSettings.executionConfigs",
];

fn default_true() -> bool {
    true
}

/// The instance-wide settings. They always exist and cannot be deleted.
#[derive(Clone, Debug, Deserialize)]
pub struct GeneralSettings {
    #[serde(default)]
    pub settings: Definition,
    #[serde(default = "default_true")]
    pub silent_update_secrets: bool,
    /// Merge execution configs by name instead of replacing the lists
    #[serde(default = "default_true")]
    pub enable_smart_update: bool,
}

fn node_at<'n>(node: &'n Node, path: &DottedPath) -> Option<&'n Node> {
    path.iter().try_fold(node, |node, key| node.get(key))
}

impl Declaration for GeneralSettings {
    fn kind(&self) -> Kind {
        Kind::GeneralSettings
    }

    fn id(&self) -> &str {
        GENERAL_SETTINGS_ID
    }

    fn creatable(&self) -> bool {
        false
    }

    fn declared(&self, _current: Option<&Definition>) -> Result<Definition, ValidationError> {
        Ok(self.settings.clone())
    }

    fn apply(&self, base: &mut Definition, declared: &Definition) -> Result<(), ValidationError> {
        if !self.enable_smart_update {
            merge_definition(base, declared);
            return Ok(());
        }

        let smart = paths(SMART_UPDATE_FIELDS);
        let mut regular = declared.clone();
        for path in &smart {
            path.remove(&mut regular);
        }
        merge_definition(base, &regular);

        let declared = project_definition(declared, &build_template(&smart, &json!([])));
        for path in &smart {
            let Some(Node::Value(Value::Array(updates))) = node_at(&declared, path) else {
                continue;
            };
            // an empty list leaves the remote entries alone
            if updates.is_empty() {
                continue;
            }
            let current = path
                .lookup(base)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let merged = merge_named(&current, updates)?;
            path.assign(base, Value::Array(merged));
        }
        Ok(())
    }

    fn secret_fields(&self) -> Vec<DottedPath> {
        paths(ENCRYPTED_FIELDS)
    }

    fn secret_policy(&self) -> SecretPolicy {
        if self.silent_update_secrets {
            SecretPolicy::Silent
        } else {
            SecretPolicy::Rewrite
        }
    }

    fn snapshot(&self, def: &Definition, declared: &Definition) -> Definition {
        project_definition(def, declared)
            .into_value()
            .map(to_definition)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemoryClient;
    use crate::reconcile::{Outcome, Reconciler};
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn settings(value: Value) -> GeneralSettings {
        serde_json::from_value(value).unwrap()
    }

    fn remote() -> Value {
        json!({
            "ldapSettings": {"enabled": true, "bindPassword": "enc:abc"},
            "containerSettings": {
                "executionConfigs": [
                    {"name": "small", "cpu": 1},
                    {"name": "large", "cpu": 8}
                ]
            },
            "maxRunningActivities": 5
        })
    }

    #[tokio::test]
    async fn it_merges_execution_configs_by_name() {
        let client = MemoryClient::new().with_resource(Kind::GeneralSettings, GENERAL_SETTINGS_ID, remote());
        let s = settings(json!({
            "settings": {
                "containerSettings": {
                    "executionConfigs": [{"name": "large", "cpu": 16}, {"name": "gpu", "cpu": 4}]
                }
            }
        }));
        let report = Reconciler::new(&client).reconcile(&s).await.unwrap();
        assert_eq!(report.message, Outcome::Modified);

        let stored = client
            .definition(&Kind::GeneralSettings, GENERAL_SETTINGS_ID)
            .await
            .unwrap();
        assert_eq!(
            stored["containerSettings"]["executionConfigs"],
            json!([
                {"name": "small", "cpu": 1},
                {"name": "large", "cpu": 16},
                {"name": "gpu", "cpu": 4}
            ])
        );
        // the previous settings are limited to what was declared
        assert_eq!(
            report.previous,
            Some(json!({
                "containerSettings": {
                    "executionConfigs": [{"name": "small", "cpu": 1}, {"name": "large", "cpu": 8}]
                }
            }))
        );
    }

    #[tokio::test]
    async fn it_replaces_lists_without_smart_update() {
        let client = MemoryClient::new().with_resource(Kind::GeneralSettings, GENERAL_SETTINGS_ID, remote());
        let s = settings(json!({
            "enable_smart_update": false,
            "settings": {"containerSettings": {"executionConfigs": [{"name": "gpu"}]}}
        }));
        Reconciler::new(&client).reconcile(&s).await.unwrap();
        let stored = client
            .definition(&Kind::GeneralSettings, GENERAL_SETTINGS_ID)
            .await
            .unwrap();
        assert_eq!(stored["containerSettings"]["executionConfigs"], json!([{"name": "gpu"}]));
    }

    #[tokio::test]
    async fn it_updates_secrets_silently_by_default() {
        let client = MemoryClient::new().with_resource(Kind::GeneralSettings, GENERAL_SETTINGS_ID, remote());
        let declared = json!({"ldapSettings": {"enabled": true, "bindPassword": "plain"}});

        let s = settings(json!({"settings": declared}));
        let report = Reconciler::new(&client).dry_run(true).reconcile(&s).await.unwrap();
        assert_eq!(report.message, Outcome::Unchanged);
        assert_eq!(report.previous, Some(json!({"ldapSettings": {"enabled": true}})));

        let s = settings(json!({"settings": declared, "silent_update_secrets": false}));
        let report = Reconciler::new(&client).dry_run(true).reconcile(&s).await.unwrap();
        assert_eq!(report.message, Outcome::Modified);
    }

    #[tokio::test]
    async fn it_fails_when_the_settings_are_missing() {
        let client = MemoryClient::new();
        let err = Reconciler::new(&client)
            .reconcile(&settings(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: Kind::GeneralSettings, .. }));
    }

    #[test]
    fn it_rejects_unnamed_execution_configs() {
        let s = settings(json!({
            "settings": {"sparkSettings": {"executionConfigs": [{"conf": {}}]}}
        }));
        let mut base = to_definition(remote());
        let declared = s.declared(None).unwrap();
        assert!(s.apply(&mut base, &declared).is_err());
    }
}
