use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{Action, Kind};
use crate::config::NodeType;
use crate::definition::Definition;
use crate::error::ValidationError;
use crate::reconcile::{Declaration, Outcome, Probe, State};

pub const PLUGIN_NODE_TYPES: &[NodeType] =
    &[NodeType::Design, NodeType::Automation, NodeType::Deployer];

/// Key of the creation fields holding where to install the plugin from
pub const INSTALL_SOURCE_KEY: &str = "installSource";

const CODE_ENV_KEY: &str = "codeEnvName";

fn default_checkout() -> String {
    "master".to_string()
}

fn default_true() -> bool {
    true
}

/// A plugin and its settings.
///
/// The plugin is installed from a zip archive if one is given, else from a
/// git repository if one is given, else from the plugin store.
#[derive(Clone, Debug, Deserialize)]
pub struct Plugin {
    pub plugin_id: String,
    #[serde(default)]
    pub state: State,
    pub zip_file: Option<String>,
    pub git_repository_url: Option<String>,
    #[serde(default = "default_checkout")]
    pub git_checkout: String,
    pub git_subpath: Option<String>,
    pub settings: Option<Definition>,
    /// Reinstall an existing plugin, or delete it even if it is still in use
    #[serde(default)]
    pub force: bool,
    /// Create the code env of a freshly installed plugin, if it declares one
    #[serde(default = "default_true")]
    pub install_code_env: bool,
}

impl Plugin {
    pub fn source(&self) -> Value {
        if let Some(path) = &self.zip_file {
            return json!({"type": "zip", "path": path});
        }
        if let Some(url) = &self.git_repository_url {
            return json!({
                "type": "git",
                "repository": url,
                "checkout": self.git_checkout,
                "subpath": self.git_subpath,
            });
        }
        json!({"type": "store", "id": self.plugin_id})
    }

    // `result` is the result of an installation job, its descriptor tells
    // whether the plugin comes with a code env
    fn needs_code_env(&self, result: &Value, desired: &Definition) -> bool {
        self.install_code_env
            && result["pluginDesc"].get("codeEnvSpec").is_some()
            && !desired.contains_key(CODE_ENV_KEY)
    }
}

impl Declaration for Plugin {
    fn kind(&self) -> Kind {
        Kind::Plugin
    }

    fn id(&self) -> &str {
        &self.plugin_id
    }

    fn state(&self) -> State {
        self.state
    }

    fn probe(&self) -> Probe {
        Probe::List
    }

    fn identifies(&self, summary: &Value) -> bool {
        summary["id"] == json!(self.plugin_id)
    }

    fn declared(&self, _current: Option<&Definition>) -> Result<Definition, ValidationError> {
        Ok(self.settings.clone().unwrap_or_default())
    }

    fn creation_fields(&self, desired: &Definition) -> Definition {
        let mut fields = desired.clone();
        fields.insert(INSTALL_SOURCE_KEY.into(), self.source());
        fields
    }

    fn follow_ups(
        &self,
        _outcome: Outcome,
        current: Option<&Definition>,
        _desired: &Definition,
    ) -> Vec<Action> {
        if current.is_some() && self.force {
            vec![Action::UpdateFromSource(self.source())]
        } else {
            Vec::new()
        }
    }

    fn after_job(&self, action: Option<&Action>, result: &Value, desired: &Definition) -> Vec<Action> {
        let installed = matches!(action, None | Some(Action::UpdateFromSource(_)));
        if installed && self.needs_code_env(result, desired) {
            vec![Action::CreateCodeEnv]
        } else {
            Vec::new()
        }
    }

    fn force_delete(&self) -> bool {
        self.force
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::{Call, MemoryClient};
    use crate::reconcile::Reconciler;
    use pretty_assertions::assert_eq;

    fn plugin(value: Value) -> Plugin {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn it_picks_the_install_source() {
        let p = plugin(json!({"plugin_id": "geo", "zip_file": "/tmp/geo.zip", "git_repository_url": "x"}));
        assert_eq!(p.source(), json!({"type": "zip", "path": "/tmp/geo.zip"}));

        let p = plugin(json!({"plugin_id": "geo", "git_repository_url": "https://git/geo.git"}));
        assert_eq!(
            p.source(),
            json!({"type": "git", "repository": "https://git/geo.git", "checkout": "master", "subpath": null})
        );

        let p = plugin(json!({"plugin_id": "geo"}));
        assert_eq!(p.source(), json!({"type": "store", "id": "geo"}));
    }

    fn with_code_env() -> Value {
        json!({"pluginDesc": {"id": "geo", "codeEnvSpec": {"pythonInterpreter": "PYTHON39"}}})
    }

    #[tokio::test]
    async fn it_installs_missing_plugins_with_their_code_env() {
        let client = MemoryClient::new().with_job_output(Kind::Plugin, "geo", with_code_env());
        let p = plugin(json!({"plugin_id": "geo", "settings": {"config": {"key": "v"}}}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();

        assert_eq!(report.message, Outcome::Created);
        assert_eq!(report.job_results.len(), 2);
        assert_eq!(report.job_results[0], with_code_env());
        assert_eq!(report.job_results[1]["action"], json!("create_code_env"));
        let calls = client.mutations().await;
        let Some(Call::Create(_, _, fields)) = calls.first() else {
            panic!("expected a creation");
        };
        assert_eq!(fields[INSTALL_SOURCE_KEY], json!({"type": "store", "id": "geo"}));
        assert_eq!(fields["config"], json!({"key": "v"}));
    }

    #[tokio::test]
    async fn it_skips_the_code_env_when_the_plugin_has_none() {
        let client = MemoryClient::new()
            .with_job_output(Kind::Plugin, "no-env-plugin", json!({"pluginDesc": {"id": "no-env-plugin"}}));
        let p = plugin(json!({"plugin_id": "no-env-plugin"}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();

        assert_eq!(report.message, Outcome::Created);
        assert_eq!(report.job_results, vec![json!({"pluginDesc": {"id": "no-env-plugin"}})]);
        assert!(!client
            .mutations()
            .await
            .iter()
            .any(|call| matches!(call, Call::Start(..))));

        // same when the installation does not report anything
        let client = MemoryClient::new();
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();
        assert!(report.job_results.is_empty());
    }

    #[tokio::test]
    async fn it_leaves_the_code_env_alone_on_request() {
        let client = MemoryClient::new().with_job_output(Kind::Plugin, "geo", with_code_env());
        let p = plugin(json!({"plugin_id": "geo", "install_code_env": false}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();
        assert_eq!(report.job_results, vec![with_code_env()]);
    }

    #[tokio::test]
    async fn it_creates_the_code_env_after_a_reinstall() {
        let client = MemoryClient::new()
            .with_resource(Kind::Plugin, "geo", json!({"config": {}}))
            .with_job_output(Kind::Plugin, "geo", with_code_env());
        let p = plugin(json!({"plugin_id": "geo", "force": true}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();

        assert_eq!(report.message, Outcome::Unchanged);
        let actions: Vec<&Value> = report.job_results.iter().map(|r| &r["action"]).collect();
        assert_eq!(actions, vec![&json!("update_from_source"), &json!("create_code_env")]);
    }

    #[tokio::test]
    async fn it_forwards_force_to_deletions() {
        let client = MemoryClient::new().with_resource(Kind::Plugin, "geo", json!({}));
        let p = plugin(json!({"plugin_id": "geo", "state": "absent", "force": true}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();

        assert_eq!(report.message, Outcome::Deleted);
        assert_eq!(
            client.mutations().await,
            vec![Call::Delete(Kind::Plugin, "geo".into(), true)]
        );
        // reinstalling makes no sense for a deleted plugin
        assert!(report.job_results.is_empty());
    }

    #[tokio::test]
    async fn it_reinstalls_existing_plugins_on_request() {
        let client = MemoryClient::new().with_resource(
            Kind::Plugin,
            "geo",
            json!({"config": {"key": "v"}, "codeEnvName": "plugin_geo"}),
        );
        let p = plugin(json!({"plugin_id": "geo"}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();
        assert_eq!(report.message, Outcome::Unchanged);
        assert!(report.job_results.is_empty());

        let p = plugin(json!({"plugin_id": "geo", "force": true, "zip_file": "geo.zip"}));
        let report = Reconciler::new(&client).reconcile(&p).await.unwrap();
        assert_eq!(report.message, Outcome::Unchanged);
        assert_eq!(
            report.job_results,
            vec![json!({
                "action": "update_from_source",
                "source": {"type": "zip", "path": "geo.zip"},
                "target": "geo"
            })]
        );
    }
}
