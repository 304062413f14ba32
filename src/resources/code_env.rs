use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{Action, Kind, Lang};
use crate::config::NodeType;
use crate::definition::Definition;
use crate::error::ValidationError;
use crate::path::DottedPath;
use crate::reconcile::{Declaration, Outcome, Probe, State};
use crate::toolkit::merge_definition;

pub const CODE_ENV_NODE_TYPES: &[NodeType] = &[NodeType::Design, NodeType::Automation];

// Deployment modes where the owner is part of the description
const OWNER_IN_DESC: &[&str] = &["DESIGN_MANAGED", "PLUGIN_MANAGED", "PLUGIN_NON_MANAGED"];

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct CodeEnv {
    pub name: String,
    pub lang: Lang,
    #[serde(default)]
    pub state: State,
    pub deployment_mode: String,
    /// Declared fields go under this key when set
    pub version: Option<String>,
    #[serde(default = "default_true")]
    pub core_packages: bool,
    #[serde(default = "default_true")]
    pub jupyter_support: bool,
    /// Update the packages on every run
    #[serde(default = "default_true")]
    pub update: bool,
    pub permissions: Option<Vec<Value>>,
    #[serde(default = "default_true")]
    pub usable_by_all: bool,
    pub owner: Option<String>,
    pub conda_environment: Option<String>,
    pub package_list: Option<Vec<String>>,
    pub external_conda_env_name: Option<String>,
    pub python_interpreter: Option<String>,
    pub desc: Option<Definition>,
}

impl CodeEnv {
    fn is_managed(&self) -> bool {
        !self.deployment_mode.contains("NON_MANAGED")
    }

    /// Path to a field of the versioned part of the definition
    fn versioned(&self, field: &str) -> DottedPath {
        let mut segments: Vec<&str> = self.version.iter().map(String::as_str).collect();
        segments.extend(field.split('.'));
        DottedPath::from_segments(segments)
    }

    fn packages_changed(&self, current: &Definition, desired: &Definition) -> bool {
        ["specPackageList", "desc.installJupyterSupport"]
            .iter()
            .map(|field| self.versioned(field))
            .any(|path| match (path.lookup(current), path.lookup(desired)) {
                (Some(before), Some(after)) => before != after,
                _ => false,
            })
    }
}

impl Declaration for CodeEnv {
    fn kind(&self) -> Kind {
        Kind::CodeEnv(self.lang)
    }

    fn id(&self) -> &str {
        &self.name
    }

    fn state(&self) -> State {
        self.state
    }

    fn probe(&self) -> Probe {
        Probe::List
    }

    fn identifies(&self, summary: &Value) -> bool {
        summary["envName"] == json!(self.name) && summary["envLang"] == json!(self.lang)
    }

    fn declared(&self, _current: Option<&Definition>) -> Result<Definition, ValidationError> {
        let mut versioned = Definition::new();
        let mut desc = Definition::new();

        if let Some(env) = &self.conda_environment {
            versioned.insert("specCondaEnvironment".into(), json!(env));
        }
        if let Some(packages) = &self.package_list {
            versioned.insert("specPackageList".into(), json!(packages.join("\n")));
        }
        if let Some(env) = &self.external_conda_env_name {
            versioned.insert("externalCondaEnvName".into(), json!(env));
        }
        if let Some(owner) = &self.owner {
            if OWNER_IN_DESC.contains(&self.deployment_mode.as_str()) {
                desc.insert("owner".into(), json!(owner));
            } else {
                versioned.insert("owner".into(), json!(owner));
            }
        }
        if let Some(extra) = &self.desc {
            merge_definition(&mut desc, extra);
        }
        if self.core_packages && !desc.contains_key("installCorePackages") {
            desc.insert("installCorePackages".into(), json!(true));
        }
        if self.jupyter_support && !desc.contains_key("installJupyterSupport") {
            desc.insert("installJupyterSupport".into(), json!(true));
        }
        versioned.insert("desc".into(), Value::Object(desc));

        let mut declared = match &self.version {
            Some(version) => {
                let mut declared = Definition::new();
                declared.insert(version.clone(), Value::Object(versioned));
                declared
            }
            None => versioned,
        };
        if let Some(permissions) = &self.permissions {
            declared.insert("permissions".into(), json!(permissions));
        }
        declared.insert("usableByAll".into(), json!(self.usable_by_all));
        Ok(declared)
    }

    fn creation_fields(&self, desired: &Definition) -> Definition {
        let mut fields = desired.clone();
        fields.insert("deploymentMode".into(), json!(self.deployment_mode));
        if let Some(interpreter) = &self.python_interpreter {
            self.versioned("pythonInterpreter")
                .assign(&mut fields, json!(interpreter));
        }
        fields
    }

    fn follow_ups(
        &self,
        outcome: Outcome,
        current: Option<&Definition>,
        desired: &Definition,
    ) -> Vec<Action> {
        if !self.is_managed() {
            return Vec::new();
        }
        let changed = current.is_some_and(|current| self.packages_changed(current, desired));
        if self.update || outcome == Outcome::Created || changed {
            vec![Action::UpdatePackages]
        } else {
            Vec::new()
        }
    }
}
