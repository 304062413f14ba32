//! An in-memory [`Client`]
//!
//! Resources live in a map keyed by kind and id, every call is recorded so
//! callers can check what a reconciliation did (or did not do).
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{Action, Client, ClientError, Created, Handle, Job, Kind};
use crate::definition::{to_definition, Definition};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    List,
    Get,
    Create,
    Set,
    Delete,
    Start,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    List(Kind),
    Get(Kind, String),
    Create(Kind, String, Definition),
    Set(Kind, String, Definition),
    /// The last field tells whether the deletion was forced
    Delete(Kind, String, bool),
    Start(Kind, String, Action),
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::List(..) => Operation::List,
            Call::Get(..) => Operation::Get,
            Call::Create(..) => Operation::Create,
            Call::Set(..) => Operation::Set,
            Call::Delete(..) => Operation::Delete,
            Call::Start(..) => Operation::Start,
        }
    }

    /// Whether the call changes anything on the remote side
    pub fn is_mutation(&self) -> bool {
        !matches!(self.operation(), Operation::List | Operation::Get)
    }
}

#[derive(Default)]
pub struct MemoryClient {
    resources: RwLock<BTreeMap<(Kind, String), Definition>>,
    calls: RwLock<Vec<Call>>,
    failures: BTreeMap<Operation, String>,
    job_outputs: BTreeMap<(Kind, String), Value>,
}

impl MemoryClient {
    pub fn new() -> Self {
        MemoryClient::default()
    }

    /// Seed a resource
    pub fn with_resource(mut self, kind: Kind, id: &str, def: Value) -> Self {
        self.resources
            .get_mut()
            .insert((kind, id.to_string()), to_definition(def));
        self
    }

    /// Make every call of the given operation fail with the message
    pub fn failing(mut self, operation: Operation, message: &str) -> Self {
        self.failures.insert(operation, message.to_string());
        self
    }

    /// Fields added to the result of every job run on the given resource,
    /// its creation included
    pub fn with_job_output(mut self, kind: Kind, id: &str, output: Value) -> Self {
        self.job_outputs.insert((kind, id.to_string()), output);
        self
    }

    pub async fn definition(&self, kind: &Kind, id: &str) -> Option<Definition> {
        self.resources
            .read()
            .await
            .get(&(kind.clone(), id.to_string()))
            .cloned()
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.read().await.clone()
    }

    pub async fn mutations(&self) -> Vec<Call> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    async fn record(&self, call: Call) -> Result<(), ClientError> {
        let operation = call.operation();
        self.calls.write().await.push(call);
        match self.failures.get(&operation) {
            Some(msg) => Err(ClientError::Other(anyhow!("{msg}"))),
            None => Ok(()),
        }
    }
}

fn not_found(kind: &Kind, id: &str) -> ClientError {
    ClientError::NotFound(format!("{kind} '{id}'"))
}

// Summaries follow the shape of the DSS list endpoints
fn summary(kind: &Kind, id: &str) -> Value {
    match kind {
        Kind::CodeEnv(lang) => json!({"envName": id, "envLang": lang}),
        Kind::ApiDeployerInfra => json!({"infraBasicInfo": {"id": id}}),
        Kind::User => json!({"login": id}),
        Kind::Group | Kind::Connection => json!({"name": id}),
        Kind::Plugin | Kind::GeneralSettings => json!({"id": id}),
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn list(&self, kind: &Kind) -> Result<Vec<Value>, ClientError> {
        self.record(Call::List(kind.clone())).await?;
        Ok(self
            .resources
            .read()
            .await
            .keys()
            .filter(|(k, _)| k == kind)
            .map(|(k, id)| summary(k, id))
            .collect())
    }

    fn resource<'a>(&'a self, kind: &Kind, id: &str) -> Box<dyn Handle + 'a> {
        Box::new(MemoryHandle {
            client: self,
            kind: kind.clone(),
            id: id.to_string(),
        })
    }

    async fn create<'a>(
        &'a self,
        kind: &Kind,
        id: &str,
        fields: &Definition,
    ) -> Result<Created<'a>, ClientError> {
        self.record(Call::Create(kind.clone(), id.to_string(), fields.clone()))
            .await?;
        let mut resources = self.resources.write().await;
        let key = (kind.clone(), id.to_string());
        if resources.contains_key(&key) {
            return Err(ClientError::Other(anyhow!("{kind} '{id}' already exists")));
        }
        let result = self.job_outputs.get(&key).cloned();
        resources.insert(key, fields.clone());
        Ok(Created {
            handle: self.resource(kind, id),
            result,
        })
    }
}

struct MemoryHandle<'a> {
    client: &'a MemoryClient,
    kind: Kind,
    id: String,
}

impl MemoryHandle<'_> {
    fn key(&self) -> (Kind, String) {
        (self.kind.clone(), self.id.clone())
    }
}

#[async_trait]
impl Handle for MemoryHandle<'_> {
    async fn get_definition(&self) -> Result<Definition, ClientError> {
        self.client
            .record(Call::Get(self.kind.clone(), self.id.clone()))
            .await?;
        self.client
            .resources
            .read()
            .await
            .get(&self.key())
            .cloned()
            .ok_or_else(|| not_found(&self.kind, &self.id))
    }

    async fn set_definition(&self, def: &Definition) -> Result<(), ClientError> {
        self.client
            .record(Call::Set(self.kind.clone(), self.id.clone(), def.clone()))
            .await?;
        match self.client.resources.write().await.get_mut(&self.key()) {
            Some(current) => {
                *current = def.clone();
                Ok(())
            }
            None => Err(not_found(&self.kind, &self.id)),
        }
    }

    async fn delete(&self, force: bool) -> Result<(), ClientError> {
        self.client
            .record(Call::Delete(self.kind.clone(), self.id.clone(), force))
            .await?;
        self.client
            .resources
            .write()
            .await
            .remove(&self.key())
            .map(|_| ())
            .ok_or_else(|| not_found(&self.kind, &self.id))
    }

    async fn start(&self, action: &Action) -> Result<Box<dyn Job>, ClientError> {
        self.client
            .record(Call::Start(self.kind.clone(), self.id.clone(), action.clone()))
            .await?;
        if !self.client.resources.read().await.contains_key(&self.key()) {
            return Err(not_found(&self.kind, &self.id));
        }
        let mut result = serde_json::to_value(action).map_err(anyhow::Error::from)?;
        if let Value::Object(fields) = &mut result {
            fields.insert("target".into(), json!(self.id));
            if let Some(Value::Object(output)) = self.client.job_outputs.get(&self.key()) {
                fields.extend(output.clone());
            }
        }
        Ok(Box::new(MemoryJob(Some(result))))
    }
}

/// A job that is already finished
struct MemoryJob(Option<Value>);

#[async_trait]
impl Job for MemoryJob {
    async fn wait_for_result(&mut self) -> Result<Value, ClientError> {
        self.0
            .take()
            .ok_or_else(|| ClientError::Other(anyhow!("job result was already consumed")))
    }
}
