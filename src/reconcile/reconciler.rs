use json_patch::{diff, Patch};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, error, field, info, span, Instrument, Level, Span};

use super::{decide, Declaration, Outcome, Probe, Report, SecretCheck, State};
use crate::client::{Client, ClientError, Handle, Kind};
use crate::definition::Definition;
use crate::error::Error;
use crate::toolkit::redact;

/// Runs the reconciliation procedure against a remote API.
///
/// Every call is strictly sequential: existence probe, decision, then at
/// most one mutation followed by the resource follow-up jobs. Nothing is
/// retried and nothing is rolled back, the first remote failure aborts the
/// reconciliation.
pub struct Reconciler<'c, C: ?Sized> {
    client: &'c C,
    dry_run: bool,
}

impl<'c, C: Client + ?Sized> Reconciler<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Reconciler {
            client,
            dry_run: false,
        }
    }

    /// Compute the outcome without performing any remote mutation
    pub fn dry_run(self, dry_run: bool) -> Self {
        Reconciler { dry_run, ..self }
    }

    pub async fn reconcile<D: Declaration + ?Sized>(&self, decl: &D) -> Result<Report, Error> {
        let kind = decl.kind();
        async {
            let result = self.run(decl).await;
            let span = Span::current();
            match &result {
                Ok(report) => {
                    span.record("return", field::display(report.message));
                    info!(changed = report.changed, "{}", report.message);
                }
                Err(err) => {
                    error!("reconciliation failed: {err}");
                }
            }
            result
        }
        .instrument(span!(
            Level::INFO,
            "reconcile",
            kind = %kind,
            id = decl.id(),
            dry_run = self.dry_run,
            return = field::Empty
        ))
        .await
    }

    async fn run<D: Declaration + ?Sized>(&self, decl: &D) -> Result<Report, Error> {
        decl.validate()?;

        let kind = decl.kind();
        let id = decl.id();
        let state = decl.state();
        let handle = self.client.resource(&kind, id);

        let mut current = self.fetch(decl, &kind, id, handle.as_ref()).await?;
        if current.is_none() && !decl.creatable() {
            return Err(Error::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        decl.validate_against(current.as_ref())?;
        if let Some(def) = current.as_mut() {
            decl.normalize(def);
        }

        // The desired definition starts from a copy of the current one, the
        // current one is still needed for the comparison
        let declared = decl.declared(current.as_ref())?;
        let mut desired = current.clone().unwrap_or_else(|| decl.template());
        decl.apply(&mut desired, &declared)?;
        decl.normalize(&mut desired);

        let secrets = SecretCheck::new(decl.secret_fields(), decl.secret_policy(), &declared);
        let outcome = decide(state, current.as_ref(), &desired, &secrets);
        if outcome == Outcome::Created {
            decl.validate_creation()?;
        }

        let snapshot = |def: &Definition| {
            Value::Object(redact(&decl.snapshot(def, &declared), secrets.paths()))
        };
        let previous = current.as_ref().map(snapshot);
        let after = (state == State::Present).then(|| snapshot(&desired));
        let changes = diff(
            previous.as_ref().unwrap_or(&Value::Null),
            after.as_ref().unwrap_or(&Value::Null),
        );
        log_changes(&changes);

        let mut report = Report {
            changed: outcome.is_change(),
            message: outcome,
            previous,
            current: after,
            diff: changes,
            job_results: Vec::new(),
        };

        if self.dry_run {
            if outcome.is_change() {
                info!("dry run: skipping {kind} {outcome}");
            }
            return Ok(report);
        }

        let mut pending = VecDeque::new();
        let handle = match outcome {
            Outcome::Created => {
                info!("creating {kind} '{id}'");
                let fields = decl.creation_fields(&desired);
                let created = self
                    .client
                    .create(&kind, id, &fields)
                    .await
                    .map_err(Error::remote("create", &kind, id))?;
                if let Some(result) = created.result {
                    pending.extend(decl.after_job(None, &result, &desired));
                    report.job_results.push(result);
                }
                Some(created.handle)
            }
            Outcome::Modified => {
                info!("updating {kind} '{id}'");
                handle
                    .set_definition(&desired)
                    .await
                    .map_err(Error::remote("update", &kind, id))?;
                Some(handle)
            }
            Outcome::Deleted => {
                let force = decl.force_delete();
                info!(force, "deleting {kind} '{id}'");
                handle
                    .delete(force)
                    .await
                    .map_err(Error::remote("delete", &kind, id))?;
                None
            }
            Outcome::Unchanged => current.is_some().then_some(handle),
        };

        if let Some(handle) = handle {
            let mut actions: VecDeque<_> = decl
                .follow_ups(outcome, current.as_ref(), &desired)
                .into();
            actions.append(&mut pending);
            while let Some(action) = actions.pop_front() {
                info!("{kind} '{id}': {action} ...");
                let mut job = handle
                    .start(&action)
                    .await
                    .map_err(Error::remote("start job on", &kind, id))?;
                let result = job
                    .wait_for_result()
                    .await
                    .map_err(Error::remote("wait for job on", &kind, id))?;
                info!("{kind} '{id}': {action}: success");
                actions.extend(decl.after_job(Some(&action), &result, &desired));
                report.job_results.push(result);
            }
        }

        Ok(report)
    }

    async fn fetch<D: Declaration + ?Sized>(
        &self,
        decl: &D,
        kind: &Kind,
        id: &str,
        handle: &dyn Handle,
    ) -> Result<Option<Definition>, Error> {
        if decl.probe() == Probe::List {
            let summaries = self
                .client
                .list(kind)
                .await
                .map_err(Error::remote("list", kind, id))?;
            if !summaries.iter().any(|s| decl.identifies(s)) {
                debug!("{kind} '{id}' is not listed");
                return Ok(None);
            }
            // a listed resource must be readable
            let def = handle
                .get_definition()
                .await
                .map_err(Error::remote("get", kind, id))?;
            return Ok(Some(def));
        }

        match handle.get_definition().await {
            Ok(def) => Ok(Some(def)),
            Err(ClientError::NotFound(msg)) => {
                debug!("{msg} does not exist");
                Ok(None)
            }
            Err(err) => Err(Error::remote("get", kind, id)(err)),
        }
    }
}

fn log_changes(changes: &Patch) {
    let Patch(ops) = changes;
    if ops.is_empty() {
        return;
    }
    debug!("pending changes");
    for op in ops {
        debug!("- {op}");
    }
}
