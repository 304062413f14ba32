#![cfg_attr(docsrs, feature(doc_cfg))]
//! dss-reconciler manages Dataiku DSS resources declaratively and idempotently.
//!
//! Each resource (connection, user, group, code environment, plugin, general
//! settings, API deployer infrastructure) is described by a typed
//! declaration. A [`Reconciler`](`reconcile::Reconciler`) compares the
//! declaration with what the remote API holds and creates, updates or
//! deletes the resource only when needed.
//!
//! ```rust,no_run
//! use dss_reconciler::client::memory::MemoryClient;
//! use dss_reconciler::reconcile::Reconciler;
//! use dss_reconciler::resources::Group;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), dss_reconciler::Error> {
//! let client = MemoryClient::new();
//! let group: Group = serde_json::from_value(json!({"name": "ops", "may_develop_plugins": true}))?;
//!
//! let report = Reconciler::new(&client).reconcile(&group).await?;
//! assert!(report.changed);
//! # Ok(())
//! # }
//! ```
//!
//! # Comparing definitions
//!
//! Remote resources are described by a [`Definition`](`definition::Definition`), a nested JSON
//! mapping. The [`toolkit`] module has the primitives used to build and
//! compare them: deep merge, projection on a shape, exclusion of key paths,
//! merge of lists by name and template construction.
//!
//! Secret fields (passwords, client secrets) are stored encrypted remotely
//! and can never be compared with the declared values. They are ignored when
//! deciding whether something changed, unless the declaration asks otherwise,
//! and they never show up in a [`Report`](`reconcile::Report`).
//!
//! # Logging
//!
//! The library uses the [tracing crate](https://crates.io/crates/tracing).
//! Every reconciliation runs inside a `reconcile` span, pending changes are
//! logged at debug level as JSON patch operations.
pub mod client;
pub mod config;
pub mod definition;
pub mod path;
pub mod reconcile;
pub mod resources;
pub mod toolkit;

mod error;

pub use error::*;
