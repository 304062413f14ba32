//! Declarations of the DSS resources
//!
//! Each declaration deserializes from the module arguments and describes
//! how its resource kind plugs into the reconciliation: template, secret
//! fields, existence probe and follow-up jobs. Each module also lists the
//! node types the resource can be managed on.
mod api_deployer_infra;
mod code_env;
mod connection;
mod general_settings;
mod group;
mod plugin;
mod user;

pub use api_deployer_infra::*;
pub use code_env::*;
pub use connection::*;
pub use general_settings::*;
pub use group::*;
pub use plugin::*;
pub use user::*;
