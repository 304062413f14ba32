//! Primitives to compare and combine definitions
mod exclude;
mod merge;
mod named_list;
mod project;
mod template;

pub use exclude::*;
pub use merge::*;
pub use named_list::*;
pub use project::*;
pub use template::*;
