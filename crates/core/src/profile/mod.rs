//! Local profile
//!
//! A profile is a display name (and optional photo) that selects which
//! storage namespace holds the task collection. It is not an identity.

mod model;
mod store;

pub use model::*;
pub use store::ProfileStore;
