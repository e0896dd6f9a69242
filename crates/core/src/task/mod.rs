//! Task module
//!
//! The task record, the in-memory store that mutates it, and the derived
//! views rendered from it.

mod input;
mod model;
mod store;
mod view;

pub use input::{parse_due_input, validate_due, validate_title, TaskDraft};
pub use model::*;
pub use store::TaskStore;
pub use view::*;
