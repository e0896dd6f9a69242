//! Persistence synchronization
//!
//! Serial per-key background writes and the synchronizer that keeps the
//! active profile's task blob current.

mod queue;
mod synchronizer;

pub use queue::SaveQueue;
pub use synchronizer::TaskSync;
