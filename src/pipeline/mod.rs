//! The validator -> screen -> digitizer -> multi-label cascade.
//!
//! [`CascadeBuilder`] loads the models named by a configuration into a
//! [`CascadeContext`]; [`CascadeOrchestrator`] runs images through it.

mod builder;
mod cascade;
mod gates;
mod stats;

pub use builder::CascadeBuilder;
pub use cascade::{CascadeContext, CascadeOrchestrator, CascadeState};
pub use gates::{BinaryScreen, ImageValidator};
pub use stats::{CascadeStats, StatsManager};
