//! The managed link tree: resolution, persistence, mutation and the
//! reconciliation pass that ties them together.

pub mod engine;
pub mod operator;
pub mod resolver;
pub mod store;

pub use engine::{format_actions, format_report, LinkAction, PassReport, Reconciler};
pub use operator::{DeleteOutcome, LinkOperator};
pub use resolver::PathResolver;
pub use store::{LinkState, LinkStateStore, LoadedState, RebuildReport};
