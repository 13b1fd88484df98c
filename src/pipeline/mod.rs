//! Reconcile Pipeline
//!
//! Connects declared attributes to native mutations.
//!
//! # Pipeline Architecture
//!
//! ```text
//! AttributeSet → diff (changed groups) → plan (appliers) → execute (engine calls)
//! ```
//!
//! ## Key Design Principles
//!
//! - **Pure planning**: diffing and appliers never touch the engine
//! - **All or nothing**: every group validates before the first native call
//! - **Registry order**: groups apply in table order, whatever the attribute order

pub mod diff;
pub mod plan;
pub mod reconciler;

// Re-exports
pub use diff::{changed_capabilities, changed_groups, compute_changed_groups, construct_changes};
pub use plan::{PlannedGroup, execute, plan};
pub use reconciler::Reconciler;
