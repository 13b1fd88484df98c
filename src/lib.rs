//! # sprite-fiber
//!
//! Declarative scene reconciler for a 2D game engine.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! scene load state and loading gates.
//!
//! ## Architecture
//!
//! A host declares, per element, a flavor and an attribute set. The
//! reconciler keeps one live object per element and turns every render into
//! the minimal set of native engine calls:
//! ```text
//! AttributeSet → capability groups (diff) → appliers (plan) → Engine calls
//! ```
//!
//! Attributes are partitioned into capability groups per flavor. A group is
//! re-applied when any field it owns changes; untouched groups cost nothing.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Flavor, AttrValue, AttributeSet, Capability)
//! - [`capabilities`] - Capability registry, group tables, appliers
//! - [`pipeline`] - Diff engine, update plans, the [`Reconciler`]
//! - [`engine`] - Live object registry, lifecycle state, disposers
//! - [`scene`] - Scene load state and loading gates
//! - [`backend`] - Engine trait, native calls, the headless engine
//! - [`config`] - Reconciler configuration
//! - [`error`] - Error types

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod scene;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use backend::{
    AttachPoint, BlendMode, ConstructArgs, Engine, HeadlessEngine, LoaderEvent, LoaderEventKind,
    NativeCall, SceneHooks, TextAlign, TextStyle,
};

pub use capabilities::{ApplyContext, CapabilityRegistry, Fallback, GroupSpec, Phase};

pub use config::{ConstructChangePolicy, EngineDefaults, ReconcilerConfig};

pub use engine::{LifecycleState, LiveObjectHandle, Parent};

pub use error::{AttributeError, NativeError, ReconcileError, RegistryError, Result};

pub use pipeline::{Reconciler, changed_capabilities, changed_groups, compute_changed_groups};

pub use scene::{Cleanup, LoadState, SceneRecord, scene_gate};
