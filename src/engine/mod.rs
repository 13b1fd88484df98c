//! Live object engine - Registry, lifecycle state and disposers.
//!
//! The engine manages the reconciler's bookkeeping:
//! - Registry: generational slots, free index pool
//! - LiveObject: flavor, native instance, parent, stored attributes
//! - Disposers: release callbacks run once on detach
//!
//! # Architecture
//!
//! Live objects are NOT referenced directly. Hosts hold handles into the
//! registry:
//!
//! ```text
//! Handle 0v0: Scene  (parent=Game,   instance=#1, state=Attached)
//! Handle 1v0: Sprite (parent=0v0,    instance=#2, state=Attached)
//! Handle 1v1: Text   (parent=0v0,    instance=#5, state=Attached)  <- slot 1 reused
//! ```

mod disposers;
mod live_object;
mod registry;

pub use disposers::{Disposer, Disposers};
pub use live_object::{LifecycleState, LiveObject, Parent};
pub use registry::{LiveObjectHandle, ObjectRegistry};
