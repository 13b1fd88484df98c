//! Scene host - Loader state and child gating for scenes.
//!
//! - [`SceneRecord`] tracks a scene's [`LoadState`] in a signal, fed by the
//!   three loader listeners the reconciler subscribes on attach
//! - [`scene_gate`] shows a loading indicator until the state is ready

mod gate;
mod record;

pub use gate::{Cleanup, scene_gate};
pub use record::{LoadState, SceneRecord};

pub(crate) use record::{LOADER_EVENTS, loader_listener};
