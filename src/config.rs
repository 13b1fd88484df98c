//! Reconciler configuration.
//!
//! Plain values with defaults matching the engine's own. Build one with
//! `ReconcilerConfig::default()` and adjust through the `with_*` methods:
//!
//! ```ignore
//! let config = ReconcilerConfig::default()
//!     .with_construct_change(ConstructChangePolicy::Reject)
//!     .with_trace_native_calls(true);
//! ```

/// Arcade body debug rendering defaults, substituted for absent `debug`
/// bundle fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArcadeDebugDefaults {
    pub show_body: bool,
    pub show_velocity: bool,
    pub body_color: u32,
}

impl Default for ArcadeDebugDefaults {
    fn default() -> Self {
        Self {
            show_body: true,
            show_velocity: true,
            body_color: 0xff00ff,
        }
    }
}

/// Matter body friction defaults, substituted for absent friction fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatterFrictionDefaults {
    pub friction: f64,
    pub air: f64,
    pub fstatic: f64,
}

impl Default for MatterFrictionDefaults {
    fn default() -> Self {
        Self {
            friction: 0.1,
            air: 0.01,
            fstatic: 0.5,
        }
    }
}

/// Engine defaults that depend on how the game was configured.
///
/// Fixed defaults (position 0, alpha 1, ...) live with their appliers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineDefaults {
    pub arcade_debug: ArcadeDebugDefaults,
    pub matter_friction: MatterFrictionDefaults,
}

/// What to do when a construction-time field changes after creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConstructChangePolicy {
    /// Log a warning and keep the constructed value.
    #[default]
    Warn,
    /// Fail the update with `ReconcileError::ConstructOnly`.
    Reject,
}

/// Reconciler configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReconcilerConfig {
    pub defaults: EngineDefaults,
    pub construct_change: ConstructChangePolicy,
    /// Emit a `trace!` event for every native call.
    pub trace_native_calls: bool,
}

impl ReconcilerConfig {
    pub fn with_defaults(mut self, defaults: EngineDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_construct_change(mut self, policy: ConstructChangePolicy) -> Self {
        self.construct_change = policy;
        self
    }

    pub fn with_trace_native_calls(mut self, enabled: bool) -> Self {
        self.trace_native_calls = enabled;
        self
    }
}
