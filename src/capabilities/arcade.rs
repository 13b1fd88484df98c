//! Arcade body groups.
//!
//! `debug` is a bundle (`body_color`, `show_body`, `show_velocity`) applied
//! through one native call taking all three values; keys left out of the
//! bundle come from [`EngineDefaults::arcade_debug`](crate::config::EngineDefaults).
//! The vector groups accept a scalar for both axes or an `{x, y}` bundle.

use super::fields::{self, Bundle};
use super::{ApplyContext, Fallback, GroupSpec};
use crate::backend::NativeCall;
use crate::error::AttributeError;
use crate::types::Capability;

const DEBUG_KEYS: &[&str] = &["body_color", "show_body", "show_velocity"];

pub(crate) const GROUPS: [GroupSpec; 8] = [
    GroupSpec::update(Capability::ARCADE_DEBUG, "arcade_debug", &["debug"], Fallback::Default, apply_debug),
    GroupSpec::update(Capability::ARCADE_BOUNCE, "arcade_bounce", &["bounce"], Fallback::Default, apply_bounce),
    GroupSpec::update(
        Capability::ARCADE_VELOCITY,
        "arcade_velocity",
        &["velocity"],
        Fallback::Default,
        apply_velocity,
    ),
    GroupSpec::update(
        Capability::ARCADE_ACCELERATION,
        "arcade_acceleration",
        &["acceleration"],
        Fallback::Default,
        apply_acceleration,
    ),
    GroupSpec::update(Capability::ARCADE_DRAG, "arcade_drag", &["drag"], Fallback::Default, apply_drag),
    GroupSpec::update(
        Capability::ARCADE_GRAVITY,
        "arcade_gravity",
        &["gravity"],
        Fallback::Default,
        apply_gravity,
    ),
    GroupSpec::update(
        Capability::ARCADE_IMMOVABLE,
        "arcade_immovable",
        &["immovable"],
        Fallback::Default,
        apply_immovable,
    ),
    GroupSpec::update(
        Capability::ARCADE_WORLD_BOUNDS,
        "arcade_world_bounds",
        &["collide_world_bounds"],
        Fallback::Default,
        apply_world_bounds,
    ),
];

fn apply_debug(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let defaults = ctx.defaults.arcade_debug;
    let call = match Bundle::read(ctx.next, "debug", DEBUG_KEYS)? {
        Some(debug) => NativeCall::SetDebug {
            show_body: debug.boolean("show_body")?.unwrap_or(defaults.show_body),
            show_velocity: debug.boolean("show_velocity")?.unwrap_or(defaults.show_velocity),
            body_color: debug.color("body_color")?.unwrap_or(defaults.body_color),
        },
        None => NativeCall::SetDebug {
            show_body: defaults.show_body,
            show_velocity: defaults.show_velocity,
            body_color: defaults.body_color,
        },
    };
    Ok(vec![call])
}

fn apply_bounce(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let (x, y) = fields::pair(ctx.next, "bounce", (0.0, 0.0))?.unwrap_or((0.0, 0.0));
    Ok(vec![NativeCall::SetBounceXY { x, y }])
}

fn apply_velocity(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let (x, y) = fields::pair(ctx.next, "velocity", (0.0, 0.0))?.unwrap_or((0.0, 0.0));
    Ok(vec![NativeCall::SetVelocity { x, y }])
}

fn apply_acceleration(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let (x, y) = fields::pair(ctx.next, "acceleration", (0.0, 0.0))?.unwrap_or((0.0, 0.0));
    Ok(vec![NativeCall::SetAcceleration { x, y }])
}

fn apply_drag(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let (x, y) = fields::pair(ctx.next, "drag", (0.0, 0.0))?.unwrap_or((0.0, 0.0));
    Ok(vec![NativeCall::SetDrag { x, y }])
}

fn apply_gravity(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let (x, y) = fields::pair(ctx.next, "gravity", (0.0, 0.0))?.unwrap_or((0.0, 0.0));
    Ok(vec![NativeCall::SetGravity { x, y }])
}

fn apply_immovable(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let immovable = fields::boolean(ctx.next, "immovable")?.unwrap_or(false);
    Ok(vec![NativeCall::SetImmovable(immovable)])
}

fn apply_world_bounds(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let collide = fields::boolean(ctx.next, "collide_world_bounds")?.unwrap_or(false);
    Ok(vec![NativeCall::SetCollideWorldBounds(collide)])
}
