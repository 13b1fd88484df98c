//! Matter body groups.

use super::fields;
use super::{ApplyContext, Fallback, GroupSpec};
use crate::backend::NativeCall;
use crate::error::AttributeError;
use crate::types::Capability;

pub(crate) const GROUPS: [GroupSpec; 7] = [
    GroupSpec::update(Capability::MATTER_BOUNCE, "matter_bounce", &["bounce"], Fallback::Default, apply_bounce),
    GroupSpec::update(
        Capability::MATTER_FRICTION,
        "matter_friction",
        &["friction", "friction_air", "friction_static"],
        Fallback::Default,
        apply_friction,
    ),
    GroupSpec::update(Capability::MATTER_MASS, "matter_mass", &["mass"], Fallback::Retain, apply_mass),
    GroupSpec::update(Capability::MATTER_SENSOR, "matter_sensor", &["sensor"], Fallback::Default, apply_sensor),
    GroupSpec::update(
        Capability::MATTER_STATIC,
        "matter_static",
        &["is_static"],
        Fallback::Default,
        apply_static,
    ),
    GroupSpec::update(
        Capability::MATTER_VELOCITY,
        "matter_velocity",
        &["velocity"],
        Fallback::Default,
        apply_velocity,
    ),
    GroupSpec::update(
        Capability::MATTER_ANGULAR_VELOCITY,
        "matter_angular_velocity",
        &["angular_velocity"],
        Fallback::Default,
        apply_angular_velocity,
    ),
];

/// Restitution is a single scalar in matter.
fn apply_bounce(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let bounce = fields::number(ctx.next, "bounce")?.unwrap_or(0.0);
    Ok(vec![NativeCall::SetBounce(bounce)])
}

fn apply_friction(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let defaults = ctx.defaults.matter_friction;
    Ok(vec![NativeCall::SetFriction {
        friction: fields::number(ctx.next, "friction")?.unwrap_or(defaults.friction),
        air: fields::number(ctx.next, "friction_air")?.unwrap_or(defaults.air),
        fstatic: fields::number(ctx.next, "friction_static")?.unwrap_or(defaults.fstatic),
    }])
}

/// Mass is derived from the body's area and density until declared, so a
/// removed mass leaves the body alone.
fn apply_mass(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    match fields::number(ctx.next, "mass")? {
        Some(mass) if mass <= 0.0 => Err(AttributeError::out_of_range("mass", "must be positive")),
        Some(mass) => Ok(vec![NativeCall::SetMass(mass)]),
        None => Ok(Vec::new()),
    }
}

fn apply_sensor(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let sensor = fields::boolean(ctx.next, "sensor")?.unwrap_or(false);
    Ok(vec![NativeCall::SetSensor(sensor)])
}

fn apply_static(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let is_static = fields::boolean(ctx.next, "is_static")?.unwrap_or(false);
    Ok(vec![NativeCall::SetStatic(is_static)])
}

fn apply_velocity(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let (x, y) = fields::pair(ctx.next, "velocity", (0.0, 0.0))?.unwrap_or((0.0, 0.0));
    Ok(vec![NativeCall::SetVelocity { x, y }])
}

fn apply_angular_velocity(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let velocity = fields::number(ctx.next, "angular_velocity")?.unwrap_or(0.0);
    Ok(vec![NativeCall::SetAngularVelocity(velocity)])
}
