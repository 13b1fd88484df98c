//! Scene groups.
//!
//! `key`, `auto_start` and the engine settings register the scene with the
//! game and are fixed from then on, as are the lifecycle hooks bound onto the
//! instance. `active` and `visible` toggle a running scene.

use super::common::apply_visible;
use super::fields;
use super::{ApplyContext, Fallback, GroupSpec};
use crate::backend::{ConstructArgs, NativeCall, SceneHooks};
use crate::error::AttributeError;
use crate::types::{AttrValue, AttributeSet, Capability};

/// Engine scene settings handed to the constructor untouched.
const SETTINGS: &[&str] = &["physics", "loader", "plugins", "pack", "cameras", "map"];

pub(crate) const GROUPS: [GroupSpec; 4] = [
    GroupSpec::construct(
        Capability::SCENE_CONFIG,
        "scene_config",
        &["key", "auto_start", "physics", "loader", "plugins", "pack", "cameras", "map"],
    ),
    GroupSpec::construct(
        Capability::SCENE_HOOKS,
        "scene_hooks",
        &["on_init", "on_preload", "on_create"],
    ),
    GroupSpec::update(Capability::ACTIVE, "active", &["active"], Fallback::Default, apply_active),
    GroupSpec::update(Capability::VISIBLE, "visible", &["visible"], Fallback::Default, apply_visible),
];

pub(crate) fn construct_scene(set: &AttributeSet) -> Result<ConstructArgs, AttributeError> {
    let key = fields::string(set, "key")?.ok_or_else(|| AttributeError::Missing {
        field: "key".to_string(),
    })?;
    if key.is_empty() {
        return Err(AttributeError::out_of_range("key", "must not be empty"));
    }

    let mut settings = AttributeSet::new();
    for &field in SETTINGS {
        match set.get(field) {
            None => {}
            Some(value @ (AttrValue::Bundle(_) | AttrValue::List(_))) => settings.set(field, value.clone()),
            Some(other) => {
                return Err(AttributeError::wrong_type(field, "bundle or list", other.kind()));
            }
        }
    }

    Ok(ConstructArgs::Scene {
        key,
        auto_start: fields::boolean(set, "auto_start")?.unwrap_or(true),
        settings,
        hooks: SceneHooks {
            init: fields::hook(set, "on_init")?,
            preload: fields::hook(set, "on_preload")?,
            create: fields::hook(set, "on_create")?,
        },
    })
}

fn apply_active(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let active = fields::boolean(ctx.next, "active")?.unwrap_or(true);
    Ok(vec![NativeCall::SetActive(active)])
}
