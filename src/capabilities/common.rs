//! Display object groups shared by sprites, text and containers.

use super::fields::{self, Bundle};
use super::{ApplyContext, Fallback, GroupSpec};
use crate::backend::{BlendMode, ConstructArgs, NativeCall};
use crate::error::AttributeError;
use crate::types::{AttrValue, AttributeSet, Capability};

/// Texture key used when a sprite declares none.
pub const DEFAULT_TEXTURE: &str = "__DEFAULT";

// =============================================================================
// Groups
// =============================================================================

pub(crate) const TEXTURE: GroupSpec =
    GroupSpec::construct(Capability::TEXTURE, "texture", &["texture", "frame"]);

pub(crate) const POSITION: GroupSpec =
    GroupSpec::update(Capability::POSITION, "position", &["x", "y"], Fallback::Default, apply_position);

pub(crate) const ROTATION: GroupSpec =
    GroupSpec::update(Capability::ROTATION, "rotation", &["rotation"], Fallback::Default, apply_rotation);

pub(crate) const SCALE: GroupSpec = GroupSpec::update(
    Capability::SCALE,
    "scale",
    &["scale", "scale_x", "scale_y"],
    Fallback::Default,
    apply_scale,
);

pub(crate) const ORIGIN: GroupSpec = GroupSpec::update(
    Capability::ORIGIN,
    "origin",
    &["origin_x", "origin_y"],
    Fallback::Default,
    apply_origin,
);

pub(crate) const ALPHA: GroupSpec =
    GroupSpec::update(Capability::ALPHA, "alpha", &["alpha"], Fallback::Default, apply_alpha);

pub(crate) const TINT: GroupSpec =
    GroupSpec::update(Capability::TINT, "tint", &["tint"], Fallback::Clear, apply_tint);

pub(crate) const DEPTH: GroupSpec =
    GroupSpec::update(Capability::DEPTH, "depth", &["depth"], Fallback::Default, apply_depth);

pub(crate) const VISIBLE: GroupSpec =
    GroupSpec::update(Capability::VISIBLE, "visible", &["visible"], Fallback::Default, apply_visible);

pub(crate) const FLIP: GroupSpec = GroupSpec::update(
    Capability::FLIP,
    "flip",
    &["flip_x", "flip_y"],
    Fallback::Default,
    apply_flip,
);

pub(crate) const SCROLL_FACTOR: GroupSpec = GroupSpec::update(
    Capability::SCROLL_FACTOR,
    "scroll_factor",
    &["scroll_factor_x", "scroll_factor_y"],
    Fallback::Default,
    apply_scroll_factor,
);

pub(crate) const BLEND_MODE: GroupSpec = GroupSpec::update(
    Capability::BLEND_MODE,
    "blend_mode",
    &["blend_mode"],
    Fallback::Default,
    apply_blend_mode,
);

pub(crate) const SIZE: GroupSpec =
    GroupSpec::update(Capability::SIZE, "size", &["width", "height"], Fallback::Retain, apply_size);

pub(crate) const DISPLAY_SIZE: GroupSpec = GroupSpec::update(
    Capability::DISPLAY_SIZE,
    "display_size",
    &["display_width", "display_height"],
    Fallback::Retain,
    apply_display_size,
);

pub(crate) const CROP: GroupSpec =
    GroupSpec::update(Capability::CROP, "crop", &["crop"], Fallback::Clear, apply_crop);

const CROP_KEYS: &[&str] = &["x", "y", "width", "height"];

/// Groups of every textured or text display object, in registry order.
pub(crate) const DISPLAY: [GroupSpec; 14] = [
    POSITION,
    ROTATION,
    SCALE,
    ORIGIN,
    ALPHA,
    TINT,
    DEPTH,
    VISIBLE,
    FLIP,
    SCROLL_FACTOR,
    BLEND_MODE,
    SIZE,
    DISPLAY_SIZE,
    CROP,
];

/// Container groups, in registry order.
pub(crate) const CONTAINER: [GroupSpec; 9] = [
    POSITION,
    ROTATION,
    SCALE,
    ALPHA,
    DEPTH,
    VISIBLE,
    SCROLL_FACTOR,
    BLEND_MODE,
    SIZE,
];

// =============================================================================
// Constructors
// =============================================================================

pub(crate) fn construct_sprite(set: &AttributeSet) -> Result<ConstructArgs, AttributeError> {
    Ok(ConstructArgs::Sprite {
        x: fields::number(set, "x")?.unwrap_or(0.0),
        y: fields::number(set, "y")?.unwrap_or(0.0),
        texture: fields::string(set, "texture")?.unwrap_or_else(|| DEFAULT_TEXTURE.to_string()),
        frame: fields::frame(set, "frame")?,
    })
}

pub(crate) fn construct_container(set: &AttributeSet) -> Result<ConstructArgs, AttributeError> {
    Ok(ConstructArgs::Container {
        x: fields::number(set, "x")?.unwrap_or(0.0),
        y: fields::number(set, "y")?.unwrap_or(0.0),
    })
}

// =============================================================================
// Appliers
// =============================================================================

fn apply_position(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let x = fields::number(ctx.next, "x")?.unwrap_or(0.0);
    let y = fields::number(ctx.next, "y")?.unwrap_or(0.0);
    Ok(vec![NativeCall::SetPosition { x, y }])
}

fn apply_rotation(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let rotation = fields::number(ctx.next, "rotation")?.unwrap_or(0.0);
    Ok(vec![NativeCall::SetRotation(rotation)])
}

/// `scale` sets both axes; `scale_x` / `scale_y` override one axis.
fn apply_scale(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let base = fields::number(ctx.next, "scale")?.unwrap_or(1.0);
    let x = fields::number(ctx.next, "scale_x")?.unwrap_or(base);
    let y = fields::number(ctx.next, "scale_y")?.unwrap_or(base);
    Ok(vec![NativeCall::SetScale { x, y }])
}

fn apply_origin(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let x = fields::number(ctx.next, "origin_x")?.unwrap_or(0.5);
    let y = fields::number(ctx.next, "origin_y")?.unwrap_or(0.5);
    Ok(vec![NativeCall::SetOrigin { x, y }])
}

fn apply_alpha(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let alpha = fields::number(ctx.next, "alpha")?.unwrap_or(1.0);
    if !(0.0..=1.0).contains(&alpha) {
        return Err(AttributeError::out_of_range("alpha", format!("{alpha} is outside 0..=1")));
    }
    Ok(vec![NativeCall::SetAlpha(alpha)])
}

fn apply_tint(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    match fields::color(ctx.next, "tint")? {
        Some(color) => Ok(vec![NativeCall::SetTint(color)]),
        None if ctx.removed("tint") => Ok(vec![NativeCall::ClearTint]),
        None => Ok(Vec::new()),
    }
}

fn apply_depth(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let depth = fields::number(ctx.next, "depth")?.unwrap_or(0.0);
    Ok(vec![NativeCall::SetDepth(depth)])
}

pub(crate) fn apply_visible(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let visible = fields::boolean(ctx.next, "visible")?.unwrap_or(true);
    Ok(vec![NativeCall::SetVisible(visible)])
}

fn apply_flip(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let x = fields::boolean(ctx.next, "flip_x")?.unwrap_or(false);
    let y = fields::boolean(ctx.next, "flip_y")?.unwrap_or(false);
    Ok(vec![NativeCall::SetFlip { x, y }])
}

fn apply_scroll_factor(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let x = fields::number(ctx.next, "scroll_factor_x")?.unwrap_or(1.0);
    let y = fields::number(ctx.next, "scroll_factor_y")?.unwrap_or(1.0);
    Ok(vec![NativeCall::SetScrollFactor { x, y }])
}

/// Blend modes are names (`"add"`) or the engine's numeric constants.
fn apply_blend_mode(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let mode = match ctx.next.get("blend_mode") {
        None => BlendMode::Normal,
        Some(AttrValue::Str(name)) => BlendMode::from_name(name).ok_or_else(|| {
            AttributeError::out_of_range("blend_mode", format!("unknown blend mode `{name}`"))
        })?,
        Some(AttrValue::Int(index)) => BlendMode::from_index(*index).ok_or_else(|| {
            AttributeError::out_of_range("blend_mode", format!("unknown blend mode {index}"))
        })?,
        Some(other) => {
            return Err(AttributeError::wrong_type("blend_mode", "string or int", other.kind()));
        }
    };
    Ok(vec![NativeCall::SetBlendMode(mode)])
}

/// Size has no engine default; it is only applied once both sides are known.
fn apply_size(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let width = fields::number(ctx.next, "width")?;
    let height = fields::number(ctx.next, "height")?;
    match (width, height) {
        (Some(width), Some(height)) => Ok(vec![NativeCall::SetSize { width, height }]),
        _ => Ok(Vec::new()),
    }
}

fn apply_display_size(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let width = fields::number(ctx.next, "display_width")?;
    let height = fields::number(ctx.next, "display_height")?;
    match (width, height) {
        (Some(width), Some(height)) => Ok(vec![NativeCall::SetDisplaySize { width, height }]),
        _ => Ok(Vec::new()),
    }
}

/// `crop` is an `{x, y, width, height}` bundle; width and height are
/// required, the corner defaults to 0,0.
fn apply_crop(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let Some(crop) = Bundle::read(ctx.next, "crop", CROP_KEYS)? else {
        return Ok(if ctx.removed("crop") {
            vec![NativeCall::ClearCrop]
        } else {
            Vec::new()
        });
    };

    let required = |key: &str| -> Result<f64, AttributeError> {
        let value = crop.number(key)?.ok_or_else(|| AttributeError::Missing {
            field: format!("crop.{key}"),
        })?;
        if value < 0.0 {
            return Err(AttributeError::out_of_range(&format!("crop.{key}"), "must not be negative"));
        }
        Ok(value)
    };
    Ok(vec![NativeCall::SetCrop {
        x: crop.number("x")?.unwrap_or(0.0),
        y: crop.number("y")?.unwrap_or(0.0),
        width: required("width")?,
        height: required("height")?,
    }])
}

// =============================================================================
// Tests
// =============================================================================
