//! Text groups: content, style and line spacing.

use super::fields::{self, Bundle};
use super::{ApplyContext, Fallback, GroupSpec};
use crate::backend::{ConstructArgs, NativeCall, TextAlign, TextStyle};
use crate::error::AttributeError;
use crate::types::{AttributeSet, Capability};

const STYLE_KEYS: &[&str] = &[
    "font_family",
    "font_size",
    "color",
    "background_color",
    "stroke",
    "stroke_thickness",
    "align",
    "word_wrap_width",
];

pub(crate) const GROUPS: [GroupSpec; 3] = [
    GroupSpec::update(Capability::TEXT, "text", &["text"], Fallback::Default, apply_text),
    GroupSpec::update(Capability::STYLE, "style", &["style"], Fallback::Default, apply_style),
    GroupSpec::update(
        Capability::LINE_SPACING,
        "line_spacing",
        &["line_spacing"],
        Fallback::Default,
        apply_line_spacing,
    ),
];

pub(crate) fn construct_text(set: &AttributeSet) -> Result<ConstructArgs, AttributeError> {
    Ok(ConstructArgs::Text {
        x: fields::number(set, "x")?.unwrap_or(0.0),
        y: fields::number(set, "y")?.unwrap_or(0.0),
        text: fields::text(set, "text")?.unwrap_or_default(),
        style: read_style(set)?.unwrap_or_default(),
    })
}

fn apply_text(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let text = fields::text(ctx.next, "text")?.unwrap_or_default();
    Ok(vec![NativeCall::SetText(text)])
}

fn apply_style(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let style = read_style(ctx.next)?.unwrap_or_default();
    Ok(vec![NativeCall::SetStyle(style)])
}

fn apply_line_spacing(ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    let spacing = fields::number(ctx.next, "line_spacing")?.unwrap_or(0.0);
    Ok(vec![NativeCall::SetLineSpacing(spacing)])
}

/// Parse the `style` bundle. Keys left out keep their [`TextStyle`] default.
fn read_style(set: &AttributeSet) -> Result<Option<TextStyle>, AttributeError> {
    let Some(bundle) = Bundle::read(set, "style", STYLE_KEYS)? else {
        return Ok(None);
    };

    let mut style = TextStyle::default();
    if let Some(family) = bundle.string("font_family")? {
        style.font_family = family;
    }
    if let Some(size) = bundle.number("font_size")? {
        if size <= 0.0 {
            return Err(AttributeError::out_of_range("style.font_size", "must be positive"));
        }
        style.font_size = size;
    }
    if let Some(color) = bundle.string("color")? {
        style.color = color;
    }
    style.background_color = bundle.string("background_color")?;
    if let Some(stroke) = bundle.string("stroke")? {
        style.stroke = stroke;
    }
    if let Some(thickness) = bundle.number("stroke_thickness")? {
        style.stroke_thickness = thickness;
    }
    if let Some(align) = bundle.string("align")? {
        style.align = match align.as_str() {
            "left" => TextAlign::Left,
            "center" => TextAlign::Center,
            "right" => TextAlign::Right,
            "justify" => TextAlign::Justify,
            other => {
                return Err(AttributeError::out_of_range(
                    "style.align",
                    format!("unknown alignment `{other}`"),
                ));
            }
        };
    }
    style.word_wrap_width = bundle.number("word_wrap_width")?;
    Ok(Some(style))
}
