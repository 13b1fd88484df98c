//! Field readers shared by the appliers.
//!
//! Each reader returns `Ok(None)` for an absent field and an
//! [`AttributeError`] when the value has the wrong shape. Appliers decide
//! what absence means.

use std::collections::BTreeMap;

use crate::error::AttributeError;
use crate::types::{AttrValue, AttributeSet, SceneHook};

// =============================================================================
// Value Conversions
// =============================================================================

pub(crate) fn as_number(field: &str, value: &AttrValue) -> Result<f64, AttributeError> {
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(AttributeError::out_of_range(field, "must be finite")),
        None => Err(AttributeError::wrong_type(field, "number", value.kind())),
    }
}

pub(crate) fn as_bool(field: &str, value: &AttrValue) -> Result<bool, AttributeError> {
    match value {
        AttrValue::Bool(v) => Ok(*v),
        other => Err(AttributeError::wrong_type(field, "bool", other.kind())),
    }
}

pub(crate) fn as_string(field: &str, value: &AttrValue) -> Result<String, AttributeError> {
    match value {
        AttrValue::Str(v) => Ok(v.clone()),
        other => Err(AttributeError::wrong_type(field, "string", other.kind())),
    }
}

/// Colors are `0xRRGGBB` integers or `"#rrggbb"` / `"0xrrggbb"` strings.
pub(crate) fn as_color(field: &str, value: &AttrValue) -> Result<u32, AttributeError> {
    match value {
        AttrValue::Int(v) => {
            u32::try_from(*v).map_err(|_| AttributeError::out_of_range(field, format!("color {v} is not a u32")))
        }
        AttrValue::Str(s) => {
            let hex = s
                .strip_prefix('#')
                .or_else(|| s.strip_prefix("0x"))
                .ok_or_else(|| AttributeError::out_of_range(field, format!("`{s}` is not a hex color")))?;
            u32::from_str_radix(hex, 16)
                .map_err(|_| AttributeError::out_of_range(field, format!("`{s}` is not a hex color")))
        }
        other => Err(AttributeError::wrong_type(field, "color", other.kind())),
    }
}

// =============================================================================
// Attribute Set Readers
// =============================================================================

pub(crate) fn number(set: &AttributeSet, field: &str) -> Result<Option<f64>, AttributeError> {
    set.get(field).map(|v| as_number(field, v)).transpose()
}

pub(crate) fn boolean(set: &AttributeSet, field: &str) -> Result<Option<bool>, AttributeError> {
    set.get(field).map(|v| as_bool(field, v)).transpose()
}

pub(crate) fn string(set: &AttributeSet, field: &str) -> Result<Option<String>, AttributeError> {
    set.get(field).map(|v| as_string(field, v)).transpose()
}

pub(crate) fn color(set: &AttributeSet, field: &str) -> Result<Option<u32>, AttributeError> {
    set.get(field).map(|v| as_color(field, v)).transpose()
}

/// Text content: a string, or a list of strings joined with newlines.
pub(crate) fn text(set: &AttributeSet, field: &str) -> Result<Option<String>, AttributeError> {
    match set.get(field) {
        None => Ok(None),
        Some(AttrValue::Str(s)) => Ok(Some(s.clone())),
        Some(AttrValue::List(lines)) => {
            let lines = lines
                .iter()
                .map(|line| as_string(field, line))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(lines.join("\n")))
        }
        Some(other) => Err(AttributeError::wrong_type(field, "string or list", other.kind())),
    }
}

/// Frame names may be strings or frame indices.
pub(crate) fn frame(set: &AttributeSet, field: &str) -> Result<Option<String>, AttributeError> {
    match set.get(field) {
        None => Ok(None),
        Some(AttrValue::Str(s)) => Ok(Some(s.clone())),
        Some(AttrValue::Int(i)) => Ok(Some(i.to_string())),
        Some(other) => Err(AttributeError::wrong_type(field, "string or int", other.kind())),
    }
}

/// Scene lifecycle callback.
pub(crate) fn hook(set: &AttributeSet, field: &str) -> Result<Option<SceneHook>, AttributeError> {
    match set.get(field) {
        None => Ok(None),
        Some(AttrValue::Hook(hook)) => Ok(Some(hook.clone())),
        Some(other) => Err(AttributeError::wrong_type(field, "hook", other.kind())),
    }
}

/// A two-axis value: a scalar applies to both axes, a `{x, y}` bundle sets
/// them individually. Missing axes fall back to `default`.
pub(crate) fn pair(
    set: &AttributeSet,
    field: &str,
    default: (f64, f64),
) -> Result<Option<(f64, f64)>, AttributeError> {
    let Some(value) = set.get(field) else {
        return Ok(None);
    };
    match value {
        AttrValue::Bundle(map) => {
            let bundle = Bundle::new(field, map, &["x", "y"])?;
            Ok(Some((
                bundle.number("x")?.unwrap_or(default.0),
                bundle.number("y")?.unwrap_or(default.1),
            )))
        }
        other => {
            let v = as_number(field, other)?;
            Ok(Some((v, v)))
        }
    }
}

// =============================================================================
// Bundle Reader
// =============================================================================

/// Typed access to a bundle's keys, with shape checking.
pub(crate) struct Bundle<'a> {
    field: &'a str,
    map: &'a BTreeMap<String, AttrValue>,
}

impl<'a> Bundle<'a> {
    /// Wrap a bundle, rejecting keys outside `allowed`.
    pub(crate) fn new(
        field: &'a str,
        map: &'a BTreeMap<String, AttrValue>,
        allowed: &[&str],
    ) -> Result<Self, AttributeError> {
        if let Some(key) = map.keys().find(|key| !allowed.contains(&key.as_str())) {
            return Err(AttributeError::UnknownKey {
                field: field.to_string(),
                key: key.clone(),
            });
        }
        Ok(Self { field, map })
    }

    /// Read `field` from `set` as a bundle.
    pub(crate) fn read(
        set: &'a AttributeSet,
        field: &'a str,
        allowed: &[&str],
    ) -> Result<Option<Self>, AttributeError> {
        match set.get(field) {
            None => Ok(None),
            Some(AttrValue::Bundle(map)) => Self::new(field, map, allowed).map(Some),
            Some(other) => Err(AttributeError::wrong_type(field, "bundle", other.kind())),
        }
    }

    fn path(&self, key: &str) -> String {
        format!("{}.{}", self.field, key)
    }

    pub(crate) fn number(&self, key: &str) -> Result<Option<f64>, AttributeError> {
        self.map.get(key).map(|v| as_number(&self.path(key), v)).transpose()
    }

    pub(crate) fn boolean(&self, key: &str) -> Result<Option<bool>, AttributeError> {
        self.map.get(key).map(|v| as_bool(&self.path(key), v)).transpose()
    }

    pub(crate) fn string(&self, key: &str) -> Result<Option<String>, AttributeError> {
        self.map.get(key).map(|v| as_string(&self.path(key), v)).transpose()
    }

    pub(crate) fn color(&self, key: &str) -> Result<Option<u32>, AttributeError> {
        self.map.get(key).map(|v| as_color(&self.path(key), v)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_forms() {
        let set = AttributeSet::new()
            .with("a", 0xff0000)
            .with("b", "#00ff00")
            .with("c", "0x0000ff")
            .with("d", -1)
            .with("e", "red");

        assert_eq!(color(&set, "a"), Ok(Some(0xff0000)));
        assert_eq!(color(&set, "b"), Ok(Some(0x00ff00)));
        assert_eq!(color(&set, "c"), Ok(Some(0x0000ff)));
        assert!(color(&set, "d").is_err());
        assert!(color(&set, "e").is_err());
        assert_eq!(color(&set, "missing"), Ok(None));
    }

    #[test]
    fn test_pair_scalar_and_bundle() {
        let set = AttributeSet::new()
            .with("both", 2.0)
            .with("split", AttrValue::bundle([("y", AttrValue::from(3.0))]));

        assert_eq!(pair(&set, "both", (0.0, 0.0)), Ok(Some((2.0, 2.0))));
        assert_eq!(pair(&set, "split", (0.0, 0.0)), Ok(Some((0.0, 3.0))));
        assert_eq!(pair(&set, "none", (0.0, 0.0)), Ok(None));
    }

    #[test]
    fn test_bundle_rejects_unknown_keys() {
        let set = AttributeSet::new().with("debug", AttrValue::bundle([("colour", AttrValue::from(1))]));
        let result = Bundle::read(&set, "debug", &["body_color"]);
        assert!(matches!(result, Err(AttributeError::UnknownKey { .. })));
    }

    #[test]
    fn test_text_list_joined() {
        let set = AttributeSet::new().with("text", vec![AttrValue::from("a"), AttrValue::from("b")]);
        assert_eq!(text(&set, "text"), Ok(Some("a\nb".to_string())));
    }

    #[test]
    fn test_wrong_type_names_field() {
        let set = AttributeSet::new().with("alpha", "opaque");
        let err = number(&set, "alpha").unwrap_err();
        assert_eq!(err, AttributeError::wrong_type("alpha", "number", "string"));
    }
}
