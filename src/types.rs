//! Core types for sprite-fiber.
//!
//! These types define the declarative side of the reconciler: which flavor
//! an element is, what attributes it declares, and which capability groups
//! those attributes fall into.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Native Identifiers
// =============================================================================

/// Identifier of a native object owned by the presentation engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a loader listener registered with the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

// =============================================================================
// Flavor
// =============================================================================

/// The fixed category of a live object.
///
/// A flavor decides which capability groups apply to an object and how the
/// engine constructs it. It never changes for the lifetime of a live object;
/// a declared flavor change replaces the object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    /// Textured visual primitive.
    Sprite,
    /// Text object.
    Text,
    /// Container grouping other display objects.
    Container,
    /// Sprite with an arcade physics body.
    ArcadeSprite,
    /// Sprite with a matter physics body.
    MatterSprite,
    /// Top-level scene.
    Scene,
    /// Flavor added through registry registration.
    Custom(&'static str),
}

impl Flavor {
    /// All built-in flavors, in declaration order.
    pub const BUILTIN: [Flavor; 6] = [
        Flavor::Sprite,
        Flavor::Text,
        Flavor::Container,
        Flavor::ArcadeSprite,
        Flavor::MatterSprite,
        Flavor::Scene,
    ];

    /// Physics backend this flavor's body lives in, if any.
    pub fn physics(&self) -> Option<PhysicsBackend> {
        match self {
            Flavor::ArcadeSprite => Some(PhysicsBackend::Arcade),
            Flavor::MatterSprite => Some(PhysicsBackend::Matter),
            _ => None,
        }
    }

    /// Whether objects of this flavor can host display children.
    pub fn hosts_children(&self) -> bool {
        matches!(self, Flavor::Scene | Flavor::Container)
    }

    /// Stable name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Flavor::Sprite => "sprite",
            Flavor::Text => "text",
            Flavor::Container => "container",
            Flavor::ArcadeSprite => "arcade-sprite",
            Flavor::MatterSprite => "matter-sprite",
            Flavor::Scene => "scene",
            Flavor::Custom(name) => name,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physics simulation a body belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysicsBackend {
    Arcade,
    Matter,
}

// =============================================================================
// Capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Capability groups as a bit set.
    ///
    /// Each registry group carries exactly one of these bits; a flavor's
    /// capability mask is the union of its groups.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capability: u64 {
        const TEXTURE = 1 << 0;
        const POSITION = 1 << 1;
        const ROTATION = 1 << 2;
        const SCALE = 1 << 3;
        const ORIGIN = 1 << 4;
        const ALPHA = 1 << 5;
        const TINT = 1 << 6;
        const DEPTH = 1 << 7;
        const VISIBLE = 1 << 8;
        const FLIP = 1 << 9;
        const SCROLL_FACTOR = 1 << 10;
        const BLEND_MODE = 1 << 11;
        const TEXT = 1 << 12;
        const STYLE = 1 << 13;
        const LINE_SPACING = 1 << 14;
        const SIZE = 1 << 15;
        const DISPLAY_SIZE = 1 << 16;
        const CROP = 1 << 17;

        const ARCADE_DEBUG = 1 << 20;
        const ARCADE_BOUNCE = 1 << 21;
        const ARCADE_VELOCITY = 1 << 22;
        const ARCADE_ACCELERATION = 1 << 23;
        const ARCADE_DRAG = 1 << 24;
        const ARCADE_GRAVITY = 1 << 25;
        const ARCADE_IMMOVABLE = 1 << 26;
        const ARCADE_WORLD_BOUNDS = 1 << 27;

        const MATTER_BOUNCE = 1 << 32;
        const MATTER_FRICTION = 1 << 33;
        const MATTER_MASS = 1 << 34;
        const MATTER_SENSOR = 1 << 35;
        const MATTER_STATIC = 1 << 36;
        const MATTER_VELOCITY = 1 << 37;
        const MATTER_ANGULAR_VELOCITY = 1 << 38;

        const SCENE_CONFIG = 1 << 48;
        const ACTIVE = 1 << 49;
        const SCENE_HOOKS = 1 << 50;

        /// Groups supplied by custom registrations.
        const CUSTOM = 1 << 63;
    }
}

// =============================================================================
// Scene Hooks
// =============================================================================

/// Callback the engine runs at a scene lifecycle point, given the scene.
///
/// Hooks compare by identity: re-declaring the same `SceneHook` (or a clone
/// of it) is no change, a freshly built closure is.
#[derive(Clone)]
pub struct SceneHook(Rc<dyn Fn(ObjectId)>);

impl SceneHook {
    pub fn new(hook: impl Fn(ObjectId) + 'static) -> Self {
        Self(Rc::new(hook))
    }

    pub fn call(&self, scene: ObjectId) {
        (self.0)(scene)
    }
}

impl PartialEq for SceneHook {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SceneHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SceneHook({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// A declared attribute value.
///
/// Equality is structural, so two bundles compare equal when every nested
/// field does.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Bundle(BTreeMap<String, AttrValue>),
    /// Scene lifecycle callback.
    Hook(SceneHook),
}

impl AttrValue {
    /// Build a bundle from `(key, value)` pairs.
    ///
    /// ```ignore
    /// let debug = AttrValue::bundle([
    ///     ("body_color", 12.into()),
    ///     ("show_body", true.into()),
    /// ]);
    /// ```
    pub fn bundle<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AttrValue)>,
    {
        AttrValue::Bundle(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::List(_) => "list",
            AttrValue::Bundle(_) => "bundle",
            AttrValue::Hook(_) => "hook",
        }
    }

    /// Numeric view: ints widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Float(value as f64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<SceneHook> for AttrValue {
    fn from(value: SceneHook) -> Self {
        AttrValue::Hook(value)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(value: Vec<AttrValue>) -> Self {
        AttrValue::List(value)
    }
}

// =============================================================================
// Attribute Set
// =============================================================================

/// The full declared configuration of one live object at one render.
///
/// Key order is irrelevant; only group membership matters to the diff.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSet {
    values: BTreeMap<String, AttrValue>,
}

impl AttributeSet {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder-style removal.
    pub fn without(mut self, name: &str) -> Self {
        self.values.remove(name);
        self
    }

    /// Insert or replace an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    /// Look up an attribute.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// Whether an attribute is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
