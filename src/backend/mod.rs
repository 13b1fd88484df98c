//! Backend boundary - The presentation engine seen from the reconciler.
//!
//! The reconciler never touches engine internals. Everything it does goes
//! through the [`Engine`] trait:
//! - `create` / `destroy` native objects
//! - `invoke` one [`NativeCall`] against an object
//! - `attach` / `detach` objects to display lists, containers, physics worlds
//! - `subscribe` / `unsubscribe` scene loader listeners
//!
//! # Irregular native APIs
//!
//! Real engines expose setters with different arities and bundled calls
//! (`setDebug(showBody, showVelocity, bodyColor)`, `setFriction(value, air,
//! static)`). [`NativeCall`] spells each of those out as its own variant so
//! the irregularity stays here, at the edge, and the diff algorithm only sees
//! capability groups.
//!
//! [`HeadlessEngine`] is an in-memory implementation that records every
//! call. It backs the test suite and the demos.

mod headless;

use std::rc::Rc;

use crate::error::NativeResult;
use crate::types::{AttributeSet, Flavor, ListenerId, ObjectId, PhysicsBackend, SceneHook};

pub use headless::{CallRecord, HeadlessEngine};

// =============================================================================
// Native Value Types
// =============================================================================

/// Blend mode understood by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
    Erase,
}

impl BlendMode {
    /// Parse a blend mode name (`"add"`, `"MULTIPLY"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "normal" => Some(BlendMode::Normal),
            "add" => Some(BlendMode::Add),
            "multiply" => Some(BlendMode::Multiply),
            "screen" => Some(BlendMode::Screen),
            "erase" => Some(BlendMode::Erase),
            _ => None,
        }
    }

    /// Parse the engine's numeric blend mode constant.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(BlendMode::Normal),
            1 => Some(BlendMode::Add),
            2 => Some(BlendMode::Multiply),
            3 => Some(BlendMode::Screen),
            17 => Some(BlendMode::Erase),
            _ => None,
        }
    }
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Text style passed to text constructors and `setStyle`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// CSS color string.
    pub color: String,
    pub background_color: Option<String>,
    pub stroke: String,
    pub stroke_thickness: f64,
    pub align: TextAlign,
    /// Wrap width in pixels; `None` disables wrapping.
    pub word_wrap_width: Option<f64>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Courier".to_string(),
            font_size: 16.0,
            color: "#fff".to_string(),
            background_color: None,
            stroke: "#fff".to_string(),
            stroke_thickness: 0.0,
            align: TextAlign::Left,
            word_wrap_width: None,
        }
    }
}

// =============================================================================
// Native Calls
// =============================================================================

/// One native mutation entry point, with its exact arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeCall {
    // Display object
    SetPosition { x: f64, y: f64 },
    SetRotation(f64),
    SetScale { x: f64, y: f64 },
    SetOrigin { x: f64, y: f64 },
    SetAlpha(f64),
    SetTint(u32),
    ClearTint,
    SetDepth(f64),
    SetVisible(bool),
    SetFlip { x: bool, y: bool },
    SetScrollFactor { x: f64, y: f64 },
    SetBlendMode(BlendMode),
    SetSize { width: f64, height: f64 },
    SetDisplaySize { width: f64, height: f64 },
    SetCrop { x: f64, y: f64, width: f64, height: f64 },
    /// `setCrop()` with no arguments.
    ClearCrop,

    // Text
    SetText(String),
    SetStyle(TextStyle),
    SetLineSpacing(f64),

    // Arcade body
    SetDebug {
        show_body: bool,
        show_velocity: bool,
        body_color: u32,
    },
    SetBounceXY { x: f64, y: f64 },
    SetAcceleration { x: f64, y: f64 },
    SetDrag { x: f64, y: f64 },
    SetGravity { x: f64, y: f64 },
    SetImmovable(bool),
    SetCollideWorldBounds(bool),

    // Matter body
    SetBounce(f64),
    SetFriction { friction: f64, air: f64, fstatic: f64 },
    SetMass(f64),
    SetSensor(bool),
    SetStatic(bool),
    SetAngularVelocity(f64),

    // Both physics backends
    SetVelocity { x: f64, y: f64 },

    // Scene
    SetActive(bool),
}

impl NativeCall {
    /// Native method name, as the engine spells it.
    pub fn name(&self) -> &'static str {
        match self {
            NativeCall::SetPosition { .. } => "setPosition",
            NativeCall::SetRotation(_) => "setRotation",
            NativeCall::SetScale { .. } => "setScale",
            NativeCall::SetOrigin { .. } => "setOrigin",
            NativeCall::SetAlpha(_) => "setAlpha",
            NativeCall::SetTint(_) => "setTint",
            NativeCall::ClearTint => "clearTint",
            NativeCall::SetDepth(_) => "setDepth",
            NativeCall::SetVisible(_) => "setVisible",
            NativeCall::SetFlip { .. } => "setFlip",
            NativeCall::SetScrollFactor { .. } => "setScrollFactor",
            NativeCall::SetBlendMode(_) => "setBlendMode",
            NativeCall::SetSize { .. } => "setSize",
            NativeCall::SetDisplaySize { .. } => "setDisplaySize",
            NativeCall::SetCrop { .. } | NativeCall::ClearCrop => "setCrop",
            NativeCall::SetText(_) => "setText",
            NativeCall::SetStyle(_) => "setStyle",
            NativeCall::SetLineSpacing(_) => "setLineSpacing",
            NativeCall::SetDebug { .. } => "setDebug",
            NativeCall::SetBounceXY { .. } => "setBounce",
            NativeCall::SetAcceleration { .. } => "setAcceleration",
            NativeCall::SetDrag { .. } => "setDrag",
            NativeCall::SetGravity { .. } => "setGravity",
            NativeCall::SetImmovable(_) => "setImmovable",
            NativeCall::SetCollideWorldBounds(_) => "setCollideWorldBounds",
            NativeCall::SetBounce(_) => "setBounce",
            NativeCall::SetFriction { .. } => "setFriction",
            NativeCall::SetMass(_) => "setMass",
            NativeCall::SetSensor(_) => "setSensor",
            NativeCall::SetStatic(_) => "setStatic",
            NativeCall::SetAngularVelocity(_) => "setAngularVelocity",
            NativeCall::SetVelocity { .. } => "setVelocity",
            NativeCall::SetActive(_) => "setActive",
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Constructor arguments, one shape per native constructor.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstructArgs {
    /// Sprites and both physics sprites.
    Sprite {
        x: f64,
        y: f64,
        texture: String,
        frame: Option<String>,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
    Container { x: f64, y: f64 },
    /// Scenes are registered with the game under `key` on construction.
    Scene {
        key: String,
        auto_start: bool,
        /// Engine scene settings (`physics`, `loader`, ...) passed through.
        settings: AttributeSet,
        hooks: SceneHooks,
    },
    /// Custom flavors receive the raw initial attributes.
    Custom { attributes: AttributeSet },
}

/// Lifecycle callbacks bound onto a scene instance. The engine runs them
/// itself, in `init`, `preload`, `create` order, each time the scene starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneHooks {
    pub init: Option<SceneHook>,
    pub preload: Option<SceneHook>,
    pub create: Option<SceneHook>,
}

impl SceneHooks {
    /// Run the bound hooks for a starting scene.
    pub fn run(&self, scene: ObjectId) {
        for hook in [&self.init, &self.preload, &self.create].into_iter().flatten() {
            hook.call(scene);
        }
    }
}

// =============================================================================
// Attachment
// =============================================================================

/// Where a native object is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttachPoint {
    /// A scene's display list.
    DisplayList(ObjectId),
    /// A container's child list.
    Container(ObjectId),
    /// A scene's physics world.
    PhysicsWorld {
        scene: ObjectId,
        backend: PhysicsBackend,
    },
}

// =============================================================================
// Loader Events
// =============================================================================

/// Loader event kinds a scene listener can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoaderEventKind {
    Start,
    Progress,
    Complete,
}

/// Event delivered by a scene's asset loader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoaderEvent {
    Start,
    /// Fraction loaded, 0..=1.
    Progress(f64),
    Complete,
}

impl LoaderEvent {
    pub fn kind(&self) -> LoaderEventKind {
        match self {
            LoaderEvent::Start => LoaderEventKind::Start,
            LoaderEvent::Progress(_) => LoaderEventKind::Progress,
            LoaderEvent::Complete => LoaderEventKind::Complete,
        }
    }
}

/// Loader callback. Shared so the engine can hold it while dispatching.
pub type LoaderListener = Rc<dyn Fn(&LoaderEvent)>;

// =============================================================================
// Engine Trait
// =============================================================================

/// The presentation engine.
///
/// Implementations wrap the real engine's documented mutation and query
/// methods. Every method may fail; failures reach the host unchanged.
pub trait Engine {
    /// Construct a native object. Scenes are added to the game's scene
    /// registry here, with their hooks bound; an auto-started scene runs
    /// them once the game starts it.
    fn create(&mut self, flavor: Flavor, args: &ConstructArgs) -> NativeResult<ObjectId>;

    /// Execute one native mutation.
    fn invoke(&mut self, target: ObjectId, call: &NativeCall) -> NativeResult<()>;

    /// Add `child` to a display list, container, or physics world.
    fn attach(&mut self, point: AttachPoint, child: ObjectId) -> NativeResult<()>;

    /// Remove `child` from a display list, container, or physics world.
    fn detach(&mut self, point: AttachPoint, child: ObjectId) -> NativeResult<()>;

    /// Destroy a non-scene native object.
    fn destroy(&mut self, target: ObjectId) -> NativeResult<()>;

    /// Remove (and destroy) a scene from the game's scene registry.
    fn remove_scene(&mut self, key: &str) -> NativeResult<()>;

    /// Register a loader listener on a scene.
    fn subscribe(
        &mut self,
        scene: ObjectId,
        kind: LoaderEventKind,
        listener: LoaderListener,
    ) -> NativeResult<ListenerId>;

    /// Remove a loader listener. After this returns the engine must not
    /// invoke the listener again.
    fn unsubscribe(&mut self, scene: ObjectId, listener: ListenerId) -> NativeResult<()>;
}
