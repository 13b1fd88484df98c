//! Capabilities - Which attributes a flavor understands and how they reach
//! the engine.
//!
//! Each flavor's attributes are partitioned into capability groups. A group
//! owns a disjoint set of fields and one applier that turns the declared
//! values into native calls:
//! - `common` - display object groups shared by sprites, text and containers
//! - `text` - text content, style and line spacing
//! - `arcade` - arcade body groups
//! - `matter` - matter body groups
//! - `scene` - scene configuration, lifecycle hooks and activity
//!
//! Appliers are pure. They validate and translate; the lifecycle manager
//! executes what they return.

mod arcade;
mod common;
mod fields;
mod matter;
mod registry;
mod scene;
mod text;

use std::fmt;

use crate::backend::{ConstructArgs, NativeCall};
use crate::config::EngineDefaults;
use crate::error::AttributeError;
use crate::types::{AttributeSet, Capability, Flavor};

pub use registry::{CapabilityRegistry, RegistryBuilder};

// =============================================================================
// Capability Groups
// =============================================================================

/// What an applier does with a field that is absent from the next set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// Substitute the engine default.
    Default,
    /// Skip the call; the engine keeps its current value.
    Retain,
    /// Call the native clear entry point when the field is removed.
    Clear,
}

/// When a group is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Consumed by the native constructor, never diffed.
    Construct,
    /// Diffed and applied on every render.
    Update,
}

/// Input to an applier.
#[derive(Clone, Copy, Debug)]
pub struct ApplyContext<'a> {
    /// Attributes from the last successful render; `None` on initial mount.
    pub previous: Option<&'a AttributeSet>,
    pub next: &'a AttributeSet,
    pub defaults: &'a EngineDefaults,
}

impl<'a> ApplyContext<'a> {
    /// Whether `field` was declared last render and is gone now.
    pub fn removed(&self, field: &str) -> bool {
        !self.next.contains(field) && self.previous.is_some_and(|prev| prev.contains(field))
    }
}

/// Turns a group's declared fields into native calls.
pub type Applier = fn(&ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError>;

/// Builds constructor arguments from the initial attributes.
pub type ConstructFn = fn(&AttributeSet) -> Result<ConstructArgs, AttributeError>;

/// One capability group of one flavor.
#[derive(Clone, Copy)]
pub struct GroupSpec {
    pub capability: Capability,
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub applier: Applier,
    pub fallback: Fallback,
    pub phase: Phase,
}

impl GroupSpec {
    /// An update-phase group.
    pub const fn update(
        capability: Capability,
        name: &'static str,
        fields: &'static [&'static str],
        fallback: Fallback,
        applier: Applier,
    ) -> Self {
        Self {
            capability,
            name,
            fields,
            applier,
            fallback,
            phase: Phase::Update,
        }
    }

    /// A construction-phase group. Its fields go to the constructor only.
    pub const fn construct(
        capability: Capability,
        name: &'static str,
        fields: &'static [&'static str],
    ) -> Self {
        Self {
            capability,
            name,
            fields,
            applier: construct_only,
            fallback: Fallback::Retain,
            phase: Phase::Construct,
        }
    }

    pub fn owns(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    /// Run the applier.
    pub fn apply(&self, ctx: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
        (self.applier)(ctx)
    }
}

impl fmt::Debug for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSpec")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("fallback", &self.fallback)
            .field("phase", &self.phase)
            .finish()
    }
}

fn construct_only(_: &ApplyContext<'_>) -> Result<Vec<NativeCall>, AttributeError> {
    Ok(Vec::new())
}

// =============================================================================
// Flavor Entry
// =============================================================================

/// Everything the registry knows about one flavor.
#[derive(Clone)]
pub struct FlavorEntry {
    pub flavor: Flavor,
    pub construct: ConstructFn,
    /// Update-phase fields the constructor already applies. Groups whose
    /// declared fields are all in here are skipped on initial mount.
    pub consumed: &'static [&'static str],
    pub groups: Vec<GroupSpec>,
    pub capabilities: Capability,
}

impl FlavorEntry {
    /// Group owning `field`, if any.
    pub fn group_of(&self, field: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|group| group.owns(field))
    }

    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Update-phase groups in registry order.
    pub fn update_groups(&self) -> impl Iterator<Item = &GroupSpec> {
        self.groups.iter().filter(|group| group.phase == Phase::Update)
    }
}

impl fmt::Debug for FlavorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlavorEntry")
            .field("flavor", &self.flavor)
            .field("consumed", &self.consumed)
            .field("groups", &self.groups)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// =============================================================================
// Built-in Tables
// =============================================================================

/// Groups every sprite-like flavor shares, in registry order.
fn sprite_groups() -> Vec<GroupSpec> {
    let mut groups = vec![common::TEXTURE];
    groups.extend_from_slice(&common::DISPLAY);
    groups
}

/// Fields the sprite and container constructors take.
const POSITION_ARGS: &[&str] = &["x", "y"];
/// Fields the text constructor takes.
const TEXT_ARGS: &[&str] = &["x", "y", "text", "style"];

/// One built-in registration.
pub(crate) struct Builtin {
    pub flavor: Flavor,
    pub construct: ConstructFn,
    pub consumed: &'static [&'static str],
    pub groups: Vec<GroupSpec>,
}

fn builtin(
    flavor: Flavor,
    construct: ConstructFn,
    consumed: &'static [&'static str],
    groups: Vec<GroupSpec>,
) -> Builtin {
    Builtin {
        flavor,
        construct,
        consumed,
        groups,
    }
}

pub(crate) fn builtin_entries() -> Vec<Builtin> {
    let mut text_groups = common::DISPLAY.to_vec();
    text_groups.extend_from_slice(&text::GROUPS);

    let mut arcade_groups = sprite_groups();
    arcade_groups.extend_from_slice(&arcade::GROUPS);

    let mut matter_groups = sprite_groups();
    matter_groups.extend_from_slice(&matter::GROUPS);

    vec![
        builtin(Flavor::Sprite, common::construct_sprite, POSITION_ARGS, sprite_groups()),
        builtin(Flavor::Text, text::construct_text, TEXT_ARGS, text_groups),
        builtin(Flavor::Container, common::construct_container, POSITION_ARGS, common::CONTAINER.to_vec()),
        builtin(Flavor::ArcadeSprite, common::construct_sprite, POSITION_ARGS, arcade_groups),
        builtin(Flavor::MatterSprite, common::construct_sprite, POSITION_ARGS, matter_groups),
        builtin(Flavor::Scene, scene::construct_scene, &[], scene::GROUPS.to_vec()),
    ]
}

/// Constructor for custom flavors: hands the raw attributes through.
pub fn construct_custom(set: &AttributeSet) -> Result<ConstructArgs, AttributeError> {
    Ok(ConstructArgs::Custom {
        attributes: set.clone(),
    })
}
