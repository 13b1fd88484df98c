//! Capability Registry - Flavor to capability group lookup.
//!
//! The standard registry holds every built-in flavor and is built once per
//! process. Custom registries start from [`CapabilityRegistry::builder`],
//! which can seed the built-ins and add more flavors:
//!
//! ```ignore
//! let registry = CapabilityRegistry::builder()
//!     .with_builtins()?
//!     .register(Flavor::Custom("tilemap"), construct_custom, vec![layer_group])?
//!     .build();
//! ```
//!
//! Flavors whose constructor already applies some update-phase fields
//! declare them with [`RegistryBuilder::register_consuming`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::{Builtin, ConstructFn, FlavorEntry, GroupSpec, builtin_entries};
use crate::error::{ReconcileError, RegistryError, Result};
use crate::types::{Capability, Flavor};

static STANDARD: OnceLock<Arc<CapabilityRegistry>> = OnceLock::new();

// =============================================================================
// Registry
// =============================================================================

/// Immutable flavor → capability table.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    entries: HashMap<Flavor, FlavorEntry>,
    /// Registration order, for deterministic listing.
    order: Vec<Flavor>,
}

impl CapabilityRegistry {
    /// The process-wide registry of built-in flavors.
    pub fn standard() -> Arc<CapabilityRegistry> {
        STANDARD
            .get_or_init(|| {
                let mut registry = CapabilityRegistry::default();
                for builtin in builtin_entries() {
                    registry.insert(builtin);
                }
                Arc::new(registry)
            })
            .clone()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    fn insert(&mut self, builtin: Builtin) {
        let Builtin {
            flavor,
            construct,
            consumed,
            groups,
        } = builtin;
        let capabilities = groups
            .iter()
            .fold(Capability::empty(), |mask, group| mask | group.capability);
        self.entries.insert(
            flavor,
            FlavorEntry {
                flavor,
                construct,
                consumed,
                groups,
                capabilities,
            },
        );
        self.order.push(flavor);
    }

    /// Full entry for `flavor`.
    pub fn entry(&self, flavor: Flavor) -> Result<&FlavorEntry> {
        self.entries
            .get(&flavor)
            .ok_or(ReconcileError::UnknownFlavor(flavor))
    }

    /// Groups of `flavor`, in registry order.
    pub fn groups(&self, flavor: Flavor) -> Result<&[GroupSpec]> {
        self.entry(flavor).map(|entry| entry.groups.as_slice())
    }

    /// One group by name.
    pub fn group(&self, flavor: Flavor, name: &str) -> Option<&GroupSpec> {
        self.entries.get(&flavor).and_then(|entry| entry.group(name))
    }

    /// Union of the capabilities of every group of `flavor`.
    pub fn capabilities(&self, flavor: Flavor) -> Capability {
        self.entries
            .get(&flavor)
            .map_or(Capability::empty(), |entry| entry.capabilities)
    }

    /// Registered flavors, in registration order.
    pub fn flavors(&self) -> &[Flavor] {
        &self.order
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Validating builder for custom registries.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: CapabilityRegistry,
}

impl RegistryBuilder {
    /// Add every built-in flavor.
    pub fn with_builtins(self) -> std::result::Result<Self, RegistryError> {
        builtin_entries()
            .into_iter()
            .try_fold(self, |builder, builtin| {
                builder.register_consuming(builtin.flavor, builtin.construct, builtin.consumed, builtin.groups)
            })
    }

    /// Add a flavor. Its groups must have unique names and claim disjoint
    /// fields.
    pub fn register(
        self,
        flavor: Flavor,
        construct: ConstructFn,
        groups: Vec<GroupSpec>,
    ) -> std::result::Result<Self, RegistryError> {
        self.register_consuming(flavor, construct, &[], groups)
    }

    /// Add a flavor whose constructor already applies `consumed`. Those
    /// fields are not re-applied on initial mount.
    pub fn register_consuming(
        mut self,
        flavor: Flavor,
        construct: ConstructFn,
        consumed: &'static [&'static str],
        groups: Vec<GroupSpec>,
    ) -> std::result::Result<Self, RegistryError> {
        if self.registry.entries.contains_key(&flavor) {
            return Err(RegistryError::DuplicateFlavor(flavor));
        }
        validate(flavor, &groups)?;
        self.registry.insert(Builtin {
            flavor,
            construct,
            consumed,
            groups,
        });
        Ok(self)
    }

    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}

fn validate(flavor: Flavor, groups: &[GroupSpec]) -> std::result::Result<(), RegistryError> {
    let mut owners: HashMap<&'static str, &'static str> = HashMap::new();
    for (i, group) in groups.iter().enumerate() {
        if groups[..i].iter().any(|earlier| earlier.name == group.name) {
            return Err(RegistryError::DuplicateGroup {
                flavor,
                group: group.name,
            });
        }
        for &field in group.fields {
            if let Some(first) = owners.insert(field, group.name) {
                return Err(RegistryError::OverlappingField {
                    flavor,
                    field,
                    first,
                    second: group.name,
                });
            }
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Fallback, Phase, construct_custom};

    fn setup() -> Arc<CapabilityRegistry> {
        CapabilityRegistry::standard()
    }

    #[test]
    fn test_standard_registry_is_valid() {
        // The standard table skips validation; the builder must accept it.
        let built = CapabilityRegistry::builder().with_builtins().unwrap().build();
        assert_eq!(built.flavors(), setup().flavors());
    }

    #[test]
    fn test_builtin_flavors_registered() {
        let registry = setup();
        for flavor in Flavor::BUILTIN {
            assert!(registry.groups(flavor).is_ok(), "{flavor} missing");
        }
        assert_eq!(
            registry.groups(Flavor::Custom("tilemap")).unwrap_err(),
            ReconcileError::UnknownFlavor(Flavor::Custom("tilemap"))
        );
    }

    #[test]
    fn test_same_field_different_groups_across_flavors() {
        let registry = setup();
        let arcade = registry.entry(Flavor::ArcadeSprite).unwrap();
        let matter = registry.entry(Flavor::MatterSprite).unwrap();
        assert_eq!(arcade.group_of("bounce").unwrap().name, "arcade_bounce");
        assert_eq!(matter.group_of("bounce").unwrap().name, "matter_bounce");
    }

    #[test]
    fn test_capability_masks() {
        let registry = setup();
        let arcade = registry.capabilities(Flavor::ArcadeSprite);
        assert!(arcade.contains(Capability::ARCADE_DEBUG | Capability::TEXTURE));
        assert!(!arcade.contains(Capability::MATTER_BOUNCE));
        assert!(!registry.capabilities(Flavor::Container).contains(Capability::ORIGIN));
    }

    #[test]
    fn test_construct_groups_marked() {
        let registry = setup();
        assert_eq!(registry.group(Flavor::Sprite, "texture").unwrap().phase, Phase::Construct);
        assert_eq!(registry.group(Flavor::Scene, "scene_config").unwrap().phase, Phase::Construct);
        assert_eq!(registry.group(Flavor::Sprite, "tint").unwrap().fallback, Fallback::Clear);
    }

    #[test]
    fn test_constructor_fields_declared() {
        let registry = setup();
        assert_eq!(registry.entry(Flavor::Text).unwrap().consumed, &["x", "y", "text", "style"]);
        assert!(registry.entry(Flavor::Scene).unwrap().consumed.is_empty());

        let custom = CapabilityRegistry::builder()
            .register(Flavor::Custom("tilemap"), construct_custom, Vec::new())
            .unwrap()
            .build();
        assert!(custom.entry(Flavor::Custom("tilemap")).unwrap().consumed.is_empty());
    }

    #[test]
    fn test_display_flavors_have_crop_and_size() {
        let registry = setup();
        for flavor in [Flavor::Sprite, Flavor::Text, Flavor::ArcadeSprite, Flavor::MatterSprite] {
            let caps = registry.capabilities(flavor);
            assert!(
                caps.contains(Capability::CROP | Capability::SIZE | Capability::DISPLAY_SIZE),
                "{flavor} lacks crop or size"
            );
        }
        assert!(!registry.capabilities(Flavor::Container).contains(Capability::CROP));
    }

    #[test]
    fn test_overlapping_fields_rejected() {
        let a = GroupSpec::construct(Capability::CUSTOM, "a", &["x", "y"]);
        let b = GroupSpec::construct(Capability::CUSTOM, "b", &["y"]);
        let result = CapabilityRegistry::builder().register(Flavor::Custom("pair"), construct_custom, vec![a, b]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::OverlappingField {
                flavor: Flavor::Custom("pair"),
                field: "y",
                first: "a",
                second: "b",
            }
        );
    }

    #[test]
    fn test_duplicate_flavor_rejected() {
        let result = CapabilityRegistry::builder()
            .with_builtins()
            .unwrap()
            .register(Flavor::Sprite, construct_custom, Vec::new());
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateFlavor(Flavor::Sprite));
    }
}
