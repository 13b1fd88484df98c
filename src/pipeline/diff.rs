//! Diff Engine - Which capability groups changed between two renders.
//!
//! A group is the unit of change: if any field it owns differs, the whole
//! group is re-applied, and groups whose fields are all equal are skipped.
//! Results follow registry order, never attribute insertion order.

use crate::capabilities::{CapabilityRegistry, FlavorEntry, GroupSpec, Phase};
use crate::error::Result;
use crate::types::{AttributeSet, Capability, Flavor};

/// Whether any field owned by `group` differs between the two sets.
fn group_changed(group: &GroupSpec, previous: &AttributeSet, next: &AttributeSet) -> bool {
    group
        .fields
        .iter()
        .any(|field| previous.get(field) != next.get(field))
}

/// Update-phase groups to apply for `next`.
///
/// On initial mount (`previous == None`) that is every group with at least
/// one declared field the constructor did not already take; afterwards,
/// every group with at least one changed field.
pub fn compute_changed_groups<'r>(
    entry: &'r FlavorEntry,
    previous: Option<&AttributeSet>,
    next: &AttributeSet,
) -> Vec<&'r GroupSpec> {
    entry
        .update_groups()
        .filter(|group| match previous {
            None => group
                .fields
                .iter()
                .any(|field| next.contains(field) && !entry.consumed.contains(field)),
            Some(previous) => group_changed(group, previous, next),
        })
        .collect()
}

/// [`compute_changed_groups`] keyed by flavor.
pub fn changed_groups<'r>(
    registry: &'r CapabilityRegistry,
    flavor: Flavor,
    previous: Option<&AttributeSet>,
    next: &AttributeSet,
) -> Result<Vec<&'r GroupSpec>> {
    registry
        .entry(flavor)
        .map(|entry| compute_changed_groups(entry, previous, next))
}

/// Capability mask of [`compute_changed_groups`].
pub fn changed_capabilities(
    entry: &FlavorEntry,
    previous: Option<&AttributeSet>,
    next: &AttributeSet,
) -> Capability {
    compute_changed_groups(entry, previous, next)
        .into_iter()
        .fold(Capability::empty(), |mask, group| mask | group.capability)
}

/// Construction-phase fields that differ between `previous` and `next`.
pub fn construct_changes(
    entry: &FlavorEntry,
    previous: &AttributeSet,
    next: &AttributeSet,
) -> Vec<&'static str> {
    entry
        .groups
        .iter()
        .filter(|group| group.phase == Phase::Construct)
        .flat_map(|group| group.fields.iter().copied())
        .filter(|field| previous.get(field) != next.get(field))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
