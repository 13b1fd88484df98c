//! Update plans - Validated native calls, ready to execute.
//!
//! Planning runs every changed group's applier before anything touches the
//! engine. One failing group fails the whole plan, so an update is applied
//! completely or not at all.

use tracing::trace;

use crate::backend::{Engine, NativeCall};
use crate::capabilities::{ApplyContext, GroupSpec};
use crate::config::EngineDefaults;
use crate::error::{ReconcileError, Result};
use crate::types::{AttributeSet, Capability, Flavor, ObjectId};

/// Calls produced by one group.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedGroup {
    pub group: &'static str,
    pub capability: Capability,
    pub calls: Vec<NativeCall>,
}

/// Run every applier in `groups`, in order.
pub fn plan(
    flavor: Flavor,
    groups: &[&GroupSpec],
    previous: Option<&AttributeSet>,
    next: &AttributeSet,
    defaults: &EngineDefaults,
) -> Result<Vec<PlannedGroup>> {
    let ctx = ApplyContext {
        previous,
        next,
        defaults,
    };
    groups
        .iter()
        .map(|group| {
            let calls = group
                .apply(&ctx)
                .map_err(|source| ReconcileError::InvalidAttribute {
                    flavor,
                    group: group.name,
                    source,
                })?;
            Ok(PlannedGroup {
                group: group.name,
                capability: group.capability,
                calls,
            })
        })
        .collect()
}

/// Execute a plan against `target`, stopping at the first engine error.
pub fn execute<E: Engine>(
    engine: &mut E,
    target: ObjectId,
    plan: &[PlannedGroup],
    trace_calls: bool,
) -> Result<()> {
    for planned in plan {
        for call in &planned.calls {
            if trace_calls {
                trace!(%target, group = planned.group, call = call.name(), "native call");
            }
            engine.invoke(target, call)?;
        }
    }
    Ok(())
}
