//! Scene gate - Loading indicator until the scene's assets are ready.
//!
//! # Pattern: EffectScope-based Cleanup
//!
//! 1. Create an EffectScope owning the gate's effect
//! 2. The effect reads the scene's load state (reactive dependency)
//! 3. `on_scope_dispose()` cleans up whichever branch is rendered
//! 4. The returned Cleanup stops the scope
//!
//! While loading, the indicator is re-rendered for every progress value and
//! children stay unmaterialized. On ready the indicator is cleaned up and
//! the children render once. A new loader start swaps back.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose};

use super::record::{LoadState, SceneRecord};

/// Cleanup function returned by render callbacks and by the gate itself.
pub type Cleanup = Box<dyn FnOnce()>;

enum Branch {
    Loading(Cleanup),
    Children(Cleanup),
}

impl Branch {
    fn cleanup(self) {
        match self {
            Branch::Loading(cleanup) | Branch::Children(cleanup) => cleanup(),
        }
    }
}

/// Gate `render_children` on `record` finishing its load.
///
/// Without a loading indicator there is nothing to show in the meantime,
/// so children render straight away.
///
/// # Example
///
/// ```ignore
/// let cleanup = scene_gate(
///     record,
///     Some(|progress: f64| show_progress_bar(progress)),
///     || mount_level(),
/// );
///
/// // Later: tear down whichever branch is rendered.
/// cleanup();
/// ```
pub fn scene_gate<LoadingF, ChildrenF>(
    record: Rc<SceneRecord>,
    render_loading: Option<LoadingF>,
    render_children: ChildrenF,
) -> Cleanup
where
    LoadingF: Fn(f64) -> Cleanup + 'static,
    ChildrenF: Fn() -> Cleanup + 'static,
{
    let Some(render_loading) = render_loading else {
        return render_children();
    };

    let current: Rc<RefCell<Option<Branch>>> = Rc::new(RefCell::new(None));
    let current_for_effect = current.clone();
    let current_for_dispose = current;

    let scope = effect_scope(false);

    scope.run(move || {
        let _effect_cleanup = effect(move || {
            let state = record.load_state();

            // Children stay mounted across repeated ready notifications.
            let children_mounted =
                matches!(*current_for_effect.borrow(), Some(Branch::Children(_)));
            if state == LoadState::Ready && children_mounted {
                return;
            }

            let previous = current_for_effect.borrow_mut().take();
            if let Some(previous) = previous {
                previous.cleanup();
            }

            let next = match state {
                LoadState::Loading(progress) => Branch::Loading(render_loading(progress)),
                LoadState::Ready => Branch::Children(render_children()),
            };
            *current_for_effect.borrow_mut() = Some(next);
        });

        on_scope_dispose(move || {
            let branch = current_for_dispose.borrow_mut().take();
            if let Some(branch) = branch {
                branch.cleanup();
            }
        });
    });

    Box::new(move || {
        scope.stop();
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LoaderEvent;
    use crate::types::ObjectId;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counters {
        indicator_renders: Cell<u32>,
        indicator_live: Cell<i32>,
        last_progress: Cell<f64>,
        children_live: Cell<i32>,
        children_renders: Cell<u32>,
    }

    fn setup() -> (Rc<SceneRecord>, Rc<Counters>, Cleanup) {
        let record = SceneRecord::new("main".to_string(), ObjectId(1));
        let counters = Rc::new(Counters::default());

        let loading_counters = counters.clone();
        let children_counters = counters.clone();
        let cleanup = scene_gate(
            record.clone(),
            Some(move |progress: f64| -> Cleanup {
                let c = loading_counters.clone();
                c.indicator_renders.set(c.indicator_renders.get() + 1);
                c.indicator_live.set(c.indicator_live.get() + 1);
                c.last_progress.set(progress);
                Box::new(move || c.indicator_live.set(c.indicator_live.get() - 1))
            }),
            move || -> Cleanup {
                let c = children_counters.clone();
                c.children_renders.set(c.children_renders.get() + 1);
                c.children_live.set(c.children_live.get() + 1);
                Box::new(move || c.children_live.set(c.children_live.get() - 1))
            },
        );
        (record, counters, cleanup)
    }

    #[test]
    fn test_indicator_until_ready() {
        let (record, counters, _cleanup) = setup();
        assert_eq!(counters.indicator_live.get(), 1);
        assert_eq!(counters.children_live.get(), 0);

        record.deliver(&LoaderEvent::Start);
        record.deliver(&LoaderEvent::Progress(0.3));
        assert_eq!(counters.last_progress.get(), 0.3);
        record.deliver(&LoaderEvent::Progress(0.9));
        assert_eq!(counters.last_progress.get(), 0.9);
        assert_eq!(counters.children_live.get(), 0, "children must wait for ready");
        assert_eq!(counters.indicator_live.get(), 1);

        record.deliver(&LoaderEvent::Complete);
        assert_eq!(counters.indicator_live.get(), 0);
        assert_eq!(counters.children_live.get(), 1);
        assert_eq!(counters.children_renders.get(), 1);
    }

    #[test]
    fn test_restart_swaps_back() {
        let (record, counters, _cleanup) = setup();
        record.deliver(&LoaderEvent::Complete);
        assert_eq!(counters.children_live.get(), 1);

        record.deliver(&LoaderEvent::Start);
        assert_eq!(counters.children_live.get(), 0);
        assert_eq!(counters.indicator_live.get(), 1);
    }

    #[test]
    fn test_cleanup_tears_down_current_branch() {
        let (record, counters, cleanup) = setup();
        record.deliver(&LoaderEvent::Complete);
        cleanup();
        assert_eq!(counters.children_live.get(), 0);
        assert_eq!(counters.indicator_live.get(), 0);
    }

    #[test]
    fn test_without_indicator_children_render_immediately() {
        let record = SceneRecord::new("main".to_string(), ObjectId(1));
        let rendered = Rc::new(Cell::new(false));
        let rendered_clone = rendered.clone();

        let _cleanup = scene_gate(
            record,
            None::<fn(f64) -> Cleanup>,
            move || -> Cleanup {
                rendered_clone.set(true);
                Box::new(|| {})
            },
        );
        assert!(rendered.get());
    }
}
