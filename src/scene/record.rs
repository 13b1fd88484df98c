//! Scene records - Loader state of one mounted scene.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use spark_signals::{Signal, signal};
use tracing::{debug, trace};

use crate::backend::{LoaderEvent, LoaderEventKind, LoaderListener};
use crate::types::ObjectId;

/// Asset loading state of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadState {
    /// Loading, with progress in 0..=1.
    Loading(f64),
    Ready,
}

/// Per-scene loader state, shared between the reconciler, loader
/// listeners and gates.
pub struct SceneRecord {
    key: String,
    instance: ObjectId,
    load_state: Signal<LoadState>,
    attached: Cell<bool>,
}

impl SceneRecord {
    /// A freshly mounted scene is loading until its loader completes.
    pub(crate) fn new(key: String, instance: ObjectId) -> Rc<Self> {
        Rc::new(Self {
            key,
            instance,
            load_state: signal(LoadState::Loading(0.0)),
            attached: Cell::new(true),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn instance(&self) -> ObjectId {
        self.instance
    }

    /// Current load state. Reactive: reading inside an effect tracks it.
    pub fn load_state(&self) -> LoadState {
        self.load_state.get()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load_state(), LoadState::Loading(_))
    }

    /// Progress while loading. Completion resets it to 0.
    pub fn progress(&self) -> f64 {
        match self.load_state() {
            LoadState::Loading(progress) => progress,
            LoadState::Ready => 0.0,
        }
    }

    /// Whether the scene is still mounted.
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Apply one loader event. A detached record ignores everything.
    pub fn deliver(&self, event: &LoaderEvent) {
        if !self.attached.get() {
            trace!(key = %self.key, ?event, "loader event after detach ignored");
            return;
        }

        let next = match *event {
            LoaderEvent::Start => LoadState::Loading(0.0),
            LoaderEvent::Progress(progress) => {
                // Stray progress after completion does not restart loading.
                if self.load_state.get() == LoadState::Ready {
                    return;
                }
                let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
                LoadState::Loading(progress)
            }
            LoaderEvent::Complete => LoadState::Ready,
        };
        if next != self.load_state.get() {
            debug!(key = %self.key, state = ?next, "scene load state");
            self.load_state.set(next);
        }
    }

    pub(crate) fn mark_detached(&self) {
        self.attached.set(false);
    }
}

/// Loader listener forwarding events of `kind` to a record.
///
/// Holds the record weakly: once the reconciler drops it, late events
/// reach nothing.
pub(crate) fn loader_listener(record: &Rc<SceneRecord>) -> LoaderListener {
    let weak: Weak<SceneRecord> = Rc::downgrade(record);
    Rc::new(move |event: &LoaderEvent| {
        if let Some(record) = weak.upgrade() {
            record.deliver(event);
        }
    })
}

/// Event kinds every scene subscribes to.
pub(crate) const LOADER_EVENTS: [LoaderEventKind; 3] = [
    LoaderEventKind::Start,
    LoaderEventKind::Progress,
    LoaderEventKind::Complete,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Rc<SceneRecord> {
        SceneRecord::new("level-1".to_string(), ObjectId(1))
    }

    #[test]
    fn test_loading_sequence() {
        let record = setup();
        let mut seen = vec![record.load_state()];

        for event in [
            LoaderEvent::Start,
            LoaderEvent::Progress(0.3),
            LoaderEvent::Progress(0.9),
            LoaderEvent::Complete,
        ] {
            record.deliver(&event);
            seen.push(record.load_state());
        }

        assert_eq!(
            seen,
            vec![
                LoadState::Loading(0.0),
                LoadState::Loading(0.0),
                LoadState::Loading(0.3),
                LoadState::Loading(0.9),
                LoadState::Ready,
            ]
        );
    }

    #[test]
    fn test_progress_clamped() {
        let record = setup();
        record.deliver(&LoaderEvent::Progress(1.7));
        assert_eq!(record.progress(), 1.0);
        record.deliver(&LoaderEvent::Progress(-0.2));
        assert_eq!(record.progress(), 0.0);
    }

    #[test]
    fn test_progress_after_complete_ignored() {
        let record = setup();
        record.deliver(&LoaderEvent::Complete);
        record.deliver(&LoaderEvent::Progress(0.5));
        assert_eq!(record.load_state(), LoadState::Ready);

        // A new start does reopen loading.
        record.deliver(&LoaderEvent::Start);
        assert!(record.is_loading());
    }

    #[test]
    fn test_progress_resets_on_complete() {
        let record = setup();
        record.deliver(&LoaderEvent::Progress(0.6));
        assert_eq!(record.progress(), 0.6);

        record.deliver(&LoaderEvent::Complete);
        assert_eq!(record.load_state(), LoadState::Ready);
        assert_eq!(record.progress(), 0.0);
    }

    #[test]
    fn test_detached_record_ignores_events() {
        let record = setup();
        record.mark_detached();
        record.deliver(&LoaderEvent::Complete);
        assert_eq!(record.load_state(), LoadState::Loading(0.0));
    }

    #[test]
    fn test_listener_after_drop_is_noop() {
        let record = setup();
        let listener = loader_listener(&record);
        drop(record);
        listener(&LoaderEvent::Complete);
    }
}
