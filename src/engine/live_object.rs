//! Live objects - The reconciler's side of one native object.

use std::rc::Rc;

use super::disposers::Disposers;
use super::registry::LiveObjectHandle;
use crate::backend::AttachPoint;
use crate::scene::SceneRecord;
use crate::types::{AttributeSet, Flavor, ObjectId};

/// Where a live object hangs in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parent {
    /// The root game. Only scenes live here.
    Game,
    /// Another live object (a scene or a container).
    Object(LiveObjectHandle),
}

/// Lifecycle of a live object.
///
/// A record starts `Unmounted` and becomes `Created` once the native
/// constructor has returned and the record is wired to its instance.
///
/// ```text
/// Unmounted → Created → Attached → Detaching → Destroyed
///                          ↑           │
///                          └───────────┘  (reparent)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Unmounted,
    Created,
    Attached,
    Detaching,
    Destroyed,
}

impl LifecycleState {
    /// Whether `self → next` is a legal transition.
    pub fn can_advance(self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        matches!(
            (self, next),
            (Unmounted, Created)
                | (Created, Attached)
                | (Created, Detaching)
                | (Attached, Detaching)
                | (Detaching, Attached)
                | (Detaching, Destroyed)
        )
    }
}

/// One live object.
pub struct LiveObject<E> {
    pub flavor: Flavor,
    pub instance: ObjectId,
    pub parent: Parent,
    pub state: LifecycleState,
    /// Attributes of the last successful render.
    pub previous: AttributeSet,
    /// Native links made on attach, in attach order.
    pub attachments: Vec<AttachPoint>,
    pub disposers: Disposers<E>,
    /// Loader state; scenes only.
    pub scene: Option<Rc<SceneRecord>>,
}

impl<E> LiveObject<E> {
    pub(crate) fn new(flavor: Flavor, instance: ObjectId, parent: Parent, attrs: AttributeSet) -> Self {
        Self {
            flavor,
            instance,
            parent,
            state: LifecycleState::Unmounted,
            previous: attrs,
            attachments: Vec::new(),
            disposers: Disposers::new(),
            scene: None,
        }
    }

    /// Move to `next`. Illegal transitions are reconciler bugs.
    pub(crate) fn advance(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_advance(next),
            "illegal lifecycle transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }
}
