//! Headless Engine - In-memory presentation engine.
//!
//! Tracks objects, display lists, physics world membership, the game's scene
//! registry and loader listeners, and logs every mutation in call order.
//! Scenes start on [`boot`](HeadlessEngine::boot) (auto-started ones) or
//! [`start_scene`](HeadlessEngine::start_scene), which runs their hooks.
//!
//! # Example
//!
//! ```ignore
//! use sprite_fiber::backend::{HeadlessEngine, LoaderEvent};
//!
//! let mut engine = HeadlessEngine::new();
//! // ... mount a scene through a Reconciler ...
//! engine.emit(scene_id, LoaderEvent::Progress(0.5));
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::trace;

use super::{
    AttachPoint, ConstructArgs, Engine, LoaderEvent, LoaderEventKind, LoaderListener, NativeCall,
};
use crate::error::{NativeError, NativeResult};
use crate::types::{Flavor, ListenerId, ObjectId};

// =============================================================================
// Records
// =============================================================================

/// One logged native mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRecord {
    pub target: ObjectId,
    pub call: NativeCall,
}

struct NativeObject {
    flavor: Flavor,
    args: ConstructArgs,
    /// Latest call per native method name.
    last: HashMap<&'static str, NativeCall>,
}

struct Subscription {
    id: ListenerId,
    kind: LoaderEventKind,
    listener: LoaderListener,
}

// =============================================================================
// Headless Engine
// =============================================================================

/// In-memory [`Engine`] implementation.
#[derive(Default)]
pub struct HeadlessEngine {
    objects: HashMap<ObjectId, NativeObject>,
    attachments: HashMap<AttachPoint, Vec<ObjectId>>,
    scenes: BTreeMap<String, ObjectId>,
    listeners: HashMap<ObjectId, Vec<Subscription>>,
    /// Successful unsubscriptions per scene.
    unsubscribed: HashMap<ObjectId, usize>,
    /// Listeners still registered when their scene was removed.
    orphaned_listeners: usize,
    started: HashSet<ObjectId>,
    log: Vec<CallRecord>,
    next_object: u64,
    next_listener: u64,
    /// Engine calls to let through before failing, and the failure.
    pending_failure: Option<(usize, NativeError)>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Failure injection
    // -------------------------------------------------------------------------

    /// Make the next engine call fail with `error`.
    pub fn fail_next(&mut self, error: NativeError) {
        self.fail_after(0, error);
    }

    /// Let `calls` engine calls succeed, then fail the next one with `error`.
    pub fn fail_after(&mut self, calls: usize, error: NativeError) {
        self.pending_failure = Some((calls, error));
    }

    fn take_failure(&mut self) -> NativeResult<()> {
        match self.pending_failure.take() {
            Some((0, error)) => Err(error),
            Some((remaining, error)) => {
                self.pending_failure = Some((remaining - 1, error));
                Ok(())
            }
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Loader simulation
    // -------------------------------------------------------------------------

    /// Deliver a loader event to every listener of `scene` for its kind.
    ///
    /// Listeners are snapshotted first, so a listener may safely cause
    /// unsubscription while the event is being dispatched.
    pub fn emit(&self, scene: ObjectId, event: LoaderEvent) {
        for listener in self.listeners_for(scene, event.kind()) {
            listener(&event);
        }
    }

    /// Clone the listeners currently registered on `scene` for `kind`.
    pub fn listeners_for(&self, scene: ObjectId, kind: LoaderEventKind) -> Vec<LoaderListener> {
        self.listeners
            .get(&scene)
            .map(|subs| {
                subs.iter()
                    .filter(|sub| sub.kind == kind)
                    .map(|sub| sub.listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners registered on `scene`.
    pub fn listener_count(&self, scene: ObjectId) -> usize {
        self.listeners.get(&scene).map_or(0, Vec::len)
    }

    /// Number of listeners registered across all scenes.
    pub fn total_listeners(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Successful `unsubscribe` calls made against `scene`.
    pub fn unsubscribe_count(&self, scene: ObjectId) -> usize {
        self.unsubscribed.get(&scene).copied().unwrap_or(0)
    }

    /// Listeners that were still registered when `remove_scene` dropped
    /// their scene.
    pub fn orphaned_listeners(&self) -> usize {
        self.orphaned_listeners
    }

    // -------------------------------------------------------------------------
    // Scene start
    // -------------------------------------------------------------------------

    /// Start every auto-start scene that has not started yet, in key order.
    pub fn boot(&mut self) -> NativeResult<()> {
        let pending: Vec<ObjectId> = self
            .scenes
            .values()
            .copied()
            .filter(|id| !self.started.contains(id))
            .filter(|id| {
                matches!(
                    self.objects.get(id).map(|object| &object.args),
                    Some(ConstructArgs::Scene { auto_start: true, .. })
                )
            })
            .collect();
        for id in pending {
            self.start_scene(id)?;
        }
        Ok(())
    }

    /// Start (or restart) a scene: runs its `init`, `preload` and `create`
    /// hooks in that order.
    pub fn start_scene(&mut self, scene: ObjectId) -> NativeResult<()> {
        let hooks = match &self.object(scene)?.args {
            ConstructArgs::Scene { hooks, .. } => hooks.clone(),
            _ => {
                return Err(NativeError::Unsupported {
                    target: scene,
                    call: "start",
                });
            }
        };
        self.started.insert(scene);
        trace!(%scene, "scene start");
        hooks.run(scene);
        Ok(())
    }

    /// Whether `scene` has been started.
    pub fn is_started(&self, scene: ObjectId) -> bool {
        self.started.contains(&scene)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Whether a native object is alive.
    pub fn exists(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of live native objects (scenes included).
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Flavor an object was constructed as.
    pub fn flavor_of(&self, id: ObjectId) -> Option<Flavor> {
        self.objects.get(&id).map(|object| object.flavor)
    }

    /// Constructor arguments an object was built with.
    pub fn construct_args(&self, id: ObjectId) -> Option<&ConstructArgs> {
        self.objects.get(&id).map(|object| &object.args)
    }

    /// Most recent call of the named native method on `id`.
    pub fn last_call(&self, id: ObjectId, method: &str) -> Option<&NativeCall> {
        self.objects.get(&id).and_then(|object| object.last.get(method))
    }

    /// Objects attached at `point`, in attach order.
    pub fn attached(&self, point: AttachPoint) -> &[ObjectId] {
        self.attachments.get(&point).map_or(&[], Vec::as_slice)
    }

    /// Scene registered under `key`.
    pub fn scene(&self, key: &str) -> Option<ObjectId> {
        self.scenes.get(key).copied()
    }

    /// Every mutation since creation (or the last [`clear_log`](Self::clear_log)).
    pub fn log(&self) -> &[CallRecord] {
        &self.log
    }

    /// Calls made against one object, in order.
    pub fn calls_for(&self, id: ObjectId) -> Vec<NativeCall> {
        self.log
            .iter()
            .filter(|record| record.target == id)
            .map(|record| record.call.clone())
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn object(&self, id: ObjectId) -> NativeResult<&NativeObject> {
        self.objects.get(&id).ok_or(NativeError::MissingObject(id))
    }

    fn parent_of(point: AttachPoint) -> ObjectId {
        match point {
            AttachPoint::DisplayList(scene) => scene,
            AttachPoint::Container(container) => container,
            AttachPoint::PhysicsWorld { scene, .. } => scene,
        }
    }
}

// =============================================================================
// Call Support
// =============================================================================

/// Whether an object of `flavor` exposes the native method behind `call`.
fn supports(flavor: Flavor, call: &NativeCall) -> bool {
    use NativeCall::*;

    match call {
        SetDebug { .. } | SetBounceXY { .. } | SetAcceleration { .. } | SetDrag { .. }
        | SetGravity { .. } | SetImmovable(_) | SetCollideWorldBounds(_) => {
            flavor == Flavor::ArcadeSprite
        }
        SetBounce(_) | SetFriction { .. } | SetMass(_) | SetSensor(_) | SetStatic(_)
        | SetAngularVelocity(_) => flavor == Flavor::MatterSprite,
        SetVelocity { .. } => flavor.physics().is_some(),
        SetText(_) | SetStyle(_) | SetLineSpacing(_) => flavor == Flavor::Text,
        SetDisplaySize { .. } | SetCrop { .. } | ClearCrop => {
            !matches!(flavor, Flavor::Scene | Flavor::Container)
        }
        SetActive(_) => flavor == Flavor::Scene,
        SetVisible(_) => true,
        _ => flavor != Flavor::Scene,
    }
}

// =============================================================================
// Engine Implementation
// =============================================================================

impl Engine for HeadlessEngine {
    fn create(&mut self, flavor: Flavor, args: &ConstructArgs) -> NativeResult<ObjectId> {
        self.take_failure()?;

        if let ConstructArgs::Scene { key, .. } = args {
            if self.scenes.contains_key(key) {
                return Err(NativeError::DuplicateScene(key.clone()));
            }
        }

        self.next_object += 1;
        let id = ObjectId(self.next_object);

        if let ConstructArgs::Scene { key, .. } = args {
            self.scenes.insert(key.clone(), id);
        }

        self.objects.insert(
            id,
            NativeObject {
                flavor,
                args: args.clone(),
                last: HashMap::new(),
            },
        );
        trace!(%id, %flavor, "native create");
        Ok(id)
    }

    fn invoke(&mut self, target: ObjectId, call: &NativeCall) -> NativeResult<()> {
        self.take_failure()?;

        let flavor = self.object(target)?.flavor;
        if !matches!(flavor, Flavor::Custom(_)) && !supports(flavor, call) {
            return Err(NativeError::Unsupported {
                target,
                call: call.name(),
            });
        }

        if let Some(object) = self.objects.get_mut(&target) {
            object.last.insert(call.name(), call.clone());
        }
        self.log.push(CallRecord {
            target,
            call: call.clone(),
        });
        Ok(())
    }

    fn attach(&mut self, point: AttachPoint, child: ObjectId) -> NativeResult<()> {
        self.take_failure()?;
        self.object(Self::parent_of(point))?;
        self.object(child)?;

        let list = self.attachments.entry(point).or_default();
        if !list.contains(&child) {
            list.push(child);
        }
        Ok(())
    }

    fn detach(&mut self, point: AttachPoint, child: ObjectId) -> NativeResult<()> {
        self.take_failure()?;

        if let Some(list) = self.attachments.get_mut(&point) {
            list.retain(|&id| id != child);
            if list.is_empty() {
                self.attachments.remove(&point);
            }
        }
        Ok(())
    }

    fn destroy(&mut self, target: ObjectId) -> NativeResult<()> {
        self.take_failure()?;

        if self.objects.remove(&target).is_none() {
            return Err(NativeError::MissingObject(target));
        }
        // A destroyed object leaves every list it was part of.
        self.attachments.retain(|_, list| {
            list.retain(|&id| id != target);
            !list.is_empty()
        });
        trace!(id = %target, "native destroy");
        Ok(())
    }

    fn remove_scene(&mut self, key: &str) -> NativeResult<()> {
        self.take_failure()?;

        let id = self
            .scenes
            .remove(key)
            .ok_or_else(|| NativeError::MissingScene(key.to_string()))?;
        self.objects.remove(&id);
        self.started.remove(&id);
        if let Some(left) = self.listeners.remove(&id) {
            self.orphaned_listeners += left.len();
        }
        self.attachments
            .retain(|point, _| Self::parent_of(*point) != id);
        trace!(key, "scene removed");
        Ok(())
    }

    fn subscribe(
        &mut self,
        scene: ObjectId,
        kind: LoaderEventKind,
        listener: LoaderListener,
    ) -> NativeResult<ListenerId> {
        self.take_failure()?;
        self.object(scene)?;

        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.entry(scene).or_default().push(Subscription { id, kind, listener });
        Ok(id)
    }

    fn unsubscribe(&mut self, scene: ObjectId, listener: ListenerId) -> NativeResult<()> {
        self.take_failure()?;

        let subs = self
            .listeners
            .get_mut(&scene)
            .ok_or(NativeError::MissingObject(scene))?;
        let before = subs.len();
        subs.retain(|sub| sub.id != listener);
        if subs.len() == before {
            return Err(NativeError::Other(format!(
                "listener {} not registered on {scene}",
                listener.0
            )));
        }
        if subs.is_empty() {
            self.listeners.remove(&scene);
        }
        *self.unsubscribed.entry(scene).or_default() += 1;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
