//! Reconciler - Lifecycle manager and host boundary.
//!
//! Owns the engine and every live object created through it:
//!
//! ```text
//! instantiate → validate (placement, constructor, plan) → create native
//!             → attach (display / container / physics world)
//!             → subscribe loader listeners (scenes) → apply declared groups
//!               the constructor did not already take
//! commit_update → diff → plan (validate all) → execute
//! destroy → children first → disposers → detach → destroy / remove scene
//! ```
//!
//! Failures after the native object exists unwind it completely before the
//! error is returned.

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};

use super::diff::{compute_changed_groups, construct_changes};
use super::plan::{PlannedGroup, execute, plan};
use crate::backend::{AttachPoint, ConstructArgs, Engine};
use crate::capabilities::{CapabilityRegistry, FlavorEntry};
use crate::config::{ConstructChangePolicy, ReconcilerConfig};
use crate::engine::{LifecycleState, LiveObject, LiveObjectHandle, ObjectRegistry, Parent};
use crate::error::{AttributeError, NativeError, NativeResult, ReconcileError, Result};
use crate::scene::{LOADER_EVENTS, SceneRecord, loader_listener};
use crate::types::{AttributeSet, Flavor, ObjectId};

/// The declarative scene reconciler.
pub struct Reconciler<E: Engine> {
    engine: E,
    objects: ObjectRegistry<LiveObject<E>>,
    capabilities: Arc<CapabilityRegistry>,
    config: ReconcilerConfig,
}

impl<E: Engine + 'static> Reconciler<E> {
    /// Reconciler over the standard registry with default configuration.
    pub fn new(engine: E) -> Self {
        Self::with_registry(engine, CapabilityRegistry::standard(), ReconcilerConfig::default())
    }

    pub fn with_config(engine: E, config: ReconcilerConfig) -> Self {
        Self::with_registry(engine, CapabilityRegistry::standard(), config)
    }

    pub fn with_registry(engine: E, capabilities: Arc<CapabilityRegistry>, config: ReconcilerConfig) -> Self {
        Self {
            engine,
            objects: ObjectRegistry::new(),
            capabilities,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    // -------------------------------------------------------------------------
    // Mount
    // -------------------------------------------------------------------------

    /// Create, attach and apply a new live object.
    pub fn instantiate(
        &mut self,
        flavor: Flavor,
        parent: Parent,
        initial: AttributeSet,
    ) -> Result<LiveObjectHandle> {
        let prepared = self.prepare(flavor, parent, initial)?;
        self.mount(prepared)
    }

    /// Everything that can be checked is checked before the engine is touched.
    fn prepare(&self, flavor: Flavor, parent: Parent, initial: AttributeSet) -> Result<Prepared> {
        let entry = self.capabilities.entry(flavor)?;
        let points = self.placement(flavor, parent)?;
        let args = (entry.construct)(&initial).map_err(|source| invalid(entry, source))?;
        let groups = compute_changed_groups(entry, None, &initial);
        let planned = plan(flavor, &groups, None, &initial, &self.config.defaults)?;
        Ok(Prepared {
            flavor,
            parent,
            points,
            args,
            planned,
            initial,
        })
    }

    fn mount(&mut self, prepared: Prepared) -> Result<LiveObjectHandle> {
        let Prepared {
            flavor,
            parent,
            points,
            args,
            planned,
            initial,
        } = prepared;

        let instance = self.engine.create(flavor, &args)?;
        let mut object = LiveObject::new(flavor, instance, parent, initial);
        if let ConstructArgs::Scene { key, .. } = args {
            object.scene = Some(SceneRecord::new(key, instance));
        }
        object.advance(LifecycleState::Created);

        let mounted = Self::link(&mut self.engine, &mut object, points)
            .and_then(|()| Self::subscribe(&mut self.engine, &mut object))
            .map_err(ReconcileError::from)
            .and_then(|()| {
                object.advance(LifecycleState::Attached);
                execute(&mut self.engine, instance, &planned, self.config.trace_native_calls)
            });

        if let Err(error) = mounted {
            debug!(%flavor, %instance, %error, "mount failed, unwinding");
            if let Err(unwind_error) = Self::teardown(&mut self.engine, &mut object) {
                warn!(%flavor, %instance, error = %unwind_error, "unwind failed");
            }
            return Err(error);
        }

        let handle = self.objects.allocate(object);
        debug!(%handle, %flavor, %instance, groups = planned.len(), "mounted");
        Ok(handle)
    }

    /// Where an object of `flavor` attaches under `parent`.
    fn placement(&self, flavor: Flavor, parent: Parent) -> Result<Vec<AttachPoint>> {
        let parent_handle = match parent {
            Parent::Game if flavor == Flavor::Scene => return Ok(Vec::new()),
            Parent::Game => {
                return Err(ReconcileError::InvalidParent {
                    child: flavor,
                    parent: "game".to_string(),
                });
            }
            Parent::Object(handle) => handle,
        };

        let host = self.live(parent_handle)?;
        let display = match host.flavor {
            _ if flavor == Flavor::Scene => None,
            Flavor::Scene => Some(AttachPoint::DisplayList(host.instance)),
            Flavor::Container => Some(AttachPoint::Container(host.instance)),
            _ => None,
        };
        let Some(display) = display else {
            return Err(ReconcileError::InvalidParent {
                child: flavor,
                parent: host.flavor.to_string(),
            });
        };

        let mut points = vec![display];
        if let Some(backend) = flavor.physics() {
            let scene = self
                .scene_of(parent_handle)
                .ok_or_else(|| ReconcileError::InvalidParent {
                    child: flavor,
                    parent: format!("{} outside any scene", host.flavor),
                })?;
            points.push(AttachPoint::PhysicsWorld { scene, backend });
        }
        Ok(points)
    }

    /// Native instance of the nearest scene at or above `handle`.
    fn scene_of(&self, mut handle: LiveObjectHandle) -> Option<ObjectId> {
        loop {
            let object = self.objects.get(handle)?;
            if object.flavor == Flavor::Scene {
                return Some(object.instance);
            }
            match object.parent {
                Parent::Object(parent) => handle = parent,
                Parent::Game => return None,
            }
        }
    }

    fn link(engine: &mut E, object: &mut LiveObject<E>, points: Vec<AttachPoint>) -> NativeResult<()> {
        for point in points {
            engine.attach(point, object.instance)?;
            object.attachments.push(point);
        }
        Ok(())
    }

    /// Subscribe a scene's loader listeners, one disposer each.
    fn subscribe(engine: &mut E, object: &mut LiveObject<E>) -> NativeResult<()> {
        let Some(record) = object.scene.clone() else {
            return Ok(());
        };
        let instance = object.instance;
        for kind in LOADER_EVENTS {
            let id = engine.subscribe(instance, kind, loader_listener(&record))?;
            object
                .disposers
                .push(move |engine: &mut E| engine.unsubscribe(instance, id));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Apply `next` to a mounted object.
    ///
    /// Only changed groups are applied. Every applier is validated before
    /// the first native call; on an invalid attribute nothing is applied and
    /// the stored attributes stay as they were.
    pub fn commit_update(&mut self, handle: LiveObjectHandle, next: AttributeSet) -> Result<()> {
        let registry = Arc::clone(&self.capabilities);
        let object = self.live(handle)?;
        let (flavor, instance) = (object.flavor, object.instance);
        let entry = registry.entry(flavor)?;

        let fixed = construct_changes(entry, &object.previous, &next);
        if let Some(&field) = fixed.first() {
            match self.config.construct_change {
                ConstructChangePolicy::Warn => {
                    for field in &fixed {
                        warn!(%handle, %flavor, field, "construction-time field changed after mount, ignored");
                    }
                }
                ConstructChangePolicy::Reject => {
                    return Err(ReconcileError::ConstructOnly { flavor, field });
                }
            }
        }

        let groups = compute_changed_groups(entry, Some(&object.previous), &next);
        let planned = plan(flavor, &groups, Some(&object.previous), &next, &self.config.defaults)?;
        execute(&mut self.engine, instance, &planned, self.config.trace_native_calls)?;

        if let Some(object) = self.objects.get_mut(handle) {
            object.previous = next;
        }
        debug!(%handle, %flavor, groups = planned.len(), "updated");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Unmount
    // -------------------------------------------------------------------------

    /// Destroy a live object and, first, all of its descendants.
    ///
    /// Every step runs even when an earlier one fails; the first error is
    /// returned and the handle is stale afterwards either way.
    pub fn destroy(&mut self, handle: LiveObjectHandle) -> Result<()> {
        let mut first_error: Option<ReconcileError> = None;

        // FIRST: destroy all children (recursive!)
        for child in self.children(handle)? {
            if let Err(error) = self.destroy(child) {
                first_error.get_or_insert(error);
            }
        }

        let mut object = self
            .objects
            .release(handle)
            .ok_or(ReconcileError::StaleHandle(handle))?;
        if let Err(error) = Self::teardown(&mut self.engine, &mut object) {
            first_error.get_or_insert(error.into());
        }
        debug!(%handle, flavor = %object.flavor, instance = %object.instance, "destroyed");

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Run disposers, reverse the attachments and destroy the native object.
    fn teardown(engine: &mut E, object: &mut LiveObject<E>) -> NativeResult<()> {
        object.advance(LifecycleState::Detaching);

        // Late loader events must find nothing to mutate.
        let record = object.scene.take();
        if let Some(record) = &record {
            record.mark_detached();
        }

        let mut first_error: Option<NativeError> = object.disposers.run_all(engine).err();
        assert!(object.disposers.is_empty(), "disposers left after detach");

        while let Some(point) = object.attachments.pop() {
            if let Err(error) = engine.detach(point, object.instance) {
                first_error.get_or_insert(error);
            }
        }

        let removed = match &record {
            Some(record) => engine.remove_scene(record.key()),
            None => engine.destroy(object.instance),
        };
        if let Err(error) = removed {
            first_error.get_or_insert(error);
        }

        object.advance(LifecycleState::Destroyed);
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Structural changes
    // -------------------------------------------------------------------------

    /// Move a live object under a new parent. Flavor and attributes are
    /// untouched. A move into another scene takes every physics body in the
    /// moved subtree along into that scene's world.
    pub fn reparent(&mut self, handle: LiveObjectHandle, parent: Parent) -> Result<()> {
        let object = self.live(handle)?;
        let (flavor, instance) = (object.flavor, object.instance);
        if object.parent == parent {
            return Ok(());
        }
        if let Parent::Object(target) = parent {
            if self.is_within(target, handle) {
                return Err(ReconcileError::InvalidParent {
                    child: flavor,
                    parent: "its own descendant".to_string(),
                });
            }
        }
        let points = self.placement(flavor, parent)?;
        let old_scene = self.scene_of(handle);

        let Some(object) = self.objects.get_mut(handle) else {
            return Err(ReconcileError::StaleHandle(handle));
        };
        object.advance(LifecycleState::Detaching);

        let mut result: NativeResult<()> = Ok(());
        while let Some(point) = object.attachments.pop() {
            if let Err(error) = self.engine.detach(point, instance) {
                object.attachments.push(point);
                result = Err(error);
                break;
            }
        }
        if result.is_ok() {
            result = Self::link(&mut self.engine, object, points);
        }
        if result.is_ok() {
            object.parent = parent;
        }
        object.advance(LifecycleState::Attached);

        if result.is_ok() {
            let new_scene = self.scene_of(handle);
            if let Some(scene) = new_scene.filter(|_| new_scene != old_scene) {
                result = self.move_bodies(handle, scene);
            }
        }

        debug!(%handle, %flavor, ?parent, ok = result.is_ok(), "reparented");
        result.map_err(ReconcileError::from)
    }

    /// Re-home every physics body below `root` into `scene`'s world.
    fn move_bodies(&mut self, root: LiveObjectHandle, scene: ObjectId) -> NativeResult<()> {
        for body in self.descendants(root) {
            let Some(object) = self.objects.get_mut(body) else {
                continue;
            };
            let Some(backend) = object.flavor.physics() else {
                continue;
            };
            let instance = object.instance;

            let old = object
                .attachments
                .iter()
                .position(|point| matches!(point, AttachPoint::PhysicsWorld { .. }));
            if let Some(slot) = old {
                self.engine.detach(object.attachments[slot], instance)?;
                object.attachments.remove(slot);
            }

            let world = AttachPoint::PhysicsWorld { scene, backend };
            self.engine.attach(world, instance)?;
            object.attachments.push(world);
            debug!(handle = %body, %instance, %scene, "physics body moved");
        }
        Ok(())
    }

    /// Every object below `root`, parents before their children.
    fn descendants(&self, root: LiveObjectHandle) -> Vec<LiveObjectHandle> {
        let mut found = Vec::new();
        let mut pending = vec![root];
        while let Some(handle) = pending.pop() {
            for (child, object) in self.objects.iter() {
                if object.parent == Parent::Object(handle) {
                    found.push(child);
                    pending.push(child);
                }
            }
        }
        found
    }

    /// Whether `candidate` is `ancestor` or lies below it.
    fn is_within(&self, mut candidate: LiveObjectHandle, ancestor: LiveObjectHandle) -> bool {
        loop {
            if candidate == ancestor {
                return true;
            }
            match self.objects.get(candidate).map(|object| object.parent) {
                Some(Parent::Object(parent)) => candidate = parent,
                _ => return false,
            }
        }
    }

    /// Replace a live object with one of another flavor at the same parent.
    ///
    /// The replacement is validated in full first; if it cannot be built
    /// the old object stays as it was. Otherwise the old object (and its
    /// descendants) is destroyed before the new one mounts. Returns the new
    /// handle; the old one is stale.
    pub fn retype(
        &mut self,
        handle: LiveObjectHandle,
        flavor: Flavor,
        attrs: AttributeSet,
    ) -> Result<LiveObjectHandle> {
        let object = self.live(handle)?;
        if object.flavor == flavor {
            self.commit_update(handle, attrs)?;
            return Ok(handle);
        }
        let (from, parent) = (object.flavor, object.parent);
        let prepared = self.prepare(flavor, parent, attrs)?;

        debug!(%handle, %from, to = %flavor, "retype");
        self.destroy(handle)?;
        self.mount(prepared)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn live(&self, handle: LiveObjectHandle) -> Result<&LiveObject<E>> {
        self.objects
            .get(handle)
            .ok_or(ReconcileError::StaleHandle(handle))
    }

    /// Loader state of a scene; `None` for other flavors.
    pub fn scene(&self, handle: LiveObjectHandle) -> Result<Option<Rc<SceneRecord>>> {
        self.live(handle).map(|object| object.scene.clone())
    }

    pub fn flavor(&self, handle: LiveObjectHandle) -> Result<Flavor> {
        self.live(handle).map(|object| object.flavor)
    }

    /// Native object behind `handle`.
    pub fn instance(&self, handle: LiveObjectHandle) -> Result<ObjectId> {
        self.live(handle).map(|object| object.instance)
    }

    pub fn parent(&self, handle: LiveObjectHandle) -> Result<Parent> {
        self.live(handle).map(|object| object.parent)
    }

    /// Attributes of the last successful render.
    pub fn attributes(&self, handle: LiveObjectHandle) -> Result<&AttributeSet> {
        self.live(handle).map(|object| &object.previous)
    }

    /// Lifecycle state; stale handles report `Destroyed`.
    pub fn lifecycle_state(&self, handle: LiveObjectHandle) -> LifecycleState {
        self.objects
            .get(handle)
            .map_or(LifecycleState::Destroyed, |object| object.state)
    }

    /// Direct children, in slot order.
    pub fn children(&self, handle: LiveObjectHandle) -> Result<Vec<LiveObjectHandle>> {
        self.live(handle)?;
        Ok(self
            .objects
            .iter()
            .filter(|(_, object)| object.parent == Parent::Object(handle))
            .map(|(child, _)| child)
            .collect())
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Loader subscriptions held for a scene. A scene's disposers are
    /// exactly its subscriptions.
    pub fn listener_count(&self, handle: LiveObjectHandle) -> Result<usize> {
        self.live(handle).map(|object| match object.scene {
            Some(_) => object.disposers.len(),
            None => 0,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Give up the reconciler and keep the engine. Live objects are dropped
    /// without native teardown.
    pub fn into_engine(self) -> E {
        self.engine
    }
}

/// A mount that passed every check.
struct Prepared {
    flavor: Flavor,
    parent: Parent,
    points: Vec<AttachPoint>,
    args: ConstructArgs,
    planned: Vec<PlannedGroup>,
    initial: AttributeSet,
}

/// Map a constructor failure to the group owning the offending field.
fn invalid(entry: &FlavorEntry, source: AttributeError) -> ReconcileError {
    let group = entry
        .group_of(source.field())
        .map_or("construct", |group| group.name);
    ReconcileError::InvalidAttribute {
        flavor: entry.flavor,
        group,
        source,
    }
}

// =============================================================================
// Tests
// =============================================================================
