//! Reconciler properties against the headless engine.
//!
//! - Idempotence: re-rendering identical attributes makes no native call
//! - Minimality: only groups owning a changed field are re-applied
//! - Order determinism: attribute order never changes the call sequence
//! - Removal: a removed field snaps back to the engine default
//! - Stale handles, retype, all-or-nothing updates
//!
//! Run with: cargo test --test reconcile_properties

use sprite_fiber::{
    AttrValue, AttributeSet, BlendMode, Flavor, HeadlessEngine, LifecycleState, LiveObjectHandle,
    NativeCall, NativeError, Parent, ReconcileError, Reconciler,
};

// =============================================================================
// SETUP
// =============================================================================

fn setup() -> (Reconciler<HeadlessEngine>, LiveObjectHandle) {
    let mut reconciler = Reconciler::new(HeadlessEngine::new());
    let scene = reconciler
        .instantiate(Flavor::Scene, Parent::Game, AttributeSet::new().with("key", "main"))
        .unwrap();
    (reconciler, scene)
}

fn hero() -> AttributeSet {
    AttributeSet::new()
        .with("texture", "hero")
        .with("x", 10)
        .with("y", 20)
        .with("alpha", 0.8)
        .with("tint", 0x00ff00)
        .with("blend_mode", "add")
}

fn calls_after(
    reconciler: &mut Reconciler<HeadlessEngine>,
    handle: LiveObjectHandle,
    next: AttributeSet,
) -> Vec<NativeCall> {
    let id = reconciler.instance(handle).unwrap();
    reconciler.engine_mut().clear_log();
    reconciler.commit_update(handle, next).unwrap();
    reconciler.engine().calls_for(id)
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[test]
fn identical_render_makes_no_native_calls() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();

    assert!(calls_after(&mut reconciler, sprite, hero()).is_empty());
    assert!(calls_after(&mut reconciler, sprite, hero()).is_empty());
}

#[test]
fn initial_mount_applies_declared_groups_in_registry_order() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();
    let id = reconciler.instance(sprite).unwrap();

    // Position went to the constructor and is not applied again.
    assert_eq!(
        reconciler.engine().calls_for(id),
        vec![
            NativeCall::SetAlpha(0.8),
            NativeCall::SetTint(0x00ff00),
            NativeCall::SetBlendMode(BlendMode::Add),
        ]
    );
}

#[test]
fn only_changed_groups_are_reapplied() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();

    let calls = calls_after(&mut reconciler, sprite, hero().with("x", 11).with("depth", 4));
    assert_eq!(
        calls,
        vec![
            NativeCall::SetPosition { x: 11.0, y: 20.0 },
            NativeCall::SetDepth(4.0),
        ]
    );
}

#[test]
fn attribute_order_does_not_change_calls() {
    let forward: AttributeSet = [
        ("alpha", AttrValue::from(0.25)),
        ("depth", AttrValue::from(2)),
        ("rotation", AttrValue::from(0.5)),
    ]
    .into_iter()
    .collect();
    let backward: AttributeSet = [
        ("rotation", AttrValue::from(0.5)),
        ("depth", AttrValue::from(2)),
        ("alpha", AttrValue::from(0.25)),
    ]
    .into_iter()
    .collect();

    let (mut first, scene_a) = setup();
    let a = first
        .instantiate(Flavor::Sprite, Parent::Object(scene_a), forward)
        .unwrap();
    let (mut second, scene_b) = setup();
    let b = second
        .instantiate(Flavor::Sprite, Parent::Object(scene_b), backward)
        .unwrap();

    let calls_a = first.engine().calls_for(first.instance(a).unwrap());
    let calls_b = second.engine().calls_for(second.instance(b).unwrap());
    assert_eq!(calls_a, calls_b);
    assert_eq!(
        calls_a,
        vec![
            NativeCall::SetRotation(0.5),
            NativeCall::SetAlpha(0.25),
            NativeCall::SetDepth(2.0),
        ]
    );
}

#[test]
fn removed_field_snaps_to_default() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();

    let calls = calls_after(&mut reconciler, sprite, hero().without("alpha").without("tint"));
    assert_eq!(calls, vec![NativeCall::SetAlpha(1.0), NativeCall::ClearTint]);
}

#[test]
fn crop_is_cleared_when_removed() {
    let (mut reconciler, scene) = setup();
    let cropped = hero().with(
        "crop",
        AttrValue::bundle([("width", AttrValue::from(16)), ("height", AttrValue::from(8))]),
    );
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), cropped)
        .unwrap();
    let id = reconciler.instance(sprite).unwrap();
    assert_eq!(
        reconciler.engine().last_call(id, "setCrop"),
        Some(&NativeCall::SetCrop { x: 0.0, y: 0.0, width: 16.0, height: 8.0 })
    );

    assert_eq!(calls_after(&mut reconciler, sprite, hero()), vec![NativeCall::ClearCrop]);
}

#[test]
fn invalid_attribute_applies_nothing_and_keeps_previous() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();
    let id = reconciler.instance(sprite).unwrap();
    reconciler.engine_mut().clear_log();

    // Position is valid, alpha is not: neither may reach the engine.
    let next = hero().with("x", 99).with("alpha", 2.0);
    let result = reconciler.commit_update(sprite, next);
    assert!(matches!(
        result,
        Err(ReconcileError::InvalidAttribute { group: "alpha", .. })
    ));
    assert!(reconciler.engine().calls_for(id).is_empty());
    assert_eq!(reconciler.attributes(sprite).unwrap(), &hero());

    // The next valid render diffs against the last good one.
    let calls = calls_after(&mut reconciler, sprite, hero().with("x", 99));
    assert_eq!(calls, vec![NativeCall::SetPosition { x: 99.0, y: 20.0 }]);
}

#[test]
fn native_failure_propagates_unchanged() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();

    reconciler
        .engine_mut()
        .fail_next(NativeError::Other("device lost".to_string()));
    let result = reconciler.commit_update(sprite, hero().with("depth", 1));
    assert_eq!(
        result,
        Err(ReconcileError::Native(NativeError::Other("device lost".to_string())))
    );
}

#[test]
fn unknown_flavor_rejected_at_creation() {
    let (mut reconciler, scene) = setup();
    let result = reconciler.instantiate(Flavor::Custom("tilemap"), Parent::Object(scene), AttributeSet::new());
    assert_eq!(result, Err(ReconcileError::UnknownFlavor(Flavor::Custom("tilemap"))));
}

#[test]
fn stale_handles_are_rejected() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();
    reconciler.destroy(sprite).unwrap();

    // The freed slot is reused; the old handle must not reach the new object.
    let text = reconciler
        .instantiate(Flavor::Text, Parent::Object(scene), AttributeSet::new())
        .unwrap();
    assert_eq!(text.index(), sprite.index());

    assert_eq!(
        reconciler.commit_update(sprite, hero()),
        Err(ReconcileError::StaleHandle(sprite))
    );
    assert_eq!(reconciler.flavor(sprite), Err(ReconcileError::StaleHandle(sprite)));
    assert_eq!(reconciler.lifecycle_state(sprite), LifecycleState::Destroyed);
    assert_eq!(reconciler.flavor(text), Ok(Flavor::Text));
}

#[test]
fn retype_replaces_the_native_object() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();
    let old_id = reconciler.instance(sprite).unwrap();

    let body = reconciler
        .retype(sprite, Flavor::ArcadeSprite, hero().with("bounce", 0.5))
        .unwrap();
    let new_id = reconciler.instance(body).unwrap();

    assert_ne!(old_id, new_id);
    assert!(!reconciler.engine().exists(old_id));
    assert_eq!(reconciler.engine().flavor_of(new_id), Some(Flavor::ArcadeSprite));
    assert_eq!(reconciler.parent(body), Ok(Parent::Object(scene)));
    assert_eq!(
        reconciler.engine().last_call(new_id, "setBounce"),
        Some(&NativeCall::SetBounceXY { x: 0.5, y: 0.5 })
    );
    assert_eq!(reconciler.lifecycle_state(sprite), LifecycleState::Destroyed);
}

#[test]
fn same_flavor_retype_is_an_update() {
    let (mut reconciler, scene) = setup();
    let sprite = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), hero())
        .unwrap();
    let id = reconciler.instance(sprite).unwrap();

    let same = reconciler.retype(sprite, Flavor::Sprite, hero().with("depth", 3)).unwrap();
    assert_eq!(same, sprite);
    assert_eq!(reconciler.instance(same), Ok(id));
}

#[test]
fn matter_bounce_is_a_single_scalar() {
    let (mut reconciler, scene) = setup();
    let body = reconciler
        .instantiate(Flavor::MatterSprite, Parent::Object(scene), AttributeSet::new().with("bounce", 1))
        .unwrap();
    let id = reconciler.instance(body).unwrap();

    assert_eq!(reconciler.engine().calls_for(id), vec![NativeCall::SetBounce(1.0)]);
}

#[test]
fn arcade_debug_applied_once_with_all_three_values() {
    let (mut reconciler, scene) = setup();
    let debug = AttrValue::bundle([
        ("body_color", AttrValue::from(12)),
        ("show_body", AttrValue::from(true)),
        ("show_velocity", AttrValue::from(true)),
    ]);
    let body = reconciler
        .instantiate(Flavor::ArcadeSprite, Parent::Object(scene), AttributeSet::new().with("debug", debug))
        .unwrap();
    let id = reconciler.instance(body).unwrap();

    let debug_calls: Vec<_> = reconciler
        .engine()
        .calls_for(id)
        .into_iter()
        .filter(|call| call.name() == "setDebug")
        .collect();
    assert_eq!(
        debug_calls,
        vec![NativeCall::SetDebug {
            show_body: true,
            show_velocity: true,
            body_color: 12,
        }]
    );
}

#[test]
fn destroy_releases_everything() {
    let (mut reconciler, scene) = setup();
    for i in 0..3 {
        reconciler
            .instantiate(Flavor::Sprite, Parent::Object(scene), AttributeSet::new().with("x", i))
            .unwrap();
    }
    assert_eq!(reconciler.live_count(), 4);

    reconciler.destroy(scene).unwrap();
    assert_eq!(reconciler.live_count(), 0);
    assert_eq!(reconciler.engine().object_count(), 0);
    assert_eq!(reconciler.engine().total_listeners(), 0);
    assert_eq!(reconciler.engine().orphaned_listeners(), 0);
}
