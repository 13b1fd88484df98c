//! Scene loading through the reconciler and the headless loader.
//!
//! Mounts scenes, drives loader events with `HeadlessEngine::emit`, and
//! checks load state, child gating and listener bookkeeping.
//!
//! Run with: cargo test --test scene_loading

use std::cell::RefCell;
use std::rc::Rc;

use sprite_fiber::{
    AttrValue, AttributeSet, Cleanup, ConstructArgs, Flavor, HeadlessEngine, LiveObjectHandle,
    LoadState, LoaderEvent, ObjectId, Parent, Reconciler, SceneHook, scene_gate,
};

// =============================================================================
// SETUP
// =============================================================================

fn setup(key: &str) -> (Reconciler<HeadlessEngine>, LiveObjectHandle, ObjectId) {
    let mut reconciler = Reconciler::new(HeadlessEngine::new());
    let scene = reconciler
        .instantiate(Flavor::Scene, Parent::Game, AttributeSet::new().with("key", key))
        .unwrap();
    let instance = reconciler.instance(scene).unwrap();
    (reconciler, scene, instance)
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn load_state_follows_loader_events() {
    let (reconciler, scene, instance) = setup("level-1");
    let record = reconciler.scene(scene).unwrap().unwrap();

    let mut seen = Vec::new();
    for event in [
        LoaderEvent::Start,
        LoaderEvent::Progress(0.3),
        LoaderEvent::Progress(0.9),
        LoaderEvent::Complete,
    ] {
        reconciler.engine().emit(instance, event);
        seen.push(record.load_state());
    }

    assert_eq!(
        seen,
        vec![
            LoadState::Loading(0.0),
            LoadState::Loading(0.3),
            LoadState::Loading(0.9),
            LoadState::Ready,
        ]
    );
    // Completion resets progress.
    assert_eq!(record.progress(), 0.0);
}

#[test]
fn children_materialize_only_after_ready() {
    let (mut reconciler, scene, instance) = setup("level-1");
    let record = reconciler.scene(scene).unwrap().unwrap();

    // The gate only records what it would render; the host mounts afterwards.
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let loading_log = log.clone();
    let children_log = log.clone();
    let _gate = scene_gate(
        record.clone(),
        Some(move |progress: f64| -> Cleanup {
            loading_log.borrow_mut().push(format!("loading {progress}"));
            Box::new(|| {})
        }),
        move || -> Cleanup {
            children_log.borrow_mut().push("children".to_string());
            Box::new(|| {})
        },
    );

    reconciler.engine().emit(instance, LoaderEvent::Start);
    reconciler.engine().emit(instance, LoaderEvent::Progress(0.3));
    reconciler.engine().emit(instance, LoaderEvent::Progress(0.9));
    assert!(!log.borrow().contains(&"children".to_string()));

    reconciler.engine().emit(instance, LoaderEvent::Complete);
    assert_eq!(
        *log.borrow(),
        vec![
            "loading 0".to_string(),
            "loading 0.3".to_string(),
            "loading 0.9".to_string(),
            "children".to_string(),
        ]
    );

    // Ready: the host can now mount the scene's children.
    let player = reconciler
        .instantiate(Flavor::Sprite, Parent::Object(scene), AttributeSet::new().with("texture", "player"))
        .unwrap();
    assert_eq!(reconciler.children(scene).unwrap(), vec![player]);
}

#[test]
fn detach_unsubscribes_every_listener() {
    let (mut reconciler, scene, instance) = setup("level-1");
    assert_eq!(reconciler.engine().listener_count(instance), 3);
    assert_eq!(reconciler.listener_count(scene).unwrap(), 3);

    reconciler.destroy(scene).unwrap();
    // One unsubscription per subscription, all made before the scene went.
    assert_eq!(reconciler.engine().unsubscribe_count(instance), 3);
    assert_eq!(reconciler.engine().orphaned_listeners(), 0);
    assert_eq!(reconciler.engine().total_listeners(), 0);
    assert_eq!(reconciler.engine().scene("level-1"), None);
}

#[test]
fn hooks_and_settings_are_bound_to_the_scene() {
    let calls: Rc<RefCell<Vec<(&'static str, ObjectId)>>> = Rc::new(RefCell::new(Vec::new()));
    let hook = |name: &'static str| {
        let calls = calls.clone();
        SceneHook::new(move |scene| calls.borrow_mut().push((name, scene)))
    };
    let physics = AttrValue::bundle([("default", AttrValue::from("arcade"))]);

    let mut reconciler = Reconciler::new(HeadlessEngine::new());
    let scene = reconciler
        .instantiate(
            Flavor::Scene,
            Parent::Game,
            AttributeSet::new()
                .with("key", "level-1")
                .with("physics", physics.clone())
                .with("on_create", hook("create"))
                .with("on_preload", hook("preload"))
                .with("on_init", hook("init")),
        )
        .unwrap();
    let instance = reconciler.instance(scene).unwrap();

    let Some(ConstructArgs::Scene { settings, .. }) = reconciler.engine().construct_args(instance) else {
        panic!("scene built with other arguments");
    };
    assert_eq!(settings.get("physics"), Some(&physics));
    assert!(calls.borrow().is_empty());

    reconciler.engine_mut().boot().unwrap();
    assert_eq!(
        *calls.borrow(),
        vec![("init", instance), ("preload", instance), ("create", instance)]
    );
}

#[test]
fn late_complete_after_detach_is_a_no_op() {
    let (mut reconciler, scene, instance) = setup("level-1");
    let record = reconciler.scene(scene).unwrap().unwrap();
    reconciler.engine().emit(instance, LoaderEvent::Progress(0.4));

    // Keep a listener the way an engine that is mid-dispatch would.
    let in_flight = reconciler
        .engine()
        .listeners_for(instance, sprite_fiber::LoaderEventKind::Complete);
    assert_eq!(in_flight.len(), 1);

    reconciler.destroy(scene).unwrap();

    for listener in &in_flight {
        listener(&LoaderEvent::Complete);
    }
    reconciler.engine().emit(instance, LoaderEvent::Complete);

    assert_eq!(record.load_state(), LoadState::Loading(0.4));
    assert!(!record.is_attached());
}

#[test]
fn scene_keys_are_unique() {
    let (mut reconciler, _scene, _instance) = setup("level-1");
    let duplicate = reconciler.instantiate(
        Flavor::Scene,
        Parent::Game,
        AttributeSet::new().with("key", "level-1"),
    );
    assert!(duplicate.is_err());
    assert_eq!(reconciler.live_count(), 1);
    assert_eq!(reconciler.engine().total_listeners(), 3);
}

#[test]
fn scene_activity_toggles() {
    let (mut reconciler, scene, instance) = setup("level-1");
    reconciler
        .commit_update(scene, AttributeSet::new().with("key", "level-1").with("active", false))
        .unwrap();
    assert_eq!(
        reconciler.engine().last_call(instance, "setActive"),
        Some(&sprite_fiber::NativeCall::SetActive(false))
    );

    reconciler
        .commit_update(scene, AttributeSet::new().with("key", "level-1"))
        .unwrap();
    assert_eq!(
        reconciler.engine().last_call(instance, "setActive"),
        Some(&sprite_fiber::NativeCall::SetActive(true))
    );
}
