//! Scene loading demo.
//!
//! Mounts a scene with a loading indicator, drives the headless loader, and
//! mounts the level once assets are ready. Set `RUST_LOG=sprite_fiber=debug`
//! (or `trace`) to watch the reconciler.
//!
//! Run with: cargo run --example scene_loading

use std::cell::RefCell;
use std::rc::Rc;

use sprite_fiber::{
    AttrValue, AttributeSet, Cleanup, Flavor, HeadlessEngine, LoaderEvent, Parent, Reconciler,
    ReconcilerConfig, scene_gate,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ReconcilerConfig::default().with_trace_native_calls(true);
    let mut reconciler = Reconciler::with_config(HeadlessEngine::new(), config);

    let scene = reconciler.instantiate(
        Flavor::Scene,
        Parent::Game,
        AttributeSet::new().with("key", "level-1"),
    )?;
    let scene_id = reconciler.instance(scene)?;
    let record = reconciler
        .scene(scene)?
        .ok_or("scene without a load record")?;

    // The gate decides what should be on screen; the loop below mounts it.
    let ready = Rc::new(RefCell::new(false));
    let ready_flag = ready.clone();
    let _gate = scene_gate(
        record.clone(),
        Some(|progress: f64| -> Cleanup {
            println!("loading... {:>3.0}%", progress * 100.0);
            Box::new(|| {})
        }),
        move || -> Cleanup {
            *ready_flag.borrow_mut() = true;
            let flag = ready_flag.clone();
            Box::new(move || *flag.borrow_mut() = false)
        },
    );

    for event in [
        LoaderEvent::Start,
        LoaderEvent::Progress(0.25),
        LoaderEvent::Progress(0.5),
        LoaderEvent::Progress(1.0),
        LoaderEvent::Complete,
    ] {
        reconciler.engine().emit(scene_id, event);
    }

    if *ready.borrow() {
        let player = reconciler.instantiate(
            Flavor::ArcadeSprite,
            Parent::Object(scene),
            AttributeSet::new()
                .with("texture", "player")
                .with("x", 64)
                .with("y", 128)
                .with("collide_world_bounds", true)
                .with(
                    "debug",
                    AttrValue::bundle([("body_color", AttrValue::from(0x00ff00))]),
                ),
        )?;
        let hud = reconciler.instantiate(
            Flavor::Text,
            Parent::Object(scene),
            AttributeSet::new().with("text", "score: 0").with("x", 8).with("y", 8),
        )?;

        // One frame later: the player moves, the score changes.
        let moved = reconciler
            .attributes(player)?
            .clone()
            .with("x", 72)
            .with("velocity", AttrValue::bundle([("x", AttrValue::from(120))]));
        reconciler.commit_update(player, moved)?;
        reconciler.commit_update(hud, AttributeSet::new().with("text", "score: 10").with("x", 8).with("y", 8))?;
    }

    println!("{} native calls", reconciler.engine().log().len());
    for entry in reconciler.engine().log() {
        println!("  {} {:?}", entry.target, entry.call);
    }

    reconciler.destroy(scene)?;
    println!(
        "after teardown: {} objects, {} listeners",
        reconciler.engine().object_count(),
        reconciler.engine().total_listeners()
    );
    Ok(())
}
