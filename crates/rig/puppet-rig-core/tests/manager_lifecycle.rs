use std::sync::Arc;

use puppet_rig_core::{
    backend::ModelLayout,
    config::{Config, FadeCurve},
    expression::{BlendOp, ExpressionAsset},
    manager::ExpressionManager,
    model::ModelState,
    outputs::ExpressionEvent,
    playback::PlaybackState,
};
use puppet_test_fixtures as fixtures;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn model() -> ModelState {
    let layout: ModelLayout = fixtures::models::load("haru-lite").expect("model fixture");
    ModelState::from_layout(&layout, &Config::default())
}

/// it should never finish a looping expression from elapsed time alone
#[test]
fn looping_expression_stays_started() {
    let mut m = model();
    let mut mgr = ExpressionManager::default();
    let asset = ExpressionAsset::new("loop", mgr.config())
        .with_duration(0.0)
        .with_parameter("ParamA", BlendOp::Additive, 0.1);
    let id = mgr.start_expression(&mut m, Arc::new(asset));

    for _ in 0..1000 {
        let out = mgr.update(&mut m, 1.0);
        assert!(!out
            .events
            .iter()
            .any(|e| matches!(e, ExpressionEvent::Finished { .. })));
    }
    let entry = mgr.entry(id).expect("still active");
    assert_eq!(entry.state(), PlaybackState::Started);
    assert_eq!(entry.end_time(), None);
}

/// it should fade out at the end of a finite duration and then finish
#[test]
fn finite_expression_fades_out_and_finishes() {
    let mut m = model();
    let mut mgr = ExpressionManager::default();
    let asset = ExpressionAsset::new("blink", mgr.config())
        .with_fade_in(0.0)
        .with_fade_out(0.5)
        .with_duration(1.0)
        .with_parameter("ParamEyeLOpen", BlendOp::Overwrite, 0.0);
    let id = mgr.start_expression(&mut m, Arc::new(asset));

    mgr.update(&mut m, 0.0);
    assert_eq!(mgr.entry(id).unwrap().end_time(), Some(1.0));
    mgr.update(&mut m, 0.75);
    approx(mgr.fade_weight(id).unwrap(), 0.5, 1e-5);

    let out = mgr.update(&mut m, 0.5);
    assert_eq!(
        out.events,
        vec![ExpressionEvent::Finished {
            entry: id,
            name: "blink".into()
        }]
    );
    assert!(mgr.is_finished());
}

/// it should shift the start time by the scheduling offset without moving fade-in
#[test]
fn offset_shifts_start_time_only() {
    let mut m = model();
    let mut mgr = ExpressionManager::default();
    let asset = ExpressionAsset::new("late", mgr.config())
        .with_fade_in(1.0)
        .with_duration(2.0);
    let id = mgr.start_expression(&mut m, Arc::new(asset));
    mgr.entry_mut(id).unwrap().set_offset_seconds(1.5);

    mgr.update(&mut m, 4.0);
    let entry = mgr.entry(id).unwrap();
    assert_eq!(entry.start_time(), 2.5);
    assert_eq!(entry.fade_in_start_time(), 4.0);
    assert_eq!(entry.end_time(), Some(4.5));
    assert_eq!(entry.fade_weight(), 0.0);
}

/// it should emit superseded events for older entries once the newest is fully in
#[test]
fn newest_full_expression_supersedes_older() {
    let mut m = model();
    let mut mgr = ExpressionManager::default();
    let cfg = mgr.config().clone();
    let a = mgr.start_expression(
        &mut m,
        Arc::new(ExpressionAsset::new("a", &cfg).with_fade_in(0.0)),
    );
    let b = mgr.start_expression(
        &mut m,
        Arc::new(ExpressionAsset::new("b", &cfg).with_fade_in(0.0)),
    );
    let c = mgr.start_expression(
        &mut m,
        Arc::new(ExpressionAsset::new("c", &cfg).with_fade_in(0.5)),
    );

    let out = mgr.update(&mut m, 0.0);
    assert_eq!(out.events.len(), 3);
    assert_eq!(mgr.active_count(), 3);

    let out = mgr.update(&mut m, 0.5);
    let superseded: Vec<_> = out
        .events
        .iter()
        .filter_map(|e| match e {
            ExpressionEvent::Superseded { entry, by, .. } => Some((*entry, *by)),
            _ => None,
        })
        .collect();
    assert_eq!(superseded, vec![(a, c), (b, c)]);
    assert_eq!(mgr.active_count(), 1);
    assert!(mgr.entry(c).is_some());
}

/// it should exclude a finished entry cleanly and cap events per tick
#[test]
fn stopped_entry_is_excluded_and_events_are_capped() {
    let mut m = model();
    let cfg = Config {
        max_events_per_tick: 1,
        fade_curve: FadeCurve::Sine,
        ..Config::default()
    };
    let mut mgr = ExpressionManager::new(cfg.clone());
    let a = mgr.start_expression(
        &mut m,
        Arc::new(
            ExpressionAsset::new("a", &cfg)
                .with_fade_in(0.0)
                .with_parameter("ParamMouthForm", BlendOp::Overwrite, 1.0),
        ),
    );
    mgr.start_expression(
        &mut m,
        Arc::new(ExpressionAsset::new("b", &cfg).with_fade_in(10.0)),
    );
    let out = mgr.update(&mut m, 0.0);
    assert_eq!(out.events.len(), 1);
    assert_eq!(out.dropped_events, 1);
    assert_eq!(m.parameter_value_by_id("ParamMouthForm"), 1.0);

    assert!(mgr.stop(a, 0.0));
    let out = mgr.update(&mut m, 0.1);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, ExpressionEvent::Finished { entry, .. } if *entry == a)));
    assert!(mgr.entry(a).is_none());
    assert_eq!(mgr.active_count(), 1);
    assert!(mgr.accumulator().is_empty());
}
