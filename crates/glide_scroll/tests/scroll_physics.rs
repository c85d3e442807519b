//! Integration tests for a single scroll container
//!
//! These tests verify that:
//! - Overscroll is damped by the friction curve and recovery is not
//! - Edge effects gate deltas per edge and accumulate fade
//! - Scroll callbacks can rewrite or consume a delta
//! - Snap offsets and paginations settle a released gesture
//! - Configuration loads from disk and shows up in dumps

use std::cell::RefCell;
use std::rc::Rc;

use glide_core::{Axis, Dimension};
use glide_scroll::{
    ContainerKind, EdgeEffect, EffectEdge, GesturePhase, LayoutInfo, NodeId, ScrollConfig,
    ScrollEdge, ScrollPattern, ScrollSource, SnapAlign, SnapConfig, ViewTree,
};

const FRAME: f32 = 1.0 / 60.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn single(config: ScrollConfig, viewport: f32, content: f32) -> (ViewTree, NodeId) {
    let mut pattern = ScrollPattern::new(ContainerKind::List, config);
    pattern.on_layout(LayoutInfo::along(Axis::Vertical, viewport, content));
    let mut tree = ViewTree::new();
    let id = tree.insert_root("list", Some(Box::new(pattern)));
    (tree, id)
}

fn pattern(tree: &ViewTree, id: NodeId) -> &ScrollPattern {
    tree.container_as::<ScrollPattern>(id).unwrap()
}

fn pattern_mut(tree: &mut ViewTree, id: NodeId) -> &mut ScrollPattern {
    tree.container_as_mut::<ScrollPattern>(id).unwrap()
}

fn settle(tree: &mut ViewTree) {
    for _ in 0..600 {
        tree.tick(FRAME);
    }
}

#[test]
fn test_overscroll_is_damped_and_recovery_is_not() {
    init_tracing();
    let (mut tree, id) = single(ScrollConfig::spring(), 500.0, 1000.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, 60.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), 60.0);

    tree.scroll_update(id, 20.0, ScrollSource::Update);
    let stretched = pattern(&tree, id).offset();
    assert!(stretched > 60.0 && stretched < 80.0, "{stretched}");

    tree.scroll_update(id, -30.0, ScrollSource::Update);
    let recovered = pattern(&tree, id).offset();
    assert!((stretched - recovered - 30.0).abs() < 1e-3);
}

#[test]
fn test_crossing_end_fires_edge_event() {
    init_tracing();
    let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 700.0);
    let edges = Rc::new(RefCell::new(Vec::new()));
    {
        let edges = edges.clone();
        pattern_mut(&mut tree, id)
            .events_mut()
            .on_scroll_edge(move |edge| edges.borrow_mut().push(edge));
    }
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -250.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), -200.0);
    assert_eq!(edges.borrow().as_slice(), &[ScrollEdge::Bottom]);
}

#[test]
fn test_will_scroll_can_rewrite_delta() {
    init_tracing();
    let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 1500.0);
    pattern_mut(&mut tree, id)
        .events_mut()
        .on_will_scroll(|payload| Some(payload.offset_y / 2.0));
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -100.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), -50.0);
}

#[test]
fn test_frame_begin_can_consume_delta() {
    init_tracing();
    let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 1500.0);
    pattern_mut(&mut tree, id)
        .events_mut()
        .on_scroll_frame_begin(|_, _| 0.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -100.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), 0.0);
}

#[test]
fn test_reversed_axis_reports_display_offset() {
    init_tracing();
    let config = ScrollConfig {
        reversed: true,
        ..ScrollConfig::no_bounce()
    };
    let (mut tree, id) = single(config, 500.0, 1000.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, 50.0, ScrollSource::Update);
    let pattern = pattern(&tree, id);
    assert_eq!(pattern.state().current_offset(), -50.0);
    assert_eq!(pattern.offset(), 50.0);
}

#[test]
fn test_effect_edge_limits_spring_to_one_side() {
    init_tracing();
    let config = ScrollConfig {
        effect_edge: EffectEdge::End,
        ..ScrollConfig::spring()
    };
    let (mut tree, id) = single(config, 500.0, 1000.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, 40.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), 0.0);

    tree.touch_cancel(id);
    pattern_mut(&mut tree, id).scroll_to(-500.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -40.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), -540.0);

    tree.scroll_end(id, 0.0);
    settle(&mut tree);
    assert!((pattern(&tree, id).offset() + 500.0).abs() < 0.01);
    assert!(!pattern(&tree, id).is_animating());
}

#[test]
fn test_fade_accumulates_at_edge() {
    init_tracing();
    let config = ScrollConfig {
        edge_effect: EdgeEffect::Fade,
        ..ScrollConfig::default()
    };
    let (mut tree, id) = single(config, 500.0, 1000.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, 30.0, ScrollSource::Update);
    assert_eq!(pattern(&tree, id).offset(), 0.0);
    assert_eq!(pattern(&tree, id).state().fade_amount(), 30.0);

    tree.scroll_end(id, 800.0);
    assert!(!pattern(&tree, id).is_animating());
    assert_eq!(pattern(&tree, id).phase(), GesturePhase::Idle);
}

#[test]
fn test_paginations_settle_on_nearest_boundary() {
    init_tracing();
    let snap = SnapConfig::paginations(
        SnapAlign::Start,
        vec![Dimension::Px(150.0), Dimension::Px(400.0)],
    );
    let (mut tree, id) = single(ScrollConfig::no_bounce().with_snap(snap), 300.0, 900.0);
    assert_eq!(pattern(&tree, id).snap().offsets(), &[0.0, -150.0, -400.0, -600.0]);

    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -250.0, ScrollSource::Update);
    tree.touch_cancel(id);
    settle(&mut tree);
    assert!((pattern(&tree, id).offset() + 150.0).abs() < 0.01);
}

#[test]
fn test_disabled_snap_to_start_leaves_offset() {
    init_tracing();
    let snap = SnapConfig::interval(SnapAlign::Start, Dimension::Px(100.0)).with_snap_to_side(false, true);
    let (mut tree, id) = single(ScrollConfig::no_bounce().with_snap(snap), 300.0, 800.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -30.0, ScrollSource::Update);
    tree.touch_cancel(id);
    assert!(!pattern(&tree, id).is_animating());
    assert_eq!(pattern(&tree, id).offset(), -30.0);
}

#[test]
fn test_programmatic_fling() {
    init_tracing();
    let (mut tree, id) = single(ScrollConfig::no_bounce(), 500.0, 4000.0);
    let stops = Rc::new(RefCell::new(0));
    {
        let stops = stops.clone();
        pattern_mut(&mut tree, id)
            .events_mut()
            .on_scroll_stop(move || *stops.borrow_mut() += 1);
    }
    tree.with_container_as::<ScrollPattern, _>(id, |pattern, chain| pattern.fling(chain, -1200.0));
    assert!(pattern(&tree, id).is_animating());
    settle(&mut tree);
    assert!(pattern(&tree, id).offset() < -400.0);
    assert_eq!(*stops.borrow(), 1);
}

#[test]
fn test_config_file_and_dump() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("glide-scroll-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        edge_effect = "spring"
        paging = true

        [nested]
        forward = "parallel"
        "#,
    )
    .unwrap();
    let config = ScrollConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.edge_effect, EdgeEffect::Spring);
    assert!(config.paging);

    let (mut tree, id) = single(config, 400.0, 1000.0);
    tree.scroll_start(id, 0.0);
    tree.scroll_update(id, -60.0, ScrollSource::Update);

    let dump = pattern(&tree, id).dump();
    assert_eq!(dump["nested"]["forward"], "parallel");
    assert_eq!(dump["snap"]["paging"], true);
    assert_eq!(dump["snap"]["offsets"].as_array().map(Vec::len), Some(3));
    let kinds: Vec<&str> = dump["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|record| record["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"reach_start"));
    assert!(kinds.contains(&"scroll_start"));
}
