use std::collections::HashMap;
use std::sync::Arc;

use motd_engine::constants::MAINTENANCE_BATCH;
use motd_engine::{
    Group, GroupState, MotdEngine, Probe, SelectMode, SelectionReason, SelectionStrategy,
    Settings, Snapshot, StickyStore, Variant, select,
};

fn variants() -> Vec<Variant> {
    vec![
        Variant::new("alpha", 1, "Alpha"),
        Variant::new("beta", 1, "Beta"),
        Variant::new("gamma", 1, "Gamma"),
        Variant::new("delta", 1, "Delta"),
    ]
}

fn live() -> SelectMode {
    SelectMode::Live { record_pick: true }
}

#[test]
fn sticky_origin_keeps_variant_for_ttl() {
    let group =
        Group::new("g", SelectionStrategy::StickyPerOrigin, variants()).with_sticky(10, 100, 500);
    let state = GroupState::new(&group);

    for origin in ["10.0.0.1", "10.0.0.2", "10.0.0.3", "2001:db8::7"] {
        let first = select(&group, &state, Some(origin), 1_000, live());
        assert_eq!(first.reason, SelectionReason::StickyNew);
        for now in [1_001, 5_000, 10_999] {
            let again = select(&group, &state, Some(origin), now, live());
            assert_eq!(again.variant.id, first.variant.id);
            assert_eq!(again.reason, SelectionReason::StickyHit);
        }
        let expired = select(&group, &state, Some(origin), 12_000, live());
        assert_eq!(expired.reason, SelectionReason::StickyNew);
        assert_eq!(expired.sticky.map(|entry| entry.created_at_ms), Some(12_000));
    }
}

#[test]
fn rotation_visits_every_variant_in_order() {
    let group = Group::new("g", SelectionStrategy::Rotate, variants());
    let state = GroupState::new(&group);
    let ids: Vec<String> = (0..5)
        .map(|i| {
            let origin = if i % 2 == 0 { Some("1.1.1.1") } else { None };
            select(&group, &state, origin, 0, live()).variant.id.clone()
        })
        .collect();
    assert_eq!(ids, vec!["alpha", "beta", "gamma", "delta", "alpha"]);
}

#[test]
fn hashed_selection_is_stable_per_origin() {
    let group = Group::new("g", SelectionStrategy::HashedPerOrigin, variants());
    let state = GroupState::new(&group);
    let mut seen = HashMap::new();
    for round in 0..3_u64 {
        for n in 0..50 {
            let origin = format!("192.168.0.{n}");
            let pick = select(&group, &state, Some(&origin), round * 60_000, live());
            assert_eq!(pick.reason, SelectionReason::Hashed);
            let first = seen.entry(origin).or_insert_with(|| pick.variant.id.clone());
            assert_eq!(*first, pick.variant.id);
        }
    }
    let distinct: std::collections::HashSet<_> = seen.values().collect();
    assert!(distinct.len() > 1);
}

#[test]
fn unknown_origin_degrades_gracefully() {
    for strategy in [SelectionStrategy::StickyPerOrigin, SelectionStrategy::HashedPerOrigin] {
        let group = Group::new("g", strategy, variants());
        let state = GroupState::new(&group);
        let pick = select(&group, &state, None, 42, live());
        assert_eq!(pick.reason, SelectionReason::OriginUnknown);
        assert!(pick.sticky.is_none());
        assert!(state.sticky.is_empty());
    }
}

#[test]
fn maintenance_bounds_store_size() {
    let variant = Arc::new(Variant::new("v", 1, "v"));
    let store = StickyStore::new(450);
    let capacity = 1_000;
    for n in 0..5_000_u64 {
        store.put(&format!("origin-{n}"), Arc::clone(&variant), n, false);
    }
    assert_eq!(store.len(), 5_000);

    for _ in 0..40 {
        store.run_maintenance(5_000, 60_000, capacity);
    }
    assert!(store.len() <= capacity + MAINTENANCE_BATCH);
    assert!(store.len() >= capacity);
}

#[test]
fn engine_caps_sticky_growth_under_many_origins() {
    let group =
        Group::new("g", SelectionStrategy::StickyPerOrigin, variants()).with_sticky(60, 50, 10);
    let engine = MotdEngine::new(Snapshot::from_groups(Settings::default(), vec![group]));
    for n in 0..2_000 {
        let origin = format!("172.16.{}.{}", n / 256, n % 256);
        let _ = engine.render_for_request(&Probe::new(0, 20).with_origin(&origin), 1_000, false);
    }
    let (_, size) = engine.sticky_sizes()[0].clone();
    assert!(size <= 50 + MAINTENANCE_BATCH, "sticky store grew to {size}");
}

#[test]
fn random_picks_follow_weights() {
    let group = Group::new(
        "g",
        SelectionStrategy::Random,
        vec![Variant::new("heavy", 3, "H"), Variant::new("light", 1, "L")],
    );
    let engine = MotdEngine::new(Snapshot::from_groups(Settings::default(), vec![group]));
    for _ in 0..8_000 {
        let _ = engine.render_for_request(&Probe::new(0, 0), 0, true);
    }
    let stats = engine.stats();
    assert_eq!(stats[0].variant_id, "heavy");
    let heavy = stats[0].count as f64 / 8_000.0;
    assert!((heavy - 0.75).abs() < 0.05, "heavy share {heavy}");
}
