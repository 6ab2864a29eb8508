use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use motd_engine::{Group, MotdEngine, Probe, SelectionStrategy, Settings, Snapshot, Variant};

fn generation(tag: &str, count: usize) -> Snapshot {
    let variants = (0..count)
        .map(|i| {
            let template = format!("<gold>{tag}</gold> {i}\n%online%");
            Variant::new(format!("{tag}-{i}"), 1, &template)
        })
        .collect();
    let group = Group::new("main", SelectionStrategy::StickyPerOrigin, variants);
    let settings = Settings {
        active_group: "main".to_string(),
        ..Settings::default()
    };
    Snapshot::from_groups(settings, vec![group])
}

#[test]
fn renders_never_mix_generations_during_reload() {
    let engine = Arc::new(MotdEngine::new(generation("old", 3)));
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut rendered = 0_u64;
                let mut n = 0_u64;
                loop {
                    let origin = format!("10.{worker}.{}.{}", n / 256 % 256, n % 256);
                    let result = engine.render_for_request(
                        &Probe::new(7, 20).with_origin(&origin),
                        n,
                        true,
                    );
                    let tag = result.variant_id.split('-').next().unwrap_or_default().to_string();
                    assert!(tag == "old" || tag == "new", "unexpected {}", result.variant_id);
                    assert!(result.plain.starts_with(&tag), "mixed render {result:?}");
                    assert_eq!(result.lines.len(), 2);
                    assert_eq!(result.lines[1], "7");
                    rendered += 1;
                    n += 1;
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                }
                rendered
            })
        })
        .collect();

    for round in 0..200 {
        let snapshot = if round % 2 == 0 {
            generation("new", 5)
        } else {
            generation("old", 3)
        };
        let summary = engine.reload(snapshot);
        assert_eq!(summary.groups, 1);
        assert!(summary.warnings.is_empty());
    }
    stop.store(true, Ordering::Relaxed);

    let total: u64 = readers
        .into_iter()
        .map(|reader| reader.join().expect("reader thread panicked"))
        .sum();
    assert!(total > 0);

    let variants = engine.snapshot().variant_count();
    assert_eq!(variants, 3);
}

#[test]
fn stats_belong_to_the_published_generation() {
    let engine = MotdEngine::new(generation("old", 2));
    for n in 0..20 {
        let origin = format!("origin-{n}");
        let _ = engine.render_for_request(&Probe::new(0, 0).with_origin(&origin), 0, true);
    }
    assert_eq!(engine.stats().iter().map(|s| s.count).sum::<u64>(), 20);

    engine.reload(generation("new", 2));
    assert!(engine.stats().is_empty());
    let result = engine.render_for_request(&Probe::new(0, 0).with_origin("origin-1"), 0, true);
    assert!(result.variant_id.starts_with("new-"));
}
