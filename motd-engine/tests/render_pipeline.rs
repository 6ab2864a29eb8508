use motd_engine::{
    Color, Dialect, DialectPreference, FrameSlot, JsonSource, MotdEngine, Probe,
    SelectionReason, Snapshot, SnapshotConfig, parse,
};

const SAMPLE: &str = include_str!("../../motd-tester/assets/sample.json");

fn engine() -> MotdEngine {
    let engine = MotdEngine::default();
    engine
        .reload_from(&JsonSource::new(SAMPLE))
        .expect("sample config loads");
    engine
}

#[test]
fn two_line_template_round_trips() {
    let result = parse("Line1\nLine2", DialectPreference::Auto);
    assert_eq!(result.rich.lines(), vec!["Line1", "Line2"]);
    let tagged = parse("<red>Line1</red>\n<bold>Line2", DialectPreference::Auto);
    assert_eq!(tagged.rich.lines(), vec!["Line1", "Line2"]);
}

#[test]
fn parse_never_panics_on_hostile_input() {
    let inputs = [
        "",
        "<",
        "{\"text\":",
        "[1,2,",
        "&",
        "§",
        "<#zzzzzz>",
        "<color:>",
        "&x&1&2",
        "</></></>",
        "\\",
        "<<<<>>>>",
        "{\"extra\":[{\"text\":5}]}",
        "\u{0}\u{1}<\u{7f}>",
    ];
    for raw in inputs {
        for preference in [
            DialectPreference::Auto,
            DialectPreference::Fixed(Dialect::TagMarkup),
            DialectPreference::Fixed(Dialect::LegacyCodes),
            DialectPreference::Fixed(Dialect::HexLegacy),
            DialectPreference::Fixed(Dialect::Json),
        ] {
            let result = parse(raw, preference);
            if result.fallback_used {
                assert_eq!(result.rich.to_plain(), raw);
            }
        }
    }
}

#[test]
fn sample_config_loads_with_expected_warnings() {
    let config = SnapshotConfig::from_json(SAMPLE).expect("sample parses");
    let snapshot = Snapshot::from_config(config);
    assert_eq!(snapshot.groups().len(), 3);
    assert_eq!(snapshot.settings.active_group, "lobby");
    assert!(
        snapshot
            .warnings()
            .iter()
            .any(|warning| warning.contains("retro-alt"))
    );
}

#[test]
fn virtual_host_routes_to_event_profile() {
    let engine = engine();
    let probe = Probe::new(10, 100)
        .with_origin("203.0.113.9")
        .with_virtual_host("Events.Example.net:25565");
    let result = engine.render_for_request(&probe, 0, true);
    assert_eq!(result.group_id, "events");
    assert_eq!(result.variant_id, "tournament");
    assert_eq!(result.reason, SelectionReason::Rotated);
    assert_eq!(result.dialect, Dialect::HexLegacy);
    assert_eq!(result.counts.display_online, 15);
    assert_eq!(result.counts.display_max, 200);

    let json = engine.render_for_request(&probe, 0, true);
    assert_eq!(json.variant_id, "build");
    assert_eq!(json.dialect, Dialect::Json);
    assert_eq!(json.plain, "Build contest");
}

#[test]
fn rainbow_and_gradient_presets_render_as_markup() {
    let engine = engine();
    let preview = engine
        .preview("welcome", Some("198.51.100.4"), 0)
        .expect("variant exists");
    assert_eq!(preview.reason, SelectionReason::Forced);
    assert!(!preview.fallback_used);
    assert_eq!(preview.dialect, Dialect::TagMarkup);
    assert_eq!(preview.lines[0], "Welcome to the lobby");
    assert_eq!(preview.icon.as_deref(), Some("icons/welcome.png"));

    let spans = preview.rich.spans();
    assert!(spans[0].style.bold);
    assert_eq!(spans[0].style.color, Some(Color::Rgb(0xff0000)));
    let lobby_start = spans
        .iter()
        .rposition(|span| span.text == "l")
        .expect("gradient splits per character");
    assert_eq!(spans[lobby_start].style.color, Some(Color::Rgb(0x55ffff)));
}

#[test]
fn unknown_tag_falls_back_to_plain_text() {
    let raw = "<sparkle>Shiny</sparkle> lobby";
    let result = parse(raw, DialectPreference::Auto);
    assert!(result.fallback_used);
    assert_eq!(result.dialect, Dialect::Plain);
    assert_eq!(result.rich.to_plain(), raw);
}

#[test]
fn per_origin_animation_pins_frame_for_sticky_window() {
    let engine = engine();
    let sparkle = engine
        .preview("sparkle", Some("198.51.100.4"), 0)
        .expect("variant exists");
    assert!(matches!(sparkle.frame, FrameSlot::Animated(_)));
    assert_eq!(sparkle.lines[1], format!("frame {}", sparkle.frame.index()));

    let probe = Probe::new(1, 10).with_origin("198.51.100.77");
    let first = engine.render_for_request(&probe, 50_000, true);
    for now in [50_450, 51_000, 59_000] {
        let again = engine.render_for_request(&probe, now, true);
        assert_eq!(again.variant_id, first.variant_id);
        assert_eq!(again.frame, first.frame);
    }
}

#[test]
fn hidden_counts_and_hashed_profile() {
    let engine = engine();
    let probe = Probe::new(4, 40).with_group("classic").with_origin("192.0.2.1");
    let result = engine.render_for_request(&probe, 0, false);
    assert_eq!(result.reason, SelectionReason::Hashed);
    assert!(result.counts.hidden && result.counts.hover_disabled);
    assert_eq!(result.dialect, Dialect::LegacyCodes);
    assert_eq!(result.icon.as_deref(), Some("icons/default.png"));
}
