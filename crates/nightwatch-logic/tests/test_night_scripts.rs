//! Integration tests: nights built from JSON scripts through the in-memory
//! asset loader and driven tick by tick.
//!
//! Uses the bundled first night from `data/` plus small inline scripts.

use nightwatch_logic::assets::{AssetManifest, MemoryAssets};
use nightwatch_logic::night::{Night, NightEvent, NightOutcome, PlayerInput, TickReport, View};
use nightwatch_logic::registry::AgentRegistry;
use nightwatch_logic::script::NightScript;
use nightwatch_logic::store::{KeyValueStore, MemoryStore};

const NIGHT1: &str = include_str!("../../../data/night1.json");
const NIGHT1_ASSETS: &str = include_str!("../../../data/night1_assets.json");

/// One door camera, one stalker standing at it.
const DOORWAY: &str = r#"{
    "name": "doorway",
    "duration_seconds": 60,
    "seed": 3,
    "map_image": "map.png",
    "start_camera": "door",
    "cameras": [
        { "name": "door", "background": "door.png",
          "region": { "x": 0, "y": 0, "width": 10, "height": 10 },
          "left_door": true }
    ],
    "agents": [
        { "name": "freddy", "kind": "stalker", "start_camera": "door",
          "patience_seconds": 1.0,
          "jumpscare": { "gif": "freddy.gif", "sound": "scream.ogg" } }
    ]
}"#;

const DOORWAY_ASSETS: &str = r#"{
    "images": ["map.png", "door.png"],
    "gifs": { "freddy.gif": [ { "delay_seconds": 0.05 }, { "delay_seconds": 0.05 } ] },
    "sounds": ["scream.ogg"]
}"#;

// ── Helpers ────────────────────────────────────────────────────────────

fn assets(manifest_json: &str) -> MemoryAssets {
    let manifest: AssetManifest = serde_json::from_str(manifest_json).unwrap();
    MemoryAssets::from_manifest(&manifest)
}

fn night1(seed: u64) -> (Night, MemoryAssets) {
    let mut script = NightScript::from_json(NIGHT1).unwrap();
    script.seed = Some(seed);
    let assets = assets(NIGHT1_ASSETS);
    let night = script.build(&assets, &AgentRegistry::builtin()).unwrap();
    (night, assets)
}

fn doors_closed() -> PlayerInput {
    PlayerInput {
        left_door_open: false,
        right_door_open: false,
        cams_up: false,
    }
}

fn run(night: &mut Night, input: PlayerInput, max_ticks: u64) -> Vec<TickReport> {
    let mut reports = Vec::new();
    for _ in 0..max_ticks {
        let report = night.tick(input).unwrap();
        let done = report.outcome.is_some();
        reports.push(report);
        if done {
            break;
        }
    }
    reports
}

// ── Bundled night ──────────────────────────────────────────────────────

#[test]
fn bundled_night_builds() {
    let (night, _assets) = night1(1);
    assert_eq!(night.cameras().len(), 11);
    assert_eq!(night.agents().len(), 4);
    assert_eq!(night.config().duration_ticks, 360 * 60);
    assert_eq!(night.location_of("freddy"), Some("stage"));
    assert_eq!(night.location_of("foxy"), Some("pirate_cove"));
    assert_eq!(night.cameras().selected_camera().name(), "stage");
}

#[test]
fn same_seed_same_night() {
    let (mut a, _assets_a) = night1(99);
    let (mut b, _assets_b) = night1(99);
    let reports_a = run(&mut a, PlayerInput::default(), 6000);
    let reports_b = run(&mut b, PlayerInput::default(), 6000);
    assert_eq!(reports_a, reports_b);
}

#[test]
fn closed_doors_survive_the_night() {
    let (mut night, _assets) = night1(12);
    let reports = run(&mut night, doors_closed(), 360 * 60 + 1);
    let last = reports.last().unwrap();
    assert_eq!(last.outcome, Some(NightOutcome::Completed));
    assert_eq!(last.tick, 360 * 60 - 1);
    assert!(!reports
        .iter()
        .flat_map(|r| &r.events)
        .any(|e| matches!(e, NightEvent::JumpscareStarted { .. })));
}

#[test]
fn agents_only_walk_connections() {
    let (mut night, _assets) = night1(5);
    let reports = run(&mut night, doors_closed(), 360 * 60);
    let mut moves = 0;
    for event in reports.iter().flat_map(|r| &r.events) {
        if let NightEvent::AgentMoved { from, to, agent } = event {
            let links = night.cameras().connections(from).unwrap();
            assert!(links.contains(to), "{agent}: {from} -> {to}");
            moves += 1;
        }
    }
    assert!(moves > 0);
}

#[test]
fn phone_call_captions_follow_the_call() {
    let (mut night, assets) = night1(8);
    for tick in 0..30 {
        let report = night.tick(doors_closed()).unwrap();
        assert_eq!(report.subtitle, None, "tick {tick}");
    }
    let report = night.tick(doors_closed()).unwrap();
    assert_eq!(report.subtitle.as_deref(), Some("Hello? Hello, hello?"));

    let call = assets.sound("sounds/phone_night1.ogg").unwrap();
    assert_eq!(call.play_count(), 1);
    assert!(call.is_playing());

    night.mute_call();
    assert!(!call.is_playing());
    let report = night.tick(doors_closed()).unwrap();
    assert_eq!(report.subtitle, None);
}

#[test]
fn map_clicks_select_cameras() {
    let (mut night, _assets) = night1(2);
    assert_eq!(night.select_at(215, 130).unwrap(), None);
    assert_eq!(night.select_at(205, 230).unwrap(), Some("east_corner"));
    let report = night.tick(PlayerInput {
        cams_up: true,
        ..doors_closed()
    })
    .unwrap();
    match report.view {
        View::CameraFeed {
            camera, cams_up, ..
        } => {
            assert_eq!(camera, "east_corner");
            assert!(cams_up);
        }
        other => panic!("expected camera feed, got {other:?}"),
    }
}

#[test]
fn ambient_cues_respect_the_interval() {
    let (mut night, assets) = night1(21);
    let mut cue_ticks = Vec::new();
    for _ in 0..360 * 60 {
        let report = night.tick(doors_closed()).unwrap();
        if report
            .events
            .iter()
            .any(|e| matches!(e, NightEvent::AmbientCue { .. }))
        {
            cue_ticks.push(report.tick);
            // Let the cue end so the next interval can fire
            assets.sound("ambient/drip.ogg").unwrap().finish();
            assets.sound("ambient/footsteps.ogg").unwrap().finish();
            assets.sound("ambient/laugh.ogg").unwrap().finish();
        }
    }
    assert!(!cue_ticks.is_empty());
    assert!(cue_ticks.iter().all(|t| t % 600 == 0), "{cue_ticks:?}");
}

// ── Jumpscare to failure ───────────────────────────────────────────────

#[test]
fn open_door_ends_in_failure_after_scream() {
    let script = NightScript::from_json(DOORWAY).unwrap();
    let assets = assets(DOORWAY_ASSETS);
    let mut night = script.build(&assets, &AgentRegistry::builtin()).unwrap();

    let reports = run(&mut night, PlayerInput::default(), 61);
    let trigger = reports.last().unwrap();
    assert_eq!(trigger.tick, 60);
    assert!(trigger.events.contains(&NightEvent::JumpscareStarted {
        agent: "freddy".into()
    }));
    assert!(night.cams_locked());

    // Frames run out long before the scream does
    let reports = run(&mut night, PlayerInput::default(), 30);
    assert!(reports.iter().all(|r| r.outcome.is_none()));
    match &reports.last().unwrap().view {
        View::Jumpscare { agent, frames, .. } => {
            assert_eq!(agent, "freddy");
            let keys: Vec<&str> = frames.iter().map(|f| f.key()).collect();
            assert_eq!(keys, ["freddy.gif#0", "freddy.gif#1"]);
        }
        other => panic!("expected jumpscare, got {other:?}"),
    }

    assert_eq!(assets.finish_playing(), 1);
    let report = night.tick(PlayerInput::default()).unwrap();
    assert_eq!(report.outcome, Some(NightOutcome::Failed));

    let mut store = MemoryStore::new();
    report.outcome.unwrap().record(&mut store, "doorway").unwrap();
    assert_eq!(store.get_count("doorway.attempts"), 1);
    assert_eq!(store.get_count("doorway.completed"), 0);
}

#[test]
fn shutdown_silences_a_running_jumpscare() {
    let script = NightScript::from_json(DOORWAY).unwrap();
    let assets = assets(DOORWAY_ASSETS);
    let mut night = script.build(&assets, &AgentRegistry::builtin()).unwrap();
    run(&mut night, PlayerInput::default(), 61);

    let scream = assets.sound("scream.ogg").unwrap();
    assert!(scream.is_playing());
    night.shutdown();
    assert!(!scream.is_playing());
}
