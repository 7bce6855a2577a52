use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;
use grove_core::{FrameClock, GestureState, Key, PointerEvent};
use grove_game::replay::load_replay_from_path;
use grove_game::world::{demo_world, Placement, PlayerStart, WorldCamera, WorldFile};
use grove_game::{FrameInput, FrameReport, SimConfig, Simulation};
use grove_render::{RecordingSink, SinkCommand, SurfaceMetrics};

fn temp_file_path(name_hint: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "grove_pipeline_test_{}_{}_{}.json",
        name_hint,
        std::process::id(),
        nanos
    ))
}

fn metrics() -> SurfaceMetrics {
    SurfaceMetrics::new(Vec2::ZERO, Vec2::new(1280.0, 720.0), 1.0)
}

fn run(world: &WorldFile, inputs: &[FrameInput]) -> Vec<FrameReport> {
    let mut sim = Simulation::new(SimConfig::default(), world, metrics());
    let mut clock = FrameClock::new();
    let mut sink = RecordingSink::new();
    inputs
        .iter()
        .filter_map(|input| sim.step(&mut clock, input, &mut sink))
        .collect()
}

fn walk(held: &[Key], frames: usize) -> Vec<FrameInput> {
    (0..frames)
        .map(|_| FrameInput {
            delta_ms: 16.0,
            held: held.to_vec(),
            pointer: Vec::new(),
        })
        .collect()
}

#[test]
fn replay_run_is_deterministic() {
    let path = temp_file_path("deterministic");
    fs::write(
        &path,
        r#"{
          "frames": [
            { "keys": ["d"], "repeat": 90 },
            { "keys": ["d", "s"], "delta_ms": 33, "repeat": 30 },
            { "keys": ["ArrowLeft"], "pointer": [ { "type": "down", "x": 640, "y": 360 } ], "repeat": 2 },
            { "pointer": [ { "type": "up", "x": 640, "y": 360 } ], "repeat": 40 }
          ]
        }"#,
    )
    .expect("write replay file");

    let replay = load_replay_from_path(&path).expect("replay should load");
    let inputs = replay.expanded_inputs();
    let world = demo_world();

    let run_a = run(&world, &inputs);
    let run_b = run(&world, &inputs);
    assert_eq!(run_a.len(), inputs.len());
    assert_eq!(run_a, run_b);

    let _ = fs::remove_file(path);
}

#[test]
fn walking_across_loot_fills_inventory_in_order() {
    let loot: Vec<Placement> = (0..7)
        .map(|i| Placement {
            x: 200.0 + i as f32 * 100.0,
            y: 40.0,
            width: None,
            height: None,
        })
        .collect();
    let world = WorldFile {
        version: "0.1".to_string(),
        world_id: "trail".to_string(),
        bounds: None,
        player: PlayerStart { x: 0.0, y: 0.0 },
        camera: WorldCamera::default(),
        trees: Vec::new(),
        loot,
        sprites: Vec::new(),
    };

    // 0.3 units/ms * 16ms * 250 frames = 1200 units to the right
    let reports = run(&world, &walk(&[Key::ArrowRight], 250));
    let picked: usize = reports.iter().map(|r| r.picked_up.len()).sum();
    assert_eq!(picked, 5);

    let last = reports.last().expect("frames ran");
    assert!(last.player.x > 1100.0);
}

#[test]
fn camera_keeps_player_in_view_while_walking() {
    let world = demo_world();
    let reports = run(&world, &walk(&[Key::D], 300));
    for report in &reports {
        let view = grove_core::math::Rect::from_min_size(report.camera, Vec2::new(1280.0, 720.0));
        assert!(
            view.overlaps(&report.player),
            "player left the view at frame {}",
            report.frame
        );
    }
}

#[test]
fn gesture_drag_path_through_simulation() {
    let world = demo_world();
    let mut sim = Simulation::new(SimConfig::default(), &world, metrics());
    let mut sink = RecordingSink::new();
    let mut clock = FrameClock::new();

    let mut frame = |pointer: Vec<PointerEvent>, sim: &mut Simulation| {
        let input = FrameInput {
            delta_ms: 16.0,
            held: Vec::new(),
            pointer,
        };
        sim.step(&mut clock, &input, &mut sink)
            .map(|r| r.gesture)
            .expect("frame runs")
    };

    assert_eq!(
        frame(vec![PointerEvent::Down { x: 100.0, y: 100.0 }], &mut sim),
        GestureState::Hold
    );
    assert_eq!(
        frame(vec![PointerEvent::Move { x: 120.0, y: 100.0 }], &mut sim),
        GestureState::HoldMove
    );
    assert_eq!(
        frame(vec![PointerEvent::Up { x: 120.0, y: 100.0 }], &mut sim),
        GestureState::Idle
    );

    let history: Vec<GestureState> = sim.gesture().history().collect();
    assert_eq!(
        history,
        vec![
            GestureState::Idle,
            GestureState::HoldDown,
            GestureState::Hold,
            GestureState::HoldMove,
            GestureState::HoldUp,
            GestureState::Idle,
        ]
    );
}

#[test]
fn every_frame_is_wrapped_in_the_view_transform() {
    let world = demo_world();
    let mut sim = Simulation::new(SimConfig::default(), &world, metrics());
    let mut sink = RecordingSink::new();
    let mut clock = FrameClock::new();
    sim.step(&mut clock, &walk(&[], 1)[0], &mut sink)
        .expect("frame runs");

    let origin = sim.camera().view_transform().origin;
    assert_eq!(
        &sink.commands[..4],
        &[
            SinkCommand::Clear {
                width: 1280.0,
                height: 720.0
            },
            SinkCommand::Save,
            SinkCommand::Scale { sx: 1.0, sy: 1.0 },
            SinkCommand::Translate {
                dx: -origin.x,
                dy: -origin.y
            },
        ]
    );
    assert_eq!(sink.commands.last(), Some(&SinkCommand::Restore));
}
