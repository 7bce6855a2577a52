//! Headless simulation harness.
//!
//! Usage:
//!   grove_game [--world <path>] [--config <path>] [--replay <path>]
//!
//! Without `--world` a built-in grove layout is used; without `--replay` a
//! short scripted walk is played. Every frame is composited onto a recording
//! sink and a summary is logged at the end.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use glam::Vec2;
use grove_core::{FrameClock, Key, PointerEvent};
use grove_game::config::load_config_from_path;
use grove_game::replay::load_replay_from_path;
use grove_game::world::{demo_world, load_world_from_path};
use grove_game::{FrameInput, LoadError, SimConfig, Simulation};
use grove_render::{RecordingSink, SurfaceMetrics};

const SURFACE_WIDTH: f32 = 1280.0;
const SURFACE_HEIGHT: f32 = 720.0;
const DEMO_DELTA_MS: f64 = 1000.0 / 60.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), LoadError> {
    let config = match arg_value(args, "--config") {
        Some(path) => load_config_from_path(Path::new(path))?,
        None => SimConfig::default(),
    };
    let world = match arg_value(args, "--world") {
        Some(path) => load_world_from_path(Path::new(path))?,
        None => demo_world(),
    };
    let inputs = match arg_value(args, "--replay") {
        Some(path) => load_replay_from_path(Path::new(path))?.expanded_inputs(),
        None => demo_inputs(),
    };

    log::info!(
        "Running world '{}' for {} frames",
        world.world_id,
        inputs.len()
    );

    let metrics = SurfaceMetrics::new(
        Vec2::ZERO,
        Vec2::new(SURFACE_WIDTH, SURFACE_HEIGHT),
        1.0,
    );
    let mut clock = FrameClock::with_max_delta(config.max_delta_ms);
    let mut sim = Simulation::new(config, &world, metrics);
    let mut sink = RecordingSink::new();

    let mut picked_total = 0usize;
    let mut draws_total = 0usize;
    let mut binds_total = 0usize;
    for input in &inputs {
        sink.reset();
        let Some(report) = sim.step(&mut clock, input, &mut sink) else {
            break;
        };
        picked_total += report.picked_up.len();
        draws_total += report.render.drawn;
        binds_total += sink.sprite_binds();

        if report.frame % 60 == 0 {
            log::info!(
                "frame {:>5} t={:>8.1}ms player=({:.1}, {:.1}) camera=({:.1}, {:.1}) visible={}T/{}L gesture={}",
                report.frame,
                report.elapsed_ms,
                report.player.x,
                report.player.y,
                report.camera.x,
                report.camera.y,
                report.visible_trees,
                report.visible_loot,
                report.gesture
            );
        }
    }

    log::info!(
        "Finished {} frames in {:.1}ms simulated: picked up {} loot ({} in inventory), {} draws, {} sprite binds, {:.1} fps avg",
        sim.frame_count(),
        clock.elapsed_ms,
        picked_total,
        sim.inventory().len(),
        draws_total,
        binds_total,
        clock.smoothed_fps
    );
    sim.teardown();
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .skip_while(|a| a.as_str() != flag)
        .nth(1)
        .map(String::as_str)
}

/// A walk around the start position with one click in the middle.
fn demo_inputs() -> Vec<FrameInput> {
    let legs: [(&[Key], usize); 5] = [
        (&[Key::D], 150),
        (&[Key::S, Key::D], 60),
        (&[Key::ArrowLeft], 90),
        (&[Key::W], 60),
        (&[], 60),
    ];
    let mut inputs = Vec::new();
    for (held, frames) in legs {
        for _ in 0..frames {
            inputs.push(FrameInput {
                delta_ms: DEMO_DELTA_MS,
                held: held.to_vec(),
                pointer: Vec::new(),
            });
        }
    }

    let click_at = Vec2::new(SURFACE_WIDTH * 0.5, SURFACE_HEIGHT * 0.5);
    if let Some(frame) = inputs.get_mut(200) {
        frame.pointer.push(PointerEvent::Down {
            x: click_at.x,
            y: click_at.y,
        });
    }
    if let Some(frame) = inputs.get_mut(202) {
        frame.pointer.push(PointerEvent::Up {
            x: click_at.x,
            y: click_at.y,
        });
    }
    inputs
}
