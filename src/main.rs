//! Strider - headless traversal course runner
//!
//! Spawns one player at the start of every test course, drives them with a
//! scripted input, mirrors the first player through the wire codec the way
//! a remote client would see it, and logs what happens.
//!
//! Usage: `strider [config.json]`. Set `RUST_LOG=debug` for state changes.

use std::process::ExitCode;
use std::sync::Arc;

use glam::Vec3;
use strider_game::{Authority, Course, Level, Player, PlayerInput, Simulation, SimulationConfig};
use strider_physics::movement::constants::TICK_SEC;
use strider_protocol::{decode_update, encode};

/// Frame time of the fake renderer.
const FRAME_SEC: f32 = 1.0 / 60.0;

/// Length of the run.
const RUN_SEC: f32 = 4.0;

/// Input for the player on `course` at `tick`.
fn scripted_input(course: Course, tick: u64) -> PlayerInput {
    let mut input = PlayerInput::default();
    input.movement.forward = true;

    match course {
        // Jump at the wall to grab the ledge, then keep pushing to climb up
        Course::Ledge => input.actions.jump = tick == 12,
        Course::ClimbWall => input.actions.jump = tick == 10,
        Course::SlideSlope => input.actions.sprint = true,
        Course::WallHug => input.movement.right = tick > 20,
        Course::FlatFloor => input.actions.crouch = (40..60).contains(&tick),
        Course::Stairs | Course::WaterPool => {}
    }
    input
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };

    let level = Level::test_course();
    let courses = level.courses.clone();
    let mut simulation = Simulation::new(config, level);
    for course in &courses {
        simulation.add_player(course.name());
    }

    // Remote copy of the first player, fed only by delta updates
    let Some(first) = simulation.players.first() else {
        log::error!("level has no spawn points");
        return ExitCode::FAILURE;
    };
    let mut mirror = Player::new(
        first.id,
        format!("{} (mirror)", first.name),
        first.position(),
        Arc::clone(simulation.controller()),
    )
    .with_authority(Authority::Client)
    .with_replication(simulation.config.replication);

    log::info!(
        "running {} players for {:.1}s at {:.0} ms ticks",
        simulation.players.len(),
        RUN_SEC,
        TICK_SEC * 1000.0
    );

    let frames = (RUN_SEC / FRAME_SEC) as u32;
    let mut poses: Vec<_> = simulation.players.iter().map(|p| p.body.pose).collect();

    for _ in 0..frames {
        let inputs: Vec<_> = courses
            .iter()
            .map(|&course| scripted_input(course, simulation.frame))
            .collect();
        let ticks = simulation.advance(FRAME_SEC, &inputs);

        for (id, event) in simulation.drain_events() {
            log::info!("[{}] {:?}", id, event);
        }
        for (player, pose) in simulation.players.iter().zip(poses.iter_mut()) {
            if player.body.pose != *pose {
                log::info!("[{}] pose {:?} -> {:?}", player.id, pose, player.body.pose);
                *pose = player.body.pose;
            }
        }

        if ticks > 0 {
            let Some(server) = simulation.players.first_mut() else {
                break;
            };
            if let Some(update) = server.take_update() {
                let received = encode(&update).and_then(|bytes| decode_update(&bytes));
                if let Err(e) = received.and_then(|update| mirror.unpack_update(&update)) {
                    log::warn!("mirror rejected update: {}", e);
                }
            }
            for _ in 0..ticks {
                mirror.process_tick(&Default::default(), &simulation.level.collision, &mut ());
            }
        }
        mirror.advance_time(FRAME_SEC);
        simulation.render_states();
    }

    for player in &simulation.players {
        log::info!(
            "{:>12}: pos {:>6.2} {:>6.2} {:>6.2}  pose {:?}  action {:?}  grounded {}",
            player.name,
            player.position().x,
            player.position().y,
            player.position().z,
            player.body.pose,
            player.body.action.action,
            player.body.is_grounded()
        );
    }

    if let Some(server) = simulation.players.first() {
        let drift: Vec3 = mirror.position() - server.position();
        log::info!("mirror drift {:.3} m", drift.length());
    }

    ExitCode::SUCCESS
}
