//! Jumping.
//!
//! A jump is two-phase. Pressing jump on a jump surface enters a short
//! crouch; when the crouch delay runs out (or the ground disappears from
//! under the player) the impulse fires. A running jump also redirects the
//! horizontal velocity along the move direction so every jump carries the
//! same momentum.
//!
//! A jump jet, when configured, adds upward thrust for a short window after
//! leaving the ground.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::constants::{JUMP_SKIP_CONTACTS_MAX, TICK_MS, TICK_SEC};
use super::controller::{MoveFrame, PlayerController};
use super::events::{EventSink, LocomotionEvent, SoundCue};
use super::pose::Pose;
use super::state::{MoveCommand, PlayerBody};
use crate::geometry::{angles_from_vector, with_length};

/// Speed from which a jump without directional input is still a running jump.
const RUN_JUMP_SPEED: f32 = 3.0;

/// Kind of jump, chosen when the crouch starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpType {
    /// Moving or pushing a direction: long, low jump.
    #[default]
    Run,

    /// Standing still: the body freezes during a longer crouch.
    Stand,
}

impl JumpType {
    /// Wire index.
    pub fn index(self) -> u8 {
        match self {
            JumpType::Run => 0,
            JumpType::Stand => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(JumpType::Run),
            1 => Some(JumpType::Stand),
            _ => None,
        }
    }
}

/// Progress of the current jump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpState {
    /// From the start of the crouch until the body next runs on ground.
    pub active: bool,

    /// Winding up; the impulse has not fired yet.
    pub is_crouching: bool,

    /// Remaining wind-up (ms).
    pub crouch_delay: f32,

    pub jump_type: JumpType,
}

impl PlayerController {
    pub fn can_jump(&self, body: &PlayerBody) -> bool {
        self.can_act(body)
            && body.jump_delay == 0
            && body.energy >= self.config.min_jump_energy
            && body.jump_surface_last_contact < JUMP_SKIP_CONTACTS_MAX
            && !body.swimming
            && (body.pose != Pose::Sprint || self.config.sprint_can_jump)
            && !body.jump.active
    }

    pub fn can_jet_jump(&self, body: &PlayerBody) -> bool {
        self.can_act(body)
            && body.energy >= self.config.jet_min_jump_energy
            && self.config.jet_jump_force != 0.0
            && body.jumping
            && body.contact_timer < self.config.jet_time_ms()
    }

    /// Count ticks on and off jump surfaces. Gates how soon after touching
    /// down the next jump may start.
    fn track_jump_surface(&self, body: &mut PlayerBody) {
        if body.jump_surface {
            body.jump_delay = body.jump_delay.saturating_sub(1);
            body.jump_surface_last_contact = 0;
        } else {
            body.jump_surface_last_contact = body.jump_surface_last_contact.saturating_add(1);
        }
    }

    /// Start, wind up and fire jumps.
    pub(super) fn update_jump(
        &self,
        body: &mut PlayerBody,
        command: &MoveCommand,
        frame: &mut MoveFrame,
        events: &mut dyn EventSink,
    ) {
        let config = &self.config;

        if command.jump() && !body.mounted {
            if self.can_jump(body) && !body.jump.active {
                let jump_type = if frame.move_vec.length() > 0.0 || frame.start_speed >= RUN_JUMP_SPEED {
                    JumpType::Run
                } else {
                    JumpType::Stand
                };
                body.jump = JumpState {
                    active: true,
                    is_crouching: true,
                    crouch_delay: match jump_type {
                        JumpType::Run => config.run_jump_crouch_delay,
                        JumpType::Stand => config.stand_jump_crouch_delay,
                    },
                    jump_type,
                };
                body.action.cancel();
                frame.action_changed = true;
                log::debug!("jump crouch started: {:?}", jump_type);
            } else {
                self.track_jump_surface(body);
            }
        }

        if !(body.jump.active && body.jump.is_crouching) {
            self.track_jump_surface(body);
            return;
        }

        body.jump.crouch_delay -= TICK_MS as f32;

        if body.jump.jump_type == JumpType::Stand {
            body.velocity = Vec3::ZERO;
            frame.acc = Vec3::ZERO;
        }

        // Fire on timeout, or straight away when running off an edge
        if body.jump.crouch_delay > 0.0 && body.jump_surface {
            return;
        }

        body.jump.is_crouching = false;
        body.jumping = true;

        let vz = body.velocity.z;
        if vz <= config.max_jump_speed {
            let z_scale = if vz <= config.min_jump_speed {
                1.0
            } else {
                1.0 - (vz - config.min_jump_speed) / (config.max_jump_speed - config.min_jump_speed)
            };
            // Smaller bodies jump higher relative to their size
            let size_scale = body.scale.z * 0.25 + 0.75;
            frame.acc.z += size_scale * (config.jump_force / config.mass) * z_scale;
        }

        if body.jump.jump_type == JumpType::Run {
            let direction = if frame.move_vec.length() > 0.0 {
                if !body.first_person {
                    body.rotation.z = angles_from_vector(frame.move_vec).0;
                }
                frame.move_vec
            } else {
                body.forward()
            };

            if body.velocity.length() < config.max_forward_speed {
                body.velocity = with_length(body.velocity, config.max_forward_speed);
            }
            let speed = body.velocity.length().max(config.max_forward_speed);
            let push = with_length(direction, speed);

            body.velocity.x = 0.0;
            body.velocity.y = 0.0;
            frame.acc.x = push.x;
            frame.acc.y = push.y;

            // Downhill run-ups would otherwise give weak jumps
            body.velocity.z = body.velocity.z.max(0.0);
        }

        body.jump_delay = config.jump_delay;
        body.energy -= config.jump_energy_drain;
        body.jump_surface_last_contact = JUMP_SKIP_CONTACTS_MAX;

        let jump_type = body.jump.jump_type;
        log::debug!("jump fired: {:?} at {:?}", jump_type, body.position);
        events.emit(LocomotionEvent::Jumped(jump_type));
        events.emit(LocomotionEvent::Sound(SoundCue::Jump));
    }

    /// Apply jump-jet thrust while the jet trigger is held.
    pub(super) fn update_jet(&self, body: &mut PlayerBody, command: &MoveCommand, frame: &mut MoveFrame) {
        let config = &self.config;

        if command.jump_jet() && !body.mounted && self.can_jet_jump(body) {
            body.jetting = true;

            let vz = body.velocity.z;
            if vz <= config.jet_max_jump_speed && vz >= config.jet_min_jump_speed {
                frame.acc.z += config.jet_jump_force / config.mass * TICK_SEC;
                body.energy -= config.jet_jump_energy_drain;
            }
        } else {
            body.jetting = false;
        }

        if body.jetting {
            body.energy -= config.min_jump_energy;
            if body.energy < 0.0 {
                body.energy = 0.0;
                body.jetting = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::config::PlayerConfig;
    use crate::movement::state::CommandTriggers;

    fn jump_command(move_vec: Vec3) -> MoveCommand {
        let mut cmd = MoveCommand {
            move_vec,
            ..Default::default()
        };
        cmd.triggers.press(CommandTriggers::JUMP);
        cmd
    }

    fn grounded(controller: &PlayerController) -> PlayerBody {
        let mut body = PlayerBody::new(Vec3::ZERO, controller.config());
        body.jump_surface = true;
        body.run_surface = true;
        body
    }

    fn frame_for(command: &MoveCommand) -> MoveFrame {
        MoveFrame {
            move_vec: command.move_vec,
            ..Default::default()
        }
    }

    #[test]
    fn test_jump_type_index_round_trip() {
        for jump_type in [JumpType::Run, JumpType::Stand] {
            assert_eq!(JumpType::from_index(jump_type.index()), Some(jump_type));
        }
        assert_eq!(JumpType::from_index(2), None);
    }

    #[test]
    fn test_can_jump_guards() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut body = grounded(&controller);
        assert!(controller.can_jump(&body));

        body.jump_delay = 1;
        assert!(!controller.can_jump(&body));
        body.jump_delay = 0;

        body.jump_surface_last_contact = JUMP_SKIP_CONTACTS_MAX;
        assert!(!controller.can_jump(&body));
        body.jump_surface_last_contact = 0;

        body.swimming = true;
        assert!(!controller.can_jump(&body));
        body.swimming = false;

        body.jump.active = true;
        assert!(!controller.can_jump(&body));
    }

    #[test]
    fn test_stand_jump_freezes_then_fires() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut body = grounded(&controller);
        let cmd = jump_command(Vec3::ZERO);
        let mut events = Vec::new();

        let mut frame = frame_for(&cmd);
        controller.update_jump(&mut body, &cmd, &mut frame, &mut events);
        assert!(body.jump.active && body.jump.is_crouching);
        assert_eq!(body.jump.jump_type, JumpType::Stand);
        assert!(events.is_empty());

        // 400 ms wind-up in 32 ms ticks fires on the 13th
        let mut ticks = 1;
        while body.jump.is_crouching {
            body.velocity = Vec3::new(0.5, 0.0, 0.0);
            frame = frame_for(&cmd);
            controller.update_jump(&mut body, &cmd, &mut frame, &mut events);
            ticks += 1;
            if body.jump.is_crouching {
                assert_eq!(body.velocity, Vec3::ZERO);
            }
        }
        assert_eq!(ticks, 13);
        assert!(body.jumping);
        assert!((frame.acc.z - 8.0).abs() < 1e-4);
        assert_eq!(body.jump_delay, controller.config().jump_delay);
        assert_eq!(body.jump_surface_last_contact, JUMP_SKIP_CONTACTS_MAX);
        assert_eq!(
            events,
            vec![
                LocomotionEvent::Jumped(JumpType::Stand),
                LocomotionEvent::Sound(SoundCue::Jump)
            ]
        );
    }

    #[test]
    fn test_coasting_at_run_jump_speed_is_a_run_jump() {
        let controller = PlayerController::new(PlayerConfig::default());
        let cmd = jump_command(Vec3::ZERO);

        let mut body = grounded(&controller);
        let mut frame = MoveFrame {
            start_speed: RUN_JUMP_SPEED,
            ..frame_for(&cmd)
        };
        controller.update_jump(&mut body, &cmd, &mut frame, &mut ());
        assert_eq!(body.jump.jump_type, JumpType::Run);

        let mut body = grounded(&controller);
        let mut frame = MoveFrame {
            start_speed: RUN_JUMP_SPEED - 0.1,
            ..frame_for(&cmd)
        };
        controller.update_jump(&mut body, &cmd, &mut frame, &mut ());
        assert_eq!(body.jump.jump_type, JumpType::Stand);
    }

    #[test]
    fn test_run_jump_pushes_along_move_direction() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut body = grounded(&controller);
        body.velocity = Vec3::new(0.0, 2.0, 0.0);
        let cmd = jump_command(Vec3::X);
        let mut events = Vec::new();

        let mut frame = frame_for(&cmd);
        controller.update_jump(&mut body, &cmd, &mut frame, &mut events);
        assert_eq!(body.jump.jump_type, JumpType::Run);

        // Walking off the edge fires the jump at once
        body.jump_surface = false;
        frame = frame_for(&cmd);
        controller.update_jump(&mut body, &cmd, &mut frame, &mut events);
        assert!(body.jumping);

        let speed = controller.config().max_forward_speed;
        assert!((frame.acc.x - speed).abs() < 1e-4);
        assert!(frame.acc.y.abs() < 1e-4);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.rotation.z - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_jump_delay_counts_down_on_jump_surface() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut body = grounded(&controller);
        body.jump_delay = 3;
        let mut frame = MoveFrame::default();

        controller.update_jump(&mut body, &MoveCommand::default(), &mut frame, &mut ());
        assert_eq!(body.jump_delay, 2);

        body.jump_surface = false;
        body.jump_surface_last_contact = 0;
        controller.update_jump(&mut body, &MoveCommand::default(), &mut frame, &mut ());
        assert_eq!(body.jump_delay, 2);
        assert_eq!(body.jump_surface_last_contact, 1);
    }

    #[test]
    fn test_jet_needs_force_and_window() {
        let config = PlayerConfig {
            jet_jump_force: 900.0,
            jet_min_jump_speed: -5.0,
            jet_max_jump_speed: 5.0,
            ..Default::default()
        };
        let controller = PlayerController::new(config);
        let mut body = grounded(&controller);
        body.jumping = true;
        body.contact_timer = 64;

        let mut cmd = MoveCommand::default();
        cmd.triggers.press(CommandTriggers::JUMP_JET);
        let mut frame = MoveFrame::default();
        controller.update_jet(&mut body, &cmd, &mut frame);
        assert!(body.jetting);
        assert!((frame.acc.z - 900.0 / 90.0 * TICK_SEC).abs() < 1e-5);

        // Past the jet window
        body.contact_timer = 1000;
        let mut frame = MoveFrame::default();
        controller.update_jet(&mut body, &cmd, &mut frame);
        assert!(!body.jetting);
        assert_eq!(frame.acc, Vec3::ZERO);
    }
}
