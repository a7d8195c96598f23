//! Player input handling.
//!
//! This module converts raw input (keyboard, mouse, gamepad) into
//! commands for the physics system. Directional keys are relative to the
//! camera, so the conversion needs the camera's yaw.

use serde::{Deserialize, Serialize};
use strider_physics::geometry::{forward_from_yaw, right_from_yaw};
use strider_physics::movement::{CommandTriggers, MoveCommand};

/// Raw player input for a single frame.
///
/// This is the input format received from the client input system.
/// It gets converted to [`MoveCommand`] for the physics system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Movement keys pressed.
    pub movement: MovementInput,

    /// Mouse delta this frame (pixels).
    pub mouse_delta: (f32, f32),

    /// Action buttons pressed.
    pub actions: ActionInput,

    /// Frame number this input was generated.
    pub frame: u32,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActionInput {
    pub jump: bool,

    /// Jet, and the "let go" button for climbing.
    pub jump_jet: bool,

    pub crouch: bool,
    pub prone: bool,
    pub sprint: bool,

    /// Look around without turning the body.
    pub freelook: bool,
}

impl PlayerInput {
    /// Convert to a physics command.
    ///
    /// # Arguments
    ///
    /// * `camera_yaw` - Yaw the directional keys are relative to
    /// * `mouse_sensitivity` - Mouse sensitivity multiplier
    pub fn to_command(&self, camera_yaw: f32, mouse_sensitivity: f32) -> MoveCommand {
        let mut forward_move = 0.0;
        let mut right_move = 0.0;

        if self.movement.forward {
            forward_move += 1.0;
        }
        if self.movement.backward {
            forward_move -= 1.0;
        }
        if self.movement.right {
            right_move += 1.0;
        }
        if self.movement.left {
            right_move -= 1.0;
        }

        let mut move_vec = forward_from_yaw(camera_yaw) * forward_move + right_from_yaw(camera_yaw) * right_move;
        // Normalize diagonal movement
        if move_vec.length() > 1.0 {
            move_vec = move_vec.normalize();
        }

        let mut cmd = MoveCommand {
            move_vec,
            ..Default::default()
        };

        // Mouse pixels to radians; moving the mouse right turns clockwise
        let sensitivity_radians = mouse_sensitivity * 0.001;
        cmd.yaw = self.mouse_delta.0 * sensitivity_radians;
        cmd.pitch = -self.mouse_delta.1 * sensitivity_radians;
        cmd.freelook = self.actions.freelook;

        if self.actions.jump {
            cmd.triggers.press(CommandTriggers::JUMP);
        }
        if self.actions.jump_jet {
            cmd.triggers.press(CommandTriggers::JUMP_JET);
        }
        if self.actions.crouch {
            cmd.triggers.press(CommandTriggers::CROUCH);
        }
        if self.actions.prone {
            cmd.triggers.press(CommandTriggers::PRONE);
        }
        if self.actions.sprint {
            cmd.triggers.press(CommandTriggers::SPRINT);
        }

        cmd
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        self.movement.forward || self.movement.backward || self.movement.left || self.movement.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_input_to_command() {
        let mut input = PlayerInput::default();
        input.movement.forward = true;
        input.movement.right = true;
        input.actions.jump = true;

        let cmd = input.to_command(0.0, 1.0);

        // Should be normalized for diagonal movement
        assert!((cmd.move_vec.length() - 1.0).abs() < 1e-6);
        assert!(cmd.move_vec.x > 0.0 && cmd.move_vec.y > 0.0);

        assert!(cmd.jump());
        assert!(!cmd.sprint());
    }

    #[test]
    fn test_movement_follows_camera() {
        let mut input = PlayerInput::default();
        input.movement.forward = true;

        // Camera turned a quarter clockwise looks down +X
        let cmd = input.to_command(FRAC_PI_2, 1.0);
        assert!((cmd.move_vec - Vec3::X).length() < 1e-6);

        input.movement.forward = false;
        input.movement.left = true;
        let cmd = input.to_command(FRAC_PI_2, 1.0);
        assert!((cmd.move_vec - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_mouse_and_triggers() {
        let mut input = PlayerInput {
            mouse_delta: (100.0, 50.0),
            ..Default::default()
        };
        input.actions.jump_jet = true;
        input.actions.prone = true;
        input.actions.freelook = true;

        let cmd = input.to_command(0.0, 2.0);
        assert!((cmd.yaw - 0.2).abs() < 1e-6);
        assert!((cmd.pitch + 0.1).abs() < 1e-6);
        assert!(cmd.freelook);
        assert!(cmd.jump_jet());
        assert!(cmd.prone());
        assert!(!input.has_movement());
    }
}
