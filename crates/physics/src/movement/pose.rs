//! Body poses and the checks that gate switching between them.
//!
//! Each pose has its own collision box. Moving to a taller pose needs the
//! extra headroom to be clear; moving to a shorter one never does.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::controller::PlayerController;
use super::state::{DamageState, MoveCommand, PlayerBody, SimState};
use crate::collision::{ContentFlags, WorldQuery};
use crate::geometry::Aabb;

/// Body pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pose {
    #[default]
    Stand,
    Crouch,
    Prone,
    Sprint,
    Swim,
}

impl Pose {
    pub const ALL: [Pose; 5] = [Pose::Stand, Pose::Crouch, Pose::Prone, Pose::Sprint, Pose::Swim];

    /// Wire index.
    pub fn index(self) -> u8 {
        match self {
            Pose::Stand => 0,
            Pose::Crouch => 1,
            Pose::Prone => 2,
            Pose::Sprint => 3,
            Pose::Swim => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Only standing and sprinting bodies may climb, hug walls or grab
    /// ledges.
    #[inline]
    pub fn is_upright(self) -> bool {
        matches!(self, Pose::Stand | Pose::Sprint)
    }
}

impl PlayerController {
    /// Move state, alive, and not riding anything.
    pub(super) fn can_act(&self, body: &PlayerBody) -> bool {
        body.sim_state == SimState::Move && body.damage == DamageState::Enabled && !body.mounted
    }

    /// True if growing from the current pose's box to `target`'s box
    /// would not push into geometry.
    fn headroom_clear(&self, body: &PlayerBody, target: Pose, world: &dyn WorldQuery) -> bool {
        let current = self.config.box_for(body.pose) * body.scale;
        let wanted = self.config.box_for(target) * body.scale;
        if wanted.z <= current.z {
            return true;
        }

        let half = Vec3::new(wanted.x * 0.5, wanted.y * 0.5, 0.0);
        let extra = Aabb::new(
            Vec3::new(-half.x, -half.y, current.z),
            Vec3::new(half.x, half.y, wanted.z),
        );
        world.box_is_clear(&extra.translated(body.position), ContentFlags::MASK_PLAYER_MOVE)
    }

    pub fn can_crouch(&self, body: &PlayerBody, world: &dyn WorldQuery) -> bool {
        if !self.can_act(body) || body.swimming || body.falling {
            return false;
        }
        match body.pose {
            Pose::Crouch => true,
            Pose::Prone => self.headroom_clear(body, Pose::Crouch, world),
            _ => true,
        }
    }

    pub fn can_prone(&self, body: &PlayerBody) -> bool {
        self.can_act(body) && !body.swimming && !body.falling
    }

    pub fn can_stand(&self, body: &PlayerBody, world: &dyn WorldQuery) -> bool {
        if !self.can_act(body) {
            return false;
        }
        match body.pose {
            Pose::Crouch | Pose::Prone => self.headroom_clear(body, Pose::Stand, world),
            _ => true,
        }
    }

    pub fn can_sprint(&self, body: &PlayerBody) -> bool {
        self.can_act(body)
            && !body.swimming
            && body.run_surface
            && body.energy >= self.config.min_sprint_energy
    }

    /// Pick the pose for this tick: swim, then crouch, prone, sprint and
    /// stand in that order. Returns true if the pose changed.
    pub(super) fn update_pose(&self, body: &mut PlayerBody, command: &MoveCommand, world: &dyn WorldQuery) -> bool {
        let desired = if body.swimming {
            Pose::Swim
        } else if body.run_surface && command.crouch() && self.can_crouch(body, world) {
            Pose::Crouch
        } else if body.run_surface && command.prone() && self.can_prone(body) {
            Pose::Prone
        } else if command.sprint() && self.can_sprint(body) {
            Pose::Sprint
        } else if self.can_stand(body, world) {
            Pose::Stand
        } else {
            body.pose
        };

        if desired == body.pose {
            return false;
        }

        log::debug!("pose {:?} -> {:?}", body.pose, desired);
        body.pose = desired;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, SurfaceCaps};
    use crate::movement::config::PlayerConfig;
    use crate::movement::state::CommandTriggers;

    fn grounded_body(config: &PlayerConfig) -> PlayerBody {
        let mut body = PlayerBody::new(Vec3::ZERO, config);
        body.run_surface = true;
        body
    }

    /// A slab whose underside is at `height`.
    fn ceiling(height: f32) -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, 0.0, height + 0.5),
            Vec3::new(5.0, 5.0, 0.5),
            ContentFlags::SOLID,
            SurfaceCaps::NONE,
        );
        world
    }

    #[test]
    fn test_pose_index_round_trip() {
        for pose in Pose::ALL {
            assert_eq!(Pose::from_index(pose.index()), Some(pose));
        }
        assert_eq!(Pose::from_index(5), None);
        assert!(Pose::Sprint.is_upright());
        assert!(!Pose::Crouch.is_upright());
    }

    #[test]
    fn test_crouch_and_sprint_selection() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = CollisionWorld::new();
        let mut body = grounded_body(controller.config());

        let mut cmd = MoveCommand::default();
        cmd.triggers.press(CommandTriggers::CROUCH);
        assert!(controller.update_pose(&mut body, &cmd, &world));
        assert_eq!(body.pose, Pose::Crouch);

        cmd.triggers = CommandTriggers::default();
        cmd.triggers.press(CommandTriggers::SPRINT);
        assert!(controller.update_pose(&mut body, &cmd, &world));
        assert_eq!(body.pose, Pose::Sprint);

        // Sprint needs a run surface
        body.run_surface = false;
        assert!(controller.update_pose(&mut body, &cmd, &world));
        assert_eq!(body.pose, Pose::Stand);
    }

    #[test]
    fn test_low_ceiling_keeps_crouch() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = ceiling(1.5);
        let mut body = grounded_body(controller.config());
        body.pose = Pose::Crouch;

        assert!(!controller.can_stand(&body, &world));
        assert!(!controller.update_pose(&mut body, &MoveCommand::default(), &world));
        assert_eq!(body.pose, Pose::Crouch);

        let open = CollisionWorld::new();
        assert!(controller.update_pose(&mut body, &MoveCommand::default(), &open));
        assert_eq!(body.pose, Pose::Stand);
    }

    #[test]
    fn test_prone_to_crouch_needs_headroom() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut body = grounded_body(controller.config());
        body.pose = Pose::Prone;

        assert!(!controller.can_crouch(&body, &ceiling(0.9)));
        assert!(controller.can_crouch(&body, &ceiling(1.5)));
    }

    #[test]
    fn test_swimming_overrides_everything() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = CollisionWorld::new();
        let mut body = grounded_body(controller.config());
        body.swimming = true;

        let mut cmd = MoveCommand::default();
        cmd.triggers.press(CommandTriggers::CROUCH);
        assert!(controller.update_pose(&mut body, &cmd, &world));
        assert_eq!(body.pose, Pose::Swim);
        assert!(!controller.can_crouch(&body, &world));
    }

    #[test]
    fn test_dead_body_keeps_pose() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = CollisionWorld::new();
        let mut body = grounded_body(controller.config());
        body.pose = Pose::Crouch;
        body.damage = DamageState::Disabled;

        assert!(!controller.update_pose(&mut body, &MoveCommand::default(), &world));
        assert_eq!(body.pose, Pose::Crouch);
    }
}
