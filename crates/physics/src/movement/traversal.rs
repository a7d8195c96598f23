//! Wall hugging, climbing and ledge grabbing.
//!
//! All three states pin the body against a near-vertical surface and replace
//! normal running with direction-snapped movement along that surface. Each
//! has an entry check (`can_start_*`, a probe hit and a clear snap position)
//! and a per-tick sustain that exits as soon as any condition fails.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use super::animation::{set_action, Action, ActionRequest, AnimationPlayer};
use super::constants::{CONTACT_TICK_TIME, SURFACE_DISTANCE, TICK_SEC};
use super::controller::{Authority, MoveFrame, PlayerController};
use super::events::{EventSink, LocomotionEvent, SoundCue};
use super::state::{MoveCommand, MoveDir, PlayerBody};
use crate::collision::WorldQuery;
use crate::geometry::{angles_from_vector, snap_to_plane, with_length, Aabb, Plane, UP};
use crate::surface::{
    find_climb_contact, find_ledge_contact, find_wall_contact, ledge_up_position, world_box_is_clear,
};

/// Entering a wall hug needs input almost straight into the wall.
const WALL_ENTER_DOT: f32 = -0.95;

/// Pulling away from a wall this directly ends the hug.
const WALL_EXIT_DOT: f32 = 0.95;

/// Input sharper than this against a surface normal counts as into or away.
const SURFACE_INPUT_DOT: f32 = 0.5;

/// Leaving a ledge by pulling away.
const LEDGE_EXIT_DOT: f32 = 0.75;

/// Pull applied into a climb surface while scraping down it.
const SCRAPE_PULL: f32 = 0.5;

/// Reverse the climb-up clip below this progress when Up is released.
const LEDGE_UP_REVERSE_POS: f32 = 0.2;

impl PlayerController {
    /// Alive, free, upright and accepting input.
    fn can_traverse(&self, body: &PlayerBody) -> bool {
        self.can_act(body) && body.pose.is_upright()
    }

    pub fn can_start_climb(&self, body: &PlayerBody) -> bool {
        self.can_climb(body) && body.velocity.z <= 0.1
    }

    pub fn can_climb(&self, body: &PlayerBody) -> bool {
        self.can_traverse(body)
            && body.climb_trigger_count > 0
            && !body.climb.ignore
            && !body.ledge.active
            && !body.wall_hug.active
    }

    fn wall_hug_blocked(body: &PlayerBody) -> bool {
        body.slide.active || body.jump.active || body.land.active || body.climb.active || body.ledge.active
    }

    pub fn can_start_wall_hug(&self, body: &PlayerBody) -> bool {
        self.can_traverse(body) && body.run_surface && !Self::wall_hug_blocked(body)
    }

    /// Like [`can_start_wall_hug`](Self::can_start_wall_hug) but tolerates a
    /// brief loss of ground.
    pub fn can_wall_hug(&self, body: &PlayerBody) -> bool {
        self.can_traverse(body) && body.contact_timer < CONTACT_TICK_TIME && !Self::wall_hug_blocked(body)
    }

    /// A climber heading down never catches a ledge on the way.
    pub fn can_start_ledge_grab(&self, body: &PlayerBody) -> bool {
        self.can_ledge_grab(body)
            && body.velocity.z <= self.config.climb_speed_up
            && !(body.climb.active && body.climb.direction == MoveDir::Down)
    }

    pub fn can_ledge_grab(&self, body: &PlayerBody) -> bool {
        self.can_traverse(body) && !body.ledge.ignore
    }

    /// Hanging still with room to stand on top of the ledge.
    pub fn can_start_ledge_up(&self, body: &PlayerBody, world: &dyn WorldQuery, player: &dyn AnimationPlayer) -> bool {
        if body.ledge.climbing_up || body.action.action != Action::LedgeIdle || player.in_transition() {
            return false;
        }
        let top = ledge_up_position(body.position, body.ledge.normal, body.ledge.point, &self.config);
        world_box_is_clear(world, &Aabb::from_size(self.config.grab_up_test_box), top)
    }

    /// Where the body would rest against `plane`, nudged out by the surface
    /// distance. `None` if that spot is blocked.
    fn surface_snap(&self, body: &PlayerBody, world: &dyn WorldQuery, plane: &Plane) -> Option<Vec3> {
        let object_box = body.object_box(&self.config);
        let snap = snap_to_plane(body.position, &object_box, plane) + with_length(plane.normal, SURFACE_DISTANCE);
        world_box_is_clear(world, &object_box, snap).then_some(snap)
    }

    /// As [`surface_snap`](Self::surface_snap), with the feet hanging
    /// `grab_height` below the ledge point.
    fn ledge_snap(&self, body: &PlayerBody, world: &dyn WorldQuery, normal: Vec3, point: Vec3) -> Option<Vec3> {
        let object_box = body.object_box(&self.config);
        let plane = Plane::from_point_normal(point, normal);
        let mut snap = snap_to_plane(body.position, &object_box, &plane) + with_length(normal, SURFACE_DISTANCE);
        snap.z = point.z - self.config.grab_height;
        world_box_is_clear(world, &object_box, snap).then_some(snap)
    }

    // ========================================================================
    // Wall hug
    // ========================================================================

    pub(super) fn update_wall_hug(&self, body: &mut PlayerBody, world: &dyn WorldQuery, frame: &mut MoveFrame) {
        if !body.wall_hug.active && self.can_start_wall_hug(body) {
            if let Some(plane) = find_wall_contact(world, body, &self.config) {
                if frame.move_dir.dot(plane.normal) < WALL_ENTER_DOT && self.surface_snap(body, world, &plane).is_some() {
                    log::debug!("wall hug start, normal {:?}", plane.normal);
                    body.wall_hug.active = true;
                    body.wall_hug.normal = plane.normal;
                    body.stopping_timer = 0;
                }
            }
        }

        if !body.wall_hug.active {
            return;
        }

        let plane = find_wall_contact(world, body, &self.config);
        let plane = match plane {
            Some(plane) if self.can_wall_hug(body) && plane.normal.dot(frame.move_dir) <= WALL_EXIT_DOT => plane,
            _ => {
                log::debug!("wall hug end");
                body.wall_hug.active = false;
                body.wall_hug.normal = Vec3::ZERO;
                return;
            }
        };

        body.wall_hug.normal = plane.normal;
        body.wall_hug.direction = MoveDir::None;

        if let Some(snap) = self.surface_snap(body, world, &plane) {
            body.position = snap;
        }

        let mut pv = Vec3::ZERO;
        if frame.move_vec.length() > 0.0 {
            let n = body.wall_hug.normal;
            let left = n.cross(UP).normalize_or_zero();
            if frame.move_vec.dot(n) >= -SURFACE_INPUT_DOT {
                if frame.move_vec.dot(left) > 0.0 {
                    body.wall_hug.direction = MoveDir::Left;
                    pv = left * self.config.wall_hug_speed;
                } else {
                    body.wall_hug.direction = MoveDir::Right;
                    pv = -left * self.config.wall_hug_speed;
                }
            }
        }
        body.velocity.x = pv.x;
        body.velocity.y = pv.y;
    }

    // ========================================================================
    // Climb
    // ========================================================================

    pub(super) fn update_climb(
        &self,
        body: &mut PlayerBody,
        command: &MoveCommand,
        world: &dyn WorldQuery,
        frame: &mut MoveFrame,
    ) {
        let config = &self.config;

        if !command.jump_jet() {
            body.climb.ignore = false;
        }

        if !body.climb.active && self.can_start_climb(body) {
            if let Some(plane) = find_climb_contact(world, body, config) {
                let into = frame.move_dir.dot(plane.normal) < -SURFACE_INPUT_DOT;
                if (into || !body.run_surface) && self.surface_snap(body, world, &plane).is_some() {
                    log::debug!("climb start, normal {:?}", plane.normal);
                    body.climb.active = true;
                    body.climb.normal = plane.normal;
                    body.climb.ignore = false;
                    body.jump.active = false;
                    body.jumping = false;
                    body.stopping_timer = 0;
                }
            }
        }

        if !body.climb.active {
            return;
        }

        let plane = match find_climb_contact(world, body, config) {
            Some(plane) if self.can_climb(body) => plane,
            _ => {
                log::debug!("climb lost");
                body.climb.active = false;
                body.climb.normal = Vec3::ZERO;
                body.climb.ignore = true;
                return;
            }
        };

        if command.jump() {
            log::debug!("climb jump-off");
            body.climb.active = false;
            body.climb.ignore = true;
            body.climb.normal = plane.normal;
            frame.acc = plane.normal * config.jump_force_climb / config.mass;
            return;
        }

        body.climb.normal = plane.normal;
        body.climb.direction = MoveDir::None;

        body.jump_surface = false;
        body.jump.active = false;
        body.jump.is_crouching = false;
        body.jump.crouch_delay = 0.0;
        body.contact_timer = 0;
        frame.acc = Vec3::ZERO;

        if body.velocity.z < config.climb_scrape_speed {
            // Too fast to hold on: slow down against the surface
            body.velocity -= body.velocity * config.climb_scrape_friction * TICK_SEC;
            frame.acc = -body.climb.normal * SCRAPE_PULL;
            return;
        }

        if let Some(snap) = self.surface_snap(body, world, &plane) {
            body.position = snap;
        }

        if frame.move_vec.length() == 0.0 {
            body.velocity = Vec3::ZERO;
            return;
        }

        let n = body.climb.normal;
        let left = n.cross(UP).normalize_or_zero();
        let along = frame.move_vec.dot(n);

        let mut pv = frame.move_vec;
        if along < -SURFACE_INPUT_DOT {
            body.climb.direction = MoveDir::Up;
            pv = with_length(-n, config.climb_speed_up);
        } else if along > SURFACE_INPUT_DOT {
            if body.run_surface {
                // Reached the bottom
                log::debug!("climb end at ground");
                body.climb.active = false;
                body.climb.ignore = true;
            } else {
                body.climb.direction = MoveDir::Down;
                pv = with_length(n, config.climb_speed_down);
            }
        } else if frame.move_vec.dot(left) > 0.0 {
            body.climb.direction = MoveDir::Left;
            pv = left * config.climb_speed_side;
        } else {
            body.climb.direction = MoveDir::Right;
            pv = -left * config.climb_speed_side;
        }

        // Tip the horizontal input up onto the surface
        let pitch = angles_from_vector(n).1;
        let axis = UP.cross(n).normalize_or_zero();
        body.velocity = Quat::from_axis_angle(axis, FRAC_PI_2 - pitch) * pv;
    }

    // ========================================================================
    // Ledge
    // ========================================================================

    pub(super) fn update_ledge(
        &self,
        body: &mut PlayerBody,
        command: &MoveCommand,
        world: &dyn WorldQuery,
        player: &mut dyn AnimationPlayer,
        frame: &mut MoveFrame,
        events: &mut dyn EventSink,
    ) {
        let config = &self.config;

        if !command.jump_jet() && !command.jump() {
            body.ledge.ignore = false;
        }

        if !body.ledge.active && self.can_start_ledge_grab(body) {
            if let Some(ledge) = find_ledge_contact(world, body, config) {
                // Grounded players must push into the ledge; airborne ones
                // grab unless pulling away
                let limit = if body.contact_timer < CONTACT_TICK_TIME { -0.5 } else { LEDGE_EXIT_DOT };
                if ledge.can_move_left
                    && ledge.can_move_right
                    && ledge.normal.dot(frame.move_dir) <= limit
                    && self.ledge_snap(body, world, ledge.normal, ledge.point).is_some()
                {
                    log::debug!("ledge grab at {:?}", ledge.point);
                    body.ledge.active = true;
                    body.ledge.normal = ledge.normal;
                    body.ledge.point = ledge.point;
                    body.ledge.ignore = false;
                    body.jump.active = false;
                    body.jumping = false;
                    body.stopping_timer = 0;

                    // Hanging replaces whatever surface the body was on
                    body.climb.active = false;
                    body.climb.direction = MoveDir::None;
                    body.climb.normal = Vec3::ZERO;
                    body.wall_hug.active = false;
                    body.wall_hug.normal = Vec3::ZERO;
                    frame.action_changed = true;

                    events.emit(LocomotionEvent::Sound(SoundCue::LedgeGrab));
                }
            }
        }

        if body.ledge.climbing_up {
            if body.ledge.anim_pos == 0.0 {
                // Slid back down; still hanging
                body.ledge.climbing_up = false;
                body.ledge.anim_pos = 0.0;
                body.ledge.delta_anim_pos = 0.0;
                body.ledge.delta_anim_pos_vec = 0.0;
                frame.ledge_up_changed = true;
            }

            if body.ledge.anim_pos == 1.0 {
                let top = ledge_up_position(body.position, body.ledge.normal, body.ledge.point, config);
                log::debug!("ledge climb-up complete at {:?}", top);
                body.position = top;

                set_action(&mut body.action, player, ActionRequest::new(Action::Root).force());
                player.clear_transition();
                frame.action_changed = true;

                body.ledge.clear();
                frame.ledge_up_changed = true;

                body.climb.active = false;
                body.climb.direction = MoveDir::None;
                body.climb.normal = Vec3::ZERO;
            }
        }

        if !body.ledge.active {
            return;
        }

        let found = find_ledge_contact(world, body, config);
        let leaving = match &found {
            Some(ledge) => {
                !self.can_ledge_grab(body) || ledge.normal.dot(frame.move_dir) > LEDGE_EXIT_DOT || command.jump()
            }
            None => true,
        };

        if leaving && !body.ledge.climbing_up {
            log::debug!("ledge release");
            body.ledge.clear();
            body.ledge.ignore = true;
            frame.ledge_up_changed = true;
            return;
        }

        let Some(ledge) = found else {
            return;
        };

        if let Some(snap) = self.ledge_snap(body, world, ledge.normal, ledge.point) {
            body.position = snap;
        }

        body.ledge.active = true;
        body.ledge.normal = ledge.normal;
        body.ledge.point = ledge.point;

        body.jump_surface = false;
        body.jump.active = false;
        body.jump.is_crouching = false;
        body.jump.crouch_delay = 0.0;
        body.run_surface = false;
        body.contact_timer = 0;

        frame.acc = Vec3::ZERO;
        body.velocity = Vec3::ZERO;
        body.ledge.direction = MoveDir::None;

        if frame.move_vec.length() == 0.0 {
            return;
        }

        let n = body.ledge.normal;
        let along = frame.move_vec.dot(n);
        let mut pv = Vec3::ZERO;

        if along < -SURFACE_INPUT_DOT {
            body.ledge.direction = MoveDir::Up;
            if self.can_start_ledge_up(body, world, player) {
                log::debug!("ledge climb-up start");
                body.ledge.climbing_up = true;
                // Just above zero so the bottom exit does not fire at once
                body.ledge.anim_pos = f32::MIN_POSITIVE;
            }
        } else if along <= SURFACE_INPUT_DOT {
            let left = n.cross(UP).normalize_or_zero();
            if frame.move_vec.dot(left) > 0.0 {
                if ledge.can_move_left {
                    body.ledge.direction = MoveDir::Left;
                    pv = left * config.grab_speed_side;
                }
            } else if ledge.can_move_right {
                body.ledge.direction = MoveDir::Right;
                pv = -left * config.grab_speed_side;
            }
        }

        if body.ledge.climbing_up || body.ledge.direction == MoveDir::Up {
            pv = Vec3::ZERO;
        }
        body.velocity = pv;
    }

    /// Drive the climb-up clip by hand while pulling up over a ledge.
    /// Returns true if the climb-up progress changed.
    pub fn update_ledge_up_animation(
        &self,
        body: &mut PlayerBody,
        player: &mut dyn AnimationPlayer,
        authority: Authority,
    ) -> bool {
        if !body.ledge.climbing_up || body.action.action != Action::LedgeUp {
            return false;
        }

        let before = body.ledge.anim_pos;
        body.ledge.delta_anim_pos_vec = before;

        let mut step = self.config.grab_speed_up * TICK_SEC;
        if body.ledge.direction != MoveDir::Up && before < LEDGE_UP_REVERSE_POS {
            step = -step;
        }
        body.ledge.anim_pos = (before + step).clamp(0.0, 1.0);

        if body.action.sequence.is_some() {
            player.clear_transition();
            player.set_position(body.ledge.anim_pos);
        }

        if authority == Authority::Client {
            body.ledge.delta_anim_pos = body.ledge.anim_pos;
            body.ledge.delta_anim_pos_vec = before - body.ledge.anim_pos;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionWorld, ContentFlags, SurfaceCaps};
    use crate::movement::animation::ClipPlayer;
    use crate::movement::config::PlayerConfig;
    use crate::movement::state::CommandTriggers;

    /// A wall facing -Y whose face is at y = 1.
    fn wall(caps: SurfaceCaps) -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, 1.5, 2.0),
            Vec3::new(5.0, 0.5, 2.0),
            ContentFlags::SOLID,
            caps,
        );
        world
    }

    /// Body facing +Y with its front a little short of the wall.
    fn facing_wall(controller: &PlayerController) -> PlayerBody {
        let mut body = PlayerBody::new(Vec3::new(0.0, 0.6, 0.0), controller.config());
        body.run_surface = true;
        body
    }

    fn frame_toward(move_vec: Vec3) -> MoveFrame {
        MoveFrame {
            move_vec,
            move_dir: move_vec.normalize_or_zero(),
            ..Default::default()
        }
    }

    #[test]
    fn test_wall_hug_enter_move_and_exit() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = wall(SurfaceCaps::WALL_HUG);
        let mut body = facing_wall(&controller);

        let mut frame = frame_toward(Vec3::Y);
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert!(body.wall_hug.active);
        assert!((body.wall_hug.normal - Vec3::NEG_Y).length() < 1e-4);
        // Snapped to rest just off the wall
        assert!((body.position.y + 0.3 - (1.0 - SURFACE_DISTANCE)).abs() < 1e-4);

        // Sideways input along the wall; +X is the player's right
        let mut frame = frame_toward(Vec3::X);
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert_eq!(body.wall_hug.direction, MoveDir::Right);
        assert!((body.velocity.x - controller.config().wall_hug_speed).abs() < 1e-5);

        let mut frame = frame_toward(Vec3::NEG_X);
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert_eq!(body.wall_hug.direction, MoveDir::Left);

        // Pulling away ends the hug
        let mut frame = frame_toward(Vec3::NEG_Y);
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert!(!body.wall_hug.active);
        assert_eq!(body.wall_hug.normal, Vec3::ZERO);
    }

    #[test]
    fn test_wall_hug_needs_direct_input() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = wall(SurfaceCaps::WALL_HUG);
        let mut body = facing_wall(&controller);

        let mut frame = frame_toward(Vec3::new(0.5, 1.0, 0.0));
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert!(!body.wall_hug.active);

        body.jump.active = true;
        let mut frame = frame_toward(Vec3::Y);
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert!(!body.wall_hug.active);
    }

    #[test]
    fn test_climb_needs_climb_zone() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = wall(SurfaceCaps::CLIMB);
        let mut body = facing_wall(&controller);

        let mut frame = frame_toward(Vec3::Y);
        controller.update_climb(&mut body, &MoveCommand::default(), &world, &mut frame);
        assert!(!body.climb.active);

        body.climb_trigger_count = 1;
        controller.update_climb(&mut body, &MoveCommand::default(), &world, &mut frame);
        assert!(body.climb.active);
        assert_eq!(body.contact_timer, 0);
    }

    #[test]
    fn test_climb_directions() {
        let controller = PlayerController::new(PlayerConfig::default());
        let config = controller.config().clone();
        let world = wall(SurfaceCaps::CLIMB);
        let mut body = facing_wall(&controller);
        body.climb_trigger_count = 1;
        let cmd = MoveCommand::default();

        // Pushing into the wall climbs up
        let mut frame = frame_toward(Vec3::Y);
        controller.update_climb(&mut body, &cmd, &world, &mut frame);
        assert_eq!(body.climb.direction, MoveDir::Up);
        assert!((body.velocity - Vec3::Z * config.climb_speed_up).length() < 1e-4);

        // Sideways input moves along the wall
        let mut frame = frame_toward(Vec3::NEG_X);
        controller.update_climb(&mut body, &cmd, &world, &mut frame);
        assert_eq!(body.climb.direction, MoveDir::Left);
        assert!((body.velocity - Vec3::NEG_X * config.climb_speed_side).length() < 1e-4);

        // Pulling away in the air climbs down
        body.run_surface = false;
        let mut frame = frame_toward(Vec3::NEG_Y);
        controller.update_climb(&mut body, &cmd, &world, &mut frame);
        assert_eq!(body.climb.direction, MoveDir::Down);
        assert!((body.velocity - Vec3::NEG_Z * config.climb_speed_down).length() < 1e-4);

        // No input holds still
        let mut frame = frame_toward(Vec3::ZERO);
        controller.update_climb(&mut body, &cmd, &world, &mut frame);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.climb.direction, MoveDir::None);
    }

    #[test]
    fn test_climb_down_to_ground_exits() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = wall(SurfaceCaps::CLIMB);
        let mut body = facing_wall(&controller);
        body.climb_trigger_count = 1;
        body.climb.active = true;
        body.climb.normal = Vec3::NEG_Y;

        let mut frame = frame_toward(Vec3::NEG_Y);
        controller.update_climb(&mut body, &MoveCommand::default(), &world, &mut frame);
        assert!(!body.climb.active);
        assert!(body.climb.ignore);
    }

    #[test]
    fn test_climb_jump_off_pushes_away() {
        let controller = PlayerController::new(PlayerConfig::default());
        let config = controller.config().clone();
        let world = wall(SurfaceCaps::CLIMB);
        let mut body = facing_wall(&controller);
        body.climb_trigger_count = 1;
        body.climb.active = true;

        let mut cmd = MoveCommand::default();
        cmd.triggers.press(CommandTriggers::JUMP);
        let mut frame = frame_toward(Vec3::ZERO);
        controller.update_climb(&mut body, &cmd, &world, &mut frame);

        assert!(!body.climb.active);
        assert!(body.climb.ignore);
        let expected = Vec3::NEG_Y * config.jump_force_climb / config.mass;
        assert!((frame.acc - expected).length() < 1e-4);

        // Ignore holds only while the jet trigger is down
        cmd.triggers = CommandTriggers::default();
        cmd.triggers.press(CommandTriggers::JUMP_JET);
        let mut frame = frame_toward(Vec3::Y);
        controller.update_climb(&mut body, &cmd, &world, &mut frame);
        assert!(!body.climb.active);

        controller.update_climb(&mut body, &MoveCommand::default(), &world, &mut frame);
        assert!(body.climb.active);
    }

    #[test]
    fn test_climb_scrape_slows_fast_fall() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = wall(SurfaceCaps::CLIMB);
        let mut body = facing_wall(&controller);
        body.climb_trigger_count = 1;
        body.climb.active = true;
        body.velocity = Vec3::new(0.0, 0.0, -5.0);

        let mut frame = frame_toward(Vec3::Y);
        controller.update_climb(&mut body, &MoveCommand::default(), &world, &mut frame);
        assert!(body.climb.active);
        assert!(body.velocity.z > -5.0);
        assert!((frame.acc - Vec3::Y * SCRAPE_PULL).length() < 1e-5);
    }

    /// A wide block whose top edge faces -Y at y = 0, z = 1.5.
    fn ledge_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, 0.0, -0.5),
            Vec3::new(20.0, 20.0, 0.5),
            ContentFlags::SOLID,
            SurfaceCaps::NONE,
        );
        world.add_box(
            Vec3::new(0.0, 2.0, 0.75),
            Vec3::new(5.0, 2.0, 0.75),
            ContentFlags::SOLID,
            SurfaceCaps::LEDGE_GRAB,
        );
        world
    }

    #[test]
    fn test_ledge_grab_snaps_below_edge() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = ledge_world();
        let mut player = ClipPlayer::standard();
        let mut body = PlayerBody::new(Vec3::new(0.0, -0.4, 0.0), controller.config());
        body.run_surface = true;
        let mut events = Vec::new();

        let mut frame = frame_toward(Vec3::Y);
        controller.update_ledge(&mut body, &MoveCommand::default(), &world, &mut player, &mut frame, &mut events);
        assert!(body.ledge.active);
        assert!((body.ledge.point.z - 1.5).abs() < 1e-4);
        assert!((body.position - Vec3::new(0.0, -0.35, 0.0)).length() < 1e-4);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert!(!body.run_surface);
        assert_eq!(events, vec![LocomotionEvent::Sound(SoundCue::LedgeGrab)]);

        // Jump lets go and blocks re-grabbing until released
        let mut cmd = MoveCommand::default();
        cmd.triggers.press(CommandTriggers::JUMP);
        controller.update_ledge(&mut body, &cmd, &world, &mut player, &mut frame, &mut events);
        assert!(!body.ledge.active);
        assert!(body.ledge.ignore);
        assert!(!controller.can_start_ledge_grab(&body));
    }

    #[test]
    fn test_ledge_side_moves() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = ledge_world();
        let mut player = ClipPlayer::standard();
        let mut body = PlayerBody::new(Vec3::new(0.0, -0.35, 0.0), controller.config());
        body.ledge.active = true;

        let mut frame = frame_toward(Vec3::NEG_X);
        controller.update_ledge(&mut body, &MoveCommand::default(), &world, &mut player, &mut frame, &mut ());
        assert!(body.ledge.active);
        assert_eq!(body.ledge.direction, MoveDir::Left);
        assert!((body.velocity - Vec3::NEG_X * controller.config().grab_speed_side).length() < 1e-5);
    }

    #[test]
    fn test_ledge_up_needs_idle_action() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = ledge_world();
        let mut player = ClipPlayer::standard();
        let mut body = PlayerBody::new(Vec3::new(0.0, -0.35, 0.0), controller.config());
        body.ledge.active = true;
        body.ledge.normal = Vec3::NEG_Y;
        body.ledge.point = Vec3::new(0.0, 0.0, 1.5);

        assert!(!controller.can_start_ledge_up(&body, &world, &player));

        set_action(&mut body.action, &mut player, ActionRequest::new(Action::LedgeIdle));
        assert!(!controller.can_start_ledge_up(&body, &world, &player));
        player.clear_transition();
        assert!(controller.can_start_ledge_up(&body, &world, &player));

        let mut frame = frame_toward(Vec3::Y);
        controller.update_ledge(&mut body, &MoveCommand::default(), &world, &mut player, &mut frame, &mut ());
        assert!(body.ledge.climbing_up);
        assert_eq!(body.ledge.direction, MoveDir::Up);
        assert!(body.ledge.anim_pos > 0.0);
    }

    #[test]
    fn test_ledge_up_animation_advances_and_reverses() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut player = ClipPlayer::standard();
        let mut body = PlayerBody::new(Vec3::ZERO, controller.config());
        body.ledge.active = true;
        body.ledge.climbing_up = true;
        body.ledge.direction = MoveDir::Up;
        body.ledge.anim_pos = 0.1;

        // Only while the LedgeUp action is on the thread
        assert!(!controller.update_ledge_up_animation(&mut body, &mut player, Authority::Server));

        set_action(&mut body.action, &mut player, ActionRequest::new(Action::LedgeUp));
        assert!(controller.update_ledge_up_animation(&mut body, &mut player, Authority::Client));
        let step = controller.config().grab_speed_up * TICK_SEC;
        assert!((body.ledge.anim_pos - (0.1 + step)).abs() < 1e-6);
        assert!((player.position() - body.ledge.anim_pos).abs() < 1e-6);
        assert!(!player.in_transition());
        assert_eq!(body.ledge.delta_anim_pos, body.ledge.anim_pos);
        assert!((body.ledge.delta_anim_pos_vec + step).abs() < 1e-6);

        // Releasing Up early slides back down
        body.ledge.direction = MoveDir::None;
        controller.update_ledge_up_animation(&mut body, &mut player, Authority::Server);
        assert!((body.ledge.anim_pos - 0.1).abs() < 1e-5);

        body.ledge.anim_pos = 0.01;
        controller.update_ledge_up_animation(&mut body, &mut player, Authority::Server);
        assert_eq!(body.ledge.anim_pos, 0.0);
    }

    #[test]
    fn test_ledge_grab_ends_climb() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, 2.0, 0.75),
            Vec3::new(5.0, 2.0, 0.75),
            ContentFlags::SOLID,
            SurfaceCaps::CLIMB | SurfaceCaps::LEDGE_GRAB,
        );
        let mut player = ClipPlayer::standard();
        let mut body = PlayerBody::new(Vec3::new(0.0, -0.4, 0.0), controller.config());
        body.run_surface = true;
        body.climb_trigger_count = 1;
        body.climb.active = true;
        body.climb.direction = MoveDir::Up;
        body.climb.normal = Vec3::NEG_Y;

        let mut frame = frame_toward(Vec3::Y);
        controller.update_ledge(&mut body, &MoveCommand::default(), &world, &mut player, &mut frame, &mut ());
        assert!(body.ledge.active);
        assert!(!body.climb.active);
        assert_eq!(body.climb.normal, Vec3::ZERO);
        assert!(frame.action_changed);

        // Hanging blocks climbing and hugging
        assert!(!controller.can_start_climb(&body));
        assert!(!controller.can_climb(&body));
        let mut frame = frame_toward(Vec3::Y);
        controller.update_climb(&mut body, &MoveCommand::default(), &world, &mut frame);
        assert!(!body.climb.active);
        controller.update_wall_hug(&mut body, &world, &mut frame);
        assert!(!body.wall_hug.active);
    }

    #[test]
    fn test_surface_states_exclude_each_other() {
        let controller = PlayerController::new(PlayerConfig::default());
        let mut body = PlayerBody::new(Vec3::ZERO, controller.config());
        body.climb_trigger_count = 1;
        assert!(controller.can_start_climb(&body));

        body.wall_hug.active = true;
        assert!(!controller.can_start_climb(&body));
        body.wall_hug.active = false;

        body.ledge.active = true;
        assert!(!controller.can_start_climb(&body));
        body.ledge.active = false;

        // Climbing down never catches a ledge
        body.climb.active = true;
        body.climb.direction = MoveDir::Down;
        assert!(!controller.can_start_ledge_grab(&body));
        body.climb.direction = MoveDir::Up;
        assert!(controller.can_start_ledge_grab(&body));
    }

    #[test]
    fn test_reversed_ledge_up_keeps_hanging() {
        let controller = PlayerController::new(PlayerConfig::default());
        let world = ledge_world();
        let mut player = ClipPlayer::standard();
        let mut body = PlayerBody::new(Vec3::new(0.0, -0.35, 0.0), controller.config());
        body.ledge.active = true;
        body.ledge.normal = Vec3::NEG_Y;
        body.ledge.point = Vec3::new(0.0, 0.0, 1.5);
        set_action(&mut body.action, &mut player, ActionRequest::new(Action::LedgeIdle));
        player.clear_transition();

        let mut frame = frame_toward(Vec3::Y);
        controller.update_ledge(&mut body, &MoveCommand::default(), &world, &mut player, &mut frame, &mut ());
        assert!(body.ledge.climbing_up);

        // Let go of Up straight away so the clip runs back to the start
        set_action(&mut body.action, &mut player, ActionRequest::new(Action::LedgeUp));
        body.ledge.direction = MoveDir::None;
        assert!(controller.update_ledge_up_animation(&mut body, &mut player, Authority::Server));
        assert_eq!(body.ledge.anim_pos, 0.0);

        let mut frame = frame_toward(Vec3::ZERO);
        controller.update_ledge(&mut body, &MoveCommand::default(), &world, &mut player, &mut frame, &mut ());
        assert!(!body.ledge.climbing_up);
        assert!(body.ledge.active);
        assert!(frame.ledge_up_changed);
        assert_eq!(body.ledge.anim_pos, 0.0);
    }
}
