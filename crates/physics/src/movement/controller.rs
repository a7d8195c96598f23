//! Player movement controller.
//!
//! This is the main entry point for player movement. Each fixed tick takes a
//! [`MoveCommand`], runs the state machine in [`update_move`], then hands the
//! resulting velocity to the collision resolver.
//!
//! [`update_move`]: PlayerController::update_move

use glam::Vec3;

use super::animation::{set_action, update_action_thread, Action, ActionRequest, AnimationPlayer};
use super::config::PlayerConfig;
use super::constants::{CONTACT_TICK_TIME, MAX_VELOCITY, SWIM_COVERAGE, TICK_MS, TICK_SEC};
use super::events::{EventSink, LocomotionEvent, SoundCue};
use super::jump::JumpType;
use super::pose::Pose;
use super::resolver::{move_body, MoveOutcome};
use super::state::{DamageState, MoveCommand, PlayerBody, SimState};
use crate::collision::WorldQuery;
use crate::geometry::{angles_from_vector, rotate_about_up, with_length, wrap_angle_2pi, wrap_angle_pi, UP};
use crate::surface::{find_ground_contact, ContactInfo, Overlap};

/// Fraction of the remaining turn toward a traversal surface taken per tick.
const SURFACE_FACING_EASE: f32 = 0.1;

/// Air control acceleration is capped at this share of the run force.
const AIR_FORCE_SCALE: f32 = 0.3;

/// Which side of the connection is simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Server,
    /// Predicting client; also records interpolation deltas.
    Client,
}

/// Per-tick working values shared by the update passes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveFrame {
    /// Requested move, length at most 1.
    pub move_vec: Vec3,

    /// Unit direction of the requested move, zero with no input.
    pub move_dir: Vec3,

    /// Target speed for this tick.
    pub move_speed: f32,

    /// Velocity change accumulated this tick.
    pub acc: Vec3,

    /// Normal of the ground under the feet, zero when airborne.
    pub contact_normal: Vec3,

    /// Speed at the start of the tick, before ground friction.
    pub start_speed: f32,

    pub action_changed: bool,
    pub ledge_up_changed: bool,
    pub pose_changed: bool,
}

/// What changed during one [`process_tick`](PlayerController::process_tick).
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub action_changed: bool,
    pub ledge_up_changed: bool,
    pub pose_changed: bool,
    pub outcome: MoveOutcome,
}

/// Player movement controller.
///
/// Stateless apart from its configuration: everything that changes lives in
/// the [`PlayerBody`], so one controller can drive any number of players.
///
/// # Example
///
/// ```ignore
/// let controller = PlayerController::new(PlayerConfig::default());
/// let mut body = PlayerBody::new(spawn_position, controller.config());
///
/// // Each tick:
/// controller.process_tick(&mut body, &command, &world, &mut anim, &mut events, Authority::Server);
/// ```
#[derive(Debug, Clone)]
pub struct PlayerController {
    pub(crate) config: PlayerConfig,
}

impl PlayerController {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    // ========================================================================
    // Tick driver
    // ========================================================================

    /// Run one fixed tick: animate, move, resolve collisions, then update
    /// the climb-up clip and the action thread.
    pub fn process_tick(
        &self,
        body: &mut PlayerBody,
        command: &MoveCommand,
        world: &dyn WorldQuery,
        player: &mut dyn AnimationPlayer,
        events: &mut dyn EventSink,
        authority: Authority,
    ) -> TickReport {
        let prev_pose = body.pose;
        let prev_motion = body.move_motion;

        // Clients advance animation by frame time instead
        if authority == Authority::Server {
            player.advance(TICK_SEC);
        }

        let frame = self.update_move(body, command, world, player, events);
        let outcome = self.update_pos(body, world, events);

        let ledge_up_changed = self.update_ledge_up_animation(body, player, authority) || frame.ledge_up_changed;
        let action_changed = update_action_thread(body, &self.config, player, events) || frame.action_changed;

        self.sprint_events(body, prev_pose, prev_motion, events);

        if body.damage == DamageState::Enabled {
            body.energy = (body.energy + self.config.energy_recharge_rate).clamp(0.0, self.config.max_energy);
        }

        TickReport {
            action_changed,
            ledge_up_changed,
            pose_changed: frame.pose_changed,
            outcome,
        }
    }

    fn sprint_events(&self, body: &PlayerBody, prev_pose: Pose, prev_motion: bool, events: &mut dyn EventSink) {
        let moving = body.move_motion;
        let sprinting = body.pose == Pose::Sprint;
        let was_sprinting = prev_pose == Pose::Sprint;

        if sprinting && !was_sprinting && moving {
            events.emit(LocomotionEvent::StartSprint);
        } else if !sprinting && was_sprinting && (moving || prev_motion) {
            events.emit(LocomotionEvent::StopSprint);
        } else if sprinting && moving != prev_motion {
            events.emit(if moving {
                LocomotionEvent::StartSprint
            } else {
                LocomotionEvent::StopSprint
            });
        }
    }

    /// Move the body along its velocity through the world and refresh the
    /// water coverage at the new position.
    pub fn update_pos(&self, body: &mut PlayerBody, world: &dyn WorldQuery, events: &mut dyn EventSink) -> MoveOutcome {
        let outcome = move_body(world, body, &self.config, events);
        body.position = outcome.position;
        body.water_coverage = world.water_coverage(&body.world_box(&self.config));
        outcome
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Turn the command into a new velocity. Does not move the body except
    /// for surface snaps and a completed ledge climb-up.
    pub fn update_move(
        &self,
        body: &mut PlayerBody,
        command: &MoveCommand,
        world: &dyn WorldQuery,
        player: &mut dyn AnimationPlayer,
        events: &mut dyn EventSink,
    ) -> MoveFrame {
        let config = &self.config;
        let mut frame = MoveFrame {
            start_speed: body.velocity.length(),
            ..Default::default()
        };

        let swimming = body.water_coverage > SWIM_COVERAGE && self.can_act(body);
        if swimming != body.swimming {
            log::debug!("swimming {}", swimming);
            body.swimming = swimming;
            events.emit(if swimming {
                LocomotionEvent::EnterSwim
            } else {
                LocomotionEvent::LeaveSwim
            });
        }

        frame.move_vec = command.move_vec;
        if frame.move_vec.length() > 1.0 {
            frame.move_vec = frame.move_vec.normalize();
        }

        if body.sim_state == SimState::Move && body.damage == DamageState::Enabled {
            let max_speed = if body.swimming {
                config.max_underwater_speed
            } else {
                config.max_speed_for(body.pose)
            };
            frame.move_speed = max_speed * frame.move_vec.length();
        } else {
            frame.move_vec = Vec3::ZERO;
        }
        frame.move_dir = frame.move_vec.normalize_or_zero();

        if body.damage == DamageState::Enabled {
            self.update_orientation(body, command, &frame);
        }

        self.update_contact(body, world, &mut frame, events);

        if !body.climb.active && !body.ledge.active {
            frame.acc = Vec3::new(0.0, 0.0, config.gravity * TICK_SEC);
        }

        body.slide.active = body.slide_surface && body.velocity.z < config.falling_speed_threshold;
        if body.slide.active {
            body.contact_timer = 0;
            body.jumping = false;
            body.falling = false;
            body.slide.normal = frame.contact_normal;
        }

        if body.contact_timer >= CONTACT_TICK_TIME && body.run_surface && body.damage == DamageState::Enabled {
            self.land(body, player, &mut frame, events);
        }

        self.update_wall_hug(body, world, &mut frame);
        self.update_climb(body, command, world, &mut frame);
        self.update_ledge(body, command, world, player, &mut frame, events);

        let traversing = body.is_traversing();
        if body.run_surface && !traversing {
            self.run_on_ground(body, command, player, &mut frame);
        } else if !body.swimming && config.air_control > 0.0 && !traversing {
            self.air_control(body, &mut frame);
        } else if body.swimming {
            self.swim(body, &mut frame);
        }

        self.update_jump(body, command, &mut frame, events);
        self.update_jet(body, command, &mut frame);

        if !body.wall_hug.active {
            frame.acc += body.applied_force / config.mass * TICK_SEC;
        }

        body.velocity += frame.acc;
        self.apply_resistance(body, command, &frame);

        body.falling = body.contact_timer >= CONTACT_TICK_TIME
            && body.local_velocity().z < config.falling_speed_threshold;

        if !body.in_water && body.water_coverage > 0.0 {
            body.in_water = true;
            events.emit(LocomotionEvent::EnterLiquid {
                coverage: body.water_coverage,
            });
        } else if body.in_water && body.water_coverage <= 0.0 {
            body.in_water = false;
            events.emit(LocomotionEvent::LeaveLiquid);
        }

        frame.pose_changed = self.update_pose(body, command, world);
        body.move_motion = command.has_movement_input();

        frame
    }

    fn update_orientation(&self, body: &mut PlayerBody, command: &MoveCommand, frame: &MoveFrame) {
        let config = &self.config;
        let traversing = body.is_traversing();

        if !traversing {
            body.rotation.x = 0.0;
            body.rotation.y = 0.0;
        }

        let mut pitch = wrap_angle_pi(command.pitch);
        if body.pose == Pose::Sprint {
            pitch *= config.sprint_pitch_scale;
        }
        body.head.x = (body.head.x + pitch).clamp(config.min_look_angle, config.max_look_angle);

        let yaw = wrap_angle_pi(command.yaw);
        if command.freelook && !body.first_person {
            body.head.z = (body.head.z + yaw).clamp(-config.max_freelook_angle, config.max_freelook_angle);
        } else if body.first_person {
            body.rotation.z += yaw;
        }

        if traversing {
            let normal = if body.ledge.active {
                body.ledge.normal
            } else if body.climb.active {
                body.climb.normal
            } else {
                body.wall_hug.normal
            };
            let (goal_yaw, goal_pitch) = angles_from_vector(-normal);
            let mut delta = Vec3::new(goal_pitch, 0.0, goal_yaw) - body.rotation;
            delta.z = wrap_angle_pi(delta.z);
            body.rotation += delta * SURFACE_FACING_EASE;
        } else if !body.first_person && !body.jump.is_crouching && frame.move_vec.length() > 0.0 {
            let (goal_yaw, _) = angles_from_vector(frame.move_vec);
            let delta = wrap_angle_pi(goal_yaw - body.rotation.z);
            let rate = if body.contact_timer == 0 {
                config.ground_turn_rate
            } else {
                config.air_turn_rate
            } * TICK_SEC;
            let turn = delta.clamp(-rate, rate);
            body.rotation.z += turn;

            if body.contact_timer == 0 && !body.jump.active {
                body.velocity = rotate_about_up(body.velocity, turn);
            }
        }

        body.rotation.z = wrap_angle_2pi(body.rotation.z);
    }

    fn update_contact(
        &self,
        body: &mut PlayerBody,
        world: &dyn WorldQuery,
        frame: &mut MoveFrame,
        events: &mut dyn EventSink,
    ) {
        body.run_surface = false;
        body.jump_surface = false;
        body.slide_surface = false;

        let contact = find_ground_contact(world, body, &self.config);
        body.climb_trigger_count = contact.climb_trigger_count;
        for overlap in &contact.overlaps {
            events.emit(match *overlap {
                Overlap::Trigger(object) => LocomotionEvent::TriggerOverlap(object),
                Overlap::Collision {
                    object,
                    relative_velocity,
                } => LocomotionEvent::QueueCollision {
                    object,
                    relative_velocity,
                },
            });
        }

        if body.mounted || body.swimming {
            body.contact = ContactInfo::default();
            return;
        }

        body.run_surface = contact.info.run;
        body.jump_surface = contact.info.jump;
        body.slide_surface = contact.info.slide;
        frame.contact_normal = contact.info.normal;
        body.contact = contact.info;
    }

    fn land(
        &self,
        body: &mut PlayerBody,
        player: &mut dyn AnimationPlayer,
        frame: &mut MoveFrame,
        events: &mut dyn EventSink,
    ) {
        let jump_type = body.jump.active.then_some(body.jump.jump_type);
        let action = match jump_type {
            Some(JumpType::Run) => Action::RunningLand,
            _ => Action::StandingLand,
        };
        log::debug!("landed ({:?})", action);

        set_action(&mut body.action, player, ActionRequest::new(action).wait());
        frame.action_changed = true;

        body.land.active = true;
        body.land.timer = self.config.land_duration;

        events.emit(LocomotionEvent::Landed(jump_type));
        events.emit(LocomotionEvent::Sound(SoundCue::Land));
    }

    fn run_on_ground(
        &self,
        body: &mut PlayerBody,
        command: &MoveCommand,
        player: &mut dyn AnimationPlayer,
        frame: &mut MoveFrame,
    ) {
        let config = &self.config;
        body.contact_timer = 0;
        body.jumping = false;

        let mut pv = if body.pose == Pose::Sprint && body.energy >= config.min_sprint_energy {
            if frame.move_speed > 0.0 {
                body.energy -= config.sprint_energy_drain;
            }
            frame.move_vec
        } else if body.energy >= config.min_run_energy {
            if frame.move_speed > 0.0 {
                body.energy -= config.run_energy_drain;
            }
            if body.velocity.length() < 1.0 || body.first_person {
                frame.move_vec
            } else {
                with_length(body.forward(), frame.move_vec.length())
            }
        } else {
            Vec3::ZERO
        };

        if body.land.active {
            if !body.action.action.is_land() {
                body.land.active = false;
            } else if body.land.timer > 0.0 {
                frame.move_speed *= config.land_speed_factor;
                body.land.timer -= TICK_MS as f32;
            } else if frame.move_vec.length() > 0.0 || command.jump() {
                body.land.active = false;
                body.action.cancel();
                frame.action_changed = true;
            }
        }

        let pvl = if body.jetting {
            frame.move_vec.length()
        } else {
            pv = project_along_slope(pv, frame.contact_normal);
            pv.length()
        };
        if pvl > 0.0 {
            pv *= frame.move_speed / pvl;
        }

        let max_acc = config.max_force_for(body.pose) / config.mass * TICK_SEC;
        let run_acc = (pv - (body.velocity + frame.acc)).clamp_length_max(max_acc);
        frame.acc += run_acc;

        if body.velocity.length() > 0.01 && body.velocity.dot(run_acc) < -0.01 {
            body.stopping_timer += TICK_MS;
        } else {
            body.stopping_timer = 0;
        }

        if body.stopping_timer > CONTACT_TICK_TIME
            && body.action.action == Action::RunForward
            && body.velocity.length() > config.walk_run_anim_velocity
        {
            set_action(&mut body.action, player, ActionRequest::new(Action::Stop).wait());
            frame.action_changed = true;
        }
        if body.action.action == Action::Stop && body.stopping_timer == 0 {
            body.action.cancel();
            frame.action_changed = true;
        }

        if !body.jump.is_crouching {
            body.jump.active = false;
        }
    }

    fn air_control(&self, body: &mut PlayerBody, frame: &mut MoveFrame) {
        let config = &self.config;

        let mut pv = frame.move_vec;
        let pvl = pv.length();
        if pvl > 0.0 {
            pv *= frame.move_speed / pvl;
        }

        let mut run_acc = pv - (body.velocity + frame.acc);
        run_acc.x *= config.air_control;
        run_acc.y *= config.air_control;
        run_acc.z = 0.0;

        let max_acc = config.run_force / config.mass * TICK_SEC * AIR_FORCE_SCALE;
        frame.acc += run_acc.clamp_length_max(max_acc);
        body.contact_timer += TICK_MS;
    }

    fn swim(&self, body: &mut PlayerBody, frame: &mut MoveFrame) {
        let config = &self.config;

        // Do not accelerate into whatever is underfoot
        let into = -frame.acc.dot(frame.contact_normal);
        if into > 0.0 {
            frame.acc += frame.contact_normal * (into + 0.002);
            if frame.acc.length() < 0.0001 {
                frame.acc = Vec3::ZERO;
            }
        }

        let look = body.head.x;
        let dir = body.forward() * look.cos() + UP * look.sin();

        let mut swim_vec = if body.energy >= config.min_run_energy {
            if frame.move_speed > 0.0 {
                body.energy -= config.run_energy_drain;
            }
            dir
        } else {
            Vec3::ZERO
        };
        let len = swim_vec.length();
        if len > 0.0 {
            swim_vec *= frame.move_speed / len;
        }

        frame.acc += swim_vec - (body.velocity + frame.acc);
        body.contact_timer += TICK_MS;
    }

    fn apply_resistance(&self, body: &mut PlayerBody, command: &MoveCommand, frame: &MoveFrame) {
        let config = &self.config;
        let v = &mut body.velocity;

        let horizontal = v.truncate().length();
        if horizontal > config.horiz_resist_speed {
            let mut capped = horizontal.min(config.horiz_max_speed);
            capped -= config.horiz_resist_factor * TICK_SEC * (capped - config.horiz_resist_speed);
            let scale = capped / horizontal;
            v.x *= scale;
            v.y *= scale;
        }

        if v.z > config.up_resist_speed {
            v.z = v.z.min(config.up_max_speed);
            v.z -= config.up_resist_factor * TICK_SEC * (v.z - config.up_resist_speed);
        }

        if frame.contact_normal != Vec3::ZERO {
            let friction = if body.slide_surface {
                config.ground_friction * frame.contact_normal.z.abs()
            } else {
                config.ground_friction
            };
            *v -= *v * friction * TICK_SEC;
        }

        let vert_drag = if body.falling && command.jump() {
            config.vert_drag_falling
        } else {
            config.vert_drag
        };
        let drag = Vec3::new(config.drag, config.drag, vert_drag);
        if body.swimming {
            *v -= *v * drag * TICK_SEC * (v.length() / config.max_underwater_speed);
        } else {
            *v -= *v * drag * TICK_SEC;
        }

        *v = v.clamp(Vec3::splat(-MAX_VELOCITY), Vec3::splat(MAX_VELOCITY));
    }
}

/// Tilt a horizontal run vector into the ground plane, keeping its heading.
fn project_along_slope(pv: Vec3, normal: Vec3) -> Vec3 {
    let len = pv.length();
    if len == 0.0 {
        return pv;
    }
    let side = pv.cross(UP) / len;
    let cv = normal - side * side.dot(normal);
    pv - cv * pv.dot(cv)
}
