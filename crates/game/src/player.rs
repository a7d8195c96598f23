//! Player entity: one body, its animation thread and its replication state.
//!
//! The physics crate only knows how to advance a [`PlayerBody`] by one tick.
//! [`Player`] wraps that with everything a host needs around it:
//!
//! - render interpolation between the last two ticks, including the
//!   render-only ground snap on slopes
//! - dirty tracking and delta updates for remote copies
//! - warp correction when the server disagrees with a prediction

use std::sync::Arc;

use glam::Vec3;
use strider_physics::geometry::{wrap_angle_2pi, wrap_angle_pi};
use strider_physics::movement::animation::set_action;
use strider_physics::{
    AnimationPlayer, Authority, ClipPlayer, ContentFlags, EventSink, MoveCommand, PlayerBody, PlayerController,
    TickReport, WorldQuery,
};
use strider_protocol::{CodecError, DirtyMask, PacketData, TransformUpdate, UpdatePacket};

use crate::config::ReplicationConfig;

/// Unique identifier for entities.
pub type EntityId = u32;

/// Velocity at which the slide loop is at full volume.
const SLIDE_SOUND_FULL_SPEED: f32 = 16.0;

/// Stopping timer (ms) above which a stop counts as a skid.
const SLIDE_SOUND_STOP_TIME: i32 = 16;

/// Transform of the last tick, and how to get back to the one before it.
///
/// Render state at backward fraction `dt` is `pos + pos_vec * dt`, so
/// `dt = 0` is the newest tick and `dt = 1` the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InterpolationDelta {
    pub pos: Vec3,
    pub pos_vec: Vec3,
    pub rot: Vec3,
    pub rot_vec: Vec3,

    /// Per-tick share of a pending server correction.
    pub warp_offset: Vec3,
    pub rot_offset: Vec3,

    /// Ticks left before the correction is fully applied.
    pub warp_ticks: u32,
}

/// What to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub position: Vec3,
    pub rotation: Vec3,

    /// Ledge climb-up clip position while climbing up.
    pub ledge_anim_pos: Option<f32>,
}

/// Parameters of the looping slide sound.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlideSound {
    pub active: bool,
    pub volume: f32,
    pub pitch: f32,
}

/// A player in the game.
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique player ID.
    pub id: EntityId,

    /// Player name/handle.
    pub name: String,

    /// Simulation state.
    pub body: PlayerBody,

    pub animation: ClipPlayer,

    /// Groups changed since the last [`Player::pack_update`].
    pub dirty: DirtyMask,

    pub delta: InterpolationDelta,

    /// Render-only vertical offset keeping feet on slopes.
    pub ground_snap: f32,

    controller: Arc<PlayerController>,
    authority: Authority,
    replication: ReplicationConfig,
}

impl Player {
    /// Create a server-side player at the given spawn position.
    pub fn new(id: EntityId, name: String, spawn_position: Vec3, controller: Arc<PlayerController>) -> Self {
        let body = PlayerBody::new(spawn_position, controller.config());
        let delta = InterpolationDelta {
            pos: body.position,
            rot: body.rotation,
            ..Default::default()
        };
        Self {
            id,
            name,
            body,
            animation: ClipPlayer::standard(),
            dirty: DirtyMask::INITIAL,
            delta,
            ground_snap: 0.0,
            controller,
            authority: Authority::Server,
            replication: ReplicationConfig::default(),
        }
    }

    pub fn with_authority(mut self, authority: Authority) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_replication(mut self, replication: ReplicationConfig) -> Self {
        self.replication = replication;
        self
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Get the player's current position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    #[inline]
    pub fn is_warping(&self) -> bool {
        self.delta.warp_ticks > 0
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Run one fixed tick.
    ///
    /// While a server correction is being spread out the tick applies the
    /// next share of it instead of simulating, and `None` is returned.
    pub fn process_tick(
        &mut self,
        command: &MoveCommand,
        world: &dyn WorldQuery,
        events: &mut dyn EventSink,
    ) -> Option<TickReport> {
        if self.delta.warp_ticks > 0 {
            self.advance_warp();
            return None;
        }

        let start_pos = self.body.position;
        let start_rot = self.body.rotation;

        let report = self.controller.process_tick(
            &mut self.body,
            command,
            world,
            &mut self.animation,
            events,
            self.authority,
        );

        self.delta.pos = self.body.position;
        self.delta.pos_vec = start_pos - self.body.position;
        self.delta.rot = self.body.rotation;
        self.delta.rot_vec = rotation_delta(start_rot, self.body.rotation);

        let mut dirty = DirtyMask::from_report(&report);
        if start_pos != self.body.position {
            dirty.insert(DirtyMask::MOVE);
        }
        if start_rot != self.body.rotation {
            dirty.insert(DirtyMask::TRANSFORM);
        }
        self.dirty |= dirty;

        Some(report)
    }

    fn advance_warp(&mut self) {
        self.delta.warp_ticks -= 1;

        self.body.position += self.delta.warp_offset;
        self.body.rotation += self.delta.rot_offset;
        self.body.rotation.z = wrap_angle_2pi(self.body.rotation.z);

        self.delta.pos = self.body.position;
        self.delta.rot = self.body.rotation;
        self.delta.pos_vec = -self.delta.warp_offset;
        self.delta.rot_vec = -self.delta.rot_offset;

        self.controller
            .update_ledge_up_animation(&mut self.body, &mut self.animation, self.authority);
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Render transform at backward fraction `dt` between the last two
    /// ticks (0 = newest).
    ///
    /// Only presentation state changes: the ground snap offset and the
    /// climb-up clip position.
    pub fn interpolate_tick(&mut self, dt: f32, world: &dyn WorldQuery) -> RenderState {
        let mut position = self.delta.pos + self.delta.pos_vec * dt;
        let mut rotation = self.delta.rot + self.delta.rot_vec * dt;
        rotation.z = wrap_angle_2pi(rotation.z);

        self.update_ground_snap(position, dt, world);
        position.z += self.ground_snap;

        let ledge_anim_pos = if self.body.ledge.climbing_up {
            let anim_pos = (self.body.ledge.delta_anim_pos + self.body.ledge.delta_anim_pos_vec * dt).clamp(0.0, 1.0);
            self.animation.clear_transition();
            self.animation.set_position(anim_pos);
            Some(anim_pos)
        } else {
            None
        };

        RenderState {
            position,
            rotation,
            ledge_anim_pos,
        }
    }

    fn update_ground_snap(&mut self, position: Vec3, dt: f32, world: &dyn WorldQuery) {
        let body = &self.body;
        if body.jumping || body.climb.active || body.ledge.active || body.swimming {
            self.ground_snap = 0.0;
            return;
        }

        let config = self.controller.config();
        let ray_start = position + body.forward() * config.ground_snap_ray_offset;
        let ray_end = ray_start - Vec3::Z * config.ground_snap_ray_length;

        // Flat ground needs no snap
        let goal = match world.cast_ray(ray_start, ray_end, ContentFlags::MASK_PLAYER_MOVE) {
            Some(hit) if hit.normal.z < 1.0 - 1e-4 => hit.point.z - ray_start.z,
            _ => 0.0,
        };

        if dt <= 0.0 {
            return;
        }
        let step = config.ground_snap_speed * dt;
        let diff = goal - self.ground_snap;
        if diff.abs() < step || diff > 0.0 {
            self.ground_snap = goal;
        } else {
            self.ground_snap -= step;
        }
    }

    /// Advance presentation by frame time `dt` seconds.
    ///
    /// Clients drive their animation here; the server does it inside the
    /// tick.
    pub fn advance_time(&mut self, dt: f32) -> SlideSound {
        if self.authority == Authority::Client {
            self.animation.advance(dt);
        }
        self.slide_sound()
    }

    pub fn slide_sound(&self) -> SlideSound {
        let body = &self.body;
        let speed = body.velocity.length();
        let skidding = body.slide.active || body.stopping_timer > SLIDE_SOUND_STOP_TIME;
        if !skidding || !(body.run_surface || body.slide_surface) || speed <= 0.01 {
            return SlideSound::default();
        }

        let f = (speed / SLIDE_SOUND_FULL_SPEED).clamp(0.0, 1.0);
        SlideSound {
            active: true,
            volume: f,
            pitch: 0.75 * (1.0 - f) + 1.25 * f,
        }
    }

    /// Teleport without interpolating from the old position.
    pub fn set_position(&mut self, position: Vec3) {
        self.body.position = position;
        self.delta.pos = position;
        self.delta.pos_vec = Vec3::ZERO;
        self.delta.warp_ticks = 0;
        self.dirty.insert(DirtyMask::TRANSFORM);
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.body.rotation = Vec3::new(rotation.x, rotation.y, wrap_angle_2pi(rotation.z));
        self.delta.rot = self.body.rotation;
        self.delta.rot_vec = Vec3::ZERO;
        self.dirty.insert(DirtyMask::TRANSFORM);
    }

    // ========================================================================
    // Replication
    // ========================================================================

    /// Full snapshot for the controlling client.
    pub fn write_packet(&self) -> PacketData {
        PacketData::capture(&self.body)
    }

    /// Rewind to a server snapshot. Any interpolation or warp in flight is
    /// dropped.
    pub fn read_packet(&mut self, packet: &PacketData) -> Result<(), CodecError> {
        packet.apply(&mut self.body)?;
        self.delta = InterpolationDelta {
            pos: self.body.position,
            rot: self.body.rotation,
            ..Default::default()
        };
        Ok(())
    }

    /// Build a delta update for `mask` and clear those bits.
    pub fn pack_update(&mut self, mask: DirtyMask) -> UpdatePacket {
        let packet = UpdatePacket::pack(&self.body, mask);
        self.dirty.remove(mask);
        packet
    }

    /// Delta update for everything pending, if anything is.
    pub fn take_update(&mut self) -> Option<UpdatePacket> {
        if self.dirty.is_empty() {
            return None;
        }
        Some(self.pack_update(self.dirty))
    }

    pub fn unpack_update(&mut self, packet: &UpdatePacket) -> Result<(), CodecError> {
        let received = packet.unpack(&mut self.body)?;

        if let Some(request) = received.action {
            set_action(&mut self.body.action, &mut self.animation, request);
        }
        if let Some(transform) = received.transform {
            self.apply_transform(&transform);
        }
        Ok(())
    }

    /// Blend toward the server transform over a few ticks, or snap if it is
    /// too far away.
    fn apply_transform(&mut self, transform: &TransformUpdate) {
        self.body.velocity = transform.velocity;
        self.body.head = transform.head;

        let offset = transform.position - self.body.position;
        let rot_offset = rotation_delta(self.body.rotation, transform.rotation);
        let ticks = self.replication.warp_ticks;

        if offset.length() < self.replication.max_warp_distance && ticks > 0 {
            if offset.length_squared() < 1e-12 && rot_offset.length_squared() < 1e-12 {
                return;
            }
            log::trace!("player {} warping {:?} over {} ticks", self.id, offset, ticks);
            self.delta.warp_offset = offset / ticks as f32;
            self.delta.rot_offset = rot_offset / ticks as f32;
            self.delta.warp_ticks = ticks;
        } else {
            log::debug!("player {} snapped {:.2} m to server position", self.id, offset.length());
            self.set_position(transform.position);
            self.set_rotation(transform.rotation);
        }
    }
}

/// `to - from` with the yaw difference taken the short way round.
fn rotation_delta(from: Vec3, to: Vec3) -> Vec3 {
    let mut delta = to - from;
    delta.z = wrap_angle_pi(delta.z);
    delta
}
