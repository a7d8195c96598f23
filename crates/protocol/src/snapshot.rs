//! Full corrective snapshot of a player body.
//!
//! Sent to the controlling client so it can rewind its prediction to the
//! server's state. Enum fields travel as wire indices and are checked on
//! [`PacketData::apply`], so a corrupt snapshot is rejected instead of
//! panicking.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strider_physics::movement::{
    DamageState, JumpState, JumpType, LandState, LedgeState, MoveDir, PlayerBody, Pose, SlideState,
    SurfaceHoldState,
};

use crate::codec::CodecError;

/// Climb or wall hug adherence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldData {
    pub active: bool,
    pub normal: Vec3,
    pub direction: u8,
    pub ignore: bool,
}

impl HoldData {
    fn capture(hold: &SurfaceHoldState) -> Self {
        Self {
            active: hold.active,
            normal: hold.normal,
            direction: hold.direction.index(),
            ignore: hold.ignore,
        }
    }

    fn restore(&self, field: &'static str) -> Result<SurfaceHoldState, CodecError> {
        Ok(SurfaceHoldState {
            active: self.active,
            normal: self.normal,
            direction: move_dir(field, self.direction)?,
            ignore: self.ignore,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgeData {
    pub active: bool,
    pub normal: Vec3,
    pub point: Vec3,
    pub direction: u8,
    pub ignore: bool,
    pub climbing_up: bool,
    pub anim_pos: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpData {
    pub active: bool,
    pub is_crouching: bool,
    pub crouch_delay: f32,
    pub jump_type: u8,
}

/// Everything the client needs to resume predicting from the server's
/// state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketData {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    pub head: Vec3,
    pub energy: f32,
    pub pose: u8,
    pub damage: u8,

    pub contact_timer: i32,
    pub jump_delay: u32,
    pub jump_surface_last_contact: u32,
    pub jumping: bool,
    pub falling: bool,
    pub jetting: bool,

    pub slide: SlideState,
    pub jump: JumpData,
    pub climb: HoldData,
    pub climb_trigger_count: u32,
    pub wall_hug: HoldData,
    pub ledge: LedgeData,
    pub land: LandState,
    pub stopping_timer: i32,
}

impl PacketData {
    pub fn capture(body: &PlayerBody) -> Self {
        Self {
            position: body.position,
            velocity: body.velocity,
            rotation: body.rotation,
            head: body.head,
            energy: body.energy,
            pose: body.pose.index(),
            damage: body.damage.index(),
            contact_timer: body.contact_timer,
            jump_delay: body.jump_delay,
            jump_surface_last_contact: body.jump_surface_last_contact,
            jumping: body.jumping,
            falling: body.falling,
            jetting: body.jetting,
            slide: body.slide,
            jump: JumpData {
                active: body.jump.active,
                is_crouching: body.jump.is_crouching,
                crouch_delay: body.jump.crouch_delay,
                jump_type: body.jump.jump_type.index(),
            },
            climb: HoldData::capture(&body.climb),
            climb_trigger_count: body.climb_trigger_count,
            wall_hug: HoldData::capture(&body.wall_hug),
            ledge: LedgeData {
                active: body.ledge.active,
                normal: body.ledge.normal,
                point: body.ledge.point,
                direction: body.ledge.direction.index(),
                ignore: body.ledge.ignore,
                climbing_up: body.ledge.climbing_up,
                anim_pos: body.ledge.anim_pos,
            },
            land: body.land,
            stopping_timer: body.stopping_timer,
        }
    }

    /// Check every wire index without touching a body.
    pub fn validate(&self) -> Result<(), CodecError> {
        self.apply(&mut PlayerBody::default())
    }

    /// Write the snapshot into `body`. Leaves `body` untouched if any wire
    /// index is out of range.
    pub fn apply(&self, body: &mut PlayerBody) -> Result<(), CodecError> {
        let pose = Pose::from_index(self.pose).ok_or(CodecError::InvalidValue {
            field: "pose",
            value: self.pose,
        })?;
        let damage = DamageState::from_index(self.damage).ok_or(CodecError::InvalidValue {
            field: "damage",
            value: self.damage,
        })?;
        let jump_type = JumpType::from_index(self.jump.jump_type).ok_or(CodecError::InvalidValue {
            field: "jump.jump_type",
            value: self.jump.jump_type,
        })?;
        let climb = self.climb.restore("climb.direction")?;
        let wall_hug = self.wall_hug.restore("wall_hug.direction")?;
        let ledge_direction = move_dir("ledge.direction", self.ledge.direction)?;

        body.position = self.position;
        body.velocity = self.velocity;
        body.rotation = self.rotation;
        body.head = self.head;
        body.energy = self.energy;
        body.pose = pose;
        body.damage = damage;
        body.contact_timer = self.contact_timer;
        body.jump_delay = self.jump_delay;
        body.jump_surface_last_contact = self.jump_surface_last_contact;
        body.jumping = self.jumping;
        body.falling = self.falling;
        body.jetting = self.jetting;
        body.slide = self.slide;
        body.jump = JumpState {
            active: self.jump.active,
            is_crouching: self.jump.is_crouching,
            crouch_delay: self.jump.crouch_delay,
            jump_type,
        };
        body.climb = climb;
        body.climb_trigger_count = self.climb_trigger_count;
        body.wall_hug = wall_hug;
        body.ledge = LedgeState {
            active: self.ledge.active,
            normal: self.ledge.normal,
            point: self.ledge.point,
            direction: ledge_direction,
            ignore: self.ledge.ignore,
            climbing_up: self.ledge.climbing_up,
            anim_pos: self.ledge.anim_pos,
            delta_anim_pos: self.ledge.anim_pos,
            delta_anim_pos_vec: 0.0,
        };
        body.land = self.land;
        body.stopping_timer = self.stopping_timer;
        Ok(())
    }
}

fn move_dir(field: &'static str, value: u8) -> Result<MoveDir, CodecError> {
    MoveDir::from_index(value).ok_or(CodecError::InvalidValue { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_physics::PlayerConfig;

    /// Halfway through a climb, sliding left.
    fn mid_climb_body() -> PlayerBody {
        let mut body = PlayerBody::new(Vec3::new(3.0, -2.0, 1.25), &PlayerConfig::default());
        body.velocity = Vec3::new(-1.0, 0.0, 0.0);
        body.rotation = Vec3::new(0.1, 0.0, 1.5);
        body.head = Vec3::new(-0.3, 0.0, 0.2);
        body.energy = 42.5;
        body.climb_trigger_count = 2;
        body.climb.active = true;
        body.climb.normal = Vec3::NEG_Y;
        body.climb.direction = MoveDir::Left;
        body.jump_delay = 2;
        body.stopping_timer = 32;
        body.land.timer = 12.0;
        body.jump.jump_type = JumpType::Stand;
        body
    }

    #[test]
    fn test_capture_apply_restores_body() {
        let body = mid_climb_body();
        let data = PacketData::capture(&body);

        let mut restored = PlayerBody::default();
        data.apply(&mut restored).unwrap();

        assert_eq!(restored.position, body.position);
        assert_eq!(restored.rotation, body.rotation);
        assert_eq!(restored.climb, body.climb);
        assert_eq!(restored.climb_trigger_count, 2);
        assert_eq!(restored.jump, body.jump);
        assert_eq!(restored.land, body.land);
        assert_eq!(restored.energy, 42.5);
        assert_eq!(PacketData::capture(&restored), data);
    }

    #[test]
    fn test_apply_resets_ledge_interpolation() {
        let mut body = PlayerBody::default();
        body.ledge.active = true;
        body.ledge.climbing_up = true;
        body.ledge.anim_pos = 0.6;
        body.ledge.delta_anim_pos_vec = -0.03;

        let data = PacketData::capture(&body);
        let mut restored = PlayerBody::default();
        data.apply(&mut restored).unwrap();

        assert_eq!(restored.ledge.anim_pos, 0.6);
        assert_eq!(restored.ledge.delta_anim_pos, 0.6);
        assert_eq!(restored.ledge.delta_anim_pos_vec, 0.0);
    }

    #[test]
    fn test_bad_index_leaves_body_untouched() {
        let mut data = PacketData::capture(&mid_climb_body());
        data.ledge.direction = 9;

        let mut body = PlayerBody::default();
        let err = data.apply(&mut body).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidValue {
                field: "ledge.direction",
                value: 9
            }
        ));
        assert_eq!(body, PlayerBody::default());
        assert!(data.validate().is_err());
    }
}
