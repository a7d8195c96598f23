//! Player body state and input commands.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::animation::ActionAnimation;
use super::config::PlayerConfig;
use super::jump::JumpState;
use super::pose::Pose;
use crate::geometry::{forward_from_yaw, right_from_yaw, world_to_object, Aabb};
use crate::surface::ContactInfo;

/// Life state of the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageState {
    #[default]
    Enabled,
    Disabled,
    Destroyed,
}

impl DamageState {
    pub const ALL: [DamageState; 3] = [DamageState::Enabled, DamageState::Disabled, DamageState::Destroyed];

    /// Wire index.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Whether the body accepts movement input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimState {
    #[default]
    Move,
    /// Input is ignored until the host returns the body to `Move`.
    Recover,
}

/// Direction of travel along a climb surface, wall or ledge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDir {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    pub const ALL: [MoveDir; 5] = [MoveDir::None, MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

    /// Wire index.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Adherence to a near-vertical surface. Used for both climbing and wall
/// hugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHoldState {
    pub active: bool,

    /// Surface normal; the player faces its opposite.
    pub normal: Vec3,

    pub direction: MoveDir,

    /// Set on an explicit exit; blocks re-entry until the trigger input is
    /// released.
    pub ignore: bool,
}

pub type ClimbState = SurfaceHoldState;
pub type WallHugState = SurfaceHoldState;

/// Hanging from a ledge, optionally pulling up over it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgeState {
    pub active: bool,

    /// Horizontal normal of the ledge edge, pointing at the player.
    pub normal: Vec3,

    /// Grab point on the edge.
    pub point: Vec3,

    pub direction: MoveDir,
    pub ignore: bool,

    pub climbing_up: bool,

    /// Climb-up progress in `[0, 1]`.
    pub anim_pos: f32,

    /// Progress at the start of the current tick, for interpolation.
    pub delta_anim_pos: f32,

    /// Change of progress over the current tick, negated.
    pub delta_anim_pos_vec: f32,
}

impl LedgeState {
    /// Drop every ledge and climb-up field.
    pub fn clear(&mut self) {
        *self = Self {
            ignore: self.ignore,
            ..Default::default()
        };
    }
}

/// Sliding down a surface too steep to run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideState {
    pub active: bool,
    pub normal: Vec3,
}

/// Speed penalty after touching down from a fall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandState {
    pub active: bool,

    /// Remaining penalty (ms).
    pub timer: f32,
}

/// The simulated player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBody {
    /// Feet position in world space.
    pub position: Vec3,

    /// Body rotation: x pitch, y roll, z yaw.
    pub rotation: Vec3,

    /// Head rotation relative to the body: x look pitch, z freelook yaw.
    pub head: Vec3,

    pub velocity: Vec3,
    pub scale: Vec3,
    pub energy: f32,
    pub pose: Pose,
    pub damage: DamageState,
    pub sim_state: SimState,
    pub mounted: bool,
    pub first_person: bool,

    /// External force from physical zones.
    pub applied_force: Vec3,

    /// Time since the last ground contact (ms).
    pub contact_timer: i32,

    pub run_surface: bool,
    pub jump_surface: bool,
    pub slide_surface: bool,
    pub contact: ContactInfo,

    pub jumping: bool,
    pub falling: bool,
    pub jetting: bool,
    pub swimming: bool,
    pub in_water: bool,
    pub water_coverage: f32,

    /// Ticks until the next jump is allowed.
    pub jump_delay: u32,

    /// Ticks since the last jump surface contact.
    pub jump_surface_last_contact: u32,

    /// Climb zones the body currently overlaps.
    pub climb_trigger_count: u32,

    /// Time spent decelerating against input (ms).
    pub stopping_timer: i32,

    pub climb: ClimbState,
    pub wall_hug: WallHugState,
    pub ledge: LedgeState,
    pub slide: SlideState,
    pub jump: JumpState,
    pub land: LandState,

    pub action: ActionAnimation,

    /// Whether there was directional input last tick.
    pub move_motion: bool,
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            head: Vec3::ZERO,
            velocity: Vec3::ZERO,
            scale: Vec3::ONE,
            energy: 0.0,
            pose: Pose::Stand,
            damage: DamageState::Enabled,
            sim_state: SimState::Move,
            mounted: false,
            first_person: false,
            applied_force: Vec3::ZERO,
            contact_timer: 0,
            run_surface: false,
            jump_surface: false,
            slide_surface: false,
            contact: ContactInfo::default(),
            jumping: false,
            falling: false,
            jetting: false,
            swimming: false,
            in_water: false,
            water_coverage: 0.0,
            jump_delay: 0,
            jump_surface_last_contact: 0,
            climb_trigger_count: 0,
            stopping_timer: 0,
            climb: ClimbState::default(),
            wall_hug: WallHugState::default(),
            ledge: LedgeState::default(),
            slide: SlideState::default(),
            jump: JumpState::default(),
            land: LandState::default(),
            action: ActionAnimation::default(),
            move_motion: false,
        }
    }
}

impl PlayerBody {
    /// A standing body at `position` with full energy.
    pub fn new(position: Vec3, config: &PlayerConfig) -> Self {
        Self {
            position,
            energy: config.max_energy,
            ..Default::default()
        }
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.rotation.z
    }

    /// Horizontal facing direction.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.rotation.z)
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        right_from_yaw(self.rotation.z)
    }

    /// Velocity in the body frame (x right, y forward, z up).
    pub fn local_velocity(&self) -> Vec3 {
        world_to_object(self.velocity, self.rotation.z)
    }

    /// Collision box for the current pose, relative to the feet.
    pub fn object_box(&self, config: &PlayerConfig) -> Aabb {
        Aabb::from_size(config.box_for(self.pose) * self.scale)
    }

    /// Collision box for the current pose in world space.
    pub fn world_box(&self, config: &PlayerConfig) -> Aabb {
        self.object_box(config).translated(self.position)
    }

    /// True while climbing, hanging from a ledge or hugging a wall.
    pub fn is_traversing(&self) -> bool {
        self.climb.active || self.ledge.active || self.wall_hug.active
    }

    /// True while the body has recently touched ground.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.contact_timer < super::constants::CONTACT_TICK_TIME
    }
}

/// Button state carried by a [`MoveCommand`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTriggers(pub u16);

impl CommandTriggers {
    pub const JUMP: u16 = 1 << 0;

    /// Hold to fire the jump jet.
    pub const JUMP_JET: u16 = 1 << 1;

    pub const CROUCH: u16 = 1 << 2;
    pub const PRONE: u16 = 1 << 3;
    pub const SPRINT: u16 = 1 << 4;

    /// Check if a trigger is held.
    #[inline]
    pub fn pressed(self, trigger: u16) -> bool {
        (self.0 & trigger) != 0
    }

    #[inline]
    pub fn press(&mut self, trigger: u16) {
        self.0 |= trigger;
    }

    #[inline]
    pub fn release(&mut self, trigger: u16) {
        self.0 &= !trigger;
    }
}

/// Input for one simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Desired direction of travel in world space, already relative to the
    /// camera. Lengths above 1 are normalized.
    pub move_vec: Vec3,

    /// Yaw delta this tick (radians).
    pub yaw: f32,

    /// Pitch delta this tick (radians).
    pub pitch: f32,

    /// Third person: turn the head instead of the body.
    pub freelook: bool,

    pub triggers: CommandTriggers,
}

impl MoveCommand {
    #[inline]
    pub fn jump(&self) -> bool {
        self.triggers.pressed(CommandTriggers::JUMP)
    }

    #[inline]
    pub fn jump_jet(&self) -> bool {
        self.triggers.pressed(CommandTriggers::JUMP_JET)
    }

    #[inline]
    pub fn crouch(&self) -> bool {
        self.triggers.pressed(CommandTriggers::CROUCH)
    }

    #[inline]
    pub fn prone(&self) -> bool {
        self.triggers.pressed(CommandTriggers::PRONE)
    }

    #[inline]
    pub fn sprint(&self) -> bool {
        self.triggers.pressed(CommandTriggers::SPRINT)
    }

    /// Check if any directional input is present.
    #[inline]
    pub fn has_movement_input(&self) -> bool {
        self.move_vec.length_squared() > 0.0
    }
}
