//! Engine-level movement constants.
//!
//! These are properties of the simulation itself, not of a character, and are
//! therefore not part of [`PlayerConfig`](super::PlayerConfig).

/// Fixed simulation tick in milliseconds.
pub const TICK_MS: i32 = 32;

/// Fixed simulation tick in seconds.
pub const TICK_SEC: f32 = TICK_MS as f32 / 1000.0;

/// Time without ground contact after which the player counts as airborne (ms).
pub const CONTACT_TICK_TIME: i32 = 64;

/// Outward fudge added after snapping to a climb, wall or ledge plane.
pub const SURFACE_DISTANCE: f32 = 0.05;

/// Collisions with `|normal.z|` below this are candidates for a step-up.
pub const VERTICAL_STEP_DOT: f32 = 0.173;

/// Distance the resolver backs off from a struck face.
pub const MIN_FACE_DISTANCE: f32 = 0.01;

/// How far below the feet ground contact is probed.
pub const TRACTION_DISTANCE: f32 = 0.03;

/// Bounce added to the impact response while grounded.
pub const NORMAL_ELASTICITY: f32 = 0.01;

/// Bounce added to the impact response while airborne.
pub const AIR_ELASTICITY: f32 = 0.35;

/// Sweep iterations before the resolver gives up.
pub const MOVE_RETRY_COUNT: u32 = 5;

/// Per-axis velocity clamp.
pub const MAX_VELOCITY: f32 = 10.0;

/// Impact speed above which a landing counts as hard.
pub const HARD_LANDING_SPEED: f32 = 6.8;

/// Ticks after a jump during which jump-surface contacts are ignored.
pub const JUMP_SKIP_CONTACTS_MAX: u32 = 4;

/// Water coverage above which the player swims.
pub const SWIM_COVERAGE: f32 = 0.65;

/// Forward offset of the climb, wall and step probe boxes.
pub const PROBE_FORWARD_OFFSET: f32 = 0.2;

// ============================================================================
// Animation transition times (seconds)
// ============================================================================

pub const TRANSITION_DEFAULT: f32 = 0.25;
pub const TRANSITION_STOP: f32 = 0.15;
pub const TRANSITION_JUMP: f32 = 0.1;
pub const TRANSITION_LEDGE: f32 = 0.1;
pub const TRANSITION_CLIMB: f32 = 0.1;
pub const TRANSITION_LAND: f32 = 0.05;
