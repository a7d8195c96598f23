//! Player movement state machine.
//!
//! This module implements third-person traversal movement with:
//!
//! - Ground running, air control and swimming
//! - Crouch, prone and sprint poses
//! - Timed jumps with a crouch wind-up, plus an optional jet
//! - Climbing, wall hugging and ledge grabbing with climb-up
//! - Landing and stopping penalties
//! - Sweep-and-slide collision with stair stepping
//!
//! # Design
//!
//! Movement is driven by the [`PlayerController`], which takes a
//! [`MoveCommand`] each 32 ms tick and updates the [`PlayerBody`] through a
//! [`WorldQuery`](crate::collision::WorldQuery).
//!
//! The controller holds only configuration. All mutable state is in the
//! body, so the same inputs always produce the same outputs and a client can
//! rewind to a server snapshot and replay its commands.

pub mod animation;
pub mod constants;
mod config;
mod controller;
mod events;
mod jump;
mod pose;
pub mod resolver;
mod state;
mod traversal;

pub use animation::{Action, ActionAnimation, AnimationPlayer, Clip, ClipPlayer, SequenceId};
pub use config::{ConfigError, PlayerConfig};
pub use controller::{Authority, MoveFrame, PlayerController, TickReport};
pub use events::{EventSink, LocomotionEvent, SoundCue};
pub use jump::{JumpState, JumpType};
pub use pose::Pose;
pub use resolver::MoveOutcome;
pub use state::{
    ClimbState, CommandTriggers, DamageState, LandState, LedgeState, MoveCommand, MoveDir, PlayerBody, SimState,
    SlideState, SurfaceHoldState, WallHugState,
};
