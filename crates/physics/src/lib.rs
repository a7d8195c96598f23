//! Strider Physics Engine
//!
//! A deterministic third-person locomotion core: running, jumping, sliding,
//! swimming, climbing, wall hugging and ledge grabbing against arbitrary
//! world geometry, stepped at a fixed 32 ms tick.
//!
//! # Architecture
//!
//! The engine is split into four systems:
//!
//! - **Geometry**: Boxes, planes and angle helpers
//! - **Collision**: The [`WorldQuery`] contract and an in-memory world
//! - **Surface**: Classifies the faces around the body (ground, climb, wall, ledge)
//! - **Movement**: The state machine and sweep-and-slide resolver
//!
//! # Design Principles
//!
//! 1. **Determinism**: Same inputs always produce same outputs
//! 2. **Host agnostic**: World, animation and events are traits the host implements
//! 3. **Plain data**: All simulation state is in serializable structs

pub mod collision;
pub mod geometry;
pub mod movement;
pub mod surface;

// Re-export commonly used types
pub use collision::{CollisionWorld, ContentFlags, ObjectId, SurfaceCaps, VolumeKind, WorldQuery};
pub use geometry::{Aabb, Plane};
pub use movement::{
    Action, AnimationPlayer, Authority, ClipPlayer, CommandTriggers, EventSink, LocomotionEvent, MoveCommand,
    PlayerBody, PlayerConfig, PlayerController, Pose, TickReport,
};
