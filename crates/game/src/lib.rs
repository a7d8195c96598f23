//! Strider game layer
//!
//! Hosts the locomotion core: it owns player entities, drives the fixed
//! tick, interpolates between ticks for rendering and replicates bodies to
//! remote copies.
//!
//! - Player entities with interpolation and warp correction
//! - Input mapping to movement commands
//! - Test courses, one per traversal feature
//! - JSON configuration files
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Simulation                            │
//! │  ┌─────────┐    ┌────────────────┐    ┌──────────────────┐   │
//! │  │ Input   │───►│ PlayerController│───►│ Player           │   │
//! │  │ (keys)  │    │ (physics crate) │    │ (body, delta,    │   │
//! │  └─────────┘    └────────────────┘    │  dirty mask)     │   │
//! │                                        └────────┬─────────┘   │
//! │                                                 ▼             │
//! │                                   UpdatePacket / PacketData   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod input;
pub mod level;
pub mod player;
pub mod simulation;

// Re-export main types
pub use config::{load_player_config, LoadError, ReplicationConfig, SimulationConfig};
pub use input::PlayerInput;
pub use level::{Course, Level};
pub use player::{EntityId, Player, RenderState, SlideSound};
pub use simulation::Simulation;

// Re-export physics types for convenience
pub use strider_physics::{
    Authority, CollisionWorld, ContentFlags, LocomotionEvent, MoveCommand, PlayerBody, PlayerConfig,
    PlayerController, WorldQuery,
};
