//! Notifications raised by the simulation.
//!
//! The controller never calls into scripts or sound systems directly. It
//! pushes [`LocomotionEvent`]s into whatever [`EventSink`] the host passes in,
//! and the host decides what to do with them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::animation::Action;
use super::jump::JumpType;
use crate::collision::ObjectId;

/// One-shot sounds the host should play at the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Jump,
    Land,
    HardLanding,
    LedgeGrab,
}

/// Something the host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LocomotionEvent {
    EnterSwim,
    LeaveSwim,
    StartSprint,
    StopSprint,

    /// Impact against upward-facing ground faster than the hard landing speed.
    HardLanding { speed: f32 },

    /// A held action animation reached its end.
    AnimationFinished(Action),

    EnterLiquid { coverage: f32 },
    LeaveLiquid,

    Jumped(JumpType),

    /// Ground contact resumed after a fall, carrying the jump that caused it.
    Landed(Option<JumpType>),

    /// The player box touched a trigger volume.
    TriggerOverlap(ObjectId),

    /// The player box overlapped a corpse or item.
    QueueCollision {
        object: ObjectId,
        relative_velocity: Vec3,
    },

    Sound(SoundCue),
}

/// Receiver for [`LocomotionEvent`]s.
pub trait EventSink {
    fn emit(&mut self, event: LocomotionEvent);
}

impl EventSink for Vec<LocomotionEvent> {
    fn emit(&mut self, event: LocomotionEvent) {
        self.push(event);
    }
}

/// Discards everything.
impl EventSink for () {
    fn emit(&mut self, _event: LocomotionEvent) {}
}
