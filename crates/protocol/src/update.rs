//! Delta update sent to every client that has the player in scope.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strider_physics::movement::animation::ActionRequest;
use strider_physics::movement::{Action, DamageState, PlayerBody, Pose};

use crate::codec::CodecError;
use crate::mask::DirtyMask;

/// Server transform, applied by the host as a snap or a warp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    pub head: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionUpdate {
    pub action: u8,
    pub forward: bool,
    pub hold_at_end: bool,
    pub wait_for_end: bool,
    pub at_end: bool,
}

impl ActionUpdate {
    fn action(&self) -> Result<Action, CodecError> {
        Action::from_index(self.action).ok_or(CodecError::InvalidValue {
            field: "action",
            value: self.action,
        })
    }
}

/// Only the groups named by `mask` are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePacket {
    pub mask: DirtyMask,
    pub ledge_anim_pos: Option<f32>,
    pub transform: Option<TransformUpdate>,
    pub action: Option<ActionUpdate>,
    pub pose: Option<u8>,
    pub damage: Option<u8>,
}

/// Parts of an update the host has to apply itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReceivedUpdate {
    pub transform: Option<TransformUpdate>,

    /// Action to force onto the animation thread.
    pub action: Option<ActionRequest>,
}

impl UpdatePacket {
    pub fn pack(body: &PlayerBody, mask: DirtyMask) -> Self {
        let mut packet = Self {
            mask,
            ..Default::default()
        };

        if mask.has(DirtyMask::LEDGE_UP) {
            packet.ledge_anim_pos = Some(body.ledge.anim_pos);
        }
        if mask.has(DirtyMask::TRANSFORM | DirtyMask::MOVE) {
            packet.transform = Some(TransformUpdate {
                position: body.position,
                velocity: body.velocity,
                rotation: body.rotation,
                head: body.head,
            });
        }
        if mask.has(DirtyMask::ACTION) {
            let anim = &body.action;
            packet.action = Some(ActionUpdate {
                action: anim.action.index(),
                forward: anim.forward,
                hold_at_end: anim.hold_at_end,
                wait_for_end: anim.wait_for_end,
                at_end: anim.at_end,
            });
        }
        if mask.has(DirtyMask::POSE) {
            packet.pose = Some(body.pose.index());
        }
        if mask.has(DirtyMask::DAMAGE) {
            packet.damage = Some(body.damage.index());
        }
        packet
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if let Some(action) = &self.action {
            action.action()?;
        }
        if let Some(pose) = self.pose {
            Pose::from_index(pose).ok_or(CodecError::InvalidValue { field: "pose", value: pose })?;
        }
        if let Some(damage) = self.damage {
            DamageState::from_index(damage).ok_or(CodecError::InvalidValue {
                field: "damage",
                value: damage,
            })?;
        }
        Ok(())
    }

    /// Apply the groups that map straight onto body state and hand back the
    /// rest. Leaves `body` untouched on error.
    pub fn unpack(&self, body: &mut PlayerBody) -> Result<ReceivedUpdate, CodecError> {
        self.validate()?;

        if let Some(pos) = self.ledge_anim_pos {
            body.ledge.anim_pos = pos;
            body.ledge.delta_anim_pos = pos;
            body.ledge.delta_anim_pos_vec = 0.0;
        }
        if let Some(pose) = self.pose.and_then(Pose::from_index) {
            body.pose = pose;
        }
        if let Some(damage) = self.damage.and_then(DamageState::from_index) {
            body.damage = damage;
        }

        let action = match &self.action {
            Some(update) => {
                let mut request = ActionRequest::new(update.action()?).force();
                if !update.forward {
                    request = request.reversed();
                }
                if update.hold_at_end {
                    request = request.hold();
                }
                if update.wait_for_end {
                    request = request.wait();
                }
                Some(request)
            }
            None => None,
        };

        Ok(ReceivedUpdate {
            transform: self.transform,
            action,
        })
    }
}
