//! Dirty bits marking which state groups need replicating.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use strider_physics::TickReport;

/// Set of state groups changed since the last update was sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirtyMask(pub u32);

impl DirtyMask {
    pub const NONE: DirtyMask = DirtyMask(0);

    /// Position or velocity moved.
    pub const MOVE: DirtyMask = DirtyMask(1 << 0);
    pub const ACTION: DirtyMask = DirtyMask(1 << 1);

    /// Ledge climb-up progress.
    pub const LEDGE_UP: DirtyMask = DirtyMask(1 << 2);

    /// Authoritative transform correction.
    pub const TRANSFORM: DirtyMask = DirtyMask(1 << 3);
    pub const POSE: DirtyMask = DirtyMask(1 << 4);
    pub const DAMAGE: DirtyMask = DirtyMask(1 << 5);

    /// First update for a newly scoped player: everything.
    pub const INITIAL: DirtyMask = DirtyMask(1 << 6);

    pub const ALL: DirtyMask = DirtyMask(0x7f);

    #[inline]
    pub fn contains(self, other: DirtyMask) -> bool {
        (self.0 & other.0) == other.0
    }

    /// True if any bit of `other` is set. `INITIAL` implies every group.
    #[inline]
    pub fn has(self, other: DirtyMask) -> bool {
        (self.0 & (other.0 | Self::INITIAL.0)) != 0
    }

    #[inline]
    pub fn insert(&mut self, other: DirtyMask) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: DirtyMask) {
        self.0 &= !other.0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits raised by one simulated tick.
    pub fn from_report(report: &TickReport) -> Self {
        let mut mask = Self::NONE;
        if report.action_changed {
            mask.insert(Self::ACTION);
        }
        if report.ledge_up_changed {
            mask.insert(Self::LEDGE_UP);
        }
        if report.pose_changed {
            mask.insert(Self::POSE);
        }
        if report.outcome.collision.is_some() || report.outcome.retries > 0 || report.outcome.stepped {
            mask.insert(Self::MOVE);
        }
        mask
    }
}

impl BitOr for DirtyMask {
    type Output = DirtyMask;

    fn bitor(self, rhs: DirtyMask) -> DirtyMask {
        DirtyMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirtyMask {
    fn bitor_assign(&mut self, rhs: DirtyMask) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use strider_physics::movement::MoveOutcome;

    fn report(action: bool, ledge: bool, pose: bool) -> TickReport {
        TickReport {
            action_changed: action,
            ledge_up_changed: ledge,
            pose_changed: pose,
            outcome: MoveOutcome {
                position: Vec3::ZERO,
                collision: None,
                retries: 0,
                stepped: false,
            },
        }
    }

    #[test]
    fn test_mask_ops() {
        let mut mask = DirtyMask::ACTION | DirtyMask::POSE;
        assert!(mask.contains(DirtyMask::ACTION));
        assert!(!mask.contains(DirtyMask::ACTION | DirtyMask::DAMAGE));
        assert!(mask.has(DirtyMask::ACTION | DirtyMask::DAMAGE));

        mask.remove(DirtyMask::ACTION);
        assert_eq!(mask, DirtyMask::POSE);
        mask.remove(DirtyMask::POSE);
        assert!(mask.is_empty());
    }

    #[test]
    fn test_initial_implies_every_group() {
        let mask = DirtyMask::INITIAL;
        assert!(mask.has(DirtyMask::TRANSFORM));
        assert!(mask.has(DirtyMask::LEDGE_UP));
        assert!(!mask.contains(DirtyMask::TRANSFORM));
    }

    #[test]
    fn test_from_report() {
        assert!(DirtyMask::from_report(&report(false, false, false)).is_empty());
        assert_eq!(
            DirtyMask::from_report(&report(true, true, false)),
            DirtyMask::ACTION | DirtyMask::LEDGE_UP
        );

        let mut stepped = report(false, false, true);
        stepped.outcome.stepped = true;
        assert_eq!(DirtyMask::from_report(&stepped), DirtyMask::POSE | DirtyMask::MOVE);
    }
}
