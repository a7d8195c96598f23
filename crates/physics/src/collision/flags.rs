//! Content and capability flags for collision filtering.
//!
//! Content flags say what an object *is* (solid, trigger, water...).
//! Capability flags say what the player may *do* with it (climb, hug, grab,
//! step onto). Both are attached to an object when it enters the world.

use serde::{Deserialize, Serialize};

/// Content flags describe what type of volume something is.
///
/// Used to filter queries: movement sweeps only care about solid geometry,
/// contact scans also look for triggers and pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// Empty space - nothing here.
    pub const EMPTY: Self = Self(0);

    /// Static world geometry - walls, floors, terrain.
    pub const SOLID: Self = Self(1 << 0);

    /// Water volume - drives swimming and liquid events.
    pub const WATER: Self = Self(1 << 1);

    /// Player clip - blocks players but nothing else.
    pub const PLAYER_CLIP: Self = Self(1 << 2);

    /// Another player's body.
    pub const PLAYER_BODY: Self = Self(1 << 3);

    /// Trigger volume - notified when the player overlaps it.
    pub const TRIGGER: Self = Self(1 << 4);

    /// Corpse - passable, but overlaps are queued as collisions.
    pub const CORPSE: Self = Self(1 << 5);

    /// Item - passable pickup, overlaps are queued as collisions.
    pub const ITEM: Self = Self(1 << 6);

    /// Climb zone - the player may only climb while inside one.
    pub const CLIMB_ZONE: Self = Self(1 << 7);

    /// Everything the player's collision box is stopped by.
    pub const MASK_PLAYER_MOVE: Self =
        Self(Self::SOLID.0 | Self::PLAYER_CLIP.0 | Self::PLAYER_BODY.0);

    /// Objects scanned for overlap notifications during ground contact.
    pub const MASK_CONTACT: Self = Self(Self::TRIGGER.0 | Self::CORPSE.0 | Self::ITEM.0);

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two flag sets.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags from this set.
    #[inline]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for ContentFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Traversal capabilities of a world object.
///
/// The classifier asks the world for polygons pre-filtered by these bits
/// instead of inspecting object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurfaceCaps(pub u8);

impl SurfaceCaps {
    /// Plain geometry: collides, nothing more.
    pub const NONE: Self = Self(0);

    /// Near-vertical faces can be climbed.
    pub const CLIMB: Self = Self(1 << 0);

    /// Near-vertical faces can be hugged.
    pub const WALL_HUG: Self = Self(1 << 1);

    /// Sharp top edges can be grabbed.
    pub const LEDGE_GRAB: Self = Self(1 << 2);

    /// Edges can be stepped onto by the resolver.
    pub const STEP: Self = Self(1 << 3);

    /// Every capability.
    pub const ALL: Self =
        Self(Self::CLIMB.0 | Self::WALL_HUG.0 | Self::LEDGE_GRAB.0 | Self::STEP.0);

    /// Check if these caps contain every bit of `other`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for SurfaceCaps {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_flags_operations() {
        let solid = ContentFlags::SOLID;
        let water = ContentFlags::WATER;
        let combined = solid | water;

        assert!(combined.contains(solid));
        assert!(combined.contains(water));
        assert!(!combined.contains(ContentFlags::TRIGGER));
        assert!(combined.intersects(solid));
        assert_eq!(combined.difference(water), solid);
    }

    #[test]
    fn test_player_move_mask() {
        let mask = ContentFlags::MASK_PLAYER_MOVE;
        assert!(mask.contains(ContentFlags::SOLID));
        assert!(mask.contains(ContentFlags::PLAYER_CLIP));
        assert!(!mask.intersects(ContentFlags::WATER | ContentFlags::CLIMB_ZONE));
    }

    #[test]
    fn test_surface_caps() {
        let caps = SurfaceCaps::CLIMB | SurfaceCaps::STEP;
        assert!(caps.contains(SurfaceCaps::CLIMB));
        assert!(!caps.contains(SurfaceCaps::LEDGE_GRAB));
        // An empty requirement is always satisfied
        assert!(SurfaceCaps::NONE.contains(SurfaceCaps::NONE));
        assert!(SurfaceCaps::ALL.contains(caps));
    }
}
