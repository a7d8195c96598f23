//! Query results: ray hits, sweep collisions and volume overlaps.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::ContentFlags;
use super::polygon::ObjectId;

/// Result of a ray cast through the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// World position of the hit.
    pub point: Vec3,

    /// Face normal at the hit, pointing back toward the ray origin side.
    pub normal: Vec3,

    /// How far along the ray the hit happened.
    ///
    /// - `0.0` = at the start point
    /// - `1.0` = at the end point
    pub fraction: f32,

    /// Object that was hit.
    pub object: ObjectId,

    /// Content flags of what was hit.
    pub contents: ContentFlags,
}

/// One polygon struck by a swept box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Fraction of the sweep travelled before impact, in `[0, 1]`.
    pub time: f32,

    /// Contact point on the struck polygon.
    pub point: Vec3,

    /// Plane normal of the struck polygon.
    pub normal: Vec3,

    /// `-dot(normal, unit displacement)`: 1 for a head-on hit, near 0 for a
    /// graze.
    pub face_dot: f32,

    pub object: ObjectId,
}

/// Every polygon struck at the earliest time of impact of one sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionList {
    collisions: Vec<Collision>,
}

impl CollisionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, collision: Collision) {
        self.collisions.push(collision);
    }

    pub fn clear(&mut self) {
        self.collisions.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.collisions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Collision> {
        self.collisions.iter()
    }

    /// Earliest time of impact, or 1.0 when nothing was hit.
    pub fn time(&self) -> f32 {
        self.collisions
            .iter()
            .map(|c| c.time)
            .fold(1.0_f32, f32::min)
    }

    /// Highest contact point, or `f32::MIN` when nothing was hit.
    pub fn max_height(&self) -> f32 {
        self.collisions
            .iter()
            .map(|c| c.point.z)
            .fold(f32::MIN, f32::max)
    }

    /// The collision whose face is struck most squarely.
    pub fn most_direct(&self) -> Option<&Collision> {
        let mut best: Option<&Collision> = None;
        for c in &self.collisions {
            if best.map_or(true, |b| c.face_dot > b.face_dot) {
                best = Some(c);
            }
        }
        best
    }
}

impl<'a> IntoIterator for &'a CollisionList {
    type Item = &'a Collision;
    type IntoIter = std::slice::Iter<'a, Collision>;

    fn into_iter(self) -> Self::IntoIter {
        self.collisions.iter()
    }
}

/// Kind of non-solid volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeKind {
    Trigger,
    Corpse,
    Item,
    ClimbZone,
    Water,
}

impl VolumeKind {
    /// Content flag a volume of this kind carries.
    pub fn contents(self) -> ContentFlags {
        match self {
            Self::Trigger => ContentFlags::TRIGGER,
            Self::Corpse => ContentFlags::CORPSE,
            Self::Item => ContentFlags::ITEM,
            Self::ClimbZone => ContentFlags::CLIMB_ZONE,
            Self::Water => ContentFlags::WATER,
        }
    }
}

/// A volume overlapping a query box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeHit {
    pub object: ObjectId,
    pub kind: VolumeKind,
    /// Velocity of the volume's owner, for relative impact speeds.
    pub velocity: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collision(time: f32, z: f32, face_dot: f32) -> Collision {
        Collision {
            time,
            point: Vec3::new(0.0, 0.0, z),
            normal: Vec3::Y,
            face_dot,
            object: ObjectId(0),
        }
    }

    #[test]
    fn test_empty_list() {
        let list = CollisionList::new();
        assert!(list.is_empty());
        assert_eq!(list.time(), 1.0);
        assert!(list.most_direct().is_none());
    }

    #[test]
    fn test_list_aggregates() {
        let mut list = CollisionList::new();
        list.push(collision(0.5, 0.2, 0.3));
        list.push(collision(0.4, 1.0, 0.9));
        list.push(collision(0.45, 0.1, 0.1));

        assert_eq!(list.len(), 3);
        assert!((list.time() - 0.4).abs() < 1e-6);
        assert!((list.max_height() - 1.0).abs() < 1e-6);
        assert!((list.most_direct().unwrap().face_dot - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_volume_kind_contents() {
        assert_eq!(VolumeKind::ClimbZone.contents(), ContentFlags::CLIMB_ZONE);
        assert_eq!(VolumeKind::Water.contents(), ContentFlags::WATER);
    }
}
