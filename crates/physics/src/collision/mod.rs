//! Collision queries consumed by the locomotion core.
//!
//! The core never owns world geometry. It reaches the host's collision
//! primitives through the [`WorldQuery`] trait, whose methods are all
//! synchronous and read-only for the duration of a tick.
//!
//! # Key Types
//!
//! - [`WorldQuery`]: The query contract
//! - [`CollisionWorld`]: In-memory implementation on parry3d shapes
//! - [`Polygon`]: A world face with plane, owner and capability flags
//! - [`CollisionList`]: Output of a swept-box query
//!
//! # Capabilities
//!
//! Whether a face may be climbed, hugged, grabbed or stepped onto is a
//! property of its owning object ([`SurfaceCaps`]). Polygon queries take the
//! required capabilities and only return faces that carry them.

mod flags;
mod polygon;
mod trace;
mod world;

use glam::Vec3;

use crate::geometry::Aabb;

pub use flags::{ContentFlags, SurfaceCaps};
pub use polygon::{ObjectId, PolyList, Polygon};
pub use trace::{Collision, CollisionList, RayHit, VolumeHit, VolumeKind};
pub use world::CollisionWorld;

/// Read-only view of world geometry.
pub trait WorldQuery {
    /// Cast a ray from `start` to `end`, returning the nearest hit.
    fn cast_ray(&self, start: Vec3, end: Vec3, mask: ContentFlags) -> Option<RayHit>;

    /// Collect the polygons touching `aabb` whose object matches `mask` and
    /// carries every capability in `caps`.
    fn collect_polygons(&self, aabb: &Aabb, mask: ContentFlags, caps: SurfaceCaps) -> PolyList;

    /// True if no geometry matching `mask` intersects `aabb`.
    fn box_is_clear(&self, aabb: &Aabb, mask: ContentFlags) -> bool;

    /// Sweep `aabb` along `displacement` and report every front-facing
    /// polygon struck at the earliest time of impact.
    fn sweep_box(&self, aabb: &Aabb, displacement: Vec3, mask: ContentFlags) -> CollisionList;

    /// Non-solid volumes overlapping `aabb`.
    fn overlapping_volumes(&self, aabb: &Aabb) -> Vec<VolumeHit>;

    /// Fraction of `aabb` submerged in water, in `[0, 1]`.
    fn water_coverage(&self, aabb: &Aabb) -> f32;
}
