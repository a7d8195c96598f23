//! In-memory collision world built on parry3d.
//!
//! Geometry is stored as flat convex polygons, each tagged with its owning
//! object, content flags and traversal capabilities. Queries test the player
//! box against each polygon's triangle fan.

use glam::Vec3;
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::query::{self, Ray, RayCast, ShapeCastOptions};
use parry3d::shape::{Cuboid, Triangle};

use super::flags::{ContentFlags, SurfaceCaps};
use super::polygon::{ObjectId, PolyList, Polygon};
use super::trace::{Collision, CollisionList, RayHit, VolumeHit, VolumeKind};
use super::WorldQuery;
use crate::geometry::Aabb;

/// Polygons struck within this much of the earliest time of impact are
/// reported together.
const SAME_TIME_EPSILON: f32 = 1e-4;

/// Shrink applied to obstruction tests so that boxes resting exactly on a
/// face do not count as obstructed.
const CLEAR_TEST_SKIN: f32 = 1e-3;

/// A solid polygon with cached query data.
#[derive(Debug, Clone)]
struct WorldPolygon {
    polygon: Polygon,
    triangles: Vec<Triangle>,
    bounds: Aabb,
}

/// A non-solid volume.
#[derive(Debug, Clone)]
struct Volume {
    id: ObjectId,
    kind: VolumeKind,
    bounds: Aabb,
    velocity: Vec3,
}

/// The collision world containing all geometry.
///
/// Supports:
/// - Axis-aligned boxes (six faces)
/// - Free-standing convex polygons
/// - Triangle meshes
/// - Non-solid volumes (triggers, pickups, climb zones, water)
///
/// The world is immutable while a tick runs; all queries take `&self`.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    polygons: Vec<WorldPolygon>,
    volumes: Vec<Volume>,
    /// Next object ID to assign.
    next_id: u32,
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an axis-aligned box to the world as six outward-facing quads.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `contents` - Content flags for collision filtering
    /// * `caps` - What the player may do with the box's faces
    pub fn add_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        contents: ContentFlags,
        caps: SurfaceCaps,
    ) -> ObjectId {
        let a = center - half_extents;
        let b = center + half_extents;

        let faces = [
            // +Z
            vec![
                Vec3::new(a.x, a.y, b.z),
                Vec3::new(b.x, a.y, b.z),
                Vec3::new(b.x, b.y, b.z),
                Vec3::new(a.x, b.y, b.z),
            ],
            // -Z
            vec![
                Vec3::new(a.x, a.y, a.z),
                Vec3::new(a.x, b.y, a.z),
                Vec3::new(b.x, b.y, a.z),
                Vec3::new(b.x, a.y, a.z),
            ],
            // +X
            vec![
                Vec3::new(b.x, a.y, a.z),
                Vec3::new(b.x, b.y, a.z),
                Vec3::new(b.x, b.y, b.z),
                Vec3::new(b.x, a.y, b.z),
            ],
            // -X
            vec![
                Vec3::new(a.x, a.y, a.z),
                Vec3::new(a.x, a.y, b.z),
                Vec3::new(a.x, b.y, b.z),
                Vec3::new(a.x, b.y, a.z),
            ],
            // +Y
            vec![
                Vec3::new(a.x, b.y, a.z),
                Vec3::new(a.x, b.y, b.z),
                Vec3::new(b.x, b.y, b.z),
                Vec3::new(b.x, b.y, a.z),
            ],
            // -Y
            vec![
                Vec3::new(a.x, a.y, a.z),
                Vec3::new(b.x, a.y, a.z),
                Vec3::new(b.x, a.y, b.z),
                Vec3::new(a.x, a.y, b.z),
            ],
        ];

        let id = self.allocate_id();
        for face in faces {
            self.push_polygon(Polygon::new(face, id, contents, caps));
        }
        id
    }

    /// Add a single convex polygon, wound counter-clockwise about the side
    /// it should collide from.
    ///
    /// # Returns
    ///
    /// The object ID, or `None` if fewer than three vertices were given.
    pub fn add_polygon(
        &mut self,
        vertices: &[Vec3],
        contents: ContentFlags,
        caps: SurfaceCaps,
    ) -> Option<ObjectId> {
        self.add_faces(&[vertices.to_vec()], contents, caps)
    }

    /// Add several convex polygons owned by one object.
    pub fn add_faces(
        &mut self,
        faces: &[Vec<Vec3>],
        contents: ContentFlags,
        caps: SurfaceCaps,
    ) -> Option<ObjectId> {
        if faces.iter().any(|f| f.len() < 3) {
            log::warn!("rejecting object with a face of fewer than 3 vertices");
            return None;
        }

        let id = self.allocate_id();
        for face in faces {
            self.push_polygon(Polygon::new(face.clone(), id, contents, caps));
        }
        Some(id)
    }

    /// Add a triangle mesh to the world.
    ///
    /// # Arguments
    ///
    /// * `vertices` - Mesh vertex positions
    /// * `indices` - Triangle indices (3 per triangle), counter-clockwise
    /// * `contents` - Content flags for collision filtering
    /// * `caps` - What the player may do with the mesh
    pub fn add_triangle_mesh(
        &mut self,
        vertices: &[Vec3],
        indices: &[[u32; 3]],
        contents: ContentFlags,
        caps: SurfaceCaps,
    ) -> ObjectId {
        let id = self.allocate_id();

        for tri in indices {
            let corners: Option<Vec<Vec3>> = tri
                .iter()
                .map(|&i| vertices.get(i as usize).copied())
                .collect();

            match corners {
                Some(corners) => self.push_polygon(Polygon::new(corners, id, contents, caps)),
                None => log::warn!("skipping triangle {tri:?}: index out of range"),
            }
        }

        id
    }

    /// Add a non-solid volume.
    pub fn add_volume(&mut self, kind: VolumeKind, bounds: Aabb) -> ObjectId {
        let id = self.allocate_id();
        self.volumes.push(Volume {
            id,
            kind,
            bounds,
            velocity: Vec3::ZERO,
        });
        id
    }

    /// Set the velocity reported for a volume (moving pickups, corpses).
    pub fn set_volume_velocity(&mut self, id: ObjectId, velocity: Vec3) {
        for volume in self.volumes.iter_mut().filter(|v| v.id == id) {
            volume.velocity = velocity;
        }
    }

    /// Remove all geometry and volumes.
    pub fn clear(&mut self) {
        self.polygons.clear();
        self.volumes.clear();
    }

    /// Get the number of solid polygons.
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Get the number of volumes.
    pub fn volume_count(&self) -> usize {
        self.volumes.len()
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn push_polygon(&mut self, polygon: Polygon) {
        let mut bounds = Aabb::new(polygon.vertices[0], polygon.vertices[0]);
        for v in &polygon.vertices {
            bounds = bounds.union(&Aabb::new(*v, *v));
        }

        let first = to_point(polygon.vertices[0]);
        let triangles = polygon
            .vertices
            .windows(2)
            .skip(1)
            .map(|pair| Triangle::new(first, to_point(pair[0]), to_point(pair[1])))
            .collect();

        self.polygons.push(WorldPolygon {
            polygon,
            triangles,
            bounds,
        });
    }

    fn candidates<'a>(
        &'a self,
        bounds: &'a Aabb,
        mask: ContentFlags,
    ) -> impl Iterator<Item = &'a WorldPolygon> + 'a {
        self.polygons
            .iter()
            .filter(move |p| mask.intersects(p.polygon.contents) && bounds.overlaps(&p.bounds))
    }
}

impl WorldQuery for CollisionWorld {
    fn cast_ray(&self, start: Vec3, end: Vec3, mask: ContentFlags) -> Option<RayHit> {
        let dir = end - start;
        if dir.length_squared() < 1e-12 {
            return None;
        }

        let ray = Ray::new(to_point(start), to_vector(dir));
        let bounds = Aabb::new(start.min(end), start.max(end));

        let mut best: Option<RayHit> = None;
        for wp in self.candidates(&bounds, mask) {
            // Faces are one-sided
            if wp.polygon.normal().dot(dir) >= 0.0 {
                continue;
            }

            for tri in &wp.triangles {
                if let Some(toi) = tri.cast_local_ray(&ray, 1.0, true) {
                    if best.map_or(true, |b| toi < b.fraction) {
                        best = Some(RayHit {
                            point: start + dir * toi,
                            normal: wp.polygon.normal(),
                            fraction: toi,
                            object: wp.polygon.object,
                            contents: wp.polygon.contents,
                        });
                    }
                }
            }
        }

        best
    }

    fn collect_polygons(&self, aabb: &Aabb, mask: ContentFlags, caps: SurfaceCaps) -> PolyList {
        let cuboid = cuboid_for(aabb, 0.0);
        let pos = isometry_for(aabb);

        self.candidates(aabb, mask)
            .filter(|wp| wp.polygon.caps.contains(caps))
            .filter(|wp| {
                wp.triangles.iter().any(|tri| {
                    query::intersection_test(&pos, &cuboid, &Isometry::identity(), tri)
                        .unwrap_or(false)
                })
            })
            .map(|wp| wp.polygon.clone())
            .collect()
    }

    fn box_is_clear(&self, aabb: &Aabb, mask: ContentFlags) -> bool {
        let cuboid = cuboid_for(aabb, CLEAR_TEST_SKIN);
        let pos = isometry_for(aabb);

        !self.candidates(aabb, mask).any(|wp| {
            wp.triangles.iter().any(|tri| {
                query::intersection_test(&pos, &cuboid, &Isometry::identity(), tri)
                    .unwrap_or(false)
            })
        })
    }

    fn sweep_box(&self, aabb: &Aabb, displacement: Vec3, mask: ContentFlags) -> CollisionList {
        let mut list = CollisionList::new();
        let distance = displacement.length();
        if distance <= 0.0 {
            return list;
        }
        let direction = displacement / distance;

        let swept = aabb
            .union(&aabb.translated(displacement))
            .expanded(0.1);
        let cuboid = cuboid_for(aabb, 0.0);
        let pos = isometry_for(aabb);
        let vel = to_vector(displacement);

        let mut hits: Vec<Collision> = Vec::new();
        for wp in self.candidates(&swept, mask) {
            let normal = wp.polygon.normal();
            // Only faces we are moving into
            if normal.dot(displacement) >= 0.0 {
                continue;
            }

            let mut first: Option<(f32, Vec3)> = None;
            for tri in &wp.triangles {
                let hit = query::cast_shapes(
                    &pos,
                    &vel,
                    &cuboid,
                    &Isometry::identity(),
                    &Vector::zeros(),
                    tri,
                    ShapeCastOptions::with_max_time_of_impact(1.0),
                );
                if let Ok(Some(hit)) = hit {
                    let toi = hit.time_of_impact;
                    if first.map_or(true, |(t, _)| toi < t) {
                        let w = hit.witness2;
                        first = Some((toi, Vec3::new(w.x, w.y, w.z)));
                    }
                }
            }

            if let Some((time, point)) = first {
                hits.push(Collision {
                    time: time.clamp(0.0, 1.0),
                    point,
                    normal,
                    face_dot: -normal.dot(direction),
                    object: wp.polygon.object,
                });
            }
        }

        let earliest = hits.iter().map(|c| c.time).fold(f32::MAX, f32::min);
        for c in hits {
            if c.time <= earliest + SAME_TIME_EPSILON {
                list.push(c);
            }
        }

        log::trace!(
            "sweep {:?} along {:?}: {} collision(s) at t={}",
            aabb.min,
            displacement,
            list.len(),
            list.time()
        );
        list
    }

    fn overlapping_volumes(&self, aabb: &Aabb) -> Vec<VolumeHit> {
        self.volumes
            .iter()
            .filter(|v| aabb.overlaps(&v.bounds))
            .map(|v| VolumeHit {
                object: v.id,
                kind: v.kind,
                velocity: v.velocity,
            })
            .collect()
    }

    fn water_coverage(&self, aabb: &Aabb) -> f32 {
        let size = aabb.max - aabb.min;
        let volume = size.x * size.y * size.z;
        if volume <= 0.0 {
            return 0.0;
        }

        let mut covered = 0.0;
        for water in self.volumes.iter().filter(|v| v.kind == VolumeKind::Water) {
            let lo = aabb.min.max(water.bounds.min);
            let hi = aabb.max.min(water.bounds.max);
            let overlap = (hi - lo).max(Vec3::ZERO);
            covered += overlap.x * overlap.y * overlap.z;
        }

        (covered / volume).clamp(0.0, 1.0)
    }
}

#[inline]
fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn cuboid_for(aabb: &Aabb, skin: f32) -> Cuboid {
    let half = (aabb.half_extents() - Vec3::splat(skin)).max(Vec3::ZERO);
    Cuboid::new(to_vector(half))
}

fn isometry_for(aabb: &Aabb) -> Isometry<Real> {
    let c = aabb.center();
    Isometry::translation(c.x, c.y, c.z)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();

        // Floor, top face at z=0
        world.add_box(
            Vec3::new(0.0, 0.0, -0.5),
            Vec3::new(50.0, 50.0, 0.5),
            ContentFlags::SOLID,
            SurfaceCaps::STEP,
        );

        // Wall, near face at y=5
        world.add_box(
            Vec3::new(0.0, 5.5, 2.5),
            Vec3::new(10.0, 0.5, 2.5),
            ContentFlags::SOLID,
            SurfaceCaps::CLIMB | SurfaceCaps::WALL_HUG,
        );

        world
    }

    #[test]
    fn test_box_faces_point_outward() {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::ZERO, Vec3::ONE, ContentFlags::SOLID, SurfaceCaps::NONE);
        assert_eq!(world.polygon_count(), 6);

        for wp in &world.polygons {
            let centroid = wp.polygon.vertices.iter().copied().sum::<Vec3>() / 4.0;
            assert!(wp.polygon.normal().dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_cast_ray_hit() {
        let world = create_test_world();
        let hit = world
            .cast_ray(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 10.0, 1.0), ContentFlags::SOLID)
            .unwrap();

        assert!((hit.point.y - 5.0).abs() < 1e-3);
        assert!((hit.fraction - 0.5).abs() < 1e-3);
        assert!((hit.normal - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_cast_ray_miss() {
        let world = create_test_world();
        assert!(world
            .cast_ray(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, -10.0, 1.0), ContentFlags::SOLID)
            .is_none());
    }

    #[test]
    fn test_collect_polygons_filters_caps() {
        let world = create_test_world();
        let probe = Aabb::new(Vec3::new(-0.5, 4.8, 0.5), Vec3::new(0.5, 5.2, 1.5));

        let climbable = world.collect_polygons(&probe, ContentFlags::SOLID, SurfaceCaps::CLIMB);
        assert_eq!(climbable.len(), 1);
        assert!((climbable[0].normal() - Vec3::NEG_Y).length() < 1e-5);

        let grabbable = world.collect_polygons(&probe, ContentFlags::SOLID, SurfaceCaps::LEDGE_GRAB);
        assert!(grabbable.is_empty());
    }

    #[test]
    fn test_box_is_clear() {
        let world = create_test_world();

        // Resting on the floor
        let standing = Aabb::new(Vec3::new(-0.3, -0.3, 0.0), Vec3::new(0.3, 0.3, 1.8));
        assert!(world.box_is_clear(&standing, ContentFlags::MASK_PLAYER_MOVE));

        // Sunk into the floor
        let sunk = standing.translated(Vec3::new(0.0, 0.0, -0.2));
        assert!(!world.box_is_clear(&sunk, ContentFlags::MASK_PLAYER_MOVE));
    }

    #[test]
    fn test_sweep_hits_wall() {
        let world = create_test_world();
        let aabb = Aabb::new(Vec3::new(-0.3, 3.7, 0.1), Vec3::new(0.3, 4.3, 1.9));
        let list = world.sweep_box(&aabb, Vec3::new(0.0, 2.0, 0.0), ContentFlags::SOLID);

        assert_eq!(list.len(), 1);
        assert!((list.time() - 0.35).abs() < 1e-3);
        let c = list.most_direct().unwrap();
        assert!((c.face_dot - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_parallel_to_floor_is_free() {
        let world = create_test_world();
        let aabb = Aabb::new(Vec3::new(-0.3, -0.3, 0.0), Vec3::new(0.3, 0.3, 1.8));
        let list = world.sweep_box(&aabb, Vec3::new(1.0, 0.0, 0.0), ContentFlags::SOLID);
        assert!(list.is_empty());
    }

    #[test]
    fn test_content_mask_filtering() {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::new(0.5, 5.0, 1.0),
            ContentFlags::PLAYER_CLIP,
            SurfaceCaps::NONE,
        );

        assert!(world
            .cast_ray(Vec3::new(0.0, 0.0, 1.0), Vec3::new(10.0, 0.0, 1.0), ContentFlags::SOLID)
            .is_none());
        assert!(world
            .cast_ray(
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(10.0, 0.0, 1.0),
                ContentFlags::MASK_PLAYER_MOVE
            )
            .is_some());
    }

    #[test]
    fn test_volumes_and_water_coverage() {
        let mut world = CollisionWorld::new();
        let zone = world.add_volume(
            VolumeKind::ClimbZone,
            Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 3.0)),
        );
        world.add_volume(
            VolumeKind::Water,
            Aabb::new(Vec3::new(-5.0, -5.0, -2.0), Vec3::new(5.0, 5.0, 1.0)),
        );

        let body = Aabb::new(Vec3::new(-0.3, -0.3, 0.0), Vec3::new(0.3, 0.3, 2.0));
        let hits = world.overlapping_volumes(&body);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|h| h.object == zone && h.kind == VolumeKind::ClimbZone));

        assert!((world.water_coverage(&body) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_mesh_skips_bad_indices() {
        let mut world = CollisionWorld::new();
        let verts = [Vec3::ZERO, Vec3::X, Vec3::Y];
        world.add_triangle_mesh(&verts, &[[0, 1, 2], [0, 1, 7]], ContentFlags::SOLID, SurfaceCaps::NONE);
        assert_eq!(world.polygon_count(), 1);
    }
}
