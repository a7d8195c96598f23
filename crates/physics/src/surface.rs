//! Surface classification.
//!
//! Every query here is a pure function of the world and the body's current
//! transform: nothing is cached between ticks, and calling a probe twice
//! returns the same answer. The movement state machine decides what to do
//! with the results.
//!
//! # Probes
//!
//! | Probe | Box | Capability |
//! |-------|-----|------------|
//! | Ground | body box, lowered by the traction distance | any solid |
//! | Climb | body box pushed forward, climb height band | [`SurfaceCaps::CLIMB`] |
//! | Wall | body box pushed forward, wall-hug height band | [`SurfaceCaps::WALL_HUG`] |
//! | Ledge | body box pushed one box length forward, grab band | [`SurfaceCaps::LEDGE_GRAB`] |

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{ContentFlags, ObjectId, Polygon, SurfaceCaps, VolumeKind, WorldQuery};
use crate::geometry::{clip_polygon_to_box, polygon_area, Aabb, Plane, UP};
use crate::movement::constants::{PROBE_FORWARD_OFFSET, TICK_SEC, TRACTION_DISTANCE};
use crate::movement::{PlayerBody, PlayerConfig};

/// Faces with `|normal.z|` under this count as vertical for climb and wall
/// hug.
const VERTICAL_FACE_Z: f32 = 0.2;

/// Minimum `-dot(normal, forward)` for a vertical face to count as in front.
const FACING_DOT: f32 = -0.5;

/// Faces with `normal.z` above this carry grabbable ledge edges.
const LEDGE_TOP_Z: f32 = 0.9;

/// The combined edge normal must face the player at least this much.
const LEDGE_FACING_DOT: f32 = -0.2;

/// Polygons either side of a ledge edge must differ at least this much.
const LEDGE_DIHEDRAL_DOT: f32 = 0.1;

/// Edges count as shared when their directions are at least this opposite.
const ADJACENT_EDGE_DOT: f32 = -0.99;

/// Distance within which an edge endpoint lies on another edge's line.
const ADJACENT_EDGE_DISTANCE: f32 = 0.001;

// ============================================================================
// Ground contact
// ============================================================================

/// What the body is standing on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub contacted: bool,

    /// Shallow enough to run on.
    pub run: bool,

    /// Shallow enough to jump from.
    pub jump: bool,

    /// Too steep to run on.
    pub slide: bool,

    /// Normal of the contact face, zero without contact.
    pub normal: Vec3,

    /// Only meaningful during the tick that produced it.
    #[serde(skip)]
    pub object: Option<ObjectId>,
}

/// A non-solid object the body touched while probing for ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlap {
    Trigger(ObjectId),

    /// A corpse or item, with the body's velocity relative to it.
    Collision {
        object: ObjectId,
        relative_velocity: Vec3,
    },
}

/// Result of [`find_ground_contact`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundContact {
    pub info: ContactInfo,
    pub overlaps: Vec<Overlap>,

    /// Number of climb zones the body box overlaps.
    pub climb_trigger_count: u32,
}

/// Probe for the surface under the body.
///
/// Of all solid faces touching a thin box around the feet, the one facing
/// most directly up wins. Faces pointing down never count as ground.
pub fn find_ground_contact(
    world: &dyn WorldQuery,
    body: &PlayerBody,
    config: &PlayerConfig,
) -> GroundContact {
    let object_box = body.object_box(config);
    let pos = body.position;

    let probe = Aabb::new(
        pos + object_box.min - Vec3::new(0.0, 0.0, TRACTION_DISTANCE),
        Vec3::new(pos.x + object_box.max.x, pos.y + object_box.max.y, pos.z + 0.01),
    );

    let mut best: Option<Polygon> = None;
    for poly in world.collect_polygons(&probe, ContentFlags::MASK_PLAYER_MOVE, SurfaceCaps::NONE) {
        let nz = poly.normal().z;
        if nz <= 0.0 {
            continue;
        }
        if best.as_ref().map_or(true, |b| nz > b.normal().z) {
            best = Some(poly);
        }
    }

    let mut info = ContactInfo::default();
    if let Some(poly) = best {
        let n = poly.normal();
        info.contacted = true;
        info.normal = n;
        info.object = Some(poly.object);
        info.run = n.z > config.run_surface_cos();
        info.jump = n.z > config.jump_surface_cos();
        info.slide = n.z <= config.run_surface_cos();
    }

    let mut contact = GroundContact {
        info,
        ..Default::default()
    };

    let world_box = object_box.translated(pos).expanded(TRACTION_DISTANCE);
    for hit in world.overlapping_volumes(&world_box) {
        match hit.kind {
            VolumeKind::Trigger => contact.overlaps.push(Overlap::Trigger(hit.object)),
            VolumeKind::Corpse | VolumeKind::Item => contact.overlaps.push(Overlap::Collision {
                object: hit.object,
                relative_velocity: body.velocity - hit.velocity,
            }),
            VolumeKind::ClimbZone => contact.climb_trigger_count += 1,
            VolumeKind::Water => {}
        }
    }

    contact
}

// ============================================================================
// Climb and wall hug
// ============================================================================

/// Body box pushed forward, spanning `min_z..max_z` above the feet.
fn forward_band(body: &PlayerBody, config: &PlayerConfig, offset: f32, min_z: f32, max_z: f32) -> Aabb {
    let object_box = body.object_box(config).translated(body.forward() * offset);
    Aabb::new(
        Vec3::new(object_box.min.x, object_box.min.y, min_z),
        Vec3::new(object_box.max.x, object_box.max.y, max_z),
    )
    .translated(body.position)
}

/// Area-weighted average of the near-vertical faces in front of the body.
fn find_vertical_surface(
    world: &dyn WorldQuery,
    probe: &Aabb,
    forward: Vec3,
    caps: SurfaceCaps,
) -> Option<Plane> {
    let mut plane = Plane::ZERO;
    let mut total_weight = 0.0;

    for poly in world.collect_polygons(probe, ContentFlags::MASK_PLAYER_MOVE, caps) {
        let n = poly.normal();
        if n.z.abs() >= VERTICAL_FACE_Z || n.dot(forward) >= FACING_DOT {
            continue;
        }

        // Only the part inside the probe counts
        let weight = polygon_area(&clip_polygon_to_box(&poly.vertices, probe), n);
        if weight <= 0.0 {
            continue;
        }

        plane.add_weighted(&poly.plane, weight);
        total_weight += weight;
    }

    if total_weight > 0.0 {
        Some(plane.scaled(total_weight).normalized())
    } else {
        None
    }
}

/// Find a climbable surface in front of the body.
pub fn find_climb_contact(
    world: &dyn WorldQuery,
    body: &PlayerBody,
    config: &PlayerConfig,
) -> Option<Plane> {
    let probe = forward_band(
        body,
        config,
        PROBE_FORWARD_OFFSET,
        config.climb_height_min,
        config.climb_height_max,
    );
    find_vertical_surface(world, &probe, body.forward(), SurfaceCaps::CLIMB)
}

/// Find a wall to hug in front of the body.
///
/// Faces meeting at a bevel are averaged, so the player can hug around
/// chamfered corners.
pub fn find_wall_contact(
    world: &dyn WorldQuery,
    body: &PlayerBody,
    config: &PlayerConfig,
) -> Option<Plane> {
    let probe = forward_band(
        body,
        config,
        PROBE_FORWARD_OFFSET,
        config.wall_hug_height_min,
        config.wall_hug_height_max,
    );
    find_vertical_surface(world, &probe, body.forward(), SurfaceCaps::WALL_HUG)
}

// ============================================================================
// Ledges
// ============================================================================

/// A grabbable ledge edge in front of the body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgeContact {
    /// Horizontal normal of the edge, pointing at the player.
    pub normal: Vec3,

    /// Weighted middle of the edge segments inside the probe.
    pub point: Vec3,

    /// The ledge continues past the probe to the player's left.
    pub can_move_left: bool,

    /// The ledge continues past the probe to the player's right.
    pub can_move_right: bool,
}

/// Find a ledge edge the body can hang from.
///
/// An edge qualifies when it belongs to an upward-facing polygon, crosses
/// the probe box, and is shared with a second polygon meeting it at a sharp
/// enough angle that the combined edge faces the player.
pub fn find_ledge_contact(
    world: &dyn WorldQuery,
    body: &PlayerBody,
    config: &PlayerConfig,
) -> Option<LedgeContact> {
    let forward = body.forward();
    let object_box = body.object_box(config);

    let mut probe = forward_band(
        body,
        config,
        object_box.len_y(),
        config.grab_height_min,
        config.grab_height_max,
    );
    // A fast fall can skip past a ledge between ticks
    probe.min.z += body.velocity.z * TICK_SEC - probe.len_z();

    let polys = world.collect_polygons(&probe, ContentFlags::MASK_PLAYER_MOVE, SurfaceCaps::LEDGE_GRAB);

    let mut normal_sum = Vec3::ZERO;
    let mut point_sum = Vec3::ZERO;
    let mut total_weight = 0.0;
    let mut can_move_left = false;
    let mut can_move_right = false;

    for (index, poly) in polys.iter().enumerate() {
        let poly_normal = poly.normal();
        if poly_normal.z <= LEDGE_TOP_Z {
            continue;
        }

        for (v1, v2) in poly.edges() {
            let normal = (v2 - v1).cross(UP).normalize_or_zero();
            if forward.dot(normal) > 0.0 {
                continue;
            }

            // Both directions, so a sloped edge yields its full span
            let (Some(t1), Some(t2)) = (probe.collide_line(v1, v2), probe.collide_line(v2, v1)) else {
                continue;
            };

            let Some(adjacent) = find_adjacent_polygon(&polys, v1, v2, index) else {
                continue;
            };
            let adjacent_normal = adjacent.normal();

            let edge_normal = (poly_normal + adjacent_normal) / 2.0;
            if edge_normal.dot(forward) > LEDGE_FACING_DOT {
                continue;
            }
            if poly_normal.dot(adjacent_normal) > LEDGE_DIHEDRAL_DOT {
                continue;
            }

            let p1 = v1.lerp(v2, t1);
            let p2 = v2.lerp(v1, t2);
            let weight = (p1 - p2).length();

            total_weight += weight;
            normal_sum += normal * weight;
            point_sum += (p1 + p2) / 2.0 * weight;

            // Edges run right to left as seen by a player facing the ledge
            can_move_left |= !probe.contains_point(v1);
            can_move_right |= !probe.contains_point(v2);
        }
    }

    if total_weight > 0.0 {
        Some(LedgeContact {
            normal: normal_sum / total_weight,
            point: point_sum / total_weight,
            can_move_left,
            can_move_right,
        })
    } else {
        None
    }
}

/// Find another polygon in `polys` sharing the edge `v1..v2`.
///
/// The neighbour's edge must run the opposite way along the same line and
/// overlap at least part of the edge.
pub fn find_adjacent_polygon(polys: &[Polygon], v1: Vec3, v2: Vec3, skip: usize) -> Option<&Polygon> {
    let edge = (v1 - v2).normalize_or_zero();

    polys
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .find(|(_, poly)| {
            poly.edges().any(|(b1, b2)| {
                let edge_b = (b1 - b2).normalize_or_zero();
                if edge.dot(edge_b) >= ADJACENT_EDGE_DOT {
                    return false;
                }

                let dist1 = edge.cross(v1 - b1).length();
                let dist2 = edge.cross(v1 - b2).length();
                if dist1 > ADJACENT_EDGE_DISTANCE || dist2 > ADJACENT_EDGE_DISTANCE {
                    return false;
                }

                let start = Plane::from_point_normal(v1, edge);
                let end = Plane::from_point_normal(v2, edge);
                let d = [
                    start.distance(b1),
                    start.distance(b2),
                    end.distance(b1),
                    end.distance(b2),
                ];

                let all_behind = d.iter().all(|&x| x < 0.0);
                let all_ahead = d.iter().all(|&x| x > 0.0);
                !(all_behind || all_ahead)
            })
        })
        .map(|(_, poly)| poly)
}

/// Where the body ends up after pulling itself over `ledge`.
pub fn ledge_up_position(position: Vec3, ledge_normal: Vec3, ledge_point: Vec3, config: &PlayerConfig) -> Vec3 {
    let mut up = position - ledge_normal.normalize_or_zero() * config.grab_up_forward_offset;
    up.z = ledge_point.z + config.grab_up_upward_offset;
    up
}

/// True if `object_box` placed at `offset` touches no movement-blocking
/// geometry.
pub fn world_box_is_clear(world: &dyn WorldQuery, object_box: &Aabb, offset: Vec3) -> bool {
    world.box_is_clear(&object_box.translated(offset), ContentFlags::MASK_PLAYER_MOVE)
}
