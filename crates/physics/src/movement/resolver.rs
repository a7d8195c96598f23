//! Collision resolver.
//!
//! Moves the body box along its velocity for one tick, stopping at the first
//! contact, removing the velocity component into the struck face and trying
//! again with the time that is left. Low obstacles are stepped over instead
//! of blocking.

use glam::Vec3;

use super::config::PlayerConfig;
use super::constants::{
    AIR_ELASTICITY, HARD_LANDING_SPEED, MIN_FACE_DISTANCE, MOVE_RETRY_COUNT, NORMAL_ELASTICITY,
    PROBE_FORWARD_OFFSET, TICK_SEC, VERTICAL_STEP_DOT,
};
use super::events::{EventSink, LocomotionEvent};
use super::state::PlayerBody;
use crate::collision::{Collision, ContentFlags, SurfaceCaps, WorldQuery};
use crate::geometry::Aabb;

/// Step-up candidates must face at least this much upward.
const STEP_SURFACE_Z: f32 = 0.5;

/// Ground impacts need a normal at least this vertical to count as hard.
const HARD_LANDING_NORMAL_Z: f32 = 0.7;

/// Result of [`move_body`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Where the body ended up.
    pub position: Vec3,

    /// Last face the body was pushed off, if any.
    pub collision: Option<Collision>,

    /// Sweep iterations used.
    pub retries: u32,

    /// The body stepped up onto something.
    pub stepped: bool,
}

/// Sweep the body through the world for one tick.
///
/// Updates `body.velocity` and `body.falling` but not the position; the
/// caller decides whether to accept [`MoveOutcome::position`].
pub fn move_body(
    world: &dyn WorldQuery,
    body: &mut PlayerBody,
    config: &PlayerConfig,
    events: &mut dyn EventSink,
) -> MoveOutcome {
    let object_box = body.object_box(config);
    let initial = body.position;

    let mut start = initial;
    let mut time = TICK_SEC;
    let mut first_normal = Vec3::ZERO;
    let mut last_collision = None;
    let mut stepped = false;
    let mut count = 0;

    while count < MOVE_RETRY_COUNT {
        let speed = body.velocity.length();
        if speed == 0.0 {
            break;
        }

        let end = start + body.velocity * time;
        let distance = end - start;

        // Short moves into empty space need no sweep
        if distance.x.abs() < object_box.len_x()
            && distance.y.abs() < object_box.len_y()
            && distance.z.abs() < object_box.len_z()
            && world.box_is_clear(&object_box.translated(end), ContentFlags::MASK_PLAYER_MOVE)
        {
            start = end;
            break;
        }

        let collisions = world.sweep_box(&object_box.translated(start), distance, ContentFlags::MASK_PLAYER_MOVE);
        if collisions.is_empty() || collisions.time() >= 1.0 {
            start = end;
            break;
        }

        let dt = time * collisions.time();
        start += body.velocity * dt;
        time -= dt;
        body.falling = false;

        // Back off so the next sweep does not start in contact
        start -= body.velocity * (MIN_FACE_DISTANCE / speed).min(dt);

        if collisions.max_height() < start.z + config.max_step_height * body.scale.z
            && collisions.iter().any(|c| c.normal.z.abs() < VERTICAL_STEP_DOT)
        {
            if let Some(z) = step_up(world, body, config, &object_box, start) {
                start.z = z;
                stepped = true;
                count += 1;
                continue;
            }
        }

        let Some(&collision) = collisions.most_direct() else {
            break;
        };
        let n = collision.normal;

        let bd = -body.velocity.dot(n);
        if bd > HARD_LANDING_SPEED && n.z > HARD_LANDING_NORMAL_Z {
            log::debug!("hard landing at {:.2} m/s", bd);
            events.emit(LocomotionEvent::HardLanding { speed: bd });
        }

        let elasticity = if body.contact_timer == 0 {
            NORMAL_ELASTICITY
        } else {
            AIR_ELASTICITY
        };
        let dv = n * (bd + elasticity);
        body.velocity += dv;

        if count == 0 {
            first_normal = n;
        } else if count == 1 && dv.dot(first_normal) < 0.0 && n.dot(first_normal) < 0.0 {
            // Wedged between two faces: run along the crease
            let crease = n.cross(first_normal);
            let mut len = crease.length();
            if len > 0.0 {
                if crease.dot(body.velocity) < 0.0 {
                    len = -len;
                }
                body.velocity = crease * (body.velocity.length() / len);
            }
        }

        last_collision = Some(collision);
        count += 1;
    }

    if count == MOVE_RETRY_COUNT {
        log::warn!(
            "move resolver gave up after {} tries at {:?}, velocity {:?}",
            count,
            start,
            body.velocity
        );
        start = initial;
        body.velocity = Vec3::ZERO;
    }

    MoveOutcome {
        position: start,
        collision: last_collision,
        retries: count,
        stepped,
    }
}

/// Look for a step edge just ahead of `position`. Returns the new feet
/// height if one is low enough to climb.
fn step_up(
    world: &dyn WorldQuery,
    body: &PlayerBody,
    config: &PlayerConfig,
    object_box: &Aabb,
    position: Vec3,
) -> Option<f32> {
    let mut probe = object_box.translated(body.forward() * PROBE_FORWARD_OFFSET + position);
    probe.max.z += config.max_step_height * body.scale.z + MIN_FACE_DISTANCE;

    let polys = world.collect_polygons(&probe, ContentFlags::MASK_PLAYER_MOVE, SurfaceCaps::STEP);
    for poly in polys.iter().filter(|p| p.normal().z > STEP_SURFACE_Z) {
        for (v1, v2) in poly.edges() {
            // Both directions, so a sloped edge is cleared at its high end
            let (Some(t1), Some(t2)) = (probe.collide_line(v1, v2), probe.collide_line(v2, v1)) else {
                continue;
            };
            let p1 = v1.lerp(v2, t1);
            let p2 = v2.lerp(v1, t2);
            let point = if p1.z > p2.z { p1 } else { p2 };

            if point.z > position.z && point.z - position.z < config.max_step_height {
                log::trace!("step up {:.3} at {:?}", point.z - position.z, point);
                return Some(point.z + MIN_FACE_DISTANCE);
            }
        }
    }
    None
}
