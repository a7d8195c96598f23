//! Geometry utilities shared by the classifier, resolver and state machine.
//!
//! Everything here is a pure function of its inputs. Boxes are axis aligned
//! in world space: the player yaws its model but never its collision volume.
//!
//! Conventions:
//!
//! - Z is up.
//! - Yaw is measured clockwise from +Y seen from above, so a yaw of zero
//!   faces +Y and the forward vector is `(sin yaw, cos yaw, 0)`.
//! - Planes are stored as `dot(normal, p) + d = 0`.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World up axis.
pub const UP: Vec3 = Vec3::Z;

// ============================================================================
// Axis-aligned boxes
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given size standing on the origin: centered in X and Y,
    /// spanning `0..size.z` vertically. This is the player's object box.
    pub fn from_size(size: Vec3) -> Self {
        Self {
            min: Vec3::new(-size.x * 0.5, -size.y * 0.5, 0.0),
            max: Vec3::new(size.x * 0.5, size.y * 0.5, size.z),
        }
    }

    /// Box centered on `center` with the given half extents.
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    #[inline]
    pub fn len_x(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn len_y(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn len_z(&self) -> f32 {
        self.max.z - self.min.z
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box to also cover `other`.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Inclusive overlap test.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(other.min.x > self.max.x
            || other.max.x < self.min.x
            || other.min.y > self.max.y
            || other.max.y < self.min.y
            || other.min.z > self.max.z
            || other.max.z < self.min.z)
    }

    /// Point containment, inclusive on the min faces and exclusive on the max
    /// faces so that adjacent boxes never both claim a point.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }

    /// All 8 corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, a.y, a.z),
        ]
    }

    /// Clip the segment `start..end` against the box.
    ///
    /// Returns the parametric entry point in `[0, 1]`, or `None` if the
    /// segment misses. A segment starting inside the box enters at 0.
    pub fn collide_line(&self, start: Vec3, end: Vec3) -> Option<f32> {
        let mut first = 0.0_f32;
        let mut last = 1.0_f32;

        for axis in 0..3 {
            let (s, e) = (start[axis], end[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);

            let (enter, exit) = if s < e {
                if s > hi || e < lo {
                    return None;
                }
                let span = e - s;
                let enter = if s < lo { (lo - s) / span } else { 0.0 };
                let exit = if e > hi { (hi - s) / span } else { 1.0 };
                (enter, exit)
            } else {
                if e > hi || s < lo {
                    return None;
                }
                let span = e - s;
                let enter = if s > hi { (hi - s) / span } else { 0.0 };
                let exit = if e < lo { (lo - s) / span } else { 1.0 };
                (enter, exit)
            };

            first = first.max(enter);
            last = last.min(exit);
            if last < first {
                return None;
            }
        }

        Some(first)
    }
}

// ============================================================================
// Planes
// ============================================================================

/// Plane `dot(normal, p) + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Degenerate plane used as an accumulator seed.
    pub const ZERO: Self = Self {
        normal: Vec3::ZERO,
        d: 0.0,
    };

    /// Plane through `point` facing `normal`. The normal is normalized.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points, wound counter-clockwise about the normal.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self::from_point_normal(a, (b - a).cross(c - a))
    }

    /// Signed distance (positive on the normal side).
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Project a point onto the plane.
    #[inline]
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.distance(point)
    }

    /// Accumulate `other * weight` into this plane (normal and offset alike).
    pub fn add_weighted(&mut self, other: &Plane, weight: f32) {
        self.normal += other.normal * weight;
        self.d += other.d * weight;
    }

    /// Divide normal and offset by `divisor`, finishing a weighted average.
    pub fn scaled(&self, divisor: f32) -> Self {
        Self {
            normal: self.normal / divisor,
            d: self.d / divisor,
        }
    }

    /// Rescale so the normal has unit length. Averaged planes come out
    /// slightly short when their inputs disagree.
    pub fn normalized(&self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            self.scaled(len)
        } else {
            *self
        }
    }
}

/// Area of a planar polygon, given its plane normal.
pub fn polygon_area(vertices: &[Vec3], normal: Vec3) -> f32 {
    let n = vertices.len();
    let mut sum = Vec3::ZERO;
    for i in 0..n {
        sum += vertices[i].cross(vertices[(i + 1) % n]);
    }
    normal.dot(sum).abs() * 0.5
}

/// Clip a convex polygon to the inside of a box.
///
/// Returns the clipped vertex loop in the same winding, empty when the
/// polygon lies entirely outside.
pub fn clip_polygon_to_box(vertices: &[Vec3], aabb: &Aabb) -> Vec<Vec3> {
    let mut poly = vertices.to_vec();

    for axis in 0..3 {
        for (bound, keep_below) in [(aabb.min[axis], false), (aabb.max[axis], true)] {
            if poly.is_empty() {
                return poly;
            }

            // Signed distance, positive inside
            let inside = |p: Vec3| if keep_below { bound - p[axis] } else { p[axis] - bound };

            let mut out = Vec::with_capacity(poly.len() + 1);
            for i in 0..poly.len() {
                let a = poly[i];
                let b = poly[(i + 1) % poly.len()];
                let (da, db) = (inside(a), inside(b));

                if da >= 0.0 {
                    out.push(a);
                }
                if (da >= 0.0) != (db >= 0.0) {
                    out.push(a + (b - a) * (da / (da - db)));
                }
            }
            poly = out;
        }
    }

    poly
}

/// Move the box so the corner nearest `plane` lies exactly on it.
///
/// The corner with the smallest signed distance is projected onto the plane
/// and the returned position carries the same offset. A negative distance
/// pulls the box out of the plane, a positive one pushes it onto the plane.
/// The body itself is not moved.
pub fn snap_to_plane(position: Vec3, object_box: &Aabb, plane: &Plane) -> Vec3 {
    let world_box = object_box.translated(position);

    let mut best_dist = f32::MAX;
    let mut best_point = Vec3::ZERO;
    for corner in world_box.corners() {
        let dist = plane.distance(corner);
        if dist < best_dist {
            best_dist = dist;
            best_point = corner;
        }
    }

    position + (plane.project(best_point) - best_point)
}

// ============================================================================
// Angles and rotations
// ============================================================================

/// Yaw in `[0, 2π)` and pitch in `[-π/2, π/2]` of a direction vector.
pub fn angles_from_vector(v: Vec3) -> (f32, f32) {
    let mut yaw = v.x.atan2(v.y);
    if yaw < 0.0 {
        yaw += TAU;
    }

    let xy = (v.x * v.x + v.y * v.y).sqrt();
    let pitch = if xy > 0.0 {
        (v.z / xy).atan2(1.0)
    } else if v.z < 0.0 {
        -FRAC_PI_2
    } else {
        FRAC_PI_2
    };

    (yaw, pitch)
}

/// Horizontal forward vector for a yaw.
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), yaw.cos(), 0.0)
}

/// Horizontal right vector for a yaw.
#[inline]
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), -yaw.sin(), 0.0)
}

/// Express a world vector in the yawed object frame (x right, y forward, z up).
pub fn world_to_object(v: Vec3, yaw: f32) -> Vec3 {
    Vec3::new(v.dot(right_from_yaw(yaw)), v.dot(forward_from_yaw(yaw)), v.z)
}

/// Wrap an angle into `[-π, π]`. Non-finite input yields NaN.
pub fn wrap_angle_pi(angle: f32) -> f32 {
    if (-PI..=PI).contains(&angle) {
        return angle;
    }
    (angle + PI).rem_euclid(TAU) - PI
}

/// Wrap an angle into `[0, 2π]`. Non-finite input yields NaN.
pub fn wrap_angle_2pi(angle: f32) -> f32 {
    if (0.0..=TAU).contains(&angle) {
        return angle;
    }
    angle.rem_euclid(TAU)
}

/// Rotate a vector about world up in the same sense yaw increases.
#[inline]
pub fn rotate_about_up(v: Vec3, turn: f32) -> Vec3 {
    Quat::from_rotation_z(-turn) * v
}

/// Scale `v` to length `len`. Zero vectors stay zero.
#[inline]
pub fn with_length(v: Vec3, len: f32) -> Vec3 {
    v.normalize_or_zero() * len
}
