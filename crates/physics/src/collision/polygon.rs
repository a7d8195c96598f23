//! World polygons as seen by the surface classifier.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::{ContentFlags, SurfaceCaps};
use crate::geometry::{polygon_area, Plane};

/// Opaque handle to a world object.
///
/// Only valid for the tick in which a query returned it; the locomotion core
/// never stores one past that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// A convex planar polygon owned by a world object.
///
/// Vertices are wound counter-clockwise when viewed from the side the plane
/// normal points to.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec3>,
    pub plane: Plane,
    pub object: ObjectId,
    pub contents: ContentFlags,
    pub caps: SurfaceCaps,
}

impl Polygon {
    /// Build a polygon, deriving its plane from the first three vertices.
    pub fn new(vertices: Vec<Vec3>, object: ObjectId, contents: ContentFlags, caps: SurfaceCaps) -> Self {
        let plane = match vertices.as_slice() {
            [a, b, c, ..] => Plane::from_points(*a, *b, *c),
            _ => Plane::ZERO,
        };
        Self {
            vertices,
            plane,
            object,
            contents,
            caps,
        }
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.plane.normal
    }

    /// Closed edge loop: `(v0, v1), (v1, v2), ..., (vn, v0)`.
    pub fn edges(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn area(&self) -> f32 {
        polygon_area(&self.vertices, self.plane.normal)
    }
}

/// Polygons gathered by a box query.
pub type PolyList = Vec<Polygon>;
