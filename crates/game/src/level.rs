//! Test courses.
//!
//! Each course is a small strip of geometry laid out along +Y from its
//! origin, exercising one traversal capability. A player spawned at the
//! origin facing +Y meets the feature about two meters ahead.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strider_physics::geometry::Aabb;
use strider_physics::{CollisionWorld, ContentFlags, ObjectId, SurfaceCaps, VolumeKind};

/// Gap between course origins along X.
const COURSE_SPACING: f32 = 10.0;

/// Distance from the origin to the start of the feature.
const FEATURE_OFFSET: f32 = 2.0;

/// The traversal courses a level can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Course {
    FlatFloor,
    Stairs,
    SlideSlope,
    ClimbWall,
    WallHug,
    Ledge,
    WaterPool,
}

impl Course {
    pub const ALL: [Course; 7] = [
        Course::FlatFloor,
        Course::Stairs,
        Course::SlideSlope,
        Course::ClimbWall,
        Course::WallHug,
        Course::Ledge,
        Course::WaterPool,
    ];

    /// Capabilities the course's feature carries.
    pub fn caps(self) -> SurfaceCaps {
        match self {
            Course::Stairs => SurfaceCaps::STEP,
            Course::ClimbWall => SurfaceCaps::CLIMB,
            Course::WallHug => SurfaceCaps::WALL_HUG,
            Course::Ledge => SurfaceCaps::LEDGE_GRAB,
            Course::FlatFloor | Course::SlideSlope | Course::WaterPool => SurfaceCaps::NONE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Course::FlatFloor => "flat_floor",
            Course::Stairs => "stairs",
            Course::SlideSlope => "slide_slope",
            Course::ClimbWall => "climb_wall",
            Course::WallHug => "wall_hug",
            Course::Ledge => "ledge",
            Course::WaterPool => "water_pool",
        }
    }
}

/// A spawn point for players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Feet position in world space.
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,

    /// Course the spawn point starts, if any.
    pub course: Option<Course>,
}

/// A game level containing collision geometry and spawn points.
#[derive(Debug, Default)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world for physics.
    pub collision: CollisionWorld,

    /// Player spawn points.
    pub spawn_points: Vec<SpawnPoint>,

    /// Courses in build order.
    pub courses: Vec<Course>,
}

impl Level {
    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Every course side by side along X.
    pub fn test_course() -> Self {
        let mut level = Self::new("test_course", "Test Course");
        for (i, course) in Course::ALL.into_iter().enumerate() {
            level.add_course(course, Vec3::new(i as f32 * COURSE_SPACING, 0.0, 0.0));
        }
        level
    }

    /// A level holding just `course` at the origin.
    pub fn single(course: Course) -> Self {
        let mut level = Self::new(course.name(), course.name());
        level.add_course(course, Vec3::ZERO);
        level
    }

    /// Build `course` with its origin at `origin` and add a spawn point
    /// there facing +Y.
    pub fn add_course(&mut self, course: Course, origin: Vec3) {
        let caps = course.caps();
        let world = &mut self.collision;
        let start = origin.y + FEATURE_OFFSET;

        if course == Course::WaterPool {
            // Dry run-up, then a basin two meters deep
            floor(world, origin, origin.y - 2.0, start);
            world.add_box(
                Vec3::new(origin.x, start + 3.0, origin.z - 2.5),
                Vec3::new(3.0, 3.0, 0.5),
                ContentFlags::SOLID,
                SurfaceCaps::NONE,
            );
            world.add_volume(
                VolumeKind::Water,
                Aabb::new(
                    Vec3::new(origin.x - 3.0, start, origin.z - 2.0),
                    Vec3::new(origin.x + 3.0, start + 6.0, origin.z - 0.2),
                ),
            );
        } else {
            floor(world, origin, origin.y - 2.0, origin.y + 10.0);
        }

        match course {
            Course::FlatFloor | Course::WaterPool => {}
            Course::Stairs => {
                const STEPS: usize = 5;
                const RISE: f32 = 0.25;
                const DEPTH: f32 = 0.4;
                let end = start + STEPS as f32 * DEPTH;
                for i in 0..STEPS {
                    let height = (i + 1) as f32 * RISE;
                    let front = start + i as f32 * DEPTH;
                    world.add_box(
                        Vec3::new(origin.x, (front + end) * 0.5, origin.z + height * 0.5),
                        Vec3::new(1.5, (end - front) * 0.5, height * 0.5),
                        ContentFlags::SOLID,
                        caps,
                    );
                }
            }
            Course::SlideSlope => {
                // 60 degrees, steeper than anything runnable
                let run = 1.5;
                let rise = run * 60f32.to_radians().tan();
                world.add_polygon(
                    &[
                        Vec3::new(origin.x - 2.0, start, origin.z),
                        Vec3::new(origin.x + 2.0, start, origin.z),
                        Vec3::new(origin.x + 2.0, start + run, origin.z + rise),
                        Vec3::new(origin.x - 2.0, start + run, origin.z + rise),
                    ],
                    ContentFlags::SOLID,
                    caps,
                );
            }
            Course::ClimbWall => {
                world.add_box(
                    Vec3::new(origin.x, start + 0.5, origin.z + 3.0),
                    Vec3::new(2.0, 0.5, 3.0),
                    ContentFlags::SOLID,
                    caps,
                );
                world.add_volume(
                    VolumeKind::ClimbZone,
                    Aabb::new(
                        Vec3::new(origin.x - 2.0, start - 1.5, origin.z),
                        Vec3::new(origin.x + 2.0, start, origin.z + 6.0),
                    ),
                );
            }
            Course::WallHug => {
                world.add_box(
                    Vec3::new(origin.x, start + 0.5, origin.z + 1.5),
                    Vec3::new(3.0, 0.5, 1.5),
                    ContentFlags::SOLID,
                    caps,
                );
            }
            Course::Ledge => {
                world.add_box(
                    Vec3::new(origin.x, start + 2.0, origin.z + 0.75),
                    Vec3::new(3.0, 2.0, 0.75),
                    ContentFlags::SOLID,
                    caps,
                );
            }
        }

        log::debug!("built course {} at {:?}", course.name(), origin);
        self.courses.push(course);
        self.spawn_points.push(SpawnPoint {
            position: origin,
            facing: 0.0,
            course: Some(course),
        });
    }

    /// Add a trigger volume.
    pub fn add_trigger(&mut self, bounds: Aabb) -> ObjectId {
        self.collision.add_volume(VolumeKind::Trigger, bounds)
    }

    /// Get a player spawn point.
    pub fn get_player_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }

    /// Spawn point of the first instance of `course`.
    pub fn course_spawn(&self, course: Course) -> Option<&SpawnPoint> {
        self.spawn_points.iter().find(|s| s.course == Some(course))
    }

    /// Get the number of player spawn points.
    pub fn player_spawn_count(&self) -> usize {
        self.spawn_points.len()
    }
}

/// A floor strip six meters wide with its top at the origin's height.
fn floor(world: &mut CollisionWorld, origin: Vec3, from_y: f32, to_y: f32) {
    world.add_box(
        Vec3::new(origin.x, (from_y + to_y) * 0.5, origin.z - 0.5),
        Vec3::new(3.0, (to_y - from_y) * 0.5, 0.5),
        ContentFlags::SOLID,
        SurfaceCaps::NONE,
    );
}
