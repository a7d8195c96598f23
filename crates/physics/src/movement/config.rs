//! Player configuration.
//!
//! Every tunable that shapes how a character moves lives here. A config is
//! built once (from defaults, a preset or a file) and then only ever borrowed
//! by the simulation.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pose::Pose;

/// A configuration that cannot drive a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field}: minimum {min} is above maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("run surface angle {run} is steeper than jump surface angle {jump}")]
    SurfaceAngles { run: f32, jump: f32 },
}

/// Movement configuration for one character type.
///
/// Distances are meters, speeds m/s, forces Newtons, angles radians unless
/// noted, and timers milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    // ========================================================================
    // Dimensions
    // ========================================================================
    /// Standing collision box, feet-centered.
    pub bounding_box: Vec3,

    pub crouch_box: Vec3,
    pub prone_box: Vec3,
    pub swim_box: Vec3,

    /// Mass in kilograms.
    pub mass: f32,

    /// Highest ledge the resolver will step onto.
    pub max_step_height: f32,

    // ========================================================================
    // Speeds and forces
    // ========================================================================
    pub max_forward_speed: f32,
    pub max_sprint_speed: f32,
    pub max_crouch_speed: f32,
    pub max_prone_speed: f32,
    pub max_underwater_speed: f32,

    pub run_force: f32,
    pub sprint_force: f32,
    pub crouch_force: f32,
    pub prone_force: f32,
    pub swim_force: f32,

    /// Fraction of ground control available in the air (0 disables).
    pub air_control: f32,

    /// Gravity along Z (negative pulls down).
    pub gravity: f32,

    // ========================================================================
    // Surfaces
    // ========================================================================
    /// Steepest slope (degrees) that can be run on.
    pub run_surface_angle: f32,

    /// Steepest slope (degrees) that can be jumped from.
    pub jump_surface_angle: f32,

    /// Vertical speed below which an airborne player is falling.
    pub falling_speed_threshold: f32,

    // ========================================================================
    // Jumping
    // ========================================================================
    pub jump_force: f32,

    /// Outward impulse when jumping off a climb surface.
    pub jump_force_climb: f32,

    /// Below this upward speed a jump gets its full impulse.
    pub min_jump_speed: f32,

    /// Above this upward speed a jump adds nothing.
    pub max_jump_speed: f32,

    /// Ticks on a jump surface before the next jump.
    pub jump_delay: u32,

    /// Wind-up before a running jump fires.
    pub run_jump_crouch_delay: f32,

    /// Wind-up before a standing jump fires.
    pub stand_jump_crouch_delay: f32,

    pub jump_energy_drain: f32,
    pub min_jump_energy: f32,
    pub sprint_can_jump: bool,

    pub jet_jump_force: f32,
    pub jet_jump_energy_drain: f32,
    pub jet_min_jump_energy: f32,
    pub jet_min_jump_speed: f32,
    pub jet_max_jump_speed: f32,

    /// Seconds after leaving the ground during which a jet may still start.
    pub jet_time: f32,

    // ========================================================================
    // Climb
    // ========================================================================
    pub climb_height_min: f32,
    pub climb_height_max: f32,
    pub climb_speed_up: f32,
    pub climb_speed_down: f32,
    pub climb_speed_side: f32,

    /// Falling faster than this scrapes down the wall instead of holding.
    pub climb_scrape_speed: f32,
    pub climb_scrape_friction: f32,

    // ========================================================================
    // Ledge grab
    // ========================================================================
    pub grab_height_min: f32,
    pub grab_height_max: f32,

    /// Height of the hands above the feet while hanging.
    pub grab_height: f32,
    pub grab_speed_side: f32,

    /// Climb-up animation progress per second.
    pub grab_speed_up: f32,

    /// How far past the edge the climb-up ends.
    pub grab_up_forward_offset: f32,
    pub grab_up_upward_offset: f32,

    /// Headroom that must be clear at the top of the ledge.
    pub grab_up_test_box: Vec3,

    // ========================================================================
    // Wall hug
    // ========================================================================
    pub wall_hug_speed: f32,
    pub wall_hug_height_min: f32,
    pub wall_hug_height_max: f32,

    // ========================================================================
    // Land and stop
    // ========================================================================
    pub land_duration: f32,

    /// Speed multiplier while landing.
    pub land_speed_factor: f32,

    /// Above this speed the run animation replaces the walk.
    pub walk_run_anim_velocity: f32,

    // ========================================================================
    // Turning
    // ========================================================================
    /// Third-person turn rate toward the move direction on the ground (rad/s).
    pub ground_turn_rate: f32,
    pub air_turn_rate: f32,

    pub min_look_angle: f32,
    pub max_look_angle: f32,
    pub max_freelook_angle: f32,

    /// Look pitch multiplier while sprinting.
    pub sprint_pitch_scale: f32,

    // ========================================================================
    // Drag and resistance
    // ========================================================================
    pub drag: f32,
    pub vert_drag: f32,
    pub vert_drag_falling: f32,
    pub ground_friction: f32,

    pub horiz_max_speed: f32,
    pub horiz_resist_speed: f32,
    pub horiz_resist_factor: f32,
    pub up_max_speed: f32,
    pub up_resist_speed: f32,
    pub up_resist_factor: f32,

    // ========================================================================
    // Energy
    // ========================================================================
    pub max_energy: f32,

    /// Energy regained per tick.
    pub energy_recharge_rate: f32,

    pub run_energy_drain: f32,
    pub min_run_energy: f32,
    pub sprint_energy_drain: f32,
    pub min_sprint_energy: f32,

    // ========================================================================
    // Render ground snap
    // ========================================================================
    pub ground_snap_speed: f32,
    pub ground_snap_ray_length: f32,
    pub ground_snap_ray_offset: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            // Dimensions
            bounding_box: Vec3::new(0.6, 0.6, 1.8),
            crouch_box: Vec3::new(0.6, 0.6, 1.2),
            prone_box: Vec3::new(0.6, 1.2, 0.5),
            swim_box: Vec3::new(0.6, 1.2, 0.8),
            mass: 90.0,
            max_step_height: 0.35,

            // Speeds and forces
            max_forward_speed: 6.0,
            max_sprint_speed: 9.0,
            max_crouch_speed: 3.0,
            max_prone_speed: 1.5,
            max_underwater_speed: 4.0,
            run_force: 4320.0, // 48 m/s² at 90 kg
            sprint_force: 5400.0,
            crouch_force: 3600.0,
            prone_force: 2700.0,
            swim_force: 2880.0,
            air_control: 0.2,
            gravity: -20.0,

            // Surfaces
            run_surface_angle: 50.0,
            jump_surface_angle: 60.0,
            falling_speed_threshold: -1.0,

            // Jumping
            jump_force: 720.0, // 8 m/s take-off
            jump_force_climb: 75.0,
            min_jump_speed: 20.0,
            max_jump_speed: 30.0,
            jump_delay: 3,
            run_jump_crouch_delay: 150.0,
            stand_jump_crouch_delay: 400.0,
            jump_energy_drain: 0.0,
            min_jump_energy: 0.0,
            sprint_can_jump: true,
            jet_jump_force: 0.0,
            jet_jump_energy_drain: 0.0,
            jet_min_jump_energy: 0.0,
            jet_min_jump_speed: 20.0,
            jet_max_jump_speed: 30.0,
            jet_time: 0.5,

            // Climb
            climb_height_min: 0.0,
            climb_height_max: 1.0,
            climb_speed_up: 1.0,
            climb_speed_down: 1.0,
            climb_speed_side: 1.0,
            climb_scrape_speed: -1.0,
            climb_scrape_friction: 0.05,

            // Ledge grab
            grab_height_min: 1.4,
            grab_height_max: 1.6,
            grab_height: 1.5,
            grab_speed_side: 1.0,
            grab_speed_up: 1.0,
            grab_up_forward_offset: 0.5,
            grab_up_upward_offset: 0.1,
            grab_up_test_box: Vec3::new(0.5, 0.5, 1.5),

            // Wall hug
            wall_hug_speed: 1.0,
            wall_hug_height_min: 1.4,
            wall_hug_height_max: 1.6,

            // Land and stop
            land_duration: 100.0,
            land_speed_factor: 0.5,
            walk_run_anim_velocity: 2.0,

            // Turning
            ground_turn_rate: 30.0,
            air_turn_rate: 10.0,
            min_look_angle: -1.4,
            max_look_angle: 1.4,
            max_freelook_angle: 3.0,
            sprint_pitch_scale: 0.5,

            // Drag and resistance
            drag: 0.0,
            vert_drag: 0.01,
            vert_drag_falling: 1.0,
            ground_friction: 0.01,
            horiz_max_speed: 80.0,
            horiz_resist_speed: 38.0,
            horiz_resist_factor: 1.0,
            up_max_speed: 80.0,
            up_resist_speed: 38.0,
            up_resist_factor: 1.0,

            // Energy
            max_energy: 100.0,
            energy_recharge_rate: 0.0,
            run_energy_drain: 0.0,
            min_run_energy: 0.0,
            sprint_energy_drain: 0.0,
            min_sprint_energy: 0.0,

            // Render ground snap
            ground_snap_speed: 0.05,
            ground_snap_ray_length: 0.5,
            ground_snap_ray_offset: 0.05,
        }
    }
}

impl PlayerConfig {
    /// Quick climber with generous air control.
    pub fn agile() -> Self {
        Self {
            max_forward_speed: 7.0,
            max_sprint_speed: 10.0,
            air_control: 0.6,
            climb_speed_up: 2.0,
            climb_speed_down: 2.0,
            climb_speed_side: 1.5,
            grab_speed_side: 1.5,
            grab_speed_up: 1.6,
            wall_hug_speed: 1.5,
            run_jump_crouch_delay: 96.0,
            stand_jump_crouch_delay: 256.0,
            land_duration: 64.0,
            land_speed_factor: 0.8,
            ..Default::default()
        }
    }

    /// Slow, heavy character that pays for every landing.
    pub fn heavy() -> Self {
        Self {
            mass: 140.0,
            max_forward_speed: 4.5,
            max_sprint_speed: 6.5,
            run_force: 5600.0,
            sprint_force: 6300.0,
            jump_force: 980.0,
            air_control: 0.05,
            climb_speed_up: 0.6,
            climb_speed_down: 0.8,
            climb_speed_side: 0.6,
            grab_speed_up: 0.6,
            land_duration: 320.0,
            land_speed_factor: 0.2,
            ground_turn_rate: 12.0,
            air_turn_rate: 4.0,
            ..Default::default()
        }
    }

    /// Check the invariants the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mass <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "mass",
                value: self.mass,
            });
        }

        for (field, size) in [
            ("bounding_box", self.bounding_box),
            ("crouch_box", self.crouch_box),
            ("prone_box", self.prone_box),
            ("swim_box", self.swim_box),
            ("grab_up_test_box", self.grab_up_test_box),
        ] {
            let smallest = size.min_element();
            if smallest <= 0.0 {
                return Err(ConfigError::NonPositive {
                    field,
                    value: smallest,
                });
            }
        }

        for (field, min, max) in [
            ("climb_height", self.climb_height_min, self.climb_height_max),
            ("grab_height", self.grab_height_min, self.grab_height_max),
            ("wall_hug_height", self.wall_hug_height_min, self.wall_hug_height_max),
            ("jump_speed", self.min_jump_speed, self.max_jump_speed),
            ("jet_jump_speed", self.jet_min_jump_speed, self.jet_max_jump_speed),
            ("look_angle", self.min_look_angle, self.max_look_angle),
        ] {
            if min > max {
                return Err(ConfigError::InvertedRange { field, min, max });
            }
        }

        if self.run_surface_angle > self.jump_surface_angle {
            return Err(ConfigError::SurfaceAngles {
                run: self.run_surface_angle,
                jump: self.jump_surface_angle,
            });
        }

        Ok(())
    }

    /// Minimum ground normal z that counts as a run surface.
    pub fn run_surface_cos(&self) -> f32 {
        self.run_surface_angle.to_radians().cos()
    }

    /// Minimum ground normal z that counts as a jump surface.
    pub fn jump_surface_cos(&self) -> f32 {
        self.jump_surface_angle.to_radians().cos()
    }

    /// Top speed in a pose.
    pub fn max_speed_for(&self, pose: Pose) -> f32 {
        match pose {
            Pose::Stand => self.max_forward_speed,
            Pose::Sprint => self.max_sprint_speed,
            Pose::Crouch => self.max_crouch_speed,
            Pose::Prone => self.max_prone_speed,
            Pose::Swim => self.max_underwater_speed,
        }
    }

    /// Drive force in a pose.
    pub fn max_force_for(&self, pose: Pose) -> f32 {
        match pose {
            Pose::Stand => self.run_force,
            Pose::Sprint => self.sprint_force,
            Pose::Crouch => self.crouch_force,
            Pose::Prone => self.prone_force,
            Pose::Swim => self.swim_force,
        }
    }

    /// Collision box size in a pose.
    pub fn box_for(&self, pose: Pose) -> Vec3 {
        match pose {
            Pose::Stand | Pose::Sprint => self.bounding_box,
            Pose::Crouch => self.crouch_box,
            Pose::Prone => self.prone_box,
            Pose::Swim => self.swim_box,
        }
    }

    /// `jet_time` in the same units as the contact timer.
    pub fn jet_time_ms(&self) -> i32 {
        (self.jet_time * 1000.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(PlayerConfig::default().validate(), Ok(()));
        assert_eq!(PlayerConfig::agile().validate(), Ok(()));
        assert_eq!(PlayerConfig::heavy().validate(), Ok(()));
    }

    #[test]
    fn test_surface_cosines() {
        let config = PlayerConfig::default();
        // Run surfaces are a subset of jump surfaces
        assert!(config.run_surface_cos() > config.jump_surface_cos());
        assert!((config.jump_surface_cos() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_inverted_height_range_rejected() {
        let config = PlayerConfig {
            grab_height_min: 2.0,
            grab_height_max: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { field: "grab_height", .. })
        ));
    }

    #[test]
    fn test_non_positive_mass_and_box_rejected() {
        let config = PlayerConfig {
            mass: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositive { field: "mass", .. })));

        let config = PlayerConfig {
            crouch_box: Vec3::new(0.6, 0.0, 1.2),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "crouch_box", .. })
        ));
    }

    #[test]
    fn test_surface_angles_and_jump_speeds_rejected() {
        let config = PlayerConfig {
            run_surface_angle: 70.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SurfaceAngles { .. })));

        let config = PlayerConfig {
            min_jump_speed: 40.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { field: "jump_speed", .. })
        ));
    }

    #[test]
    fn test_pose_lookups() {
        let config = PlayerConfig::default();
        assert_eq!(config.max_speed_for(Pose::Sprint), config.max_sprint_speed);
        assert_eq!(config.max_speed_for(Pose::Prone), config.max_prone_speed);
        assert_eq!(config.max_force_for(Pose::Stand), config.run_force);
        assert_eq!(config.box_for(Pose::Sprint), config.bounding_box);
        assert_eq!(config.box_for(Pose::Crouch), config.crouch_box);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: PlayerConfig = serde_json::from_str(r#"{ "mass": 120.0 }"#).unwrap();
        assert_eq!(config.mass, 120.0);
        assert_eq!(config.grab_height, PlayerConfig::default().grab_height);
    }
}
