//! Game simulation - the fixed-step tick loop.
//!
//! Real frame time is accumulated and consumed in 32 ms ticks, so every
//! machine running the same inputs produces the same bodies. Rendering reads
//! back through [`Simulation::render_states`] using whatever time is left
//! over in the accumulator.

use std::sync::Arc;

use glam::Vec3;
use strider_physics::movement::constants::TICK_SEC;
use strider_physics::{LocomotionEvent, PlayerController};

use crate::config::SimulationConfig;
use crate::input::PlayerInput;
use crate::level::Level;
use crate::player::{EntityId, Player, RenderState};

/// Ticks run by a single [`Simulation::advance`] at most, so a long stall
/// does not turn into a spiral of catch-up work.
const MAX_TICKS_PER_ADVANCE: u32 = 8;

/// The main game simulation.
///
/// This contains all game state and advances it deterministically based on
/// player inputs.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    /// All players in the game.
    pub players: Vec<Player>,

    /// Shared by every player.
    controller: Arc<PlayerController>,

    /// Next entity ID to assign.
    next_entity_id: EntityId,

    /// Unconsumed real time in seconds.
    accumulator: f32,

    /// Events raised since the last [`Simulation::drain_events`].
    events: Vec<(EntityId, LocomotionEvent)>,
}

impl Simulation {
    /// Create a new simulation with the given configuration and level.
    pub fn new(config: SimulationConfig, level: Level) -> Self {
        let controller = Arc::new(PlayerController::new(config.player.clone()));

        Self {
            frame: 0,
            config,
            level,
            players: Vec::new(),
            controller,
            next_entity_id: 1,
            accumulator: 0.0,
            events: Vec::new(),
        }
    }

    /// Create a simulation with default configuration and every test course.
    pub fn test() -> Self {
        Self::new(SimulationConfig::default(), Level::test_course())
    }

    pub fn controller(&self) -> &Arc<PlayerController> {
        &self.controller
    }

    /// Add a player to the simulation.
    ///
    /// Returns the player's ID.
    pub fn add_player(&mut self, name: &str) -> EntityId {
        let spawn_index = self.players.len() % self.level.player_spawn_count().max(1);
        let spawn = self.level.get_player_spawn(spawn_index);
        let position = spawn.map(|s| s.position).unwrap_or(Vec3::ZERO);
        let facing = spawn.map(|s| s.facing).unwrap_or(0.0);
        self.add_player_at(name, position, facing)
    }

    /// Add a player at an explicit position and yaw.
    pub fn add_player_at(&mut self, name: &str, position: Vec3, facing: f32) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let mut player = Player::new(id, name.to_string(), position, Arc::clone(&self.controller))
            .with_replication(self.config.replication);
        player.set_rotation(Vec3::new(0.0, 0.0, facing));

        log::debug!("player {} ({}) joined at {:?}", id, name, position);
        self.players.push(player);
        id
    }

    /// Remove a player from the simulation.
    pub fn remove_player(&mut self, player_id: EntityId) {
        self.players.retain(|p| p.id != player_id);
    }

    /// Get a player by ID.
    pub fn get_player(&self, player_id: EntityId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Get a mutable reference to a player by ID.
    pub fn get_player_mut(&mut self, player_id: EntityId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Advance the simulation by one tick.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Player inputs indexed by player position in the `players` array
    pub fn tick(&mut self, inputs: &[PlayerInput]) {
        let mut raised = Vec::new();

        for (i, player) in self.players.iter_mut().enumerate() {
            let input = inputs.get(i).cloned().unwrap_or_default();

            // Keys are relative to where the player is facing
            let command = input.to_command(player.body.yaw(), self.config.mouse_sensitivity);

            player.process_tick(&command, &self.level.collision, &mut raised);

            for event in raised.drain(..) {
                log::trace!("player {}: {:?}", player.id, event);
                self.events.push((player.id, event));
            }
        }

        self.frame += 1;
    }

    /// Feed `real_dt` seconds of frame time and run as many ticks as fit.
    ///
    /// Returns the number of ticks run.
    pub fn advance(&mut self, real_dt: f32, inputs: &[PlayerInput]) -> u32 {
        self.accumulator += real_dt.max(0.0);

        let mut ticks = 0;
        while self.accumulator >= TICK_SEC && ticks < MAX_TICKS_PER_ADVANCE {
            self.tick(inputs);
            self.accumulator -= TICK_SEC;
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_ADVANCE && self.accumulator >= TICK_SEC {
            log::warn!("simulation fell behind, dropping {:.3}s", self.accumulator);
            self.accumulator %= TICK_SEC;
        }

        for player in &mut self.players {
            player.advance_time(real_dt);
        }
        ticks
    }

    /// Backward interpolation fraction for the time left in the accumulator.
    pub fn interpolation_fraction(&self) -> f32 {
        (1.0 - self.accumulator / TICK_SEC).clamp(0.0, 1.0)
    }

    /// What to draw for every player right now.
    pub fn render_states(&mut self) -> Vec<(EntityId, RenderState)> {
        let dt = self.interpolation_fraction();
        let world = &self.level.collision;
        self.players
            .iter_mut()
            .map(|player| (player.id, player.interpolate_tick(dt, world)))
            .collect()
    }

    /// Take the events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<(EntityId, LocomotionEvent)> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// Tests
// ============================================================================
