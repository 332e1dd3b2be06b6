use crate::broadcast::{broadcast_roster, broadcast_world, WorldSnapshot};
use crate::config::WorldConfig;
use crate::engine::{self, TickReport};
use crate::food::FoodRegistry;
use crate::observer::Observer;
use crate::players::PlayerRegistry;
use log::debug;
use shared::{ConnectionId, Food, Player};

/// The authoritative world: both registries plus the observer that
/// receives every outbound notification.
///
/// All methods take `&mut self`, so whoever owns the `GameState` decides how
/// client events and ticks are serialized.
pub struct GameState<O: Observer> {
    pub tick: u64,
    config: WorldConfig,
    players: PlayerRegistry,
    foods: FoodRegistry,
    observer: O,
}

impl<O: Observer> GameState<O> {
    pub fn new(config: WorldConfig, observer: O) -> Self {
        Self::from_registries(
            config,
            PlayerRegistry::new(config),
            FoodRegistry::new(config),
            observer,
        )
    }

    /// Deterministic world for tests and replays.
    pub fn seeded(config: WorldConfig, seed: u64, observer: O) -> Self {
        Self::from_registries(
            config,
            PlayerRegistry::seeded(config, seed),
            FoodRegistry::seeded(config, seed.wrapping_add(1)),
            observer,
        )
    }

    fn from_registries(
        config: WorldConfig,
        players: PlayerRegistry,
        mut foods: FoodRegistry,
        observer: O,
    ) -> Self {
        foods.initialize(config.food_count);
        Self {
            tick: 0,
            config,
            players,
            foods,
            observer,
        }
    }

    pub fn join(&mut self, id: ConnectionId, name: Option<&str>) -> Player {
        let player = self.players.join(id, name);
        broadcast_roster(&mut self.observer, &self.players);
        player
    }

    /// Silently ignored for unknown ids and dead players.
    pub fn move_player(&mut self, id: ConnectionId, x: f32, y: f32) {
        if !self.players.move_to(id, x, y) {
            debug!("Ignoring move from {} (unknown or dead)", id);
        }
    }

    pub fn disconnect(&mut self, id: ConnectionId) {
        self.players.remove(id);
        broadcast_roster(&mut self.observer, &self.players);
    }

    /// Advances the world one step and broadcasts the resulting state.
    pub fn tick(&mut self) -> TickReport {
        let report = engine::advance(
            &self.config,
            &mut self.players,
            &mut self.foods,
            &mut self.observer,
        );
        self.tick += 1;

        let snapshot =
            WorldSnapshot::capture(self.tick, &self.players, &self.foods, self.config.bounds());
        broadcast_world(&mut self.observer, snapshot);
        report
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn players(&self) -> Vec<Player> {
        self.players.snapshot()
    }

    pub fn foods(&self) -> Vec<Food> {
        self.foods.snapshot()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}
