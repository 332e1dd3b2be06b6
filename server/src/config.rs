//! Runtime world configuration
//!
//! Defaults mirror the constants in `shared`; the binary may override them
//! from the command line before the world is created. Once a `GameState`
//! has been built from a config the values never change.

use shared::{
    ConnectionId, Food, Packet, Player, WorldBounds, FOOD_COUNT, FOOD_GROWTH, FOOD_ID_LEN, FOOD_RADIUS,
    MAX_DATAGRAM_BYTES, MAX_NAME_LEN, PLAYER_INITIAL_SIZE, WORLD_HEIGHT, WORLD_WIDTH,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub initial_player_size: f32,
    pub food_radius: f32,
    pub food_count: usize,
    pub food_growth: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            initial_player_size: PLAYER_INITIAL_SIZE,
            food_radius: FOOD_RADIUS,
            food_count: FOOD_COUNT,
            food_growth: FOOD_GROWTH,
        }
    }
}

fn positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn encoded_len(packet: &Packet) -> usize {
    bincode::serialized_size(packet)
        .ok()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(usize::MAX)
}

/// Encoded size of an empty world state and the per-item cost of the widest
/// possible food and player entries.
fn world_state_costs(world: WorldBounds) -> (usize, usize, usize) {
    let state = |players: Vec<Player>, foods: Vec<Food>| Packet::WorldState {
        tick: u64::MAX,
        players,
        foods,
        world,
    };
    let widest_food = Food {
        id: "f".repeat(FOOD_ID_LEN),
        x: 0.0,
        y: 0.0,
        color: "#ffffff".to_string(),
    };
    // Four UTF-8 bytes per character is the worst case for a truncated name.
    let widest_name = "\u{10FFFF}".repeat(MAX_NAME_LEN);
    let widest_player = Player::new(ConnectionId::MAX, &widest_name, 0.0, 0.0, 0.0);

    let base = encoded_len(&state(vec![], vec![]));
    let per_food = encoded_len(&state(vec![], vec![widest_food])).saturating_sub(base);
    let per_player = encoded_len(&state(vec![widest_player], vec![])).saturating_sub(base);
    (base, per_food, per_player)
}

impl WorldConfig {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.width,
            height: self.height,
        }
    }

    /// Rejects worlds in which a player or a food item could not be spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(positive_finite(self.width) && positive_finite(self.height)) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !positive_finite(self.initial_player_size) {
            return Err(ConfigError::NonPositive("initial player size"));
        }
        if !positive_finite(self.food_radius) {
            return Err(ConfigError::NonPositive("food radius"));
        }
        if !positive_finite(self.food_growth) {
            return Err(ConfigError::NonPositive("food growth"));
        }
        let smallest_side = self.width.min(self.height);
        if smallest_side <= 2.0 * self.initial_player_size {
            return Err(ConfigError::TooSmall {
                what: "player",
                radius: self.initial_player_size,
            });
        }
        if smallest_side <= 2.0 * self.food_radius {
            return Err(ConfigError::TooSmall {
                what: "food",
                radius: self.food_radius,
            });
        }
        Ok(())
    }

    /// Largest food population whose world state still fits one datagram
    /// with `max_clients` players in it.
    pub fn max_food_count(&self, max_clients: usize) -> usize {
        let (base, per_food, per_player) = world_state_costs(self.bounds());
        let players = per_player.saturating_mul(max_clients);
        MAX_DATAGRAM_BYTES
            .saturating_sub(base)
            .saturating_sub(players)
            / per_food.max(1)
    }

    /// Worst-case encoded size of a world state with `max_clients` players.
    pub fn world_state_bytes(&self, max_clients: usize) -> usize {
        let (base, per_food, per_player) = world_state_costs(self.bounds());
        base.saturating_add(per_food.saturating_mul(self.food_count))
            .saturating_add(per_player.saturating_mul(max_clients))
    }

    /// Full validation for a server accepting up to `max_clients` connections.
    pub fn validate_for(&self, max_clients: usize) -> Result<(), ConfigError> {
        self.validate()?;
        let bytes = self.world_state_bytes(max_clients);
        if bytes > MAX_DATAGRAM_BYTES {
            return Err(ConfigError::SnapshotTooLarge {
                food_count: self.food_count,
                max_clients,
                bytes,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidDimensions {
        width: f32,
        height: f32,
    },
    NonPositive(&'static str),
    TooSmall {
        what: &'static str,
        radius: f32,
    },
    SnapshotTooLarge {
        food_count: usize,
        max_clients: usize,
        bytes: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDimensions { width, height } => write!(
                f,
                "world dimensions must be finite and positive, got {}x{}",
                width, height
            ),
            ConfigError::NonPositive(what) => write!(f, "{} must be finite and positive", what),
            ConfigError::TooSmall { what, radius } => write!(
                f,
                "world is too small to spawn a {} of radius {}",
                what, radius
            ),
            ConfigError::SnapshotTooLarge {
                food_count,
                max_clients,
                bytes,
            } => write!(
                f,
                "world state with {} food and {} clients needs {} bytes, over the {} byte datagram limit",
                food_count, max_clients, bytes, MAX_DATAGRAM_BYTES
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
