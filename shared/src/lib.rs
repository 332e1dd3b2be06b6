use serde::{Deserialize, Serialize};

pub const WORLD_WIDTH: f32 = 1000.0;
pub const WORLD_HEIGHT: f32 = 1000.0;
pub const PLAYER_INITIAL_SIZE: f32 = 10.0;
pub const FOOD_RADIUS: f32 = 5.0;
pub const FOOD_COUNT: usize = 50;
pub const FOOD_GROWTH: f32 = 1.0;
pub const TICK_MILLIS: u64 = 33;
pub const DEFAULT_NAME: &str = "Guest";
pub const PROTOCOL_VERSION: u32 = 1;
pub const FOOD_ID_LEN: usize = 9;
/// Display names are truncated to this many characters.
pub const MAX_NAME_LEN: usize = 20;
/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_BYTES: usize = 65_507;

/// Connection identifier handed out by the transport layer.
pub type ConnectionId = u32;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Join {
        name: Option<String>,
    },
    Move {
        x: f32,
        y: f32,
    },
    Heartbeat,
    Disconnect,

    Connected {
        client_id: ConnectionId,
    },
    Rejected {
        reason: String,
    },
    Roster {
        players: Vec<Player>,
    },
    WorldState {
        tick: u64,
        players: Vec<Player>,
        foods: Vec<Food>,
        world: WorldBounds,
    },
    GameOver {
        score: f32,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }
}

impl WorldBounds {
    /// True when a circle at (x, y) touches or crosses any edge.
    pub fn touches_edge(&self, x: f32, y: f32, radius: f32) -> bool {
        x - radius <= 0.0
            || x + radius >= self.width
            || y - radius <= 0.0
            || y + radius >= self.height
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub dead: bool,
}

impl Player {
    pub fn new(id: ConnectionId, name: &str, x: f32, y: f32, size: f32) -> Self {
        Self {
            id,
            name: name.to_string(),
            x,
            y,
            size,
            dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Food {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub color: String,
}

/// Circle-vs-circle overlap test used for consumption.
pub fn overlaps(player: &Player, food: &Food, food_radius: f32) -> bool {
    player.distance_to(food.x, food.y) < player.size + food_radius
}
