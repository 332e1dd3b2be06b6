//! World-state and roster broadcasting
//!
//! Every snapshot is complete: no deltas, no acknowledgements. The packet is
//! built from the registries at the moment of the call, so calling it right
//! after a mutation always reflects that mutation.

use crate::food::FoodRegistry;
use crate::observer::Observer;
use crate::players::PlayerRegistry;
use shared::{Food, Packet, Player, WorldBounds};

/// Immutable, complete view of the world after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub players: Vec<Player>,
    pub foods: Vec<Food>,
    pub world: WorldBounds,
}

impl WorldSnapshot {
    pub fn capture(
        tick: u64,
        players: &PlayerRegistry,
        foods: &FoodRegistry,
        world: WorldBounds,
    ) -> Self {
        Self {
            tick,
            players: players.snapshot(),
            foods: foods.snapshot(),
            world,
        }
    }

    pub fn into_packet(self) -> Packet {
        Packet::WorldState {
            tick: self.tick,
            players: self.players,
            foods: self.foods,
            world: self.world,
        }
    }
}

pub fn broadcast_world<O: Observer>(observer: &mut O, snapshot: WorldSnapshot) {
    observer.notify_all(snapshot.into_packet());
}

pub fn broadcast_roster<O: Observer>(observer: &mut O, players: &PlayerRegistry) {
    observer.notify_all(Packet::Roster {
        players: players.snapshot(),
    });
}
