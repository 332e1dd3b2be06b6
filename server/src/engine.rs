//! One discrete simulation step
//!
//! For every living player: boundary death first, then food consumption
//! against the live food collection. A player that dies this step does not
//! eat. There is no player-vs-player interaction.

use crate::config::WorldConfig;
use crate::food::FoodRegistry;
use crate::observer::Observer;
use crate::players::PlayerRegistry;
use log::{debug, info};
use shared::{overlaps, ConnectionId, Packet};

/// What happened during a single step.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    /// Players killed by the boundary, with their final size.
    pub deaths: Vec<(ConnectionId, f32)>,
    pub food_eaten: usize,
}

pub fn advance<O: Observer>(
    config: &WorldConfig,
    players: &mut PlayerRegistry,
    foods: &mut FoodRegistry,
    observer: &mut O,
) -> TickReport {
    let bounds = config.bounds();
    let mut report = TickReport::default();

    for player in players.alive_mut() {
        if bounds.touches_edge(player.x, player.y, player.size) {
            player.dead = true;
            info!(
                "Player {} ({}) hit the boundary with size {}",
                player.id, player.name, player.size
            );
            observer.notify_one(player.id, Packet::GameOver { score: player.size });
            report.deaths.push((player.id, player.size));
            continue;
        }

        // Walk backwards so replacements appended at the tail are not revisited
        // and removals do not shift items still to be checked.
        let mut index = foods.len();
        while index > 0 {
            index -= 1;
            let in_reach = foods
                .get(index)
                .map_or(false, |food| overlaps(player, food, config.food_radius));
            if !in_reach {
                continue;
            }
            if let Some(food) = foods.consume_and_replenish(index) {
                player.size += config.food_growth;
                report.food_eaten += 1;
                debug!(
                    "Player {} ate food {}, size now {}",
                    player.id, food.id, player.size
                );
            }
        }
    }

    report
}
