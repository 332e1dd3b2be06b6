//! Authoritative registry of joined players
//!
//! Holds one `Player` per connection id. Client events mutate it directly
//! (join, move, remove) and the simulation engine grows or kills players
//! through `alive_mut`. Dead players stay registered, inert, until their
//! connection goes away.
//!
//! Entries are keyed in connection-id order, which is both the snapshot
//! order and the order the engine evaluates players in.

use crate::config::WorldConfig;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ConnectionId, Player, DEFAULT_NAME, MAX_NAME_LEN};
use std::collections::BTreeMap;

pub struct PlayerRegistry {
    players: BTreeMap<ConnectionId, Player>,
    config: WorldConfig,
    rng: StdRng,
}

impl PlayerRegistry {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: WorldConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WorldConfig, rng: StdRng) -> Self {
        Self {
            players: BTreeMap::new(),
            config,
            rng,
        }
    }

    /// Spawns a fresh player for `id` at a uniformly random legal position.
    ///
    /// An empty or missing name becomes the default name and long names are
    /// cut to `MAX_NAME_LEN` characters. Any previous entry for the same id
    /// is replaced.
    pub fn join(&mut self, id: ConnectionId, name: Option<&str>) -> Player {
        let size = self.config.initial_player_size;
        let x = self.rng.gen_range(size..=self.config.width - size);
        let y = self.rng.gen_range(size..=self.config.height - size);
        let name: String = match name {
            Some(name) if !name.is_empty() => name.chars().take(MAX_NAME_LEN).collect(),
            _ => DEFAULT_NAME.to_string(),
        };

        let player = Player::new(id, &name, x, y, size);
        if self.players.insert(id, player.clone()).is_some() {
            debug!("Player {} re-joined, previous entry replaced", id);
        }
        info!("Player {} ({}) joined at ({:.1}, {:.1})", id, player.name, x, y);
        player
    }

    /// Overwrites the position of a living player. Returns false when the id
    /// is unknown or the player is dead; neither case is an error.
    pub fn move_to(&mut self, id: ConnectionId, x: f32, y: f32) -> bool {
        match self.players.get_mut(&id) {
            Some(player) if player.is_alive() => {
                player.x = x;
                player.y = y;
                true
            }
            _ => false,
        }
    }

    /// Removes the entry for `id`. Idempotent.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        match self.players.remove(&id) {
            Some(player) => {
                info!("Player {} ({}) left with size {}", id, player.name, player.size);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Point-in-time copy of every registered player, ordered by id.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.values().cloned().collect()
    }

    /// Players the engine still has to evaluate this tick, in id order.
    pub(crate) fn alive_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut().filter(|p| p.is_alive())
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, id: ConnectionId, x: f32, y: f32, size: f32) {
        let player = self
            .players
            .entry(id)
            .or_insert_with(|| Player::new(id, DEFAULT_NAME, x, y, size));
        player.x = x;
        player.y = y;
        player.size = size;
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PlayerRegistry {
        PlayerRegistry::seeded(WorldConfig::default(), 7)
    }

    #[test]
    fn test_join_spawns_inside_inset_bounds() {
        let mut players = registry();

        for id in 0..500 {
            let player = players.join(id, Some("Alice"));
            assert_eq!(player.size, 10.0);
            assert!(player.is_alive());
            assert!((10.0..=990.0).contains(&player.x));
            assert!((10.0..=990.0).contains(&player.y));
        }
        assert_eq!(players.len(), 500);
    }

    #[test]
    fn test_join_default_name() {
        let mut players = registry();

        assert_eq!(players.join(1, None).name, "Guest");
        assert_eq!(players.join(2, Some("")).name, "Guest");
        assert_eq!(players.join(3, Some("Bob")).name, "Bob");
    }

    #[test]
    fn test_join_truncates_long_name() {
        let mut players = registry();

        let long = "x".repeat(MAX_NAME_LEN + 15);
        assert_eq!(players.join(1, Some(&long)).name.len(), MAX_NAME_LEN);

        let wide = "\u{1F600}".repeat(MAX_NAME_LEN * 2);
        let player = players.join(2, Some(&wide));
        assert_eq!(player.name.chars().count(), MAX_NAME_LEN);
        assert_eq!(player.name.len(), MAX_NAME_LEN * 4);
    }

    #[test]
    fn test_rejoin_overwrites_entry() {
        let mut players = registry();

        players.join(1, Some("First"));
        players.place(1, 5.0, 5.0, 30.0);
        let player = players.join(1, Some("Second"));

        assert_eq!(players.len(), 1);
        assert_eq!(player.size, 10.0);
        assert_eq!(players.get(1).map(|p| p.name.as_str()), Some("Second"));
    }

    #[test]
    fn test_move_updates_position_without_validation() {
        let mut players = registry();
        players.join(1, None);

        assert!(players.move_to(1, -500.0, 4000.0));
        let player = players.get(1).unwrap();
        assert_eq!(player.x, -500.0);
        assert_eq!(player.y, 4000.0);
    }

    #[test]
    fn test_move_unknown_is_ignored() {
        let mut players = registry();
        players.join(1, None);
        let before = players.snapshot();

        assert!(!players.move_to(99, 1.0, 1.0));
        assert_eq!(players.snapshot(), before);
    }

    #[test]
    fn test_move_dead_player_is_ignored() {
        let mut players = registry();
        players.join(1, None);
        players.place(1, 200.0, 200.0, 10.0);
        for player in players.alive_mut() {
            player.dead = true;
        }

        assert!(!players.move_to(1, 300.0, 300.0));
        assert_eq!(players.get(1).unwrap().x, 200.0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut players = registry();
        players.join(1, None);

        assert!(players.remove(1));
        assert!(!players.remove(1));
        assert!(players.is_empty());
        assert!(players.snapshot().iter().all(|p| p.id != 1));
    }

    #[test]
    fn test_alive_mut_skips_dead() {
        let mut players = registry();
        players.join(1, None);
        players.join(2, None);
        if let Some(player) = players.alive_mut().find(|p| p.id == 1) {
            player.dead = true;
        }

        let alive: Vec<ConnectionId> = players.alive_mut().map(|p| p.id).collect();
        assert_eq!(alive, vec![2]);
    }

    #[test]
    fn test_snapshot_is_ordered_and_complete() {
        let mut players = registry();
        for id in [5, 3, 9, 1] {
            players.join(id, None);
        }

        let ids: Vec<ConnectionId> = players.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_alive_mut_visits_in_id_order() {
        let mut players = registry();
        for id in [42, 7, 19, 3] {
            players.join(id, None);
        }

        let order: Vec<ConnectionId> = players.alive_mut().map(|p| p.id).collect();
        assert_eq!(order, vec![3, 7, 19, 42]);
    }
}
