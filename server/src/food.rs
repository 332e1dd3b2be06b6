//! Food particle registry
//!
//! Keeps the population at exactly `food_count` once initialized: every
//! consumption is paired with a replacement in the same call.

use crate::config::WorldConfig;
use log::debug;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Food, FOOD_ID_LEN};

pub struct FoodRegistry {
    foods: Vec<Food>,
    config: WorldConfig,
    rng: StdRng,
}

impl FoodRegistry {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: WorldConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WorldConfig, rng: StdRng) -> Self {
        Self {
            foods: Vec::with_capacity(config.food_count),
            config,
            rng,
        }
    }

    /// Clears the registry and fills it with `target_count` fresh items.
    pub fn initialize(&mut self, target_count: usize) {
        self.foods.clear();
        for _ in 0..target_count {
            let food = self.spawn_one();
            self.foods.push(food);
        }
        debug!("Spawned {} food particles", self.foods.len());
    }

    /// Generates one food item without inserting it.
    ///
    /// The id is unique among the items currently held.
    pub fn spawn_one(&mut self) -> Food {
        let radius = self.config.food_radius;
        let id = loop {
            let candidate: String = (&mut self.rng)
                .sample_iter(&Alphanumeric)
                .take(FOOD_ID_LEN)
                .map(char::from)
                .collect();
            if !self.foods.iter().any(|f| f.id == candidate) {
                break candidate;
            }
        };

        Food {
            id,
            x: self.rng.gen_range(radius..=self.config.width - radius),
            y: self.rng.gen_range(radius..=self.config.height - radius),
            color: format!("#{:06x}", self.rng.gen_range(0..=0xFF_FFFFu32)),
        }
    }

    /// Removes the item at `index` and appends a replacement.
    ///
    /// Returns the consumed item, or `None` if `index` is out of range.
    pub fn consume_and_replenish(&mut self, index: usize) -> Option<Food> {
        if index >= self.foods.len() {
            return None;
        }
        let eaten = self.foods.remove(index);
        let replacement = self.spawn_one();
        self.foods.push(replacement);
        Some(eaten)
    }

    pub fn get(&self, index: usize) -> Option<&Food> {
        self.foods.get(index)
    }

    pub fn snapshot(&self) -> Vec<Food> {
        self.foods.clone()
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn replace_all(&mut self, foods: Vec<Food>) {
        self.foods = foods;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn registry() -> FoodRegistry {
        FoodRegistry::seeded(WorldConfig::default(), 11)
    }

    #[test]
    fn test_initialize_fills_to_target() {
        let mut foods = registry();
        foods.initialize(50);
        assert_eq!(foods.len(), 50);

        foods.initialize(10);
        assert_eq!(foods.len(), 10);
    }

    #[test]
    fn test_spawn_one_does_not_insert() {
        let mut foods = registry();
        foods.initialize(5);

        let _ = foods.spawn_one();
        assert_eq!(foods.len(), 5);
    }

    #[test]
    fn test_spawned_food_is_inside_inset_bounds() {
        let mut foods = registry();
        foods.initialize(1000);

        for food in foods.snapshot() {
            assert!((5.0..=995.0).contains(&food.x));
            assert!((5.0..=995.0).contains(&food.y));
        }
    }

    #[test]
    fn test_color_is_hex_triplet() {
        let mut foods = registry();

        for _ in 0..100 {
            let food = foods.spawn_one();
            assert_eq!(food.color.len(), 7);
            assert!(food.color.starts_with('#'));
            assert!(food.color[1..]
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_ids_unique_among_live_items() {
        let mut foods = registry();
        foods.initialize(500);

        let ids: HashSet<String> = foods.snapshot().into_iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), 500);
        assert!(ids.iter().all(|id| id.len() == FOOD_ID_LEN));
    }

    #[test]
    fn test_consume_and_replenish_keeps_count() {
        let mut foods = registry();
        foods.initialize(50);
        let victim = foods.get(10).cloned().unwrap();

        let eaten = foods.consume_and_replenish(10).unwrap();

        assert_eq!(eaten, victim);
        assert_eq!(foods.len(), 50);
        assert!(foods.snapshot().iter().all(|f| f.id != victim.id));
    }

    #[test]
    fn test_consume_out_of_range() {
        let mut foods = registry();
        foods.initialize(3);

        assert!(foods.consume_and_replenish(3).is_none());
        assert_eq!(foods.len(), 3);
    }
}
