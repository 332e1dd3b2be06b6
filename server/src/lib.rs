//! # Growth Arena Server Library
//!
//! Authoritative server for a multiplayer growth arena: players steer a
//! circle around a bounded world, eat food to grow, and die the moment they
//! touch the edge. Every client observes the same world because the only
//! copy of it lives here.
//!
//! ## Core
//!
//! ### Player Registry (`players`)
//! One entry per joined connection. Join spawns at a random legal position,
//! move overwrites the position of a living player, remove deletes the
//! entry. Client-submitted coordinates are trusted as-is.
//!
//! ### Food Registry (`food`)
//! Holds exactly the configured number of food particles. Consuming an item
//! replaces it within the same call, so the population never dips.
//!
//! ### Simulation Engine (`engine`)
//! Once per tick, for each living player: boundary death (touching the edge
//! counts), then consumption of every food item whose circle overlaps the
//! player's, growing by a fixed amount per item. Dying players receive a
//! `GameOver` carrying their final size.
//!
//! ### Broadcaster (`broadcast`)
//! After every tick, a full world snapshot goes to every observer. After
//! every join or disconnect, a roster of players goes out immediately.
//!
//! ### Wiring (`game`)
//! [`game::GameState`] owns both registries and an [`observer::Observer`].
//! Its methods take `&mut self`; callers serialize events and ticks by
//! owning it from a single task.
//!
//! ## Transport
//!
//! [`network::Server`] speaks bincode-encoded [`shared::Packet`]s over UDP.
//! Receiving, sending and timeout checks run as separate tasks feeding a
//! single `select!` loop that owns the game state, so client events and
//! ticks never interleave.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), server::network::BoxError> {
//!     let mut server = Server::new("127.0.0.1:8080", ServerSettings::default()).await?;
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod engine;
pub mod food;
pub mod game;
pub mod network;
pub mod observer;
pub mod players;
