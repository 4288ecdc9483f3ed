//! Game Logic Module
//!
//! Both engines and the router in front of them. Every state transition
//! here is synchronous and runs to completion.
//!
//! ## Module Structure
//!
//! - `actor`: Actor identity and join profile
//! - `error`: Rule failures shared by both engines
//! - `minefield`: Shared mine-clearing board
//! - `arena`: Bomb arena (map, bombs, power-ups)
//! - `router`: Mode name to engine dispatch

pub mod actor;
pub mod error;
pub mod minefield;
pub mod arena;
pub mod router;

// Re-export key types
pub use actor::{ActorId, ActorProfile};
pub use error::RuleError;
pub use minefield::{Minefield, RevealKind, RevealOutcome, FlagAction, FlagOutcome, GridSnapshot};
pub use arena::{ArenaEngine, ArenaSnapshot, Direction, ExplosionOutcome, BombPlaced, PickupOutcome};
pub use router::{GameRouter, GameInstance, EngineKind, Command, Outcome, RouterError};
