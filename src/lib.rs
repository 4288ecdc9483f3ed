//! # Shared World Server
//!
//! Authoritative game-state engine hosting two persistent shared worlds: a
//! cooperative mine-clearing board and a bomb arena.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SHARED WORLD SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Injectable primitives                    │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  ├── hash.rs      - World state hashing                      │
//! │  └── clock.rs     - Wall clock for timestamps                │
//! │                                                              │
//! │  config.rs        - Engine configuration (env overrides)     │
//! │                                                              │
//! │  game/            - Game rules (synchronous)                 │
//! │  ├── actor.rs     - Actor identity                           │
//! │  ├── error.rs     - Rule failures                            │
//! │  ├── minefield.rs - Shared mine-clearing board               │
//! │  ├── arena/       - Bomb arena (map, bombs, power-ups)       │
//! │  └── router.rs    - Mode name to engine dispatch             │
//! │                                                              │
//! │  service/         - Host runtime (async)                     │
//! │  ├── host.rs      - Single-queue command host                │
//! │  ├── scheduler.rs - Bomb fuses                               │
//! │  ├── progression.rs - In-memory XP ledger                    │
//! │  └── protocol.rs  - Wire messages                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read ambient state:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - Randomness only through an injected [`crate::core::rng::RandomSource`]
//! - Time only through an injected [`crate::core::clock::Clock`]
//!
//! Given the same seed and the same command sequence, both worlds reach
//! the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod config;
pub mod game;
pub mod service;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use config::EngineConfig;
pub use game::actor::{ActorId, ActorProfile};
pub use game::router::{GameRouter, Command, Outcome};
pub use service::host::{GameHost, HostHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
