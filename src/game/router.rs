//! Game Router
//!
//! Maps a mode name to the engine instance that owns it and forwards
//! commands, after checking the command belongs to that engine's kind.
//! The router holds no game rules of its own.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::core::clock::SharedClock;
use crate::core::hash::StateHash;
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::actor::{ActorId, ActorProfile};
use crate::game::arena::{
    ArenaActorView, ArenaEngine, ArenaSnapshot, BombId, BombPlaced, Direction, ExplosionOutcome,
    MoveOutcome, PickupOutcome, PowerUpId,
};
use crate::game::error::RuleError;
use crate::game::minefield::{FlagOutcome, GridMemberInfo, GridPos, GridSnapshot, Minefield, RevealOutcome};

/// Mode name of the shared mine-clearing board.
pub const GRID_REVEAL_MODE: &str = "minesweeper";

/// Mode name of the bomb arena.
pub const ARENA_BATTLE_MODE: &str = "bomberman";

// =============================================================================
// ENGINE KINDS
// =============================================================================

/// Which engine a command or instance belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Mine-clearing board.
    GridReveal,
    /// Bomb arena.
    ArenaBattle,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::GridReveal => f.write_str("grid_reveal"),
            EngineKind::ArenaBattle => f.write_str("arena_battle"),
        }
    }
}

/// Membership operations every engine supports.
pub trait ActorRegistry {
    /// State handed to a joining actor.
    type Snapshot;
    /// Public listing entry.
    type Listing;

    /// Register an actor.
    fn add_actor(&mut self, actor: ActorId, profile: ActorProfile) -> Self::Snapshot;
    /// Drop an actor. Returns false if it was not a member.
    fn remove_actor(&mut self, actor: &ActorId) -> bool;
    /// Public state of every member.
    fn list_actors(&self) -> Vec<Self::Listing>;
    /// Number of members.
    fn actor_count(&self) -> usize;
}

impl ActorRegistry for Minefield {
    type Snapshot = GridSnapshot;
    type Listing = GridMemberInfo;

    fn add_actor(&mut self, actor: ActorId, profile: ActorProfile) -> GridSnapshot {
        Minefield::add_actor(self, actor, profile)
    }

    fn remove_actor(&mut self, actor: &ActorId) -> bool {
        Minefield::remove_actor(self, actor)
    }

    fn list_actors(&self) -> Vec<GridMemberInfo> {
        Minefield::list_actors(self)
    }

    fn actor_count(&self) -> usize {
        Minefield::actor_count(self)
    }
}

impl<R: RandomSource> ActorRegistry for ArenaEngine<R> {
    type Snapshot = ArenaSnapshot;
    type Listing = ArenaActorView;

    fn add_actor(&mut self, actor: ActorId, profile: ActorProfile) -> ArenaSnapshot {
        ArenaEngine::add_actor(self, actor, profile)
    }

    fn remove_actor(&mut self, actor: &ActorId) -> bool {
        ArenaEngine::remove_actor(self, actor)
    }

    fn list_actors(&self) -> Vec<ArenaActorView> {
        ArenaEngine::list_actors(self)
    }

    fn actor_count(&self) -> usize {
        ArenaEngine::actor_count(self)
    }
}

// =============================================================================
// INSTANCES
// =============================================================================

/// One hosted engine.
pub enum GameInstance {
    /// Mine-clearing board.
    GridReveal(Minefield),
    /// Bomb arena.
    ArenaBattle(ArenaEngine),
}

impl GameInstance {
    /// Kind of the wrapped engine.
    pub fn kind(&self) -> EngineKind {
        match self {
            GameInstance::GridReveal(_) => EngineKind::GridReveal,
            GameInstance::ArenaBattle(_) => EngineKind::ArenaBattle,
        }
    }

    fn add_actor(&mut self, actor: ActorId, profile: ActorProfile) -> JoinSnapshot {
        match self {
            GameInstance::GridReveal(e) => JoinSnapshot::GridReveal(ActorRegistry::add_actor(e, actor, profile)),
            GameInstance::ArenaBattle(e) => {
                JoinSnapshot::ArenaBattle(Box::new(ActorRegistry::add_actor(e, actor, profile)))
            }
        }
    }

    fn remove_actor(&mut self, actor: &ActorId) -> bool {
        match self {
            GameInstance::GridReveal(e) => ActorRegistry::remove_actor(e, actor),
            GameInstance::ArenaBattle(e) => ActorRegistry::remove_actor(e, actor),
        }
    }

    fn list_actors(&self) -> Vec<ActorListing> {
        match self {
            GameInstance::GridReveal(e) => ActorRegistry::list_actors(e)
                .into_iter()
                .map(ActorListing::GridReveal)
                .collect(),
            GameInstance::ArenaBattle(e) => ActorRegistry::list_actors(e)
                .into_iter()
                .map(ActorListing::ArenaBattle)
                .collect(),
        }
    }

    fn actor_count(&self) -> usize {
        match self {
            GameInstance::GridReveal(e) => ActorRegistry::actor_count(e),
            GameInstance::ArenaBattle(e) => ActorRegistry::actor_count(e),
        }
    }

    /// World hash of the wrapped engine.
    pub fn state_hash(&self) -> StateHash {
        match self {
            GameInstance::GridReveal(e) => e.state_hash(),
            GameInstance::ArenaBattle(e) => e.state_hash(),
        }
    }
}

/// Join result, per engine kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "snapshot", rename_all = "snake_case")]
pub enum JoinSnapshot {
    /// Mine-clearing view.
    GridReveal(GridSnapshot),
    /// Arena view.
    ArenaBattle(Box<ArenaSnapshot>),
}

/// Public listing entry, per engine kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActorListing {
    /// Mine-clearing member.
    GridReveal(GridMemberInfo),
    /// Arena member.
    ArenaBattle(ArenaActorView),
}

impl ActorListing {
    /// Listed actor.
    pub fn actor(&self) -> ActorId {
        match self {
            ActorListing::GridReveal(info) => info.actor,
            ActorListing::ArenaBattle(view) => view.actor,
        }
    }

    /// Listed display name.
    pub fn username(&self) -> &str {
        match self {
            ActorListing::GridReveal(info) => &info.username,
            ActorListing::ArenaBattle(view) => &view.username,
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Mode-specific command from one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Uncover a board cell.
    Reveal {
        /// Row.
        row: i32,
        /// Column.
        col: i32,
    },
    /// Toggle a private flag.
    Flag {
        /// Row.
        row: i32,
        /// Column.
        col: i32,
    },
    /// Share where the actor is pointing.
    Cursor {
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
    /// Walk to a tile.
    Move {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
        /// Facing.
        direction: Direction,
    },
    /// Drop a bomb.
    PlaceBomb {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },
    /// Detonate a bomb whose fuse ran out.
    ExplodeBomb {
        /// Bomb to detonate.
        bomb_id: BombId,
    },
    /// Collect a power-up.
    PickupPowerup {
        /// Power-up to collect.
        power_up_id: PowerUpId,
    },
}

impl Command {
    /// Engine kind the command is addressed to.
    pub fn kind(&self) -> EngineKind {
        match self {
            Command::Reveal { .. } | Command::Flag { .. } | Command::Cursor { .. } => EngineKind::GridReveal,
            Command::Move { .. }
            | Command::PlaceBomb { .. }
            | Command::ExplodeBomb { .. }
            | Command::PickupPowerup { .. } => EngineKind::ArenaBattle,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Reveal { .. } => "reveal",
            Command::Flag { .. } => "flag",
            Command::Cursor { .. } => "cursor",
            Command::Move { .. } => "move",
            Command::PlaceBomb { .. } => "place_bomb",
            Command::ExplodeBomb { .. } => "explode_bomb",
            Command::PickupPowerup { .. } => "pickup_powerup",
        }
    }
}

/// Successful command result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    /// Cells uncovered.
    Revealed(RevealOutcome),
    /// Flag toggled.
    Flagged(FlagOutcome),
    /// Cursor stored.
    CursorMoved(GridPos),
    /// Actor moved.
    Moved(MoveOutcome),
    /// Bomb placed.
    BombPlaced(BombPlaced),
    /// Bomb detonated.
    Exploded(ExplosionOutcome),
    /// Power-up collected.
    PickedUp(PickupOutcome),
}

/// Rule-level result of a routed command.
pub type CommandResult = Result<Outcome, RuleError>;

/// Structural routing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// No engine is registered under the name.
    #[error("unknown game mode: {0}")]
    UnknownMode(String),

    /// The command targets a different engine kind than the mode hosts.
    #[error("mode {mode} hosts {actual}, command expects {expected}")]
    ModeMismatch {
        /// Requested mode.
        mode: String,
        /// Kind the command needs.
        expected: EngineKind,
        /// Kind the mode hosts.
        actual: EngineKind,
    },
}

// =============================================================================
// ROUTER
// =============================================================================

/// Mode name to engine table.
#[derive(Default)]
pub struct GameRouter {
    instances: BTreeMap<String, GameInstance>,
}

impl GameRouter {
    /// Router with no modes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Router hosting both standard modes, each generated from its own
    /// stream derived from the configured seed.
    pub fn new(config: &EngineConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut grid_rng = DeterministicRng::for_mode(config.seed, GRID_REVEAL_MODE);
        let minefield = Minefield::generate(&config.grid, &mut grid_rng, clock.clone())?;

        let arena_rng = DeterministicRng::for_mode(config.seed, ARENA_BATTLE_MODE);
        let arena = ArenaEngine::generate(config.arena.clone(), arena_rng, clock)?;

        let mut router = Self::empty();
        router.register(GRID_REVEAL_MODE, GameInstance::GridReveal(minefield));
        router.register(ARENA_BATTLE_MODE, GameInstance::ArenaBattle(arena));

        info!("Router ready with seed {}", config.seed);
        Ok(router)
    }

    /// Host an engine under a mode name, replacing any previous one.
    pub fn register(&mut self, mode: impl Into<String>, instance: GameInstance) {
        self.instances.insert(mode.into(), instance);
    }

    /// Hosted mode names.
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    /// Engine hosted under a mode.
    pub fn instance(&self, mode: &str) -> Option<&GameInstance> {
        self.instances.get(mode)
    }

    /// Add an actor to a mode.
    pub fn join(&mut self, mode: &str, actor: ActorId, profile: ActorProfile) -> Result<JoinSnapshot, RouterError> {
        let instance = self.resolve_mut(mode)?;
        Ok(instance.add_actor(actor, profile))
    }

    /// Remove an actor from a mode. Unknown modes and absent actors are ignored.
    pub fn leave(&mut self, mode: &str, actor: &ActorId) -> bool {
        self.instances
            .get_mut(mode)
            .is_some_and(|instance| instance.remove_actor(actor))
    }

    /// Members of a mode; empty for unknown modes.
    pub fn list_actors(&self, mode: &str) -> Vec<ActorListing> {
        self.instances
            .get(mode)
            .map(GameInstance::list_actors)
            .unwrap_or_default()
    }

    /// Member count of a mode; zero for unknown modes.
    pub fn actor_count(&self, mode: &str) -> usize {
        self.instances.get(mode).map_or(0, GameInstance::actor_count)
    }

    /// Route a command to its engine.
    ///
    /// The outer error is structural; the inner result carries the rule
    /// outcome.
    pub fn dispatch(&mut self, mode: &str, actor: ActorId, command: Command) -> Result<CommandResult, RouterError> {
        let expected = command.kind();
        let instance = self.resolve_mut(mode)?;

        let result = match (instance, command) {
            (GameInstance::GridReveal(e), Command::Reveal { row, col }) => {
                e.reveal(actor, row, col).map(Outcome::Revealed)
            }
            (GameInstance::GridReveal(e), Command::Flag { row, col }) => {
                e.toggle_flag(actor, row, col).map(Outcome::Flagged)
            }
            (GameInstance::GridReveal(e), Command::Cursor { row, col }) => {
                e.update_cursor(actor, row, col).map(Outcome::CursorMoved)
            }
            (GameInstance::ArenaBattle(e), Command::Move { x, y, direction }) => {
                e.move_actor(actor, x, y, direction).map(Outcome::Moved)
            }
            (GameInstance::ArenaBattle(e), Command::PlaceBomb { x, y }) => {
                e.place_bomb(actor, x, y).map(Outcome::BombPlaced)
            }
            (GameInstance::ArenaBattle(e), Command::ExplodeBomb { bomb_id }) => {
                e.explode_bomb(bomb_id).map(Outcome::Exploded)
            }
            (GameInstance::ArenaBattle(e), Command::PickupPowerup { power_up_id }) => {
                e.pickup_power_up(actor, power_up_id).map(Outcome::PickedUp)
            }
            (instance, _) => {
                let actual = instance.kind();
                warn!(
                    "Mode mismatch: {} sent to {} ({})",
                    command.name(),
                    mode,
                    actual
                );
                return Err(RouterError::ModeMismatch {
                    mode: mode.to_string(),
                    expected,
                    actual,
                });
            }
        };

        Ok(result)
    }

    /// World hash of a mode.
    pub fn state_hash(&self, mode: &str) -> Result<StateHash, RouterError> {
        self.instances
            .get(mode)
            .map(GameInstance::state_hash)
            .ok_or_else(|| RouterError::UnknownMode(mode.to_string()))
    }

    fn resolve_mut(&mut self, mode: &str) -> Result<&mut GameInstance, RouterError> {
        match self.instances.get_mut(mode) {
            Some(instance) => Ok(instance),
            None => {
                warn!("Unknown game mode: {}", mode);
                Err(RouterError::UnknownMode(mode.to_string()))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
