//! Arena Battle Engine
//!
//! Real-time bomb arena on a tile map. Actors move freely over empty tiles,
//! place bombs whose fuse is run by the host, and pick up power-ups that
//! blasts shake out of destructible blocks.
//!
//! The engine never keeps time itself: [`ArenaEngine::explode_bomb`] is a
//! plain command the host calls once a fuse expires, and it tolerates being
//! called late, twice or never.

pub mod state;
pub mod map;
pub mod bomb;
pub mod powerup;

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::{ArenaConfig, ConfigError};
use crate::core::clock::SharedClock;
use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::game::actor::{ActorId, ActorProfile};
use crate::game::error::RuleError;

pub use state::{
    ActorStats, ArenaActor, ArenaActorView, Bomb, BombId, Direction, PowerUp, PowerUpId,
    PowerUpKind, TilePos,
};
pub use map::{Tile, TileKind, TileMap};
pub use bomb::{BombPlaced, ExplosionOutcome};
pub use powerup::PickupOutcome;

/// Random spawn draws before falling back to [`FALLBACK_SPAWN`].
pub const SPAWN_ATTEMPTS: usize = 100;

/// Spawn tile used when the random search fails.
pub const FALLBACK_SPAWN: TilePos = TilePos::new(1, 1);

/// Everything a joining actor needs to render the arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    /// Tile rows, top to bottom.
    pub map: Vec<Vec<Tile>>,
    /// Public state of every member, including the joiner.
    pub players: Vec<ArenaActorView>,
    /// The joiner's full state.
    pub player_state: ArenaActor,
    /// Live bombs.
    pub bombs: Vec<Bomb>,
    /// Power-ups on the ground.
    pub power_ups: Vec<PowerUp>,
    /// Map width in tiles.
    pub map_width: usize,
    /// Map height in tiles.
    pub map_height: usize,
    /// Rendering hint.
    pub tile_size: u32,
}

/// Accepted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Moving actor.
    pub actor: ActorId,
    /// New column.
    pub x: usize,
    /// New row.
    pub y: usize,
    /// New facing.
    pub direction: Direction,
}

/// The arena world and its members.
pub struct ArenaEngine<R: RandomSource = DeterministicRng> {
    config: ArenaConfig,
    map: TileMap,
    actors: BTreeMap<ActorId, ArenaActor>,
    bombs: BTreeMap<BombId, Bomb>,
    power_ups: BTreeMap<PowerUpId, PowerUp>,
    next_bomb_id: BombId,
    next_power_up_id: PowerUpId,
    rng: R,
    clock: SharedClock,
}

impl<R: RandomSource> ArenaEngine<R> {
    /// Generate a fresh arena. The same source drives terrain, spawns and
    /// power-up drops.
    pub fn generate(config: ArenaConfig, mut rng: R, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;

        let map = TileMap::generate(config.width, config.height, &mut rng);
        info!(
            "Arena generated: {}x{}, {} destructible blocks",
            map.width(),
            map.height(),
            map.count(TileKind::Destructible)
        );
        Ok(Self::with_map(config, map, rng, clock))
    }

    /// Build an arena around an existing map. The map's dimensions win over
    /// the configured ones.
    pub fn with_map(mut config: ArenaConfig, map: TileMap, rng: R, clock: SharedClock) -> Self {
        config.width = map.width();
        config.height = map.height();
        Self {
            config,
            map,
            actors: BTreeMap::new(),
            bombs: BTreeMap::new(),
            power_ups: BTreeMap::new(),
            next_bomb_id: 1,
            next_power_up_id: 1,
            rng,
            clock,
        }
    }

    /// Tile map.
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// Active configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Full state of a member.
    pub fn actor(&self, id: &ActorId) -> Option<&ArenaActor> {
        self.actors.get(id)
    }

    /// Live bomb by id.
    pub fn bomb(&self, id: BombId) -> Option<&Bomb> {
        self.bombs.get(&id)
    }

    /// Live bombs, oldest first.
    pub fn bombs(&self) -> impl Iterator<Item = &Bomb> {
        self.bombs.values()
    }

    /// Power-up by id.
    pub fn power_up(&self, id: PowerUpId) -> Option<&PowerUp> {
        self.power_ups.get(&id)
    }

    /// Power-ups on the ground, oldest first.
    pub fn power_ups(&self) -> impl Iterator<Item = &PowerUp> {
        self.power_ups.values()
    }

    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    /// Spawn an actor and hand back its view of the arena.
    ///
    /// Joining again keeps position, hp, stats and live-bomb count; only the
    /// profile is refreshed.
    pub fn add_actor(&mut self, id: ActorId, profile: ActorProfile) -> ArenaSnapshot {
        let actor = match self.actors.get_mut(&id) {
            Some(existing) => {
                existing.username = profile.username;
                existing.level = profile.level;
                debug!("Actor {} rejoined arena", id.short());
                existing.clone()
            }
            None => {
                let pos = self.find_spawn(&id);
                let actor = ArenaActor::new(id, profile, pos, self.clock.now_ms());
                debug!("Actor {} joined arena at ({}, {})", id.short(), pos.x, pos.y);
                self.actors.insert(id, actor.clone());
                actor
            }
        };

        ArenaSnapshot {
            map: self.map.rows(),
            players: self.list_actors(),
            player_state: actor,
            bombs: self.bombs.values().cloned().collect(),
            power_ups: self.power_ups.values().cloned().collect(),
            map_width: self.map.width(),
            map_height: self.map.height(),
            tile_size: self.config.tile_size,
        }
    }

    /// Remove an actor. Their live bombs stay and still explode.
    pub fn remove_actor(&mut self, id: &ActorId) -> bool {
        let removed = self.actors.remove(id).is_some();
        if removed {
            debug!("Actor {} left arena", id.short());
        }
        removed
    }

    /// Public state of every member.
    pub fn list_actors(&self) -> Vec<ArenaActorView> {
        self.actors.values().map(ArenaActor::view).collect()
    }

    /// Number of members.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    // =========================================================================
    // MOVEMENT
    // =========================================================================

    /// Move an actor to a claimed tile.
    ///
    /// The claim is trusted unless `max_move_step` is configured. Actors may
    /// share tiles.
    pub fn move_actor(
        &mut self,
        id: ActorId,
        x: i32,
        y: i32,
        direction: Direction,
    ) -> Result<MoveOutcome, RuleError> {
        let actor = self.actors.get_mut(&id).ok_or(RuleError::PlayerNotFound)?;
        let pos = self.map.checked(x as i64, y as i64).ok_or(RuleError::OutOfBounds)?;
        if !self.map.is_walkable(pos) {
            return Err(RuleError::Collision);
        }
        if let Some(step) = self.config.max_move_step {
            if actor.position().chebyshev(pos) > step as usize {
                return Err(RuleError::MoveTooFar);
            }
        }

        actor.x = pos.x;
        actor.y = pos.y;
        actor.direction = direction;

        Ok(MoveOutcome { actor: id, x: pos.x, y: pos.y, direction })
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Random empty tile no other actor stands on.
    fn find_spawn(&mut self, spawning: &ActorId) -> TilePos {
        for _ in 0..SPAWN_ATTEMPTS {
            let x = self.rng.next_index(self.map.width());
            let y = self.rng.next_index(self.map.height());
            let pos = TilePos::new(x, y);
            if self.map.is_walkable(pos) && !self.is_occupied(pos, spawning) {
                return pos;
            }
        }
        FALLBACK_SPAWN
    }

    fn is_occupied(&self, pos: TilePos, except: &ActorId) -> bool {
        self.actors
            .values()
            .any(|a| a.id != *except && a.position() == pos)
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Hash of the authoritative arena.
    pub fn state_hash(&self) -> StateHash {
        compute_state_hash(
            StateHasher::for_arena(),
            self.map.width() as u32,
            self.map.height() as u32,
            |hasher| {
                for tile in self.map.tiles() {
                    hasher.update_u8(tile.kind as u8);
                    hasher.update_bool(tile.is_pvp_zone);
                }

                hasher.update_u32(self.actors.len() as u32);
                for actor in self.actors.values() {
                    hasher.update_uuid(actor.id.as_bytes());
                    hasher.update_u64(actor.x as u64);
                    hasher.update_u64(actor.y as u64);
                    hasher.update_u32(actor.hp);
                    hasher.update_u32(actor.speed_tenths);
                    hasher.update_u32(actor.max_bombs);
                    hasher.update_u32(actor.active_bombs);
                    hasher.update_u32(actor.explosion_range);
                }

                hasher.update_u32(self.bombs.len() as u32);
                for bomb in self.bombs.values() {
                    hasher.update_u64(bomb.id);
                    hasher.update_u64(bomb.x as u64);
                    hasher.update_u64(bomb.y as u64);
                    hasher.update_uuid(bomb.owner.as_bytes());
                    hasher.update_u32(bomb.explosion_range);
                }

                hasher.update_u32(self.power_ups.len() as u32);
                for power_up in self.power_ups.values() {
                    hasher.update_u64(power_up.id);
                    hasher.update_u64(power_up.x as u64);
                    hasher.update_u64(power_up.y as u64);
                    hasher.update_u8(power_up.kind as u8);
                }

                hasher.update_u64(self.next_bomb_id);
                hasher.update_u64(self.next_power_up_id);
            },
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
