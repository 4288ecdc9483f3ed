//! Bomb placement and explosions.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rng::RandomSource;
use crate::game::actor::ActorId;
use crate::game::arena::map::TileKind;
use crate::game::arena::state::{Bomb, BombId, PowerUp, TilePos};
use crate::game::arena::ArenaEngine;
use crate::game::error::RuleError;

/// Accepted bomb placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BombPlaced {
    /// New bomb id; the host's fuse fires `explode_bomb` with it.
    pub bomb_id: BombId,
    /// Placing actor.
    pub owner: ActorId,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Blast reach captured at placement.
    pub explosion_range: u32,
}

/// Result of a detonation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionOutcome {
    /// Detonated bomb.
    pub bomb_id: BombId,
    /// Placing actor, who may have left since.
    pub owner: ActorId,
    /// Every tile in the blast.
    pub cells: Vec<TilePos>,
    /// Power-ups dropped by destroyed blocks.
    pub power_ups: Vec<PowerUp>,
    /// Destructible tiles turned empty.
    pub blocks_destroyed: u32,
    /// Actors that took a hit.
    pub damaged_players: Vec<ActorId>,
    /// Actors that ran out of hit points and respawned.
    pub player_deaths: Vec<ActorId>,
}

impl<R: RandomSource> ArenaEngine<R> {
    /// Place a bomb for `owner` at `(x, y)`.
    ///
    /// The engine does not start a fuse; whoever drives the engine must call
    /// [`ArenaEngine::explode_bomb`] with the returned id.
    pub fn place_bomb(&mut self, owner: ActorId, x: i32, y: i32) -> Result<BombPlaced, RuleError> {
        if !self.actors.contains_key(&owner) {
            return Err(RuleError::PlayerNotFound);
        }
        let pos = self.map.checked(x as i64, y as i64).ok_or(RuleError::OutOfBounds)?;

        let now = self.now_ms();
        let actor = self.actors.get_mut(&owner).ok_or(RuleError::PlayerNotFound)?;
        if !actor.can_place_bomb() {
            return Err(RuleError::MaxBombsReached);
        }
        if self.bombs.values().any(|b| b.position() == pos) {
            return Err(RuleError::BombAlreadyExists);
        }

        let bomb_id = self.next_bomb_id;
        self.next_bomb_id += 1;

        actor.active_bombs += 1;
        let explosion_range = actor.explosion_range;

        self.bombs.insert(bomb_id, Bomb {
            id: bomb_id,
            x: pos.x,
            y: pos.y,
            owner,
            explosion_range,
            placed_at: now,
        });

        debug!(
            "Bomb {} placed by {} at ({}, {}) range {}",
            bomb_id,
            owner.short(),
            pos.x,
            pos.y,
            explosion_range
        );

        Ok(BombPlaced { bomb_id, owner, x: pos.x, y: pos.y, explosion_range })
    }

    /// Detonate a live bomb.
    ///
    /// Stale or unknown ids fail with `BombNotFound` and change nothing.
    pub fn explode_bomb(&mut self, bomb_id: BombId) -> Result<ExplosionOutcome, RuleError> {
        let bomb = self.bombs.remove(&bomb_id).ok_or(RuleError::BombNotFound)?;

        if let Some(owner) = self.actors.get_mut(&bomb.owner) {
            owner.active_bombs = owner.active_bombs.saturating_sub(1);
        }

        let cells = self.map.blast_cells(bomb.position(), bomb.explosion_range);

        let mut power_ups = Vec::new();
        let mut blocks_destroyed = 0;
        for &pos in &cells {
            let destructible = matches!(self.map.get(pos), Some(tile) if tile.kind == TileKind::Destructible);
            if !destructible {
                continue;
            }
            self.map.set_kind(pos, TileKind::Empty);
            blocks_destroyed += 1;
            if let Some(power_up) = self.maybe_drop_power_up(pos) {
                power_ups.push(power_up);
            }
        }

        let mut damaged_players = Vec::new();
        let mut player_deaths = Vec::new();
        let hit: Vec<ActorId> = self
            .actors
            .values()
            .filter(|a| {
                let pos = a.position();
                cells.contains(&pos) && matches!(self.map.get(pos), Some(tile) if tile.is_pvp_zone)
            })
            .map(|a| a.id)
            .collect();

        for id in hit {
            damaged_players.push(id);
            let dead = match self.actors.get_mut(&id) {
                Some(actor) => {
                    actor.hp = actor.hp.saturating_sub(1);
                    actor.hp == 0
                }
                None => false,
            };
            if dead {
                let spawn = self.find_spawn(&id);
                if let Some(actor) = self.actors.get_mut(&id) {
                    actor.x = spawn.x;
                    actor.y = spawn.y;
                    actor.hp = actor.max_hp;
                }
                debug!("Actor {} died and respawned at ({}, {})", id.short(), spawn.x, spawn.y);
                player_deaths.push(id);
            }
        }

        debug!(
            "Bomb {} exploded: {} cells, {} blocks, {} hit",
            bomb_id,
            cells.len(),
            blocks_destroyed,
            damaged_players.len()
        );

        Ok(ExplosionOutcome {
            bomb_id,
            owner: bomb.owner,
            cells,
            power_ups,
            blocks_destroyed,
            damaged_players,
            player_deaths,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
