//! Power-up drops and pickup.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rng::RandomSource;
use crate::game::actor::ActorId;
use crate::game::arena::state::{ActorStats, PowerUp, PowerUpId, PowerUpKind, TilePos};
use crate::game::arena::ArenaEngine;
use crate::game::error::RuleError;

/// Chance a destroyed block drops a power-up.
pub const DROP_PERCENT: u32 = 20;

/// Accepted pickup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickupOutcome {
    /// Collecting actor.
    pub actor: ActorId,
    /// The removed power-up.
    pub power_up: PowerUp,
    /// Stats after the upgrade.
    pub stats: ActorStats,
}

impl<R: RandomSource> ArenaEngine<R> {
    /// Roll for a drop on a freshly destroyed block.
    pub(super) fn maybe_drop_power_up(&mut self, pos: TilePos) -> Option<PowerUp> {
        if !self.rng.chance_percent(DROP_PERCENT) {
            return None;
        }
        let kind = PowerUpKind::ALL[self.rng.next_index(PowerUpKind::ALL.len())];
        Some(self.spawn_power_up(pos, kind))
    }

    /// Put a power-up on a tile.
    pub fn spawn_power_up(&mut self, pos: TilePos, kind: PowerUpKind) -> PowerUp {
        let id = self.next_power_up_id;
        self.next_power_up_id += 1;

        let power_up = PowerUp {
            id,
            x: pos.x,
            y: pos.y,
            kind,
            spawned_at: self.now_ms(),
        };
        self.power_ups.insert(id, power_up.clone());
        debug!("Power-up {} ({:?}) spawned at ({}, {})", id, kind, pos.x, pos.y);
        power_up
    }

    /// Collect a power-up the actor is standing on.
    pub fn pickup_power_up(&mut self, actor: ActorId, power_up_id: PowerUpId) -> Result<PickupOutcome, RuleError> {
        let pos = self
            .power_ups
            .get(&power_up_id)
            .map(PowerUp::position)
            .ok_or(RuleError::PowerupNotFound)?;
        let state = self.actors.get_mut(&actor).ok_or(RuleError::PlayerNotFound)?;
        if state.position() != pos {
            return Err(RuleError::NotAtPosition);
        }

        let power_up = self.power_ups.remove(&power_up_id).ok_or(RuleError::PowerupNotFound)?;
        power_up.kind.apply(state);
        let stats = state.stats();

        debug!("Actor {} picked up {:?}", actor.short(), power_up.kind);

        Ok(PickupOutcome { actor, power_up, stats })
    }
}
