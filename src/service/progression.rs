//! Progression Ledger
//!
//! In-memory XP, level and play statistics per actor. Nothing here is
//! persisted; a restart starts everyone from zero.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::actor::ActorId;
use crate::game::arena::ExplosionOutcome;
use crate::game::minefield::{RevealKind, RevealOutcome};

/// XP awarded to a bomb's owner per destroyed block.
pub const BLOCK_XP: i64 = 5;

/// XP lost by an actor killed by a blast.
pub const DEATH_XP: i64 = -30;

/// XP awarded to a bomb's owner per other actor killed.
pub const KILL_XP: i64 = 50;

/// XP per level.
pub const XP_PER_LEVEL: u64 = 100;

/// Level for a total, starting at 1.
pub fn level_for(total_xp: u64) -> u32 {
    (total_xp / XP_PER_LEVEL) as u32 + 1
}

/// Lifetime counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayStats {
    /// Board cells uncovered.
    pub cells_revealed: u32,
    /// Mines stepped on.
    pub mines_hit: u32,
    /// Arena blocks destroyed by own bombs.
    pub blocks_destroyed: u32,
    /// Other actors killed by own bombs.
    pub kills: u32,
    /// Times killed.
    pub deaths: u32,
}

/// Progress of one actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProgress {
    /// Display name.
    pub username: String,
    /// Accumulated XP, never negative.
    pub total_xp: u64,
    /// Derived level.
    pub level: u32,
    /// Joins per mode.
    pub games_played: BTreeMap<String, u32>,
    /// Counters.
    pub stats: PlayStats,
}

/// XP change notification for one actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Actor whose XP changed.
    pub actor: ActorId,
    /// Requested delta.
    pub xp_change: i64,
    /// Total after the change.
    pub total_xp: u64,
    /// Level after the change.
    pub level: u32,
}

/// XP and stats for every known actor.
#[derive(Debug, Default)]
pub struct ProgressionLedger {
    actors: BTreeMap<ActorId, ActorProgress>,
}

impl ProgressionLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure an actor has an entry. Existing progress is kept and the
    /// display name refreshed.
    pub fn register(&mut self, actor: ActorId, username: &str) -> &ActorProgress {
        let entry = self.actors.entry(actor).or_insert_with(|| ActorProgress {
            username: username.to_string(),
            total_xp: 0,
            level: 1,
            games_played: BTreeMap::new(),
            stats: PlayStats::default(),
        });
        entry.username = username.to_string();
        entry
    }

    /// Count a join.
    pub fn record_join(&mut self, actor: &ActorId, mode: &str) {
        if let Some(progress) = self.actors.get_mut(actor) {
            *progress.games_played.entry(mode.to_string()).or_default() += 1;
        }
    }

    /// Progress of an actor.
    pub fn get(&self, actor: &ActorId) -> Option<&ActorProgress> {
        self.actors.get(actor)
    }

    /// Apply an XP delta, clamping the total at zero. Unknown actors are
    /// ignored.
    pub fn add_xp(&mut self, actor: ActorId, xp_change: i64) -> Option<ProgressUpdate> {
        let progress = self.actors.get_mut(&actor)?;
        let total = (progress.total_xp as i64).saturating_add(xp_change).max(0);
        progress.total_xp = total as u64;
        progress.level = level_for(progress.total_xp);

        debug!(
            "Actor {} xp {:+} -> {} (level {})",
            actor.short(),
            xp_change,
            progress.total_xp,
            progress.level
        );

        Some(ProgressUpdate {
            actor,
            xp_change,
            total_xp: progress.total_xp,
            level: progress.level,
        })
    }

    /// Credit a reveal to the revealing actor.
    pub fn apply_reveal(&mut self, actor: ActorId, outcome: &RevealOutcome) -> Option<ProgressUpdate> {
        if let Some(progress) = self.actors.get_mut(&actor) {
            match outcome.kind {
                RevealKind::Mine => progress.stats.mines_hit += 1,
                RevealKind::Safe => progress.stats.cells_revealed += outcome.cells.len() as u32,
            }
        }
        if outcome.xp_change == 0 {
            return None;
        }
        self.add_xp(actor, outcome.xp_change as i64)
    }

    /// Settle an explosion: block and kill XP to `owner`, death penalties to
    /// the victims.
    pub fn apply_explosion(&mut self, owner: ActorId, outcome: &ExplosionOutcome) -> Vec<ProgressUpdate> {
        let mut updates = Vec::new();

        if outcome.blocks_destroyed > 0 {
            if let Some(progress) = self.actors.get_mut(&owner) {
                progress.stats.blocks_destroyed += outcome.blocks_destroyed;
            }
            updates.extend(self.add_xp(owner, outcome.blocks_destroyed as i64 * BLOCK_XP));
        }

        for victim in &outcome.player_deaths {
            if let Some(progress) = self.actors.get_mut(victim) {
                progress.stats.deaths += 1;
            }
            updates.extend(self.add_xp(*victim, DEATH_XP));

            if *victim != owner {
                if let Some(progress) = self.actors.get_mut(&owner) {
                    progress.stats.kills += 1;
                }
                updates.extend(self.add_xp(owner, KILL_XP));
            }
        }

        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::minefield::RevealedCell;
    use proptest::prelude::*;

    fn actor(n: u8) -> ActorId {
        ActorId::new([n; 16])
    }

    fn ledger_with(ids: &[u8]) -> ProgressionLedger {
        let mut ledger = ProgressionLedger::new();
        for &n in ids {
            ledger.register(actor(n), &format!("p{}", n));
        }
        ledger
    }

    fn safe_reveal(cells: usize) -> RevealOutcome {
        let cell = RevealedCell { row: 0, col: 0, is_mine: false, neighbor_mines: 0, revealed_by: actor(1) };
        RevealOutcome {
            kind: RevealKind::Safe,
            cells: vec![cell; cells],
            xp_change: 2 * cells as i32,
        }
    }

    #[test]
    fn test_levels() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(250), 3);
    }

    #[test]
    fn test_xp_floor_at_zero() {
        let mut ledger = ledger_with(&[1]);
        let update = ledger.add_xp(actor(1), -20).unwrap();
        assert_eq!(update.total_xp, 0);
        assert_eq!(update.level, 1);
        assert!(ledger.add_xp(actor(9), 10).is_none());
    }

    #[test]
    fn test_reveal_xp_and_stats() {
        let mut ledger = ledger_with(&[1]);
        let update = ledger.apply_reveal(actor(1), &safe_reveal(81)).unwrap();
        assert_eq!(update.total_xp, 162);
        assert_eq!(update.level, 2);

        let mine = RevealOutcome { kind: RevealKind::Mine, cells: Vec::new(), xp_change: -20 };
        ledger.apply_reveal(actor(1), &mine);

        let progress = ledger.get(&actor(1)).unwrap();
        assert_eq!(progress.total_xp, 142);
        assert_eq!(progress.stats.cells_revealed, 81);
        assert_eq!(progress.stats.mines_hit, 1);
    }

    #[test]
    fn test_explosion_settlement() {
        let mut ledger = ledger_with(&[1, 2]);
        ledger.add_xp(actor(2), 100);

        let outcome = ExplosionOutcome {
            bomb_id: 1,
            owner: actor(1),
            blocks_destroyed: 3,
            damaged_players: vec![actor(1), actor(2)],
            player_deaths: vec![actor(1), actor(2)],
            ..ExplosionOutcome::default()
        };
        let updates = ledger.apply_explosion(actor(1), &outcome);

        // Owner: +15 blocks, -30 own death (floored), +50 kill.
        assert_eq!(ledger.get(&actor(1)).unwrap().total_xp, 50);
        assert_eq!(ledger.get(&actor(2)).unwrap().total_xp, 70);
        assert_eq!(updates.len(), 4);

        let owner = ledger.get(&actor(1)).unwrap().stats;
        assert_eq!(owner.blocks_destroyed, 3);
        assert_eq!(owner.kills, 1);
        assert_eq!(owner.deaths, 1);
        assert_eq!(ledger.get(&actor(2)).unwrap().stats.deaths, 1);
    }

    #[test]
    fn test_register_keeps_progress() {
        let mut ledger = ledger_with(&[1]);
        ledger.add_xp(actor(1), 230);
        ledger.record_join(&actor(1), "minesweeper");
        ledger.record_join(&actor(1), "minesweeper");

        let progress = ledger.register(actor(1), "renamed");
        assert_eq!(progress.total_xp, 230);
        assert_eq!(progress.username, "renamed");
        assert_eq!(progress.games_played.get("minesweeper"), Some(&2));
        assert_eq!(progress.level, 3);
    }

    proptest! {
        #[test]
        fn prop_total_never_negative(deltas in proptest::collection::vec(-200i64..200, 0..50)) {
            let mut ledger = ledger_with(&[1]);
            for delta in deltas {
                let update = ledger.add_xp(actor(1), delta).unwrap();
                prop_assert_eq!(update.level, level_for(update.total_xp));
            }
        }
    }
}
