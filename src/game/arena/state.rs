//! Arena State Definitions
//!
//! Actors, bombs and power-ups owned by the arena engine.

use serde::{Serialize, Deserialize};

use crate::core::clock::TimestampMs;
use crate::game::actor::{ActorId, ActorProfile};

/// Bomb identifier, monotonic for the lifetime of an engine.
pub type BombId = u64;

/// Power-up identifier, monotonic for the lifetime of an engine.
pub type PowerUpId = u64;

// =============================================================================
// STAT CONSTANTS
// =============================================================================

/// Hit points every actor starts (and respawns) with.
pub const STARTING_HP: u32 = 3;

/// Starting speed in tenths of a tile per step (1.0).
pub const STARTING_SPEED_TENTHS: u32 = 10;

/// Starting bomb capacity.
pub const STARTING_MAX_BOMBS: u32 = 1;

/// Starting blast reach in tiles.
pub const STARTING_EXPLOSION_RANGE: u32 = 2;

/// Speed gained per speed power-up, in tenths (0.2).
pub const SPEED_STEP_TENTHS: u32 = 2;

/// Speed cap in tenths (2.0).
pub const MAX_SPEED_TENTHS: u32 = 20;

/// Bomb capacity cap.
pub const MAX_BOMBS_CAP: u32 = 5;

/// Blast reach cap.
pub const MAX_EXPLOSION_RANGE: u32 = 6;

// =============================================================================
// POSITIONS
// =============================================================================

/// Integer tile coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl TilePos {
    /// Create a position.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance to another tile.
    pub fn chebyshev(self, other: TilePos) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Facing reported by the client on every move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Facing up.
    Up,
    /// Facing down.
    #[default]
    Down,
    /// Facing left.
    Left,
    /// Facing right.
    Right,
}

// =============================================================================
// ACTOR STATE
// =============================================================================

/// Full state of an arena member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaActor {
    /// Actor id.
    pub id: ActorId,
    /// Display name.
    pub username: String,
    /// Level at join.
    pub level: u32,
    /// Current column.
    pub x: usize,
    /// Current row.
    pub y: usize,
    /// Hit points.
    pub hp: u32,
    /// Hit points restored on respawn.
    pub max_hp: u32,
    /// Movement speed in tenths.
    pub speed_tenths: u32,
    /// Live bomb capacity.
    pub max_bombs: u32,
    /// Bombs currently live.
    pub active_bombs: u32,
    /// Blast reach for newly placed bombs.
    pub explosion_range: u32,
    /// Facing.
    pub direction: Direction,
    /// Join time.
    pub joined_at: TimestampMs,
}

impl ArenaActor {
    /// Create a fresh actor at a spawn tile.
    pub fn new(id: ActorId, profile: ActorProfile, pos: TilePos, joined_at: TimestampMs) -> Self {
        Self {
            id,
            username: profile.username,
            level: profile.level,
            x: pos.x,
            y: pos.y,
            hp: STARTING_HP,
            max_hp: STARTING_HP,
            speed_tenths: STARTING_SPEED_TENTHS,
            max_bombs: STARTING_MAX_BOMBS,
            active_bombs: 0,
            explosion_range: STARTING_EXPLOSION_RANGE,
            direction: Direction::Down,
            joined_at,
        }
    }

    /// Current tile.
    #[inline]
    pub fn position(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }

    /// Movement speed in tiles.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed_tenths as f64 / 10.0
    }

    /// Whether another bomb may be placed.
    #[inline]
    pub fn can_place_bomb(&self) -> bool {
        self.active_bombs < self.max_bombs
    }

    /// Public view broadcast to other members.
    pub fn view(&self) -> ArenaActorView {
        ArenaActorView {
            actor: self.id,
            username: self.username.clone(),
            level: self.level,
            x: self.x,
            y: self.y,
            hp: self.hp,
            max_hp: self.max_hp,
            direction: self.direction,
        }
    }

    /// Upgradeable stats.
    pub fn stats(&self) -> ActorStats {
        ActorStats {
            speed: self.speed(),
            max_bombs: self.max_bombs,
            explosion_range: self.explosion_range,
        }
    }
}

/// What other members see of an actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaActorView {
    /// Actor id.
    pub actor: ActorId,
    /// Display name.
    pub username: String,
    /// Level at join.
    pub level: u32,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Facing.
    pub direction: Direction,
}

/// Stats changed by power-ups.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorStats {
    /// Movement speed in tiles.
    pub speed: f64,
    /// Live bomb capacity.
    pub max_bombs: u32,
    /// Blast reach.
    pub explosion_range: u32,
}

// =============================================================================
// BOMBS
// =============================================================================

/// A live bomb waiting for its fuse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bomb {
    /// Bomb id.
    pub id: BombId,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Placing actor.
    pub owner: ActorId,
    /// Owner's range when placed.
    pub explosion_range: u32,
    /// Placement time.
    pub placed_at: TimestampMs,
}

impl Bomb {
    /// Tile the bomb sits on.
    #[inline]
    pub fn position(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }
}

// =============================================================================
// POWER-UPS
// =============================================================================

/// Power-up type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PowerUpKind {
    /// +0.2 speed, capped at 2.0.
    Speed = 0,
    /// +1 bomb capacity, capped at 5.
    Bomb = 1,
    /// +1 blast reach, capped at 6.
    Range = 2,
}

impl PowerUpKind {
    /// All kinds, in drop-table order.
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Speed, PowerUpKind::Bomb, PowerUpKind::Range];

    /// Apply the clamped upgrade to an actor.
    pub fn apply(self, actor: &mut ArenaActor) {
        match self {
            PowerUpKind::Speed => {
                actor.speed_tenths = (actor.speed_tenths + SPEED_STEP_TENTHS).min(MAX_SPEED_TENTHS);
            }
            PowerUpKind::Bomb => {
                actor.max_bombs = (actor.max_bombs + 1).min(MAX_BOMBS_CAP);
            }
            PowerUpKind::Range => {
                actor.explosion_range = (actor.explosion_range + 1).min(MAX_EXPLOSION_RANGE);
            }
        }
    }
}

/// A power-up lying on a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    /// Power-up id.
    pub id: PowerUpId,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Type.
    pub kind: PowerUpKind,
    /// Spawn time.
    pub spawned_at: TimestampMs,
}

impl PowerUp {
    /// Tile the power-up sits on.
    #[inline]
    pub fn position(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> ArenaActor {
        ArenaActor::new(ActorId::new([1; 16]), ActorProfile::new("bob", 2), TilePos::new(1, 1), 0)
    }

    #[test]
    fn test_starting_stats() {
        let actor = fresh();
        assert_eq!(actor.hp, 3);
        assert_eq!(actor.max_hp, 3);
        assert_eq!(actor.speed(), 1.0);
        assert_eq!(actor.max_bombs, 1);
        assert_eq!(actor.explosion_range, 2);
        assert_eq!(actor.active_bombs, 0);
        assert_eq!(actor.direction, Direction::Down);
        assert!(actor.can_place_bomb());
    }

    #[test]
    fn test_power_up_clamps() {
        let mut actor = fresh();
        for _ in 0..20 {
            PowerUpKind::Speed.apply(&mut actor);
            PowerUpKind::Bomb.apply(&mut actor);
            PowerUpKind::Range.apply(&mut actor);
        }
        assert_eq!(actor.speed(), 2.0);
        assert_eq!(actor.max_bombs, 5);
        assert_eq!(actor.explosion_range, 6);
    }

    #[test]
    fn test_speed_steps() {
        let mut actor = fresh();
        PowerUpKind::Speed.apply(&mut actor);
        assert_eq!(actor.speed_tenths, 12);
        assert!((actor.speed() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(TilePos::new(1, 1).chebyshev(TilePos::new(3, 2)), 2);
        assert_eq!(TilePos::new(4, 4).chebyshev(TilePos::new(4, 4)), 0);
    }
}
