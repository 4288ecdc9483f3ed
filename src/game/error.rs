//! Rule failures.
//!
//! These are the expected, recoverable outcomes of actors racing each other
//! on a shared world. A command that fails with a `RuleError` has not
//! mutated anything.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Reason a command was rejected by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum RuleError {
    /// Coordinates outside the board or map.
    #[error("Out of bounds")]
    OutOfBounds,

    /// Cell is already revealed.
    #[error("Already revealed")]
    AlreadyRevealed,

    /// Cell is flagged by the invoking actor.
    #[error("Cell is flagged")]
    CellFlagged,

    /// Revealed cells cannot carry flags.
    #[error("Cannot flag revealed cell")]
    CannotFlagRevealed,

    /// Target tile is not walkable.
    #[error("Collision")]
    Collision,

    /// Move exceeds the configured step limit.
    #[error("Move too far")]
    MoveTooFar,

    /// Actor already has `max_bombs` live bombs.
    #[error("Max bombs reached")]
    MaxBombsReached,

    /// Another live bomb occupies the tile.
    #[error("Bomb already exists here")]
    BombAlreadyExists,

    /// Bomb already exploded or never existed.
    #[error("Bomb not found")]
    BombNotFound,

    /// Power-up already picked up or never existed.
    #[error("Powerup not found")]
    PowerupNotFound,

    /// Actor is not a member of this game.
    #[error("Player not found")]
    PlayerNotFound,

    /// Actor is not standing on the power-up.
    #[error("Not at powerup position")]
    NotAtPosition,
}

impl RuleError {
    /// Stable wire code.
    pub fn code(self) -> &'static str {
        match self {
            RuleError::OutOfBounds => "out_of_bounds",
            RuleError::AlreadyRevealed => "already_revealed",
            RuleError::CellFlagged => "cell_flagged",
            RuleError::CannotFlagRevealed => "cannot_flag_revealed",
            RuleError::Collision => "collision",
            RuleError::MoveTooFar => "move_too_far",
            RuleError::MaxBombsReached => "max_bombs_reached",
            RuleError::BombAlreadyExists => "bomb_already_exists",
            RuleError::BombNotFound => "bomb_not_found",
            RuleError::PowerupNotFound => "powerup_not_found",
            RuleError::PlayerNotFound => "player_not_found",
            RuleError::NotAtPosition => "not_at_position",
        }
    }
}
