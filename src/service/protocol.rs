//! Protocol Messages
//!
//! Wire format between the transport layer and the host. Messages are JSON
//! for debugging ease, with bincode available for the plain structs.

use serde::{Serialize, Deserialize};

use crate::game::actor::ActorId;
use crate::game::arena::{BombPlaced, Direction, ExplosionOutcome, MoveOutcome, PickupOutcome, PowerUpId};
use crate::game::error::RuleError;
use crate::game::minefield::{FlagOutcome, RevealKind, RevealedCell};
use crate::game::router::{ActorListing, Command, CommandResult, JoinSnapshot, Outcome, RouterError};
use crate::service::host::HostError;
use crate::service::progression::ProgressUpdate;

// =============================================================================
// CLIENT -> HOST
// =============================================================================

/// Requests a transport forwards on behalf of a connected actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter a game mode.
    Join {
        /// Mode name.
        game: String,
        /// Display name from the identity service.
        username: String,
        /// Level from the identity service.
        level: u32,
    },
    /// Leave a game mode.
    Leave {
        /// Mode name.
        game: String,
    },
    /// Mode-specific command.
    Action {
        /// Mode name.
        game: String,
        /// The command.
        command: ClientCommand,
    },
}

/// Commands a connected actor may send.
///
/// There is no detonation command. Bombs explode only when the host's fuse
/// fires; an `explode_bomb` sent by a client fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
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
    /// Collect a power-up.
    PickupPowerup {
        /// Power-up to collect.
        power_up_id: PowerUpId,
    },
}

impl From<ClientCommand> for Command {
    fn from(command: ClientCommand) -> Self {
        match command {
            ClientCommand::Reveal { row, col } => Command::Reveal { row, col },
            ClientCommand::Flag { row, col } => Command::Flag { row, col },
            ClientCommand::Cursor { row, col } => Command::Cursor { row, col },
            ClientCommand::Move { x, y, direction } => Command::Move { x, y, direction },
            ClientCommand::PlaceBomb { x, y } => Command::PlaceBomb { x, y },
            ClientCommand::PickupPowerup { power_up_id } => Command::PickupPowerup { power_up_id },
        }
    }
}

// =============================================================================
// HOST -> CLIENT
// =============================================================================

/// Stable failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Mode name not hosted.
    UnknownMode,
    /// Command sent to the wrong kind of mode.
    ModeMismatch,
    /// Host is shutting down.
    Unavailable,
    /// Engine rule failure.
    #[serde(untagged)]
    Rule(RuleError),
}

impl From<RuleError> for ErrorCode {
    fn from(err: RuleError) -> Self {
        ErrorCode::Rule(err)
    }
}

impl From<&HostError> for ErrorCode {
    fn from(err: &HostError) -> Self {
        match err {
            HostError::Closed | HostError::ReplyDropped => ErrorCode::Unavailable,
            HostError::Router(router) => router.into(),
        }
    }
}

impl From<&RouterError> for ErrorCode {
    fn from(err: &RouterError) -> Self {
        match err {
            RouterError::UnknownMode(_) => ErrorCode::UnknownMode,
            RouterError::ModeMismatch { .. } => ErrorCode::ModeMismatch,
        }
    }
}

/// Reply to a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the request was applied.
    pub success: bool,
    /// Failure code when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorCode>,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Outcome>,
}

impl CommandResponse {
    /// Successful reply.
    pub fn ok(data: Outcome) -> Self {
        Self { success: true, error: None, data: Some(data) }
    }

    /// Successful reply without payload.
    pub fn done() -> Self {
        Self { success: true, error: None, data: None }
    }

    /// Failed reply.
    pub fn failed(code: impl Into<ErrorCode>) -> Self {
        Self { success: false, error: Some(code.into()), data: None }
    }

    /// Flatten both error tiers into one reply.
    pub fn from_dispatch(result: &Result<CommandResult, RouterError>) -> Self {
        match result {
            Ok(Ok(outcome)) => Self::ok(outcome.clone()),
            Ok(Err(rule)) => Self::failed(*rule),
            Err(router) => Self::failed(router),
        }
    }
}

/// Reply to a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinResponse {
    /// Whether the join was applied.
    pub success: bool,
    /// Failure code when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<ErrorCode>,
    /// Mode snapshot.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub game_state: Option<JoinSnapshot>,
}

impl JoinResponse {
    /// Failed join.
    pub fn failed(code: impl Into<ErrorCode>) -> Self {
        Self { success: false, error: Some(code.into()), game_state: None }
    }
}

impl From<&Result<JoinSnapshot, RouterError>> for JoinResponse {
    fn from(result: &Result<JoinSnapshot, RouterError>) -> Self {
        match result {
            Ok(snapshot) => Self { success: true, error: None, game_state: Some(snapshot.clone()) },
            Err(err) => Self::failed(err),
        }
    }
}

/// Reply to one [`ClientMessage`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientReply {
    /// Reply to a join.
    Join(JoinResponse),
    /// Reply to a leave or an action.
    Command(CommandResponse),
}

impl ClientReply {
    /// Whether the message was applied.
    pub fn success(&self) -> bool {
        match self {
            ClientReply::Join(response) => response.success,
            ClientReply::Command(response) => response.success,
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Fan-out events published by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Membership of a mode changed.
    Players {
        /// Mode name.
        game: String,
        /// Current members.
        players: Vec<ActorListing>,
    },
    /// Cells were uncovered.
    BoardUpdate {
        /// Mode name.
        game: String,
        /// Revealing actor.
        actor: ActorId,
        /// Seed cell classification.
        kind: RevealKind,
        /// Uncovered cells.
        cells: Vec<RevealedCell>,
    },
    /// A private flag changed. Only for `owner`.
    FlagUpdate {
        /// Mode name.
        game: String,
        /// Flag owner and sole recipient.
        owner: ActorId,
        /// Toggle result.
        flag: FlagOutcome,
    },
    /// A member's pointer moved.
    CursorMoved {
        /// Mode name.
        game: String,
        /// Pointer owner.
        actor: ActorId,
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
    /// An arena actor moved.
    PlayerMoved {
        /// Mode name.
        game: String,
        /// Move result.
        movement: MoveOutcome,
    },
    /// A bomb was placed.
    BombPlaced {
        /// Mode name.
        game: String,
        /// Placement result.
        bomb: BombPlaced,
    },
    /// A bomb went off.
    Explosion {
        /// Mode name.
        game: String,
        /// Blast result.
        explosion: ExplosionOutcome,
    },
    /// A power-up was collected.
    PowerUpPicked {
        /// Mode name.
        game: String,
        /// Pickup result.
        pickup: PickupOutcome,
    },
    /// An actor's XP changed.
    ProgressUpdated {
        /// The change.
        update: ProgressUpdate,
    },
}

impl ServerEvent {
    /// Sole recipient for private events; `None` means everyone in the mode.
    pub fn recipient(&self) -> Option<ActorId> {
        match self {
            ServerEvent::FlagUpdate { owner, .. } => Some(*owner),
            ServerEvent::ProgressUpdated { update } => Some(update.actor),
            _ => None,
        }
    }

    /// Mode the event belongs to, if any.
    pub fn game(&self) -> Option<&str> {
        match self {
            ServerEvent::Players { game, .. }
            | ServerEvent::BoardUpdate { game, .. }
            | ServerEvent::FlagUpdate { game, .. }
            | ServerEvent::CursorMoved { game, .. }
            | ServerEvent::PlayerMoved { game, .. }
            | ServerEvent::BombPlaced { game, .. }
            | ServerEvent::Explosion { game, .. }
            | ServerEvent::PowerUpPicked { game, .. } => Some(game),
            ServerEvent::ProgressUpdated { .. } => None,
        }
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl CommandResponse {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerEvent {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ProgressUpdate {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}
