//! Service Layer
//!
//! Everything around the engines that touches time or concurrency: the
//! host task that serializes commands, bomb fuses, the in-memory XP ledger
//! and the wire messages. This layer is **non-deterministic**; all rules
//! live in `game/`.

pub mod protocol;
pub mod scheduler;
pub mod progression;
pub mod host;

pub use protocol::{ClientCommand, ClientMessage, ClientReply, CommandResponse, JoinResponse, ServerEvent, ErrorCode};
pub use scheduler::FuseScheduler;
pub use progression::{ProgressionLedger, ActorProgress, PlayStats, ProgressUpdate};
pub use host::{GameHost, HostHandle, HostError, HealthReport};
