//! Game Host
//!
//! Owns the router inside a single tokio task. Every request from every
//! connection, and every expired bomb fuse, goes through one queue, so each
//! engine sees its commands strictly one at a time and in arrival order.
//!
//! After a command succeeds the host publishes fan-out events, settles XP in
//! the progression ledger and arms fuses for new bombs.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use serde::{Serialize, Deserialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::game::actor::{ActorId, ActorProfile};
use crate::game::router::{ActorListing, Command, CommandResult, GameRouter, JoinSnapshot, Outcome, RouterError};
use crate::service::progression::{ActorProgress, ProgressionLedger, ProgressUpdate};
use crate::service::protocol::{ClientMessage, ClientReply, CommandResponse, JoinResponse, ServerEvent};
use crate::service::scheduler::FuseScheduler;

/// Pending requests the host queue holds before callers wait.
pub const REQUEST_QUEUE_CAPACITY: usize = 1024;

/// Events kept for slow subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Host errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The host task has stopped.
    #[error("Host is not running")]
    Closed,

    /// The host dropped the request without answering.
    #[error("Host dropped the reply")]
    ReplyDropped,

    /// Structural routing failure.
    #[error("Routing error: {0}")]
    Router(#[from] RouterError),
}

/// Online counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Distinct actors in any mode.
    pub online: usize,
    /// Actors per mode.
    pub modes: BTreeMap<String, usize>,
}

enum Request {
    Join {
        mode: String,
        actor: ActorId,
        profile: ActorProfile,
        reply: oneshot::Sender<Result<JoinSnapshot, RouterError>>,
    },
    Leave {
        mode: String,
        actor: ActorId,
        reply: oneshot::Sender<bool>,
    },
    ListActors {
        mode: String,
        reply: oneshot::Sender<Vec<ActorListing>>,
    },
    ActorCount {
        mode: String,
        reply: oneshot::Sender<usize>,
    },
    Dispatch {
        mode: String,
        actor: ActorId,
        command: Command,
        /// Fuses fire without anyone waiting.
        reply: Option<oneshot::Sender<Result<CommandResult, RouterError>>>,
    },
    Progress {
        actor: ActorId,
        reply: oneshot::Sender<Option<ActorProgress>>,
    },
    Health {
        reply: oneshot::Sender<HealthReport>,
    },
    Shutdown,
}

/// The task that owns all game state.
pub struct GameHost {
    router: GameRouter,
    ledger: ProgressionLedger,
    requests: mpsc::Receiver<Request>,
    fuses: FuseScheduler<Request>,
    events: broadcast::Sender<ServerEvent>,
}

/// Cloneable front door to a running host.
#[derive(Clone)]
pub struct HostHandle {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<ServerEvent>,
}

impl GameHost {
    /// Create a host and the handle that feeds it.
    pub fn new(router: GameRouter, fuse: Duration) -> (Self, HostHandle) {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let host = Self {
            router,
            ledger: ProgressionLedger::new(),
            requests: request_rx,
            fuses: FuseScheduler::new(fuse, &request_tx),
            events: event_tx.clone(),
        };
        let handle = HostHandle {
            requests: request_tx,
            events: event_tx,
        };
        (host, handle)
    }

    /// Create a host and run it on the current runtime.
    pub fn spawn(router: GameRouter, fuse: Duration) -> (HostHandle, JoinHandle<()>) {
        let (host, handle) = Self::new(router, fuse);
        let task = tokio::spawn(host.run());
        (handle, task)
    }

    /// Serve requests until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Game host started, fuse {:?}", self.fuses.fuse());

        while let Some(request) = self.requests.recv().await {
            match request {
                Request::Join { mode, actor, profile, reply } => {
                    let _ = reply.send(self.handle_join(&mode, actor, profile));
                }
                Request::Leave { mode, actor, reply } => {
                    let _ = reply.send(self.handle_leave(&mode, actor));
                }
                Request::ListActors { mode, reply } => {
                    let _ = reply.send(self.router.list_actors(&mode));
                }
                Request::ActorCount { mode, reply } => {
                    let _ = reply.send(self.router.actor_count(&mode));
                }
                Request::Dispatch { mode, actor, command, reply } => {
                    let result = self.handle_dispatch(&mode, actor, command);
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    }
                }
                Request::Progress { actor, reply } => {
                    let _ = reply.send(self.ledger.get(&actor).cloned());
                }
                Request::Health { reply } => {
                    let _ = reply.send(self.health());
                }
                Request::Shutdown => break,
            }
        }

        info!("Game host stopped");
    }

    fn handle_join(&mut self, mode: &str, actor: ActorId, profile: ActorProfile) -> Result<JoinSnapshot, RouterError> {
        let username = profile.username.clone();
        let snapshot = self.router.join(mode, actor, profile)?;

        self.ledger.register(actor, &username);
        self.ledger.record_join(&actor, mode);
        info!("{} ({}) joined {}", username, actor.short(), mode);

        self.publish_players(mode);
        Ok(snapshot)
    }

    fn handle_leave(&mut self, mode: &str, actor: ActorId) -> bool {
        let left = self.router.leave(mode, &actor);
        if left {
            info!("{} left {}", actor.short(), mode);
            self.publish_players(mode);
        }
        left
    }

    fn handle_dispatch(&mut self, mode: &str, actor: ActorId, command: Command) -> Result<CommandResult, RouterError> {
        debug!("Dispatch {} from {} to {}", command.name(), actor.short(), mode);

        let result = self.router.dispatch(mode, actor, command)?;
        match &result {
            Ok(outcome) => self.after_success(mode, actor, outcome),
            Err(err) => debug!("{} rejected: {}", command.name(), err.code()),
        }
        Ok(result)
    }

    fn after_success(&mut self, mode: &str, actor: ActorId, outcome: &Outcome) {
        let game = mode.to_string();
        match outcome {
            Outcome::Revealed(reveal) => {
                self.publish(ServerEvent::BoardUpdate {
                    game,
                    actor,
                    kind: reveal.kind,
                    cells: reveal.cells.clone(),
                });
                let update = self.ledger.apply_reveal(actor, reveal);
                self.publish_progress(update);
            }
            Outcome::Flagged(flag) => {
                self.publish(ServerEvent::FlagUpdate { game, owner: actor, flag: *flag });
            }
            Outcome::CursorMoved(pos) => {
                self.publish(ServerEvent::CursorMoved { game, actor, row: pos.row, col: pos.col });
            }
            Outcome::Moved(movement) => {
                self.publish(ServerEvent::PlayerMoved { game, movement: *movement });
            }
            Outcome::BombPlaced(bomb) => {
                self.fuses.schedule(Request::Dispatch {
                    mode: mode.to_string(),
                    actor: bomb.owner,
                    command: Command::ExplodeBomb { bomb_id: bomb.bomb_id },
                    reply: None,
                });
                self.publish(ServerEvent::BombPlaced { game, bomb: *bomb });
            }
            Outcome::Exploded(explosion) => {
                let updates = self.ledger.apply_explosion(explosion.owner, explosion);
                self.publish(ServerEvent::Explosion { game, explosion: explosion.clone() });
                for update in updates {
                    self.publish_progress(Some(update));
                }
            }
            Outcome::PickedUp(pickup) => {
                self.publish(ServerEvent::PowerUpPicked { game, pickup: pickup.clone() });
            }
        }
    }

    fn health(&self) -> HealthReport {
        let modes: BTreeMap<String, usize> = self
            .router
            .modes()
            .map(|mode| (mode.to_string(), self.router.actor_count(mode)))
            .collect();
        let online: BTreeSet<ActorId> = self
            .router
            .modes()
            .flat_map(|mode| self.router.list_actors(mode))
            .map(|listing| listing.actor())
            .collect();

        HealthReport { online: online.len(), modes }
    }

    fn publish_players(&self, mode: &str) {
        self.publish(ServerEvent::Players {
            game: mode.to_string(),
            players: self.router.list_actors(mode),
        });
    }

    fn publish_progress(&self, update: Option<ProgressUpdate>) {
        if let Some(update) = update {
            self.publish(ServerEvent::ProgressUpdated { update });
        }
    }

    fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

impl HostHandle {
    /// Subscribe to fan-out events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Add an actor to a mode.
    pub async fn join(&self, mode: &str, actor: ActorId, profile: ActorProfile) -> Result<JoinSnapshot, HostError> {
        let result = self
            .request(|reply| Request::Join { mode: mode.to_string(), actor, profile, reply })
            .await?;
        Ok(result?)
    }

    /// Remove an actor from a mode.
    pub async fn leave(&self, mode: &str, actor: ActorId) -> Result<bool, HostError> {
        self.request(|reply| Request::Leave { mode: mode.to_string(), actor, reply }).await
    }

    /// Members of a mode.
    pub async fn list_actors(&self, mode: &str) -> Result<Vec<ActorListing>, HostError> {
        self.request(|reply| Request::ListActors { mode: mode.to_string(), reply }).await
    }

    /// Member count of a mode.
    pub async fn actor_count(&self, mode: &str) -> Result<usize, HostError> {
        self.request(|reply| Request::ActorCount { mode: mode.to_string(), reply }).await
    }

    /// Route a command and wait for its rule outcome.
    pub async fn dispatch(&self, mode: &str, actor: ActorId, command: Command) -> Result<CommandResult, HostError> {
        let result = self
            .request(|reply| Request::Dispatch {
                mode: mode.to_string(),
                actor,
                command,
                reply: Some(reply),
            })
            .await?;
        Ok(result?)
    }

    /// XP and stats of an actor.
    pub async fn progress(&self, actor: ActorId) -> Result<Option<ActorProgress>, HostError> {
        self.request(|reply| Request::Progress { actor, reply }).await
    }

    /// Online counts.
    pub async fn health(&self) -> Result<HealthReport, HostError> {
        self.request(|reply| Request::Health { reply }).await
    }

    /// Serve one decoded message from a connected actor.
    ///
    /// Every failure, including a stopped host, becomes a failed reply.
    pub async fn handle_message(&self, actor: ActorId, message: ClientMessage) -> ClientReply {
        match message {
            ClientMessage::Join { game, username, level } => {
                let profile = ActorProfile::new(username, level);
                let result = self
                    .request(|reply| Request::Join { mode: game, actor, profile, reply })
                    .await;
                match result {
                    Ok(joined) => ClientReply::Join(JoinResponse::from(&joined)),
                    Err(err) => ClientReply::Join(JoinResponse::failed(&err)),
                }
            }
            ClientMessage::Leave { game } => match self.leave(&game, actor).await {
                Ok(_) => ClientReply::Command(CommandResponse::done()),
                Err(err) => ClientReply::Command(CommandResponse::failed(&err)),
            },
            ClientMessage::Action { game, command } => {
                let result = self
                    .request(|reply| Request::Dispatch {
                        mode: game,
                        actor,
                        command: command.into(),
                        reply: Some(reply),
                    })
                    .await;
                match result {
                    Ok(dispatched) => ClientReply::Command(CommandResponse::from_dispatch(&dispatched)),
                    Err(err) => ClientReply::Command(CommandResponse::failed(&err)),
                }
            }
        }
    }

    /// Ask the host to stop after the requests already queued.
    pub async fn shutdown(&self) -> Result<(), HostError> {
        self.requests.send(Request::Shutdown).await.map_err(|_| HostError::Closed)
    }

    async fn request<T, F>(&self, make: F) -> Result<T, HostError>
    where
        F: FnOnce(oneshot::Sender<T>) -> Request,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(make(reply_tx))
            .await
            .map_err(|_| HostError::Closed)?;
        reply_rx.await.map_err(|_| HostError::ReplyDropped)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::core::clock::{ManualClock, SharedClock};
    use crate::core::rng::DeterministicRng;
    use crate::game::arena::{ArenaEngine, TileMap};
    use crate::game::error::RuleError;
    use crate::game::minefield::{Minefield, RevealKind};
    use crate::game::router::{GameInstance, ARENA_BATTLE_MODE, GRID_REVEAL_MODE};
    use crate::service::protocol::ClientCommand;
    use std::sync::Arc;

    const FUSE: Duration = Duration::from_millis(3000);

    fn clock() -> SharedClock {
        Arc::new(ManualClock::new(0))
    }

    fn actor(n: u8) -> ActorId {
        ActorId::new([n; 16])
    }

    fn test_router() -> GameRouter {
        let mut router = GameRouter::empty();
        router.register(GRID_REVEAL_MODE, GameInstance::GridReveal(Minefield::with_mines(3, 3, &[], clock())));
        router.register(
            ARENA_BATTLE_MODE,
            GameInstance::ArenaBattle(ArenaEngine::with_map(
                ArenaConfig::default(),
                TileMap::open(9, 9),
                DeterministicRng::new(1),
                clock(),
            )),
        );
        router
    }

    async fn next_matching<F>(rx: &mut broadcast::Receiver<ServerEvent>, mut pred: F) -> ServerEvent
    where
        F: FnMut(&ServerEvent) -> bool,
    {
        loop {
            let event = rx.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn test_join_and_reveal() {
        let (handle, _task) = GameHost::spawn(test_router(), FUSE);
        let mut events = handle.subscribe();

        handle.join(GRID_REVEAL_MODE, actor(1), ActorProfile::new("alice", 1)).await.unwrap();
        let players = next_matching(&mut events, |e| matches!(e, ServerEvent::Players { .. })).await;
        assert!(matches!(players, ServerEvent::Players { ref players, .. } if players.len() == 1));

        let result = handle
            .dispatch(GRID_REVEAL_MODE, actor(1), Command::Reveal { row: 1, col: 1 })
            .await
            .unwrap();
        assert!(matches!(result, Ok(Outcome::Revealed(ref r)) if r.cells.len() == 9 && r.xp_change == 18));

        let board = next_matching(&mut events, |e| matches!(e, ServerEvent::BoardUpdate { .. })).await;
        assert!(matches!(board, ServerEvent::BoardUpdate { kind: RevealKind::Safe, .. }));

        let progress = next_matching(&mut events, |e| matches!(e, ServerEvent::ProgressUpdated { .. })).await;
        assert_eq!(progress.recipient(), Some(actor(1)));

        let stored = handle.progress(actor(1)).await.unwrap().unwrap();
        assert_eq!(stored.total_xp, 18);
        assert_eq!(stored.stats.cells_revealed, 9);
    }

    #[tokio::test]
    async fn test_rule_and_router_errors() {
        let (handle, _task) = GameHost::spawn(test_router(), FUSE);
        handle.join(GRID_REVEAL_MODE, actor(1), ActorProfile::new("alice", 1)).await.unwrap();

        let outside = handle
            .dispatch(GRID_REVEAL_MODE, actor(1), Command::Reveal { row: 5, col: 5 })
            .await
            .unwrap();
        assert_eq!(outside, Err(RuleError::OutOfBounds));

        let unknown = handle.join("chess", actor(1), ActorProfile::new("alice", 1)).await;
        assert_eq!(unknown, Err(HostError::Router(RouterError::UnknownMode("chess".into()))));

        let mismatch = handle
            .dispatch(GRID_REVEAL_MODE, actor(1), Command::PlaceBomb { x: 0, y: 0 })
            .await;
        assert!(matches!(mismatch, Err(HostError::Router(RouterError::ModeMismatch { .. }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fuse_detonates_bomb() {
        let (handle, _task) = GameHost::spawn(test_router(), FUSE);
        let mut events = handle.subscribe();
        handle.join(ARENA_BATTLE_MODE, actor(1), ActorProfile::new("bomber", 1)).await.unwrap();

        let placed = handle
            .dispatch(ARENA_BATTLE_MODE, actor(1), Command::PlaceBomb { x: 4, y: 4 })
            .await
            .unwrap();
        let bomb_id = match placed {
            Ok(Outcome::BombPlaced(bomb)) => bomb.bomb_id,
            other => panic!("unexpected {:?}", other),
        };

        // Capacity is one until the fuse burns down.
        let second = handle
            .dispatch(ARENA_BATTLE_MODE, actor(1), Command::PlaceBomb { x: 5, y: 5 })
            .await
            .unwrap();
        assert_eq!(second, Err(RuleError::MaxBombsReached));

        let start = tokio::time::Instant::now();
        let explosion = next_matching(&mut events, |e| matches!(e, ServerEvent::Explosion { .. })).await;
        assert!(start.elapsed() >= FUSE - Duration::from_millis(1));
        assert!(matches!(explosion, ServerEvent::Explosion { ref explosion, .. } if explosion.bomb_id == bomb_id));

        // The fuse already consumed the bomb.
        let stale = handle
            .dispatch(ARENA_BATTLE_MODE, actor(1), Command::ExplodeBomb { bomb_id })
            .await
            .unwrap();
        assert_eq!(stale, Err(RuleError::BombNotFound));

        let again = handle
            .dispatch(ARENA_BATTLE_MODE, actor(1), Command::PlaceBomb { x: 5, y: 5 })
            .await
            .unwrap();
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_flag_event_is_private() {
        let (handle, _task) = GameHost::spawn(test_router(), FUSE);
        let mut events = handle.subscribe();
        handle.join(GRID_REVEAL_MODE, actor(2), ActorProfile::new("bob", 1)).await.unwrap();

        handle
            .dispatch(GRID_REVEAL_MODE, actor(2), Command::Flag { row: 0, col: 0 })
            .await
            .unwrap()
            .unwrap();

        let flag = next_matching(&mut events, |e| matches!(e, ServerEvent::FlagUpdate { .. })).await;
        assert_eq!(flag.recipient(), Some(actor(2)));
    }

    #[tokio::test]
    async fn test_health_and_leave() {
        let (handle, _task) = GameHost::spawn(test_router(), FUSE);
        handle.join(GRID_REVEAL_MODE, actor(1), ActorProfile::new("a", 1)).await.unwrap();
        handle.join(ARENA_BATTLE_MODE, actor(1), ActorProfile::new("a", 1)).await.unwrap();
        handle.join(ARENA_BATTLE_MODE, actor(2), ActorProfile::new("b", 1)).await.unwrap();

        let health = handle.health().await.unwrap();
        assert_eq!(health.online, 2);
        assert_eq!(health.modes.get(GRID_REVEAL_MODE), Some(&1));
        assert_eq!(health.modes.get(ARENA_BATTLE_MODE), Some(&2));

        assert!(handle.leave(ARENA_BATTLE_MODE, actor(2)).await.unwrap());
        assert!(!handle.leave(ARENA_BATTLE_MODE, actor(2)).await.unwrap());
        assert!(!handle.leave("chess", actor(2)).await.unwrap());
        assert_eq!(handle.actor_count(ARENA_BATTLE_MODE).await.unwrap(), 1);
        assert_eq!(handle.list_actors(ARENA_BATTLE_MODE).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_client_messages() {
        let (handle, task) = GameHost::spawn(test_router(), FUSE);

        let join = ClientMessage::from_json(r#"{"type":"join","game":"minesweeper","username":"carol","level":6}"#).unwrap();
        let reply = handle.handle_message(actor(3), join).await;
        assert!(matches!(
            reply,
            ClientReply::Join(JoinResponse { success: true, game_state: Some(JoinSnapshot::GridReveal(_)), .. })
        ));
        let listed = handle.list_actors(GRID_REVEAL_MODE).await.unwrap();
        assert_eq!(listed[0].username(), "carol");

        let reveal = ClientMessage::from_json(r#"{"type":"action","game":"minesweeper","command":{"type":"reveal","row":0,"col":0}}"#).unwrap();
        let reply = handle.handle_message(actor(3), reveal).await;
        assert!(reply.success());
        assert!(reply.to_json().unwrap().contains("\"revealed\""));

        let wrong_mode = ClientMessage::Action {
            game: GRID_REVEAL_MODE.into(),
            command: ClientCommand::PlaceBomb { x: 0, y: 0 },
        };
        let reply = handle.handle_message(actor(3), wrong_mode).await;
        assert_eq!(reply.to_json().unwrap(), r#"{"success":false,"error":"mode_mismatch"}"#);

        let leave = ClientMessage::Leave { game: GRID_REVEAL_MODE.into() };
        assert!(handle.handle_message(actor(3), leave.clone()).await.success());
        assert_eq!(handle.actor_count(GRID_REVEAL_MODE).await.unwrap(), 0);

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        let reply = handle.handle_message(actor(3), leave).await;
        assert_eq!(reply.to_json().unwrap(), r#"{"success":false,"error":"unavailable"}"#);
    }

    #[tokio::test]
    async fn test_shutdown() {
        let (handle, task) = GameHost::spawn(test_router(), FUSE);
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(handle.actor_count(GRID_REVEAL_MODE).await, Err(HostError::Closed));
    }
}
