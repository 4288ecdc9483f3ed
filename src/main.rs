//! Shared World Server
//!
//! Boots both worlds from the environment and runs a short scripted session
//! against the host. Transport is wired in by the embedding service.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared_world::{
    VERSION, ActorId, ActorProfile, Command, EngineConfig, GameHost, GameRouter, Outcome,
    core::clock::system_clock,
    game::router::{JoinSnapshot, ARENA_BATTLE_MODE, GRID_REVEAL_MODE},
    service::protocol::{ClientCommand, ClientMessage, ClientReply, JoinResponse, ServerEvent},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Shared World Server v{}", VERSION);

    let config = EngineConfig::from_env().context("invalid engine configuration")?;
    info!(
        "Grid {}x{} ({} mines), arena {}x{}, fuse {:?}, seed {}",
        config.grid.rows,
        config.grid.cols,
        config.grid.mine_count,
        config.arena.width,
        config.arena.height,
        config.fuse,
        config.seed
    );

    let router = GameRouter::new(&config, system_clock()).context("failed to generate worlds")?;
    for mode in router.modes() {
        if let Ok(hash) = router.state_hash(mode) {
            info!("{} world hash: {}", mode, hex::encode(hash));
        }
    }

    let (handle, host_task) = GameHost::spawn(router, config.fuse);
    demo_session(&handle, &config).await?;

    handle.shutdown().await?;
    host_task.await.context("host task panicked")?;
    Ok(())
}

/// Demo: one actor clears a cell and drops a bomb.
async fn demo_session(handle: &shared_world::HostHandle, config: &EngineConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let mut events = handle.subscribe();
    let actor = ActorId::random();
    let profile = ActorProfile::new("demo", 1);

    // The grid session goes through the same path a transport would use.
    let join = ClientMessage::Join {
        game: GRID_REVEAL_MODE.to_string(),
        username: profile.username.clone(),
        level: profile.level,
    };
    let joined = handle.handle_message(actor, ClientMessage::from_json(&join.to_json()?)?).await;
    if let ClientReply::Join(JoinResponse { game_state: Some(JoinSnapshot::GridReveal(board)), .. }) = &joined {
        info!("Joined {} ({}x{}, {} mines)", GRID_REVEAL_MODE, board.rows, board.cols, board.mine_count);
    }

    let reveal = ClientMessage::Action {
        game: GRID_REVEAL_MODE.to_string(),
        command: ClientCommand::Reveal {
            row: (config.grid.rows / 2) as i32,
            col: (config.grid.cols / 2) as i32,
        },
    };
    let reply = handle.handle_message(actor, reveal).await;
    info!("Reveal: {}", reply.to_json()?);

    let spawn = match handle.join(ARENA_BATTLE_MODE, actor, profile).await? {
        JoinSnapshot::ArenaBattle(snapshot) => snapshot.player_state.position(),
        JoinSnapshot::GridReveal(_) => anyhow::bail!("{} is not an arena", ARENA_BATTLE_MODE),
    };
    info!("Spawned at ({}, {})", spawn.x, spawn.y);

    let placed = handle
        .dispatch(ARENA_BATTLE_MODE, actor, Command::PlaceBomb { x: spawn.x as i32, y: spawn.y as i32 })
        .await?;
    if let Ok(Outcome::BombPlaced(bomb)) = placed {
        info!("Bomb {} placed, waiting {:?}", bomb.bomb_id, config.fuse);
        loop {
            match events.recv().await? {
                ServerEvent::Explosion { explosion, .. } if explosion.bomb_id == bomb.bomb_id => {
                    info!(
                        "Bomb {} exploded: {} cells, {} blocks destroyed",
                        explosion.bomb_id,
                        explosion.cells.len(),
                        explosion.blocks_destroyed
                    );
                    break;
                }
                event => info!("Event: {}", event.to_json()?),
            }
        }
    }

    if let Some(progress) = handle.progress(actor).await? {
        info!("Demo actor: {} xp, level {}", progress.total_xp, progress.level);
    }

    let health = handle.health().await?;
    info!("Online: {} ({:?})", health.online, health.modes);
    Ok(())
}
