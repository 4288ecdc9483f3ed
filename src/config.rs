//! Engine Configuration
//!
//! World sizes, the bomb fuse and the world seed. Defaults match the
//! production deployment; every field can be overridden from the environment.

use std::time::Duration;
use thiserror::Error;

/// Mine-clearing board configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridConfig {
    /// Board rows.
    pub rows: usize,
    /// Board columns.
    pub cols: usize,
    /// Exact number of mines placed at generation.
    pub mine_count: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            cols: 80,
            mine_count: 400,
        }
    }
}

impl GridConfig {
    /// Check the board can hold the requested mines.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        let cells = self.rows * self.cols;
        if self.mine_count > cells {
            return Err(ConfigError::TooManyMines {
                mine_count: self.mine_count,
                cells,
            });
        }
        Ok(())
    }
}

/// Arena battle configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Map width in tiles.
    pub width: usize,
    /// Map height in tiles.
    pub height: usize,
    /// Rendering hint passed through to clients (pixels per tile).
    pub tile_size: u32,
    /// Largest accepted move, in tiles (Chebyshev distance).
    /// `None` trusts the caller's claimed position.
    pub max_move_step: Option<u32>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            tile_size: 32,
            max_move_step: None,
        }
    }
}

impl ArenaConfig {
    /// Smallest map that still has four distinct spawn corners.
    pub const MIN_SIDE: usize = 3;

    /// Check the map is large enough for the spawn corners.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < Self::MIN_SIDE || self.height < Self::MIN_SIDE {
            return Err(ConfigError::ArenaTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Mine-clearing board.
    pub grid: GridConfig,
    /// Arena map.
    pub arena: ArenaConfig,
    /// Delay between a bomb placement and its explosion.
    pub fuse: Duration,
    /// Base seed; each mode derives its own stream from it.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            arena: ArenaConfig::default(),
            fuse: Duration::from_millis(3000),
            seed: wall_clock_seed(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "GRID_ROWS")? {
            config.grid.rows = v;
        }
        if let Some(v) = parse_var(&lookup, "GRID_COLS")? {
            config.grid.cols = v;
        }
        if let Some(v) = parse_var(&lookup, "GRID_MINES")? {
            config.grid.mine_count = v;
        }
        if let Some(v) = parse_var(&lookup, "ARENA_WIDTH")? {
            config.arena.width = v;
        }
        if let Some(v) = parse_var(&lookup, "ARENA_HEIGHT")? {
            config.arena.height = v;
        }
        if let Some(v) = parse_var(&lookup, "ARENA_TILE_SIZE")? {
            config.arena.tile_size = v;
        }
        if let Some(v) = parse_var(&lookup, "ARENA_MAX_MOVE_STEP")? {
            config.arena.max_move_step = Some(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "BOMB_FUSE_MS")? {
            config.fuse = Duration::from_millis(v);
        }
        if let Some(v) = parse_var(&lookup, "WORLD_SEED")? {
            config.seed = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate both worlds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.arena.validate()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// Board has no cells.
    #[error("grid must have at least one row and one column")]
    EmptyBoard,

    /// More mines requested than the board has cells.
    #[error("{mine_count} mines do not fit on a board of {cells} cells")]
    TooManyMines {
        /// Requested mines.
        mine_count: usize,
        /// Board cells.
        cells: usize,
    },

    /// Arena cannot hold four spawn corners.
    #[error("arena {width}x{height} is smaller than 3x3")]
    ArenaTooSmall {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn wall_clock_seed() -> u64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64
}
