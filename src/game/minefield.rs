//! Shared Minefield
//!
//! One large board revealed cooperatively by every member. Mine layout and
//! neighbour counts are fixed at generation; reveals are permanent. Flags
//! are a private overlay per actor and never touch the shared board.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::{ConfigError, GridConfig};
use crate::core::clock::{SharedClock, TimestampMs};
use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::RandomSource;
use crate::game::actor::{ActorId, ActorProfile};
use crate::game::error::RuleError;

/// XP for hitting a mine.
pub const MINE_PENALTY_XP: i32 = -20;

/// XP per safely revealed cell.
pub const XP_PER_SAFE_CELL: i32 = 2;

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// One board cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Mine placed at generation.
    pub is_mine: bool,
    /// Revealed by some actor.
    pub is_revealed: bool,
    /// Mines in the 8-neighbourhood (0 for mines).
    pub neighbor_mines: u8,
    /// Actor whose reveal uncovered this cell.
    pub revealed_by: Option<ActorId>,
}

/// A cell as shown to clients; hidden cells disclose nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleCell {
    /// Revealed by some actor.
    pub is_revealed: bool,
    /// Mine, only ever true when revealed.
    pub is_mine: bool,
    /// Neighbour count, 0 while hidden.
    pub neighbor_mines: u8,
    /// Actor whose reveal uncovered this cell.
    pub revealed_by: Option<ActorId>,
}

impl From<&Cell> for VisibleCell {
    fn from(cell: &Cell) -> Self {
        Self {
            is_revealed: cell.is_revealed,
            is_mine: cell.is_revealed && cell.is_mine,
            neighbor_mines: if cell.is_revealed { cell.neighbor_mines } else { 0 },
            revealed_by: cell.revealed_by,
        }
    }
}

/// Board coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

/// A cell uncovered by one reveal call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCell {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Whether it was a mine.
    pub is_mine: bool,
    /// Neighbour mine count.
    pub neighbor_mines: u8,
    /// Revealing actor.
    pub revealed_by: ActorId,
}

/// What the seed cell of a reveal turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealKind {
    /// Seed cell was a mine.
    Mine,
    /// Seed cell was safe.
    Safe,
}

/// Result of a successful reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOutcome {
    /// Seed cell classification.
    pub kind: RevealKind,
    /// Every cell revealed by this call, in flood-fill order.
    pub cells: Vec<RevealedCell>,
    /// XP delta for the progression service.
    pub xp_change: i32,
}

/// Flag toggle direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagAction {
    /// Flag placed.
    Add,
    /// Flag removed.
    Remove,
}

/// Result of a flag toggle. Only ever sent to the owning actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOutcome {
    /// What happened.
    pub action: FlagAction,
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

/// A member's pointer position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorInfo {
    /// Owner.
    pub actor: ActorId,
    /// Owner's display name.
    pub username: String,
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

/// Public listing entry for a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMemberInfo {
    /// Member id.
    pub actor: ActorId,
    /// Display name.
    pub username: String,
    /// Level at join.
    pub level: u32,
    /// Join time.
    pub joined_at: TimestampMs,
}

/// State returned to a joining actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Visibility-filtered board, row-major.
    pub board: Vec<Vec<VisibleCell>>,
    /// Board rows.
    pub rows: usize,
    /// Board columns.
    pub cols: usize,
    /// Configured mine count.
    pub mine_count: usize,
    /// The joining actor's own flags.
    pub player_flags: Vec<GridPos>,
}

#[derive(Clone, Debug)]
struct Member {
    profile: ActorProfile,
    joined_at: TimestampMs,
}

/// The shared mine-clearing board and its members.
pub struct Minefield {
    rows: usize,
    cols: usize,
    mine_count: usize,
    cells: Vec<Cell>,
    members: BTreeMap<ActorId, Member>,
    flags: BTreeMap<ActorId, BTreeSet<GridPos>>,
    cursors: BTreeMap<ActorId, GridPos>,
    clock: SharedClock,
}

impl Minefield {
    /// Generate a board: uniform draws rejecting duplicates until exactly
    /// `mine_count` mines are placed, then neighbour counts.
    pub fn generate<R: RandomSource>(
        config: &GridConfig,
        rng: &mut R,
        clock: SharedClock,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut cells = vec![Cell::default(); config.rows * config.cols];
        let mut placed = 0;
        while placed < config.mine_count {
            let row = rng.next_index(config.rows);
            let col = rng.next_index(config.cols);
            let cell = &mut cells[row * config.cols + col];
            if !cell.is_mine {
                cell.is_mine = true;
                placed += 1;
            }
        }

        let field = Self::from_cells(config.rows, config.cols, cells, clock);
        info!(
            "Minefield generated: {}x{} with {} mines",
            field.rows, field.cols, field.mine_count
        );
        Ok(field)
    }

    /// Build a board with mines at exactly the given positions.
    ///
    /// Positions outside the board are ignored; duplicates count once.
    pub fn with_mines(rows: usize, cols: usize, mines: &[(usize, usize)], clock: SharedClock) -> Self {
        let mut cells = vec![Cell::default(); rows * cols];
        for &(row, col) in mines {
            if row < rows && col < cols {
                cells[row * cols + col].is_mine = true;
            }
        }
        Self::from_cells(rows, cols, cells, clock)
    }

    fn from_cells(rows: usize, cols: usize, mut cells: Vec<Cell>, clock: SharedClock) -> Self {
        for row in 0..rows {
            for col in 0..cols {
                if cells[row * cols + col].is_mine {
                    continue;
                }
                let count = NEIGHBOR_OFFSETS
                    .iter()
                    .filter_map(|(dr, dc)| checked_pos(rows, cols, row as i64 + dr, col as i64 + dc))
                    .filter(|pos| cells[pos.row * cols + pos.col].is_mine)
                    .count();
                cells[row * cols + col].neighbor_mines = count as u8;
            }
        }

        let mine_count = cells.iter().filter(|c| c.is_mine).count();

        Self {
            rows,
            cols,
            mine_count,
            cells,
            members: BTreeMap::new(),
            flags: BTreeMap::new(),
            cursors: BTreeMap::new(),
            clock,
        }
    }

    /// Board rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Board columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Mines on the board.
    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    /// Authoritative cell, if in bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Number of revealed cells.
    pub fn revealed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_revealed).count()
    }

    /// Register a member and hand back its view of the board.
    pub fn add_actor(&mut self, actor: ActorId, profile: ActorProfile) -> GridSnapshot {
        self.members.insert(actor, Member {
            profile,
            joined_at: self.clock.now_ms(),
        });
        let flags = self.flags.entry(actor).or_default();
        let player_flags = flags.iter().copied().collect();

        debug!("Actor {} joined minefield", actor.short());

        GridSnapshot {
            board: self.visible_board(),
            rows: self.rows,
            cols: self.cols,
            mine_count: self.mine_count,
            player_flags,
        }
    }

    /// Drop a member with its flags and cursor. Returns false if absent.
    pub fn remove_actor(&mut self, actor: &ActorId) -> bool {
        self.flags.remove(actor);
        self.cursors.remove(actor);
        self.members.remove(actor).is_some()
    }

    /// Public member listing.
    pub fn list_actors(&self) -> Vec<GridMemberInfo> {
        self.members
            .iter()
            .map(|(id, m)| GridMemberInfo {
                actor: *id,
                username: m.profile.username.clone(),
                level: m.profile.level,
                joined_at: m.joined_at,
            })
            .collect()
    }

    /// Number of members.
    pub fn actor_count(&self) -> usize {
        self.members.len()
    }

    /// Board with hidden cells masked.
    pub fn visible_board(&self) -> Vec<Vec<VisibleCell>> {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(VisibleCell::from).collect())
            .collect()
    }

    /// Reveal a cell and flood-fill its zero-neighbour region.
    pub fn reveal(&mut self, actor: ActorId, row: i32, col: i32) -> Result<RevealOutcome, RuleError> {
        let pos = checked_pos(self.rows, self.cols, row as i64, col as i64)
            .ok_or(RuleError::OutOfBounds)?;

        let seed = self.cells[pos.row * self.cols + pos.col];
        if seed.is_revealed {
            return Err(RuleError::AlreadyRevealed);
        }
        if self.flags.get(&actor).is_some_and(|f| f.contains(&pos)) {
            return Err(RuleError::CellFlagged);
        }

        let cells = self.flood_reveal(pos, actor);

        let (kind, xp_change) = if seed.is_mine {
            (RevealKind::Mine, MINE_PENALTY_XP)
        } else {
            (RevealKind::Safe, XP_PER_SAFE_CELL * cells.len() as i32)
        };

        debug!(
            "Actor {} revealed ({}, {}): {:?}, {} cells",
            actor.short(), pos.row, pos.col, kind, cells.len()
        );

        Ok(RevealOutcome { kind, cells, xp_change })
    }

    /// Breadth-first reveal. Neighbours are queued unchecked; out-of-bounds
    /// and already-visited entries are dropped when dequeued.
    fn flood_reveal(&mut self, start: GridPos, actor: ActorId) -> Vec<RevealedCell> {
        let mut revealed = Vec::new();
        let mut visited = vec![false; self.cells.len()];
        let mut queue: VecDeque<(i64, i64)> = VecDeque::new();
        queue.push_back((start.row as i64, start.col as i64));

        while let Some((r, c)) = queue.pop_front() {
            let Some(pos) = checked_pos(self.rows, self.cols, r, c) else {
                continue;
            };
            let idx = pos.row * self.cols + pos.col;
            if visited[idx] {
                continue;
            }
            visited[idx] = true;

            let cell = &mut self.cells[idx];
            if cell.is_revealed {
                continue;
            }
            cell.is_revealed = true;
            cell.revealed_by = Some(actor);

            revealed.push(RevealedCell {
                row: pos.row,
                col: pos.col,
                is_mine: cell.is_mine,
                neighbor_mines: cell.neighbor_mines,
                revealed_by: actor,
            });

            if !cell.is_mine && cell.neighbor_mines == 0 {
                for (dr, dc) in NEIGHBOR_OFFSETS {
                    queue.push_back((r + dr, c + dc));
                }
            }
        }

        revealed
    }

    /// Toggle the actor's private flag on a hidden cell.
    pub fn toggle_flag(&mut self, actor: ActorId, row: i32, col: i32) -> Result<FlagOutcome, RuleError> {
        let pos = checked_pos(self.rows, self.cols, row as i64, col as i64)
            .ok_or(RuleError::OutOfBounds)?;

        if self.cells[pos.row * self.cols + pos.col].is_revealed {
            return Err(RuleError::CannotFlagRevealed);
        }
        if !self.members.contains_key(&actor) {
            return Err(RuleError::PlayerNotFound);
        }

        let flags = self.flags.entry(actor).or_default();
        let action = if flags.remove(&pos) {
            FlagAction::Remove
        } else {
            flags.insert(pos);
            FlagAction::Add
        };

        Ok(FlagOutcome { action, row: pos.row, col: pos.col })
    }

    /// Flags owned by one actor.
    pub fn flags_of(&self, actor: &ActorId) -> Vec<GridPos> {
        self.flags
            .get(actor)
            .map(|f| f.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Record where a member is pointing.
    pub fn update_cursor(&mut self, actor: ActorId, row: usize, col: usize) -> Result<GridPos, RuleError> {
        if !self.members.contains_key(&actor) {
            return Err(RuleError::PlayerNotFound);
        }
        let pos = GridPos { row, col };
        self.cursors.insert(actor, pos);
        Ok(pos)
    }

    /// All member cursors.
    pub fn cursors(&self) -> Vec<CursorInfo> {
        self.cursors
            .iter()
            .map(|(id, pos)| CursorInfo {
                actor: *id,
                username: self
                    .members
                    .get(id)
                    .map(|m| m.profile.username.clone())
                    .unwrap_or_default(),
                row: pos.row,
                col: pos.col,
            })
            .collect()
    }

    /// Hash of the authoritative board.
    pub fn state_hash(&self) -> StateHash {
        compute_state_hash(StateHasher::for_minefield(), self.cols as u32, self.rows as u32, |hasher| {
            for cell in &self.cells {
                hasher.update_bool(cell.is_mine);
                hasher.update_bool(cell.is_revealed);
                hasher.update_u8(cell.neighbor_mines);
                match &cell.revealed_by {
                    Some(id) => hasher.update_uuid(id.as_bytes()),
                    None => hasher.update_u8(0),
                }
            }
        })
    }
}

fn checked_pos(rows: usize, cols: usize, row: i64, col: i64) -> Option<GridPos> {
    if row < 0 || col < 0 || row >= rows as i64 || col >= cols as i64 {
        None
    } else {
        Some(GridPos { row: row as usize, col: col as usize })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::rng::DeterministicRng;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn clock() -> SharedClock {
        Arc::new(ManualClock::new(1_000))
    }

    fn actor(n: u8) -> ActorId {
        ActorId::new([n; 16])
    }

    fn joined(mut field: Minefield, ids: &[u8]) -> Minefield {
        for &n in ids {
            field.add_actor(actor(n), ActorProfile::new(format!("p{}", n), 1));
        }
        field
    }

    #[test]
    fn test_generate_exact_mine_count() {
        let config = GridConfig { rows: 50, cols: 80, mine_count: 400 };
        let mut rng = DeterministicRng::new(12345);
        let field = Minefield::generate(&config, &mut rng, clock()).unwrap();

        assert_eq!(field.mine_count(), 400);
        assert_eq!(field.cells.iter().filter(|c| c.is_mine).count(), 400);
    }

    #[test]
    fn test_generate_full_board() {
        let config = GridConfig { rows: 3, cols: 3, mine_count: 9 };
        let mut rng = DeterministicRng::new(1);
        let field = Minefield::generate(&config, &mut rng, clock()).unwrap();
        assert!(field.cells.iter().all(|c| c.is_mine));
    }

    #[test]
    fn test_generate_rejects_overfull_board() {
        let config = GridConfig { rows: 2, cols: 2, mine_count: 5 };
        let mut rng = DeterministicRng::new(1);
        assert!(Minefield::generate(&config, &mut rng, clock()).is_err());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = GridConfig { rows: 20, cols: 30, mine_count: 60 };
        let a = Minefield::generate(&config, &mut DeterministicRng::new(99), clock()).unwrap();
        let b = Minefield::generate(&config, &mut DeterministicRng::new(99), clock()).unwrap();
        let c = Minefield::generate(&config, &mut DeterministicRng::new(100), clock()).unwrap();

        assert_eq!(a.state_hash(), b.state_hash());
        assert_ne!(a.state_hash(), c.state_hash());
    }

    #[test]
    fn test_neighbor_counts() {
        // Mines at the corners of a 3x3 board
        let field = Minefield::with_mines(3, 3, &[(0, 0), (0, 2), (2, 0), (2, 2)], clock());

        assert_eq!(field.cell(1, 1).unwrap().neighbor_mines, 4);
        assert_eq!(field.cell(0, 1).unwrap().neighbor_mines, 2);
        assert_eq!(field.cell(1, 0).unwrap().neighbor_mines, 2);
        assert_eq!(field.cell(0, 0).unwrap().neighbor_mines, 0);
    }

    #[test]
    fn test_join_snapshot_hides_mines() {
        let mut field = Minefield::with_mines(3, 3, &[(0, 0)], clock());
        let snapshot = field.add_actor(actor(1), ActorProfile::new("alice", 3));

        assert_eq!(snapshot.rows, 3);
        assert_eq!(snapshot.cols, 3);
        assert_eq!(snapshot.mine_count, 1);
        assert!(snapshot.player_flags.is_empty());
        for row in &snapshot.board {
            for cell in row {
                assert!(!cell.is_mine);
                assert_eq!(cell.neighbor_mines, 0);
            }
        }

        // Once revealed, counts become visible
        field.reveal(actor(1), 1, 1).unwrap();
        let board = field.visible_board();
        assert!(board[1][1].is_revealed);
        assert_eq!(board[1][1].neighbor_mines, 1);
        assert!(!board[0][0].is_mine);
    }

    #[test]
    fn test_flood_fill_3x3_reveals_all() {
        let mut field = Minefield::with_mines(3, 3, &[], clock());
        let outcome = field.reveal(actor(1), 0, 2).unwrap();

        assert_eq!(outcome.kind, RevealKind::Safe);
        assert_eq!(outcome.cells.len(), 9);
        assert_eq!(outcome.xp_change, 18);
        assert_eq!(field.revealed_count(), 9);
    }

    #[test]
    fn test_flood_fill_9x9_scenario() {
        let mut field = Minefield::with_mines(9, 9, &[], clock());
        let outcome = field.reveal(actor(1), 4, 4).unwrap();

        assert_eq!(outcome.cells.len(), 81);
        assert_eq!(outcome.xp_change, 162);
        assert!(outcome.cells.iter().all(|c| c.revealed_by == actor(1)));
        assert_eq!(outcome.cells[0].row, 4);
        assert_eq!(outcome.cells[0].col, 4);
    }

    #[test]
    fn test_flood_fill_stops_at_numbers() {
        // Mine in the far corner: the fill uncovers everything but the mine
        let mut field = Minefield::with_mines(4, 4, &[(3, 3)], clock());
        let outcome = field.reveal(actor(1), 0, 0).unwrap();

        assert_eq!(outcome.cells.len(), 15);
        assert!(!field.cell(3, 3).unwrap().is_revealed);
        assert!(outcome.cells.iter().all(|c| !c.is_mine));
    }

    #[test]
    fn test_reveal_mine_penalty() {
        let mut field = Minefield::with_mines(3, 3, &[(1, 1)], clock());
        let outcome = field.reveal(actor(1), 1, 1).unwrap();

        assert_eq!(outcome.kind, RevealKind::Mine);
        assert_eq!(outcome.xp_change, -20);
        assert_eq!(outcome.cells.len(), 1);
        assert!(outcome.cells[0].is_mine);
    }

    #[test]
    fn test_reveal_numbered_cell_reveals_one() {
        let mut field = Minefield::with_mines(3, 3, &[(0, 0)], clock());
        let outcome = field.reveal(actor(1), 1, 1).unwrap();
        assert_eq!(outcome.cells.len(), 1);
        assert_eq!(outcome.xp_change, 2);
    }

    #[test]
    fn test_reveal_out_of_bounds() {
        let mut field = Minefield::with_mines(3, 3, &[], clock());
        assert_eq!(field.reveal(actor(1), -1, 0), Err(RuleError::OutOfBounds));
        assert_eq!(field.reveal(actor(1), 0, 3), Err(RuleError::OutOfBounds));
        assert_eq!(field.revealed_count(), 0);
    }

    #[test]
    fn test_reveal_already_revealed() {
        let mut field = Minefield::with_mines(3, 3, &[(0, 0)], clock());
        field.reveal(actor(1), 2, 2).unwrap();
        let before = field.state_hash();

        assert_eq!(field.reveal(actor(2), 2, 2), Err(RuleError::AlreadyRevealed));
        assert_eq!(field.reveal(actor(1), 2, 2), Err(RuleError::AlreadyRevealed));
        assert_eq!(field.state_hash(), before);
    }

    #[test]
    fn test_flagged_cell_blocks_owner_only() {
        let mut field = joined(Minefield::with_mines(3, 3, &[(0, 0)], clock()), &[1, 2]);
        field.toggle_flag(actor(1), 1, 1).unwrap();

        assert_eq!(field.reveal(actor(1), 1, 1), Err(RuleError::CellFlagged));
        assert!(field.reveal(actor(2), 1, 1).is_ok());
    }

    #[test]
    fn test_flag_toggle_and_privacy() {
        let mut field = joined(Minefield::with_mines(3, 3, &[], clock()), &[1, 2]);

        let a = field.toggle_flag(actor(1), 0, 0).unwrap();
        let b = field.toggle_flag(actor(2), 0, 0).unwrap();
        assert_eq!(a.action, FlagAction::Add);
        assert_eq!(b.action, FlagAction::Add);

        let a = field.toggle_flag(actor(1), 0, 0).unwrap();
        assert_eq!(a.action, FlagAction::Remove);
        assert!(field.flags_of(&actor(1)).is_empty());
        assert_eq!(field.flags_of(&actor(2)), vec![GridPos { row: 0, col: 0 }]);

        // Flags never reach the shared board
        assert!(field.visible_board().iter().flatten().all(|c| !c.is_revealed));
    }

    #[test]
    fn test_flag_errors() {
        let mut field = joined(Minefield::with_mines(3, 3, &[(0, 0)], clock()), &[1]);
        field.reveal(actor(1), 2, 2).unwrap();

        assert_eq!(field.toggle_flag(actor(1), 3, 0), Err(RuleError::OutOfBounds));
        assert_eq!(field.toggle_flag(actor(1), 2, 2), Err(RuleError::CannotFlagRevealed));
        // Only the mine is still hidden
        assert_eq!(field.toggle_flag(actor(9), 0, 0), Err(RuleError::PlayerNotFound));
    }

    #[test]
    fn test_leave_drops_flags_and_cursor() {
        let mut field = joined(Minefield::with_mines(3, 3, &[], clock()), &[1]);
        field.toggle_flag(actor(1), 0, 0).unwrap();
        field.update_cursor(actor(1), 1, 1).unwrap();
        assert_eq!(field.cursors().len(), 1);

        assert!(field.remove_actor(&actor(1)));
        assert!(!field.remove_actor(&actor(1)));
        assert!(field.flags_of(&actor(1)).is_empty());
        assert!(field.cursors().is_empty());
        assert_eq!(field.actor_count(), 0);
    }

    #[test]
    fn test_cursor_listing() {
        let mut field = joined(Minefield::with_mines(5, 5, &[], clock()), &[1]);
        assert_eq!(field.update_cursor(actor(2), 0, 0), Err(RuleError::PlayerNotFound));

        field.update_cursor(actor(1), 2, 3).unwrap();
        let cursors = field.cursors();
        assert_eq!(cursors[0].username, "p1");
        assert_eq!((cursors[0].row, cursors[0].col), (2, 3));
    }

    #[test]
    fn test_member_listing() {
        let field = joined(Minefield::with_mines(2, 2, &[], clock()), &[2, 1]);
        let listing = field.list_actors();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].actor, actor(1));
        assert_eq!(listing[0].joined_at, 1_000);
    }

    proptest! {
        #[test]
        fn prop_mine_count_is_exact(
            rows in 1usize..30,
            cols in 1usize..30,
            density in 0u32..=100,
            seed in any::<u64>(),
        ) {
            let mine_count = rows * cols * density as usize / 100;
            let config = GridConfig { rows, cols, mine_count };
            let field = Minefield::generate(&config, &mut DeterministicRng::new(seed), clock()).unwrap();
            prop_assert_eq!(field.cells.iter().filter(|c| c.is_mine).count(), mine_count);
        }

        #[test]
        fn prop_reveals_are_permanent(
            seed in any::<u64>(),
            moves in proptest::collection::vec((0i32..10, 0i32..10), 1..40),
        ) {
            let config = GridConfig { rows: 10, cols: 10, mine_count: 15 };
            let mut field = Minefield::generate(&config, &mut DeterministicRng::new(seed), clock()).unwrap();
            let mut seen = vec![false; 100];

            for (row, col) in moves {
                let was_revealed = seen[(row * 10 + col) as usize];
                let result = field.reveal(actor(1), row, col);
                if was_revealed {
                    prop_assert_eq!(result, Err(RuleError::AlreadyRevealed));
                }
                for (i, cell) in field.cells.iter().enumerate() {
                    prop_assert!(!seen[i] || cell.is_revealed);
                    seen[i] = cell.is_revealed;
                }
            }
        }
    }
}
