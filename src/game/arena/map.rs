//! Arena Tile Map
//!
//! Terrain generation and blast geometry. The indestructible lattice is
//! fixed at generation; destructible tiles only ever turn into empty ones.

use serde::{Serialize, Deserialize};

use crate::core::rng::RandomSource;
use crate::game::arena::state::TilePos;

/// Chance a non-lattice tile starts destructible.
pub const DESTRUCTIBLE_PERCENT: u32 = 40;

/// Share of each axis, from the top-left corner, that is a safe zone.
pub const SAFE_ZONE_PERCENT: usize = 25;

/// Ray directions walked by a blast, as (dx, dy).
const BLAST_RAYS: [(i64, i64); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Terrain of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TileKind {
    /// Walkable.
    Empty = 0,
    /// Lattice pillar; stops blasts and is never destroyed.
    Indestructible = 1,
    /// Block; stops blasts and is destroyed by them.
    Destructible = 2,
}

/// A single map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain.
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Whether blasts damage actors standing here.
    pub is_pvp_zone: bool,
}

impl Tile {
    const OPEN: Tile = Tile { kind: TileKind::Empty, is_pvp_zone: true };
}

/// Rectangular tile map, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileMap {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// All-empty map where every tile is a PvP zone.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::OPEN; width * height],
        }
    }

    /// Generate terrain.
    ///
    /// Tiles on odd rows and odd columns form the indestructible lattice.
    /// Every other tile is destructible with 40% probability, drawn in
    /// row-major order. The top-left 25% by 25% block is a safe zone with no
    /// blocks. Each spawn corner's 3x3 neighbourhood is cleared of
    /// destructible blocks; the lattice is never touched.
    pub fn generate<R: RandomSource>(width: usize, height: usize, rng: &mut R) -> Self {
        let mut map = Self::open(width, height);

        for y in 0..height {
            for x in 0..width {
                let kind = if x % 2 == 1 && y % 2 == 1 {
                    TileKind::Indestructible
                } else if rng.chance_percent(DESTRUCTIBLE_PERCENT) {
                    TileKind::Destructible
                } else {
                    TileKind::Empty
                };
                map.tiles[y * width + x].kind = kind;
            }
        }

        let safe_w = width * SAFE_ZONE_PERCENT / 100;
        let safe_h = height * SAFE_ZONE_PERCENT / 100;
        for y in 0..safe_h {
            for x in 0..safe_w {
                let tile = &mut map.tiles[y * width + x];
                tile.is_pvp_zone = false;
                if tile.kind == TileKind::Destructible {
                    tile.kind = TileKind::Empty;
                }
            }
        }

        for corner in map.spawn_corners() {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let Some(pos) = map.checked(corner.x as i64 + dx, corner.y as i64 + dy) else {
                        continue;
                    };
                    let tile = &mut map.tiles[pos.y * width + pos.x];
                    if tile.kind == TileKind::Destructible {
                        tile.kind = TileKind::Empty;
                    }
                }
            }
        }

        map
    }

    /// Map width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Map height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Convert signed coordinates to an in-bounds position.
    pub fn checked(&self, x: i64, y: i64) -> Option<TilePos> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(TilePos::new(x as usize, y as usize))
        }
    }

    /// Tile at a position, if in bounds.
    pub fn get(&self, pos: TilePos) -> Option<&Tile> {
        if pos.x < self.width && pos.y < self.height {
            self.tiles.get(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    /// Whether an actor may stand on the tile.
    pub fn is_walkable(&self, pos: TilePos) -> bool {
        matches!(self.get(pos), Some(tile) if tile.kind == TileKind::Empty)
    }

    /// Overwrite the terrain of a tile. Out-of-bounds writes are ignored.
    pub fn set_kind(&mut self, pos: TilePos, kind: TileKind) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.kind = kind;
        }
    }

    /// Overwrite the PvP flag of a tile. Out-of-bounds writes are ignored.
    pub fn set_pvp_zone(&mut self, pos: TilePos, is_pvp_zone: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.is_pvp_zone = is_pvp_zone;
        }
    }

    fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        if pos.x < self.width && pos.y < self.height {
            self.tiles.get_mut(pos.y * self.width + pos.x)
        } else {
            None
        }
    }

    /// Number of tiles of a kind.
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| t.kind == kind).count()
    }

    /// The four spawn corners, one tile in from each map corner.
    pub fn spawn_corners(&self) -> [TilePos; 4] {
        let right = self.width.saturating_sub(2);
        let bottom = self.height.saturating_sub(2);
        [
            TilePos::new(1, 1),
            TilePos::new(right, 1),
            TilePos::new(1, bottom),
            TilePos::new(right, bottom),
        ]
    }

    /// Tiles covered by a blast at `origin`.
    ///
    /// The origin is always included. Each of the four rays walks up to
    /// `range` tiles, stopping at the map edge, stopping before an
    /// indestructible tile, and stopping after including a destructible one.
    pub fn blast_cells(&self, origin: TilePos, range: u32) -> Vec<TilePos> {
        let mut cells = vec![origin];

        for (dx, dy) in BLAST_RAYS {
            for step in 1..=range as i64 {
                let Some(pos) = self.checked(origin.x as i64 + dx * step, origin.y as i64 + dy * step) else {
                    break;
                };
                let Some(tile) = self.get(pos) else {
                    break;
                };
                match tile.kind {
                    TileKind::Indestructible => break,
                    TileKind::Destructible => {
                        cells.push(pos);
                        break;
                    }
                    TileKind::Empty => cells.push(pos),
                }
            }
        }

        cells
    }

    /// Rows of tiles, top to bottom.
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.tiles.chunks(self.width.max(1)).map(<[Tile]>::to_vec).collect()
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{DeterministicRng, ScriptedRng};

    #[test]
    fn test_lattice_is_fixed() {
        let mut rng = DeterministicRng::new(42);
        let map = TileMap::generate(21, 15, &mut rng);

        for y in 0..15 {
            for x in 0..21 {
                let tile = map.get(TilePos::new(x, y)).unwrap();
                let lattice = x % 2 == 1 && y % 2 == 1;
                assert_eq!(tile.kind == TileKind::Indestructible, lattice, "tile ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = TileMap::generate(31, 31, &mut DeterministicRng::new(7));
        let b = TileMap::generate(31, 31, &mut DeterministicRng::new(7));
        let c = TileMap::generate(31, 31, &mut DeterministicRng::new(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_spawn_corners_are_clear() {
        // Every roll succeeds, so every non-lattice tile starts destructible.
        let map = TileMap::generate(20, 20, &mut ScriptedRng::constant(0));

        for corner in map.spawn_corners() {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let pos = map.checked(corner.x as i64 + dx, corner.y as i64 + dy).unwrap();
                    assert_ne!(map.get(pos).unwrap().kind, TileKind::Destructible);
                }
            }
        }
        assert!(map.count(TileKind::Destructible) > 0);
        assert_eq!(map.get(TilePos::new(18, 18)).unwrap().kind, TileKind::Empty);
        // Pillars inside a corner neighbourhood survive.
        assert_eq!(map.get(TilePos::new(17, 17)).unwrap().kind, TileKind::Indestructible);
        assert_eq!(map.get(TilePos::new(1, 1)).unwrap().kind, TileKind::Indestructible);
    }

    #[test]
    fn test_safe_zone() {
        let map = TileMap::generate(100, 100, &mut DeterministicRng::new(1));

        assert!(!map.get(TilePos::new(0, 0)).unwrap().is_pvp_zone);
        assert!(!map.get(TilePos::new(24, 24)).unwrap().is_pvp_zone);
        assert!(map.get(TilePos::new(25, 24)).unwrap().is_pvp_zone);
        assert!(map.get(TilePos::new(24, 25)).unwrap().is_pvp_zone);
        assert!(map.get(TilePos::new(99, 99)).unwrap().is_pvp_zone);

        let safe: Vec<_> = map.tiles().iter().filter(|t| !t.is_pvp_zone).collect();
        assert_eq!(safe.len(), 25 * 25);
        assert!(safe.iter().all(|t| t.kind != TileKind::Destructible));
    }

    #[test]
    fn test_blast_stops_before_indestructible() {
        let mut map = TileMap::open(11, 11);
        map.set_kind(TilePos::new(6, 5), TileKind::Indestructible);

        let cells = map.blast_cells(TilePos::new(5, 5), 2);

        assert!(cells.contains(&TilePos::new(5, 5)));
        assert!(!cells.contains(&TilePos::new(6, 5)));
        assert!(!cells.contains(&TilePos::new(7, 5)));
        assert!(cells.contains(&TilePos::new(4, 5)));
        assert!(cells.contains(&TilePos::new(3, 5)));
        assert!(cells.contains(&TilePos::new(5, 7)));
        assert!(cells.contains(&TilePos::new(5, 3)));
        assert_eq!(cells.len(), 7);
    }

    #[test]
    fn test_blast_includes_destructible_then_stops() {
        let mut map = TileMap::open(11, 11);
        map.set_kind(TilePos::new(5, 6), TileKind::Destructible);

        let cells = map.blast_cells(TilePos::new(5, 5), 2);

        assert!(cells.contains(&TilePos::new(5, 6)));
        assert!(!cells.contains(&TilePos::new(5, 7)));
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn test_blast_clipped_by_edges() {
        let map = TileMap::open(5, 5);
        let cells = map.blast_cells(TilePos::new(0, 0), 3);

        // Origin plus three tiles along each in-bounds ray.
        assert_eq!(cells.len(), 7);
        assert!(cells.iter().all(|p| p.x < 5 && p.y < 5));
    }

    #[test]
    fn test_random_seeds_keep_lattice_and_zone() {
        use rand::Rng;

        let mut seeds = rand::thread_rng();
        for _ in 0..20 {
            let seed: u64 = seeds.gen();
            let map = TileMap::generate(40, 24, &mut DeterministicRng::new(seed));

            assert_eq!(map.count(TileKind::Indestructible), 20 * 12, "seed {}", seed);
            for y in 0..6 {
                for x in 0..10 {
                    let tile = map.get(TilePos::new(x, y)).unwrap();
                    assert!(!tile.is_pvp_zone);
                    assert_ne!(tile.kind, TileKind::Destructible, "seed {}", seed);
                }
            }
        }
    }

    #[test]
    fn test_rows_shape() {
        let map = TileMap::open(4, 3);
        let rows = map.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 4));
    }
}
