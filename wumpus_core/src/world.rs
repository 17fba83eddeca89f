use std::{fmt, str::FromStr};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Direction, Percepts, Position, map::Grid};

/// What a single cell of the world holds. A cell holds at most one thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Content {
    #[default]
    Empty,
    Wumpus,
    Gold,
    Arrow,
    Pit,
}

impl Content {
    /// The layout token for this content, as accepted by [`World::from_str`].
    pub fn symbol(self) -> char {
        match self {
            Content::Empty => '.',
            Content::Wumpus => 'W',
            Content::Gold => 'G',
            Content::Arrow => 'A',
            Content::Pit => 'P',
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "." => Some(Content::Empty),
            "W" => Some(Content::Wumpus),
            "G" => Some(Content::Gold),
            "A" => Some(Content::Arrow),
            "P" => Some(Content::Pit),
            _ => None,
        }
    }
}

/// Errors raised while building a world. Gameplay itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Grid size {size} is too small, at least {min} is required")]
    GridTooSmall { size: usize, min: usize },
    #[error("Layout is empty")]
    EmptyLayout,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Layout has {rows} rows and {cols} columns, but the grid must be square")]
    NotSquare { rows: usize, cols: usize },
    #[error("Unknown layout token '{token}' at ({row}, {col})")]
    UnknownToken {
        token: String,
        row: usize,
        col: usize,
    },
    #[error("Entry cell {entry} must be empty, found {found:?}")]
    OccupiedEntry { entry: Position, found: Content },
    #[error("Layout holds {count} {content:?} cells, at most one is allowed")]
    DuplicateEntity { content: Content, count: usize },
}

/// Parameters for random world generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid dimension N; the world is N×N.
    pub size: usize,
    /// Requested number of pits. Clamped to what fits on the grid.
    pub num_pits: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            size: 4,
            num_pits: 3,
        }
    }
}

impl WorldConfig {
    /// Smallest grid that fits the entry cell plus the wumpus, gold and arrow.
    pub const MIN_SIZE: usize = 2;

    pub fn new(size: usize, num_pits: usize) -> Self {
        WorldConfig { size, num_pits }
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        if self.size < Self::MIN_SIZE {
            return Err(WorldError::GridTooSmall {
                size: self.size,
                min: Self::MIN_SIZE,
            });
        }
        Ok(())
    }

    /// Number of pits that generation will actually place.
    pub fn effective_pits(&self) -> usize {
        self.num_pits.min((self.size * self.size).saturating_sub(4))
    }
}

/// The grid and everything lying on it. Knows nothing about the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    cells: Grid<Content>,
    monster_alive: bool,
    monster_remains: Option<Position>,
}

impl World {
    /// Generates a random layout using the thread-local RNG.
    pub fn random(config: WorldConfig) -> Result<Self, WorldError> {
        let mut rng = rand::rng();
        Self::generate(config, &mut rng)
    }

    /// Generates a random layout.
    ///
    /// Every cell except the entry is shuffled, then the wumpus, gold and
    /// arrow take one cell each and pits take as many of the remaining cells
    /// as were requested. A pit request that does not fit is silently capped.
    pub fn generate<R: Rng + ?Sized>(
        config: WorldConfig,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let size = config.size;
        let entry = Self::entry_for(size);

        let mut free: Vec<Position> = (0..size)
            .flat_map(|row| (0..size).map(move |col| Position { row, col }))
            .filter(|pos| *pos != entry)
            .collect();
        free.shuffle(rng);

        let mut cells: Grid<Content> = Grid::new(size, size);
        for content in [Content::Wumpus, Content::Gold, Content::Arrow] {
            // validate() guarantees at least three free cells
            if let Some(pos) = free.pop() {
                cells[pos] = content;
            }
        }

        let pits = config.num_pits.min(free.len());
        if pits < config.num_pits {
            debug!(
                requested = config.num_pits,
                placed = pits,
                "pit count capped to fit the grid"
            );
        }
        for pos in free.split_off(free.len() - pits) {
            cells[pos] = Content::Pit;
        }

        debug!(size, pits, "generated world");
        Ok(World {
            cells,
            monster_alive: true,
            monster_remains: None,
        })
    }

    /// The entry cell of an N×N grid: the bottom-left corner.
    #[inline]
    pub fn entry_for(size: usize) -> Position {
        Position {
            row: size.saturating_sub(1),
            col: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.cells.rows()
    }

    #[inline]
    pub fn entry(&self) -> Position {
        Self::entry_for(self.size())
    }

    #[inline]
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        self.cells.contains(pos)
    }

    /// Read-only access to the whole grid, mainly for rendering.
    pub fn cells(&self) -> &Grid<Content> {
        &self.cells
    }

    /// Current content of `pos`, reflecting pickups and the monster's death.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    #[inline]
    pub fn content_at(&self, pos: Position) -> Content {
        self.cells[pos]
    }

    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        self.cells.neighbors(pos)
    }

    /// The adjacent cell in `direction`, or `None` if it is off the grid.
    pub fn step(&self, pos: Position, direction: Direction) -> Option<Position> {
        self.cells.step(pos, direction)
    }

    /// Percepts sensed at `pos`.
    ///
    /// Stench follows the wumpus tag on the grid, not the `monster_alive`
    /// flag. Clearing the wumpus cell is what makes the stench go away.
    pub fn percepts_at(&self, pos: Position) -> Percepts {
        let mut percepts = Percepts {
            glitter: self.content_at(pos) == Content::Gold,
            ..Percepts::default()
        };
        for neighbor in self.neighbors(pos) {
            match self.cells[neighbor] {
                Content::Pit => percepts.breeze = true,
                Content::Wumpus => percepts.stench = true,
                _ => {}
            }
        }
        percepts
    }

    pub fn monster_alive(&self) -> bool {
        self.monster_alive
    }

    /// Where the wumpus died, if it has.
    pub fn monster_remains(&self) -> Option<Position> {
        self.monster_remains
    }

    /// Number of cells currently holding `content`.
    pub fn count(&self, content: Content) -> usize {
        self.cells.iter().filter(|c| **c == content).count()
    }

    /// Clears `pos` and returns what it held.
    pub(crate) fn take(&mut self, pos: Position) -> Content {
        std::mem::take(&mut self.cells[pos])
    }

    /// Removes the wumpus from `pos` and marks it dead.
    pub(crate) fn slay_monster(&mut self, pos: Position) {
        debug_assert_eq!(self.cells[pos], Content::Wumpus);
        self.cells[pos] = Content::Empty;
        self.monster_alive = false;
        self.monster_remains = Some(pos);
    }
}

/// Parses a fixed layout: one line per row, whitespace separated tokens
/// `.` `W` `G` `A` `P`. The grid must be square, its bottom-left cell
/// empty, and it may hold at most one wumpus, gold and arrow.
impl FromStr for World {
    type Err = WorldError;

    fn from_str(layout: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<&str>> = layout
            .trim()
            .lines()
            .map(|line| line.split_whitespace().collect())
            .collect();
        if rows.is_empty() || rows[0].is_empty() {
            return Err(WorldError::EmptyLayout);
        }

        let width = rows[0].len();
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != width {
                return Err(WorldError::RaggedRow {
                    row,
                    expected: width,
                    found: tokens.len(),
                });
            }
        }
        if rows.len() != width {
            return Err(WorldError::NotSquare {
                rows: rows.len(),
                cols: width,
            });
        }
        if width < WorldConfig::MIN_SIZE {
            return Err(WorldError::GridTooSmall {
                size: width,
                min: WorldConfig::MIN_SIZE,
            });
        }

        let mut cells: Grid<Content> = Grid::new(width, width);
        for (row, tokens) in rows.iter().enumerate() {
            for (col, token) in tokens.iter().enumerate() {
                cells[(row, col)] =
                    Content::from_token(token).ok_or_else(|| WorldError::UnknownToken {
                        token: token.to_string(),
                        row,
                        col,
                    })?;
            }
        }

        let entry = Self::entry_for(width);
        if cells[entry] != Content::Empty {
            return Err(WorldError::OccupiedEntry {
                entry,
                found: cells[entry],
            });
        }

        for content in [Content::Wumpus, Content::Gold, Content::Arrow] {
            let count = cells.iter().filter(|c| **c == content).count();
            if count > 1 {
                return Err(WorldError::DuplicateEntity { content, count });
            }
        }

        let monster_alive = cells.iter().any(|c| *c == Content::Wumpus);
        Ok(World {
            cells,
            monster_alive,
            monster_remains: None,
        })
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.cells.rows() {
            for col in 0..self.cells.cols() {
                if col > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", self.cells[(row, col)].symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::Percept;

    const LAYOUT: &str = "
        . . P .
        W G . .
        . . A .
        . P . .
    ";

    #[test]
    fn generate_places_every_entity_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let world = World::generate(WorldConfig::new(4, 3), &mut rng).unwrap();

        assert_eq!(world.size(), 4);
        assert_eq!(world.count(Content::Wumpus), 1);
        assert_eq!(world.count(Content::Gold), 1);
        assert_eq!(world.count(Content::Arrow), 1);
        assert_eq!(world.count(Content::Pit), 3);
        assert_eq!(world.content_at(world.entry()), Content::Empty);
        assert!(world.monster_alive());
        assert_eq!(world.monster_remains(), None);
    }

    #[test]
    fn generate_caps_pits_silently() {
        let mut rng = StdRng::seed_from_u64(1);
        let world = World::generate(WorldConfig::new(3, 50), &mut rng).unwrap();
        assert_eq!(world.count(Content::Pit), 5);
        assert_eq!(world.count(Content::Empty), 1);

        let tiny = World::generate(WorldConfig::new(2, 3), &mut rng).unwrap();
        assert_eq!(tiny.count(Content::Pit), 0);
        assert_eq!(tiny.content_at(Position::new(1, 0)), Content::Empty);
    }

    #[test]
    fn generate_rejects_degenerate_grids() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            World::generate(WorldConfig::new(1, 0), &mut rng),
            Err(WorldError::GridTooSmall { size: 1, min: 2 })
        );
        assert!(World::random(WorldConfig::new(0, 0)).is_err());
    }

    #[test]
    fn config_defaults_and_effective_pits() {
        let config = WorldConfig::default();
        assert_eq!(config, WorldConfig::new(4, 3));
        assert_eq!(config.effective_pits(), 3);
        assert_eq!(WorldConfig::new(4, 100).effective_pits(), 12);
        assert_eq!(WorldConfig::new(2, 1).effective_pits(), 0);
    }

    #[test]
    fn parses_layout() {
        let world: World = LAYOUT.parse().unwrap();
        assert_eq!(world.size(), 4);
        assert_eq!(world.entry(), Position::new(3, 0));
        assert!(world.is_in_bounds(Position::new(3, 3)));
        assert!(!world.is_in_bounds(Position::new(4, 0)));
        assert_eq!(world.content_at(Position::new(1, 0)), Content::Wumpus);
        assert_eq!(world.content_at(Position::new(1, 1)), Content::Gold);
        assert_eq!(world.content_at(Position::new(2, 2)), Content::Arrow);
        assert_eq!(world.count(Content::Pit), 2);
        assert!(world.monster_alive());
    }

    #[test]
    fn display_matches_layout_tokens() {
        let world: World = LAYOUT.parse().unwrap();
        let rendered = world.to_string();
        let first_row = rendered.lines().next().unwrap();
        assert_eq!(first_row, ". . P .");
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn layout_errors() {
        assert_eq!("".parse::<World>(), Err(WorldError::EmptyLayout));
        assert_eq!(
            ". .\n. . .".parse::<World>(),
            Err(WorldError::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            ". . .\n. . .".parse::<World>(),
            Err(WorldError::NotSquare { rows: 2, cols: 3 })
        );
        assert_eq!(
            ". X\n. .".parse::<World>(),
            Err(WorldError::UnknownToken {
                token: "X".to_string(),
                row: 0,
                col: 1
            })
        );
        assert_eq!(
            ". .\nP .".parse::<World>(),
            Err(WorldError::OccupiedEntry {
                entry: Position::new(1, 0),
                found: Content::Pit
            })
        );
        assert_eq!(
            ".".parse::<World>(),
            Err(WorldError::GridTooSmall { size: 1, min: 2 })
        );
        assert_eq!(
            "W . W\nA . .\n. . .".parse::<World>(),
            Err(WorldError::DuplicateEntity {
                content: Content::Wumpus,
                count: 2
            })
        );
        assert_eq!(
            "G G G\n. . A\n. . .".parse::<World>(),
            Err(WorldError::DuplicateEntity {
                content: Content::Gold,
                count: 3
            })
        );
        assert_eq!(
            "A . A\n. . .\n. . .".parse::<World>(),
            Err(WorldError::DuplicateEntity {
                content: Content::Arrow,
                count: 2
            })
        );
        // Pits may repeat.
        assert!("P . P\nP . .\n. . .".parse::<World>().is_ok());
    }

    #[test]
    fn percepts_follow_adjacency() {
        let world: World = LAYOUT.parse().unwrap();

        // Next to the wumpus at (1, 0) and the pit at (3, 1).
        let at_entry_above = world.percepts_at(Position::new(2, 0));
        assert!(at_entry_above.stench);
        assert!(!at_entry_above.breeze);

        let entry = world.percepts_at(world.entry());
        assert!(entry.breeze);
        assert!(!entry.stench);
        assert!(!entry.glitter);

        let on_gold = world.percepts_at(Position::new(1, 1));
        assert!(on_gold.glitter);
        assert!(on_gold.stench);
        assert_eq!(
            on_gold.iter().collect::<Vec<_>>(),
            vec![Percept::Glitter, Percept::Stench]
        );

        // Diagonal to the wumpus only.
        assert!(!world.percepts_at(Position::new(2, 1)).stench);
        assert!(world.percepts_at(Position::new(3, 3)).is_empty());
    }

    #[test]
    fn stench_disappears_with_the_monster() {
        let mut world: World = LAYOUT.parse().unwrap();
        let wumpus = Position::new(1, 0);
        assert!(world.percepts_at(Position::new(0, 0)).contains(Percept::Stench));

        world.slay_monster(wumpus);

        assert!(!world.monster_alive());
        assert_eq!(world.monster_remains(), Some(wumpus));
        assert_eq!(world.content_at(wumpus), Content::Empty);
        assert!(!world.percepts_at(Position::new(0, 0)).stench);
    }

    #[test]
    fn take_clears_the_cell() {
        let mut world: World = LAYOUT.parse().unwrap();
        let gold = Position::new(1, 1);
        assert_eq!(world.take(gold), Content::Gold);
        assert_eq!(world.content_at(gold), Content::Empty);
        assert!(!world.percepts_at(gold).glitter);
        assert_eq!(world.take(gold), Content::Empty);
    }

    #[test]
    fn queries_are_idempotent() {
        let world: World = LAYOUT.parse().unwrap();
        let pos = Position::new(1, 1);
        assert_eq!(world.percepts_at(pos), world.percepts_at(pos));
        assert_eq!(world.content_at(pos), world.content_at(pos));
    }
}
